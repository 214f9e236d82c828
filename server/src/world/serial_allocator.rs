use vesper_shared::Serial;

use crate::error::WorldError;

/// Hands out fresh serials, one counter per entity kind. Serials are never
/// reused within a run.
pub struct SerialAllocator {
    next_mobile: u32,
    next_item: u32,
}

impl Default for SerialAllocator {
    fn default() -> Self {
        Self {
            next_mobile: Serial::MOBILE_START,
            next_item: Serial::ITEM_START,
        }
    }
}

impl SerialAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_mobile(&mut self) -> Result<Serial, WorldError> {
        if self.next_mobile >= Serial::ITEM_START {
            return Err(WorldError::SerialsExhausted { kind: "mobiles" });
        }
        let serial = Serial::new(self.next_mobile);
        self.next_mobile += 1;
        Ok(serial)
    }

    pub fn next_item(&mut self) -> Result<Serial, WorldError> {
        if self.next_item >= Serial::ITEM_END {
            return Err(WorldError::SerialsExhausted { kind: "items" });
        }
        let serial = Serial::new(self.next_item);
        self.next_item += 1;
        Ok(serial)
    }

    /// Moves the counters past a serial that was assigned elsewhere
    pub fn reserve(&mut self, serial: Serial) {
        let value = serial.value();
        if serial.is_mobile() && value >= self.next_mobile {
            self.next_mobile = value + 1;
        } else if serial.is_item() && value >= self.next_item {
            self.next_item = value + 1;
        }
    }
}
