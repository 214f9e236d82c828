use std::collections::VecDeque;

use vesper_shared::Serial;

/// FIFO of entities with pending changes. An entity appears at most once;
/// the entity's own queue flag is the membership test.
#[derive(Default)]
pub struct DeltaQueue {
    entries: VecDeque<Serial>,
}

impl DeltaQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, serial: Serial) {
        self.entries.push_back(serial);
    }

    pub(crate) fn pop(&mut self) -> Option<Serial> {
        self.entries.pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, serial: Serial) -> bool {
        self.entries.contains(&serial)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Serial> {
        self.entries.iter()
    }
}
