use vesper_shared::{Notoriety, OutgoingPacket, PacketError, ProtocolVariant};

type Slots = [[Option<OutgoingPacket>; Notoriety::SLOTS]; ProtocolVariant::COUNT];

/// Lazily built packets for a single entity's flush, keyed by protocol
/// variant and (optionally) the notoriety the entity shows the recipient.
/// Slot 0 of the notoriety axis holds packets with no relationship class.
#[derive(Default)]
pub struct MessageCache {
    slots: Slots,
    len: usize,
}

impl MessageCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(variant: ProtocolVariant, class: Option<Notoriety>) -> (usize, usize) {
        (variant.slot(), class.map(Notoriety::slot).unwrap_or(0))
    }

    pub fn get(&self, variant: ProtocolVariant, class: Option<Notoriety>) -> Option<&OutgoingPacket> {
        let (v, c) = Self::slot(variant, class);
        self.slots[v][c].as_ref()
    }

    /// Returns the packet for the key, building it on first use only
    pub fn get_or_try_build<F>(
        &mut self,
        variant: ProtocolVariant,
        class: Option<Notoriety>,
        build: F,
    ) -> Result<OutgoingPacket, PacketError>
    where
        F: FnOnce() -> Result<OutgoingPacket, PacketError>,
    {
        let (v, c) = Self::slot(variant, class);
        if let Some(packet) = &self.slots[v][c] {
            return Ok(packet.clone());
        }
        let packet = build()?;
        self.slots[v][c] = Some(packet.clone());
        self.len += 1;
        Ok(packet)
    }

    pub fn clear(&mut self) {
        if self.len == 0 {
            return;
        }
        for row in self.slots.iter_mut() {
            for slot in row.iter_mut() {
                *slot = None;
            }
        }
        self.len = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

/// A packet identical for every recipient, built at most once
#[derive(Default)]
pub struct SharedPacket {
    packet: Option<OutgoingPacket>,
}

impl SharedPacket {
    pub fn get_or_try_build<F>(&mut self, build: F) -> Result<OutgoingPacket, PacketError>
    where
        F: FnOnce() -> Result<OutgoingPacket, PacketError>,
    {
        if let Some(packet) = &self.packet {
            return Ok(packet.clone());
        }
        let packet = build()?;
        self.packet = Some(packet.clone());
        Ok(packet)
    }

    pub fn clear(&mut self) {
        self.packet = None;
    }

    pub fn is_empty(&self) -> bool {
        self.packet.is_none()
    }
}

/// One transient cache per message family. Everything in here lives for
/// exactly one entity's flush.
#[derive(Default)]
pub struct FlushScratch {
    pub(crate) full: MessageCache,
    pub(crate) moving: MessageCache,
    pub(crate) container_update: MessageCache,
    pub(crate) equip_update: SharedPacket,
    pub(crate) hits: SharedPacket,
    pub(crate) exact_hits: SharedPacket,
    pub(crate) status: SharedPacket,
    pub(crate) private_status: SharedPacket,
    pub(crate) self_update: MessageCache,
}

impl FlushScratch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.full.clear();
        self.moving.clear();
        self.container_update.clear();
        self.equip_update.clear();
        self.hits.clear();
        self.exact_hits.clear();
        self.status.clear();
        self.private_status.clear();
        self.self_update.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.full.is_empty()
            && self.moving.is_empty()
            && self.container_update.is_empty()
            && self.equip_update.is_empty()
            && self.hits.is_empty()
            && self.exact_hits.is_empty()
            && self.status.is_empty()
            && self.private_status.is_empty()
            && self.self_update.is_empty()
    }
}
