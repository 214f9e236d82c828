use vesper_shared::{OutgoingPacket, ProtocolVariant, PropertyList};

/// Durable per-entity packets. Each slot survives across flushes until a
/// setter that changes what it encodes clears it.
#[derive(Clone, Debug, Default)]
pub struct PacketCache {
    pub(crate) remove: Option<OutgoingPacket>,
    pub(crate) full: [Option<OutgoingPacket>; ProtocolVariant::COUNT],
    pub(crate) properties: Option<PropertyList>,
    pub(crate) property_packet: Option<OutgoingPacket>,
}

impl PacketCache {
    pub fn full(&self, variant: ProtocolVariant) -> Option<&OutgoingPacket> {
        self.full[variant.slot()].as_ref()
    }

    pub fn remove(&self) -> Option<&OutgoingPacket> {
        self.remove.as_ref()
    }

    pub fn properties(&self) -> Option<&PropertyList> {
        self.properties.as_ref()
    }

    pub fn property_packet(&self) -> Option<&OutgoingPacket> {
        self.property_packet.as_ref()
    }

    pub(crate) fn invalidate_full(&mut self) {
        self.full = Default::default();
    }

    /// Swaps in a freshly derived summary. Returns false, leaving the cached
    /// packet alone, when the content hash did not move.
    pub(crate) fn replace_properties(&mut self, list: PropertyList) -> bool {
        if let Some(current) = &self.properties {
            if current.hash() == list.hash() {
                return false;
            }
        }
        self.properties = Some(list);
        self.property_packet = None;
        true
    }
}
