use std::{fmt, rc::Rc, sync::Arc};

use crate::Serial;

/// What an outgoing packet tells the client. Several wire ids can share a kind
/// (legacy and extended dialects of the same message).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PacketKind {
    Remove,
    WorldItem,
    MobileIncoming,
    MobileMoving,
    MobileUpdate,
    PropertySummary,
    EquipUpdate,
    ContainerContentUpdate,
    ContainerContent,
    ContainerDisplay,
    MobileHits,
    MobileStatus,
}

/// An encoded, immutable packet
#[derive(Clone, PartialEq, Eq)]
pub struct Packet {
    kind: PacketKind,
    subject: Serial,
    bytes: Arc<[u8]>,
}

/// Packets are built once and handed to every recipient that needs the same
/// bytes; the last holder drops them.
pub type OutgoingPacket = Rc<Packet>;

impl Packet {
    pub(crate) fn new(kind: PacketKind, subject: Serial, bytes: Arc<[u8]>) -> Self {
        Self {
            kind,
            subject,
            bytes,
        }
    }

    pub fn kind(&self) -> PacketKind {
        self.kind
    }

    /// Serial of the entity this packet describes
    pub fn subject(&self) -> Serial {
        self.subject
    }

    pub fn id(&self) -> u8 {
        self.bytes[0]
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Thread-safe handle on the encoded bytes, for handing off to a transport
    pub fn payload(&self) -> Arc<[u8]> {
        self.bytes.clone()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn share(self) -> OutgoingPacket {
        Rc::new(self)
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Packet(0x{:02X} {:?} for {}, {} bytes)",
            self.id(),
            self.kind,
            self.subject,
            self.bytes.len()
        )
    }
}
