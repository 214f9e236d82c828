use thiserror::Error;

use vesper_shared::{ObserverKey, PacketError, Serial, TradeId};

use crate::entity::{error::OwnershipError, item::Layer};

/// Errors returned by world operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorldError {
    #[error("Entity {serial} does not exist")]
    EntityNotFound { serial: Serial },

    #[error("Serial {serial} is outside the range for its entity kind")]
    InvalidSerial { serial: Serial },

    #[error("Serial {serial} is already in use")]
    DuplicateSerial { serial: Serial },

    #[error("Item {serial} is not a container")]
    NotAContainer { serial: Serial },

    #[error("Layer {layer:?} on mobile {holder} is already occupied by {occupant}")]
    LayerOccupied {
        holder: Serial,
        layer: Layer,
        occupant: Serial,
    },

    #[error("Item {serial} has no equipment layer")]
    NoLayer { serial: Serial },

    #[error("Mobile {serial} already has a connected session")]
    AlreadyConnected { serial: Serial },

    #[error("Mobile {serial} has no connected session")]
    NotConnected { serial: Serial },

    #[error("Observer {key:?} is not connected")]
    ObserverNotFound { key: ObserverKey },

    #[error("Entity {serial} is out of range of mobile {viewer}")]
    OutOfRange { viewer: Serial, serial: Serial },

    #[error("Secure trade {trade} does not exist")]
    TradeNotFound { trade: TradeId },

    #[error("Mobile {serial} cannot trade with itself")]
    SelfTrade { serial: Serial },

    #[error("Serial space for {kind} exhausted")]
    SerialsExhausted { kind: &'static str },

    #[error(transparent)]
    Ownership(#[from] OwnershipError),

    #[error(transparent)]
    Packet(#[from] PacketError),
}

/// Failure while flushing a single entity. Logged at the entity boundary,
/// never propagated out of a flush.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeltaError {
    #[error("Failed to build packet for {serial}: {source}")]
    Packet {
        serial: Serial,
        #[source]
        source: PacketError,
    },

    #[error("Owner chain of {serial} is broken: {source}")]
    Ownership {
        serial: Serial,
        #[source]
        source: OwnershipError,
    },
}

impl DeltaError {
    pub fn serial(&self) -> Serial {
        match self {
            DeltaError::Packet { serial, .. } | DeltaError::Ownership { serial, .. } => *serial,
        }
    }
}
