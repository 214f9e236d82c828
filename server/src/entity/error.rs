use thiserror::Error;

use vesper_shared::Serial;

/// Errors raised while linking or walking owner chains
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OwnershipError {
    /// Attaching would make an entity its own ancestor
    #[error("Attaching {child} to {parent} would create an ownership cycle")]
    Cycle { child: Serial, parent: Serial },

    /// An entity cannot own itself
    #[error("Entity {serial} cannot be its own parent")]
    SelfParent { serial: Serial },

    /// The owner chain references an entity that is not in the table
    #[error("Entity {serial} references missing parent {parent}")]
    MissingParent { serial: Serial, parent: Serial },

    /// The entity whose chain was requested is not in the table
    #[error("Entity {serial} does not exist")]
    MissingEntity { serial: Serial },

    /// Mobiles are always roots and cannot be placed inside anything
    #[error("Mobile {serial} cannot be contained")]
    MobileNotContainable { serial: Serial },
}
