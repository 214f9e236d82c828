use vesper_shared::Serial;

/// Owner of an entity. Always exactly one: the world itself, a containing
/// item, or a holding mobile. Resolved through the entity table by serial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Parent {
    #[default]
    World,
    Item(Serial),
    Mobile(Serial),
}

impl Parent {
    pub fn serial(&self) -> Option<Serial> {
        match self {
            Parent::World => None,
            Parent::Item(serial) | Parent::Mobile(serial) => Some(*serial),
        }
    }

    pub fn is_world(&self) -> bool {
        matches!(self, Parent::World)
    }

    pub fn from_serial(serial: Serial) -> Self {
        if serial.is_mobile() {
            Parent::Mobile(serial)
        } else {
            Parent::Item(serial)
        }
    }
}

/// Outermost value of an owner chain
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RootOwner {
    /// The chain ends at an item lying directly in the world
    World(Serial),
    /// The chain ends at a mobile, either the entity itself or its holder
    Mobile(Serial),
}

impl RootOwner {
    /// Serial of the root entity whose position the chain inherits
    pub fn serial(&self) -> Serial {
        match self {
            RootOwner::World(serial) | RootOwner::Mobile(serial) => *serial,
        }
    }

    pub fn mobile(&self) -> Option<Serial> {
        match self {
            RootOwner::Mobile(serial) => Some(*serial),
            RootOwner::World(_) => None,
        }
    }
}
