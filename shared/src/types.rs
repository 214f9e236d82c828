use std::fmt;

// Serial
/// Stable identity of an entity. Mobiles and items live in disjoint ranges so
/// the kind of an entity can be read off its serial.
#[derive(PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub struct Serial(u32);

impl Serial {
    pub const ZERO: Serial = Serial(0);
    pub const MOBILE_START: u32 = 0x0000_0001;
    pub const ITEM_START: u32 = 0x4000_0000;
    pub const ITEM_END: u32 = 0x8000_0000;

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> u32 {
        self.0
    }

    pub fn is_mobile(&self) -> bool {
        self.0 >= Self::MOBILE_START && self.0 < Self::ITEM_START
    }

    pub fn is_item(&self) -> bool {
        self.0 >= Self::ITEM_START && self.0 < Self::ITEM_END
    }

    pub fn is_valid(&self) -> bool {
        self.is_mobile() || self.is_item()
    }

    pub fn kind(&self) -> Option<EntityKind> {
        if self.is_item() {
            Some(EntityKind::Item)
        } else if self.is_mobile() {
            Some(EntityKind::Mobile)
        } else {
            None
        }
    }
}

impl fmt::Debug for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Serial(0x{:08X})", self.0)
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// Static kind tag for the two concrete entity shapes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Item,
    Mobile,
}

// ShardId
/// Reference to a world shard (a map). Entities on the internal shard are
/// parked off-world and never broadcast.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct ShardId(u8);

impl ShardId {
    pub const INTERNAL: ShardId = ShardId(0x7F);

    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> u8 {
        self.0
    }

    pub fn is_internal(&self) -> bool {
        *self == Self::INTERNAL
    }
}

#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, Default)]
pub struct Point3D {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Point3D {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Inclusive square range test on the X/Y plane. Z never participates.
    pub fn in_range(&self, other: &Point3D, range: i32) -> bool {
        (self.x - other.x).abs() <= range && (self.y - other.y).abs() <= range
    }
}

impl fmt::Display for Point3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Direction {
    #[default]
    North = 0x0,
    Right = 0x1,
    East = 0x2,
    Down = 0x3,
    South = 0x4,
    Left = 0x5,
    West = 0x6,
    Up = 0x7,
}

impl Direction {
    pub const RUNNING: u8 = 0x80;

    pub fn to_wire(self, running: bool) -> u8 {
        if running {
            self as u8 | Self::RUNNING
        } else {
            self as u8
        }
    }
}

/// Staff rank of the player behind a mobile. Higher levels see concealed
/// entities of lower levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum AccessLevel {
    #[default]
    Player,
    Counselor,
    GameMaster,
    Administrator,
}

// ObserverKey
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord)]
pub struct ObserverKey(u64);

impl ObserverKey {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }
}

pub type GuildId = u32;
pub type TradeId = u32;
