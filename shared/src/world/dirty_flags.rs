use std::{
    fmt,
    ops::{BitAnd, BitOr, BitOrAssign},
};

/// Pending-change bitset of an entity. Categories OR-combine across
/// mutations until the next flush.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DirtyFlags(u16);

impl DirtyFlags {
    pub const NONE: DirtyFlags = DirtyFlags(0);
    /// Geometry or identity changed: position, graphic/body, hue, amount
    pub const FULL_RESYNC: DirtyFlags = DirtyFlags(1 << 0);
    /// Placement only: direction, equip slot
    pub const POSITION: DirtyFlags = DirtyFlags(1 << 1);
    /// The property summary content hash changed
    pub const PROPERTIES: DirtyFlags = DirtyFlags(1 << 2);
    pub const NOTORIETY: DirtyFlags = DirtyFlags(1 << 3);
    pub const HITS: DirtyFlags = DirtyFlags(1 << 4);
    pub const NAME: DirtyFlags = DirtyFlags(1 << 5);
    /// Private status, only ever sent to the mobile's own session
    pub const STATS: DirtyFlags = DirtyFlags(1 << 6);

    const NAMES: [(DirtyFlags, &'static str); 7] = [
        (Self::FULL_RESYNC, "FULL_RESYNC"),
        (Self::POSITION, "POSITION"),
        (Self::PROPERTIES, "PROPERTIES"),
        (Self::NOTORIETY, "NOTORIETY"),
        (Self::HITS, "HITS"),
        (Self::NAME, "NAME"),
        (Self::STATS, "STATS"),
    ];

    pub const fn bits(&self) -> u16 {
        self.0
    }

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True if every bit of `other` is set
    pub fn contains(&self, other: DirtyFlags) -> bool {
        self.0 & other.0 == other.0 && !other.is_empty()
    }

    /// True if any bit of `other` is set
    pub fn intersects(&self, other: DirtyFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: DirtyFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: DirtyFlags) {
        self.0 &= !other.0;
    }

    /// Returns the current bits and leaves the set empty
    pub fn take(&mut self) -> DirtyFlags {
        std::mem::take(self)
    }

    /// Placement-only work is subsumed whenever a full resync is pending
    pub fn wants_position_only(&self) -> bool {
        self.contains(Self::POSITION) && !self.contains(Self::FULL_RESYNC)
    }
}

impl BitOr for DirtyFlags {
    type Output = DirtyFlags;

    fn bitor(self, rhs: DirtyFlags) -> DirtyFlags {
        DirtyFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for DirtyFlags {
    fn bitor_assign(&mut self, rhs: DirtyFlags) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for DirtyFlags {
    type Output = DirtyFlags;

    fn bitand(self, rhs: DirtyFlags) -> DirtyFlags {
        DirtyFlags(self.0 & rhs.0)
    }
}

impl fmt::Debug for DirtyFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "DirtyFlags(NONE)");
        }
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "DirtyFlags({})", names.join(" | "))
    }
}
