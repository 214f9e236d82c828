/// Standing of a mobile as seen by a specific observer. This is the coarse
/// relationship class that varies moving messages across observers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Notoriety {
    #[default]
    Innocent = 1,
    Ally = 2,
    CanBeAttacked = 3,
    Criminal = 4,
    Enemy = 5,
    Murderer = 6,
    Invulnerable = 7,
}

impl Notoriety {
    /// Number of cache slots needed to index by notoriety (slot 0 is "no class")
    pub const SLOTS: usize = 8;

    pub const ALL: [Notoriety; 7] = [
        Notoriety::Innocent,
        Notoriety::Ally,
        Notoriety::CanBeAttacked,
        Notoriety::Criminal,
        Notoriety::Enemy,
        Notoriety::Murderer,
        Notoriety::Invulnerable,
    ];

    pub fn to_wire(self) -> u8 {
        self as u8
    }

    pub fn slot(self) -> usize {
        self as usize
    }
}
