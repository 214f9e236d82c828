use vesper_shared::{Point3D, Serial, ShardId};

use super::parent::Parent;

/// Where an item returns if a drag is rejected
#[derive(Clone, Debug, PartialEq)]
pub struct BounceInfo {
    pub shard: ShardId,
    pub location: Point3D,
    pub parent: Parent,
}

/// Rarely-set item attributes. Most items never carry any of these, so they
/// live behind an optional box that is dropped again once everything is back
/// at its default.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemExtras {
    pub name: Option<String>,
    pub contents: Vec<Serial>,
    pub bounce: Option<BounceInfo>,
    pub held_by: Option<Serial>,
    pub spawner: Option<Serial>,
    pub temp_flags: u32,
    pub saved_flags: u32,
    pub weight: Option<f32>,
}

impl ItemExtras {
    pub fn is_default(&self) -> bool {
        self.name.is_none()
            && self.contents.is_empty()
            && self.bounce.is_none()
            && self.held_by.is_none()
            && self.spawner.is_none()
            && self.temp_flags == 0
            && self.saved_flags == 0
            && self.weight.is_none()
    }
}
