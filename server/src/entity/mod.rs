pub mod error;
pub mod item;
pub mod item_extras;
pub mod mobile;
pub mod packet_cache;
pub mod parent;

use vesper_shared::{DirtyFlags, EntityKind, Point3D, Serial, ShardId};

use self::{item::Item, mobile::Mobile, packet_cache::PacketCache, parent::Parent};

/// Pending changes of an entity plus whether it already sits in its queue
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeltaState {
    pub(crate) flags: DirtyFlags,
    pub(crate) in_queue: bool,
}

/// Borrowed view of either entity kind
#[derive(Clone, Copy)]
pub enum EntityRef<'a> {
    Item(&'a Item),
    Mobile(&'a Mobile),
}

impl<'a> EntityRef<'a> {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Item(_) => EntityKind::Item,
            EntityRef::Mobile(_) => EntityKind::Mobile,
        }
    }

    pub fn serial(&self) -> Serial {
        match self {
            EntityRef::Item(item) => item.serial(),
            EntityRef::Mobile(mobile) => mobile.serial(),
        }
    }

    /// Mobiles are always owned by the world
    pub fn parent(&self) -> Parent {
        match self {
            EntityRef::Item(item) => item.parent(),
            EntityRef::Mobile(_) => Parent::World,
        }
    }

    pub fn shard(&self) -> ShardId {
        match self {
            EntityRef::Item(item) => item.shard(),
            EntityRef::Mobile(mobile) => mobile.shard(),
        }
    }

    pub fn location(&self) -> Point3D {
        match self {
            EntityRef::Item(item) => item.location(),
            EntityRef::Mobile(mobile) => mobile.location(),
        }
    }

    pub fn cache(&self) -> &'a PacketCache {
        match *self {
            EntityRef::Item(item) => item.cache(),
            EntityRef::Mobile(mobile) => mobile.cache(),
        }
    }

    pub fn as_item(&self) -> Option<&'a Item> {
        match *self {
            EntityRef::Item(item) => Some(item),
            EntityRef::Mobile(_) => None,
        }
    }

    pub fn as_mobile(&self) -> Option<&'a Mobile> {
        match *self {
            EntityRef::Mobile(mobile) => Some(mobile),
            EntityRef::Item(_) => None,
        }
    }
}
