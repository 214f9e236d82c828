use std::collections::{HashMap, HashSet};

use vesper_shared::{Point3D, Serial, ShardId, TradeId};

use crate::{
    entity::{
        error::OwnershipError,
        item::Item,
        mobile::Mobile,
        packet_cache::PacketCache,
        parent::{Parent, RootOwner},
        DeltaState, EntityRef,
    },
    error::WorldError,
};

/// Every live entity, keyed by serial. Owner links are serials resolved
/// through this table, never references.
#[derive(Default)]
pub struct EntityTable {
    items: HashMap<Serial, Item>,
    mobiles: HashMap<Serial, Mobile>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_item(&mut self, item: Item) -> Result<(), WorldError> {
        let serial = item.serial();
        if !serial.is_item() {
            return Err(WorldError::InvalidSerial { serial });
        }
        if self.items.contains_key(&serial) {
            return Err(WorldError::DuplicateSerial { serial });
        }
        self.items.insert(serial, item);
        Ok(())
    }

    pub fn insert_mobile(&mut self, mobile: Mobile) -> Result<(), WorldError> {
        let serial = mobile.serial();
        if !serial.is_mobile() {
            return Err(WorldError::InvalidSerial { serial });
        }
        if self.mobiles.contains_key(&serial) {
            return Err(WorldError::DuplicateSerial { serial });
        }
        self.mobiles.insert(serial, mobile);
        Ok(())
    }

    pub fn item(&self, serial: Serial) -> Option<&Item> {
        self.items.get(&serial)
    }

    pub fn item_mut(&mut self, serial: Serial) -> Option<&mut Item> {
        self.items.get_mut(&serial)
    }

    pub fn mobile(&self, serial: Serial) -> Option<&Mobile> {
        self.mobiles.get(&serial)
    }

    pub fn mobile_mut(&mut self, serial: Serial) -> Option<&mut Mobile> {
        self.mobiles.get_mut(&serial)
    }

    pub fn entity(&self, serial: Serial) -> Option<EntityRef<'_>> {
        if serial.is_item() {
            self.items.get(&serial).map(EntityRef::Item)
        } else {
            self.mobiles.get(&serial).map(EntityRef::Mobile)
        }
    }

    pub fn contains(&self, serial: Serial) -> bool {
        self.items.contains_key(&serial) || self.mobiles.contains_key(&serial)
    }

    pub(crate) fn remove_item(&mut self, serial: Serial) -> Option<Item> {
        self.items.remove(&serial)
    }

    pub(crate) fn remove_mobile(&mut self, serial: Serial) -> Option<Mobile> {
        self.mobiles.remove(&serial)
    }

    pub(crate) fn delta_mut(&mut self, serial: Serial) -> Option<&mut DeltaState> {
        if serial.is_item() {
            self.items.get_mut(&serial).map(|item| &mut item.delta)
        } else {
            self.mobiles.get_mut(&serial).map(|mobile| &mut mobile.delta)
        }
    }

    pub(crate) fn cache_mut(&mut self, serial: Serial) -> Option<&mut PacketCache> {
        if serial.is_item() {
            self.items.get_mut(&serial).map(|item| &mut item.cache)
        } else {
            self.mobiles.get_mut(&serial).map(|mobile| &mut mobile.cache)
        }
    }

    pub fn items_count(&self) -> usize {
        self.items.len()
    }

    pub fn mobiles_count(&self) -> usize {
        self.mobiles.len()
    }

    pub fn item_serials(&self) -> impl Iterator<Item = &Serial> {
        self.items.keys()
    }

    pub fn mobile_serials(&self) -> impl Iterator<Item = &Serial> {
        self.mobiles.keys()
    }

    // Owner chains

    pub fn parent_of(&self, serial: Serial) -> Result<Parent, OwnershipError> {
        if let Some(item) = self.items.get(&serial) {
            return Ok(item.parent());
        }
        if self.mobiles.contains_key(&serial) {
            return Ok(Parent::World);
        }
        Err(OwnershipError::MissingEntity { serial })
    }

    /// Walks the owner chain to its outermost value. Each entity is visited
    /// at most once; revisiting one reports the link that closes the cycle.
    pub fn resolve_root(&self, serial: Serial) -> Result<RootOwner, OwnershipError> {
        let mut visited = HashSet::new();
        let mut current = serial;
        loop {
            visited.insert(current);
            match self.parent_of(current)? {
                Parent::World => {
                    return Ok(if current.is_mobile() {
                        RootOwner::Mobile(current)
                    } else {
                        RootOwner::World(current)
                    });
                }
                Parent::Mobile(holder) => {
                    if !self.mobiles.contains_key(&holder) {
                        return Err(OwnershipError::MissingParent {
                            serial: current,
                            parent: holder,
                        });
                    }
                    return Ok(RootOwner::Mobile(holder));
                }
                Parent::Item(container) => {
                    if visited.contains(&container) {
                        return Err(OwnershipError::Cycle {
                            child: current,
                            parent: container,
                        });
                    }
                    if !self.items.contains_key(&container) {
                        return Err(OwnershipError::MissingParent {
                            serial: current,
                            parent: container,
                        });
                    }
                    current = container;
                }
            }
        }
    }

    /// Resolved world shard and position. Contained entities report their
    /// root's.
    pub fn world_location(&self, serial: Serial) -> Result<(ShardId, Point3D), OwnershipError> {
        match self.resolve_root(serial)? {
            RootOwner::World(root) => {
                let item = self
                    .items
                    .get(&root)
                    .ok_or(OwnershipError::MissingEntity { serial: root })?;
                Ok((item.shard(), item.location()))
            }
            RootOwner::Mobile(root) => {
                let mobile = self
                    .mobiles
                    .get(&root)
                    .ok_or(OwnershipError::MissingEntity { serial: root })?;
                Ok((mobile.shard(), mobile.location()))
            }
        }
    }

    /// Checks that placing `child` under `parent` keeps every chain acyclic
    pub fn check_attach(&self, child: Serial, parent: Parent) -> Result<(), OwnershipError> {
        if child.is_mobile() {
            return Err(OwnershipError::MobileNotContainable { serial: child });
        }
        if !self.items.contains_key(&child) {
            return Err(OwnershipError::MissingEntity { serial: child });
        }
        let Some(parent_serial) = parent.serial() else {
            return Ok(());
        };
        if parent_serial == child {
            return Err(OwnershipError::SelfParent { serial: child });
        }
        if !self.contains(parent_serial) {
            return Err(OwnershipError::MissingParent {
                serial: child,
                parent: parent_serial,
            });
        }

        let mut visited = HashSet::new();
        let mut current = parent_serial;
        while visited.insert(current) {
            if current == child {
                return Err(OwnershipError::Cycle {
                    child,
                    parent: parent_serial,
                });
            }
            match self.parent_of(current)? {
                Parent::Item(next) => current = next,
                Parent::World | Parent::Mobile(_) => return Ok(()),
            }
        }
        // the new parent already sits on a broken chain
        Err(OwnershipError::Cycle {
            child,
            parent: parent_serial,
        })
    }

    /// Moves `child` under `parent`, keeping both sides' back-links in step.
    /// Returns the previous parent.
    pub(crate) fn attach(&mut self, child: Serial, parent: Parent) -> Result<Parent, OwnershipError> {
        self.check_attach(child, parent)?;
        let previous = self.detach(child)?;
        if let Some(item) = self.items.get_mut(&child) {
            item.set_parent(parent);
        }
        match parent {
            Parent::World => {}
            Parent::Item(container) => {
                if let Some(container) = self.items.get_mut(&container) {
                    container.add_content(child);
                }
            }
            Parent::Mobile(holder) => {
                if let Some(holder) = self.mobiles.get_mut(&holder) {
                    holder.add_equipment(child);
                }
            }
        }
        Ok(previous)
    }

    /// Unlinks `child` from its parent and leaves it owned by the world
    pub(crate) fn detach(&mut self, child: Serial) -> Result<Parent, OwnershipError> {
        let item = self
            .items
            .get_mut(&child)
            .ok_or(OwnershipError::MissingEntity { serial: child })?;
        let previous = item.parent();
        item.set_parent(Parent::World);
        match previous {
            Parent::World => {}
            Parent::Item(container) => {
                if let Some(container) = self.items.get_mut(&container) {
                    container.remove_content(child);
                }
            }
            Parent::Mobile(holder) => {
                if let Some(holder) = self.mobiles.get_mut(&holder) {
                    holder.remove_equipment(child);
                }
            }
        }
        Ok(previous)
    }

    /// Breaks a corrupt chain at `child`: the item is re-parented to the
    /// world and parked on the internal shard so it is never broadcast
    pub(crate) fn truncate_chain(&mut self, child: Serial) {
        if self.detach(child).is_ok() {
            if let Some(item) = self.items.get_mut(&child) {
                item.set_shard(ShardId::INTERNAL);
            }
        }
    }

    /// The secure trade whose container holds `serial`, searching upwards
    pub fn secure_trade_of(&self, serial: Serial) -> Option<TradeId> {
        let mut visited = HashSet::new();
        let mut current = serial;
        while visited.insert(current) {
            let Ok(Parent::Item(container)) = self.parent_of(current) else {
                return None;
            };
            let item = self.items.get(&container)?;
            if let Some(trade) = item.secure_trade() {
                return Some(trade);
            }
            current = container;
        }
        None
    }

    /// All items below `serial`, children before their parents
    pub fn descendants(&self, serial: Serial) -> Vec<Serial> {
        let mut output = Vec::new();
        let mut visited = HashSet::new();
        self.collect_descendants(serial, &mut visited, &mut output);
        output
    }

    fn collect_descendants(&self, serial: Serial, visited: &mut HashSet<Serial>, output: &mut Vec<Serial>) {
        if !visited.insert(serial) {
            return;
        }
        let children: &[Serial] = match self.entity(serial) {
            Some(EntityRef::Item(item)) => item.contents(),
            Some(EntityRef::Mobile(mobile)) => mobile.equipment(),
            None => return,
        };
        for child in children {
            self.collect_descendants(*child, visited, output);
            output.push(*child);
        }
    }
}
