use vesper_shared::{AccessLevel, Notoriety, Serial};

use crate::{
    entity::{mobile::Mobile, parent::Parent, EntityRef},
    world::entity_table::EntityTable,
};

// owner chains deeper than this are treated as broken
const MAX_CHAIN_DEPTH: usize = 64;

/// Whether `viewer` may perceive the entity at all. Concealment, staff
/// rank, shard and deletion all count; contained items inherit the answer
/// of everything above them.
pub fn can_see(table: &EntityTable, viewer: &Mobile, serial: Serial) -> bool {
    let mut current = serial;
    for _ in 0..MAX_CHAIN_DEPTH {
        if current == viewer.serial() {
            return true;
        }
        match table.entity(current) {
            None => return false,
            Some(EntityRef::Mobile(target)) => {
                if target.shard() != viewer.shard() || target.shard().is_internal() {
                    return false;
                }
                return !target.hidden() || viewer.access_level() > target.access_level();
            }
            Some(EntityRef::Item(item)) => {
                if !item.visible() && viewer.access_level() == AccessLevel::Player {
                    return false;
                }
                match item.parent() {
                    Parent::World => {
                        return item.shard() == viewer.shard() && !item.shard().is_internal();
                    }
                    Parent::Item(next) | Parent::Mobile(next) => current = next,
                }
            }
        }
    }
    false
}

/// Standing of `target` as shown to `viewer`
pub fn notoriety_of(viewer: &Mobile, target: &Mobile) -> Notoriety {
    if target.access_level() > AccessLevel::Player {
        return Notoriety::Invulnerable;
    }
    if viewer.serial() != target.serial() && viewer.guild().is_some() && viewer.guild() == target.guild() {
        return Notoriety::Ally;
    }
    target.notoriety()
}
