use log::trace;

use vesper_shared::{Notoriety, Point3D, Serial, ShardId};

use crate::{
    entity::{error::OwnershipError, parent::RootOwner},
    user::Sessions,
    world::{
        delta_processor::Recipient,
        entity_table::EntityTable,
        observer_rules::can_see,
        secure_trade::SecureTrades,
    },
};

struct Audience<'s> {
    sessions: &'s Sessions,
    shard: ShardId,
    location: Point3D,
    container: Serial,
}

impl<'s> Audience<'s> {
    /// Adds the mobile's session when it may hear about the container.
    /// Returns false when the mobile is gone, offline or out of range.
    fn admit(&self, table: &EntityTable, mobile_serial: Serial, out: &mut Vec<Recipient>) -> bool {
        let Some(mobile) = table.mobile(mobile_serial) else {
            return false;
        };
        let Some(session) = mobile.session().and_then(|key| self.sessions.get(&key)) else {
            return false;
        };
        if mobile.shard() != self.shard || !mobile.location().in_range(&self.location, session.update_range()) {
            return false;
        }
        if out.iter().any(|recipient| recipient.key == session.key()) {
            return true;
        }
        if can_see(table, mobile, self.container) {
            out.push(Recipient {
                key: session.key(),
                variant: session.variant(),
                notoriety: Notoriety::default(),
            });
        }
        true
    }
}

/// Audience of an update to something inside a non-public container: the
/// holder, the other side of a secure trade and whoever has the container
/// open. Viewers that wandered off or changed shard are dropped from the
/// container as a side effect.
pub(crate) fn resolve_container_audience(
    table: &mut EntityTable,
    sessions: &Sessions,
    trades: &SecureTrades,
    subject: Serial,
    container: Serial,
    out: &mut Vec<Recipient>,
) -> Result<(), OwnershipError> {
    let (shard, location) = table.world_location(container)?;
    let holder = match table.resolve_root(container)? {
        RootOwner::Mobile(holder) => Some(holder),
        RootOwner::World(_) => None,
    };
    let audience = Audience {
        sessions,
        shard,
        location,
        container,
    };

    if let Some(holder) = holder {
        audience.admit(table, holder, out);

        let counterpart = table
            .item(subject)
            .and_then(|item| item.secure_trade())
            .or_else(|| table.secure_trade_of(subject))
            .and_then(|id| trades.get(id))
            .filter(|trade| trade.involves(holder))
            .map(|trade| trade.counterpart(holder));
        if let Some(counterpart) = counterpart {
            audience.admit(table, counterpart, out);
        }
    }

    let viewers = match table.item(container) {
        Some(item) if item.has_viewer_set() => item.viewers().to_vec(),
        _ => return Ok(()),
    };
    let mut kept = Vec::with_capacity(viewers.len());
    for viewer in viewers.iter().rev() {
        if audience.admit(table, *viewer, out) {
            kept.push(*viewer);
        } else {
            trace!("Pruning viewer {} from container {}", viewer, container);
        }
    }
    if kept.len() != viewers.len() {
        kept.reverse();
        if let Some(item) = table.item_mut(container) {
            item.set_viewers(kept);
        }
    }
    Ok(())
}
