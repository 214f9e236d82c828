use log::{info, warn};

use vesper_shared::{
    Direction, DirtyFlags, GuildId, Notoriety, ObserverKey, OutgoingPacket, PacketError, Point3D,
    Serial, ShardId, TradeId,
};

use crate::{
    entity::{
        item::{ContainerAccess, Item, Layer},
        mobile::{Mobile, Stats},
        parent::Parent,
    },
    error::WorldError,
    messages::message_factory::MessageFactory,
    transport::Outbox,
    world::observer_rules::can_see,
};

use super::world_server::WorldServer;

const TRADE_CONTAINER_GRAPHIC: u16 = 0x1E5E;
const TRADE_CONTAINER_GUMP: u16 = 0x866;

impl<F: MessageFactory, O: Outbox> WorldServer<F, O> {
    fn with_item<R>(&mut self, serial: Serial, update: impl FnOnce(&mut Item) -> R) -> Result<R, WorldError> {
        let item = self
            .table
            .item_mut(serial)
            .ok_or(WorldError::EntityNotFound { serial })?;
        Ok(update(item))
    }

    fn with_mobile<R>(&mut self, serial: Serial, update: impl FnOnce(&mut Mobile) -> R) -> Result<R, WorldError> {
        let mobile = self
            .table
            .mobile_mut(serial)
            .ok_or(WorldError::EntityNotFound { serial })?;
        Ok(update(mobile))
    }

    // Items

    /// Moves an item within its parent: world coordinates for a root item,
    /// a spot inside the container otherwise
    pub fn set_item_location(&mut self, serial: Serial, location: Point3D) -> Result<(), WorldError> {
        let (parent, shard) = self.with_item(serial, |item| {
            item.set_location(location);
            (item.parent(), item.shard())
        })?;
        if parent.is_world() && !shard.is_internal() {
            self.index.place_entity(serial, shard, location);
        }
        self.mark_item_dirty(serial, DirtyFlags::FULL_RESYNC);
        Ok(())
    }

    pub fn set_item_graphic(&mut self, serial: Serial, graphic: u16) -> Result<(), WorldError> {
        self.with_item(serial, |item| item.set_graphic(graphic))?;
        self.mark_item_dirty(serial, DirtyFlags::FULL_RESYNC);
        self.invalidate_properties(serial);
        Ok(())
    }

    pub fn set_item_hue(&mut self, serial: Serial, hue: u16) -> Result<(), WorldError> {
        self.with_item(serial, |item| item.set_hue(hue))?;
        self.mark_item_dirty(serial, DirtyFlags::FULL_RESYNC);
        Ok(())
    }

    pub fn set_item_amount(&mut self, serial: Serial, amount: u16) -> Result<(), WorldError> {
        self.with_item(serial, |item| item.set_amount(amount))?;
        self.mark_item_dirty(serial, DirtyFlags::FULL_RESYNC);
        self.invalidate_properties(serial);
        Ok(())
    }

    pub fn set_item_direction(&mut self, serial: Serial, direction: Direction) -> Result<(), WorldError> {
        self.with_item(serial, |item| item.set_direction(direction))?;
        self.mark_item_dirty(serial, DirtyFlags::POSITION);
        Ok(())
    }

    /// Custom name. `None` falls back to the graphic's default name.
    pub fn set_item_name(&mut self, serial: Serial, name: Option<String>) -> Result<(), WorldError> {
        self.with_item(serial, |item| item.set_name(name))?;
        self.invalidate_properties(serial);
        Ok(())
    }

    pub fn set_item_weight(&mut self, serial: Serial, weight: Option<f32>) -> Result<(), WorldError> {
        self.with_item(serial, |item| item.set_weight(weight))?;
        self.invalidate_properties(serial);
        Ok(())
    }

    /// Hiding an item removes it from every client that can no longer see it
    pub fn set_item_visible(&mut self, serial: Serial, visible: bool) -> Result<(), WorldError> {
        let current = self.with_item(serial, |item| item.visible())?;
        if current == visible {
            return Ok(());
        }
        let audience = if visible { Vec::new() } else { self.audience_keys(serial) };
        self.with_item(serial, |item| item.set_visible(visible))?;
        self.mark_item_dirty(serial, DirtyFlags::FULL_RESYNC);
        self.remove_for_blind(serial, audience)?;
        Ok(())
    }

    // Mobiles

    /// Places a mobile, and its observer if connected. A shard change
    /// removes it from the clients it leaves behind, then resends the full
    /// representation and the session's initial view.
    pub fn move_mobile(&mut self, serial: Serial, shard: ShardId, location: Point3D) -> Result<(), WorldError> {
        let leaving = self
            .table
            .mobile(serial)
            .map(|mobile| mobile.shard() != shard && !mobile.shard().is_internal())
            .unwrap_or(false);
        let left_behind = if leaving { self.audience_keys(serial) } else { Vec::new() };
        let (previous, session) = self.with_mobile(serial, |mobile| {
            let previous = mobile.shard();
            mobile.set_location(shard, location);
            (previous, mobile.session())
        })?;

        if shard.is_internal() {
            self.index.remove_entity(serial);
        } else {
            self.index.place_entity(serial, shard, location);
        }
        if let Some(key) = session {
            self.index.place_observer(key, shard, location);
        }

        if previous == shard && !shard.is_internal() {
            self.mark_mobile_dirty(serial, DirtyFlags::POSITION);
        } else {
            self.send_remove(serial, left_behind)?;
            self.mark_mobile_dirty(serial, DirtyFlags::FULL_RESYNC);
            if let Some(key) = session {
                self.send_everything(key)?;
            }
        }
        Ok(())
    }

    pub fn set_mobile_direction(&mut self, serial: Serial, direction: Direction) -> Result<(), WorldError> {
        self.with_mobile(serial, |mobile| mobile.set_direction(direction))?;
        self.mark_mobile_dirty(serial, DirtyFlags::POSITION);
        Ok(())
    }

    pub fn set_mobile_body(&mut self, serial: Serial, body: u16) -> Result<(), WorldError> {
        self.with_mobile(serial, |mobile| mobile.set_body(body))?;
        self.mark_mobile_dirty(serial, DirtyFlags::FULL_RESYNC);
        Ok(())
    }

    pub fn set_mobile_hue(&mut self, serial: Serial, hue: u16) -> Result<(), WorldError> {
        self.with_mobile(serial, |mobile| mobile.set_hue(hue))?;
        self.mark_mobile_dirty(serial, DirtyFlags::FULL_RESYNC);
        Ok(())
    }

    pub fn set_mobile_hits(&mut self, serial: Serial, hits: u16, hits_max: u16) -> Result<(), WorldError> {
        self.with_mobile(serial, |mobile| mobile.set_hits(hits, hits_max))?;
        self.mark_mobile_dirty(serial, DirtyFlags::HITS);
        Ok(())
    }

    pub fn set_mobile_name(&mut self, serial: Serial, name: impl Into<String>) -> Result<(), WorldError> {
        let name = name.into();
        self.with_mobile(serial, |mobile| mobile.set_name(name))?;
        self.mark_mobile_dirty(serial, DirtyFlags::NAME);
        self.invalidate_properties(serial);
        Ok(())
    }

    pub fn set_mobile_notoriety(&mut self, serial: Serial, notoriety: Notoriety) -> Result<(), WorldError> {
        self.with_mobile(serial, |mobile| mobile.set_notoriety(notoriety))?;
        self.mark_mobile_dirty(serial, DirtyFlags::NOTORIETY);
        Ok(())
    }

    pub fn set_mobile_guild(&mut self, serial: Serial, guild: Option<GuildId>) -> Result<(), WorldError> {
        self.with_mobile(serial, |mobile| mobile.set_guild(guild))?;
        self.mark_mobile_dirty(serial, DirtyFlags::NOTORIETY);
        self.invalidate_properties(serial);
        Ok(())
    }

    pub fn set_mobile_stats(&mut self, serial: Serial, stats: Stats) -> Result<(), WorldError> {
        self.with_mobile(serial, |mobile| mobile.set_stats(stats))?;
        self.mark_mobile_dirty(serial, DirtyFlags::STATS);
        Ok(())
    }

    /// Hiding a mobile removes it from every client that can no longer
    /// see it; higher ranks keep it with the hidden flag set
    pub fn set_mobile_hidden(&mut self, serial: Serial, hidden: bool) -> Result<(), WorldError> {
        let current = self.with_mobile(serial, |mobile| mobile.hidden())?;
        if current == hidden {
            return Ok(());
        }
        let audience = if hidden { self.audience_keys(serial) } else { Vec::new() };
        self.with_mobile(serial, |mobile| mobile.set_hidden(hidden))?;
        self.mark_mobile_dirty(serial, DirtyFlags::FULL_RESYNC);
        self.remove_for_blind(serial, audience)?;
        Ok(())
    }

    // Placement

    pub fn drop_to_world(&mut self, serial: Serial, shard: ShardId, location: Point3D) -> Result<(), WorldError> {
        let previous = self.table.attach(serial, Parent::World)?;
        self.with_item(serial, |item| {
            item.set_shard(shard);
            item.set_location(location);
        })?;
        if shard.is_internal() {
            self.index.remove_entity(serial);
        } else {
            self.index.place_entity(serial, shard, location);
        }
        self.refresh_previous_parent(previous);
        self.mark_item_dirty(serial, DirtyFlags::FULL_RESYNC);
        Ok(())
    }

    pub fn add_to_container(&mut self, serial: Serial, container: Serial, location: Point3D) -> Result<(), WorldError> {
        let target = self
            .table
            .item(container)
            .ok_or(WorldError::EntityNotFound { serial: container })?;
        if !target.is_container() {
            return Err(WorldError::NotAContainer { serial: container });
        }
        let previous = self.table.attach(serial, Parent::Item(container))?;
        self.with_item(serial, |item| item.set_location(location))?;
        self.index.remove_entity(serial);
        self.refresh_previous_parent(previous);
        self.invalidate_properties(container);
        self.mark_item_dirty(serial, DirtyFlags::FULL_RESYNC);
        Ok(())
    }

    /// Puts an item on the layer it declares
    pub fn equip(&mut self, serial: Serial, holder: Serial) -> Result<(), WorldError> {
        let layer = self
            .table
            .item(serial)
            .ok_or(WorldError::EntityNotFound { serial })?
            .layer()
            .ok_or(WorldError::NoLayer { serial })?;
        let mobile = self
            .table
            .mobile(holder)
            .ok_or(WorldError::EntityNotFound { serial: holder })?;
        let occupant = mobile.equipment().iter().copied().find(|equipped| {
            *equipped != serial && self.table.item(*equipped).and_then(|item| item.layer()) == Some(layer)
        });
        if let Some(occupant) = occupant {
            return Err(WorldError::LayerOccupied {
                holder,
                layer,
                occupant,
            });
        }

        let previous = self.table.attach(serial, Parent::Mobile(holder))?;
        self.index.remove_entity(serial);
        self.refresh_previous_parent(previous);
        self.mark_item_dirty(serial, DirtyFlags::FULL_RESYNC);
        Ok(())
    }

    fn refresh_previous_parent(&mut self, previous: Parent) {
        if let Parent::Item(container) = previous {
            self.invalidate_properties(container);
        }
    }

    // Containers

    /// Opens a container for `viewer`'s session: the container becomes part
    /// of the viewer's scope until it closes it or walks away. Returns the
    /// number of packets sent.
    pub fn open_container(&mut self, viewer: Serial, container: Serial) -> Result<usize, WorldError> {
        let target = self
            .table
            .item(container)
            .ok_or(WorldError::EntityNotFound { serial: container })?;
        if !target.is_container() {
            return Err(WorldError::NotAContainer { serial: container });
        }
        let scoped = target.is_non_public_container();

        let mobile = self
            .table
            .mobile(viewer)
            .ok_or(WorldError::EntityNotFound { serial: viewer })?;
        let session = mobile
            .session()
            .and_then(|key| self.sessions.get(&key))
            .ok_or(WorldError::NotConnected { serial: viewer })?;
        let (key, variant, range) = (session.key(), session.variant(), session.update_range());

        let (shard, location) = self.table.world_location(container)?;
        let reachable = mobile.shard() == shard && mobile.location().in_range(&location, range);
        if !reachable || !can_see(&self.table, mobile, container) {
            return Err(WorldError::OutOfRange {
                viewer,
                serial: container,
            });
        }

        if scoped {
            if let Some(target) = self.table.item_mut(container) {
                target.add_viewer(viewer);
            }
        }

        let target = self
            .table
            .item(container)
            .ok_or(WorldError::EntityNotFound { serial: container })?;
        let display = self.factory.container_display(target, variant)?.share();
        let content = self.factory.container_content(&self.table, target, variant)?.share();
        self.outbox.send(key, display);
        self.outbox.send(key, content);
        Ok(2)
    }

    /// Returns true if `viewer` had the container open
    pub fn close_container(&mut self, viewer: Serial, container: Serial) -> bool {
        self.table
            .item_mut(container)
            .map(|target| target.remove_viewer(viewer))
            .unwrap_or(false)
    }

    // Secure trades

    /// Opens a secure trade: each side gets a trade container attached to it
    /// and both parties are shown both containers
    pub fn open_trade(&mut self, from: Serial, to: Serial) -> Result<TradeId, WorldError> {
        if from == to {
            return Err(WorldError::SelfTrade { serial: from });
        }
        for party in [from, to] {
            if self.table.mobile(party).is_none() {
                return Err(WorldError::EntityNotFound { serial: party });
            }
        }

        let id = self.trades.next_id();
        let from_container = self.create_trade_container(id, from)?;
        let to_container = self.create_trade_container(id, to)?;
        self.trades.insert(id, from, to, from_container, to_container);

        let parties: Vec<ObserverKey> = [from, to]
            .iter()
            .filter_map(|party| self.table.mobile(*party).and_then(|mobile| mobile.session()))
            .collect();
        for (container, holder) in [(from_container, from), (to_container, to)] {
            let Some(item) = self.table.item(container) else {
                continue;
            };
            let packet = self.factory.equip_update(item, holder)?.share();
            for key in parties.iter() {
                self.outbox.send(*key, packet.clone());
            }
        }

        info!("Secure trade {} opened between {} and {}", id, from, to);
        Ok(id)
    }

    fn create_trade_container(&mut self, id: TradeId, holder: Serial) -> Result<Serial, WorldError> {
        let serial = self.serials.next_item()?;
        let container = Item::new(serial, TRADE_CONTAINER_GRAPHIC)
            .with_container(ContainerAccess::SecureTrade(id), TRADE_CONTAINER_GUMP);
        self.table.insert_item(container)?;
        self.table.attach(serial, Parent::Mobile(holder))?;
        Ok(serial)
    }

    /// Ends a secure trade. Whatever each side put up goes back to its
    /// owner's backpack, or to the owner's feet when there is none, and both
    /// trade containers are deleted.
    pub fn close_trade(&mut self, id: TradeId) -> Result<(), WorldError> {
        let sides = self
            .trades
            .get(id)
            .map(|trade| [(trade.from(), trade.from_container()), (trade.to(), trade.to_container())])
            .ok_or(WorldError::TradeNotFound { trade: id })?;

        for (owner, container) in sides {
            let contents = self
                .table
                .item(container)
                .map(|item| item.contents().to_vec())
                .unwrap_or_default();
            for child in contents {
                if let Err(error) = self.return_to_owner(child, owner) {
                    warn!("Could not return {} from trade {} to {}: {}", child, id, owner, error);
                }
            }
        }

        // both parties hear about both containers only while the trade links them
        let audiences: Vec<(Serial, Vec<ObserverKey>)> = sides
            .iter()
            .map(|(_, container)| (*container, self.audience_keys(*container)))
            .collect();
        self.trades.remove(id);
        for (container, audience) in audiences {
            if self.table.contains(container) {
                self.send_remove(container, audience)?;
                self.discard_item(container);
            }
        }

        info!("Secure trade {} closed", id);
        Ok(())
    }

    fn return_to_owner(&mut self, serial: Serial, owner: Serial) -> Result<(), WorldError> {
        let Some(mobile) = self.table.mobile(owner) else {
            return self.delete_item(serial);
        };
        let backpack = mobile.equipment().iter().copied().find(|equipped| {
            self.table
                .item(*equipped)
                .map(|item| item.layer() == Some(Layer::BACKPACK) && item.is_container())
                .unwrap_or(false)
        });
        match backpack {
            Some(backpack) => self.add_to_container(serial, backpack, Point3D::default()),
            None => {
                let (shard, location) = (mobile.shard(), mobile.location());
                self.drop_to_world(serial, shard, location)
            }
        }
    }

    // Deletion

    /// Deletes an item and everything inside it. Every client that could see
    /// it is told to remove it; queued flushes for the deleted entities are
    /// skipped. Deleting a trade container cancels the trade.
    pub fn delete_item(&mut self, serial: Serial) -> Result<(), WorldError> {
        let item = self.table.item(serial).ok_or(WorldError::EntityNotFound { serial })?;
        if let Some(id) = item.secure_trade() {
            if self.trades.get(id).is_some() {
                return self.close_trade(id);
            }
        }

        let audience = self.audience_keys(serial);
        self.send_remove(serial, audience)?;
        self.discard_item(serial);
        Ok(())
    }

    /// Drops an item and its contents without telling anyone
    fn discard_item(&mut self, serial: Serial) {
        let Some(parent) = self.table.item(serial).map(|item| item.parent()) else {
            return;
        };
        self.purge_descendants(serial);
        if let Err(error) = self.table.detach(serial) {
            warn!("Deleting {} with a broken owner link: {}", serial, error);
        }
        self.index.remove_entity(serial);
        self.table.remove_item(serial);
        self.refresh_previous_parent(parent);
    }

    /// Deletes a mobile with its equipment, cancels its trades and ends its
    /// session
    pub fn delete_mobile(&mut self, serial: Serial) -> Result<(), WorldError> {
        if !self.table.contains(serial) || !serial.is_mobile() {
            return Err(WorldError::EntityNotFound { serial });
        }
        for id in self.trades.involving(serial) {
            if let Err(error) = self.close_trade(id) {
                warn!("Could not close trade {} of deleted mobile {}: {}", id, serial, error);
            }
        }

        let audience = self.audience_keys(serial);
        self.send_remove(serial, audience)?;

        self.purge_descendants(serial);
        if let Some(key) = self.table.mobile(serial).and_then(|mobile| mobile.session()) {
            self.disconnect(key)?;
        }
        self.index.remove_entity(serial);
        self.table.remove_mobile(serial);
        Ok(())
    }

    /// Silently drops everything below `serial`, children first. Clients
    /// forget contents along with their root.
    fn purge_descendants(&mut self, serial: Serial) {
        for child in self.table.descendants(serial) {
            if let Some(id) = self.table.item(child).and_then(|item| item.secure_trade()) {
                self.trades.remove(id);
            }
            self.index.remove_entity(child);
            self.table.remove_item(child);
        }
    }

    /// Sessions currently receiving updates about `serial`, excluding a
    /// mobile's own session
    fn audience_keys(&mut self, serial: Serial) -> Vec<ObserverKey> {
        self.recipients.clear();
        if serial.is_item() {
            if let Err(error) = self.processor().resolve_item_audience(serial) {
                warn!("No audience for {}: {}", serial, error);
                self.recipients.clear();
            }
        } else if let Some(mobile) = self.table.mobile(serial) {
            let (shard, location, own) = (mobile.shard(), mobile.location(), mobile.session());
            self.processor().resolve_area(serial, shard, location, own);
        }
        let keys = self.recipients.iter().map(|recipient| recipient.key).collect();
        self.recipients.clear();
        keys
    }

    fn send_remove(&mut self, serial: Serial, audience: Vec<ObserverKey>) -> Result<(), WorldError> {
        if audience.is_empty() {
            return Ok(());
        }
        let packet = self.durable_remove(serial)?;
        for key in audience {
            self.outbox.send(key, packet.clone());
        }
        Ok(())
    }

    /// Sends the remove packet to each session in `audience` whose mobile
    /// lost sight of `serial`
    fn remove_for_blind(&mut self, serial: Serial, audience: Vec<ObserverKey>) -> Result<(), WorldError> {
        for key in audience {
            let Some(viewer) = self.sessions.get(&key).map(|session| session.mobile()) else {
                continue;
            };
            if !self.can_see(viewer, serial) {
                let packet = self.durable_remove(serial)?;
                self.outbox.send(key, packet);
            }
        }
        Ok(())
    }

    fn durable_remove(&mut self, serial: Serial) -> Result<OutgoingPacket, PacketError> {
        if let Some(packet) = self
            .table
            .entity(serial)
            .and_then(|entity| entity.cache().remove().cloned())
        {
            return Ok(packet);
        }
        let packet = self.factory.remove(serial)?.share();
        if let Some(cache) = self.table.cache_mut(serial) {
            cache.remove = Some(packet.clone());
        }
        Ok(packet)
    }
}
