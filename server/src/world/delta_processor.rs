use log::error;

use vesper_shared::{
    DirtyFlags, Notoriety, ObserverKey, OutgoingPacket, Packet, PacketError, Point3D,
    ProtocolVariant, Serial, ShardId,
};

use crate::{
    entity::{error::OwnershipError, parent::Parent, EntityRef},
    error::DeltaError,
    messages::message_factory::MessageFactory,
    server::ServerConfig,
    transport::Outbox,
    user::Sessions,
    world::{
        container_scope::resolve_container_audience,
        entity_table::EntityTable,
        message_cache::FlushScratch,
        observer_rules::{can_see, notoriety_of},
        secure_trade::SecureTrades,
        visibility_index::VisibilityIndex,
    },
};

/// One observer that will receive this entity's update, with the two axes
/// along which its packets may differ from everyone else's
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Recipient {
    pub(crate) key: ObserverKey,
    pub(crate) variant: ProtocolVariant,
    pub(crate) notoriety: Notoriety,
}

/// Borrowed view of the world for the duration of one entity's flush
pub(crate) struct DeltaProcessor<'w, F: MessageFactory, O: Outbox> {
    pub(crate) table: &'w mut EntityTable,
    pub(crate) sessions: &'w Sessions,
    pub(crate) index: &'w dyn VisibilityIndex,
    pub(crate) trades: &'w SecureTrades,
    pub(crate) config: &'w ServerConfig,
    pub(crate) scratch: &'w mut FlushScratch,
    pub(crate) candidates: &'w mut Vec<ObserverKey>,
    pub(crate) recipients: &'w mut Vec<Recipient>,
    pub(crate) factory: &'w mut F,
    pub(crate) outbox: &'w mut O,
}

impl<'w, F: MessageFactory, O: Outbox> DeltaProcessor<'w, F, O> {
    /// Sends whatever `flags` call for about one item. Returns the number of
    /// packets handed to the outbox.
    pub(crate) fn process_item(&mut self, serial: Serial, flags: DirtyFlags) -> Result<usize, DeltaError> {
        let Some(parent) = self.table.item(serial).map(|item| item.parent()) else {
            return Ok(0);
        };
        self.resolve_item_audience(serial)?;
        if self.recipients.is_empty() {
            return Ok(0);
        }
        // avoid priority among observers
        fastrand::shuffle(self.recipients);

        let packet_error = |source: PacketError| DeltaError::Packet { serial, source };
        let mut sent = 0;

        if flags.contains(DirtyFlags::FULL_RESYNC) || flags.wants_position_only() {
            for index in 0..self.recipients.len() {
                let recipient = self.recipients[index];
                let packet = match parent {
                    Parent::World => self.durable_full(serial, recipient.variant),
                    Parent::Item(container) => self.container_update(serial, container, recipient.variant),
                    Parent::Mobile(holder) => self.equip_update(serial, holder),
                }
                .map_err(packet_error)?;
                self.outbox.send(recipient.key, packet);
                sent += 1;
            }
        }

        if flags.contains(DirtyFlags::PROPERTIES) && self.config.properties_enabled {
            if let Some(packet) = self.durable_properties(serial).map_err(packet_error)? {
                for recipient in self.recipients.iter() {
                    self.outbox.send(recipient.key, packet.clone());
                    sent += 1;
                }
            }
        }

        Ok(sent)
    }

    /// Fills `recipients` with everyone who hears about the item: the
    /// bounded audience of a non-public container it sits in, or else every
    /// observer around its root. A trade container is its own scope.
    pub(crate) fn resolve_item_audience(&mut self, serial: Serial) -> Result<(), DeltaError> {
        self.recipients.clear();
        let Some((parent, trade)) = self.table.item(serial).map(|item| (item.parent(), item.secure_trade())) else {
            return Ok(());
        };
        let scoped_container = match parent {
            _ if trade.is_some() => Some(serial),
            Parent::Item(container) => self
                .table
                .item(container)
                .filter(|container| container.is_non_public_container())
                .map(|container| container.serial()),
            Parent::World | Parent::Mobile(_) => None,
        };

        match scoped_container {
            Some(container) => {
                if let Err(source) = resolve_container_audience(
                    self.table,
                    self.sessions,
                    self.trades,
                    serial,
                    container,
                    self.recipients,
                ) {
                    return Err(self.ownership_failure(serial, source));
                }
            }
            None => {
                let (shard, location) = match self.table.world_location(serial) {
                    Ok(position) => position,
                    Err(source) => return Err(self.ownership_failure(serial, source)),
                };
                self.resolve_area(serial, shard, location, None);
            }
        }
        Ok(())
    }

    /// Sends whatever `flags` call for about one mobile, to the observers
    /// around it and to the mobile's own session
    pub(crate) fn process_mobile(&mut self, serial: Serial, flags: DirtyFlags) -> Result<usize, DeltaError> {
        let Some(mobile) = self.table.mobile(serial) else {
            return Ok(0);
        };
        let (shard, location) = (mobile.shard(), mobile.location());
        if shard.is_internal() {
            return Ok(0);
        }
        let own = mobile
            .session()
            .and_then(|key| self.sessions.get(&key))
            .map(|session| (session.key(), session.variant()));

        self.recipients.clear();
        self.resolve_area(serial, shard, location, own.map(|(key, _)| key));
        fastrand::shuffle(self.recipients);

        let packet_error = |source: PacketError| DeltaError::Packet { serial, source };
        let mut sent = 0;

        {
            let Self {
                table,
                scratch,
                recipients,
                factory,
                outbox,
                ..
            } = self;
            let table: &EntityTable = table;
            let Some(mobile) = table.mobile(serial) else {
                return Ok(0);
            };

            let full = flags.contains(DirtyFlags::FULL_RESYNC);
            if full {
                for recipient in recipients.iter() {
                    let packet = scratch
                        .full
                        .get_or_try_build(recipient.variant, Some(recipient.notoriety), || {
                            factory
                                .full(table, EntityRef::Mobile(mobile), recipient.variant, recipient.notoriety)
                                .map(Packet::share)
                        })
                        .map_err(packet_error)?;
                    outbox.send(recipient.key, packet);
                    sent += 1;
                }
            } else if flags.wants_position_only() || flags.contains(DirtyFlags::NOTORIETY) {
                for recipient in recipients.iter() {
                    let packet = scratch
                        .moving
                        .get_or_try_build(recipient.variant, Some(recipient.notoriety), || {
                            factory
                                .moving(EntityRef::Mobile(mobile), recipient.variant, recipient.notoriety)
                                .map(Packet::share)
                        })
                        .map_err(packet_error)?;
                    outbox.send(recipient.key, packet);
                    sent += 1;
                }
            }

            if let Some((key, variant)) = own {
                if full || flags.contains(DirtyFlags::POSITION) {
                    let packet = scratch
                        .self_update
                        .get_or_try_build(variant, None, || factory.self_update(mobile, variant).map(Packet::share))
                        .map_err(packet_error)?;
                    outbox.send(key, packet);
                    sent += 1;
                }
            }

            if flags.contains(DirtyFlags::HITS) {
                for recipient in recipients.iter() {
                    let packet = scratch
                        .hits
                        .get_or_try_build(|| factory.hits(mobile, false).map(Packet::share))
                        .map_err(packet_error)?;
                    outbox.send(recipient.key, packet);
                    sent += 1;
                }
                if let Some((key, _)) = own {
                    let packet = scratch
                        .exact_hits
                        .get_or_try_build(|| factory.hits(mobile, true).map(Packet::share))
                        .map_err(packet_error)?;
                    outbox.send(key, packet);
                    sent += 1;
                }
            }

            if flags.contains(DirtyFlags::NAME) {
                let audience = recipients.iter().map(|recipient| recipient.key).chain(own.map(|(key, _)| key));
                for key in audience {
                    let packet = scratch
                        .status
                        .get_or_try_build(|| factory.status(mobile, false).map(Packet::share))
                        .map_err(packet_error)?;
                    outbox.send(key, packet);
                    sent += 1;
                }
            }

            if flags.contains(DirtyFlags::STATS) {
                if let Some((key, _)) = own {
                    let packet = scratch
                        .private_status
                        .get_or_try_build(|| factory.status(mobile, true).map(Packet::share))
                        .map_err(packet_error)?;
                    outbox.send(key, packet);
                    sent += 1;
                }
            }
        }

        if flags.contains(DirtyFlags::PROPERTIES) && self.config.properties_enabled {
            if let Some(packet) = self.durable_properties(serial).map_err(packet_error)? {
                let audience = self
                    .recipients
                    .iter()
                    .map(|recipient| recipient.key)
                    .chain(own.map(|(key, _)| key));
                for key in audience {
                    self.outbox.send(key, packet.clone());
                    sent += 1;
                }
            }
        }

        Ok(sent)
    }

    /// Fills `recipients` with every session within the subject's reach
    /// that accepts the update: inside its own update range and able to see
    /// the subject. The query radius is the largest range any session may
    /// have; each session then narrows it to its own.
    pub(crate) fn resolve_area(
        &mut self,
        subject: Serial,
        shard: ShardId,
        location: Point3D,
        exclude: Option<ObserverKey>,
    ) {
        if shard.is_internal() {
            return;
        }
        self.candidates.clear();
        self.index.observers_in_range(
            shard,
            location,
            self.config.delta.max_update_range,
            self.candidates,
        );

        let table: &EntityTable = self.table;
        let target = table.mobile(subject);
        for key in self.candidates.iter() {
            if Some(*key) == exclude {
                continue;
            }
            let Some(session) = self.sessions.get(key) else {
                continue;
            };
            let Some(observer) = table.mobile(session.mobile()) else {
                continue;
            };
            if observer.shard() != shard || !observer.location().in_range(&location, session.update_range()) {
                continue;
            }
            if !can_see(table, observer, subject) {
                continue;
            }
            let notoriety = target
                .map(|target| notoriety_of(observer, target))
                .unwrap_or_default();
            self.recipients.push(Recipient {
                key: *key,
                variant: session.variant(),
                notoriety,
            });
        }
    }

    fn ownership_failure(&mut self, serial: Serial, source: OwnershipError) -> DeltaError {
        if let OwnershipError::Cycle { child, parent } = source {
            error!(
                "Owner chain of {} loops through {} -> {}; truncating at {}",
                serial, child, parent, child
            );
            self.table.truncate_chain(child);
        }
        DeltaError::Ownership { serial, source }
    }

    /// The item's full representation for `variant`, built once and kept
    /// until a setter invalidates it
    pub(crate) fn durable_full(&mut self, serial: Serial, variant: ProtocolVariant) -> Result<OutgoingPacket, PacketError> {
        let Some(entity) = self.table.entity(serial) else {
            return Err(PacketError::MissingSubject { serial });
        };
        if let Some(packet) = entity.cache().full(variant) {
            return Ok(packet.clone());
        }
        let packet = self
            .factory
            .full(self.table, entity, variant, Notoriety::default())?
            .share();
        if let Some(cache) = self.table.cache_mut(serial) {
            cache.full[variant.slot()] = Some(packet.clone());
        }
        Ok(packet)
    }

    pub(crate) fn durable_properties(&mut self, serial: Serial) -> Result<Option<OutgoingPacket>, PacketError> {
        let Some(cache) = self.table.entity(serial).map(|entity| entity.cache()) else {
            return Ok(None);
        };
        if let Some(packet) = cache.property_packet() {
            return Ok(Some(packet.clone()));
        }
        let Some(properties) = cache.properties() else {
            return Ok(None);
        };
        let packet = self.factory.property_summary(serial, properties)?.share();
        if let Some(cache) = self.table.cache_mut(serial) {
            cache.property_packet = Some(packet.clone());
        }
        Ok(Some(packet))
    }

    fn container_update(
        &mut self,
        serial: Serial,
        container: Serial,
        variant: ProtocolVariant,
    ) -> Result<OutgoingPacket, PacketError> {
        let Some(item) = self.table.item(serial) else {
            return Err(PacketError::MissingSubject { serial });
        };
        let factory = &mut self.factory;
        self.scratch.container_update.get_or_try_build(variant, None, || {
            factory.container_update(item, container, variant).map(Packet::share)
        })
    }

    fn equip_update(&mut self, serial: Serial, holder: Serial) -> Result<OutgoingPacket, PacketError> {
        let Some(item) = self.table.item(serial) else {
            return Err(PacketError::MissingSubject { serial });
        };
        let factory = &mut self.factory;
        self.scratch
            .equip_update
            .get_or_try_build(|| factory.equip_update(item, holder).map(Packet::share))
    }
}
