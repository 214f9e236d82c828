use log::{debug, info, trace, warn};

use vesper_shared::{DirtyFlags, EntityKind, ObserverKey, OutgoingPacket, Packet, ProtocolVariant, Serial};

use crate::{
    entity::{item::Item, mobile::Mobile, EntityRef},
    error::WorldError,
    messages::message_factory::MessageFactory,
    transport::Outbox,
    user::{SessionRef, Sessions},
    world::{
        delta_processor::{DeltaProcessor, Recipient},
        delta_queue::DeltaQueue,
        entity_table::EntityTable,
        message_cache::FlushScratch,
        observer_rules::{can_see, notoriety_of},
        sector_index::SectorIndex,
        secure_trade::SecureTrades,
        serial_allocator::SerialAllocator,
        visibility_index::VisibilityIndex,
    },
    ServerConfig,
};

/// Totals of one flush call
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Entities whose pending flags were consumed
    pub processed: usize,
    /// Queue entries whose entity was deleted in the meantime
    pub skipped: usize,
    /// Entities whose update could not be built. Their flags are cleared
    /// all the same.
    pub failed: usize,
    pub packets_sent: usize,
}

impl FlushReport {
    pub fn merge(&mut self, other: FlushReport) {
        self.processed += other.processed;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.packets_sent += other.packets_sent;
    }
}

pub(crate) enum StepOutcome {
    Skipped,
    Sent(usize),
    Failed,
}

/// The simulation-side world: every entity, every connected observer and
/// the per-kind queues of pending changes. Mutations mark entities dirty;
/// the scheduler turns the marks into packets by calling `flush_all` once
/// per tick.
pub struct WorldServer<F: MessageFactory, O: Outbox> {
    pub(crate) config: ServerConfig,
    // Entities
    pub(crate) table: EntityTable,
    pub(crate) serials: SerialAllocator,
    pub(crate) item_queue: DeltaQueue,
    pub(crate) mobile_queue: DeltaQueue,
    // Observers
    pub(crate) sessions: Sessions,
    pub(crate) index: Box<dyn VisibilityIndex>,
    pub(crate) trades: SecureTrades,
    // Flush
    pub(crate) scratch: FlushScratch,
    pub(crate) candidates: Vec<ObserverKey>,
    pub(crate) recipients: Vec<Recipient>,
    pub(crate) factory: F,
    pub(crate) outbox: O,
}

impl<F: MessageFactory, O: Outbox> WorldServer<F, O> {
    /// Create a new WorldServer backed by the default sector index
    pub fn new(config: ServerConfig, factory: F, outbox: O) -> Self {
        let index = Box::new(SectorIndex::new(config.sector_size));
        Self::with_index(config, index, factory, outbox)
    }

    pub fn with_index(config: ServerConfig, index: Box<dyn VisibilityIndex>, factory: F, outbox: O) -> Self {
        Self {
            config,
            table: EntityTable::new(),
            serials: SerialAllocator::new(),
            item_queue: DeltaQueue::new(),
            mobile_queue: DeltaQueue::new(),
            sessions: Sessions::new(),
            index,
            trades: SecureTrades::new(),
            scratch: FlushScratch::new(),
            candidates: Vec::new(),
            recipients: Vec::new(),
            factory,
            outbox,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn table(&self) -> &EntityTable {
        &self.table
    }

    pub fn item(&self, serial: Serial) -> Option<&Item> {
        self.table.item(serial)
    }

    pub fn mobile(&self, serial: Serial) -> Option<&Mobile> {
        self.table.mobile(serial)
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    pub fn outbox(&self) -> &O {
        &self.outbox
    }

    pub fn outbox_mut(&mut self) -> &mut O {
        &mut self.outbox
    }

    pub fn index(&self) -> &dyn VisibilityIndex {
        self.index.as_ref()
    }

    pub fn item_queue(&self) -> &DeltaQueue {
        &self.item_queue
    }

    pub fn mobile_queue(&self) -> &DeltaQueue {
        &self.mobile_queue
    }

    pub fn trades(&self) -> &SecureTrades {
        &self.trades
    }

    pub(crate) fn processor(&mut self) -> DeltaProcessor<'_, F, O> {
        DeltaProcessor {
            table: &mut self.table,
            sessions: &self.sessions,
            index: self.index.as_ref(),
            trades: &self.trades,
            config: &self.config,
            scratch: &mut self.scratch,
            candidates: &mut self.candidates,
            recipients: &mut self.recipients,
            factory: &mut self.factory,
            outbox: &mut self.outbox,
        }
    }

    // Entities

    pub fn create_item(&mut self, graphic: u16) -> Result<Serial, WorldError> {
        let serial = self.serials.next_item()?;
        self.table.insert_item(Item::new(serial, graphic))?;
        Ok(serial)
    }

    pub fn create_mobile(&mut self, name: &str, body: u16) -> Result<Serial, WorldError> {
        let serial = self.serials.next_mobile()?;
        self.table.insert_mobile(Mobile::new(serial, name, body))?;
        Ok(serial)
    }

    /// Adopts an item built elsewhere. It starts parked off-world; use
    /// `drop_to_world`, `add_to_container` or `equip` to place it.
    pub fn insert_item(&mut self, item: Item) -> Result<Serial, WorldError> {
        let serial = item.serial();
        self.table.insert_item(item)?;
        self.serials.reserve(serial);
        Ok(serial)
    }

    /// Adopts a mobile built elsewhere. It starts parked off-world; use
    /// `move_mobile` to place it.
    pub fn insert_mobile(&mut self, mobile: Mobile) -> Result<Serial, WorldError> {
        let serial = mobile.serial();
        self.table.insert_mobile(mobile)?;
        self.serials.reserve(serial);
        Ok(serial)
    }

    // Dirty marks

    /// Records pending changes on an entity and queues it once. Marks on
    /// unknown serials are accepted and do nothing.
    pub fn mark_dirty(&mut self, serial: Serial, flags: DirtyFlags) {
        match serial.kind() {
            Some(EntityKind::Item) => self.mark_item_dirty(serial, flags),
            Some(EntityKind::Mobile) => self.mark_mobile_dirty(serial, flags),
            None => trace!("Ignoring dirty mark on invalid serial {}", serial),
        }
    }

    pub fn mark_item_dirty(&mut self, serial: Serial, flags: DirtyFlags) {
        if flags.is_empty() {
            return;
        }
        let Some(item) = self.table.item_mut(serial) else {
            trace!("Ignoring dirty mark on missing item {}", serial);
            return;
        };
        item.delta.flags.insert(flags);
        if !item.delta.in_queue {
            item.delta.in_queue = true;
            self.item_queue.push(serial);
        }
    }

    pub fn mark_mobile_dirty(&mut self, serial: Serial, flags: DirtyFlags) {
        if flags.is_empty() {
            return;
        }
        let Some(mobile) = self.table.mobile_mut(serial) else {
            trace!("Ignoring dirty mark on missing mobile {}", serial);
            return;
        };
        mobile.delta.flags.insert(flags);
        if !mobile.delta.in_queue {
            mobile.delta.in_queue = true;
            self.mobile_queue.push(serial);
        }
    }

    /// Re-derives the entity's property summary and marks it dirty only if
    /// the summary's content hash moved
    pub fn invalidate_properties(&mut self, serial: Serial) {
        if !self.config.properties_enabled {
            return;
        }
        let list = match self.table.entity(serial) {
            Some(EntityRef::Item(item)) => item.describe(),
            Some(EntityRef::Mobile(mobile)) => mobile.describe(),
            None => return,
        };
        let changed = self
            .table
            .cache_mut(serial)
            .map(|cache| cache.replace_properties(list))
            .unwrap_or(false);
        if changed {
            self.mark_dirty(serial, DirtyFlags::PROPERTIES);
        }
    }

    // Flush

    /// Processes every mobile queued when the call began
    pub fn flush_mobiles(&mut self) -> FlushReport {
        self.flush(EntityKind::Mobile)
    }

    /// Processes every item queued when the call began
    pub fn flush_items(&mut self) -> FlushReport {
        self.flush(EntityKind::Item)
    }

    /// One heartbeat: mobiles first, then items
    pub fn flush_all(&mut self) -> FlushReport {
        let mut report = self.flush_mobiles();
        report.merge(self.flush_items());
        report
    }

    fn flush(&mut self, kind: EntityKind) -> FlushReport {
        let report = self.drain_snapshot(kind, |server, serial| server.process_queued(kind, serial));
        if report != FlushReport::default() {
            debug!("Flushed {:?} queue: {:?}", kind, report);
        }
        report
    }

    fn queue_mut(&mut self, kind: EntityKind) -> &mut DeltaQueue {
        match kind {
            EntityKind::Item => &mut self.item_queue,
            EntityKind::Mobile => &mut self.mobile_queue,
        }
    }

    /// Runs `step` on exactly as many entries as the queue held on entry.
    /// Anything queued by `step` itself waits for the next call.
    pub(crate) fn drain_snapshot<S>(&mut self, kind: EntityKind, mut step: S) -> FlushReport
    where
        S: FnMut(&mut Self, Serial) -> StepOutcome,
    {
        if !self.scratch.is_empty() {
            warn!("Transient packets outlived their flush; releasing them");
            self.scratch.clear();
        }

        let mut report = FlushReport::default();
        let snapshot = self.queue_mut(kind).len();
        for _ in 0..snapshot {
            let Some(serial) = self.queue_mut(kind).pop() else {
                break;
            };
            match step(self, serial) {
                StepOutcome::Skipped => report.skipped += 1,
                StepOutcome::Sent(count) => {
                    report.processed += 1;
                    report.packets_sent += count;
                }
                StepOutcome::Failed => {
                    report.processed += 1;
                    report.failed += 1;
                }
            }
            self.scratch.clear();
        }
        report
    }

    fn process_queued(&mut self, kind: EntityKind, serial: Serial) -> StepOutcome {
        let Some(delta) = self.table.delta_mut(serial) else {
            trace!("Skipping {}: deleted while queued", serial);
            return StepOutcome::Skipped;
        };
        // cleared before processing so a failing entity is never retried
        delta.in_queue = false;
        let flags = delta.flags.take();
        if flags.is_empty() {
            return StepOutcome::Sent(0);
        }

        let mut processor = self.processor();
        let result = match kind {
            EntityKind::Item => processor.process_item(serial, flags),
            EntityKind::Mobile => processor.process_mobile(serial, flags),
        };
        match result {
            Ok(sent) => StepOutcome::Sent(sent),
            Err(error) => {
                warn!("Failed to flush {} ({:?}): {}", error.serial(), flags, error);
                StepOutcome::Failed
            }
        }
    }

    // Sessions

    /// Attaches an observer to a mobile and sends it everything it can
    /// currently see. When the initial view cannot be built the session is
    /// dropped again and the mobile stays free.
    pub fn connect(
        &mut self,
        mobile: Serial,
        variant: ProtocolVariant,
        update_range: Option<i32>,
    ) -> Result<ObserverKey, WorldError> {
        let target = self
            .table
            .mobile(mobile)
            .ok_or(WorldError::EntityNotFound { serial: mobile })?;
        if target.session().is_some() {
            return Err(WorldError::AlreadyConnected { serial: mobile });
        }
        let (shard, location) = (target.shard(), target.location());
        let range = self
            .config
            .delta
            .clamp_update_range(update_range.unwrap_or(self.config.delta.default_update_range));

        let key = self.sessions.open(mobile, variant, range);
        if let Some(target) = self.table.mobile_mut(mobile) {
            target.set_session(Some(key));
        }
        self.index.place_observer(key, shard, location);
        info!("Session {:?} connected as mobile {} ({:?}, range {})", key, mobile, variant, range);

        if let Err(error) = self.send_everything(key) {
            warn!("Initial view for session {:?} failed: {}", key, error);
            self.disconnect(key)?;
            return Err(error);
        }
        Ok(key)
    }

    pub fn disconnect(&mut self, key: ObserverKey) -> Result<(), WorldError> {
        let session = self
            .sessions
            .close(&key)
            .ok_or(WorldError::ObserverNotFound { key })?;
        if let Some(mobile) = self.table.mobile_mut(session.mobile()) {
            mobile.set_session(None);
        }
        self.index.remove_observer(key);
        info!("Session {:?} disconnected from mobile {}", key, session.mobile());
        Ok(())
    }

    /// Clamps and stores a new update range. Returns the range in effect.
    pub fn set_update_range(&mut self, key: ObserverKey, range: i32) -> Result<i32, WorldError> {
        let range = self.config.delta.clamp_update_range(range);
        let session = self
            .sessions
            .get_mut(&key)
            .ok_or(WorldError::ObserverNotFound { key })?;
        session.set_update_range(range);
        Ok(range)
    }

    pub fn session(&self, key: &ObserverKey) -> Option<SessionRef<'_>> {
        self.sessions
            .get(key)
            .map(|session| SessionRef::new(session, &self.table))
    }

    pub fn sessions_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn update_range_for(&self, key: &ObserverKey) -> Option<i32> {
        self.sessions.get(key).map(|session| session.update_range())
    }

    /// Whether the mobile `viewer` may perceive `serial`
    pub fn can_see(&self, viewer: Serial, serial: Serial) -> bool {
        match self.table.mobile(viewer) {
            Some(viewer) => can_see(&self.table, viewer, serial),
            None => false,
        }
    }

    /// Initial view for a session: its own mobile plus the full
    /// representation of every root entity it can see within its range.
    /// Returns the number of packets sent.
    pub fn send_everything(&mut self, key: ObserverKey) -> Result<usize, WorldError> {
        let session = self
            .sessions
            .get(&key)
            .ok_or(WorldError::ObserverNotFound { key })?;
        let (viewer_serial, variant, range) = (session.mobile(), session.variant(), session.update_range());
        let viewer = self
            .table
            .mobile(viewer_serial)
            .ok_or(WorldError::EntityNotFound { serial: viewer_serial })?;
        let (shard, location) = (viewer.shard(), viewer.location());

        let mut sent = 0;
        let own = self.factory.self_update(viewer, variant)?.share();
        self.outbox.send(key, own);
        sent += 1;
        if shard.is_internal() {
            return Ok(sent);
        }

        let mut nearby = Vec::new();
        self.index.entities_in_range(shard, location, range, &mut nearby);
        let visible: Vec<_> = nearby
            .into_iter()
            .filter(|serial| *serial != viewer_serial && can_see(&self.table, viewer, *serial))
            .map(|serial| {
                let notoriety = self
                    .table
                    .mobile(serial)
                    .map(|target| notoriety_of(viewer, target))
                    .unwrap_or_default();
                (serial, notoriety)
            })
            .collect();

        for (serial, notoriety) in visible {
            let packet: OutgoingPacket = if serial.is_item() {
                self.processor().durable_full(serial, variant)?
            } else {
                let Some(entity) = self.table.entity(serial) else {
                    continue;
                };
                self.factory
                    .full(&self.table, entity, variant, notoriety)
                    .map(Packet::share)?
            };
            self.outbox.send(key, packet);
            sent += 1;

            if self.config.properties_enabled {
                if let Some(packet) = self.processor().durable_properties(serial)? {
                    self.outbox.send(key, packet);
                    sent += 1;
                }
            }
        }
        Ok(sent)
    }
}
