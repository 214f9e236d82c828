use vesper_shared::{
    AccessLevel, Direction, DirtyFlags, GuildId, Notoriety, ObserverKey, Point3D, PropertyList,
    ProtocolVariant, Serial, ShardId,
};

use super::{packet_cache::PacketCache, DeltaState};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Stats {
    pub strength: u16,
    pub dexterity: u16,
    pub intelligence: u16,
}

pub struct Mobile {
    serial: Serial,
    name: String,
    body: u16,
    hue: u16,
    location: Point3D,
    shard: ShardId,
    direction: Direction,
    notoriety: Notoriety,
    guild: Option<GuildId>,
    hidden: bool,
    access_level: AccessLevel,
    hits: u16,
    hits_max: u16,
    stats: Stats,
    equipment: Vec<Serial>,
    session: Option<ObserverKey>,
    pub(crate) delta: DeltaState,
    pub(crate) cache: PacketCache,
}

impl Mobile {
    pub fn new(serial: Serial, name: impl Into<String>, body: u16) -> Self {
        Self {
            serial,
            name: name.into(),
            body,
            hue: 0,
            location: Point3D::default(),
            shard: ShardId::INTERNAL,
            direction: Direction::North,
            notoriety: Notoriety::Innocent,
            guild: None,
            hidden: false,
            access_level: AccessLevel::Player,
            hits: 100,
            hits_max: 100,
            stats: Stats::default(),
            equipment: Vec::new(),
            session: None,
            delta: DeltaState::default(),
            cache: PacketCache::default(),
        }
    }

    pub fn with_notoriety(mut self, notoriety: Notoriety) -> Self {
        self.notoriety = notoriety;
        self
    }

    pub fn with_guild(mut self, guild: GuildId) -> Self {
        self.guild = Some(guild);
        self
    }

    pub fn with_access_level(mut self, access_level: AccessLevel) -> Self {
        self.access_level = access_level;
        self
    }

    pub fn serial(&self) -> Serial {
        self.serial
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> u16 {
        self.body
    }

    pub fn hue(&self) -> u16 {
        self.hue
    }

    pub fn location(&self) -> Point3D {
        self.location
    }

    pub fn shard(&self) -> ShardId {
        self.shard
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn notoriety(&self) -> Notoriety {
        self.notoriety
    }

    pub fn guild(&self) -> Option<GuildId> {
        self.guild
    }

    pub fn hidden(&self) -> bool {
        self.hidden
    }

    pub fn access_level(&self) -> AccessLevel {
        self.access_level
    }

    pub fn hits(&self) -> u16 {
        self.hits
    }

    pub fn hits_max(&self) -> u16 {
        self.hits_max
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn equipment(&self) -> &[Serial] {
        &self.equipment
    }

    pub fn session(&self) -> Option<ObserverKey> {
        self.session
    }

    pub fn dirty_flags(&self) -> DirtyFlags {
        self.delta.flags
    }

    pub fn in_queue(&self) -> bool {
        self.delta.in_queue
    }

    pub fn cache(&self) -> &PacketCache {
        &self.cache
    }

    /// Status flag byte; the extended dialect moved the poison bit
    pub fn packet_flags(&self, variant: ProtocolVariant) -> u8 {
        let mut flags = 0u8;
        if self.hidden {
            flags |= 0x80;
        }
        if self.hits == 0 {
            flags |= if variant.is_extended() { 0x04 } else { 0x08 };
        }
        flags
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_body(&mut self, body: u16) {
        self.body = body;
        self.cache.invalidate_full();
    }

    pub(crate) fn set_hue(&mut self, hue: u16) {
        self.hue = hue;
        self.cache.invalidate_full();
    }

    pub(crate) fn set_location(&mut self, shard: ShardId, location: Point3D) {
        self.shard = shard;
        self.location = location;
        self.cache.invalidate_full();
    }

    pub(crate) fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
        self.cache.invalidate_full();
    }

    pub(crate) fn set_notoriety(&mut self, notoriety: Notoriety) {
        self.notoriety = notoriety;
    }

    pub(crate) fn set_guild(&mut self, guild: Option<GuildId>) {
        self.guild = guild;
    }

    pub(crate) fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
        self.cache.invalidate_full();
    }

    pub(crate) fn set_hits(&mut self, hits: u16, hits_max: u16) {
        self.hits_max = hits_max.max(1);
        self.hits = hits.min(self.hits_max);
    }

    pub(crate) fn set_stats(&mut self, stats: Stats) {
        self.stats = stats;
    }

    pub(crate) fn set_session(&mut self, session: Option<ObserverKey>) {
        self.session = session;
    }

    pub(crate) fn add_equipment(&mut self, item: Serial) {
        if !self.equipment.contains(&item) {
            self.equipment.push(item);
        }
    }

    pub(crate) fn remove_equipment(&mut self, item: Serial) {
        self.equipment.retain(|serial| *serial != item);
    }

    pub fn describe(&self) -> PropertyList {
        let mut list = PropertyList::new();
        list.add(1050045, format!("\t{}\t", self.name));
        if let Some(guild) = self.guild {
            list.add(1060802, format!("{}", guild));
        }
        list
    }
}
