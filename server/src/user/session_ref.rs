use vesper_shared::{ObserverKey, ProtocolVariant, Serial};

use crate::world::{entity_table::EntityTable, observer_rules::can_see};

use super::session::Session;

pub struct SessionRef<'s> {
    session: &'s Session,
    table: &'s EntityTable,
}

impl<'s> SessionRef<'s> {
    pub(crate) fn new(session: &'s Session, table: &'s EntityTable) -> Self {
        Self { session, table }
    }

    pub fn key(&self) -> ObserverKey {
        self.session.key()
    }

    /// The mobile this session controls
    pub fn mobile(&self) -> Serial {
        self.session.mobile()
    }

    pub fn variant(&self) -> ProtocolVariant {
        self.session.variant()
    }

    pub fn update_range(&self) -> i32 {
        self.session.update_range()
    }

    /// Returns true if the session's mobile may perceive the entity
    pub fn can_see(&self, serial: Serial) -> bool {
        match self.table.mobile(self.session.mobile()) {
            Some(mobile) => can_see(self.table, mobile, serial),
            None => false,
        }
    }

    /// Returns true if the entity's resolved position lies within this
    /// session's update range
    pub fn in_range(&self, serial: Serial) -> bool {
        let Some(mobile) = self.table.mobile(self.session.mobile()) else {
            return false;
        };
        match self.table.world_location(serial) {
            Ok((shard, location)) => {
                shard == mobile.shard() && mobile.location().in_range(&location, self.session.update_range())
            }
            Err(_) => false,
        }
    }
}
