use std::collections::HashMap;

use vesper_shared::{ObserverKey, ProtocolVariant, Serial};

// Session

/// A connected observer: the mobile it controls, the dialect its client
/// speaks and how far it can see.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    key: ObserverKey,
    mobile: Serial,
    variant: ProtocolVariant,
    update_range: i32,
}

impl Session {
    pub(crate) fn new(key: ObserverKey, mobile: Serial, variant: ProtocolVariant, update_range: i32) -> Self {
        Self {
            key,
            mobile,
            variant,
            update_range,
        }
    }

    pub fn key(&self) -> ObserverKey {
        self.key
    }

    pub fn mobile(&self) -> Serial {
        self.mobile
    }

    pub fn variant(&self) -> ProtocolVariant {
        self.variant
    }

    pub fn update_range(&self) -> i32 {
        self.update_range
    }

    pub(crate) fn set_update_range(&mut self, update_range: i32) {
        self.update_range = update_range;
    }
}

// Sessions

#[derive(Default)]
pub struct Sessions {
    sessions: HashMap<ObserverKey, Session>,
    next_key: u64,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn open(&mut self, mobile: Serial, variant: ProtocolVariant, update_range: i32) -> ObserverKey {
        self.next_key += 1;
        let key = ObserverKey::new(self.next_key);
        self.sessions
            .insert(key, Session::new(key, mobile, variant, update_range));
        key
    }

    pub(crate) fn close(&mut self, key: &ObserverKey) -> Option<Session> {
        self.sessions.remove(key)
    }

    pub fn get(&self, key: &ObserverKey) -> Option<&Session> {
        self.sessions.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &ObserverKey) -> Option<&mut Session> {
        self.sessions.get_mut(key)
    }

    pub fn contains(&self, key: &ObserverKey) -> bool {
        self.sessions.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ObserverKey> {
        self.sessions.keys()
    }
}
