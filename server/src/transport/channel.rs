use std::{collections::HashMap, sync::Arc};

use log::trace;
use smol::channel::{self, Receiver, Sender, TrySendError};

use vesper_shared::{ObserverKey, OutgoingPacket};

use super::outbox::Outbox;

/// Hands encoded packets to per-session unbounded channels. The transport
/// task on the other end owns pacing and backpressure.
#[derive(Default)]
pub struct ChannelOutbox {
    senders: HashMap<ObserverKey, Sender<Arc<[u8]>>>,
}

impl ChannelOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the channel for a session, replacing any previous one
    pub fn register(&mut self, observer: ObserverKey) -> Receiver<Arc<[u8]>> {
        let (sender, receiver) = channel::unbounded();
        self.senders.insert(observer, sender);
        receiver
    }

    pub fn unregister(&mut self, observer: &ObserverKey) {
        if let Some(sender) = self.senders.remove(observer) {
            sender.close();
        }
    }

    pub fn is_registered(&self, observer: &ObserverKey) -> bool {
        self.senders.contains_key(observer)
    }
}

impl Outbox for ChannelOutbox {
    fn send(&mut self, observer: ObserverKey, packet: OutgoingPacket) {
        let Some(sender) = self.senders.get(&observer) else {
            return;
        };
        match sender.try_send(packet.payload()) {
            Ok(()) => {}
            Err(TrySendError::Closed(_)) => {
                trace!("Dropping packet for {:?}: channel closed", observer);
                self.senders.remove(&observer);
            }
            Err(TrySendError::Full(_)) => {
                trace!("Dropping packet for {:?}: channel full", observer);
            }
        }
    }
}
