use vesper_server::Outbox;
use vesper_shared::{ObserverKey, OutgoingPacket, PacketKind, Serial};

/// Outbox that keeps every packet handed to it, in send order
#[derive(Default)]
pub struct RecordingOutbox {
    sent: Vec<(ObserverKey, OutgoingPacket)>,
}

impl RecordingOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> &[(ObserverKey, OutgoingPacket)] {
        &self.sent
    }

    /// Packets received by one observer
    pub fn to(&self, observer: ObserverKey) -> Vec<&OutgoingPacket> {
        self.sent
            .iter()
            .filter(|(key, _)| *key == observer)
            .map(|(_, packet)| packet)
            .collect()
    }

    /// What one observer received, as (kind, subject) pairs
    pub fn summary(&self, observer: ObserverKey) -> Vec<(PacketKind, Serial)> {
        self.to(observer)
            .into_iter()
            .map(|packet| (packet.kind(), packet.subject()))
            .collect()
    }

    pub fn count_kind(&self, kind: PacketKind) -> usize {
        self.sent.iter().filter(|(_, packet)| packet.kind() == kind).count()
    }

    pub fn observers(&self) -> Vec<ObserverKey> {
        let mut keys: Vec<ObserverKey> = self.sent.iter().map(|(key, _)| *key).collect();
        keys.sort();
        keys.dedup();
        keys
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }

    pub fn clear(&mut self) {
        self.sent.clear();
    }
}

impl Outbox for RecordingOutbox {
    fn send(&mut self, observer: ObserverKey, packet: OutgoingPacket) {
        self.sent.push((observer, packet));
    }
}
