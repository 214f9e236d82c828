use vesper_shared::{ObserverKey, OutgoingPacket};

/// Outbound side of the connection layer. Sending never blocks and never
/// reports failure; an unknown or closed observer drops the packet.
pub trait Outbox {
    fn send(&mut self, observer: ObserverKey, packet: OutgoingPacket);
}

impl<O: Outbox + ?Sized> Outbox for &mut O {
    fn send(&mut self, observer: ObserverKey, packet: OutgoingPacket) {
        (**self).send(observer, packet);
    }
}

impl<O: Outbox + ?Sized> Outbox for Box<O> {
    fn send(&mut self, observer: ObserverKey, packet: OutgoingPacket) {
        (**self).send(observer, packet);
    }
}

/// Collects everything in send order
impl Outbox for Vec<(ObserverKey, OutgoingPacket)> {
    fn send(&mut self, observer: ObserverKey, packet: OutgoingPacket) {
        self.push((observer, packet));
    }
}
