mod channel;
mod outbox;

pub use channel::ChannelOutbox;
pub use outbox::Outbox;
