pub mod counting_factory;
pub mod recording_outbox;

pub use counting_factory::{CountingFactory, FactoryCall};
pub use recording_outbox::RecordingOutbox;
