pub mod message_factory;
pub mod wire_representation;
