pub(crate) mod container_scope;
pub(crate) mod delta_processor;
pub mod delta_queue;
pub mod entity_table;
pub mod message_cache;
pub mod observer_rules;
pub mod sector_index;
pub mod secure_trade;
pub mod serial_allocator;
pub mod visibility_index;
