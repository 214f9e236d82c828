pub mod dirty_flags;
pub mod notoriety;
pub mod property_list;
