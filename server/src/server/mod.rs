mod server_config;
pub use server_config::{DeltaConfig, ServerConfig};

mod world_server;
pub use world_server::{FlushReport, WorldServer};

mod world_mutations;
