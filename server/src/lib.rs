//! # Vesper Server
//! Delta broadcast engine for a shared persistent world. Entities are marked
//! dirty as the simulation mutates them; once per tick the queued entities
//! are flushed and every observer in range receives the packets it needs,
//! built once per protocol dialect and standing and shared among recipients.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod entity;
pub mod messages;
pub mod transport;
pub mod world;

mod error;
mod server;
mod user;

pub use entity::{
    error::OwnershipError,
    item::{ContainerAccess, ContainerInfo, Item, Layer},
    item_extras::BounceInfo,
    mobile::{Mobile, Stats},
    packet_cache::PacketCache,
    parent::{Parent, RootOwner},
    EntityRef,
};
pub use error::{DeltaError, WorldError};
pub use messages::{message_factory::{MessageFactory, WireFactory}, wire_representation::WireRepresentation};
pub use server::{DeltaConfig, FlushReport, ServerConfig, WorldServer};
pub use transport::{ChannelOutbox, Outbox};
pub use user::{Session, SessionRef, Sessions};
pub use world::{
    delta_queue::DeltaQueue,
    entity_table::EntityTable,
    sector_index::SectorIndex,
    secure_trade::{SecureTrade, SecureTrades},
    visibility_index::VisibilityIndex,
};
