//! # Vesper Shared
//! Common types shared between the vesper server crates: entity identities,
//! dirty-flag taxonomy, protocol variants and encoded packets.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod messages;
mod protocol;
mod types;
mod world;

pub use messages::{
    error::PacketError,
    packet::{OutgoingPacket, Packet, PacketKind},
    packet_writer::{PacketWriter, MAX_PACKET_LENGTH},
};
pub use protocol::ProtocolVariant;
pub use types::{
    AccessLevel, Direction, EntityKind, GuildId, ObserverKey, Point3D, Serial, ShardId, TradeId,
};
pub use world::{
    dirty_flags::DirtyFlags,
    notoriety::Notoriety,
    property_list::{PropertyLine, PropertyList},
};
