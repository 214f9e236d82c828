use thiserror::Error;

use crate::Serial;

/// Errors that can occur while encoding an outgoing packet
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    /// A string did not fit into its fixed-width field
    #[error("String of {length} bytes exceeds field width of {limit} bytes in packet 0x{packet_id:02X}")]
    StringTooLong {
        packet_id: u8,
        length: usize,
        limit: usize,
    },

    /// The encoded packet outgrew the 16-bit length header
    #[error("Packet 0x{packet_id:02X} grew to {length} bytes, maximum is {limit}")]
    PayloadOverflow {
        packet_id: u8,
        length: usize,
        limit: usize,
    },

    /// A fixed-length packet was finished with the wrong number of bytes
    #[error("Fixed-length packet 0x{packet_id:02X} expected {expected} bytes, wrote {actual}")]
    LengthMismatch {
        packet_id: u8,
        expected: usize,
        actual: usize,
    },

    /// The entity a packet describes is no longer in the world
    #[error("Entity {serial} vanished before its packet could be built")]
    MissingSubject { serial: Serial },
}
