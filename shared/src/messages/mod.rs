pub mod error;
pub mod packet;
pub mod packet_writer;
