use std::sync::Arc;

use super::{
    error::PacketError,
    packet::{Packet, PacketKind},
};
use crate::{Point3D, Serial};

pub const MAX_PACKET_LENGTH: usize = 0xFFFF;

/// Big-endian byte writer for a single packet. Dynamic packets reserve a
/// two-byte length header right after the id that `finish` fills in.
pub struct PacketWriter {
    kind: PacketKind,
    subject: Serial,
    fixed_length: Option<usize>,
    buffer: Vec<u8>,
}

impl PacketWriter {
    pub fn fixed(id: u8, length: usize, kind: PacketKind, subject: Serial) -> Self {
        let mut buffer = Vec::with_capacity(length);
        buffer.push(id);
        Self {
            kind,
            subject,
            fixed_length: Some(length),
            buffer,
        }
    }

    pub fn dynamic(id: u8, kind: PacketKind, subject: Serial) -> Self {
        let mut buffer = Vec::with_capacity(64);
        buffer.push(id);
        buffer.extend_from_slice(&[0, 0]);
        Self {
            kind,
            subject,
            fixed_length: None,
            buffer,
        }
    }

    fn id(&self) -> u8 {
        self.buffer[0]
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.buffer.push(value);
        self
    }

    pub fn write_i8(&mut self, value: i8) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn write_bool(&mut self, value: bool) -> &mut Self {
        self.write_u8(u8::from(value))
    }

    pub fn write_u16(&mut self, value: u16) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn write_i16(&mut self, value: i16) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn write_serial(&mut self, serial: Serial) -> &mut Self {
        self.write_u32(serial.value())
    }

    /// x and y as u16, z as i8, saturating out-of-range coordinates
    pub fn write_point(&mut self, point: &Point3D) -> &mut Self {
        let clamp_u16 = |v: i32| v.clamp(0, i32::from(u16::MAX)) as u16;
        let x = clamp_u16(point.x);
        let y = clamp_u16(point.y);
        let z = point.z.clamp(i32::from(i8::MIN), i32::from(i8::MAX)) as i8;
        self.write_u16(x).write_u16(y).write_i8(z)
    }

    /// Zero-padded ASCII field of exactly `width` bytes
    pub fn write_ascii_fixed(&mut self, value: &str, width: usize) -> Result<&mut Self, PacketError> {
        let bytes = value.as_bytes();
        if bytes.len() > width {
            return Err(PacketError::StringTooLong {
                packet_id: self.id(),
                length: bytes.len(),
                limit: width,
            });
        }
        self.buffer.extend_from_slice(bytes);
        self.buffer.resize(self.buffer.len() + (width - bytes.len()), 0);
        Ok(self)
    }

    /// Zero-padded ASCII field of exactly `width` bytes; longer values are
    /// cut at the last character boundary that fits
    pub fn write_ascii_truncated(&mut self, value: &str, width: usize) -> &mut Self {
        let mut end = value.len().min(width);
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        self.buffer.extend_from_slice(&value.as_bytes()[..end]);
        self.buffer.resize(self.buffer.len() + (width - end), 0);
        self
    }

    /// UTF-16BE string with a two-byte character count prefix
    pub fn write_unicode(&mut self, value: &str) -> Result<&mut Self, PacketError> {
        let units: Vec<u16> = value.encode_utf16().collect();
        if units.len() > usize::from(u16::MAX) {
            return Err(PacketError::StringTooLong {
                packet_id: self.id(),
                length: units.len() * 2,
                limit: usize::from(u16::MAX) * 2,
            });
        }
        self.write_u16(units.len() as u16);
        for unit in units {
            self.write_u16(unit);
        }
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn finish(mut self) -> Result<Packet, PacketError> {
        let length = self.buffer.len();
        match self.fixed_length {
            Some(expected) => {
                if expected != length {
                    return Err(PacketError::LengthMismatch {
                        packet_id: self.id(),
                        expected,
                        actual: length,
                    });
                }
            }
            None => {
                if length > MAX_PACKET_LENGTH {
                    return Err(PacketError::PayloadOverflow {
                        packet_id: self.id(),
                        length,
                        limit: MAX_PACKET_LENGTH,
                    });
                }
                self.buffer[1..3].copy_from_slice(&(length as u16).to_be_bytes());
            }
        }
        Ok(Packet::new(
            self.kind,
            self.subject,
            Arc::from(self.buffer),
        ))
    }
}
