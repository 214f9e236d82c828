use vesper_shared::{
    EntityKind, Notoriety, Packet, PacketError, PacketKind, PacketWriter, ProtocolVariant, Serial,
};

use crate::{
    entity::{item::Item, mobile::Mobile},
    world::entity_table::EntityTable,
};

/// How an entity kind puts itself on the wire. Implemented once per
/// concrete kind and picked by `KIND`, never by inspecting a value.
pub trait WireRepresentation {
    const KIND: EntityKind;

    /// Complete representation for an observer that knows nothing yet
    fn build_full(
        &self,
        table: &EntityTable,
        variant: ProtocolVariant,
        notoriety: Notoriety,
    ) -> Result<Packet, PacketError>;

    /// Placement-only representation
    fn build_moving(&self, variant: ProtocolVariant, notoriety: Notoriety) -> Result<Packet, PacketError>;

    fn build_remove(&self) -> Result<Packet, PacketError>;
}

pub(crate) fn remove_packet(serial: Serial) -> Result<Packet, PacketError> {
    let mut writer = PacketWriter::fixed(0x1D, 5, PacketKind::Remove, serial);
    writer.write_serial(serial);
    writer.finish()
}

fn clamp_u16(value: i32) -> u16 {
    value.clamp(0, i32::from(u16::MAX)) as u16
}

fn clamp_i8(value: i32) -> i8 {
    value.clamp(i32::from(i8::MIN), i32::from(i8::MAX)) as i8
}

impl Item {
    fn world_flags(&self) -> u8 {
        if self.visible() {
            0
        } else {
            0x80
        }
    }

    fn legacy_world_packet(&self) -> Result<Packet, PacketError> {
        let serial = self.serial();
        let location = self.location();
        let direction = self.direction().to_wire(false);

        let mut writer = PacketWriter::dynamic(0x1A, PacketKind::WorldItem, serial);
        writer
            .write_u32(serial.value() | 0x8000_0000)
            .write_u16(self.graphic() & 0x7FFF)
            .write_u16(self.amount());

        let mut x = clamp_u16(location.x) & 0x7FFF;
        if direction != 0 {
            x |= 0x8000;
        }
        writer.write_u16(x).write_u16((clamp_u16(location.y) & 0x3FFF) | 0xC000);
        if direction != 0 {
            writer.write_u8(direction);
        }
        writer
            .write_i8(clamp_i8(location.z))
            .write_u16(self.hue())
            .write_u8(self.world_flags());
        writer.finish()
    }

    fn extended_world_packet(&self) -> Result<Packet, PacketError> {
        let serial = self.serial();
        let mut writer = PacketWriter::fixed(0xF3, 26, PacketKind::WorldItem, serial);
        writer
            .write_u16(0x1)
            .write_u8(0x00)
            .write_serial(serial)
            .write_u16(self.graphic())
            .write_u8(0)
            .write_u16(self.amount())
            .write_u16(self.amount())
            .write_point(&self.location())
            .write_u8(self.direction().to_wire(false))
            .write_u16(self.hue())
            .write_u8(self.world_flags())
            .write_u16(0);
        writer.finish()
    }
}

impl WireRepresentation for Item {
    const KIND: EntityKind = EntityKind::Item;

    fn build_full(
        &self,
        _table: &EntityTable,
        variant: ProtocolVariant,
        _notoriety: Notoriety,
    ) -> Result<Packet, PacketError> {
        match variant {
            ProtocolVariant::Legacy => self.legacy_world_packet(),
            ProtocolVariant::Extended => self.extended_world_packet(),
        }
    }

    // items have no lighter placement message than the world packet
    fn build_moving(&self, variant: ProtocolVariant, _notoriety: Notoriety) -> Result<Packet, PacketError> {
        match variant {
            ProtocolVariant::Legacy => self.legacy_world_packet(),
            ProtocolVariant::Extended => self.extended_world_packet(),
        }
    }

    fn build_remove(&self) -> Result<Packet, PacketError> {
        remove_packet(self.serial())
    }
}

impl WireRepresentation for Mobile {
    const KIND: EntityKind = EntityKind::Mobile;

    fn build_full(
        &self,
        table: &EntityTable,
        variant: ProtocolVariant,
        notoriety: Notoriety,
    ) -> Result<Packet, PacketError> {
        let serial = self.serial();
        let mut writer = PacketWriter::dynamic(0x78, PacketKind::MobileIncoming, serial);
        writer
            .write_serial(serial)
            .write_u16(self.body())
            .write_point(&self.location())
            .write_u8(self.direction().to_wire(false))
            .write_u16(self.hue())
            .write_u8(self.packet_flags(variant))
            .write_u8(notoriety.to_wire());

        for item in self.equipment().iter().filter_map(|serial| table.item(*serial)) {
            let Some(layer) = item.layer() else {
                continue;
            };
            if !item.visible() {
                continue;
            }
            writer.write_serial(item.serial());
            match variant {
                // legacy clients only read a hue when the graphic's high bit says so
                ProtocolVariant::Legacy => {
                    let graphic = item.graphic() & 0x7FFF;
                    if item.hue() != 0 {
                        writer
                            .write_u16(graphic | 0x8000)
                            .write_u8(layer.value())
                            .write_u16(item.hue());
                    } else {
                        writer.write_u16(graphic).write_u8(layer.value());
                    }
                }
                ProtocolVariant::Extended => {
                    writer
                        .write_u16(item.graphic())
                        .write_u8(layer.value())
                        .write_u16(item.hue());
                }
            }
        }
        writer.write_u32(0);
        writer.finish()
    }

    fn build_moving(&self, variant: ProtocolVariant, notoriety: Notoriety) -> Result<Packet, PacketError> {
        let serial = self.serial();
        let mut writer = PacketWriter::fixed(0x77, 17, PacketKind::MobileMoving, serial);
        writer
            .write_serial(serial)
            .write_u16(self.body())
            .write_point(&self.location())
            .write_u8(self.direction().to_wire(false))
            .write_u16(self.hue())
            .write_u8(self.packet_flags(variant))
            .write_u8(notoriety.to_wire());
        writer.finish()
    }

    fn build_remove(&self) -> Result<Packet, PacketError> {
        remove_packet(self.serial())
    }
}
