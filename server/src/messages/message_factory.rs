use vesper_shared::{
    Notoriety, Packet, PacketError, PacketKind, PacketWriter, PropertyList, ProtocolVariant, Serial,
};

use super::wire_representation::{remove_packet, WireRepresentation};
use crate::{
    entity::{item::Item, mobile::Mobile, EntityRef},
    world::entity_table::EntityTable,
};

const STATUS_NAME_WIDTH: usize = 30;
const NORMALIZED_HITS: u16 = 25;

/// Builds every packet the delta processor sends. Each method is a pure
/// function of its arguments; sharing and caching happen in the caller.
pub trait MessageFactory {
    fn remove(&mut self, serial: Serial) -> Result<Packet, PacketError>;

    fn full(
        &mut self,
        table: &EntityTable,
        entity: EntityRef<'_>,
        variant: ProtocolVariant,
        notoriety: Notoriety,
    ) -> Result<Packet, PacketError>;

    fn moving(
        &mut self,
        entity: EntityRef<'_>,
        variant: ProtocolVariant,
        notoriety: Notoriety,
    ) -> Result<Packet, PacketError>;

    /// Placement packet a mobile's own session receives
    fn self_update(&mut self, mobile: &Mobile, variant: ProtocolVariant) -> Result<Packet, PacketError>;

    fn property_summary(&mut self, serial: Serial, properties: &PropertyList) -> Result<Packet, PacketError>;

    fn equip_update(&mut self, item: &Item, holder: Serial) -> Result<Packet, PacketError>;

    fn container_update(
        &mut self,
        item: &Item,
        container: Serial,
        variant: ProtocolVariant,
    ) -> Result<Packet, PacketError>;

    /// Full listing of a container's direct contents
    fn container_content(
        &mut self,
        table: &EntityTable,
        container: &Item,
        variant: ProtocolVariant,
    ) -> Result<Packet, PacketError>;

    fn container_display(&mut self, container: &Item, variant: ProtocolVariant) -> Result<Packet, PacketError>;

    /// `exact` hits go to the mobile itself, everyone else sees a ratio
    fn hits(&mut self, mobile: &Mobile, exact: bool) -> Result<Packet, PacketError>;

    /// `private` status adds the stat block and only goes to the mobile itself
    fn status(&mut self, mobile: &Mobile, private: bool) -> Result<Packet, PacketError>;
}

/// Default factory encoding the wire formats
#[derive(Default, Clone, Copy)]
pub struct WireFactory;

impl WireFactory {
    pub fn new() -> Self {
        Self
    }

    fn dispatch_full<R: WireRepresentation>(
        entity: &R,
        table: &EntityTable,
        variant: ProtocolVariant,
        notoriety: Notoriety,
    ) -> Result<Packet, PacketError> {
        entity.build_full(table, variant, notoriety)
    }

    fn dispatch_moving<R: WireRepresentation>(
        entity: &R,
        variant: ProtocolVariant,
        notoriety: Notoriety,
    ) -> Result<Packet, PacketError> {
        entity.build_moving(variant, notoriety)
    }
}

fn write_contained_item(
    writer: &mut PacketWriter,
    item: &Item,
    container: Serial,
    variant: ProtocolVariant,
) {
    let location = item.location();
    writer
        .write_serial(item.serial())
        .write_u16(item.graphic())
        .write_u8(0)
        .write_u16(item.amount())
        .write_u16(location.x.clamp(0, i32::from(u16::MAX)) as u16)
        .write_u16(location.y.clamp(0, i32::from(u16::MAX)) as u16);
    if variant.is_extended() {
        writer.write_u8(item.grid());
    }
    writer.write_serial(container).write_u16(item.hue());
}

impl MessageFactory for WireFactory {
    fn remove(&mut self, serial: Serial) -> Result<Packet, PacketError> {
        remove_packet(serial)
    }

    fn full(
        &mut self,
        table: &EntityTable,
        entity: EntityRef<'_>,
        variant: ProtocolVariant,
        notoriety: Notoriety,
    ) -> Result<Packet, PacketError> {
        match entity {
            EntityRef::Item(item) => Self::dispatch_full(item, table, variant, notoriety),
            EntityRef::Mobile(mobile) => Self::dispatch_full(mobile, table, variant, notoriety),
        }
    }

    fn moving(
        &mut self,
        entity: EntityRef<'_>,
        variant: ProtocolVariant,
        notoriety: Notoriety,
    ) -> Result<Packet, PacketError> {
        match entity {
            EntityRef::Item(item) => Self::dispatch_moving(item, variant, notoriety),
            EntityRef::Mobile(mobile) => Self::dispatch_moving(mobile, variant, notoriety),
        }
    }

    fn self_update(&mut self, mobile: &Mobile, variant: ProtocolVariant) -> Result<Packet, PacketError> {
        let serial = mobile.serial();
        let location = mobile.location();
        let mut writer = PacketWriter::fixed(0x20, 19, PacketKind::MobileUpdate, serial);
        writer
            .write_serial(serial)
            .write_u16(mobile.body())
            .write_u8(0)
            .write_u16(mobile.hue())
            .write_u8(mobile.packet_flags(variant))
            .write_u16(location.x.clamp(0, i32::from(u16::MAX)) as u16)
            .write_u16(location.y.clamp(0, i32::from(u16::MAX)) as u16)
            .write_u16(0)
            .write_u8(mobile.direction().to_wire(false))
            .write_i8(location.z.clamp(i32::from(i8::MIN), i32::from(i8::MAX)) as i8);
        writer.finish()
    }

    fn property_summary(&mut self, serial: Serial, properties: &PropertyList) -> Result<Packet, PacketError> {
        let mut writer = PacketWriter::fixed(0xDC, 9, PacketKind::PropertySummary, serial);
        writer.write_serial(serial).write_u32(properties.hash());
        writer.finish()
    }

    fn equip_update(&mut self, item: &Item, holder: Serial) -> Result<Packet, PacketError> {
        let serial = item.serial();
        let layer = item.layer().map(|layer| layer.value()).unwrap_or(0);
        let mut writer = PacketWriter::fixed(0x2E, 15, PacketKind::EquipUpdate, serial);
        writer
            .write_serial(serial)
            .write_u16(item.graphic())
            .write_u8(0)
            .write_u8(layer)
            .write_serial(holder)
            .write_u16(item.hue());
        writer.finish()
    }

    fn container_update(
        &mut self,
        item: &Item,
        container: Serial,
        variant: ProtocolVariant,
    ) -> Result<Packet, PacketError> {
        let length = if variant.is_extended() { 21 } else { 20 };
        let mut writer = PacketWriter::fixed(0x25, length, PacketKind::ContainerContentUpdate, item.serial());
        write_contained_item(&mut writer, item, container, variant);
        writer.finish()
    }

    fn container_content(
        &mut self,
        table: &EntityTable,
        container: &Item,
        variant: ProtocolVariant,
    ) -> Result<Packet, PacketError> {
        let serial = container.serial();
        let items: Vec<&Item> = container
            .contents()
            .iter()
            .filter_map(|child| table.item(*child))
            .collect();

        let mut writer = PacketWriter::dynamic(0x3C, PacketKind::ContainerContent, serial);
        writer.write_u16(items.len().min(usize::from(u16::MAX)) as u16);
        for item in items {
            write_contained_item(&mut writer, item, serial, variant);
        }
        writer.finish()
    }

    fn container_display(&mut self, container: &Item, variant: ProtocolVariant) -> Result<Packet, PacketError> {
        let serial = container.serial();
        let gump = container.container().map(|info| info.gump()).unwrap_or(0);
        let length = if variant.is_extended() { 9 } else { 7 };
        let mut writer = PacketWriter::fixed(0x24, length, PacketKind::ContainerDisplay, serial);
        writer.write_serial(serial).write_u16(gump);
        if variant.is_extended() {
            writer.write_u16(0x7D);
        }
        writer.finish()
    }

    fn hits(&mut self, mobile: &Mobile, exact: bool) -> Result<Packet, PacketError> {
        let serial = mobile.serial();
        let (current, max) = if exact {
            (mobile.hits(), mobile.hits_max())
        } else {
            let ratio = u32::from(mobile.hits()) * u32::from(NORMALIZED_HITS) / u32::from(mobile.hits_max().max(1));
            (ratio as u16, NORMALIZED_HITS)
        };
        let mut writer = PacketWriter::fixed(0xA1, 9, PacketKind::MobileHits, serial);
        writer.write_serial(serial).write_u16(max).write_u16(current);
        writer.finish()
    }

    fn status(&mut self, mobile: &Mobile, private: bool) -> Result<Packet, PacketError> {
        let serial = mobile.serial();
        let mut writer = PacketWriter::dynamic(0x11, PacketKind::MobileStatus, serial);
        writer.write_serial(serial);
        writer.write_ascii_truncated(mobile.name(), STATUS_NAME_WIDTH);
        if private {
            let stats = mobile.stats();
            writer
                .write_u16(mobile.hits())
                .write_u16(mobile.hits_max())
                .write_bool(false)
                .write_u8(1)
                .write_u16(stats.strength)
                .write_u16(stats.dexterity)
                .write_u16(stats.intelligence);
        } else {
            let ratio = u32::from(mobile.hits()) * u32::from(NORMALIZED_HITS) / u32::from(mobile.hits_max().max(1));
            writer
                .write_u16(ratio as u16)
                .write_u16(NORMALIZED_HITS)
                .write_bool(false)
                .write_u8(0);
        }
        writer.finish()
    }
}
