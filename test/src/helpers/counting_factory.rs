use std::collections::HashMap;

use vesper_server::{EntityRef, EntityTable, Item, MessageFactory, Mobile, WireFactory};
use vesper_shared::{Notoriety, Packet, PacketError, PropertyList, ProtocolVariant, Serial};

/// One method of the message factory
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FactoryCall {
    Remove,
    Full,
    Moving,
    SelfUpdate,
    PropertySummary,
    EquipUpdate,
    ContainerUpdate,
    ContainerContent,
    ContainerDisplay,
    Hits,
    Status,
}

/// Wraps the wire factory and counts how often each packet is built.
/// One method can be made to fail to exercise error paths.
#[derive(Default)]
pub struct CountingFactory {
    inner: WireFactory,
    calls: HashMap<FactoryCall, usize>,
    failing: Option<FactoryCall>,
}

impl CountingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self, call: FactoryCall) -> usize {
        self.calls.get(&call).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.values().sum()
    }

    pub fn reset(&mut self) {
        self.calls.clear();
    }

    pub fn set_failing(&mut self, call: Option<FactoryCall>) {
        self.failing = call;
    }

    fn count(&mut self, call: FactoryCall, subject: Serial) -> Result<&mut WireFactory, PacketError> {
        *self.calls.entry(call).or_insert(0) += 1;
        if self.failing == Some(call) {
            return Err(PacketError::MissingSubject { serial: subject });
        }
        Ok(&mut self.inner)
    }
}

impl MessageFactory for CountingFactory {
    fn remove(&mut self, serial: Serial) -> Result<Packet, PacketError> {
        self.count(FactoryCall::Remove, serial)?.remove(serial)
    }

    fn full(
        &mut self,
        table: &EntityTable,
        entity: EntityRef<'_>,
        variant: ProtocolVariant,
        notoriety: Notoriety,
    ) -> Result<Packet, PacketError> {
        self.count(FactoryCall::Full, entity.serial())?.full(table, entity, variant, notoriety)
    }

    fn moving(
        &mut self,
        entity: EntityRef<'_>,
        variant: ProtocolVariant,
        notoriety: Notoriety,
    ) -> Result<Packet, PacketError> {
        self.count(FactoryCall::Moving, entity.serial())?.moving(entity, variant, notoriety)
    }

    fn self_update(&mut self, mobile: &Mobile, variant: ProtocolVariant) -> Result<Packet, PacketError> {
        self.count(FactoryCall::SelfUpdate, mobile.serial())?.self_update(mobile, variant)
    }

    fn property_summary(&mut self, serial: Serial, properties: &PropertyList) -> Result<Packet, PacketError> {
        self.count(FactoryCall::PropertySummary, serial)?.property_summary(serial, properties)
    }

    fn equip_update(&mut self, item: &Item, holder: Serial) -> Result<Packet, PacketError> {
        self.count(FactoryCall::EquipUpdate, item.serial())?.equip_update(item, holder)
    }

    fn container_update(
        &mut self,
        item: &Item,
        container: Serial,
        variant: ProtocolVariant,
    ) -> Result<Packet, PacketError> {
        self.count(FactoryCall::ContainerUpdate, item.serial())?
            .container_update(item, container, variant)
    }

    fn container_content(
        &mut self,
        table: &EntityTable,
        container: &Item,
        variant: ProtocolVariant,
    ) -> Result<Packet, PacketError> {
        self.count(FactoryCall::ContainerContent, container.serial())?
            .container_content(table, container, variant)
    }

    fn container_display(&mut self, container: &Item, variant: ProtocolVariant) -> Result<Packet, PacketError> {
        self.count(FactoryCall::ContainerDisplay, container.serial())?
            .container_display(container, variant)
    }

    fn hits(&mut self, mobile: &Mobile, exact: bool) -> Result<Packet, PacketError> {
        self.count(FactoryCall::Hits, mobile.serial())?.hits(mobile, exact)
    }

    fn status(&mut self, mobile: &Mobile, private: bool) -> Result<Packet, PacketError> {
        self.count(FactoryCall::Status, mobile.serial())?.status(mobile, private)
    }
}
