use vesper_shared::{Direction, DirtyFlags, Point3D, PropertyList, Serial, ShardId, TradeId};

use super::{
    item_extras::{BounceInfo, ItemExtras},
    packet_cache::PacketCache,
    parent::Parent,
    DeltaState,
};

pub const DEFAULT_WEIGHT: f32 = 1.0;

// Layer
/// Equipment slot on a mobile
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Layer(u8);

impl Layer {
    pub const ONE_HANDED: Layer = Layer(0x01);
    pub const TWO_HANDED: Layer = Layer(0x02);
    pub const SHOES: Layer = Layer(0x03);
    pub const PANTS: Layer = Layer(0x04);
    pub const SHIRT: Layer = Layer(0x05);
    pub const HELM: Layer = Layer(0x06);
    pub const GLOVES: Layer = Layer(0x07);
    pub const RING: Layer = Layer(0x08);
    pub const NECK: Layer = Layer(0x0A);
    pub const HAIR: Layer = Layer(0x0B);
    pub const WAIST: Layer = Layer(0x0C);
    pub const INNER_TORSO: Layer = Layer(0x0D);
    pub const CLOAK: Layer = Layer(0x14);
    pub const BACKPACK: Layer = Layer(0x15);
    pub const MOUNT: Layer = Layer(0x19);

    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> u8 {
        self.0
    }
}

/// Who may receive updates about a container's contents
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerAccess {
    /// Contents broadcast to the surrounding area like any other item
    Public,
    /// Contents only reach the holder and whoever has the container open
    Private,
    /// One side of a secure exchange between two mobiles
    SecureTrade(TradeId),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContainerInfo {
    pub(crate) access: ContainerAccess,
    pub(crate) gump: u16,
    pub(crate) viewers: Option<Vec<Serial>>,
}

impl ContainerInfo {
    pub fn new(access: ContainerAccess, gump: u16) -> Self {
        Self {
            access,
            gump,
            viewers: None,
        }
    }

    pub fn access(&self) -> ContainerAccess {
        self.access
    }

    pub fn gump(&self) -> u16 {
        self.gump
    }

    pub fn viewers(&self) -> &[Serial] {
        self.viewers.as_deref().unwrap_or(&[])
    }
}

pub struct Item {
    serial: Serial,
    graphic: u16,
    hue: u16,
    amount: u16,
    location: Point3D,
    shard: ShardId,
    parent: Parent,
    layer: Option<Layer>,
    direction: Direction,
    grid: u8,
    visible: bool,
    container: Option<ContainerInfo>,
    extras: Option<Box<ItemExtras>>,
    pub(crate) delta: DeltaState,
    pub(crate) cache: PacketCache,
}

impl Item {
    /// A new item starts parked on the internal shard, owned by the world
    pub fn new(serial: Serial, graphic: u16) -> Self {
        Self {
            serial,
            graphic,
            hue: 0,
            amount: 1,
            location: Point3D::default(),
            shard: ShardId::INTERNAL,
            parent: Parent::World,
            layer: None,
            direction: Direction::North,
            grid: 0,
            visible: true,
            container: None,
            extras: None,
            delta: DeltaState::default(),
            cache: PacketCache::default(),
        }
    }

    pub fn with_container(mut self, access: ContainerAccess, gump: u16) -> Self {
        self.container = Some(ContainerInfo::new(access, gump));
        self
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn with_hue(mut self, hue: u16) -> Self {
        self.hue = hue;
        self
    }

    pub fn with_amount(mut self, amount: u16) -> Self {
        self.amount = amount;
        self
    }

    // Getters

    pub fn serial(&self) -> Serial {
        self.serial
    }

    pub fn graphic(&self) -> u16 {
        self.graphic
    }

    pub fn hue(&self) -> u16 {
        self.hue
    }

    pub fn amount(&self) -> u16 {
        self.amount
    }

    /// Position in the world for root items, position inside the parent
    /// container otherwise
    pub fn location(&self) -> Point3D {
        self.location
    }

    pub fn shard(&self) -> ShardId {
        self.shard
    }

    pub fn parent(&self) -> Parent {
        self.parent
    }

    pub fn layer(&self) -> Option<Layer> {
        self.layer
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn grid(&self) -> u8 {
        self.grid
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn dirty_flags(&self) -> DirtyFlags {
        self.delta.flags
    }

    pub fn in_queue(&self) -> bool {
        self.delta.in_queue
    }

    pub fn cache(&self) -> &PacketCache {
        &self.cache
    }

    // Container

    pub fn container(&self) -> Option<&ContainerInfo> {
        self.container.as_ref()
    }

    pub fn is_container(&self) -> bool {
        self.container.is_some()
    }

    /// True for containers whose contents must not reach the general area
    pub fn is_non_public_container(&self) -> bool {
        match &self.container {
            Some(info) => info.access != ContainerAccess::Public,
            None => false,
        }
    }

    pub fn secure_trade(&self) -> Option<TradeId> {
        match self.container.as_ref().map(|info| info.access) {
            Some(ContainerAccess::SecureTrade(trade)) => Some(trade),
            _ => None,
        }
    }

    pub fn viewers(&self) -> &[Serial] {
        match &self.container {
            Some(info) => info.viewers(),
            None => &[],
        }
    }

    pub(crate) fn add_viewer(&mut self, viewer: Serial) -> bool {
        let Some(info) = self.container.as_mut() else {
            return false;
        };
        let viewers = info.viewers.get_or_insert_with(Vec::new);
        if viewers.contains(&viewer) {
            return false;
        }
        viewers.push(viewer);
        true
    }

    pub(crate) fn remove_viewer(&mut self, viewer: Serial) -> bool {
        let Some(viewers) = self.container.as_mut().and_then(|info| info.viewers.as_mut()) else {
            return false;
        };
        let before = viewers.len();
        viewers.retain(|serial| *serial != viewer);
        let removed = viewers.len() != before;
        if viewers.is_empty() {
            self.set_viewers(Vec::new());
        }
        removed
    }

    /// Replaces the viewer set, releasing it entirely when empty
    pub(crate) fn set_viewers(&mut self, viewers: Vec<Serial>) {
        if let Some(info) = self.container.as_mut() {
            info.viewers = if viewers.is_empty() {
                None
            } else {
                Some(viewers)
            };
        }
    }

    pub fn has_viewer_set(&self) -> bool {
        self.container
            .as_ref()
            .map(|info| info.viewers.is_some())
            .unwrap_or(false)
    }

    // Optional attributes

    pub fn has_extras(&self) -> bool {
        self.extras.is_some()
    }

    pub fn name(&self) -> Option<&str> {
        self.extras.as_ref().and_then(|extras| extras.name.as_deref())
    }

    pub fn contents(&self) -> &[Serial] {
        match &self.extras {
            Some(extras) => &extras.contents,
            None => &[],
        }
    }

    pub fn bounce(&self) -> Option<&BounceInfo> {
        self.extras.as_ref().and_then(|extras| extras.bounce.as_ref())
    }

    pub fn held_by(&self) -> Option<Serial> {
        self.extras.as_ref().and_then(|extras| extras.held_by)
    }

    pub fn spawner(&self) -> Option<Serial> {
        self.extras.as_ref().and_then(|extras| extras.spawner)
    }

    pub fn temp_flags(&self) -> u32 {
        self.extras.as_ref().map(|extras| extras.temp_flags).unwrap_or(0)
    }

    pub fn saved_flags(&self) -> u32 {
        self.extras.as_ref().map(|extras| extras.saved_flags).unwrap_or(0)
    }

    pub fn weight(&self) -> f32 {
        self.extras
            .as_ref()
            .and_then(|extras| extras.weight)
            .unwrap_or(DEFAULT_WEIGHT)
    }

    fn update_extras(&mut self, update: impl FnOnce(&mut ItemExtras)) {
        let extras = self.extras.get_or_insert_with(Box::default);
        update(extras);
        if extras.is_default() {
            self.extras = None;
        }
    }

    pub fn set_bounce(&mut self, bounce: Option<BounceInfo>) {
        self.update_extras(|extras| extras.bounce = bounce);
    }

    pub fn set_held_by(&mut self, holder: Option<Serial>) {
        self.update_extras(|extras| extras.held_by = holder);
    }

    pub fn set_spawner(&mut self, spawner: Option<Serial>) {
        self.update_extras(|extras| extras.spawner = spawner);
    }

    pub fn set_temp_flag(&mut self, flag: u32, value: bool) {
        self.update_extras(|extras| {
            if value {
                extras.temp_flags |= flag;
            } else {
                extras.temp_flags &= !flag;
            }
        });
    }

    pub fn set_saved_flag(&mut self, flag: u32, value: bool) {
        self.update_extras(|extras| {
            if value {
                extras.saved_flags |= flag;
            } else {
                extras.saved_flags &= !flag;
            }
        });
    }

    pub(crate) fn set_name(&mut self, name: Option<String>) {
        self.update_extras(|extras| extras.name = name);
    }

    pub(crate) fn set_weight(&mut self, weight: Option<f32>) {
        let weight = weight.filter(|w| (*w - DEFAULT_WEIGHT).abs() > f32::EPSILON);
        self.update_extras(|extras| extras.weight = weight);
    }

    pub(crate) fn add_content(&mut self, child: Serial) {
        self.update_extras(|extras| {
            if !extras.contents.contains(&child) {
                extras.contents.push(child);
            }
        });
    }

    pub(crate) fn remove_content(&mut self, child: Serial) {
        if self.extras.is_none() {
            return;
        }
        self.update_extras(|extras| extras.contents.retain(|serial| *serial != child));
    }

    // Geometry; every change here alters the full representation

    pub(crate) fn set_graphic(&mut self, graphic: u16) {
        self.graphic = graphic;
        self.cache.invalidate_full();
    }

    pub(crate) fn set_hue(&mut self, hue: u16) {
        self.hue = hue;
        self.cache.invalidate_full();
    }

    pub(crate) fn set_amount(&mut self, amount: u16) {
        self.amount = amount;
        self.cache.invalidate_full();
    }

    pub(crate) fn set_location(&mut self, location: Point3D) {
        self.location = location;
        self.cache.invalidate_full();
    }

    pub(crate) fn set_shard(&mut self, shard: ShardId) {
        self.shard = shard;
        self.cache.invalidate_full();
    }

    pub(crate) fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
        self.cache.invalidate_full();
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.cache.invalidate_full();
    }

    pub(crate) fn set_grid(&mut self, grid: u8) {
        self.grid = grid;
    }

    pub(crate) fn set_parent(&mut self, parent: Parent) {
        self.parent = parent;
        self.cache.invalidate_full();
    }

    pub(crate) fn set_layer(&mut self, layer: Option<Layer>) {
        self.layer = layer;
    }

    /// Derives the descriptive summary from the current state
    pub fn describe(&self) -> PropertyList {
        let mut list = PropertyList::new();
        match (self.name(), self.amount > 1) {
            (Some(name), true) => list.add(1050039, format!("{}\t{}", self.amount, name)),
            (Some(name), false) => list.add(1050045, format!("\t{}\t", name)),
            (None, true) => list.add(1050039, format!("{}\t#{}", self.amount, 1020000 + u32::from(self.graphic))),
            (None, false) => list.add(1020000 + u32::from(self.graphic), ""),
        };
        if let Some(weight) = self.extras.as_ref().and_then(|extras| extras.weight) {
            list.add(1072788, format!("{}", weight));
        }
        if let Some(info) = &self.container {
            list.add(1073841, format!("{}", self.contents().len()));
            if let ContainerAccess::SecureTrade(trade) = info.access {
                list.add(1062017, format!("{}", trade));
            }
        }
        list
    }
}
