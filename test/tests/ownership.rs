/// Owner chains stay acyclic, and the optional-attribute block of an item
/// only exists while something in it differs from the defaults

use vesper_server::{ContainerAccess, Item, OwnershipError, Parent, RootOwner, WorldError};
use vesper_shared::{Point3D, Serial};
use vesper_test::{drop_item, spawn_mobile, TestWorld, TestWorldBuilder, SHARD};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn bag(world: &mut TestWorld, serial: u32) -> Serial {
    let bag = Item::new(Serial::new(serial), 0x0E76).with_container(ContainerAccess::Public, 0x3D);
    world.insert_item(bag).unwrap()
}

#[test]
fn placing_a_container_inside_its_own_content_is_rejected() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let outer = bag(&mut world, 0x4300_0000);
    let inner = bag(&mut world, 0x4300_0001);
    world.drop_to_world(outer, SHARD, Point3D::new(5, 5, 0)).unwrap();
    world.add_to_container(inner, outer, Point3D::default()).unwrap();

    assert_eq!(
        world.add_to_container(outer, inner, Point3D::default()),
        Err(WorldError::Ownership(OwnershipError::Cycle {
            child: outer,
            parent: inner,
        }))
    );
    assert_eq!(
        world.add_to_container(outer, outer, Point3D::default()),
        Err(WorldError::Ownership(OwnershipError::SelfParent { serial: outer }))
    );
    assert!(world.item(outer).unwrap().parent().is_world());
    assert_eq!(world.item(inner).unwrap().parent(), Parent::Item(outer));
}

#[test]
fn mobiles_cannot_be_contained() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let sack = bag(&mut world, 0x4300_0010);
    let rabbit = spawn_mobile(&mut world, "a rabbit", 5, 5);

    assert_eq!(
        world.add_to_container(rabbit, sack, Point3D::default()),
        Err(WorldError::Ownership(OwnershipError::MobileNotContainable { serial: rabbit }))
    );
}

#[test]
fn nested_items_resolve_to_their_holder() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let holder = spawn_mobile(&mut world, "a porter", 40, 40);
    let pack = vesper_test::give_backpack(&mut world, holder, 0x4300_0020);
    let pouch = bag(&mut world, 0x4300_0021);
    world.add_to_container(pouch, pack, Point3D::default()).unwrap();
    let coin = world.create_item(0x0EED).unwrap();
    world.add_to_container(coin, pouch, Point3D::default()).unwrap();

    assert_eq!(world.table().resolve_root(coin), Ok(RootOwner::Mobile(holder)));
    assert_eq!(world.table().world_location(coin), Ok((SHARD, Point3D::new(40, 40, 0))));
    assert!(!world.index().contains_entity(coin));
    assert!(world.index().contains_entity(holder));
}

#[test]
fn optional_attributes_allocate_on_demand() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let lamp = drop_item(&mut world, 0x0A22, 1, 1);
    assert!(!world.item(lamp).unwrap().has_extras());

    world.set_item_weight(lamp, Some(1.0)).unwrap();
    assert!(!world.item(lamp).unwrap().has_extras());

    world.set_item_name(lamp, Some("a brass lamp".to_string())).unwrap();
    world.set_item_weight(lamp, Some(4.0)).unwrap();
    let item = world.item(lamp).unwrap();
    assert!(item.has_extras());
    assert_eq!(item.name(), Some("a brass lamp"));
    assert_eq!(item.weight(), 4.0);

    world.set_item_name(lamp, None).unwrap();
    world.set_item_weight(lamp, None).unwrap();
    assert!(!world.item(lamp).unwrap().has_extras());
}
