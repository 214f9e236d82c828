/// Deleting entities: a final remove packet for everyone who could see
/// them, silent cleanup of everything below, and queued flushes skipped

use vesper_server::{ContainerAccess, Item, Layer, WorldError};
use vesper_shared::{DirtyFlags, PacketKind, Point3D, ProtocolVariant, Serial};
use vesper_test::{
    assert_nothing_received, assert_received, drop_item, give_backpack, settle, spawn_player, FactoryCall,
    TestWorldBuilder,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn queued_then_deleted_item_sends_nothing_more() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let (_, key) = spawn_player(&mut world, "a witness", 100, 100, ProtocolVariant::Legacy);
    let lamp = drop_item(&mut world, 0x0A22, 101, 100);
    settle(&mut world);

    world.set_item_hue(lamp, 0x21).unwrap();
    world.mark_dirty(lamp, DirtyFlags::PROPERTIES);
    world.delete_item(lamp).unwrap();
    let report = world.flush_all();

    assert_eq!(report.skipped, 1);
    assert_eq!(report.packets_sent, 0);
    assert_received!(world, key, [(PacketKind::Remove, lamp)]);
    assert_eq!(world.factory().calls(FactoryCall::Full), 0);
    assert_eq!(world.factory().calls(FactoryCall::Remove), 1);
}

#[test]
fn queued_then_deleted_mobile_is_skipped() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let (_, key) = spawn_player(&mut world, "a witness", 100, 100, ProtocolVariant::Legacy);
    let ghost = world.create_mobile("a ghost", 0x192).unwrap();
    world.move_mobile(ghost, vesper_test::SHARD, Point3D::new(102, 100, 0)).unwrap();
    settle(&mut world);

    world.set_mobile_hits(ghost, 0, 50).unwrap();
    world.delete_mobile(ghost).unwrap();
    let report = world.flush_mobiles();

    assert_eq!(report.skipped, 1);
    assert_received!(world, key, [(PacketKind::Remove, ghost)]);
}

#[test]
fn deleting_a_mobile_takes_its_equipment_and_session() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let (victim, victim_key) = spawn_player(&mut world, "a victim", 100, 100, ProtocolVariant::Legacy);
    let (_, witness) = spawn_player(&mut world, "a witness", 105, 100, ProtocolVariant::Legacy);
    let pack = give_backpack(&mut world, victim, 0x4200_0000);
    let gold = world.create_item(0x0EED).unwrap();
    world.add_to_container(gold, pack, Point3D::default()).unwrap();
    let sword = Item::new(Serial::new(0x4200_0001), 0x13B9).with_layer(Layer::ONE_HANDED);
    let sword = world.insert_item(sword).unwrap();
    world.equip(sword, victim).unwrap();
    settle(&mut world);

    world.delete_mobile(victim).unwrap();

    assert_received!(world, witness, [(PacketKind::Remove, victim)]);
    assert_nothing_received!(world, victim_key);
    assert!(world.mobile(victim).is_none());
    for serial in [pack, gold, sword] {
        assert!(world.item(serial).is_none());
    }
    assert!(world.session(&victim_key).is_none());
    assert!(!world.index().contains_entity(victim));
    assert_eq!(world.delete_mobile(victim), Err(WorldError::EntityNotFound { serial: victim }));
}

#[test]
fn deleting_a_trade_container_cancels_the_trade() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let (alice, _) = spawn_player(&mut world, "alice", 100, 100, ProtocolVariant::Legacy);
    let (bob, _) = spawn_player(&mut world, "bob", 101, 100, ProtocolVariant::Legacy);
    let trade = world.open_trade(alice, bob).unwrap();
    let (offer, answer) = {
        let record = world.trades().get(trade).unwrap();
        (record.from_container(), record.to_container())
    };
    let gold = world.create_item(0x0EED).unwrap();
    world.add_to_container(gold, offer, Point3D::default()).unwrap();

    world.delete_item(offer).unwrap();

    assert!(world.trades().get(trade).is_none());
    assert!(world.item(offer).is_none());
    assert!(world.item(answer).is_none());
    // no backpack: the goods land at alice's feet
    let returned = world.item(gold).unwrap();
    assert!(returned.parent().is_world());
    assert_eq!(returned.location(), Point3D::new(100, 100, 0));
}

#[test]
fn deleting_a_mobile_cancels_its_trades() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let (alice, _) = spawn_player(&mut world, "alice", 100, 100, ProtocolVariant::Legacy);
    let (bob, _) = spawn_player(&mut world, "bob", 101, 100, ProtocolVariant::Legacy);
    let pack = give_backpack(&mut world, bob, 0x4200_0100);
    let trade = world.open_trade(alice, bob).unwrap();
    let answer = world.trades().get(trade).unwrap().to_container();
    let reagent = world.create_item(0x0F7A).unwrap();
    world.add_to_container(reagent, answer, Point3D::default()).unwrap();

    world.delete_mobile(alice).unwrap();

    assert!(world.trades().is_empty());
    assert_eq!(world.item(reagent).unwrap().parent(), vesper_server::Parent::Item(pack));
    assert!(world.item(answer).is_none());
}

#[test]
fn container_contents_are_deleted_with_it() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let bag = Item::new(Serial::new(0x4200_0200), 0x0E76).with_container(ContainerAccess::Public, 0x3D);
    let bag = world.insert_item(bag).unwrap();
    world.drop_to_world(bag, vesper_test::SHARD, Point3D::new(5, 5, 0)).unwrap();
    let inner = Item::new(Serial::new(0x4200_0201), 0x0E76).with_container(ContainerAccess::Public, 0x3D);
    let inner = world.insert_item(inner).unwrap();
    world.add_to_container(inner, bag, Point3D::default()).unwrap();
    let coin = world.create_item(0x0EED).unwrap();
    world.add_to_container(coin, inner, Point3D::default()).unwrap();

    world.delete_item(bag).unwrap();
    let report = world.flush_items();

    assert_eq!(world.table().items_count(), 0);
    assert_eq!(report.processed, 0);
    assert!(report.skipped >= 3);
}
