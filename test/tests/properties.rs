/// Property summaries are re-derived on change and only broadcast when
/// their content hash moves. Full representations of items are cached
/// until a setter changes what they encode.

use vesper_shared::{DirtyFlags, PacketKind, ProtocolVariant};
use vesper_test::{assert_received, drop_item, settle, spawn_player, FactoryCall, TestWorldBuilder};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn unchanged_summary_is_not_resent() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let (_, key) = spawn_player(&mut world, "a shopper", 100, 100, ProtocolVariant::Legacy);
    let lamp = drop_item(&mut world, 0x0A22, 101, 100);
    settle(&mut world);

    world.set_item_name(lamp, Some("a brass lamp".to_string())).unwrap();
    world.flush_items();
    assert_received!(world, key, [(PacketKind::PropertySummary, lamp)]);
    assert_eq!(world.factory().calls(FactoryCall::PropertySummary), 1);
    settle(&mut world);

    world.set_item_name(lamp, Some("a brass lamp".to_string())).unwrap();
    assert!(world.item_queue().is_empty());
    world.flush_items();
    assert!(world.outbox().is_empty());

    world.set_item_name(lamp, Some("a silver lamp".to_string())).unwrap();
    assert!(world.item(lamp).unwrap().dirty_flags().contains(DirtyFlags::PROPERTIES));
}

#[test]
fn summaries_can_be_disabled() {
    init();
    let mut world = TestWorldBuilder::new().properties(false).build();
    let (_, key) = spawn_player(&mut world, "a shopper", 100, 100, ProtocolVariant::Legacy);
    let lamp = drop_item(&mut world, 0x0A22, 101, 100);
    settle(&mut world);

    world.set_item_name(lamp, Some("a brass lamp".to_string())).unwrap();
    world.mark_dirty(lamp, DirtyFlags::PROPERTIES);
    world.flush_items();

    assert!(world.outbox().to(key).is_empty());
    assert_eq!(world.factory().calls(FactoryCall::PropertySummary), 0);
}

#[test]
fn item_representation_is_cached_until_invalidated() {
    init();
    let mut world = TestWorldBuilder::new().build();
    spawn_player(&mut world, "a", 100, 100, ProtocolVariant::Legacy);
    spawn_player(&mut world, "b", 100, 101, ProtocolVariant::Legacy);
    let lamp = drop_item(&mut world, 0x0A22, 101, 100);
    settle(&mut world);
    // built during the settling flush and kept
    assert!(world.item(lamp).unwrap().cache().full(ProtocolVariant::Legacy).is_some());

    world.mark_dirty(lamp, DirtyFlags::FULL_RESYNC);
    world.flush_items();
    world.mark_dirty(lamp, DirtyFlags::FULL_RESYNC);
    world.flush_items();
    assert_eq!(world.factory().calls(FactoryCall::Full), 0);
    assert_eq!(world.outbox().count_kind(PacketKind::WorldItem), 4);

    world.set_item_hue(lamp, 0x44).unwrap();
    assert!(world.item(lamp).unwrap().cache().full(ProtocolVariant::Legacy).is_none());
    world.flush_items();
    assert_eq!(world.factory().calls(FactoryCall::Full), 1);
}

#[test]
fn remove_packet_is_built_once() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let (_, first) = spawn_player(&mut world, "a", 100, 100, ProtocolVariant::Legacy);
    let (_, second) = spawn_player(&mut world, "b", 100, 101, ProtocolVariant::Extended);
    let lamp = drop_item(&mut world, 0x0A22, 101, 100);
    settle(&mut world);

    world.delete_item(lamp).unwrap();

    assert_received!(world, first, [(PacketKind::Remove, lamp)]);
    assert_received!(world, second, [(PacketKind::Remove, lamp)]);
    assert_eq!(world.factory().calls(FactoryCall::Remove), 1);
}
