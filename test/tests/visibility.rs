/// Who hears about a change: the inclusive square range around the entity,
/// narrowed by each session's own range and by what its mobile can see

use proptest::prelude::*;
use vesper_server::{Mobile, WorldError};
use vesper_shared::{AccessLevel, PacketKind, Point3D, ProtocolVariant, Serial, ShardId};
use vesper_test::{
    assert_nothing_received, assert_received, drop_item, settle, spawn_player, spawn_staff, FactoryCall,
    TestWorldBuilder, SHARD,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

proptest! {
    #[test]
    fn prop_item_reaches_observers_inside_the_square(dx in -30i32..=30, dy in -30i32..=30) {
        init();
        let mut world = TestWorldBuilder::new().update_range(18).build();
        let (_, key) = spawn_player(&mut world, "a watcher", 100 + dx, 100 + dy, ProtocolVariant::Legacy);
        settle(&mut world);

        let lamp = drop_item(&mut world, 0x0A22, 100, 100);
        world.flush_items();

        let expected = dx.abs().max(dy.abs()) <= 18;
        prop_assert_eq!(!world.outbox().to(key).is_empty(), expected);
        if expected {
            prop_assert_eq!(world.outbox().summary(key), vec![(PacketKind::WorldItem, lamp)]);
        }
    }
}

#[test]
fn boundary_is_inclusive() {
    init();
    let mut world = TestWorldBuilder::new().update_range(18).build();
    let (_, edge) = spawn_player(&mut world, "on the edge", 118, 100, ProtocolVariant::Legacy);
    let (_, past) = spawn_player(&mut world, "one step past", 119, 100, ProtocolVariant::Legacy);
    let (_, corner) = spawn_player(&mut world, "in the corner", 82, 82, ProtocolVariant::Extended);
    settle(&mut world);

    let lamp = drop_item(&mut world, 0x0A22, 100, 100);
    world.flush_items();

    assert_received!(world, edge, [(PacketKind::WorldItem, lamp)]);
    assert_received!(world, corner, [(PacketKind::WorldItem, lamp)]);
    assert_nothing_received!(world, past);
}

#[test]
fn other_shards_hear_nothing() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let (mobile, key) = spawn_player(&mut world, "a traveller", 100, 100, ProtocolVariant::Legacy);
    world.move_mobile(mobile, ShardId::new(2), Point3D::new(100, 100, 0)).unwrap();
    settle(&mut world);

    drop_item(&mut world, 0x0A22, 100, 100);
    world.flush_items();

    assert_nothing_received!(world, key);
}

#[test]
fn leaving_a_shard_removes_the_mobile_there() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let (traveller, _) = spawn_player(&mut world, "a traveller", 100, 100, ProtocolVariant::Legacy);
    let (_, watcher) = spawn_player(&mut world, "a watcher", 103, 100, ProtocolVariant::Legacy);
    settle(&mut world);

    world.move_mobile(traveller, ShardId::new(2), Point3D::new(100, 100, 0)).unwrap();
    world.flush_all();

    assert_received!(world, watcher, [(PacketKind::Remove, traveller)]);
}

#[test]
fn session_range_narrows_the_query() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let (_, near_sighted) = spawn_player(&mut world, "near sighted", 110, 100, ProtocolVariant::Legacy);
    let (_, keen) = spawn_player(&mut world, "keen", 110, 100, ProtocolVariant::Legacy);
    assert_eq!(world.set_update_range(near_sighted, 5), Ok(5));
    assert_eq!(world.set_update_range(keen, 99), Ok(24));
    settle(&mut world);

    let lamp = drop_item(&mut world, 0x0A22, 100, 100);
    world.flush_items();

    assert_nothing_received!(world, near_sighted);
    assert_received!(world, keen, [(PacketKind::WorldItem, lamp)]);
}

#[test]
fn concealment_depends_on_rank() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let (player, player_key) = spawn_player(&mut world, "a player", 100, 100, ProtocolVariant::Legacy);
    let gm = Mobile::new(Serial::new(0x500), "a seer", 0x3DB).with_access_level(AccessLevel::GameMaster);
    let (gm, gm_key) = spawn_staff(&mut world, gm, 101, 100);
    let lamp = drop_item(&mut world, 0x0A22, 102, 100);
    settle(&mut world);

    world.set_item_visible(lamp, false).unwrap();
    world.flush_items();

    assert!(!world.can_see(player, lamp));
    assert!(world.can_see(gm, lamp));
    assert_received!(world, player_key, [(PacketKind::Remove, lamp)]);
    assert_received!(world, gm_key, [(PacketKind::WorldItem, lamp)]);
}

#[test]
fn connecting_sends_the_initial_view() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let lamp = drop_item(&mut world, 0x0A22, 100, 100);
    let far = drop_item(&mut world, 0x0A22, 300, 300);
    let (_, other) = spawn_player(&mut world, "already here", 104, 100, ProtocolVariant::Legacy);
    settle(&mut world);

    let newcomer = world.create_mobile("a newcomer", 0x191).unwrap();
    world.move_mobile(newcomer, SHARD, Point3D::new(101, 101, 0)).unwrap();
    let key = world.connect(newcomer, ProtocolVariant::Extended, Some(12)).unwrap();

    let summary = world.outbox().summary(key);
    assert_eq!(summary[0], (PacketKind::MobileUpdate, newcomer));
    assert!(summary.contains(&(PacketKind::WorldItem, lamp)));
    assert!(summary.iter().any(|(kind, subject)| *kind == PacketKind::MobileIncoming && *subject != newcomer));
    assert!(!summary.iter().any(|(_, subject)| *subject == far));
    assert_eq!(world.session(&key).unwrap().update_range(), 12);
    assert_nothing_received!(world, other);
}

#[test]
fn failed_connect_leaves_the_mobile_free() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let mobile = world.create_mobile("a latecomer", 0x190).unwrap();
    world.move_mobile(mobile, SHARD, Point3D::new(50, 50, 0)).unwrap();

    world.factory_mut().set_failing(Some(FactoryCall::SelfUpdate));
    assert!(matches!(
        world.connect(mobile, ProtocolVariant::Legacy, None),
        Err(WorldError::Packet(_))
    ));
    assert!(world.mobile(mobile).unwrap().session().is_none());
    assert_eq!(world.sessions_count(), 0);

    world.factory_mut().set_failing(None);
    assert!(world.connect(mobile, ProtocolVariant::Legacy, None).is_ok());
}

#[test]
fn one_session_per_mobile() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let (mobile, key) = spawn_player(&mut world, "a player", 10, 10, ProtocolVariant::Legacy);

    assert_eq!(
        world.connect(mobile, ProtocolVariant::Legacy, None),
        Err(WorldError::AlreadyConnected { serial: mobile })
    );
    world.disconnect(key).unwrap();
    assert!(world.session(&key).is_none());
    assert_eq!(world.disconnect(key), Err(WorldError::ObserverNotFound { key }));
    assert!(world.connect(mobile, ProtocolVariant::Legacy, None).is_ok());
}
