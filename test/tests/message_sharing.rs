/// Packets differ across observers only by protocol dialect and by the
/// standing of the subject toward the observer. Each distinct pair is built
/// once per flush and the same buffer goes to everyone sharing it.

use std::rc::Rc;

use vesper_shared::{DirtyFlags, Notoriety, PacketKind, Point3D, ProtocolVariant};
use vesper_test::{settle, spawn_mobile, spawn_player, FactoryCall, TestWorldBuilder, SHARD};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn one_build_per_dialect() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let subject = spawn_mobile(&mut world, "a horse", 100, 100);
    let mut legacy = Vec::new();
    let mut extended = Vec::new();
    for offset in 0..5 {
        legacy.push(spawn_player(&mut world, "legacy", 95 + offset, 98, ProtocolVariant::Legacy).1);
    }
    for offset in 0..3 {
        extended.push(spawn_player(&mut world, "extended", 95 + offset, 103, ProtocolVariant::Extended).1);
    }
    settle(&mut world);

    world.mark_dirty(subject, DirtyFlags::POSITION);
    world.flush_all();

    assert_eq!(world.factory().calls(FactoryCall::Moving), 2);
    assert_eq!(world.outbox().count_kind(PacketKind::MobileMoving), 8);
    let first = world.outbox().to(legacy[0])[0].clone();
    for key in legacy.iter() {
        assert!(Rc::ptr_eq(&first, world.outbox().to(*key)[0]));
    }
    let other = world.outbox().to(extended[0])[0].clone();
    assert!(!Rc::ptr_eq(&first, &other));
}

#[test]
fn standing_splits_the_bucket() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let subject = spawn_mobile(&mut world, "a guard", 100, 100);
    world.set_mobile_guild(subject, Some(7)).unwrap();
    let (friend, friend_key) = spawn_player(&mut world, "a guildmate", 101, 100, ProtocolVariant::Legacy);
    world.set_mobile_guild(friend, Some(7)).unwrap();
    let (_, stranger_key) = spawn_player(&mut world, "a stranger", 102, 100, ProtocolVariant::Legacy);
    settle(&mut world);

    world.set_mobile_notoriety(subject, Notoriety::Criminal).unwrap();
    world.flush_all();

    assert_eq!(world.factory().calls(FactoryCall::Moving), 2);
    let to_friend = world.outbox().to(friend_key);
    let to_stranger = world.outbox().to(stranger_key);
    assert_eq!(to_friend.len(), 1);
    assert_eq!(to_stranger.len(), 1);
    assert_ne!(to_friend[0].bytes(), to_stranger[0].bytes());
}

#[test]
fn full_resync_builds_per_pair_and_releases_between_entities() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let first = spawn_mobile(&mut world, "a bear", 100, 100);
    let second = spawn_mobile(&mut world, "a wolf", 102, 100);
    spawn_player(&mut world, "one", 101, 101, ProtocolVariant::Legacy);
    spawn_player(&mut world, "two", 101, 99, ProtocolVariant::Legacy);
    settle(&mut world);

    world.set_mobile_body(first, 0xD5).unwrap();
    world.set_mobile_body(second, 0xE1).unwrap();
    world.flush_all();

    // one per mobile: the second entity never reuses the first one's packet
    assert_eq!(world.factory().calls(FactoryCall::Full), 2);
    assert_eq!(world.outbox().count_kind(PacketKind::MobileIncoming), 4);
}

#[test]
fn own_session_gets_exact_values() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let (fighter, own) = spawn_player(&mut world, "a fighter", 100, 100, ProtocolVariant::Legacy);
    let (_, other) = spawn_player(&mut world, "a healer", 101, 100, ProtocolVariant::Legacy);
    settle(&mut world);

    world.set_mobile_hits(fighter, 30, 60).unwrap();
    world.flush_all();

    let mine = world.outbox().to(own);
    let theirs = world.outbox().to(other);
    assert_eq!(mine.len(), 1);
    assert_eq!(theirs.len(), 1);
    assert_eq!(&mine[0].bytes()[5..9], &[0, 60, 0, 30]);
    assert_eq!(&theirs[0].bytes()[5..9], &[0, 25, 0, 12]);
    assert_eq!(world.factory().calls(FactoryCall::Hits), 2);
}

#[test]
fn long_names_still_reach_watchers() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let (knight, own) = spawn_player(&mut world, "a knight", 100, 100, ProtocolVariant::Legacy);
    let (_, watcher) = spawn_player(&mut world, "a squire", 101, 100, ProtocolVariant::Extended);
    settle(&mut world);

    world.set_mobile_name(knight, "Sir Reginald the Extremely Brave").unwrap();
    let report = world.flush_all();

    assert_eq!(report.failed, 0);
    for key in [own, watcher] {
        let packets = world.outbox().to(key);
        let status = packets
            .iter()
            .find(|packet| packet.kind() == PacketKind::MobileStatus)
            .expect("status sent");
        assert_eq!(&status.bytes()[7..37], b"Sir Reginald the Extremely Bra");
    }
}

#[test]
fn resync_in_the_same_flush_swallows_the_step() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let bear = spawn_mobile(&mut world, "a bear", 100, 100);
    let (_, watcher) = spawn_player(&mut world, "a hunter", 101, 101, ProtocolVariant::Legacy);
    settle(&mut world);

    world.move_mobile(bear, SHARD, Point3D::new(101, 100, 0)).unwrap();
    world.set_mobile_body(bear, 0xD5).unwrap();
    world.flush_all();

    assert_eq!(world.factory().calls(FactoryCall::Moving), 0);
    assert_eq!(world.outbox().summary(watcher), vec![(PacketKind::MobileIncoming, bear)]);
}
