/// SCENARIO: one mobile, one observer in range, one far away
///
/// M stands at (100,100,0) with a maximum update radius of 18. O1 watches
/// from (105,100,0), O2 from (200,200,0). A placement-only change to M must
/// reach O1 as exactly one moving packet, never reach O2, and build the
/// moving packet once.

use std::rc::Rc;

use vesper_shared::{DirtyFlags, PacketKind, ProtocolVariant};
use vesper_test::{
    assert_nothing_received, assert_received, settle, spawn_mobile, spawn_player, FactoryCall,
    TestWorldBuilder,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn position_change_reaches_only_the_observer_in_range() {
    init();
    let mut world = TestWorldBuilder::new().update_range(18).build();
    let m = spawn_mobile(&mut world, "M", 100, 100);
    let (_, o1) = spawn_player(&mut world, "O1", 105, 100, ProtocolVariant::Legacy);
    let (_, o2) = spawn_player(&mut world, "O2", 200, 200, ProtocolVariant::Legacy);
    settle(&mut world);

    world.mark_dirty(m, DirtyFlags::POSITION);
    let report = world.flush_all();

    assert_received!(world, o1, [(PacketKind::MobileMoving, m)]);
    assert_nothing_received!(world, o2);
    assert_eq!(world.factory().calls(FactoryCall::Moving), 1);
    assert_eq!(report.processed, 1);
    assert_eq!(report.packets_sent, 1);
}

#[test]
fn observers_in_the_same_bucket_share_one_packet() {
    init();
    let mut world = TestWorldBuilder::new().update_range(18).build();
    let m = spawn_mobile(&mut world, "M", 100, 100);
    let (_, o1) = spawn_player(&mut world, "O1", 105, 100, ProtocolVariant::Legacy);
    let (_, o3) = spawn_player(&mut world, "O3", 95, 110, ProtocolVariant::Legacy);
    settle(&mut world);

    world.mark_dirty(m, DirtyFlags::POSITION);
    world.flush_all();

    let first = world.outbox().to(o1);
    let second = world.outbox().to(o3);
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert!(Rc::ptr_eq(first[0], second[0]));
    assert_eq!(world.factory().calls(FactoryCall::Moving), 1);
}
