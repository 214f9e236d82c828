/// PROPERTY-BASED TESTS: dirty marks and the delta queues
///
/// Key invariants:
/// 1. Any number of marks on one entity yields one queue entry with the
///    OR of every mark
/// 2. A flush consumes every entry queued when it began and clears flags
/// 3. Marks on deleted or unknown entities are accepted and do nothing

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use vesper_shared::{DirtyFlags, Point3D, Serial};
use vesper_test::{drop_item, settle, spawn_mobile, TestWorldBuilder};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn flags_strategy() -> impl Strategy<Value = DirtyFlags> {
    (1u16..128u16).prop_map(DirtyFlags::from_bits)
}

proptest! {
    #[test]
    fn prop_marks_coalesce_per_entity(
        marks in prop::collection::vec((0usize..4, flags_strategy()), 1..32)
    ) {
        init();
        let mut world = TestWorldBuilder::new().build();
        let items: Vec<Serial> = (0..4).map(|_| world.create_item(0x0EED).unwrap()).collect();

        let mut expected: HashMap<Serial, DirtyFlags> = HashMap::new();
        for (index, flags) in marks.iter() {
            world.mark_dirty(items[*index], *flags);
            *expected.entry(items[*index]).or_default() |= *flags;
        }

        prop_assert_eq!(world.item_queue().len(), expected.len());
        let queued: HashSet<Serial> = world.item_queue().iter().copied().collect();
        prop_assert_eq!(queued.len(), expected.len());
        for (serial, flags) in expected.iter() {
            let item = world.item(*serial).unwrap();
            prop_assert_eq!(item.dirty_flags(), *flags);
            prop_assert!(item.in_queue());
        }

        let report = world.flush_items();
        prop_assert_eq!(report.processed, expected.len());
        prop_assert!(world.item_queue().is_empty());
        for serial in items.iter() {
            let item = world.item(*serial).unwrap();
            prop_assert!(item.dirty_flags().is_empty());
            prop_assert!(!item.in_queue());
        }
    }
}

#[test]
fn two_marks_make_one_entry() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let mobile = spawn_mobile(&mut world, "a mage", 10, 10);
    settle(&mut world);

    world.mark_dirty(mobile, DirtyFlags::HITS);
    world.mark_dirty(mobile, DirtyFlags::NAME);

    assert_eq!(world.mobile_queue().len(), 1);
    assert_eq!(
        world.mobile(mobile).unwrap().dirty_flags(),
        DirtyFlags::HITS | DirtyFlags::NAME
    );
}

#[test]
fn marks_after_a_flush_wait_for_the_next_one() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let lamp = drop_item(&mut world, 0x0A22, 10, 10);
    assert_eq!(world.flush_items().processed, 1);

    world.set_item_location(lamp, Point3D::new(11, 10, 0)).unwrap();
    assert_eq!(world.item_queue().len(), 1);
    assert_eq!(world.flush_items().processed, 1);
    assert_eq!(world.flush_items().processed, 0);
}

#[test]
fn marks_on_deleted_entities_are_ignored() {
    init();
    let mut world = TestWorldBuilder::new().build();
    let lamp = drop_item(&mut world, 0x0A22, 10, 10);
    settle(&mut world);
    world.delete_item(lamp).unwrap();

    world.mark_dirty(lamp, DirtyFlags::FULL_RESYNC);
    world.mark_dirty(Serial::new(0x0000_7777), DirtyFlags::HITS);

    assert!(world.item_queue().is_empty());
    assert!(world.mobile_queue().is_empty());
    assert!(world.outbox().is_empty());
}
