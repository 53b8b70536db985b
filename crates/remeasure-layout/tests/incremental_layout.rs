use remeasure_geometry::{Point, Size};
use remeasure_layout::Constraints;
use remeasure_testing::prelude::*;

#[test]
fn first_pass_measures_parents_before_children() {
    let mut harness = LayoutHarness::new(Constraints::loose(100.0, 100.0));
    let (ids, _) = harness.chain(3, Size::new(10.0, 20.0));

    harness.pass();
    assert_eq!(harness.log().measured(), ids);
    assert_eq!(harness.size(ids[0]), Some(Size::new(10.0, 20.0)));
    for &id in &ids {
        assert_eq!(harness.measure_count(id), 1, "node {id}");
        assert_eq!(harness.layout_count(id), 1, "node {id}");
    }
}

#[test]
fn leaf_resize_propagates_up_the_chain() {
    let mut harness = LayoutHarness::new(Constraints::loose(100.0, 100.0));
    let (ids, leaf_size) = harness.chain(3, Size::new(10.0, 20.0));
    harness.pass();

    let leaf = *ids.last().unwrap();
    leaf_size.replace(Size::new(30.0, 40.0));
    harness.scheduler_mut().invalidate_measurement(leaf);
    harness.pass();

    let bottom_up: Vec<_> = ids.iter().rev().copied().collect();
    assert_eq!(harness.log().measured(), bottom_up);
    for &id in &ids {
        assert_size_approx_eq(
            harness.size(id).unwrap(),
            Size::new(30.0, 40.0),
            0.0,
            &format!("node {id}"),
        );
    }
    assert!(!harness.scheduler().has_pending_measure_or_layout());
}

#[test]
fn resizing_the_last_item_leaves_earlier_siblings_alone() {
    let mut harness = LayoutHarness::new(Constraints::loose(100.0, 100.0));
    let (root, leaves) = harness.wide(4, Size::new(10.0, 10.0));
    harness.pass();

    let (last, handle) = &leaves[3];
    handle.replace(Size::new(10.0, 25.0));
    harness.scheduler_mut().invalidate_measurement(*last);
    harness.pass();

    assert_eq!(harness.log().measured(), vec![*last, root]);
    for (leaf, _) in &leaves[..3] {
        assert_eq!(harness.measure_count(*leaf), 1);
    }
    assert_eq!(harness.size(root), Some(Size::new(10.0, 55.0)));
    assert_eq!(harness.position(*last), Point::new(0.0, 30.0));
}

#[test]
fn batched_invalidations_remeasure_the_parent_once() {
    let mut harness = LayoutHarness::new(Constraints::loose(100.0, 100.0));
    let (root, leaves) = harness.wide(3, Size::new(10.0, 10.0));
    harness.pass();

    for (leaf, handle) in &leaves {
        handle.replace(Size::new(20.0, 20.0));
        harness.scheduler_mut().invalidate_measurement(*leaf);
    }
    harness.pass();

    assert_eq!(harness.measure_count(root), 2);
    for (leaf, _) in &leaves {
        assert_eq!(harness.measure_count(*leaf), 2);
    }
    assert_eq!(harness.size(root), Some(Size::new(20.0, 60.0)));
}

#[test]
fn removing_a_child_shifts_later_siblings() {
    let mut harness = LayoutHarness::new(Constraints::loose(100.0, 100.0));
    let (root, leaves) = harness.wide(3, Size::new(10.0, 10.0));
    harness.pass();
    assert_eq!(harness.position(leaves[2].0), Point::new(0.0, 20.0));

    harness
        .scheduler_mut()
        .remove_child(root, leaves[1].0)
        .unwrap();
    harness.pass();

    assert!(!harness.scheduler().tree().contains(leaves[1].0));
    assert_eq!(harness.position(leaves[2].0), Point::new(0.0, 10.0));
    assert_eq!(harness.size(root), Some(Size::new(10.0, 20.0)));
}

#[test]
fn position_in_root_accumulates_offsets() {
    let mut harness = LayoutHarness::new(Constraints::loose(100.0, 100.0));
    let root = harness.column();
    harness.set_root(root);
    let (spacer, _) = harness.leaf(Size::new(10.0, 15.0));
    harness.append(root, spacer);
    let row = harness.row();
    harness.append(root, row);
    let (first, _) = harness.leaf(Size::new(5.0, 5.0));
    let (second, _) = harness.leaf(Size::new(5.0, 5.0));
    harness.append(row, first);
    harness.append(row, second);
    harness.pass();

    assert_point_approx_eq(
        harness.position_in_root(second),
        Point::new(5.0, 15.0),
        0.001,
        "second item",
    );
    let hit = harness.scheduler().tree().hit_test(Point::new(7.0, 17.0));
    assert_eq!(hit.innermost(), Some(second));
}
