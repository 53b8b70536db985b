use super::*;
use crate::alignment::Alignment;
use crate::node::LayoutCoordinates;
use crate::policies::{BoxPolicy, FixedSizePolicy};
use remeasure_core::Owned;
use std::cell::{Cell, RefCell};

type Log = Rc<RefCell<Vec<(NodeId, &'static str)>>>;

/// Wraps a policy and records every measure and place call.
struct Logged<P> {
    inner: P,
    log: Log,
}

impl<P: MeasurePolicy> MeasurePolicy for Logged<P> {
    fn measure(&self, scope: &mut MeasureScope<'_>, constraints: Constraints) -> Size {
        self.log.borrow_mut().push((scope.node(), "measure"));
        self.inner.measure(scope, constraints)
    }

    fn place(&self, scope: &mut PlacementScope<'_>, size: Size) {
        self.log.borrow_mut().push((scope.node(), "place"));
        self.inner.place(scope, size)
    }
}

/// Fixed size; measures its children only from the placement block.
struct MeasureInPlace {
    size: Size,
}

impl MeasurePolicy for MeasureInPlace {
    fn measure(&self, _scope: &mut MeasureScope<'_>, constraints: Constraints) -> Size {
        constraints.constrain_size(self.size)
    }

    fn place(&self, scope: &mut PlacementScope<'_>, size: Size) {
        for child in scope.children() {
            scope.measure(child, Constraints::loose(size.width, size.height));
            scope.place(child, Point::new(1.0, 2.0));
        }
    }
}

fn new_scheduler() -> MeasureLayoutScheduler {
    let mut scheduler = MeasureLayoutScheduler::with_config(
        LayoutContext::default(),
        SchedulerConfig {
            check_consistency: true,
        },
    );
    scheduler.set_root_constraints(Constraints::loose(200.0, 200.0));
    scheduler
}

fn fixed(scheduler: &mut MeasureLayoutScheduler, width: f32, height: f32) -> (NodeId, Owned<Size>) {
    let policy = FixedSizePolicy::new(Size::new(width, height));
    let handle = policy.handle();
    (scheduler.create_node(Rc::new(policy)), handle)
}

fn boxed(scheduler: &mut MeasureLayoutScheduler) -> NodeId {
    scheduler.create_node(Rc::new(BoxPolicy::new(Alignment::TOP_START)))
}

fn node(scheduler: &MeasureLayoutScheduler, id: NodeId) -> &LayoutNode {
    scheduler.node(id).expect("node exists")
}

#[test]
fn initial_pass_measures_and_places_everything() {
    let mut scheduler = new_scheduler();
    let root = boxed(&mut scheduler);
    scheduler.set_root(root).unwrap();
    let (a, _) = fixed(&mut scheduler, 50.0, 20.0);
    let (b, _) = fixed(&mut scheduler, 30.0, 40.0);
    scheduler.insert_child(root, 0, a).unwrap();
    scheduler.insert_child(root, 1, b).unwrap();

    assert!(scheduler.measure_and_layout());

    assert_eq!(node(&scheduler, root).measured_size(), Some(Size::new(50.0, 40.0)));
    for id in [root, a, b] {
        let n = node(&scheduler, id);
        assert!(n.is_placed());
        assert!(!n.measure_pending());
        assert!(!n.layout_pending());
        assert_eq!(n.layout_state(), LayoutState::Idle);
        assert_eq!(n.measure_count(), 1);
    }
    assert_eq!(node(&scheduler, a).measured_by_parent(), UsageByParent::InMeasureBlock);
    assert!(!scheduler.has_pending_measure_or_layout());
}

#[test]
fn pass_without_root_constraints_does_nothing() {
    let mut scheduler = MeasureLayoutScheduler::new();
    let root = boxed(&mut scheduler);
    scheduler.set_root(root).unwrap();
    assert!(!scheduler.measure_and_layout());
    assert_eq!(node(&scheduler, root).measure_count(), 0);
    assert!(scheduler.has_pending_measure_or_layout());
}

#[test]
fn leaf_resize_remeasures_only_its_dependents() {
    let mut scheduler = new_scheduler();
    let root = boxed(&mut scheduler);
    scheduler.set_root(root).unwrap();
    let (a, a_size) = fixed(&mut scheduler, 50.0, 20.0);
    let (b, _) = fixed(&mut scheduler, 30.0, 40.0);
    scheduler.insert_child(root, 0, a).unwrap();
    scheduler.insert_child(root, 1, b).unwrap();
    scheduler.measure_and_layout();

    a_size.replace(Size::new(80.0, 20.0));
    assert!(scheduler.invalidate_measurement(a));
    assert!(scheduler.dirty_nodes().contains(a));

    assert!(scheduler.measure_and_layout());
    assert_eq!(node(&scheduler, root).measured_size(), Some(Size::new(80.0, 40.0)));
    assert_eq!(node(&scheduler, a).measure_count(), 2);
    assert_eq!(node(&scheduler, root).measure_count(), 2);
    assert_eq!(node(&scheduler, b).measure_count(), 1);
}

#[test]
fn unchanged_size_stops_propagation() {
    let mut scheduler = new_scheduler();
    let root = boxed(&mut scheduler);
    scheduler.set_root(root).unwrap();
    let (a, _) = fixed(&mut scheduler, 50.0, 20.0);
    scheduler.insert_child(root, 0, a).unwrap();
    scheduler.measure_and_layout();

    scheduler.invalidate_measurement(a);
    assert!(!scheduler.measure_and_layout());
    assert_eq!(node(&scheduler, a).measure_count(), 2);
    assert_eq!(node(&scheduler, root).measure_count(), 1);
    assert_eq!(node(&scheduler, root).layout_count(), 1);
}

#[test]
fn relayout_request_skips_measure() {
    let mut scheduler = new_scheduler();
    let root = boxed(&mut scheduler);
    scheduler.set_root(root).unwrap();
    let (a, _) = fixed(&mut scheduler, 10.0, 10.0);
    scheduler.insert_child(root, 0, a).unwrap();
    scheduler.measure_and_layout();

    assert!(scheduler.invalidate_layout(a));
    // Already pending: absorbed.
    assert!(!scheduler.request_relayout(a, false));
    scheduler.measure_and_layout();
    assert_eq!(node(&scheduler, a).measure_count(), 1);
    assert_eq!(node(&scheduler, a).layout_count(), 2);
    assert_eq!(node(&scheduler, root).layout_count(), 1);
}

#[test]
fn size_change_in_layout_block_only_relayouts_parent() {
    let mut scheduler = new_scheduler();
    let root = scheduler.create_node(Rc::new(MeasureInPlace {
        size: Size::new(100.0, 100.0),
    }));
    scheduler.set_root(root).unwrap();
    let (child, child_size) = fixed(&mut scheduler, 10.0, 10.0);
    scheduler.insert_child(root, 0, child).unwrap();
    scheduler.measure_and_layout();
    assert_eq!(node(&scheduler, child).measured_by_parent(), UsageByParent::InLayoutBlock);
    assert_eq!(node(&scheduler, child).position(), Point::new(1.0, 2.0));

    child_size.replace(Size::new(30.0, 30.0));
    scheduler.invalidate_measurement(child);
    assert!(!scheduler.measure_and_layout());

    let root_node = node(&scheduler, root);
    assert_eq!(root_node.measure_count(), 1);
    assert_eq!(root_node.layout_count(), 2);
    assert_eq!(node(&scheduler, child).measured_size(), Some(Size::new(30.0, 30.0)));
}

#[test]
fn dirty_nodes_are_processed_parent_first() {
    let mut scheduler = new_scheduler();
    let log: Log = Rc::default();
    let logged = |log: &Log| {
        Rc::new(Logged {
            inner: BoxPolicy::default(),
            log: Rc::clone(log),
        })
    };
    let root = scheduler.create_node(logged(&log));
    let middle = scheduler.create_node(logged(&log));
    let leaf = scheduler.create_node(logged(&log));
    scheduler.set_root(root).unwrap();
    scheduler.insert_child(root, 0, middle).unwrap();
    scheduler.insert_child(middle, 0, leaf).unwrap();
    scheduler.measure_and_layout();
    log.borrow_mut().clear();

    // The leaf is invalidated first but is deeper, so the root goes first.
    scheduler.invalidate_measurement(leaf);
    scheduler.invalidate_measurement(root);
    scheduler.measure_and_layout();

    assert_eq!(
        log.borrow().as_slice(),
        &[
            (root, "measure"),
            (root, "place"),
            (leaf, "measure"),
            (leaf, "place"),
        ]
    );
}

struct InvalidatesSelfWhileMeasuring;

impl MeasurePolicy for InvalidatesSelfWhileMeasuring {
    fn measure(&self, scope: &mut MeasureScope<'_>, constraints: Constraints) -> Size {
        let node = scope.node();
        assert!(!scope.scheduler().request_remeasure(node, false));
        constraints.constrain_size(Size::new(5.0, 5.0))
    }
}

#[test]
fn remeasure_request_while_measuring_is_absorbed() {
    let mut scheduler = new_scheduler();
    let root = scheduler.create_node(Rc::new(InvalidatesSelfWhileMeasuring));
    scheduler.set_root(root).unwrap();
    scheduler.measure_and_layout();
    assert!(!node(&scheduler, root).measure_pending());
    assert!(!scheduler.has_pending_measure_or_layout());
    assert_eq!(node(&scheduler, root).measure_count(), 1);
}

struct InvalidatesSelfWhilePlacing {
    fired: Cell<bool>,
}

impl MeasurePolicy for InvalidatesSelfWhilePlacing {
    fn measure(&self, _scope: &mut MeasureScope<'_>, constraints: Constraints) -> Size {
        constraints.constrain_size(Size::new(5.0, 5.0))
    }

    fn place(&self, scope: &mut PlacementScope<'_>, _size: Size) {
        if !self.fired.replace(true) {
            let node = scope.node();
            assert!(!scope.scheduler().request_remeasure(node, false));
            assert_eq!(scope.scheduler().postponed_requests().len(), 1);
        }
    }
}

#[test]
fn remeasure_request_while_laying_out_is_postponed_and_replayed() {
    let mut scheduler = new_scheduler();
    let root = boxed(&mut scheduler);
    scheduler.set_root(root).unwrap();
    let child = scheduler.create_node(Rc::new(InvalidatesSelfWhilePlacing {
        fired: Cell::new(false),
    }));
    scheduler.insert_child(root, 0, child).unwrap();

    scheduler.measure_and_layout();

    assert_eq!(node(&scheduler, child).measure_count(), 2);
    assert!(scheduler.postponed_requests().is_empty());
    assert!(!scheduler.has_pending_measure_or_layout());
    assert!(!node(&scheduler, child).measure_pending());
}

/// Places its children, then remeasures them again from the same
/// placement block the first time it lays out.
struct RemeasuresAfterPlacing {
    done: Cell<bool>,
}

impl MeasurePolicy for RemeasuresAfterPlacing {
    fn measure(&self, _scope: &mut MeasureScope<'_>, constraints: Constraints) -> Size {
        constraints.constrain_size(Size::new(50.0, 50.0))
    }

    fn place(&self, scope: &mut PlacementScope<'_>, size: Size) {
        let constraints = Constraints::loose(size.width, size.height);
        for child in scope.children() {
            scope.measure(child, constraints);
            scope.place(child, Point::ZERO);
            if !self.done.replace(true) {
                assert_eq!(scope.scheduler().postponed_requests().len(), 1);
                scope.scheduler().request_remeasure(child, false);
                scope.measure(child, constraints);
                scope.place(child, Point::ZERO);
            }
        }
    }
}

#[test]
fn postponed_request_is_dropped_once_the_node_was_remeasured() {
    let mut scheduler = new_scheduler();
    let root = scheduler.create_node(Rc::new(RemeasuresAfterPlacing {
        done: Cell::new(false),
    }));
    scheduler.set_root(root).unwrap();
    let child = scheduler.create_node(Rc::new(InvalidatesSelfWhilePlacing {
        fired: Cell::new(false),
    }));
    scheduler.insert_child(root, 0, child).unwrap();

    scheduler.measure_and_layout();

    assert_eq!(node(&scheduler, child).measure_count(), 2);
    assert!(scheduler.postponed_requests().is_empty());
    assert!(!scheduler.has_pending_measure_or_layout());
    assert!(!node(&scheduler, child).measure_pending());
}

#[test]
fn repeated_remeasure_request_changes_nothing() {
    let mut scheduler = new_scheduler();
    let root = boxed(&mut scheduler);
    scheduler.set_root(root).unwrap();
    let (a, _) = fixed(&mut scheduler, 10.0, 10.0);
    scheduler.insert_child(root, 0, a).unwrap();
    scheduler.measure_and_layout();

    assert!(scheduler.request_remeasure(a, false));
    assert_eq!(scheduler.dirty_nodes().len(), 1);
    assert!(scheduler.dirty_nodes().contains(a));

    assert!(!scheduler.request_remeasure(a, false));
    assert_eq!(scheduler.dirty_nodes().len(), 1);
    assert!(scheduler.dirty_nodes().contains(a));
    assert!(node(&scheduler, a).measure_pending());

    // A forced request re-marks the node without a second dirty entry.
    assert!(scheduler.request_remeasure(a, true));
    assert_eq!(scheduler.dirty_nodes().len(), 1);
    assert!(node(&scheduler, a).measure_pending());

    scheduler.measure_and_layout();
    assert_eq!(node(&scheduler, a).measure_count(), 2);
    assert!(scheduler.dirty_nodes().is_empty());
}

#[test]
fn removing_a_subtree_purges_its_dirty_nodes() {
    let mut scheduler = new_scheduler();
    let root = boxed(&mut scheduler);
    let middle = boxed(&mut scheduler);
    scheduler.set_root(root).unwrap();
    let (leaf, _) = fixed(&mut scheduler, 10.0, 10.0);
    scheduler.insert_child(root, 0, middle).unwrap();
    scheduler.insert_child(middle, 0, leaf).unwrap();
    scheduler.measure_and_layout();

    scheduler.invalidate_measurement(leaf);
    assert!(scheduler.dirty_nodes().contains(leaf));
    scheduler.remove_child(root, middle).unwrap();
    assert!(!scheduler.dirty_nodes().contains(leaf));
    assert!(!scheduler.tree().contains(leaf));

    assert!(scheduler.measure_and_layout());
    assert_eq!(node(&scheduler, root).measured_size(), Some(Size::ZERO));
}

struct PlaceFirstOnly {
    show_all: Owned<bool>,
}

impl MeasurePolicy for PlaceFirstOnly {
    fn measure(&self, scope: &mut MeasureScope<'_>, constraints: Constraints) -> Size {
        for child in scope.children() {
            scope.measure(child, constraints.loosen());
        }
        constraints.constrain_size(Size::new(100.0, 100.0))
    }

    fn place(&self, scope: &mut PlacementScope<'_>, _size: Size) {
        let show_all = self.show_all.get();
        for (index, child) in scope.children().into_iter().enumerate() {
            if index == 0 || show_all {
                scope.place(child, Point::ZERO);
            }
        }
    }
}

#[test]
fn children_skipped_during_layout_become_unplaced() {
    let mut scheduler = new_scheduler();
    let show_all = Owned::new(true);
    let root = scheduler.create_node(Rc::new(PlaceFirstOnly {
        show_all: show_all.clone(),
    }));
    scheduler.set_root(root).unwrap();
    let (first, _) = fixed(&mut scheduler, 10.0, 10.0);
    let second = boxed(&mut scheduler);
    let (grandchild, _) = fixed(&mut scheduler, 5.0, 5.0);
    scheduler.insert_child(root, 0, first).unwrap();
    scheduler.insert_child(root, 1, second).unwrap();
    scheduler.insert_child(second, 0, grandchild).unwrap();
    scheduler.measure_and_layout();
    assert!(node(&scheduler, grandchild).is_placed());

    show_all.replace(false);
    scheduler.invalidate_layout(root);
    scheduler.measure_and_layout();

    assert!(node(&scheduler, first).is_placed());
    assert!(!node(&scheduler, second).is_placed());
    assert!(!node(&scheduler, grandchild).is_placed());

    // Unplaced nodes are skipped by the pass even when invalidated.
    scheduler.invalidate_measurement(grandchild);
    scheduler.measure_and_layout();
    assert_eq!(node(&scheduler, grandchild).measure_count(), 1);
    assert!(node(&scheduler, grandchild).measure_pending());
}

#[test]
fn position_callbacks_fire_once_per_affected_node() {
    let mut scheduler = new_scheduler();
    let root = boxed(&mut scheduler);
    scheduler.set_root(root).unwrap();
    let (child, _) = fixed(&mut scheduler, 10.0, 10.0);
    scheduler.insert_child(root, 0, child).unwrap();

    let calls: Rc<RefCell<Vec<NodeId>>> = Rc::default();
    for id in [root, child] {
        let calls = Rc::clone(&calls);
        scheduler
            .add_on_positioned_callback(
                id,
                Rc::new(move |node, coordinates: &LayoutCoordinates| {
                    assert_eq!(coordinates.size.width, 10.0);
                    calls.borrow_mut().push(node);
                }),
            )
            .unwrap();
    }

    scheduler.measure_and_layout();
    assert_eq!(calls.borrow().as_slice(), &[root, child]);

    calls.borrow_mut().clear();
    scheduler.invalidate_layout(child);
    scheduler.measure_and_layout();
    assert_eq!(calls.borrow().as_slice(), &[child]);
}

#[test]
fn layout_completed_listener_runs_once() {
    let mut scheduler = new_scheduler();
    let root = boxed(&mut scheduler);
    scheduler.set_root(root).unwrap();
    let count = Rc::new(Cell::new(0));
    {
        let count = Rc::clone(&count);
        scheduler.register_on_layout_completed(move || count.set(count.get() + 1));
    }
    scheduler.measure_and_layout();
    scheduler.invalidate_layout(root);
    scheduler.measure_and_layout();
    assert_eq!(count.get(), 1);
}

#[test]
fn root_constraint_change_remeasures_root() {
    let mut scheduler = new_scheduler();
    let (root, _) = fixed(&mut scheduler, 500.0, 500.0);
    scheduler.set_root(root).unwrap();
    scheduler.measure_and_layout();
    assert_eq!(node(&scheduler, root).measured_size(), Some(Size::new(200.0, 200.0)));

    scheduler.set_root_constraints(Constraints::loose(200.0, 200.0));
    assert!(!scheduler.has_pending_measure_or_layout());

    scheduler.set_root_constraints(Constraints::loose(300.0, 100.0));
    assert!(scheduler.measure_and_layout());
    assert_eq!(node(&scheduler, root).measured_size(), Some(Size::new(300.0, 100.0)));
}

#[test]
fn invalidation_schedules_a_frame_once() {
    struct Counting(Cell<usize>);
    impl FrameScheduler for Counting {
        fn schedule_frame(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    let mut scheduler = new_scheduler();
    let root = boxed(&mut scheduler);
    scheduler.set_root(root).unwrap();
    let (child, _) = fixed(&mut scheduler, 10.0, 10.0);
    scheduler.insert_child(root, 0, child).unwrap();
    scheduler.measure_and_layout();

    let frames = Rc::new(Counting(Cell::new(0)));
    scheduler.set_frame_scheduler(frames.clone());
    scheduler.invalidate_measurement(child);
    scheduler.invalidate_measurement(child);
    assert_eq!(frames.0.get(), 1);
}

struct ForcesSubtree;

impl MeasurePolicy for ForcesSubtree {
    fn measure(&self, scope: &mut MeasureScope<'_>, constraints: Constraints) -> Size {
        let mut size = Size::ZERO;
        for child in scope.children() {
            scope.force_measure_the_subtree(child);
            size = size.max(scope.measure(child, constraints.loosen()));
        }
        constraints.constrain_size(size)
    }
}

#[test]
fn force_measure_the_subtree_resolves_pending_descendants_first() {
    let mut scheduler = new_scheduler();
    let log: Log = Rc::default();
    let root = scheduler.create_node(Rc::new(Logged {
        inner: ForcesSubtree,
        log: Rc::clone(&log),
    }));
    let middle = scheduler.create_node(Rc::new(Logged {
        inner: BoxPolicy::default(),
        log: Rc::clone(&log),
    }));
    let leaf_policy = FixedSizePolicy::new(Size::new(10.0, 10.0));
    let leaf_size = leaf_policy.handle();
    let leaf = scheduler.create_node(Rc::new(Logged {
        inner: leaf_policy,
        log: Rc::clone(&log),
    }));
    scheduler.set_root(root).unwrap();
    scheduler.insert_child(root, 0, middle).unwrap();
    scheduler.insert_child(middle, 0, leaf).unwrap();
    scheduler.measure_and_layout();
    log.borrow_mut().clear();

    leaf_size.replace(Size::new(40.0, 40.0));
    scheduler.invalidate_measurement(leaf);
    scheduler.invalidate_measurement(root);
    scheduler.measure_and_layout();

    let measures: Vec<_> = log
        .borrow()
        .iter()
        .filter(|(_, event)| *event == "measure")
        .map(|(id, _)| *id)
        .collect();
    assert_eq!(measures, vec![root, leaf, middle]);
    assert_eq!(node(&scheduler, root).measured_size(), Some(Size::new(40.0, 40.0)));
    assert!(!scheduler.has_pending_measure_or_layout());
}

#[test]
#[should_panic(expected = "must run inside measure_and_layout")]
fn force_measure_outside_a_pass_panics() {
    let mut scheduler = new_scheduler();
    let root = boxed(&mut scheduler);
    scheduler.set_root(root).unwrap();
    scheduler.force_measure_the_subtree(root, false);
}

struct ReentersPass;

impl MeasurePolicy for ReentersPass {
    fn measure(&self, scope: &mut MeasureScope<'_>, _constraints: Constraints) -> Size {
        scope.scheduler().measure_and_layout();
        Size::ZERO
    }
}

#[test]
#[should_panic(expected = "while a pass is running")]
fn reentrant_measure_and_layout_panics() {
    let mut scheduler = new_scheduler();
    let root = scheduler.create_node(Rc::new(ReentersPass));
    scheduler.set_root(root).unwrap();
    scheduler.measure_and_layout();
}

#[test]
#[should_panic(expected = "outside a lookahead scope")]
fn lookahead_request_outside_scope_panics() {
    let mut scheduler = new_scheduler();
    let root = boxed(&mut scheduler);
    scheduler.set_root(root).unwrap();
    scheduler.request_lookahead_remeasure(root, false);
}

#[test]
fn lookahead_scope_measures_before_the_real_pass() {
    let mut scheduler = new_scheduler();
    let root = boxed(&mut scheduler);
    scheduler.set_root(root).unwrap();
    let scope = boxed(&mut scheduler);
    let (leaf, leaf_size) = fixed(&mut scheduler, 10.0, 10.0);
    scheduler.insert_child(root, 0, scope).unwrap();
    scheduler.insert_child(scope, 0, leaf).unwrap();
    scheduler.set_lookahead_root(scope, true).unwrap();
    scheduler.measure_and_layout();

    let leaf_node = node(&scheduler, leaf);
    assert_eq!(leaf_node.lookahead_root(), Some(scope));
    assert_eq!(leaf_node.lookahead_size(), Some(Size::new(10.0, 10.0)));
    assert_eq!(leaf_node.is_placed_in_lookahead(), Some(true));
    assert_eq!(leaf_node.lookahead_measure_count(), 1);
    assert_eq!(node(&scheduler, scope).lookahead_size(), Some(Size::new(10.0, 10.0)));
    assert_eq!(node(&scheduler, root).lookahead_size(), None);

    leaf_size.replace(Size::new(20.0, 20.0));
    assert!(scheduler.invalidate_measurement(leaf));
    assert!(node(&scheduler, leaf).lookahead_measure_pending());
    assert!(scheduler.measure_and_layout());

    assert_eq!(node(&scheduler, leaf).lookahead_measure_count(), 2);
    assert_eq!(node(&scheduler, scope).lookahead_size(), Some(Size::new(20.0, 20.0)));
    assert_eq!(node(&scheduler, scope).measured_size(), Some(Size::new(20.0, 20.0)));
    assert_eq!(node(&scheduler, root).measured_size(), Some(Size::new(20.0, 20.0)));
}

#[test]
fn moving_a_subtree_resorts_dirty_depths() {
    let mut scheduler = new_scheduler();
    let root = boxed(&mut scheduler);
    scheduler.set_root(root).unwrap();
    let holder = boxed(&mut scheduler);
    let (leaf, _) = fixed(&mut scheduler, 10.0, 10.0);
    scheduler.insert_child(root, 0, holder).unwrap();
    scheduler.insert_child(holder, 0, leaf).unwrap();
    assert_eq!(node(&scheduler, leaf).depth(), 2);
    scheduler.measure_and_layout();

    let (other, _) = fixed(&mut scheduler, 1.0, 1.0);
    scheduler.insert_child(root, 1, other).unwrap();
    scheduler.move_child(root, 1, 0).unwrap();
    assert_eq!(scheduler.tree().children(root), &[other, holder]);
    scheduler.measure_and_layout();
    assert!(node(&scheduler, other).is_placed());
}
