//! Swapping one subtree for another with paired enter/exit animations.

use crate::animation::{AnimationSpec, AnimationType, Easing};
use crate::enter_exit::{
    ComposedEffect, EnterExitAnimation, EnterExitState, EnterTransition, ExitTransition,
};
use crate::transition::{
    default_spring, Segment, Transition, TransitionState, TransitionValue,
};
use indexmap::IndexMap;
use remeasure_core::{FrameCallbackRegistration, FrameClock, NodeId};
use remeasure_geometry::Size;
use remeasure_layout::{
    Alignment, Constraints, LayoutDirection, MeasurePolicy, MeasureScope, PlacementScope,
};
use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

/// Bound for content keys.
pub trait ContentKey: Clone + Eq + Hash + Debug + 'static {}

impl<T: Clone + Eq + Hash + Debug + 'static> ContentKey for T {}

/// How the container's size follows the content.
#[derive(Clone)]
pub struct SizeTransform {
    pub clip: bool,
    spec: Rc<dyn Fn(Size, Size) -> AnimationType>,
}

impl SizeTransform {
    pub fn new(clip: bool, spec: impl Fn(Size, Size) -> AnimationType + 'static) -> Self {
        Self {
            clip,
            spec: Rc::new(spec),
        }
    }

    /// Animation from the initial content's size to the target content's.
    pub fn spec(&self, initial: Size, target: Size) -> AnimationType {
        (self.spec)(initial, target)
    }
}

impl Default for SizeTransform {
    fn default() -> Self {
        Self::new(true, |_, _| default_spring())
    }
}

impl Debug for SizeTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SizeTransform").field("clip", &self.clip).finish()
    }
}

/// Enter transition for the target content, exit transition for the
/// content it replaces.
#[derive(Clone, Debug)]
pub struct ContentTransform {
    pub enter: EnterTransition,
    pub exit: ExitTransition,
    /// Z-index of the entering content; ties keep insertion order, so the
    /// target draws last by default.
    pub target_z_index: f32,
    /// `None` snaps the container to the target size.
    pub size_transform: Option<SizeTransform>,
}

impl ContentTransform {
    pub fn new(enter: EnterTransition, exit: ExitTransition) -> Self {
        Self {
            enter,
            exit,
            target_z_index: 0.0,
            size_transform: Some(SizeTransform::default()),
        }
    }

    pub fn with_target_z_index(mut self, z_index: f32) -> Self {
        self.target_z_index = z_index;
        self
    }

    pub fn using(mut self, size_transform: Option<SizeTransform>) -> Self {
        self.size_transform = size_transform;
        self
    }
}

impl Default for ContentTransform {
    /// Fades and scales the new content in after the old one faded out.
    fn default() -> Self {
        let enter_spec: AnimationType = AnimationSpec::tween(220, Easing::LinearOutSlowIn)
            .with_delay(90)
            .into();
        Self::new(
            EnterTransition::fade_in(enter_spec, 0.0) + EnterTransition::scale_in(enter_spec, 0.92),
            ExitTransition::fade_out(AnimationSpec::linear(90).into(), 0.0),
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ContentEvent<S> {
    /// Content for `S` must be composed and bound with `bind_node`.
    Shown(S),
    /// Content for `S` finished exiting; its node can be removed.
    Disposed { state: S, node: Option<NodeId> },
}

struct ContentEntry<S: TransitionState> {
    state: S,
    enter_exit: EnterExitAnimation,
    node: Option<NodeId>,
    z_index: f32,
}

struct CoordinatorInner<S: TransitionState, K: ContentKey> {
    transition: Transition<S>,
    content_key: Rc<dyn Fn(&S) -> K>,
    transition_spec: Box<dyn Fn(&Segment<S>) -> ContentTransform>,
    /// Live content in drawing order; the target is always last.
    entries: IndexMap<K, ContentEntry<S>>,
    target_sizes: Rc<RefCell<IndexMap<K, Size>>>,
    size_transform: Rc<RefCell<Option<SizeTransform>>>,
    container_size: TransitionValue<Size>,
    events: Vec<ContentEvent<S>>,
    clock: Option<FrameClock>,
    registration: Option<FrameCallbackRegistration>,
    on_frame: Option<Rc<dyn Fn()>>,
    direction: LayoutDirection,
}

impl<S: TransitionState, K: ContentKey> CoordinatorInner<S, K> {
    fn key(&self, state: &S) -> K {
        (self.content_key)(state)
    }

    fn add_entry(&mut self, state: S, enter: EnterTransition, z_index: f32) {
        let key = self.key(&state);
        let content_key = Rc::clone(&self.content_key);
        let entry_key = key.clone();
        let has_been_visible = Cell::new(false);
        let child = self
            .transition
            .create_child_transition("enter/exit", move |parent: &S| {
                if content_key(parent) == entry_key {
                    has_been_visible.set(true);
                    EnterExitState::Visible
                } else if has_been_visible.get() {
                    EnterExitState::PostExit
                } else {
                    EnterExitState::PreEnter
                }
            });
        log::trace!("showing content for {:?}", state);
        self.events.push(ContentEvent::Shown(state.clone()));
        let enter_exit = EnterExitAnimation::new(child, enter, ExitTransition::none());
        enter_exit.set_layout_direction(self.direction);
        self.entries.insert(
            key,
            ContentEntry {
                state,
                enter_exit,
                node: None,
                z_index,
            },
        );
    }

    fn dispose(&mut self, key: &K) {
        let Some(entry) = self.entries.shift_remove(key) else {
            return;
        };
        self.transition.remove_child(entry.enter_exit.transition());
        self.target_sizes.borrow_mut().shift_remove(key);
        log::debug!("disposed content for {:?}", entry.state);
        self.events.push(ContentEvent::Disposed {
            state: entry.state,
            node: entry.node,
        });
    }

    fn dispose_finished_exits(&mut self) {
        let target_key = self.key(&self.transition.target_state());
        let target_entered = self
            .entries
            .get(&target_key)
            .map_or(true, |entry| entry.enter_exit.is_entered());
        let finished: Vec<K> = self
            .entries
            .iter()
            .filter(|(key, entry)| {
                **key != target_key
                    && entry.enter_exit.is_exited()
                    && (!entry.enter_exit.holds_on_exit() || target_entered)
            })
            .map(|(key, _)| key.clone())
            .collect();
        for key in finished {
            self.dispose(&key);
        }
    }

    /// Once the transition has converged only the current content stays.
    fn prune_after_convergence(&mut self) {
        if self.transition.is_running() {
            return;
        }
        let current = self.key(&self.transition.current_state());
        let stale: Vec<K> = self
            .entries
            .keys()
            .filter(|key| **key != current)
            .cloned()
            .collect();
        for key in stale {
            self.dispose(&key);
        }
        self.target_sizes.borrow_mut().retain(|key, _| *key == current);
    }
}

/// Decides which content stays alive while one state's content replaces
/// another's, and with which enter/exit animation each one runs.
///
/// The host composes content when it receives [`ContentEvent::Shown`],
/// binds its node with [`bind_node`](Self::bind_node), and removes the
/// node on [`ContentEvent::Disposed`]. [`AnimatedContentPolicy`] measures
/// and places the bound nodes.
pub struct ContentTransitionCoordinator<S: TransitionState, K: ContentKey = S> {
    inner: Rc<RefCell<CoordinatorInner<S, K>>>,
}

impl<S: TransitionState, K: ContentKey> Clone for ContentTransitionCoordinator<S, K> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: TransitionState + Eq + Hash> ContentTransitionCoordinator<S, S> {
    pub fn new(
        initial: S,
        transition_spec: impl Fn(&Segment<S>) -> ContentTransform + 'static,
    ) -> Self {
        Self::with_content_key(initial, S::clone, transition_spec)
    }
}

impl<S: TransitionState, K: ContentKey> ContentTransitionCoordinator<S, K> {
    /// States mapping to the same key share content: switching between them
    /// replaces the state in place instead of animating.
    pub fn with_content_key(
        initial: S,
        content_key: impl Fn(&S) -> K + 'static,
        transition_spec: impl Fn(&Segment<S>) -> ContentTransform + 'static,
    ) -> Self {
        let content_key: Rc<dyn Fn(&S) -> K> = Rc::new(content_key);
        let transition = Transition::new(initial.clone(), "content transition");
        let target_sizes: Rc<RefCell<IndexMap<K, Size>>> = Rc::default();
        let size_transform: Rc<RefCell<Option<SizeTransform>>> =
            Rc::new(RefCell::new(Some(SizeTransform::default())));

        let container_size = {
            let (spec_sizes, spec_keys, spec_transform) = (
                Rc::clone(&target_sizes),
                Rc::clone(&content_key),
                Rc::clone(&size_transform),
            );
            let (target_sizes, keys) = (Rc::clone(&target_sizes), Rc::clone(&content_key));
            transition.animate_size(
                "container size",
                move |segment| {
                    let sizes = spec_sizes.borrow();
                    let initial = sizes.get(&spec_keys(&segment.initial_state));
                    let target = sizes.get(&spec_keys(&segment.target_state));
                    match (spec_transform.borrow().as_ref(), initial, target) {
                        (None, _, _) => AnimationType::Snap,
                        (Some(transform), Some(initial), Some(target)) => {
                            transform.spec(*initial, *target)
                        }
                        (Some(_), _, _) => default_spring(),
                    }
                },
                move |state| {
                    target_sizes
                        .borrow()
                        .get(&keys(state))
                        .copied()
                        .unwrap_or(Size::ZERO)
                },
            )
        };

        let mut inner = CoordinatorInner {
            transition,
            content_key,
            transition_spec: Box::new(transition_spec),
            entries: IndexMap::new(),
            target_sizes,
            size_transform,
            container_size,
            events: Vec::new(),
            clock: None,
            registration: None,
            on_frame: None,
            direction: LayoutDirection::Ltr,
        };
        inner.add_entry(initial, EnterTransition::none(), 0.0);
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    /// Drives frames from `clock` from now on.
    pub fn attach_clock(&self, clock: FrameClock) {
        self.inner.borrow_mut().clock = Some(clock);
        self.schedule_frame();
    }

    /// Runs `listener` after every frame, e.g. to invalidate the container.
    pub fn set_on_frame(&self, listener: impl Fn() + 'static) {
        self.inner.borrow_mut().on_frame = Some(Rc::new(listener));
    }

    pub fn current_state(&self) -> S {
        self.inner.borrow().transition.current_state()
    }

    pub fn target_state(&self) -> S {
        self.inner.borrow().transition.target_state()
    }

    pub fn is_running(&self) -> bool {
        self.inner.borrow().transition.is_running()
    }

    pub fn transition(&self) -> Transition<S> {
        self.inner.borrow().transition.clone()
    }

    /// States whose content is alive, in drawing order.
    pub fn visible_states(&self) -> Vec<S> {
        self.inner
            .borrow()
            .entries
            .values()
            .map(|entry| entry.state.clone())
            .collect()
    }

    /// Starts moving to `target`.
    ///
    /// New content is appended after everything visible. A state sharing
    /// the key of visible content takes over that content and moves it to
    /// the end. Content that is neither the new target nor the state being
    /// left is disposed right away, so at most one content exits at a time.
    pub fn set_target(&self, target: S) {
        {
            let mut inner = self.inner.borrow_mut();
            let (current, previous_target) = (
                inner.transition.current_state(),
                inner.transition.target_state(),
            );
            if previous_target == target {
                return;
            }
            let initial = if current != previous_target {
                previous_target
            } else {
                current
            };
            let segment = Segment {
                initial_state: initial,
                target_state: target.clone(),
            };
            let transform = (inner.transition_spec)(&segment);
            *inner.size_transform.borrow_mut() = transform.size_transform.clone();

            let target_key = inner.key(&target);
            let initial_key = inner.key(&segment.initial_state);
            let stale: Vec<K> = inner
                .entries
                .keys()
                .filter(|key| **key != target_key && **key != initial_key)
                .cloned()
                .collect();
            for key in stale {
                inner.dispose(&key);
            }
            for (key, entry) in inner.entries.iter() {
                entry.enter_exit.settle();
                if *key != target_key {
                    entry.enter_exit.set_exit(transform.exit.clone());
                }
            }

            log::debug!("content transition {:?} -> {:?}", segment.initial_state, target);
            inner.transition.animate_to(target.clone());

            match inner.entries.get_index_of(&target_key) {
                Some(index) => {
                    let last = inner.entries.len() - 1;
                    inner.entries.move_index(index, last);
                    if let Some(entry) = inner.entries.get_mut(&target_key) {
                        entry.state = target;
                        entry.z_index = transform.target_z_index;
                    }
                }
                None => inner.add_entry(target, transform.enter, transform.target_z_index),
            }
        }
        self.schedule_frame();
    }

    /// Advances every animation. Returns true while the transition runs.
    pub fn on_frame(&self, frame_time_nanos: u64) -> bool {
        let (running, listener) = {
            let mut inner = self.inner.borrow_mut();
            inner.transition.on_frame(frame_time_nanos);
            for entry in inner.entries.values() {
                entry.enter_exit.settle();
            }
            inner.dispose_finished_exits();
            inner.prune_after_convergence();
            (inner.transition.is_running(), inner.on_frame.clone())
        };
        if let Some(listener) = listener {
            listener();
        }
        running
    }

    /// Associates the node composed for `state`'s content.
    pub fn bind_node(&self, state: &S, node: NodeId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let key = inner.key(state);
        match inner.entries.get_mut(&key) {
            Some(entry) => {
                entry.node = Some(node);
                true
            }
            None => false,
        }
    }

    pub fn node_for(&self, state: &S) -> Option<NodeId> {
        let inner = self.inner.borrow();
        inner.entries.get(&inner.key(state)).and_then(|entry| entry.node)
    }

    /// State whose content is bound to `node`.
    pub fn state_for_node(&self, node: NodeId) -> Option<S> {
        self.inner
            .borrow()
            .entries
            .values()
            .find(|entry| entry.node == Some(node))
            .map(|entry| entry.state.clone())
    }

    pub fn take_events(&self) -> Vec<ContentEvent<S>> {
        std::mem::take(&mut self.inner.borrow_mut().events)
    }

    /// Records the lookahead size of `state`'s content.
    pub fn record_target_size(&self, state: &S, size: Size) {
        let transition = {
            let inner = self.inner.borrow();
            let key = inner.key(state);
            let mut sizes = inner.target_sizes.borrow_mut();
            if sizes.get(&key) == Some(&size) {
                return;
            }
            sizes.insert(key, size);
            inner.transition.clone()
        };
        transition.refresh_targets();
    }

    pub fn try_target_size(&self, state: &S) -> Option<Size> {
        let inner = self.inner.borrow();
        let key = inner.key(state);
        let size = inner.target_sizes.borrow().get(&key).copied();
        size
    }

    /// # Panics
    ///
    /// Panics if no lookahead pass has measured `state`'s content yet.
    pub fn target_size(&self, state: &S) -> Size {
        match self.try_target_size(state) {
            Some(size) => size,
            None => panic!(
                "target size of {:?} requested before the lookahead pass measured it",
                state
            ),
        }
    }

    /// States with a recorded target size, in recording order.
    pub fn sized_states(&self) -> Vec<K> {
        self.inner.borrow().target_sizes.borrow().keys().cloned().collect()
    }

    /// Size the container shows this frame.
    pub fn container_size(&self) -> Size {
        self.inner.borrow().container_size.value()
    }

    pub fn clips_to_size(&self) -> bool {
        self.inner
            .borrow()
            .size_transform
            .borrow()
            .as_ref()
            .is_some_and(|transform| transform.clip)
    }

    /// Resolves START and END change-size anchors of every content.
    pub fn set_layout_direction(&self, direction: LayoutDirection) {
        let mut inner = self.inner.borrow_mut();
        inner.direction = direction;
        for entry in inner.entries.values() {
            entry.enter_exit.set_layout_direction(direction);
        }
    }

    /// Records the measured size of `state`'s content.
    pub fn set_full_size(&self, state: &S, size: Size) {
        let inner = self.inner.borrow();
        if let Some(entry) = inner.entries.get(&inner.key(state)) {
            entry.enter_exit.set_full_size(size);
        }
    }

    pub fn effect(&self, state: &S) -> Option<ComposedEffect> {
        let inner = self.inner.borrow();
        inner
            .entries
            .get(&inner.key(state))
            .map(|entry| entry.enter_exit.effect())
    }

    /// Bound content in drawing order: ascending z-index, then visible
    /// order.
    pub fn placement_order(&self) -> Vec<(S, NodeId, ComposedEffect)> {
        let inner = self.inner.borrow();
        let mut ordered: Vec<(f32, S, NodeId, ComposedEffect)> = inner
            .entries
            .values()
            .filter_map(|entry| {
                entry.node.map(|node| {
                    (
                        entry.z_index,
                        entry.state.clone(),
                        node,
                        entry.enter_exit.effect(),
                    )
                })
            })
            .collect();
        ordered.sort_by(|a, b| a.0.total_cmp(&b.0));
        ordered
            .into_iter()
            .map(|(_, state, node, effect)| (state, node, effect))
            .collect()
    }

    fn schedule_frame(&self) {
        let clock = {
            let inner = self.inner.borrow();
            if inner.registration.is_some() || !inner.transition.is_running() {
                return;
            }
            match &inner.clock {
                Some(clock) => clock.clone(),
                None => return,
            }
        };
        let weak = Rc::downgrade(&self.inner);
        let registration = clock.with_frame_nanos(move |time| {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().registration = None;
                let coordinator = ContentTransitionCoordinator { inner };
                if coordinator.on_frame(time) {
                    coordinator.schedule_frame();
                }
            }
        });
        self.inner.borrow_mut().registration = Some(registration);
    }
}

/// Container policy for a [`ContentTransitionCoordinator`].
///
/// In the lookahead pass it records each content's size as its target
/// size and reports the target content's size. In the real pass it reports
/// the animated container size and places every bound content by z-order,
/// applying its enter/exit effect. Containers outside a lookahead scope
/// record target sizes during the real pass instead.
pub struct AnimatedContentPolicy<S: TransitionState, K: ContentKey = S> {
    coordinator: ContentTransitionCoordinator<S, K>,
    content_alignment: Alignment,
}

impl<S: TransitionState, K: ContentKey> AnimatedContentPolicy<S, K> {
    pub fn new(coordinator: ContentTransitionCoordinator<S, K>) -> Self {
        Self {
            coordinator,
            content_alignment: Alignment::TOP_START,
        }
    }

    pub fn with_content_alignment(mut self, alignment: Alignment) -> Self {
        self.content_alignment = alignment;
        self
    }
}

impl<S: TransitionState, K: ContentKey> MeasurePolicy for AnimatedContentPolicy<S, K> {
    fn measure(&self, scope: &mut MeasureScope<'_>, constraints: Constraints) -> Size {
        let lookahead = scope.is_lookahead();
        self.coordinator
            .set_layout_direction(scope.context().layout_direction);
        let node = scope.node();
        let in_lookahead_scope = scope
            .scheduler()
            .node(node)
            .is_some_and(|n| n.lookahead_root().is_some());
        for child in scope.children() {
            let Some(state) = self.coordinator.state_for_node(child) else {
                continue;
            };
            let size = scope.measure(child, constraints);
            if lookahead || !in_lookahead_scope {
                self.coordinator.record_target_size(&state, size);
            }
            if !lookahead {
                self.coordinator.set_full_size(&state, size);
            }
        }
        let target = self.coordinator.target_state();
        if lookahead {
            return constraints.constrain_size(self.coordinator.target_size(&target));
        }
        constraints.constrain_size(self.coordinator.container_size())
    }

    fn place(&self, scope: &mut PlacementScope<'_>, size: Size) {
        let direction = scope.context().layout_direction;
        self.coordinator.set_layout_direction(direction);
        for (_, node, effect) in self.coordinator.placement_order() {
            let Some(measured) = scope.measured_size(node) else {
                continue;
            };
            let position = if scope.is_lookahead() {
                self.content_alignment.align_offset(measured, size, direction)
            } else {
                self.content_alignment.align_offset(effect.size, size, direction)
                    + effect.content_position()
            };
            scope.place(node, position);
        }
    }
}

#[cfg(test)]
#[path = "tests/content_transition_tests.rs"]
mod tests;
