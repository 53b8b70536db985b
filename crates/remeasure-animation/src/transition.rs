//! State-driven transitions.
//!
//! A [`Transition`] tracks a `(current, target)` state pair. Values created
//! through [`Transition::animate_value`] map each state to a target value
//! and each [`Segment`] to an animation spec; they animate together and the
//! transition converges once all of them (and all child transitions) have
//! finished.

use crate::animation::{Animated, AnimationType, SpringSpec, TargetBasedAnimation};
use remeasure_core::{FrameCallbackRegistration, FrameClock};
use remeasure_geometry::{Point, Size};
use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

/// Bound for states a [`Transition`] can move between.
pub trait TransitionState: Clone + PartialEq + Debug + 'static {}

impl<T: Clone + PartialEq + Debug + 'static> TransitionState for T {}

/// The pair of states a transition is currently moving between.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment<S> {
    pub initial_state: S,
    pub target_state: S,
}

impl<S: PartialEq> Segment<S> {
    pub fn is_transitioning_to(&self, initial: &S, target: &S) -> bool {
        self.initial_state == *initial && self.target_state == *target
    }
}

type TargetFn<S, T> = Box<dyn Fn(&S) -> T>;
type SpecFn<S> = Box<dyn Fn(&Segment<S>) -> AnimationType>;

/// A value owned by a transition.
trait ChildAnimation<S> {
    fn on_play_time(&mut self, play_time_nanos: u64);
    /// A new segment began; restart from the showing value.
    fn retarget(&mut self, segment: &Segment<S>);
    /// Target values may have changed without a state change.
    fn refresh(&mut self, segment: &Segment<S>, play_time_nanos: u64, started: bool);
    fn snap(&mut self, state: &S);
    fn is_finished(&self) -> bool;
}

struct ValueState<S, T> {
    label: &'static str,
    value: T,
    target_by_state: TargetFn<S, T>,
    spec_by_segment: SpecFn<S>,
    animation: TargetBasedAnimation<T>,
    offset_nanos: u64,
    finished: bool,
    /// The value rests on its initial state's target rather than on an
    /// interpolated value, so it may be recomputed until the first frame.
    from_rest: bool,
}

impl<S: TransitionState, T: Animated> ChildAnimation<S> for ValueState<S, T> {
    fn on_play_time(&mut self, play_time_nanos: u64) {
        let play_time = play_time_nanos.saturating_sub(self.offset_nanos);
        self.value = self.animation.value_at(play_time);
        self.finished = self.animation.is_finished_at(play_time);
        if play_time > 0 {
            self.from_rest = false;
        }
    }

    fn retarget(&mut self, segment: &Segment<S>) {
        let target = (self.target_by_state)(&segment.target_state);
        self.from_rest = self.finished;
        let spec = (self.spec_by_segment)(segment);
        self.animation = TargetBasedAnimation::new(spec, self.value.clone(), target);
        self.offset_nanos = 0;
        self.finished = self.animation.is_finished_at(0);
    }

    fn refresh(&mut self, segment: &Segment<S>, play_time_nanos: u64, started: bool) {
        let target = (self.target_by_state)(&segment.target_state);
        if self.from_rest && !started {
            self.value = (self.target_by_state)(&segment.initial_state);
        } else if *self.animation.target_value() == target {
            return;
        }
        log::trace!("refreshing {} toward new target", self.label);
        let spec = (self.spec_by_segment)(segment);
        self.animation = TargetBasedAnimation::new(spec, self.value.clone(), target);
        self.offset_nanos = if started { play_time_nanos } else { 0 };
        self.finished = self.animation.is_finished_at(0);
    }

    fn snap(&mut self, state: &S) {
        let value = (self.target_by_state)(state);
        self.animation = TargetBasedAnimation::new(AnimationType::Snap, value.clone(), value.clone());
        self.value = value;
        self.offset_nanos = 0;
        self.finished = true;
        self.from_rest = true;
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Handle to a value animated by a [`Transition`].
pub struct TransitionValue<T> {
    read: Rc<dyn Fn() -> (T, T, bool)>,
}

impl<T> Clone for TransitionValue<T> {
    fn clone(&self) -> Self {
        Self {
            read: Rc::clone(&self.read),
        }
    }
}

impl<T> TransitionValue<T> {
    /// The value showing at the last frame.
    pub fn value(&self) -> T {
        (self.read)().0
    }

    pub fn target_value(&self) -> T {
        (self.read)().1
    }

    pub fn is_finished(&self) -> bool {
        (self.read)().2
    }
}

/// A child transition driven by its parent.
trait ChildTransition<S> {
    fn update_target(&self, parent_target: &S);
    fn on_frame(&self, frame_time_nanos: u64);
    fn snap(&self, parent_state: &S);
    fn is_running(&self) -> bool;
    fn key(&self) -> *const ();
}

struct MappedChild<S, C: TransitionState> {
    child: Transition<C>,
    map: Box<dyn Fn(&S) -> C>,
}

impl<S, C: TransitionState> ChildTransition<S> for MappedChild<S, C> {
    fn update_target(&self, parent_target: &S) {
        self.child.animate_to((self.map)(parent_target));
    }

    fn on_frame(&self, frame_time_nanos: u64) {
        self.child.on_frame(frame_time_nanos);
    }

    fn snap(&self, parent_state: &S) {
        self.child.snap_to((self.map)(parent_state));
    }

    fn is_running(&self) -> bool {
        self.child.is_running()
    }

    fn key(&self) -> *const () {
        Rc::as_ptr(&self.child.inner) as *const ()
    }
}

struct TransitionInner<S: TransitionState> {
    label: &'static str,
    current: S,
    target: S,
    start_time_nanos: Option<u64>,
    play_time_nanos: u64,
    animations: Vec<Rc<RefCell<dyn ChildAnimation<S>>>>,
    children: Vec<Rc<dyn ChildTransition<S>>>,
    clock: Option<FrameClock>,
    registration: Option<FrameCallbackRegistration>,
}

impl<S: TransitionState> TransitionInner<S> {
    fn segment(&self) -> Segment<S> {
        Segment {
            initial_state: self.current.clone(),
            target_state: self.target.clone(),
        }
    }
}

/// Animates a set of values between states.
///
/// Retargeting while running makes the previous target the new current
/// state and restarts every value from what it is showing, with the spec
/// of the new segment.
pub struct Transition<S: TransitionState> {
    inner: Rc<RefCell<TransitionInner<S>>>,
}

impl<S: TransitionState> Clone for Transition<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: TransitionState> Transition<S> {
    pub fn new(initial: S, label: &'static str) -> Self {
        Self {
            inner: Rc::new(RefCell::new(TransitionInner {
                label,
                current: initial.clone(),
                target: initial,
                start_time_nanos: None,
                play_time_nanos: 0,
                animations: Vec::new(),
                children: Vec::new(),
                clock: None,
                registration: None,
            })),
        }
    }

    /// Creates a transition that schedules its own frames on `clock`.
    pub fn with_clock(initial: S, label: &'static str, clock: FrameClock) -> Self {
        let transition = Self::new(initial, label);
        transition.inner.borrow_mut().clock = Some(clock);
        transition
    }

    pub fn label(&self) -> &'static str {
        self.inner.borrow().label
    }

    pub fn current_state(&self) -> S {
        self.inner.borrow().current.clone()
    }

    pub fn target_state(&self) -> S {
        self.inner.borrow().target.clone()
    }

    pub fn segment(&self) -> Segment<S> {
        self.inner.borrow().segment()
    }

    pub fn play_time_nanos(&self) -> u64 {
        self.inner.borrow().play_time_nanos
    }

    pub fn is_running(&self) -> bool {
        let (settled, animations, children) = {
            let inner = self.inner.borrow();
            (
                inner.current == inner.target,
                inner.animations.clone(),
                inner.children.clone(),
            )
        };
        !settled
            || animations.iter().any(|anim| !anim.borrow().is_finished())
            || children.iter().any(|child| child.is_running())
    }

    /// Moves toward `target`. A no-op when it already is the target.
    pub fn animate_to(&self, target: S) {
        let (segment, animations, children) = {
            let mut inner = self.inner.borrow_mut();
            if inner.target == target {
                return;
            }
            if inner.current != inner.target {
                log::debug!(
                    "{}: interrupted on the way to {:?}, now heading to {:?}",
                    inner.label,
                    inner.target,
                    target
                );
                inner.current = inner.target.clone();
            }
            inner.target = target.clone();
            inner.start_time_nanos = None;
            inner.play_time_nanos = 0;
            (
                inner.segment(),
                inner.animations.clone(),
                inner.children.clone(),
            )
        };
        for animation in animations {
            animation.borrow_mut().retarget(&segment);
        }
        for child in children {
            child.update_target(&target);
        }
        self.schedule_frame();
    }

    /// Jumps to `state` with every value at its target.
    pub fn snap_to(&self, state: S) {
        let (animations, children) = {
            let mut inner = self.inner.borrow_mut();
            if let Some(registration) = inner.registration.take() {
                registration.cancel();
            }
            inner.current = state.clone();
            inner.target = state.clone();
            inner.start_time_nanos = None;
            inner.play_time_nanos = 0;
            (inner.animations.clone(), inner.children.clone())
        };
        for animation in animations {
            animation.borrow_mut().snap(&state);
        }
        for child in children {
            child.snap(&state);
        }
    }

    /// Re-reads every value's target for the current segment.
    ///
    /// Values still resting on the initial state are moved to the fresh
    /// initial value; values mid-flight continue from where they are. At
    /// rest, values snap to the new target.
    pub fn refresh_targets(&self) {
        let (segment, animations, running, started, play_time) = {
            let inner = self.inner.borrow();
            (
                inner.segment(),
                inner.animations.clone(),
                inner.current != inner.target,
                inner.start_time_nanos.is_some(),
                inner.play_time_nanos,
            )
        };
        for animation in &animations {
            let mut animation = animation.borrow_mut();
            if running || !animation.is_finished() {
                animation.refresh(&segment, play_time, started);
            } else {
                animation.snap(&segment.target_state);
            }
        }
        self.schedule_frame();
    }

    /// Advances to `frame_time_nanos`. Returns true while still running.
    pub fn on_frame(&self, frame_time_nanos: u64) -> bool {
        if !self.is_running() {
            return false;
        }
        let (play_time, animations, children) = {
            let mut inner = self.inner.borrow_mut();
            let start = *inner.start_time_nanos.get_or_insert(frame_time_nanos);
            inner.play_time_nanos = frame_time_nanos.saturating_sub(start);
            (
                inner.play_time_nanos,
                inner.animations.clone(),
                inner.children.clone(),
            )
        };
        let mut finished = true;
        for animation in &animations {
            let mut animation = animation.borrow_mut();
            animation.on_play_time(play_time);
            finished &= animation.is_finished();
        }
        for child in &children {
            child.on_frame(frame_time_nanos);
            finished &= !child.is_running();
        }
        if finished {
            let mut inner = self.inner.borrow_mut();
            log::debug!("{}: converged on {:?}", inner.label, inner.target);
            inner.current = inner.target.clone();
            inner.start_time_nanos = None;
            inner.play_time_nanos = 0;
        }
        !finished
    }

    /// Adds a value that follows this transition.
    ///
    /// `target_by_state` gives the resting value for a state and
    /// `spec_by_segment` the animation used for a segment. A value added
    /// while the transition runs starts from its initial state's value.
    pub fn animate_value<T: Animated>(
        &self,
        label: &'static str,
        spec_by_segment: impl Fn(&Segment<S>) -> AnimationType + 'static,
        target_by_state: impl Fn(&S) -> T + 'static,
    ) -> TransitionValue<T> {
        let segment = self.segment();
        let initial = target_by_state(&segment.initial_state);
        let target = target_by_state(&segment.target_state);
        let spec = spec_by_segment(&segment);
        let animation = TargetBasedAnimation::new(spec, initial.clone(), target);
        let finished = animation.is_finished_at(0);
        let state = Rc::new(RefCell::new(ValueState {
            label,
            value: initial,
            target_by_state: Box::new(target_by_state),
            spec_by_segment: Box::new(spec_by_segment),
            animation,
            offset_nanos: self.play_time_nanos(),
            finished,
            from_rest: true,
        }));
        self.inner
            .borrow_mut()
            .animations
            .push(state.clone() as Rc<RefCell<dyn ChildAnimation<S>>>);
        self.schedule_frame();
        TransitionValue {
            read: Rc::new(move || {
                let state = state.borrow();
                (
                    state.value.clone(),
                    state.animation.target_value().clone(),
                    state.finished,
                )
            }),
        }
    }

    pub fn animate_float(
        &self,
        label: &'static str,
        spec_by_segment: impl Fn(&Segment<S>) -> AnimationType + 'static,
        target_by_state: impl Fn(&S) -> f32 + 'static,
    ) -> TransitionValue<f32> {
        self.animate_value(label, spec_by_segment, target_by_state)
    }

    pub fn animate_size(
        &self,
        label: &'static str,
        spec_by_segment: impl Fn(&Segment<S>) -> AnimationType + 'static,
        target_by_state: impl Fn(&S) -> Size + 'static,
    ) -> TransitionValue<Size> {
        self.animate_value(label, spec_by_segment, target_by_state)
    }

    pub fn animate_offset(
        &self,
        label: &'static str,
        spec_by_segment: impl Fn(&Segment<S>) -> AnimationType + 'static,
        target_by_state: impl Fn(&S) -> Point + 'static,
    ) -> TransitionValue<Point> {
        self.animate_value(label, spec_by_segment, target_by_state)
    }

    /// Creates a transition whose states follow this one through `map`.
    ///
    /// The child starts at `map(current)` and heads to `map(target)`. It
    /// only advances through this transition's frames, and this transition
    /// does not converge before the child has.
    pub fn create_child_transition<C: TransitionState>(
        &self,
        label: &'static str,
        map: impl Fn(&S) -> C + 'static,
    ) -> Transition<C> {
        let (current, target) = {
            let inner = self.inner.borrow();
            (inner.current.clone(), inner.target.clone())
        };
        let child = Transition::new(map(&current), label);
        child.animate_to(map(&target));
        let entry: Rc<dyn ChildTransition<S>> = Rc::new(MappedChild {
            child: child.clone(),
            map: Box::new(map),
        });
        self.inner.borrow_mut().children.push(entry);
        self.schedule_frame();
        child
    }

    /// Stops driving `child`. Returns false if it was not a child.
    pub fn remove_child<C: TransitionState>(&self, child: &Transition<C>) -> bool {
        let key = Rc::as_ptr(&child.inner) as *const ();
        let mut inner = self.inner.borrow_mut();
        let before = inner.children.len();
        inner.children.retain(|entry| entry.key() != key);
        inner.children.len() != before
    }

    fn schedule_frame(&self) {
        let clock = {
            let inner = self.inner.borrow();
            if inner.registration.is_some() {
                return;
            }
            match &inner.clock {
                Some(clock) => clock.clone(),
                None => return,
            }
        };
        if !self.is_running() {
            return;
        }
        let weak = Rc::downgrade(&self.inner);
        let registration = clock.with_frame_nanos(move |time| {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().registration = None;
                let transition = Transition { inner };
                if transition.on_frame(time) {
                    transition.schedule_frame();
                }
            }
        });
        self.inner.borrow_mut().registration = Some(registration);
    }
}

/// Spring used when a segment has no explicit spec.
pub fn default_spring() -> AnimationType {
    AnimationType::Spring(SpringSpec::new(1.0, 400.0))
}

#[cfg(test)]
#[path = "tests/transition_tests.rs"]
mod tests;
