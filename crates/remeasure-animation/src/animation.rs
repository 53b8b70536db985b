//! Animation primitives: easing curves, tween and spring specs, and the
//! values they drive.

use remeasure_core::{FrameCallbackRegistration, FrameClock};
use remeasure_geometry::{Point, Size};
use std::cell::RefCell;
use std::rc::Rc;

const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Upper bound for a spring's settling time.
const MAX_SPRING_DURATION_NANOS: u64 = 60 * 1_000 * NANOS_PER_MILLI;

/// Types that can be linearly interpolated.
pub trait Lerp {
    fn lerp(&self, target: &Self, fraction: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(&self, target: &Self, fraction: f32) -> Self {
        self + (target - self) * fraction
    }
}

impl Lerp for f64 {
    fn lerp(&self, target: &Self, fraction: f32) -> Self {
        self + (target - self) * fraction as f64
    }
}

impl Lerp for Point {
    fn lerp(&self, target: &Self, fraction: f32) -> Self {
        Point::new(self.x.lerp(&target.x, fraction), self.y.lerp(&target.y, fraction))
    }
}

impl Lerp for Size {
    fn lerp(&self, target: &Self, fraction: f32) -> Self {
        Size::new(
            self.width.lerp(&target.width, fraction),
            self.height.lerp(&target.height, fraction),
        )
    }
}

/// Values an animation can drive.
pub trait Animated: Lerp + Clone + PartialEq + 'static {}

impl<T: Lerp + Clone + PartialEq + 'static> Animated for T {}

/// Easing curves applied to the linear progress of a tween.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    /// Material standard curve.
    FastOutSlowIn,
    LinearOutSlowIn,
    FastOutLinearIn,
}

impl Easing {
    /// Maps a linear fraction in `[0, 1]` onto the curve.
    pub fn transform(&self, fraction: f32) -> f32 {
        match self {
            Easing::Linear => fraction,
            Easing::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, fraction),
            Easing::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, fraction),
            Easing::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, fraction),
            Easing::FastOutSlowIn => cubic_bezier(0.4, 0.0, 0.2, 1.0, fraction),
            Easing::LinearOutSlowIn => cubic_bezier(0.0, 0.0, 0.2, 1.0, fraction),
            Easing::FastOutLinearIn => cubic_bezier(0.4, 0.0, 1.0, 1.0, fraction),
        }
    }
}

fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, fraction: f32) -> f32 {
    if fraction <= 0.0 {
        return 0.0;
    }
    if fraction >= 1.0 {
        return 1.0;
    }

    let cx = 3.0 * x1;
    let bx = 3.0 * (x2 - x1) - cx;
    let ax = 1.0 - cx - bx;

    let cy = 3.0 * y1;
    let by = 3.0 * (y2 - y1) - cy;
    let ay = 1.0 - cy - by;

    fn sample_curve(a: f32, b: f32, c: f32, t: f32) -> f32 {
        ((a * t + b) * t + c) * t
    }

    fn sample_derivative(a: f32, b: f32, c: f32, t: f32) -> f32 {
        (3.0 * a * t + 2.0 * b) * t + c
    }

    // Newton-Raphson for the parameter whose x matches `fraction`.
    let mut t = fraction;
    let mut solved = false;
    for _ in 0..8 {
        let x = sample_curve(ax, bx, cx, t) - fraction;
        if x.abs() < 1e-6 {
            solved = true;
            break;
        }
        let dx = sample_derivative(ax, bx, cx, t);
        if dx.abs() < 1e-6 {
            break;
        }
        t = (t - x / dx).clamp(0.0, 1.0);
    }

    if !solved {
        let mut low = 0.0;
        let mut high = 1.0;
        t = fraction;
        for _ in 0..16 {
            let delta = sample_curve(ax, bx, cx, t) - fraction;
            if delta.abs() < 1e-6 {
                break;
            }
            if delta > 0.0 {
                high = t;
            } else {
                low = t;
            }
            t = 0.5 * (low + high);
        }
    }

    sample_curve(ay, by, cy, t)
}

/// Duration based animation with easing and an optional start delay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationSpec {
    pub duration_millis: u64,
    pub easing: Easing,
    pub delay_millis: u64,
}

impl AnimationSpec {
    pub fn tween(duration_millis: u64, easing: Easing) -> Self {
        Self {
            duration_millis,
            easing,
            delay_millis: 0,
        }
    }

    pub fn linear(duration_millis: u64) -> Self {
        Self::tween(duration_millis, Easing::Linear)
    }

    pub fn with_delay(mut self, delay_millis: u64) -> Self {
        self.delay_millis = delay_millis;
        self
    }

    fn total_nanos(&self) -> u64 {
        (self.delay_millis + self.duration_millis) * NANOS_PER_MILLI
    }

    fn fraction_at(&self, play_time_nanos: u64) -> f32 {
        let delay = self.delay_millis * NANOS_PER_MILLI;
        if play_time_nanos < delay {
            return 0.0;
        }
        let duration = self.duration_millis * NANOS_PER_MILLI;
        if duration == 0 {
            return 1.0;
        }
        let linear = ((play_time_nanos - delay) as f64 / duration as f64).clamp(0.0, 1.0) as f32;
        self.easing.transform(linear)
    }
}

impl Default for AnimationSpec {
    fn default() -> Self {
        Self::tween(300, Easing::FastOutSlowIn)
    }
}

/// Damped spring acting on the normalized progress between start and
/// target. Velocity is expressed in progress units per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringSpec {
    /// 1.0 is critically damped, below bounces, above creeps.
    pub damping_ratio: f32,
    pub stiffness: f32,
    pub velocity_threshold: f32,
    pub position_threshold: f32,
}

impl SpringSpec {
    pub fn new(damping_ratio: f32, stiffness: f32) -> Self {
        Self {
            damping_ratio,
            stiffness,
            ..Self::default()
        }
    }

    pub fn bouncy() -> Self {
        Self::new(0.5, 1500.0)
    }

    pub fn stiff() -> Self {
        Self::new(1.0, 3000.0)
    }

    /// Remaining displacement (1 at start, 0 at rest) and its velocity
    /// after `seconds`.
    fn displacement_at(&self, seconds: f64) -> (f64, f64) {
        let omega = (self.stiffness.max(f32::EPSILON) as f64).sqrt();
        let zeta = self.damping_ratio.max(0.0) as f64;
        let t = seconds;
        if (zeta - 1.0).abs() < 1e-6 {
            let decay = (-omega * t).exp();
            let x = decay * (1.0 + omega * t);
            let v = -omega * omega * t * decay;
            (x, v)
        } else if zeta < 1.0 {
            let damped = omega * (1.0 - zeta * zeta).sqrt();
            let decay = (-zeta * omega * t).exp();
            let ratio = zeta * omega / damped;
            let (sin, cos) = (damped * t).sin_cos();
            let x = decay * (cos + ratio * sin);
            let v = -decay * sin * (damped + ratio * zeta * omega);
            (x, v)
        } else {
            let root = (zeta * zeta - 1.0).sqrt();
            let r1 = -omega * (zeta - root);
            let r2 = -omega * (zeta + root);
            let (e1, e2) = ((r1 * t).exp(), (r2 * t).exp());
            let x = (r2 * e1 - r1 * e2) / (r2 - r1);
            let v = r1 * r2 * (e1 - e2) / (r2 - r1);
            (x, v)
        }
    }

    fn is_at_rest(&self, seconds: f64) -> bool {
        let (x, v) = self.displacement_at(seconds);
        x.abs() < self.position_threshold as f64 && v.abs() < self.velocity_threshold as f64
    }

    /// Time until the spring rests, searched in one millisecond steps.
    fn settle_nanos(&self) -> u64 {
        let mut nanos = 0;
        while nanos < MAX_SPRING_DURATION_NANOS {
            if self.is_at_rest(nanos as f64 / NANOS_PER_SECOND) {
                return nanos;
            }
            nanos += NANOS_PER_MILLI;
        }
        MAX_SPRING_DURATION_NANOS
    }

    fn fraction_at(&self, play_time_nanos: u64) -> f32 {
        let (x, _) = self.displacement_at(play_time_nanos as f64 / NANOS_PER_SECOND);
        (1.0 - x) as f32
    }
}

impl Default for SpringSpec {
    fn default() -> Self {
        Self {
            damping_ratio: 1.0,
            stiffness: 1500.0,
            velocity_threshold: 0.01,
            position_threshold: 0.001,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationType {
    Tween(AnimationSpec),
    Spring(SpringSpec),
    /// Jumps to the target on the first frame.
    Snap,
}

impl Default for AnimationType {
    fn default() -> Self {
        AnimationType::Tween(AnimationSpec::default())
    }
}

impl From<AnimationSpec> for AnimationType {
    fn from(spec: AnimationSpec) -> Self {
        AnimationType::Tween(spec)
    }
}

impl From<SpringSpec> for AnimationType {
    fn from(spec: SpringSpec) -> Self {
        AnimationType::Spring(spec)
    }
}

/// Animation between two fixed values, evaluated by play time.
///
/// Holds no clock; the same play time always yields the same value.
#[derive(Debug, Clone)]
pub struct TargetBasedAnimation<T> {
    spec: AnimationType,
    initial: T,
    target: T,
    duration_nanos: u64,
}

impl<T: Animated> TargetBasedAnimation<T> {
    pub fn new(spec: AnimationType, initial: T, target: T) -> Self {
        let duration_nanos = if initial == target {
            0
        } else {
            match spec {
                AnimationType::Tween(tween) => tween.total_nanos(),
                AnimationType::Spring(spring) => spring.settle_nanos(),
                AnimationType::Snap => 0,
            }
        };
        Self {
            spec,
            initial,
            target,
            duration_nanos,
        }
    }

    pub fn spec(&self) -> AnimationType {
        self.spec
    }

    pub fn initial_value(&self) -> &T {
        &self.initial
    }

    pub fn target_value(&self) -> &T {
        &self.target
    }

    pub fn duration_nanos(&self) -> u64 {
        self.duration_nanos
    }

    pub fn is_finished_at(&self, play_time_nanos: u64) -> bool {
        play_time_nanos >= self.duration_nanos
    }

    pub fn value_at(&self, play_time_nanos: u64) -> T {
        if self.is_finished_at(play_time_nanos) {
            return self.target.clone();
        }
        let fraction = match self.spec {
            AnimationType::Tween(tween) => tween.fraction_at(play_time_nanos),
            AnimationType::Spring(spring) => spring.fraction_at(play_time_nanos),
            AnimationType::Snap => 1.0,
        };
        self.initial.lerp(&self.target, fraction)
    }
}

/// A single animated value.
///
/// `animate_to` starts from whatever value is showing, so retargeting an
/// animation mid-flight never jumps. Frames come either from an attached
/// [`FrameClock`] or from explicit [`Animatable::on_frame`] calls.
pub struct Animatable<T: Animated> {
    inner: Rc<RefCell<AnimatableInner<T>>>,
}

struct AnimatableInner<T: Animated> {
    value: T,
    animation: Option<TargetBasedAnimation<T>>,
    start_time_nanos: Option<u64>,
    clock: Option<FrameClock>,
    registration: Option<FrameCallbackRegistration>,
}

impl<T: Animated> Clone for Animatable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Animated> Animatable<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(AnimatableInner {
                value: initial,
                animation: None,
                start_time_nanos: None,
                clock: None,
                registration: None,
            })),
        }
    }

    /// Creates an animatable that schedules its own frames on `clock`.
    pub fn with_clock(initial: T, clock: FrameClock) -> Self {
        let animatable = Self::new(initial);
        animatable.inner.borrow_mut().clock = Some(clock);
        animatable
    }

    pub fn value(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Target of the running animation, or the resting value.
    pub fn target(&self) -> T {
        let inner = self.inner.borrow();
        match &inner.animation {
            Some(animation) => animation.target_value().clone(),
            None => inner.value.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.borrow().animation.is_some()
    }

    pub fn animate_to(&self, target: T, spec: AnimationType) {
        {
            let mut inner = self.inner.borrow_mut();
            if let Some(registration) = inner.registration.take() {
                registration.cancel();
            }
            let unchanged = inner.animation.is_none() && inner.value == target;
            inner.start_time_nanos = None;
            inner.animation = if unchanged {
                None
            } else {
                Some(TargetBasedAnimation::new(spec, inner.value.clone(), target))
            };
        }
        Self::schedule_frame(&self.inner);
    }

    pub fn snap_to(&self, target: T) {
        let mut inner = self.inner.borrow_mut();
        if let Some(registration) = inner.registration.take() {
            registration.cancel();
        }
        inner.value = target;
        inner.animation = None;
        inner.start_time_nanos = None;
    }

    /// Advances to `frame_time_nanos`. Returns true while still running.
    ///
    /// The first frame after `animate_to` fixes the start time.
    pub fn on_frame(&self, frame_time_nanos: u64) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(animation) = inner.animation.clone() else {
            return false;
        };
        let start = *inner.start_time_nanos.get_or_insert(frame_time_nanos);
        let play_time = frame_time_nanos.saturating_sub(start);
        inner.value = animation.value_at(play_time);
        if animation.is_finished_at(play_time) {
            inner.animation = None;
            inner.start_time_nanos = None;
            false
        } else {
            true
        }
    }

    fn schedule_frame(this: &Rc<RefCell<AnimatableInner<T>>>) {
        let clock = {
            let inner = this.borrow();
            if inner.registration.is_some() || inner.animation.is_none() {
                return;
            }
            match &inner.clock {
                Some(clock) => clock.clone(),
                None => return,
            }
        };
        let weak = Rc::downgrade(this);
        let registration = clock.with_frame_nanos(move |time| {
            if let Some(strong) = weak.upgrade() {
                strong.borrow_mut().registration = None;
                let running = Animatable { inner: Rc::clone(&strong) }.on_frame(time);
                if running {
                    Self::schedule_frame(&strong);
                }
            }
        });
        this.borrow_mut().registration = Some(registration);
    }
}

#[cfg(test)]
#[path = "tests/animation_tests.rs"]
mod tests;
