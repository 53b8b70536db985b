use super::*;

const FRAME: u64 = 16_666_667;

#[test]
fn easing_linear_is_identity() {
    assert_eq!(Easing::Linear.transform(0.0), 0.0);
    assert_eq!(Easing::Linear.transform(0.5), 0.5);
    assert_eq!(Easing::Linear.transform(1.0), 1.0);
}

#[test]
fn easing_bounds_are_correct() {
    let easings = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::FastOutSlowIn,
        Easing::LinearOutSlowIn,
        Easing::FastOutLinearIn,
    ];

    for easing in easings {
        assert!(easing.transform(0.0).abs() < 0.01, "start of {:?}", easing);
        assert!((easing.transform(1.0) - 1.0).abs() < 0.01, "end of {:?}", easing);
    }
}

#[test]
fn ease_in_starts_slow() {
    assert!(Easing::EaseIn.transform(0.25) < 0.25);
    assert!(Easing::EaseOut.transform(0.25) > 0.25);
}

#[test]
fn animation_spec_default_has_reasonable_values() {
    let spec = AnimationSpec::default();
    assert_eq!(spec.duration_millis, 300);
    assert_eq!(spec.easing, Easing::FastOutSlowIn);
    assert_eq!(spec.delay_millis, 0);
}

#[test]
fn spring_spec_default_is_critically_damped() {
    let spec = SpringSpec::default();
    assert_eq!(spec.damping_ratio, 1.0);
    assert!(SpringSpec::stiff().stiffness > spec.stiffness);
    assert!(SpringSpec::bouncy().damping_ratio < 1.0);
}

#[test]
fn tween_respects_delay_and_duration() {
    let spec = AnimationSpec::linear(100).with_delay(50);
    let animation = TargetBasedAnimation::new(spec.into(), 0.0f32, 10.0);

    assert_eq!(animation.duration_nanos(), 150 * 1_000_000);
    assert_eq!(animation.value_at(40 * 1_000_000), 0.0);
    assert!((animation.value_at(100 * 1_000_000) - 5.0).abs() < 1e-4);
    assert!(!animation.is_finished_at(149 * 1_000_000));
    assert_eq!(animation.value_at(150 * 1_000_000), 10.0);
}

#[test]
fn equal_endpoints_finish_immediately() {
    let animation = TargetBasedAnimation::new(AnimationType::default(), 3.0f32, 3.0);
    assert_eq!(animation.duration_nanos(), 0);
    assert!(animation.is_finished_at(0));
}

#[test]
fn snap_has_no_duration() {
    let animation = TargetBasedAnimation::new(AnimationType::Snap, Size::ZERO, Size::new(4.0, 4.0));
    assert!(animation.is_finished_at(0));
    assert_eq!(animation.value_at(0), Size::new(4.0, 4.0));
}

#[test]
fn springs_settle_on_their_target() {
    for spring in [
        SpringSpec::default(),
        SpringSpec::bouncy(),
        SpringSpec::new(2.0, 400.0),
    ] {
        let animation = TargetBasedAnimation::new(spring.into(), 0.0f32, 100.0);
        let duration = animation.duration_nanos();
        assert!(duration > 0, "{:?}", spring);
        assert!(duration < MAX_SPRING_DURATION_NANOS, "{:?}", spring);
        assert_eq!(animation.value_at(0), 0.0);
        let near_end = animation.value_at(duration.saturating_sub(1_000_000));
        assert!((near_end - 100.0).abs() < 1.0, "{:?}: {near_end}", spring);
        assert_eq!(animation.value_at(duration), 100.0);
    }
}

#[test]
fn bouncy_spring_overshoots() {
    let animation = TargetBasedAnimation::new(SpringSpec::bouncy().into(), 0.0f32, 1.0);
    let overshoot = (0..animation.duration_nanos() / 1_000_000)
        .map(|ms| animation.value_at(ms * 1_000_000))
        .fold(f32::MIN, f32::max);
    assert!(overshoot > 1.0);
}

#[test]
fn point_and_size_interpolate_per_component() {
    let point = Point::new(0.0, 10.0).lerp(&Point::new(10.0, 20.0), 0.5);
    assert_eq!(point, Point::new(5.0, 15.0));
    let size = Size::new(0.0, 0.0).lerp(&Size::new(8.0, 4.0), 0.25);
    assert_eq!(size, Size::new(2.0, 1.0));
}

#[test]
fn animatable_retargets_from_current_value() {
    let animatable = Animatable::new(0.0f32);
    animatable.animate_to(100.0, AnimationSpec::linear(100).into());
    assert!(animatable.on_frame(0));
    assert!(animatable.on_frame(50 * 1_000_000));
    let midway = animatable.value();
    assert!((midway - 50.0).abs() < 1e-3);

    animatable.animate_to(0.0, AnimationSpec::linear(100).into());
    assert_eq!(animatable.value(), midway);
    assert!(animatable.on_frame(60 * 1_000_000));
    assert_eq!(animatable.value(), midway);
    assert!(!animatable.on_frame(160 * 1_000_000));
    assert_eq!(animatable.value(), 0.0);
    assert!(!animatable.is_running());
}

#[test]
fn animatable_snap_cancels_animation() {
    let animatable = Animatable::new(0.0f32);
    animatable.animate_to(1.0, AnimationType::default());
    animatable.snap_to(0.5);
    assert!(!animatable.is_running());
    assert_eq!(animatable.value(), 0.5);
    assert_eq!(animatable.target(), 0.5);
}

#[test]
fn animatable_runs_on_frame_clock() {
    let clock = FrameClock::new();
    let animatable = Animatable::with_clock(0.0f32, clock.clone());
    animatable.animate_to(1.0, AnimationSpec::linear(100).into());
    assert!(clock.has_pending_callbacks());

    let mut time = 0;
    let mut saw_midpoint = false;
    for _ in 0..32 {
        if !clock.has_pending_callbacks() {
            break;
        }
        time += FRAME;
        clock.drain_frame_callbacks(time);
        let value = animatable.value();
        if value > 0.0 && value < 1.0 {
            saw_midpoint = true;
        }
    }

    assert!(saw_midpoint, "animation should report intermediate values");
    assert_eq!(animatable.value(), 1.0);
    assert!(!clock.has_pending_callbacks());
}
