//! Tolerance-based assertions for animated and laid out values.

use remeasure_geometry::{Point, Size};

/// Asserts `|actual - expected| <= tolerance`, prefixing failures with
/// `msg`.
pub fn assert_approx_eq(actual: f32, expected: f32, tolerance: f32, msg: &str) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "{msg}: expected {expected} (±{tolerance}), got {actual} (diff: {diff})"
    );
}

fn assert_components_approx_eq(
    actual: [f32; 2],
    expected: [f32; 2],
    names: [&str; 2],
    tolerance: f32,
    msg: &str,
) {
    for ((actual, expected), name) in actual.into_iter().zip(expected).zip(names) {
        assert_approx_eq(actual, expected, tolerance, &format!("{msg} ({name})"));
    }
}

pub fn assert_size_approx_eq(actual: Size, expected: Size, tolerance: f32, msg: &str) {
    assert_components_approx_eq(
        [actual.width, actual.height],
        [expected.width, expected.height],
        ["width", "height"],
        tolerance,
        msg,
    );
}

pub fn assert_point_approx_eq(actual: Point, expected: Point, tolerance: f32, msg: &str) {
    assert_components_approx_eq(
        [actual.x, actual.y],
        [expected.x, expected.y],
        ["x", "y"],
        tolerance,
        msg,
    );
}
