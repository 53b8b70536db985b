//! Explicit configuration threaded through every measure and placement call.

use remeasure_geometry::Dp;

/// Reading direction used to resolve start/end alignments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LayoutDirection {
    #[default]
    Ltr,
    Rtl,
}

/// Density and direction for a layout pass.
///
/// There is no ambient lookup: the scheduler owns one context and hands
/// it to each [`MeasureScope`](crate::MeasureScope) and
/// [`PlacementScope`](crate::PlacementScope).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutContext {
    pub density: f32,
    pub layout_direction: LayoutDirection,
}

impl LayoutContext {
    pub fn new(density: f32, layout_direction: LayoutDirection) -> Self {
        Self {
            density,
            layout_direction,
        }
    }

    pub fn dp_to_px(&self, dp: Dp) -> f32 {
        dp.to_px(self.density)
    }

    pub fn is_rtl(&self) -> bool {
        self.layout_direction == LayoutDirection::Rtl
    }
}

impl Default for LayoutContext {
    fn default() -> Self {
        Self::new(1.0, LayoutDirection::Ltr)
    }
}

/// Tunables for [`MeasureLayoutScheduler`](crate::MeasureLayoutScheduler).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Run the tree consistency checker after every processed node.
    pub check_consistency: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            check_consistency: cfg!(debug_assertions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dp_converts_with_the_context_density() {
        let context = LayoutContext::new(2.5, LayoutDirection::Rtl);
        assert_eq!(context.dp_to_px(Dp(8.0)), 20.0);
        assert!(context.is_rtl());
        assert!(!LayoutContext::default().is_rtl());
    }
}
