//! Alignment utilities for positioning content

use crate::context::LayoutDirection;
use remeasure_geometry::{Point, Size};

/// Alignment across both axes used for positioning content within a box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Alignment {
    /// Horizontal alignment component.
    pub horizontal: HorizontalAlignment,
    /// Vertical alignment component.
    pub vertical: VerticalAlignment,
}

impl Alignment {
    /// Creates a new [`Alignment`] from explicit horizontal and vertical components.
    pub const fn new(horizontal: HorizontalAlignment, vertical: VerticalAlignment) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Align children to the top-start corner.
    pub const TOP_START: Self = Self::new(HorizontalAlignment::Start, VerticalAlignment::Top);

    /// Align children to the top-end corner.
    pub const TOP_END: Self = Self::new(HorizontalAlignment::End, VerticalAlignment::Top);

    /// Align children to the center of the parent.
    pub const CENTER: Self = Self::new(
        HorizontalAlignment::CenterHorizontally,
        VerticalAlignment::CenterVertically,
    );

    /// Align children to the bottom-start corner.
    pub const BOTTOM_START: Self = Self::new(HorizontalAlignment::Start, VerticalAlignment::Bottom);

    /// Align children to the bottom-end corner.
    pub const BOTTOM_END: Self = Self::new(HorizontalAlignment::End, VerticalAlignment::Bottom);

    /// Offset of `content` inside `space`.
    ///
    /// Unlike [`HorizontalAlignment::align`] the result is not clamped, so
    /// content larger than the space gets a negative offset. This is what a
    /// clipping container needs when its content is bigger than itself.
    pub fn align_offset(&self, content: Size, space: Size, direction: LayoutDirection) -> Point {
        let bias_x = self.horizontal.bias(direction);
        let bias_y = self.vertical.bias();
        let center_x = (space.width - content.width) / 2.0;
        let center_y = (space.height - content.height) / 2.0;
        Point::new(center_x * (1.0 + bias_x), center_y * (1.0 + bias_y))
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Self::TOP_START
    }
}

/// Alignment along the horizontal axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HorizontalAlignment {
    /// Align children to the leading edge.
    Start,
    /// Align children to the horizontal center.
    CenterHorizontally,
    /// Align children to the trailing edge.
    End,
}

impl HorizontalAlignment {
    /// Computes the horizontal offset for alignment.
    pub fn align(&self, available: f32, child: f32) -> f32 {
        match self {
            HorizontalAlignment::Start => 0.0,
            HorizontalAlignment::CenterHorizontally => ((available - child) / 2.0).max(0.0),
            HorizontalAlignment::End => (available - child).max(0.0),
        }
    }

    /// Position on the axis from -1 (left) to 1 (right), mirrored for RTL.
    pub fn bias(&self, direction: LayoutDirection) -> f32 {
        let ltr = match self {
            HorizontalAlignment::Start => -1.0,
            HorizontalAlignment::CenterHorizontally => 0.0,
            HorizontalAlignment::End => 1.0,
        };
        match direction {
            LayoutDirection::Ltr => ltr,
            LayoutDirection::Rtl => -ltr,
        }
    }
}

/// Alignment along the vertical axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerticalAlignment {
    /// Align children to the top edge.
    Top,
    /// Align children to the vertical center.
    CenterVertically,
    /// Align children to the bottom edge.
    Bottom,
}

impl VerticalAlignment {
    /// Computes the vertical offset for alignment.
    pub fn align(&self, available: f32, child: f32) -> f32 {
        match self {
            VerticalAlignment::Top => 0.0,
            VerticalAlignment::CenterVertically => ((available - child) / 2.0).max(0.0),
            VerticalAlignment::Bottom => (available - child).max(0.0),
        }
    }

    pub fn bias(&self) -> f32 {
        match self {
            VerticalAlignment::Top => -1.0,
            VerticalAlignment::CenterVertically => 0.0,
            VerticalAlignment::Bottom => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_offset_is_negative_for_oversized_content() {
        let offset = Alignment::BOTTOM_END.align_offset(
            Size::new(100.0, 100.0),
            Size::new(40.0, 60.0),
            LayoutDirection::Ltr,
        );
        assert_eq!(offset, Point::new(-60.0, -40.0));
    }

    #[test]
    fn start_mirrors_in_rtl() {
        let offset = Alignment::TOP_START.align_offset(
            Size::new(10.0, 10.0),
            Size::new(50.0, 10.0),
            LayoutDirection::Rtl,
        );
        assert_eq!(offset, Point::new(40.0, 0.0));
    }
}
