use remeasure_geometry::Size;

/// Represents the primary axis of a linear layout (row or column).
///
/// Used by [`LinearPolicy`](crate::LinearPolicy) to determine which direction
/// is the main axis (where children are laid out) and which is the cross axis
/// (where children are aligned).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal main axis (row).
    Horizontal,

    /// Vertical main axis (column).
    Vertical,
}

impl Axis {
    /// Returns the opposite axis.
    #[inline]
    pub fn cross_axis(self) -> Self {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }

    /// Returns true if this is the horizontal axis.
    #[inline]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Axis::Horizontal)
    }

    /// Extent of `size` along this axis.
    #[inline]
    pub fn main(self, size: Size) -> f32 {
        match self {
            Axis::Horizontal => size.width,
            Axis::Vertical => size.height,
        }
    }

    /// Extent of `size` across this axis.
    #[inline]
    pub fn cross(self, size: Size) -> f32 {
        self.cross_axis().main(size)
    }

    /// Builds a size from main/cross extents.
    #[inline]
    pub fn size(self, main: f32, cross: f32) -> Size {
        match self {
            Axis::Horizontal => Size::new(main, cross),
            Axis::Vertical => Size::new(cross, main),
        }
    }
}
