//! Stock measure policies.

use crate::alignment::Alignment;
use crate::arrangement::LinearArrangement;
use crate::axis::Axis;
use crate::constraints::Constraints;
use crate::policy::{MeasurePolicy, MeasureScope, PlacementScope};
use remeasure_core::Owned;
use remeasure_geometry::{Point, Size};
use smallvec::SmallVec;

/// Leaf that asks for a preferred size, clamped to its constraints.
///
/// The preferred size lives in a shared cell; changing it through
/// [`FixedSizePolicy::handle`] and invalidating the node makes it report the
/// new size on the next pass.
#[derive(Clone, Debug)]
pub struct FixedSizePolicy {
    size: Owned<Size>,
}

impl FixedSizePolicy {
    pub fn new(size: Size) -> Self {
        Self {
            size: Owned::new(size),
        }
    }

    pub fn handle(&self) -> Owned<Size> {
        self.size.clone()
    }

    pub fn set_size(&self, size: Size) {
        self.size.replace(size);
    }
}

impl MeasurePolicy for FixedSizePolicy {
    fn measure(&self, _scope: &mut MeasureScope<'_>, constraints: Constraints) -> Size {
        constraints.constrain_size(self.size.get())
    }

    fn place(&self, _scope: &mut PlacementScope<'_>, _size: Size) {}
}

/// Stacks children on top of each other and sizes itself to the largest.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoxPolicy {
    pub alignment: Alignment,
}

impl BoxPolicy {
    pub fn new(alignment: Alignment) -> Self {
        Self { alignment }
    }
}

impl MeasurePolicy for BoxPolicy {
    fn measure(&self, scope: &mut MeasureScope<'_>, constraints: Constraints) -> Size {
        let child_constraints = constraints.loosen();
        let mut size = Size::new(constraints.min_width, constraints.min_height);
        for child in scope.children() {
            let child_size = scope.measure(child, child_constraints);
            size = size.max(child_size);
        }
        constraints.constrain_size(size)
    }

    fn place(&self, scope: &mut PlacementScope<'_>, size: Size) {
        let direction = scope.context().layout_direction;
        for child in scope.children() {
            let Some(child_size) = scope.measured_size(child) else {
                continue;
            };
            let offset = self.alignment.align_offset(child_size, size, direction);
            scope.place(child, offset);
        }
    }
}

/// Row or column: children one after another along `axis`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearPolicy {
    pub axis: Axis,
    pub arrangement: LinearArrangement,
    /// Bias across the main axis, in the vertical alignment's terms for rows
    /// and the horizontal alignment's terms for columns.
    pub cross_alignment: Alignment,
}

impl LinearPolicy {
    pub fn row() -> Self {
        Self {
            axis: Axis::Horizontal,
            arrangement: LinearArrangement::Start,
            cross_alignment: Alignment::TOP_START,
        }
    }

    pub fn column() -> Self {
        Self {
            axis: Axis::Vertical,
            ..Self::row()
        }
    }

    pub fn with_arrangement(mut self, arrangement: LinearArrangement) -> Self {
        self.arrangement = arrangement;
        self
    }

    pub fn with_cross_alignment(mut self, alignment: Alignment) -> Self {
        self.cross_alignment = alignment;
        self
    }

    fn max_main(&self, constraints: &Constraints) -> f32 {
        match self.axis {
            Axis::Horizontal => constraints.max_width,
            Axis::Vertical => constraints.max_height,
        }
    }

    fn cross_offset(&self, available: f32, child: f32, scope: &PlacementScope<'_>) -> f32 {
        let bias = match self.axis {
            Axis::Horizontal => self.cross_alignment.vertical.bias(),
            Axis::Vertical => self
                .cross_alignment
                .horizontal
                .bias(scope.context().layout_direction),
        };
        (available - child) / 2.0 * (1.0 + bias)
    }
}

impl MeasurePolicy for LinearPolicy {
    fn measure(&self, scope: &mut MeasureScope<'_>, constraints: Constraints) -> Size {
        let loose = constraints.loosen();
        let spacing = self.arrangement.fixed_spacing();
        let max_main = self.max_main(&constraints);
        let children = scope.children();

        let mut used_main = 0.0f32;
        let mut max_cross = 0.0f32;
        for (index, &child) in children.iter().enumerate() {
            if index > 0 {
                used_main += spacing;
            }
            let remaining = (max_main - used_main).max(0.0);
            let child_constraints = match self.axis {
                Axis::Horizontal => Constraints {
                    max_width: remaining,
                    ..loose
                },
                Axis::Vertical => Constraints {
                    max_height: remaining,
                    ..loose
                },
            };
            let child_size = scope.measure(child, child_constraints);
            used_main += self.axis.main(child_size);
            max_cross = max_cross.max(self.axis.cross(child_size));
        }
        constraints.constrain_size(self.axis.size(used_main, max_cross))
    }

    fn place(&self, scope: &mut PlacementScope<'_>, size: Size) {
        let children: SmallVec<[(_, Size); 8]> = scope
            .children()
            .into_iter()
            .filter_map(|child| scope.measured_size(child).map(|size| (child, size)))
            .collect();
        let sizes: SmallVec<[f32; 8]> = children
            .iter()
            .map(|(_, child_size)| self.axis.main(*child_size))
            .collect();
        let mut positions: SmallVec<[f32; 8]> = SmallVec::from_elem(0.0, sizes.len());
        let reverse = self.axis.is_horizontal() && scope.context().is_rtl();
        self.arrangement
            .arrange_directional(self.axis.main(size), &sizes, &mut positions, reverse);

        let cross_space = self.axis.cross(size);
        for ((child, child_size), main) in children.into_iter().zip(positions) {
            let cross = self.cross_offset(cross_space, self.axis.cross(child_size), scope);
            let offset = match self.axis {
                Axis::Horizontal => Point::new(main, cross),
                Axis::Vertical => Point::new(cross, main),
            };
            scope.place(child, offset);
        }
    }
}

impl Default for LinearPolicy {
    fn default() -> Self {
        Self::column()
    }
}

#[cfg(test)]
#[path = "tests/policies_tests.rs"]
mod tests;
