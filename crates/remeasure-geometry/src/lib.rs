//! Pure math for sizes, offsets and units in remeasure
//!
//! This crate contains the geometry primitives and unit types shared by
//! the layout scheduler and the transition engine.

mod geometry;
mod unit;

pub use geometry::*;
pub use unit::*;

pub mod prelude {
    pub use crate::geometry::{Point, Rect, Size};
    pub use crate::unit::Dp;
}
