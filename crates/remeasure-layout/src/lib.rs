//! Incremental measure and layout for remeasure
//!
//! A [`MeasureLayoutScheduler`] owns an arena of [`LayoutNode`]s. Each node
//! carries a [`MeasurePolicy`] that measures it and places its children.
//! Invalidations mark nodes dirty; [`MeasureLayoutScheduler::measure_and_layout`]
//! revisits only what changed, shallowest first.

mod alignment;
mod arrangement;
mod axis;
mod consistency;
mod constraints;
mod context;
mod depth_sorted_set;
mod error;
pub mod input;
mod node;
mod policies;
mod policy;
mod positioned;
mod scheduler;
mod tree;

pub use alignment::{Alignment, HorizontalAlignment, VerticalAlignment};
pub use arrangement::LinearArrangement;
pub use axis::Axis;
pub use constraints::Constraints;
pub use context::{LayoutContext, LayoutDirection, SchedulerConfig};
pub use depth_sorted_set::DepthSortedSet;
pub use error::LayoutError;
pub use hit_test::{HitTestEntry, HitTestResult};
pub use node::{LayoutCoordinates, LayoutNode, LayoutState, OnPositionedCallback, UsageByParent};
pub use policies::{BoxPolicy, FixedSizePolicy, LinearPolicy};
pub use policy::{MeasurePolicy, MeasureScope, PlacementScope};
pub use positioned::OnPositionedDispatcher;
pub use scheduler::{MeasureLayoutScheduler, PostponedRequest};
pub use tree::LayoutTree;

pub use remeasure_core::NodeId;

pub mod prelude {
    pub use crate::{
        Alignment, Constraints, FixedSizePolicy, LayoutContext, LayoutDirection, MeasureLayoutScheduler,
        MeasurePolicy, MeasureScope, PlacementScope,
    };
    pub use remeasure_geometry::{Point, Rect, Size};
}
