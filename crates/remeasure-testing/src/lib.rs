//! Testing utilities and harness for remeasure

pub mod assertions;
mod frames;
mod harness;
mod recording;

pub use assertions::{assert_approx_eq, assert_point_approx_eq, assert_size_approx_eq};
pub use frames::{FrameDriver, FRAME_NANOS};
pub use harness::LayoutHarness;
pub use recording::{PassEvent, PassLog, RecordingPolicy};

pub mod prelude {
    pub use crate::assertions::*;
    pub use crate::{FrameDriver, LayoutHarness, PassEvent, PassLog, RecordingPolicy};
}
