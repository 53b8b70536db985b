//! Host hooks for scheduling work.
//!
//! The layout scheduler and the frame clock never decide on their own when
//! a frame happens; they ask the host through [`FrameScheduler`].

/// Schedules work for the host's frame loop.
///
/// Implementations are responsible for eventually calling
/// `MeasureLayoutScheduler::measure_and_layout` and draining the frame clock.
pub trait FrameScheduler {
    /// Request that the host schedule a new frame.
    fn schedule_frame(&self);
}
