//! Node identities, collections and the frame clock for remeasure
//!
//! Everything here is single-threaded: shared state lives in
//! `Rc<RefCell<_>>` and no type is `Send`.

pub mod collections;
mod frame_clock;
mod owned;
mod platform;

pub use frame_clock::{FrameCallbackId, FrameCallbackRegistration, FrameClock};
pub use owned::Owned;
pub use platform::FrameScheduler;

/// Stable handle of a node inside a layout arena.
pub type NodeId = usize;
