use crate::platform::FrameScheduler;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Identifier of a pending frame callback.
pub type FrameCallbackId = u64;

type FrameCallback = Box<dyn FnOnce(u64)>;

struct FrameClockInner {
    next_id: FrameCallbackId,
    callbacks: Vec<(FrameCallbackId, FrameCallback)>,
    last_frame_nanos: Option<u64>,
    scheduler: Option<Rc<dyn FrameScheduler>>,
}

/// Frame clock fed by the host.
///
/// Callbacks registered through [`FrameClock::with_frame_nanos`] run once,
/// on the next call to [`FrameClock::drain_frame_callbacks`]. Every callback
/// drained in the same frame observes the same timestamp. Callbacks
/// registered while a frame is being drained run on the following frame.
#[derive(Clone)]
pub struct FrameClock {
    inner: Rc<RefCell<FrameClockInner>>,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(FrameClockInner {
                next_id: 1,
                callbacks: Vec::new(),
                last_frame_nanos: None,
                scheduler: None,
            })),
        }
    }

    /// Creates a clock that asks `scheduler` for a frame whenever the first
    /// callback of a frame is registered.
    pub fn with_scheduler(scheduler: Rc<dyn FrameScheduler>) -> Self {
        let clock = Self::new();
        clock.inner.borrow_mut().scheduler = Some(scheduler);
        clock
    }

    pub fn with_frame_nanos(
        &self,
        callback: impl FnOnce(u64) + 'static,
    ) -> FrameCallbackRegistration {
        let (id, scheduler) = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            let first = inner.callbacks.is_empty();
            inner.callbacks.push((id, Box::new(callback)));
            let scheduler = if first { inner.scheduler.clone() } else { None };
            (id, scheduler)
        };
        if let Some(scheduler) = scheduler {
            scheduler.schedule_frame();
        }
        FrameCallbackRegistration {
            clock: Rc::downgrade(&self.inner),
            id: Some(id),
        }
    }

    pub fn with_frame_millis(
        &self,
        callback: impl FnOnce(u64) + 'static,
    ) -> FrameCallbackRegistration {
        self.with_frame_nanos(move |nanos| {
            let millis = nanos / 1_000_000;
            callback(millis);
        })
    }

    /// Runs every callback registered before this call with `frame_time_nanos`.
    ///
    /// Returns the number of callbacks that ran.
    pub fn drain_frame_callbacks(&self, frame_time_nanos: u64) -> usize {
        let callbacks = {
            let mut inner = self.inner.borrow_mut();
            if let Some(last) = inner.last_frame_nanos {
                if frame_time_nanos < last {
                    log::warn!(
                        "frame time went backwards ({} < {}), clamping",
                        frame_time_nanos,
                        last
                    );
                }
            }
            let time = inner
                .last_frame_nanos
                .map_or(frame_time_nanos, |last| frame_time_nanos.max(last));
            inner.last_frame_nanos = Some(time);
            std::mem::take(&mut inner.callbacks)
        };
        let time = self.last_frame_nanos().unwrap_or(frame_time_nanos);
        let count = callbacks.len();
        for (_, callback) in callbacks {
            callback(time);
        }
        count
    }

    /// Returns true if a callback is waiting for the next frame.
    pub fn has_pending_callbacks(&self) -> bool {
        !self.inner.borrow().callbacks.is_empty()
    }

    /// Timestamp of the most recently drained frame.
    pub fn last_frame_nanos(&self) -> Option<u64> {
        self.inner.borrow().last_frame_nanos
    }

    fn cancel(inner: &Rc<RefCell<FrameClockInner>>, id: FrameCallbackId) {
        if let Ok(mut inner) = inner.try_borrow_mut() {
            inner.callbacks.retain(|(pending, _)| *pending != id);
        }
    }
}

/// Handle to a pending frame callback; dropping it cancels the callback.
pub struct FrameCallbackRegistration {
    clock: Weak<RefCell<FrameClockInner>>,
    id: Option<FrameCallbackId>,
}

impl FrameCallbackRegistration {
    pub fn id(&self) -> Option<FrameCallbackId> {
        self.id
    }

    pub fn cancel(mut self) {
        self.cancel_inner();
    }

    fn cancel_inner(&mut self) {
        if let Some(id) = self.id.take() {
            if let Some(inner) = self.clock.upgrade() {
                FrameClock::cancel(&inner, id);
            }
        }
    }
}

impl Drop for FrameCallbackRegistration {
    fn drop(&mut self) {
        self.cancel_inner();
    }
}
