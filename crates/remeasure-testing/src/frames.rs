use remeasure_core::FrameClock;

/// Nanoseconds in one 60 Hz frame.
pub const FRAME_NANOS: u64 = 16_666_667;

/// Deterministic frame source for tests.
///
/// Time starts at zero and only moves when the test advances it.
pub struct FrameDriver {
    clock: FrameClock,
    now_nanos: u64,
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDriver {
    pub fn new() -> Self {
        Self {
            clock: FrameClock::new(),
            now_nanos: 0,
        }
    }

    pub fn clock(&self) -> FrameClock {
        self.clock.clone()
    }

    pub fn now_nanos(&self) -> u64 {
        self.now_nanos
    }

    pub fn now_millis(&self) -> u64 {
        self.now_nanos / 1_000_000
    }

    /// Moves time forward by `nanos` and drains one frame.
    pub fn advance_by(&mut self, nanos: u64) -> usize {
        self.now_nanos += nanos;
        self.clock.drain_frame_callbacks(self.now_nanos)
    }

    /// Advances one 60 Hz frame.
    pub fn advance_frame(&mut self) -> usize {
        self.advance_by(FRAME_NANOS)
    }

    pub fn advance_millis(&mut self, millis: u64) -> usize {
        self.advance_by(millis * 1_000_000)
    }

    /// Advances frame by frame, calling `on_frame` after each, until no
    /// callbacks are pending. Returns the number of frames run.
    ///
    /// # Panics
    ///
    /// Panics if the clock is still busy after `max_frames`.
    pub fn run_until_idle(&mut self, max_frames: usize, mut on_frame: impl FnMut(u64)) -> usize {
        let mut frames = 0;
        while self.clock.has_pending_callbacks() {
            assert!(
                frames < max_frames,
                "frame clock still busy after {max_frames} frames"
            );
            self.advance_frame();
            on_frame(self.now_nanos);
            frames += 1;
        }
        log::trace!("frame driver idle after {frames} frames");
        frames
    }
}
