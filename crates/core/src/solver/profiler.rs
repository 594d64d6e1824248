//! Frame phase timing
//!
//! [`ProfilerScope`] times one phase of a frame (simulate, render) and emits
//! a `trace` event when it goes out of scope. [`FrameTimer`] keeps running
//! statistics over whole frames for the driver and the headless report.

use std::time::Instant;
use tracing::trace;

/// Times a named frame phase until dropped
pub struct ProfilerScope {
    start: Instant,
    phase: &'static str,
}

impl ProfilerScope {
    /// Start timing `phase`
    pub fn new(phase: &'static str) -> Self {
        Self {
            start: Instant::now(),
            phase,
        }
    }

    /// Milliseconds since the scope started
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for ProfilerScope {
    fn drop(&mut self) {
        trace!(phase = self.phase, elapsed_ms = self.elapsed_ms(), "phase done");
    }
}

/// Running statistics over rendered frames
#[derive(Debug, Default)]
pub struct FrameTimer {
    frames: u64,
    last_ms: f64,
    total_ms: f64,
    slowest_ms: f64,
}

impl FrameTimer {
    /// Timer with no frames recorded
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one frame's cost in milliseconds
    pub fn record(&mut self, frame_ms: f64) {
        self.frames += 1;
        self.last_ms = frame_ms;
        self.total_ms += frame_ms;
        self.slowest_ms = self.slowest_ms.max(frame_ms);
    }

    /// Cost of the most recent frame, 0 before the first
    pub fn last_frame_time_ms(&self) -> f64 {
        self.last_ms
    }

    /// Mean frame cost, 0 before the first frame
    pub fn mean_frame_time_ms(&self) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            self.total_ms / self.frames as f64
        }
    }

    /// Most expensive frame so far
    pub fn slowest_frame_time_ms(&self) -> f64 {
        self.slowest_ms
    }

    /// Frames recorded
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
