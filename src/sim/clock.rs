//! Frame pacing for the browser clock

use crate::consts::{FRAME_DT, MAX_FRAME_DT};

/// Turns raw timestamps into simulation steps at a fixed rate
///
/// Elapsed time accumulates until a full interval has passed. The leftover
/// beyond a whole interval is carried into the next frame so pacing never
/// drifts.
#[derive(Debug, Clone)]
pub struct FrameClock {
    interval: f64,
    last: Option<f64>,
    accumulator: f64,
    frames: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(FRAME_DT as f64)
    }
}

impl FrameClock {
    pub fn new(interval: f64) -> Self {
        Self {
            interval: interval.max(1e-4),
            last: None,
            accumulator: 0.0,
            frames: 0,
        }
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Feed a timestamp in seconds; returns the step to simulate, if due
    pub fn advance(&mut self, now: f64) -> Option<f32> {
        let last = self.last.replace(now)?;
        // Clock went backwards (tab restore, timer reset)
        let elapsed = (now - last).max(0.0);
        self.accumulator += elapsed;
        if self.accumulator < self.interval {
            return None;
        }

        let step = self.accumulator;
        self.accumulator %= self.interval;
        self.frames += 1;
        Some((step - self.accumulator).min(MAX_FRAME_DT as f64) as f32)
    }

    /// Forget the previous timestamp (after a pause or hidden tab)
    pub fn reset(&mut self) {
        self.last = None;
        self.accumulator = 0.0;
    }
}
