//! Frame-rate driven particle budget.
//!
//! The simulated population shrinks when rendering cannot keep up and grows
//! again when there is headroom. Decisions are made once per window so the
//! count does not oscillate frame to frame.

use std::time::Duration;

use tracing::info;

/// Elastic particle count controlled by observed frame rate.
///
/// Feed it one `(now, fps)` sample per frame. When the frame rate has stayed
/// below `low_fps` for a whole window the count halves; above `high_fps` it
/// doubles. The result is clamped to `[min, max]` and at most one change
/// happens per window.
#[derive(Debug, Clone)]
pub struct ParticleBudget {
    count: u32,
    min: u32,
    max: u32,
    low_fps: f32,
    high_fps: f32,
    window: Duration,
    window_start: Option<Duration>,
    samples: u32,
    all_low: bool,
    all_high: bool,
}

impl ParticleBudget {
    pub fn new(initial: u32, min: u32, max: u32) -> Self {
        Self {
            count: initial.clamp(min, max),
            min,
            max,
            low_fps: 30.0,
            high_fps: 50.0,
            window: Duration::from_secs(5),
            window_start: None,
            samples: 0,
            all_low: true,
            all_high: true,
        }
    }

    /// Frame-rate marks below/above which the count halves/doubles.
    pub fn with_thresholds(mut self, low_fps: f32, high_fps: f32) -> Self {
        self.low_fps = low_fps;
        self.high_fps = high_fps;
        self
    }

    /// Minimum time between changes.
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn bounds(&self) -> (u32, u32) {
        (self.min, self.max)
    }

    /// Record a frame-rate sample taken at `now`.
    ///
    /// Returns the new count when it changes. Samples of zero fps (no
    /// estimate yet) are ignored.
    pub fn observe(&mut self, now: Duration, fps: f32) -> Option<u32> {
        let start = *self.window_start.get_or_insert(now);
        if fps > 0.0 {
            self.samples += 1;
            if fps >= self.low_fps {
                self.all_low = false;
            }
            if fps <= self.high_fps {
                self.all_high = false;
            }
        }

        if now.saturating_sub(start) < self.window {
            return None;
        }

        let target = if self.samples == 0 {
            self.count
        } else if self.all_low {
            (self.count / 2).max(self.min)
        } else if self.all_high {
            self.count.saturating_mul(2).min(self.max)
        } else {
            self.count
        };

        self.window_start = Some(now);
        self.samples = 0;
        self.all_low = true;
        self.all_high = true;

        if target == self.count {
            return None;
        }
        if target < self.count {
            info!("frame rate is {:.1} fps, decreasing particle count to {}", fps, target);
        } else {
            info!("frame rate is {:.1} fps, increasing particle count to {}", fps, target);
        }
        self.count = target;
        Some(target)
    }
}
