//! Frame timing for the animation loop.
//!
//! [`FrameClock`] is the single source of truth for animation time: the
//! per-frame step fed to advection and the forecast player, plus a frame
//! rate estimate fed to the particle budget.
//!
//! # Example
//!
//! ```ignore
//! use windvis::time::FrameClock;
//!
//! let mut clock = FrameClock::new();
//!
//! // Once per redraw:
//! let dt_ms = clock.tick();
//! particles.advect(&field, dt_ms, &mut rng)?;
//! println!("{:.1} fps", clock.fps());
//! ```

use std::time::{Duration, Instant};

/// Longest step a single frame may take, in milliseconds. A window that was
/// dragged or minimized should not fling particles across the globe.
pub const MAX_FRAME_DELTA_MS: f32 = 250.0;

/// Frame clock with pause support.
///
/// Pausing freezes the animation step (`delta_ms()` is 0) while frames keep
/// rendering, so the frame counter and fps estimate keep running.
#[derive(Debug)]
pub struct FrameClock {
    /// When the clock was created.
    start: Instant,
    /// When the last frame occurred.
    last_frame: Instant,
    /// Un-paused animation time in milliseconds.
    animation_ms: f64,
    /// Animation step of the last frame in milliseconds.
    delta_ms: f32,
    /// Total frames since start.
    frame_count: u64,
    /// Frame rate estimate, refreshed every `fps_update_interval`.
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    paused: bool,
    /// Fixed step for deterministic runs.
    fixed_delta_ms: Option<f32>,
    max_delta_ms: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            animation_ms: 0.0,
            delta_ms: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            paused: false,
            fixed_delta_ms: None,
            max_delta_ms: MAX_FRAME_DELTA_MS,
        }
    }

    /// Advance one frame. Returns the animation step in milliseconds.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    /// Advance one frame as if it happened at `now`.
    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let raw_ms = now.saturating_duration_since(self.last_frame).as_secs_f32() * 1000.0;
        self.last_frame = now;
        self.frame_count += 1;

        self.delta_ms = if self.paused {
            0.0
        } else {
            self.fixed_delta_ms.unwrap_or(raw_ms).min(self.max_delta_ms)
        };
        self.animation_ms += self.delta_ms as f64;

        let fps_elapsed = now.saturating_duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.delta_ms
    }

    /// Animation step of the last frame in milliseconds.
    #[inline]
    pub fn delta_ms(&self) -> f32 {
        self.delta_ms
    }

    /// Total un-paused animation time in milliseconds.
    #[inline]
    pub fn animation_ms(&self) -> f64 {
        self.animation_ms
    }

    /// Wall-clock time since the clock started, paused or not.
    #[inline]
    pub fn uptime(&self) -> Duration {
        self.last_frame.saturating_duration_since(self.start)
    }

    /// Total frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frame rate estimate; 0 until the first estimate is available.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Use a fixed step instead of measured frame time. `None` restores
    /// real timing.
    pub fn set_fixed_delta_ms(&mut self, delta: Option<f32>) {
        self.fixed_delta_ms = delta;
    }

    /// Cap on a single frame's step.
    pub fn set_max_delta_ms(&mut self, max: f32) {
        self.max_delta_ms = max.max(0.0);
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
