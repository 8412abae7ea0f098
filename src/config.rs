//! Visualization settings.
//!
//! [`WindConfig`] gathers every tunable of the particle pipeline in one
//! place. Defaults give the stock look: 4 s particle lifetime, 50 trail
//! frames, one drawn particle per hundred pixels.
//!
//! ```ignore
//! let config = WindConfig::default()
//!     .with_trail_frames(30)
//!     .with_particle_counts(20_000, 1_000, 500_000)
//!     .with_fps_marks(25.0, 55.0);
//! config.validate()?;
//! ```

use std::time::Duration;

use crate::budget::ParticleBudget;
use crate::error::VisError;
use crate::heatmap::HEATMAP_SIZE;
use crate::particles::PARTICLE_LIFETIME;
use crate::trails::TRAIL_FRAMES;

/// Smallest particle population.
pub const MIN_PARTICLE_COUNT: u32 = 1_000;
/// Largest particle population, also the cap on drawn particles.
pub const MAX_PARTICLE_COUNT: u32 = 1_000_000;
/// Population at startup.
pub const INIT_PARTICLE_COUNT: u32 = 50_000;
/// Drawn particles per screen pixel.
pub const PARTICLE_DENSITY: f32 = 0.01;

/// Settings for the particle pipeline and the window loop.
#[derive(Debug, Clone, PartialEq)]
pub struct WindConfig {
    /// Particle lifetime in milliseconds.
    pub lifetime_ms: f32,
    /// Number of frames kept in the trail ring.
    pub trail_frames: usize,
    /// Drawn particles per pixel.
    pub density: f32,
    pub initial_particles: u32,
    pub min_particles: u32,
    pub max_particles: u32,
    /// Frame rate below which the population halves.
    pub low_fps: f32,
    /// Frame rate above which the population doubles.
    pub high_fps: f32,
    /// Minimum time between population changes.
    pub budget_window: Duration,
    /// Time between forecast steps while playing, in milliseconds.
    pub tau_interval_ms: f32,
    /// Forecast hours per step.
    pub tau_step: u32,
    /// Edge length of the speed texture.
    pub heatmap_size: usize,
    /// Scatter particles when the displayed forecast changes.
    pub reset_on_field_change: bool,
    pub display_particles: bool,
    pub display_speeds: bool,
    /// Wind arrows and graticule.
    pub display_vectors: bool,
    /// Opacity of the speed layer over the base map.
    pub speed_opacity: f32,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Particle point size in pixels.
    pub point_size: f32,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            lifetime_ms: PARTICLE_LIFETIME,
            trail_frames: TRAIL_FRAMES,
            density: PARTICLE_DENSITY,
            initial_particles: INIT_PARTICLE_COUNT,
            min_particles: MIN_PARTICLE_COUNT,
            max_particles: MAX_PARTICLE_COUNT,
            low_fps: 30.0,
            high_fps: 50.0,
            budget_window: Duration::from_secs(5),
            tau_interval_ms: 500.0,
            tau_step: 3,
            heatmap_size: HEATMAP_SIZE,
            reset_on_field_change: false,
            display_particles: true,
            display_speeds: true,
            display_vectors: false,
            speed_opacity: 0.7,
            min_zoom: 1.0,
            max_zoom: 16.0,
            point_size: 1.0,
        }
    }
}

impl WindConfig {
    pub fn with_lifetime_ms(mut self, lifetime_ms: f32) -> Self {
        self.lifetime_ms = lifetime_ms;
        self
    }

    pub fn with_trail_frames(mut self, frames: usize) -> Self {
        self.trail_frames = frames;
        self
    }

    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    /// Initial, minimum and maximum particle population.
    pub fn with_particle_counts(mut self, initial: u32, min: u32, max: u32) -> Self {
        self.initial_particles = initial;
        self.min_particles = min;
        self.max_particles = max;
        self
    }

    pub fn with_fps_marks(mut self, low: f32, high: f32) -> Self {
        self.low_fps = low;
        self.high_fps = high;
        self
    }

    pub fn with_budget_window(mut self, window: Duration) -> Self {
        self.budget_window = window;
        self
    }

    pub fn with_tau_stepping(mut self, step: u32, interval_ms: f32) -> Self {
        self.tau_step = step;
        self.tau_interval_ms = interval_ms;
        self
    }

    pub fn with_reset_on_field_change(mut self, reset: bool) -> Self {
        self.reset_on_field_change = reset;
        self
    }

    pub fn with_layers(mut self, particles: bool, speeds: bool) -> Self {
        self.display_particles = particles;
        self.display_speeds = speeds;
        self
    }

    pub fn with_vectors(mut self, vectors: bool) -> Self {
        self.display_vectors = vectors;
        self
    }

    pub fn with_speed_opacity(mut self, opacity: f32) -> Self {
        self.speed_opacity = opacity;
        self
    }

    pub fn with_zoom_range(mut self, min: f64, max: f64) -> Self {
        self.min_zoom = min;
        self.max_zoom = max;
        self
    }

    pub fn with_point_size(mut self, size: f32) -> Self {
        self.point_size = size;
        self
    }

    /// Check the settings for contradictions.
    pub fn validate(&self) -> Result<(), VisError> {
        if !(self.lifetime_ms > 0.0) {
            return Err(VisError::Config("particle lifetime must be positive".into()));
        }
        if self.trail_frames == 0 {
            return Err(VisError::Config("at least one trail frame is required".into()));
        }
        if self.min_particles == 0 || self.min_particles > self.max_particles {
            return Err(VisError::Config(format!(
                "particle bounds {}..={} are empty",
                self.min_particles, self.max_particles
            )));
        }
        if self.low_fps >= self.high_fps {
            return Err(VisError::Config("low fps mark must be below the high mark".into()));
        }
        if self.min_zoom < 1.0 || self.min_zoom > self.max_zoom {
            return Err(VisError::Config("zoom range must start at 1 or above".into()));
        }
        if !(0.0..=1.0).contains(&self.speed_opacity) {
            return Err(VisError::Config("speed opacity must lie in [0, 1]".into()));
        }
        if self.density < 0.0 || self.heatmap_size == 0 {
            return Err(VisError::Config("density and heatmap size must be positive".into()));
        }
        Ok(())
    }

    /// Particle budget seeded from these settings.
    pub fn budget(&self) -> ParticleBudget {
        ParticleBudget::new(self.initial_particles, self.min_particles, self.max_particles)
            .with_thresholds(self.low_fps, self.high_fps)
            .with_window(self.budget_window)
    }

    /// Particles drawn per frame for a canvas of this size:
    /// `min(density * width * height, population, max_particles)`.
    pub fn draw_count(&self, width: u32, height: u32, population: u32) -> u32 {
        let by_density = (self.density as f64 * width as f64 * height as f64).round() as u32;
        by_density.min(population).min(self.max_particles)
    }
}
