//! # windvis - animated global wind maps
//!
//! GPU particle advection over forecast wind fields, drawn as fading trails
//! on top of a wind speed heatmap.
//!
//! windvis handles the GPU side (ping-pong particle buffers, trail targets,
//! reprojection on pan and zoom) so you only supply wind fields.
//!
//! ## Quick Start
//!
//! ```ignore
//! use windvis::prelude::*;
//!
//! fn main() -> Result<(), VisError> {
//!     let forecast = windvis::synthetic::forecast(20, 3)?;
//!     Visualization::new(forecast)
//!         .with_config(WindConfig::default().with_trail_frames(40))
//!         .run()
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Projection
//!
//! A [`Viewport`] maps longitude/latitude to screen pixels and back. Degrees
//! are square on screen; the map repeats east to west and stops at the
//! poles, with the center latitude clamped so no empty space shows above
//! or below the globe at the current zoom.
//!
//! ### Fields
//!
//! A [`DataField`] is a regular 1° grid with bilinear lookup; a
//! [`VectorField`] pairs the `u` (eastward) and `v` (northward) components.
//! Fields covering all longitudes wrap, so longitude 360 reads column 0.
//! A [`ForecastSet`] keys published fields by forecast hour (tau).
//!
//! ### Particles
//!
//! Each tick every particle ages by Δt and moves by the sampled wind. A
//! particle past its lifetime respawns at a random position; one that
//! crosses a pole continues down the far side of the globe. The
//! [`ParticleSet`] is the CPU reference of the compute shader in
//! `shaders/advect.wgsl`.
//!
//! ### Trails
//!
//! Particles are rasterized into the newest slot of a [`TrailRing`], which
//! remembers the viewport each frame was drawn under. Compositing blends the
//! slots oldest first, faded by age and reprojected into the current
//! viewport, so trails stay attached to the map while panning.
//!
//! ### Layers
//!
//! Bottom to top: an optional [`BaseMap`] world image, the speed heatmap,
//! the particle trails, and wind arrows on a 5° graticule
//! (see [`vectors`]).
//!
//! ### Particle budget
//!
//! The simulated population is elastic: a [`ParticleBudget`] halves it when
//! the frame rate stays below 30 fps for 5 s and doubles it above 50 fps.
//! The drawn count is a separate density bound per screen pixel.
//!
//! ## Controls
//!
//! | Input | Effect |
//! |-------|--------|
//! | Left drag | pan |
//! | Wheel | zoom |
//! | Space | pause / play |
//! | P / S / V | toggle particles / speed layer / wind arrows |
//! | Left / Right | previous / next forecast step |
//! | R | scatter particles |
//! | Escape | quit |

mod app;
pub mod basemap;
pub mod budget;
pub mod config;
pub mod cursor;
pub mod error;
pub mod field;
pub mod field_image;
pub mod forecast;
mod gpu;
pub mod heatmap;
pub mod input;
pub mod particles;
pub mod projection;
pub mod shader;
pub mod synthetic;
pub mod time;
pub mod trails;
pub mod vectors;

pub use app::Visualization;
pub use basemap::BaseMap;
pub use budget::ParticleBudget;
pub use config::WindConfig;
pub use cursor::CursorInfo;
pub use error::{FieldError, GpuError, VisError};
pub use field::{DataField, VectorField};
pub use forecast::{ForecastPlayer, ForecastSet};
pub use gpu::pack_particles;
pub use particles::ParticleSet;
pub use projection::{Coord, ScreenPoint, Viewport};
pub use time::FrameClock;
pub use trails::TrailRing;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use windvis::prelude::*;
/// ```
pub mod prelude {
    pub use crate::app::Visualization;
    pub use crate::basemap::BaseMap;
    pub use crate::config::WindConfig;
    pub use crate::error::{FieldError, GpuError, VisError};
    pub use crate::field::{DataField, VectorField};
    pub use crate::forecast::ForecastSet;
    pub use crate::input::{Command, Input};
    pub use crate::projection::{Coord, ScreenPoint, Viewport};
}
