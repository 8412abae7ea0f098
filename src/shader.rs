//! WGSL sources and the uniform/storage layouts they share with the host.
//!
//! Render shaders are assembled from `shaders/projection.wgsl` plus a stage
//! file, so every pass projects with the same math as
//! [`Viewport`](crate::projection::Viewport).

use bytemuck::{Pod, Zeroable};

use crate::projection::Viewport;
use crate::vectors::Glyph;

pub const ADVECT_SOURCE: &str = include_str!("shaders/advect.wgsl");
pub const PARTICLES_SOURCE: &str = concat!(
    include_str!("shaders/projection.wgsl"),
    include_str!("shaders/particles.wgsl")
);
pub const COMPOSITE_SOURCE: &str = concat!(
    include_str!("shaders/projection.wgsl"),
    include_str!("shaders/composite.wgsl")
);
pub const SPEED_SOURCE: &str = concat!(
    include_str!("shaders/projection.wgsl"),
    include_str!("shaders/speed.wgsl")
);
pub const BASEMAP_SOURCE: &str = concat!(
    include_str!("shaders/projection.wgsl"),
    include_str!("shaders/basemap.wgsl")
);
pub const VECTORS_SOURCE: &str = concat!(
    include_str!("shaders/projection.wgsl"),
    include_str!("shaders/vectors.wgsl")
);

/// Particle as stored in the GPU ping-pong buffers.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuParticle {
    pub lon: f32,
    pub lat: f32,
    pub age: f32,
    /// Per-particle RNG state.
    pub seed: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct AdvectParams {
    pub dt_ms: f32,
    pub lifetime: f32,
    pub count: u32,
    pub frame_seed: u32,
    pub field_width: u32,
    pub field_height: u32,
    /// Non-zero to scatter every particle this tick.
    pub scatter: u32,
    pub _pad: u32,
}

/// Mirror of the WGSL `View` struct.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ViewUniform {
    pub center: [f32; 2],
    pub size: [f32; 2],
    pub zoom: f32,
    pub point_size: f32,
    pub _pad: [f32; 2],
}

impl ViewUniform {
    pub fn new(viewport: &Viewport, point_size: f32) -> Self {
        Self {
            center: [viewport.center.lon as f32, viewport.center.lat as f32],
            size: [viewport.width as f32, viewport.height as f32],
            zoom: viewport.zoom as f32,
            point_size,
            _pad: [0.0; 2],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CompositeUniform {
    pub captured: ViewUniform,
    pub current: ViewUniform,
    pub color: [f32; 4],
    pub alpha: f32,
    pub _pad: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SpeedUniform {
    pub view: ViewUniform,
    pub field_width: f32,
    pub field_height: f32,
    pub opacity: f32,
    pub _pad: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct BaseMapUniform {
    pub view: ViewUniform,
    pub west_lon: f32,
    pub _pad: [f32; 3],
}

/// Arrow anchor and wind, one instance per arrow.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuGlyph {
    pub anchor: [f32; 2],
    pub wind: [f32; 2],
}

impl From<Glyph> for GpuGlyph {
    fn from(glyph: Glyph) -> Self {
        Self {
            anchor: [glyph.lon, glyph.lat],
            wind: [glyph.u, glyph.v],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct VectorUniform {
    pub view: ViewUniform,
    pub arrow_color: [f32; 4],
    pub grid_color: [f32; 4],
    pub spacing: f32,
    pub meridians: u32,
    pub _pad: [f32; 2],
}
