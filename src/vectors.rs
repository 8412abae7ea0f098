//! Wind arrow glyphs and the graticule drawn with them.
//!
//! The vector layer places one arrow on every fifth grid node of the
//! displayed field, oriented along the wind and sized by its speed, and
//! overlays a grid of meridians and parallels at the same spacing. Arrows
//! keep a fixed pixel size at every zoom level; only their anchors follow
//! the projection.
//!
//! `shaders/vectors.wgsl` builds the same geometry on the GPU from the
//! [`Glyph`]s produced here.

use crate::field::VectorField;
use crate::projection::{Coord, ScreenPoint, Viewport};

/// Grid nodes between neighbouring arrows, and degrees between grid lines.
pub const GLYPH_SPACING: usize = 5;
/// Speed (m/s) that draws an arrow 10 pixels long.
pub const ARROW_SPEED_SCALE: f32 = 10.0;
/// Half the arrow length in pixels per unit of scaled speed.
pub const ARROW_HALF_LENGTH: f32 = 5.0;
/// Arrowhead length in pixels.
pub const HEAD_LENGTH: f32 = 5.0;
/// Arrowhead half width in pixels.
pub const HEAD_HALF_WIDTH: f32 = 1.5;

/// Arrow color, light blue.
pub const ARROW_COLOR: [f32; 4] = [140.0 / 255.0, 200.0 / 255.0, 1.0, 0.3];
/// Graticule color.
pub const GRID_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 0.3];

/// One arrow anchored at a grid node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub lon: f32,
    pub lat: f32,
    pub u: f32,
    pub v: f32,
}

impl Glyph {
    /// Arrow length in pixels.
    pub fn length(&self) -> f32 {
        2.0 * ARROW_HALF_LENGTH * self.u.hypot(self.v) / ARROW_SPEED_SCALE
    }

    /// The four strokes of the arrow in screen pixels, centered on `anchor`:
    /// the shaft, then the three sides of the head.
    ///
    /// The shaft points where the wind blows. Screen y grows downward, so a
    /// northward wind points up the screen.
    pub fn segments(&self, anchor: ScreenPoint) -> [(ScreenPoint, ScreenPoint); 4] {
        let half = (self.length() / 2.0) as f64;
        let head_start = half - HEAD_LENGTH as f64;
        let width = HEAD_HALF_WIDTH as f64;

        let angle = (self.v as f64).atan2(self.u as f64);
        let (sin, cos) = angle.sin_cos();
        // Rotate (along, across) in arrow space onto the screen
        let at = |along: f64, across: f64| {
            ScreenPoint::new(
                anchor.x + along * cos - across * sin,
                anchor.y - along * sin - across * cos,
            )
        };

        let tip = at(half, 0.0);
        let left = at(head_start, width);
        let right = at(head_start, -width);
        [
            (at(-half, 0.0), at(head_start, 0.0)),
            (tip, left),
            (left, right),
            (right, tip),
        ]
    }
}

/// Arrows on every `spacing`-th node of `field`, column by column.
pub fn glyphs(field: &VectorField, spacing: usize) -> Vec<Glyph> {
    let spacing = spacing.max(1);
    let (width, height) = (field.width(), field.height());
    let u = field.u_field().data();
    let v = field.v_field().data();
    let min_lon = field.min_lon();
    let min_lat = field.min_lat();

    let mut out = Vec::with_capacity(width.div_ceil(spacing) * height.div_ceil(spacing));
    for x in (0..width).step_by(spacing) {
        for y in (0..height).step_by(spacing) {
            let i = x * height + y;
            out.push(Glyph {
                lon: min_lon + x as f32,
                lat: min_lat + y as f32,
                u: u[i],
                v: v[i],
            });
        }
    }
    out
}

/// Meridians and parallels every `spacing` degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Graticule {
    pub spacing: f32,
}

impl Default for Graticule {
    fn default() -> Self {
        Self {
            spacing: GLYPH_SPACING as f32,
        }
    }
}

impl Graticule {
    pub fn new(spacing: f32) -> Self {
        Self { spacing }
    }

    /// Meridian count. Longitude 360 is the same line as 0.
    pub fn meridian_count(&self) -> u32 {
        (360.0 / self.spacing).ceil() as u32
    }

    /// Parallel count, both poles included.
    pub fn parallel_count(&self) -> u32 {
        (180.0 / self.spacing).floor() as u32 + 1
    }

    /// Vertices of the line list: two per line, meridians first.
    pub fn vertex_count(&self) -> u32 {
        2 * (self.meridian_count() + self.parallel_count())
    }

    /// Endpoints of line `index` on screen.
    ///
    /// Meridians run pole to pole. Parallels run across the whole canvas,
    /// since the map repeats east to west.
    pub fn line(&self, viewport: &Viewport, index: u32) -> Option<(ScreenPoint, ScreenPoint)> {
        let meridians = self.meridian_count();
        if index < meridians {
            let lon = (index as f32 * self.spacing) as f64;
            let south = viewport.project_wrapped(Coord::new(lon, -90.0));
            let north = viewport.project_wrapped(Coord::new(lon, 90.0));
            return Some((south, north));
        }
        let parallel = index - meridians;
        if parallel >= self.parallel_count() {
            return None;
        }
        let lat = (-90.0 + parallel as f32 * self.spacing) as f64;
        let y = viewport.transform_coord(Coord::new(viewport.center.lon, lat)).y;
        Some((ScreenPoint::new(0.0, y), ScreenPoint::new(viewport.width, y)))
    }
}
