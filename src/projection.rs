//! Equirectangular map projection.
//!
//! Maps between geographic coordinates (degrees) and screen pixels for a
//! viewport described by canvas size, zoom level and center coordinate.
//! Every renderer and the pan/zoom controller use these functions, so the
//! advection, drawing and hit-testing all agree on one projection.
//!
//! Degrees are square on screen. At zoom 1 the whole 360°×180° globe fits
//! the window along its constrained axis: a window twice as wide as it is
//! tall shows the globe exactly, narrower windows crop longitude and wider
//! windows crop latitude.
//!
//! # Example
//!
//! ```ignore
//! use windvis::projection::{Coord, Viewport};
//!
//! let viewport = Viewport::new(500, 500);
//! let p = viewport.transform_coord(Coord::new(180.0, 0.0));
//! assert_eq!((p.x, p.y), (250.0, 250.0));
//! ```

/// A geographic coordinate in degrees.
///
/// `lat` is expected in `[-90, 90]`. `lon` is conventionally in `[0, 360)`
/// but may be out of range; use [`normalize_lon`] before field lookups.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coord {
    pub lon: f64,
    pub lat: f64,
}

impl Coord {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// A point (or pixel delta) in screen space, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Wrap a longitude into `[0, 360)`.
#[inline]
pub fn normalize_lon(lon: f64) -> f64 {
    let wrapped = lon.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Shift `lon` by whole turns so it lies within 180° of `center`.
#[inline]
pub fn wrap_lon_near(center: f64, lon: f64) -> f64 {
    center + (lon - center + 180.0).rem_euclid(360.0) - 180.0
}

/// Canvas size, zoom level and center coordinate.
///
/// Owned by the interaction layer and read by every render stage each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    /// 1 is fully zoomed out.
    pub zoom: f64,
    pub center: Coord,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl Viewport {
    /// A fully zoomed out viewport centered on (180°, 0°).
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as f64,
            height: height as f64,
            zoom: 1.0,
            center: Coord::new(180.0, 0.0),
        }
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn with_center(mut self, center: Coord) -> Self {
        self.center = center;
        self
    }

    #[inline]
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// Horizontal divisor: the long axis stops growing once the window is
    /// twice as wide as tall.
    #[inline]
    fn lon_factor(&self) -> f64 {
        self.aspect_ratio().min(2.0)
    }

    #[inline]
    fn lat_factor(&self) -> f64 {
        self.aspect_ratio().max(2.0)
    }

    /// Pixels per degree, identical on both axes.
    pub fn pixels_per_degree(&self) -> f64 {
        self.width / 180.0 / self.lon_factor() * self.zoom
    }

    /// Scale a coordinate delta into a pixel delta.
    pub fn scale_coord(&self, delta: Coord) -> ScreenPoint {
        ScreenPoint {
            x: self.width * delta.lon / 180.0 / self.lon_factor() * self.zoom,
            y: -self.height * delta.lat / 360.0 * self.lat_factor() * self.zoom,
        }
    }

    /// Map an absolute coordinate to an absolute screen position.
    ///
    /// Linear in longitude: no wrapping is applied, so points more than 180°
    /// from the center land off screen. See [`Viewport::project_wrapped`].
    pub fn transform_coord(&self, coord: Coord) -> ScreenPoint {
        ScreenPoint {
            x: self.width / 2.0
                - (self.width * (180.0 - coord.lon + (self.center.lon - 180.0)) / 180.0)
                    / self.lon_factor()
                    * self.zoom,
            y: self.height / 2.0
                - (self.height * (coord.lat - self.center.lat) / 360.0)
                    * self.lat_factor()
                    * self.zoom,
        }
    }

    /// Like [`Viewport::transform_coord`], taking the copy of `coord.lon`
    /// nearest the view center.
    pub fn project_wrapped(&self, coord: Coord) -> ScreenPoint {
        self.transform_coord(Coord::new(wrap_lon_near(self.center.lon, coord.lon), coord.lat))
    }

    /// Inverse of [`Viewport::scale_coord`].
    pub fn scale_point(&self, delta: ScreenPoint) -> Coord {
        Coord {
            lon: self.lon_factor() * 180.0 * delta.x / (self.width * self.zoom),
            lat: (1.0 / self.lat_factor()) * -360.0 * delta.y / (self.height * self.zoom),
        }
    }

    /// Inverse of [`Viewport::transform_coord`].
    pub fn transform_point(&self, point: ScreenPoint) -> Coord {
        Coord {
            lon: 180.0
                + self.lon_factor() * 180.0 * (point.x - self.width / 2.0) / (self.width * self.zoom)
                + (self.center.lon - 180.0),
            lat: (1.0 / self.lat_factor()) * -360.0 * (point.y - self.height / 2.0)
                / (self.height * self.zoom)
                + self.center.lat,
        }
    }

    /// Smallest center latitude that keeps the south pole at or below the
    /// bottom edge.
    pub fn min_center_lat(&self) -> f64 {
        -90.0 + 180.0 / (self.lat_factor() * self.zoom)
    }

    /// Largest center latitude that keeps the north pole at or above the
    /// top edge.
    pub fn max_center_lat(&self) -> f64 {
        90.0 - 180.0 / (self.lat_factor() * self.zoom)
    }

    /// Pixel size of the full globe at the current zoom.
    pub fn globe_dims(&self) -> ScreenPoint {
        let max = self.scale_coord(Coord::new(360.0, 90.0));
        let min = self.scale_coord(Coord::new(0.0, -90.0));
        ScreenPoint::new(max.x - min.x, max.y - min.y)
    }

    /// Clamp the center latitude into the valid range for this zoom and
    /// wrap the center longitude into `[0, 360)`.
    pub fn clamp_center(&mut self) {
        let min = self.min_center_lat();
        let max = self.max_center_lat();
        self.center.lat = if min > max { 0.0 } else { self.center.lat.clamp(min, max) };
        self.center.lon = normalize_lon(self.center.lon);
    }

    /// Pan by a drag of `(dx, dy)` pixels so the map follows the cursor.
    pub fn pan_by_pixels(&mut self, dx: f64, dy: f64) {
        let delta = self.scale_point(ScreenPoint::new(dx, dy));
        self.center.lon -= delta.lon;
        self.center.lat -= delta.lat;
        self.clamp_center();
    }

    /// Change the zoom level, clamped to `[min_zoom, max_zoom]`, and re-clamp
    /// the center for the new zoom.
    pub fn zoom_by(&mut self, delta: f64, min_zoom: f64, max_zoom: f64) {
        self.zoom = (self.zoom + delta).clamp(min_zoom, max_zoom);
        self.clamp_center();
    }

    /// Update the canvas size, keeping zoom and center.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.width = width as f64;
            self.height = height as f64;
            self.clamp_center();
        }
    }
}
