//! Wind readout under the mouse cursor.

use std::fmt;

use crate::field::VectorField;
use crate::projection::{normalize_lon, ScreenPoint, Viewport};

/// Location and wind at a screen point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorInfo {
    pub lon: f64,
    pub lat: f64,
    /// `(u, v)` when the point lies inside the field.
    pub wind: Option<(f32, f32)>,
}

impl CursorInfo {
    /// Hit-test `point` against the map and sample `field` there.
    ///
    /// Returns `None` when the point is off the globe (above a pole).
    pub fn query(viewport: &Viewport, field: &VectorField, point: ScreenPoint) -> Option<Self> {
        let coord = viewport.transform_point(point);
        if !(-90.0..=90.0).contains(&coord.lat) {
            return None;
        }
        let lon = normalize_lon(coord.lon);
        let (qlon, qlat) = (lon as f32, coord.lat as f32);
        let wind = if field.point_in_bounds(qlon, qlat) {
            field.sample(qlon, qlat).ok()
        } else {
            None
        };
        Some(Self {
            lon,
            lat: coord.lat,
            wind,
        })
    }

    /// Wind speed in m/s.
    pub fn speed(&self) -> Option<f32> {
        self.wind.map(|(u, v)| u.hypot(v))
    }

    /// Meteorological direction the wind blows from, in whole degrees.
    pub fn direction(&self) -> Option<i32> {
        self.wind.map(|(u, v)| {
            let heading = round_half_up(v.atan2(u).to_degrees()) as i32;
            (270 - heading).rem_euclid(360)
        })
    }
}

/// Round to the nearest integer with halves going toward +inf, so `-90.5`
/// becomes `-90` where [`f32::round`] would give `-91`.
fn round_half_up(x: f32) -> f32 {
    (x + 0.5).floor()
}

impl fmt::Display for CursorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lat < 0.0 {
            write!(f, "{}S", (-self.lat).round())?;
        } else {
            write!(f, "{}N", self.lat.round())?;
        }
        if self.lon < 180.0 {
            write!(f, " {}E", self.lon.round())?;
        } else {
            write!(f, " {}W", (360.0 - self.lon).round())?;
        }
        if let (Some(dir), Some(speed)) = (self.direction(), self.speed()) {
            write!(f, "  {}° / {} m/s", dir, speed.round())?;
        }
        Ok(())
    }
}
