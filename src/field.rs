//! Gridded wind data on a regular longitude/latitude lattice.
//!
//! A [`DataField`] holds one scalar per grid node and samples it with
//! bilinear interpolation. A [`VectorField`] pairs an eastward (`u`) and a
//! northward (`v`) component field on identical grids; it is the unit of data
//! for one forecast time.
//!
//! # Layout
//!
//! Samples are stored column major: all latitudes of the westernmost column
//! first, south to north, then the next column east. For a field of
//! `width` columns and `height` rows the node at column `x`, row `y` lives at
//! `data[x * height + y]`.
//!
//! # Longitude wrap
//!
//! A field whose columns close the full circle (`min_lon == (max_lon + res) % 360`)
//! covers `[0, 360]`. Interpolating between the last column and "360°"
//! reads column 0 again, so `get_value(360.0, lat) == get_value(0.0, lat)`.
//!
//! # Example
//!
//! ```ignore
//! let u = DataField::new(u_data, 0.0, 359.0, -90.0, 90.0, 1.0)?;
//! let v = DataField::new(v_data, 0.0, 359.0, -90.0, 90.0, 1.0)?;
//! let wind = VectorField::new(u, v)?;
//! let (u, v) = wind.sample(12.3, 45.6)?;
//! ```

use crate::error::FieldError;

/// Rows in a global 1° grid (-90..=90).
pub const GLOBAL_HEIGHT: usize = 181;
/// Columns in a global 1° grid (0..=359).
pub const GLOBAL_WIDTH: usize = 360;

/// An immutable scalar grid with bilinear sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct DataField {
    data: Vec<f32>,
    min_lon: f32,
    max_lon: f32,
    min_lat: f32,
    max_lat: f32,
    resolution: f32,
    width: usize,
    height: usize,
}

impl DataField {
    /// Build a field from column-major samples.
    ///
    /// # Errors
    ///
    /// - [`FieldError::UnsupportedResolution`] unless `resolution` is 1.
    /// - [`FieldError::InvalidBounds`] for inverted or off-globe bounds.
    /// - [`FieldError::SizeMismatch`] if `data.len()` differs from the grid size.
    pub fn new(
        data: Vec<f32>,
        min_lon: f32,
        max_lon: f32,
        min_lat: f32,
        max_lat: f32,
        resolution: f32,
    ) -> Result<Self, FieldError> {
        if resolution != 1.0 {
            return Err(FieldError::UnsupportedResolution(resolution));
        }
        if max_lon < min_lon
            || max_lat < min_lat
            || min_lat < -90.0
            || max_lat > 90.0
            || min_lon < 0.0
            || max_lon >= 360.0
        {
            return Err(FieldError::InvalidBounds);
        }

        let width = (max_lon - min_lon) as usize + 1;
        let height = (max_lat - min_lat) as usize + 1;
        if data.len() != width * height {
            return Err(FieldError::SizeMismatch {
                expected: width * height,
                actual: data.len(),
            });
        }

        Ok(Self {
            data,
            min_lon,
            max_lon,
            min_lat,
            max_lat,
            resolution,
            width,
            height,
        })
    }

    /// A global 1° field (lon 0..=359, lat -90..=90).
    pub fn global(data: Vec<f32>) -> Result<Self, FieldError> {
        Self::new(data, 0.0, 359.0, -90.0, 90.0, 1.0)
    }

    /// Whether the columns close the full longitude circle.
    pub fn lon_wrap(&self) -> bool {
        self.min_lon == (self.max_lon + self.resolution) % 360.0
    }

    pub fn min_lat(&self) -> f32 {
        self.min_lat
    }

    pub fn max_lat(&self) -> f32 {
        self.max_lat
    }

    /// Western edge of the coverage; 0 for wrapping fields.
    pub fn min_lon(&self) -> f32 {
        if self.lon_wrap() {
            0.0
        } else {
            self.min_lon
        }
    }

    /// Eastern edge of the coverage; 360 for wrapping fields.
    pub fn max_lon(&self) -> f32 {
        if self.lon_wrap() {
            360.0
        } else {
            self.max_lon
        }
    }

    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw column-major samples.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Inclusive bounds test, the non-failing twin of [`DataField::get_value`].
    pub fn point_in_bounds(&self, lon: f32, lat: f32) -> bool {
        lon >= self.min_lon()
            && lon <= self.max_lon()
            && lat >= self.min_lat
            && lat <= self.max_lat
    }

    /// Bilinearly interpolated value at `(lon, lat)`.
    ///
    /// Values on grid nodes are returned exactly. Out-of-coverage lookups
    /// fail rather than clamp.
    pub fn get_value(&self, lon: f32, lat: f32) -> Result<f32, FieldError> {
        if !self.point_in_bounds(lon, lat) {
            return Err(FieldError::OutOfBounds { lon, lat });
        }
        let x = (lon - self.min_lon) / self.resolution;
        let y = (lat - self.min_lat) / self.resolution;
        Ok(self.interpolate(x, y))
    }

    fn interpolate(&self, x: f32, y: f32) -> f32 {
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;

        let left = self.wrap_column(x0 as usize);
        let right = self.wrap_column(x.ceil() as usize);
        let bottom = y0 as usize;
        let top = (y.ceil() as usize).min(self.height - 1);

        let ll = self.at(left, bottom);
        let lr = self.at(right, bottom);
        let ul = self.at(left, top);
        let ur = self.at(right, top);

        let lower = lerp(fx, ll, lr);
        let upper = lerp(fx, ul, ur);
        lerp(fy, lower, upper)
    }

    #[inline]
    fn wrap_column(&self, x: usize) -> usize {
        if self.lon_wrap() && x >= self.width {
            0
        } else {
            x.min(self.width - 1)
        }
    }

    #[inline]
    fn at(&self, x: usize, y: usize) -> f32 {
        self.data[x * self.height + y]
    }

    fn same_grid(&self, other: &DataField) -> bool {
        self.min_lon == other.min_lon
            && self.max_lon == other.max_lon
            && self.min_lat == other.min_lat
            && self.max_lat == other.max_lat
            && self.resolution == other.resolution
    }
}

#[inline]
fn lerp(t: f32, a: f32, b: f32) -> f32 {
    t * (b - a) + a
}

/// Wind velocity components for one forecast time.
///
/// `u` is eastward and `v` northward, both in m/s. Advection treats them as
/// degrees per second.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorField {
    u: DataField,
    v: DataField,
}

impl VectorField {
    /// Pair two component fields.
    ///
    /// Fails with [`FieldError::DimensionMismatch`] unless both share bounds
    /// and resolution.
    pub fn new(u: DataField, v: DataField) -> Result<Self, FieldError> {
        if !u.same_grid(&v) {
            return Err(FieldError::DimensionMismatch);
        }
        Ok(Self { u, v })
    }

    /// Build a global 1° field from raw column-major u and v samples.
    pub fn global(u: Vec<f32>, v: Vec<f32>) -> Result<Self, FieldError> {
        Self::new(DataField::global(u)?, DataField::global(v)?)
    }

    pub fn u_field(&self) -> &DataField {
        &self.u
    }

    pub fn v_field(&self) -> &DataField {
        &self.v
    }

    pub fn min_lon(&self) -> f32 {
        self.u.min_lon()
    }

    pub fn max_lon(&self) -> f32 {
        self.u.max_lon()
    }

    pub fn min_lat(&self) -> f32 {
        self.u.min_lat()
    }

    pub fn max_lat(&self) -> f32 {
        self.u.max_lat()
    }

    pub fn width(&self) -> usize {
        self.u.width()
    }

    pub fn height(&self) -> usize {
        self.u.height()
    }

    /// Whether the field covers the whole sphere, as advection requires.
    pub fn is_global(&self) -> bool {
        self.u.lon_wrap() && self.min_lat() == -90.0 && self.max_lat() == 90.0
    }

    pub fn point_in_bounds(&self, lon: f32, lat: f32) -> bool {
        self.u.point_in_bounds(lon, lat)
    }

    /// Interpolated `(u, v)` at a point.
    pub fn sample(&self, lon: f32, lat: f32) -> Result<(f32, f32), FieldError> {
        Ok((self.u.get_value(lon, lat)?, self.v.get_value(lon, lat)?))
    }

    /// Wind speed magnitude at every grid node, in the same layout as the
    /// component data.
    pub fn speeds(&self) -> Vec<f32> {
        self.u
            .data()
            .iter()
            .zip(self.v.data())
            .map(|(u, v)| u.hypot(*v))
            .collect()
    }

    /// Largest speed on any grid node.
    pub fn max_speed(&self) -> f32 {
        self.u
            .data()
            .iter()
            .zip(self.v.data())
            .map(|(u, v)| u.hypot(*v))
            .fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Global field whose value encodes the node: 1000 * lon_index + lat_index.
    fn indexed_global() -> DataField {
        let mut data = Vec::with_capacity(GLOBAL_WIDTH * GLOBAL_HEIGHT);
        for x in 0..GLOBAL_WIDTH {
            for y in 0..GLOBAL_HEIGHT {
                data.push((1000 * x + y) as f32);
            }
        }
        DataField::global(data).unwrap()
    }

    fn small_field() -> DataField {
        // 3 columns (lon 10..=12) by 11 rows (lat -5..=5)
        let data = (0..33).map(|i| i as f32).collect();
        DataField::new(data, 10.0, 12.0, -5.0, 5.0, 1.0).unwrap()
    }

    // ========== Construction Tests ==========

    #[test]
    fn test_size_mismatch() {
        let err = DataField::new(vec![0.0; 10], 0.0, 2.0, 0.0, 2.0, 1.0).unwrap_err();
        assert_eq!(err, FieldError::SizeMismatch { expected: 9, actual: 10 });
    }

    #[test]
    fn test_unsupported_resolution() {
        let err = DataField::new(vec![0.0; 4], 0.0, 1.0, 0.0, 1.0, 0.5).unwrap_err();
        assert_eq!(err, FieldError::UnsupportedResolution(0.5));
    }

    #[test]
    fn test_inverted_bounds() {
        let err = DataField::new(vec![0.0; 4], 5.0, 4.0, 0.0, 1.0, 1.0).unwrap_err();
        assert_eq!(err, FieldError::InvalidBounds);
    }

    #[test]
    fn test_dimensions() {
        let field = small_field();
        assert_eq!(field.width(), 3);
        assert_eq!(field.height(), 11);
    }

    // ========== Wrap Tests ==========

    #[test]
    fn test_lon_wrap_detection() {
        assert!(indexed_global().lon_wrap());
        assert!(!small_field().lon_wrap());
    }

    #[test]
    fn test_wrapping_bounds() {
        let field = indexed_global();
        assert_eq!(field.min_lon(), 0.0);
        assert_eq!(field.max_lon(), 360.0);
        assert!(field.point_in_bounds(360.0, 0.0));
        assert!(!field.point_in_bounds(360.5, 0.0));
    }

    #[test]
    fn test_lon_360_aliases_0() {
        let field = indexed_global();
        for lat in [-90.0, -45.5, 0.0, 33.3, 90.0] {
            assert_eq!(
                field.get_value(360.0, lat).unwrap(),
                field.get_value(0.0, lat).unwrap()
            );
        }
    }

    #[test]
    fn test_interpolates_across_seam() {
        let field = indexed_global();
        // Halfway between column 359 and column 0
        let value = field.get_value(359.5, 0.0).unwrap();
        let expected = 0.5 * (359_090.0 + 90.0);
        assert_relative_eq!(value, expected);
    }

    // ========== Lookup Tests ==========

    #[test]
    fn test_exact_at_grid_nodes() {
        let field = indexed_global();
        for lon in [0u32, 1, 17, 180, 359] {
            for lat in [-90i32, -1, 0, 45, 90] {
                let expected = (1000 * lon as i32 + (lat + 90)) as f32;
                assert_eq!(field.get_value(lon as f32, lat as f32).unwrap(), expected);
            }
        }
    }

    #[test]
    fn test_bilinear_midpoint() {
        let field = small_field();
        // Nodes: (10,-5)=0, (11,-5)=11, (10,-4)=1, (11,-4)=12
        let value = field.get_value(10.5, -4.5).unwrap();
        assert_relative_eq!(value, 6.0);
    }

    #[test]
    fn test_out_of_bounds_lat() {
        let field = small_field();
        let err = field.get_value(11.0, -6.0).unwrap_err();
        assert_eq!(err, FieldError::OutOfBounds { lon: 11.0, lat: -6.0 });
        assert!(!field.point_in_bounds(11.0, -6.0));
    }

    #[test]
    fn test_out_of_bounds_lon() {
        let field = small_field();
        assert!(field.get_value(9.9, 0.0).is_err());
        assert!(field.get_value(12.1, 0.0).is_err());
        assert!(field.get_value(12.0, 5.0).is_ok());
    }

    // ========== VectorField Tests ==========

    #[test]
    fn test_vector_field_dimension_mismatch() {
        let u = small_field();
        let v = DataField::new(vec![0.0; 33], 10.0, 12.0, -4.0, 6.0, 1.0).unwrap();
        assert_eq!(VectorField::new(u, v).unwrap_err(), FieldError::DimensionMismatch);
    }

    #[test]
    fn test_vector_field_sample() {
        let u = DataField::new(vec![3.0; 4], 0.0, 1.0, 0.0, 1.0, 1.0).unwrap();
        let v = DataField::new(vec![4.0; 4], 0.0, 1.0, 0.0, 1.0, 1.0).unwrap();
        let field = VectorField::new(u, v).unwrap();
        assert_eq!(field.sample(0.5, 0.5).unwrap(), (3.0, 4.0));
        assert_eq!(field.max_speed(), 5.0);
        assert_eq!(field.speeds(), vec![5.0; 4]);
        assert!(!field.is_global());
    }

    #[test]
    fn test_global_vector_field() {
        let n = GLOBAL_WIDTH * GLOBAL_HEIGHT;
        let field = VectorField::global(vec![1.0; n], vec![0.0; n]).unwrap();
        assert!(field.is_global());
        assert_eq!(field.sample(360.0, 90.0).unwrap(), (1.0, 0.0));
    }
}
