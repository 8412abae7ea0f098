//! Base map image drawn under every other layer.
//!
//! A [`BaseMap`] is an equirectangular RGBA image covering the whole globe:
//! 360° of longitude left to right starting at [`BaseMap::west_lon`], and
//! latitude 90° at the top row down to -90° at the bottom. The GPU samples it
//! through the same projection as the particles, so it pans and zooms with
//! them.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tracing::info;

use crate::error::VisError;
use crate::projection::{normalize_lon, Coord};

/// Largest texture edge every adapter accepts by default.
pub const MAX_TEXTURE_SIZE: u32 = 8192;

const OCEAN: Rgba<u8> = Rgba([12, 22, 40, 255]);
const GRID_LINE: Rgba<u8> = Rgba([38, 58, 88, 255]);

/// Equirectangular world image.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseMap {
    image: RgbaImage,
    west_lon: f64,
}

impl BaseMap {
    /// Wrap an image whose left edge is the antimeridian (-180°).
    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            image,
            west_lon: -180.0,
        }
    }

    /// Read a world image from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, VisError> {
        let path = path.as_ref();
        let image = image::open(path)?.to_rgba8();
        info!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "loaded base map"
        );
        Ok(Self::from_image(image))
    }

    /// Plain ocean with a faint graticule every `spacing` degrees, for when
    /// no world image is at hand.
    pub fn graticule(width: u32, height: u32, spacing: f64) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        // One pixel covers this many degrees on each axis
        let (dx, dy) = (360.0 / width as f64, 180.0 / height as f64);
        let on_line = |deg: f64, step: f64| {
            let offset = deg.rem_euclid(spacing);
            offset < step || spacing - offset < 1e-9
        };
        let image = RgbaImage::from_fn(width, height, |x, y| {
            let lon = x as f64 * dx;
            let lat = 90.0 - y as f64 * dy;
            if on_line(lon, dx) || on_line(90.0 - lat, dy) {
                GRID_LINE
            } else {
                OCEAN
            }
        });
        Self { image, west_lon: 0.0 }
    }

    /// Longitude of the image's left edge.
    pub fn with_west_lon(mut self, lon: f64) -> Self {
        self.west_lon = lon;
        self
    }

    pub fn west_lon(&self) -> f64 {
        self.west_lon
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Texture coordinate of `coord`, in `[0, 1)` across and `[0, 1]` down.
    /// `None` beyond the poles.
    pub fn uv(&self, coord: Coord) -> Option<(f64, f64)> {
        if !(-90.0..=90.0).contains(&coord.lat) {
            return None;
        }
        let u = normalize_lon(coord.lon - self.west_lon) / 360.0;
        let v = (90.0 - coord.lat) / 180.0;
        Some((u, v))
    }

    /// Pixel nearest to `coord`.
    pub fn pixel_at(&self, coord: Coord) -> Option<Rgba<u8>> {
        let (u, v) = self.uv(coord)?;
        let (w, h) = self.image.dimensions();
        let x = ((u * w as f64) as u32).min(w - 1);
        let y = ((v * h as f64) as u32).min(h - 1);
        Some(*self.image.get_pixel(x, y))
    }

    /// Mip levels for upload, largest first, each half the size of the one
    /// before down to 1×1. Images wider or taller than `max_size` are
    /// scaled down first, keeping their aspect ratio.
    pub fn mip_chain(&self, max_size: u32) -> Vec<RgbaImage> {
        let (w, h) = self.image.dimensions();
        let scale = (max_size as f64 / w.max(h) as f64).min(1.0);
        let mut level = if scale < 1.0 {
            let w = ((w as f64 * scale) as u32).max(1);
            let h = ((h as f64 * scale) as u32).max(1);
            imageops::resize(&self.image, w, h, FilterType::Triangle)
        } else {
            self.image.clone()
        };

        let mut chain = Vec::with_capacity(mip_level_count(level.width(), level.height()) as usize);
        loop {
            let (w, h) = level.dimensions();
            let next = (w > 1 || h > 1)
                .then(|| imageops::resize(&level, (w / 2).max(1), (h / 2).max(1), FilterType::Triangle));
            chain.push(level);
            match next {
                Some(next) => level = next,
                None => break,
            }
        }
        chain
    }
}

/// Mip levels for a `width`×`height` texture, down to 1×1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}
