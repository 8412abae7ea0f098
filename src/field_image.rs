//! Wind fields stored as PNG images.
//!
//! A global field is written as a 360×181 RGBA image with north at the top:
//! red carries `u`, green carries `v`, each mapped from `[-max, max]` onto
//! `0..=255` as `127.5 * (value / max + 1)`. The scale `max` is not stored in
//! the image and must be supplied when decoding.

use std::path::Path;

use image::{Rgba, RgbaImage};
use tracing::info;

use crate::error::{FieldError, VisError};
use crate::field::{VectorField, GLOBAL_HEIGHT, GLOBAL_WIDTH};

fn encode_component(value: f32, max: f32) -> u8 {
    (127.5 * (value / max + 1.0)).round().clamp(0.0, 255.0) as u8
}

fn decode_component(byte: u8, max: f32) -> f32 {
    (byte as f32 / 127.5 - 1.0) * max
}

/// Encode a global field. Components beyond `±max` saturate.
pub fn encode(field: &VectorField, max: f32) -> Result<RgbaImage, FieldError> {
    if !field.is_global() {
        return Err(FieldError::InvalidBounds);
    }
    let height = field.height();
    let u = field.u_field().data();
    let v = field.v_field().data();
    let image = RgbaImage::from_fn(field.width() as u32, height as u32, |x, row| {
        let y = height - 1 - row as usize;
        let i = x as usize * height + y;
        Rgba([encode_component(u[i], max), encode_component(v[i], max), 0, 255])
    });
    Ok(image)
}

/// Decode an image written by [`encode`].
pub fn decode(image: &RgbaImage, max: f32) -> Result<VectorField, FieldError> {
    let (width, height) = (image.width() as usize, image.height() as usize);
    if width != GLOBAL_WIDTH || height != GLOBAL_HEIGHT {
        return Err(FieldError::SizeMismatch {
            expected: GLOBAL_WIDTH * GLOBAL_HEIGHT,
            actual: width * height,
        });
    }
    let mut u = Vec::with_capacity(width * height);
    let mut v = Vec::with_capacity(width * height);
    for x in 0..width {
        for y in 0..height {
            let pixel = image.get_pixel(x as u32, (height - 1 - y) as u32);
            u.push(decode_component(pixel[0], max));
            v.push(decode_component(pixel[1], max));
        }
    }
    VectorField::global(u, v)
}

/// Read a field from a PNG file.
pub fn load(path: impl AsRef<Path>, max: f32) -> Result<VectorField, VisError> {
    let path = path.as_ref();
    let image = image::open(path)?.to_rgba8();
    let field = decode(&image, max)?;
    info!(path = %path.display(), max_speed = field.max_speed(), "loaded wind field");
    Ok(field)
}

/// Write a field to a PNG file.
pub fn save(field: &VectorField, max: f32, path: impl AsRef<Path>) -> Result<(), VisError> {
    encode(field, max)?.save(path.as_ref())?;
    Ok(())
}
