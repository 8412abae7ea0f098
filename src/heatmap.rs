//! Wind speed heatmap data.
//!
//! The speed layer is a square `R8` texture of normalized wind speed,
//! color-mapped on the GPU with a polynomial fit of viridis. This module
//! builds the texture bytes and holds the colormap coefficients shared with
//! `shaders/speed.wgsl`.

use crate::field::VectorField;

/// Edge length of the speed texture.
pub const HEATMAP_SIZE: usize = 512;

/// Viridis polynomial coefficients, lowest order first.
pub const VIRIDIS: [[f32; 3]; 7] = [
    [0.277_727_32, 0.005_407_344_5, 0.334_099_8],
    [0.105_093_04, 1.404_613_5, 1.384_590_2],
    [-0.330_861_83, 0.214_847_56, 0.095_095_16],
    [-4.634_230_5, -5.799_101, -19.332_441],
    [6.228_27, 14.179_933, 56.690_553],
    [4.776_385, -13.745_145, -65.353_03],
    [-5.435_456, 4.645_852_6, 26.312_435],
];

/// Map `t` in `[0, 1]` to an RGB color. Inputs outside the range are clamped.
pub fn viridis(t: f32) -> [f32; 3] {
    let t = t.clamp(0.0, 1.0);
    let mut rgb = [0.0; 3];
    for (channel, out) in rgb.iter_mut().enumerate() {
        // Horner evaluation from the highest order term down
        *out = VIRIDIS
            .iter()
            .rev()
            .fold(0.0, |acc, c| acc * t + c[channel]);
    }
    rgb
}

/// Resample wind speed onto a `size`×`size` texture normalized by
/// `max_speed`.
///
/// Texel `(x, y)` reads grid column `floor(x * width / size)` and row
/// `floor(y * height / size)`, so row 0 is the southernmost latitude. Values
/// are scaled so `max_speed` maps to 255 and saturate outside `0..=255`.
pub fn speed_texture(field: &VectorField, max_speed: f32, size: usize) -> Vec<u8> {
    let speeds = field.speeds();
    let width = field.width();
    let height = field.height();
    let mut out = vec![0u8; size * size];
    if max_speed <= 0.0 || size == 0 {
        return out;
    }

    let scale = max_speed / 255.0;
    for x in 0..size {
        let column = x * width / size;
        for y in 0..size {
            let row = y * height / size;
            // Float to int casts saturate, and NaN becomes 0
            out[size * y + x] = (speeds[height * column + row] / scale) as u8;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{GLOBAL_HEIGHT, GLOBAL_WIDTH};
    use approx::assert_relative_eq;

    fn field_from(speed_at: impl Fn(usize, usize) -> f32) -> VectorField {
        let mut u = Vec::with_capacity(GLOBAL_WIDTH * GLOBAL_HEIGHT);
        for x in 0..GLOBAL_WIDTH {
            for y in 0..GLOBAL_HEIGHT {
                u.push(speed_at(x, y));
            }
        }
        let v = vec![0.0; u.len()];
        VectorField::global(u, v).unwrap()
    }

    // ========== Colormap Tests ==========

    #[test]
    fn test_viridis_endpoints() {
        let low = viridis(0.0);
        assert_relative_eq!(low[0], 0.2777, epsilon = 1e-3);
        assert_relative_eq!(low[1], 0.0054, epsilon = 1e-3);
        assert_relative_eq!(low[2], 0.3341, epsilon = 1e-3);

        let high = viridis(1.0);
        assert_relative_eq!(high[0], 0.987, epsilon = 5e-3);
        assert_relative_eq!(high[1], 0.906, epsilon = 5e-3);
        assert_relative_eq!(high[2], 0.131, epsilon = 5e-3);
    }

    #[test]
    fn test_viridis_clamps_input() {
        assert_eq!(viridis(-1.0), viridis(0.0));
        assert_eq!(viridis(2.0), viridis(1.0));
    }

    #[test]
    fn test_viridis_green_increases() {
        let mut prev = viridis(0.0)[1];
        for i in 1..=20 {
            let g = viridis(i as f32 / 20.0)[1];
            assert!(g > prev);
            prev = g;
        }
    }

    // ========== Speed Texture Tests ==========

    #[test]
    fn test_speed_texture_normalizes() {
        let field = field_from(|_, _| 10.0);
        let texture = speed_texture(&field, 20.0, 64);
        assert_eq!(texture.len(), 64 * 64);
        assert!(texture.iter().all(|&b| b == 127));
    }

    #[test]
    fn test_speed_texture_saturates() {
        let field = field_from(|_, _| 50.0);
        let texture = speed_texture(&field, 20.0, 16);
        assert!(texture.iter().all(|&b| b == 255));
    }

    #[test]
    fn test_speed_texture_index_remap() {
        // Speed encodes the grid row; the first texel row reads the south pole
        let field = field_from(|_, y| y as f32);
        let texture = speed_texture(&field, 255.0, HEATMAP_SIZE);
        assert_eq!(texture[0], 0);
        let last_row = HEATMAP_SIZE - 1;
        let expected = (last_row * GLOBAL_HEIGHT / HEATMAP_SIZE) as u8;
        assert_eq!(texture[HEATMAP_SIZE * last_row + 17], expected);
        assert_eq!(expected, 180);
    }

    #[test]
    fn test_speed_texture_columns_follow_longitude() {
        let field = field_from(|x, _| if x >= 180 { 255.0 } else { 0.0 });
        let texture = speed_texture(&field, 255.0, HEATMAP_SIZE);
        assert_eq!(texture[HEATMAP_SIZE * 10 + 255], 0);
        assert_eq!(texture[HEATMAP_SIZE * 10 + 256], 255);
    }

    #[test]
    fn test_zero_max_speed() {
        let field = field_from(|_, _| 1.0);
        assert!(speed_texture(&field, 0.0, 8).iter().all(|&b| b == 0));
    }
}
