//! Analytic wind fields for demos, tests and benchmarks.
//!
//! Produces smooth, global, time-varying winds: westerly jets in both
//! mid-latitudes, easterly trades near the equator, and a train of vortices
//! drifting east as the forecast hour advances. Deterministic, so tests can
//! rely on exact values.

use crate::error::FieldError;
use crate::field::{VectorField, GLOBAL_HEIGHT, GLOBAL_WIDTH};
use crate::forecast::ForecastSet;

const JET_SPEED: f32 = 28.0;
const JET_LAT: f32 = 45.0;
const JET_WIDTH: f32 = 12.0;
const TRADE_SPEED: f32 = 7.0;
const VORTEX_COUNT: usize = 6;
const VORTEX_SPEED: f32 = 18.0;
const VORTEX_RADIUS: f32 = 9.0;
/// Eastward vortex drift in degrees per forecast hour.
const VORTEX_DRIFT: f32 = 1.5;

/// Wind at a point for forecast hour `tau`.
pub fn wind_at(lon: f32, lat: f32, tau: u32) -> (f32, f32) {
    let jet = |center: f32| (-((lat - center) / JET_WIDTH).powi(2)).exp();
    let coslat = lat.to_radians().cos();
    let mut u = JET_SPEED * (jet(JET_LAT) + jet(-JET_LAT)) - TRADE_SPEED * coslat.powi(8);
    let mut v = 0.0;

    for k in 0..VORTEX_COUNT {
        let center_lon = (k as f32 * 360.0 / VORTEX_COUNT as f32 + VORTEX_DRIFT * tau as f32) % 360.0;
        let center_lat = if k % 2 == 0 { 35.0 } else { -35.0 };
        // Signed longitude offset on the short way round
        let dlon = (lon - center_lon + 540.0) % 360.0 - 180.0;
        let dx = dlon * coslat;
        let dy = lat - center_lat;
        let falloff = (-(dx * dx + dy * dy) / (VORTEX_RADIUS * VORTEX_RADIUS)).exp();
        // Cyclonic in each hemisphere
        let spin = if center_lat > 0.0 { 1.0 } else { -1.0 };
        let scale = spin * VORTEX_SPEED * falloff / VORTEX_RADIUS;
        u -= dy * scale;
        v += dx * scale;
    }
    (u, v)
}

/// Global 1° field for forecast hour `tau`.
pub fn global_field(tau: u32) -> Result<VectorField, FieldError> {
    let n = GLOBAL_WIDTH * GLOBAL_HEIGHT;
    let mut u = Vec::with_capacity(n);
    let mut v = Vec::with_capacity(n);
    for x in 0..GLOBAL_WIDTH {
        for y in 0..GLOBAL_HEIGHT {
            let (wu, wv) = wind_at(x as f32, y as f32 - 90.0, tau);
            u.push(wu);
            v.push(wv);
        }
    }
    VectorField::global(u, v)
}

/// A forecast of `steps` fields, `tau_step` hours apart, starting at tau 0.
pub fn forecast(steps: u32, tau_step: u32) -> Result<ForecastSet, FieldError> {
    let mut set = ForecastSet::new().with_cycle("synthetic");
    for i in 0..steps {
        let tau = i * tau_step;
        set.insert_field(tau, global_field(tau)?)?;
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_is_global_and_finite() {
        let field = global_field(0).unwrap();
        assert!(field.is_global());
        assert!(field.u_field().data().iter().all(|x| x.is_finite()));
        assert!(field.v_field().data().iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_jets_blow_east() {
        let (u, _) = wind_at(100.0, 45.0, 0);
        assert!(u > 10.0);
        let (u, _) = wind_at(100.0, -45.0, 0);
        assert!(u > 10.0);
    }

    #[test]
    fn test_fields_change_with_tau() {
        assert_ne!(wind_at(20.0, 35.0, 0), wind_at(20.0, 35.0, 12));
    }

    #[test]
    fn test_forecast_steps() {
        let set = forecast(4, 3).unwrap();
        assert_eq!(set.taus().collect::<Vec<_>>(), vec![0, 3, 6, 9]);
        assert!(set.max_speed() > JET_SPEED * 0.5);
    }
}
