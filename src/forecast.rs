//! Forecast wind fields keyed by lead time.
//!
//! A model run ("cycle") produces one global [`VectorField`] per forecast
//! hour (tau). [`ForecastSet`] stores the published snapshots and
//! [`ForecastPlayer`] steps through them over time.
//!
//! Fields are shared as `Arc<VectorField>`: publishing a new tau swaps one
//! pointer, so renderers always read a complete, consistent snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::FieldError;
use crate::field::{VectorField, GLOBAL_HEIGHT, GLOBAL_WIDTH};

/// Forecast horizon in hours; taus wrap at this value.
pub const FORECAST_HORIZON: u32 = 180;

/// All published fields for one model cycle.
#[derive(Debug, Clone, Default)]
pub struct ForecastSet {
    cycle: Option<String>,
    fields: BTreeMap<u32, Arc<VectorField>>,
    max_speed: f32,
}

impl ForecastSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label the model cycle (e.g. `"2018-06-01T00Z"`).
    pub fn with_cycle(mut self, cycle: impl Into<String>) -> Self {
        self.cycle = Some(cycle.into());
        self
    }

    pub fn cycle(&self) -> Option<&str> {
        self.cycle.as_deref()
    }

    /// Add raw global 1° data for `tau`.
    ///
    /// Both arrays must hold 360×181 column-major samples.
    pub fn insert(&mut self, tau: u32, u: Vec<f32>, v: Vec<f32>) -> Result<(), FieldError> {
        let expected = GLOBAL_WIDTH * GLOBAL_HEIGHT;
        for len in [u.len(), v.len()] {
            if len != expected {
                return Err(FieldError::SizeMismatch { expected, actual: len });
            }
        }
        self.insert_field(tau, VectorField::global(u, v)?)
    }

    /// Publish an already built field for `tau`. The field must be global
    /// and `tau` below [`FORECAST_HORIZON`].
    pub fn insert_field(&mut self, tau: u32, field: VectorField) -> Result<(), FieldError> {
        if tau >= FORECAST_HORIZON {
            return Err(FieldError::TauOutOfRange { tau, horizon: FORECAST_HORIZON });
        }
        if !field.is_global() {
            return Err(FieldError::InvalidBounds);
        }
        let speed = field.max_speed();
        if speed > self.max_speed {
            self.max_speed = speed;
        }
        debug!(tau, max_speed = speed, "published forecast field");
        self.fields.insert(tau, Arc::new(field));
        Ok(())
    }

    /// Snapshot for `tau`, if published.
    pub fn get(&self, tau: u32) -> Option<Arc<VectorField>> {
        self.fields.get(&tau).cloned()
    }

    pub fn contains(&self, tau: u32) -> bool {
        self.fields.contains_key(&tau)
    }

    /// Published taus in ascending order.
    pub fn taus(&self) -> impl Iterator<Item = u32> + '_ {
        self.fields.keys().copied()
    }

    pub fn first_tau(&self) -> Option<u32> {
        self.fields.keys().next().copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Largest speed over every published field.
    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Following available tau, stepping by `step` hours and wrapping at the
    /// horizon. `None` when nothing else is published.
    pub fn next_tau(&self, current: u32, step: u32) -> Option<u32> {
        self.walk(current, step, |tau, step| (tau + step) % FORECAST_HORIZON)
    }

    /// Preceding available tau, mirroring [`ForecastSet::next_tau`].
    pub fn prev_tau(&self, current: u32, step: u32) -> Option<u32> {
        self.walk(current, step, |tau, step| {
            (tau + FORECAST_HORIZON - step % FORECAST_HORIZON) % FORECAST_HORIZON
        })
    }

    fn walk(&self, current: u32, step: u32, advance: impl Fn(u32, u32) -> u32) -> Option<u32> {
        if step == 0 {
            return None;
        }
        let mut tau = current;
        for _ in 0..FORECAST_HORIZON {
            tau = advance(tau, step);
            if tau == current {
                return None;
            }
            if self.contains(tau) {
                return Some(tau);
            }
        }
        None
    }
}

/// Steps the displayed tau at a fixed cadence of un-paused time.
#[derive(Debug, Clone)]
pub struct ForecastPlayer {
    current: u32,
    step: u32,
    interval_ms: f32,
    remaining_ms: f32,
}

impl ForecastPlayer {
    /// Start at `tau`, stepping `step` hours every `interval_ms`.
    pub fn new(tau: u32, step: u32, interval_ms: f32) -> Self {
        Self {
            current: tau,
            step,
            interval_ms,
            remaining_ms: interval_ms,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    /// Advance by `dt_ms` of animation time. Returns the new tau when it
    /// changes. A paused clock passes 0 and keeps the remaining interval.
    ///
    /// When the next tau is not published yet the player waits on the
    /// current one and retries every frame.
    pub fn advance(&mut self, forecast: &ForecastSet, dt_ms: f32) -> Option<u32> {
        self.remaining_ms -= dt_ms;
        if self.remaining_ms > 0.0 {
            return None;
        }
        let next = forecast.next_tau(self.current, self.step)?;
        self.remaining_ms = self.interval_ms;
        self.current = next;
        info!(tau = next, "stepping forecast");
        Some(next)
    }

    /// Jump to a neighbouring tau immediately (keyboard stepping).
    pub fn step_by(&mut self, forecast: &ForecastSet, forward: bool) -> Option<u32> {
        let next = if forward {
            forecast.next_tau(self.current, self.step)?
        } else {
            forecast.prev_tau(self.current, self.step)?
        };
        self.current = next;
        self.remaining_ms = self.interval_ms;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(u: f32, v: f32) -> (Vec<f32>, Vec<f32>) {
        let n = GLOBAL_WIDTH * GLOBAL_HEIGHT;
        (vec![u; n], vec![v; n])
    }

    fn forecast_with(taus: &[u32]) -> ForecastSet {
        let mut forecast = ForecastSet::new();
        for &tau in taus {
            let (u, v) = uniform(tau as f32, 0.0);
            forecast.insert(tau, u, v).unwrap();
        }
        forecast
    }

    // ========== ForecastSet Tests ==========

    #[test]
    fn test_insert_validates_size() {
        let mut forecast = ForecastSet::new();
        let err = forecast.insert(0, vec![0.0; 10], vec![0.0; 10]).unwrap_err();
        assert_eq!(
            err,
            FieldError::SizeMismatch { expected: GLOBAL_WIDTH * GLOBAL_HEIGHT, actual: 10 }
        );
        assert!(forecast.is_empty());
    }

    #[test]
    fn test_tau_past_horizon_is_rejected() {
        let mut forecast = forecast_with(&[0]);
        let (u, v) = uniform(9.0, 0.0);
        let err = forecast.insert(FORECAST_HORIZON, u, v).unwrap_err();
        assert_eq!(err, FieldError::TauOutOfRange { tau: 180, horizon: 180 });

        // The existing field is untouched
        assert_eq!(forecast.len(), 1);
        assert!(!forecast.contains(180));
        assert_eq!(forecast.get(0).unwrap().sample(10.0, 10.0).unwrap(), (0.0, 0.0));
    }

    #[test]
    fn test_last_tau_before_horizon() {
        let forecast = forecast_with(&[0, 177]);
        assert_eq!(forecast.get(177).unwrap().sample(0.0, 0.0).unwrap(), (177.0, 0.0));
        assert_eq!(forecast.next_tau(177, 3), Some(0));
    }

    #[test]
    fn test_max_speed_is_running_max() {
        let mut forecast = ForecastSet::new().with_cycle("2018-06-01T00Z");
        let (u, v) = uniform(3.0, 4.0);
        forecast.insert(0, u, v).unwrap();
        let (u, v) = uniform(1.0, 0.0);
        forecast.insert(3, u, v).unwrap();
        assert_eq!(forecast.max_speed(), 5.0);
        assert_eq!(forecast.cycle(), Some("2018-06-01T00Z"));
    }

    #[test]
    fn test_snapshots_survive_replacement() {
        let mut forecast = forecast_with(&[0]);
        let snapshot = forecast.get(0).unwrap();
        let (u, v) = uniform(9.0, 0.0);
        forecast.insert(0, u, v).unwrap();
        assert_eq!(snapshot.sample(10.0, 10.0).unwrap(), (0.0, 0.0));
        assert_eq!(forecast.get(0).unwrap().sample(10.0, 10.0).unwrap(), (9.0, 0.0));
    }

    #[test]
    fn test_next_tau_wraps() {
        let forecast = forecast_with(&[0, 3, 6]);
        assert_eq!(forecast.next_tau(0, 3), Some(3));
        assert_eq!(forecast.next_tau(6, 3), Some(0));
        assert_eq!(forecast.prev_tau(0, 3), Some(6));
    }

    #[test]
    fn test_next_tau_skips_missing() {
        let forecast = forecast_with(&[0, 9]);
        assert_eq!(forecast.next_tau(0, 3), Some(9));
    }

    #[test]
    fn test_next_tau_single_field() {
        let forecast = forecast_with(&[0]);
        assert_eq!(forecast.next_tau(0, 3), None);
    }

    // ========== ForecastPlayer Tests ==========

    #[test]
    fn test_player_steps_on_interval() {
        let forecast = forecast_with(&[0, 3, 6]);
        let mut player = ForecastPlayer::new(0, 3, 500.0);
        assert_eq!(player.advance(&forecast, 300.0), None);
        assert_eq!(player.advance(&forecast, 250.0), Some(3));
        assert_eq!(player.current(), 3);
        assert_eq!(player.advance(&forecast, 499.0), None);
    }

    #[test]
    fn test_player_paused_keeps_remaining() {
        let forecast = forecast_with(&[0, 3]);
        let mut player = ForecastPlayer::new(0, 3, 500.0);
        player.advance(&forecast, 400.0);
        for _ in 0..100 {
            assert_eq!(player.advance(&forecast, 0.0), None);
        }
        assert_eq!(player.advance(&forecast, 100.0), Some(3));
    }

    #[test]
    fn test_player_manual_step() {
        let forecast = forecast_with(&[0, 3, 6]);
        let mut player = ForecastPlayer::new(0, 3, 500.0);
        assert_eq!(player.step_by(&forecast, false), Some(6));
        assert_eq!(player.step_by(&forecast, true), Some(0));
    }
}
