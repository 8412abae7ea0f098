//! CPU particle state and the advection step.
//!
//! [`ParticleSet`] stores particles as parallel `lon`/`lat`/`age` arrays.
//! [`ParticleSet::advect`] is the reference implementation of the per-frame
//! update; the compute shader in `gpu/advect.wgsl` performs the same steps.
//!
//! # Update rules
//!
//! For every particle, with elapsed time `dt` in milliseconds:
//!
//! | Condition | Action |
//! |-----------|--------|
//! | `age + dt >= lifetime` | respawn uniformly on the globe |
//! | `lat` outside ±90 | sample at the pole, reflect across it, shift lon by 180° |
//! | otherwise | `lon += u·dt/1000` (mod 360), `lat += v·dt/1000` |
//!
//! Age then becomes `(age + dt) % lifetime`, so respawned particles keep
//! their phase and the population never respawns in lockstep. A step that
//! carries a particle over a pole is folded back onto the globe on the far
//! meridian.

use rand::Rng;

use crate::error::FieldError;
use crate::field::VectorField;

/// Default particle lifetime in milliseconds.
pub const PARTICLE_LIFETIME: f32 = 4000.0;

/// Wrap a longitude into `[0, 360)`.
#[inline]
pub fn wrap_lon(lon: f32) -> f32 {
    let wrapped = lon.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Fold a latitude that has run past a pole back onto `[-90, 90]`.
///
/// Returns the folded latitude and whether the particle ended up on the
/// opposite meridian (an odd number of pole crossings).
#[inline]
pub fn fold_lat(lat: f32) -> (f32, bool) {
    if (-90.0..=90.0).contains(&lat) {
        return (lat, false);
    }
    let m = (lat + 90.0).rem_euclid(360.0);
    if m > 180.0 {
        (270.0 - m, true)
    } else {
        (m - 90.0, false)
    }
}

/// Random position on the globe: lon in `[0, 360)`, lat in `[-90, 90)`.
pub fn random_position<R: Rng + ?Sized>(rng: &mut R) -> (f32, f32) {
    (rng.gen_range(0.0..360.0), rng.gen_range(-90.0..90.0))
}

/// Simulated particles as parallel arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSet {
    lon: Vec<f32>,
    lat: Vec<f32>,
    age: Vec<f32>,
    lifetime: f32,
}

impl ParticleSet {
    /// Create `count` particles at random positions with random ages, so
    /// respawns are spread evenly over time.
    pub fn new<R: Rng + ?Sized>(count: usize, lifetime: f32, rng: &mut R) -> Self {
        let mut set = Self {
            lon: Vec::with_capacity(count),
            lat: Vec::with_capacity(count),
            age: Vec::with_capacity(count),
            lifetime,
        };
        set.resize(count, rng);
        set
    }

    /// Build from explicit arrays.
    ///
    /// Fails with [`FieldError::SizeMismatch`] unless `lat` and `age` have
    /// as many entries as `lon`.
    pub fn from_parts(
        lon: Vec<f32>,
        lat: Vec<f32>,
        age: Vec<f32>,
        lifetime: f32,
    ) -> Result<Self, FieldError> {
        let expected = lon.len();
        for actual in [lat.len(), age.len()] {
            if actual != expected {
                return Err(FieldError::SizeMismatch { expected, actual });
            }
        }
        Ok(Self { lon, lat, age, lifetime })
    }

    pub fn len(&self) -> usize {
        self.lon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lon.is_empty()
    }

    pub fn lifetime(&self) -> f32 {
        self.lifetime
    }

    pub fn lon(&self) -> &[f32] {
        &self.lon
    }

    pub fn lat(&self) -> &[f32] {
        &self.lat
    }

    pub fn age(&self) -> &[f32] {
        &self.age
    }

    /// `(lon, lat)` pairs.
    pub fn positions(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.lon.iter().copied().zip(self.lat.iter().copied())
    }

    /// Change the particle count. Existing particles keep their state;
    /// new ones get random positions and ages.
    pub fn resize<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) {
        self.lon.truncate(count);
        self.lat.truncate(count);
        self.age.truncate(count);
        while self.lon.len() < count {
            let (lon, lat) = random_position(rng);
            self.lon.push(lon);
            self.lat.push(lat);
            self.age.push(rng.gen_range(0.0..self.lifetime));
        }
    }

    /// Move every particle to a fresh random position and age.
    pub fn scatter<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for i in 0..self.len() {
            let (lon, lat) = random_position(rng);
            self.lon[i] = lon;
            self.lat[i] = lat;
            self.age[i] = rng.gen_range(0.0..self.lifetime);
        }
    }

    /// Advance all particles by `dt_ms` through `field`.
    ///
    /// The field must cover the globe; lookups outside it fail with
    /// [`FieldError::OutOfBounds`] rather than being clamped.
    pub fn advect<R: Rng + ?Sized>(
        &mut self,
        field: &VectorField,
        dt_ms: f32,
        rng: &mut R,
    ) -> Result<(), FieldError> {
        let step = dt_ms / 1000.0;
        for i in 0..self.len() {
            let age = self.age[i] + dt_ms;
            if age >= self.lifetime {
                let (lon, lat) = random_position(rng);
                self.lon[i] = lon;
                self.lat[i] = lat;
            } else {
                let (lon, lat) = advect_one(field, self.lon[i], self.lat[i], step)?;
                self.lon[i] = lon;
                self.lat[i] = lat;
            }
            self.age[i] = age % self.lifetime;
        }
        Ok(())
    }
}

/// Advance a single live particle by `step` seconds.
pub fn advect_one(
    field: &VectorField,
    lon: f32,
    lat: f32,
    step: f32,
) -> Result<(f32, f32), FieldError> {
    let lon = wrap_lon(lon);
    let (lon, lat) = if lat > 90.0 || lat < -90.0 {
        // Overshot a pole on a previous step: sample at the pole and continue
        // down the far side.
        let pole = 90.0_f32.copysign(lat);
        let (u, v) = field.sample(lon, pole)?;
        (lon + 180.0 + u * step, 2.0 * pole - lat - v * step)
    } else {
        let (u, v) = field.sample(lon, lat)?;
        (lon + u * step, lat + v * step)
    };

    let (lat, crossed) = fold_lat(lat);
    let lon = if crossed { lon + 180.0 } else { lon };
    Ok((wrap_lon(lon), lat))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{GLOBAL_HEIGHT, GLOBAL_WIDTH};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn uniform_field(u: f32, v: f32) -> VectorField {
        let n = GLOBAL_WIDTH * GLOBAL_HEIGHT;
        VectorField::global(vec![u; n], vec![v; n]).unwrap()
    }

    fn single(lon: f32, lat: f32, age: f32) -> ParticleSet {
        ParticleSet::from_parts(vec![lon], vec![lat], vec![age], PARTICLE_LIFETIME).unwrap()
    }

    #[test]
    fn test_from_parts_rejects_ragged_arrays() {
        let err =
            ParticleSet::from_parts(vec![1.0, 2.0], vec![0.0], vec![0.0, 0.0], PARTICLE_LIFETIME)
                .unwrap_err();
        assert_eq!(err, FieldError::SizeMismatch { expected: 2, actual: 1 });

        let err =
            ParticleSet::from_parts(vec![1.0], vec![0.0], vec![], PARTICLE_LIFETIME).unwrap_err();
        assert_eq!(err, FieldError::SizeMismatch { expected: 1, actual: 0 });
    }

    // ========== Lifecycle Tests ==========

    #[test]
    fn test_new_particles_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let set = ParticleSet::new(10_000, PARTICLE_LIFETIME, &mut rng);
        assert_eq!(set.len(), 10_000);
        for ((lon, lat), age) in set.positions().zip(set.age()) {
            assert!((0.0..360.0).contains(&lon));
            assert!((-90.0..90.0).contains(&lat));
            assert!((0.0..PARTICLE_LIFETIME).contains(age));
        }
    }

    #[test]
    fn test_ages_are_staggered() {
        let mut rng = StdRng::seed_from_u64(1);
        let set = ParticleSet::new(1000, PARTICLE_LIFETIME, &mut rng);
        let young = set.age().iter().filter(|a| **a < PARTICLE_LIFETIME / 2.0).count();
        assert!(young > 300 && young < 700);
    }

    #[test]
    fn test_expired_particle_respawns_with_wrapped_age() {
        let mut rng = StdRng::seed_from_u64(3);
        let field = uniform_field(0.0, 0.0);
        let mut set = single(10.0, 10.0, 3999.0);
        set.advect(&field, 2.0, &mut rng).unwrap();
        assert_relative_eq!(set.age()[0], 1.0);
        // Position is redrawn; the chance of landing on the old spot is nil
        assert!(set.lon()[0] != 10.0 || set.lat()[0] != 10.0);
    }

    #[test]
    fn test_alive_particle_advects() {
        let mut rng = StdRng::seed_from_u64(3);
        let field = uniform_field(10.0, -4.0);
        let mut set = single(100.0, 20.0, 100.0);
        set.advect(&field, 50.0, &mut rng).unwrap();
        assert_relative_eq!(set.age()[0], 150.0);
        assert_relative_eq!(set.lon()[0], 100.5, epsilon = 1e-4);
        assert_relative_eq!(set.lat()[0], 19.8, epsilon = 1e-4);
    }

    #[test]
    fn test_lon_wraps_east() {
        let mut rng = StdRng::seed_from_u64(3);
        let field = uniform_field(20.0, 0.0);
        let mut set = single(359.0, 0.0, 0.0);
        set.advect(&field, 100.0, &mut rng).unwrap();
        assert_relative_eq!(set.lon()[0], 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_zero_dt_is_identity() {
        let mut rng = StdRng::seed_from_u64(11);
        let field = uniform_field(5.0, 5.0);
        let mut set = ParticleSet::new(100, PARTICLE_LIFETIME, &mut rng);
        let before = set.clone();
        set.advect(&field, 0.0, &mut rng).unwrap();
        assert_eq!(set, before);
    }

    // ========== Polar Tests ==========

    #[test]
    fn test_step_over_north_pole_reflects() {
        let mut rng = StdRng::seed_from_u64(3);
        let field = uniform_field(0.0, 2.0);
        let mut set = single(10.0, 89.0, 0.0);
        // 89 + 2 = 91 folds back to 89 on the opposite meridian
        set.advect(&field, 1000.0, &mut rng).unwrap();
        assert_relative_eq!(set.lat()[0], 89.0);
        assert_relative_eq!(set.lon()[0], 190.0);
    }

    #[test]
    fn test_step_over_south_pole_reflects() {
        let mut rng = StdRng::seed_from_u64(3);
        let field = uniform_field(0.0, -3.0);
        let mut set = single(300.0, -88.0, 0.0);
        set.advect(&field, 1000.0, &mut rng).unwrap();
        assert_relative_eq!(set.lat()[0], -89.0);
        assert_relative_eq!(set.lon()[0], 120.0);
    }

    #[test]
    fn test_overshot_particle_samples_pole() {
        let mut rng = StdRng::seed_from_u64(3);
        let field = uniform_field(4.0, 1.0);
        let mut set = single(0.0, 91.0, 0.0);
        set.advect(&field, 1000.0, &mut rng).unwrap();
        // lat = 2*90 - 91 - 1, lon = 0 + 180 + 4
        assert_relative_eq!(set.lat()[0], 88.0);
        assert_relative_eq!(set.lon()[0], 184.0);
    }

    #[test]
    fn test_fold_lat() {
        assert_eq!(fold_lat(45.0), (45.0, false));
        assert_eq!(fold_lat(91.0), (89.0, true));
        assert_eq!(fold_lat(-91.0), (-89.0, true));
        assert_eq!(fold_lat(271.0), (-89.0, false));
    }

    #[test]
    fn test_fast_particles_stay_on_globe() {
        let mut rng = StdRng::seed_from_u64(5);
        let field = uniform_field(300.0, 700.0);
        let mut set = ParticleSet::new(500, PARTICLE_LIFETIME, &mut rng);
        for _ in 0..20 {
            set.advect(&field, 33.0, &mut rng).unwrap();
            for (lon, lat) in set.positions() {
                assert!((0.0..360.0).contains(&lon));
                assert!((-90.0..=90.0).contains(&lat));
            }
        }
    }

    // ========== Resize Tests ==========

    #[test]
    fn test_resize_keeps_survivors() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut set = ParticleSet::new(100, PARTICLE_LIFETIME, &mut rng);
        let first: Vec<_> = set.positions().take(50).collect();

        set.resize(50, &mut rng);
        assert_eq!(set.len(), 50);
        assert_eq!(set.positions().collect::<Vec<_>>(), first);

        set.resize(200, &mut rng);
        assert_eq!(set.len(), 200);
        assert_eq!(set.positions().take(50).collect::<Vec<_>>(), first);
    }

    #[test]
    fn test_scatter_keeps_count() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut set = ParticleSet::new(64, PARTICLE_LIFETIME, &mut rng);
        let before = set.clone();
        set.scatter(&mut rng);
        assert_eq!(set.len(), 64);
        assert_ne!(set, before);
    }
}
