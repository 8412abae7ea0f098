//! End-to-end tests of the CPU side of the pipeline.
//!
//! These run without a GPU: projection, field lookup, particle advection,
//! budget and trail bookkeeping are exercised the way the app loop drives
//! them each frame.

use std::time::Duration;

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use windvis::field::{GLOBAL_HEIGHT, GLOBAL_WIDTH};
use windvis::particles::PARTICLE_LIFETIME;
use windvis::forecast::FORECAST_HORIZON;
use windvis::trails::reproject;
use windvis::vectors::{glyphs, Graticule, GLYPH_SPACING};
use windvis::{
    field_image, synthetic, BaseMap, Coord, CursorInfo, DataField, FieldError, ForecastPlayer,
    ForecastSet, ParticleBudget, ParticleSet, ScreenPoint, TrailRing, VectorField, Viewport,
    WindConfig,
};

// ============================================================================
// Projection
// ============================================================================

#[test]
fn test_center_projects_to_canvas_center() {
    let viewport = Viewport::new(500, 500);
    let p = viewport.transform_coord(Coord::new(180.0, 0.0));
    assert_relative_eq!(p.x, 250.0, epsilon = 1e-9);
    assert_relative_eq!(p.y, 250.0, epsilon = 1e-9);
}

#[test]
fn test_round_trip_across_viewports() {
    let viewports = [
        Viewport::new(500, 500),
        Viewport::new(1920, 1080).with_zoom(3.0),
        Viewport::new(600, 1200)
            .with_zoom(7.5)
            .with_center(Coord::new(20.0, 40.0)),
    ];
    for viewport in viewports {
        for lon in [-170.0, 0.0, 45.5, 180.0, 359.0] {
            for lat in [-89.0, -30.0, 0.0, 12.25, 89.0] {
                let back = viewport.transform_point(viewport.transform_coord(Coord::new(lon, lat)));
                assert_relative_eq!(back.lon, lon, epsilon = 1e-6, max_relative = 1e-6);
                assert_relative_eq!(back.lat, lat, epsilon = 1e-6, max_relative = 1e-6);
            }
        }
    }
}

#[test]
fn test_center_lat_bounds_contain_equator() {
    let mut last = (0.0, 0.0);
    for zoom in [1.0, 1.5, 2.0, 4.0, 8.0, 16.0] {
        let viewport = Viewport::new(800, 600).with_zoom(zoom);
        let (min, max) = (viewport.min_center_lat(), viewport.max_center_lat());
        assert!(min <= 0.0 && 0.0 <= max);
        assert!(min <= last.0 && max >= last.1);
        last = (min, max);
    }
}

// ============================================================================
// Fields
// ============================================================================

#[test]
fn test_regional_field_rejects_outside_lookup() {
    // 11 columns by 11 rows at 1 degree
    let data = vec![1.0; 11 * 11];
    let field = DataField::new(data, 0.0, 10.0, -5.0, 5.0, 1.0).unwrap();
    assert!(field.get_value(3.0, 0.0).is_ok());
    assert!(matches!(
        field.get_value(3.0, -6.0),
        Err(FieldError::OutOfBounds { .. })
    ));
}

#[test]
fn test_global_field_wraps_longitude() {
    let field = synthetic::global_field(0).unwrap();
    for lat in [-90.0, -45.5, 0.0, 33.0, 90.0] {
        assert_eq!(field.sample(360.0, lat).unwrap(), field.sample(0.0, lat).unwrap());
    }
}

#[test]
fn test_forecast_keeps_fields_apart() {
    let mut forecast = ForecastSet::new();
    forecast.insert_field(0, synthetic::global_field(0).unwrap()).unwrap();
    let err = forecast
        .insert_field(FORECAST_HORIZON, synthetic::global_field(9).unwrap())
        .unwrap_err();
    assert!(matches!(err, FieldError::TauOutOfRange { tau: 180, .. }));
    assert_eq!(forecast.len(), 1);
    assert_eq!(*forecast.get(0).unwrap(), synthetic::global_field(0).unwrap());
}

// ============================================================================
// Frame loop
// ============================================================================

#[test]
fn test_particles_stay_on_globe_over_many_frames() {
    let forecast = synthetic::forecast(4, 3).unwrap();
    let mut player = ForecastPlayer::new(0, 3, 500.0);
    let mut rng = StdRng::seed_from_u64(11);
    let mut particles = ParticleSet::new(2_000, PARTICLE_LIFETIME, &mut rng);

    let mut seen_taus = vec![0];
    for _ in 0..300 {
        if let Some(tau) = player.advance(&forecast, 16.0) {
            seen_taus.push(tau);
        }
        let field = forecast.get(player.current()).unwrap();
        particles.advect(&field, 16.0, &mut rng).unwrap();
    }

    assert!(seen_taus.len() > 4, "player should wrap through the forecast");
    for (lon, lat) in particles.positions() {
        assert!((0.0..360.0).contains(&lon), "lon {lon}");
        assert!((-90.0..=90.0).contains(&lat), "lat {lat}");
    }
    assert!(particles.age().iter().all(|&a| (0.0..PARTICLE_LIFETIME).contains(&a)));
}

#[test]
fn test_paused_frames_do_not_move_particles() {
    let field = synthetic::global_field(0).unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    let mut particles = ParticleSet::new(100, PARTICLE_LIFETIME, &mut rng);
    let before = particles.clone();
    particles.advect(&field, 0.0, &mut rng).unwrap();
    assert_eq!(particles, before);
}

#[test]
fn test_budget_halves_then_recovers() {
    let config = WindConfig::default();
    let mut budget = config.budget();
    let start = budget.count();

    let mut changes = Vec::new();
    for i in 0..=50 {
        let now = Duration::from_millis(i * 100);
        if let Some(n) = budget.observe(now, 20.0) {
            changes.push(n);
        }
    }
    assert_eq!(changes, vec![start / 2]);

    for i in 51..=101 {
        let now = Duration::from_millis(i * 100);
        if let Some(n) = budget.observe(now, 60.0) {
            changes.push(n);
        }
    }
    assert_eq!(changes, vec![start / 2, start]);
}

#[test]
fn test_budget_respects_floor() {
    let mut budget = ParticleBudget::new(1_500, 1_000, 10_000);
    for i in 0..=200 {
        budget.observe(Duration::from_millis(i * 100), 5.0);
    }
    assert_eq!(budget.count(), 1_000);
}

#[test]
fn test_draw_count_is_density_bounded() {
    let config = WindConfig::default();
    let viewport = Viewport::new(1280, 720);
    let drawn = config.draw_count(viewport.width as u32, viewport.height as u32, 50_000);
    assert_eq!(drawn, 9_216);
}

// ============================================================================
// Trails
// ============================================================================

#[test]
fn test_trail_follows_map_after_pan() {
    let mut viewport = Viewport::new(800, 400).with_zoom(2.0);
    let mut ring = TrailRing::new(3, viewport, |_| Vec::<ScreenPoint>::new());

    // Capture a particle at a known location
    let location = Coord::new(190.0, 10.0);
    let slot = ring.advance(viewport);
    ring.slot_mut(slot).payload.push(viewport.transform_coord(location));

    viewport.pan_by_pixels(-120.0, 35.0);
    viewport.zoom_by(1.0, 1.0, 16.0);
    ring.advance(viewport);

    let captured = ring.slot(slot);
    let moved = reproject(&captured.viewport, &viewport, captured.payload[0]);
    let expected = viewport.project_wrapped(location);
    assert_relative_eq!(moved.x, expected.x, epsilon = 1e-6);
    assert_relative_eq!(moved.y, expected.y, epsilon = 1e-6);

    let alphas: Vec<f32> = ring.iter_oldest_first().map(|(_, _, a)| a).collect();
    assert_eq!(alphas.len(), 3);
    assert_relative_eq!(alphas[2], 1.0);
    assert!(alphas[0] < alphas[1] && alphas[1] < alphas[2]);
}

// ============================================================================
// Map layers
// ============================================================================

#[test]
fn test_arrows_follow_the_map() {
    let field = synthetic::global_field(0).unwrap();
    let arrows = glyphs(&field, GLYPH_SPACING);
    let viewport = Viewport::new(1000, 500)
        .with_zoom(4.0)
        .with_center(Coord::new(100.0, 45.0));

    // The arrow anchored at (100E, 45N) sits at the canvas center
    let arrow = arrows
        .iter()
        .find(|g| g.lon == 100.0 && g.lat == 45.0)
        .unwrap();
    let anchor = viewport.project_wrapped(Coord::new(arrow.lon as f64, arrow.lat as f64));
    assert_relative_eq!(anchor.x, 500.0, epsilon = 1e-9);
    assert_relative_eq!(anchor.y, 250.0, epsilon = 1e-9);

    // The jet blows east, so the shaft runs left to right through the anchor
    let [shaft, ..] = arrow.segments(anchor);
    assert!(arrow.u > 0.0);
    assert!(shaft.0.x < anchor.x && shaft.1.x > anchor.x);
}

#[test]
fn test_graticule_parallels_track_pan() {
    let grid = Graticule::default();
    let mut viewport = Viewport::new(800, 400).with_zoom(2.0);
    let equator = 72 + 18;
    let (before, _) = grid.line(&viewport, equator).unwrap();
    viewport.pan_by_pixels(0.0, 40.0);
    let (after, _) = grid.line(&viewport, equator).unwrap();
    assert_relative_eq!(after.y - before.y, 40.0, epsilon = 1e-6);
}

#[test]
fn test_base_map_under_canvas_center() {
    let map = BaseMap::graticule(720, 360, 30.0);
    let viewport = Viewport::new(600, 300).with_center(Coord::new(45.0, -30.0));
    let center = viewport.transform_point(ScreenPoint::new(300.0, 150.0));
    let (u, v) = map.uv(center).unwrap();
    assert_relative_eq!(u, 45.0 / 360.0, epsilon = 1e-9);
    assert_relative_eq!(v, 120.0 / 180.0, epsilon = 1e-9);
}

// ============================================================================
// Cursor and field images
// ============================================================================

#[test]
fn test_cursor_reads_jet() {
    let field = synthetic::global_field(0).unwrap();
    let viewport = Viewport::new(720, 360);
    let point = viewport.transform_coord(Coord::new(100.0, 45.0));
    let info = CursorInfo::query(&viewport, &field, point).unwrap();
    assert_relative_eq!(info.lat, 45.0, epsilon = 1e-6);
    assert!(info.speed().unwrap() > 10.0);
    assert!(info.to_string().starts_with("45N 100E"));
}

#[test]
fn test_field_image_file_round_trip() {
    let field = synthetic::global_field(3).unwrap();
    let max = 40.0;
    let path = std::env::temp_dir().join(format!("windvis-field-{}.png", std::process::id()));
    field_image::save(&field, max, &path).unwrap();
    let loaded: VectorField = field_image::load(&path, max).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.width(), GLOBAL_WIDTH);
    assert_eq!(loaded.height(), GLOBAL_HEIGHT);
    let (u0, v0) = field.sample(200.0, -20.0).unwrap();
    let (u1, v1) = loaded.sample(200.0, -20.0).unwrap();
    assert!((u0 - u1).abs() <= max / 127.5);
    assert!((v0 - v1).abs() <= max / 127.5);
}
