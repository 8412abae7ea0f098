//! Animate a wind field image, or synthetic winds when none is given.
//!
//! Usage: `windvis [--map world.png] [field.png [max_speed]]`

use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use windvis::{field_image, synthetic, BaseMap, ForecastSet, VisError, Visualization, WindConfig};

/// Scale used for field images when no max speed is given.
const DEFAULT_IMAGE_MAX: f32 = 40.0;

#[derive(Debug, Default)]
struct Args {
    map: Option<String>,
    field: Option<String>,
    max_speed: Option<String>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args, VisError> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--map" {
            let path = args
                .next()
                .ok_or_else(|| VisError::Config("--map needs an image path".into()))?;
            parsed.map = Some(path);
        } else if parsed.field.is_none() {
            parsed.field = Some(arg);
        } else if parsed.max_speed.is_none() {
            parsed.max_speed = Some(arg);
        } else {
            return Err(VisError::Config(format!("unexpected argument {:?}", arg)));
        }
    }
    Ok(parsed)
}

fn load_forecast(args: &Args) -> Result<ForecastSet, VisError> {
    match &args.field {
        Some(path) => {
            let max = match &args.max_speed {
                Some(arg) => arg
                    .parse::<f32>()
                    .map_err(|e| VisError::Config(format!("invalid max speed {:?}: {}", arg, e)))?,
                None => DEFAULT_IMAGE_MAX,
            };
            let field = field_image::load(path, max)?;
            let mut forecast = ForecastSet::new().with_cycle(path.clone());
            forecast.insert_field(0, field)?;
            Ok(forecast)
        }
        None => {
            info!("no field image given, animating synthetic winds");
            Ok(synthetic::forecast(20, 3)?)
        }
    }
}

fn load_base_map(args: &Args) -> Result<BaseMap, VisError> {
    match &args.map {
        Some(path) => BaseMap::load(path),
        None => Ok(BaseMap::graticule(1440, 720, 30.0)),
    }
}

fn run() -> Result<(), VisError> {
    let args = parse_args(std::env::args().skip(1))?;
    let forecast = load_forecast(&args)?;
    let base_map = load_base_map(&args)?;
    Visualization::new(forecast)
        .with_config(WindConfig::default())
        .with_base_map(base_map)
        .on_surface_unavailable(|e| error!("rendering surface unavailable: {}", e))
        .run()
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "windvis=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
