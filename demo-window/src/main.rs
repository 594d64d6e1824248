mod app;
mod assets;
mod gfx;

use app::App;
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ripple_core::{QualityPreset, SimulationConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;
use winit::event_loop::EventLoop;

/// Grid and mesh resolution
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Quality {
    Low,
    Medium,
    High,
}

impl From<Quality> for QualityPreset {
    fn from(quality: Quality) -> Self {
        match quality {
            Quality::Low => Self::Low,
            Quality::Medium => Self::Medium,
            Quality::High => Self::High,
        }
    }
}

/// Interactive ripple pool
#[derive(Parser, Debug)]
#[command(name = "ripple-window")]
#[command(about = "Click to drop, move to stir, drag to orbit, scroll to zoom", long_about = None)]
struct Args {
    /// Directory with tiles.jpg and the sky faces (xpos, xneg, ypos, zpos, zneg);
    /// generated textures are used if omitted
    #[arg(short, long)]
    assets: Option<PathBuf>,

    /// Quality preset
    #[arg(short, long, value_enum, default_value = "medium")]
    quality: Quality,

    /// Give up on loading assets after this many seconds
    #[arg(long, default_value_t = 30.0)]
    timeout: f64,

    /// Seed for the initial drops (random if omitted)
    #[arg(short, long)]
    seed: Option<u64>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = SimulationConfig {
        asset_timeout_secs: Some(args.timeout),
        ..SimulationConfig::with_quality(args.quality.into())
    };
    if let Err(e) = config.validate() {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            error!("Cannot create event loop: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut app = App::new(config, args.assets, rng);
    if let Err(e) = event_loop.run_app(&mut app) {
        error!("Event loop failed: {}", e);
        return ExitCode::FAILURE;
    }

    if app.into_failure().is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
