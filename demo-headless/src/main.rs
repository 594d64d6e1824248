use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ripple_core::{
    create_water_solver, height_at, height_energy, CommandList, CpuWaveSolver, FrameDriver,
    PointerEvent, QualityPreset, RippleError, RippleResult, Scene, SimulationConfig, Viewport,
    WaveSolver,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Grid and mesh resolution
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Quality {
    Low,
    Medium,
    High,
    Ultra,
}

impl From<Quality> for QualityPreset {
    fn from(quality: Quality) -> Self {
        match quality {
            Quality::Low => Self::Low,
            Quality::Medium => Self::Medium,
            Quality::High => Self::High,
            Quality::Ultra => Self::Ultra,
        }
    }
}

/// Ripple pool simulation without a window
#[derive(Parser, Debug)]
#[command(name = "ripple-headless")]
#[command(about = "Runs the ripple pool frame loop and reports wave energy", long_about = None)]
struct Args {
    /// JSON configuration file; missing fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Quality preset, overrides the grid size from the config file
    #[arg(short, long, value_enum)]
    quality: Option<Quality>,

    /// Number of frames to run
    #[arg(short, long, default_value_t = 300)]
    frames: u32,

    /// Print a report every N frames
    #[arg(short, long, default_value_t = 25)]
    report_interval: u32,

    /// Seed for the initial drops (random if omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Viewport width used for picking
    #[arg(long, default_value_t = 800.0)]
    width: f32,

    /// Viewport height used for picking
    #[arg(long, default_value_t = 600.0)]
    height: f32,

    /// Skip the GPU backend
    #[arg(long)]
    cpu: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> RippleResult<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                RippleError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
            })?;
            serde_json::from_str(&text).map_err(|e| {
                RippleError::InvalidConfig(format!("cannot parse {}: {e}", path.display()))
            })?
        }
        None => SimulationConfig::default(),
    };

    if let Some(quality) = args.quality {
        let preset = QualityPreset::from(quality);
        config.resolution = preset.grid_resolution();
        config.surface_subdivisions = preset.surface_subdivisions();
    }

    config.validate()?;
    Ok(config)
}

fn viewport(args: &Args) -> RippleResult<Viewport> {
    let positive = |v: f32| v.is_finite() && v > 0.0;
    if !(positive(args.width) && positive(args.height)) {
        return Err(RippleError::InvalidConfig(format!(
            "viewport must be positive, got {}x{}",
            args.width, args.height
        )));
    }
    Ok(Viewport::new(args.width, args.height))
}

fn run(args: &Args) -> RippleResult<()> {
    let config = load_config(args)?;
    let viewport = viewport(args)?;

    if args.print_config {
        let json = serde_json::to_string_pretty(&config)
            .map_err(|e| RippleError::InvalidConfig(e.to_string()))?;
        println!("{json}");
        return Ok(());
    }

    println!("=== Ripple Pool Headless ===\n");

    let mut solver: Box<dyn WaveSolver> = if args.cpu {
        Box::new(CpuWaveSolver::new(&config)?)
    } else {
        create_water_solver(&config)?
    };
    println!(
        "Grid: {}x{} ({} backend), surface mesh {}x{} quads",
        config.resolution,
        config.resolution,
        if solver.is_gpu_accelerated() { "GPU" } else { "CPU" },
        config.surface_subdivisions,
        config.surface_subdivisions
    );

    let mut scene = Scene::new(&config, &viewport);
    let mut driver = FrameDriver::new(&config);
    let mut backend = CommandList::new();

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    driver.begin_running(solver.as_mut(), &mut scene.interaction, &mut rng)?;

    // A click in the middle of the view, as a user would start
    let press = PointerEvent::Press {
        x: args.width * 0.5,
        y: args.height * 0.5,
    };
    if let Some(drop) = scene.handle_pointer(press, &viewport, solver.as_mut()) {
        info!(
            "Pressed at ({:.3}, {:.3}), strength {}",
            drop.center[0], drop.center[1], drop.strength
        );
    }

    let resolution = solver.resolution() as usize;
    let report_interval = args.report_interval.max(1);
    let mut draw_calls = 0usize;
    let mut initial_energy = None;

    println!("\nRunning {} frames...\n", args.frames);
    println!(" Frame |      Energy | Centre height | Peak |height|");
    println!("-------|-------------|---------------|-------------");

    for frame in 1..=args.frames {
        driver.frame(solver.as_mut(), &mut backend, &mut scene);
        draw_calls += backend.draws().count();
        backend.clear_commands();

        if frame == 1 || frame % report_interval == 0 || frame == args.frames {
            let field = solver.read_field()?;
            let energy = height_energy(&field);
            let peak = field.iter().map(|t| t.height.abs()).fold(0.0_f32, f32::max);
            initial_energy.get_or_insert(energy);
            println!(
                "{:6} | {:11.6} | {:13.6} | {:11.6}",
                frame,
                energy,
                height_at(&field, resolution, 0.0, 0.0),
                peak
            );
        }
    }

    println!("\n=== Run Complete ===");
    println!("Frames rendered: {}", driver.timer().frames());
    println!("Draw calls recorded: {draw_calls}");
    println!(
        "Frame time: mean {:.3} ms, slowest {:.3} ms",
        driver.timer().mean_frame_time_ms(),
        driver.timer().slowest_frame_time_ms()
    );
    if let Some(initial) = initial_energy {
        let energy = height_energy(&solver.read_field()?);
        if initial > 0.0 {
            println!("Energy remaining: {:.2}%", energy / initial * 100.0);
        }
    }

    Ok(())
}
