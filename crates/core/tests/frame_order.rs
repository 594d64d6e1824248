//! Frame driver ordering over several frames

use rand::rngs::StdRng;
use rand::SeedableRng;
use ripple_core::render::{CullFace, MeshKind, RenderCommand};
use ripple_core::{
    CommandList, CpuWaveSolver, DriverState, FrameDriver, FrameOutcome, PointerEvent, Scene,
    SimulationConfig, Viewport, WaveSolver,
};

fn config() -> SimulationConfig {
    SimulationConfig {
        resolution: 32,
        surface_subdivisions: 8,
        ..SimulationConfig::default()
    }
}

#[test]
fn test_loading_then_running() {
    let config = config();
    let viewport = Viewport::new(800.0, 600.0);
    let mut scene = Scene::new(&config, &viewport);
    let mut solver = CpuWaveSolver::new(&config).unwrap();
    let mut driver = FrameDriver::new(&config);
    let mut list = CommandList::new();

    for _ in 0..3 {
        assert_eq!(
            driver.frame(&mut solver, &mut list, &mut scene),
            FrameOutcome::Waiting
        );
    }
    assert!(list.commands().is_empty());
    assert_eq!(solver.field().energy(), 0.0);

    // Moves before running are ignored
    let stir = PointerEvent::Move { x: 400.0, y: 300.0 };
    assert!(scene.handle_pointer(stir, &viewport, &mut solver).is_none());

    driver
        .begin_running(&mut solver, &mut scene.interaction, &mut StdRng::seed_from_u64(42))
        .unwrap();
    assert_eq!(driver.state(), DriverState::Running);
    assert!(scene.handle_pointer(stir, &viewport, &mut solver).is_some());

    for _ in 0..3 {
        assert_eq!(
            driver.frame(&mut solver, &mut list, &mut scene),
            FrameOutcome::Rendered
        );
    }

    let commands = list.commands();
    assert_eq!(commands.len(), 12);
    for frame in commands.chunks(4) {
        assert_eq!(frame[0], RenderCommand::Clear(config.background));
        let kinds: Vec<_> = frame[1..]
            .iter()
            .map(|command| match command {
                RenderCommand::Draw(call) => {
                    assert_eq!(call.field, solver.current_id());
                    (call.mesh, call.cull, call.shading.underwater)
                }
                RenderCommand::Clear(_) => panic!("clear inside a frame"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                (MeshKind::Surface, CullFace::Front, true),
                (MeshKind::Surface, CullFace::Back, false),
                (MeshKind::Basin, CullFace::Front, false),
            ]
        );
    }
    assert_eq!(driver.timer().frames(), 3);
}

#[test]
fn test_draws_sample_latest_field() {
    let config = config();
    let viewport = Viewport::new(640.0, 640.0);
    let mut scene = Scene::new(&config, &viewport);
    let mut solver = CpuWaveSolver::new(&config).unwrap();
    let mut driver = FrameDriver::new(&config);
    driver
        .begin_running(&mut solver, &mut scene.interaction, &mut StdRng::seed_from_u64(9))
        .unwrap();

    // An odd number of passes flips which buffer is current
    scene.handle_pointer(PointerEvent::Press { x: 320.0, y: 320.0 }, &viewport, &mut solver);
    let latest = solver.current_id();

    let mut list = CommandList::new();
    driver.frame(&mut solver, &mut list, &mut scene);
    assert!(list.draws().all(|call| call.field == latest));
    assert_eq!(solver.current_id(), latest);
}
