//! Frame driver: the loading/running state machine and per-frame ordering
//!
//! The host calls [`FrameDriver::frame`] once per display refresh. While
//! assets load nothing happens. Once [`FrameDriver::begin_running`] has seeded
//! the pool, every frame runs the same fixed sequence:
//!
//! 1. step the simulation
//! 2. recompute normals
//! 3. clear to the background colour
//! 4. draw the surface (underwater pass, then above-water pass)
//! 5. draw the basin
//! 6. apply accumulated camera input
//!
//! and reports [`FrameOutcome::Rendered`] so the host schedules the next one.

use crate::camera::OrbitCamera;
use crate::config::{SeedSettings, SimulationConfig};
use crate::error::{RippleError, RippleResult};
use crate::interaction::{Disturbance, Interaction, PointerEvent, Viewport};
use crate::render::{BasinRenderer, RenderBackend, SurfaceRenderer};
use crate::solver::{FrameTimer, ProfilerScope, WaveSolver};
use rand::Rng;
use std::time::Instant;
use tracing::{info, trace};

/// Driver state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Waiting for assets; frames do nothing
    Loading,
    /// Simulating and drawing every frame
    Running,
}

/// What a call to [`FrameDriver::frame`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Still loading, nothing was submitted
    Waiting,
    /// A full frame was simulated and drawn
    Rendered,
}

/// Everything drawn or steered besides the simulation itself
#[derive(Debug, Clone)]
pub struct Scene {
    /// Water surface renderer
    pub surface: SurfaceRenderer,
    /// Pool renderer
    pub basin: BasinRenderer,
    /// Orbit camera
    pub camera: OrbitCamera,
    /// Pointer picking
    pub interaction: Interaction,
}

impl Scene {
    /// Scene for a configuration and initial viewport
    #[must_use]
    pub fn new(config: &SimulationConfig, viewport: &Viewport) -> Self {
        Self {
            surface: SurfaceRenderer::new(config),
            basin: BasinRenderer::new(config),
            camera: OrbitCamera::new(&config.camera, viewport.aspect()),
            interaction: Interaction::new(config.press_drop, config.move_drop),
        }
    }

    /// Apply the drop for a pointer event, if it hits the water
    ///
    /// # Returns
    ///
    /// The disturbance that was applied.
    pub fn handle_pointer(
        &self,
        event: PointerEvent,
        viewport: &Viewport,
        solver: &mut dyn WaveSolver,
    ) -> Option<Disturbance> {
        let drop = self
            .interaction
            .disturbance_for(event, &self.camera, viewport)?;
        solver.add_drop(&drop);
        Some(drop)
    }
}

/// Random seed drops with alternating sign
///
/// Centres are uniform in `[-1, 1]²`. Even indices push the surface down,
/// odd indices lift it.
pub fn seed_drops<R: Rng + ?Sized>(settings: &SeedSettings, rng: &mut R) -> Vec<Disturbance> {
    (0..settings.count)
        .map(|i| {
            let center = [rng.random_range(-1.0..=1.0), rng.random_range(-1.0..=1.0)];
            let sign = if i % 2 == 0 { -1.0 } else { 1.0 };
            Disturbance::new(center, settings.radius, sign * settings.strength)
        })
        .collect()
}

/// Loading/running state machine driving one frame per refresh
#[derive(Debug)]
pub struct FrameDriver {
    state: DriverState,
    seed: SeedSettings,
    background: [f32; 4],
    timer: FrameTimer,
}

impl FrameDriver {
    /// Driver in the loading state
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            state: DriverState::Loading,
            seed: config.seed,
            background: config.background,
            timer: FrameTimer::new(),
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Frame timing so far
    #[must_use]
    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// Leave the loading state: seed drops and enable stirring
    ///
    /// # Errors
    ///
    /// Returns `RippleError::InvalidState` if the driver is already running.
    pub fn begin_running<R: Rng + ?Sized>(
        &mut self,
        solver: &mut dyn WaveSolver,
        interaction: &mut Interaction,
        rng: &mut R,
    ) -> RippleResult<()> {
        if self.state == DriverState::Running {
            return Err(RippleError::InvalidState("driver is already running"));
        }

        for drop in seed_drops(&self.seed, rng) {
            solver.add_drop(&drop);
        }
        interaction.enable_stirring();
        self.state = DriverState::Running;

        info!("Scene running with {} seed drops", self.seed.count);
        Ok(())
    }

    /// Run one frame
    ///
    /// # Arguments
    ///
    /// * `solver` - Simulation stage, stepped once
    /// * `backend` - Receives the clear and the draw calls
    /// * `scene` - Renderers and camera
    pub fn frame(
        &mut self,
        solver: &mut dyn WaveSolver,
        backend: &mut dyn RenderBackend,
        scene: &mut Scene,
    ) -> FrameOutcome {
        if self.state == DriverState::Loading {
            return FrameOutcome::Waiting;
        }
        let start = Instant::now();

        {
            let _scope = ProfilerScope::new("simulate");
            solver.step_simulation();
            solver.update_normals();
        }

        {
            let _scope = ProfilerScope::new("render");
            let field = solver.current_id();
            backend.clear(self.background);
            scene.surface.draw(backend, field, &scene.camera);
            scene.basin.draw(backend, field, &scene.camera);
        }

        scene.camera.update();

        self.timer.record(start.elapsed().as_secs_f64() * 1000.0);
        trace!(
            frame = self.timer.frames(),
            ms = self.timer.last_frame_time_ms(),
            "frame"
        );
        FrameOutcome::Rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldId;
    use crate::render::{CommandList, CullFace, MeshKind, RenderCommand};
    use crate::solver::CpuWaveSolver;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup() -> (SimulationConfig, CpuWaveSolver, Scene) {
        let config = SimulationConfig {
            resolution: 32,
            surface_subdivisions: 4,
            ..SimulationConfig::default()
        };
        let solver = CpuWaveSolver::new(&config).unwrap();
        let scene = Scene::new(&config, &Viewport::new(640.0, 480.0));
        (config, solver, scene)
    }

    #[test]
    fn test_seed_drops_alternate_sign() {
        let settings = SimulationConfig::default().seed;
        let drops = seed_drops(&settings, &mut StdRng::seed_from_u64(7));

        assert_eq!(drops.len(), 20);
        for (i, drop) in drops.iter().enumerate() {
            let expected = if i % 2 == 0 { -0.02 } else { 0.02 };
            assert_eq!(drop.strength, expected);
            assert_eq!(drop.radius, 0.03);
            assert!(drop.center.iter().all(|c| (-1.0..=1.0).contains(c)));
        }
    }

    #[test]
    fn test_loading_frame_does_nothing() {
        let (config, mut solver, mut scene) = setup();
        let mut driver = FrameDriver::new(&config);
        let mut list = CommandList::new();
        let before = solver.current_id();

        assert_eq!(
            driver.frame(&mut solver, &mut list, &mut scene),
            FrameOutcome::Waiting
        );
        assert!(list.commands().is_empty());
        assert_eq!(solver.current_id(), before);
    }

    #[test]
    fn test_begin_running_once() {
        let (config, mut solver, mut scene) = setup();
        let mut driver = FrameDriver::new(&config);
        let mut rng = StdRng::seed_from_u64(1);

        driver
            .begin_running(&mut solver, &mut scene.interaction, &mut rng)
            .unwrap();
        assert_eq!(driver.state(), DriverState::Running);
        assert!(scene.interaction.stirring_enabled());
        assert!(solver.field().energy() > 0.0);

        assert!(matches!(
            driver.begin_running(&mut solver, &mut scene.interaction, &mut rng),
            Err(RippleError::InvalidState(_))
        ));
    }

    #[test]
    fn test_zero_width_viewport_still_renders() {
        let (config, mut solver, _) = setup();
        let mut scene = Scene::new(&config, &Viewport::new(0.0, 600.0));
        let mut driver = FrameDriver::new(&config);
        driver
            .begin_running(&mut solver, &mut scene.interaction, &mut StdRng::seed_from_u64(5))
            .unwrap();

        let mut list = CommandList::new();
        assert_eq!(
            driver.frame(&mut solver, &mut list, &mut scene),
            FrameOutcome::Rendered
        );
        assert_eq!(list.draws().count(), 3);
    }

    #[test]
    fn test_running_frame_order() {
        let (config, mut solver, mut scene) = setup();
        let mut driver = FrameDriver::new(&config);
        driver
            .begin_running(&mut solver, &mut scene.interaction, &mut StdRng::seed_from_u64(3))
            .unwrap();

        // Step and normals are two passes, so the current buffer is unchanged
        let field = solver.current_id();
        let mut list = CommandList::new();
        assert_eq!(
            driver.frame(&mut solver, &mut list, &mut scene),
            FrameOutcome::Rendered
        );
        assert_eq!(solver.current_id(), field);

        let commands = list.commands();
        assert_eq!(commands.len(), 4);
        assert_eq!(commands[0], RenderCommand::Clear([1.0; 4]));
        let draws: Vec<_> = list.draws().map(|d| (d.mesh, d.cull, d.field)).collect();
        assert_eq!(
            draws,
            vec![
                (MeshKind::Surface, CullFace::Front, field),
                (MeshKind::Surface, CullFace::Back, field),
                (MeshKind::Basin, CullFace::Front, field),
            ]
        );
        assert_eq!(driver.timer().frames(), 1);
    }

    #[test]
    fn test_pointer_press_adds_drop() {
        let (_, mut solver, scene) = setup();
        let viewport = Viewport::new(640.0, 480.0);

        let drop = scene
            .handle_pointer(PointerEvent::Press { x: 320.0, y: 240.0 }, &viewport, &mut solver)
            .unwrap();
        assert_eq!(drop.strength, 0.1);
        assert_eq!(solver.current_id(), FieldId::B);
        assert!(solver.field().energy() > 0.0);
    }
}
