//! Window event handling and the per-refresh frame

use crate::assets::load_environment;
use crate::gfx::Gfx;
use rand::rngs::StdRng;
use ripple_core::render::gpu::SceneResources;
use ripple_core::render::EnvironmentTextures;
use ripple_core::{
    FrameDriver, FrameOutcome, GpuWaveSolver, PointerEvent, RippleError, RippleResult, Scene,
    SimulationConfig, Viewport,
};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::window::{Window, WindowId};

/// How often to check on the asset loader while waiting
const LOADING_POLL: Duration = Duration::from_millis(50);

/// Wheel pixels per zoom line
const PIXELS_PER_LINE: f32 = 100.0;

/// Everything that exists once the window is up
struct Session {
    window: Arc<Window>,
    gfx: Gfx,
    solver: GpuWaveSolver,
    scene: Scene,
    viewport: Viewport,
    resources: Option<SceneResources>,
    loading: Option<Receiver<RippleResult<EnvironmentTextures>>>,
}

/// The viewer application
pub struct App {
    config: SimulationConfig,
    assets: Option<PathBuf>,
    driver: FrameDriver,
    rng: StdRng,
    session: Option<Session>,
    cursor: Option<(f32, f32)>,
    dragging: bool,
    failure: Option<RippleError>,
}

impl App {
    /// Viewer for a configuration; assets are read from `assets` if given
    pub fn new(config: SimulationConfig, assets: Option<PathBuf>, rng: StdRng) -> Self {
        Self {
            driver: FrameDriver::new(&config),
            config,
            assets,
            rng,
            session: None,
            cursor: None,
            dragging: false,
            failure: None,
        }
    }

    /// The error that closed the viewer, if any
    pub fn into_failure(self) -> Option<RippleError> {
        self.failure
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: RippleError) {
        error!("{}", err);
        self.failure = Some(err);
        event_loop.exit();
    }

    fn open(&self, event_loop: &ActiveEventLoop) -> RippleResult<Session> {
        let attributes = Window::default_attributes()
            .with_title("Ripple Pool")
            .with_inner_size(PhysicalSize::new(1280, 720));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|e| RippleError::Gpu(e.to_string()))?,
        );

        let gfx = pollster::block_on(Gfx::new(Arc::clone(&window)))?;
        let solver = GpuWaveSolver::new(gfx.context(), &self.config)?;
        let (width, height) = gfx.size();
        let viewport = Viewport::new(width as f32, height as f32);
        let scene = Scene::new(&self.config, &viewport);

        let (sender, receiver) = mpsc::channel();
        let dir = self.assets.clone();
        let timeout = self.config.asset_timeout_secs.map(Duration::from_secs_f64);
        thread::Builder::new()
            .name("asset-loader".to_string())
            .spawn(move || {
                let _ = sender.send(load_environment(dir, timeout));
            })
            .map_err(|e| RippleError::AssetLoad {
                name: "loader".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Session {
            window,
            gfx,
            solver,
            scene,
            viewport,
            resources: None,
            loading: Some(receiver),
        })
    }

    /// Check the loader; once textures arrive, start running
    fn poll_loading(&mut self) -> RippleResult<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let Some(receiver) = &session.loading else {
            return Ok(());
        };

        let textures = match receiver.try_recv() {
            Ok(result) => result?,
            Err(TryRecvError::Empty) => return Ok(()),
            Err(TryRecvError::Disconnected) => {
                return Err(RippleError::AssetLoad {
                    name: "loader".to_string(),
                    reason: "asset loader stopped without a result".to_string(),
                })
            }
        };
        session.loading = None;

        let resources = SceneResources::new(
            session.gfx.context(),
            session.gfx.format(),
            session.scene.surface.mesh(),
            session.scene.basin.mesh(),
            &textures,
            session.gfx.size(),
        )?;
        session.resources = Some(resources);

        self.driver.begin_running(
            &mut session.solver,
            &mut session.scene.interaction,
            &mut self.rng,
        )?;

        // Size handshake before the first frame
        let size = session.window.inner_size();
        resize(session, size.width, size.height);
        session.window.request_redraw();
        info!("Assets ready, rendering");
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(resources) = &session.resources else {
            return;
        };

        let frame = match session.gfx.acquire() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                session.gfx.reconfigure();
                session.window.request_redraw();
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.fail(event_loop, RippleError::Gpu("surface out of memory".to_string()));
                return;
            }
            Err(e) => {
                warn!("Skipping frame: {}", e);
                session.window.request_redraw();
                return;
            }
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut backend = resources.begin_frame(&view, session.solver.field_buffers());
        let outcome = self
            .driver
            .frame(&mut session.solver, &mut backend, &mut session.scene);
        backend.finish();
        frame.present();

        if outcome == FrameOutcome::Rendered {
            session.window.request_redraw();
        }
    }

    fn pointer(&mut self, event: PointerEvent) {
        if let Some(session) = self.session.as_mut() {
            session
                .scene
                .handle_pointer(event, &session.viewport, &mut session.solver);
        }
    }
}

fn resize(session: &mut Session, width: u32, height: u32) {
    if !session.gfx.resize(width, height) {
        return;
    }
    if let Some(resources) = session.resources.as_mut() {
        resources.resize(width, height);
    }
    session.viewport = Viewport::new(width as f32, height as f32);
    session.scene.camera.set_aspect(width as f32, height as f32);
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }
        match self.open(event_loop) {
            Ok(session) => self.session = Some(session),
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(session) = self.session.as_mut() {
                    resize(session, size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
                if let (true, Some((x, y))) = (self.dragging, self.cursor) {
                    self.pointer(PointerEvent::Press { x, y });
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as f32, position.y as f32);
                if let (true, Some((last_x, last_y)), Some(session)) =
                    (self.dragging, self.cursor, self.session.as_mut())
                {
                    let height = session.viewport.height;
                    session.scene.camera.rotate(x - last_x, y - last_y, height);
                }
                self.cursor = Some((x, y));
                self.pointer(PointerEvent::Move { x, y });
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
                };
                if let Some(session) = self.session.as_mut() {
                    session.scene.camera.zoom(lines);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let waiting = self
            .session
            .as_ref()
            .is_some_and(|session| session.loading.is_some());
        if !waiting {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        }

        if let Err(e) = self.poll_loading() {
            self.fail(event_loop, e);
            return;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + LOADING_POLL));
    }
}
