//! Surface and basin rendering
//!
//! Renderers never touch the GPU directly. They describe each draw as a
//! [`DrawCall`] and hand it to a [`RenderBackend`]. The wgpu backend
//! (`gpu` feature) turns calls into render passes; [`CommandList`] records
//! them for headless runs and tests.
//!
//! # Draw order
//!
//! A frame clears to the background colour, then the surface renderer submits
//! its underwater pass (front faces culled) followed by its above-water pass
//! (back faces culled), then the basin renderer submits one pass with front
//! faces culled so the inside walls show.

mod basin;
mod surface;
mod textures;

#[cfg(feature = "gpu")]
pub mod gpu;

pub use basin::BasinRenderer;
pub use surface::SurfaceRenderer;
pub use textures::{CubeFaces, EnvironmentTextures, TextureImage};

use crate::camera::OrbitCamera;
use crate::config::SimulationConfig;
use crate::field::FieldId;
use nalgebra::{Matrix4, Point3, Vector3};

/// Which triangle faces the rasterizer discards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullFace {
    /// Discard counter-clockwise faces
    Front,
    /// Discard clockwise faces
    Back,
}

/// Static geometry a draw call uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKind {
    /// Water surface grid
    Surface,
    /// Pool box without a top
    Basin,
}

/// Uniform state shared by the water and pool shaders
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingState {
    /// Projection times view, wgpu clip depth
    pub view_projection: Matrix4<f32>,
    /// Camera position
    pub eye: Point3<f32>,
    /// Unit direction towards the light
    pub light: Vector3<f32>,
    /// Whether the surface is seen from below
    pub underwater: bool,
    /// Vertical scale of the basin
    pub pool_height: f32,
    /// Height-field edge length in texels
    pub resolution: u32,
}

impl ShadingState {
    /// Initial state for a scene; camera fields are filled per draw
    #[must_use]
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            view_projection: Matrix4::identity(),
            eye: Point3::origin(),
            light: Vector3::from(config.light).normalize(),
            underwater: false,
            pool_height: config.pool_height,
            resolution: config.resolution,
        }
    }

    /// Copy the camera pose into the state
    pub fn set_camera(&mut self, camera: &OrbitCamera) {
        self.view_projection = camera.gpu_view_projection();
        self.eye = camera.eye();
    }
}

/// One mesh submission
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    /// Geometry to draw
    pub mesh: MeshKind,
    /// Faces to discard
    pub cull: CullFace,
    /// Uniforms for this draw
    pub shading: ShadingState,
    /// Height field sampled by the shaders
    pub field: FieldId,
}

/// Sink for frame commands
pub trait RenderBackend {
    /// Clear colour and depth
    fn clear(&mut self, color: [f32; 4]);

    /// Draw one mesh
    fn submit(&mut self, call: &DrawCall);
}

/// Recorded frame command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderCommand {
    /// Clear to the colour
    Clear([f32; 4]),
    /// Draw call
    Draw(DrawCall),
}

/// Backend that records commands instead of drawing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandList {
    commands: Vec<RenderCommand>,
}

impl CommandList {
    /// Empty list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands in submission order
    #[must_use]
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Recorded draw calls, skipping clears
    pub fn draws(&self) -> impl Iterator<Item = &DrawCall> {
        self.commands.iter().filter_map(|command| match command {
            RenderCommand::Draw(call) => Some(call),
            RenderCommand::Clear(_) => None,
        })
    }

    /// Forget everything recorded
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }
}

impl RenderBackend for CommandList {
    fn clear(&mut self, color: [f32; 4]) {
        self.commands.push(RenderCommand::Clear(color));
    }

    fn submit(&mut self, call: &DrawCall) {
        self.commands.push(RenderCommand::Draw(*call));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraSettings;

    #[test]
    fn test_command_list_keeps_order() {
        let config = SimulationConfig::default();
        let call = DrawCall {
            mesh: MeshKind::Basin,
            cull: CullFace::Front,
            shading: ShadingState::from_config(&config),
            field: FieldId::B,
        };

        let mut list = CommandList::new();
        list.clear([1.0; 4]);
        list.submit(&call);

        assert_eq!(
            list.commands(),
            &[RenderCommand::Clear([1.0; 4]), RenderCommand::Draw(call)]
        );
        assert_eq!(list.draws().count(), 1);

        list.clear_commands();
        assert!(list.commands().is_empty());
    }

    #[test]
    fn test_shading_tracks_camera() {
        let config = SimulationConfig::default();
        let camera = OrbitCamera::new(&CameraSettings::default(), 1.5);
        let mut shading = ShadingState::from_config(&config);
        shading.set_camera(&camera);

        assert_eq!(shading.eye, camera.eye());
        assert_eq!(shading.view_projection, camera.gpu_view_projection());
        assert_eq!(shading.resolution, config.resolution);
    }

    #[test]
    fn test_shading_light_is_normalised() {
        let config = SimulationConfig {
            light: [2.0, 2.0, -1.0],
            ..SimulationConfig::default()
        };
        let shading = ShadingState::from_config(&config);
        assert!((shading.light.norm() - 1.0).abs() < 1e-6);
        assert!((shading.light.x - 2.0 / 3.0).abs() < 1e-6);
        assert!((shading.light.z + 1.0 / 3.0).abs() < 1e-6);

        let reference = ShadingState::from_config(&SimulationConfig::default());
        assert!((reference.light.norm() - 1.0).abs() < 1e-6);
    }
}
