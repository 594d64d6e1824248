//! Pool basin renderer

use super::{CullFace, DrawCall, MeshKind, RenderBackend, ShadingState};
use crate::camera::OrbitCamera;
use crate::config::SimulationConfig;
use crate::field::FieldId;
use crate::mesh::Mesh;

/// Draws the inside of the pool
///
/// The box is wound outward, so culling front faces leaves the walls facing
/// the camera from inside.
#[derive(Debug, Clone)]
pub struct BasinRenderer {
    mesh: Mesh,
    shading: ShadingState,
}

impl BasinRenderer {
    /// Basin for a scene
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            mesh: Mesh::basin(),
            shading: ShadingState::from_config(config),
        }
    }

    /// Basin geometry
    #[must_use]
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Submit the basin pass sampling `field` for caustic shading
    pub fn draw<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        field: FieldId,
        camera: &OrbitCamera,
    ) {
        self.shading.set_camera(camera);
        backend.submit(&DrawCall {
            mesh: MeshKind::Basin,
            cull: CullFace::Front,
            shading: self.shading,
            field,
        });
    }
}
