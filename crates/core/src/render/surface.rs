//! Water surface renderer

use super::{CullFace, DrawCall, MeshKind, RenderBackend, ShadingState};
use crate::camera::OrbitCamera;
use crate::config::SimulationConfig;
use crate::field::FieldId;
use crate::mesh::Mesh;

/// Draws the water surface from below and then from above
#[derive(Debug, Clone)]
pub struct SurfaceRenderer {
    mesh: Mesh,
    shading: ShadingState,
}

impl SurfaceRenderer {
    /// Build the surface grid for a scene
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            mesh: Mesh::surface_grid(config.surface_subdivisions),
            shading: ShadingState::from_config(config),
        }
    }

    /// Surface geometry, uploaded once by GPU backends
    #[must_use]
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Submit both surface passes
    ///
    /// The underwater pass renders back faces with `underwater` set. The
    /// above-water pass follows with back faces culled. Both sample `field`.
    pub fn draw<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        field: FieldId,
        camera: &OrbitCamera,
    ) {
        self.shading.set_camera(camera);

        for (cull, underwater) in [(CullFace::Front, true), (CullFace::Back, false)] {
            self.shading.underwater = underwater;
            backend.submit(&DrawCall {
                mesh: MeshKind::Surface,
                cull,
                shading: self.shading,
                field,
            });
        }
    }
}
