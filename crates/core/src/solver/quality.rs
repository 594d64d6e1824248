//! Quality presets for grid and mesh resolution
//!
//! Higher quality means a finer height field and a denser surface mesh, at a
//! higher cost per frame.

use serde::{Deserialize, Serialize};

/// Quality preset determining grid resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityPreset {
    /// 1024² grid, 400² surface quads
    Ultra,
    /// 512² grid, 300² surface quads
    High,
    /// 256² grid, 200² surface quads (reference scene)
    Medium,
    /// 128² grid, 100² surface quads
    Low,
}

impl QualityPreset {
    /// Height-field edge length in texels
    #[must_use]
    pub const fn grid_resolution(&self) -> u32 {
        match self {
            Self::Ultra => 1024,
            Self::High => 512,
            Self::Medium => 256,
            Self::Low => 128,
        }
    }

    /// Quads along each edge of the surface mesh
    #[must_use]
    pub const fn surface_subdivisions(&self) -> u32 {
        match self {
            Self::Ultra => 400,
            Self::High => 300,
            Self::Medium => 200,
            Self::Low => 100,
        }
    }

    /// Recommended preset when nothing is specified
    #[must_use]
    pub fn recommended() -> Self {
        Self::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_resolutions() {
        assert_eq!(QualityPreset::Ultra.grid_resolution(), 1024);
        assert_eq!(QualityPreset::High.grid_resolution(), 512);
        assert_eq!(QualityPreset::Medium.grid_resolution(), 256);
        assert_eq!(QualityPreset::Low.grid_resolution(), 128);
    }

    #[test]
    fn test_recommended_matches_reference_scene() {
        let preset = QualityPreset::recommended();
        assert_eq!(preset.grid_resolution(), 256);
        assert_eq!(preset.surface_subdivisions(), 200);
    }
}
