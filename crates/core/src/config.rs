//! Simulation and scene configuration
//!
//! All constants of the reference scene live here as `Default` values. The
//! configuration is static for the lifetime of a simulation: it is validated
//! once when the solver is built and never changes afterwards.

use crate::camera::MIN_POLAR;
use crate::error::{RippleError, RippleResult};
use crate::solver::QualityPreset;
use serde::{Deserialize, Serialize};

/// Largest supported grid edge in texels
pub const MAX_RESOLUTION: u32 = 4096;

/// Coefficients of the damped neighbour-averaging update
///
/// Each step computes `h' = damping * ((1 - relaxation) * h + relaxation * avg)`
/// where `avg` is the mean of the four edge neighbours. Any `damping` in
/// `(0, 1)` and `relaxation` in `(0, 1]` gives a contraction in the sum of
/// squared heights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveParams {
    /// Per-step decay factor, strictly between 0 and 1
    pub damping: f32,
    /// Weight of the neighbour average, in `(0, 1]`
    pub relaxation: f32,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            damping: 0.97,
            relaxation: 0.5,
        }
    }
}

/// Radius and strength of one kind of disturbance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropSettings {
    /// Radius in texture space (the grid spans 1.0)
    pub radius: f32,
    /// Signed height added at the drop centre
    pub strength: f32,
}

/// Random drops placed when the scene becomes interactive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeedSettings {
    /// Number of drops
    pub count: u32,
    /// Drop radius in texture space
    pub radius: f32,
    /// Magnitude of the strength; sign alternates by index
    pub strength: f32,
}

/// Initial camera pose and projection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    /// Initial eye position
    pub eye: [f32; 3],
    /// Orbit target
    pub target: [f32; 3],
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
    /// Largest polar angle from +Y in radians
    pub max_polar_angle: f32,
}

impl CameraSettings {
    /// Closest the eye may zoom towards the target
    #[must_use]
    pub fn min_distance(&self) -> f32 {
        self.near * 10.0
    }

    /// Farthest the eye may zoom away from the target
    #[must_use]
    pub fn max_distance(&self) -> f32 {
        self.far * 0.5
    }
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            eye: [0.426, 0.677, -2.095],
            target: [0.0, 0.0, 0.0],
            fov_degrees: 75.0,
            near: 0.01,
            far: 100.0,
            max_polar_angle: std::f32::consts::FRAC_PI_2,
        }
    }
}

/// Complete configuration for a ripple pool scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Height-field edge length in texels
    pub resolution: u32,
    /// Quads along each edge of the surface mesh
    pub surface_subdivisions: u32,
    /// Update rule coefficients
    pub wave: WaveParams,
    /// Disturbance for pointer presses
    pub press_drop: DropSettings,
    /// Disturbance for pointer moves
    pub move_drop: DropSettings,
    /// Drops seeded on entering the running state
    pub seed: SeedSettings,
    /// Direction towards the light, normalised before shading
    pub light: [f32; 3],
    /// Vertical scale of the basin
    pub pool_height: f32,
    /// Framebuffer clear colour (RGBA)
    pub background: [f32; 4],
    /// Camera pose and projection
    pub camera: CameraSettings,
    /// Give up on asset loading after this many seconds
    pub asset_timeout_secs: Option<f64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            resolution: 256,
            surface_subdivisions: 200,
            wave: WaveParams::default(),
            press_drop: DropSettings {
                radius: 0.1,
                strength: 0.1,
            },
            move_drop: DropSettings {
                radius: 0.02,
                strength: 0.04,
            },
            seed: SeedSettings {
                count: 20,
                radius: 0.03,
                strength: 0.02,
            },
            light: [0.7559289460184544, 0.7559289460184544, -0.3779644730092272],
            pool_height: 1.0,
            background: [1.0, 1.0, 1.0, 1.0],
            camera: CameraSettings::default(),
            asset_timeout_secs: None,
        }
    }
}

impl SimulationConfig {
    /// Configuration with grid and mesh resolution taken from a quality preset
    #[must_use]
    pub fn with_quality(preset: QualityPreset) -> Self {
        Self {
            resolution: preset.grid_resolution(),
            surface_subdivisions: preset.surface_subdivisions(),
            ..Self::default()
        }
    }

    /// Cell spacing used for finite differences
    #[must_use]
    pub fn spacing(&self) -> f32 {
        1.0 / self.resolution as f32
    }

    /// Check that the configuration can drive a simulation
    ///
    /// # Errors
    ///
    /// Returns `RippleError::InvalidConfig` naming the first offending value.
    pub fn validate(&self) -> RippleResult<()> {
        if self.resolution == 0 || self.resolution > MAX_RESOLUTION {
            return Err(RippleError::InvalidConfig(format!(
                "resolution must be in 1..={MAX_RESOLUTION}, got {}",
                self.resolution
            )));
        }
        if !self.spacing().is_finite() {
            return Err(RippleError::InvalidConfig(
                "cell spacing is not finite".to_string(),
            ));
        }
        if self.surface_subdivisions == 0 {
            return Err(RippleError::InvalidConfig(
                "surface mesh needs at least one subdivision".to_string(),
            ));
        }
        let WaveParams {
            damping,
            relaxation,
        } = self.wave;
        if !(0.0..1.0).contains(&damping) || damping == 0.0 {
            return Err(RippleError::InvalidConfig(format!(
                "damping must be in (0, 1), got {damping}"
            )));
        }
        if !(0.0..=1.0).contains(&relaxation) || relaxation == 0.0 {
            return Err(RippleError::InvalidConfig(format!(
                "relaxation must be in (0, 1], got {relaxation}"
            )));
        }
        for (name, drop) in [("press_drop", self.press_drop), ("move_drop", self.move_drop)] {
            if !is_positive(drop.radius) || !drop.strength.is_finite() {
                return Err(RippleError::InvalidConfig(format!(
                    "{name} needs a positive radius and finite strength"
                )));
            }
        }
        if !is_positive(self.seed.radius) || !self.seed.strength.is_finite() {
            return Err(RippleError::InvalidConfig(
                "seed drops need a positive radius and finite strength".to_string(),
            ));
        }
        let light_len = self.light.iter().map(|c| c * c).sum::<f32>().sqrt();
        if !is_positive(light_len) {
            return Err(RippleError::InvalidConfig(
                "light direction must be non-zero".to_string(),
            ));
        }
        let cam = &self.camera;
        if !is_positive(cam.near) || !is_positive(cam.far - cam.near) {
            return Err(RippleError::InvalidConfig(format!(
                "camera clip range {}..{} is empty",
                cam.near, cam.far
            )));
        }
        if cam.min_distance() > cam.max_distance() {
            return Err(RippleError::InvalidConfig(format!(
                "camera zoom range {}..{} is empty, widen the clip range {}..{}",
                cam.min_distance(),
                cam.max_distance(),
                cam.near,
                cam.far
            )));
        }
        if !(cam.max_polar_angle.is_finite()
            && cam.max_polar_angle > MIN_POLAR
            && cam.max_polar_angle <= std::f32::consts::FRAC_PI_2)
        {
            return Err(RippleError::InvalidConfig(format!(
                "max polar angle must be in ({MIN_POLAR}, pi/2], got {}",
                cam.max_polar_angle
            )));
        }
        if !(0.0..180.0).contains(&cam.fov_degrees) || cam.fov_degrees == 0.0 {
            return Err(RippleError::InvalidConfig(format!(
                "field of view must be in (0, 180) degrees, got {}",
                cam.fov_degrees
            )));
        }
        if let Some(secs) = self.asset_timeout_secs {
            if !(secs.is_finite() && secs > 0.0) {
                return Err(RippleError::InvalidConfig(format!(
                    "asset timeout must be positive, got {secs}"
                )));
            }
        }
        Ok(())
    }
}

fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_resolution_rejected() {
        let config = SimulationConfig {
            resolution: 0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RippleError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_damping_must_be_below_one() {
        let mut config = SimulationConfig::default();
        config.wave.damping = 1.0;
        assert!(config.validate().is_err());
        config.wave.damping = 0.0;
        assert!(config.validate().is_err());
        config.wave.damping = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_relaxation_range() {
        let mut config = SimulationConfig::default();
        config.wave.relaxation = 1.0;
        assert!(config.validate().is_ok());
        config.wave.relaxation = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_light_rejected() {
        let config = SimulationConfig {
            light: [0.0; 3],
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RippleError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_polar_limit_range() {
        let mut config = SimulationConfig::default();
        for angle in [0.0, MIN_POLAR, -1.0, 2.0, f32::NAN] {
            config.camera.max_polar_angle = angle;
            assert!(
                matches!(config.validate(), Err(RippleError::InvalidConfig(_))),
                "max polar angle {angle} accepted"
            );
        }
        config.camera.max_polar_angle = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zoom_range_must_be_non_empty() {
        let mut config = SimulationConfig::default();
        config.camera.near = 5.0;
        config.camera.far = 60.0;
        assert!(matches!(
            config.validate(),
            Err(RippleError::InvalidConfig(_))
        ));

        config.camera.far = 100.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_quality_changes_resolution_only() {
        let config = SimulationConfig::with_quality(QualityPreset::Low);
        assert_eq!(config.resolution, 128);
        assert_eq!(config.wave, WaveParams::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{ "resolution": 64 }"#).expect("valid json");
        assert_eq!(config.resolution, 64);
        assert_eq!(config.surface_subdivisions, 200);
        assert_eq!(config.press_drop.radius, 0.1);
    }
}
