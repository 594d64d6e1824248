//! Height-field simulation stage
//!
//! This module provides a unified GPU/CPU abstraction for the three
//! full-field passes (drop, step, normals). The core abstraction is the
//! `WaveSolver` trait, which has both CPU and GPU implementations.
//!
//! # Feature Flags
//!
//! - `gpu` (default): Enables GPU acceleration via wgpu. Disable with `--no-default-features`
//!   for environments without GPU access.
//!
//! # Backend Selection
//!
//! The system automatically selects the best available backend:
//! 1. Try GPU (if `gpu` feature enabled and hardware available)
//! 2. Fall back to CPU (always available)
//!
//! # Example
//!
//! ```rust,ignore
//! use ripple_core::solver::create_water_solver;
//! use ripple_core::{Disturbance, SimulationConfig};
//!
//! let mut solver = create_water_solver(&SimulationConfig::default())?;
//! solver.add_drop(&Disturbance::new([0.0, 0.0], 0.1, 0.1));
//! solver.step_simulation();
//! solver.update_normals();
//! ```

mod context;
mod cpu;
pub mod kernels;
pub mod profiler;
mod quality;
mod r#trait;

#[cfg(feature = "gpu")]
mod gpu;

// Re-exports
pub use context::GpuInitResult;
pub use cpu::CpuWaveSolver;
pub use profiler::{FrameTimer, ProfilerScope};
pub use quality::QualityPreset;
pub use r#trait::WaveSolver;

#[cfg(feature = "gpu")]
pub use context::GpuContext;
#[cfg(feature = "gpu")]
pub use gpu::{FieldBuffers, GpuWaveSolver};

use crate::config::SimulationConfig;
use crate::error::RippleResult;
use tracing::info;

#[cfg(feature = "gpu")]
use tracing::warn;

/// Create a wave solver with automatic backend selection
///
/// This function tries to use GPU acceleration if available, falling back to
/// CPU otherwise.
///
/// # Arguments
///
/// * `config` - Simulation configuration; validated before any allocation
///
/// # Returns
///
/// A boxed `WaveSolver` trait object using the best available backend
///
/// # Errors
///
/// Returns `RippleError::InvalidConfig` if the configuration is invalid.
/// GPU failures are not errors: they are logged and the CPU backend is used.
pub fn create_water_solver(config: &SimulationConfig) -> RippleResult<Box<dyn WaveSolver>> {
    config.validate()?;

    #[cfg(feature = "gpu")]
    {
        match GpuContext::new() {
            GpuInitResult::Success(gpu_context) => {
                match GpuWaveSolver::new(&gpu_context, config) {
                    Ok(solver) => {
                        info!(
                            "Using GPU backend: {} ({}x{} grid)",
                            gpu_context.adapter_name(),
                            config.resolution,
                            config.resolution
                        );
                        return Ok(Box::new(solver));
                    }
                    Err(e) => {
                        warn!("{}, falling back to CPU", e);
                    }
                }
            }
            GpuInitResult::NoGpuFound => {
                info!("No GPU found, using CPU backend");
            }
            GpuInitResult::InitFailed {
                adapter_name,
                error,
            } => {
                warn!(
                    "GPU '{}' found but failed to initialize: {}. Falling back to CPU.",
                    adapter_name, error
                );
            }
        }
    }

    #[cfg(not(feature = "gpu"))]
    info!("GPU feature disabled, using CPU backend");

    Ok(Box::new(CpuWaveSolver::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RippleError;

    #[test]
    fn test_create_rejects_invalid_config() {
        let config = SimulationConfig {
            resolution: 0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            create_water_solver(&config),
            Err(RippleError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_create_any_backend() {
        let config = SimulationConfig {
            resolution: 32,
            ..SimulationConfig::default()
        };
        let solver = create_water_solver(&config).unwrap();
        assert_eq!(solver.resolution(), 32);
    }
}
