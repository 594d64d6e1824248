//! CPU-based wave solver implementation
//!
//! This module provides a CPU implementation of the `WaveSolver` trait using
//! `Vec<Texel>` fields and Rayon for parallelism. This backend is always
//! available and serves as a fallback when GPU acceleration is not available.

use super::kernels::{add_drop_cpu, step_simulation_cpu, update_normals_cpu};
use super::WaveSolver;
use crate::config::{SimulationConfig, WaveParams};
use crate::error::{RippleError, RippleResult};
use crate::field::{BufferPair, FieldId, HeightField, Texel};
use crate::interaction::Disturbance;
use std::borrow::Cow;

/// CPU-based wave solver using Rayon for parallelism
pub struct CpuWaveSolver {
    fields: BufferPair<HeightField>,
    resolution: usize,
    wave: WaveParams,
}

impl CpuWaveSolver {
    /// Create a new CPU wave solver with a flat field
    ///
    /// # Errors
    ///
    /// Returns `RippleError::InvalidConfig` if the configuration is invalid.
    pub fn new(config: &SimulationConfig) -> RippleResult<Self> {
        config.validate()?;
        let resolution = config.resolution as usize;
        Ok(Self {
            fields: BufferPair::new(HeightField::new(resolution), HeightField::new(resolution)),
            resolution,
            wave: config.wave,
        })
    }

    /// Borrow the current field
    #[must_use]
    pub fn field(&self) -> &HeightField {
        self.fields.current()
    }
}

impl WaveSolver for CpuWaveSolver {
    fn add_drop(&mut self, drop: &Disturbance) {
        let n = self.resolution;
        self.fields.pass(|read, write| {
            add_drop_cpu(read.as_slice(), write.as_mut_slice(), n, drop);
        });
    }

    fn step_simulation(&mut self) {
        let n = self.resolution;
        let wave = self.wave;
        self.fields.pass(|read, write| {
            step_simulation_cpu(read.as_slice(), write.as_mut_slice(), n, wave);
        });
    }

    fn update_normals(&mut self) {
        let n = self.resolution;
        self.fields.pass(|read, write| {
            update_normals_cpu(read.as_slice(), write.as_mut_slice(), n);
        });
    }

    fn read_field(&self) -> RippleResult<Cow<'_, [Texel]>> {
        Ok(Cow::Borrowed(self.fields.current().as_slice()))
    }

    fn load_field(&mut self, texels: &[Texel]) -> RippleResult<()> {
        let expected = self.resolution * self.resolution;
        if texels.len() != expected {
            return Err(RippleError::FieldSize {
                expected,
                actual: texels.len(),
            });
        }
        let (a, b) = self.fields.both_mut();
        a.copy_from(texels)?;
        b.copy_from(texels)
    }

    fn current_id(&self) -> FieldId {
        self.fields.current_id()
    }

    fn resolution(&self) -> u32 {
        self.resolution as u32
    }

    fn is_gpu_accelerated(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            resolution: 32,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_cpu_solver_creation() {
        let solver = CpuWaveSolver::new(&small_config()).unwrap();
        assert_eq!(solver.resolution(), 32);
        assert!(!solver.is_gpu_accelerated());
        assert_eq!(solver.current_id(), FieldId::A);
        assert_eq!(solver.read_field().unwrap().len(), 32 * 32);
    }

    #[test]
    fn test_invalid_resolution_rejected() {
        let config = SimulationConfig {
            resolution: 0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            CpuWaveSolver::new(&config),
            Err(RippleError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_every_operation_swaps() {
        let mut solver = CpuWaveSolver::new(&small_config()).unwrap();
        let drop = Disturbance::new([0.2, -0.3], 0.1, 0.5);

        let before = solver.current_id();
        solver.add_drop(&drop);
        assert_ne!(solver.current_id(), before);

        let before = solver.current_id();
        solver.step_simulation();
        assert_ne!(solver.current_id(), before);

        let before = solver.current_id();
        solver.update_normals();
        assert_ne!(solver.current_id(), before);
    }

    #[test]
    fn test_load_field_checks_size() {
        let mut solver = CpuWaveSolver::new(&small_config()).unwrap();
        assert!(matches!(
            solver.load_field(&[Texel::default(); 3]),
            Err(RippleError::FieldSize { .. })
        ));

        let texels = vec![Texel::with_height(0.5); 32 * 32];
        solver.load_field(&texels).unwrap();
        assert_eq!(solver.field().get(5, 7).height, 0.5);

        // Both buffers hold the upload
        solver.update_normals();
        assert_eq!(solver.field().get(5, 7).height, 0.5);
    }
}
