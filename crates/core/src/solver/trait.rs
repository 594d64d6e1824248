//! Wave solver trait definition
//!
//! This module defines the `WaveSolver` trait, the backend-agnostic interface
//! of the simulation stage. Both CPU and GPU implementations implement it.

use crate::error::RippleResult;
use crate::field::{FieldId, Texel};
use crate::interaction::Disturbance;
use std::borrow::Cow;

/// Backend-agnostic interface for the height-field simulation
///
/// Every mutating operation is one full-field pass: it reads the current
/// buffer, writes the other one and swaps. After it returns, `current_id`
/// names the buffer that was written.
pub trait WaveSolver: Send + Sync {
    /// Add a raised-cosine drop to the height field
    ///
    /// # Arguments
    ///
    /// * `drop` - Centre in `[-1, 1]²`, radius in texture space and signed strength
    fn add_drop(&mut self, drop: &Disturbance);

    /// Advance the height field by one damped relaxation step
    fn step_simulation(&mut self);

    /// Recompute the normal channels from the current heights
    ///
    /// Height and velocity are carried over unchanged.
    fn update_normals(&mut self);

    /// Read the current field
    ///
    /// # Returns
    ///
    /// Texels in row-major order. CPU backend returns a borrowed slice, GPU
    /// backend returns an owned copy read back from the device.
    ///
    /// # Errors
    ///
    /// Returns `RippleError::Gpu` if the device readback fails.
    fn read_field(&self) -> RippleResult<Cow<'_, [Texel]>>;

    /// Replace both buffers with the given texels
    ///
    /// # Errors
    ///
    /// Returns `RippleError::FieldSize` if `texels` does not cover the grid.
    fn load_field(&mut self, texels: &[Texel]) -> RippleResult<()>;

    /// Identity of the buffer holding the latest field
    fn current_id(&self) -> FieldId;

    /// Grid edge length in texels
    fn resolution(&self) -> u32;

    /// Check if this is the GPU backend
    fn is_gpu_accelerated(&self) -> bool;
}
