//! Ripple Pool Core Library
//!
//! A real-time water surface simulation: a height field is disturbed by
//! drops, relaxed towards rest each frame, and drawn as a reflective,
//! refractive surface inside a tiled pool.
//!
//! ## Architecture
//!
//! - [`field`]: height-field texels and the ping-pong [`BufferPair`]
//! - [`solver`]: the simulation stage with CPU (rayon) and GPU (wgpu) backends
//! - [`render`]: surface and basin renderers behind a [`RenderBackend`] seam
//! - [`interaction`] and [`camera`]: pointer picking and the orbit camera
//! - [`driver`]: the loading/running state machine and per-frame ordering
//! - [`assets`]: concurrent asset loading joined before the scene starts
//!
//! Nothing is global: the solver, scene and driver are plain values passed
//! into each operation.

pub mod assets;
pub mod camera;
pub mod config;
pub mod driver;
pub mod error;
pub mod field;
pub mod interaction;
pub mod mesh;
pub mod render;
pub mod solver;

// Re-export the types most callers need
pub use assets::AssetBarrier;
pub use camera::{OrbitCamera, Ray};
pub use config::{SimulationConfig, WaveParams};
pub use driver::{seed_drops, DriverState, FrameDriver, FrameOutcome, Scene};
pub use error::{RippleError, RippleResult};
pub use field::{height_at, height_energy, BufferPair, FieldId, HeightField, Texel};
pub use interaction::{Disturbance, Interaction, PickMiss, PointerEvent, Viewport};
pub use mesh::Mesh;
pub use render::{CommandList, RenderBackend};
pub use solver::{create_water_solver, CpuWaveSolver, QualityPreset, WaveSolver};

#[cfg(feature = "gpu")]
pub use solver::{GpuContext, GpuWaveSolver};
