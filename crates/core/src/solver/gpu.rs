//! GPU-based wave solver implementation
//!
//! This module provides a GPU implementation of the `WaveSolver` trait using
//! wgpu compute shaders and storage buffers. This backend is only available
//! when the `gpu` feature is enabled.
//!
//! # Shader Files
//!
//! GPU compute shaders are located in `shaders/`:
//! - `drop.wgsl` - Raised-cosine drop injection
//! - `update.wgsl` - Damped neighbour-averaging step
//! - `normals.wgsl` - Finite-difference surface normals
//!
//! # Implementation
//!
//! Each field is a storage buffer of `vec4<f32>` texels laid out exactly like
//! [`Texel`]. The two buffers form a [`BufferPair`]; every pass binds the
//! current buffer read-only and the other read-write, then swaps. Buffers are
//! reference counted so the renderer can bind them without borrowing the
//! solver. A staging buffer handles CPU readback.

use super::context::GpuContext;
use super::WaveSolver;
use crate::config::SimulationConfig;
use crate::error::{RippleError, RippleResult};
use crate::field::{BufferPair, FieldId, Texel};
use crate::interaction::Disturbance;
use bytemuck::{Pod, Zeroable};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::debug;
use wgpu::util::DeviceExt;

/// Workgroup edge, must match `@workgroup_size` in the shaders
const WORKGROUP_SIZE: u32 = 16;

/// Drop shader parameters (must match WGSL struct layout)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct DropParams {
    resolution: u32,
    center_x: f32,
    center_z: f32,
    radius: f32,
    strength: f32,
    _padding: [f32; 3],
}

/// Update shader parameters (must match WGSL struct layout)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct UpdateParams {
    resolution: u32,
    damping: f32,
    relaxation: f32,
    _padding: f32,
}

/// Normal shader parameters (must match WGSL struct layout)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct NormalParams {
    resolution: u32,
    delta: f32,
    _padding: [f32; 2],
}

/// Shared handles to both field buffers
///
/// Renderers hold this to bind whichever buffer a draw call names.
#[derive(Debug, Clone)]
pub struct FieldBuffers {
    a: Arc<wgpu::Buffer>,
    b: Arc<wgpu::Buffer>,
}

impl FieldBuffers {
    /// Buffer by identity
    #[must_use]
    pub fn get(&self, id: FieldId) -> &wgpu::Buffer {
        match id {
            FieldId::A => &self.a,
            FieldId::B => &self.b,
        }
    }
}

/// Which compute pass to dispatch
#[derive(Debug, Clone, Copy)]
enum Pass {
    Drop,
    Update,
    Normals,
}

/// Pipelines and uniforms for the three passes
///
/// Kept apart from the field buffers so a pass can borrow both at once.
struct PassKernels {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,

    drop_params_buffer: wgpu::Buffer,
    update_params_buffer: wgpu::Buffer,
    normal_params_buffer: wgpu::Buffer,

    drop_pipeline: wgpu::ComputePipeline,
    update_pipeline: wgpu::ComputePipeline,
    normal_pipeline: wgpu::ComputePipeline,

    // All three passes share one layout: src, dst, params
    bind_group_layout: wgpu::BindGroupLayout,

    workgroups: u32,
}

impl PassKernels {
    /// Dispatch one full-field pass from the current buffer into the other
    fn run(&self, pass: Pass, fields: &mut BufferPair<Arc<wgpu::Buffer>>) {
        let (label, pipeline, params) = match pass {
            Pass::Drop => ("Drop Pass", &self.drop_pipeline, &self.drop_params_buffer),
            Pass::Update => (
                "Update Pass",
                &self.update_pipeline,
                &self.update_params_buffer,
            ),
            Pass::Normals => (
                "Normal Pass",
                &self.normal_pipeline,
                &self.normal_params_buffer,
            ),
        };

        fields.pass(|read, write| {
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: read.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: write.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: params.as_entire_binding(),
                    },
                ],
            });

            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });

            {
                let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some(label),
                    timestamp_writes: None,
                });

                compute_pass.set_pipeline(pipeline);
                compute_pass.set_bind_group(0, &bind_group, &[]);
                compute_pass.dispatch_workgroups(self.workgroups, self.workgroups, 1);
            }

            self.queue.submit(std::iter::once(encoder.finish()));
        });
    }
}

/// GPU-based wave solver using wgpu compute shaders
pub struct GpuWaveSolver {
    kernels: PassKernels,
    fields: BufferPair<Arc<wgpu::Buffer>>,
    staging: wgpu::Buffer,
    resolution: u32,
}

impl GpuWaveSolver {
    /// Create a new GPU wave solver with a flat field
    ///
    /// Allocates both field buffers, loads shaders and creates the compute
    /// pipelines.
    ///
    /// # Arguments
    ///
    /// * `context` - GPU context with device and queue
    /// * `config` - Simulation configuration
    ///
    /// # Errors
    ///
    /// Returns `RippleError::InvalidConfig` for an invalid configuration and
    /// `RippleError::Gpu` if the field does not fit on the device.
    pub fn new(context: &GpuContext, config: &SimulationConfig) -> RippleResult<Self> {
        config.validate()?;
        let resolution = config.resolution;
        if !context.can_allocate(resolution) {
            return Err(RippleError::Gpu(format!(
                "{resolution}x{resolution} field exceeds device limits"
            )));
        }

        let device = Arc::clone(context.device());
        let queue = Arc::clone(context.queue());

        let texel_count = (resolution * resolution) as usize;
        let buffer_size = (texel_count * std::mem::size_of::<Texel>()) as u64;
        let initial = vec![Texel::default(); texel_count];

        let field_usage =
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST;

        let field_a = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Height Field A"),
            contents: bytemuck::cast_slice(&initial),
            usage: field_usage,
        });

        let field_b = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Height Field B"),
            contents: bytemuck::cast_slice(&initial),
            usage: field_usage,
        });

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Height Field Staging"),
            size: buffer_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let drop_params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Drop Params"),
            size: std::mem::size_of::<DropParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let update_params = UpdateParams {
            resolution,
            damping: config.wave.damping,
            relaxation: config.wave.relaxation,
            _padding: 0.0,
        };
        let update_params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Update Params"),
            contents: bytemuck::bytes_of(&update_params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let normal_params = NormalParams {
            resolution,
            delta: config.spacing(),
            _padding: [0.0; 2],
        };
        let normal_params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Normal Params"),
            contents: bytemuck::bytes_of(&normal_params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        // Load shaders using wgpu::include_wgsl! macro
        let drop_shader = device.create_shader_module(wgpu::include_wgsl!("shaders/drop.wgsl"));
        let update_shader =
            device.create_shader_module(wgpu::include_wgsl!("shaders/update.wgsl"));
        let normal_shader =
            device.create_shader_module(wgpu::include_wgsl!("shaders/normals.wgsl"));

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Height Field Pass Layout"),
            entries: &[
                // src (binding 0)
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // dst (binding 1)
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // params (binding 2)
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Height Field Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let make_pipeline = |label: &str, module: &wgpu::ShaderModule| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                module,
                entry_point: Some("main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            })
        };

        let drop_pipeline = make_pipeline("Drop Pipeline", &drop_shader);
        let update_pipeline = make_pipeline("Update Pipeline", &update_shader);
        let normal_pipeline = make_pipeline("Normal Pipeline", &normal_shader);

        debug!("GPU wave solver ready ({}x{} field)", resolution, resolution);

        Ok(Self {
            kernels: PassKernels {
                device,
                queue,
                drop_params_buffer,
                update_params_buffer,
                normal_params_buffer,
                drop_pipeline,
                update_pipeline,
                normal_pipeline,
                bind_group_layout,
                workgroups: resolution.div_ceil(WORKGROUP_SIZE),
            },
            fields: BufferPair::new(Arc::new(field_a), Arc::new(field_b)),
            staging,
            resolution,
        })
    }

    /// Shared handles to both field buffers
    #[must_use]
    pub fn field_buffers(&self) -> FieldBuffers {
        FieldBuffers {
            a: Arc::clone(self.fields.get(FieldId::A)),
            b: Arc::clone(self.fields.get(FieldId::B)),
        }
    }

    fn buffer_size(&self) -> u64 {
        u64::from(self.resolution * self.resolution) * std::mem::size_of::<Texel>() as u64
    }
}

impl WaveSolver for GpuWaveSolver {
    fn add_drop(&mut self, drop: &Disturbance) {
        let params = DropParams {
            resolution: self.resolution,
            center_x: drop.center[0],
            center_z: drop.center[1],
            radius: drop.radius,
            strength: drop.strength,
            _padding: [0.0; 3],
        };
        self.kernels.queue.write_buffer(
            &self.kernels.drop_params_buffer,
            0,
            bytemuck::bytes_of(&params),
        );
        self.kernels.run(Pass::Drop, &mut self.fields);
    }

    fn step_simulation(&mut self) {
        self.kernels.run(Pass::Update, &mut self.fields);
    }

    fn update_normals(&mut self) {
        self.kernels.run(Pass::Normals, &mut self.fields);
    }

    fn read_field(&self) -> RippleResult<Cow<'_, [Texel]>> {
        let buffer_size = self.buffer_size();

        let mut encoder =
            self.kernels
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Height Field Readback Encoder"),
                });
        encoder.copy_buffer_to_buffer(self.fields.current(), 0, &self.staging, 0, buffer_size);
        self.kernels.queue.submit(std::iter::once(encoder.finish()));

        // Map and read
        let buffer_slice = self.staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            // Receiver outlives the poll below
            let _ = tx.send(result);
        });

        let _ = self.kernels.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| RippleError::Gpu(format!("readback channel closed: {e}")))?
            .map_err(|e| RippleError::Gpu(format!("failed to map staging buffer: {e}")))?;

        let data = buffer_slice.get_mapped_range();
        let result: Vec<Texel> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        self.staging.unmap();

        Ok(Cow::Owned(result))
    }

    fn load_field(&mut self, texels: &[Texel]) -> RippleResult<()> {
        let expected = (self.resolution * self.resolution) as usize;
        if texels.len() != expected {
            return Err(RippleError::FieldSize {
                expected,
                actual: texels.len(),
            });
        }
        let bytes = bytemuck::cast_slice(texels);
        self.kernels
            .queue
            .write_buffer(self.fields.get(FieldId::A), 0, bytes);
        self.kernels
            .queue
            .write_buffer(self.fields.get(FieldId::B), 0, bytes);
        Ok(())
    }

    fn current_id(&self) -> FieldId {
        self.fields.current_id()
    }

    fn resolution(&self) -> u32 {
        self.resolution
    }

    fn is_gpu_accelerated(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::context::GpuInitResult;

    fn config(resolution: u32) -> SimulationConfig {
        SimulationConfig {
            resolution,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_gpu_solver_creation() {
        // Only run if GPU is available
        if let GpuInitResult::Success(context) = GpuContext::new() {
            let solver = GpuWaveSolver::new(&context, &config(64)).unwrap();
            assert_eq!(solver.resolution(), 64);
            assert!(solver.is_gpu_accelerated());
            assert_eq!(solver.current_id(), FieldId::A);
        }
    }

    #[test]
    fn test_gpu_solver_starts_flat() {
        if let GpuInitResult::Success(context) = GpuContext::new() {
            let solver = GpuWaveSolver::new(&context, &config(32)).unwrap();
            let field = solver.read_field().unwrap();
            assert_eq!(field.len(), 32 * 32);
            assert!(field.iter().all(|t| *t == Texel::default()));
        }
    }

    #[test]
    fn test_gpu_solver_rejects_invalid_config() {
        if let GpuInitResult::Success(context) = GpuContext::new() {
            assert!(matches!(
                GpuWaveSolver::new(&context, &config(0)),
                Err(RippleError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_gpu_load_field_round_trips() {
        if let GpuInitResult::Success(context) = GpuContext::new() {
            let mut solver = GpuWaveSolver::new(&context, &config(16)).unwrap();
            let texels: Vec<Texel> = (0..256).map(|i| Texel::with_height(i as f32)).collect();
            solver.load_field(&texels).unwrap();
            assert_eq!(solver.read_field().unwrap().as_ref(), texels.as_slice());
        }
    }
}
