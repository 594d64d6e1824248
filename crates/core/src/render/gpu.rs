//! wgpu render backend
//!
//! [`SceneResources`] owns everything that lives as long as the window:
//! pipelines, mesh buffers, textures and the depth target. Each frame borrows
//! it through a [`WgpuFrame`], which records one render pass per command into
//! a single encoder and submits on [`WgpuFrame::finish`].
//!
//! Pipelines are keyed by mesh and cull face because culling is fixed pipeline
//! state in wgpu. The water and pool shaders share one bind group layout:
//!
//! | Binding | Resource |
//! |---|---|
//! | 0 | shading uniforms |
//! | 1 | current height field (storage, read-only) |
//! | 2 | tile texture |
//! | 3 | linear sampler |
//! | 4 | sky cubemap |
//! | 5 | caustics texture |

use super::{CullFace, DrawCall, EnvironmentTextures, MeshKind, RenderBackend, ShadingState, TextureImage};
use crate::error::RippleResult;
use crate::mesh::Mesh;
use crate::solver::{FieldBuffers, GpuContext};
use bytemuck::{Pod, Zeroable};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::debug;
use wgpu::util::DeviceExt;

/// Depth buffer format
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const WATER_SHADER: &str = concat!(
    include_str!("shaders/common.wgsl"),
    include_str!("shaders/water.wgsl")
);
const POOL_SHADER: &str = concat!(
    include_str!("shaders/common.wgsl"),
    include_str!("shaders/pool.wgsl")
);

/// Shading uniforms (must match WGSL struct layout)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct ShadingUniform {
    view_projection: [[f32; 4]; 4],
    eye: [f32; 4],
    light: [f32; 4],
    // x: underwater flag, y: pool height, z: grid resolution
    params: [f32; 4],
}

impl From<&ShadingState> for ShadingUniform {
    fn from(state: &ShadingState) -> Self {
        Self {
            view_projection: state.view_projection.into(),
            eye: [state.eye.x, state.eye.y, state.eye.z, 1.0],
            light: [state.light.x, state.light.y, state.light.z, 0.0],
            params: [
                if state.underwater { 1.0 } else { 0.0 },
                state.pool_height,
                state.resolution as f32,
                0.0,
            ],
        }
    }
}

/// Vertex and index buffers of one mesh
struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, label: &str, mesh: &Mesh) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertices,
            indices,
            index_count: mesh.indices.len() as u32,
        }
    }
}

/// Long-lived GPU state for drawing the pool
pub struct SceneResources {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    layout: wgpu::BindGroupLayout,
    pipelines: FxHashMap<(MeshKind, CullFace), wgpu::RenderPipeline>,
    surface: GpuMesh,
    basin: GpuMesh,
    tiles: wgpu::TextureView,
    sky: wgpu::TextureView,
    caustics: wgpu::TextureView,
    sampler: wgpu::Sampler,
    depth: wgpu::TextureView,
}

impl SceneResources {
    /// Upload meshes and textures and build the pipelines
    ///
    /// # Arguments
    ///
    /// * `context` - Device shared with the simulation
    /// * `color_format` - Format of the frames drawn into
    /// * `surface` - Water surface grid
    /// * `basin` - Pool box
    /// * `textures` - Tiles, sky and caustics
    /// * `size` - Initial target size in pixels
    ///
    /// # Errors
    ///
    /// Returns `RippleError::InvalidConfig` if the sky faces differ in size.
    pub fn new(
        context: &GpuContext,
        color_format: wgpu::TextureFormat,
        surface: &Mesh,
        basin: &Mesh,
        textures: &EnvironmentTextures,
        size: (u32, u32),
    ) -> RippleResult<Self> {
        let device = Arc::clone(context.device());
        let queue = Arc::clone(context.queue());

        let sky_edge = textures.sky.edge()?;
        let sky_bytes: Vec<u8> = textures
            .sky
            .layers()
            .iter()
            .flat_map(|face| face.pixels().iter().copied())
            .collect();
        let sky = device
            .create_texture_with_data(
                &queue,
                &wgpu::TextureDescriptor {
                    label: Some("Sky Cubemap"),
                    size: wgpu::Extent3d {
                        width: sky_edge,
                        height: sky_edge,
                        depth_or_array_layers: 6,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: wgpu::TextureFormat::Rgba8UnormSrgb,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING,
                    view_formats: &[],
                },
                wgpu::util::TextureDataOrder::LayerMajor,
                &sky_bytes,
            )
            .create_view(&wgpu::TextureViewDescriptor {
                label: Some("Sky Cubemap View"),
                dimension: Some(wgpu::TextureViewDimension::Cube),
                ..Default::default()
            });

        let tiles = upload_image(&device, &queue, "Tiles", &textures.tiles);
        let caustics = upload_image(&device, &queue, "Caustics", &textures.caustics);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Linear Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let texture_entry = |binding: u32, view_dimension: wgpu::TextureViewDimension| {
            wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension,
                    multisampled: false,
                },
                count: None,
            }
        };

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Layout"),
            entries: &[
                // shading (binding 0)
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // water (binding 1)
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                texture_entry(2, wgpu::TextureViewDimension::D2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                texture_entry(4, wgpu::TextureViewDimension::Cube),
                texture_entry(5, wgpu::TextureViewDimension::D2),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let water_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Water Shader"),
            source: wgpu::ShaderSource::Wgsl(WATER_SHADER.into()),
        });
        let pool_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Pool Shader"),
            source: wgpu::ShaderSource::Wgsl(POOL_SHADER.into()),
        });

        let mut pipelines = FxHashMap::default();
        for mesh in [MeshKind::Surface, MeshKind::Basin] {
            let module = match mesh {
                MeshKind::Surface => &water_shader,
                MeshKind::Basin => &pool_shader,
            };
            for cull in [CullFace::Front, CullFace::Back] {
                let pipeline =
                    create_pipeline(&device, &pipeline_layout, module, color_format, cull);
                pipelines.insert((mesh, cull), pipeline);
            }
        }

        let surface = GpuMesh::upload(&device, "Surface Mesh", surface);
        let basin = GpuMesh::upload(&device, "Basin Mesh", basin);
        let depth = create_depth_view(&device, size);

        debug!(
            "Scene resources ready: {} surface indices, sky {}px",
            surface.index_count, sky_edge
        );

        Ok(Self {
            device,
            queue,
            layout,
            pipelines,
            surface,
            basin,
            tiles,
            sky,
            caustics,
            sampler,
            depth,
        })
    }

    /// Recreate the depth target for a new frame size
    pub fn resize(&mut self, width: u32, height: u32) {
        self.depth = create_depth_view(&self.device, (width, height));
    }

    /// Start recording a frame into `target`
    ///
    /// # Arguments
    ///
    /// * `target` - Colour attachment, same size as the last resize
    /// * `fields` - Height-field buffers named by the draw calls
    #[must_use]
    pub fn begin_frame<'a>(&'a self, target: &'a wgpu::TextureView, fields: FieldBuffers) -> WgpuFrame<'a> {
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        WgpuFrame {
            resources: self,
            target,
            fields,
            encoder,
        }
    }

    fn mesh(&self, kind: MeshKind) -> &GpuMesh {
        match kind {
            MeshKind::Surface => &self.surface,
            MeshKind::Basin => &self.basin,
        }
    }
}

/// One frame being recorded
pub struct WgpuFrame<'a> {
    resources: &'a SceneResources,
    target: &'a wgpu::TextureView,
    fields: FieldBuffers,
    encoder: wgpu::CommandEncoder,
}

impl WgpuFrame<'_> {
    /// Submit everything recorded
    pub fn finish(self) {
        self.resources
            .queue
            .submit(std::iter::once(self.encoder.finish()));
    }

    fn begin_pass(&mut self, label: &str, color: wgpu::LoadOp<wgpu::Color>, depth: wgpu::LoadOp<f32>) -> wgpu::RenderPass<'_> {
        self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.resources.depth,
                depth_ops: Some(wgpu::Operations {
                    load: depth,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        })
    }
}

impl RenderBackend for WgpuFrame<'_> {
    fn clear(&mut self, color: [f32; 4]) {
        let [r, g, b, a] = color.map(f64::from);
        let _pass = self.begin_pass(
            "Clear Pass",
            wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
            wgpu::LoadOp::Clear(1.0),
        );
    }

    fn submit(&mut self, call: &DrawCall) {
        let resources = self.resources;
        let Some(pipeline) = resources.pipelines.get(&(call.mesh, call.cull)) else {
            return;
        };
        let mesh = resources.mesh(call.mesh);

        let uniforms = resources
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Shading Uniforms"),
                contents: bytemuck::bytes_of(&ShadingUniform::from(&call.shading)),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let bind_group = resources
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Scene Bind Group"),
                layout: &resources.layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniforms.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: self.fields.get(call.field).as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&resources.tiles),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::Sampler(&resources.sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::TextureView(&resources.sky),
                    },
                    wgpu::BindGroupEntry {
                        binding: 5,
                        resource: wgpu::BindingResource::TextureView(&resources.caustics),
                    },
                ],
            });

        let mut pass = self.begin_pass("Draw Pass", wgpu::LoadOp::Load, wgpu::LoadOp::Load);
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.set_vertex_buffer(0, mesh.vertices.slice(..));
        pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..mesh.index_count, 0, 0..1);
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    color_format: wgpu::TextureFormat,
    cull: CullFace,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Scene Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![0 => Float32x3],
            }],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(match cull {
                CullFace::Front => wgpu::Face::Front,
                CullFace::Back => wgpu::Face::Back,
            }),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

fn create_depth_view(device: &wgpu::Device, (width, height): (u32, u32)) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Target"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

fn upload_image(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    image: &TextureImage,
) -> wgpu::TextureView {
    device
        .create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: image.width(),
                    height: image.height(),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            image.pixels(),
        )
        .create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<ShadingUniform>(), 112);
    }

    #[test]
    fn test_uniform_packs_flags() {
        let config = SimulationConfig::default();
        let mut state = ShadingState::from_config(&config);
        state.underwater = true;

        let uniform = ShadingUniform::from(&state);
        assert_eq!(uniform.params, [1.0, config.pool_height, 256.0, 0.0]);
        assert_eq!(uniform.light[3], 0.0);
        assert_eq!(uniform.view_projection[0][0], 1.0);
    }
}
