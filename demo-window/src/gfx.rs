//! Window surface and the device shared with the simulation

use ripple_core::{GpuContext, RippleError, RippleResult};
use std::sync::Arc;
use tracing::info;
use winit::window::Window;

/// Presentable surface plus the device it was created with
pub struct Gfx {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    context: GpuContext,
}

impl Gfx {
    /// Create a device able to present to `window`
    ///
    /// # Errors
    ///
    /// Returns `RippleError::Gpu` if no adapter or device is available.
    pub async fn new(window: Arc<Window>) -> RippleResult<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| RippleError::Gpu(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| RippleError::Gpu("no adapter can present to this window".to_string()))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Ripple Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(|e| RippleError::Gpu(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(wgpu::TextureFormat::is_srgb)
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| RippleError::Gpu("surface reports no formats".to_string()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            // One frame per display refresh
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let info = adapter.get_info();
        info!("Presenting with {} ({:?})", info.name, info.backend);

        Ok(Self {
            surface,
            config,
            context: GpuContext::from_parts(Arc::new(device), Arc::new(queue), info),
        })
    }

    /// Device and queue
    pub fn context(&self) -> &GpuContext {
        &self.context
    }

    /// Colour format of the frames
    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Current frame size
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Reconfigure for a new window size; zero sizes are ignored
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.config.width = width;
        self.config.height = height;
        self.reconfigure();
        true
    }

    /// Apply the current configuration again, e.g. after the surface was lost
    pub fn reconfigure(&self) {
        self.surface.configure(self.context.device(), &self.config);
    }

    /// Next frame to draw into
    ///
    /// # Errors
    ///
    /// Passes through the surface error.
    pub fn acquire(&self) -> Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
        self.surface.get_current_texture()
    }
}
