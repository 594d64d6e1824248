//! GPU context and initialization
//!
//! This module handles GPU device initialization and capability detection.
//! It distinguishes between "no GPU found" (expected on some systems) and
//! "GPU found but failed to initialize" (potential driver issue).

/// Result of GPU initialization attempt
///
/// This enum distinguishes between different failure modes:
/// - `NoGpuFound`: No compatible GPU adapter (silent fallback to CPU)
/// - `InitFailed`: GPU found but initialization failed (log warning)
#[derive(Debug)]
pub enum GpuInitResult {
    /// GPU initialized successfully
    #[cfg(feature = "gpu")]
    Success(GpuContext),
    /// No GPU adapter found (silent fallback to CPU)
    NoGpuFound,
    /// GPU found but initialization failed (log warning, fallback to CPU)
    InitFailed {
        /// Name of the adapter that failed
        adapter_name: String,
        /// Error message
        error: String,
    },
}

// All GPU-specific code is conditionally compiled only when "gpu" feature is enabled
#[cfg(feature = "gpu")]
mod gpu_impl {
    use super::GpuInitResult;
    use std::sync::Arc;
    use tracing::{debug, info};

    /// Bytes per texel: four `f32` channels
    const TEXEL_BYTES: u64 = 16;

    /// GPU context managing device and queue
    ///
    /// Device and queue are reference counted so the simulation and the
    /// renderer of a window can share one device.
    #[derive(Debug, Clone)]
    pub struct GpuContext {
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        adapter_info: wgpu::AdapterInfo,
    }

    impl GpuContext {
        /// Initialize a headless GPU context
        ///
        /// # Returns
        ///
        /// - `GpuInitResult::Success` - GPU ready to use
        /// - `GpuInitResult::NoGpuFound` - No compatible GPU adapter
        /// - `GpuInitResult::InitFailed` - GPU found but initialization failed
        #[allow(clippy::new_ret_no_self)]
        pub fn new() -> GpuInitResult {
            info!("Attempting to initialize GPU context");

            let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });

            let adapter = if let Some(a) =
                pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })) {
                debug!("Found GPU adapter: {}", a.get_info().name);
                a
            } else {
                debug!("No GPU adapter found");
                return GpuInitResult::NoGpuFound;
            };

            let adapter_info = adapter.get_info();
            let adapter_name = adapter_info.name.clone();

            // Creating the device can fail even with a valid adapter
            match pollster::block_on(adapter.request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Ripple GPU"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )) {
                Ok((device, queue)) => {
                    info!("GPU context initialized successfully: {}", adapter_name);
                    GpuInitResult::Success(Self {
                        device: Arc::new(device),
                        queue: Arc::new(queue),
                        adapter_info,
                    })
                }
                Err(e) => {
                    debug!("Failed to create GPU device: {}", e);
                    GpuInitResult::InitFailed {
                        adapter_name,
                        error: e.to_string(),
                    }
                }
            }
        }

        /// Wrap a device created elsewhere, e.g. for a window surface
        #[must_use]
        pub fn from_parts(
            device: Arc<wgpu::Device>,
            queue: Arc<wgpu::Queue>,
            adapter_info: wgpu::AdapterInfo,
        ) -> Self {
            Self {
                device,
                queue,
                adapter_info,
            }
        }

        /// Get adapter name for logging
        #[must_use]
        pub fn adapter_name(&self) -> &str {
            &self.adapter_info.name
        }

        /// Check if the device can hold a ping-pong pair of the given size
        ///
        /// Each field is one storage buffer of `resolution²` texels, so the
        /// binding limit is the constraint that matters.
        ///
        /// # Arguments
        ///
        /// * `resolution` - Grid edge length in texels
        #[must_use]
        pub fn can_allocate(&self, resolution: u32) -> bool {
            let field_bytes = u64::from(resolution) * u64::from(resolution) * TEXEL_BYTES;
            let limits = self.device.limits();

            field_bytes <= u64::from(limits.max_storage_buffer_binding_size)
                && field_bytes <= limits.max_buffer_size
        }

        /// Get reference to wgpu device
        #[must_use]
        pub fn device(&self) -> &Arc<wgpu::Device> {
            &self.device
        }

        /// Get reference to wgpu queue
        #[must_use]
        pub fn queue(&self) -> &Arc<wgpu::Queue> {
            &self.queue
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_gpu_init_returns_valid_result() {
            // Which variant comes back depends on the machine
            match GpuContext::new() {
                GpuInitResult::Success(ctx) => {
                    assert!(!ctx.adapter_name().is_empty());
                }
                GpuInitResult::NoGpuFound => {}
                GpuInitResult::InitFailed {
                    adapter_name,
                    error,
                } => {
                    assert!(!adapter_name.is_empty());
                    assert!(!error.is_empty());
                }
            }
        }

        #[test]
        fn test_can_allocate() {
            if let GpuInitResult::Success(ctx) = GpuContext::new() {
                assert!(ctx.can_allocate(256));
                // 64k² texels is far beyond any binding limit
                assert!(!ctx.can_allocate(65_536));
            }
        }
    }
}

// Re-export GpuContext only when GPU feature is enabled
#[cfg(feature = "gpu")]
pub use gpu_impl::GpuContext;
