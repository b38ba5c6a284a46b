//! Core GPU context and device management.
//!
//! [`GpuContext`] owns the wgpu surface, device, queue, and surface
//! configuration. It is created explicitly from a window, passed by
//! reference to the frame renderer and the ray tracer, and never accessed
//! through global state. Everything else in the crate treats it as the
//! narrow interface to the GPU: resource creation, submission, presentation
//! geometry, and the shutdown drain.

use std::sync::Arc;
use winit::window::Window;

/// Options chosen at context creation.
#[derive(Clone, Copy, Debug)]
pub struct GpuOptions {
    /// Present with vsync (`Fifo`) or uncapped (`AutoNoVsync`).
    pub vsync: bool,
    /// Request the experimental ray-query feature (which includes
    /// acceleration structures) needed by [`RayTracer`](crate::RayTracer).
    pub raytracing: bool,
}

impl Default for GpuOptions {
    fn default() -> Self {
        Self {
            vsync: true,
            raytracing: false,
        }
    }
}

/// Core GPU context holding wgpu resources.
///
/// Fields are public for direct wgpu access when the engine's own surface is
/// not enough. Created once at startup; dropped only after
/// [`wait_idle`](Self::wait_idle).
pub struct GpuContext {
    /// The surface presenting rendered frames to the window.
    pub surface: wgpu::Surface<'static>,
    /// The logical device for creating GPU resources.
    pub device: wgpu::Device,
    /// The queue for submitting command buffers.
    pub queue: wgpu::Queue,
    /// Current surface configuration (format, size, present mode).
    pub config: wgpu::SurfaceConfiguration,
    vsync: bool,
}

impl GpuContext {
    /// Creates a context with default options (vsync on, no ray tracing).
    ///
    /// # Panics
    ///
    /// Panics if no suitable adapter is found or device creation fails; there
    /// is no rendering to fall back to at that point.
    pub fn new(window: Arc<Window>) -> Self {
        Self::with_options(window, GpuOptions::default())
    }

    /// Creates a context, optionally requesting the ray-tracing features.
    pub fn with_options(window: Arc<Window>, options: GpuOptions) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .expect("Failed to create surface");

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .expect("Failed to find a suitable GPU adapter");

        let required_features = if options.raytracing {
            wgpu::Features::EXPERIMENTAL_RAY_QUERY
        } else {
            wgpu::Features::empty()
        };

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Aspis Device"),
            required_features,
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        }))
        .expect("Failed to create device");

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: Self::present_mode(options.vsync),
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        log::info!(
            "gpu context ready: {}x{} {:?} vsync={}",
            size.width,
            size.height,
            surface_format,
            options.vsync
        );

        Self {
            surface,
            device,
            queue,
            config,
            vsync: options.vsync,
        }
    }

    fn present_mode(vsync: bool) -> wgpu::PresentMode {
        if vsync {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::AutoNoVsync
        }
    }

    /// Resizes the surface. Zero-sized dimensions are ignored (window
    /// minimize produces them and wgpu rejects them).
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Current surface width in pixels.
    pub fn width(&self) -> u32 {
        self.config.width
    }

    /// Current surface height in pixels.
    pub fn height(&self) -> u32 {
        self.config.height
    }

    /// Current aspect ratio (width / height).
    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }

    /// Whether presentation is vsync-gated.
    pub fn vsync(&self) -> bool {
        self.vsync
    }

    /// Whether the device was created with the ray-query feature (which
    /// carries acceleration-structure support).
    pub fn supports_raytracing(&self) -> bool {
        self.device
            .features()
            .contains(wgpu::Features::EXPERIMENTAL_RAY_QUERY)
    }

    /// Blocks until all submitted GPU work has completed.
    ///
    /// The one mandatory wait outside the steady-state frame loop: call it
    /// before tearing down anything the GPU may still be reading.
    pub fn wait_idle(&self) {
        if let Err(err) = self.device.poll(wgpu::PollType::wait_indefinitely()) {
            log::warn!("wait_idle: device poll failed: {err}");
        }
    }
}
