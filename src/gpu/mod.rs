//! GPU state and per-frame rendering.
//!
//! A frame runs three stages: the [`AdvectPass`] moves particles, the
//! [`TrailPass`] rasterizes them into the newest trail slot, and the final
//! pass layers the surface bottom to top: [`BaseMapPass`], [`SpeedPass`],
//! the composited trail ring, then the [`VectorPass`] arrows.

mod advect;
mod basemap;
mod speed;
mod trails;
mod vectors;

use std::sync::Arc;

use rand::Rng;
use tracing::info;
use winit::window::Window;

pub use advect::pack_particles;
use advect::AdvectPass;
use basemap::BaseMapPass;
use speed::SpeedPass;
use trails::TrailPass;
use vectors::VectorPass;

use crate::basemap::BaseMap;
use crate::config::WindConfig;
use crate::error::GpuError;
use crate::field::VectorField;
use crate::particles::ParticleSet;
use crate::projection::Viewport;

const WORKGROUP_SIZE: u32 = 256;
const TRAIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;

/// Color outside the globe and where no layer draws.
pub const BACKGROUND: [f32; 4] = [0.02, 0.02, 0.05, 1.0];
pub const PARTICLE_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 0.9];

fn buffer_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    ty: wgpu::BufferBindingType,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Everything a frame needs from the app loop.
#[derive(Debug, Clone, Copy)]
pub struct FrameParams {
    pub viewport: Viewport,
    /// Simulated milliseconds; 0 while paused.
    pub dt_ms: f32,
    pub draw_count: u32,
    pub display_particles: bool,
    pub display_speeds: bool,
    pub display_vectors: bool,
    /// Scatter every particle before drawing.
    pub scatter: bool,
    pub frame: u64,
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    advect: AdvectPass,
    trails: TrailPass,
    speed: SpeedPass,
    base_map: BaseMapPass,
    vectors: VectorPass,
    speed_opacity: f32,
}

impl GpuState {
    pub async fn new(
        window: Arc<Window>,
        settings: &WindConfig,
        viewport: Viewport,
    ) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;
        let adapter_info = adapter.get_info();
        info!(adapter = %adapter_info.name, backend = ?adapter_info.backend, "selected GPU adapter");

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let Some(&first_format) = surface_caps.formats.first() else {
            return Err(GpuError::NoAdapter);
        };
        // Colormap output is already sRGB encoded
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .copied()
            .unwrap_or(first_format);
        info!(format = ?surface_format, "configured surface");

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let advect = AdvectPass::new(&device, settings.max_particles, settings.lifetime_ms);
        let trails = TrailPass::new(
            &device,
            surface_format,
            viewport,
            settings.trail_frames,
            settings.point_size,
        );
        let speed = SpeedPass::new(&device, surface_format, settings.heatmap_size as u32);
        let base_map = BaseMapPass::new(&device, surface_format);
        let vectors = VectorPass::new(&device, surface_format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            advect,
            trails,
            speed,
            base_map,
            vectors,
            speed_opacity: settings.speed_opacity,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>, viewport: Viewport) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.trails.resize(&self.device, viewport);
        }
    }

    /// Reconfigure after the surface was lost or went out of date.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Publish a new wind snapshot to the advection, speed and arrow passes.
    pub fn set_field(&mut self, field: &VectorField, max_speed: f32) {
        self.advect.set_field(&self.queue, field);
        self.speed.upload(&self.queue, field, max_speed);
        self.vectors.set_field(&self.device, &self.queue, field);
    }

    pub fn set_base_map(&mut self, map: &BaseMap) {
        self.base_map.upload(&self.device, &self.queue, map);
    }

    pub fn upload_particles<R: Rng + ?Sized>(&mut self, set: &ParticleSet, rng: &mut R) {
        self.advect.upload(&self.queue, set, rng);
    }

    pub fn set_particle_count<R: Rng + ?Sized>(&mut self, count: u32, rng: &mut R) {
        self.advect.set_count(&self.queue, count, rng);
    }

    pub fn particle_count(&self) -> u32 {
        self.advect.count()
    }

    /// Drop the trail history, e.g. after the particles were scattered.
    pub fn clear_trails(&mut self, viewport: Viewport) {
        self.trails.clear(viewport);
    }

    pub fn render(&mut self, frame: &FrameParams) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // Paused frames keep the particles and the trail ring as they are
        let step = frame.dt_ms > 0.0 || frame.scatter;
        if step {
            self.advect.encode(
                &mut encoder,
                &self.queue,
                frame.dt_ms,
                frame.frame as u32,
                frame.scatter,
            );
        }
        if step && frame.display_particles {
            let count = frame.draw_count.min(self.advect.count());
            self.trails.draw(
                &mut encoder,
                &self.queue,
                self.advect.latest(),
                count,
                frame.viewport,
            );
        }

        {
            let [r, g, b, a] = BACKGROUND.map(f64::from);
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.base_map
                .draw(&mut render_pass, &self.queue, &frame.viewport);
            if frame.display_speeds {
                self.speed
                    .draw(&mut render_pass, &self.queue, &frame.viewport, self.speed_opacity);
            }
            if frame.display_particles {
                self.trails
                    .composite(&mut render_pass, &self.queue, frame.viewport, PARTICLE_COLOR);
            }
            if frame.display_vectors {
                self.vectors
                    .draw(&mut render_pass, &self.queue, &frame.viewport);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
