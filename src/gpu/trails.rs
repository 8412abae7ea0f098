//! Trail rendering through a ring of per-frame particle targets.
//!
//! Every tick the particles are rasterized into the newest slot of a
//! [`TrailRing`] of `R8Unorm` textures. Compositing blends all slots onto the
//! frame, oldest first, each faded by its age and reprojected from the
//! viewport it was captured under.

use wgpu::util::DeviceExt;

use super::{buffer_entry, TRAIL_FORMAT};
use crate::projection::Viewport;
use crate::shader::{CompositeUniform, GpuParticle, ViewUniform, COMPOSITE_SOURCE, PARTICLES_SOURCE};
use crate::trails::TrailRing;

/// One trail frame on the GPU.
pub struct SlotTarget {
    view: wgpu::TextureView,
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    /// False until particles have been drawn into the slot.
    live: bool,
}

pub struct TrailPass {
    ring: TrailRing<SlotTarget>,
    particle_pipeline: wgpu::RenderPipeline,
    view_buffer: wgpu::Buffer,
    view_bind_group: wgpu::BindGroup,
    composite_pipeline: wgpu::RenderPipeline,
    composite_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    frames: usize,
    point_size: f32,
}

impl TrailPass {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        viewport: Viewport,
        frames: usize,
        point_size: f32,
    ) -> Self {
        let (particle_pipeline, view_buffer, view_bind_group) =
            create_particle_pipeline(device, &viewport, point_size);
        let (composite_pipeline, composite_layout) = create_composite_pipeline(device, surface_format);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Trail Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let ring = create_ring(device, &composite_layout, &sampler, viewport, frames);

        Self {
            ring,
            particle_pipeline,
            view_buffer,
            view_bind_group,
            composite_pipeline,
            composite_layout,
            sampler,
            frames,
            point_size,
        }
    }

    /// Recreate every target at the new canvas size. History is dropped.
    pub fn resize(&mut self, device: &wgpu::Device, viewport: Viewport) {
        self.ring = create_ring(
            device,
            &self.composite_layout,
            &self.sampler,
            viewport,
            self.frames,
        );
    }

    /// Forget the trail history without reallocating.
    pub fn clear(&mut self, viewport: Viewport) {
        self.ring.reset(viewport);
        for slot in self.ring.payloads_mut() {
            slot.live = false;
        }
    }

    /// Rasterize the first `count` particles into the newest slot.
    pub fn draw(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        particles: &wgpu::Buffer,
        count: u32,
        viewport: Viewport,
    ) {
        let newest = self.ring.advance(viewport);
        let view = ViewUniform::new(&viewport, self.point_size);
        queue.write_buffer(&self.view_buffer, 0, bytemuck::bytes_of(&view));

        let slot = &mut self.ring.slot_mut(newest).payload;
        slot.live = true;

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Trail Slot Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &slot.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        if count > 0 {
            pass.set_pipeline(&self.particle_pipeline);
            pass.set_bind_group(0, &self.view_bind_group, &[]);
            pass.set_vertex_buffer(0, particles.slice(..));
            pass.draw(0..6, 0..count);
        }
    }

    /// Blend every live slot into `pass`, reprojected into `viewport`.
    pub fn composite(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        queue: &wgpu::Queue,
        viewport: Viewport,
        color: [f32; 4],
    ) {
        let current = ViewUniform::new(&viewport, self.point_size);
        pass.set_pipeline(&self.composite_pipeline);
        for (_, slot, alpha) in self.ring.iter_oldest_first() {
            if !slot.payload.live {
                continue;
            }
            let uniform = CompositeUniform {
                captured: ViewUniform::new(&slot.viewport, self.point_size),
                current,
                color,
                alpha,
                _pad: [0.0; 3],
            };
            queue.write_buffer(&slot.payload.uniform, 0, bytemuck::bytes_of(&uniform));
            pass.set_bind_group(0, &slot.payload.bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
    }
}

fn create_ring(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    viewport: Viewport,
    frames: usize,
) -> TrailRing<SlotTarget> {
    let size = wgpu::Extent3d {
        width: (viewport.width as u32).max(1),
        height: (viewport.height as u32).max(1),
        depth_or_array_layers: 1,
    };
    TrailRing::new(frames, viewport, |_| {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Trail Slot Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TRAIL_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let uniform = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Trail Composite Uniform"),
            size: std::mem::size_of::<CompositeUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Trail Composite Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform.as_entire_binding(),
                },
            ],
        });
        SlotTarget {
            view,
            uniform,
            bind_group,
            live: false,
        }
    })
}

fn create_particle_pipeline(
    device: &wgpu::Device,
    viewport: &Viewport,
    point_size: f32,
) -> (wgpu::RenderPipeline, wgpu::Buffer, wgpu::BindGroup) {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Particle Shader"),
        source: wgpu::ShaderSource::Wgsl(PARTICLES_SOURCE.into()),
    });

    let view_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Particle View Buffer"),
        contents: bytemuck::bytes_of(&ViewUniform::new(viewport, point_size)),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });

    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Particle Bind Group Layout"),
        entries: &[buffer_entry(0, wgpu::ShaderStages::VERTEX, wgpu::BufferBindingType::Uniform)],
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Particle Bind Group"),
        layout: &layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: view_buffer.as_entire_binding(),
        }],
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Particle Pipeline Layout"),
        bind_group_layouts: &[&layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Particle Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<GpuParticle>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &[wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                }],
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: TRAIL_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    (pipeline, view_buffer, bind_group)
}

fn create_composite_pipeline(
    device: &wgpu::Device,
    surface_format: wgpu::TextureFormat,
) -> (wgpu::RenderPipeline, wgpu::BindGroupLayout) {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Trail Composite Shader"),
        source: wgpu::ShaderSource::Wgsl(COMPOSITE_SOURCE.into()),
    });

    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Trail Composite Bind Group Layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            buffer_entry(2, wgpu::ShaderStages::FRAGMENT, wgpu::BufferBindingType::Uniform),
        ],
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Trail Composite Pipeline Layout"),
        bind_group_layouts: &[&layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Trail Composite Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    (pipeline, layout)
}
