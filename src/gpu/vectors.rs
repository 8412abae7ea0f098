//! Wind arrows and the graticule, drawn as line lists over the other layers.

use wgpu::util::DeviceExt;

use super::buffer_entry;
use crate::field::VectorField;
use crate::projection::Viewport;
use crate::shader::{GpuGlyph, VectorUniform, ViewUniform, VECTORS_SOURCE};
use crate::vectors::{glyphs, Graticule, ARROW_COLOR, GLYPH_SPACING, GRID_COLOR};

/// Line vertices per arrow: the shaft and three head strokes.
const ARROW_VERTICES: u32 = 8;

pub struct VectorPass {
    arrow_pipeline: wgpu::RenderPipeline,
    grid_pipeline: wgpu::RenderPipeline,
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    glyphs: Option<wgpu::Buffer>,
    glyph_count: u32,
    graticule: Graticule,
}

impl VectorPass {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let graticule = Graticule::default();

        let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vector Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniform_for(&ViewUniform::default(), &graticule)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Vector Bind Group Layout"),
            entries: &[buffer_entry(
                0,
                wgpu::ShaderStages::VERTEX_FRAGMENT,
                wgpu::BufferBindingType::Uniform,
            )],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Vector Bind Group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Vector Shader"),
            source: wgpu::ShaderSource::Wgsl(VECTORS_SOURCE.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Vector Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let glyph_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuGlyph>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: 8,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        };

        let arrow_pipeline = create_line_pipeline(
            device,
            &pipeline_layout,
            &shader,
            surface_format,
            ("Arrow Pipeline", "vs_arrow", "fs_arrow"),
            &[glyph_layout],
        );
        let grid_pipeline = create_line_pipeline(
            device,
            &pipeline_layout,
            &shader,
            surface_format,
            ("Graticule Pipeline", "vs_grid", "fs_grid"),
            &[],
        );

        Self {
            arrow_pipeline,
            grid_pipeline,
            uniform,
            bind_group,
            glyphs: None,
            glyph_count: 0,
            graticule,
        }
    }

    /// Rebuild the arrows for a new field.
    pub fn set_field(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, field: &VectorField) {
        let data: Vec<GpuGlyph> = glyphs(field, GLYPH_SPACING)
            .into_iter()
            .map(GpuGlyph::from)
            .collect();
        let bytes: &[u8] = bytemuck::cast_slice(&data);

        // Every forecast field shares a grid, so the buffer is usually reused
        match &self.glyphs {
            Some(buffer) if buffer.size() == bytes.len() as u64 => {
                queue.write_buffer(buffer, 0, bytes);
            }
            _ => {
                self.glyphs = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Glyph Buffer"),
                    contents: bytes,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                }));
            }
        }
        self.glyph_count = data.len() as u32;
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, queue: &wgpu::Queue, viewport: &Viewport) {
        let view = ViewUniform::new(viewport, 1.0);
        queue.write_buffer(
            &self.uniform,
            0,
            bytemuck::bytes_of(&uniform_for(&view, &self.graticule)),
        );
        pass.set_bind_group(0, &self.bind_group, &[]);

        if let Some(glyphs) = &self.glyphs {
            pass.set_pipeline(&self.arrow_pipeline);
            pass.set_vertex_buffer(0, glyphs.slice(..));
            pass.draw(0..ARROW_VERTICES, 0..self.glyph_count);
        }

        // Grid lines go over the arrows
        pass.set_pipeline(&self.grid_pipeline);
        pass.draw(0..self.graticule.vertex_count(), 0..1);
    }
}

fn uniform_for(view: &ViewUniform, graticule: &Graticule) -> VectorUniform {
    VectorUniform {
        view: *view,
        arrow_color: ARROW_COLOR,
        grid_color: GRID_COLOR,
        spacing: graticule.spacing,
        meridians: graticule.meridian_count(),
        _pad: [0.0; 2],
    }
}

fn create_line_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    surface_format: wgpu::TextureFormat,
    (label, vs_entry, fs_entry): (&str, &str, &str),
    buffers: &[wgpu::VertexBufferLayout<'_>],
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(vs_entry),
            buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fs_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::LineList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
