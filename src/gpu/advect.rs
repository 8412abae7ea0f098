//! GPU particle advection.
//!
//! Particles live in two storage buffers. Each tick the compute pass reads
//! one and writes the other, then the roles swap, so a dispatch never reads
//! a particle it has already moved. The buffer written last doubles as the
//! instance vertex buffer for the trail pass.

use rand::Rng;
use wgpu::util::DeviceExt;

use super::{buffer_entry, WORKGROUP_SIZE};
use crate::field::{VectorField, GLOBAL_HEIGHT, GLOBAL_WIDTH};
use crate::particles::ParticleSet;
use crate::shader::{AdvectParams, GpuParticle, ADVECT_SOURCE};

/// Convert CPU particles to the GPU layout, seeding each RNG stream.
pub fn pack_particles<R: Rng + ?Sized>(set: &ParticleSet, rng: &mut R) -> Vec<GpuParticle> {
    set.lon()
        .iter()
        .zip(set.lat())
        .zip(set.age())
        .map(|((&lon, &lat), &age)| GpuParticle {
            lon,
            lat,
            age,
            seed: rng.gen(),
        })
        .collect()
}

pub struct AdvectPass {
    pipeline: wgpu::ComputePipeline,
    /// `bind_groups[i]` reads `buffers[i]` and writes the other buffer.
    bind_groups: [wgpu::BindGroup; 2],
    buffers: [wgpu::Buffer; 2],
    field_u: wgpu::Buffer,
    field_v: wgpu::Buffer,
    params_buffer: wgpu::Buffer,
    /// Index of the buffer holding the newest particles.
    latest: usize,
    count: u32,
    capacity: u32,
    lifetime: f32,
}

impl AdvectPass {
    pub fn new(device: &wgpu::Device, capacity: u32, lifetime: f32) -> Self {
        let size = capacity as u64 * std::mem::size_of::<GpuParticle>() as u64;
        let make_buffer = |label| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: wgpu::BufferUsages::VERTEX
                    | wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let buffers = [make_buffer("Particle Buffer A"), make_buffer("Particle Buffer B")];

        let field_size = (GLOBAL_WIDTH * GLOBAL_HEIGHT * std::mem::size_of::<f32>()) as u64;
        let make_field = |label| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: field_size,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let field_u = make_field("Field U Buffer");
        let field_v = make_field("Field V Buffer");

        let params = AdvectParams {
            dt_ms: 0.0,
            lifetime,
            count: 0,
            frame_seed: 0,
            field_width: GLOBAL_WIDTH as u32,
            field_height: GLOBAL_HEIGHT as u32,
            scatter: 0,
            _pad: 0,
        };
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Advect Params Buffer"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Advect Shader"),
            source: wgpu::ShaderSource::Wgsl(ADVECT_SOURCE.into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Advect Bind Group Layout"),
            entries: &[
                buffer_entry(0, wgpu::ShaderStages::COMPUTE, wgpu::BufferBindingType::Storage { read_only: true }),
                buffer_entry(1, wgpu::ShaderStages::COMPUTE, wgpu::BufferBindingType::Storage { read_only: false }),
                buffer_entry(2, wgpu::ShaderStages::COMPUTE, wgpu::BufferBindingType::Storage { read_only: true }),
                buffer_entry(3, wgpu::ShaderStages::COMPUTE, wgpu::BufferBindingType::Storage { read_only: true }),
                buffer_entry(4, wgpu::ShaderStages::COMPUTE, wgpu::BufferBindingType::Uniform),
            ],
        });

        let make_bind_group = |src: &wgpu::Buffer, dst: &wgpu::Buffer, label| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: src.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: dst.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: field_u.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: field_v.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: params_buffer.as_entire_binding(),
                    },
                ],
            })
        };
        let bind_groups = [
            make_bind_group(&buffers[0], &buffers[1], "Advect Bind Group A->B"),
            make_bind_group(&buffers[1], &buffers[0], "Advect Bind Group B->A"),
        ];

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Advect Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Advect Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Self {
            pipeline,
            bind_groups,
            buffers,
            field_u,
            field_v,
            params_buffer,
            latest: 0,
            count: 0,
            capacity,
            lifetime,
        }
    }

    /// Buffer holding the particles written by the last dispatch.
    pub fn latest(&self) -> &wgpu::Buffer {
        &self.buffers[self.latest]
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Publish a field snapshot. The caller must pass a global field.
    pub fn set_field(&self, queue: &wgpu::Queue, field: &VectorField) {
        queue.write_buffer(&self.field_u, 0, bytemuck::cast_slice(field.u_field().data()));
        queue.write_buffer(&self.field_v, 0, bytemuck::cast_slice(field.v_field().data()));
    }

    /// Replace every particle.
    pub fn upload<R: Rng + ?Sized>(&mut self, queue: &wgpu::Queue, set: &ParticleSet, rng: &mut R) {
        let mut packed = pack_particles(set, rng);
        packed.truncate(self.capacity as usize);
        queue.write_buffer(self.latest(), 0, bytemuck::cast_slice(&packed));
        self.count = packed.len() as u32;
    }

    /// Change the population. Survivors keep their slots; new particles are
    /// seeded at random positions after them.
    pub fn set_count<R: Rng + ?Sized>(&mut self, queue: &wgpu::Queue, count: u32, rng: &mut R) {
        let count = count.min(self.capacity);
        if count > self.count {
            let fresh = ParticleSet::new((count - self.count) as usize, self.lifetime, rng);
            let packed = pack_particles(&fresh, rng);
            let offset = self.count as u64 * std::mem::size_of::<GpuParticle>() as u64;
            queue.write_buffer(self.latest(), offset, bytemuck::cast_slice(&packed));
        }
        self.count = count;
    }

    /// Record one advection step of `dt_ms`, or a scatter of every particle.
    pub fn encode(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        dt_ms: f32,
        frame_seed: u32,
        scatter: bool,
    ) {
        if self.count == 0 {
            return;
        }
        let params = AdvectParams {
            dt_ms,
            lifetime: self.lifetime,
            count: self.count,
            frame_seed,
            field_width: GLOBAL_WIDTH as u32,
            field_height: GLOBAL_HEIGHT as u32,
            scatter: scatter as u32,
            _pad: 0,
        };
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Advect Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_groups[self.latest], &[]);
            pass.dispatch_workgroups(self.count.div_ceil(WORKGROUP_SIZE), 1, 1);
        }
        self.latest = 1 - self.latest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_pack_preserves_particles() {
        let mut rng = StdRng::seed_from_u64(3);
        let set =
            ParticleSet::from_parts(vec![10.0, 20.0], vec![-5.0, 5.0], vec![0.0, 100.0], 4000.0)
                .unwrap();
        let packed = pack_particles(&set, &mut rng);
        assert_eq!(packed.len(), 2);
        assert_eq!((packed[0].lon, packed[0].lat, packed[0].age), (10.0, -5.0, 0.0));
        assert_eq!((packed[1].lon, packed[1].lat, packed[1].age), (20.0, 5.0, 100.0));
        assert_ne!(packed[0].seed, packed[1].seed);
    }

    #[test]
    fn test_packed_bytes_are_interleaved() {
        let mut rng = StdRng::seed_from_u64(3);
        let set = ParticleSet::from_parts(vec![1.0], vec![2.0], vec![3.0], 4000.0).unwrap();
        let packed = pack_particles(&set, &mut rng);
        let floats: &[f32] = bytemuck::cast_slice(&packed);
        assert_eq!(&floats[..3], &[1.0, 2.0, 3.0]);
    }
}
