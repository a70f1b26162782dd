//! 粒子池
//!
//! 池持有一套固定容量的设备缓冲区：粒子数组、空闲/绘制列表及其计数器、
//! 模拟 Uniform 和间接绘制参数。多个发射器共享同一个池（按纹理聚合），
//! 每个发射器槽位只额外持有自己的发射 Uniform 与绑定组。

use crate::core::error::{RenderError, RenderResult};
use crate::render::particles::emitter::Emitter;
use crate::render::particles::particle::{DrawIndexedIndirectArgs, EmitterParams, GpuParticle};
use crate::render::particles::pipeline::{ParticlePipelines, WORKGROUP_SIZE};
use crate::render::particles::texture::PoolTexture;
use wgpu::util::DeviceExt;

/// 发射器槽位
///
/// Uniform 缓冲区每个发射器独立：队列写入先于提交的命令缓冲执行，
/// 共享一份会让同帧后写的参数覆盖先派发的发射器。
pub(crate) struct EmitterSlot {
    /// 主机端发射器状态
    pub emitter: Emitter,
    /// 发射参数 Uniform
    pub params_buffer: wgpu::Buffer,
    /// 发射阶段绑定组
    pub emit_bind_group: wgpu::BindGroup,
}

/// 粒子池
pub(crate) struct ParticlePool {
    /// 池容量（槽位数）
    pub capacity: u32,
    /// 粒子缓冲区
    pub particle_buffer: wgpu::Buffer,
    /// 空闲列表（槽位索引栈）
    pub dead_list_buffer: wgpu::Buffer,
    /// 空闲计数器
    pub dead_count_buffer: wgpu::Buffer,
    /// 绘制列表（每帧重建）
    pub draw_list_buffer: wgpu::Buffer,
    /// 绘制计数器
    pub draw_count_buffer: wgpu::Buffer,
    /// 模拟 Uniform
    pub sim_params_buffer: wgpu::Buffer,
    /// 间接绘制参数
    pub indirect_buffer: wgpu::Buffer,
    /// 模拟阶段绑定组
    pub sim_bind_group: wgpu::BindGroup,
    /// 渲染阶段绑定组（组 1）
    pub pool_bind_group: wgpu::BindGroup,
    /// 池纹理
    pub texture: PoolTexture,
    /// 发射器槽位
    pub emitters: Vec<EmitterSlot>,
    /// 尚未执行过首次发射派发
    ///
    /// 池刚建好时空闲数解析已知为满容量，首次派发可以跳过计数器刷新拷贝；
    /// 该旗标在首次派发后立即清除，不得延长到之后的任何一帧。
    pub first_dispatch_pending: bool,
}

impl ParticlePool {
    /// 创建粒子池并完成空闲列表播种
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipelines: &ParticlePipelines,
        texture: PoolTexture,
        capacity: u32,
    ) -> RenderResult<Self> {
        if capacity == 0 {
            return Err(RenderError::InvalidState(
                "pool capacity must be non-zero".to_string(),
            ));
        }

        let limits = device.limits();
        let particle_bytes = capacity as u64 * std::mem::size_of::<GpuParticle>() as u64;
        if particle_bytes > limits.max_storage_buffer_binding_size as u64 {
            return Err(RenderError::InsufficientCapacity {
                required: particle_bytes,
                available: limits.max_storage_buffer_binding_size as u64,
            });
        }
        let max_threads = limits.max_compute_workgroups_per_dimension as u64 * WORKGROUP_SIZE as u64;
        if capacity as u64 > max_threads {
            return Err(RenderError::InsufficientCapacity {
                required: capacity as u64,
                available: max_threads,
            });
        }

        // 粒子缓冲区创建时清零，lifetime = 0 即全部槽位空闲
        let particle_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Buffer"),
            size: particle_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let dead_list_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Dead List Buffer"),
            size: (capacity * 4) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let dead_count_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Dead Count Buffer"),
            size: 4,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let draw_list_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw List Buffer"),
            size: (capacity * 4) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let draw_count_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw Count Buffer"),
            size: 4,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let sim_params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sim Params Buffer"),
            size: 16,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let indirect_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Indirect Buffer"),
            contents: bytemuck::bytes_of(&DrawIndexedIndirectArgs::for_particle_quad()),
            usage: wgpu::BufferUsages::INDIRECT | wgpu::BufferUsages::COPY_DST,
        });

        // 播种：空闲列表为恒等索引，空闲计数 = 容量，绘制计数 = 0
        let dead_list: Vec<u32> = (0..capacity).collect();
        queue.write_buffer(&dead_list_buffer, 0, bytemuck::cast_slice(&dead_list));
        queue.write_buffer(&dead_count_buffer, 0, bytemuck::bytes_of(&capacity));
        queue.write_buffer(&draw_count_buffer, 0, bytemuck::bytes_of(&0u32));

        let sim_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Simulate BG"),
            layout: &pipelines.sim_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: sim_params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: particle_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: dead_list_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: dead_count_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: draw_list_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: draw_count_buffer.as_entire_binding(),
                },
            ],
        });

        let pool_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Pool BG"),
            layout: &pipelines.pool_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: particle_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: draw_list_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        });

        tracing::info!(target: "particles", "Created particle pool (capacity {capacity})");

        Ok(Self {
            capacity,
            particle_buffer,
            dead_list_buffer,
            dead_count_buffer,
            draw_list_buffer,
            draw_count_buffer,
            sim_params_buffer,
            indirect_buffer,
            sim_bind_group,
            pool_bind_group,
            texture,
            emitters: Vec::new(),
            first_dispatch_pending: true,
        })
    }

    /// 添加发射器槽位，返回槽位索引
    pub fn add_emitter(&mut self, device: &wgpu::Device, pipelines: &ParticlePipelines) -> usize {
        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Emitter Params Buffer"),
            size: std::mem::size_of::<EmitterParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let emit_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Emit BG"),
            layout: &pipelines.emit_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.particle_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.dead_list_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: self.dead_count_buffer.as_entire_binding(),
                },
            ],
        });

        self.emitters.push(EmitterSlot {
            emitter: Emitter::new(),
            params_buffer,
            emit_bind_group,
        });
        let slot = self.emitters.len() - 1;
        tracing::debug!(target: "particles", "Added emitter slot {slot} to pool");
        slot
    }
}
