//! 粒子系统编排器
//!
//! 持有按纹理键惰性填充、从不逐出的池注册表，并驱动每帧序列：
//! 累积 → 发射（空闲计数设备间刷新）→ 模拟（绘制列表重建）→ 间接绘制。
//! 稳态路径从不把任何设备计数读回主机。

use std::collections::HashMap;

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::config::ParticleConfig;
use crate::core::error::{ParticleResult, RenderError, RenderResult};
use crate::render::particles::emitter::{EmitterSettings, ParticleEmitter};
use crate::render::particles::particle::{
    DrawIndexedIndirectArgs, EmitterParams, FrameParams, SimParams,
};
use crate::render::particles::pipeline::{ParticlePipelines, QUAD_INDICES, WORKGROUP_SIZE};
use crate::render::particles::pool::ParticlePool;
use crate::render::particles::texture::PoolTexture;

// ============================================================================
// 统计
// ============================================================================

/// 粒子系统统计
///
/// 全部来自主机端累积器，设备上的存活/空闲计数从不读回。
#[derive(Default, Clone, Copy, Debug)]
pub struct ParticleSystemStats {
    /// 池数量
    pub pool_count: usize,
    /// 发射器数量
    pub emitter_count: usize,
    /// 本帧请求发射数
    pub frame_emitted: u32,
    /// 累计请求发射数
    pub total_emitted: u64,
}

// ============================================================================
// 编排器
// ============================================================================

/// GPU 粒子系统
///
/// 粒子的出生、模拟与死亡完全在设备上进行，主机只提交控制参数。
/// 同一纹理键的发射器共享一个池；池在首次请求时创建，存活到系统销毁。
pub struct ParticleSystem {
    /// 共享管线
    pipelines: ParticlePipelines,
    /// 池列表（索引即池 ID）
    pools: Vec<ParticlePool>,
    /// 纹理键 → 池索引
    pool_lookup: HashMap<String, usize>,
    /// 帧 Uniform 缓冲区
    frame_buffer: wgpu::Buffer,
    /// 帧 Uniform 绑定组
    frame_bind_group: wgpu::BindGroup,
    /// 四边形索引缓冲区
    quad_index_buffer: wgpu::Buffer,
    /// 配置
    config: ParticleConfig,
    /// 主机端统计
    stats: ParticleSystemStats,
}

impl ParticleSystem {
    /// 创建粒子系统
    ///
    /// # 参数
    ///
    /// * `color_format` - 绘制目标的颜色格式
    /// * `depth_format` - 绘制目标的深度格式
    /// * `config` - 池容量与生成调参
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
        config: &ParticleConfig,
    ) -> RenderResult<Self> {
        config
            .validate()
            .map_err(|e| RenderError::InvalidState(e.to_string()))?;

        let pipelines = ParticlePipelines::new(device, color_format, depth_format);

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Params Buffer"),
            size: std::mem::size_of::<FrameParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Frame BG"),
            layout: &pipelines.frame_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let quad_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Quad Index Buffer"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        tracing::info!(
            target: "particles",
            "Particle system initialized (pool capacity {})",
            config.pool_capacity
        );

        Ok(Self {
            pipelines,
            pools: Vec::new(),
            pool_lookup: HashMap::new(),
            frame_buffer,
            frame_bind_group,
            quad_index_buffer,
            config: config.clone(),
            stats: ParticleSystemStats::default(),
        })
    }

    /// 为指定纹理创建发射器
    ///
    /// 首次见到的纹理路径会加载纹理并分配新池；同一路径的后续请求
    /// 复用已有的池而不是重复分配。
    pub fn create_emitter(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &str,
    ) -> ParticleResult<ParticleEmitter> {
        let pool_index = match self.pool_lookup.get(path) {
            Some(&index) => index,
            None => {
                let texture = PoolTexture::from_file(device, queue, path)?;
                self.register_pool(device, queue, path, texture)?
            }
        };
        Ok(self.add_emitter_to_pool(device, pool_index))
    }

    /// 为内存中的编码图像创建发射器
    ///
    /// `key` 充当注册表键，作用等同于 `create_emitter` 的路径。
    pub fn create_emitter_from_bytes(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        key: &str,
        bytes: &[u8],
    ) -> ParticleResult<ParticleEmitter> {
        let pool_index = match self.pool_lookup.get(key) {
            Some(&index) => index,
            None => {
                let texture = PoolTexture::from_bytes(device, queue, key, bytes)?;
                self.register_pool(device, queue, key, texture)?
            }
        };
        Ok(self.add_emitter_to_pool(device, pool_index))
    }

    /// 用内置棋盘纹理创建发射器（测试与演示用）
    pub fn create_emitter_with_default_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        key: &str,
    ) -> ParticleResult<ParticleEmitter> {
        let pool_index = match self.pool_lookup.get(key) {
            Some(&index) => index,
            None => {
                let texture = PoolTexture::checkerboard(device, queue);
                self.register_pool(device, queue, key, texture)?
            }
        };
        Ok(self.add_emitter_to_pool(device, pool_index))
    }

    /// 设置发射器生成参数
    ///
    /// 下次累积开始生效，没有立即副作用；未知句柄返回 `false`。
    pub fn set_emitter_parameters(
        &mut self,
        handle: ParticleEmitter,
        position: Vec3,
        velocity: Vec3,
        lifetime: f32,
        rate: f32,
    ) -> bool {
        match self
            .pools
            .get_mut(handle.pool_index())
            .and_then(|pool| pool.emitters.get_mut(handle.slot_index()))
        {
            Some(slot) => {
                slot.emitter.settings = EmitterSettings {
                    position,
                    velocity,
                    lifetime,
                    rate,
                };
                true
            }
            None => false,
        }
    }

    /// 推进一帧模拟
    ///
    /// 每帧对同一个编码器调用一次 `update` 加一次 `draw` 再提交：
    /// Uniform 的队列写入先于编码器命令执行，跨多次提交交错会打乱参数。
    ///
    /// # 参数
    ///
    /// * `delta_time` - 帧时间增量（秒）
    /// * `total_time` - 系统累计时间（秒），用于抖动种子
    pub fn update(
        &mut self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        delta_time: f32,
        total_time: f32,
    ) {
        // 1. 累积：先算出所有发射器的本帧发射数
        let mut total_emit: u32 = 0;
        for pool in &mut self.pools {
            for slot in &mut pool.emitters {
                total_emit = total_emit.saturating_add(slot.emitter.particles_to_emit(delta_time));
            }
        }
        self.stats.frame_emitted = total_emit;
        self.stats.total_emitted += total_emit as u64;

        // 2. 发射阶段：全局零发射的帧整体跳过
        if total_emit > 0 {
            self.encode_emission(queue, encoder, total_time);
        }

        // 3. 模拟阶段：覆盖每个池的全部容量
        for pool in &self.pools {
            let sim = SimParams {
                delta_time,
                capacity: pool.capacity,
                _padding: [0; 2],
            };
            queue.write_buffer(&pool.sim_params_buffer, 0, bytemuck::bytes_of(&sim));

            // 绘制列表每帧从零重建
            encoder.clear_buffer(&pool.draw_count_buffer, 0, None);

            let workgroups = (pool.capacity + WORKGROUP_SIZE - 1) / WORKGROUP_SIZE;
            let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Particle Simulate Pass"),
                timestamp_writes: None,
            });
            cpass.set_pipeline(&self.pipelines.simulate_pipeline);
            cpass.set_bind_group(0, &pool.sim_bind_group, &[]);
            cpass.dispatch_workgroups(workgroups, 1, 1);
        }
    }

    /// 编码所有待发射发射器的发射派发
    fn encode_emission(
        &mut self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        total_time: f32,
    ) {
        let jitter = self.config.spawn_jitter;
        for pool in &mut self.pools {
            for index in 0..pool.emitters.len() {
                let (emit_count, settings, seed) = {
                    let slot = &pool.emitters[index];
                    (
                        slot.emitter.emit_count,
                        slot.emitter.settings,
                        slot.emitter.seed,
                    )
                };
                if emit_count == 0 {
                    continue;
                }
                // 生命周期非正的粒子出生即到龄，发射只会丢失槽位
                if settings.lifetime <= 0.0 {
                    continue;
                }

                // 派发线程数封顶到容量；累积器已消费完整的发射数
                let dispatch_count = emit_count.min(pool.capacity);

                let params = EmitterParams {
                    position: [
                        settings.position.x,
                        settings.position.y,
                        settings.position.z,
                        jitter,
                    ],
                    velocity: [
                        settings.velocity.x,
                        settings.velocity.y,
                        settings.velocity.z,
                        settings.lifetime,
                    ],
                    emit_count: dispatch_count,
                    dead_count: pool.capacity,
                    total_time,
                    seed,
                };
                queue.write_buffer(
                    &pool.emitters[index].params_buffer,
                    0,
                    bytemuck::bytes_of(&params),
                );

                if pool.first_dispatch_pending {
                    // 池生命期的首次派发：空闲数刚播种为满容量，无需刷新
                    pool.first_dispatch_pending = false;
                } else {
                    encoder.copy_buffer_to_buffer(
                        &pool.dead_count_buffer,
                        0,
                        &pool.emitters[index].params_buffer,
                        EmitterParams::DEAD_COUNT_OFFSET,
                        4,
                    );
                }

                let workgroups = (dispatch_count + WORKGROUP_SIZE - 1) / WORKGROUP_SIZE;
                let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("Particle Emit Pass"),
                    timestamp_writes: None,
                });
                cpass.set_pipeline(&self.pipelines.emit_pipeline);
                cpass.set_bind_group(0, &pool.emitters[index].emit_bind_group, &[]);
                cpass.dispatch_workgroups(workgroups, 1, 1);
            }
        }
    }

    /// 绘制所有池
    ///
    /// 先把每个池的绘制计数设备间拷贝进间接参数的实例数字段，
    /// 再对每个池发出一次索引实例化间接绘制。两个附件都按加载处理，
    /// 深度只读。返回是否发出了任何绘制。
    pub fn draw(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        view: Mat4,
        proj: Mat4,
    ) -> bool {
        if self.pools.is_empty() {
            return false;
        }

        let frame = FrameParams::new(view, proj, self.config.particle_half_size);
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&frame));

        for pool in &self.pools {
            encoder.copy_buffer_to_buffer(
                &pool.draw_count_buffer,
                0,
                &pool.indirect_buffer,
                DrawIndexedIndirectArgs::INSTANCE_COUNT_OFFSET,
                4,
            );
        }

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Particle Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        rpass.set_pipeline(&self.pipelines.render_pipeline);
        rpass.set_bind_group(0, &self.frame_bind_group, &[]);
        rpass.set_index_buffer(self.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        for pool in &self.pools {
            rpass.set_bind_group(1, &pool.pool_bind_group, &[]);
            rpass.draw_indexed_indirect(&pool.indirect_buffer, 0);
        }

        true
    }

    /// 获取池数量
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// 获取发射器数量
    pub fn emitter_count(&self) -> usize {
        self.pools.iter().map(|pool| pool.emitters.len()).sum()
    }

    /// 获取主机端统计
    pub fn stats(&self) -> ParticleSystemStats {
        ParticleSystemStats {
            pool_count: self.pool_count(),
            emitter_count: self.emitter_count(),
            ..self.stats
        }
    }

    #[cfg(test)]
    pub(crate) fn pool(&self, index: usize) -> &ParticlePool {
        &self.pools[index]
    }

    fn register_pool(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        key: &str,
        texture: PoolTexture,
    ) -> RenderResult<usize> {
        let pool = ParticlePool::new(
            device,
            queue,
            &self.pipelines,
            texture,
            self.config.pool_capacity,
        )?;
        let index = self.pools.len();
        self.pools.push(pool);
        self.pool_lookup.insert(key.to_string(), index);
        Ok(index)
    }

    fn add_emitter_to_pool(&mut self, device: &wgpu::Device, pool_index: usize) -> ParticleEmitter {
        let slot = self.pools[pool_index].add_emitter(device, &self.pipelines);
        ParticleEmitter::new(pool_index as u32, slot as u32)
    }
}

impl Drop for ParticleSystem {
    fn drop(&mut self) {
        tracing::debug!(
            target: "particles",
            "Particle system dropped ({} pools, {} emitters)",
            self.pool_count(),
            self.emitter_count()
        );
    }
}
