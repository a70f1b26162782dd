//! GPU 粒子系统模块
//!
//! 粒子的出生、模拟与死亡完全在 GPU 上执行，主机端只提交控制参数，
//! 从不读回存活数量。
//!
//! ## 架构设计
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  GPU Particle System                     │
//! ├─────────────────────────────────────────────────────────┤
//! │  1. Emission (Compute Shader)                            │
//! │     - 从空闲栈弹出槽位（供应不足时静默饱和）               │
//! │     - 初始化位置（含抖动）、速度、生命周期                 │
//! │                                                          │
//! │  2. Simulation (Compute Shader)                          │
//! │     - 覆盖全容量：年龄推进、位置积分                      │
//! │     - 到龄粒子压回空闲栈                                  │
//! │     - 存活粒子索引追加进每帧重建的绘制列表                 │
//! │                                                          │
//! │  3. Rendering (Vertex + Fragment Shader)                 │
//! │     - 实例数由设备间拷贝刷新的间接绘制                     │
//! │     - 视图空间展开的面向相机四边形                         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 使用示例
//!
//! ```ignore
//! let config = ParticleConfig::default();
//! let mut particles = ParticleSystem::new(&device, color_format, depth_format, &config)?;
//!
//! let smoke = particles.create_emitter(&device, &queue, "assets/smoke.png")?;
//! particles.set_emitter_parameters(smoke, Vec3::ZERO, Vec3::Y, 2.0, 120.0);
//!
//! // 每帧：一次 update 加一次 draw，共用同一个编码器提交
//! let mut encoder = device.create_command_encoder(&Default::default());
//! particles.update(&queue, &mut encoder, delta_time, total_time);
//! particles.draw(&queue, &mut encoder, &color_view, &depth_view, view, proj);
//! queue.submit([encoder.finish()]);
//! ```

pub mod emitter;
pub mod particle;
pub(crate) mod pipeline;
pub(crate) mod pool;
pub mod system;
pub mod texture;

pub use emitter::{EmitterSettings, ParticleEmitter};
pub use particle::{DrawIndexedIndirectArgs, EmitterParams, FrameParams, GpuParticle, SimParams};
pub use system::{ParticleSystem, ParticleSystemStats};
pub use texture::PoolTexture;
