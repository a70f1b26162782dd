//! 渲染模块
//!
//! 无头设备引导、离屏目标与 GPU 粒子系统。

pub mod context;
pub mod particles;
pub mod target;

// Re-export device context and offscreen target
pub use context::RenderContext;
pub use target::RenderTarget;

// Re-export GPU Particle System components
pub use particles::{
    EmitterSettings, ParticleEmitter, ParticleSystem, ParticleSystemStats, PoolTexture,
};
