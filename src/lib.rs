//! # Particle Engine
//!
//! A GPU-resident particle simulation and rendering core built with Rust and wgpu.
//!
//! ## Features
//!
//! - **GPU-Resident Pools**: fixed-capacity particle pools whose free-slot bookkeeping
//!   (dead-list) and per-frame visibility compaction (draw-list) live entirely on the device
//! - **Indirect Rendering**: per-pool instance counts are refreshed device-to-device into
//!   the indirect draw arguments; live counts are never read back to the host
//! - **Texture-Keyed Pool Registry**: emitters requesting the same texture share one pool's
//!   buffers, so pool allocation happens once per texture
//! - **Rate Accumulation**: fractional per-emitter accumulators turn continuous spawn rates
//!   into integral per-frame emit counts with at most ±1 drift over any window
//! - **Saturating Emission**: requests beyond the free-slot supply silently clamp on the
//!   device with no error path
//!
//! ## Modules
//!
//! - [`core`]: Error types and logging setup
//! - [`config`]: Pool capacity and spawn tuning, from TOML/JSON files or environment
//! - [`render`]: Device context, offscreen targets, and the particle system itself

/// Core functionality including error types and logging setup
pub mod core;
/// Configuration system
pub mod config;
/// Rendering system: pools, emitters, compute and draw pipelines
pub mod render;

pub use config::{ConfigError, ConfigResult, ParticleConfig};
pub use crate::core::error::{
    ParticleError, ParticleResult, RenderError, RenderResult, TextureError, TextureResult,
};
pub use crate::core::init_logging;
pub use render::context::RenderContext;
pub use render::particles::{
    EmitterSettings, ParticleEmitter, ParticleSystem, ParticleSystemStats, PoolTexture,
};
pub use render::target::RenderTarget;
