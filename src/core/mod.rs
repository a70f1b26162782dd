//! 核心模块
//!
//! 包含粒子系统的核心功能：
//! - `error` - 错误类型定义

pub mod error;

// 重新导出错误类型
pub use error::{
    ParticleError, ParticleResult, RenderError, RenderResult, TextureError, TextureResult,
};

/// 初始化日志订阅器（遵循 `RUST_LOG` 环境变量）
///
/// 调用方已安装全局订阅器时此调用是无害的空操作。
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
