//! 统一错误处理模块
//!
//! 提供粒子系统范围内的统一错误类型定义
//!
//! ## 错误分层
//!
//! - **初始化错误**：设备获取、池分配、纹理加载失败时致命，向上传播
//! - **稳态运行**：每帧的发射/模拟/绘制路径没有可恢复错误，超额发射在
//!   设备端静默饱和，不产生错误值

use thiserror::Error;

/// 粒子系统顶层错误类型
#[derive(Error, Debug)]
pub enum ParticleError {
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Texture error: {0}")]
    Texture(#[from] TextureError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 渲染资源错误
#[derive(Error, Debug, Clone)]
pub enum RenderError {
    #[error("Failed to request adapter: no compatible GPU found")]
    NoAdapter,

    #[error("Failed to request device: {0}")]
    DeviceRequest(String),

    #[error("Pool capacity exceeds device limits: required {required}, available {available}")]
    InsufficientCapacity { required: u64, available: u64 },

    #[error("Invalid render state: {0}")]
    InvalidState(String),
}

/// 纹理加载错误
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Texture not found: {path}")]
    NotFound { path: String },

    #[error("Failed to load texture: {path}, reason: {reason}")]
    LoadFailed { path: String, reason: String },

    #[error("Texture decode error: {0}")]
    Decode(String),
}

/// 粒子系统结果类型别名
pub type ParticleResult<T> = Result<T, ParticleError>;
pub type RenderResult<T> = Result<T, RenderError>;
pub type TextureResult<T> = Result<T, TextureError>;
