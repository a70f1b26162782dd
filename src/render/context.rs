//! 无头渲染上下文
//!
//! 不依赖窗口的设备引导，供集成测试与没有自己设备管线的嵌入方使用。

use crate::core::error::{RenderError, RenderResult};

/// 无头设备上下文
pub struct RenderContext {
    /// 设备
    pub device: wgpu::Device,
    /// 命令队列
    pub queue: wgpu::Queue,
}

impl RenderContext {
    /// 请求适配器与设备（阻塞）
    ///
    /// 没有兼容 GPU 时返回 [`RenderError::NoAdapter`]。
    pub fn new() -> RenderResult<Self> {
        pollster::block_on(Self::new_async())
    }

    async fn new_async() -> RenderResult<Self> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    label: None,
                },
                None,
            )
            .await
            .map_err(|e| RenderError::DeviceRequest(e.to_string()))?;

        tracing::info!(
            target: "particles",
            "Acquired headless device: {}",
            adapter.get_info().name
        );

        Ok(Self { device, queue })
    }
}
