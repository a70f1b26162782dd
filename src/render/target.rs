//! 离屏渲染目标
//!
//! 颜色加深度的附件对，粒子绘制阶段需要两者同时存在。

use wgpu::{Device, Texture, TextureFormat, TextureUsages, TextureView};

/// 离屏颜色 + 深度附件对
pub struct RenderTarget {
    /// 颜色纹理
    pub color_texture: Texture,
    /// 颜色视图
    pub color_view: TextureView,
    /// 深度纹理
    pub depth_texture: Texture,
    /// 深度视图
    pub depth_view: TextureView,
    /// 宽度
    pub width: u32,
    /// 高度
    pub height: u32,
    /// 颜色格式
    pub color_format: TextureFormat,
    /// 深度格式
    pub depth_format: TextureFormat,
}

impl RenderTarget {
    /// 创建新的离屏目标
    pub fn new(
        device: &Device,
        width: u32,
        height: u32,
        color_format: TextureFormat,
        depth_format: TextureFormat,
    ) -> Self {
        let (color_texture, color_view) = Self::make_texture(
            device,
            width,
            height,
            color_format,
            TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
            "Offscreen Color Target",
        );
        let (depth_texture, depth_view) = Self::make_texture(
            device,
            width,
            height,
            depth_format,
            TextureUsages::RENDER_ATTACHMENT,
            "Offscreen Depth Target",
        );

        Self {
            color_texture,
            color_view,
            depth_texture,
            depth_view,
            width,
            height,
            color_format,
            depth_format,
        }
    }

    /// 调整大小
    pub fn resize(&mut self, device: &Device, width: u32, height: u32) {
        if self.width == width && self.height == height {
            return;
        }

        self.width = width;
        self.height = height;

        let (color_texture, color_view) = Self::make_texture(
            device,
            width,
            height,
            self.color_format,
            TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
            "Offscreen Color Target",
        );
        let (depth_texture, depth_view) = Self::make_texture(
            device,
            width,
            height,
            self.depth_format,
            TextureUsages::RENDER_ATTACHMENT,
            "Offscreen Depth Target",
        );

        self.color_texture = color_texture;
        self.color_view = color_view;
        self.depth_texture = depth_texture;
        self.depth_view = depth_view;
    }

    fn make_texture(
        device: &Device,
        width: u32,
        height: u32,
        format: TextureFormat,
        usage: TextureUsages,
        label: &str,
    ) -> (Texture, TextureView) {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }
}
