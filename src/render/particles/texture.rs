//! 粒子池纹理
//!
//! 池纹理从 PNG/JPEG 解码后上传为 RGBA8-sRGB，采样器为重复寻址 + 线性过滤。
//! 加载失败对该次发射器创建是致命的，向上传播。

use crate::core::error::{TextureError, TextureResult};

/// 池纹理
///
/// 视图与采样器在池的渲染绑定组中只读使用。
pub struct PoolTexture {
    /// 纹理对象
    pub texture: wgpu::Texture,
    /// 纹理视图
    pub view: wgpu::TextureView,
    /// 采样器
    pub sampler: wgpu::Sampler,
    /// 尺寸（宽，高）
    pub size: [u32; 2],
}

impl PoolTexture {
    /// 从文件加载纹理
    pub fn from_file(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &str,
    ) -> TextureResult<Self> {
        let img = image::open(path).map_err(|e| match e {
            image::ImageError::IoError(ref io) if io.kind() == std::io::ErrorKind::NotFound => {
                TextureError::NotFound {
                    path: path.to_string(),
                }
            }
            other => TextureError::LoadFailed {
                path: path.to_string(),
                reason: other.to_string(),
            },
        })?;
        let rgba = img.to_rgba8();
        let (w, h) = rgba.dimensions();

        tracing::debug!(target: "particles", "Loaded pool texture {path} ({w}x{h})");
        Ok(Self::upload(device, queue, rgba.as_raw(), w, h, path))
    }

    /// 从内存中的编码图像加载纹理
    pub fn from_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        key: &str,
        bytes: &[u8],
    ) -> TextureResult<Self> {
        let img =
            image::load_from_memory(bytes).map_err(|e| TextureError::Decode(e.to_string()))?;
        let rgba = img.to_rgba8();
        let (w, h) = rgba.dimensions();

        tracing::debug!(target: "particles", "Decoded pool texture {key} ({w}x{h})");
        Ok(Self::upload(device, queue, rgba.as_raw(), w, h, key))
    }

    /// 创建棋盘纹理
    ///
    /// 供无需磁盘资源的测试与演示场景使用。
    pub fn checkerboard(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let tex_size = 256u32;
        let mut data = vec![0u8; (tex_size * tex_size * 4) as usize];

        for y in 0..tex_size {
            for x in 0..tex_size {
                let idx = ((y * tex_size + x) * 4) as usize;
                let c = if ((x / 32) % 2) ^ ((y / 32) % 2) == 0 {
                    220
                } else {
                    60
                };
                data[idx] = c;
                data[idx + 1] = c;
                data[idx + 2] = c;
                data[idx + 3] = 255;
            }
        }

        Self::upload(device, queue, &data, tex_size, tex_size, "checkerboard")
    }

    /// 上传 RGBA8 像素并创建视图与采样器
    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixels: &[u8],
        width: u32,
        height: u32,
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("Pool Texture: {label}")),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Pool Texture Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            size: [width, height],
        }
    }
}
