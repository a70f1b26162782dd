//! 粒子管线
//!
//! 发射与模拟两条计算管线加一条渲染管线，以及它们的绑定组布局。
//! 空闲列表与绘制列表用平坦索引数组加独立原子计数器实现栈语义：
//! 弹出为带下溢回退的 atomicSub，压入为 atomicAdd，长度读取为 4 字节拷贝。

/// 计算着色器工作组大小（与 WGSL 中的字面量一致）
pub(crate) const WORKGROUP_SIZE: u32 = 64;

/// 粒子四边形索引（两个三角形）
pub(crate) const QUAD_INDICES: [u32; 6] = [0, 2, 3, 0, 3, 1];

// ============================================================================
// 管线集合
// ============================================================================

/// 粒子管线集合，所有池共享
pub(crate) struct ParticlePipelines {
    /// 发射计算管线
    pub emit_pipeline: wgpu::ComputePipeline,
    /// 模拟计算管线
    pub simulate_pipeline: wgpu::ComputePipeline,
    /// 渲染管线
    pub render_pipeline: wgpu::RenderPipeline,
    /// 发射阶段绑定组布局
    pub emit_bgl: wgpu::BindGroupLayout,
    /// 模拟阶段绑定组布局
    pub sim_bgl: wgpu::BindGroupLayout,
    /// 帧 Uniform 绑定组布局（渲染组 0）
    pub frame_bgl: wgpu::BindGroupLayout,
    /// 池渲染资源绑定组布局（渲染组 1）
    pub pool_bgl: wgpu::BindGroupLayout,
}

/// 计算阶段存储缓冲区布局项
fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Uniform 缓冲区布局项
fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl ParticlePipelines {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> Self {
        // 发射阶段：发射器 Uniform + 粒子 + 空闲列表 + 空闲计数器
        let emit_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Emit BGL"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::COMPUTE),
                storage_entry(1, false),
                storage_entry(2, false),
                storage_entry(3, false),
            ],
        });

        // 模拟阶段：模拟 Uniform + 粒子 + 两对列表/计数器
        let sim_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Simulate BGL"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::COMPUTE),
                storage_entry(1, false),
                storage_entry(2, false),
                storage_entry(3, false),
                storage_entry(4, false),
                storage_entry(5, false),
            ],
        });

        // 渲染组 0：帧 Uniform
        let frame_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Frame BGL"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
        });

        // 渲染组 1：粒子与绘制列表只读 + 池纹理
        let pool_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Pool BGL"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let emit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Emit Shader"),
            source: wgpu::ShaderSource::Wgsl(EMIT_SHADER.into()),
        });
        let simulate_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Simulate Shader"),
            source: wgpu::ShaderSource::Wgsl(SIMULATE_SHADER.into()),
        });
        let render_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Render Shader"),
            source: wgpu::ShaderSource::Wgsl(RENDER_SHADER.into()),
        });

        let emit_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Emit Pipeline Layout"),
            bind_group_layouts: &[&emit_bgl],
            push_constant_ranges: &[],
        });
        let emit_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Particle Emit Pipeline"),
            layout: Some(&emit_layout),
            module: &emit_shader,
            entry_point: "emit_main",
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        });

        let simulate_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Simulate Pipeline Layout"),
            bind_group_layouts: &[&sim_bgl],
            push_constant_ranges: &[],
        });
        let simulate_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Particle Simulate Pipeline"),
            layout: Some(&simulate_layout),
            module: &simulate_shader,
            entry_point: "simulate_main",
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        });

        let render_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Render Pipeline Layout"),
            bind_group_layouts: &[&frame_bgl, &pool_bgl],
            push_constant_ranges: &[],
        });
        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Particle Render Pipeline"),
            layout: Some(&render_layout),
            vertex: wgpu::VertexState {
                module: &render_shader,
                entry_point: "vs_main",
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &render_shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            // 深度只读：半透明四边形之间不互相遮挡
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_format,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Self {
            emit_pipeline,
            simulate_pipeline,
            render_pipeline,
            emit_bgl,
            sim_bgl,
            frame_bgl,
            pool_bgl,
        }
    }
}

// ============================================================================
// 着色器
// ============================================================================

/// 发射计算着色器
///
/// 每个线程从空闲栈弹出一个槽位并写入新生粒子。
const EMIT_SHADER: &str = r#"
struct EmitterParams {
    position: vec4<f32>,
    velocity: vec4<f32>,
    emit_count: u32,
    dead_count: u32,
    total_time: f32,
    seed: u32,
};

struct Particle {
    position: vec4<f32>,
    velocity: vec4<f32>,
};

@group(0) @binding(0) var<uniform> emitter: EmitterParams;
@group(0) @binding(1) var<storage, read_write> particles: array<Particle>;
@group(0) @binding(2) var<storage, read_write> dead_list: array<u32>;
@group(0) @binding(3) var<storage, read_write> dead_count: atomic<u32>;

// PCG 哈希
fn pcg(input: u32) -> u32 {
    let state = input * 747796405u + 2891336453u;
    let word = ((state >> ((state >> 28u) + 4u)) ^ state) * 277803737u;
    return (word >> 22u) ^ word;
}

fn random_float(seed: u32) -> f32 {
    return f32(pcg(seed)) / 4294967295.0;
}

@compute @workgroup_size(64)
fn emit_main(@builtin(global_invocation_id) global_id: vec3<u32>) {
    let idx = global_id.x;
    // dead_count 是本次派发前刷新的空闲数，超出供应的线程直接退出
    if (idx >= emitter.emit_count || idx >= emitter.dead_count) {
        return;
    }

    // 空闲栈弹出；计数器被并发耗尽时撤销并放弃
    let prev = atomicSub(&dead_count, 1u);
    if (prev == 0u || prev > arrayLength(&dead_list)) {
        atomicAdd(&dead_count, 1u);
        return;
    }
    let slot = dead_list[prev - 1u];

    // 位置抖动，幅度存放在 position.w
    let base = emitter.seed + idx * 3u + bitcast<u32>(emitter.total_time);
    let jitter = vec3<f32>(
        random_float(base) * 2.0 - 1.0,
        random_float(base + 1u) * 2.0 - 1.0,
        random_float(base + 2u) * 2.0 - 1.0,
    ) * emitter.position.w;

    var p: Particle;
    p.position = vec4<f32>(emitter.position.xyz + jitter, 0.0);
    p.velocity = emitter.velocity;
    particles[slot] = p;
}
"#;

/// 模拟计算着色器
///
/// 覆盖整个池：死槽位跳过，到龄粒子压回空闲栈，存活粒子积分后加入绘制列表。
const SIMULATE_SHADER: &str = r#"
struct SimParams {
    delta_time: f32,
    capacity: u32,
};

struct Particle {
    position: vec4<f32>,
    velocity: vec4<f32>,
};

@group(0) @binding(0) var<uniform> params: SimParams;
@group(0) @binding(1) var<storage, read_write> particles: array<Particle>;
@group(0) @binding(2) var<storage, read_write> dead_list: array<u32>;
@group(0) @binding(3) var<storage, read_write> dead_count: atomic<u32>;
@group(0) @binding(4) var<storage, read_write> draw_list: array<u32>;
@group(0) @binding(5) var<storage, read_write> draw_count: atomic<u32>;

@compute @workgroup_size(64)
fn simulate_main(@builtin(global_invocation_id) global_id: vec3<u32>) {
    let idx = global_id.x;
    if (idx >= params.capacity) {
        return;
    }

    var p = particles[idx];
    let lifetime = p.velocity.w;
    // lifetime <= 0 表示空闲槽位
    if (lifetime <= 0.0) {
        return;
    }

    let age = p.position.w + params.delta_time;
    if (age >= lifetime) {
        // 到龄：标记空闲并压回空闲栈
        p.velocity.w = 0.0;
        particles[idx] = p;
        dead_list[atomicAdd(&dead_count, 1u)] = idx;
        return;
    }

    p.position = vec4<f32>(p.position.xyz + p.velocity.xyz * params.delta_time, age);
    particles[idx] = p;
    draw_list[atomicAdd(&draw_count, 1u)] = idx;
}
"#;

/// 渲染着色器
///
/// 顶点阶段按绘制列表取粒子，在视图空间展开面向相机的四边形；
/// 片元阶段采样池纹理并按剩余生命比例淡出。
const RENDER_SHADER: &str = r#"
struct FrameParams {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    half_size: f32,
};

struct Particle {
    position: vec4<f32>,
    velocity: vec4<f32>,
};

@group(0) @binding(0) var<uniform> frame: FrameParams;
@group(1) @binding(0) var<storage, read> particles: array<Particle>;
@group(1) @binding(1) var<storage, read> draw_list: array<u32>;
@group(1) @binding(2) var pool_texture: texture_2d<f32>;
@group(1) @binding(3) var pool_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) fade: f32,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @builtin(instance_index) instance_index: u32,
) -> VertexOutput {
    let slot = draw_list[instance_index];
    let p = particles[slot];

    // 顶点索引低两位解码四边形角点
    let corner = vec2<f32>(
        f32(vertex_index & 1u) * 2.0 - 1.0,
        f32((vertex_index >> 1u) & 1u) * 2.0 - 1.0,
    );

    // 视图空间展开，四边形始终面向相机
    var view_pos = frame.view * vec4<f32>(p.position.xyz, 1.0);
    view_pos = vec4<f32>(view_pos.xy + corner * frame.half_size, view_pos.zw);

    var out: VertexOutput;
    out.clip_position = frame.proj * view_pos;
    out.uv = vec2<f32>(corner.x * 0.5 + 0.5, 0.5 - corner.y * 0.5);
    out.fade = 1.0 - clamp(p.position.w / p.velocity.w, 0.0, 1.0);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(pool_texture, pool_sampler, in.uv);
    return vec4<f32>(color.rgb, color.a * in.fade);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_sources_not_empty() {
        assert!(!EMIT_SHADER.is_empty());
        assert!(!SIMULATE_SHADER.is_empty());
        assert!(!RENDER_SHADER.is_empty());
    }

    #[test]
    fn test_shader_entry_points_present() {
        assert!(EMIT_SHADER.contains("fn emit_main"));
        assert!(SIMULATE_SHADER.contains("fn simulate_main"));
        assert!(RENDER_SHADER.contains("fn vs_main"));
        assert!(RENDER_SHADER.contains("fn fs_main"));
    }

    #[test]
    fn test_workgroup_size_matches_shaders() {
        let literal = format!("@workgroup_size({WORKGROUP_SIZE})");
        assert!(EMIT_SHADER.contains(&literal));
        assert!(SIMULATE_SHADER.contains(&literal));
    }

    #[test]
    fn test_quad_indices_cover_four_corners() {
        let mut seen = [false; 4];
        for idx in QUAD_INDICES {
            seen[idx as usize] = true;
        }
        assert_eq!(seen, [true; 4]);
        assert_eq!(QUAD_INDICES.len(), 6);
    }
}
