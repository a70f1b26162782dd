//! 粒子系统性能基准测试
//!
//! 主机端参数打包、配置解析，以及完整帧序列的提交开销。

use bytemuck::Zeroable;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Mat4, Vec3};

use particle_engine::render::particles::{EmitterParams, FrameParams, GpuParticle};
use particle_engine::{ParticleConfig, ParticleSystem, RenderContext, RenderTarget};

fn bench_params_packing(c: &mut Criterion) {
    let mut group = c.benchmark_group("params_packing");

    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
    let proj = Mat4::perspective_rh(0.785398, 16.0 / 9.0, 0.1, 100.0);

    group.bench_function("frame_params_new", |b| {
        b.iter(|| black_box(FrameParams::new(black_box(view), black_box(proj), 0.25)));
    });

    let params = EmitterParams {
        position: [0.0, 1.0, 0.0, 0.05],
        velocity: [0.0, 2.0, 0.0, 1.5],
        emit_count: 128,
        dead_count: 1024,
        total_time: 3.2,
        seed: 0x9e3779b9,
    };
    group.bench_function("emitter_params_bytes", |b| {
        b.iter(|| black_box(bytemuck::bytes_of(black_box(&params))));
    });

    // 容量对应的主机端初始化成本
    for capacity in [1024usize, 16384].iter() {
        group.bench_with_input(
            BenchmarkId::new("zeroed_particles", capacity),
            capacity,
            |b, &count| {
                b.iter(|| black_box(vec![GpuParticle::zeroed(); count]));
            },
        );
    }

    group.finish();
}

fn bench_config_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("config_parsing");

    let toml_content = r#"
pool_capacity = 4096
particle_half_size = 0.3
spawn_jitter = 0.1
"#;
    group.bench_function("from_toml_str", |b| {
        b.iter(|| ParticleConfig::from_toml_str(black_box(toml_content)).unwrap());
    });

    let json_content = r#"{"pool_capacity":4096,"particle_half_size":0.3,"spawn_jitter":0.1}"#;
    group.bench_function("from_json_str", |b| {
        b.iter(|| ParticleConfig::from_json_str(black_box(json_content)).unwrap());
    });

    group.finish();
}

fn bench_frame_submission(c: &mut Criterion) {
    let context = match RenderContext::new() {
        Ok(context) => context,
        Err(e) => {
            eprintln!("no adapter available, skipping: {e}");
            return;
        }
    };

    let mut group = c.benchmark_group("frame_submission");
    group.sample_size(20);

    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
    let proj = Mat4::perspective_rh(0.785398, 1.0, 0.1, 100.0);
    let target = RenderTarget::new(
        &context.device,
        256,
        256,
        wgpu::TextureFormat::Rgba8UnormSrgb,
        wgpu::TextureFormat::Depth32Float,
    );

    for capacity in [1024u32, 16384].iter() {
        let config = ParticleConfig {
            pool_capacity: *capacity,
            ..ParticleConfig::default()
        };
        let mut system = ParticleSystem::new(
            &context.device,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            wgpu::TextureFormat::Depth32Float,
            &config,
        )
        .unwrap();
        let handle = system
            .create_emitter_with_default_texture(&context.device, &context.queue, "bench")
            .unwrap();
        system.set_emitter_parameters(handle, Vec3::ZERO, Vec3::Y, 2.0, 1000.0);

        let mut total_time = 0.0f32;
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            capacity,
            |b, _| {
                b.iter(|| {
                    total_time += 0.016;
                    let mut encoder = context
                        .device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
                    system.update(&context.queue, &mut encoder, 0.016, total_time);
                    system.draw(
                        &context.queue,
                        &mut encoder,
                        &target.color_view,
                        &target.depth_view,
                        view,
                        proj,
                    );
                    context.queue.submit(std::iter::once(encoder.finish()));
                    context.device.poll(wgpu::Maintain::Wait);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_params_packing,
    bench_config_parsing,
    bench_frame_submission
);
criterion_main!(benches);
