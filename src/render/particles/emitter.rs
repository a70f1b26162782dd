//! 粒子发射器
//!
//! 发射器只是主机端的生成参数加一个发射累积器，粒子本身完全活在池的
//! 设备缓冲区里。对外暴露的句柄不持有任何资源。

use glam::Vec3;

// ============================================================================
// 发射参数
// ============================================================================

/// 发射器生成参数
///
/// 新建的发射器全零：速率为 0 时不发射任何粒子，直到调用方设置参数。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EmitterSettings {
    /// 发射原点
    pub position: Vec3,
    /// 初始速度
    pub velocity: Vec3,
    /// 粒子生命周期（秒）
    pub lifetime: f32,
    /// 每秒发射数量
    pub rate: f32,
}

// ============================================================================
// 发射器状态
// ============================================================================

/// 单个发射器的主机端状态
///
/// 累积器把连续速率离散成整数发射数，小数余量跨帧保留，
/// 任意时间窗口内的总发射数与 `rate * window` 的偏差不超过 1。
pub(crate) struct Emitter {
    /// 生成参数
    pub settings: EmitterSettings,
    /// 发射累积器，更新后始终落在 [0, 1)
    accumulator: f32,
    /// 最近一次更新计算出的发射数量
    pub emit_count: u32,
    /// 抖动种子（创建时随机分配）
    pub seed: u32,
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            settings: EmitterSettings::default(),
            accumulator: 0.0,
            emit_count: 0,
            seed: rand::random(),
        }
    }

    /// 计算本帧应发射的粒子数
    pub fn particles_to_emit(&mut self, delta_time: f32) -> u32 {
        self.accumulator += self.settings.rate * delta_time;

        let count = self.accumulator.floor() as u32;
        self.accumulator -= count as f32;
        self.emit_count = count;
        count
    }
}

// ============================================================================
// 发射器句柄
// ============================================================================

/// 发射器句柄
///
/// 仅引用（池，槽位）；所有修改都经由 `ParticleSystem::set_emitter_parameters`，
/// 索引对调用方不可见。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticleEmitter {
    pool: u32,
    slot: u32,
}

impl ParticleEmitter {
    pub(crate) fn new(pool: u32, slot: u32) -> Self {
        Self { pool, slot }
    }

    pub(crate) fn pool_index(&self) -> usize {
        self.pool as usize
    }

    pub(crate) fn slot_index(&self) -> usize {
        self.slot as usize
    }
}
