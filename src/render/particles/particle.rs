//! GPU 粒子数据结构
//!
//! 定义粒子池在设备端使用的全部数据记录，布局与 WGSL 结构一一对应。

use glam::Mat4;

// ============================================================================
// 粒子记录
// ============================================================================

/// GPU 粒子结构（对应 WGSL struct）
///
/// 年龄存放在 position.w，生命周期存放在 velocity.w。
/// lifetime <= 0 表示槽位空闲，清零的缓冲区即为全空闲状态。
#[repr(C)]
#[derive(Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuParticle {
    /// 位置（w = 当前年龄）
    pub position: [f32; 4],
    /// 速度（w = 生命周期）
    pub velocity: [f32; 4],
}

// ============================================================================
// Uniform 记录
// ============================================================================

/// 发射阶段 Uniform（每个发射器一份）
#[repr(C)]
#[derive(Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EmitterParams {
    /// 发射原点（w = 位置抖动幅度）
    pub position: [f32; 4],
    /// 初始速度（w = 生命周期）
    pub velocity: [f32; 4],
    /// 本帧发射数量
    pub emit_count: u32,
    /// 空闲列表当前长度（设备间拷贝的目标字段）
    pub dead_count: u32,
    /// 系统累计时间
    pub total_time: f32,
    /// 随机抖动种子
    pub seed: u32,
}

impl EmitterParams {
    /// `dead_count` 字段的字节偏移，空闲计数器刷新拷贝写入此处
    pub const DEAD_COUNT_OFFSET: u64 = 32 + 4;
}

/// 模拟阶段 Uniform（每个池一份）
#[repr(C)]
#[derive(Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SimParams {
    /// 帧时间增量
    pub delta_time: f32,
    /// 池容量
    pub capacity: u32,
    /// 填充
    pub _padding: [u32; 2],
}

/// 绘制阶段 Uniform（每帧一份，所有池共享）
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameParams {
    /// 视图矩阵
    pub view: [[f32; 4]; 4],
    /// 投影矩阵
    pub proj: [[f32; 4]; 4],
    /// 粒子四边形半边长
    pub half_size: f32,
    /// 填充
    pub _padding: [f32; 3],
}

impl FrameParams {
    pub fn new(view: Mat4, proj: Mat4, half_size: f32) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            half_size,
            _padding: [0.0; 3],
        }
    }
}

// ============================================================================
// 间接绘制参数
// ============================================================================

/// 索引间接绘制参数
#[repr(C)]
#[derive(Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawIndexedIndirectArgs {
    /// 索引数
    pub index_count: u32,
    /// 实例数
    pub instance_count: u32,
    /// 第一个索引
    pub first_index: u32,
    /// 基础顶点
    pub base_vertex: i32,
    /// 第一个实例
    pub first_instance: u32,
}

impl DrawIndexedIndirectArgs {
    /// `instance_count` 字段的字节偏移，绘制列表计数器刷新拷贝写入此处
    pub const INSTANCE_COUNT_OFFSET: u64 = 4;

    /// 粒子四边形的初始参数：6 个索引，实例数由设备端计数器刷新
    pub fn for_particle_quad() -> Self {
        Self {
            index_count: 6,
            instance_count: 0,
            first_index: 0,
            base_vertex: 0,
            first_instance: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sizes() {
        assert_eq!(std::mem::size_of::<GpuParticle>(), 32);
        assert_eq!(std::mem::size_of::<EmitterParams>(), 48);
        assert_eq!(std::mem::size_of::<SimParams>(), 16);
        assert_eq!(std::mem::size_of::<FrameParams>(), 144);
        assert_eq!(std::mem::size_of::<DrawIndexedIndirectArgs>(), 20);
    }

    #[test]
    fn test_dead_count_offset() {
        let params = EmitterParams {
            dead_count: 0xAABB_CCDD,
            ..Default::default()
        };
        let bytes = bytemuck::bytes_of(&params);
        let offset = EmitterParams::DEAD_COUNT_OFFSET as usize;
        assert_eq!(
            u32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ]),
            0xAABB_CCDD
        );
    }

    #[test]
    fn test_instance_count_offset() {
        let args = DrawIndexedIndirectArgs {
            instance_count: 42,
            ..DrawIndexedIndirectArgs::for_particle_quad()
        };
        let bytes = bytemuck::bytes_of(&args);
        let offset = DrawIndexedIndirectArgs::INSTANCE_COUNT_OFFSET as usize;
        assert_eq!(
            u32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ]),
            42
        );
        assert_eq!(args.index_count, 6);
    }

    #[test]
    fn test_zeroed_particle_is_dead() {
        let particle = GpuParticle::default();
        assert!(particle.velocity[3] <= 0.0);
    }
}
