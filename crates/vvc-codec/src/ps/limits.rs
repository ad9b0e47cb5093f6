//! 参数集推导的几何上限配置.
//!
//! 默认值取自 H.266 标准附录 A 的取值范围, 可通过 serde 从配置文件覆盖,
//! 用于在推导前拒绝越界的原始字段.

use serde::{Deserialize, Serialize};
use vvc_core::{VvcError, VvcResult};

/// SPS 标识符个数
pub const MAX_SPS_COUNT: usize = 16;
/// PPS 标识符个数
pub const MAX_PPS_COUNT: usize = 64;
/// ALF APS 标识符个数
pub const MAX_ALF_COUNT: usize = 8;
/// LMCS APS 标识符个数
pub const MAX_LMCS_COUNT: usize = 4;
/// 缩放列表 APS 标识符个数
pub const MAX_SL_COUNT: usize = 8;
/// 色度 QP 映射表长度 (覆盖 `-qp_bd_offset..=63`)
pub const MAX_POINTS_IN_QP_TABLE: usize = 111;

/// 推导阶段的几何上限
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationLimits {
    /// CTU log2 尺寸下限
    pub min_ctb_log2_size: u32,
    /// CTU log2 尺寸上限
    pub max_ctb_log2_size: u32,
    /// 单幅图像最大 tile 数
    pub max_tiles: u32,
    /// 单幅图像最大 slice 数
    pub max_slices: u32,
    /// 色度 QP 映射表最大折点数
    pub max_qp_table_points: u32,
    /// 图像宽高上限 (亮度样本)
    pub max_picture_dimension: u32,
}

impl Default for DerivationLimits {
    fn default() -> Self {
        Self {
            min_ctb_log2_size: 5,
            max_ctb_log2_size: 7,
            max_tiles: 990,
            max_slices: 1000,
            max_qp_table_points: 111,
            max_picture_dimension: 8192,
        }
    }
}

impl DerivationLimits {
    /// 校验配置自身的一致性
    pub fn validate(&self) -> VvcResult<()> {
        if self.min_ctb_log2_size > self.max_ctb_log2_size || self.max_ctb_log2_size > 7 {
            return Err(VvcError::InvalidArgument(format!(
                "VVC: CTU 尺寸范围非法, min_log2={}, max_log2={}",
                self.min_ctb_log2_size, self.max_ctb_log2_size
            )));
        }
        if self.max_tiles == 0 || self.max_slices == 0 || self.max_picture_dimension == 0 {
            return Err(VvcError::InvalidArgument(
                "VVC: tile/slice/图像尺寸上限不能为 0".into(),
            ));
        }
        if self.max_qp_table_points as usize > MAX_POINTS_IN_QP_TABLE {
            return Err(VvcError::InvalidArgument(format!(
                "VVC: max_qp_table_points 超出范围, value={}",
                self.max_qp_table_points
            )));
        }
        Ok(())
    }
}
