//! 像素格式定义.
//!
//! 只覆盖 VVC 主档次可输出的平面格式: 灰度与 YUV 4:2:0/4:2:2/4:4:4, 位深 8/10/12.
//! 样本统一按 16 位存储, 位深只影响取值范围.

use std::fmt;

/// 像素格式
///
/// 命名规则: 颜色空间 + 位深 + 排列方式 (P=Planar, LE=小端).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    // ========================
    // 灰度格式 (chroma_format_idc = 0)
    // ========================
    /// 灰度 8 位
    Gray8,
    /// 灰度 10 位小端
    Gray10le,
    /// 灰度 12 位小端
    Gray12le,

    // ========================
    // YUV 平面格式 (Planar)
    // ========================
    /// YUV 4:2:0 平面格式, 8 位
    Yuv420p,
    /// YUV 4:2:2 平面格式, 8 位
    Yuv422p,
    /// YUV 4:4:4 平面格式, 8 位
    Yuv444p,
    /// YUV 4:2:0 平面格式, 10 位小端
    Yuv420p10le,
    /// YUV 4:2:2 平面格式, 10 位小端
    Yuv422p10le,
    /// YUV 4:4:4 平面格式, 10 位小端
    Yuv444p10le,
    /// YUV 4:2:0 平面格式, 12 位小端
    Yuv420p12le,
    /// YUV 4:2:2 平面格式, 12 位小端
    Yuv422p12le,
    /// YUV 4:4:4 平面格式, 12 位小端
    Yuv444p12le,
}

impl PixelFormat {
    /// 由 chroma_format_idc 与位深映射像素格式
    ///
    /// 位深不是 8/10/12 或 chroma_format_idc 大于 3 时返回 `None`.
    pub const fn from_chroma_format(chroma_format_idc: u8, bit_depth: u32) -> Option<Self> {
        Some(match (chroma_format_idc, bit_depth) {
            (0, 8) => Self::Gray8,
            (0, 10) => Self::Gray10le,
            (0, 12) => Self::Gray12le,
            (1, 8) => Self::Yuv420p,
            (1, 10) => Self::Yuv420p10le,
            (1, 12) => Self::Yuv420p12le,
            (2, 8) => Self::Yuv422p,
            (2, 10) => Self::Yuv422p10le,
            (2, 12) => Self::Yuv422p12le,
            (3, 8) => Self::Yuv444p,
            (3, 10) => Self::Yuv444p10le,
            (3, 12) => Self::Yuv444p12le,
            _ => return None,
        })
    }

    /// 单个分量的位深
    pub const fn bits_per_component(&self) -> u32 {
        match self {
            Self::Gray8 | Self::Yuv420p | Self::Yuv422p | Self::Yuv444p => 8,
            Self::Gray10le | Self::Yuv420p10le | Self::Yuv422p10le | Self::Yuv444p10le => 10,
            Self::Gray12le | Self::Yuv420p12le | Self::Yuv422p12le | Self::Yuv444p12le => 12,
        }
    }

    /// 获取色度子采样 (水平, 垂直)
    ///
    /// 返回 (log2 水平子采样, log2 垂直子采样).
    /// 例如 YUV420 返回 (1, 1), 表示色度分辨率为亮度的 1/2 x 1/2.
    pub const fn chroma_subsampling(&self) -> (u32, u32) {
        match self {
            Self::Yuv420p | Self::Yuv420p10le | Self::Yuv420p12le => (1, 1),
            Self::Yuv422p | Self::Yuv422p10le | Self::Yuv422p12le => (1, 0),
            _ => (0, 0),
        }
    }

    /// 是否只有亮度平面
    pub const fn is_gray(&self) -> bool {
        matches!(self, Self::Gray8 | Self::Gray10le | Self::Gray12le)
    }

    /// 平面数量
    pub const fn plane_count(&self) -> u32 {
        if self.is_gray() { 1 } else { 3 }
    }

    /// 指定平面的宽度 (样本数)
    ///
    /// 平面索引超出范围时返回 `None`.
    pub fn plane_width(&self, plane: usize, width: u32) -> Option<usize> {
        if plane >= self.plane_count() as usize {
            return None;
        }
        let (sub_h, _) = self.chroma_subsampling();
        let w = width as usize;
        Some(if plane == 0 { w } else { w >> sub_h })
    }

    /// 指定平面的行数
    ///
    /// 平面索引超出范围时返回 `None`.
    pub fn plane_height(&self, plane: usize, height: u32) -> Option<usize> {
        if plane >= self.plane_count() as usize {
            return None;
        }
        let (_, sub_v) = self.chroma_subsampling();
        let h = height as usize;
        Some(if plane == 0 { h } else { h >> sub_v })
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gray8 => "gray8",
            Self::Gray10le => "gray10le",
            Self::Gray12le => "gray12le",
            Self::Yuv420p => "yuv420p",
            Self::Yuv422p => "yuv422p",
            Self::Yuv444p => "yuv444p",
            Self::Yuv420p10le => "yuv420p10le",
            Self::Yuv422p10le => "yuv422p10le",
            Self::Yuv444p10le => "yuv444p10le",
            Self::Yuv420p12le => "yuv420p12le",
            Self::Yuv422p12le => "yuv422p12le",
            Self::Yuv444p12le => "yuv444p12le",
        };
        write!(f, "{name}")
    }
}
