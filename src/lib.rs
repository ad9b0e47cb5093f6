//! # vvc-intra
//!
//! 纯 Rust 实现的 H.266/VVC 解码核心: 参数集推导与帧内预测.
//!
//! 码流符号解析、残差变换与帧间预测不在本库范围内,
//! 调用方把已解析的原始字段交给 [`codec::ps::ParamSets`], 再以 slice 为单位
//! 驱动 [`codec::intra::IntraPredictor`] 写出预测样本.
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use vvc_intra::codec::ps::ParamSets;
//! use vvc_intra::codec::ps::raw::{RawPps, RawSps};
//!
//! let mut ps = ParamSets::new();
//! match ps.decode_ps(&RawSps::default(), &RawPps::default(), true) {
//!     Ok(pps) => println!("图像尺寸: {}x{}", pps.size.width, pps.size.height),
//!     Err(err) => eprintln!("参数集推导失败: {err}"),
//! }
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `vvc-core` | 错误类型、像素格式与定点运算 |
//! | `vvc-codec` | 参数集推导与帧内预测 |

/// 核心类型与工具
pub use vvc_core as core;

/// 参数集推导与帧内预测
pub use vvc_codec as codec;

pub mod logging;

/// 获取版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
