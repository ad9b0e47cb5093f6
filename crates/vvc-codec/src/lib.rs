//! # vvc-codec
//!
//! H.266/VVC 解码器的参数集推导与帧内预测核心.
//!
//! 本 crate 不解析码流, 输入是上游语法解析器给出的原始字段记录 ([`ps::raw`]),
//! 输出是解码可用的数值状态与写入重建帧的预测样本.
//!
//! ## 模块
//!
//! - [`ps`]: SPS/PPS/APS/PH/SH 推导与存储, 含地址映射、色度 QP 表与 LMCS 查找表
//! - [`intra`]: 邻域可用性登记、参考样本构建与全部帧内预测模式
//! - [`frame`]: 预测写入的重建帧
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vvc_codec::ps::ParamSets;
//! use vvc_codec::ps::raw::{RawPictureHeader, RawPps, RawSliceHeader, RawSps};
//! use vvc_codec::intra::LocalContext;
//!
//! # fn main() -> vvc_core::VvcResult<()> {
//! let mut ps = ParamSets::new();
//! ps.decode_ps(&RawSps::default(), &RawPps::default(), true)?;
//! let fps = ps.decode_frame_ps(&RawPictureHeader::default(), 0, true)?;
//! let sh = fps.decode_slice_header(&RawSliceHeader::default())?;
//! let mut lc = LocalContext::new(Arc::clone(&fps.pps), &sh)?;
//! lc.begin_ctu(0);
//! # Ok(())
//! # }
//! ```

pub mod frame;
pub mod intra;
pub mod ps;

// 重导出常用类型
pub use frame::VideoFrame;
pub use intra::{CodingUnit, IntraPredictor, LocalContext, MipMatrices};
pub use ps::{FrameParamSets, ParamSets, PictureHeader, Pps, SliceHeader, Sps};
