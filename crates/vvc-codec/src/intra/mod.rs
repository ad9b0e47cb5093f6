//! VVC 帧内预测.
//!
//! 以 slice 为单位工作: 每个 slice 持有一个 [`LocalContext`] 登记已重建区域,
//! [`IntraPredictor`] 按编码单元的模式把预测样本直接写入重建帧.
//!
//! 支持的预测:
//! - 平面 / DC / 水平 / 垂直, 含 PDPC
//! - 65 个角度方向与广角模式, 含参考平滑、插值滤波与 PDPC
//! - 矩阵加权预测 (MIP)
//! - 跨分量线性模型 (CCLM)
//!
//! 另提供亮度相关的色度残差缩放 (LMCS), 见 [`LocalContext::lmcs_scale_chroma`].

mod availability;
mod cclm;
mod edge;
mod lmcs;
mod mip;
mod pred;
mod tables;
mod utils;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use log::trace;

use crate::frame::VideoFrame;
use edge::EdgeRequest;
use pred::AngularParams;

pub use availability::{CtbBoundary, LocalContext, NeighbourAvailable, ReconstructedArea};
pub use cclm::CclmParams;
pub use edge::{IntraEdgeParams, RefLine};
pub use mip::MipMatrices;
pub use utils::{
    inv_angle, intra_pred_angle, mip_size_id, need_pdpc, nscale, ref_filter_flag,
    wide_angle_mode_mapping, wide_angle_mode_unmapping,
};

pub const INTRA_PLANAR: i32 = 0;
pub const INTRA_DC: i32 = 1;
pub const INTRA_HORZ: i32 = 18;
pub const INTRA_DIAG: i32 = 34;
pub const INTRA_VERT: i32 = 50;
pub const INTRA_LT_CCLM: i32 = 81;
pub const INTRA_L_CCLM: i32 = 82;
pub const INTRA_T_CCLM: i32 = 83;

/// CCLM 的三种邻域选择
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CclmMode {
    /// 上方与左侧
    Lt,
    /// 仅左侧 (含左下)
    L,
    /// 仅上方 (含右上)
    T,
}

impl CclmMode {
    /// 由色度模式号识别, 非 CCLM 模式返回 `None`
    pub fn from_mode(mode: i32) -> Option<Self> {
        match mode {
            INTRA_LT_CCLM => Some(Self::Lt),
            INTRA_L_CCLM => Some(Self::L),
            INTRA_T_CCLM => Some(Self::T),
            _ => None,
        }
    }
}

/// 帧内子块划分 (ISP) 方向
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IspSplit {
    #[default]
    None,
    Horizontal,
    Vertical,
}

/// MIP 模式信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MipInfo {
    pub mode: u8,
    pub transposed: bool,
}

/// 预测所需的编码单元信息, 坐标与尺寸为亮度样本
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodingUnit {
    pub x0: u32,
    pub y0: u32,
    pub cb_width: u32,
    pub cb_height: u32,
    pub intra_pred_mode_y: i32,
    pub intra_pred_mode_c: i32,
    /// 亮度使用 MIP 时为 `Some`
    pub mip: Option<MipInfo>,
    /// 4:4:4 下色度沿用亮度的 MIP
    pub mip_chroma_direct: bool,
    /// 多参考行索引 0..=2
    pub intra_luma_ref_idx: u8,
    pub isp_split: IspSplit,
    pub bdpcm: [bool; 3],
}

impl CodingUnit {
    /// 平面模式、无 MIP/ISP 的编码单元
    pub fn new(x0: u32, y0: u32, cb_width: u32, cb_height: u32) -> Self {
        Self {
            x0,
            y0,
            cb_width,
            cb_height,
            intra_pred_mode_y: INTRA_PLANAR,
            intra_pred_mode_c: INTRA_PLANAR,
            mip: None,
            mip_chroma_direct: false,
            intra_luma_ref_idx: 0,
            isp_split: IspSplit::None,
            bdpcm: [false; 3],
        }
    }

    pub fn cclm_mode(&self) -> Option<CclmMode> {
        CclmMode::from_mode(self.intra_pred_mode_c)
    }
}

/// 帧内预测器
///
/// 只持有只读的 MIP 系数, 可在多个 slice 线程间共享.
#[derive(Debug, Clone)]
pub struct IntraPredictor {
    mip: Arc<MipMatrices>,
}

impl IntraPredictor {
    pub fn new(mip: Arc<MipMatrices>) -> Self {
        Self { mip }
    }

    /// 预测一个变换块并写入 `frame`
    ///
    /// `(x0, y0)` 与 `width x height` 为亮度坐标与尺寸, 色度分量按子采样换算.
    /// 色度模式为 CCLM 时, `c_idx == 1` 同时写出 Cb 与 Cr, `c_idx == 2` 不做任何事.
    ///
    /// 块几何与模式由上游推导保证合法, 这里只在 debug 构建中断言.
    #[allow(clippy::too_many_arguments)]
    pub fn predict(
        &self,
        lc: &LocalContext,
        cu: &CodingUnit,
        frame: &mut VideoFrame,
        x0: u32,
        y0: u32,
        width: u32,
        height: u32,
        c_idx: usize,
    ) {
        debug_check_block(lc, frame, x0, y0, width, height, c_idx);

        if c_idx > 0
            && let Some(mode) = cu.cclm_mode()
        {
            if c_idx == 1 {
                self.predict_cclm(lc, mode, frame, x0, y0, width, height);
            }
            return;
        }

        let sps = &lc.pps().sps;
        let bit_depth = sps.bit_depth();
        let hs = sps.format.hshift[c_idx];
        let vs = sps.format.vshift[c_idx];
        let (x, y) = (x0 >> hs, y0 >> vs);
        let (w, h) = (width >> hs, height >> vs);

        let pred_mode = if c_idx > 0 {
            cu.intra_pred_mode_c
        } else {
            cu.intra_pred_mode_y
        };
        let mode = wide_angle_mode_mapping(cu, w, h, c_idx, pred_mode);
        let mip = cu.mip.filter(|_| c_idx == 0 || cu.mip_chroma_direct);
        let ref_idx = if c_idx > 0 { 0 } else { cu.intra_luma_ref_idx };
        let pdpc = need_pdpc(w, h, cu.bdpcm[c_idx], mode, ref_idx);

        let stride = frame.linesize[c_idx];
        let req = EdgeRequest {
            x,
            y,
            w,
            h,
            c_idx,
            is_mip: mip.is_some(),
            mode,
            ref_idx,
            need_pdpc: pdpc,
        };
        let edge = edge::prepare_intra_edge_params(lc, cu, &frame.data[c_idx], stride, bit_depth, &req);
        let (top, left) = (edge.top(), edge.left());
        let (wu, hu) = (w as usize, h as usize);
        let dst = &mut frame.data[c_idx][y as usize * stride + x as usize..];

        trace!(
            "VVC: 帧内预测, c_idx={}, pos=({}, {}), size={}x{}, mode={}, mip={}",
            c_idx, x, y, w, h, mode, mip.is_some()
        );

        if let Some(info) = mip {
            let size_id = mip_size_id(w, h);
            let mode_id = usize::from(info.mode);
            debug_assert!(
                mode_id < MipMatrices::num_modes(size_id),
                "MIP 模式超出范围, size_id={}, mode={}",
                size_id,
                mode_id
            );
            let matrix = self.mip.matrix(size_id, mode_id);
            mip::pred_mip(dst, stride, top, left, wu, hu, matrix, size_id, info.transposed, bit_depth);
        } else if mode == INTRA_PLANAR {
            pred::pred_planar(dst, stride, top, left, wu, hu);
        } else if mode == INTRA_DC {
            pred::pred_dc(dst, stride, top, left, wu, hu);
        } else if mode == INTRA_VERT {
            pred::pred_v(dst, stride, top, wu, hu);
        } else if mode == INTRA_HORZ {
            pred::pred_h(dst, stride, left, wu, hu);
        } else {
            let params = AngularParams {
                is_luma: c_idx == 0,
                mode,
                ref_idx,
                filter_flag: edge.filter_flag,
                need_pdpc: pdpc,
                bit_depth,
            };
            if mode >= INTRA_DIAG {
                pred::pred_angular_v(dst, stride, top, left, wu, hu, &params);
            } else {
                pred::pred_angular_h(dst, stride, top, left, wu, hu, &params);
            }
        }

        if pdpc && mip.is_none() && matches!(mode, INTRA_PLANAR | INTRA_DC | INTRA_HORZ | INTRA_VERT) {
            pred::pdpc_non_angular(dst, stride, top, left, wu, hu, mode, bit_depth);
        }
    }

    /// 以 CCLM 预测两个色度分量, 坐标与尺寸为亮度样本
    #[allow(clippy::too_many_arguments)]
    pub fn predict_cclm(
        &self,
        lc: &LocalContext,
        mode: CclmMode,
        frame: &mut VideoFrame,
        x0: u32,
        y0: u32,
        width: u32,
        height: u32,
    ) {
        debug_assert!(frame.data.len() == 3, "CCLM 需要两个色度平面");
        debug_check_block(lc, frame, x0, y0, width, height, 1);
        trace!(
            "VVC: CCLM 预测, mode={:?}, pos=({}, {}), size={}x{}",
            mode, x0, y0, width, height
        );
        cclm::intra_cclm_pred(lc, mode, frame, x0, y0, width, height);
    }
}

/// 断言块位于平面内且帧格式与参数集一致
fn debug_check_block(
    lc: &LocalContext,
    frame: &VideoFrame,
    x0: u32,
    y0: u32,
    width: u32,
    height: u32,
    c_idx: usize,
) {
    if !cfg!(debug_assertions) {
        return;
    }
    let format = &lc.pps().sps.format;
    debug_assert_eq!(frame.pixel_format, format.pixel_format, "帧格式与 SPS 不一致");
    debug_assert!(c_idx < frame.data.len(), "帧缺少分量平面, c_idx={}", c_idx);
    let (hs, vs) = (format.hshift[c_idx], format.vshift[c_idx]);
    let (plane_w, plane_h) = frame.plane_size(c_idx);
    let (x, y) = ((x0 >> hs) as usize, (y0 >> vs) as usize);
    let (w, h) = ((width >> hs) as usize, (height >> vs) as usize);
    debug_assert!(w >= 1 && h >= 1, "预测块尺寸无效, size={}x{}", width, height);
    debug_assert!(
        x + w <= plane_w && y + h <= plane_h,
        "预测块越出平面, pos=({}, {}), size={}x{}, plane={}x{}",
        x,
        y,
        w,
        h,
        plane_w,
        plane_h
    );
}
