//! 帧内模式推导辅助: 角度、广角映射、PDPC 条件与 MIP 尺寸类.

use vvc_core::math::log2_floor;

use super::tables::{INTRA_PRED_ANGLES, REF_FILTER_MODES};
use super::{CodingUnit, INTRA_DC, INTRA_DIAG, INTRA_HORZ, INTRA_PLANAR, INTRA_VERT, IspSplit};

/// 模式对应的 `intraPredAngle`, 1/32 样本精度
pub fn intra_pred_angle(mode: i32) -> i32 {
    let idx = if mode > INTRA_DIAG {
        mode - INTRA_VERT
    } else if mode > 0 {
        INTRA_HORZ - mode
    } else {
        INTRA_HORZ - 2 - mode
    };
    let angle = INTRA_PRED_ANGLES[idx.unsigned_abs() as usize];
    if idx < 0 { -angle } else { angle }
}

/// `invAngle = Round(512 * 32 / angle)`, 角度为 0 时返回 0
pub fn inv_angle(angle: i32) -> i32 {
    if angle == 0 {
        return 0;
    }
    let abs = angle.abs();
    let inv = (512 * 32 + abs / 2) / abs;
    if angle < 0 { -inv } else { inv }
}

fn is_non_angular(mode: i32) -> bool {
    mode == INTRA_PLANAR || mode == INTRA_DC || mode == INTRA_HORZ || mode == INTRA_VERT
}

/// PDPC 权重衰减尺度 `nScale`
pub fn nscale(w: u32, h: u32, mode: i32) -> i32 {
    if is_non_angular(mode) {
        return (log2_floor(w) as i32 + log2_floor(h) as i32 - 2) >> 2;
    }
    debug_assert!(
        mode <= INTRA_HORZ || mode >= INTRA_VERT,
        "nscale 不适用于对角区间模式"
    );
    let inv = inv_angle(intra_pred_angle(mode));
    let side = if mode >= INTRA_VERT { h } else { w };
    (log2_floor(side) as i32 - log2_floor((3 * inv - 2) as u32) as i32 + 8).min(2)
}

/// 是否对预测结果做位置相关修正 (PDPC)
pub fn need_pdpc(w: u32, h: u32, bdpcm: bool, mode: i32, ref_idx: u8) -> bool {
    if w < 4 || h < 4 || ref_idx != 0 || bdpcm {
        return false;
    }
    if is_non_angular(mode) {
        return true;
    }
    if mode > INTRA_HORZ && mode < INTRA_VERT {
        return false;
    }
    nscale(w, h, mode) >= 0
}

/// 参考样本平滑标志 `refFilterFlag`
pub fn ref_filter_flag(mode: i32) -> bool {
    REF_FILTER_MODES.contains(&mode)
}

/// MIP 尺寸类: 0 = 4x4, 1 = 4xN / Nx4 / 8x8, 2 = 其余
pub fn mip_size_id(w: u32, h: u32) -> usize {
    if w == 4 && h == 4 {
        0
    } else if w == 4 || h == 4 || (w == 8 && h == 8) {
        1
    } else {
        2
    }
}

/// 非方形块的广角模式映射
///
/// 亮度 ISP 以编码块尺寸判定宽高比, 其余情况使用变换块尺寸.
pub fn wide_angle_mode_mapping(cu: &CodingUnit, tb_width: u32, tb_height: u32, c_idx: usize, mode: i32) -> i32 {
    let (nw, nh) = if cu.isp_split == IspSplit::None || c_idx != 0 {
        (tb_width, tb_height)
    } else {
        (cu.cb_width, cu.cb_height)
    };
    let wh_ratio = (log2_floor(nw) as i32 - log2_floor(nh) as i32).abs();
    let max = if wh_ratio > 1 { 8 + 2 * wh_ratio } else { 8 };
    let min = if wh_ratio > 1 { 60 - 2 * wh_ratio } else { 60 };

    if nw > nh && mode >= 2 && mode < max {
        mode + 65
    } else if nh > nw && mode <= 66 && mode > min {
        mode - 67
    } else {
        mode
    }
}

/// 广角模式还原为常规模式号 `2..=66`
pub fn wide_angle_mode_unmapping(mode: i32) -> i32 {
    if mode < 0 {
        mode + 67
    } else if mode > 66 {
        mode - 65
    } else {
        mode
    }
}
