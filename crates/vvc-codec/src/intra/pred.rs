//! 常规帧内预测: 平面、DC、水平、垂直与角度模式, 以及非角度模式的 PDPC.
//!
//! 所有函数写入以块左上角为起点的 `dst`, 行跨度为 `stride`.

use vvc_core::math::{clip_pixel, log2_floor};

use super::edge::RefLine;
use super::tables::INTRA_LUMA_FILTER;
use super::utils::{intra_pred_angle, inv_angle, nscale};
use super::{INTRA_DC, INTRA_HORZ, INTRA_PLANAR, INTRA_VERT};

/// 平面预测
pub(crate) fn pred_planar(dst: &mut [u16], stride: usize, top: RefLine, left: RefLine, w: usize, h: usize) {
    let logw = log2_floor(w as u32);
    let logh = log2_floor(h as u32);
    let size = (w * h) as i32;
    let shift = logw + logh + 1;
    let (wi, hi) = (w as i32, h as i32);
    for y in 0..hi {
        let row = &mut dst[y as usize * stride..];
        for x in 0..wi {
            let pred_v = ((hi - 1 - y) * top.at(x) + (y + 1) * left.at(hi)) << logw;
            let pred_h = ((wi - 1 - x) * left.at(y) + (x + 1) * top.at(wi)) << logh;
            row[x as usize] = ((pred_v + pred_h + size) >> shift) as u16;
        }
    }
}

/// DC 值: 宽块取上方, 高块取左侧, 方块取两侧
pub(crate) fn dc_value(top: RefLine, left: RefLine, w: usize, h: usize) -> u16 {
    let offset = if w == h { (w << 1) as u32 } else { w.max(h) as u32 };
    let shift = log2_floor(offset);
    let mut sum = 0i32;
    if w >= h {
        sum += (0..w as i32).map(|i| top.at(i)).sum::<i32>();
    }
    if w <= h {
        sum += (0..h as i32).map(|i| left.at(i)).sum::<i32>();
    }
    ((sum + (offset >> 1) as i32) >> shift) as u16
}

pub(crate) fn pred_dc(dst: &mut [u16], stride: usize, top: RefLine, left: RefLine, w: usize, h: usize) {
    let dc = dc_value(top, left, w, h);
    for y in 0..h {
        dst[y * stride..y * stride + w].fill(dc);
    }
}

pub(crate) fn pred_v(dst: &mut [u16], stride: usize, top: RefLine, w: usize, h: usize) {
    for y in 0..h {
        let row = &mut dst[y * stride..y * stride + w];
        for (x, s) in row.iter_mut().enumerate() {
            *s = top.at(x as i32) as u16;
        }
    }
}

pub(crate) fn pred_h(dst: &mut [u16], stride: usize, left: RefLine, w: usize, h: usize) {
    for y in 0..h {
        let v = left.at(y as i32) as u16;
        dst[y * stride..y * stride + w].fill(v);
    }
}

/// 平面、DC、水平、垂直模式的位置相关修正
#[allow(clippy::too_many_arguments)]
pub(crate) fn pdpc_non_angular(
    dst: &mut [u16],
    stride: usize,
    top: RefLine,
    left: RefLine,
    w: usize,
    h: usize,
    mode: i32,
    bit_depth: u32,
) {
    debug_assert!(matches!(mode, INTRA_PLANAR | INTRA_DC | INTRA_HORZ | INTRA_VERT));
    let scale = (log2_floor(w as u32) as i32 + log2_floor(h as u32) as i32 - 2) >> 2;
    let weight = |d: i32| 32 >> ((d << 1) >> scale).min(31);
    for y in 0..h as i32 {
        for x in 0..w as i32 {
            let idx = y as usize * stride + x as usize;
            let val = i32::from(dst[idx]);
            let (l, t, wl, wt) = if mode == INTRA_PLANAR || mode == INTRA_DC {
                (left.at(y), top.at(x), weight(x), weight(y))
            } else {
                let l = left.at(y) - left.at(-1) + val;
                let t = top.at(x) - top.at(-1) + val;
                let wl = if mode == INTRA_VERT { weight(x) } else { 0 };
                let wt = if mode == INTRA_HORZ { weight(y) } else { 0 };
                (l, t, wl, wt)
            };
            let pred = val + ((wl * (l - val) + wt * (t - val) + 32) >> 6);
            dst[idx] = clip_pixel(pred, bit_depth);
        }
    }
}

/// 角度预测参数
#[derive(Debug, Clone, Copy)]
pub(crate) struct AngularParams {
    pub is_luma: bool,
    pub mode: i32,
    pub ref_idx: u8,
    pub filter_flag: bool,
    pub need_pdpc: bool,
    pub bit_depth: u32,
}

#[inline]
fn luma_filter(p: RefLine, f: &[i8; 4], bit_depth: u32) -> u16 {
    let sum: i32 = (0..4).map(|i| p.at(i) * i32::from(f[i as usize])).sum();
    clip_pixel((sum + 32) >> 6, bit_depth)
}

#[inline]
fn chroma_filter(p: RefLine, fact: i32) -> u16 {
    (((32 - fact) * p.at(1) + fact * p.at(2) + 16) >> 5) as u16
}

/// 垂直方向角度模式 (模式号 >= 34), 逐行投影到上方参考
pub(crate) fn pred_angular_v(
    dst: &mut [u16],
    stride: usize,
    top: RefLine,
    left: RefLine,
    w: usize,
    h: usize,
    p: &AngularParams,
) {
    let ref_idx = i32::from(p.ref_idx);
    let top = top.shifted(-(1 + ref_idx));
    let angle = intra_pred_angle(p.mode);
    let (inv, scale) = if p.need_pdpc {
        (inv_angle(angle), nscale(w as u32, h as u32, p.mode))
    } else {
        (0, 0)
    };
    let filter = &INTRA_LUMA_FILTER[usize::from(p.filter_flag)];

    let mut pos = (1 + ref_idx) * angle;
    for y in 0..h {
        let idx = (pos >> 5) + ref_idx;
        let fact = pos & 31;
        let row = &mut dst[y * stride..y * stride + w];
        if fact == 0 && (!p.is_luma || !p.filter_flag) {
            for (x, s) in row.iter_mut().enumerate() {
                *s = top.at(x as i32 + idx + 1) as u16;
            }
        } else if p.is_luma {
            let f = &filter[fact as usize];
            for (x, s) in row.iter_mut().enumerate() {
                *s = luma_filter(top.shifted(x as i32 + idx), f, p.bit_depth);
            }
        } else {
            for (x, s) in row.iter_mut().enumerate() {
                *s = chroma_filter(top.shifted(x as i32 + idx), fact);
            }
        }
        if p.need_pdpc {
            let mut inv_sum = 256 + inv;
            for (x, s) in row.iter_mut().enumerate().take(w.min(3usize << scale)) {
                let l = left.at(y as i32 + (inv_sum >> 9));
                let val = i32::from(*s);
                let wl = 32 >> (((x as i32) << 1) >> scale);
                *s = clip_pixel(val + (((l - val) * wl + 32) >> 6), p.bit_depth);
                inv_sum += inv;
            }
        }
        pos += angle;
    }
}

/// 水平方向角度模式 (模式号 < 34), 逐列投影到左侧参考
pub(crate) fn pred_angular_h(
    dst: &mut [u16],
    stride: usize,
    top: RefLine,
    left: RefLine,
    w: usize,
    h: usize,
    p: &AngularParams,
) {
    let ref_idx = i32::from(p.ref_idx);
    let left = left.shifted(-(1 + ref_idx));
    let angle = intra_pred_angle(p.mode);
    let (inv, scale) = if p.need_pdpc {
        (inv_angle(angle), nscale(w as u32, h as u32, p.mode))
    } else {
        (0, 0)
    };
    let filter = &INTRA_LUMA_FILTER[usize::from(p.filter_flag)];

    let mut inv_sum = 256 + inv;
    for y in 0..h {
        let mut pos = (1 + ref_idx) * angle;
        let wt = 32 >> ((y as i32 * 2) >> scale).min(31);
        let row = &mut dst[y * stride..y * stride + w];
        for (x, s) in row.iter_mut().enumerate() {
            let idx = (pos >> 5) + ref_idx;
            let fact = pos & 31;
            let src = left.shifted(y as i32 + idx);
            let mut pred = if fact == 0 && (!p.is_luma || !p.filter_flag) {
                src.at(1)
            } else if p.is_luma {
                i32::from(luma_filter(src, &filter[fact as usize], p.bit_depth))
            } else {
                i32::from(chroma_filter(src, fact))
            };
            if p.need_pdpc && (y as i32) < (3 << scale) {
                let t = top.at(x as i32 + (inv_sum >> 9));
                pred = i32::from(clip_pixel(pred + (((t - pred) * wt + 32) >> 6), p.bit_depth));
            }
            *s = pred as u16;
            pos += angle;
        }
        if p.need_pdpc {
            inv_sum += inv;
        }
    }
}
