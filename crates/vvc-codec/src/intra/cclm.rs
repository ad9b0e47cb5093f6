//! 跨分量线性模型预测 (CCLM).
//!
//! 从相邻的最多 4 个位置取 (亮度, 色度) 对, 按亮度分为两组求均值, 推导
//! `chroma = ((luma * a) >> k) + b`, 再作用于下采样后的同位亮度块.
//! 两个色度分量共用采样位置, 一次调用同时写出 Cb 与 Cr.

use vvc_core::math::{clip_pixel, log2_floor};

use super::tables::CCLM_DIV_SIG;
use super::{CclmMode, LocalContext};
use crate::frame::VideoFrame;

const MAX_PICK_POS: usize = 4;
const TOP: usize = 0;
const LEFT: usize = 1;
const LUMA: usize = 0;

/// 每个色度分量的线性模型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CclmParams {
    pub a: i32,
    pub b: i32,
    pub k: i32,
}

/// 一次 CCLM 预测用到的几何与格式信息
struct CclmBlock {
    /// 亮度坐标
    x0: i64,
    y0: i64,
    /// 色度坐标与尺寸
    x: u32,
    y: u32,
    w: usize,
    h: usize,
    hs: u32,
    vs: u32,
    collocated: bool,
    ctb_log2: u32,
    bit_depth: u32,
    avail_t: bool,
    avail_l: bool,
}

struct LumaPlane<'a> {
    data: &'a [u16],
    stride: usize,
}

impl LumaPlane<'_> {
    #[inline]
    fn at(&self, x: i64, y: i64) -> i32 {
        debug_assert!(x >= 0 && y >= 0, "亮度样本越过平面左上角");
        i32::from(self.data[y as usize * self.stride + x as usize])
    }
}

/// 按色度子采样对亮度重建块做下采样, 输出 `w x h`
fn luma_rec_pixels(luma: &LumaPlane, blk: &CclmBlock) -> Vec<u16> {
    let (w, h) = (blk.w, blk.h);
    let mut dsy = vec![0u16; w * h];
    let (x0, y0) = (blk.x0, blk.y0);
    if blk.hs == 0 && blk.vs == 0 {
        for i in 0..h {
            for j in 0..w {
                dsy[i * w + j] = luma.at(x0 + j as i64, y0 + i as i64) as u16;
            }
        }
        return dsy;
    }

    let avail_l = i64::from(blk.avail_l);
    let avail_t = i64::from(blk.avail_t);
    for i in 0..h {
        let sy = y0 + ((i as i64) << blk.vs);
        // 块首行的上方样本只有在上方可用时才越过块边界
        let ty = if i == 0 { sy - avail_t } else { sy - 1 };
        for j in 0..w {
            let sx = x0 + 2 * j as i64;
            let lx = if j == 0 { x0 - avail_l } else { sx - 1 };
            let pred = if blk.vs == 0 {
                (luma.at(lx, sy) + 2 * luma.at(sx, sy) + luma.at(sx + 1, sy) + 2) >> 2
            } else if blk.collocated {
                (luma.at(lx, sy)
                    + luma.at(sx, ty)
                    + 4 * luma.at(sx, sy)
                    + luma.at(sx + 1, sy)
                    + luma.at(sx, sy + 1)
                    + 4)
                    >> 3
            } else {
                (luma.at(lx, sy)
                    + luma.at(lx, sy + 1)
                    + 2 * luma.at(sx, sy)
                    + 2 * luma.at(sx, sy + 1)
                    + luma.at(sx + 1, sy)
                    + luma.at(sx + 1, sy + 1)
                    + 4)
                    >> 3
            };
            dsy[i * w + j] = pred as u16;
        }
    }
    dsy
}

/// 选取的采样位置, 返回 `None` 表示两侧都没有样本
fn select_pos(
    lc: &LocalContext,
    mode: CclmMode,
    blk: &CclmBlock,
) -> Option<([usize; 2], [[usize; MAX_PICK_POS]; 2])> {
    let (w, h) = (blk.w as u32, blk.h as u32);
    let num_is4 = !blk.avail_t || !blk.avail_l || mode != CclmMode::Lt;
    let num_samp = match mode {
        CclmMode::Lt => [
            if blk.avail_t { w } else { 0 },
            if blk.avail_l { h } else { 0 },
        ],
        CclmMode::T => [
            if blk.avail_t {
                lc.top_available(blk.x, blk.y, w + w.min(h), 1)
            } else {
                0
            },
            0,
        ],
        CclmMode::L => [
            0,
            if blk.avail_l {
                lc.left_available(blk.x, blk.y, h + w.min(h), 1)
            } else {
                0
            },
        ],
    };
    if num_samp[TOP] == 0 && num_samp[LEFT] == 0 {
        return None;
    }

    let is4 = u32::from(num_is4);
    let mut cnt = [0usize; 2];
    let mut pos = [[0usize; MAX_PICK_POS]; 2];
    for side in [TOP, LEFT] {
        let n = num_samp[side];
        let start = n >> (2 + is4);
        let step = (n >> (1 + is4)).max(1);
        cnt[side] = n.min((1 + is4) << 1) as usize;
        for c in 0..cnt[side] {
            pos[side][c] = (start + c as u32 * step) as usize;
        }
    }
    Some((cnt, pos))
}

/// 取选中位置的下采样亮度值
fn select_luma(
    luma: &LumaPlane,
    blk: &CclmBlock,
    cnt: &[usize; 2],
    pos: &[[usize; MAX_PICK_POS]; 2],
    sel: &mut [i32; MAX_PICK_POS * 2],
) {
    let (x0, y0) = (blk.x0, blk.y0);
    let avail_l = i64::from(blk.avail_l);
    let avail_t = i64::from(blk.avail_t);
    let (hs, vs) = (blk.hs, blk.vs);

    if hs == 0 && vs == 0 {
        for i in 0..cnt[TOP] {
            sel[i] = luma.at(x0 + pos[TOP][i] as i64, y0 - avail_t);
        }
        for i in 0..cnt[LEFT] {
            sel[cnt[TOP] + i] = luma.at(x0 - avail_l, y0 + pos[LEFT][i] as i64);
        }
        return;
    }

    let ctu_boundary = y0 & ((1 << blk.ctb_log2) - 1) == 0;
    if vs != 0 && !ctu_boundary {
        let ry = y0 - 2;
        for i in 0..cnt[TOP] {
            let dx = (pos[TOP][i] as i64) << hs;
            let sx = x0 + dx;
            let has_left = dx != 0 || blk.avail_l;
            let l = if has_left { luma.at(sx - 1, ry) } else { luma.at(sx, ry) };
            sel[i] = if blk.collocated {
                (luma.at(sx, ry - 1) + l + 4 * luma.at(sx, ry) + luma.at(sx + 1, ry) + luma.at(sx, ry + 1) + 4)
                    >> 3
            } else {
                let l1 = if has_left {
                    luma.at(sx - 1, ry + 1)
                } else {
                    luma.at(sx, ry + 1)
                };
                (l + l1
                    + 2 * (luma.at(sx, ry) + luma.at(sx, ry + 1))
                    + luma.at(sx + 1, ry)
                    + luma.at(sx + 1, ry + 1)
                    + 4)
                    >> 3
            };
        }
    } else {
        // 位于 CTU 上边界时只用一行亮度
        let ry = y0 - 1;
        for i in 0..cnt[TOP] {
            let dx = (pos[TOP][i] as i64) << hs;
            let sx = x0 + dx;
            let has_left = dx != 0 || blk.avail_l;
            let l = if has_left { luma.at(sx - 1, ry) } else { luma.at(sx, ry) };
            sel[i] = (l + 2 * luma.at(sx, ry) + luma.at(sx + 1, ry) + 2) >> 2;
        }
    }

    let sx = x0 - (1 + i64::from(hs)) * avail_l;
    let lx = sx - avail_l;
    for i in 0..cnt[LEFT] {
        let dy = (pos[LEFT][i] as i64) << vs;
        let sy = y0 + dy;
        let pred = if vs == 0 {
            (luma.at(lx, sy) + 2 * luma.at(sx, sy) + luma.at(sx + 1, sy) + 2) >> 2
        } else if blk.collocated {
            let has_top = dy != 0 || blk.avail_t;
            let t = if has_top { luma.at(sx, sy - 1) } else { luma.at(sx, sy) };
            (luma.at(lx, sy) + t + 4 * luma.at(sx, sy) + luma.at(sx + 1, sy) + luma.at(sx, sy + 1) + 4) >> 3
        } else {
            (luma.at(lx, sy)
                + luma.at(lx, sy + 1)
                + 2 * luma.at(sx, sy)
                + 2 * luma.at(sx, sy + 1)
                + luma.at(sx + 1, sy)
                + luma.at(sx + 1, sy + 1)
                + 4)
                >> 3
        };
        sel[cnt[TOP] + i] = pred;
    }
}

/// 按亮度把 4 个样本分成较小与较大两组, 返回各分量的 (min, max) 组均值
fn min_max(sel: &[[i32; MAX_PICK_POS * 2]; 3]) -> ([i32; 3], [i32; 3]) {
    let luma = &sel[LUMA];
    let mut min_grp = [0usize, 2];
    let mut max_grp = [1usize, 3];
    if luma[min_grp[0]] > luma[min_grp[1]] {
        min_grp.swap(0, 1);
    }
    if luma[max_grp[0]] > luma[max_grp[1]] {
        max_grp.swap(0, 1);
    }
    if luma[min_grp[0]] > luma[max_grp[1]] {
        std::mem::swap(&mut min_grp, &mut max_grp);
    }
    if luma[min_grp[1]] > luma[max_grp[0]] {
        std::mem::swap(&mut min_grp[1], &mut max_grp[0]);
    }
    let mut min = [0i32; 3];
    let mut max = [0i32; 3];
    for c in 0..3 {
        max[c] = (sel[c][max_grp[0]] + sel[c][max_grp[1]] + 1) >> 1;
        min[c] = (sel[c][min_grp[0]] + sel[c][min_grp[1]] + 1) >> 1;
    }
    (min, max)
}

/// 由两组均值推导 Cb / Cr 的线性模型
pub(crate) fn derive_params(min: &[i32; 3], max: &[i32; 3]) -> [CclmParams; 2] {
    let diff = max[LUMA] - min[LUMA];
    let mut params = [CclmParams::default(); 2];
    if diff == 0 {
        for (i, p) in params.iter_mut().enumerate() {
            p.b = min[i + 1];
        }
        return params;
    }
    for (i, p) in params.iter_mut().enumerate() {
        let diffc = max[i + 1] - min[i + 1];
        let mut x = log2_floor(diff as u32) as i32;
        let norm_diff = ((diff << 4) >> x) & 15;
        x += i32::from(norm_diff != 0);
        let y = if diffc != 0 {
            log2_floor(diffc.unsigned_abs()) as i32 + 1
        } else {
            0
        };
        let v = CCLM_DIV_SIG[norm_diff as usize] | 8;
        let add = (1 << y) >> 1;
        let mut a = (diffc * v + add) >> y;
        let k = (3 + x - y).max(1);
        if 3 + x - y < 1 {
            a = a.signum() * 15;
        }
        *p = CclmParams {
            a,
            b: min[i + 1] - ((a * min[LUMA]) >> k),
            k,
        };
    }
    params
}

/// CCLM 预测, `(x0, y0)` 与 `width x height` 为亮度坐标与尺寸
pub(crate) fn intra_cclm_pred(
    lc: &LocalContext,
    mode: CclmMode,
    frame: &mut VideoFrame,
    x0: u32,
    y0: u32,
    width: u32,
    height: u32,
) {
    let sps = &lc.pps().sps;
    let hs = sps.format.hshift[1];
    let vs = sps.format.vshift[1];
    let blk = CclmBlock {
        x0: i64::from(x0),
        y0: i64::from(y0),
        x: x0 >> hs,
        y: y0 >> vs,
        w: (width >> hs) as usize,
        h: (height >> vs) as usize,
        hs,
        vs,
        collocated: sps.raw.chroma_vertical_collocated,
        ctb_log2: sps.ctb_log2_size_y(),
        bit_depth: sps.bit_depth(),
        avail_t: lc.top_available(x0, y0, 1, 0) > 0,
        avail_l: lc.left_available(x0, y0, 1, 0) > 0,
    };
    let (x, y, w, h) = (blk.x as usize, blk.y as usize, blk.w, blk.h);

    if !blk.avail_t && !blk.avail_l {
        let mid = 1u16 << (blk.bit_depth - 1);
        for c_idx in 1..3 {
            let stride = frame.linesize[c_idx];
            for row in 0..h {
                let off = (y + row) * stride + x;
                frame.data[c_idx][off..off + w].fill(mid);
            }
        }
        return;
    }

    let luma = LumaPlane {
        data: &frame.data[0],
        stride: frame.linesize[0],
    };
    let dsy = luma_rec_pixels(&luma, &blk);
    let params = match select_pos(lc, mode, &blk) {
        Some((cnt, pos)) => {
            let mut sel = [[0i32; MAX_PICK_POS * 2]; 3];
            select_luma(&luma, &blk, &cnt, &pos, &mut sel[LUMA]);
            for c_idx in 1..3 {
                let plane = &frame.data[c_idx];
                let stride = frame.linesize[c_idx];
                for i in 0..cnt[TOP] {
                    sel[c_idx][i] = i32::from(plane[(y - 1) * stride + x + pos[TOP][i]]);
                }
                for i in 0..cnt[LEFT] {
                    sel[c_idx][cnt[TOP] + i] = i32::from(plane[(y + pos[LEFT][i]) * stride + x - 1]);
                }
            }
            if cnt[TOP] + cnt[LEFT] == 2 {
                for s in &mut sel {
                    *s = [s[1], s[0], s[1], s[0], 0, 0, 0, 0];
                }
            }
            let (min, max) = min_max(&sel);
            derive_params(&min, &max)
        }
        None => [CclmParams {
            a: 0,
            b: 1 << (blk.bit_depth - 1),
            k: 0,
        }; 2],
    };

    for (i, p) in params.iter().enumerate() {
        let c_idx = i + 1;
        let stride = frame.linesize[c_idx];
        let plane = &mut frame.data[c_idx];
        for row in 0..h {
            let off = (y + row) * stride + x;
            for (col, s) in plane[off..off + w].iter_mut().enumerate() {
                let dsy = i32::from(dsy[row * w + col]);
                *s = clip_pixel(((dsy * p.a) >> p.k) + p.b, blk.bit_depth);
            }
        }
    }
}
