//! 参考样本构建.
//!
//! 为一个变换块生成上方与左侧参考样本数组, 数组允许负下标 (左上角与角度投影扩展):
//! 1. 按模式决定所需长度, 查询可用样本数并拷贝
//! 2. 左上角按可用性回退, 不可用部分以最近的有效样本常数外推
//! 3. 满足条件时做 `[1, 2, 1]` 平滑
//! 4. 负角度模式用反向角度把另一侧参考投影到负下标区间

use vvc_core::math::log2_floor;

use super::tables::HOR_VER_DIST_THRES;
use super::utils::{intra_pred_angle, inv_angle, ref_filter_flag};
use super::{
    CodingUnit, INTRA_DC, INTRA_DIAG, INTRA_HORZ, INTRA_PLANAR, INTRA_VERT, IspSplit, LocalContext,
};

/// 数组中下标 0 的位置
const EDGE_ORIGIN: usize = 128;
const EDGE_LEN: usize = 512;

/// 带原点偏移的只读参考样本行
#[derive(Debug, Clone, Copy)]
pub struct RefLine<'a> {
    buf: &'a [u16],
    origin: isize,
}

impl<'a> RefLine<'a> {
    pub fn new(buf: &'a [u16], origin: usize) -> Self {
        Self {
            buf,
            origin: origin as isize,
        }
    }

    /// 下标 `i` 处的样本, `i` 可为负
    #[inline]
    pub fn at(&self, i: i32) -> i32 {
        i32::from(self.buf[(self.origin + i as isize) as usize])
    }

    /// 原点平移 `d` 后的视图
    #[inline]
    pub fn shifted(self, d: i32) -> Self {
        Self {
            buf: self.buf,
            origin: self.origin + d as isize,
        }
    }
}

type EdgeArray = [u16; EDGE_LEN];

#[inline]
fn set(arr: &mut EdgeArray, i: i32, v: u16) {
    arr[(EDGE_ORIGIN as i32 + i) as usize] = v;
}

#[inline]
fn get(arr: &EdgeArray, i: i32) -> u16 {
    arr[(EDGE_ORIGIN as i32 + i) as usize]
}

/// 单个块的参考样本
#[derive(Debug, Clone)]
pub struct IntraEdgeParams {
    left_array: EdgeArray,
    top_array: EdgeArray,
    filtered_left_array: EdgeArray,
    filtered_top_array: EdgeArray,
    /// 预测读取的是否为平滑后的数组
    pub filtered: bool,
    /// 角度插值为真时使用 fG, 否则使用 fC
    pub filter_flag: bool,
}

impl Default for IntraEdgeParams {
    fn default() -> Self {
        Self {
            left_array: [0; EDGE_LEN],
            top_array: [0; EDGE_LEN],
            filtered_left_array: [0; EDGE_LEN],
            filtered_top_array: [0; EDGE_LEN],
            filtered: false,
            filter_flag: false,
        }
    }
}

impl IntraEdgeParams {
    pub fn left(&self) -> RefLine<'_> {
        let arr = if self.filtered {
            &self.filtered_left_array
        } else {
            &self.left_array
        };
        RefLine::new(arr, EDGE_ORIGIN)
    }

    pub fn top(&self) -> RefLine<'_> {
        let arr = if self.filtered {
            &self.filtered_top_array
        } else {
            &self.top_array
        };
        RefLine::new(arr, EDGE_ORIGIN)
    }

    fn selected_mut(&mut self) -> (&mut EdgeArray, &mut EdgeArray) {
        if self.filtered {
            (&mut self.filtered_left_array, &mut self.filtered_top_array)
        } else {
            (&mut self.left_array, &mut self.top_array)
        }
    }
}

/// 构建参考样本所需的块描述, 坐标与尺寸均为所在平面的样本
#[derive(Debug, Clone, Copy)]
pub(crate) struct EdgeRequest {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub c_idx: usize,
    pub is_mip: bool,
    pub mode: i32,
    pub ref_idx: u8,
    pub need_pdpc: bool,
}

/// `[1, 2, 1]` 参考平滑, `unfilter_last_one` 时末样本保持原值
fn ref_filter(
    left: &EdgeArray,
    top: &EdgeArray,
    filtered_left: &mut EdgeArray,
    filtered_top: &mut EdgeArray,
    left_size: i32,
    top_size: i32,
    unfilter_last_one: bool,
) {
    let corner = (u32::from(get(left, 0)) + 2 * u32::from(get(left, -1)) + u32::from(get(top, 0)) + 2) >> 2;
    set(filtered_left, -1, corner as u16);
    set(filtered_top, -1, corner as u16);
    let last = i32::from(unfilter_last_one);
    let smooth = |a: &EdgeArray, i: i32| {
        ((u32::from(get(a, i - 1)) + 2 * u32::from(get(a, i)) + u32::from(get(a, i + 1)) + 2) >> 2) as u16
    };
    for i in 0..left_size - last {
        set(filtered_left, i, smooth(left, i));
    }
    for i in 0..top_size - last {
        set(filtered_top, i, smooth(top, i));
    }
    if unfilter_last_one {
        set(filtered_top, top_size - 1, get(top, top_size - 1));
        set(filtered_left, left_size - 1, get(left, left_size - 1));
    }
}

/// 为 `req` 描述的块构建参考样本, `plane` 为该分量整幅平面
pub(crate) fn prepare_intra_edge_params(
    lc: &LocalContext,
    cu: &CodingUnit,
    plane: &[u16],
    stride: usize,
    bit_depth: u32,
    req: &EdgeRequest,
) -> IntraEdgeParams {
    let EdgeRequest {
        x,
        y,
        w,
        h,
        c_idx,
        is_mip,
        mode,
        ref_idx,
        need_pdpc,
    } = *req;
    let no_isp = cu.isp_split == IspSplit::None;
    let rff = !is_mip && ref_filter_flag(mode);
    let smoothing = ref_idx == 0 && w * h > 32 && c_idx == 0 && no_isp && rff;
    let ref_line: i32 = if ref_idx == 3 { -4 } else { -1 - i32::from(ref_idx) };
    let (w_i, h_i) = (w as i32, h as i32);

    let mut refw = 0;
    let mut refh = 0;
    let mut angle = 0;
    let mut inv = 0;
    let (left_size, unfilter_left_size, unfilter_top_size) =
        if is_mip || mode == INTRA_PLANAR {
            let extra = i32::from(smoothing);
            (h_i + 1, h_i + 1 + extra, w_i + 1 + extra)
        } else if mode == INTRA_DC {
            (h_i, h_i, w_i)
        } else if mode == INTRA_VERT {
            // 左上角修正可能需要一个左侧样本
            let l = if need_pdpc { h_i } else { 1 };
            (l, l, w_i)
        } else if mode == INTRA_HORZ {
            let t = if need_pdpc { w_i } else { 1 };
            (h_i, h_i, t)
        } else {
            if no_isp || c_idx != 0 {
                refw = w_i * 2;
                refh = h_i * 2;
            } else {
                refw = cu.cb_width as i32 + w_i;
                refh = cu.cb_height as i32 + h_i;
            }
            angle = intra_pred_angle(mode);
            inv = inv_angle(angle);
            (refh, refh, refw)
        };

    let pos = |dx: i32, dy: i32| -> u16 {
        let px = x as i64 + i64::from(dx);
        let py = y as i64 + i64::from(dy);
        debug_assert!(px >= 0 && py >= 0, "参考样本越过平面左上角");
        plane[py as usize * stride + px as usize]
    };

    let mut edge = IntraEdgeParams::default();
    {
        let left = &mut edge.left_array;
        let top = &mut edge.top_array;

        let left_available = lc.left_available(x, y, unfilter_left_size as u32, c_idx) as i32;
        for i in 0..left_available {
            set(left, i, pos(ref_line, i));
        }
        let top_available = lc.top_available(x, y, unfilter_top_size as u32, c_idx) as i32;
        for i in 0..top_available {
            set(top, i, pos(i, ref_line));
        }

        let cand_up_left = lc.neighbour_available().cand_up_left;
        for i in (ref_line..=-1).rev() {
            if cand_up_left {
                set(left, i, pos(ref_line, i));
                set(top, i, pos(i, ref_line));
            } else {
                let v = if left_available > 0 {
                    get(left, 0)
                } else if top_available > 0 {
                    get(top, 0)
                } else {
                    1 << (bit_depth - 1)
                };
                set(left, i, v);
                set(top, i, v);
            }
        }

        let last_top = get(top, top_available - 1);
        for i in top_available..unfilter_top_size {
            set(top, i, last_top);
        }
        let last_left = get(left, left_available - 1);
        for i in left_available..unfilter_left_size {
            set(left, i, last_left);
        }
    }

    if smoothing {
        ref_filter(
            &edge.left_array,
            &edge.top_array,
            &mut edge.filtered_left_array,
            &mut edge.filtered_top_array,
            unfilter_left_size,
            unfilter_top_size,
            left_size == unfilter_left_size,
        );
        edge.filtered = true;
    }

    if !is_mip && mode != INTRA_PLANAR && mode != INTRA_DC {
        edge.filter_flag = if rff || ref_idx != 0 || !no_isp {
            false
        } else {
            let min_dist_ver_hor = (mode - INTRA_VERT).abs().min((mode - INTRA_HORZ).abs());
            let ntbs = ((log2_floor(w) + log2_floor(h)) >> 1) as usize;
            min_dist_ver_hor > HOR_VER_DIST_THRES[ntbs - 2]
        };

        if mode != INTRA_VERT && mode != INTRA_HORZ {
            let r = i32::from(ref_idx);
            let (left, top) = edge.selected_mut();
            if mode >= INTRA_DIAG {
                if angle < 0 {
                    for xi in -h_i..0 {
                        let idx = -1 - r + ((xi * inv + 256) >> 9).min(h_i);
                        set(top, xi - (r + 1), get(left, idx));
                    }
                } else {
                    let fill = get(top, refw - 1);
                    for i in refw..=refw + (w_i / h_i).max(1) * r + 1 {
                        set(top, i, fill);
                    }
                }
            } else if angle < 0 {
                for xi in -w_i..0 {
                    let idx = -1 - r + ((xi * inv + 256) >> 9).min(w_i);
                    set(left, xi - (r + 1), get(top, idx));
                }
            } else {
                let fill = get(left, refh - 1);
                for i in refh..=refh + (h_i / w_i).max(1) * r + 1 {
                    set(left, i, fill);
                }
            }
        }
    }
    edge
}
