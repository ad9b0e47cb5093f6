//! 自适应参数集 (APS) 推导: ALF 滤波器与缩放矩阵.

use vvc_core::{VvcError, VvcResult};

use super::raw::{
    ALF_NUM_COEFF_CC, ALF_NUM_COEFF_CHROMA, ALF_NUM_COEFF_LUMA, ALF_NUM_FILTERS_CC,
    ALF_NUM_FILTERS_CHROMA, ALF_NUM_FILTERS_LUMA, RawAlfData, RawScalingListData, SL_MAX_ID,
    SL_START_16X16,
};

/// APS 载荷类型 (aps_params_type)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApsParamsType {
    Alf,
    Lmcs,
    ScalingList,
}

// ============================================================
// ALF
// ============================================================

/// 推导后的 ALF 滤波器组
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alf {
    pub luma_coeff: [[i16; ALF_NUM_COEFF_LUMA]; ALF_NUM_FILTERS_LUMA],
    pub luma_clip_idx: [[u8; ALF_NUM_COEFF_LUMA]; ALF_NUM_FILTERS_LUMA],
    pub num_chroma_filters: usize,
    pub chroma_coeff: [[i16; ALF_NUM_COEFF_CHROMA]; ALF_NUM_FILTERS_CHROMA],
    pub chroma_clip_idx: [[u8; ALF_NUM_COEFF_CHROMA]; ALF_NUM_FILTERS_CHROMA],
    /// CC-ALF 滤波器个数 (Cb, Cr)
    pub num_cc_filters: [usize; 2],
    pub cc_coeff: [[[i16; ALF_NUM_COEFF_CC]; ALF_NUM_FILTERS_CC]; 2],
}

fn alf_coeff<const N: usize>(abs: &[u8; N], sign: &[u8; N]) -> [i16; N] {
    let mut out = [0i16; N];
    for i in 0..N {
        out[i] = (1 - 2 * i16::from(sign[i] & 1)) * i16::from(abs[i]);
    }
    out
}

fn alf_coeff_cc(mapped_abs: &[u8; ALF_NUM_COEFF_CC], sign: &[u8; ALF_NUM_COEFF_CC]) -> [i16; ALF_NUM_COEFF_CC] {
    let mut out = [0i16; ALF_NUM_COEFF_CC];
    for i in 0..ALF_NUM_COEFF_CC {
        let c = i16::from(mapped_abs[i]);
        if c != 0 {
            out[i] = (1 - 2 * i16::from(sign[i] & 1)) * (1 << (c - 1));
        }
    }
    out
}

impl Alf {
    pub fn derive(raw: &RawAlfData) -> VvcResult<Self> {
        let mut alf = Self {
            luma_coeff: [[0; ALF_NUM_COEFF_LUMA]; ALF_NUM_FILTERS_LUMA],
            luma_clip_idx: [[0; ALF_NUM_COEFF_LUMA]; ALF_NUM_FILTERS_LUMA],
            num_chroma_filters: 0,
            chroma_coeff: [[0; ALF_NUM_COEFF_CHROMA]; ALF_NUM_FILTERS_CHROMA],
            chroma_clip_idx: [[0; ALF_NUM_COEFF_CHROMA]; ALF_NUM_FILTERS_CHROMA],
            num_cc_filters: [0; 2],
            cc_coeff: [[[0; ALF_NUM_COEFF_CC]; ALF_NUM_FILTERS_CC]; 2],
        };

        if raw.luma_filter_signal {
            let signalled = raw.luma_coeff_abs.len();
            if raw.luma_coeff_sign.len() != signalled || raw.luma_clip_idx.len() != signalled {
                return Err(VvcError::InvalidData(
                    "VVC: ALF 亮度系数数组长度不一致".into(),
                ));
            }
            for i in 0..ALF_NUM_FILTERS_LUMA {
                let r = usize::from(raw.luma_coeff_delta_idx[i]);
                if r >= signalled {
                    return Err(VvcError::InvalidData(format!(
                        "VVC: alf_luma_coeff_delta_idx 超出范围, filter={}, idx={}",
                        i, r
                    )));
                }
                alf.luma_coeff[i] = alf_coeff(&raw.luma_coeff_abs[r], &raw.luma_coeff_sign[r]);
                alf.luma_clip_idx[i] = raw.luma_clip_idx[r];
            }
        }

        if raw.chroma_filter_signal {
            let n = raw.chroma_coeff_abs.len();
            if n == 0
                || n > ALF_NUM_FILTERS_CHROMA
                || raw.chroma_coeff_sign.len() != n
                || raw.chroma_clip_idx.len() != n
            {
                return Err(VvcError::InvalidData(format!(
                    "VVC: ALF 色度滤波器个数非法, num={}",
                    n
                )));
            }
            alf.num_chroma_filters = n;
            for i in 0..n {
                alf.chroma_coeff[i] = alf_coeff(&raw.chroma_coeff_abs[i], &raw.chroma_coeff_sign[i]);
                alf.chroma_clip_idx[i] = raw.chroma_clip_idx[i];
            }
        }

        let cc = [
            (raw.cc_cb_filter_signal, &raw.cc_cb_mapped_coeff_abs, &raw.cc_cb_coeff_sign),
            (raw.cc_cr_filter_signal, &raw.cc_cr_mapped_coeff_abs, &raw.cc_cr_coeff_sign),
        ];
        for (idx, (signalled, abs, sign)) in cc.into_iter().enumerate() {
            if !signalled {
                continue;
            }
            let n = abs.len();
            if n == 0 || n > ALF_NUM_FILTERS_CC || sign.len() != n {
                return Err(VvcError::InvalidData(format!(
                    "VVC: CC-ALF 滤波器个数非法, comp={}, num={}",
                    idx, n
                )));
            }
            alf.num_cc_filters[idx] = n;
            for i in 0..n {
                alf.cc_coeff[idx][i] = alf_coeff_cc(&abs[i], &sign[i]);
            }
        }
        Ok(alf)
    }
}

// ============================================================
// 缩放矩阵
// ============================================================

/// 缩放矩阵最大边长
pub const SL_MAX_MATRIX_SIZE: usize = 8;
/// 4x4 列表起始编号
pub const SL_START_4X4: usize = 2;
/// 8x8 列表起始编号
pub const SL_START_8X8: usize = 8;
/// 64x64 列表起始编号
pub const SL_START_64X64: usize = 26;

/// 生成 `w x h` 块的右上对角扫描顺序 (x, y)
pub fn diag_scan(w: usize, h: usize) -> Vec<(usize, usize)> {
    let mut out = Vec::with_capacity(w * h);
    let (mut x, mut y) = (0isize, 0isize);
    while out.len() < w * h {
        while y >= 0 {
            if (x as usize) < w && (y as usize) < h {
                out.push((x as usize, y as usize));
            }
            y -= 1;
            x += 1;
        }
        y = x;
        x = 0;
    }
    out
}

fn is_luma_list(id: usize) -> bool {
    id % 3 == SL_START_4X4 || id == SL_START_64X64 + 1
}

fn matrix_size(id: usize) -> usize {
    if id < SL_START_4X4 {
        2
    } else if id < SL_START_8X8 {
        4
    } else {
        8
    }
}

/// 推导后的缩放矩阵
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalingList {
    /// 按光栅顺序存放的矩阵, 仅前 `size * size` 项有效
    pub matrix_rec: [[u8; SL_MAX_MATRIX_SIZE * SL_MAX_MATRIX_SIZE]; SL_MAX_ID],
    /// 16x16 及以上列表的 DC 值
    pub matrix_dc_rec: [u8; SL_MAX_ID - SL_START_16X16],
}

impl ScalingList {
    pub fn derive(raw: &RawScalingListData) -> VvcResult<Self> {
        let mut sl = Self {
            matrix_rec: [[0; SL_MAX_MATRIX_SIZE * SL_MAX_MATRIX_SIZE]; SL_MAX_ID],
            matrix_dc_rec: [0; SL_MAX_ID - SL_START_16X16],
        };
        let scan8 = diag_scan(8, 8);

        for id in 0..SL_MAX_ID {
            let size = matrix_size(id);
            let list_size = size * size;
            let coded = raw.chroma_present || is_luma_list(id);
            let copy_mode = raw.copy_mode[id] || !coded;
            let pred_id_delta = if coded { usize::from(raw.pred_id_delta[id]) } else { 0 };

            let mut coeff = [0i32; SL_MAX_MATRIX_SIZE * SL_MAX_MATRIX_SIZE];
            let mut dc_coef = 0i32;
            if !copy_mode {
                let mut next_coef = 0i32;
                if id >= SL_START_16X16 {
                    dc_coef = i32::from(raw.dc_coef[id - SL_START_16X16]);
                    next_coef = dc_coef;
                }
                for (i, &(x, y)) in scan8.iter().take(list_size).enumerate() {
                    if !(id >= SL_START_64X64 && x >= 4 && y >= 4) {
                        next_coef += i32::from(raw.delta_coef[id][i]);
                    }
                    coeff[i] = next_coef;
                }
            }

            let ref_id = if pred_id_delta > 0 {
                if pred_id_delta > id || matrix_size(id - pred_id_delta) != size {
                    return Err(VvcError::InvalidData(format!(
                        "VVC: scaling_list_pred_id_delta 非法, id={}, delta={}",
                        id, pred_id_delta
                    )));
                }
                Some(id - pred_id_delta)
            } else {
                None
            };
            let explicit = !copy_mode && !raw.pred_mode[id];

            if id >= SL_START_16X16 {
                let pred_dc = if explicit {
                    8
                } else if let Some(r) = ref_id {
                    if r >= SL_START_16X16 {
                        i32::from(sl.matrix_dc_rec[r - SL_START_16X16])
                    } else {
                        i32::from(sl.matrix_rec[r][0])
                    }
                } else {
                    16
                };
                sl.matrix_dc_rec[id - SL_START_16X16] = ((pred_dc + dc_coef) & 255) as u8;
            }

            let pred = |off: usize| -> i32 {
                if explicit {
                    8
                } else if let Some(r) = ref_id {
                    i32::from(sl.matrix_rec[r][off])
                } else {
                    16
                }
            };

            let mut rec = [0u8; SL_MAX_MATRIX_SIZE * SL_MAX_MATRIX_SIZE];
            for (i, (x, y)) in diag_scan(size, size).into_iter().enumerate() {
                let off = y * size + x;
                let list = if copy_mode { 0 } else { coeff[i] };
                rec[off] = ((pred(off) + list) & 255) as u8;
            }
            sl.matrix_rec[id] = rec;
        }
        Ok(sl)
    }

    /// 指定列表的矩阵 (光栅顺序)
    pub fn matrix(&self, id: usize) -> &[u8] {
        let size = matrix_size(id);
        &self.matrix_rec[id][..size * size]
    }
}
