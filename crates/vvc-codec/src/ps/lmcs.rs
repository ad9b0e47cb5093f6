//! LMCS 分段线性映射表.
//!
//! 由 LMCS APS 与 SPS 位深构建前向/反向样本映射表与各分段的色度缩放系数.

use vvc_core::math::log2_floor;
use vvc_core::{VvcError, VvcResult};

use super::raw::{LMCS_MAX_BIN_SIZE, RawLmcsData};

/// LMCS 支持的最大位深
pub const LMCS_MAX_BIT_DEPTH: u32 = 12;

/// 推导后的 LMCS 表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LmcsTables {
    pub bit_depth: u32,
    pub min_bin_idx: usize,
    pub max_bin_idx: usize,
    /// 映射域的分段起点, 严格非降
    pub pivot: [u16; LMCS_MAX_BIN_SIZE + 1],
    pub chroma_scale_coeff: [u16; LMCS_MAX_BIN_SIZE],
    pub fwd_lut: Vec<u16>,
    pub inv_lut: Vec<u16>,
}

#[inline]
fn lut_sample(sample: i32, pivot1: i32, pivot2: i32, scale: i32, max: i32) -> u16 {
    let v = pivot1 + ((scale * (sample - pivot2) + (1 << 10)) >> 11);
    v.clamp(0, max - 1) as u16
}

impl LmcsTables {
    pub fn derive(raw: &RawLmcsData, bit_depth: u32) -> VvcResult<Self> {
        if bit_depth > LMCS_MAX_BIT_DEPTH {
            return Err(VvcError::NotImplemented(format!(
                "VVC: LMCS 不支持该位深, bit_depth={}",
                bit_depth
            )));
        }
        let min_bin_idx = usize::from(raw.min_bin_idx);
        let delta_max = usize::from(raw.delta_max_bin_idx);
        if min_bin_idx + delta_max > LMCS_MAX_BIN_SIZE - 1 {
            return Err(VvcError::InvalidData(format!(
                "VVC: LMCS 分段范围非法, min_bin_idx={}, delta_max_bin_idx={}",
                min_bin_idx, delta_max
            )));
        }
        let max_bin_idx = LMCS_MAX_BIN_SIZE - 1 - delta_max;

        let max = 1i32 << bit_depth;
        let org_cw = max / LMCS_MAX_BIN_SIZE as i32;
        let shift = log2_floor(org_cw as u32);
        let off = 1 << (shift - 1);

        let mut cw = [0i32; LMCS_MAX_BIN_SIZE];
        for (i, c) in cw.iter_mut().enumerate().take(max_bin_idx + 1).skip(min_bin_idx) {
            let sign = if raw.delta_sign_cw[i] { -1 } else { 1 };
            *c = org_cw + sign * i32::from(raw.delta_abs_cw[i]);
            if *c < (org_cw >> 3) || *c > (org_cw << 3) - 1 {
                return Err(VvcError::InvalidData(format!(
                    "VVC: LMCS 码字超出范围, bin={}, cw={}",
                    i, *c
                )));
            }
        }
        let total: i32 = cw.iter().sum();
        if total > max - 1 {
            return Err(VvcError::InvalidData(format!(
                "VVC: LMCS 码字总和超出范围, sum={}, max={}",
                total,
                max - 1
            )));
        }
        let delta_crs = if raw.delta_sign_crs {
            -i32::from(raw.delta_abs_crs)
        } else {
            i32::from(raw.delta_abs_crs)
        };

        let mut pivot = [0u16; LMCS_MAX_BIN_SIZE + 1];
        let mut input_pivot = [0i32; LMCS_MAX_BIN_SIZE];
        let mut scale_coeff = [0i32; LMCS_MAX_BIN_SIZE];
        let mut inv_scale_coeff = [0i32; LMCS_MAX_BIN_SIZE];
        let mut chroma_scale_coeff = [0u16; LMCS_MAX_BIN_SIZE];
        for i in 0..LMCS_MAX_BIN_SIZE {
            input_pivot[i] = i as i32 * org_cw;
            pivot[i + 1] = (i32::from(pivot[i]) + cw[i]) as u16;
            scale_coeff[i] = (cw[i] * (1 << 11) + off) >> shift;
            if cw[i] == 0 {
                chroma_scale_coeff[i] = 1 << 11;
            } else {
                let crs = cw[i] + delta_crs;
                if crs <= 0 || crs < (org_cw >> 3) || crs > (org_cw << 3) - 1 {
                    return Err(VvcError::InvalidData(format!(
                        "VVC: LMCS 色度残差码字超出范围, bin={}, cw={}, delta_crs={}",
                        i, cw[i], delta_crs
                    )));
                }
                inv_scale_coeff[i] = org_cw * (1 << 11) / cw[i];
                chroma_scale_coeff[i] = (org_cw * (1 << 11) / crs) as u16;
            }
        }

        let fwd_lut = (0..max)
            .map(|s| {
                let idx = (s / org_cw) as usize;
                lut_sample(s, i32::from(pivot[idx]), input_pivot[idx], scale_coeff[idx], max)
            })
            .collect();

        let mut inv_lut = Vec::with_capacity(max as usize);
        let mut i = min_bin_idx;
        for s in 0..max {
            while i <= max_bin_idx && s >= i32::from(pivot[i + 1]) {
                i += 1;
            }
            let idx = i.min(LMCS_MAX_BIN_SIZE - 1);
            inv_lut.push(lut_sample(
                s,
                input_pivot[idx],
                i32::from(pivot[idx]),
                inv_scale_coeff[idx],
                max,
            ));
        }

        Ok(Self {
            bit_depth,
            min_bin_idx,
            max_bin_idx,
            pivot,
            chroma_scale_coeff,
            fwd_lut,
            inv_lut,
        })
    }

    /// 映射域亮度均值所在分段的色度缩放系数
    pub fn chroma_scale_for_luma(&self, luma: i32) -> u16 {
        let mut i = self.min_bin_idx;
        while i <= self.max_bin_idx {
            if luma < i32::from(self.pivot[i + 1]) {
                break;
            }
            i += 1;
        }
        self.chroma_scale_coeff[i.min(LMCS_MAX_BIN_SIZE - 1)]
    }

    /// 对矩形区域应用前向映射
    pub fn apply_forward(&self, plane: &mut [u16], stride: usize, width: usize, height: usize) {
        apply_lut(&self.fwd_lut, plane, stride, width, height);
    }

    /// 对矩形区域应用反向映射
    pub fn apply_inverse(&self, plane: &mut [u16], stride: usize, width: usize, height: usize) {
        apply_lut(&self.inv_lut, plane, stride, width, height);
    }
}

fn apply_lut(lut: &[u16], plane: &mut [u16], stride: usize, width: usize, height: usize) {
    for row in plane.chunks_mut(stride).take(height) {
        for s in &mut row[..width] {
            *s = lut[usize::from(*s)];
        }
    }
}
