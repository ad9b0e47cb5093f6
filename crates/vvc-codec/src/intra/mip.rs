//! 矩阵加权帧内预测 (MIP).
//!
//! 流程: 边界下采样 -> 减去 DC 项 -> 与系数矩阵相乘 -> 缩减预测 -> 逐轴线性上采样.
//! 系数矩阵由调用方以 [`MipMatrices`] 提供, 构造时校验长度.

use vvc_core::math::{clip_pixel, log2_floor};
use vvc_core::{VvcError, VvcResult};

use super::edge::RefLine;
use super::tables::{MIP_BOUNDARY_SIZES, MIP_NUM_MODES, MIP_PRED_SIZES};

/// 尺寸类 `size_id` 下每个模式的矩阵元素个数
fn matrix_len(size_id: usize) -> usize {
    let pred = MIP_PRED_SIZES[size_id];
    pred * pred * in_size(size_id)
}

fn in_size(size_id: usize) -> usize {
    2 * MIP_BOUNDARY_SIZES[size_id] - usize::from(size_id == 2)
}

/// 三个尺寸类的 MIP 系数矩阵
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipMatrices {
    sets: [Vec<u8>; 3],
}

impl MipMatrices {
    /// 由按 `[模式][输出样本][输入样本]` 排列的系数构造
    ///
    /// 各尺寸类的长度必须分别为 16x16x4, 8x16x8, 6x64x7.
    pub fn from_raw(size0: Vec<u8>, size1: Vec<u8>, size2: Vec<u8>) -> VvcResult<Self> {
        let sets = [size0, size1, size2];
        for (size_id, set) in sets.iter().enumerate() {
            let expected = MIP_NUM_MODES[size_id] * matrix_len(size_id);
            if set.len() != expected {
                return Err(VvcError::InvalidArgument(format!(
                    "VVC: MIP 矩阵长度不符, size_id={}, len={}, expected={}",
                    size_id,
                    set.len(),
                    expected
                )));
            }
        }
        Ok(Self { sets })
    }

    /// 尺寸类下的模式数
    pub fn num_modes(size_id: usize) -> usize {
        MIP_NUM_MODES[size_id]
    }

    /// 某尺寸类某模式的系数矩阵
    pub fn matrix(&self, size_id: usize, mode_id: usize) -> &[u8] {
        let len = matrix_len(size_id);
        &self.sets[size_id][mode_id * len..(mode_id + 1) * len]
    }
}

/// 把 `n` 个参考样本平均下采样到 `boundary_size` 个
fn downsample(reduced: &mut [i32], boundary_size: usize, r: RefLine, n: usize) {
    if boundary_size == n {
        for (i, v) in reduced.iter_mut().take(n).enumerate() {
            *v = r.at(i as i32);
        }
        return;
    }
    let b_dwn = n / boundary_size;
    let log2 = log2_floor(b_dwn as u32);
    for (i, v) in reduced.iter_mut().take(boundary_size).enumerate() {
        let start = (i * b_dwn) as i32;
        let sum: i32 = (start..start + b_dwn as i32).map(|j| r.at(j)).sum();
        *v = (sum + (1 << (log2 - 1))) >> log2;
    }
}

/// 一维线性上采样
///
/// 从 `base` 起共 `height` 条线, 每条线相距 `line_stride`, 线内样本步长 `step`.
/// 每条线上已有 `pred_size` 个锚点 (每 `factor` 个样本的最后一个), 线首的前一锚点取自 `boundary`.
#[allow(clippy::too_many_arguments)]
fn upsample_1d(
    dst: &mut [u16],
    base: usize,
    step: usize,
    line_stride: usize,
    height: usize,
    factor: usize,
    boundary: RefLine,
    boundary_step: usize,
    pred_size: usize,
) {
    let f = factor as i32;
    for i in 0..height {
        let start = base + i * line_stride;
        let mut before = boundary.at((i * boundary_step) as i32);
        for j in 0..pred_size {
            let anchor = start + ((j + 1) * factor - 1) * step;
            let after = i32::from(dst[anchor]);
            for k in 1..factor {
                let ki = k as i32;
                let mid = (f - ki) * before + ki * after;
                dst[start + (j * factor + k - 1) * step] = ((mid + f / 2) / f) as u16;
            }
            before = after;
        }
    }
}

/// 矩阵加权预测, `dst` 以块左上角为起点
#[allow(clippy::too_many_arguments)]
pub(crate) fn pred_mip(
    dst: &mut [u16],
    stride: usize,
    top: RefLine,
    left: RefLine,
    w: usize,
    h: usize,
    matrix: &[u8],
    size_id: usize,
    transposed: bool,
    bit_depth: u32,
) {
    let boundary_size = MIP_BOUNDARY_SIZES[size_id];
    let pred_size = MIP_PRED_SIZES[size_id];
    let in_size = in_size(size_id);
    let up_hor = w / pred_size;
    let up_ver = h / pred_size;

    let mut reduced = [0i32; 16];
    {
        let (first, second) = reduced.split_at_mut(boundary_size);
        let (red_t, red_l) = if transposed {
            (second, first)
        } else {
            (first, second)
        };
        downsample(red_t, boundary_size, top, w);
        downsample(red_l, boundary_size, left, h);
    }

    let temp0 = reduced[0];
    let (off, mut ow) = if size_id != 2 {
        (0, (1 << (bit_depth - 1)) - temp0)
    } else {
        (1, reduced[1] - temp0)
    };
    reduced[0] = ow;
    for i in 1..in_size {
        reduced[i] = reduced[i + off] - temp0;
        ow += reduced[i];
    }
    let ow = 32 - 32 * ow;

    // 缩减预测写在每个上采样组的最后一个位置
    let origin = (up_ver - 1) * stride + (up_hor - 1);
    for (n, coeffs) in matrix.chunks(in_size).take(pred_size * pred_size).enumerate() {
        let (y, x) = (n / pred_size, n % pred_size);
        let sum: i32 = coeffs
            .iter()
            .zip(&reduced[..in_size])
            .map(|(&m, &r)| i32::from(m) * r)
            .sum();
        let pred = clip_pixel(((sum + ow) >> 6) + temp0, bit_depth);
        let idx = if transposed {
            origin + x * up_ver * stride + y * up_hor
        } else {
            origin + y * up_ver * stride + x * up_hor
        };
        dst[idx] = pred;
    }

    if up_hor > 1 {
        upsample_1d(
            dst,
            (up_ver - 1) * stride,
            1,
            up_ver * stride,
            pred_size,
            up_hor,
            left.shifted(up_ver as i32 - 1),
            up_ver,
            pred_size,
        );
    }
    if up_ver > 1 {
        upsample_1d(dst, 0, stride, 1, w, up_ver, top, 1, pred_size);
    }
}
