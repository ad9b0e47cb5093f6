//! 亮度相关的色度残差缩放 (LMCS 色度部分).
//!
//! 缩放系数按 VPDU (不超过 64x64 且不超过 CTU 的区域) 计算一次,
//! 缓存在 slice 局部上下文中.

use vvc_core::math::{clip_intp2, log2_floor};

use super::LocalContext;
use crate::frame::VideoFrame;
use crate::ps::LmcsTables;

/// 最近一次计算的 VPDU 位置与缩放系数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct LmcsCache {
    vpdu: Option<(u32, u32)>,
    chroma_scale: u16,
}

/// 从 `start` 起按 `step` 取 `min(avail, target)` 个样本求和, 不足部分以最后一个样本补齐
fn sum_samples(plane: &[u16], start: usize, step: usize, avail: u32, target: u32) -> i32 {
    let size = avail.min(target) as usize;
    let mut sum = 0i32;
    let mut last = 0i32;
    for i in 0..size {
        last = i32::from(plane[start + i * step]);
        sum += last;
    }
    sum + last * (target as usize - size) as i32
}

impl LocalContext {
    /// 亮度坐标 `(x0, y0)` 所在 VPDU 的色度缩放系数
    pub fn lmcs_chroma_scale(&mut self, lmcs: &LmcsTables, frame: &VideoFrame, x0: u32, y0: u32) -> u16 {
        let size = &self.pps().size;
        let (pic_w, pic_h) = (size.width, size.height);
        let size_y = self.pps().sps.partition.ctb_size_y.min(64);
        let x = x0 & !(size_y - 1);
        let y = y0 & !(size_y - 1);
        if self.lmcs.vpdu == Some((x, y)) {
            return self.lmcs.chroma_scale;
        }

        let plane = &frame.data[0];
        let stride = frame.linesize[0];
        let origin = y as usize * stride + x as usize;
        let avail_t = self.top_available(x, y, 1, 0) > 0;
        let avail_l = self.left_available(x, y, 1, 0) > 0;

        let mut cnt = 0u32;
        let mut luma = 0i32;
        if avail_l {
            luma += sum_samples(plane, origin - 1, stride, pic_h - y, size_y);
            cnt = size_y;
        }
        if avail_t {
            luma += sum_samples(plane, origin - stride, 1, pic_w - x, size_y);
            cnt += size_y;
        }
        let luma = if cnt > 0 {
            (luma + (cnt >> 1) as i32) >> log2_floor(cnt)
        } else {
            1 << (lmcs.bit_depth - 1)
        };

        let scale = lmcs.chroma_scale_for_luma(luma);
        self.lmcs = LmcsCache {
            vpdu: Some((x, y)),
            chroma_scale: scale,
        };
        scale
    }

    /// 对色度残差系数就地做 LMCS 缩放, `(x0_cu, y0_cu)` 为编码单元的亮度坐标
    #[allow(clippy::too_many_arguments)]
    pub fn lmcs_scale_chroma(
        &mut self,
        lmcs: &LmcsTables,
        frame: &VideoFrame,
        coeff: &mut [i32],
        width: usize,
        height: usize,
        x0_cu: u32,
        y0_cu: u32,
    ) {
        let bit_depth = lmcs.bit_depth;
        let scale = i32::from(self.lmcs_chroma_scale(lmcs, frame, x0_cu, y0_cu));
        for c in coeff.iter_mut().take(width * height) {
            let v = clip_intp2(*c, bit_depth);
            *c = if v > 0 {
                (v * scale + (1 << 10)) >> 11
            } else {
                -((-v * scale + (1 << 10)) >> 11)
            };
        }
    }
}
