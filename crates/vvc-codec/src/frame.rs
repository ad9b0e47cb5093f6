//! 重建样本帧 (VideoFrame).
//!
//! 每个平面以 `u16` 存储样本, 位深只决定取值范围. 行跨度以样本为单位.

use vvc_core::{PixelFormat, VvcError, VvcResult};

/// 视频帧
///
/// 包含重建样本, 支持多平面存储.
/// 例如 YUV420P 格式有 3 个平面: Y, U, V.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// 各平面的样本数据
    pub data: Vec<Vec<u16>>,
    /// 各平面每行的样本数 (stride)
    pub linesize: Vec<usize>,
    /// 宽度 (亮度样本)
    pub width: u32,
    /// 高度 (亮度样本)
    pub height: u32,
    /// 像素格式
    pub pixel_format: PixelFormat,
}

impl VideoFrame {
    /// 创建空的视频帧, 平面未分配
    pub fn new(width: u32, height: u32, pixel_format: PixelFormat) -> Self {
        let plane_count = pixel_format.plane_count() as usize;
        Self {
            data: vec![Vec::new(); plane_count],
            linesize: vec![0; plane_count],
            width,
            height,
            pixel_format,
        }
    }

    /// 创建并分配所有平面, 样本初始化为 `fill`
    pub fn alloc(width: u32, height: u32, pixel_format: PixelFormat, fill: u16) -> VvcResult<Self> {
        let mut frame = Self::new(width, height, pixel_format);
        for plane in 0..frame.data.len() {
            let (w, h) = frame.plane_size(plane);
            let len = w * h;
            let mut buf = Vec::new();
            buf.try_reserve_exact(len).map_err(|_| {
                VvcError::OutOfMemory(format!("VVC: 帧平面分配失败, plane={}, len={}", plane, len))
            })?;
            buf.resize(len, fill);
            frame.data[plane] = buf;
            frame.linesize[plane] = w;
        }
        Ok(frame)
    }

    /// 指定平面的 (宽, 高)
    pub fn plane_size(&self, plane: usize) -> (usize, usize) {
        (
            self.pixel_format.plane_width(plane, self.width).unwrap_or(0),
            self.pixel_format.plane_height(plane, self.height).unwrap_or(0),
        )
    }

    /// 读取一个样本
    #[inline]
    pub fn sample(&self, plane: usize, x: usize, y: usize) -> u16 {
        self.data[plane][y * self.linesize[plane] + x]
    }

    /// 把一个 `w x h` 块写入平面 `(x, y)` 处
    pub fn write_block(&mut self, plane: usize, x: usize, y: usize, w: usize, h: usize, src: &[u16]) {
        let stride = self.linesize[plane];
        for (j, row) in src.chunks(w).take(h).enumerate() {
            let off = (y + j) * stride + x;
            self.data[plane][off..off + w].copy_from_slice(row);
        }
    }
}
