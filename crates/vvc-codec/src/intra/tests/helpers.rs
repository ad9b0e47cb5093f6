use std::sync::Arc;

use crate::frame::VideoFrame;
use crate::intra::{IntraPredictor, LocalContext, MipMatrices};
use crate::ps::FrameParamSets;
use crate::ps::tests::helpers::{build_test_raw_pps, build_test_raw_sps, build_test_slice_with};

/// 单 slice 图像的局部上下文, 已进入第一个 CTU
pub fn build_test_context(chroma_format_idc: u8, width: u16, height: u16) -> (FrameParamSets, LocalContext) {
    let (fps, sh) = build_test_slice_with(
        &build_test_raw_sps(chroma_format_idc, width, height),
        &build_test_raw_pps(width, height),
    );
    let mut lc = LocalContext::new(Arc::clone(&fps.pps), &sh).expect("局部上下文创建失败");
    lc.begin_ctu(0);
    (fps, lc)
}

pub fn build_test_frame(fps: &FrameParamSets, fill: u16) -> VideoFrame {
    VideoFrame::alloc(
        fps.pps.size.width,
        fps.pps.size.height,
        fps.sps.format.pixel_format,
        fill,
    )
    .expect("帧分配失败")
}

pub fn build_zero_mip() -> Arc<MipMatrices> {
    Arc::new(
        MipMatrices::from_raw(vec![0; 16 * 16 * 4], vec![0; 8 * 16 * 8], vec![0; 6 * 64 * 7])
            .expect("MIP 矩阵构造失败"),
    )
}

pub fn build_test_predictor() -> IntraPredictor {
    IntraPredictor::new(build_zero_mip())
}

/// 把 `(x, y)` 处宽 `w` 的亮度块上方与左侧 (到第一个 CTU 边界) 登记为已重建
pub fn mark_neighbours(lc: &mut LocalContext, x: u32, y: u32, w: u32) {
    for ch_type in 0..2 {
        lc.add_reconstructed_area(ch_type, 0, 0, 32, y);
        lc.add_reconstructed_area(ch_type, 0, y, x, 32 - y);
    }
    lc.set_neighbour_available(x, y, w);
}

/// 填充平面上的矩形
pub fn fill_rect(frame: &mut VideoFrame, plane: usize, x: usize, y: usize, w: usize, h: usize, v: u16) {
    let stride = frame.linesize[plane];
    for row in y..y + h {
        frame.data[plane][row * stride + x..row * stride + x + w].fill(v);
    }
}

pub fn block(frame: &VideoFrame, plane: usize, x: usize, y: usize, w: usize, h: usize) -> Vec<u16> {
    (y..y + h)
        .flat_map(|row| (x..x + w).map(move |col| (col, row)))
        .map(|(col, row)| frame.sample(plane, col, row))
        .collect()
}
