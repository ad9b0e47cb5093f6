//! 集成测试共用的参数集与帧构造工具.

#![allow(dead_code)]

use std::sync::Arc;

use vvc_intra::codec::intra::{IntraPredictor, MipMatrices};
use vvc_intra::codec::ps::raw::{
    RawPictureHeader, RawPps, RawQpTable, RawSliceHeader, RawSps,
};
use vvc_intra::codec::ps::{FrameParamSets, ParamSets, SliceHeader};
use vvc_intra::codec::VideoFrame;

pub const CTU_SIZE: u32 = 32;

/// CTU 32x32, POC LSB 8 位
pub fn build_test_raw_sps(chroma_format_idc: u8, width: u16, height: u16) -> RawSps {
    RawSps {
        sps_id: 0,
        chroma_format_idc,
        log2_ctu_size_minus5: 0,
        pic_width_max_in_luma_samples: width,
        pic_height_max_in_luma_samples: height,
        log2_max_pic_order_cnt_lsb_minus4: 4,
        same_qp_table_for_chroma: true,
        qp_tables: vec![RawQpTable {
            qp_table_start_minus26: 0,
            delta_qp_in_val_minus1: vec![0],
            delta_qp_diff_val: vec![0],
        }],
        ..Default::default()
    }
}

/// 整幅图像单 tile、单 slice
pub fn build_test_raw_pps(width: u16, height: u16) -> RawPps {
    RawPps {
        pps_id: 0,
        sps_id: 0,
        pic_width_in_luma_samples: width,
        pic_height_in_luma_samples: height,
        no_pic_partition: true,
        rect_slice: true,
        single_slice_per_subpic: true,
        ..Default::default()
    }
}

/// 128x128 图像, 2x2 个 tile, 每个 tile 一个矩形 slice
pub fn build_test_tiled_pps() -> RawPps {
    RawPps {
        no_pic_partition: false,
        tile_column_width_minus1: vec![1],
        tile_row_height_minus1: vec![1],
        rect_slice: true,
        single_slice_per_subpic: false,
        num_slices_in_pic_minus1: 3,
        rect_slices: vec![Default::default(); 4],
        ..build_test_raw_pps(128, 128)
    }
}

pub fn build_test_frame_ps(raw_sps: &RawSps, raw_pps: &RawPps) -> FrameParamSets {
    let mut ps = ParamSets::new();
    ps.decode_ps(raw_sps, raw_pps, true).expect("参数集推导失败");
    ps.decode_frame_ps(&RawPictureHeader::default(), 0, true)
        .expect("帧参数集绑定失败")
}

pub fn build_test_slice(fps: &FrameParamSets, slice_address: u16) -> SliceHeader {
    fps.decode_slice_header(&RawSliceHeader {
        slice_address,
        ..Default::default()
    })
    .expect("slice 头推导失败")
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

pub fn build_test_predictor() -> IntraPredictor {
    let mip = MipMatrices::from_raw(vec![0; 16 * 16 * 4], vec![0; 8 * 16 * 8], vec![0; 6 * 64 * 7])
        .expect("MIP 矩阵构造失败");
    IntraPredictor::new(Arc::new(mip))
}

/// 填充亮度矩形及其对应的色度区域, 坐标为亮度样本
pub fn fill_luma_rect(frame: &mut VideoFrame, fps: &FrameParamSets, x: u32, y: u32, w: u32, h: u32, v: u16) {
    let format = &fps.sps.format;
    for plane in 0..frame.data.len() {
        let (hs, vs) = (format.hshift[plane], format.vshift[plane]);
        let stride = frame.linesize[plane];
        let (px, pw) = ((x >> hs) as usize, (w >> hs) as usize);
        for row in (y >> vs) as usize..((y + h) >> vs) as usize {
            frame.data[plane][row * stride + px..row * stride + px + pw].fill(v);
        }
    }
}

/// 平面上矩形内的全部样本
pub fn plane_rect(frame: &VideoFrame, plane: usize, x: usize, y: usize, w: usize, h: usize) -> Vec<u16> {
    (y..y + h)
        .flat_map(|row| (x..x + w).map(move |col| frame.sample(plane, col, row)))
        .collect()
}
