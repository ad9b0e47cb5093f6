use std::sync::Arc;

use crate::ps::raw::{RawPictureHeader, RawPps, RawQpTable, RawSliceHeader, RawSps};
use crate::ps::{FrameParamSets, ParamSets, Pps, SliceHeader};

/// CTU 32x32, 最小编码块 4x4, POC LSB 8 位, 单张色度 QP 表
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

/// 2x2 个 tile, 每个 tile 2x2 CTU (图像 128x128)
pub fn build_test_tiled_pps(rect_slice: bool) -> RawPps {
    RawPps {
        no_pic_partition: false,
        tile_column_width_minus1: vec![1],
        tile_row_height_minus1: vec![1],
        rect_slice,
        single_slice_per_subpic: false,
        num_slices_in_pic_minus1: if rect_slice { 3 } else { 0 },
        rect_slices: if rect_slice { vec![Default::default(); 4] } else { Vec::new() },
        ..build_test_raw_pps(128, 128)
    }
}

/// 测试中输出推导日志, 重复调用无副作用
pub fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn build_test_param_sets(raw_sps: &RawSps, raw_pps: &RawPps) -> (ParamSets, Arc<Pps>) {
    init_test_logger();
    let mut ps = ParamSets::new();
    let pps = ps.decode_ps(raw_sps, raw_pps, true).expect("参数集推导失败");
    (ps, pps)
}

pub fn build_test_frame_ps(ps: &ParamSets) -> FrameParamSets {
    ps.decode_frame_ps(&RawPictureHeader::default(), 0, true)
        .expect("帧参数集绑定失败")
}

/// 4:2:0 8 位单 slice 图像的帧参数集与 slice 头
pub fn build_test_slice(width: u16, height: u16) -> (FrameParamSets, SliceHeader) {
    build_test_slice_with(&build_test_raw_sps(1, width, height), &build_test_raw_pps(width, height))
}

pub fn build_test_slice_with(raw_sps: &RawSps, raw_pps: &RawPps) -> (FrameParamSets, SliceHeader) {
    let (ps, _) = build_test_param_sets(raw_sps, raw_pps);
    let fps = build_test_frame_ps(&ps);
    let sh = fps
        .decode_slice_header(&RawSliceHeader::default())
        .expect("slice 头推导失败");
    (fps, sh)
}
