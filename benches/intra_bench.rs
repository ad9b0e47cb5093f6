//! 参数集推导与帧内预测的性能基准.

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use vvc_intra::codec::intra::{
    CodingUnit, INTRA_LT_CCLM, INTRA_PLANAR, IntraPredictor, LocalContext, MipInfo, MipMatrices,
};
use vvc_intra::codec::ps::raw::{RawPictureHeader, RawPps, RawQpTable, RawSliceHeader, RawSps};
use vvc_intra::codec::ps::{FrameParamSets, ParamSets};
use vvc_intra::codec::VideoFrame;

const WIDTH: u16 = 256;
const HEIGHT: u16 = 128;

fn make_raw_sps() -> RawSps {
    RawSps {
        chroma_format_idc: 1,
        log2_ctu_size_minus5: 2,
        pic_width_max_in_luma_samples: WIDTH,
        pic_height_max_in_luma_samples: HEIGHT,
        log2_max_pic_order_cnt_lsb_minus4: 4,
        bitdepth_minus8: 2,
        same_qp_table_for_chroma: true,
        qp_tables: vec![RawQpTable {
            qp_table_start_minus26: 0,
            delta_qp_in_val_minus1: vec![0],
            delta_qp_diff_val: vec![0],
        }],
        ..Default::default()
    }
}

fn make_raw_pps() -> RawPps {
    RawPps {
        pic_width_in_luma_samples: WIDTH,
        pic_height_in_luma_samples: HEIGHT,
        no_pic_partition: true,
        rect_slice: true,
        single_slice_per_subpic: true,
        ..Default::default()
    }
}

fn make_frame_ps() -> FrameParamSets {
    let mut ps = ParamSets::new();
    ps.decode_ps(&make_raw_sps(), &make_raw_pps(), true).unwrap();
    ps.decode_frame_ps(&RawPictureHeader::default(), 0, true).unwrap()
}

/// 第一个 CTU 已重建, 当前位于第二个 CTU
fn make_context(fps: &FrameParamSets) -> (LocalContext, VideoFrame) {
    let sh = fps.decode_slice_header(&RawSliceHeader::default()).unwrap();
    let mut lc = LocalContext::new(Arc::clone(&fps.pps), &sh).unwrap();
    let mut frame = VideoFrame::alloc(
        fps.pps.size.width,
        fps.pps.size.height,
        fps.sps.format.pixel_format,
        0,
    )
    .unwrap();
    for plane in 0..3 {
        for (i, v) in frame.data[plane].iter_mut().enumerate() {
            *v = (i % 1021) as u16;
        }
    }
    lc.begin_ctu(0);
    lc.add_reconstructed_area(0, 0, 0, 128, 128);
    lc.add_reconstructed_area(1, 0, 0, 128, 128);
    lc.add_reconstructed_area(0, 128, 0, 128, 16);
    lc.add_reconstructed_area(1, 128, 0, 128, 16);
    lc.begin_ctu(1);
    (lc, frame)
}

fn make_predictor() -> IntraPredictor {
    let mip = MipMatrices::from_raw(
        (0..16 * 16 * 4).map(|i| (i % 64) as u8).collect(),
        (0..8 * 16 * 8).map(|i| (i % 64) as u8).collect(),
        (0..6 * 64 * 7).map(|i| (i % 64) as u8).collect(),
    )
    .unwrap();
    IntraPredictor::new(Arc::new(mip))
}

fn bench_decode_ps(c: &mut Criterion) {
    let raw_sps = make_raw_sps();
    let raw_pps = make_raw_pps();
    c.bench_function("decode_ps_256x128", |b| {
        b.iter(|| {
            let mut ps = ParamSets::new();
            ps.decode_ps(black_box(&raw_sps), black_box(&raw_pps), true).unwrap()
        });
    });
}

fn bench_luma_modes(c: &mut Criterion) {
    let fps = make_frame_ps();
    let (mut lc, mut frame) = make_context(&fps);
    let predictor = make_predictor();
    lc.set_neighbour_available(128, 16, 16);

    let mut group = c.benchmark_group("intra_luma_16x16");
    for mode in [INTRA_PLANAR, 2, 18, 34, 45, 66] {
        let mut cu = CodingUnit::new(128, 16, 16, 16);
        cu.intra_pred_mode_y = mode;
        group.bench_function(format!("mode_{}", mode), |b| {
            b.iter(|| {
                predictor.predict(&lc, black_box(&cu), &mut frame, 128, 16, 16, 16, 0)
            });
        });
    }
    let mut cu = CodingUnit::new(128, 16, 16, 16);
    cu.mip = Some(MipInfo {
        mode: 3,
        transposed: false,
    });
    group.bench_function("mip", |b| {
        b.iter(|| {
            predictor.predict(&lc, black_box(&cu), &mut frame, 128, 16, 16, 16, 0)
        });
    });
    group.finish();
}

fn bench_cclm(c: &mut Criterion) {
    let fps = make_frame_ps();
    let (mut lc, mut frame) = make_context(&fps);
    let predictor = make_predictor();
    lc.set_neighbour_available(128, 16, 16);
    let mut cu = CodingUnit::new(128, 16, 16, 16);
    cu.intra_pred_mode_c = INTRA_LT_CCLM;

    c.bench_function("cclm_420_8x8", |b| {
        b.iter(|| {
            predictor.predict(&lc, black_box(&cu), &mut frame, 128, 16, 16, 16, 1)
        });
    });
}

criterion_group!(benches, bench_decode_ps, bench_luma_modes, bench_cclm);
criterion_main!(benches);
