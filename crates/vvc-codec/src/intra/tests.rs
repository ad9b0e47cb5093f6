mod helpers;

use std::sync::Arc;

use vvc_core::VvcError;

use super::cclm::derive_params;
use super::tables::CCLM_DIV_SIG;
use super::{
    CclmMode, CodingUnit, CtbBoundary, INTRA_DC, INTRA_HORZ, INTRA_LT_CCLM, INTRA_PLANAR,
    INTRA_T_CCLM, INTRA_VERT, IntraPredictor, IspSplit, LocalContext, MipInfo, MipMatrices, inv_angle,
    mip_size_id, need_pdpc, wide_angle_mode_mapping, wide_angle_mode_unmapping,
};
use crate::ps::LmcsTables;
use crate::ps::raw::{RawLmcsData, RawSliceHeader};
use crate::ps::tests::helpers::{
    build_test_frame_ps, build_test_param_sets, build_test_raw_sps, build_test_tiled_pps,
};

use helpers::*;

// ============================================================
// 模式推导
// ============================================================

#[test]
fn test_wide_angle_mapping_tall_block() {
    let cu = CodingUnit::new(0, 0, 8, 32);
    let mode = wide_angle_mode_mapping(&cu, 8, 32, 0, 60);
    assert_eq!(mode, -7, "8x32 块的模式 60 应映射为广角 -7");
    assert_eq!(wide_angle_mode_unmapping(mode), 60);
    assert_eq!(wide_angle_mode_mapping(&cu, 8, 32, 0, 56), 56, "阈值处不映射");
}

#[test]
fn test_wide_angle_mapping_wide_block() {
    let cu = CodingUnit::new(0, 0, 32, 8);
    let mode = wide_angle_mode_mapping(&cu, 32, 8, 0, 5);
    assert_eq!(mode, 70);
    assert_eq!(wide_angle_mode_unmapping(mode), 5);
    assert_eq!(wide_angle_mode_mapping(&cu, 32, 8, 0, INTRA_DC), INTRA_DC);
}

#[test]
fn test_wide_angle_mapping_isp_uses_coding_block() {
    let cu = CodingUnit {
        isp_split: IspSplit::Horizontal,
        ..CodingUnit::new(0, 0, 16, 16)
    };
    assert_eq!(
        wide_angle_mode_mapping(&cu, 16, 4, 0, 3),
        3,
        "亮度 ISP 子块按方形编码块判断, 不做广角映射"
    );
    assert_eq!(wide_angle_mode_mapping(&cu, 16, 4, 1, 3), 68);
}

#[test]
fn test_inv_angle_rounding() {
    assert_eq!(inv_angle(32), 512);
    assert_eq!(inv_angle(-32), -512);
    assert_eq!(inv_angle(3), 5461);
    assert_eq!(inv_angle(0), 0);
}

#[test]
fn test_need_pdpc_conditions() {
    assert!(need_pdpc(4, 4, false, INTRA_PLANAR, 0));
    assert!(!need_pdpc(2, 8, false, INTRA_PLANAR, 0), "宽度小于 4 不做 PDPC");
    assert!(!need_pdpc(8, 8, false, INTRA_DC, 1), "多参考行不做 PDPC");
    assert!(!need_pdpc(8, 8, true, INTRA_VERT, 0), "BDPCM 不做 PDPC");
    assert!(!need_pdpc(8, 8, false, 30, 0), "对角区间模式不做 PDPC");
    assert!(need_pdpc(4, 4, false, 66, 0));
}

#[test]
fn test_mip_size_id() {
    assert_eq!(mip_size_id(4, 4), 0);
    assert_eq!(mip_size_id(4, 16), 1);
    assert_eq!(mip_size_id(8, 8), 1);
    assert_eq!(mip_size_id(16, 8), 2);
}

#[test]
fn test_cclm_mode_from_chroma_mode() {
    assert_eq!(CclmMode::from_mode(INTRA_LT_CCLM), Some(CclmMode::Lt));
    assert_eq!(CclmMode::from_mode(INTRA_T_CCLM), Some(CclmMode::T));
    assert_eq!(CclmMode::from_mode(INTRA_VERT), None);
}

// ============================================================
// 可用性
// ============================================================

#[test]
fn test_availability_never_exceeds_request() {
    let (_, mut lc) = build_test_context(1, 64, 64);
    lc.add_reconstructed_area(0, 0, 0, 16, 16);

    assert_eq!(lc.top_available(0, 16, 32, 0), 16, "只登记了 16 列");
    assert_eq!(lc.top_available(0, 16, 8, 0), 8, "不超过请求数");
    assert_eq!(lc.left_available(16, 0, 32, 0), 16);
    assert_eq!(lc.top_available(20, 16, 8, 0), 0, "区域外返回 0");
    assert_eq!(lc.top_available(0, 0, 8, 0), 0, "图像首行上方不可用");
    assert_eq!(lc.left_available(0, 4, 8, 0), 0, "图像首列左侧不可用");
}

#[test]
fn test_availability_chroma_subsampled() {
    let (_, mut lc) = build_test_context(1, 64, 64);
    lc.add_reconstructed_area(1, 0, 0, 16, 16);
    assert_eq!(lc.areas(1)[0].w, 8);
    assert_eq!(lc.top_available(0, 8, 16, 1), 8);
    assert_eq!(lc.top_available(0, 8, 16, 0), 0, "色度登记不影响亮度");
}

#[test]
fn test_availability_joins_adjacent_areas() {
    let (_, mut lc) = build_test_context(1, 64, 64);
    lc.add_reconstructed_area(0, 0, 0, 8, 8);
    lc.add_reconstructed_area(0, 8, 0, 8, 8);
    lc.add_reconstructed_area(0, 16, 0, 16, 8);
    assert_eq!(lc.top_available(0, 8, 64, 0), 32);
}

#[test]
fn test_availability_clipped_to_picture_width() {
    let (_, mut lc) = build_test_context(1, 64, 64);
    lc.begin_ctu(1);
    lc.add_reconstructed_area(0, 32, 0, 32, 8);
    assert_eq!(lc.top_available(48, 8, 32, 0), 16, "不越过图像右边界");
}

#[test]
fn test_neighbour_available_at_ctu_corners() {
    let (_, mut lc) = build_test_context(1, 64, 64);
    lc.set_neighbour_available(0, 0, 8);
    let na = lc.neighbour_available();
    assert!(!na.cand_left && !na.cand_up && !na.cand_up_left);

    lc.begin_ctu(2);
    lc.set_neighbour_available(0, 32, 32);
    let na = lc.neighbour_available();
    assert!(na.cand_up);
    assert!(!na.cand_left, "图像左边界");
    assert!(na.cand_up_right, "右上 CTU 位于同一 slice 与 tile");

    lc.begin_ctu(3);
    lc.set_neighbour_available(32, 32, 32);
    let na = lc.neighbour_available();
    assert!(na.cand_left && na.cand_up && na.cand_up_left);
    assert!(!na.cand_up_right, "右上超出图像");
}

#[test]
fn test_ctu_boundaries_across_tiles_and_slices() {
    let (ps, pps) = build_test_param_sets(&build_test_raw_sps(1, 128, 128), &build_test_tiled_pps(false));
    let fps = build_test_frame_ps(&ps);
    let sh = fps
        .decode_slice_header(&RawSliceHeader {
            slice_address: 1,
            num_tiles_in_slice_minus1: 1,
            ..Default::default()
        })
        .expect("slice 头推导失败");
    let mut lc = LocalContext::new(pps, &sh).expect("局部上下文创建失败");

    lc.begin_ctu(2);
    let b = lc.boundary();
    assert!(b.contains(CtbBoundary::LEFT_TILE | CtbBoundary::LEFT_SLICE));
    assert!(b.contains(CtbBoundary::UPPER_SUBPIC), "首行 CTU 位于子图像上边界");
    lc.set_neighbour_available(64, 0, 32);
    assert!(!lc.neighbour_available().cand_left, "跨 tile 的左侧 CTU 不可用");

    lc.begin_ctu(8);
    let b = lc.boundary();
    assert!(b.contains(CtbBoundary::UPPER_TILE | CtbBoundary::UPPER_SLICE));
    assert!(b.contains(CtbBoundary::LEFT_SUBPIC));

    lc.add_reconstructed_area(0, 0, 32, 32, 32);
    lc.add_reconstructed_area(0, 0, 64, 32, 8);
    assert_eq!(lc.top_available(0, 64, 32, 0), 0, "上方 CTU 跨 tile 时即使已登记也不可用");
    assert_eq!(lc.top_available(0, 72, 8, 0), 8, "CTU 内部不受影响");
}

#[test]
fn test_top_reach_beyond_ctu_only_from_row_above() {
    // 128x64, 单 tile, CTU 32: 进入第二行第二个 CTU (x 32..64)
    let (_, mut lc) = build_test_context(1, 128, 64);
    lc.begin_ctu(5);
    lc.add_reconstructed_area(0, 0, 0, 128, 32);

    // CTU 顶行: 右上 CTU 已重建, 可越过当前 CTU 右边界
    assert_eq!(lc.top_available(48, 32, 32, 0), 32);

    // CTU 内部: 右侧 CTU 尚未重建, 扫描止于当前 CTU 右边界
    lc.add_reconstructed_area(0, 32, 32, 32, 16);
    assert_eq!(lc.top_available(32, 48, 64, 0), 32);
    assert_eq!(lc.top_available(48, 48, 64, 0), 16);
}

#[test]
fn test_top_reach_clipped_at_tile_end() {
    let (ps, pps) = build_test_param_sets(&build_test_raw_sps(1, 128, 128), &build_test_tiled_pps(false));
    let fps = build_test_frame_ps(&ps);
    let sh = fps
        .decode_slice_header(&RawSliceHeader {
            num_tiles_in_slice_minus1: 3,
            ..Default::default()
        })
        .expect("slice 头推导失败");
    let mut lc = LocalContext::new(pps, &sh).expect("局部上下文创建失败");

    // 第一个 tile 的右下 CTU, tile 右边界 x = 64
    lc.begin_ctu(5);
    lc.add_reconstructed_area(0, 0, 0, 128, 32);
    assert_eq!(lc.top_available(48, 32, 32, 0), 16, "登记表越过 tile 时仍裁剪到 tile 末端");
    assert_eq!(lc.top_available(32, 32, 32, 0), 32);
}

#[test]
fn test_begin_slice_rejects_bad_ctu_address() {
    let (fps, mut lc) = build_test_context(1, 64, 64);
    let mut sh = fps
        .decode_slice_header(&RawSliceHeader::default())
        .expect("slice 头推导失败");
    lc.add_reconstructed_area(0, 0, 0, 8, 8);
    sh.ctb_addr_in_curr_slice.push(99);
    let err = lc.begin_slice(&sh).expect_err("越界 CTU 地址应报错");
    assert!(matches!(err, VvcError::InvalidData(_)));

    sh.ctb_addr_in_curr_slice.pop();
    lc.begin_slice(&sh).expect("合法 slice 应成功");
    assert!(lc.areas(0).is_empty(), "新 slice 应清空登记表");
}

// ============================================================
// 常规预测
// ============================================================

#[test]
fn test_planar_constant_neighbours() {
    let (fps, mut lc) = build_test_context(1, 64, 64);
    let mut frame = build_test_frame(&fps, 100);
    fill_rect(&mut frame, 0, 8, 8, 8, 8, 0);
    mark_neighbours(&mut lc, 8, 8, 8);

    let cu = CodingUnit::new(8, 8, 8, 8);
    build_test_predictor().predict(&lc, &cu, &mut frame, 8, 8, 8, 8, 0);
    assert!(block(&frame, 0, 8, 8, 8, 8).iter().all(|&v| v == 100), "常数参考的平面预测应为常数");
}

#[test]
fn test_dc_constant_neighbours_chroma() {
    let (fps, mut lc) = build_test_context(1, 64, 64);
    let mut frame = build_test_frame(&fps, 100);
    fill_rect(&mut frame, 1, 4, 4, 4, 4, 0);
    mark_neighbours(&mut lc, 8, 8, 8);

    let cu = CodingUnit {
        intra_pred_mode_c: INTRA_DC,
        ..CodingUnit::new(8, 8, 8, 8)
    };
    build_test_predictor().predict(&lc, &cu, &mut frame, 8, 8, 8, 8, 1);
    assert!(block(&frame, 1, 4, 4, 4, 4).iter().all(|&v| v == 100));
}

#[test]
fn test_unavailable_neighbours_fall_back_to_mid_value() {
    let (fps, mut lc) = build_test_context(1, 64, 64);
    let mut frame = build_test_frame(&fps, 100);
    lc.set_neighbour_available(0, 0, 8);

    let cu = CodingUnit {
        intra_pred_mode_y: INTRA_DC,
        ..CodingUnit::new(0, 0, 8, 8)
    };
    build_test_predictor().predict(&lc, &cu, &mut frame, 0, 0, 8, 8, 0);
    assert!(block(&frame, 0, 0, 0, 8, 8).iter().all(|&v| v == 128), "无邻居时应取 1 << (bd - 1)");
}

#[test]
fn test_vertical_copies_top_row() {
    let (fps, mut lc) = build_test_context(1, 64, 64);
    let mut frame = build_test_frame(&fps, 100);
    let stride = frame.linesize[0];
    for i in 0..8 {
        frame.data[0][7 * stride + 8 + i] = 20 + 10 * i as u16;
    }
    mark_neighbours(&mut lc, 8, 8, 8);

    let cu = CodingUnit {
        intra_pred_mode_y: INTRA_VERT,
        ..CodingUnit::new(8, 8, 8, 8)
    };
    build_test_predictor().predict(&lc, &cu, &mut frame, 8, 8, 8, 8, 0);
    for y in 0..8 {
        for x in 0..8 {
            assert_eq!(
                frame.sample(0, 8 + x, 8 + y),
                20 + 10 * x as u16,
                "左侧与左上角相等时 PDPC 不改变垂直预测, x={}, y={}",
                x,
                y
            );
        }
    }
}

#[test]
fn test_horizontal_copies_left_column() {
    let (fps, mut lc) = build_test_context(1, 64, 64);
    let mut frame = build_test_frame(&fps, 100);
    let stride = frame.linesize[0];
    for j in 0..8 {
        frame.data[0][(8 + j) * stride + 7] = 30 + 5 * j as u16;
    }
    mark_neighbours(&mut lc, 8, 8, 8);

    let cu = CodingUnit {
        intra_pred_mode_y: INTRA_HORZ,
        ..CodingUnit::new(8, 8, 8, 8)
    };
    build_test_predictor().predict(&lc, &cu, &mut frame, 8, 8, 8, 8, 0);
    for y in 0..8 {
        let row = block(&frame, 0, 8, 8 + y, 8, 1);
        assert!(row.iter().all(|&v| v == 30 + 5 * y as u16), "第 {} 行应复制左侧样本", y);
    }
}

#[test]
fn test_angular_diagonal_with_pdpc() {
    let (fps, mut lc) = build_test_context(1, 64, 64);
    let mut frame = build_test_frame(&fps, 100);
    let stride = frame.linesize[0];
    for i in 0..8 {
        frame.data[0][7 * stride + 8 + i] = 20 + 10 * i as u16;
    }
    mark_neighbours(&mut lc, 8, 8, 4);

    let cu = CodingUnit {
        intra_pred_mode_y: 66,
        ..CodingUnit::new(8, 8, 4, 4)
    };
    build_test_predictor().predict(&lc, &cu, &mut frame, 8, 8, 4, 4, 0);

    // 模式 66 沿 45 度取上方参考, PDPC 只修正前 3 列
    for y in 0..4i32 {
        for x in 0..4i32 {
            let val = 20 + 10 * (x + y + 1);
            let wl = [32, 8, 2, 0][x as usize];
            let expected = val + (((100 - val) * wl + 32) >> 6);
            assert_eq!(
                i32::from(frame.sample(0, 8 + x as usize, 8 + y as usize)),
                expected,
                "x={}, y={}",
                x,
                y
            );
        }
    }
}

#[test]
fn test_angular_constant_neighbours_all_directions() {
    let predictor = build_test_predictor();
    for mode in [2, 10, 24, 34, 45, 58, 66] {
        let (fps, mut lc) = build_test_context(1, 64, 64);
        let mut frame = build_test_frame(&fps, 77);
        fill_rect(&mut frame, 0, 8, 8, 16, 8, 0);
        mark_neighbours(&mut lc, 8, 8, 16);
        let cu = CodingUnit {
            intra_pred_mode_y: mode,
            ..CodingUnit::new(8, 8, 16, 8)
        };
        predictor.predict(&lc, &cu, &mut frame, 8, 8, 16, 8, 0);
        assert!(
            block(&frame, 0, 8, 8, 16, 8).iter().all(|&v| v == 77),
            "常数参考的角度预测应为常数, mode={}",
            mode
        );
    }
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "预测块越出平面")]
fn test_predict_asserts_block_inside_plane() {
    let (fps, lc) = build_test_context(1, 64, 64);
    let mut frame = build_test_frame(&fps, 0);
    let cu = CodingUnit::new(60, 0, 8, 8);
    build_test_predictor().predict(&lc, &cu, &mut frame, 60, 0, 8, 8, 0);
}

// ============================================================
// MIP
// ============================================================

#[test]
fn test_mip_matrices_reject_wrong_length() {
    let err = MipMatrices::from_raw(vec![0; 10], vec![0; 8 * 16 * 8], vec![0; 6 * 64 * 7])
        .expect_err("长度错误应被拒绝");
    assert!(matches!(err, VvcError::InvalidArgument(_)));
    assert_eq!(MipMatrices::num_modes(2), 6);
}

#[test]
fn test_mip_zero_matrix_interpolates_towards_boundary() {
    let (fps, mut lc) = build_test_context(1, 64, 64);
    let mut frame = build_test_frame(&fps, 100);
    fill_rect(&mut frame, 0, 8, 8, 8, 8, 0);
    mark_neighbours(&mut lc, 8, 8, 8);

    let cu = CodingUnit {
        mip: Some(MipInfo {
            mode: 3,
            transposed: false,
        }),
        ..CodingUnit::new(8, 8, 8, 8)
    };
    build_test_predictor().predict(&lc, &cu, &mut frame, 8, 8, 8, 8, 0);

    // 零矩阵下缩减预测为 temp0 + ((32 - 32 * (128 - temp0)) >> 6) = 86
    let out = block(&frame, 0, 8, 8, 8, 8);
    for y in (1..8).step_by(2) {
        for x in (1..8).step_by(2) {
            assert_eq!(out[y * 8 + x], 86, "x={}, y={}", x, y);
        }
    }
    assert_eq!(out[8], 93, "水平上采样取左侧边界与锚点的均值");
    assert_eq!(out[0], 97);
    assert!(out.iter().all(|&v| (86..=100).contains(&v)));
}

/// 4x4 尺寸类每个系数互不相同的 MIP 矩阵, 其余尺寸类为零
fn build_test_patterned_mip() -> IntraPredictor {
    let size0: Vec<u8> = (0..16u32)
        .flat_map(|mode| {
            (0..16u32).flat_map(move |n| (0..4u32).map(move |i| ((mode * 5 + n * 11 + i * 23) % 61 + 3) as u8))
        })
        .collect();
    let matrices = MipMatrices::from_raw(size0, vec![0; 8 * 16 * 8], vec![0; 6 * 64 * 7])
        .expect("MIP 矩阵构造失败");
    IntraPredictor::new(Arc::new(matrices))
}

#[test]
fn test_mip_4x4_matrix_product_and_transpose() {
    let (fps, mut lc) = build_test_context(1, 64, 64);
    let predictor = build_test_patterned_mip();
    mark_neighbours(&mut lc, 8, 8, 4);

    // 上方 [40, 60, 80, 120] 下采样为 [50, 100], 左侧 [20, 20, 200, 220] 下采样为 [20, 210]
    let cases = [
        (
            false,
            [79, 123, 120, 12, 0, 55, 99, 96, 140, 0, 2, 75, 119, 116, 8, 0],
        ),
        (
            true,
            [66, 0, 57, 130, 136, 28, 0, 19, 25, 98, 18, 12, 19, 0, 59, 0],
        ),
    ];
    for (transposed, expected) in cases {
        let mut frame = build_test_frame(&fps, 100);
        for (i, v) in [40, 60, 80, 120].into_iter().enumerate() {
            fill_rect(&mut frame, 0, 8 + i, 7, 1, 1, v);
        }
        for (i, v) in [20, 20, 200, 220].into_iter().enumerate() {
            fill_rect(&mut frame, 0, 7, 8 + i, 1, 1, v);
        }
        let cu = CodingUnit {
            mip: Some(MipInfo { mode: 5, transposed }),
            ..CodingUnit::new(8, 8, 4, 4)
        };
        predictor.predict(&lc, &cu, &mut frame, 8, 8, 4, 4, 0);
        assert_eq!(block(&frame, 0, 8, 8, 4, 4), expected, "transposed={}", transposed);
    }
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "MIP 模式超出范围")]
fn test_mip_mode_out_of_range() {
    let (fps, mut lc) = build_test_context(1, 64, 64);
    let mut frame = build_test_frame(&fps, 100);
    mark_neighbours(&mut lc, 8, 8, 4);
    let cu = CodingUnit {
        mip: Some(MipInfo {
            mode: 16,
            transposed: true,
        }),
        ..CodingUnit::new(8, 8, 4, 4)
    };
    build_test_predictor().predict(&lc, &cu, &mut frame, 8, 8, 4, 4, 0);
}

// ============================================================
// CCLM
// ============================================================

#[test]
fn test_cclm_params_flat_luma() {
    let params = derive_params(&[50, 60, 90], &[50, 70, 95]);
    assert_eq!((params[0].a, params[0].b, params[0].k), (0, 60, 0));
    assert_eq!((params[1].a, params[1].b, params[1].k), (0, 90, 0));
}

#[test]
fn test_cclm_params_steep_slope_is_clamped() {
    // 色度跨度远大于亮度跨度时 a 饱和为 +-15
    let params = derive_params(&[10, 0, 200], &[11, 200, 0]);
    assert_eq!(params[0].a, 15);
    assert_eq!(params[0].k, 1);
    assert_eq!(params[1].a, -15);
    assert_eq!(CCLM_DIV_SIG[0], 0);
}

#[test]
fn test_cclm_444_recovers_linear_relation() {
    let (fps, mut lc) = build_test_context(3, 64, 64);
    let mut frame = build_test_frame(&fps, 0);
    let stride = frame.linesize[0];
    for y in 0..64 {
        for x in 0..64 {
            frame.data[0][y * stride + x] = 2 * x as u16 + 40;
            frame.data[1][y * stride + x] = x as u16 + 20;
            frame.data[2][y * stride + x] = 200 - x as u16;
        }
    }
    fill_rect(&mut frame, 1, 8, 8, 8, 8, 0);
    fill_rect(&mut frame, 2, 8, 8, 8, 8, 0);
    mark_neighbours(&mut lc, 8, 8, 8);

    let cu = CodingUnit {
        intra_pred_mode_c: INTRA_LT_CCLM,
        ..CodingUnit::new(8, 8, 8, 8)
    };
    build_test_predictor().predict(&lc, &cu, &mut frame, 8, 8, 8, 8, 1);
    for x in 8..16 {
        assert_eq!(frame.sample(1, x, 10), x as u16 + 20, "Cb 应满足 cb = luma / 2, x={}", x);
    }
    let cr = block(&frame, 2, 8, 8, 8, 8);
    assert!(cr.iter().all(|&v| v != 0), "c_idx 1 应同时写出 Cr");
    for w in cr[..8].windows(2) {
        assert!(w[1] <= w[0], "Cr 随亮度增大而减小");
    }
}

#[test]
fn test_cclm_420_flat_luma_copies_chroma_neighbours() {
    let (fps, mut lc) = build_test_context(1, 64, 64);
    let mut frame = build_test_frame(&fps, 200);
    frame.data[1].fill(60);
    frame.data[2].fill(90);
    fill_rect(&mut frame, 1, 4, 4, 4, 4, 0);
    fill_rect(&mut frame, 2, 4, 4, 4, 4, 0);
    mark_neighbours(&mut lc, 8, 8, 8);

    let cu = CodingUnit {
        intra_pred_mode_c: INTRA_T_CCLM,
        ..CodingUnit::new(8, 8, 8, 8)
    };
    let predictor = build_test_predictor();
    predictor.predict(&lc, &cu, &mut frame, 8, 8, 8, 8, 2);
    assert!(block(&frame, 1, 4, 4, 4, 4).iter().all(|&v| v == 0));

    predictor.predict(&lc, &cu, &mut frame, 8, 8, 8, 8, 1);
    assert!(block(&frame, 1, 4, 4, 4, 4).iter().all(|&v| v == 60));
    assert!(block(&frame, 2, 4, 4, 4, 4).iter().all(|&v| v == 90));
}

#[test]
fn test_cclm_without_neighbours_fills_mid_value() {
    let (fps, mut lc) = build_test_context(1, 64, 64);
    let mut frame = build_test_frame(&fps, 10);
    lc.set_neighbour_available(0, 0, 8);
    build_test_predictor().predict_cclm(&lc, CclmMode::Lt, &mut frame, 0, 0, 8, 8);
    assert!(block(&frame, 1, 0, 0, 4, 4).iter().all(|&v| v == 128));
    assert!(block(&frame, 2, 0, 0, 4, 4).iter().all(|&v| v == 128));
}

// ============================================================
// LMCS 色度缩放
// ============================================================

fn build_test_lmcs(delta_abs_crs: u8) -> LmcsTables {
    let raw = RawLmcsData {
        delta_max_bin_idx: 1,
        delta_abs_crs,
        ..Default::default()
    };
    LmcsTables::derive(&raw, 8).expect("LMCS 推导失败")
}

#[test]
fn test_lmcs_scale_chroma_without_neighbours_uses_mid_luma() {
    let (fps, mut lc) = build_test_context(1, 64, 64);
    let frame = build_test_frame(&fps, 100);
    let lmcs = build_test_lmcs(4);

    let mut coeff = [100, -100, 0, 5000];
    lc.lmcs_scale_chroma(&lmcs, &frame, &mut coeff, 2, 2, 8, 8);
    assert_eq!(coeff, [80, -80, 0, 204], "残差先裁剪到位深范围再缩放");
}

#[test]
fn test_lmcs_chroma_scale_averages_left_column() {
    let (fps, mut lc) = build_test_context(1, 64, 64);
    let frame = build_test_frame(&fps, 250);
    let lmcs = build_test_lmcs(4);
    lc.add_reconstructed_area(0, 0, 0, 32, 32);
    lc.begin_ctu(1);

    assert_eq!(lc.lmcs_chroma_scale(&lmcs, &frame, 40, 8), 1 << 11, "亮度均值落入码字为 0 的分段");
    assert_eq!(lc.lmcs_chroma_scale(&lmcs, &frame, 40, 8), 1 << 11, "同一 VPDU 复用缓存");
    assert_eq!(lc.lmcs_chroma_scale(&lmcs, &frame, 8, 8), (16 * 2048 / 20) as u16);
}
