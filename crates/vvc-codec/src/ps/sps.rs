//! SPS 推导.
//!
//! 把原始 SPS 字段转换为解码可直接使用的数值状态:
//! - 位深、像素格式与各平面子采样移位
//! - CTU / 编码块 / 变换块尺寸
//! - 合并候选数等帧间相关常量
//! - LADF 区间下界与色度 QP 映射表

use log::debug;
use vvc_core::math::ceil_rshift;
use vvc_core::{PixelFormat, VvcError, VvcResult};

use super::chroma_qp::ChromaQpTables;
use super::limits::{DerivationLimits, MAX_SPS_COUNT};
use super::raw::{RawSps, RawSubpic};

/// 采样格式相关字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpsFormat {
    pub bit_depth: u32,
    pub qp_bd_offset: i32,
    pub log2_transform_range: u32,
    pub pixel_format: PixelFormat,
    pub chroma_format_idc: u8,
    /// 各平面水平子采样移位 (Y, Cb, Cr)
    pub hshift: [u32; 3],
    /// 各平面垂直子采样移位 (Y, Cb, Cr)
    pub vshift: [u32; 3],
    pub pixel_shift: u32,
}

/// 块划分尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpsPartition {
    pub ctb_log2_size_y: u32,
    pub ctb_size_y: u32,
    pub min_cb_log2_size_y: u32,
    pub min_cb_size_y: u32,
    pub max_tb_size_y: u32,
    pub max_ts_size: u32,
}

/// 帧间候选数量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpsInter {
    pub max_num_merge_cand: u32,
    pub max_num_ibc_merge_cand: u32,
    pub max_num_gpm_merge_cand: u32,
    pub log2_parallel_merge_level: u32,
}

/// 推导后的 SPS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sps {
    pub raw: RawSps,
    pub format: SpsFormat,
    pub partition: SpsPartition,
    pub inter: SpsInter,
    pub max_pic_order_cnt_lsb: u32,
    /// LADF 各区间下界, 未启用时为空
    pub ladf_interval_lower_bound: Vec<u32>,
    pub chroma_qp: ChromaQpTables,
    /// 子图像布局, 未显式给出时为覆盖整幅图像的单个子图像
    pub subpics: Vec<RawSubpic>,
}

impl Sps {
    /// 从原始字段推导 SPS
    pub fn derive(raw: &RawSps, limits: &DerivationLimits) -> VvcResult<Self> {
        if raw.sps_id as usize >= MAX_SPS_COUNT {
            return Err(VvcError::InvalidData(format!(
                "VVC: sps_id 超出范围, sps_id={}",
                raw.sps_id
            )));
        }
        let format = derive_format(raw)?;
        let partition = derive_partition(raw, limits)?;
        let inter = derive_inter(raw);
        let max_pic_order_cnt_lsb = 1u32 << (u32::from(raw.log2_max_pic_order_cnt_lsb_minus4) + 4);
        let ladf_interval_lower_bound = derive_ladf(raw)?;
        let chroma_qp = if raw.chroma_format_idc != 0 {
            ChromaQpTables::build(raw, format.qp_bd_offset, limits.max_qp_table_points)?
        } else {
            ChromaQpTables::default()
        };
        let subpics = derive_subpics(raw, &partition, limits)?;

        debug!(
            "VVC: SPS 推导完成, sps_id={}, {}x{}, fmt={}, ctb={}",
            raw.sps_id,
            raw.pic_width_max_in_luma_samples,
            raw.pic_height_max_in_luma_samples,
            format.pixel_format,
            partition.ctb_size_y
        );

        Ok(Self {
            raw: raw.clone(),
            format,
            partition,
            inter,
            max_pic_order_cnt_lsb,
            ladf_interval_lower_bound,
            chroma_qp,
            subpics,
        })
    }

    pub fn id(&self) -> usize {
        self.raw.sps_id as usize
    }

    pub fn bit_depth(&self) -> u32 {
        self.format.bit_depth
    }

    pub fn ctb_log2_size_y(&self) -> u32 {
        self.partition.ctb_log2_size_y
    }
}

fn derive_format(raw: &RawSps) -> VvcResult<SpsFormat> {
    let bit_depth = u32::from(raw.bitdepth_minus8) + 8;
    let pixel_format = PixelFormat::from_chroma_format(raw.chroma_format_idc, bit_depth)
        .ok_or_else(|| {
            VvcError::InvalidData(format!(
                "VVC: sps_bitdepth 或 chroma_format_idc 不受支持, chroma_format_idc={}, bit_depth={}",
                raw.chroma_format_idc, bit_depth
            ))
        })?;
    let (log2_chroma_w, log2_chroma_h) = pixel_format.chroma_subsampling();
    let log2_transform_range = if raw.extended_precision {
        (bit_depth + 6).clamp(15, 20)
    } else {
        15
    };

    Ok(SpsFormat {
        bit_depth,
        qp_bd_offset: 6 * (bit_depth as i32 - 8),
        log2_transform_range,
        pixel_format,
        chroma_format_idc: raw.chroma_format_idc,
        hshift: [0, log2_chroma_w, log2_chroma_w],
        vshift: [0, log2_chroma_h, log2_chroma_h],
        pixel_shift: u32::from(bit_depth > 8),
    })
}

fn derive_partition(raw: &RawSps, limits: &DerivationLimits) -> VvcResult<SpsPartition> {
    let ctb_log2_size_y = u32::from(raw.log2_ctu_size_minus5) + 5;
    if !(limits.min_ctb_log2_size..=limits.max_ctb_log2_size).contains(&ctb_log2_size_y) {
        return Err(VvcError::InvalidData(format!(
            "VVC: CTU 尺寸超出范围, ctb_log2_size_y={}",
            ctb_log2_size_y
        )));
    }
    let min_cb_log2_size_y = u32::from(raw.log2_min_luma_coding_block_size_minus2) + 2;
    if min_cb_log2_size_y > ctb_log2_size_y.min(6) {
        return Err(VvcError::InvalidData(format!(
            "VVC: 最小编码块尺寸非法, min_cb_log2_size_y={}, ctb_log2_size_y={}",
            min_cb_log2_size_y, ctb_log2_size_y
        )));
    }
    if raw.log2_transform_skip_max_size_minus2 > 3 {
        return Err(VvcError::InvalidData(format!(
            "VVC: log2_transform_skip_max_size_minus2 超出范围, value={}",
            raw.log2_transform_skip_max_size_minus2
        )));
    }
    Ok(SpsPartition {
        ctb_log2_size_y,
        ctb_size_y: 1 << ctb_log2_size_y,
        min_cb_log2_size_y,
        min_cb_size_y: 1 << min_cb_log2_size_y,
        max_tb_size_y: 1 << if raw.max_luma_transform_size_64 { 6 } else { 5 },
        max_ts_size: 1 << (u32::from(raw.log2_transform_skip_max_size_minus2) + 2),
    })
}

fn derive_inter(raw: &RawSps) -> SpsInter {
    let max_num_merge_cand = 6u32.saturating_sub(u32::from(raw.six_minus_max_num_merge_cand));
    let mut max_num_gpm_merge_cand = 0;
    if raw.gpm_enabled {
        max_num_gpm_merge_cand = 2;
        if max_num_merge_cand >= 3 {
            max_num_gpm_merge_cand = max_num_merge_cand
                .saturating_sub(u32::from(raw.max_num_merge_cand_minus_max_num_gpm_cand));
        }
    }
    SpsInter {
        max_num_merge_cand,
        max_num_ibc_merge_cand: 6u32.saturating_sub(u32::from(raw.six_minus_max_num_ibc_merge_cand)),
        max_num_gpm_merge_cand,
        log2_parallel_merge_level: u32::from(raw.log2_parallel_merge_level_minus2) + 2,
    }
}

fn derive_ladf(raw: &RawSps) -> VvcResult<Vec<u32>> {
    let Some(ladf) = raw.ladf.as_ref() else {
        return Ok(Vec::new());
    };
    let num_intervals = usize::from(ladf.num_ladf_intervals_minus2) + 2;
    if ladf.delta_threshold_minus1.len() + 1 < num_intervals {
        return Err(VvcError::InvalidData(format!(
            "VVC: LADF 阈值个数不足, intervals={}, thresholds={}",
            num_intervals,
            ladf.delta_threshold_minus1.len()
        )));
    }
    let mut bounds = Vec::with_capacity(num_intervals);
    bounds.push(0u32);
    for i in 0..num_intervals - 1 {
        bounds.push(bounds[i] + u32::from(ladf.delta_threshold_minus1[i]) + 1);
    }
    Ok(bounds)
}

fn derive_subpics(
    raw: &RawSps,
    partition: &SpsPartition,
    limits: &DerivationLimits,
) -> VvcResult<Vec<RawSubpic>> {
    let width = u32::from(raw.pic_width_max_in_luma_samples);
    let height = u32::from(raw.pic_height_max_in_luma_samples);
    if width == 0
        || height == 0
        || width > limits.max_picture_dimension
        || height > limits.max_picture_dimension
    {
        return Err(VvcError::InvalidData(format!(
            "VVC: SPS 最大图像尺寸非法, {}x{}",
            width, height
        )));
    }
    let ctb_width = ceil_rshift(width, partition.ctb_log2_size_y);
    let ctb_height = ceil_rshift(height, partition.ctb_log2_size_y);

    if !raw.subpic_info_present {
        return Ok(vec![RawSubpic {
            ctu_top_left_x: 0,
            ctu_top_left_y: 0,
            width_minus1: (ctb_width - 1) as u16,
            height_minus1: (ctb_height - 1) as u16,
            treated_as_pic: true,
        }]);
    }
    if raw.subpics.is_empty() {
        return Err(VvcError::InvalidData("VVC: 子图像信息缺失".into()));
    }
    for (i, s) in raw.subpics.iter().enumerate() {
        let x_end = u32::from(s.ctu_top_left_x) + u32::from(s.width_minus1) + 1;
        let y_end = u32::from(s.ctu_top_left_y) + u32::from(s.height_minus1) + 1;
        if x_end > ctb_width || y_end > ctb_height {
            return Err(VvcError::InvalidData(format!(
                "VVC: 子图像超出图像范围, subpic={}, x_end={}, y_end={}",
                i, x_end, y_end
            )));
        }
    }
    Ok(raw.subpics.clone())
}
