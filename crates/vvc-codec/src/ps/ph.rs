//! 图像头推导: POC, 子块合并候选数与加权预测表.

use vvc_core::math::clip_intp2;
use vvc_core::{VvcError, VvcResult};

use super::pps::Pps;
use super::raw::{RawPartitionConstraints, RawPictureHeader, RawPredWeightEntry, RawPredWeightTable};
use super::sps::Sps;

/// 参考图像列表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefList {
    L0,
    L1,
}

impl RefList {
    pub const ALL: [RefList; 2] = [RefList::L0, RefList::L1];

    pub fn index(self) -> usize {
        match self {
            RefList::L0 => 0,
            RefList::L1 => 1,
        }
    }
}

/// 单个参考索引的权重与偏移 (Y, Cb, Cr)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeightEntry {
    pub luma_weight_flag: bool,
    pub chroma_weight_flag: bool,
    pub weight: [i32; 3],
    pub offset: [i32; 3],
}

/// 推导后的加权预测表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredWeightTable {
    /// (亮度, 色度) log2 分母
    pub log2_denom: [u32; 2],
    lists: [Vec<WeightEntry>; 2],
}

impl PredWeightTable {
    pub fn derive(raw: &RawPredWeightTable) -> VvcResult<Self> {
        let luma_denom = i32::from(raw.luma_log2_weight_denom);
        let chroma_denom = luma_denom + i32::from(raw.delta_chroma_log2_weight_denom);
        if luma_denom > 7 || !(0..=7).contains(&chroma_denom) {
            return Err(VvcError::InvalidData(format!(
                "VVC: 加权预测分母超出范围, luma={}, chroma={}",
                luma_denom, chroma_denom
            )));
        }
        let log2_denom = [luma_denom as u32, chroma_denom as u32];
        Ok(Self {
            log2_denom,
            lists: [
                Self::derive_list(&raw.l0, log2_denom),
                Self::derive_list(&raw.l1, log2_denom),
            ],
        })
    }

    fn derive_list(entries: &[RawPredWeightEntry], log2_denom: [u32; 2]) -> Vec<WeightEntry> {
        let denom = [1i32 << log2_denom[0], 1i32 << log2_denom[1]];
        entries
            .iter()
            .map(|r| {
                let mut e = WeightEntry {
                    luma_weight_flag: r.luma_weight_flag,
                    chroma_weight_flag: r.chroma_weight_flag,
                    ..Default::default()
                };
                e.weight[0] = denom[0] + i32::from(r.delta_luma_weight);
                e.offset[0] = i32::from(r.luma_offset);
                for c in 0..2 {
                    let w = denom[1] + i32::from(r.delta_chroma_weight[c]);
                    let off = 128 + i32::from(r.delta_chroma_offset[c]) - ((128 * w) >> log2_denom[1]);
                    e.weight[c + 1] = w;
                    e.offset[c + 1] = clip_intp2(off, 7);
                }
                e
            })
            .collect()
    }

    pub fn entries(&self, list: RefList) -> &[WeightEntry] {
        &self.lists[list.index()]
    }

    pub fn num_weights(&self, list: RefList) -> usize {
        self.lists[list.index()].len()
    }
}

/// 推导后的图像头
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureHeader {
    pub raw: RawPictureHeader,
    pub poc: i32,
    pub max_num_subblock_merge_cand: u32,
    /// 加权预测信息位于图像头时有效
    pub pwt: Option<PredWeightTable>,
}

impl PictureHeader {
    pub fn derive(
        raw: &RawPictureHeader,
        sps: &Sps,
        pps: &Pps,
        poc_tid0: i32,
        is_clvss: bool,
    ) -> VvcResult<Self> {
        if u32::from(raw.pic_order_cnt_lsb) >= sps.max_pic_order_cnt_lsb {
            return Err(VvcError::InvalidData(format!(
                "VVC: ph_pic_order_cnt_lsb 超出范围, lsb={}, max={}",
                raw.pic_order_cnt_lsb, sps.max_pic_order_cnt_lsb
            )));
        }
        check_partition_constraints(raw, sps)?;
        let pwt = if pps.raw.wp_info_in_ph {
            Some(PredWeightTable::derive(&raw.pred_weight_table)?)
        } else {
            None
        };
        Ok(Self {
            raw: raw.clone(),
            poc: compute_poc(raw, sps.max_pic_order_cnt_lsb, poc_tid0, is_clvss)?,
            max_num_subblock_merge_cand: max_num_subblock_merge_cand(sps, raw),
            pwt,
        })
    }
}

/// 划分约束的取值范围: 四叉树最小尺寸与 TT 不超过 `min(6, CtbLog2)`,
/// BT 不超过 CTU (帧内色度同样不超过 64), MTT 深度不超过 `2 * (CtbLog2 - MinCbLog2)`
fn check_partition_constraints(raw: &RawPictureHeader, sps: &Sps) -> VvcResult<()> {
    let ctb_log2 = sps.partition.ctb_log2_size_y;
    let min_cb_log2 = sps.partition.min_cb_log2_size_y;
    let groups: [(&str, &RawPartitionConstraints, u32); 3] = [
        ("intra_luma", &raw.intra_luma, ctb_log2),
        ("intra_chroma", &raw.intra_chroma, ctb_log2.min(6)),
        ("inter", &raw.inter, ctb_log2),
    ];
    for (name, c, max_bt_log2) in groups {
        let min_qt_log2 = min_cb_log2 + u32::from(c.log2_diff_min_qt_min_cb);
        let max_bt = min_qt_log2 + u32::from(c.log2_diff_max_bt_min_qt);
        let max_tt = min_qt_log2 + u32::from(c.log2_diff_max_tt_min_qt);
        let max_depth = 2 * (ctb_log2 - min_cb_log2);
        if min_qt_log2 > ctb_log2.min(6)
            || max_bt > max_bt_log2
            || max_tt > ctb_log2.min(6)
            || u32::from(c.max_mtt_hierarchy_depth) > max_depth
        {
            return Err(VvcError::InvalidData(format!(
                "VVC: {} 划分约束超出范围, min_qt_log2={}, max_bt_log2={}, max_tt_log2={}, mtt_depth={}, ctb_log2={}",
                name, min_qt_log2, max_bt, max_tt, c.max_mtt_hierarchy_depth, ctb_log2
            )));
        }
    }
    Ok(())
}

/// 由 LSB 与前一个 TemporalId 为 0 的图像 POC 推导当前 POC
///
/// 显式 MSB 周期使结果超出 `i32` 时返回 `InvalidData`.
pub fn compute_poc(
    raw: &RawPictureHeader,
    max_poc_lsb: u32,
    poc_tid0: i32,
    is_clvss: bool,
) -> VvcResult<i32> {
    let max_poc_lsb = i64::from(max_poc_lsb);
    let poc_tid0 = i64::from(poc_tid0);
    let prev_poc_lsb = poc_tid0 % max_poc_lsb;
    let prev_poc_msb = poc_tid0 - prev_poc_lsb;
    let poc_lsb = i64::from(raw.pic_order_cnt_lsb);

    let poc_msb = if raw.poc_msb_cycle_present {
        i64::from(raw.poc_msb_cycle_val) * max_poc_lsb
    } else if is_clvss {
        0
    } else if poc_lsb < prev_poc_lsb && prev_poc_lsb - poc_lsb >= max_poc_lsb / 2 {
        prev_poc_msb + max_poc_lsb
    } else if poc_lsb > prev_poc_lsb && poc_lsb - prev_poc_lsb > max_poc_lsb / 2 {
        prev_poc_msb - max_poc_lsb
    } else {
        prev_poc_msb
    };
    i32::try_from(poc_msb + poc_lsb).map_err(|_| {
        VvcError::InvalidData(format!(
            "VVC: POC 超出 i32 范围, msb={}, lsb={}",
            poc_msb, poc_lsb
        ))
    })
}

fn max_num_subblock_merge_cand(sps: &Sps, raw: &RawPictureHeader) -> u32 {
    if sps.raw.affine_enabled {
        return 5u32.saturating_sub(u32::from(sps.raw.five_minus_max_num_subblock_merge_cand));
    }
    u32::from(sps.raw.sbtmvp_enabled && raw.temporal_mvp_enabled)
}
