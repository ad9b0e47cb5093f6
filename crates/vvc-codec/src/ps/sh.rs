//! slice 头推导.

use vvc_core::{VvcError, VvcResult};

use super::FrameParamSets;
use super::limits::MAX_ALF_COUNT;
use super::ph::PredWeightTable;
use super::raw::{RawAlfRefs, RawSliceHeader, SliceType};

/// 亮度 / 色度下标
pub const LUMA: usize = 0;
pub const CHROMA: usize = 1;

/// 去块偏移 (Y, Cb, Cr)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeblockOffsets {
    pub beta_offset: [i32; 3],
    pub tc_offset: [i32; 3],
}

/// 划分尺寸与深度上限, 下标为 [`LUMA`] / [`CHROMA`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartitionLimits {
    pub min_qt_size: [u32; 2],
    pub max_bt_size: [u32; 2],
    pub max_tt_size: [u32; 2],
    pub max_mtt_depth: [u32; 2],
    pub cu_qp_delta_subdiv: u32,
    pub cu_chroma_qp_offset_subdiv: u32,
}

/// 推导后的 slice 头
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceHeader {
    pub raw: RawSliceHeader,
    /// 当前 slice 的 CTU 光栅地址 (解码顺序)
    pub ctb_addr_in_curr_slice: Vec<u32>,
    pub slice_qp_y: i32,
    pub deblock: DeblockOffsets,
    pub partition: PartitionLimits,
    pub pwt: Option<PredWeightTable>,
    /// 新 tile 或新 CTU 行 (WPP) 开始处在 `ctb_addr_in_curr_slice` 中的下标
    pub entry_point_start_ctu: Vec<u32>,
}

impl SliceHeader {
    pub fn num_ctus_in_curr_slice(&self) -> usize {
        self.ctb_addr_in_curr_slice.len()
    }

    pub fn is_intra(&self) -> bool {
        self.raw.slice_type == SliceType::I
    }
}

impl FrameParamSets {
    /// 基于当前帧参数集推导 slice 头
    pub fn decode_slice_header(&self, raw: &RawSliceHeader) -> VvcResult<SliceHeader> {
        let ctb_addr_in_curr_slice = self.slice_address(raw)?;
        self.check_alf_aps(&raw.alf)?;

        let pps = &self.pps.raw;
        let pwt = if !pps.wp_info_in_ph
            && ((pps.weighted_pred && raw.slice_type == SliceType::P)
                || (pps.weighted_bipred && raw.slice_type == SliceType::B))
        {
            Some(PredWeightTable::derive(&raw.pred_weight_table)?)
        } else {
            None
        };

        let init_qp = i32::from(pps.init_qp_minus26) + 26;
        let slice_qp_y = if pps.qp_delta_info_in_ph {
            init_qp + i32::from(self.ph.raw.qp_delta)
        } else {
            init_qp + i32::from(raw.qp_delta)
        };
        let qp_bd_offset = self.sps.format.qp_bd_offset;
        if !(-qp_bd_offset..=63).contains(&slice_qp_y) {
            return Err(VvcError::InvalidData(format!(
                "VVC: slice_qp_y 超出范围, qp={}",
                slice_qp_y
            )));
        }

        let entry_point_start_ctu = self.entry_points(&ctb_addr_in_curr_slice);
        Ok(SliceHeader {
            raw: raw.clone(),
            ctb_addr_in_curr_slice,
            slice_qp_y,
            deblock: deblock_offsets(raw),
            partition: self.partition_limits(raw.slice_type),
            pwt,
            entry_point_start_ctu,
        })
    }

    fn slice_address(&self, raw: &RawSliceHeader) -> VvcResult<Vec<u32>> {
        let pps = &self.pps;
        let slices = &pps.slices;
        let tiles = &pps.tiles;
        let slice_address = usize::from(raw.slice_address);

        if pps.raw.rect_slice {
            let curr_subpic = usize::from(raw.curr_subpic_idx);
            if curr_subpic >= slices.num_slices_in_subpic.len() {
                return Err(VvcError::InvalidData(format!(
                    "VVC: curr_subpic_idx 超出范围, idx={}",
                    curr_subpic
                )));
            }
            let idx = slice_address
                + slices.num_slices_in_subpic[..curr_subpic]
                    .iter()
                    .map(|&n| n as usize)
                    .sum::<usize>();
            if idx >= slices.num_slices() {
                return Err(VvcError::InvalidData(format!(
                    "VVC: sh_slice_address 超出范围, slice_idx={}, num_slices={}",
                    idx,
                    slices.num_slices()
                )));
            }
            let start = slices.slice_start_offset[idx] as usize;
            let count = slices.num_ctus_in_slice[idx] as usize;
            return Ok(slices.ctb_addr_in_slice[start..start + count].to_vec());
        }

        let last_tile = slice_address + usize::from(raw.num_tiles_in_slice_minus1);
        if last_tile >= tiles.num_tiles() {
            return Err(VvcError::InvalidData(format!(
                "VVC: slice 引用不存在的 tile, first={}, last={}, num_tiles={}",
                slice_address,
                last_tile,
                tiles.num_tiles()
            )));
        }
        let (tx, ty) = tiles.tile_xy(slice_address);
        let start = (tiles.row_bd[ty] * pps.size.ctb_width + tiles.col_bd[tx] * tiles.row_height[ty])
            as usize;
        let count: usize = (slice_address..=last_tile)
            .map(|t| {
                let (tx, ty) = tiles.tile_xy(t);
                (tiles.row_height[ty] * tiles.col_width[tx]) as usize
            })
            .sum();
        Ok(slices.ctb_addr_in_slice[start..start + count].to_vec())
    }

    fn check_alf_aps(&self, alf: &RawAlfRefs) -> VvcResult<()> {
        if !alf.enabled {
            return Ok(());
        }
        let missing = |id: u8| {
            usize::from(id) >= MAX_ALF_COUNT || self.alf_list[usize::from(id)].is_none()
        };
        let err = |what: &str, id: u8| {
            VvcError::InvalidData(format!("VVC: slice 引用的 ALF APS 不存在, {}={}", what, id))
        };

        if let Some(&id) = alf.aps_id_luma.iter().find(|&&id| missing(id)) {
            return Err(err("aps_id_luma", id));
        }
        if (alf.cb_enabled || alf.cr_enabled) && missing(alf.aps_id_chroma) {
            return Err(err("aps_id_chroma", alf.aps_id_chroma));
        }
        if self.sps.raw.ccalf_enabled {
            if alf.cc_cb_enabled && missing(alf.cc_cb_aps_id) {
                return Err(err("cc_cb_aps_id", alf.cc_cb_aps_id));
            }
            if alf.cc_cr_enabled && missing(alf.cc_cr_aps_id) {
                return Err(err("cc_cr_aps_id", alf.cc_cr_aps_id));
            }
        }
        Ok(())
    }

    fn partition_limits(&self, slice_type: SliceType) -> PartitionLimits {
        let ph = &self.ph.raw;
        let min_cb_log2 = self.sps.partition.min_cb_log2_size_y;
        let mut p = PartitionLimits::default();

        let (constraints, qp_subdiv, chroma_subdiv) = if slice_type == SliceType::I {
            (
                [ph.intra_luma, ph.intra_chroma],
                ph.cu_qp_delta_subdiv_intra_slice,
                ph.cu_chroma_qp_offset_subdiv_intra_slice,
            )
        } else {
            (
                [ph.inter, ph.inter],
                ph.cu_qp_delta_subdiv_inter_slice,
                ph.cu_chroma_qp_offset_subdiv_inter_slice,
            )
        };
        for (ch, c) in constraints.iter().enumerate() {
            let min_qt_log2 = min_cb_log2 + u32::from(c.log2_diff_min_qt_min_cb);
            p.min_qt_size[ch] = 1 << min_qt_log2;
            p.max_bt_size[ch] = 1 << (min_qt_log2 + u32::from(c.log2_diff_max_bt_min_qt));
            p.max_tt_size[ch] = 1 << (min_qt_log2 + u32::from(c.log2_diff_max_tt_min_qt));
            p.max_mtt_depth[ch] = u32::from(c.max_mtt_hierarchy_depth);
        }
        p.cu_qp_delta_subdiv = u32::from(qp_subdiv);
        p.cu_chroma_qp_offset_subdiv = u32::from(chroma_subdiv);
        p
    }

    fn entry_points(&self, ctb_addrs: &[u32]) -> Vec<u32> {
        let sps = &self.sps.raw;
        if !sps.entry_point_offsets_present {
            return Vec::new();
        }
        let ctb_width = self.pps.size.ctb_width;
        let tiles = &self.pps.tiles;
        let mut out = Vec::new();
        for (i, pair) in ctb_addrs.windows(2).enumerate() {
            let (pre_x, pre_y) = (pair[0] % ctb_width, pair[0] / ctb_width);
            let (x, y) = (pair[1] % ctb_width, pair[1] / ctb_width);
            if tiles.ctb_to_row_bd[y as usize] != tiles.ctb_to_row_bd[pre_y as usize]
                || tiles.ctb_to_col_bd[x as usize] != tiles.ctb_to_col_bd[pre_x as usize]
                || (y != pre_y && sps.entropy_coding_sync_enabled)
            {
                out.push(i as u32 + 1);
            }
        }
        out
    }
}

fn deblock_offsets(raw: &RawSliceHeader) -> DeblockOffsets {
    if raw.deblocking_filter_disabled {
        return DeblockOffsets::default();
    }
    DeblockOffsets {
        beta_offset: [
            i32::from(raw.luma_beta_offset_div2) * 2,
            i32::from(raw.cb_beta_offset_div2) * 2,
            i32::from(raw.cr_beta_offset_div2) * 2,
        ],
        tc_offset: [
            i32::from(raw.luma_tc_offset_div2) * 2,
            i32::from(raw.cb_tc_offset_div2) * 2,
            i32::from(raw.cr_tc_offset_div2) * 2,
        ],
    }
}
