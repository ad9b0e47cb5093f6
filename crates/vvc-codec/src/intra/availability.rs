//! 已重建区域登记与邻居可用性.
//!
//! 每个 slice 一个 [`LocalContext`], 只由解码该 slice 的线程持有:
//! - 按亮度 / 色度两种通道类型登记已完成重建的矩形区域
//! - 每个 CTU 开始时推导与左侧、上方 CTU 的 tile / slice / 子图像边界
//! - 回答 "从某点起向右 (向下) 有多少个连续可用样本" 的查询

use std::sync::Arc;

use bitflags::bitflags;
use log::debug;
use vvc_core::{VvcError, VvcResult};

use super::lmcs::LmcsCache;
use crate::ps::{Pps, SliceHeader, alloc_table};

bitflags! {
    /// 当前 CTU 与左侧 / 上方 CTU 之间跨越的边界
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CtbBoundary: u8 {
        const LEFT_TILE = 0x01;
        const LEFT_SLICE = 0x02;
        const LEFT_SUBPIC = 0x04;
        const UPPER_TILE = 0x08;
        const UPPER_SLICE = 0x10;
        const UPPER_SUBPIC = 0x20;
    }
}

impl Default for CtbBoundary {
    fn default() -> Self {
        Self::empty()
    }
}

/// 已重建的矩形区域, 坐标以所在平面的样本为单位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconstructedArea {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl ReconstructedArea {
    #[inline]
    fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }
}

/// 当前编码单元的邻居候选可用性
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeighbourAvailable {
    pub cand_left: bool,
    pub cand_up: bool,
    pub cand_up_left: bool,
    pub cand_up_right: bool,
    pub cand_up_right_sap: bool,
}

/// slice 级局部解码上下文
#[derive(Debug, Clone)]
pub struct LocalContext {
    pps: Arc<Pps>,
    /// 按 CTU 光栅地址标记是否属于当前 slice
    in_slice: Vec<bool>,
    subpic_idx: usize,
    /// `[亮度, 色度]` 两类通道的登记表, 按追加顺序
    ras: [Vec<ReconstructedArea>; 2],

    boundary: CtbBoundary,
    ctb_left: bool,
    ctb_up: bool,
    ctb_up_right: bool,
    ctb_up_left: bool,
    end_of_tiles_x: u32,
    end_of_tiles_y: u32,

    na: NeighbourAvailable,
    pub(super) lmcs: LmcsCache,
}

impl LocalContext {
    /// 为 slice 创建局部上下文
    pub fn new(pps: Arc<Pps>, sh: &SliceHeader) -> VvcResult<Self> {
        let in_slice = alloc_table(pps.size.ctb_count as usize, false, "slice CTU 位图")?;
        let mut lc = Self {
            end_of_tiles_x: pps.size.width,
            end_of_tiles_y: pps.size.height,
            pps,
            in_slice,
            subpic_idx: 0,
            ras: [Vec::new(), Vec::new()],
            boundary: CtbBoundary::empty(),
            ctb_left: false,
            ctb_up: false,
            ctb_up_right: false,
            ctb_up_left: false,
            na: NeighbourAvailable::default(),
            lmcs: LmcsCache::default(),
        };
        lc.begin_slice(sh)?;
        Ok(lc)
    }

    /// 切换到新 slice: 清空登记表与 LMCS 缓存, 重建 CTU 归属位图
    pub fn begin_slice(&mut self, sh: &SliceHeader) -> VvcResult<()> {
        let ctb_count = self.pps.size.ctb_count;
        let subpic_idx = usize::from(sh.raw.curr_subpic_idx);
        if subpic_idx >= self.pps.sps.subpics.len() {
            return Err(VvcError::InvalidData(format!(
                "VVC: curr_subpic_idx 超出范围, idx={}",
                subpic_idx
            )));
        }
        if let Some(&rs) = sh.ctb_addr_in_curr_slice.iter().find(|&&rs| rs >= ctb_count) {
            return Err(VvcError::InvalidData(format!(
                "VVC: slice CTU 地址超出图像, rs={}, ctb_count={}",
                rs, ctb_count
            )));
        }

        self.in_slice.fill(false);
        for &rs in &sh.ctb_addr_in_curr_slice {
            self.in_slice[rs as usize] = true;
        }
        self.subpic_idx = subpic_idx;
        for ras in &mut self.ras {
            ras.clear();
        }
        self.lmcs = LmcsCache::default();
        debug!(
            "VVC: 开始 slice, ctus={}, subpic={}",
            sh.ctb_addr_in_curr_slice.len(),
            subpic_idx
        );
        Ok(())
    }

    pub fn pps(&self) -> &Arc<Pps> {
        &self.pps
    }

    pub fn boundary(&self) -> CtbBoundary {
        self.boundary
    }

    pub fn neighbour_available(&self) -> NeighbourAvailable {
        self.na
    }

    /// 已登记的区域, `ch_type` 为 0 (亮度) 或 1 (色度)
    pub fn areas(&self, ch_type: usize) -> &[ReconstructedArea] {
        &self.ras[ch_type]
    }

    fn same_slice(&self, rs: u32) -> bool {
        self.in_slice[rs as usize]
    }

    /// 进入光栅地址为 `rs` 的 CTU, 推导边界标志与 tile 末端
    pub fn begin_ctu(&mut self, rs: u32) {
        let pps = &self.pps;
        let tiles = &pps.tiles;
        let ctb_width = pps.size.ctb_width;
        let ctb_log2 = pps.sps.ctb_log2_size_y();
        let ctb_size = pps.sps.partition.ctb_size_y;
        let rx = (rs % ctb_width) as usize;
        let ry = (rs / ctb_width) as usize;
        let x_ctb = (rx as u32) << ctb_log2;
        let y_ctb = (ry as u32) << ctb_log2;
        debug_assert!(self.same_slice(rs), "CTU 不属于当前 slice");

        self.end_of_tiles_x = pps.size.width;
        self.end_of_tiles_y = pps.size.height;
        if tiles.ctb_to_col_bd[rx] != tiles.ctb_to_col_bd[rx + 1] {
            self.end_of_tiles_x = (x_ctb + ctb_size).min(self.end_of_tiles_x);
        }
        if tiles.ctb_to_row_bd[ry] != tiles.ctb_to_row_bd[ry + 1] {
            self.end_of_tiles_y = (y_ctb + ctb_size).min(self.end_of_tiles_y);
        }

        let mut boundary = CtbBoundary::empty();
        if rx > 0 && tiles.ctb_to_col_bd[rx] != tiles.ctb_to_col_bd[rx - 1] {
            boundary |= CtbBoundary::LEFT_TILE;
        }
        if rx > 0 && !self.same_slice(rs - 1) {
            boundary |= CtbBoundary::LEFT_SLICE;
        }
        if ry > 0 && tiles.ctb_to_row_bd[ry] != tiles.ctb_to_row_bd[ry - 1] {
            boundary |= CtbBoundary::UPPER_TILE;
        }
        if ry > 0 && !self.same_slice(rs - ctb_width) {
            boundary |= CtbBoundary::UPPER_SLICE;
        }
        let subpic = &pps.sps.subpics[self.subpic_idx];
        if usize::from(subpic.ctu_top_left_x) == rx {
            boundary |= CtbBoundary::LEFT_SUBPIC;
        }
        if usize::from(subpic.ctu_top_left_y) == ry {
            boundary |= CtbBoundary::UPPER_SUBPIC;
        }

        let ctb_left = rx > 0
            && !boundary.intersects(CtbBoundary::LEFT_TILE | CtbBoundary::LEFT_SLICE);
        let ctb_up = ry > 0
            && !boundary.intersects(CtbBoundary::UPPER_TILE | CtbBoundary::UPPER_SLICE);
        let ctb_up_right = ctb_up
            && tiles.ctb_to_col_bd[rx] == tiles.ctb_to_col_bd[rx + 1]
            && tiles.ctb_to_row_bd[ry] == tiles.ctb_to_row_bd[ry - 1]
            && self.same_slice(rs - ctb_width + 1);
        let ctb_up_left = ctb_left && ctb_up && self.same_slice(rs - ctb_width - 1);

        self.boundary = boundary;
        self.ctb_left = ctb_left;
        self.ctb_up = ctb_up;
        self.ctb_up_right = ctb_up_right;
        self.ctb_up_left = ctb_up_left;
    }

    /// 推导位于 `(x0, y0)`、宽 `w` 的亮度块的邻居候选
    pub fn set_neighbour_available(&mut self, x0: u32, y0: u32, w: u32) {
        let ctb_log2 = self.pps.sps.ctb_log2_size_y();
        let mask = (1u32 << ctb_log2) - 1;
        let x0b = x0 & mask;
        let y0b = y0 & mask;

        let cand_up = self.ctb_up || y0b != 0;
        let cand_left = self.ctb_left || x0b != 0;
        let cand_up_left = if x0b != 0 || y0b != 0 {
            cand_left && cand_up
        } else {
            self.ctb_up_left
        };
        let cand_up_right_sap = if x0b + w == 1 << ctb_log2 {
            self.ctb_up_right && y0b == 0
        } else {
            cand_up
        };
        self.na = NeighbourAvailable {
            cand_left,
            cand_up,
            cand_up_left,
            cand_up_right_sap,
            cand_up_right: cand_up_right_sap && x0 + w < self.end_of_tiles_x,
        };
    }

    /// 登记已重建区域, 坐标为亮度样本, 色度按子采样换算
    pub fn add_reconstructed_area(&mut self, ch_type: usize, x0: u32, y0: u32, w: u32, h: u32) {
        let format = &self.pps.sps.format;
        let hs = format.hshift[ch_type];
        let vs = format.vshift[ch_type];
        self.ras[ch_type].push(ReconstructedArea {
            x: x0 >> hs,
            y: y0 >> vs,
            w: w >> hs,
            h: h >> vs,
        });
    }

    fn find_area(&self, ch_type: usize, x: u32, y: u32) -> Option<&ReconstructedArea> {
        self.ras[ch_type].iter().rev().find(|a| a.contains(x, y))
    }

    /// 从平面坐标 `(x, y)` 起, 上方一行中连续可用的样本数
    pub fn top_available(&self, x: u32, y: u32, target_size: u32, c_idx: usize) -> u32 {
        let format = &self.pps.sps.format;
        let hs = format.hshift[c_idx];
        let vs = format.vshift[c_idx];
        let log2_ctb_v = self.pps.sps.ctb_log2_size_y() - vs;
        let y0b = y & ((1 << log2_ctb_v) - 1);
        if (y0b == 0 && !self.ctb_up) || y == 0 {
            return 0;
        }

        let ch_type = usize::from(c_idx > 0);
        let max_x = self.end_of_tiles_x >> hs;
        let mut target = target_size.min(max_x.saturating_sub(x));
        let mut px = x;
        while target > 0 {
            let Some(a) = self.find_area(ch_type, px, y - 1) else {
                break;
            };
            let sz = target.min(a.x + a.w - px);
            px += sz;
            target -= sz;
        }
        px - x
    }

    /// 从平面坐标 `(x, y)` 起, 左侧一列中连续可用的样本数
    pub fn left_available(&self, x: u32, y: u32, target_size: u32, c_idx: usize) -> u32 {
        let format = &self.pps.sps.format;
        let hs = format.hshift[c_idx];
        let vs = format.vshift[c_idx];
        let log2_ctb_h = self.pps.sps.ctb_log2_size_y() - hs;
        let x0b = x & ((1 << log2_ctb_h) - 1);
        if (x0b == 0 && !self.ctb_left) || x == 0 {
            return 0;
        }

        let ch_type = usize::from(c_idx > 0);
        let max_y = self.end_of_tiles_y >> vs;
        let mut target = target_size.min(max_y.saturating_sub(y));
        let mut py = y;
        while target > 0 {
            let Some(a) = self.find_area(ch_type, x - 1, py) else {
                break;
            };
            let sz = target.min(a.y + a.h - py);
            py += sz;
            target -= sz;
        }
        py - y
    }
}
