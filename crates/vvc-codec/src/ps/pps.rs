//! PPS 推导与空间寻址表.
//!
//! 负责图像尺寸 (样本 / CTU / 最小块单位)、tile 边界、CTU 到 tile 边界的查找表,
//! 以及按解码顺序排列的 slice CTU 地址表.

use std::sync::Arc;

use log::debug;
use vvc_core::math::ceil_rshift;
use vvc_core::{VvcError, VvcResult};

use super::limits::{DerivationLimits, MAX_PPS_COUNT};
use super::raw::{RawPps, RawRectSlice};
use super::sps::Sps;

/// 最小预测块 log2 尺寸
pub const MIN_PU_LOG2: u32 = 2;
/// 最小变换块 log2 尺寸
pub const MIN_TU_LOG2: u32 = 2;
/// CU 级色度 QP 偏移表长度
pub const MAX_CHROMA_QP_OFFSET_LIST: usize = 6;

// ============================================================
// 派生结构
// ============================================================

/// 图像尺寸 (各种单位)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PictureSize {
    pub width: u32,
    pub height: u32,
    pub ctb_width: u32,
    pub ctb_height: u32,
    pub ctb_count: u32,
    pub min_cb_width: u32,
    pub min_cb_height: u32,
    pub min_pu_width: u32,
    pub min_pu_height: u32,
    pub min_tu_width: u32,
    pub min_tu_height: u32,
    pub width32: u32,
    pub height32: u32,
    pub width64: u32,
    pub height64: u32,
}

/// tile 划分与 CTU 到 tile 边界的映射
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileMap {
    /// 每个 tile 列的宽度 (CTU)
    pub col_width: Vec<u32>,
    /// 每个 tile 行的高度 (CTU)
    pub row_height: Vec<u32>,
    /// tile 列起始 CTU 列, 末尾追加 `ctb_width`
    pub col_bd: Vec<u32>,
    /// tile 行起始 CTU 行, 末尾追加 `ctb_height`
    pub row_bd: Vec<u32>,
    /// CTU 列所在 tile 的起始列, 下标 `ctb_width` 处为 `ctb_width`
    pub ctb_to_col_bd: Vec<u32>,
    /// CTU 行所在 tile 的起始行, 下标 `ctb_height` 处为 `ctb_height`
    pub ctb_to_row_bd: Vec<u32>,
}

impl TileMap {
    pub fn num_tile_columns(&self) -> usize {
        self.col_width.len()
    }

    pub fn num_tile_rows(&self) -> usize {
        self.row_height.len()
    }

    pub fn num_tiles(&self) -> usize {
        self.col_width.len() * self.row_height.len()
    }

    /// tile 光栅序号转换为 (列, 行)
    pub fn tile_xy(&self, tile_idx: usize) -> (usize, usize) {
        let cols = self.num_tile_columns();
        (tile_idx % cols, tile_idx / cols)
    }
}

/// slice 的 CTU 地址表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceMap {
    /// 按解码顺序排列的 CTU 光栅地址, 覆盖整幅图像
    pub ctb_addr_in_slice: Vec<u32>,
    /// 矩形 slice 在 `ctb_addr_in_slice` 中的起始偏移
    pub slice_start_offset: Vec<u32>,
    /// 矩形 slice 的 CTU 数
    pub num_ctus_in_slice: Vec<u32>,
    /// 每个子图像包含的矩形 slice 数
    pub num_slices_in_subpic: Vec<u32>,
}

impl SliceMap {
    pub fn num_slices(&self) -> usize {
        self.num_ctus_in_slice.len()
    }
}

/// 色度 QP 偏移 (Cb, Cr, 联合 CbCr)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChromaQpOffsets {
    pub offset: [i32; 3],
    pub list: [[i32; 3]; MAX_CHROMA_QP_OFFSET_LIST],
}

/// 子图像矩形 (亮度样本)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubpicRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// 推导后的 PPS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pps {
    pub raw: RawPps,
    /// 推导时引用的 SPS
    pub sps: Arc<Sps>,
    pub size: PictureSize,
    pub tiles: TileMap,
    pub slices: SliceMap,
    pub chroma_qp_offset: ChromaQpOffsets,
    pub ref_wraparound_offset: i32,
    pub subpic_rects: Vec<SubpicRect>,
}

impl Pps {
    /// 基于已推导的 SPS 推导 PPS
    pub fn derive(raw: &RawPps, sps: Arc<Sps>, limits: &DerivationLimits) -> VvcResult<Self> {
        if raw.pps_id as usize >= MAX_PPS_COUNT {
            return Err(VvcError::InvalidData(format!(
                "VVC: pps_id 超出范围, pps_id={}",
                raw.pps_id
            )));
        }
        if raw.sps_id as usize != sps.id() {
            return Err(VvcError::Internal(format!(
                "VVC: PPS 引用的 SPS 不匹配, pps.sps_id={}, sps_id={}",
                raw.sps_id,
                sps.id()
            )));
        }
        let chroma_qp_offset = derive_chroma_qp_offset(raw, &sps)?;
        let size = derive_size(raw, &sps)?;
        let tiles = derive_tiles(raw, &size, limits)?;
        let slices = derive_slices(raw, &sps, &size, &tiles, limits)?;
        let ref_wraparound_offset = if raw.ref_wraparound_enabled {
            (size.width / sps.partition.min_cb_size_y) as i32
                - i32::from(raw.pic_width_minus_wraparound_offset)
        } else {
            0
        };
        let subpic_rects = derive_subpic_rects(&sps, &size);

        debug!(
            "VVC: PPS 推导完成, pps_id={}, {}x{}, tiles={}x{}, slices={}",
            raw.pps_id,
            size.width,
            size.height,
            tiles.num_tile_columns(),
            tiles.num_tile_rows(),
            slices.num_slices()
        );

        Ok(Self {
            raw: raw.clone(),
            sps,
            size,
            tiles,
            slices,
            chroma_qp_offset,
            ref_wraparound_offset,
            subpic_rects,
        })
    }

    pub fn id(&self) -> usize {
        self.raw.pps_id as usize
    }

    pub fn ctb_width(&self) -> u32 {
        self.size.ctb_width
    }

    pub fn ctb_height(&self) -> u32 {
        self.size.ctb_height
    }

    /// 给定 CTU 光栅地址所属的子图像下标
    pub fn subpic_of_ctb(&self, ctb_addr: u32) -> Option<usize> {
        let rx = ctb_addr % self.size.ctb_width;
        let ry = ctb_addr / self.size.ctb_width;
        self.sps.subpics.iter().position(|s| {
            let x0 = u32::from(s.ctu_top_left_x);
            let y0 = u32::from(s.ctu_top_left_y);
            (x0..=x0 + u32::from(s.width_minus1)).contains(&rx)
                && (y0..=y0 + u32::from(s.height_minus1)).contains(&ry)
        })
    }
}

/// 以 `try_reserve_exact` 分配并填充表
pub(crate) fn alloc_table<T: Clone>(len: usize, value: T, what: &str) -> VvcResult<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|_| {
        VvcError::OutOfMemory(format!("VVC: {} 分配失败, len={}", what, len))
    })?;
    v.resize(len, value);
    Ok(v)
}

// ============================================================
// 基础字段
// ============================================================

fn derive_chroma_qp_offset(raw: &RawPps, sps: &Sps) -> VvcResult<ChromaQpOffsets> {
    let in_range = |v: i8| (-12..=12).contains(&v);
    if !in_range(raw.cb_qp_offset)
        || !in_range(raw.cr_qp_offset)
        || !in_range(raw.joint_cbcr_qp_offset_value)
    {
        return Err(VvcError::InvalidData(format!(
            "VVC: 色度 QP 偏移超出范围, cb={}, cr={}, joint={}",
            raw.cb_qp_offset, raw.cr_qp_offset, raw.joint_cbcr_qp_offset_value
        )));
    }
    if raw.cu_chroma_qp_offset_list.len() > MAX_CHROMA_QP_OFFSET_LIST {
        return Err(VvcError::InvalidData(format!(
            "VVC: cu_chroma_qp_offset_list 过长, len={}",
            raw.cu_chroma_qp_offset_list.len()
        )));
    }
    let init_qp = i32::from(raw.init_qp_minus26) + 26;
    if init_qp < -sps.format.qp_bd_offset || init_qp > 63 {
        return Err(VvcError::InvalidData(format!(
            "VVC: pps_init_qp 超出范围, init_qp={}",
            init_qp
        )));
    }

    let mut out = ChromaQpOffsets {
        offset: [
            i32::from(raw.cb_qp_offset),
            i32::from(raw.cr_qp_offset),
            i32::from(raw.joint_cbcr_qp_offset_value),
        ],
        ..Default::default()
    };
    for (dst, src) in out.list.iter_mut().zip(&raw.cu_chroma_qp_offset_list) {
        *dst = [
            i32::from(src.cb),
            i32::from(src.cr),
            i32::from(src.joint_cbcr),
        ];
    }
    Ok(out)
}

fn derive_size(raw: &RawPps, sps: &Sps) -> VvcResult<PictureSize> {
    let width = u32::from(raw.pic_width_in_luma_samples);
    let height = u32::from(raw.pic_height_in_luma_samples);
    let align = sps.partition.min_cb_size_y.max(8);
    if width == 0
        || height == 0
        || width > u32::from(sps.raw.pic_width_max_in_luma_samples)
        || height > u32::from(sps.raw.pic_height_max_in_luma_samples)
        || width % align != 0
        || height % align != 0
    {
        return Err(VvcError::InvalidData(format!(
            "VVC: PPS 图像尺寸非法, {}x{}, max={}x{}, align={}",
            width,
            height,
            sps.raw.pic_width_max_in_luma_samples,
            sps.raw.pic_height_max_in_luma_samples,
            align
        )));
    }

    let ctb_log2 = sps.partition.ctb_log2_size_y;
    let min_cb_log2 = sps.partition.min_cb_log2_size_y;
    let ctb_width = ceil_rshift(width, ctb_log2);
    let ctb_height = ceil_rshift(height, ctb_log2);
    Ok(PictureSize {
        width,
        height,
        ctb_width,
        ctb_height,
        ctb_count: ctb_width * ctb_height,
        min_cb_width: width >> min_cb_log2,
        min_cb_height: height >> min_cb_log2,
        min_pu_width: width >> MIN_PU_LOG2,
        min_pu_height: height >> MIN_PU_LOG2,
        min_tu_width: width >> MIN_TU_LOG2,
        min_tu_height: height >> MIN_TU_LOG2,
        width32: ceil_rshift(width, 5),
        height32: ceil_rshift(height, 5),
        width64: ceil_rshift(width, 6),
        height64: ceil_rshift(height, 6),
    })
}

// ============================================================
// tile 划分
// ============================================================

/// 显式尺寸之后以最后一个显式尺寸均匀切分剩余部分, 不足一份的余数单独成段
fn expand_uniform(explicit: &[u16], total: u32, what: &str) -> VvcResult<Vec<u32>> {
    if explicit.is_empty() {
        return Err(VvcError::InvalidData(format!("VVC: {} 缺少显式尺寸", what)));
    }
    let mut out = Vec::with_capacity(explicit.len());
    let mut remaining = total;
    for &e in explicit {
        let s = u32::from(e) + 1;
        if s > remaining {
            return Err(VvcError::InvalidData(format!(
                "VVC: {} 超出范围, size={}, remaining={}",
                what, s, remaining
            )));
        }
        out.push(s);
        remaining -= s;
    }
    let uniform = out[out.len() - 1];
    while remaining >= uniform {
        out.push(uniform);
        remaining -= uniform;
    }
    if remaining > 0 {
        out.push(remaining);
    }
    Ok(out)
}

fn fill_bd(sizes: &[u32], ctb_len: u32, what: &str) -> VvcResult<(Vec<u32>, Vec<u32>)> {
    let mut bd = alloc_table(sizes.len() + 1, 0u32, what)?;
    let mut ctb_to_bd = alloc_table(ctb_len as usize + 1, 0u32, what)?;
    let mut j = 0u32;
    for (i, &s) in sizes.iter().enumerate() {
        bd[i] = j;
        for k in j..j + s {
            ctb_to_bd[k as usize] = j;
        }
        j += s;
    }
    bd[sizes.len()] = ctb_len;
    ctb_to_bd[ctb_len as usize] = ctb_len;
    Ok((bd, ctb_to_bd))
}

fn derive_tiles(
    raw: &RawPps,
    size: &PictureSize,
    limits: &DerivationLimits,
) -> VvcResult<TileMap> {
    let (col_width, row_height) = if raw.no_pic_partition {
        (vec![size.ctb_width], vec![size.ctb_height])
    } else {
        (
            expand_uniform(&raw.tile_column_width_minus1, size.ctb_width, "tile 列宽")?,
            expand_uniform(&raw.tile_row_height_minus1, size.ctb_height, "tile 行高")?,
        )
    };
    let num_tiles = col_width.len() * row_height.len();
    if num_tiles > limits.max_tiles as usize {
        return Err(VvcError::InvalidData(format!(
            "VVC: tile 数超出上限, tiles={}, max={}",
            num_tiles, limits.max_tiles
        )));
    }

    let (col_bd, ctb_to_col_bd) = fill_bd(&col_width, size.ctb_width, "col_bd")?;
    let (row_bd, ctb_to_row_bd) = fill_bd(&row_height, size.ctb_height, "row_bd")?;
    Ok(TileMap {
        col_width,
        row_height,
        col_bd,
        row_bd,
        ctb_to_col_bd,
        ctb_to_row_bd,
    })
}

// ============================================================
// slice 地址表
// ============================================================

struct SliceBuilder<'a> {
    tiles: &'a TileMap,
    ctb_width: u32,
    map: SliceMap,
}

impl SliceBuilder<'_> {
    /// 按光栅顺序追加一块 CTU 矩形, 返回追加个数
    fn add_ctus(&mut self, rx: u32, ry: u32, w: u32, h: u32) -> u32 {
        for y in ry..ry + h {
            for x in rx..rx + w {
                self.map.ctb_addr_in_slice.push(self.ctb_width * y + x);
            }
        }
        w * h
    }

    fn add_tile(&mut self, tx: usize, ty: usize) -> u32 {
        let t = self.tiles;
        self.add_ctus(t.col_bd[tx], t.row_bd[ty], t.col_width[tx], t.row_height[ty])
    }

    fn begin_slice(&mut self) {
        let off = self.map.ctb_addr_in_slice.len() as u32;
        self.map.slice_start_offset.push(off);
        self.map.num_ctus_in_slice.push(0);
    }

    fn add_to_slice(&mut self, n: u32) {
        if let Some(last) = self.map.num_ctus_in_slice.last_mut() {
            *last += n;
        }
    }

    fn add_tiles_to_slice(&mut self, tx: usize, ty: usize, x_end: usize, y_end: usize) {
        for ty in ty..y_end {
            for tx in tx..x_end {
                let n = self.add_tile(tx, ty);
                self.add_to_slice(n);
            }
        }
    }
}

fn derive_slices(
    raw: &RawPps,
    sps: &Sps,
    size: &PictureSize,
    tiles: &TileMap,
    limits: &DerivationLimits,
) -> VvcResult<SliceMap> {
    let mut b = SliceBuilder {
        tiles,
        ctb_width: size.ctb_width,
        map: SliceMap::default(),
    };
    b.map
        .ctb_addr_in_slice
        .try_reserve_exact(size.ctb_count as usize)
        .map_err(|_| {
            VvcError::OutOfMemory(format!(
                "VVC: ctb_addr_in_slice 分配失败, len={}",
                size.ctb_count
            ))
        })?;

    if !raw.rect_slice {
        b.add_tiles_to_slice(0, 0, tiles.num_tile_columns(), tiles.num_tile_rows());
        b.map.num_ctus_in_slice.clear();
    } else if raw.single_slice_per_subpic {
        single_slice_per_subpic(&mut b, sps)?;
    } else {
        rect_slices(&mut b, raw, limits)?;
    }

    if b.map.ctb_addr_in_slice.len() != size.ctb_count as usize {
        return Err(VvcError::InvalidData(format!(
            "VVC: slice 覆盖的 CTU 数与图像不符, covered={}, ctb_count={}",
            b.map.ctb_addr_in_slice.len(),
            size.ctb_count
        )));
    }

    let mut map = b.map;
    if raw.rect_slice {
        map.num_slices_in_subpic = vec![0; sps.subpics.len()];
        for &off in &map.slice_start_offset {
            let addr = map.ctb_addr_in_slice[off as usize];
            let (rx, ry) = (addr % size.ctb_width, addr / size.ctb_width);
            if let Some(j) = sps.subpics.iter().position(|s| {
                let x0 = u32::from(s.ctu_top_left_x);
                let y0 = u32::from(s.ctu_top_left_y);
                rx >= x0
                    && rx <= x0 + u32::from(s.width_minus1)
                    && ry >= y0
                    && ry <= y0 + u32::from(s.height_minus1)
            }) {
                map.num_slices_in_subpic[j] += 1;
            }
        }
    }
    Ok(map)
}

fn single_slice_per_subpic(b: &mut SliceBuilder<'_>, sps: &Sps) -> VvcResult<()> {
    let tiles = b.tiles;
    if !sps.raw.subpic_info_present {
        b.begin_slice();
        b.add_tiles_to_slice(0, 0, tiles.num_tile_columns(), tiles.num_tile_rows());
        return Ok(());
    }

    for (i, s) in sps.subpics.iter().enumerate() {
        let rx = u32::from(s.ctu_top_left_x);
        let ry = u32::from(s.ctu_top_left_y);
        let w = u32::from(s.width_minus1) + 1;
        let h = u32::from(s.height_minus1) + 1;
        let mismatch = || {
            VvcError::InvalidData(format!(
                "VVC: 子图像边界与 tile 边界不对齐, subpic={}, x={}, y={}",
                i, rx, ry
            ))
        };
        let tx = tiles.col_bd.iter().position(|&c| c == rx).ok_or_else(mismatch)?;
        let ty = tiles.row_bd[..tiles.num_tile_rows()]
            .iter()
            .rposition(|&r| r <= ry)
            .ok_or_else(mismatch)?;

        b.begin_slice();
        if ry + h <= tiles.row_bd[ty + 1] && h < tiles.row_height[ty] {
            // 子图像小于一个 tile: 按子图像自身的起始行取 CTU
            let n = b.add_ctus(rx, ry, tiles.col_width[tx], h);
            b.add_to_slice(n);
        } else {
            if tiles.row_bd[ty] != ry {
                return Err(mismatch());
            }
            let x_end = tiles
                .col_bd
                .iter()
                .position(|&c| c == rx + w)
                .ok_or_else(mismatch)?;
            let y_end = tiles
                .row_bd
                .iter()
                .position(|&r| r == ry + h)
                .ok_or_else(mismatch)?;
            b.add_tiles_to_slice(tx, ty, x_end, y_end);
        }
    }
    Ok(())
}

fn next_tile_idx(
    tile_idx: usize,
    rs: &RawRectSlice,
    delta_present: bool,
    num_cols: usize,
) -> VvcResult<usize> {
    if delta_present {
        let next = tile_idx as i64 + i64::from(rs.tile_idx_delta_val);
        if next < 0 {
            return Err(VvcError::InvalidData(format!(
                "VVC: tile_idx_delta 导致 tile 下标为负, tile_idx={}, delta={}",
                tile_idx, rs.tile_idx_delta_val
            )));
        }
        return Ok(next as usize);
    }
    let mut next = tile_idx + usize::from(rs.slice_width_in_tiles_minus1) + 1;
    if next % num_cols == 0 {
        next += usize::from(rs.slice_height_in_tiles_minus1) * num_cols;
    }
    Ok(next)
}

fn rect_slices(
    b: &mut SliceBuilder<'_>,
    raw: &RawPps,
    limits: &DerivationLimits,
) -> VvcResult<()> {
    let tiles = b.tiles;
    let num_slices = usize::from(raw.num_slices_in_pic_minus1) + 1;
    if num_slices > limits.max_slices as usize || raw.rect_slices.len() < num_slices {
        return Err(VvcError::InvalidData(format!(
            "VVC: 矩形 slice 数非法, num_slices={}, signalled={}",
            num_slices,
            raw.rect_slices.len()
        )));
    }

    let num_cols = tiles.num_tile_columns();
    let mut tile_idx = 0usize;
    let mut i = 0usize;
    while i < num_slices {
        if tile_idx >= tiles.num_tiles() {
            return Err(VvcError::InvalidData(format!(
                "VVC: slice 引用不存在的 tile, slice={}, tile_idx={}",
                i, tile_idx
            )));
        }
        let (tx, ty) = tiles.tile_xy(tile_idx);
        let rs = &raw.rect_slices[i];
        if rs.slice_width_in_tiles_minus1 == 0 && rs.slice_height_in_tiles_minus1 == 0 {
            let tile_h = tiles.row_height[ty];
            let heights = if rs.exp_slice_height_in_ctus_minus1.is_empty() {
                vec![tile_h]
            } else {
                expand_uniform(&rs.exp_slice_height_in_ctus_minus1, tile_h, "slice 高度")?
            };
            if i + heights.len() > num_slices {
                return Err(VvcError::InvalidData(format!(
                    "VVC: tile 内 slice 数超出总 slice 数, slice={}, in_tile={}, total={}",
                    i,
                    heights.len(),
                    num_slices
                )));
            }
            let mut ry = tiles.row_bd[ty];
            for &h in &heights {
                b.begin_slice();
                let n = b.add_ctus(tiles.col_bd[tx], ry, tiles.col_width[tx], h);
                b.add_to_slice(n);
                ry += h;
            }
            i += heights.len() - 1;
        } else {
            let x_end = tx + usize::from(rs.slice_width_in_tiles_minus1) + 1;
            let y_end = ty + usize::from(rs.slice_height_in_tiles_minus1) + 1;
            if x_end > num_cols || y_end > tiles.num_tile_rows() {
                return Err(VvcError::InvalidData(format!(
                    "VVC: slice 超出 tile 网格, slice={}, x_end={}, y_end={}",
                    i, x_end, y_end
                )));
            }
            b.begin_slice();
            b.add_tiles_to_slice(tx, ty, x_end, y_end);
        }

        if i + 1 < num_slices {
            tile_idx = next_tile_idx(tile_idx, &raw.rect_slices[i], raw.tile_idx_delta_present, num_cols)?;
        }
        i += 1;
    }
    Ok(())
}

fn derive_subpic_rects(sps: &Sps, size: &PictureSize) -> Vec<SubpicRect> {
    let ctb_log2 = sps.partition.ctb_log2_size_y;
    sps.subpics
        .iter()
        .map(|s| {
            if s.treated_as_pic {
                let x = (u32::from(s.ctu_top_left_x) << ctb_log2).min(size.width);
                let y = (u32::from(s.ctu_top_left_y) << ctb_log2).min(size.height);
                SubpicRect {
                    x,
                    y,
                    width: (size.width - x).min((u32::from(s.width_minus1) + 1) << ctb_log2),
                    height: (size.height - y).min((u32::from(s.height_minus1) + 1) << ctb_log2),
                }
            } else {
                SubpicRect {
                    x: 0,
                    y: 0,
                    width: size.width,
                    height: size.height,
                }
            }
        })
        .collect()
}
