//! 色度 QP 映射表构建.
//!
//! 每张表从第一个折点出发向下逐级减 1 (裁剪到 `-qp_bd_offset`),
//! 折点之间做整数线性插值, 最后一个折点之后逐级加 1 (裁剪到 63).

use vvc_core::math::clip;
use vvc_core::{VvcError, VvcResult};

use super::limits::MAX_POINTS_IN_QP_TABLE;
use super::raw::RawSps;

/// Cb / Cr / 联合 CbCr 三张色度 QP 映射表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromaQpTables {
    tables: [[i8; MAX_POINTS_IN_QP_TABLE]; 3],
    qp_bd_offset: i32,
}

impl Default for ChromaQpTables {
    fn default() -> Self {
        Self {
            tables: [[0; MAX_POINTS_IN_QP_TABLE]; 3],
            qp_bd_offset: 0,
        }
    }
}

impl ChromaQpTables {
    /// 由 SPS 原始字段构建映射表
    pub(super) fn build(raw: &RawSps, qp_bd_offset: i32, max_points: u32) -> VvcResult<Self> {
        let num_qp_tables = if raw.same_qp_table_for_chroma {
            1
        } else if raw.joint_cbcr_enabled {
            3
        } else {
            2
        };
        if raw.qp_tables.len() < num_qp_tables {
            return Err(VvcError::InvalidData(format!(
                "VVC: 色度 QP 表数量不足, need={}, got={}",
                num_qp_tables,
                raw.qp_tables.len()
            )));
        }

        let mut out = Self {
            tables: [[0; MAX_POINTS_IN_QP_TABLE]; 3],
            qp_bd_offset,
        };
        for (i, segment) in raw.qp_tables.iter().take(num_qp_tables).enumerate() {
            build_table(&mut out.tables[i], segment, qp_bd_offset, max_points, i)?;
        }
        if raw.same_qp_table_for_chroma {
            out.tables[1] = out.tables[0];
            out.tables[2] = out.tables[0];
        }
        Ok(out)
    }

    /// 查询映射后的色度 QP
    ///
    /// `table`: 0=Cb, 1=Cr, 2=联合 CbCr; `qp` 取值 `-qp_bd_offset..=63`.
    pub fn map(&self, table: usize, qp: i32) -> i32 {
        debug_assert!((-self.qp_bd_offset..=63).contains(&qp));
        i32::from(self.tables[table][(qp + self.qp_bd_offset) as usize])
    }

    /// 指定表的有效区间, 下标 0 对应 QP `-qp_bd_offset`
    pub fn table(&self, table: usize) -> &[i8] {
        &self.tables[table][..(64 + self.qp_bd_offset) as usize]
    }

    pub fn qp_bd_offset(&self) -> i32 {
        self.qp_bd_offset
    }
}

fn build_table(
    table: &mut [i8; MAX_POINTS_IN_QP_TABLE],
    segment: &super::raw::RawQpTable,
    off: i32,
    max_points: u32,
    table_idx: usize,
) -> VvcResult<()> {
    let num_points = segment.delta_qp_in_val_minus1.len();
    if num_points == 0
        || num_points != segment.delta_qp_diff_val.len()
        || num_points + 1 > max_points as usize
    {
        return Err(VvcError::InvalidData(format!(
            "VVC: 色度 QP 表折点数非法, table={}, points={}",
            table_idx, num_points
        )));
    }

    let start = i32::from(segment.qp_table_start_minus26) + 26;
    if start < -off || start > 63 {
        return Err(VvcError::InvalidData(format!(
            "VVC: qp_table_start 超出范围, table={}, start={}",
            table_idx, start
        )));
    }

    let mut qp_in = Vec::with_capacity(num_points + 1);
    let mut qp_out = Vec::with_capacity(num_points + 1);
    let mut delta_qp_in = Vec::with_capacity(num_points);
    qp_in.push(start);
    qp_out.push(start);
    for j in 0..num_points {
        let delta_out = i32::from(segment.delta_qp_in_val_minus1[j] ^ segment.delta_qp_diff_val[j]);
        let delta_in = i32::from(segment.delta_qp_in_val_minus1[j]) + 1;
        if qp_in[j] + delta_in > 63 || qp_out[j] + delta_out > 63 {
            return Err(VvcError::InvalidData(format!(
                "VVC: 色度 QP 表折点溢出, table={}, point={}, qp_in={}, qp_out={}",
                table_idx,
                j,
                qp_in[j] + delta_in,
                qp_out[j] + delta_out
            )));
        }
        delta_qp_in.push(delta_in);
        qp_in.push(qp_in[j] + delta_in);
        qp_out.push(qp_out[j] + delta_out);
    }

    // 所有写入值都落在 [-off, 63], 可以安全存入 i8
    let mut t = [0i32; MAX_POINTS_IN_QP_TABLE];
    let base = (qp_in[0] + off) as usize;
    t[base] = qp_out[0];
    for k in (0..base).rev() {
        t[k] = clip(t[k + 1] - 1, -off, 63);
    }

    for j in 0..num_points {
        let sh = delta_qp_in[j] >> 1;
        let knot = (qp_in[j] + off) as usize;
        let end = (qp_in[j + 1] + off) as usize;
        for (m, k) in (knot + 1..=end).enumerate() {
            let m = m as i32 + 1;
            t[k] = t[knot] + ((qp_out[j + 1] - qp_out[j]) * m + sh) / delta_qp_in[j];
        }
    }

    let last = (qp_in[num_points] + off) as usize;
    for k in last + 1..=(63 + off) as usize {
        t[k] = clip(t[k - 1] + 1, -off, 63);
    }

    for (dst, src) in table.iter_mut().zip(t.iter()) {
        *dst = *src as i8;
    }
    Ok(())
}
