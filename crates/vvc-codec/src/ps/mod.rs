//! VVC 参数集推导存储.
//!
//! 把上游语法解析器给出的原始 SPS/PPS/APS/PH/SH 字段记录推导为解码可用的数值状态.
//!
//! 存储规则:
//! - 推导结果以 `Arc` 共享, 发布后不可变, 替换时构建新值再换入槽位
//! - 相同原始记录重复推导是空操作
//! - 同一 CVS 内以不同内容重定义已使用的 SPS 视为错误, CLVSS 图像会清空使用记录
//! - 推导失败时槽位保留原有值

mod aps;
mod chroma_qp;
mod lmcs;
pub mod limits;
mod ph;
mod pps;
pub mod raw;
mod sh;
mod sps;


use std::sync::Arc;

use log::{debug, warn};
use vvc_core::{VvcError, VvcResult};

pub use aps::{Alf, ApsParamsType, ScalingList, diag_scan};
pub use chroma_qp::ChromaQpTables;
pub use limits::DerivationLimits;
pub use lmcs::{LMCS_MAX_BIT_DEPTH, LmcsTables};
pub use ph::{PictureHeader, PredWeightTable, RefList, WeightEntry, compute_poc};
pub use pps::{ChromaQpOffsets, PictureSize, Pps, SliceMap, SubpicRect, TileMap};
pub(crate) use pps::alloc_table;
pub use sh::{CHROMA, DeblockOffsets, LUMA, PartitionLimits, SliceHeader};
pub use sps::{Sps, SpsFormat, SpsInter, SpsPartition};

use limits::{MAX_ALF_COUNT, MAX_LMCS_COUNT, MAX_PPS_COUNT, MAX_SL_COUNT, MAX_SPS_COUNT};
use raw::{ApsPayload, NalUnitType, RawAps, RawLmcsData, RawPictureHeader, RawPps, RawSps};

impl ApsPayload {
    pub fn params_type(&self) -> ApsParamsType {
        match self {
            ApsPayload::Alf(_) => ApsParamsType::Alf,
            ApsPayload::Lmcs(_) => ApsParamsType::Lmcs,
            ApsPayload::ScalingList(_) => ApsParamsType::ScalingList,
        }
    }
}

/// 参数集存储
///
/// 只在单线程的码流单元解析阶段修改; 推导出的结构通过 `Arc` 供多个 slice 并发只读.
#[derive(Debug, Clone)]
pub struct ParamSets {
    limits: DerivationLimits,
    sps_list: [Option<Arc<Sps>>; MAX_SPS_COUNT],
    pps_list: Vec<Option<Arc<Pps>>>,
    alf_list: [Option<Arc<Alf>>; MAX_ALF_COUNT],
    lmcs_list: [Option<Arc<RawLmcsData>>; MAX_LMCS_COUNT],
    scaling_list: [Option<Arc<ScalingList>>; MAX_SL_COUNT],
    /// 当前 CVS 内已激活的 sps_id 位图
    sps_id_used: u16,
}

impl Default for ParamSets {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamSets {
    pub fn new() -> Self {
        Self::from_limits(DerivationLimits::default())
    }

    /// 以自定义上限创建存储, 上限本身不一致时返回 `InvalidArgument`
    pub fn with_limits(limits: DerivationLimits) -> VvcResult<Self> {
        limits.validate()?;
        Ok(Self::from_limits(limits))
    }

    fn from_limits(limits: DerivationLimits) -> Self {
        Self {
            limits,
            sps_list: Default::default(),
            pps_list: vec![None; MAX_PPS_COUNT],
            alf_list: Default::default(),
            lmcs_list: Default::default(),
            scaling_list: Default::default(),
            sps_id_used: 0,
        }
    }

    pub fn limits(&self) -> &DerivationLimits {
        &self.limits
    }

    pub fn sps(&self, id: usize) -> Option<&Arc<Sps>> {
        self.sps_list.get(id).and_then(Option::as_ref)
    }

    pub fn pps(&self, id: usize) -> Option<&Arc<Pps>> {
        self.pps_list.get(id).and_then(Option::as_ref)
    }

    pub fn alf(&self, id: usize) -> Option<&Arc<Alf>> {
        self.alf_list.get(id).and_then(Option::as_ref)
    }

    pub fn lmcs(&self, id: usize) -> Option<&Arc<RawLmcsData>> {
        self.lmcs_list.get(id).and_then(Option::as_ref)
    }

    pub fn scaling_list(&self, id: usize) -> Option<&Arc<ScalingList>> {
        self.scaling_list.get(id).and_then(Option::as_ref)
    }

    // ========================================================
    // SPS / PPS
    // ========================================================

    /// 推导并登记 SPS
    pub fn decode_sps(&mut self, raw: &RawSps, is_clvss: bool) -> VvcResult<Arc<Sps>> {
        let sps_id = raw.sps_id as usize;
        if sps_id >= MAX_SPS_COUNT {
            return Err(VvcError::InvalidData(format!(
                "VVC: sps_id 超出范围, sps_id={}",
                sps_id
            )));
        }
        if is_clvss {
            self.sps_id_used = 0;
        }

        if let Some(old) = &self.sps_list[sps_id] {
            if old.raw == *raw {
                return Ok(Arc::clone(old));
            }
            if self.sps_id_used & (1 << sps_id) != 0 {
                warn!("VVC: CVS 内 SPS 内容被改写, 拒绝, sps_id={}", sps_id);
                return Err(VvcError::InvalidData(format!(
                    "VVC: CVS 内不允许改写已使用的 SPS, sps_id={}",
                    sps_id
                )));
            }
        }

        let sps = Arc::new(Sps::derive(raw, &self.limits)?);
        if self.sps_list[sps_id].is_some() {
            debug!("VVC: 替换 SPS, sps_id={}", sps_id);
            for slot in &mut self.pps_list {
                if slot.as_ref().is_some_and(|p| p.raw.sps_id as usize == sps_id) {
                    *slot = None;
                }
            }
        }
        self.sps_list[sps_id] = Some(Arc::clone(&sps));
        self.sps_id_used |= 1 << sps_id;
        Ok(sps)
    }

    /// 推导并登记 PPS, 引用的 SPS 必须已登记
    pub fn decode_pps(&mut self, raw: &RawPps) -> VvcResult<Arc<Pps>> {
        let pps_id = raw.pps_id as usize;
        if pps_id >= MAX_PPS_COUNT {
            return Err(VvcError::InvalidData(format!(
                "VVC: pps_id 超出范围, pps_id={}",
                pps_id
            )));
        }
        let sps = self.sps(raw.sps_id as usize).cloned().ok_or_else(|| {
            VvcError::InvalidData(format!(
                "VVC: PPS 引用的 SPS 不存在, pps_id={}, sps_id={}",
                pps_id, raw.sps_id
            ))
        })?;

        if let Some(old) = &self.pps_list[pps_id]
            && old.raw == *raw
            && Arc::ptr_eq(&old.sps, &sps)
        {
            return Ok(Arc::clone(old));
        }

        let pps = match Pps::derive(raw, sps, &self.limits) {
            Ok(p) => Arc::new(p),
            Err(e) => {
                warn!("VVC: PPS 推导失败, pps_id={}, err={}", pps_id, e);
                return Err(e);
            }
        };
        if self.pps_list[pps_id].is_some() {
            debug!("VVC: 替换 PPS, pps_id={}", pps_id);
        }
        self.pps_list[pps_id] = Some(Arc::clone(&pps));
        Ok(pps)
    }

    /// 依次推导图像引用的 SPS 与 PPS
    pub fn decode_ps(&mut self, sps: &RawSps, pps: &RawPps, is_clvss: bool) -> VvcResult<Arc<Pps>> {
        if pps.sps_id != sps.sps_id {
            return Err(VvcError::InvalidData(format!(
                "VVC: PPS 与 SPS 不匹配, pps.sps_id={}, sps_id={}",
                pps.sps_id, sps.sps_id
            )));
        }
        self.decode_sps(sps, is_clvss)?;
        self.decode_pps(pps)
    }

    // ========================================================
    // APS
    // ========================================================

    /// 按 aps_params_type 分派 APS 内容
    pub fn decode_aps(&mut self, nal_type: NalUnitType, aps: &RawAps) -> VvcResult<()> {
        if !matches!(nal_type, NalUnitType::PrefixAps | NalUnitType::SuffixAps) {
            return Err(VvcError::InvalidArgument(format!(
                "VVC: 非 APS NAL 单元, nal_type={:?}",
                nal_type
            )));
        }
        let id = usize::from(aps.aps_id);
        let kind = aps.payload.params_type();
        let bound = match kind {
            ApsParamsType::Alf => MAX_ALF_COUNT,
            ApsParamsType::Lmcs => MAX_LMCS_COUNT,
            ApsParamsType::ScalingList => MAX_SL_COUNT,
        };
        if id >= bound {
            return Err(VvcError::InvalidData(format!(
                "VVC: aps_id 超出范围, type={:?}, aps_id={}",
                kind, id
            )));
        }

        match &aps.payload {
            ApsPayload::Alf(data) => self.alf_list[id] = Some(Arc::new(Alf::derive(data)?)),
            ApsPayload::Lmcs(data) => self.lmcs_list[id] = Some(Arc::new(data.clone())),
            ApsPayload::ScalingList(data) => {
                self.scaling_list[id] = Some(Arc::new(ScalingList::derive(data)?))
            }
        }
        debug!("VVC: APS 已登记, type={:?}, aps_id={}", kind, id);
        Ok(())
    }

    // ========================================================
    // 帧级参数集
    // ========================================================

    /// 绑定图像头引用的全部参数集
    pub fn decode_frame_ps(
        &self,
        raw_ph: &RawPictureHeader,
        poc_tid0: i32,
        is_clvss: bool,
    ) -> VvcResult<FrameParamSets> {
        let pps = self.pps(usize::from(raw_ph.pps_id)).cloned().ok_or_else(|| {
            VvcError::InvalidData(format!(
                "VVC: 图像头引用的 PPS 不存在, pps_id={}",
                raw_ph.pps_id
            ))
        })?;
        let sps = Arc::clone(&pps.sps);
        let ph = PictureHeader::derive(raw_ph, &sps, &pps, poc_tid0, is_clvss)?;

        let sl = if raw_ph.explicit_scaling_list_enabled {
            let id = usize::from(raw_ph.scaling_list_aps_id);
            Some(self.scaling_list(id).cloned().ok_or_else(|| {
                VvcError::InvalidData(format!("VVC: 缩放列表 APS 不存在, aps_id={}", id))
            })?)
        } else {
            None
        };

        let lmcs = if raw_ph.lmcs_enabled {
            let id = usize::from(raw_ph.lmcs_aps_id);
            let raw = self.lmcs(id).ok_or_else(|| {
                VvcError::InvalidData(format!("VVC: LMCS APS 不存在, aps_id={}", id))
            })?;
            Some(LmcsTables::derive(raw, sps.bit_depth())?)
        } else {
            None
        };

        debug!(
            "VVC: 帧参数集绑定完成, pps_id={}, poc={}, lmcs={}",
            raw_ph.pps_id,
            ph.poc,
            lmcs.is_some()
        );
        Ok(FrameParamSets {
            sps,
            pps,
            ph,
            lmcs,
            sl,
            alf_list: self.alf_list.clone(),
        })
    }
}

/// 单帧使用的参数集快照
#[derive(Debug, Clone)]
pub struct FrameParamSets {
    pub sps: Arc<Sps>,
    pub pps: Arc<Pps>,
    pub ph: PictureHeader,
    pub lmcs: Option<LmcsTables>,
    pub sl: Option<Arc<ScalingList>>,
    pub alf_list: [Option<Arc<Alf>>; MAX_ALF_COUNT],
}
