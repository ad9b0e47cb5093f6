//! 原始参数集字段记录.
//!
//! 上游语法解析器已把码流符号解码为原生整数并完成标准规定的推断,
//! 这里只承载字段, 不做任何推导. 字段命名与 H.266 语法元素保持一致
//! (去掉 `sps_`/`pps_`/`ph_`/`sh_` 前缀).

/// 子图像布局 (CTU 单位)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSubpic {
    pub ctu_top_left_x: u16,
    pub ctu_top_left_y: u16,
    pub width_minus1: u16,
    pub height_minus1: u16,
    pub treated_as_pic: bool,
}

/// 单个色度 QP 映射表的折点描述
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawQpTable {
    pub qp_table_start_minus26: i8,
    /// 长度即 `num_points_in_qp_table_minus1 + 1`
    pub delta_qp_in_val_minus1: Vec<u8>,
    pub delta_qp_diff_val: Vec<u8>,
}

/// LADF (亮度自适应去块) 区间
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLadf {
    pub num_ladf_intervals_minus2: u8,
    pub lowest_interval_qp_offset: i8,
    pub qp_offset: Vec<i8>,
    pub delta_threshold_minus1: Vec<u16>,
}

/// 原始 SPS
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSps {
    pub sps_id: u8,
    pub chroma_format_idc: u8,
    pub log2_ctu_size_minus5: u8,
    pub pic_width_max_in_luma_samples: u16,
    pub pic_height_max_in_luma_samples: u16,

    pub subpic_info_present: bool,
    /// 长度即 `num_subpics_minus1 + 1`
    pub subpics: Vec<RawSubpic>,

    pub bitdepth_minus8: u8,
    pub extended_precision: bool,
    pub entropy_coding_sync_enabled: bool,
    pub entry_point_offsets_present: bool,
    pub log2_max_pic_order_cnt_lsb_minus4: u8,

    pub log2_min_luma_coding_block_size_minus2: u8,
    pub max_luma_transform_size_64: bool,
    pub log2_transform_skip_max_size_minus2: u8,

    pub joint_cbcr_enabled: bool,
    pub same_qp_table_for_chroma: bool,
    pub qp_tables: Vec<RawQpTable>,

    pub alf_enabled: bool,
    pub ccalf_enabled: bool,
    pub lmcs_enabled: bool,
    pub explicit_scaling_list_enabled: bool,
    pub chroma_vertical_collocated: bool,

    pub six_minus_max_num_merge_cand: u8,
    pub sbtmvp_enabled: bool,
    pub affine_enabled: bool,
    pub five_minus_max_num_subblock_merge_cand: u8,
    pub gpm_enabled: bool,
    pub max_num_merge_cand_minus_max_num_gpm_cand: u8,
    pub log2_parallel_merge_level_minus2: u8,
    pub ibc_enabled: bool,
    pub six_minus_max_num_ibc_merge_cand: u8,

    pub ladf: Option<RawLadf>,
}

/// 矩形 slice 的布局描述 (按 PPS 语法循环的下标排列)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRectSlice {
    pub slice_width_in_tiles_minus1: u16,
    pub slice_height_in_tiles_minus1: u16,
    /// tile 内部 slice 的显式高度, 为空表示整 tile 一个 slice
    pub exp_slice_height_in_ctus_minus1: Vec<u16>,
    pub tile_idx_delta_val: i16,
}

/// CU 级色度 QP 偏移表项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawChromaQpOffset {
    pub cb: i8,
    pub cr: i8,
    pub joint_cbcr: i8,
}

/// 原始 PPS
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPps {
    pub pps_id: u8,
    pub sps_id: u8,
    pub pic_width_in_luma_samples: u16,
    pub pic_height_in_luma_samples: u16,

    pub no_pic_partition: bool,
    /// 显式列宽, 长度即 `num_exp_tile_columns_minus1 + 1`
    pub tile_column_width_minus1: Vec<u16>,
    /// 显式行高, 长度即 `num_exp_tile_rows_minus1 + 1`
    pub tile_row_height_minus1: Vec<u16>,

    pub rect_slice: bool,
    pub single_slice_per_subpic: bool,
    pub num_slices_in_pic_minus1: u16,
    pub tile_idx_delta_present: bool,
    pub rect_slices: Vec<RawRectSlice>,

    pub init_qp_minus26: i8,
    pub cb_qp_offset: i8,
    pub cr_qp_offset: i8,
    pub joint_cbcr_qp_offset_value: i8,
    pub cu_chroma_qp_offset_list: Vec<RawChromaQpOffset>,

    pub weighted_pred: bool,
    pub weighted_bipred: bool,
    pub qp_delta_info_in_ph: bool,
    pub wp_info_in_ph: bool,

    pub ref_wraparound_enabled: bool,
    pub pic_width_minus_wraparound_offset: u16,
}

/// 单个参考表项的加权预测字段
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawPredWeightEntry {
    pub luma_weight_flag: bool,
    pub delta_luma_weight: i8,
    pub luma_offset: i8,
    pub chroma_weight_flag: bool,
    pub delta_chroma_weight: [i8; 2],
    pub delta_chroma_offset: [i16; 2],
}

/// 原始加权预测表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPredWeightTable {
    pub luma_log2_weight_denom: u8,
    pub delta_chroma_log2_weight_denom: i8,
    pub l0: Vec<RawPredWeightEntry>,
    pub l1: Vec<RawPredWeightEntry>,
}

/// 一组划分约束 (帧内亮度 / 帧内色度 / 帧间)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawPartitionConstraints {
    pub log2_diff_min_qt_min_cb: u8,
    pub max_mtt_hierarchy_depth: u8,
    pub log2_diff_max_bt_min_qt: u8,
    pub log2_diff_max_tt_min_qt: u8,
}

/// 图像头与 slice 头共享的 ALF APS 引用
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAlfRefs {
    pub enabled: bool,
    pub aps_id_luma: Vec<u8>,
    pub cb_enabled: bool,
    pub cr_enabled: bool,
    pub aps_id_chroma: u8,
    pub cc_cb_enabled: bool,
    pub cc_cb_aps_id: u8,
    pub cc_cr_enabled: bool,
    pub cc_cr_aps_id: u8,
}

/// 原始图像头
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPictureHeader {
    pub pps_id: u8,
    pub pic_order_cnt_lsb: u16,
    pub poc_msb_cycle_present: bool,
    pub poc_msb_cycle_val: u32,
    pub recovery_poc_cnt: u16,

    pub lmcs_enabled: bool,
    pub lmcs_aps_id: u8,
    pub chroma_residual_scale: bool,
    pub explicit_scaling_list_enabled: bool,
    pub scaling_list_aps_id: u8,
    pub alf: RawAlfRefs,

    pub temporal_mvp_enabled: bool,
    pub qp_delta: i8,

    pub intra_luma: RawPartitionConstraints,
    pub intra_chroma: RawPartitionConstraints,
    pub inter: RawPartitionConstraints,
    pub cu_qp_delta_subdiv_intra_slice: u8,
    pub cu_qp_delta_subdiv_inter_slice: u8,
    pub cu_chroma_qp_offset_subdiv_intra_slice: u8,
    pub cu_chroma_qp_offset_subdiv_inter_slice: u8,

    pub pred_weight_table: RawPredWeightTable,
}

/// slice 类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SliceType {
    B,
    P,
    #[default]
    I,
}

/// 原始 slice 头
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSliceHeader {
    /// 已由 sh_subpic_id 解析得到的子图像下标
    pub curr_subpic_idx: u16,
    pub slice_address: u16,
    pub num_tiles_in_slice_minus1: u16,
    pub slice_type: SliceType,
    pub alf: RawAlfRefs,
    pub qp_delta: i8,

    pub deblocking_filter_disabled: bool,
    pub luma_beta_offset_div2: i8,
    pub luma_tc_offset_div2: i8,
    pub cb_beta_offset_div2: i8,
    pub cb_tc_offset_div2: i8,
    pub cr_beta_offset_div2: i8,
    pub cr_tc_offset_div2: i8,

    pub pred_weight_table: RawPredWeightTable,
}

/// 携带 APS 的 NAL 单元类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NalUnitType {
    PrefixAps,
    SuffixAps,
    /// 其他 NAL 类型的原始编号
    Other(u8),
}

/// ALF 滤波器个数与系数个数
pub const ALF_NUM_FILTERS_LUMA: usize = 25;
pub const ALF_NUM_COEFF_LUMA: usize = 12;
pub const ALF_NUM_FILTERS_CHROMA: usize = 8;
pub const ALF_NUM_COEFF_CHROMA: usize = 6;
pub const ALF_NUM_FILTERS_CC: usize = 4;
pub const ALF_NUM_COEFF_CC: usize = 7;

/// 原始 ALF APS 内容
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAlfData {
    pub luma_filter_signal: bool,
    pub luma_coeff_delta_idx: [u8; ALF_NUM_FILTERS_LUMA],
    /// 按信令顺序排列的亮度滤波器, 由 `luma_coeff_delta_idx` 引用
    pub luma_coeff_abs: Vec<[u8; ALF_NUM_COEFF_LUMA]>,
    pub luma_coeff_sign: Vec<[u8; ALF_NUM_COEFF_LUMA]>,
    pub luma_clip_idx: Vec<[u8; ALF_NUM_COEFF_LUMA]>,

    pub chroma_filter_signal: bool,
    pub chroma_coeff_abs: Vec<[u8; ALF_NUM_COEFF_CHROMA]>,
    pub chroma_coeff_sign: Vec<[u8; ALF_NUM_COEFF_CHROMA]>,
    pub chroma_clip_idx: Vec<[u8; ALF_NUM_COEFF_CHROMA]>,

    pub cc_cb_filter_signal: bool,
    pub cc_cb_mapped_coeff_abs: Vec<[u8; ALF_NUM_COEFF_CC]>,
    pub cc_cb_coeff_sign: Vec<[u8; ALF_NUM_COEFF_CC]>,
    pub cc_cr_filter_signal: bool,
    pub cc_cr_mapped_coeff_abs: Vec<[u8; ALF_NUM_COEFF_CC]>,
    pub cc_cr_coeff_sign: Vec<[u8; ALF_NUM_COEFF_CC]>,
}

/// LMCS 分段数
pub const LMCS_MAX_BIN_SIZE: usize = 16;

/// 原始 LMCS APS 内容
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLmcsData {
    pub min_bin_idx: u8,
    pub delta_max_bin_idx: u8,
    pub delta_abs_cw: [u16; LMCS_MAX_BIN_SIZE],
    pub delta_sign_cw: [bool; LMCS_MAX_BIN_SIZE],
    pub delta_abs_crs: u8,
    pub delta_sign_crs: bool,
}

/// 缩放列表个数
pub const SL_MAX_ID: usize = 28;
/// 16x16 及以上列表 (带 DC) 的起始编号
pub const SL_START_16X16: usize = 14;

/// 原始缩放列表 APS 内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawScalingListData {
    pub chroma_present: bool,
    pub copy_mode: [bool; SL_MAX_ID],
    pub pred_mode: [bool; SL_MAX_ID],
    pub pred_id_delta: [u8; SL_MAX_ID],
    pub dc_coef: [i16; SL_MAX_ID - SL_START_16X16],
    /// 按对角扫描顺序排列的差分系数, 每个列表最多 64 项
    pub delta_coef: [[i8; 64]; SL_MAX_ID],
}

impl Default for RawScalingListData {
    fn default() -> Self {
        Self {
            chroma_present: true,
            copy_mode: [false; SL_MAX_ID],
            pred_mode: [false; SL_MAX_ID],
            pred_id_delta: [0; SL_MAX_ID],
            dc_coef: [0; SL_MAX_ID - SL_START_16X16],
            delta_coef: [[0; 64]; SL_MAX_ID],
        }
    }
}

/// APS 载荷, 按 aps_params_type 区分
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApsPayload {
    Alf(RawAlfData),
    Lmcs(RawLmcsData),
    ScalingList(RawScalingListData),
}

/// 原始 APS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAps {
    pub aps_id: u8,
    pub payload: ApsPayload,
}
