//! 帧内预测常量表.

/// 角度模式的 `intraPredAngle` 绝对值, 以 `|mode - 50|` / `|18 - mode|` 为下标
pub const INTRA_PRED_ANGLES: [i32; 31] = [
    0, 1, 2, 3, 4, 6, 8, 10, 12, 14, 16, 18, 20, 23, 26, 29, 32, 35, 39, 45, 51, 57, 64, 73, 86,
    102, 128, 171, 256, 341, 512,
];

/// 启用参考样本平滑的模式 (含广角)
pub const REF_FILTER_MODES: [i32; 12] = [0, -14, -12, -10, -6, 2, 34, 66, 72, 76, 78, 80];

/// 按 `nTbS - 2` 索引的插值滤波阈值
pub const HOR_VER_DIST_THRES: [i32; 5] = [24, 14, 2, 0, 0];

/// 亮度 4 抽头插值滤波器: `[0]` 为 fC (三次), `[1]` 为 fG (高斯)
pub const INTRA_LUMA_FILTER: [[[i8; 4]; 32]; 2] = [
    [
        [0, 64, 0, 0],
        [-1, 63, 2, 0],
        [-2, 62, 4, 0],
        [-2, 60, 7, -1],
        [-2, 58, 10, -2],
        [-3, 57, 12, -2],
        [-4, 56, 14, -2],
        [-4, 55, 15, -2],
        [-4, 54, 16, -2],
        [-5, 53, 18, -2],
        [-6, 52, 20, -2],
        [-6, 49, 24, -3],
        [-6, 46, 28, -4],
        [-5, 44, 29, -4],
        [-4, 42, 30, -4],
        [-4, 39, 33, -4],
        [-4, 36, 36, -4],
        [-4, 33, 39, -4],
        [-4, 30, 42, -4],
        [-4, 29, 44, -5],
        [-4, 28, 46, -6],
        [-3, 24, 49, -6],
        [-2, 20, 52, -6],
        [-2, 18, 53, -5],
        [-2, 16, 54, -4],
        [-2, 15, 55, -4],
        [-2, 14, 56, -4],
        [-2, 12, 57, -3],
        [-2, 10, 58, -2],
        [-1, 7, 60, -2],
        [0, 4, 62, -2],
        [0, 2, 63, -1],
    ],
    [
        [16, 32, 16, 0],
        [16, 32, 16, 0],
        [15, 31, 17, 1],
        [15, 31, 17, 1],
        [14, 30, 18, 2],
        [14, 30, 18, 2],
        [13, 29, 19, 3],
        [13, 29, 19, 3],
        [12, 28, 20, 4],
        [12, 28, 20, 4],
        [11, 27, 21, 5],
        [11, 27, 21, 5],
        [10, 26, 22, 6],
        [10, 26, 22, 6],
        [9, 25, 23, 7],
        [9, 25, 23, 7],
        [8, 24, 24, 8],
        [8, 24, 24, 8],
        [7, 23, 25, 9],
        [7, 23, 25, 9],
        [6, 22, 26, 10],
        [6, 22, 26, 10],
        [5, 21, 27, 11],
        [5, 21, 27, 11],
        [4, 20, 28, 12],
        [4, 20, 28, 12],
        [3, 19, 29, 13],
        [3, 19, 29, 13],
        [2, 18, 30, 14],
        [2, 18, 30, 14],
        [1, 17, 31, 15],
        [1, 17, 31, 15],
    ],
];

/// CCLM 斜率推导用的归一化除数表
pub const CCLM_DIV_SIG: [i32; 16] = [0, 7, 6, 5, 5, 4, 4, 3, 3, 2, 2, 1, 1, 1, 1, 0];

/// MIP 各尺寸类的边界向量长度
pub const MIP_BOUNDARY_SIZES: [usize; 3] = [2, 4, 4];

/// MIP 各尺寸类的缩减预测边长
pub const MIP_PRED_SIZES: [usize; 3] = [4, 4, 8];

/// MIP 各尺寸类的模式数
pub const MIP_NUM_MODES: [usize; 3] = [16, 8, 6];
