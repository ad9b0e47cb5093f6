//! 统一错误类型定义.
//!
//! 参数集推导阶段的所有失败都通过 `VvcError` 传播; 预测阶段没有错误路径.

use thiserror::Error;

/// VVC 核心统一错误类型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VvcError {
    /// 无效参数 (调用方传入的配置或索引非法)
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 无效数据 (字段取值越界, 几何关系矛盾等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// 内存分配失败
    #[error("内存分配失败: {0}")]
    OutOfMemory(String),

    /// 功能未实现
    #[error("功能未实现: {0}")]
    NotImplemented(String),

    /// 内部错误 (不应发生)
    #[error("内部错误: {0}")]
    Internal(String),
}

/// VVC 核心统一 Result 类型
pub type VvcResult<T> = Result<T, VvcError>;

impl VvcError {
    /// 是否为码流数据错误
    pub fn is_invalid_data(&self) -> bool {
        matches!(self, Self::InvalidData(_))
    }
}
