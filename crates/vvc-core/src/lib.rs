//! # vvc-core
//!
//! VVC 帧内核心的基础库, 提供错误类型、像素格式与定点运算工具.

pub mod error;
pub mod math;
pub mod pixel_format;

// 重导出常用类型
pub use error::{VvcError, VvcResult};
pub use pixel_format::PixelFormat;
