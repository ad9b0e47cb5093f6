//! 定点整数运算辅助函数.

/// 将 `v` 裁剪到 `[lo, hi]`
#[inline]
pub fn clip(v: i32, lo: i32, hi: i32) -> i32 {
    v.clamp(lo, hi)
}

/// 裁剪到有符号 `p + 1` 位范围 `[-(1 << p), (1 << p) - 1]`
#[inline]
pub fn clip_intp2(v: i32, p: u32) -> i32 {
    v.clamp(-(1 << p), (1 << p) - 1)
}

/// 裁剪到 `bit_depth` 位无符号样本范围
#[inline]
pub fn clip_pixel(v: i32, bit_depth: u32) -> u16 {
    v.clamp(0, (1 << bit_depth) - 1) as u16
}

/// 向下取整的 log2, `log2_floor(0) == 0`
#[inline]
pub fn log2_floor(v: u32) -> u32 {
    if v == 0 { 0 } else { 31 - v.leading_zeros() }
}

/// 向上取整的右移 `ceil(v / 2^s)`
#[inline]
pub fn ceil_rshift(v: u32, s: u32) -> u32 {
    (v + (1 << s) - 1) >> s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_helpers() {
        assert_eq!(clip_intp2(200, 7), 127);
        assert_eq!(clip_intp2(-200, 7), -128);
        assert_eq!(clip_pixel(1100, 10), 1023);
        assert_eq!(clip_pixel(-3, 8), 0);
        assert_eq!(clip(5, 0, 3), 3);
    }

    #[test]
    fn test_log2_and_ceil_shift() {
        assert_eq!(log2_floor(0), 0);
        assert_eq!(log2_floor(1), 0);
        assert_eq!(log2_floor(64), 6);
        assert_eq!(log2_floor(65), 6);
        assert_eq!(ceil_rshift(130, 6), 3);
        assert_eq!(ceil_rshift(128, 6), 2);
    }
}
