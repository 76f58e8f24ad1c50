// georef\crates\gr_foundation\src/dd.rs

//! 双倍精度 (double-double) 算术
//!
//! 用 (hi, lo) 两个 f64 表示约 106 位有效二进制位的数值。
//! 用于椭球参数补全：长半轴 ↔ 扁率 ↔ 偏心率的代数换算
//! 在普通 f64 精度下往返会损失最后几位，双倍精度可将误差
//! 控制在 1 ULP 以内。
//!
//! 仅覆盖代数运算（加减乘除、平方根）。三角函数、对数等
//! 超越函数不在此精度下传播。
//!
//! # 示例
//!
//! ```
//! use gr_foundation::dd::DoubleDouble;
//!
//! let a = DoubleDouble::from(6_378_137.0);
//! let inv_f = DoubleDouble::from(298.257_223_563);
//! let f = DoubleDouble::from(1.0) / inv_f;
//! let b = a * (DoubleDouble::from(1.0) - f);
//! // b ≈ 6356752.314245179
//! assert!((b.to_f64() - 6_356_752.314_245_179).abs() < 1e-8);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// 双倍精度数值：value = hi + lo，且 |lo| <= ulp(hi)/2
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoubleDouble {
    /// 高位部分
    pub hi: f64,
    /// 低位补偿部分
    pub lo: f64,
}

/// Knuth two-sum：s = a+b 的浮点结果，e 为精确误差
#[inline]
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let v = s - a;
    let e = (a - (s - v)) + (b - v);
    (s, e)
}

/// 快速 two-sum，要求 |a| >= |b|
#[inline]
fn quick_two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let e = b - (s - a);
    (s, e)
}

/// 精确乘积：p = a*b 的浮点结果，e 为精确误差（借助 FMA）
#[inline]
fn two_prod(a: f64, b: f64) -> (f64, f64) {
    let p = a * b;
    let e = a.mul_add(b, -p);
    (p, e)
}

impl DoubleDouble {
    /// 零值
    pub const ZERO: Self = Self { hi: 0.0, lo: 0.0 };

    /// 壹值
    pub const ONE: Self = Self { hi: 1.0, lo: 0.0 };

    /// 从高低位直接构造（调用方保证规范化）
    #[inline]
    #[must_use]
    pub const fn new(hi: f64, lo: f64) -> Self {
        Self { hi, lo }
    }

    /// 取 f64 近似值
    #[inline]
    #[must_use]
    pub fn to_f64(self) -> f64 {
        self.hi + self.lo
    }

    /// 平方根（一步 Newton 修正）
    #[must_use]
    pub fn sqrt(self) -> Self {
        if self.hi <= 0.0 {
            return Self::ZERO;
        }
        let x = self.hi.sqrt();
        // r = (self - x*x) / (2x)，一次修正即可达到双倍精度
        let xx = Self::from(x) * Self::from(x);
        let r = (self - xx).to_f64() / (2.0 * x);
        let (hi, lo) = quick_two_sum(x, r);
        Self { hi, lo }
    }

    /// 绝对值
    #[inline]
    #[must_use]
    pub fn abs(self) -> Self {
        if self.hi < 0.0 {
            -self
        } else {
            self
        }
    }
}

impl From<f64> for DoubleDouble {
    #[inline]
    fn from(v: f64) -> Self {
        Self { hi: v, lo: 0.0 }
    }
}

impl Add for DoubleDouble {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        let (s, e) = two_sum(self.hi, rhs.hi);
        let e = e + self.lo + rhs.lo;
        let (hi, lo) = quick_two_sum(s, e);
        Self { hi, lo }
    }
}

impl Sub for DoubleDouble {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl Neg for DoubleDouble {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self {
            hi: -self.hi,
            lo: -self.lo,
        }
    }
}

impl Mul for DoubleDouble {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let (p, e) = two_prod(self.hi, rhs.hi);
        let e = e + self.hi * rhs.lo + self.lo * rhs.hi;
        let (hi, lo) = quick_two_sum(p, e);
        Self { hi, lo }
    }
}

impl Div for DoubleDouble {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        let q1 = self.hi / rhs.hi;
        // 一步残差修正
        let r = self - rhs * Self::from(q1);
        let q2 = r.hi / rhs.hi;
        let r = r - rhs * Self::from(q2);
        let q3 = r.hi / rhs.hi;
        let (s, e) = two_sum(q1, q2);
        let (hi, lo) = quick_two_sum(s, e + q3);
        Self { hi, lo }
    }
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_sum_exact() {
        let (s, e) = two_sum(1e16, 1.0);
        // 1.0 无法进入 1e16 的尾数，误差被完整保留
        assert_eq!(s + e, 1e16 + 1.0);
        assert!(e != 0.0);
    }

    #[test]
    fn test_add_preserves_low_bits() {
        let a = DoubleDouble::from(1.0);
        let b = DoubleDouble::from(1e-20);
        let c = a + b;
        assert_eq!(c.hi, 1.0);
        assert!((c.lo - 1e-20).abs() < 1e-35);
    }

    #[test]
    fn test_flattening_roundtrip() {
        // a, 1/f -> f -> b -> f 往返应恢复到 1 ULP
        let a = DoubleDouble::from(6_378_137.0);
        let inv_f = DoubleDouble::from(298.257_223_563);
        let f = DoubleDouble::ONE / inv_f;
        let b = a * (DoubleDouble::ONE - f);
        let f_back = (a - b) / a;
        let inv_f_back = DoubleDouble::ONE / f_back;
        assert!((inv_f_back.to_f64() - 298.257_223_563).abs() < 1e-10);
    }

    #[test]
    fn test_eccentricity_squared() {
        // e² = 2f - f²，WGS84 标准值 0.00669437999014132
        let f = DoubleDouble::ONE / DoubleDouble::from(298.257_223_563);
        let e2 = f * (DoubleDouble::from(2.0) - f);
        assert!((e2.to_f64() - 0.006_694_379_990_141_32).abs() < 1e-17);
    }

    #[test]
    fn test_sqrt() {
        let x = DoubleDouble::from(2.0);
        let r = x.sqrt();
        let back = r * r;
        assert!((back.to_f64() - 2.0).abs() < 1e-30);
    }

    #[test]
    fn test_div() {
        let x = DoubleDouble::from(1.0) / DoubleDouble::from(3.0);
        let back = x * DoubleDouble::from(3.0);
        assert!((back.to_f64() - 1.0).abs() < 1e-30);
    }
}
