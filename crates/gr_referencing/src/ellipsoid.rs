// georef\crates\gr_referencing\src/ellipsoid.rs

//! 椭球体定义
//!
//! 提供地球椭球体参数，支持 WGS84、CGCS2000、GRS80 等标准椭球体。
//! 参数补全（长半轴/短半轴/扁率/偏心率换算）使用双倍精度，
//! 保证往返误差在 1 ULP 以内；三角函数不在此精度下传播。
//!
//! # 示例
//!
//! ```
//! use gr_referencing::ellipsoid::Ellipsoid;
//!
//! let wgs84 = Ellipsoid::WGS84;
//! assert!((wgs84.semi_minor() - 6_356_752.314_245_179).abs() < 1e-6);
//! ```

use gr_foundation::dd::DoubleDouble;
use serde::{Deserialize, Serialize};

/// 地球椭球体
///
/// 定义椭球体的几何参数，并提供派生参数的计算方法。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    /// 长半轴 (m)
    pub a: f64,
    /// 扁率 (flattening)
    pub f: f64,
}

impl Ellipsoid {
    // ========================================================================
    // 预定义椭球体
    // ========================================================================

    /// WGS84 椭球体 (GPS 标准)
    ///
    /// - EPSG: 7030
    /// - 长半轴: 6378137.0 m
    /// - 扁率: 1/298.257223563
    pub const WGS84: Self = Self {
        a: 6_378_137.0,
        f: 1.0 / 298.257_223_563,
    };

    /// CGCS2000 椭球体 (中国大地坐标系)
    ///
    /// - EPSG: 1024
    /// - 扁率: 1/298.257222101，与 WGS84 极为相似
    pub const CGCS2000: Self = Self {
        a: 6_378_137.0,
        f: 1.0 / 298.257_222_101,
    };

    /// GRS80 椭球体
    ///
    /// - EPSG: 7019
    /// - 等同于 CGCS2000
    pub const GRS80: Self = Self::CGCS2000;

    /// 克拉索夫斯基椭球体 (北京54坐标系)
    pub const KRASSOVSKY: Self = Self {
        a: 6_378_245.0,
        f: 1.0 / 298.3,
    };

    /// 国际椭球体 1924 (ED50 等采用)
    pub const INTERNATIONAL_1924: Self = Self {
        a: 6_378_388.0,
        f: 1.0 / 297.0,
    };

    // ========================================================================
    // 构造方法
    // ========================================================================

    /// 从长半轴和扁率创建椭球体
    #[must_use]
    pub const fn new(a: f64, f: f64) -> Self {
        Self { a, f }
    }

    /// 从长半轴和短半轴创建椭球体（双倍精度求扁率）
    #[must_use]
    pub fn from_semi_axes(a: f64, b: f64) -> Self {
        let dd_a = DoubleDouble::from(a);
        let dd_b = DoubleDouble::from(b);
        let f = ((dd_a - dd_b) / dd_a).to_f64();
        Self { a, f }
    }

    /// 从 EPSG 椭球体代码获取
    #[must_use]
    pub fn from_epsg(code: u32) -> Option<Self> {
        match code {
            7030 => Some(Self::WGS84),
            7019 => Some(Self::GRS80),
            1024 => Some(Self::CGCS2000),
            7024 => Some(Self::KRASSOVSKY),
            7022 => Some(Self::INTERNATIONAL_1924),
            _ => None,
        }
    }

    // ========================================================================
    // 派生参数（几何常量）
    // ========================================================================

    /// 短半轴 b = a(1-f)，双倍精度
    #[inline]
    #[must_use]
    pub fn semi_minor(&self) -> f64 {
        (DoubleDouble::from(self.a) * (DoubleDouble::ONE - DoubleDouble::from(self.f))).to_f64()
    }

    /// 第一偏心率的平方 e² = 2f - f²，双倍精度
    #[inline]
    #[must_use]
    pub fn e2(&self) -> f64 {
        let f = DoubleDouble::from(self.f);
        (f * (DoubleDouble::from(2.0) - f)).to_f64()
    }

    /// 第一偏心率 e = √e²
    #[inline]
    #[must_use]
    pub fn e(&self) -> f64 {
        let f = DoubleDouble::from(self.f);
        (f * (DoubleDouble::from(2.0) - f)).sqrt().to_f64()
    }

    /// 第二偏心率的平方 e'² = e²/(1-e²)
    #[inline]
    #[must_use]
    pub fn ep2(&self) -> f64 {
        let f = DoubleDouble::from(self.f);
        let e2 = f * (DoubleDouble::from(2.0) - f);
        (e2 / (DoubleDouble::ONE - e2)).to_f64()
    }

    /// 子午圈曲率半径（在纬度 φ 处）
    ///
    /// M = a(1-e²) / (1-e²sin²φ)^(3/2)
    #[inline]
    #[must_use]
    pub fn meridional_radius(&self, lat_rad: f64) -> f64 {
        let sin_lat = lat_rad.sin();
        let e2 = self.e2();
        self.a * (1.0 - e2) / (1.0 - e2 * sin_lat * sin_lat).powf(1.5)
    }

    /// 卯酉圈曲率半径（在纬度 φ 处）
    ///
    /// N = a / √(1-e²sin²φ)
    #[inline]
    #[must_use]
    pub fn prime_vertical_radius(&self, lat_rad: f64) -> f64 {
        let sin_lat = lat_rad.sin();
        let e2 = self.e2();
        self.a / (1.0 - e2 * sin_lat * sin_lat).sqrt()
    }

    /// 与另一椭球体在给定容差内相同（长半轴和短半轴逐项比较，米）
    #[must_use]
    pub fn equals_within(&self, other: &Self, tol_metres: f64) -> bool {
        (self.a - other.a).abs() <= tol_metres
            && (self.semi_minor() - other.semi_minor()).abs() <= tol_metres
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}

impl std::fmt::Display for Ellipsoid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ellipsoid(a={}, f=1/{:.9})", self.a, 1.0 / self.f)
    }
}

// ============================================================================
// 测试
// ============================================================================
