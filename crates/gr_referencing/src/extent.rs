// georef\crates\gr_referencing\src/extent.rs

//! 地理范围（有效域）
//!
//! 用经纬度包围盒描述 CRS 或位移参数集的有效域，
//! 解析时取双方有效域的交集作为兴趣区。

use serde::{Deserialize, Serialize};

/// 地理包围盒（度）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeographicBoundingBox {
    /// 西边界经度
    pub west: f64,
    /// 南边界纬度
    pub south: f64,
    /// 东边界经度
    pub east: f64,
    /// 北边界纬度
    pub north: f64,
}

impl GeographicBoundingBox {
    /// 创建包围盒
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// 全球范围
    pub const WORLD: Self = Self::new(-180.0, -90.0, 180.0, 90.0);

    /// 是否为空（退化）范围
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.west >= self.east || self.south >= self.north
    }

    /// 与另一包围盒求交集，空交集返回 None
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let out = Self::new(
            self.west.max(other.west),
            self.south.max(other.south),
            self.east.min(other.east),
            self.north.min(other.north),
        );
        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }

    /// 是否包含另一包围盒
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.west <= other.west
            && self.south <= other.south
            && self.east >= other.east
            && self.north >= other.north
    }
}

// ============================================================================
// 测试
// ============================================================================
