// georef\crates\gr_referencing\src/crs.rs

//! 坐标参照系 (CRS)
//!
//! `Crs` 是闭合标签联合：大地（地理/地心）、垂直、时间、工程、
//! 派生与复合。所有权树状向下（派生持有 `Box<Crs>` 基 CRS，
//! 复合持有分量向量），结构上不可能成环。
//!
//! 语义等价判定 `equals_ignore_metadata` 忽略名字等元数据，
//! 只看基准面、坐标系与派生转换参数。

use crate::axis::{CoordinateSystem, CsType, Unit};
use crate::datum::{EngineeringDatum, GeodeticDatum, TemporalDatum, VerticalDatum};
use crate::extent::GeographicBoundingBox;
use crate::operation::ParameterValueGroup;
use serde::{Deserialize, Serialize};

// ============================================================================
// 单一 CRS 变体
// ============================================================================

/// 大地 CRS（坐标系为椭球面时是地理 CRS，笛卡尔时是地心 CRS）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeodeticCrs {
    /// 名称
    pub name: String,
    /// 大地基准面
    pub datum: GeodeticDatum,
    /// 坐标系
    pub cs: CoordinateSystem,
    /// 有效域
    pub domain: Option<GeographicBoundingBox>,
}

impl GeodeticCrs {
    /// 是否地理 CRS
    #[must_use]
    pub fn is_geographic(&self) -> bool {
        self.cs.cs_type == CsType::Ellipsoidal
    }

    /// 是否地心 CRS
    #[must_use]
    pub fn is_geocentric(&self) -> bool {
        self.cs.cs_type == CsType::Cartesian
    }
}

/// 垂直 CRS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticalCrs {
    /// 名称
    pub name: String,
    /// 垂直基准面
    pub datum: VerticalDatum,
    /// 坐标系（一维）
    pub cs: CoordinateSystem,
    /// 有效域
    pub domain: Option<GeographicBoundingBox>,
}

/// 时间 CRS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalCrs {
    /// 名称
    pub name: String,
    /// 时间基准面
    pub datum: TemporalDatum,
    /// 坐标系（一维）
    pub cs: CoordinateSystem,
    /// 有效域
    pub domain: Option<GeographicBoundingBox>,
}

/// 工程 CRS（局部参照系，不同基准面之间无标准路径）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeringCrs {
    /// 名称
    pub name: String,
    /// 工程基准面（按名字判等）
    pub datum: EngineeringDatum,
    /// 坐标系
    pub cs: CoordinateSystem,
    /// 有效域
    pub domain: Option<GeographicBoundingBox>,
}

// ============================================================================
// 派生与复合
// ============================================================================

/// 定义转换：把基 CRS 坐标变为派生 CRS 坐标的具名操作
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    /// 转换名（如方法名 "Transverse Mercator"）
    pub name: String,
    /// 转换参数
    pub parameters: ParameterValueGroup,
}

impl Conversion {
    /// 创建定义转换
    #[must_use]
    pub fn new(name: impl Into<String>, parameters: ParameterValueGroup) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }
}

/// 派生 CRS：基 CRS 加一个定义转换（投影 CRS 是其典型）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedCrs {
    /// 名称
    pub name: String,
    /// 基 CRS
    pub base: Box<Crs>,
    /// 定义转换（基 -> 派生方向）
    pub conversion: Conversion,
    /// 派生侧坐标系
    pub cs: CoordinateSystem,
    /// 有效域（None 时沿用基 CRS 的）
    pub domain: Option<GeographicBoundingBox>,
}

/// 复合 CRS：若干分量的有序拼接（维数相加）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundCrs {
    /// 名称
    pub name: String,
    /// 分量（可再嵌套复合，展开按深度优先）
    pub components: Vec<Crs>,
    /// 有效域
    pub domain: Option<GeographicBoundingBox>,
}

// ============================================================================
// 标签联合
// ============================================================================

/// 坐标参照系
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Crs {
    /// 大地 CRS（地理或地心）
    Geodetic(GeodeticCrs),
    /// 垂直 CRS
    Vertical(VerticalCrs),
    /// 时间 CRS
    Temporal(TemporalCrs),
    /// 工程 CRS
    Engineering(EngineeringCrs),
    /// 派生 CRS
    Derived(DerivedCrs),
    /// 复合 CRS
    Compound(CompoundCrs),
}

impl Crs {
    // ========================================================================
    // 便捷构造
    // ========================================================================

    /// WGS84 地理 2D（纬度, 经度，度）
    #[must_use]
    pub fn wgs84() -> Self {
        Self::Geodetic(GeodeticCrs {
            name: "WGS 84".to_owned(),
            datum: GeodeticDatum::wgs84(),
            cs: CoordinateSystem::ellipsoidal_lat_lon(),
            domain: Some(GeographicBoundingBox::WORLD),
        })
    }

    /// WGS84 地理 3D（纬度, 经度, 椭球高）
    #[must_use]
    pub fn wgs84_3d() -> Self {
        Self::Geodetic(GeodeticCrs {
            name: "WGS 84 (3D)".to_owned(),
            datum: GeodeticDatum::wgs84(),
            cs: CoordinateSystem::ellipsoidal_3d(),
            domain: Some(GeographicBoundingBox::WORLD),
        })
    }

    /// WGS84 地心（X, Y, Z，米）
    #[must_use]
    pub fn wgs84_geocentric() -> Self {
        Self::Geodetic(GeodeticCrs {
            name: "WGS 84 (geocentric)".to_owned(),
            datum: GeodeticDatum::wgs84(),
            cs: CoordinateSystem::geocentric(),
            domain: Some(GeographicBoundingBox::WORLD),
        })
    }

    /// 地理 CRS
    #[must_use]
    pub fn geographic(name: impl Into<String>, datum: GeodeticDatum, cs: CoordinateSystem) -> Self {
        Self::Geodetic(GeodeticCrs {
            name: name.into(),
            datum,
            cs,
            domain: None,
        })
    }

    /// 地心 CRS
    #[must_use]
    pub fn geocentric(name: impl Into<String>, datum: GeodeticDatum) -> Self {
        Self::Geodetic(GeodeticCrs {
            name: name.into(),
            datum,
            cs: CoordinateSystem::geocentric(),
            domain: None,
        })
    }

    /// 垂直 CRS（正向上）
    #[must_use]
    pub fn vertical(name: impl Into<String>, datum: VerticalDatum) -> Self {
        Self::Vertical(VerticalCrs {
            name: name.into(),
            datum,
            cs: CoordinateSystem::vertical_up(),
            domain: None,
        })
    }

    /// 时间 CRS
    #[must_use]
    pub fn temporal(name: impl Into<String>, datum: TemporalDatum, unit: Unit) -> Self {
        Self::Temporal(TemporalCrs {
            name: name.into(),
            datum,
            cs: CoordinateSystem::temporal(unit),
            domain: None,
        })
    }

    /// 工程 CRS
    #[must_use]
    pub fn engineering(name: impl Into<String>, datum: EngineeringDatum, cs: CoordinateSystem) -> Self {
        Self::Engineering(EngineeringCrs {
            name: name.into(),
            datum,
            cs,
            domain: None,
        })
    }

    /// 派生 CRS
    #[must_use]
    pub fn derived(
        name: impl Into<String>,
        base: Crs,
        conversion: Conversion,
        cs: CoordinateSystem,
    ) -> Self {
        Self::Derived(DerivedCrs {
            name: name.into(),
            base: Box::new(base),
            conversion,
            cs,
            domain: None,
        })
    }

    /// 复合 CRS
    #[must_use]
    pub fn compound(name: impl Into<String>, components: Vec<Crs>) -> Self {
        Self::Compound(CompoundCrs {
            name: name.into(),
            components,
            domain: None,
        })
    }

    /// 附加有效域
    #[must_use]
    pub fn with_domain(mut self, domain: GeographicBoundingBox) -> Self {
        let slot = match &mut self {
            Self::Geodetic(c) => &mut c.domain,
            Self::Vertical(c) => &mut c.domain,
            Self::Temporal(c) => &mut c.domain,
            Self::Engineering(c) => &mut c.domain,
            Self::Derived(c) => &mut c.domain,
            Self::Compound(c) => &mut c.domain,
        };
        *slot = Some(domain);
        self
    }

    // ========================================================================
    // 访问
    // ========================================================================

    /// 名称
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Geodetic(c) => &c.name,
            Self::Vertical(c) => &c.name,
            Self::Temporal(c) => &c.name,
            Self::Engineering(c) => &c.name,
            Self::Derived(c) => &c.name,
            Self::Compound(c) => &c.name,
        }
    }

    /// 坐标维数（复合为各分量之和）
    #[must_use]
    pub fn dimension(&self) -> usize {
        match self {
            Self::Geodetic(c) => c.cs.dimension(),
            Self::Vertical(c) => c.cs.dimension(),
            Self::Temporal(c) => c.cs.dimension(),
            Self::Engineering(c) => c.cs.dimension(),
            Self::Derived(c) => c.cs.dimension(),
            Self::Compound(c) => c.components.iter().map(Crs::dimension).sum(),
        }
    }

    /// 坐标系（复合 CRS 无单一坐标系，返回 None）
    #[must_use]
    pub fn coordinate_system(&self) -> Option<&CoordinateSystem> {
        match self {
            Self::Geodetic(c) => Some(&c.cs),
            Self::Vertical(c) => Some(&c.cs),
            Self::Temporal(c) => Some(&c.cs),
            Self::Engineering(c) => Some(&c.cs),
            Self::Derived(c) => Some(&c.cs),
            Self::Compound(_) => None,
        }
    }

    /// 有效域（派生回退到基 CRS，复合取分量交集）
    #[must_use]
    pub fn domain_of_validity(&self) -> Option<GeographicBoundingBox> {
        match self {
            Self::Geodetic(c) => c.domain,
            Self::Vertical(c) => c.domain,
            Self::Temporal(c) => c.domain,
            Self::Engineering(c) => c.domain,
            Self::Derived(c) => c.domain.or_else(|| c.base.domain_of_validity()),
            Self::Compound(c) => {
                if let Some(own) = c.domain {
                    return Some(own);
                }
                let mut acc: Option<GeographicBoundingBox> = None;
                for comp in &c.components {
                    if let Some(d) = comp.domain_of_validity() {
                        acc = match acc {
                            None => Some(d),
                            Some(cur) => cur.intersection(&d),
                        };
                        acc?;
                    }
                }
                acc
            }
        }
    }

    /// 展开为单一分量序列（递归拉平复合，非复合返回自身）
    #[must_use]
    pub fn single_components(&self) -> Vec<&Crs> {
        let mut out = Vec::new();
        self.collect_components(&mut out);
        out
    }

    fn collect_components<'a>(&'a self, out: &mut Vec<&'a Crs>) {
        match self {
            Self::Compound(c) => {
                for comp in &c.components {
                    comp.collect_components(out);
                }
            }
            other => out.push(other),
        }
    }

    /// 大地变体访问
    #[must_use]
    pub fn as_geodetic(&self) -> Option<&GeodeticCrs> {
        match self {
            Self::Geodetic(c) => Some(c),
            _ => None,
        }
    }

    // ========================================================================
    // 语义等价
    // ========================================================================

    /// 忽略名字等元数据的语义等价判定
    ///
    /// 大地：基准面等价且坐标系相同；派生：基等价、转换参数相同、
    /// 坐标系相同；复合：分量逐一等价。
    #[must_use]
    pub fn equals_ignore_metadata(&self, other: &Crs) -> bool {
        match (self, other) {
            (Self::Geodetic(a), Self::Geodetic(b)) => {
                a.datum.equals_ignore_metadata(&b.datum) && a.cs == b.cs
            }
            (Self::Vertical(a), Self::Vertical(b)) => {
                a.datum.equals_ignore_metadata(&b.datum) && a.cs == b.cs
            }
            (Self::Temporal(a), Self::Temporal(b)) => {
                a.datum.equals_ignore_metadata(&b.datum) && a.cs == b.cs
            }
            (Self::Engineering(a), Self::Engineering(b)) => {
                a.datum.equals_ignore_metadata(&b.datum) && a.cs == b.cs
            }
            (Self::Derived(a), Self::Derived(b)) => {
                a.base.equals_ignore_metadata(&b.base)
                    && a.conversion.name == b.conversion.name
                    && a.conversion.parameters == b.conversion.parameters
                    && a.cs == b.cs
            }
            (Self::Compound(a), Self::Compound(b)) => {
                a.components.len() == b.components.len()
                    && a.components
                        .iter()
                        .zip(&b.components)
                        .all(|(x, y)| x.equals_ignore_metadata(y))
            }
            _ => false,
        }
    }
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equals_ignore_metadata_names_differ() {
        let a = Crs::wgs84();
        let b = Crs::geographic(
            "别名",
            GeodeticDatum::wgs84(),
            CoordinateSystem::ellipsoidal_lat_lon(),
        );
        assert!(a.equals_ignore_metadata(&b));

        // 轴序不同则不等价
        let c = Crs::geographic(
            "WGS 84 (lon-lat)",
            GeodeticDatum::wgs84(),
            CoordinateSystem::ellipsoidal_lon_lat(),
        );
        assert!(!a.equals_ignore_metadata(&c));
    }

    #[test]
    fn test_compound_flatten_and_dimension() {
        let inner = Crs::compound(
            "地理+高程",
            vec![
                Crs::wgs84(),
                Crs::vertical("EGM96 高程", VerticalDatum::new("EGM96 geoid", crate::datum::VerticalDatumKind::Geoidal)),
            ],
        );
        let outer = Crs::compound(
            "地理+高程+时间",
            vec![
                inner,
                Crs::temporal("儒略时间", TemporalDatum::unix_epoch(), Unit::Second),
            ],
        );
        assert_eq!(outer.dimension(), 4);
        let singles = outer.single_components();
        assert_eq!(singles.len(), 3);
        assert!(matches!(singles[0], Crs::Geodetic(_)));
        assert!(matches!(singles[2], Crs::Temporal(_)));
        assert!(outer.coordinate_system().is_none());
    }

    #[test]
    fn test_domain_intersection() {
        let a = Crs::wgs84().with_domain(GeographicBoundingBox::new(0.0, 0.0, 20.0, 20.0));
        let b = Crs::vertical("高程", VerticalDatum::ellipsoidal())
            .with_domain(GeographicBoundingBox::new(10.0, 10.0, 30.0, 30.0));
        let c = Crs::compound("复合", vec![a, b]);
        let d = c.domain_of_validity().expect("domain");
        assert_eq!(d, GeographicBoundingBox::new(10.0, 10.0, 20.0, 20.0));
    }

    #[test]
    fn test_geodetic_kind() {
        assert!(Crs::wgs84().as_geodetic().expect("geodetic").is_geographic());
        assert!(Crs::wgs84_geocentric()
            .as_geodetic()
            .expect("geodetic")
            .is_geocentric());
    }
}
