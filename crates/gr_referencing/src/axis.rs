// georef\crates\gr_referencing\src/axis.rs

//! 坐标轴、计量单位与坐标系统
//!
//! 坐标系统是带序、带方向、带单位的轴列表。两个坐标系统之间的
//! 轴交换 / 方向翻转 / 单位换算统一表示为一个仿射矩阵
//! （见 [`swap_and_scale`]），操作方法内部消费的规范形式由
//! [`CoordinateSystem::canonical`] 给出：东北上顺序、角度用度、
//! 长度用米、时间用秒。

use crate::error::{RefError, RefResult};
use crate::matrix::Matrix;
use serde::{Deserialize, Serialize};

// ============================================================================
// 轴方向
// ============================================================================

/// 坐标轴方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisDirection {
    /// 东
    East,
    /// 西
    West,
    /// 北
    North,
    /// 南
    South,
    /// 上（椭球高/重力高）
    Up,
    /// 下（水深）
    Down,
    /// 地心 X（指向本初子午线与赤道交点）
    GeocentricX,
    /// 地心 Y
    GeocentricY,
    /// 地心 Z（指向北极）
    GeocentricZ,
    /// 时间正向
    Future,
    /// 时间反向
    Past,
}

impl AxisDirection {
    /// 规范正方向（West -> East 等）
    #[must_use]
    pub fn absolute(self) -> Self {
        match self {
            Self::West => Self::East,
            Self::South => Self::North,
            Self::Down => Self::Up,
            Self::Past => Self::Future,
            other => other,
        }
    }

    /// 相对规范正方向的符号
    #[must_use]
    pub fn sign(self) -> f64 {
        match self {
            Self::West | Self::South | Self::Down | Self::Past => -1.0,
            _ => 1.0,
        }
    }

    /// 规范轴序（东/X=0，北/Y=1，上/Z=2，时间=3）
    #[must_use]
    pub fn canonical_rank(self) -> usize {
        match self.absolute() {
            Self::East | Self::GeocentricX => 0,
            Self::North | Self::GeocentricY => 1,
            Self::Up | Self::GeocentricZ => 2,
            Self::Future => 3,
            // absolute() 只返回规范方向
            _ => unreachable!(),
        }
    }

    /// 是否为竖直方向
    #[must_use]
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }
}

// ============================================================================
// 计量单位
// ============================================================================

/// 单位量纲
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitKind {
    /// 角度
    Angular,
    /// 长度
    Linear,
    /// 时间
    Temporal,
}

/// 计量单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    /// 度
    Degree,
    /// 百分度
    Gradian,
    /// 弧度
    Radian,
    /// 角秒（1/3600 度）
    ArcSecond,
    /// 米
    Metre,
    /// 千米
    Kilometre,
    /// 国际英尺
    Foot,
    /// 秒
    Second,
    /// 天
    Day,
    /// 儒略年 (365.25 天)
    Year,
}

impl Unit {
    /// 单位量纲
    #[must_use]
    pub fn kind(self) -> UnitKind {
        match self {
            Self::Degree | Self::Gradian | Self::Radian | Self::ArcSecond => UnitKind::Angular,
            Self::Metre | Self::Kilometre | Self::Foot => UnitKind::Linear,
            Self::Second | Self::Day | Self::Year => UnitKind::Temporal,
        }
    }

    /// 到基准单位（弧度/米/秒）的换算因子
    #[must_use]
    pub fn to_base(self) -> f64 {
        match self {
            Self::Degree => std::f64::consts::PI / 180.0,
            Self::Gradian => std::f64::consts::PI / 200.0,
            Self::Radian => 1.0,
            Self::ArcSecond => std::f64::consts::PI / 648_000.0,
            Self::Metre => 1.0,
            Self::Kilometre => 1000.0,
            Self::Foot => 0.3048,
            Self::Second => 1.0,
            Self::Day => 86_400.0,
            Self::Year => 31_557_600.0,
        }
    }

    /// 同量纲单位间的换算因子 self -> other
    ///
    /// # Errors
    /// 量纲不同（如角度换长度）时返回错误
    pub fn factor_to(self, other: Self) -> RefResult<f64> {
        if self.kind() != other.kind() {
            return Err(RefError::invalid_geodetic(format!(
                "单位量纲不兼容: {self:?} -> {other:?}"
            )));
        }
        Ok(self.to_base() / other.to_base())
    }

    /// 该量纲的规范单位（操作方法内部消费的单位）
    #[must_use]
    pub fn canonical(self) -> Self {
        match self.kind() {
            UnitKind::Angular => Self::Degree,
            UnitKind::Linear => Self::Metre,
            UnitKind::Temporal => Self::Second,
        }
    }
}

// ============================================================================
// 坐标轴与坐标系统
// ============================================================================

/// 坐标轴
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    /// 轴方向
    pub direction: AxisDirection,
    /// 计量单位
    pub unit: Unit,
}

impl Axis {
    /// 创建坐标轴
    #[must_use]
    pub const fn new(direction: AxisDirection, unit: Unit) -> Self {
        Self { direction, unit }
    }
}

/// 坐标系统类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CsType {
    /// 椭球面坐标（经纬度 [+ 椭球高]）
    Ellipsoidal,
    /// 笛卡尔坐标（地心或投影平面）
    Cartesian,
    /// 一维竖直坐标
    Vertical,
    /// 一维时间坐标
    Temporal,
}

/// 坐标系统：带序、带方向、带单位的轴列表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSystem {
    /// 类别
    pub cs_type: CsType,
    /// 轴列表（顺序即坐标元组顺序）
    pub axes: Vec<Axis>,
}

impl CoordinateSystem {
    /// 创建坐标系统
    #[must_use]
    pub fn new(cs_type: CsType, axes: Vec<Axis>) -> Self {
        Self { cs_type, axes }
    }

    /// 坐标维数
    #[inline]
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.axes.len()
    }

    /// 椭球面 2D：(纬度 北 度, 经度 东 度) — EPSG 地理 CRS 惯例
    #[must_use]
    pub fn ellipsoidal_lat_lon() -> Self {
        Self::new(
            CsType::Ellipsoidal,
            vec![
                Axis::new(AxisDirection::North, Unit::Degree),
                Axis::new(AxisDirection::East, Unit::Degree),
            ],
        )
    }

    /// 椭球面 2D：(经度 东 度, 纬度 北 度) — GIS 数据惯例
    #[must_use]
    pub fn ellipsoidal_lon_lat() -> Self {
        Self::new(
            CsType::Ellipsoidal,
            vec![
                Axis::new(AxisDirection::East, Unit::Degree),
                Axis::new(AxisDirection::North, Unit::Degree),
            ],
        )
    }

    /// 椭球面 3D：(纬度, 经度, 椭球高 米)
    #[must_use]
    pub fn ellipsoidal_3d() -> Self {
        Self::new(
            CsType::Ellipsoidal,
            vec![
                Axis::new(AxisDirection::North, Unit::Degree),
                Axis::new(AxisDirection::East, Unit::Degree),
                Axis::new(AxisDirection::Up, Unit::Metre),
            ],
        )
    }

    /// 地心笛卡尔：(X, Y, Z 米)
    #[must_use]
    pub fn geocentric() -> Self {
        Self::new(
            CsType::Cartesian,
            vec![
                Axis::new(AxisDirection::GeocentricX, Unit::Metre),
                Axis::new(AxisDirection::GeocentricY, Unit::Metre),
                Axis::new(AxisDirection::GeocentricZ, Unit::Metre),
            ],
        )
    }

    /// 投影平面：(东, 北 米)
    #[must_use]
    pub fn projected_en() -> Self {
        Self::new(
            CsType::Cartesian,
            vec![
                Axis::new(AxisDirection::East, Unit::Metre),
                Axis::new(AxisDirection::North, Unit::Metre),
            ],
        )
    }

    /// 一维竖直坐标（向上，米）
    #[must_use]
    pub fn vertical_up() -> Self {
        Self::new(
            CsType::Vertical,
            vec![Axis::new(AxisDirection::Up, Unit::Metre)],
        )
    }

    /// 一维竖直坐标（向下水深，米）
    #[must_use]
    pub fn vertical_depth() -> Self {
        Self::new(
            CsType::Vertical,
            vec![Axis::new(AxisDirection::Down, Unit::Metre)],
        )
    }

    /// 一维时间坐标（向未来，给定单位）
    #[must_use]
    pub fn temporal(unit: Unit) -> Self {
        Self::new(CsType::Temporal, vec![Axis::new(AxisDirection::Future, unit)])
    }

    /// 规范形式：规范轴序 + 规范单位 + 规范正方向
    #[must_use]
    pub fn canonical(&self) -> Self {
        let mut axes: Vec<Axis> = self
            .axes
            .iter()
            .map(|a| Axis::new(a.direction.absolute(), a.unit.canonical()))
            .collect();
        axes.sort_by_key(|a| a.direction.canonical_rank());
        Self::new(self.cs_type, axes)
    }

    /// 查找竖直轴的位置
    #[must_use]
    pub fn vertical_axis_index(&self) -> Option<usize> {
        self.axes
            .iter()
            .position(|a| a.direction.is_vertical())
    }
}

// ============================================================================
// 轴交换 / 单位换算矩阵
// ============================================================================

/// 构造从 `source` 坐标系统到 `target` 坐标系统的仿射矩阵
///
/// 对每个目标轴，在源轴中找规范方向相同的轴；矩阵元素为
/// 方向符号 × 单位换算因子。多余的源轴被丢弃（3D→2D），
/// 缺失的目标轴是错误 —— 维度补全属于调用方（构造器）的
/// 显式调整规则，不在这里悄悄发生。
///
/// # Errors
/// 目标轴在源中无对应、或单位量纲不兼容时返回错误
pub fn swap_and_scale(source: &CoordinateSystem, target: &CoordinateSystem) -> RefResult<Matrix> {
    let src_n = source.dimension();
    let tgt_n = target.dimension();
    let mut m = Matrix::zeros(tgt_n + 1, src_n + 1);
    let mut used = vec![false; src_n];

    for (row, tgt_axis) in target.axes.iter().enumerate() {
        let abs = tgt_axis.direction.absolute();
        let col = source
            .axes
            .iter()
            .enumerate()
            .position(|(i, a)| !used[i] && a.direction.absolute() == abs)
            .ok_or_else(|| {
                RefError::invalid_geodetic(format!(
                    "目标轴 {:?} 在源坐标系统中无对应轴",
                    tgt_axis.direction
                ))
            })?;
        used[col] = true;
        let src_axis = &source.axes[col];
        let factor = src_axis.unit.factor_to(tgt_axis.unit)?;
        let sign = src_axis.direction.sign() * tgt_axis.direction.sign();
        m.set(row, col, sign * factor);
    }
    m.set(tgt_n, src_n, 1.0);
    Ok(m)
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_factors() {
        assert!((Unit::Degree.factor_to(Unit::Radian).unwrap()
            - std::f64::consts::PI / 180.0)
            .abs()
            < 1e-18);
        assert!((Unit::Kilometre.factor_to(Unit::Metre).unwrap() - 1000.0).abs() < 1e-12);
        assert!((Unit::ArcSecond.factor_to(Unit::Degree).unwrap() - 1.0 / 3600.0).abs() < 1e-18);
        assert!(Unit::Degree.factor_to(Unit::Metre).is_err());
    }

    #[test]
    fn test_direction_sign() {
        assert_eq!(AxisDirection::East.sign(), 1.0);
        assert_eq!(AxisDirection::West.sign(), -1.0);
        assert_eq!(AxisDirection::Down.absolute(), AxisDirection::Up);
    }

    #[test]
    fn test_swap_lat_lon_to_lon_lat() {
        let latlon = CoordinateSystem::ellipsoidal_lat_lon();
        let lonlat = CoordinateSystem::ellipsoidal_lon_lat();
        let m = swap_and_scale(&latlon, &lonlat).expect("swap");
        let out = m.apply(&[40.0, 116.0]).expect("apply");
        assert_eq!(out, vec![116.0, 40.0]);
        // 反向矩阵应为其逆
        let back = swap_and_scale(&lonlat, &latlon).expect("swap");
        let round = back.multiply(&m).expect("mul");
        assert!(round.is_identity(1e-12));
    }

    #[test]
    fn test_swap_same_cs_is_identity() {
        let cs = CoordinateSystem::ellipsoidal_3d();
        let m = swap_and_scale(&cs, &cs).expect("swap");
        assert!(m.is_identity(1e-12));
    }

    #[test]
    fn test_unit_and_direction_conversion() {
        // 向上米 -> 向下英尺
        let up = CoordinateSystem::vertical_up();
        let down_ft = CoordinateSystem::new(
            CsType::Vertical,
            vec![Axis::new(AxisDirection::Down, Unit::Foot)],
        );
        let m = swap_and_scale(&up, &down_ft).expect("swap");
        let out = m.apply(&[0.3048]).expect("apply");
        assert!((out[0] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_drop_height() {
        // 3D -> 2D：高度轴被丢弃
        let src = CoordinateSystem::ellipsoidal_3d();
        let tgt = CoordinateSystem::ellipsoidal_lat_lon();
        let m = swap_and_scale(&src, &tgt).expect("swap");
        let out = m.apply(&[40.0, 116.0, 50.0]).expect("apply");
        assert_eq!(out, vec![40.0, 116.0]);
    }

    #[test]
    fn test_missing_target_axis_fails() {
        // 2D -> 3D：缺高度轴，必须显式报错
        let src = CoordinateSystem::ellipsoidal_lat_lon();
        let tgt = CoordinateSystem::ellipsoidal_3d();
        assert!(swap_and_scale(&src, &tgt).is_err());
    }

    #[test]
    fn test_canonical_form() {
        let cs = CoordinateSystem::ellipsoidal_lat_lon();
        let canon = cs.canonical();
        assert_eq!(canon.axes[0].direction, AxisDirection::East);
        assert_eq!(canon.axes[1].direction, AxisDirection::North);
    }

    #[test]
    fn test_vertical_axis_index() {
        assert_eq!(CoordinateSystem::ellipsoidal_3d().vertical_axis_index(), Some(2));
        assert_eq!(CoordinateSystem::ellipsoidal_lat_lon().vertical_axis_index(), None);
    }
}
