// georef\crates\gr_referencing\src/authority.rs

//! 外部协作者契约
//!
//! 权威注册表、基准位移来源与精度选择策略都是进程内能力接口。
//! 注册表缺席是合法配置而非错误；查找返回空列表表示
//! 「回退到计算路径」，不用异常表达。
//!
//! 递归（非最外层）咨询时解析器改用无锁 `peek`：宁可错过缓存
//! 重复计算，也不冒两棵解析树互等缓存条目的死锁风险。

use crate::crs::Crs;
use crate::datum::{BursaWolfParameters, GeodeticDatum};
use crate::error::RefResult;
use crate::extent::GeographicBoundingBox;
use crate::operation::CoordinateOperation;

/// 权威操作注册表（可选协作者）
pub trait AuthorityRegistry: Send + Sync {
    /// 查找权威声明的操作，空列表表示无记录
    ///
    /// # Errors
    /// 仅在注册表自身损坏时返回错误，查无结果不是错误
    fn find(&self, source: &Crs, target: &Crs) -> RefResult<Vec<CoordinateOperation>>;

    /// 无锁窥视：允许漏报（返回 None 即视为未命中）
    ///
    /// 缺省实现直接放弃，纯计算注册表可转发到 `find`。
    fn peek(&self, source: &Crs, target: &Crs) -> Option<Vec<CoordinateOperation>> {
        let _ = (source, target);
        None
    }
}

/// 基准位移来源（如格网文件装载器）
///
/// 本核心只感知「该区域有/无位移参数」，不关心装载机制。
pub trait DatumShiftSource: Send + Sync {
    /// 给定基准面对与兴趣区，返回适用的 Bursa-Wolf 参数
    fn shift_for(
        &self,
        source: &GeodeticDatum,
        target: &GeodeticDatum,
        aoi: Option<&GeographicBoundingBox>,
    ) -> Option<BursaWolfParameters>;
}

/// 基准位移操作族
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatumShiftFamily {
    /// 三参数地心平移 (EPSG 9603)
    GeocentricTranslations,
    /// 位置矢量七参数 (EPSG 9606)
    PositionVector,
    /// Molodensky (EPSG 9604)
    Molodensky,
    /// 简化 Molodensky (EPSG 9605)
    AbridgedMolodensky,
}

impl DatumShiftFamily {
    /// 对应的 EPSG 方法代码
    #[must_use]
    pub fn identifier(self) -> u32 {
        match self {
            Self::GeocentricTranslations => 9603,
            Self::PositionVector => 9606,
            Self::Molodensky => 9604,
            Self::AbridgedMolodensky => 9605,
        }
    }

    /// 对应的方法名
    #[must_use]
    pub fn method_name(self) -> &'static str {
        match self {
            Self::GeocentricTranslations => "Geocentric translations (geog2D domain)",
            Self::PositionVector => "Position Vector transformation (geog2D domain)",
            Self::Molodensky => "Molodensky",
            Self::AbridgedMolodensky => "Abridged Molodensky",
        }
    }
}

/// 按期望精度选择位移操作族的策略
pub trait AccuracyPolicy: Send + Sync {
    /// 为给定位移参数与期望精度挑选操作族
    fn select(&self, shift: &BursaWolfParameters, desired_accuracy_m: Option<f64>) -> DatumShiftFamily;
}

/// 缺省策略
///
/// 高精度走地心路径；期望精度宽于 5 m 且位移不含旋转/尺度时
/// 允许 Molodensky，宽于 10 m 时允许简化式。
pub struct DefaultAccuracyPolicy;

/// Molodensky 允许阈值 (m)
pub const MOLODENSKY_ACCURACY_M: f64 = 5.0;
/// 简化 Molodensky 允许阈值 (m)
pub const ABRIDGED_MOLODENSKY_ACCURACY_M: f64 = 10.0;

impl AccuracyPolicy for DefaultAccuracyPolicy {
    fn select(&self, shift: &BursaWolfParameters, desired_accuracy_m: Option<f64>) -> DatumShiftFamily {
        if shift.is_translation_only() {
            if let Some(acc) = desired_accuracy_m {
                if acc >= ABRIDGED_MOLODENSKY_ACCURACY_M {
                    return DatumShiftFamily::AbridgedMolodensky;
                }
                if acc >= MOLODENSKY_ACCURACY_M {
                    return DatumShiftFamily::Molodensky;
                }
            }
            return DatumShiftFamily::GeocentricTranslations;
        }
        DatumShiftFamily::PositionVector
    }
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_selection() {
        let policy = DefaultAccuracyPolicy;
        let translation = BursaWolfParameters::translation(85.0, 96.0, 117.0);
        assert_eq!(
            policy.select(&translation, None),
            DatumShiftFamily::GeocentricTranslations
        );
        assert_eq!(
            policy.select(&translation, Some(1.0)),
            DatumShiftFamily::GeocentricTranslations
        );
        assert_eq!(
            policy.select(&translation, Some(5.0)),
            DatumShiftFamily::Molodensky
        );
        assert_eq!(
            policy.select(&translation, Some(50.0)),
            DatumShiftFamily::AbridgedMolodensky
        );

        // 含旋转的位移不允许 Molodensky 近似
        let mut seven = BursaWolfParameters::translation(85.0, 96.0, 117.0);
        seven.rz = 0.554;
        assert_eq!(
            policy.select(&seven, Some(50.0)),
            DatumShiftFamily::PositionVector
        );
    }
}
