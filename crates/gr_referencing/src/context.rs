// georef\crates\gr_referencing\src/context.rs

//! 构建上下文
//!
//! `TransformContext` 携带一次构建调用的源/目标坐标系与椭球体，
//! 供参数补全和归一化包裹使用。按值进出构建器：调用方移交，
//! 构建器补全后随结果归还，并发或递归构建互不可见中间态。

use crate::axis::CoordinateSystem;
use crate::ellipsoid::Ellipsoid;
use serde::{Deserialize, Serialize};

/// 参数最终取值的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterOrigin {
    /// 由上下文椭球补全
    Contextual,
    /// 调用方显式给出且与上下文一致
    Explicit,
    /// 调用方显式给出但与上下文椭球超差（保留调用方值）
    Inconsistent,
}

/// 一次变换构建的上下文
#[derive(Debug, Clone, Default)]
pub struct TransformContext {
    /// 源坐标系
    pub source_cs: Option<CoordinateSystem>,
    /// 源椭球体
    pub source_ellipsoid: Option<Ellipsoid>,
    /// 目标坐标系
    pub target_cs: Option<CoordinateSystem>,
    /// 目标椭球体
    pub target_ellipsoid: Option<Ellipsoid>,
    /// 实际使用的方法名（构建后填写）
    pub provider_used: Option<String>,
    origins: Vec<(String, ParameterOrigin)>,
}

impl TransformContext {
    /// 空上下文
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置源侧
    #[must_use]
    pub fn with_source(mut self, cs: CoordinateSystem, ellipsoid: Option<Ellipsoid>) -> Self {
        self.source_cs = Some(cs);
        self.source_ellipsoid = ellipsoid;
        self
    }

    /// 设置目标侧
    #[must_use]
    pub fn with_target(mut self, cs: CoordinateSystem, ellipsoid: Option<Ellipsoid>) -> Self {
        self.target_cs = Some(cs);
        self.target_ellipsoid = ellipsoid;
        self
    }

    /// 源坐标系维数
    #[must_use]
    pub fn source_dim(&self) -> Option<usize> {
        self.source_cs.as_ref().map(CoordinateSystem::dimension)
    }

    /// 目标坐标系维数
    #[must_use]
    pub fn target_dim(&self) -> Option<usize> {
        self.target_cs.as_ref().map(CoordinateSystem::dimension)
    }

    /// 记录参数来源（同名覆盖）
    pub fn record_origin(&mut self, name: &str, origin: ParameterOrigin) {
        match self.origins.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = origin,
            None => self.origins.push((name.to_owned(), origin)),
        }
    }

    /// 查询参数来源
    #[must_use]
    pub fn origin_of(&self, name: &str) -> Option<ParameterOrigin> {
        self.origins
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, o)| *o)
    }

    /// 是否有被标记为超差的参数
    #[must_use]
    pub fn has_inconsistent(&self) -> bool {
        self.origins
            .iter()
            .any(|(_, o)| *o == ParameterOrigin::Inconsistent)
    }

    /// 按记录顺序遍历参数来源
    pub fn origins(&self) -> impl Iterator<Item = (&str, ParameterOrigin)> {
        self.origins.iter().map(|(n, o)| (n.as_str(), *o))
    }
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_record() {
        let mut ctx = TransformContext::new()
            .with_source(CoordinateSystem::ellipsoidal_lat_lon(), Some(Ellipsoid::WGS84));
        ctx.record_origin("semi_major", ParameterOrigin::Contextual);
        ctx.record_origin("semi_minor", ParameterOrigin::Inconsistent);
        ctx.record_origin("semi_major", ParameterOrigin::Explicit);
        assert_eq!(ctx.origin_of("semi_major"), Some(ParameterOrigin::Explicit));
        assert!(ctx.has_inconsistent());
        assert_eq!(ctx.source_dim(), Some(2));
        assert_eq!(ctx.target_dim(), None);
    }
}
