// georef\crates\gr_referencing\src/operation.rs

//! 坐标操作的元数据层
//!
//! 变换本体是 `MathTransform`；本模块承载围绕它的描述信息：
//! 参数描述符与参数值组、操作方法、以及把源/目标 CRS、变换、
//! 方法与精度绑在一起的 `CoordinateOperation`。
//!
//! 参数值组保持插入顺序，按名字查询；同名写入覆盖旧值。

use crate::axis::Unit;
use crate::crs::Crs;
use crate::error::{RefError, RefResult};
use crate::transform::MathTransform;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// 参数描述符
// ============================================================================

/// 单个操作参数的描述符
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    /// 参数名（EPSG 惯用名）
    pub name: &'static str,
    /// 缺省值（None 表示必填）
    pub default: Option<f64>,
    /// 期望单位（None 表示无量纲或由上下文决定）
    pub unit: Option<Unit>,
}

impl ParameterDescriptor {
    /// 必填参数
    #[must_use]
    pub const fn required(name: &'static str, unit: Unit) -> Self {
        Self {
            name,
            default: None,
            unit: Some(unit),
        }
    }

    /// 带缺省值的可选参数
    #[must_use]
    pub const fn optional(name: &'static str, default: f64, unit: Unit) -> Self {
        Self {
            name,
            default: Some(default),
            unit: Some(unit),
        }
    }

    /// 无量纲计数参数（维数、矩阵形状等）
    #[must_use]
    pub const fn count(name: &'static str, default: f64) -> Self {
        Self {
            name,
            default: Some(default),
            unit: None,
        }
    }
}

/// 一个操作方法的全部参数描述符
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptorGroup {
    /// 方法名
    pub name: &'static str,
    /// 描述符列表
    pub descriptors: Vec<ParameterDescriptor>,
}

impl ParameterDescriptorGroup {
    /// 按名字查找描述符
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// 是否包含该参数
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// 生成带缺省值的空参数值组
    #[must_use]
    pub fn create_value_group(&self) -> ParameterValueGroup {
        let mut group = ParameterValueGroup::new(self.name);
        for d in &self.descriptors {
            if let Some(v) = d.default {
                group.set(d.name, v);
            }
        }
        group
    }
}

// ============================================================================
// 参数值
// ============================================================================

/// 单个参数值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterValue {
    /// 参数名
    pub name: String,
    /// 数值（单位由所属方法的描述符约定）
    pub value: f64,
}

/// 参数值组（保持插入顺序）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ParameterValueGroup {
    /// 组名（通常等于方法名）
    pub name: String,
    /// 声明的 EPSG 方法代码（查找时优先于组名）
    pub identifier: Option<u32>,
    values: Vec<ParameterValue>,
}

impl ParameterValueGroup {
    /// 创建空参数组
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: None,
            values: Vec::new(),
        }
    }

    /// 附加 EPSG 方法代码
    #[must_use]
    pub fn with_identifier(mut self, identifier: u32) -> Self {
        self.identifier = Some(identifier);
        self
    }

    /// 写入参数（同名覆盖）
    pub fn set(&mut self, name: &str, value: f64) {
        match self.values.iter_mut().find(|v| v.name == name) {
            Some(entry) => entry.value = value,
            None => self.values.push(ParameterValue {
                name: name.to_owned(),
                value,
            }),
        }
    }

    /// 链式写入
    #[must_use]
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.set(name, value);
        self
    }

    /// 读取参数
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.iter().find(|v| v.name == name).map(|v| v.value)
    }

    /// 读取参数，缺省回退
    #[must_use]
    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).unwrap_or(default)
    }

    /// 读取必填参数
    ///
    /// # Errors
    /// 参数未设置时返回 `MissingParameter`
    pub fn require(&self, name: &str) -> RefResult<f64> {
        self.get(name).ok_or_else(|| RefError::missing_parameter(name))
    }

    /// 参数是否已设置
    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// 按插入顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &ParameterValue> {
        self.values.iter()
    }

    /// 参数个数
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ============================================================================
// 操作方法
// ============================================================================

/// 操作方法：公式的元数据描述
#[derive(Debug, Clone, PartialEq)]
pub struct OperationMethod {
    /// 方法名（EPSG 惯用名）
    pub name: &'static str,
    /// EPSG 方法代码
    pub identifier: Option<u32>,
    /// 固定源维数（None 表示由上下文决定）
    pub source_dim: Option<usize>,
    /// 固定目标维数（None 表示由上下文决定）
    pub target_dim: Option<usize>,
    /// 参数描述符
    pub parameters: ParameterDescriptorGroup,
}

// ============================================================================
// 坐标操作
// ============================================================================

/// 操作类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationCategory {
    /// 坐标转换（同一基准面内，精确）
    Conversion,
    /// 坐标变换（跨基准面，带经验精度）
    Transformation,
}

/// 坐标操作：源/目标 CRS 与数学变换及其元数据的绑定
#[derive(Debug, Clone)]
pub struct CoordinateOperation {
    /// 操作名
    pub name: String,
    /// 类别
    pub category: OperationCategory,
    /// 源 CRS
    pub source_crs: Crs,
    /// 目标 CRS
    pub target_crs: Crs,
    /// 数学变换
    pub transform: Arc<MathTransform>,
    /// 方法名（合成操作可能无单一方法）
    pub method: Option<String>,
    /// 参数值（仿射降级后仍保留原始参数）
    pub parameters: Option<ParameterValueGroup>,
    /// 经验精度 (m)，Conversion 恒为 None
    pub accuracy: Option<f64>,
}

impl CoordinateOperation {
    /// 构造同基准面转换
    #[must_use]
    pub fn conversion(
        name: impl Into<String>,
        source_crs: Crs,
        target_crs: Crs,
        transform: Arc<MathTransform>,
    ) -> Self {
        Self {
            name: name.into(),
            category: OperationCategory::Conversion,
            source_crs,
            target_crs,
            transform,
            method: None,
            parameters: None,
            accuracy: None,
        }
    }

    /// 构造跨基准面变换
    #[must_use]
    pub fn transformation(
        name: impl Into<String>,
        source_crs: Crs,
        target_crs: Crs,
        transform: Arc<MathTransform>,
        accuracy: Option<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            category: OperationCategory::Transformation,
            source_crs,
            target_crs,
            transform,
            method: None,
            parameters: None,
            accuracy,
        }
    }

    /// 附加方法与参数元数据
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>, parameters: ParameterValueGroup) -> Self {
        self.method = Some(method.into());
        self.parameters = Some(parameters);
        self
    }

    /// 是否恒等操作
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.transform.is_identity()
    }
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_group_set_get() {
        let mut g = ParameterValueGroup::new("Geocentric translations");
        g.set("X-axis translation", 84.87);
        g.set("Y-axis translation", 96.49);
        g.set("X-axis translation", 85.0);
        assert_eq!(g.len(), 2);
        assert_eq!(g.get("X-axis translation"), Some(85.0));
        assert!(g.get("Z-axis translation").is_none());
        assert!(matches!(
            g.require("Z-axis translation"),
            Err(RefError::MissingParameter { .. })
        ));
    }

    #[test]
    fn test_descriptor_group_defaults() {
        let group = ParameterDescriptorGroup {
            name: "Longitude rotation",
            descriptors: vec![ParameterDescriptor::optional(
                "Longitude offset",
                0.0,
                Unit::Degree,
            )],
        };
        let values = group.create_value_group();
        assert_eq!(values.get("Longitude offset"), Some(0.0));
        assert!(group.contains("Longitude offset"));
        assert!(!group.contains("Scale factor"));
    }
}
