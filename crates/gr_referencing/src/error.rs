// georef\crates\gr_referencing\src/error.rs

//! 坐标参考引擎错误类型
//!
//! 包含操作解析、变换构造、参数补全相关的错误。
//! 基础错误可从 `gr_foundation::FoundationError` 向上传播。
//!
//! # 错误分类
//!
//! - **解析错误**：找不到结构路径、检测到递归定义
//! - **构造错误**：方法名未注册、参数无效、维度不匹配
//! - **反转错误**：逆向步骤所需的转换不可逆

use gr_foundation::FoundationError;
use thiserror::Error;

/// Referencing 模块结果类型
pub type RefResult<T> = Result<T, RefError>;

/// 坐标参考引擎错误
#[derive(Error, Debug)]
pub enum RefError {
    /// 找不到从源到目标的坐标操作
    #[error("未找到坐标操作: {source_crs} -> {target_crs} ({reason})")]
    OperationNotFound {
        /// 源 CRS 名称
        source_crs: String,
        /// 目标 CRS 名称
        target_crs: String,
        /// 失败原因
        reason: String,
    },

    /// 检测到递归的 CRS 定义
    #[error("递归的 CRS 定义: {source_crs} -> {target_crs} 正在解析中")]
    RecursiveConstruction {
        /// 源 CRS 名称
        source_crs: String,
        /// 目标 CRS 名称
        target_crs: String,
    },

    /// 操作方法名/标识符未注册
    #[error("未知的操作方法: {name}")]
    NoSuchIdentifier {
        /// 请求的名称或标识符
        name: String,
    },

    /// 参数值无效
    #[error("参数值无效: {parameter}={value}: {reason}")]
    InvalidParameterValue {
        /// 参数名
        parameter: String,
        /// 实际值
        value: f64,
        /// 无效原因
        reason: String,
    },

    /// 缺少必需参数
    #[error("缺少必需参数: {parameter}")]
    MissingParameter {
        /// 参数名
        parameter: String,
    },

    /// 大地参数无效（构造器无法识别的维度调整等）
    #[error("大地参数无效: {message}")]
    InvalidGeodeticParameter {
        /// 具体错误信息
        message: String,
    },

    /// 转换不可逆
    #[error("转换不可逆: {name}")]
    NonInvertible {
        /// 失败的转换名称
        name: String,
    },

    /// 维度不匹配
    #[error("维度不匹配 ({context}): 期望 {expected}, 实际 {actual}")]
    DimensionMismatch {
        /// 期望维度
        expected: usize,
        /// 实际维度
        actual: usize,
        /// 发生位置说明
        context: &'static str,
    },

    /// 一般构造失败
    #[error("构造失败: {message}")]
    Factory {
        /// 失败说明
        message: String,
    },

    /// 基础层错误
    #[error(transparent)]
    Foundation(#[from] FoundationError),
}

// ============================================================================
// 便捷构造方法
// ============================================================================

impl RefError {
    /// 找不到操作
    pub fn operation_not_found(
        source_crs: impl Into<String>,
        target_crs: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::OperationNotFound {
            source_crs: source_crs.into(),
            target_crs: target_crs.into(),
            reason: reason.into(),
        }
    }

    /// 递归定义
    pub fn recursive(source_crs: impl Into<String>, target_crs: impl Into<String>) -> Self {
        Self::RecursiveConstruction {
            source_crs: source_crs.into(),
            target_crs: target_crs.into(),
        }
    }

    /// 未知方法
    pub fn no_such_identifier(name: impl Into<String>) -> Self {
        Self::NoSuchIdentifier { name: name.into() }
    }

    /// 参数值无效
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: f64,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameterValue {
            parameter: parameter.into(),
            value,
            reason: reason.into(),
        }
    }

    /// 缺少参数
    pub fn missing_parameter(parameter: impl Into<String>) -> Self {
        Self::MissingParameter {
            parameter: parameter.into(),
        }
    }

    /// 大地参数无效
    pub fn invalid_geodetic(message: impl Into<String>) -> Self {
        Self::InvalidGeodeticParameter {
            message: message.into(),
        }
    }

    /// 不可逆
    pub fn non_invertible(name: impl Into<String>) -> Self {
        Self::NonInvertible { name: name.into() }
    }

    /// 维度不匹配
    pub fn dimension_mismatch(context: &'static str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            expected,
            actual,
            context,
        }
    }

    /// 一般构造失败
    pub fn factory(message: impl Into<String>) -> Self {
        Self::Factory {
            message: message.into(),
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
    fn test_error_display() {
        let err = RefError::operation_not_found("A", "B", "无结构路径");
        assert!(err.to_string().contains("A -> B"));

        let err = RefError::no_such_identifier("Mercator");
        assert!(err.to_string().contains("Mercator"));
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = RefError::dimension_mismatch("级联", 3, 2);
        assert!(err.to_string().contains('3'));
        assert!(err.to_string().contains('2'));
    }

    #[test]
    fn test_foundation_conversion() {
        let base = FoundationError::invalid_input("测试");
        let err: RefError = base.into();
        assert!(matches!(err, RefError::Foundation(_)));
    }
}
