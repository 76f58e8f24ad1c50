// georef\crates\gr_foundation\src/lib.rs

//! GeoRef Foundation Layer
//!
//! 零重依赖基础层，提供整个项目的基础抽象。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型
//! - [`dd`]: 双倍精度 (double-double) 算术，用于椭球参数补全
//!
//! # 设计原则
//!
//! 1. **零重依赖**: 仅依赖 serde 和 thiserror
//! 2. **数值可靠**: 代数运算保持 1 ULP 级往返精度
//! 3. **零开销抽象**: release 模式下最小化运行时开销

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dd;
pub mod error;

// 重导出常用类型
pub use dd::DoubleDouble;
pub use error::{FoundationError, FoundationResult};
