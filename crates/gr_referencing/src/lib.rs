// georef\crates\gr_referencing\src/lib.rs

//! GeoRef 坐标参照引擎
//!
//! 提供大地参照的解析-构建核心：给定源/目标坐标参照系 (CRS)，
//! 找出并构建把坐标元组从一个系统正确映射到另一个系统的操作链，
//! 处理基准面差异、轴序/方向、计量单位与 2D/3D 维数变化。
//!
//! # 模块
//!
//! - `crs` / `datum` / `ellipsoid` / `axis` / `extent`: 数据模型
//! - `matrix` / `transform`: 仿射矩阵与数学变换
//! - `operation` / `methods`: 操作元数据与方法目录
//! - `builder` / `context` / `pool`: 变换构建器、上下文与共享池
//! - `resolver`: 操作解析器
//! - `authority`: 外部协作者契约
//!
//! # 示例
//!
//! ```
//! use gr_referencing::prelude::*;
//! use std::sync::Arc;
//!
//! let builder = Arc::new(TransformBuilder::new());
//! let resolver = OperationResolver::new(builder);
//!
//! // 同基准面的轴序适配: (纬,经) -> (经,纬)
//! let lat_lon = Crs::wgs84();
//! let lon_lat = Crs::geographic(
//!     "WGS 84 (lon-lat)",
//!     GeodeticDatum::wgs84(),
//!     CoordinateSystem::ellipsoidal_lon_lat(),
//! );
//! let ops = resolver.resolve(&lat_lon, &lon_lat, None, None).unwrap();
//! let out = ops[0].transform.apply(&[39.9, 116.4]).unwrap();
//! assert_eq!(out, vec![116.4, 39.9]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod authority;
pub mod axis;
pub mod builder;
pub mod context;
pub mod crs;
pub mod datum;
pub mod ellipsoid;
pub mod error;
pub mod extent;
pub mod matrix;
pub mod methods;
pub mod operation;
pub mod pool;
pub mod resolver;
pub mod transform;

/// 预导入模块
pub mod prelude {
    pub use crate::authority::{
        AccuracyPolicy, AuthorityRegistry, DatumShiftFamily, DatumShiftSource,
        DefaultAccuracyPolicy,
    };
    pub use crate::axis::{Axis, AxisDirection, CoordinateSystem, CsType, Unit};
    pub use crate::builder::{BuiltTransform, TransformBuilder};
    pub use crate::context::{ParameterOrigin, TransformContext};
    pub use crate::crs::{CompoundCrs, Conversion, Crs, DerivedCrs, GeodeticCrs, VerticalCrs};
    pub use crate::datum::{
        BursaWolfParameters, EngineeringDatum, GeodeticDatum, PrimeMeridian, TemporalDatum,
        VerticalDatum, VerticalDatumKind,
    };
    pub use crate::ellipsoid::Ellipsoid;
    pub use crate::error::{RefError, RefResult};
    pub use crate::extent::GeographicBoundingBox;
    pub use crate::matrix::Matrix;
    pub use crate::operation::{
        CoordinateOperation, OperationCategory, OperationMethod, ParameterValueGroup,
    };
    pub use crate::pool::TransformPool;
    pub use crate::resolver::OperationResolver;
    pub use crate::transform::MathTransform;
}

// 重导出常用类型
pub use builder::{BuiltTransform, TransformBuilder};
pub use crs::Crs;
pub use ellipsoid::Ellipsoid;
pub use error::{RefError, RefResult};
pub use matrix::Matrix;
pub use operation::{CoordinateOperation, OperationCategory, ParameterValueGroup};
pub use resolver::OperationResolver;
pub use transform::MathTransform;
