// georef\crates\gr_referencing\src/methods.rs

//! 操作方法目录
//!
//! `OperationMethodProvider` 是按操作族实现一次的能力接口：
//! 从参数值组构建 `MathTransform`。提供者是无状态纯函数，
//! 线程安全；投影公式目录不在本层（外部协作者）。
//!
//! `MethodRegistry` 维护方法名/EPSG 代码到提供者的共享索引，
//! 读写锁只罩住索引本身，提供者调用一律在锁外进行。
//!
//! 内置方法（EPSG 代码）：
//! - 9624 参数化仿射
//! - 9601 经度旋转
//! - 9602 地理/地心转换
//! - 9603 地心平移（地理域）
//! - 9606 位置矢量变换
//! - 9607 坐标框架旋转
//! - 9604 Molodensky
//! - 9605 简化 Molodensky

use crate::axis::Unit;
use crate::context::TransformContext;
use crate::datum::BursaWolfParameters;
use crate::ellipsoid::Ellipsoid;
use crate::error::{RefError, RefResult};
use crate::matrix::Matrix;
use crate::operation::{
    OperationMethod, ParameterDescriptor, ParameterDescriptorGroup, ParameterValueGroup,
};
use crate::transform::MathTransform;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// 能力接口
// ============================================================================

/// 操作方法提供者：从参数构建变换的能力
pub trait OperationMethodProvider: Send + Sync {
    /// 方法元数据
    fn method(&self) -> &OperationMethod;

    /// 从（已补全的）参数构建归一化变换
    ///
    /// 归一化约定：消费/产出规范轴序与单位
    /// （东,北,上；度/米/秒）。
    ///
    /// # Errors
    /// 参数缺失或非法时返回错误
    fn build(
        &self,
        params: &ParameterValueGroup,
        context: Option<&TransformContext>,
    ) -> RefResult<MathTransform>;
}

/// 方法名归一化：忽略大小写与分隔符
#[must_use]
pub fn normalize_method_name(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

// ============================================================================
// 注册表
// ============================================================================

struct RegistryInner {
    providers: Vec<Arc<dyn OperationMethodProvider>>,
    by_id: HashMap<u32, usize>,
    by_name: HashMap<String, usize>,
}

/// 方法注册表（共享、长寿命、线程安全）
pub struct MethodRegistry {
    inner: RwLock<RegistryInner>,
}

impl MethodRegistry {
    /// 空注册表
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                providers: Vec::new(),
                by_id: HashMap::new(),
                by_name: HashMap::new(),
            }),
        }
    }

    /// 带全部内置方法的注册表
    #[must_use]
    pub fn with_builtins() -> Self {
        let reg = Self::new();
        reg.register(Arc::new(AffineProvider::new()));
        reg.register(Arc::new(LongitudeRotationProvider::new()));
        reg.register(Arc::new(GeographicToGeocentricProvider::new()));
        reg.register(Arc::new(GeocentricToGeographicProvider::new()));
        reg.register(Arc::new(GeocentricTranslationsProvider::new()));
        reg.register(Arc::new(HelmertProvider::position_vector()));
        reg.register(Arc::new(HelmertProvider::coordinate_frame()));
        reg.register(Arc::new(MolodenskyProvider::full()));
        reg.register(Arc::new(MolodenskyProvider::abridged()));
        reg
    }

    /// 注册提供者（代码与归一化名都入索引，后注册者不覆盖先注册者）
    pub fn register(&self, provider: Arc<dyn OperationMethodProvider>) {
        let mut inner = self.inner.write();
        let idx = inner.providers.len();
        let method = provider.method();
        if let Some(id) = method.identifier {
            inner.by_id.entry(id).or_insert(idx);
        }
        let key = normalize_method_name(method.name);
        inner.by_name.entry(key).or_insert(idx);
        inner.providers.push(provider);
    }

    /// 按 EPSG 代码优先、方法名兜底查找提供者
    ///
    /// 返回克隆的 `Arc`，调用方在锁外调用提供者。
    ///
    /// # Errors
    /// 两路都未命中时返回 `NoSuchIdentifier`
    pub fn find(
        &self,
        identifier: Option<u32>,
        name: &str,
    ) -> RefResult<Arc<dyn OperationMethodProvider>> {
        let inner = self.inner.read();
        if let Some(id) = identifier {
            if let Some(&idx) = inner.by_id.get(&id) {
                return Ok(inner.providers[idx].clone());
            }
        }
        let key = normalize_method_name(name);
        if let Some(&idx) = inner.by_name.get(&key) {
            return Ok(inner.providers[idx].clone());
        }
        Err(RefError::no_such_identifier(name))
    }
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// ============================================================================
// 共用参数描述符
// ============================================================================

fn ellipsoid_pair_descriptors() -> Vec<ParameterDescriptor> {
    vec![
        ParameterDescriptor::required("src_semi_major", Unit::Metre),
        ParameterDescriptor::required("src_semi_minor", Unit::Metre),
        ParameterDescriptor::required("tgt_semi_major", Unit::Metre),
        ParameterDescriptor::required("tgt_semi_minor", Unit::Metre),
    ]
}

fn translation_descriptors() -> Vec<ParameterDescriptor> {
    vec![
        ParameterDescriptor::optional("X-axis translation", 0.0, Unit::Metre),
        ParameterDescriptor::optional("Y-axis translation", 0.0, Unit::Metre),
        ParameterDescriptor::optional("Z-axis translation", 0.0, Unit::Metre),
    ]
}

fn require_dim(params: &ParameterValueGroup, default: usize) -> RefResult<usize> {
    let raw = params.get_or("dim", default as f64);
    let dim = raw as usize;
    if (dim == 2 || dim == 3) && (dim as f64 - raw).abs() < f64::EPSILON {
        Ok(dim)
    } else {
        Err(RefError::invalid_parameter(
            "dim",
            raw,
            "维数只能是 2 或 3",
        ))
    }
}

fn read_bursa_wolf(params: &ParameterValueGroup) -> BursaWolfParameters {
    BursaWolfParameters {
        tx: params.get_or("X-axis translation", 0.0),
        ty: params.get_or("Y-axis translation", 0.0),
        tz: params.get_or("Z-axis translation", 0.0),
        rx: params.get_or("X-axis rotation", 0.0),
        ry: params.get_or("Y-axis rotation", 0.0),
        rz: params.get_or("Z-axis rotation", 0.0),
        ds_ppm: params.get_or("Scale difference", 0.0),
        domain: None,
        accuracy: None,
    }
}

/// 地理域基准位移链：地理 -> 地心 -> 位移 -> 地心 -> 地理
fn geocentric_chain(
    params: &ParameterValueGroup,
    shift: Matrix,
    dim: usize,
) -> RefResult<MathTransform> {
    let src_a = params.require("src_semi_major")?;
    let src_b = params.require("src_semi_minor")?;
    let tgt_a = params.require("tgt_semi_major")?;
    let tgt_b = params.require("tgt_semi_minor")?;
    let to_geoc = Arc::new(MathTransform::GeographicToGeocentric {
        a: src_a,
        b: src_b,
        dim,
    });
    let shift = Arc::new(MathTransform::Linear(shift));
    let to_geog = Arc::new(MathTransform::GeocentricToGeographic {
        a: tgt_a,
        b: tgt_b,
        dim,
    });
    let head = Arc::new(MathTransform::concatenate(&to_geoc, &shift)?);
    MathTransform::concatenate(&head, &to_geog)
}

// ============================================================================
// 参数化仿射 (9624)
// ============================================================================

/// 参数化仿射变换：`num_row`/`num_col` 给出齐次矩阵形状，
/// `elt_<r>_<c>` 给出非缺省元素（缺省为同形单位阵）
pub struct AffineProvider {
    method: OperationMethod,
}

impl AffineProvider {
    /// 创建提供者
    #[must_use]
    pub fn new() -> Self {
        Self {
            method: OperationMethod {
                name: "Affine parametric transformation",
                identifier: Some(9624),
                source_dim: None,
                target_dim: None,
                parameters: ParameterDescriptorGroup {
                    name: "Affine parametric transformation",
                    descriptors: vec![
                        ParameterDescriptor::count("num_row", 4.0),
                        ParameterDescriptor::count("num_col", 4.0),
                    ],
                },
            },
        }
    }
}

impl Default for AffineProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationMethodProvider for AffineProvider {
    fn method(&self) -> &OperationMethod {
        &self.method
    }

    fn build(
        &self,
        params: &ParameterValueGroup,
        _context: Option<&TransformContext>,
    ) -> RefResult<MathTransform> {
        let rows = params.get_or("num_row", 4.0) as usize;
        let cols = params.get_or("num_col", 4.0) as usize;
        if rows < 2 || cols < 2 {
            return Err(RefError::invalid_parameter(
                "num_row",
                rows as f64,
                "齐次矩阵至少 2x2",
            ));
        }
        let mut m = if rows == cols {
            Matrix::identity(rows)
        } else {
            // 非方阵缺省：坐标块对角置 1，齐次末行只有右下角为 1
            let mut z = Matrix::zeros(rows, cols);
            for i in 0..(rows - 1).min(cols - 1) {
                z.set(i, i, 1.0);
            }
            z.set(rows - 1, cols - 1, 1.0);
            z
        };
        for pv in params.iter() {
            let Some(rest) = pv.name.strip_prefix("elt_") else {
                continue;
            };
            let Some((r, c)) = rest.split_once('_') else {
                continue;
            };
            let (Ok(r), Ok(c)) = (r.parse::<usize>(), c.parse::<usize>()) else {
                return Err(RefError::invalid_parameter(
                    &pv.name,
                    pv.value,
                    "矩阵元素下标无法解析",
                ));
            };
            if r >= rows || c >= cols {
                return Err(RefError::invalid_parameter(
                    &pv.name,
                    pv.value,
                    "矩阵元素下标越界",
                ));
            }
            m.set(r, c, pv.value);
        }
        if !m.is_affine() {
            return Err(RefError::invalid_geodetic("仿射矩阵末行必须是 [0..0 1]"));
        }
        Ok(MathTransform::Linear(m))
    }
}

// ============================================================================
// 经度旋转 (9601)
// ============================================================================

/// 经度旋转：规范地理坐标第 0 轴（经度）加偏移量
pub struct LongitudeRotationProvider {
    method: OperationMethod,
}

impl LongitudeRotationProvider {
    /// 创建提供者
    #[must_use]
    pub fn new() -> Self {
        Self {
            method: OperationMethod {
                name: "Longitude rotation",
                identifier: Some(9601),
                source_dim: None,
                target_dim: None,
                parameters: ParameterDescriptorGroup {
                    name: "Longitude rotation",
                    descriptors: vec![ParameterDescriptor::required(
                        "Longitude offset",
                        Unit::Degree,
                    )],
                },
            },
        }
    }
}

impl Default for LongitudeRotationProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationMethodProvider for LongitudeRotationProvider {
    fn method(&self) -> &OperationMethod {
        &self.method
    }

    fn build(
        &self,
        params: &ParameterValueGroup,
        _context: Option<&TransformContext>,
    ) -> RefResult<MathTransform> {
        let offset = params.require("Longitude offset")?;
        let dim = require_dim(params, 2)?;
        let mut m = Matrix::identity(dim + 1);
        m.add_translation(0, offset);
        Ok(MathTransform::Linear(m))
    }
}

// ============================================================================
// 地理/地心转换 (9602)
// ============================================================================

fn geographic_geocentric_descriptors() -> ParameterDescriptorGroup {
    ParameterDescriptorGroup {
        name: "Geographic/geocentric conversions",
        descriptors: vec![
            ParameterDescriptor::required("semi_major", Unit::Metre),
            ParameterDescriptor::required("semi_minor", Unit::Metre),
            ParameterDescriptor::count("dim", 3.0),
        ],
    }
}

/// 地理 -> 地心转换
pub struct GeographicToGeocentricProvider {
    method: OperationMethod,
}

impl GeographicToGeocentricProvider {
    /// 创建提供者
    #[must_use]
    pub fn new() -> Self {
        Self {
            method: OperationMethod {
                name: "Geographic to geocentric conversion",
                identifier: Some(9602),
                source_dim: None,
                target_dim: Some(3),
                parameters: geographic_geocentric_descriptors(),
            },
        }
    }
}

impl Default for GeographicToGeocentricProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationMethodProvider for GeographicToGeocentricProvider {
    fn method(&self) -> &OperationMethod {
        &self.method
    }

    fn build(
        &self,
        params: &ParameterValueGroup,
        _context: Option<&TransformContext>,
    ) -> RefResult<MathTransform> {
        Ok(MathTransform::GeographicToGeocentric {
            a: params.require("semi_major")?,
            b: params.require("semi_minor")?,
            dim: require_dim(params, 3)?,
        })
    }
}

/// 地心 -> 地理转换（与 9602 同族，按名查找）
pub struct GeocentricToGeographicProvider {
    method: OperationMethod,
}

impl GeocentricToGeographicProvider {
    /// 创建提供者
    #[must_use]
    pub fn new() -> Self {
        Self {
            method: OperationMethod {
                name: "Geocentric to geographic conversion",
                identifier: None,
                source_dim: Some(3),
                target_dim: None,
                parameters: geographic_geocentric_descriptors(),
            },
        }
    }
}

impl Default for GeocentricToGeographicProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationMethodProvider for GeocentricToGeographicProvider {
    fn method(&self) -> &OperationMethod {
        &self.method
    }

    fn build(
        &self,
        params: &ParameterValueGroup,
        _context: Option<&TransformContext>,
    ) -> RefResult<MathTransform> {
        Ok(MathTransform::GeocentricToGeographic {
            a: params.require("semi_major")?,
            b: params.require("semi_minor")?,
            dim: require_dim(params, 3)?,
        })
    }
}

// ============================================================================
// 地心平移 (9603)
// ============================================================================

/// 地心平移（地理域）：三参数基准位移
pub struct GeocentricTranslationsProvider {
    method: OperationMethod,
}

impl GeocentricTranslationsProvider {
    /// 创建提供者
    #[must_use]
    pub fn new() -> Self {
        let mut descriptors = translation_descriptors();
        descriptors.extend(ellipsoid_pair_descriptors());
        descriptors.push(ParameterDescriptor::count("dim", 2.0));
        Self {
            method: OperationMethod {
                name: "Geocentric translations (geog2D domain)",
                identifier: Some(9603),
                source_dim: None,
                target_dim: None,
                parameters: ParameterDescriptorGroup {
                    name: "Geocentric translations (geog2D domain)",
                    descriptors,
                },
            },
        }
    }
}

impl Default for GeocentricTranslationsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationMethodProvider for GeocentricTranslationsProvider {
    fn method(&self) -> &OperationMethod {
        &self.method
    }

    fn build(
        &self,
        params: &ParameterValueGroup,
        _context: Option<&TransformContext>,
    ) -> RefResult<MathTransform> {
        let dim = require_dim(params, 2)?;
        let bw = read_bursa_wolf(params);
        let mut shift = Matrix::identity(4);
        shift.set(0, 3, bw.tx);
        shift.set(1, 3, bw.ty);
        shift.set(2, 3, bw.tz);
        geocentric_chain(params, shift, dim)
    }
}

// ============================================================================
// 七参数变换 (9606/9607)
// ============================================================================

/// 七参数 Bursa-Wolf 变换（地理域），位置矢量或坐标框架约定
///
/// 旋转参数单位为角秒；`Scale difference` 是 ppm 比率（无量纲，
/// 描述符不标单位）。
pub struct HelmertProvider {
    method: OperationMethod,
    coordinate_frame: bool,
}

impl HelmertProvider {
    fn descriptors(name: &'static str) -> ParameterDescriptorGroup {
        let mut descriptors = translation_descriptors();
        descriptors.push(ParameterDescriptor::optional(
            "X-axis rotation",
            0.0,
            Unit::ArcSecond,
        ));
        descriptors.push(ParameterDescriptor::optional(
            "Y-axis rotation",
            0.0,
            Unit::ArcSecond,
        ));
        descriptors.push(ParameterDescriptor::optional(
            "Z-axis rotation",
            0.0,
            Unit::ArcSecond,
        ));
        // 尺度差为 ppm 比率，无量纲
        descriptors.push(ParameterDescriptor {
            name: "Scale difference",
            default: Some(0.0),
            unit: None,
        });
        descriptors.extend(ellipsoid_pair_descriptors());
        descriptors.push(ParameterDescriptor::count("dim", 2.0));
        ParameterDescriptorGroup { name, descriptors }
    }

    /// 位置矢量约定 (EPSG 9606)
    #[must_use]
    pub fn position_vector() -> Self {
        Self {
            method: OperationMethod {
                name: "Position Vector transformation (geog2D domain)",
                identifier: Some(9606),
                source_dim: None,
                target_dim: None,
                parameters: Self::descriptors("Position Vector transformation (geog2D domain)"),
            },
            coordinate_frame: false,
        }
    }

    /// 坐标框架约定 (EPSG 9607)，旋转角符号相反
    #[must_use]
    pub fn coordinate_frame() -> Self {
        Self {
            method: OperationMethod {
                name: "Coordinate Frame rotation (geog2D domain)",
                identifier: Some(9607),
                source_dim: None,
                target_dim: None,
                parameters: Self::descriptors("Coordinate Frame rotation (geog2D domain)"),
            },
            coordinate_frame: true,
        }
    }
}

impl OperationMethodProvider for HelmertProvider {
    fn method(&self) -> &OperationMethod {
        &self.method
    }

    fn build(
        &self,
        params: &ParameterValueGroup,
        _context: Option<&TransformContext>,
    ) -> RefResult<MathTransform> {
        let dim = require_dim(params, 2)?;
        let bw = read_bursa_wolf(params);
        let shift = if self.coordinate_frame {
            bw.coordinate_frame_matrix()
        } else {
            bw.position_vector_matrix()
        };
        geocentric_chain(params, shift, dim)
    }
}

// ============================================================================
// Molodensky (9604/9605)
// ============================================================================

/// Molodensky / 简化 Molodensky 基准位移（全程地理坐标）
pub struct MolodenskyProvider {
    method: OperationMethod,
    abridged: bool,
}

impl MolodenskyProvider {
    fn descriptors(name: &'static str) -> ParameterDescriptorGroup {
        let mut descriptors = translation_descriptors();
        descriptors.extend(ellipsoid_pair_descriptors());
        descriptors.push(ParameterDescriptor::count("dim", 2.0));
        ParameterDescriptorGroup { name, descriptors }
    }

    /// 完整 Molodensky (EPSG 9604)
    #[must_use]
    pub fn full() -> Self {
        Self {
            method: OperationMethod {
                name: "Molodensky",
                identifier: Some(9604),
                source_dim: None,
                target_dim: None,
                parameters: Self::descriptors("Molodensky"),
            },
            abridged: false,
        }
    }

    /// 简化 Molodensky (EPSG 9605)
    #[must_use]
    pub fn abridged() -> Self {
        Self {
            method: OperationMethod {
                name: "Abridged Molodensky",
                identifier: Some(9605),
                source_dim: None,
                target_dim: None,
                parameters: Self::descriptors("Abridged Molodensky"),
            },
            abridged: true,
        }
    }
}

impl OperationMethodProvider for MolodenskyProvider {
    fn method(&self) -> &OperationMethod {
        &self.method
    }

    fn build(
        &self,
        params: &ParameterValueGroup,
        _context: Option<&TransformContext>,
    ) -> RefResult<MathTransform> {
        let dim = require_dim(params, 2)?;
        let src_a = params.require("src_semi_major")?;
        let src_b = params.require("src_semi_minor")?;
        let tgt_a = params.require("tgt_semi_major")?;
        let tgt_b = params.require("tgt_semi_minor")?;
        // 扁率差用双倍精度换算，避免轴长往返损失
        let src = Ellipsoid::from_semi_axes(src_a, src_b);
        let tgt = Ellipsoid::from_semi_axes(tgt_a, tgt_b);
        Ok(MathTransform::Molodensky {
            a: src.a,
            f: src.f,
            da: tgt.a - src.a,
            df: tgt.f - src.f,
            dx: params.get_or("X-axis translation", 0.0),
            dy: params.get_or("Y-axis translation", 0.0),
            dz: params.get_or("Z-axis translation", 0.0),
            dim,
            abridged: self.abridged,
        })
    }
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_method_name() {
        assert_eq!(
            normalize_method_name("Geographic/geocentric conversions"),
            "geographicgeocentricconversions"
        );
        assert_eq!(
            normalize_method_name("Position_Vector transformation"),
            normalize_method_name("position vector Transformation")
        );
    }

    #[test]
    fn test_registry_lookup_identifier_first() {
        let reg = MethodRegistry::with_builtins();
        // 代码命中时名字被忽略
        let p = reg.find(Some(9601), "不存在的名字").expect("by id");
        assert_eq!(p.method().name, "Longitude rotation");
        // 代码未命中回退名字
        let p = reg.find(Some(99999), "Molodensky").expect("by name");
        assert_eq!(p.method().identifier, Some(9604));
        assert!(matches!(
            reg.find(None, "海拔投影"),
            Err(RefError::NoSuchIdentifier { .. })
        ));
    }

    #[test]
    fn test_affine_provider() {
        let reg = MethodRegistry::with_builtins();
        let p = reg.find(Some(9624), "").expect("affine");
        let params = ParameterValueGroup::new("Affine parametric transformation")
            .with("num_row", 3.0)
            .with("num_col", 3.0)
            .with("elt_0_0", 2.0)
            .with("elt_1_2", 5.0);
        let t = p.build(&params, None).expect("build");
        let out = t.apply(&[3.0, 1.0]).expect("apply");
        assert!((out[0] - 6.0).abs() < 1e-12);
        assert!((out[1] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_affine_nonsquare_defaults() {
        let p = AffineProvider::new();
        // 3x4 缺省矩阵: 丢弃末维
        let params = ParameterValueGroup::new("Affine parametric transformation")
            .with("num_row", 3.0)
            .with("num_col", 4.0);
        let t = p.build(&params, None).expect("3x4");
        let out = t.apply(&[1.0, 2.0, 3.0]).expect("apply");
        assert_eq!(out, vec![1.0, 2.0]);
        // 4x3 缺省矩阵: 末维补常数 0
        let params = ParameterValueGroup::new("Affine parametric transformation")
            .with("num_row", 4.0)
            .with("num_col", 3.0);
        let t = p.build(&params, None).expect("4x3");
        let out = t.apply(&[1.0, 2.0]).expect("apply");
        assert_eq!(out, vec![1.0, 2.0, 0.0]);
    }

    #[test]
    fn test_affine_rejects_bad_element() {
        let p = AffineProvider::new();
        let params = ParameterValueGroup::new("Affine parametric transformation")
            .with("num_row", 3.0)
            .with("num_col", 3.0)
            .with("elt_9_9", 1.0);
        assert!(matches!(
            p.build(&params, None),
            Err(RefError::InvalidParameterValue { .. })
        ));
    }

    #[test]
    fn test_longitude_rotation() {
        let p = LongitudeRotationProvider::new();
        let params = ParameterValueGroup::new("Longitude rotation").with("Longitude offset", 2.337_229_166_666_667);
        let t = p.build(&params, None).expect("build");
        let out = t.apply(&[0.0, 48.0]).expect("apply");
        // 巴黎子午线 -> 格林尼治
        assert!((out[0] - 2.337_229_166_666_667).abs() < 1e-12);
        assert!((out[1] - 48.0).abs() < 1e-12);
    }

    #[test]
    fn test_geocentric_translations_epsg_sample() {
        // EPSG 指南示例: WGS84 -> ED50, (84.87, 96.49, 116.95)
        let p = GeocentricTranslationsProvider::new();
        let wgs84 = Ellipsoid::WGS84;
        let intl = Ellipsoid::INTERNATIONAL_1924;
        let params = ParameterValueGroup::new("Geocentric translations (geog2D domain)")
            .with("X-axis translation", 84.87)
            .with("Y-axis translation", 96.49)
            .with("Z-axis translation", 116.95)
            .with("src_semi_major", wgs84.a)
            .with("src_semi_minor", wgs84.semi_minor())
            .with("tgt_semi_major", intl.a)
            .with("tgt_semi_minor", intl.semi_minor())
            .with("dim", 3.0);
        let t = p.build(&params, None).expect("build");
        let out = t.apply(&[2.129_549_444, 53.809_394_444, 73.0]).expect("apply");
        // ED50 期望值 2°07'51.477"E, 53°48'36.565"N, h≈28 m
        assert!((out[0] - 2.130_965_833).abs() < 1e-5);
        assert!((out[1] - 53.810_156_944).abs() < 1e-5);
        assert!((out[2] - 28.0).abs() < 0.5);
    }

    #[test]
    fn test_helmert_conventions_differ() {
        let wgs84 = Ellipsoid::WGS84;
        let base = ParameterValueGroup::new("helmert")
            .with("Z-axis rotation", 0.554)
            .with("src_semi_major", wgs84.a)
            .with("src_semi_minor", wgs84.semi_minor())
            .with("tgt_semi_major", wgs84.a)
            .with("tgt_semi_minor", wgs84.semi_minor())
            .with("dim", 2.0);
        let pv = HelmertProvider::position_vector()
            .build(&base, None)
            .expect("pv");
        let cf = HelmertProvider::coordinate_frame()
            .build(&base, None)
            .expect("cf");
        let p = [10.0, 50.0];
        let out_pv = pv.apply(&p).expect("pv apply");
        let out_cf = cf.apply(&p).expect("cf apply");
        // 两种约定旋转方向相反，经度偏移对称
        let d_pv = out_pv[0] - p[0];
        let d_cf = out_cf[0] - p[0];
        assert!(d_pv.abs() > 1e-7);
        assert!((d_pv + d_cf).abs() < 1e-9);
    }
}
