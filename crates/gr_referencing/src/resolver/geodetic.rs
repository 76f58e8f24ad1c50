// georef\crates\gr_referencing\src/resolver/geodetic.rs

//! 大地 ↔ 大地解析（基准位移核心）
//!
//! 基准面等价时只剩轴序/单位/坐标系类别差异；不等价时先取
//! Bursa-Wolf 参数（位移来源优先，基准面自带声明兜底），按
//! 精度策略选操作族：双侧地理走提供者路径（9603/9604/9605/
//! 9606），其余坐标系组合走显式三步兜底（地理→地心、位移
//! 矩阵、地心→地理），对外仍是一个级联后的单一操作。
//!
//! 本初子午线差异建模为位移前（源侧）/位移后（目标侧）的经度
//! 旋转，且只施加在地理坐标一侧：地心或混合组合中非格林尼治
//! 本初子午线不做旋转（地心轴按格林尼治 X 轴解释）。两侧都非
//! 格林尼治时先后次序存在歧义。两者都按既有行为保留为文档化
//! 限制：经验位移参数默认在格林尼治下标定。

use super::OperationResolver;
use crate::authority::DatumShiftFamily;
use crate::axis::{swap_and_scale, CoordinateSystem};
use crate::context::TransformContext;
use crate::crs::{Crs, GeodeticCrs};
use crate::datum::BursaWolfParameters;
use crate::error::{RefError, RefResult};
use crate::extent::GeographicBoundingBox;
use crate::matrix::Matrix;
use crate::operation::{CoordinateOperation, OperationCategory, ParameterValueGroup};
use crate::transform::MathTransform;
use std::sync::Arc;

/// 应用了经验位移时的缺省精度 (m)
pub const DATUM_SHIFT_ACCURACY_M: f64 = 25.0;
/// 仅椭球变化（基准面不同但无位移参数）时的缺省精度 (m)
pub const ELLIPSOID_CHANGE_ACCURACY_M: f64 = 3000.0;

#[allow(clippy::too_many_arguments)]
pub(super) fn resolve(
    resolver: &OperationResolver,
    source_crs: &Crs,
    source: &GeodeticCrs,
    target_crs: &Crs,
    target: &GeodeticCrs,
    aoi: Option<&GeographicBoundingBox>,
    desired_accuracy: Option<f64>,
) -> RefResult<Vec<CoordinateOperation>> {
    if source.datum.equals_ignore_metadata(&target.datum) {
        // 同基准面：坐标系类别不同走地理/地心转换，否则纯轴适配
        let op = if source.cs.cs_type == target.cs.cs_type {
            resolver.axis_change_operation(source_crs, target_crs)?
        } else {
            geographic_geocentric_conversion(resolver, source_crs, source, target_crs, target)?
        };
        return Ok(vec![op]);
    }

    // 基准面不同：找位移参数，找不到按仅椭球变化处理
    let found = resolver
        .shift_source
        .as_ref()
        .and_then(|s| s.shift_for(&source.datum, &target.datum, aoi))
        .or_else(|| source.datum.bursa_wolf_to(&target.datum, aoi));
    let (shift, accuracy) = match found {
        Some(bw) => {
            let acc = bw.accuracy.unwrap_or(DATUM_SHIFT_ACCURACY_M);
            (bw, acc)
        }
        None => {
            log::debug!(
                "{} -> {} 无位移参数, 按仅椭球变化处理",
                source.datum.name,
                target.datum.name
            );
            (BursaWolfParameters::identity(), ELLIPSOID_CHANGE_ACCURACY_M)
        }
    };

    let mut chain: Vec<CoordinateOperation> = Vec::new();

    // 源侧本初子午线 -> 格林尼治
    let src_pm = source.datum.prime_meridian.greenwich_longitude;
    let tgt_pm = target.datum.prime_meridian.greenwich_longitude;
    if src_pm != 0.0 && tgt_pm != 0.0 {
        log::warn!(
            "源与目标本初子午线都非格林尼治 ({src_pm}, {tgt_pm}), 经度旋转次序存在歧义"
        );
    }
    if src_pm != 0.0 && source.is_geographic() {
        chain.push(longitude_rotation_op(
            resolver, source_crs, &source.cs, src_pm,
        )?);
    }

    // 位移本体
    let shift_op = if source.is_geographic() && target.is_geographic() {
        let family = resolver.accuracy_policy.select(&shift, desired_accuracy);
        log::debug!("基准位移选用操作族 {}", family.method_name());
        provider_shift(
            resolver, source_crs, source, target_crs, target, &shift, family, accuracy,
        )?
    } else {
        geocentric_fallback(
            resolver, source_crs, source, target_crs, target, &shift, accuracy,
        )?
    };
    chain.push(shift_op);

    // 目标侧格林尼治 -> 本初子午线
    if tgt_pm != 0.0 && target.is_geographic() {
        chain.push(longitude_rotation_op(
            resolver, target_crs, &target.cs, -tgt_pm,
        )?);
    }

    Ok(vec![resolver.concat_chain(chain)?])
}

/// 同基准面的地理 ↔ 地心转换，`dim` 取地理侧自身维数
fn geographic_geocentric_conversion(
    resolver: &OperationResolver,
    source_crs: &Crs,
    source: &GeodeticCrs,
    target_crs: &Crs,
    target: &GeodeticCrs,
) -> RefResult<CoordinateOperation> {
    let forward = source.is_geographic();
    let geographic = if forward { source } else { target };
    let method = if forward {
        "Geographic to geocentric conversion"
    } else {
        "Geocentric to geographic conversion"
    };
    let mut params =
        ParameterValueGroup::new(method).with("dim", geographic.cs.dimension() as f64);
    if forward {
        params.identifier = Some(9602);
    }
    let ctx = TransformContext::new()
        .with_source(source.cs.clone(), Some(source.datum.ellipsoid))
        .with_target(target.cs.clone(), Some(target.datum.ellipsoid));
    let built = resolver.builder.build(params, Some(ctx))?;
    Ok(CoordinateOperation::conversion(
        format!("{} -> {}", source_crs.name(), target_crs.name()),
        source_crs.clone(),
        target_crs.clone(),
        built.transform,
    )
    .with_method(built.method, built.parameters))
}

/// 双侧地理：按操作族走提供者路径，产出单一具名操作
#[allow(clippy::too_many_arguments)]
fn provider_shift(
    resolver: &OperationResolver,
    source_crs: &Crs,
    source: &GeodeticCrs,
    target_crs: &Crs,
    target: &GeodeticCrs,
    shift: &BursaWolfParameters,
    family: DatumShiftFamily,
    accuracy: f64,
) -> RefResult<CoordinateOperation> {
    let mut params = ParameterValueGroup::new(family.method_name())
        .with_identifier(family.identifier())
        .with("X-axis translation", shift.tx)
        .with("Y-axis translation", shift.ty)
        .with("Z-axis translation", shift.tz);
    if family == DatumShiftFamily::PositionVector {
        params.set("X-axis rotation", shift.rx);
        params.set("Y-axis rotation", shift.ry);
        params.set("Z-axis rotation", shift.rz);
        params.set("Scale difference", shift.ds_ppm);
    }
    let ctx = TransformContext::new()
        .with_source(source.cs.clone(), Some(source.datum.ellipsoid))
        .with_target(target.cs.clone(), Some(target.datum.ellipsoid));
    let built = resolver.builder.build(params, Some(ctx))?;
    Ok(CoordinateOperation::transformation(
        format!("{} -> {}", source_crs.name(), target_crs.name()),
        source_crs.clone(),
        target_crs.clone(),
        built.transform,
        Some(accuracy),
    )
    .with_method(built.method, built.parameters))
}

/// 坐标系组合没有捷径时的显式三步兜底：
/// 源 -> 地心、位移矩阵、地心 -> 目标，级联后仍是一个操作
fn geocentric_fallback(
    resolver: &OperationResolver,
    source_crs: &Crs,
    source: &GeodeticCrs,
    target_crs: &Crs,
    target: &GeodeticCrs,
    shift: &BursaWolfParameters,
    accuracy: f64,
) -> RefResult<CoordinateOperation> {
    let mut steps: Vec<Arc<MathTransform>> = Vec::new();

    // 源侧到规范地心
    if source.is_geographic() {
        steps.push(resolver.builder.create_affine(swap_and_scale(
            &source.cs,
            &source.cs.canonical(),
        )?));
        if source.cs.dimension() == 2 {
            steps.push(resolver.builder.create_affine(Matrix::append_dimension(2, 0.0)));
        }
        steps.push(resolver.builder.pool().unique(
            MathTransform::GeographicToGeocentric {
                a: source.datum.ellipsoid.a,
                b: source.datum.ellipsoid.semi_minor(),
                dim: 3,
            },
        ));
    } else {
        steps.push(resolver.builder.create_affine(swap_and_scale(
            &source.cs,
            &CoordinateSystem::geocentric(),
        )?));
    }

    // 位移矩阵（可能为恒等，级联时被吞并）
    steps.push(
        resolver
            .builder
            .create_affine(shift.position_vector_matrix()),
    );

    // 规范地心到目标侧
    if target.is_geographic() {
        steps.push(resolver.builder.pool().unique(
            MathTransform::GeocentricToGeographic {
                a: target.datum.ellipsoid.a,
                b: target.datum.ellipsoid.semi_minor(),
                dim: target.cs.dimension(),
            },
        ));
        steps.push(resolver.builder.create_affine(swap_and_scale(
            &target.cs.canonical(),
            &target.cs,
        )?));
    } else {
        steps.push(resolver.builder.create_affine(swap_and_scale(
            &CoordinateSystem::geocentric(),
            &target.cs,
        )?));
    }

    let transform = resolver.builder.concatenate_all(&steps)?;
    Ok(CoordinateOperation::transformation(
        format!("{} -> {}", source_crs.name(), target_crs.name()),
        source_crs.clone(),
        target_crs.clone(),
        transform,
        Some(accuracy),
    ))
}

/// 实际轴序下的经度旋转：归一化到规范轴序、平移经度、再折回
fn longitude_rotation_op(
    resolver: &OperationResolver,
    crs: &Crs,
    cs: &CoordinateSystem,
    offset_deg: f64,
) -> RefResult<CoordinateOperation> {
    let dim = cs.dimension();
    let norm = swap_and_scale(cs, &cs.canonical())?;
    let mut rot = Matrix::identity(dim + 1);
    rot.add_translation(0, offset_deg);
    let folded = norm.inverse()?.multiply(&rot)?.multiply(&norm)?;
    let params = ParameterValueGroup::new("Longitude rotation")
        .with_identifier(9601)
        .with("Longitude offset", offset_deg)
        .with("dim", dim as f64);
    Ok(CoordinateOperation::conversion(
        "Longitude rotation",
        crs.clone(),
        crs.clone(),
        resolver.builder.create_affine(folded),
    )
    .with_method("Longitude rotation", params))
}
