// georef\crates\gr_referencing\src/resolver/vertical.rs

//! 垂直与时间维度的解析
//!
//! 大地 -> 垂直走三步链：源到 3D 地理插值 CRS、选择矩阵抽出
//! 椭球高轴、再递归解析到目标高程/水深约定。真正的垂直/时间
//! 基准面位移不在范围内（文档化限制）；时间 CRS 的纪元差折进
//! 轴适配矩阵的平移列，不单列一步。

use super::{OperationResolver, ResolutionSession};
use crate::axis::{swap_and_scale, CoordinateSystem};
use crate::crs::{Crs, GeodeticCrs, TemporalCrs, VerticalCrs};
use crate::datum::VerticalDatum;
use crate::error::{RefError, RefResult};
use crate::extent::GeographicBoundingBox;
use crate::matrix::Matrix;
use crate::operation::CoordinateOperation;

/// 大地 -> 垂直：插值 CRS、高度选择、高程约定
#[allow(clippy::too_many_arguments)]
pub(super) fn geodetic_to_vertical(
    resolver: &OperationResolver,
    source_crs: &Crs,
    source: &GeodeticCrs,
    target_crs: &Crs,
    _target: &VerticalCrs,
    aoi: Option<&GeographicBoundingBox>,
    accuracy: Option<f64>,
    session: &mut ResolutionSession,
) -> RefResult<Vec<CoordinateOperation>> {
    let mut chain: Vec<CoordinateOperation> = Vec::new();

    // (a) 插值 CRS：源基准面上的 3D 地理
    let already_3d = source.is_geographic() && source.cs.dimension() == 3;
    let interp_crs = if already_3d {
        source_crs.clone()
    } else {
        let interp = Crs::geographic(
            session.step_name(&source.name),
            source.datum.clone(),
            CoordinateSystem::ellipsoidal_3d(),
        );
        let to_interp = resolver
            .resolve_inner(source_crs, &interp, aoi, accuracy, session)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                RefError::operation_not_found(source_crs.name(), target_crs.name(), "无法到达插值 CRS")
            })?;
        chain.push(to_interp);
        interp
    };
    let interp_cs = interp_crs
        .coordinate_system()
        .cloned()
        .unwrap_or_else(CoordinateSystem::ellipsoidal_3d);

    // (b) 选择矩阵抽出椭球高轴
    let h_index = interp_cs.vertical_axis_index().ok_or_else(|| {
        RefError::operation_not_found(
            source_crs.name(),
            target_crs.name(),
            "插值坐标系中找不到垂直轴",
        )
    })?;
    let select = Matrix::dimension_select(interp_cs.dimension(), &[h_index]);
    let raw_height = Crs::vertical(
        session.step_name("椭球高"),
        VerticalDatum::ellipsoidal(),
    );
    chain.push(CoordinateOperation::conversion(
        "Ellipsoidal height extraction",
        interp_crs,
        raw_height.clone(),
        resolver.builder.create_affine(select),
    ));

    // (c) 裸椭球高到目标高程/水深约定，可能是递归的垂直解析
    if !raw_height.equals_ignore_metadata(target_crs) {
        let to_target = resolver
            .resolve_inner(&raw_height, target_crs, aoi, accuracy, session)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                RefError::operation_not_found(source_crs.name(), target_crs.name(), "高程约定不可达")
            })?;
        chain.push(to_target);
    } else {
        // 目标就是米制椭球高，仍需把目标 CRS 标到链尾
        let last = chain.len() - 1;
        chain[last].target_crs = target_crs.clone();
    }
    Ok(vec![resolver.concat_chain(chain)?])
}

/// 垂直 ↔ 垂直：要求基准面等价，只做符号/单位适配
pub(super) fn vertical_to_vertical(
    resolver: &OperationResolver,
    source_crs: &Crs,
    source: &VerticalCrs,
    target_crs: &Crs,
    target: &VerticalCrs,
) -> RefResult<Vec<CoordinateOperation>> {
    if !source.datum.equals_ignore_metadata(&target.datum) {
        return Err(RefError::operation_not_found(
            source_crs.name(),
            target_crs.name(),
            "垂直基准面位移不在支持范围内",
        ));
    }
    Ok(vec![resolver.axis_change_operation(source_crs, target_crs)?])
}

/// 时间 ↔ 时间：纪元差折进轴适配矩阵的平移列
pub(super) fn temporal_to_temporal(
    resolver: &OperationResolver,
    source_crs: &Crs,
    source: &TemporalCrs,
    target_crs: &Crs,
    target: &TemporalCrs,
) -> RefResult<Vec<CoordinateOperation>> {
    let mut matrix = swap_and_scale(&source.cs, &target.cs)?;
    let delta_seconds = source.datum.origin - target.datum.origin;
    if delta_seconds != 0.0 {
        let target_unit = target.cs.axes[0].unit;
        matrix.add_translation(0, delta_seconds / target_unit.to_base());
    }
    Ok(vec![CoordinateOperation::conversion(
        format!("{} -> {}", source_crs.name(), target_crs.name()),
        source_crs.clone(),
        target_crs.clone(),
        resolver.builder.create_affine(matrix),
    )])
}
