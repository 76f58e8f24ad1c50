// crates/gr_referencing/tests/resolution_tests.rs
//!
//! 操作解析端到端测试
//!
//! 覆盖恒等、轴适配、基准位移、派生/复合 CRS、递归防护
//! 与权威注册表优先级

use gr_referencing::prelude::*;
use std::sync::Arc;

fn resolver() -> OperationResolver {
    OperationResolver::new(Arc::new(TransformBuilder::new()))
}

/// 带面向 WGS84 位移声明的 ED50 地理 CRS
fn ed50() -> Crs {
    let datum = GeodeticDatum::new("European Datum 1950", Ellipsoid::INTERNATIONAL_1924)
        .with_bursa_wolf(
            "World Geodetic System 1984",
            BursaWolfParameters::translation(-84.87, -96.49, -116.95),
        );
    Crs::geographic("ED50", datum, CoordinateSystem::ellipsoidal_lat_lon())
}

// ============================================================================
// 恒等与轴适配
// ============================================================================

#[test]
fn test_identity_resolution() {
    let r = resolver();
    let wgs84 = Crs::wgs84();
    let ops = r.resolve(&wgs84, &wgs84, None, None).expect("resolve");
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].category, OperationCategory::Conversion);
    assert!(ops[0].is_identity());
    assert!(ops[0].accuracy.is_none());
}

#[test]
fn test_axis_swap_is_cheap() {
    // (纬,经) -> (经,纬), 同基准面: 纯置换转换, 无位移参数
    let r = resolver();
    let lat_lon = Crs::wgs84();
    let lon_lat = Crs::geographic(
        "WGS 84 (lon-lat)",
        GeodeticDatum::wgs84(),
        CoordinateSystem::ellipsoidal_lon_lat(),
    );
    let ops = r.resolve(&lat_lon, &lon_lat, None, None).expect("resolve");
    assert_eq!(ops.len(), 1);
    let op = &ops[0];
    assert_eq!(op.category, OperationCategory::Conversion);
    assert!(op.accuracy.is_none());
    let out = op.transform.apply(&[39.907, 116.391]).expect("apply");
    assert_eq!(out, vec![116.391, 39.907]);
}

#[test]
fn test_unit_conversion_in_axis_swap() {
    // 百分度 -> 度
    let r = resolver();
    let grad_cs = CoordinateSystem::new(
        CsType::Ellipsoidal,
        vec![
            Axis::new(AxisDirection::North, Unit::Gradian),
            Axis::new(AxisDirection::East, Unit::Gradian),
        ],
    );
    let grads = Crs::geographic("WGS 84 (grads)", GeodeticDatum::wgs84(), grad_cs);
    let ops = r.resolve(&grads, &Crs::wgs84(), None, None).expect("resolve");
    let out = ops[0].transform.apply(&[100.0, 50.0]).expect("apply");
    assert!((out[0] - 90.0).abs() < 1e-12);
    assert!((out[1] - 45.0).abs() < 1e-12);
}

// ============================================================================
// 大地 <-> 大地
// ============================================================================

#[test]
fn test_geographic_to_geocentric_same_datum() {
    let r = resolver();
    let ops = r
        .resolve(&Crs::wgs84_3d(), &Crs::wgs84_geocentric(), None, None)
        .expect("resolve");
    assert_eq!(ops.len(), 1);
    let op = &ops[0];
    assert_eq!(op.category, OperationCategory::Conversion);
    let out = op.transform.apply(&[0.0, 0.0, 0.0]).expect("apply");
    assert!((out[0] - 6_378_137.0).abs() < 1e-6);
    assert!(out[1].abs() < 1e-6);
    assert!(out[2].abs() < 1e-6);
}

#[test]
fn test_datum_shift_with_declared_parameters() {
    // WGS84 -> ED50: 反向声明取逆得 (84.87, 96.49, 116.95)
    let r = resolver();
    let ops = r.resolve(&Crs::wgs84(), &ed50(), None, None).expect("resolve");
    assert_eq!(ops.len(), 1);
    let op = &ops[0];
    assert_eq!(op.category, OperationCategory::Transformation);
    assert_eq!(op.accuracy, Some(25.0));

    // EPSG 指南测试点: ED50 约 53°48'36.565"N, 2°07'51.477"E
    let out = op
        .transform
        .apply(&[53.809_394_444, 2.129_549_444])
        .expect("apply");
    assert!((out[0] - 53.810_156_944).abs() < 1e-5);
    assert!((out[1] - 2.130_965_833).abs() < 1e-5);
}

#[test]
fn test_datum_shift_round_trip() {
    let r = resolver();
    let wgs84 = Crs::wgs84();
    let target = ed50();
    let ops = r.resolve(&wgs84, &target, None, None).expect("resolve");
    let fwd = &ops[0].transform;
    let inv = fwd.inverse().expect("inverse");
    let p = [48.0, 7.5];
    let shifted = fwd.apply(&p).expect("fwd");
    let back = inv.apply(&shifted).expect("back");
    assert!((back[0] - p[0]).abs() < 1e-9);
    assert!((back[1] - p[1]).abs() < 1e-9);
}

#[test]
fn test_accuracy_policy_selects_molodensky() {
    // 期望精度 50 m: 平移位移允许简化 Molodensky
    let r = resolver();
    let ops = r
        .resolve(&Crs::wgs84(), &ed50(), None, Some(50.0))
        .expect("resolve");
    assert_eq!(
        ops[0].method.as_deref(),
        Some("Abridged Molodensky"),
        "粗精度下应选简化 Molodensky"
    );
    // 与地心路径结果偏差有限
    let out = ops[0]
        .transform
        .apply(&[53.809_394_444, 2.129_549_444])
        .expect("apply");
    assert!((out[0] - 53.810_156_944).abs() < 1e-3);
}

#[test]
fn test_ellipsoid_change_without_shift() {
    // 基准面不同且无位移参数: 恒等位移但标记 Transformation, 精度 3000 m
    let r = resolver();
    let krass = Crs::geographic(
        "Beijing 1954",
        GeodeticDatum::new("Beijing 1954", Ellipsoid::KRASSOVSKY),
        CoordinateSystem::ellipsoidal_lat_lon(),
    );
    let ops = r.resolve(&Crs::wgs84(), &krass, None, None).expect("resolve");
    assert_eq!(ops[0].category, OperationCategory::Transformation);
    assert_eq!(ops[0].accuracy, Some(3000.0));
}

#[test]
fn test_shift_respects_area_of_interest() {
    // 位移参数限定欧洲范围, 兴趣区在南美 -> 查不到, 退化为椭球变化
    let mut bw = BursaWolfParameters::translation(-84.87, -96.49, -116.95);
    bw.domain = Some(GeographicBoundingBox::new(-10.0, 35.0, 30.0, 70.0));
    let datum = GeodeticDatum::new("European Datum 1950", Ellipsoid::INTERNATIONAL_1924)
        .with_bursa_wolf("World Geodetic System 1984", bw);
    let target = Crs::geographic("ED50", datum, CoordinateSystem::ellipsoidal_lat_lon());

    let r = resolver();
    let south_america = GeographicBoundingBox::new(-80.0, -55.0, -35.0, 10.0);
    let ops = r
        .resolve(&Crs::wgs84(), &target, Some(&south_america), None)
        .expect("resolve");
    assert_eq!(ops[0].accuracy, Some(3000.0));

    let europe = GeographicBoundingBox::new(0.0, 40.0, 10.0, 50.0);
    let ops = r
        .resolve(&Crs::wgs84(), &target, Some(&europe), None)
        .expect("resolve");
    assert_eq!(ops[0].accuracy, Some(25.0));
}

// ============================================================================
// 派生 CRS 与递归防护
// ============================================================================

fn offset_conversion(offset: f64) -> Conversion {
    Conversion::new(
        "Longitude rotation",
        ParameterValueGroup::new("Longitude rotation").with("Longitude offset", offset),
    )
}

#[test]
fn test_derived_crs_resolution() {
    // 以经度旋转为定义转换的派生 CRS
    let r = resolver();
    let base = Crs::wgs84();
    let derived = Crs::derived(
        "WGS 84 (shifted lon)",
        base.clone(),
        offset_conversion(2.5),
        CoordinateSystem::ellipsoidal_lat_lon(),
    );
    let ops = r.resolve(&base, &derived, None, None).expect("resolve");
    assert_eq!(ops.len(), 1);
    let out = ops[0].transform.apply(&[40.0, 10.0]).expect("apply");
    assert!((out[0] - 40.0).abs() < 1e-12);
    assert!((out[1] - 12.5).abs() < 1e-12);

    // 反方向走逆转换
    let ops = r.resolve(&derived, &base, None, None).expect("resolve");
    let out = ops[0].transform.apply(&[40.0, 12.5]).expect("apply");
    assert!((out[1] - 10.0).abs() < 1e-12);
}

#[test]
fn test_recursive_definition_fails_fast() {
    // 自引用定义: A 的基的基与 A 同名同维, 会话键重入
    let inner = Crs::geographic(
        "A",
        GeodeticDatum::wgs84(),
        CoordinateSystem::ellipsoidal_lat_lon(),
    );
    let b = Crs::derived(
        "B",
        inner,
        offset_conversion(1.0),
        CoordinateSystem::ellipsoidal_lat_lon(),
    );
    let a = Crs::derived(
        "A",
        b,
        offset_conversion(2.0),
        CoordinateSystem::ellipsoidal_lat_lon(),
    );
    let r = resolver();
    // 目标选一个与 A 不等价的 CRS, 保证递归向下而不是短路
    let target = Crs::geographic(
        "ED50",
        GeodeticDatum::new("European Datum 1950", Ellipsoid::INTERNATIONAL_1924),
        CoordinateSystem::ellipsoidal_lat_lon(),
    );
    let err = r.resolve(&a, &target, None, None).expect_err("must fail");
    assert!(matches!(err, RefError::RecursiveConstruction { .. }));
}

// ============================================================================
// 垂直与时间
// ============================================================================

#[test]
fn test_geodetic_to_vertical_height_extraction() {
    let r = resolver();
    let height = Crs::vertical("WGS 84 ellipsoidal height", VerticalDatum::ellipsoidal());
    let ops = r
        .resolve(&Crs::wgs84_3d(), &height, None, None)
        .expect("resolve");
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].transform.source_dim(), 3);
    assert_eq!(ops[0].transform.target_dim(), 1);
    let out = ops[0].transform.apply(&[39.9, 116.4, 43.5]).expect("apply");
    assert!((out[0] - 43.5).abs() < 1e-12);
}

#[test]
fn test_geodetic_2d_to_vertical_fails() {
    // 2D 地理没有高程信息
    let r = resolver();
    let height = Crs::vertical("height", VerticalDatum::ellipsoidal());
    assert!(r.resolve(&Crs::wgs84(), &height, None, None).is_err());
}

#[test]
fn test_vertical_datum_shift_unsupported() {
    let r = resolver();
    let ellipsoidal = Crs::vertical("ellipsoidal", VerticalDatum::ellipsoidal());
    let geoidal = Crs::vertical(
        "EGM96 height",
        VerticalDatum::new("EGM96 geoid", VerticalDatumKind::Geoidal),
    );
    let err = r
        .resolve(&ellipsoidal, &geoidal, None, None)
        .expect_err("must fail");
    assert!(matches!(err, RefError::OperationNotFound { .. }));
}

#[test]
fn test_temporal_epoch_folded_into_translation() {
    let r = resolver();
    let t0 = Crs::temporal("epoch 0", TemporalDatum::unix_epoch(), Unit::Second);
    let t1 = Crs::temporal(
        "epoch +1h",
        TemporalDatum::new("shifted", 3600.0),
        Unit::Second,
    );
    let ops = r.resolve(&t0, &t1, None, None).expect("resolve");
    assert_eq!(ops.len(), 1);
    // 绝对时刻不变: t_target = t_source + (origin_src - origin_tgt)
    let out = ops[0].transform.apply(&[7200.0]).expect("apply");
    assert!((out[0] - 3600.0).abs() < 1e-9);
}

#[test]
fn test_temporal_unit_and_epoch() {
    let r = resolver();
    let seconds = Crs::temporal("seconds", TemporalDatum::unix_epoch(), Unit::Second);
    let days = Crs::temporal("days +1d", TemporalDatum::new("d1", 86_400.0), Unit::Day);
    let ops = r.resolve(&seconds, &days, None, None).expect("resolve");
    let out = ops[0].transform.apply(&[172_800.0]).expect("apply");
    // 2 天 - 1 天纪元差 = 1 天
    assert!((out[0] - 1.0).abs() < 1e-12);
}

// ============================================================================
// 复合 CRS
// ============================================================================

#[test]
fn test_compound_height_pair_fuses_to_3d() {
    // (2D 地理 + 椭球高) -> 3D 地理: 融合为一步, 不是两段独立匹配
    let r = resolver();
    let source = Crs::compound(
        "WGS 84 + height",
        vec![
            Crs::wgs84(),
            Crs::vertical("ellipsoidal height", VerticalDatum::ellipsoidal()),
        ],
    );
    let ops = r
        .resolve(&source, &Crs::wgs84_3d(), None, None)
        .expect("resolve");
    assert_eq!(ops.len(), 1);
    let op = &ops[0];
    assert_eq!(op.category, OperationCategory::Conversion);
    let out = op.transform.apply(&[39.9, 116.4, 50.0]).expect("apply");
    assert!((out[0] - 39.9).abs() < 1e-12);
    assert!((out[1] - 116.4).abs() < 1e-12);
    assert!((out[2] - 50.0).abs() < 1e-12);
}

#[test]
fn test_compound_drops_extra_source_component() {
    // 源多出的时间分量被丢弃
    let r = resolver();
    let source = Crs::compound(
        "WGS 84 + time",
        vec![
            Crs::wgs84(),
            Crs::temporal("time", TemporalDatum::unix_epoch(), Unit::Second),
        ],
    );
    let ops = r.resolve(&source, &Crs::wgs84(), None, None).expect("resolve");
    assert_eq!(ops[0].transform.source_dim(), 3);
    assert_eq!(ops[0].transform.target_dim(), 2);
    let out = ops[0].transform.apply(&[39.9, 116.4, 12.0]).expect("apply");
    assert_eq!(out, vec![39.9, 116.4]);
}

#[test]
fn test_compound_synthesizes_missing_component_as_nan() {
    // 目标多出的时间分量以 NaN 常量合成
    let r = resolver();
    let target = Crs::compound(
        "WGS 84 + time",
        vec![
            Crs::wgs84(),
            Crs::temporal("time", TemporalDatum::unix_epoch(), Unit::Second),
        ],
    );
    let ops = r.resolve(&Crs::wgs84(), &target, None, None).expect("resolve");
    assert_eq!(ops[0].transform.source_dim(), 2);
    assert_eq!(ops[0].transform.target_dim(), 3);
    let out = ops[0].transform.apply(&[39.9, 116.4]).expect("apply");
    assert!((out[0] - 39.9).abs() < 1e-12);
    assert!((out[1] - 116.4).abs() < 1e-12);
    assert!(out[2].is_nan());
}

#[test]
fn test_compound_with_datum_shift_keeps_transformation_category() {
    let r = resolver();
    let source = Crs::compound(
        "WGS 84 + time",
        vec![
            Crs::wgs84(),
            Crs::temporal("time", TemporalDatum::unix_epoch(), Unit::Second),
        ],
    );
    let target = Crs::compound(
        "ED50 + time",
        vec![
            ed50(),
            Crs::temporal("time", TemporalDatum::unix_epoch(), Unit::Second),
        ],
    );
    let ops = r.resolve(&source, &target, None, None).expect("resolve");
    assert_eq!(ops[0].category, OperationCategory::Transformation);
    assert_eq!(ops[0].accuracy, Some(25.0));
}

// ============================================================================
// 权威注册表
// ============================================================================

struct CannedAuthority {
    op: CoordinateOperation,
}

impl AuthorityRegistry for CannedAuthority {
    fn find(&self, source: &Crs, target: &Crs) -> RefResult<Vec<CoordinateOperation>> {
        if source.name() == self.op.source_crs.name() && target.name() == self.op.target_crs.name()
        {
            Ok(vec![self.op.clone()])
        } else {
            Ok(Vec::new())
        }
    }
}

#[test]
fn test_authority_operations_preferred() {
    let builder = Arc::new(TransformBuilder::new());
    let lat_lon = Crs::wgs84();
    let lon_lat = Crs::geographic(
        "WGS 84 (lon-lat)",
        GeodeticDatum::wgs84(),
        CoordinateSystem::ellipsoidal_lon_lat(),
    );
    // 权威注册表给出一个刻意不同的操作（带 2 m 精度标注）
    let canned = CoordinateOperation::transformation(
        "authority declared",
        lat_lon.clone(),
        lon_lat.clone(),
        builder.create_affine(Matrix::identity(3)),
        Some(2.0),
    );
    let r = OperationResolver::new(builder).with_authority(Arc::new(CannedAuthority { op: canned }));
    let ops = r.resolve(&lat_lon, &lon_lat, None, None).expect("resolve");
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].name, "authority declared");
    assert_eq!(ops[0].accuracy, Some(2.0));
}

#[test]
fn test_no_path_between_categories() {
    let r = resolver();
    let eng = Crs::engineering(
        "plant grid",
        EngineeringDatum::new("plant origin"),
        CoordinateSystem::projected_en(),
    );
    let err = r
        .resolve(&Crs::wgs84(), &eng, None, None)
        .expect_err("must fail");
    assert!(matches!(err, RefError::OperationNotFound { .. }));
}
