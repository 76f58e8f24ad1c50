// georef\crates\gr_referencing\src/builder.rs

//! 变换构建器
//!
//! `TransformBuilder` 是长寿命共享服务：把操作方法名/代码解析到
//! 提供者，从上下文补全缺失参数，调用提供者取归一化变换，再用
//! 归一化/反归一化矩阵把它包到实际轴序与单位上，最后经共享池
//! 去重。提供者调用一律在本层任何锁之外进行。
//!
//! 上下文按值进出：`build` 接收 `TransformContext`，补全与诊断
//! 记录写入后随 `BuiltTransform` 归还，不存在跨调用的可见中间态。
//!
//! # 参数补全
//!
//! 方法含 `semi_major`/`semi_minor` 槽位时从上下文椭球补全单侧，
//! 含 `src_*`/`tgt_*` 槽位时双侧独立补全，`dim` 从源坐标系维数
//! 补全。显式给出的值永不被覆盖：与上下文椭球相差超过 1 毫米时
//! 保留调用方值、记 `Inconsistent` 并发出非致命警告。

use crate::axis::{swap_and_scale, CoordinateSystem};
use crate::context::{ParameterOrigin, TransformContext};
use crate::ellipsoid::Ellipsoid;
use crate::error::{RefError, RefResult};
use crate::matrix::Matrix;
use crate::methods::MethodRegistry;
use crate::operation::ParameterValueGroup;
use crate::pool::TransformPool;
use crate::transform::MathTransform;
use std::sync::Arc;

/// 显式参数与上下文椭球的一致性容差 (m)
const CONSISTENCY_TOLERANCE_M: f64 = 1e-3;

/// 构建结果：变换本体加元数据与诊断
#[derive(Debug, Clone)]
pub struct BuiltTransform {
    /// 去重后的变换
    pub transform: Arc<MathTransform>,
    /// 实际使用的方法名
    pub method: String,
    /// 补全后的参数（仿射化简不丢失原始语义）
    pub parameters: ParameterValueGroup,
    /// 归还的上下文（含参数来源记录），无上下文调用时为 None
    pub context: Option<TransformContext>,
}

/// 变换构建器（共享、长寿命、线程安全）
pub struct TransformBuilder {
    registry: Arc<MethodRegistry>,
    pool: Arc<TransformPool>,
}

impl TransformBuilder {
    /// 带内置方法目录与新共享池的构建器
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(MethodRegistry::with_builtins()),
            pool: Arc::new(TransformPool::new()),
        }
    }

    /// 注入既有注册表与池（组合根用）
    #[must_use]
    pub fn with_parts(registry: Arc<MethodRegistry>, pool: Arc<TransformPool>) -> Self {
        Self { registry, pool }
    }

    /// 方法注册表
    #[must_use]
    pub fn registry(&self) -> &Arc<MethodRegistry> {
        &self.registry
    }

    /// 共享池
    #[must_use]
    pub fn pool(&self) -> &Arc<TransformPool> {
        &self.pool
    }

    // ========================================================================
    // 构建
    // ========================================================================

    /// 从参数组构建变换
    ///
    /// # Errors
    /// 方法未注册返回 `NoSuchIdentifier`；参数非法返回
    /// `InvalidParameterValue`/`MissingParameter`；无法识别的维数
    /// 差异返回 `InvalidGeodeticParameter`
    pub fn build(
        &self,
        mut params: ParameterValueGroup,
        context: Option<TransformContext>,
    ) -> RefResult<BuiltTransform> {
        // 代码优先、名字兜底；克隆 Arc 后立即释放注册表锁
        let provider = self.registry.find(params.identifier, &params.name)?;
        let method = provider.method();
        let method_name = method.name.to_owned();

        let Some(mut ctx) = context else {
            // 无上下文：直接构建并去重
            let raw = provider.build(&params, None)?;
            return Ok(BuiltTransform {
                transform: self.pool.unique(raw),
                method: method_name,
                parameters: params,
                context: None,
            });
        };

        // ---- 参数补全 ----
        let descriptors = &method.parameters;
        if descriptors.contains("dim") && !params.is_set("dim") {
            if let Some(dim) = ctx.source_dim() {
                params.set("dim", dim as f64);
                ctx.record_origin("dim", ParameterOrigin::Contextual);
            }
        }
        if descriptors.contains("semi_major") {
            let ell = self.single_side_ellipsoid(&ctx);
            if let Some(ell) = ell {
                complete_axis(&mut params, &mut ctx, "semi_major", ell.a);
                complete_axis(&mut params, &mut ctx, "semi_minor", ell.semi_minor());
            }
        }
        if descriptors.contains("src_semi_major") {
            if let Some(ell) = ctx.source_ellipsoid {
                complete_axis(&mut params, &mut ctx, "src_semi_major", ell.a);
                complete_axis(&mut params, &mut ctx, "src_semi_minor", ell.semi_minor());
            }
            if let Some(ell) = ctx.target_ellipsoid {
                complete_axis(&mut params, &mut ctx, "tgt_semi_major", ell.a);
                complete_axis(&mut params, &mut ctx, "tgt_semi_minor", ell.semi_minor());
            }
        }

        // ---- 提供者调用（锁外）----
        let raw = self.pool.unique(provider.build(&params, Some(&ctx))?);

        // ---- 归一化包裹 ----
        let transform = match (ctx.source_cs.clone(), ctx.target_cs.clone()) {
            (Some(src_cs), Some(tgt_cs)) => self.wrap_normalized(&raw, &src_cs, &tgt_cs)?,
            _ => raw,
        };

        ctx.provider_used = Some(method_name.clone());
        Ok(BuiltTransform {
            transform,
            method: method_name,
            parameters: params,
            context: Some(ctx),
        })
    }

    /// 单侧椭球补全时选用的椭球：椭球面一侧优先
    fn single_side_ellipsoid(&self, ctx: &TransformContext) -> Option<Ellipsoid> {
        let source_is_ellipsoidal = ctx
            .source_cs
            .as_ref()
            .is_some_and(|cs| cs.cs_type == crate::axis::CsType::Ellipsoidal);
        if source_is_ellipsoidal {
            ctx.source_ellipsoid.or(ctx.target_ellipsoid)
        } else {
            ctx.target_ellipsoid.or(ctx.source_ellipsoid)
        }
    }

    /// 归一化 -> [补维] -> 提供者变换 -> [补维/降维] -> 反归一化
    fn wrap_normalized(
        &self,
        raw: &Arc<MathTransform>,
        src_cs: &CoordinateSystem,
        tgt_cs: &CoordinateSystem,
    ) -> RefResult<Arc<MathTransform>> {
        let src_dim = src_cs.dimension();
        let tgt_dim = tgt_cs.dimension();
        let norm = self.create_affine(swap_and_scale(src_cs, &src_cs.canonical())?);
        let denorm = self.create_affine(swap_and_scale(&tgt_cs.canonical(), tgt_cs)?);

        let mut steps: Vec<Arc<MathTransform>> = vec![norm];
        let mut cur_dim = src_dim;

        // 源侧维数调和
        let mut body = raw.clone();
        if body.source_dim() != cur_dim {
            if body.source_dim() == cur_dim + 1 {
                // 差一维且供提供者消费：补常数 0
                steps.push(self.create_affine(Matrix::append_dimension(cur_dim, 0.0)));
                cur_dim += 1;
            } else if body.source_dim() + 1 == cur_dim && body.target_dim() + 1 == tgt_dim {
                // 两侧各多一维：末位坐标原样穿透
                body = self.pool.unique(MathTransform::PassThrough {
                    leading: 0,
                    sub: body,
                    trailing: 1,
                });
            } else {
                return Err(RefError::invalid_geodetic(format!(
                    "无法调和的维数差异: 源坐标系 {cur_dim} 维, 方法要求 {} 维",
                    body.source_dim()
                )));
            }
        }
        steps.push(body.clone());
        cur_dim = body.target_dim();

        // 目标侧维数调和
        if cur_dim != tgt_dim {
            if cur_dim + 1 == tgt_dim {
                // 差一维且无来源：补 NaN 占位
                steps.push(self.create_affine(Matrix::append_dimension(cur_dim, f64::NAN)));
            } else if cur_dim == tgt_dim + 1 {
                steps.push(self.create_affine(Matrix::drop_last_dimension(cur_dim)));
            } else {
                return Err(RefError::invalid_geodetic(format!(
                    "无法调和的维数差异: 方法产出 {cur_dim} 维, 目标坐标系 {tgt_dim} 维"
                )));
            }
        }
        steps.push(denorm);
        self.concatenate_all(&steps)
    }

    // ========================================================================
    // 辅助构建
    // ========================================================================

    /// 仿射变换（经池去重）
    #[must_use]
    pub fn create_affine(&self, matrix: Matrix) -> Arc<MathTransform> {
        self.pool.unique(MathTransform::Linear(matrix))
    }

    /// 级联两个变换（化简并去重）
    ///
    /// # Errors
    /// 维度契约不满足时返回 `DimensionMismatch`
    pub fn concatenate(
        &self,
        first: &Arc<MathTransform>,
        second: &Arc<MathTransform>,
    ) -> RefResult<Arc<MathTransform>> {
        Ok(self.pool.unique(MathTransform::concatenate(first, second)?))
    }

    /// 级联任意多个变换
    ///
    /// # Errors
    /// 链为空或维度契约不满足时返回错误
    pub fn concatenate_all(&self, steps: &[Arc<MathTransform>]) -> RefResult<Arc<MathTransform>> {
        let (first, rest) = steps
            .split_first()
            .ok_or_else(|| RefError::factory("空变换链无法级联"))?;
        let mut acc = first.clone();
        for step in rest {
            acc = self.concatenate(&acc, step)?;
        }
        Ok(acc)
    }
}

impl Default for TransformBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 单个轴长参数的补全：缺省取上下文值，显式值永不覆盖
fn complete_axis(
    params: &mut ParameterValueGroup,
    ctx: &mut TransformContext,
    name: &str,
    context_value: f64,
) {
    match params.get(name) {
        None => {
            params.set(name, context_value);
            ctx.record_origin(name, ParameterOrigin::Contextual);
        }
        Some(explicit) if (explicit - context_value).abs() <= CONSISTENCY_TOLERANCE_M => {
            ctx.record_origin(name, ParameterOrigin::Explicit);
        }
        Some(explicit) => {
            log::warn!(
                "参数 {name} 显式值 {explicit} 与上下文椭球值 {context_value} 超差, 保留显式值"
            );
            ctx.record_origin(name, ParameterOrigin::Inconsistent);
        }
    }
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::ParameterValueGroup;

    fn geographic_3d_context() -> TransformContext {
        TransformContext::new()
            .with_source(CoordinateSystem::ellipsoidal_3d(), Some(Ellipsoid::WGS84))
            .with_target(CoordinateSystem::geocentric(), None)
    }

    #[test]
    fn test_ellipsoid_completion_from_context() {
        let builder = TransformBuilder::new();
        let params = ParameterValueGroup::new("Geographic to geocentric conversion");
        let built = builder
            .build(params, Some(geographic_3d_context()))
            .expect("build");

        assert_eq!(built.parameters.get("semi_major"), Some(6_378_137.0));
        let ctx = built.context.expect("context");
        assert_eq!(ctx.origin_of("semi_major"), Some(ParameterOrigin::Contextual));
        assert_eq!(ctx.origin_of("semi_minor"), Some(ParameterOrigin::Contextual));

        // 源坐标系 (纬,经,高): 赤道本初子午线交点 -> (a, 0, 0)
        let out = built.transform.apply(&[0.0, 0.0, 0.0]).expect("apply");
        assert!((out[0] - 6_378_137.0).abs() < 1e-6);
        assert!(out[1].abs() < 1e-6);
        assert!(out[2].abs() < 1e-6);

        // (lat=0, lon=90) -> (0, a, 0)
        let out = built.transform.apply(&[0.0, 90.0, 0.0]).expect("apply");
        assert!(out[0].abs() < 1e-6);
        assert!((out[1] - 6_378_137.0).abs() < 1e-6);
    }

    #[test]
    fn test_inconsistent_explicit_value_wins() {
        let builder = TransformBuilder::new();
        // 显式长半轴差 1 m
        let params =
            ParameterValueGroup::new("Geographic to geocentric conversion").with("semi_major", 6_378_136.0);
        let built = builder
            .build(params, Some(geographic_3d_context()))
            .expect("build");
        assert_eq!(built.parameters.get("semi_major"), Some(6_378_136.0));
        let ctx = built.context.expect("context");
        assert_eq!(
            ctx.origin_of("semi_major"),
            Some(ParameterOrigin::Inconsistent)
        );
        assert!(ctx.has_inconsistent());
        // 结果采用显式值
        let out = built.transform.apply(&[0.0, 0.0, 0.0]).expect("apply");
        assert!((out[0] - 6_378_136.0).abs() < 1e-6);
    }

    #[test]
    fn test_two_dimensional_source_feeds_zero_height() {
        // 源 2D 地理, 方法 3D: 补常数 0 维喂给提供者
        let builder = TransformBuilder::new();
        let ctx = TransformContext::new()
            .with_source(CoordinateSystem::ellipsoidal_lat_lon(), Some(Ellipsoid::WGS84))
            .with_target(CoordinateSystem::geocentric(), None);
        let params = ParameterValueGroup::new("Geographic to geocentric conversion").with("dim", 3.0);
        let built = builder.build(params, Some(ctx)).expect("build");
        assert_eq!(built.transform.source_dim(), 2);
        assert_eq!(built.transform.target_dim(), 3);
        let out = built.transform.apply(&[0.0, 0.0]).expect("apply");
        assert!((out[0] - 6_378_137.0).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_method() {
        let builder = TransformBuilder::new();
        let params = ParameterValueGroup::new("不存在的方法");
        assert!(matches!(
            builder.build(params, None),
            Err(RefError::NoSuchIdentifier { .. })
        ));
    }

    #[test]
    fn test_pool_dedup_across_builds() {
        let builder = TransformBuilder::new();
        let params = ParameterValueGroup::new("Longitude rotation").with("Longitude offset", 2.5);
        let a = builder.build(params.clone(), None).expect("a");
        let b = builder.build(params, None).expect("b");
        assert!(Arc::ptr_eq(&a.transform, &b.transform));
    }

    #[test]
    fn test_normalization_handles_axis_order_and_units() {
        // 源 (经,纬) 度 -> 规范 (东,北), 目标地心米: 构建后直接消费 lon-lat
        let builder = TransformBuilder::new();
        let ctx = TransformContext::new()
            .with_source(CoordinateSystem::ellipsoidal_lon_lat(), Some(Ellipsoid::WGS84))
            .with_target(CoordinateSystem::geocentric(), None);
        let params = ParameterValueGroup::new("Geographic to geocentric conversion").with("dim", 3.0);
        let built = builder.build(params, Some(ctx)).expect("build");
        let out = built.transform.apply(&[90.0, 0.0]).expect("apply");
        assert!(out[0].abs() < 1e-6);
        assert!((out[1] - 6_378_137.0).abs() < 1e-6);
    }
}
