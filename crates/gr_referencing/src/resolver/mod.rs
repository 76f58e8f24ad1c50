// georef\crates\gr_referencing\src/resolver/mod.rs

//! 操作解析器
//!
//! 端到端编排：先语义等价短路，再查权威注册表，然后按
//! (源, 目标) 结构类别穷举派发，递归解决子问题（派生基、
//! 复合分量），最后级联化简成完整操作链。
//!
//! 解析器对象无状态，可跨独立调用树并发使用；递归防护与步名
//! 计数装在显式的 `ResolutionSession` 里逐层传递，一次最外层
//! 调用一个会话。
//!
//! 类别派发优先序：派生↔派生、派生↔单一、单一↔派生、
//! 大地↔大地、大地↔垂直、垂直↔垂直、时间↔时间、
//! 工程↔工程、复合↔任意。

mod compound;
mod geodetic;
mod vertical;

use crate::authority::{AccuracyPolicy, AuthorityRegistry, DatumShiftSource, DefaultAccuracyPolicy};
use crate::axis::swap_and_scale;
use crate::builder::TransformBuilder;
use crate::context::TransformContext;
use crate::crs::{Crs, DerivedCrs};
use crate::error::{RefError, RefResult};
use crate::extent::GeographicBoundingBox;
use crate::matrix::Matrix;
use crate::operation::{CoordinateOperation, OperationCategory};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

// ============================================================================
// 解析会话
// ============================================================================

/// 一次最外层解析调用树的可变状态
pub(crate) struct ResolutionSession {
    /// 进行中的 (源名, 源维数, 目标名, 目标维数) 键
    in_progress: HashSet<(String, usize, String, usize)>,
    /// 合成中间 CRS 的步名计数
    step_counts: HashMap<String, usize>,
    /// 递归深度（0 为最外层）
    depth: usize,
}

struct SessionKey {
    key: (String, usize, String, usize),
}

impl ResolutionSession {
    fn new() -> Self {
        Self {
            in_progress: HashSet::new(),
            step_counts: HashMap::new(),
            depth: 0,
        }
    }

    /// 进入 (源, 目标) 对；已在解析中则快速失败
    fn enter(&mut self, source: &Crs, target: &Crs) -> RefResult<SessionKey> {
        let key = (
            source.name().to_owned(),
            source.dimension(),
            target.name().to_owned(),
            target.dimension(),
        );
        if !self.in_progress.insert(key.clone()) {
            return Err(RefError::recursive(source.name(), target.name()));
        }
        self.depth += 1;
        Ok(SessionKey { key })
    }

    fn exit(&mut self, token: SessionKey) {
        self.in_progress.remove(&token.key);
        self.depth -= 1;
    }

    /// 为同一基名的第 N 次合成生成 "<base> (step N)"
    fn step_name(&mut self, base: &str) -> String {
        let n = self.step_counts.entry(base.to_owned()).or_insert(0);
        *n += 1;
        format!("{base} (step {n})")
    }
}

// ============================================================================
// 解析器
// ============================================================================

/// 操作解析器（无状态，依赖注入协作者）
pub struct OperationResolver {
    builder: Arc<TransformBuilder>,
    authority: Option<Arc<dyn AuthorityRegistry>>,
    shift_source: Option<Arc<dyn DatumShiftSource>>,
    accuracy_policy: Arc<dyn AccuracyPolicy>,
}

impl OperationResolver {
    /// 创建解析器
    #[must_use]
    pub fn new(builder: Arc<TransformBuilder>) -> Self {
        Self {
            builder,
            authority: None,
            shift_source: None,
            accuracy_policy: Arc::new(DefaultAccuracyPolicy),
        }
    }

    /// 注入权威注册表
    #[must_use]
    pub fn with_authority(mut self, authority: Arc<dyn AuthorityRegistry>) -> Self {
        self.authority = Some(authority);
        self
    }

    /// 注入基准位移来源
    #[must_use]
    pub fn with_shift_source(mut self, source: Arc<dyn DatumShiftSource>) -> Self {
        self.shift_source = Some(source);
        self
    }

    /// 替换精度选择策略
    #[must_use]
    pub fn with_accuracy_policy(mut self, policy: Arc<dyn AccuracyPolicy>) -> Self {
        self.accuracy_policy = policy;
        self
    }

    /// 变换构建器
    #[must_use]
    pub fn builder(&self) -> &Arc<TransformBuilder> {
        &self.builder
    }

    // ========================================================================
    // 解析入口
    // ========================================================================

    /// 解析源到目标的候选操作，最优在前
    ///
    /// # Errors
    /// 无结构路径返回 `OperationNotFound`；检出循环定义返回
    /// `RecursiveConstruction`；构建失败返回对应错误
    pub fn resolve(
        &self,
        source: &Crs,
        target: &Crs,
        area_of_interest: Option<&GeographicBoundingBox>,
        desired_accuracy_m: Option<f64>,
    ) -> RefResult<Vec<CoordinateOperation>> {
        let mut session = ResolutionSession::new();
        self.resolve_inner(source, target, area_of_interest, desired_accuracy_m, &mut session)
    }

    /// 递归解析（会话逐层传递）
    fn resolve_inner(
        &self,
        source: &Crs,
        target: &Crs,
        aoi: Option<&GeographicBoundingBox>,
        accuracy: Option<f64>,
        session: &mut ResolutionSession,
    ) -> RefResult<Vec<CoordinateOperation>> {
        if source.equals_ignore_metadata(target) {
            return Ok(vec![self.identity_operation(source, target)?]);
        }
        let token = session.enter(source, target)?;
        let result = self.dispatch(source, target, aoi, accuracy, session);
        session.exit(token);
        result
    }

    fn dispatch(
        &self,
        source: &Crs,
        target: &Crs,
        explicit_aoi: Option<&GeographicBoundingBox>,
        accuracy: Option<f64>,
        session: &mut ResolutionSession,
    ) -> RefResult<Vec<CoordinateOperation>> {
        // 有效兴趣区：显式优先，否则双方有效域的交集
        let derived_aoi = match explicit_aoi {
            Some(a) => Some(*a),
            None => match (source.domain_of_validity(), target.domain_of_validity()) {
                (Some(a), Some(b)) => a.intersection(&b),
                (a, b) => a.or(b),
            },
        };
        let aoi = derived_aoi.as_ref();

        // 权威声明永远优先于计算路径；递归咨询走无锁窥视
        if let Some(authority) = &self.authority {
            let found = if session.depth <= 1 {
                authority.find(source, target)?
            } else {
                authority.peek(source, target).unwrap_or_default()
            };
            if !found.is_empty() {
                log::debug!(
                    "权威注册表命中 {} 条: {} -> {}",
                    found.len(),
                    source.name(),
                    target.name()
                );
                return Ok(found);
            }
        }

        match (source, target) {
            (Crs::Derived(s), Crs::Derived(t)) => {
                self.derived_to_derived(source, s, target, t, aoi, accuracy, session)
            }
            (Crs::Derived(s), t) if !matches!(t, Crs::Compound(_)) => {
                self.derived_to_single(source, s, target, aoi, accuracy, session)
            }
            (s, Crs::Derived(t)) if !matches!(s, Crs::Compound(_)) => {
                self.single_to_derived(source, target, t, aoi, accuracy, session)
            }
            (Crs::Geodetic(s), Crs::Geodetic(t)) => {
                geodetic::resolve(self, source, s, target, t, aoi, accuracy)
            }
            (Crs::Geodetic(s), Crs::Vertical(t)) => {
                vertical::geodetic_to_vertical(self, source, s, target, t, aoi, accuracy, session)
            }
            (Crs::Vertical(s), Crs::Vertical(t)) => {
                vertical::vertical_to_vertical(self, source, s, target, t)
            }
            (Crs::Temporal(s), Crs::Temporal(t)) => {
                vertical::temporal_to_temporal(self, source, s, target, t)
            }
            (Crs::Engineering(s), Crs::Engineering(t)) => {
                if s.datum.equals_ignore_metadata(&t.datum) {
                    Ok(vec![self.axis_change_operation(source, target)?])
                } else {
                    Err(RefError::operation_not_found(
                        source.name(),
                        target.name(),
                        "不同工程基准面之间没有标准路径",
                    ))
                }
            }
            (Crs::Compound(_), _) | (_, Crs::Compound(_)) => {
                compound::resolve(self, source, target, aoi, accuracy, session)
            }
            _ => Err(RefError::operation_not_found(
                source.name(),
                target.name(),
                "源与目标类别之间没有结构路径",
            )),
        }
    }

    // ========================================================================
    // 基础操作构造
    // ========================================================================

    /// 语义等价对的恒等（轴适配）操作
    fn identity_operation(&self, source: &Crs, target: &Crs) -> RefResult<CoordinateOperation> {
        let transform = match (source.coordinate_system(), target.coordinate_system()) {
            (Some(src_cs), Some(tgt_cs)) => {
                self.builder.create_affine(swap_and_scale(src_cs, tgt_cs)?)
            }
            _ => self
                .builder
                .create_affine(Matrix::identity(source.dimension() + 1)),
        };
        Ok(CoordinateOperation::conversion(
            format!("{} -> {}", source.name(), target.name()),
            source.clone(),
            target.clone(),
            transform,
        ))
    }

    /// 纯轴序/单位适配操作（同基准面）
    pub(crate) fn axis_change_operation(
        &self,
        source: &Crs,
        target: &Crs,
    ) -> RefResult<CoordinateOperation> {
        let src_cs = source.coordinate_system().ok_or_else(|| {
            RefError::operation_not_found(source.name(), target.name(), "源 CRS 无单一坐标系")
        })?;
        let tgt_cs = target.coordinate_system().ok_or_else(|| {
            RefError::operation_not_found(source.name(), target.name(), "目标 CRS 无单一坐标系")
        })?;
        let matrix = swap_and_scale(src_cs, tgt_cs).map_err(|e| {
            RefError::operation_not_found(source.name(), target.name(), e.to_string())
        })?;
        Ok(CoordinateOperation::conversion(
            "Axis changes",
            source.clone(),
            target.clone(),
            self.builder.create_affine(matrix),
        ))
    }

    /// 级联两个相邻操作并化简
    ///
    /// 恒等转换步被吞并进相邻的非平凡步（名字/方法/参数沿用
    /// 非平凡一方），调用方看到的是一次真实基准/模型变化一个
    /// 操作，而不是一次内部簿记一个操作。
    pub(crate) fn concat_ops(
        &self,
        first: CoordinateOperation,
        second: CoordinateOperation,
    ) -> RefResult<CoordinateOperation> {
        let transform = self.builder.concatenate(&first.transform, &second.transform)?;
        let category = if first.category == OperationCategory::Transformation
            || second.category == OperationCategory::Transformation
        {
            OperationCategory::Transformation
        } else {
            OperationCategory::Conversion
        };
        let accuracy = match (first.accuracy, second.accuracy) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(0.0) + b.unwrap_or(0.0)),
        };
        let first_trivial = first.is_identity() && first.category == OperationCategory::Conversion;
        let second_trivial = second.is_identity() && second.category == OperationCategory::Conversion;
        let (name, method, parameters) = if first_trivial && !second_trivial {
            (second.name, second.method, second.parameters)
        } else if second_trivial && !first_trivial {
            (first.name, first.method, first.parameters)
        } else {
            (
                format!("{} -> {}", first.source_crs.name(), second.target_crs.name()),
                None,
                None,
            )
        };
        Ok(CoordinateOperation {
            name,
            category,
            source_crs: first.source_crs,
            target_crs: second.target_crs,
            transform,
            method,
            parameters,
            accuracy,
        })
    }

    /// 依次级联整条操作链
    pub(crate) fn concat_chain(
        &self,
        ops: Vec<CoordinateOperation>,
    ) -> RefResult<CoordinateOperation> {
        let mut iter = ops.into_iter();
        let mut acc = iter
            .next()
            .ok_or_else(|| RefError::factory("空操作链无法级联"))?;
        for op in iter {
            acc = self.concat_ops(acc, op)?;
        }
        Ok(acc)
    }

    // ========================================================================
    // 派生 CRS
    // ========================================================================

    /// 构建派生 CRS 的定义转换（基 -> 派生方向）
    fn definitional_conversion(
        &self,
        derived_crs: &Crs,
        derived: &DerivedCrs,
    ) -> RefResult<CoordinateOperation> {
        let base = derived.base.as_ref();
        let base_cs = base.coordinate_system().ok_or_else(|| {
            RefError::factory(format!("派生 CRS {} 的基 CRS 无单一坐标系", derived.name))
        })?;
        let ellipsoid = base.as_geodetic().map(|g| g.datum.ellipsoid);
        let ctx = TransformContext::new()
            .with_source(base_cs.clone(), ellipsoid)
            .with_target(derived.cs.clone(), ellipsoid);
        let mut params = derived.conversion.parameters.clone();
        params.name = derived.conversion.name.clone();
        let built = self.builder.build(params, Some(ctx))?;
        Ok(CoordinateOperation::conversion(
            derived.conversion.name.clone(),
            base.clone(),
            derived_crs.clone(),
            built.transform,
        )
        .with_method(built.method, built.parameters))
    }

    /// 定义转换的逆（派生 -> 基方向）；不可逆是致命错误
    fn inverse_conversion(
        &self,
        derived_crs: &Crs,
        derived: &DerivedCrs,
    ) -> RefResult<CoordinateOperation> {
        let forward = self.definitional_conversion(derived_crs, derived)?;
        let inverse = forward.transform.inverse().map_err(|_| {
            RefError::operation_not_found(
                derived.name.clone(),
                derived.base.name(),
                format!("定义转换 {} 不可逆", derived.conversion.name),
            )
        })?;
        Ok(CoordinateOperation::conversion(
            format!("{} (inverse)", derived.conversion.name),
            derived_crs.clone(),
            derived.base.as_ref().clone(),
            self.builder.pool().unique(inverse),
        ))
    }

    fn derived_to_single(
        &self,
        source_crs: &Crs,
        source: &DerivedCrs,
        target: &Crs,
        aoi: Option<&GeographicBoundingBox>,
        accuracy: Option<f64>,
        session: &mut ResolutionSession,
    ) -> RefResult<Vec<CoordinateOperation>> {
        let down = self.inverse_conversion(source_crs, source)?;
        let rest = self.resolve_inner(&source.base, target, aoi, accuracy, session)?;
        let mut out = Vec::with_capacity(rest.len());
        for op in rest {
            out.push(self.concat_ops(down.clone(), op)?);
        }
        Ok(out)
    }

    fn single_to_derived(
        &self,
        source: &Crs,
        target_crs: &Crs,
        target: &DerivedCrs,
        aoi: Option<&GeographicBoundingBox>,
        accuracy: Option<f64>,
        session: &mut ResolutionSession,
    ) -> RefResult<Vec<CoordinateOperation>> {
        let rest = self.resolve_inner(source, &target.base, aoi, accuracy, session)?;
        let up = self.definitional_conversion(target_crs, target)?;
        let mut out = Vec::with_capacity(rest.len());
        for op in rest {
            out.push(self.concat_ops(op, up.clone())?);
        }
        Ok(out)
    }

    #[allow(clippy::too_many_arguments)]
    fn derived_to_derived(
        &self,
        source_crs: &Crs,
        source: &DerivedCrs,
        target_crs: &Crs,
        target: &DerivedCrs,
        aoi: Option<&GeographicBoundingBox>,
        accuracy: Option<f64>,
        session: &mut ResolutionSession,
    ) -> RefResult<Vec<CoordinateOperation>> {
        let down = self.inverse_conversion(source_crs, source)?;
        let middle = self.resolve_inner(&source.base, &target.base, aoi, accuracy, session)?;
        let up = self.definitional_conversion(target_crs, target)?;
        let mut out = Vec::with_capacity(middle.len());
        for op in middle {
            let head = self.concat_ops(down.clone(), op)?;
            out.push(self.concat_ops(head, up.clone())?);
        }
        Ok(out)
    }
}
