// georef\crates\gr_referencing\src/resolver/compound.rs

//! 复合 ↔ 任意的解析
//!
//! 两侧都展开为单一 CRS 序列；相邻的「2D 地理 + 椭球高」分量
//! 先融合成 3D 地理分量，高程必须跟着水平坐标走。随后为每个
//! 目标分量递归匹配源分量，拼装：重排/丢弃矩阵、逐分量穿透
//! 子操作、多余目标维的 NaN 常量注入与终末置换，级联成一个
//! 操作返回。

use super::{OperationResolver, ResolutionSession};
use crate::axis::{CoordinateSystem, CsType};
use crate::crs::{Crs, GeodeticCrs, VerticalCrs};
use crate::datum::VerticalDatumKind;
use crate::error::{RefError, RefResult};
use crate::extent::GeographicBoundingBox;
use crate::matrix::Matrix;
use crate::operation::{CoordinateOperation, OperationCategory};
use crate::transform::MathTransform;
use std::mem::discriminant;
use std::sync::Arc;

/// 展开后的分量及其在原始坐标元组中的位置
struct Component {
    crs: Crs,
    offset: usize,
    dim: usize,
}

pub(super) fn resolve(
    resolver: &OperationResolver,
    source: &Crs,
    target: &Crs,
    aoi: Option<&GeographicBoundingBox>,
    accuracy: Option<f64>,
    session: &mut ResolutionSession,
) -> RefResult<Vec<CoordinateOperation>> {
    let src_comps = decompose(source);
    let tgt_comps = decompose(target);
    let src_total = source.dimension();
    let tgt_total = target.dimension();

    // ---- 逐目标分量匹配 ----
    let mut matches: Vec<Option<(usize, CoordinateOperation)>> = Vec::with_capacity(tgt_comps.len());
    let mut used = vec![false; src_comps.len()];
    for tgt_comp in &tgt_comps {
        let candidates: Vec<usize> = src_comps
            .iter()
            .enumerate()
            .filter(|(i, s)| !used[*i] && discriminant(&s.crs) == discriminant(&tgt_comp.crs))
            .map(|(i, _)| i)
            .collect();
        if candidates.is_empty() {
            // 源侧缺失的目标分量以常量合成
            matches.push(None);
            continue;
        }
        let mut last_err: Option<RefError> = None;
        let mut found = None;
        for i in candidates {
            match resolver.resolve_inner(&src_comps[i].crs, &tgt_comp.crs, aoi, accuracy, session) {
                Ok(ops) => {
                    if let Some(op) = ops.into_iter().next() {
                        used[i] = true;
                        found = Some((i, op));
                        break;
                    }
                }
                Err(e) => last_err = Some(e),
            }
        }
        match found {
            Some(m) => matches.push(Some(m)),
            None => {
                return Err(last_err.unwrap_or_else(|| {
                    RefError::operation_not_found(
                        source.name(),
                        target.name(),
                        format!("目标分量 {} 无匹配源分量", tgt_comp.crs.name()),
                    )
                }))
            }
        }
    }

    // ---- (1) 重排/丢弃矩阵：源元组 -> 匹配子操作所需次序 ----
    let mut select_idx: Vec<usize> = Vec::new();
    for m in matches.iter().flatten() {
        let comp = &src_comps[m.0];
        select_idx.extend(comp.offset..comp.offset + comp.dim);
    }
    let mut steps: Vec<Arc<MathTransform>> = vec![resolver
        .builder
        .create_affine(Matrix::dimension_select(src_total, &select_idx))];

    // ---- (2) 逐分量穿透子操作 ----
    let mut category = OperationCategory::Conversion;
    let mut acc_sum: Option<f64> = None;
    let mut cur_total = select_idx.len();
    let mut offset = 0;
    for m in matches.iter().flatten() {
        let op = &m.1;
        if op.category == OperationCategory::Transformation {
            category = OperationCategory::Transformation;
        }
        if let Some(a) = op.accuracy {
            acc_sum = Some(acc_sum.unwrap_or(0.0) + a);
        }
        let sub = op.transform.clone();
        let in_dim = sub.source_dim();
        let out_dim = sub.target_dim();
        let trailing = cur_total - offset - in_dim;
        let step = if offset == 0 && trailing == 0 {
            sub
        } else {
            resolver.builder.pool().unique(MathTransform::PassThrough {
                leading: offset,
                sub,
                trailing,
            })
        };
        steps.push(step);
        cur_total = cur_total - in_dim + out_dim;
        offset += out_dim;
    }

    // ---- (3) 常量注入与终末置换 ----
    let const_dims: usize = matches
        .iter()
        .zip(&tgt_comps)
        .filter(|(m, _)| m.is_none())
        .map(|(_, c)| c.dim)
        .sum();
    if const_dims > 0 {
        for _ in 0..const_dims {
            steps.push(
                resolver
                    .builder
                    .create_affine(Matrix::append_dimension(cur_total, f64::NAN)),
            );
            cur_total += 1;
        }
        // 当前布局 = [匹配分量按目标序][常量维]，置换到目标序
        let mut perm = Matrix::zeros(tgt_total + 1, cur_total + 1);
        let mut matched_pos = 0;
        let mut const_pos = cur_total - const_dims;
        let mut row = 0;
        for (m, comp) in matches.iter().zip(&tgt_comps) {
            for _ in 0..comp.dim {
                let col = if m.is_some() {
                    let c = matched_pos;
                    matched_pos += 1;
                    c
                } else {
                    let c = const_pos;
                    const_pos += 1;
                    c
                };
                perm.set(row, col, 1.0);
                row += 1;
            }
        }
        perm.set(tgt_total, cur_total, 1.0);
        steps.push(resolver.builder.create_affine(perm));
    }

    let transform = resolver.builder.concatenate_all(&steps)?;
    Ok(vec![CoordinateOperation {
        name: format!("{} -> {}", source.name(), target.name()),
        category,
        source_crs: source.clone(),
        target_crs: target.clone(),
        transform,
        method: None,
        parameters: None,
        accuracy: acc_sum,
    }])
}

// ============================================================================
// 分解与融合
// ============================================================================

/// 展开复合 CRS 并融合「2D 地理 + 椭球高」相邻对
fn decompose(crs: &Crs) -> Vec<Component> {
    let singles: Vec<Crs> = crs.single_components().into_iter().cloned().collect();
    let fused = fuse_height_pairs(singles);
    let mut out = Vec::with_capacity(fused.len());
    let mut offset = 0;
    for c in fused {
        let dim = c.dimension();
        out.push(Component { crs: c, offset, dim });
        offset += dim;
    }
    out
}

fn fuse_height_pairs(parts: Vec<Crs>) -> Vec<Crs> {
    let mut out: Vec<Crs> = Vec::with_capacity(parts.len());
    let mut iter = parts.into_iter().peekable();
    while let Some(part) = iter.next() {
        let fusable = matches!(
            (&part, iter.peek()),
            (Crs::Geodetic(g), Some(Crs::Vertical(v)))
                if is_geographic_2d(g) && is_ellipsoidal_height(v)
        );
        if fusable {
            let Crs::Geodetic(g) = part else { unreachable!() };
            let Some(Crs::Vertical(v)) = iter.next() else {
                unreachable!()
            };
            out.push(fuse(g, &v));
        } else {
            out.push(part);
        }
    }
    out
}

fn is_geographic_2d(g: &GeodeticCrs) -> bool {
    g.is_geographic() && g.cs.dimension() == 2
}

fn is_ellipsoidal_height(v: &VerticalCrs) -> bool {
    v.datum.kind == VerticalDatumKind::Ellipsoidal
}

/// 水平分量轴在前、高程轴在后的 3D 地理 CRS
fn fuse(g: GeodeticCrs, v: &VerticalCrs) -> Crs {
    let mut axes = g.cs.axes.clone();
    axes.extend(v.cs.axes.iter().copied());
    Crs::Geodetic(GeodeticCrs {
        name: format!("{} + {}", g.name, v.name),
        datum: g.datum,
        cs: CoordinateSystem::new(CsType::Ellipsoidal, axes),
        domain: g.domain,
    })
}
