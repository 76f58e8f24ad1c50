// georef\crates\gr_referencing\src/transform.rs

//! 数学变换
//!
//! `MathTransform` 是固定维数的不可变纯函数 ℝᴺ→ℝᴹ，支持级联与
//! （多数情形下的）求逆。采用闭合枚举做静态分发：变换实例可按值
//! 比较，供共享池去重。
//!
//! 非线性变体（地理↔地心、Molodensky）在规范坐标下工作：
//! (经度 度, 纬度 度, 椭球高 米)。轴序/单位适配由构造器在外层
//! 以线性矩阵包裹，不进入这些公式。
//!
//! # 级联化简规则
//!
//! - 恒等步被吞并
//! - 相邻线性步折叠为单个矩阵
//! - 参数相同的地理↔地心正反对消
//! - 维度契约：前一步的目标维数必须等于后一步的源维数，
//!   不符即构造失败，绝不截断或补齐

use crate::error::{RefError, RefResult};
use crate::matrix::Matrix;
use std::sync::Arc;

/// 数学变换：固定维数的不可变纯函数
#[derive(Debug, Clone, PartialEq)]
pub enum MathTransform {
    /// 仿射变换（轴交换、单位换算、位移矩阵都在此）
    Linear(Matrix),
    /// 地理坐标 -> 地心笛卡尔坐标
    GeographicToGeocentric {
        /// 长半轴 (m)
        a: f64,
        /// 短半轴 (m)
        b: f64,
        /// 地理侧维数（2 或 3）
        dim: usize,
    },
    /// 地心笛卡尔坐标 -> 地理坐标（Bowring 闭式解，非迭代）
    GeocentricToGeographic {
        /// 长半轴 (m)
        a: f64,
        /// 短半轴 (m)
        b: f64,
        /// 地理侧维数（2 或 3）
        dim: usize,
    },
    /// Molodensky / 简化 Molodensky 基准面位移（全程地理坐标）
    Molodensky {
        /// 源椭球长半轴 (m)
        a: f64,
        /// 源椭球扁率
        f: f64,
        /// 长半轴差 (目标-源, m)
        da: f64,
        /// 扁率差 (目标-源)
        df: f64,
        /// X 平移 (m)
        dx: f64,
        /// Y 平移 (m)
        dy: f64,
        /// Z 平移 (m)
        dz: f64,
        /// 维数（2 或 3）
        dim: usize,
        /// 是否用简化式
        abridged: bool,
    },
    /// 穿透变换：仅对中段坐标应用子变换，前后坐标原样通过
    PassThrough {
        /// 前置不变坐标数
        leading: usize,
        /// 子变换
        sub: Arc<MathTransform>,
        /// 后置不变坐标数
        trailing: usize,
    },
    /// 级联变换（按应用顺序）
    Concatenated(Vec<Arc<MathTransform>>),
}

impl MathTransform {
    // ========================================================================
    // 维数
    // ========================================================================

    /// 源坐标维数
    #[must_use]
    pub fn source_dim(&self) -> usize {
        match self {
            Self::Linear(m) => m.source_dim(),
            Self::GeographicToGeocentric { dim, .. } => *dim,
            Self::GeocentricToGeographic { .. } => 3,
            Self::Molodensky { dim, .. } => *dim,
            Self::PassThrough { leading, sub, trailing } => leading + sub.source_dim() + trailing,
            Self::Concatenated(steps) => steps[0].source_dim(),
        }
    }

    /// 目标坐标维数
    #[must_use]
    pub fn target_dim(&self) -> usize {
        match self {
            Self::Linear(m) => m.target_dim(),
            Self::GeographicToGeocentric { .. } => 3,
            Self::GeocentricToGeographic { dim, .. } => *dim,
            Self::Molodensky { dim, .. } => *dim,
            Self::PassThrough { leading, sub, trailing } => leading + sub.target_dim() + trailing,
            Self::Concatenated(steps) => steps[steps.len() - 1].target_dim(),
        }
    }

    /// 是否为恒等变换
    #[must_use]
    pub fn is_identity(&self) -> bool {
        match self {
            Self::Linear(m) => m.is_identity(1e-12),
            Self::Concatenated(steps) => steps.iter().all(|s| s.is_identity()),
            Self::PassThrough { sub, .. } => sub.is_identity(),
            _ => false,
        }
    }

    // ========================================================================
    // 应用
    // ========================================================================

    /// 对坐标元组应用变换
    ///
    /// # Errors
    /// 输入维数与变换不符时返回错误
    pub fn apply(&self, coord: &[f64]) -> RefResult<Vec<f64>> {
        if coord.len() != self.source_dim() {
            return Err(RefError::dimension_mismatch(
                "变换应用",
                self.source_dim(),
                coord.len(),
            ));
        }
        match self {
            Self::Linear(m) => m.apply(coord),
            Self::GeographicToGeocentric { a, b, dim } => {
                let h = if *dim >= 3 { coord[2] } else { 0.0 };
                Ok(geographic_to_geocentric(*a, *b, coord[0], coord[1], h).to_vec())
            }
            Self::GeocentricToGeographic { a, b, dim } => {
                let (lon, lat, h) = geocentric_to_geographic(*a, *b, coord[0], coord[1], coord[2]);
                let mut out = vec![lon, lat];
                if *dim >= 3 {
                    out.push(h);
                }
                Ok(out)
            }
            Self::Molodensky {
                a,
                f,
                da,
                df,
                dx,
                dy,
                dz,
                dim,
                abridged,
            } => {
                let h = if *dim >= 3 { coord[2] } else { 0.0 };
                let (dlon, dlat, dh) =
                    molodensky_shift(*a, *f, *da, *df, *dx, *dy, *dz, *abridged, coord[0], coord[1], h)?;
                let mut out = vec![coord[0] + dlon, coord[1] + dlat];
                if *dim >= 3 {
                    out.push(h + dh);
                }
                Ok(out)
            }
            Self::PassThrough { leading, sub, trailing } => {
                let mid_end = coord.len() - trailing;
                let mut out = Vec::with_capacity(self.target_dim());
                out.extend_from_slice(&coord[..*leading]);
                out.extend(sub.apply(&coord[*leading..mid_end])?);
                out.extend_from_slice(&coord[mid_end..]);
                Ok(out)
            }
            Self::Concatenated(steps) => {
                let mut cur = coord.to_vec();
                for step in steps {
                    cur = step.apply(&cur)?;
                }
                Ok(cur)
            }
        }
    }

    // ========================================================================
    // 求逆
    // ========================================================================

    /// 求逆变换
    ///
    /// # Errors
    /// 不可逆（奇异矩阵、非方阵）时返回 `NonInvertible`
    pub fn inverse(&self) -> RefResult<MathTransform> {
        match self {
            Self::Linear(m) => Ok(Self::Linear(m.inverse()?)),
            Self::GeographicToGeocentric { a, b, dim } => Ok(Self::GeocentricToGeographic {
                a: *a,
                b: *b,
                dim: *dim,
            }),
            Self::GeocentricToGeographic { a, b, dim } => Ok(Self::GeographicToGeocentric {
                a: *a,
                b: *b,
                dim: *dim,
            }),
            Self::Molodensky {
                a,
                f,
                da,
                df,
                dx,
                dy,
                dz,
                dim,
                abridged,
            } => Ok(Self::Molodensky {
                // 位移在目标椭球上反向进行
                a: a + da,
                f: f + df,
                da: -da,
                df: -df,
                dx: -dx,
                dy: -dy,
                dz: -dz,
                dim: *dim,
                abridged: *abridged,
            }),
            Self::PassThrough { leading, sub, trailing } => Ok(Self::PassThrough {
                leading: *leading,
                sub: Arc::new(sub.inverse()?),
                trailing: *trailing,
            }),
            Self::Concatenated(steps) => {
                let mut inv = Vec::with_capacity(steps.len());
                for step in steps.iter().rev() {
                    inv.push(Arc::new(step.inverse()?));
                }
                Ok(Self::Concatenated(inv))
            }
        }
    }

    // ========================================================================
    // 级联
    // ========================================================================

    /// 级联两个变换（先 first 后 second），同时化简
    ///
    /// # Errors
    /// 维度契约不满足时返回 `DimensionMismatch`
    pub fn concatenate(first: &Arc<MathTransform>, second: &Arc<MathTransform>) -> RefResult<MathTransform> {
        if first.target_dim() != second.source_dim() {
            return Err(RefError::dimension_mismatch(
                "变换级联",
                first.target_dim(),
                second.source_dim(),
            ));
        }
        let src_dim = first.source_dim();
        let mut flat: Vec<Arc<MathTransform>> = Vec::new();
        flatten_into(first, &mut flat);
        flatten_into(second, &mut flat);

        // 逐步吞并恒等、与队尾融合到不动点
        let mut steps: Vec<Arc<MathTransform>> = Vec::new();
        for step in flat {
            if step.is_identity() {
                continue;
            }
            let mut current = Some(step);
            loop {
                let (Some(cur), Some(prev)) = (current.as_ref(), steps.last()) else {
                    break;
                };
                let Some(fused) = fuse(prev, cur) else { break };
                steps.pop();
                current = if fused.is_identity() {
                    None
                } else {
                    Some(Arc::new(fused))
                };
            }
            if let Some(cur) = current {
                steps.push(cur);
            }
        }

        match steps.len() {
            0 => Ok(Self::Linear(Matrix::identity(src_dim + 1))),
            1 => Ok((*steps[0]).clone()),
            _ => Ok(Self::Concatenated(steps)),
        }
    }

    /// 级联步骤的展开视图（非级联变换视为单步）
    #[must_use]
    pub fn steps(&self) -> Vec<Arc<MathTransform>> {
        let mut out = Vec::new();
        match self {
            Self::Concatenated(steps) => out.extend(steps.iter().cloned()),
            other => out.push(Arc::new(other.clone())),
        }
        out
    }
}

fn flatten_into(t: &Arc<MathTransform>, out: &mut Vec<Arc<MathTransform>>) {
    match t.as_ref() {
        MathTransform::Concatenated(steps) => {
            for s in steps {
                flatten_into(s, out);
            }
        }
        _ => out.push(t.clone()),
    }
}

/// 尝试把相邻两步融合为一步（不可融合返回 None）
fn fuse(a: &Arc<MathTransform>, b: &Arc<MathTransform>) -> Option<MathTransform> {
    match (a.as_ref(), b.as_ref()) {
        (MathTransform::Linear(ma), MathTransform::Linear(mb)) => {
            // 先 a 后 b：矩阵为 Mb·Ma
            mb.multiply(ma).ok().map(MathTransform::Linear)
        }
        (
            MathTransform::GeographicToGeocentric { a: a1, b: b1, dim: d1 },
            MathTransform::GeocentricToGeographic { a: a2, b: b2, dim: d2 },
        )
        | (
            MathTransform::GeocentricToGeographic { a: a1, b: b1, dim: d1 },
            MathTransform::GeographicToGeocentric { a: a2, b: b2, dim: d2 },
        ) if a1 == a2 && b1 == b2 && d1 == d2 => {
            Some(MathTransform::Linear(Matrix::identity(a.source_dim() + 1)))
        }
        _ => None,
    }
}

// ============================================================================
// 地理 <-> 地心公式
// ============================================================================

fn geographic_to_geocentric(a: f64, b: f64, lon_deg: f64, lat_deg: f64, h: f64) -> [f64; 3] {
    let e2 = (a * a - b * b) / (a * a);
    let lam = lon_deg.to_radians();
    let phi = lat_deg.to_radians();
    let (sphi, cphi) = phi.sin_cos();
    let (slam, clam) = lam.sin_cos();
    let n = a / (1.0 - e2 * sphi * sphi).sqrt();
    [
        (n + h) * cphi * clam,
        (n + h) * cphi * slam,
        (n * (1.0 - e2) + h) * sphi,
    ]
}

fn geocentric_to_geographic(a: f64, b: f64, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let e2 = (a * a - b * b) / (a * a);
    let ep2 = (a * a - b * b) / (b * b);
    let p = x.hypot(y);
    let lon = y.atan2(x);

    // Bowring 闭式解
    let theta = (z * a).atan2(p * b);
    let (st, ct) = theta.sin_cos();
    let lat = (z + ep2 * b * st * st * st).atan2(p - e2 * a * ct * ct * ct);
    let (sphi, cphi) = lat.sin_cos();
    let n = a / (1.0 - e2 * sphi * sphi).sqrt();
    // 高纬度时用 Z 分量求高程更稳定
    let h = if cphi.abs() > 1e-8 {
        p / cphi - n
    } else {
        z / sphi - n * (1.0 - e2)
    };
    (lon.to_degrees(), lat.to_degrees(), h)
}

// ============================================================================
// Molodensky 公式
// ============================================================================

#[allow(clippy::too_many_arguments)]
fn molodensky_shift(
    a: f64,
    f: f64,
    da: f64,
    df: f64,
    dx: f64,
    dy: f64,
    dz: f64,
    abridged: bool,
    lon_deg: f64,
    lat_deg: f64,
    h: f64,
) -> RefResult<(f64, f64, f64)> {
    let es = f * (2.0 - f);
    let lam = lon_deg.to_radians();
    let phi = lat_deg.to_radians();
    let (slam, clam) = lam.sin_cos();
    let (sphi, cphi) = phi.sin_cos();

    // 曲率半径
    let n = a / (1.0 - es * sphi * sphi).sqrt();
    let m = a * (1.0 - es) / (1.0 - es * sphi * sphi).powf(1.5);

    let fac = dx * clam + dy * slam;
    let adffda = a * df + f * da;

    let (dlam, dphi, dh);
    if abridged {
        let dlam_denom = n * cphi;
        if dlam_denom == 0.0 {
            return Err(RefError::invalid_geodetic("Molodensky 在极点退化"));
        }
        dphi = (-fac * sphi + dz * cphi + adffda * (2.0 * phi).sin()) / m;
        dlam = (dy * clam - dx * slam) / dlam_denom;
        dh = fac * cphi + (dz + adffda * sphi) * sphi - da;
    } else {
        let dphi_denom = m + h;
        let dlam_denom = (n + h) * cphi;
        if dphi_denom == 0.0 || dlam_denom == 0.0 {
            return Err(RefError::invalid_geodetic("Molodensky 在极点退化"));
        }
        dphi = ((dz + (n * es * sphi * da) / a) * cphi - fac * sphi
            + (m / (1.0 - f) + n * (1.0 - f)) * df * sphi * cphi)
            / dphi_denom;
        dlam = (dy * clam - dx * slam) / dlam_denom;
        dh = fac * cphi + dz * sphi - (a / n) * da + n * (1.0 - f) * df * sphi * sphi;
    }
    Ok((dlam.to_degrees(), dphi.to_degrees(), dh))
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ellipsoid::Ellipsoid;

    fn wgs84_geog_to_geoc(dim: usize) -> MathTransform {
        let e = Ellipsoid::WGS84;
        MathTransform::GeographicToGeocentric {
            a: e.a,
            b: e.semi_minor(),
            dim,
        }
    }

    #[test]
    fn test_geographic_to_geocentric_equator() {
        let t = wgs84_geog_to_geoc(3);
        // (lon=0, lat=0, h=0) -> (a, 0, 0)
        let out = t.apply(&[0.0, 0.0, 0.0]).expect("apply");
        assert!((out[0] - 6_378_137.0).abs() < 1e-6);
        assert!(out[1].abs() < 1e-6);
        assert!(out[2].abs() < 1e-6);

        // (lon=90, lat=0, h=0) -> (0, a, 0)
        let out = t.apply(&[90.0, 0.0, 0.0]).expect("apply");
        assert!(out[0].abs() < 1e-6);
        assert!((out[1] - 6_378_137.0).abs() < 1e-6);
    }

    #[test]
    fn test_geocentric_roundtrip() {
        let fwd = wgs84_geog_to_geoc(3);
        let inv = fwd.inverse().expect("inverse");
        let p = [116.391, 39.907, 43.5];
        let xyz = fwd.apply(&p).expect("fwd");
        let back = inv.apply(&xyz).expect("inv");
        assert!((back[0] - p[0]).abs() < 1e-9);
        assert!((back[1] - p[1]).abs() < 1e-9);
        assert!((back[2] - p[2]).abs() < 1e-4);
    }

    #[test]
    fn test_concatenate_cancels_inverse_pair() {
        let fwd = Arc::new(wgs84_geog_to_geoc(3));
        let inv = Arc::new(fwd.inverse().expect("inverse"));
        let combined = MathTransform::concatenate(&fwd, &inv).expect("concat");
        assert!(combined.is_identity());
    }

    #[test]
    fn test_concatenate_folds_linear() {
        let mut m1 = Matrix::identity(3);
        m1.set(0, 0, 2.0);
        let mut m2 = Matrix::identity(3);
        m2.set(0, 2, 10.0);
        let a = Arc::new(MathTransform::Linear(m1));
        let b = Arc::new(MathTransform::Linear(m2));
        let c = MathTransform::concatenate(&a, &b).expect("concat");
        // 折叠为单个线性步
        assert!(matches!(c, MathTransform::Linear(_)));
        let out = c.apply(&[5.0, 1.0]).expect("apply");
        assert!((out[0] - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_concatenate_dimension_contract() {
        let a = Arc::new(MathTransform::Linear(Matrix::identity(3))); // 2->2
        let b = Arc::new(MathTransform::Linear(Matrix::identity(4))); // 3->3
        assert!(matches!(
            MathTransform::concatenate(&a, &b),
            Err(RefError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_pass_through() {
        let mut m = Matrix::identity(2);
        m.set(0, 0, 2.0);
        let t = MathTransform::PassThrough {
            leading: 1,
            sub: Arc::new(MathTransform::Linear(m)),
            trailing: 1,
        };
        assert_eq!(t.source_dim(), 3);
        let out = t.apply(&[7.0, 5.0, 9.0]).expect("apply");
        assert_eq!(out, vec![7.0, 10.0, 9.0]);
    }

    #[test]
    fn test_molodensky_matches_geocentric_path() {
        // WGS84 -> ED50（EPSG 指南测试点），Molodensky 与
        // 地心三步路径应在 5mm 内一致
        let wgs84 = Ellipsoid::WGS84;
        let intl = Ellipsoid::INTERNATIONAL_1924;
        let (dx, dy, dz) = (84.87, 96.49, 116.95);

        let molo = MathTransform::Molodensky {
            a: wgs84.a,
            f: wgs84.f,
            da: intl.a - wgs84.a,
            df: intl.f - wgs84.f,
            dx,
            dy,
            dz,
            dim: 3,
            abridged: false,
        };

        let to_geoc = Arc::new(MathTransform::GeographicToGeocentric {
            a: wgs84.a,
            b: wgs84.semi_minor(),
            dim: 3,
        });
        let mut shift = Matrix::identity(4);
        shift.set(0, 3, dx);
        shift.set(1, 3, dy);
        shift.set(2, 3, dz);
        let shift = Arc::new(MathTransform::Linear(shift));
        let to_geog = Arc::new(MathTransform::GeocentricToGeographic {
            a: intl.a,
            b: intl.semi_minor(),
            dim: 3,
        });
        let step1 = Arc::new(MathTransform::concatenate(&to_geoc, &shift).expect("c1"));
        let chain = MathTransform::concatenate(&step1, &to_geog).expect("c2");

        let p = [2.129_55, 53.809_394_444_444_44, 73.0];
        let via_molo = molo.apply(&p).expect("molo");
        let via_chain = chain.apply(&p).expect("chain");
        // 平面 5mm，约 5e-8 度
        assert!((via_molo[0] - via_chain[0]).abs() < 1e-7);
        assert!((via_molo[1] - via_chain[1]).abs() < 1e-7);
        assert!((via_molo[2] - via_chain[2]).abs() < 0.005);
    }

    #[test]
    fn test_molodensky_inverse_roundtrip() {
        let wgs84 = Ellipsoid::WGS84;
        let intl = Ellipsoid::INTERNATIONAL_1924;
        let molo = MathTransform::Molodensky {
            a: wgs84.a,
            f: wgs84.f,
            da: intl.a - wgs84.a,
            df: intl.f - wgs84.f,
            dx: 84.87,
            dy: 96.49,
            dz: 116.95,
            dim: 3,
            abridged: false,
        };
        let inv = molo.inverse().expect("inverse");
        let p = [2.129_55, 53.809_4, 73.0];
        let fwd = molo.apply(&p).expect("fwd");
        let back = inv.apply(&fwd).expect("back");
        // 一阶近似的往返残差在亚毫米/纳度级
        assert!((back[0] - p[0]).abs() < 1e-8);
        assert!((back[1] - p[1]).abs() < 1e-8);
        assert!((back[2] - p[2]).abs() < 1e-3);
    }
}
