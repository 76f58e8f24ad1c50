// georef\crates\gr_referencing\src/pool.rs

//! 变换共享池
//!
//! 按值相等去重 `MathTransform` 实例：数值定义相同的变换
//! 返回同一个 `Arc`。池只持弱引用，不延长实例寿命；
//! 死引用在命中同一桶时顺带清理。
//!
//! 哈希键对 f64 取位模式（NaN 安全），碰撞桶内再做值比较。

use crate::matrix::Matrix;
use crate::transform::MathTransform;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

/// 变换去重池（共享、长寿命、线程安全）
#[derive(Default)]
pub struct TransformPool {
    buckets: Mutex<HashMap<u64, Vec<Weak<MathTransform>>>>,
}

impl TransformPool {
    /// 空池
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 取唯一实例：池中已有等值变换则返回它，否则收录新实例
    #[must_use]
    pub fn unique(&self, transform: MathTransform) -> Arc<MathTransform> {
        let key = hash_transform(&transform);
        let mut buckets = self.buckets.lock();
        let bucket = buckets.entry(key).or_default();
        bucket.retain(|w| w.strong_count() > 0);
        for weak in bucket.iter() {
            if let Some(existing) = weak.upgrade() {
                if *existing == transform {
                    return existing;
                }
            }
        }
        let arc = Arc::new(transform);
        bucket.push(Arc::downgrade(&arc));
        arc
    }

    /// 当前存活条目数（诊断用）
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets
            .lock()
            .values()
            .map(|b| b.iter().filter(|w| w.strong_count() > 0).count())
            .sum()
    }

    /// 池是否为空
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn hash_transform(t: &MathTransform) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    hash_into(t, &mut hasher);
    hasher.finish()
}

fn hash_into(t: &MathTransform, h: &mut impl Hasher) {
    match t {
        MathTransform::Linear(m) => {
            0u8.hash(h);
            hash_matrix(m, h);
        }
        MathTransform::GeographicToGeocentric { a, b, dim } => {
            1u8.hash(h);
            a.to_bits().hash(h);
            b.to_bits().hash(h);
            dim.hash(h);
        }
        MathTransform::GeocentricToGeographic { a, b, dim } => {
            2u8.hash(h);
            a.to_bits().hash(h);
            b.to_bits().hash(h);
            dim.hash(h);
        }
        MathTransform::Molodensky {
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
            3u8.hash(h);
            for v in [a, f, da, df, dx, dy, dz] {
                v.to_bits().hash(h);
            }
            dim.hash(h);
            abridged.hash(h);
        }
        MathTransform::PassThrough { leading, sub, trailing } => {
            4u8.hash(h);
            leading.hash(h);
            hash_into(sub, h);
            trailing.hash(h);
        }
        MathTransform::Concatenated(steps) => {
            5u8.hash(h);
            steps.len().hash(h);
            for s in steps {
                hash_into(s, h);
            }
        }
    }
}

fn hash_matrix(m: &Matrix, h: &mut impl Hasher) {
    m.rows().hash(h);
    m.cols().hash(h);
    for r in 0..m.rows() {
        for c in 0..m.cols() {
            m.get(r, c).to_bits().hash(h);
        }
    }
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_equal_value() {
        let pool = TransformPool::new();
        let a = pool.unique(MathTransform::Linear(Matrix::identity(3)));
        let b = pool.unique(MathTransform::Linear(Matrix::identity(3)));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(pool.len(), 1);

        let c = pool.unique(MathTransform::Linear(Matrix::identity(4)));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_weak_entries_expire() {
        let pool = TransformPool::new();
        {
            let _short = pool.unique(MathTransform::Linear(Matrix::identity(3)));
            assert_eq!(pool.len(), 1);
        }
        // 强引用释放后条目过期
        assert!(pool.is_empty());
        let again = pool.unique(MathTransform::Linear(Matrix::identity(3)));
        assert_eq!(Arc::strong_count(&again), 1);
    }

    #[test]
    fn test_nan_constant_dedup() {
        // NaN 注入维常量按位相等，可正常去重
        let pool = TransformPool::new();
        let a = pool.unique(MathTransform::Linear(Matrix::append_dimension(2, f64::NAN)));
        let b = pool.unique(MathTransform::Linear(Matrix::append_dimension(2, f64::NAN)));
        assert!(Arc::ptr_eq(&a, &b));
    }
}
