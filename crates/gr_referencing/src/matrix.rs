// georef\crates\gr_referencing\src/matrix.rs

//! 通用仿射矩阵
//!
//! 以齐次坐标表示任意 N 维到 M 维的仿射变换：矩阵尺寸为
//! (M+1) × (N+1)，最末行固定为 [0, …, 0, 1]，最末列为平移项。
//! 轴交换、单位换算、维度选择、常量注入都归结为这一种矩阵。
//!
//! # 示例
//!
//! ```
//! use gr_referencing::matrix::Matrix;
//!
//! // 2D 恒等
//! let m = Matrix::identity(3);
//! assert!(m.is_identity(1e-12));
//!
//! // (lat, lon) -> (lon, lat) 轴交换
//! let mut swap = Matrix::zeros(3, 3);
//! swap.set(0, 1, 1.0);
//! swap.set(1, 0, 1.0);
//! swap.set(2, 2, 1.0);
//! let out = swap.apply(&[40.0, 116.0]).unwrap();
//! assert_eq!(out, vec![116.0, 40.0]);
//! ```

use crate::error::{RefError, RefResult};
use serde::{Deserialize, Serialize};

/// 齐次仿射矩阵（行主序）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    m: Vec<f64>,
}

impl Matrix {
    // ========================================================================
    // 构造方法
    // ========================================================================

    /// n × n 恒等矩阵
    #[must_use]
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.set(i, i, 1.0);
        }
        m
    }

    /// 全零矩阵
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            m: vec![0.0; rows * cols],
        }
    }

    /// 维度选择矩阵：从 `source_dim` 维输入中按 `selected`
    /// 给定的顺序抽取坐标（可丢弃、可重排）
    #[must_use]
    pub fn dimension_select(source_dim: usize, selected: &[usize]) -> Self {
        let mut m = Self::zeros(selected.len() + 1, source_dim + 1);
        for (row, &col) in selected.iter().enumerate() {
            m.set(row, col, 1.0);
        }
        m.set(selected.len(), source_dim, 1.0);
        m
    }

    /// 末尾追加一个常量维度：dim 维输入 -> dim+1 维输出，
    /// 新增坐标恒为 `value`（0 表示补零，NaN 表示纯占位）
    #[must_use]
    pub fn append_dimension(dim: usize, value: f64) -> Self {
        let mut m = Self::zeros(dim + 2, dim + 1);
        for i in 0..dim {
            m.set(i, i, 1.0);
        }
        m.set(dim, dim, value); // 平移列
        m.set(dim + 1, dim, 1.0);
        m
    }

    /// 末尾丢弃一个维度：dim 维输入 -> dim-1 维输出
    #[must_use]
    pub fn drop_last_dimension(dim: usize) -> Self {
        let selected: Vec<usize> = (0..dim - 1).collect();
        Self::dimension_select(dim, &selected)
    }

    // ========================================================================
    // 访问
    // ========================================================================

    /// 行数（含齐次行）
    #[inline]
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// 列数（含齐次列）
    #[inline]
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// 输入坐标维数
    #[inline]
    #[must_use]
    pub fn source_dim(&self) -> usize {
        self.cols - 1
    }

    /// 输出坐标维数
    #[inline]
    #[must_use]
    pub fn target_dim(&self) -> usize {
        self.rows - 1
    }

    /// 读取元素
    #[inline]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.m[row * self.cols + col]
    }

    /// 写入元素
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.m[row * self.cols + col] = value;
    }

    /// 向平移列叠加一项（用于时间原点差等折叠进矩阵的平移）
    pub fn add_translation(&mut self, row: usize, delta: f64) {
        let col = self.cols - 1;
        let v = self.get(row, col);
        self.set(row, col, v + delta);
    }

    // ========================================================================
    // 判定
    // ========================================================================

    /// 是否为恒等矩阵（给定容差）
    #[must_use]
    pub fn is_identity(&self, tol: f64) -> bool {
        if self.rows != self.cols {
            return false;
        }
        for r in 0..self.rows {
            for c in 0..self.cols {
                let expect = if r == c { 1.0 } else { 0.0 };
                let v = self.get(r, c);
                if !v.is_finite() || (v - expect).abs() > tol {
                    return false;
                }
            }
        }
        true
    }

    /// 齐次行是否规范（[0,…,0,1]）
    #[must_use]
    pub fn is_affine(&self) -> bool {
        let last = self.rows - 1;
        for c in 0..self.cols - 1 {
            if self.get(last, c) != 0.0 {
                return false;
            }
        }
        self.get(last, self.cols - 1) == 1.0
    }

    // ========================================================================
    // 运算
    // ========================================================================

    /// 矩阵乘法 self · other（先应用 other，再应用 self）
    ///
    /// # Errors
    /// 维度不匹配时返回错误
    pub fn multiply(&self, other: &Self) -> RefResult<Self> {
        if self.cols != other.rows {
            return Err(RefError::dimension_mismatch(
                "矩阵乘法",
                self.cols,
                other.rows,
            ));
        }
        let mut out = Self::zeros(self.rows, other.cols);
        for r in 0..self.rows {
            for c in 0..other.cols {
                let mut acc = 0.0;
                for k in 0..self.cols {
                    let a = self.get(r, k);
                    let b = other.get(k, c);
                    // 0 乘以 NaN 占位不应污染结果
                    if a != 0.0 && b != 0.0 {
                        acc += a * b;
                    }
                }
                out.set(r, c, acc);
            }
        }
        if !out.is_affine() {
            return Err(RefError::factory("矩阵乘法结果失去仿射性"));
        }
        Ok(out)
    }

    /// Gauss-Jordan 求逆（仅方阵）
    ///
    /// # Errors
    /// 非方阵或奇异矩阵时返回 `NonInvertible`
    pub fn inverse(&self) -> RefResult<Self> {
        if self.rows != self.cols {
            return Err(RefError::non_invertible(format!(
                "非方阵 {}x{}",
                self.rows, self.cols
            )));
        }
        let n = self.rows;
        let mut a = self.clone();
        let mut inv = Self::identity(n);

        for col in 0..n {
            // 选主元
            let mut pivot = col;
            let mut best = a.get(col, col).abs();
            for r in col + 1..n {
                let v = a.get(r, col).abs();
                if v > best {
                    best = v;
                    pivot = r;
                }
            }
            if best < 1e-15 || !best.is_finite() {
                return Err(RefError::non_invertible("奇异矩阵"));
            }
            if pivot != col {
                a.swap_rows(pivot, col);
                inv.swap_rows(pivot, col);
            }
            let d = a.get(col, col);
            for c in 0..n {
                a.set(col, c, a.get(col, c) / d);
                inv.set(col, c, inv.get(col, c) / d);
            }
            for r in 0..n {
                if r == col {
                    continue;
                }
                let factor = a.get(r, col);
                if factor == 0.0 {
                    continue;
                }
                for c in 0..n {
                    a.set(r, c, a.get(r, c) - factor * a.get(col, c));
                    inv.set(r, c, inv.get(r, c) - factor * inv.get(col, c));
                }
            }
        }
        Ok(inv)
    }

    /// 对坐标元组应用变换
    ///
    /// # Errors
    /// 输入维数与矩阵不符时返回错误
    pub fn apply(&self, coord: &[f64]) -> RefResult<Vec<f64>> {
        if coord.len() != self.source_dim() {
            return Err(RefError::dimension_mismatch(
                "矩阵应用",
                self.source_dim(),
                coord.len(),
            ));
        }
        let mut out = Vec::with_capacity(self.target_dim());
        for r in 0..self.target_dim() {
            let mut acc = self.get(r, self.cols - 1); // 平移项
            for (c, &x) in coord.iter().enumerate() {
                let a = self.get(r, c);
                if a != 0.0 {
                    acc += a * x;
                }
            }
            out.push(acc);
        }
        Ok(out)
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        for c in 0..self.cols {
            let tmp = self.get(a, c);
            self.set(a, c, self.get(b, c));
            self.set(b, c, tmp);
        }
    }
}

// 以比特位比较浮点，保证含 NaN 占位的矩阵也有确定的相等语义（池化需要）
impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && self
                .m
                .iter()
                .zip(other.m.iter())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let m = Matrix::identity(4);
        assert!(m.is_identity(1e-12));
        assert!(m.is_affine());
        let out = m.apply(&[1.0, 2.0, 3.0]).expect("apply");
        assert_eq!(out, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_multiply_and_inverse() {
        // 缩放 + 平移
        let mut m = Matrix::identity(3);
        m.set(0, 0, 2.0);
        m.set(0, 2, 10.0);
        m.set(1, 1, 3.0);
        m.set(1, 2, 20.0);

        let out = m.apply(&[5.0, 5.0]).expect("apply");
        assert!((out[0] - 20.0).abs() < 1e-12);
        assert!((out[1] - 35.0).abs() < 1e-12);

        let inv = m.inverse().expect("inverse");
        let round = inv.multiply(&m).expect("multiply");
        assert!(round.is_identity(1e-12));
    }

    #[test]
    fn test_multiply_dimension_check() {
        let a = Matrix::identity(3);
        let b = Matrix::identity(4);
        assert!(matches!(
            a.multiply(&b),
            Err(RefError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_dimension_select() {
        // 3D -> 2D，丢掉高度并交换经纬
        let m = Matrix::dimension_select(3, &[1, 0]);
        let out = m.apply(&[40.0, 116.0, 50.0]).expect("apply");
        assert_eq!(out, vec![116.0, 40.0]);
    }

    #[test]
    fn test_append_dimension() {
        let m = Matrix::append_dimension(2, 0.0);
        let out = m.apply(&[116.0, 40.0]).expect("apply");
        assert_eq!(out, vec![116.0, 40.0, 0.0]);

        let m = Matrix::append_dimension(2, f64::NAN);
        let out = m.apply(&[116.0, 40.0]).expect("apply");
        assert!(out[2].is_nan());
    }

    #[test]
    fn test_drop_last_dimension() {
        let m = Matrix::drop_last_dimension(3);
        let out = m.apply(&[1.0, 2.0, 3.0]).expect("apply");
        assert_eq!(out, vec![1.0, 2.0]);
    }

    #[test]
    fn test_singular_inverse_fails() {
        let m = Matrix::zeros(3, 3);
        assert!(matches!(m.inverse(), Err(RefError::NonInvertible { .. })));
    }

    #[test]
    fn test_bitwise_eq_with_nan() {
        let a = Matrix::append_dimension(2, f64::NAN);
        let b = Matrix::append_dimension(2, f64::NAN);
        assert_eq!(a, b);
        let c = Matrix::append_dimension(2, 0.0);
        assert!(a != c);
    }

    #[test]
    fn test_add_translation() {
        let mut m = Matrix::identity(2);
        m.add_translation(0, 5.0);
        let out = m.apply(&[1.0]).expect("apply");
        assert!((out[0] - 6.0).abs() < 1e-12);
    }
}
