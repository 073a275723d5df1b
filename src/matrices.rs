use crate::error::{Error, Result};
use crate::vectors::Vector;
use crate::DMatrix;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::{Index, Mul, Neg};

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pivots whose magnitude is below this are treated as zero by [`Matrix::solve`].
pub const DEFAULT_PIVOT_EPSILON: f64 = 1e-9;

/// A rectangular M×N matrix of real numbers.
///
/// Matrices are constructed row-major. Like [`Vector`], every operation on a `Matrix` returns a
/// new value, and operations whose operand shapes are incompatible fail with
/// [`Error::DimensionMismatch`].
///
/// ```rust
/// use mcgeo::{Matrix, Vector};
///
/// let a = Matrix::from_rows(&[[1., 2.], [3., 4.]]).unwrap();
/// let v = Vector::from([1., 1.]);
/// assert_eq!(a.multiply_vector(&v).unwrap(), Vector::from([3., 7.]));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Matrix {
    pub(crate) inner: DMatrix,
}

impl Matrix {
    pub(crate) fn from_nalgebra_matrix(inner: DMatrix) -> Self {
        Self { inner }
    }

    /// Constructs a matrix from a list of rows.
    ///
    /// Fails with [`Error::DimensionMismatch`] if the rows are not all the same length.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let ncols = rows.first().map_or(0, |row| row.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * ncols);
        for row in rows {
            let row = row.as_ref();
            if row.len() != ncols {
                return Err(Error::dimension_mismatch("from_rows", ncols, row.len()));
            }
            data.extend_from_slice(row);
        }
        Ok(Self::from_nalgebra_matrix(DMatrix::from_row_slice(
            rows.len(),
            ncols,
            &data,
        )))
    }

    /// Constructs an `nrows`×`ncols` matrix from its elements in row-major order.
    ///
    /// Fails with [`Error::DimensionMismatch`] unless `data` holds exactly `nrows * ncols`
    /// elements.
    pub fn from_row_slice(nrows: usize, ncols: usize, data: &[f64]) -> Result<Self> {
        if data.len() != nrows * ncols {
            return Err(Error::dimension_mismatch(
                "from_row_slice",
                nrows * ncols,
                data.len(),
            ));
        }
        Ok(Self::from_nalgebra_matrix(DMatrix::from_row_slice(
            nrows, ncols, data,
        )))
    }

    /// Constructs the `n`×`n` identity matrix.
    #[must_use]
    pub fn identity(n: usize) -> Self {
        Self::from_nalgebra_matrix(DMatrix::identity(n, n))
    }

    /// Constructs an `nrows`×`ncols` matrix of zeros.
    #[must_use]
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self::from_nalgebra_matrix(DMatrix::zeros(nrows, ncols))
    }

    #[must_use]
    pub fn nrows(&self) -> usize {
        self.inner.nrows()
    }

    #[must_use]
    pub fn ncols(&self) -> usize {
        self.inner.ncols()
    }

    /// Returns `(rows, columns)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.inner.shape()
    }

    /// Returns the element at `(row, col)`, or `None` if it is out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.inner.get((row, col)).copied()
    }

    /// Returns row `row` as a [`Vector`], or `None` if it is out of bounds.
    #[must_use]
    pub fn row(&self, row: usize) -> Option<Vector> {
        (row < self.nrows()).then(|| {
            Vector::from(self.inner.row(row).iter().copied().collect::<Vec<_>>())
        })
    }

    /// Computes the matrix product `self · rhs`.
    ///
    /// Fails with [`Error::DimensionMismatch`] unless `self` has as many columns as `rhs` has
    /// rows.
    #[doc(alias = "matmul")]
    pub fn multiply(&self, rhs: &Self) -> Result<Self> {
        if self.ncols() != rhs.nrows() {
            return Err(Error::dimension_mismatch(
                "multiply",
                self.ncols(),
                rhs.nrows(),
            ));
        }
        Ok(Self::from_nalgebra_matrix(&self.inner * &rhs.inner))
    }

    /// Multiplies this matrix by the column vector `v`.
    ///
    /// Fails with [`Error::DimensionMismatch`] unless `v` has as many components as this matrix
    /// has columns.
    pub fn multiply_vector(&self, v: &Vector) -> Result<Vector> {
        if self.ncols() != v.len() {
            return Err(Error::dimension_mismatch(
                "multiply_vector",
                self.ncols(),
                v.len(),
            ));
        }
        Ok(Vector::from_nalgebra_vector(&self.inner * &v.inner))
    }

    #[must_use]
    pub fn transpose(&self) -> Self {
        Self::from_nalgebra_matrix(self.inner.transpose())
    }

    /// Adds two matrices element-wise.
    pub fn checked_add(&self, rhs: &Self) -> Result<Self> {
        self.require_same_shape("add", rhs)?;
        Ok(Self::from_nalgebra_matrix(&self.inner + &rhs.inner))
    }

    /// Subtracts `rhs` from this matrix element-wise.
    pub fn checked_sub(&self, rhs: &Self) -> Result<Self> {
        self.require_same_shape("sub", rhs)?;
        Ok(Self::from_nalgebra_matrix(&self.inner - &rhs.inner))
    }

    /// Solves `self · x = rhs` for `x` by Gauss-Jordan elimination.
    ///
    /// Equivalent to [`Matrix::solve_with_epsilon`] with [`DEFAULT_PIVOT_EPSILON`].
    pub fn solve(&self, rhs: &Vector) -> Result<Vector> {
        self.solve_with_epsilon(rhs, DEFAULT_PIVOT_EPSILON)
    }

    /// Solves `self · x = rhs` for `x` by Gauss-Jordan elimination.
    ///
    /// Each column is pivoted on the row at or below the diagonal with the largest magnitude in
    /// that column. A pivot is usable only if it is finite and its magnitude exceeds `eps`
    /// (negative `eps` counts as 0). If there is no usable pivot, the system is singular and the
    /// solve fails with [`Error::Domain`].
    ///
    /// `self` must be square and `rhs` must have as many components as `self` has rows;
    /// otherwise this fails with [`Error::DimensionMismatch`].
    pub fn solve_with_epsilon(&self, rhs: &Vector, eps: f64) -> Result<Vector> {
        let n = self.nrows();
        if self.ncols() != n {
            return Err(Error::dimension_mismatch("solve", n, self.ncols()));
        }
        if rhs.len() != n {
            return Err(Error::dimension_mismatch("solve", n, rhs.len()));
        }
        let eps = eps.max(0.);

        let mut m = self.inner.clone();
        let mut x = rhs.inner.clone();
        for r in 0..n {
            let swap = (r + 1..n).fold(r, |best, i| {
                if m[(i, r)].abs() > m[(best, r)].abs() {
                    i
                } else {
                    best
                }
            });
            let pivot = m[(swap, r)];
            // also rejects NaN
            if !(pivot.is_finite() && pivot.abs() > eps) {
                log::debug!("singular system: no pivot for column {r} above {eps}");
                return Err(Error::domain(format!(
                    "singular system: no usable pivot in column {r}"
                )));
            }
            if swap != r {
                m.swap_rows(r, swap);
                x.swap_rows(r, swap);
            }

            let pivot_inv = 1. / m[(r, r)];
            for c in 0..n {
                m[(r, c)] *= pivot_inv;
            }
            x[r] *= pivot_inv;

            for i in (0..n).filter(|&i| i != r) {
                let factor = m[(i, r)];
                if factor == 0. {
                    continue;
                }
                for c in 0..n {
                    m[(i, c)] -= factor * m[(r, c)];
                }
                x[i] -= factor * x[r];
            }
        }

        Ok(Vector::from_nalgebra_vector(x))
    }

    fn require_same_shape(&self, operation: &'static str, rhs: &Self) -> Result<()> {
        if self.nrows() != rhs.nrows() {
            return Err(Error::dimension_mismatch(
                operation,
                self.nrows(),
                rhs.nrows(),
            ));
        }
        if self.ncols() != rhs.ncols() {
            return Err(Error::dimension_mismatch(
                operation,
                self.ncols(),
                rhs.ncols(),
            ));
        }
        Ok(())
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        &self.inner[index]
    }
}

impl Neg for Matrix {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::from_nalgebra_matrix(-self.inner)
    }
}

impl Mul<f64> for Matrix {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::from_nalgebra_matrix(self.inner * scalar)
    }
}

impl Mul<Matrix> for f64 {
    type Output = Matrix;

    fn mul(self, matrix: Matrix) -> Self::Output {
        matrix * self
    }
}

impl Display for Matrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (r, row) in self.inner.row_iter().enumerate() {
            if r > 0 {
                write!(f, ", ")?;
            }
            write!(f, "[")?;
            for (c, element) in row.iter().enumerate() {
                if c > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{element}")?;
            }
            write!(f, "]")?;
        }
        write!(f, "]")
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for Matrix {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.shape() == other.shape() && self.inner.abs_diff_eq(&other.inner, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for Matrix {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.shape() == other.shape()
            && self.inner.relative_eq(&other.inner, epsilon, max_relative)
    }
}

#[cfg(test)]
mod tests {
    use super::{Matrix, DEFAULT_PIVOT_EPSILON};
    use crate::error::Error;
    use crate::vectors::Vector;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use quickcheck::quickcheck;
    use rstest::rstest;

    #[test]
    fn construction_works() {
        let a = Matrix::from_rows(&[[1., 2., 3.], [4., 5., 6.]]).unwrap();
        assert_eq!(a.shape(), (2, 3));
        assert_eq!(a[(1, 0)], 4.);
        assert_eq!(a.get(0, 2), Some(3.));
        assert_eq!(a.get(2, 0), None);
        assert_eq!(a.row(1), Some(Vector::from([4., 5., 6.])));
        assert_eq!(
            Matrix::from_row_slice(2, 3, &[1., 2., 3., 4., 5., 6.]).unwrap(),
            a
        );
        assert_eq!(Matrix::identity(2), Matrix::from_rows(&[[1., 0.], [0., 1.]]).unwrap());
        assert_eq!(Matrix::zeros(3, 1).shape(), (3, 1));
    }

    #[test]
    fn construction_rejects_bad_shapes() {
        let ragged: [&[f64]; 2] = [&[1., 2.], &[3.]];
        assert!(matches!(
            Matrix::from_rows(&ragged),
            Err(Error::DimensionMismatch {
                operation: "from_rows",
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            Matrix::from_row_slice(2, 2, &[1., 2., 3.]),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn multiply_works() {
        let a = Matrix::from_rows(&[[1., 2., 3.], [4., 5., 6.]]).unwrap();
        let b = Matrix::from_rows(&[[7., 8.], [9., 10.], [11., 12.]]).unwrap();
        assert_eq!(
            a.multiply(&b).unwrap(),
            Matrix::from_rows(&[[58., 64.], [139., 154.]]).unwrap()
        );
        assert_eq!(
            a.multiply(&Matrix::identity(3)).unwrap(),
            a,
        );
    }

    #[test]
    fn multiply_rejects_incompatible_shapes() {
        let a = Matrix::zeros(2, 3);
        assert_eq!(
            a.multiply(&Matrix::zeros(2, 3)),
            Err(Error::DimensionMismatch {
                operation: "multiply",
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn multiply_vector_works() {
        let a = Matrix::from_rows(&[[1., 2., 3.], [4., 5., 6.]]).unwrap();
        assert_eq!(
            a.multiply_vector(&Vector::from([1., 0., -1.])).unwrap(),
            Vector::from([-2., -2.])
        );
        assert!(matches!(
            a.multiply_vector(&Vector::from([1., 0.])),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn transpose_works() {
        let a = Matrix::from_rows(&[[1., 2., 3.], [4., 5., 6.]]).unwrap();
        assert_eq!(
            a.transpose(),
            Matrix::from_rows(&[[1., 4.], [2., 5.], [3., 6.]]).unwrap()
        );
    }

    #[test]
    fn arithmetic_operations_work() {
        let a = Matrix::from_rows(&[[1., 2.], [3., 4.]]).unwrap();
        let b = Matrix::from_rows(&[[4., 3.], [2., 1.]]).unwrap();
        assert_eq!(
            a.checked_add(&b).unwrap(),
            Matrix::from_rows(&[[5., 5.], [5., 5.]]).unwrap()
        );
        assert_eq!(
            a.checked_sub(&b).unwrap(),
            Matrix::from_rows(&[[-3., -1.], [1., 3.]]).unwrap()
        );
        assert_eq!(
            a.clone() * 2.,
            Matrix::from_rows(&[[2., 4.], [6., 8.]]).unwrap()
        );
        assert_eq!(-a.clone(), -1. * a.clone());
        assert!(a.checked_add(&Matrix::zeros(2, 3)).is_err());
    }

    #[rstest]
    // x + y + z = 4, 2x + y + z = 5, 2x + 2y + z = 6
    #[case([[1., 1., 1.], [2., 1., 1.], [2., 2., 1.]], [4., 5., 6.])]
    // same system with its rows out of order
    #[case([[2., 2., 1.], [2., 1., 1.], [1., 1., 1.]], [6., 5., 4.])]
    // zeros on the diagonal force row swaps
    #[case([[0., 1., 1.], [1., 0., 1.], [1., 1., 0.]], [3., 3., 2.])]
    // the first usable pivot is two rows down
    #[case([[0., 1., 1.], [0., 1., 0.], [1., 1., 1.]], [3., 1., 4.])]
    fn solve_works(#[case] a: [[f64; 3]; 3], #[case] b: [f64; 3]) {
        let x = Matrix::from_rows(&a)
            .unwrap()
            .solve(&Vector::from(b))
            .unwrap();
        assert_abs_diff_eq!(x, Vector::from([1., 1., 2.]), epsilon = 1e-9);
    }

    #[rstest]
    #[case(DEFAULT_PIVOT_EPSILON)]
    #[case(0.)]
    #[case(-1.)]
    fn solve_reports_singular_systems(#[case] eps: f64) {
        let a = Matrix::from_rows(&[[1., 2.], [2., 4.]]).unwrap();
        assert!(matches!(
            a.solve_with_epsilon(&Vector::from([1., 2.]), eps),
            Err(Error::Domain(_))
        ));
        assert!(matches!(
            Matrix::zeros(2, 2).solve_with_epsilon(&Vector::from([1., 2.]), eps),
            Err(Error::Domain(_))
        ));
    }

    #[test]
    fn solve_rejects_non_finite_pivots() {
        let a = Matrix::from_rows(&[[f64::NAN, 1.], [1., 1.]]).unwrap();
        assert!(matches!(
            a.solve_with_epsilon(&Vector::from([1., 2.]), 0.),
            Err(Error::Domain(_))
        ));
    }

    #[test]
    fn solve_pivots_on_largest_magnitude() {
        // 2e-9 clears the default pivot threshold but would cost precision as a pivot
        let a = Matrix::from_rows(&[[2e-9, 1.], [1., 1.]]).unwrap();
        let x = a.solve(&Vector::from([1., 2.])).unwrap();
        let x0 = 1. / (1. - 2e-9);
        assert_relative_eq!(x[0], x0, max_relative = 1e-14);
        assert_relative_eq!(x[1], 2. - x0, max_relative = 1e-14);
    }

    #[test]
    fn solve_rejects_bad_shapes() {
        assert!(matches!(
            Matrix::zeros(2, 3).solve(&Vector::zeros(2)),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(matches!(
            Matrix::identity(3).solve(&Vector::zeros(2)),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn matrix_display() {
        let a = Matrix::from_rows(&[[1., 2.], [3., 4.5]]).unwrap();
        insta::assert_snapshot!(a, @"[[1, 2], [3, 4.5]]");
    }

    quickcheck! {
        fn transpose_is_involutive(rows: u8, cols: u8, data: Vec<f64>) -> bool {
            let (rows, cols) = (usize::from(rows % 6), usize::from(cols % 6));
            let data: Vec<f64> = data.into_iter().cycle().take(rows * cols).collect();
            if data.len() != rows * cols {
                // not enough generated data to fill the matrix
                return true;
            }
            let a = Matrix::from_row_slice(rows, cols, &data).unwrap();
            let roundtrip = a.transpose().transpose();
            // bit-level comparison so NaN elements compare equal to themselves
            roundtrip.shape() == a.shape()
                && roundtrip
                    .inner
                    .iter()
                    .zip(a.inner.iter())
                    .all(|(x, y)| x.to_bits() == y.to_bits())
        }
    }
}
