use crate::angles::EulerAngles;
use crate::error::{Error, Result};
use crate::matrices::Matrix;
use crate::quaternions::Quaternion;
use crate::vectors::Vector;
use crate::{DMatrix, Matrix3, Vector3};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::Mul;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 3×3 matrix describing a rotation between two right-handed frames.
///
/// Rotation matrices produced by this crate are orthonormal with determinant 1, but this is not
/// enforced when constructing one from arbitrary elements (see [`RotationMatrix::from_rows`] and
/// [`RotationMatrix::is_orthonormal`]).
///
/// Matrices compose by multiplication: `(b * a).transform(v) == b.transform(a.transform(v))`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RotationMatrix {
    pub(crate) inner: Matrix3,
}

impl Default for RotationMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl RotationMatrix {
    pub(crate) fn from_nalgebra_matrix(inner: Matrix3) -> Self {
        Self { inner }
    }

    /// Constructs a rotation matrix from its rows.
    ///
    /// The elements are taken as-is; no orthonormalization takes place.
    #[must_use]
    pub fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        let [r0, r1, r2] = rows;
        #[rustfmt::skip]
        let m = Matrix3::new(
            r0[0], r0[1], r0[2],
            r1[0], r1[1], r1[2],
            r2[0], r2[1], r2[2],
        );
        Self::from_nalgebra_matrix(m)
    }

    #[must_use]
    pub fn identity() -> Self {
        Self::from_nalgebra_matrix(Matrix3::identity())
    }

    /// See [`EulerAngles::to_rotation_matrix`].
    #[must_use]
    pub fn from_euler_angles(angles: &EulerAngles) -> Self {
        angles.to_rotation_matrix()
    }

    /// See [`EulerAngles::from_rotation_matrix`].
    #[must_use]
    pub fn to_euler_angles(&self) -> EulerAngles {
        EulerAngles::from_rotation_matrix(self)
    }

    /// Returns the element at `(row, col)`, or `None` if it is out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.inner.get((row, col)).copied()
    }

    /// Returns the rows of the matrix.
    #[must_use]
    pub fn to_rows(&self) -> [[f64; 3]; 3] {
        let m = &self.inner;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ]
    }

    /// Returns the transposed matrix, which for a rotation is also its inverse.
    #[must_use]
    #[doc(alias = "inverse")]
    pub fn transpose(&self) -> Self {
        Self::from_nalgebra_matrix(self.inner.transpose())
    }

    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.inner.determinant()
    }

    /// Returns `true` if `M·Mᵀ` is the identity matrix and `det(M)` is 1, both within `eps`.
    #[must_use]
    pub fn is_orthonormal(&self, eps: f64) -> bool {
        let product = self.inner * self.inner.transpose();
        (product - Matrix3::identity()).iter().all(|e| e.abs() <= eps)
            && (self.determinant() - 1.).abs() <= eps
    }

    /// Extracts the unit quaternion that produces this matrix.
    ///
    /// Uses the trace method, branching on the largest of {trace, M00, M11, M22} to keep the
    /// divisor well away from zero. The result is normalized, so a matrix that is only nearly
    /// orthonormal still yields a valid unit quaternion.
    #[must_use]
    #[doc(alias = "matrix_to_quaternion")]
    pub fn to_quaternion(&self) -> Quaternion {
        let m = &self.inner;
        let trace = m[(0, 0)] + m[(1, 1)] + m[(2, 2)];

        let (x, y, z, w) = if trace > m[(0, 0)] && trace > m[(1, 1)] && trace > m[(2, 2)] {
            let s = (trace + 1.).sqrt() * 2.;
            (
                (m[(2, 1)] - m[(1, 2)]) / s,
                (m[(0, 2)] - m[(2, 0)]) / s,
                (m[(1, 0)] - m[(0, 1)]) / s,
                0.25 * s,
            )
        } else if m[(0, 0)] > m[(1, 1)] && m[(0, 0)] > m[(2, 2)] {
            let s = (1. + m[(0, 0)] - m[(1, 1)] - m[(2, 2)]).sqrt() * 2.;
            (
                0.25 * s,
                (m[(0, 1)] + m[(1, 0)]) / s,
                (m[(0, 2)] + m[(2, 0)]) / s,
                (m[(2, 1)] - m[(1, 2)]) / s,
            )
        } else if m[(1, 1)] > m[(2, 2)] {
            let s = (1. + m[(1, 1)] - m[(0, 0)] - m[(2, 2)]).sqrt() * 2.;
            (
                (m[(0, 1)] + m[(1, 0)]) / s,
                0.25 * s,
                (m[(1, 2)] + m[(2, 1)]) / s,
                (m[(0, 2)] - m[(2, 0)]) / s,
            )
        } else {
            let s = (1. + m[(2, 2)] - m[(0, 0)] - m[(1, 1)]).sqrt() * 2.;
            (
                (m[(0, 2)] + m[(2, 0)]) / s,
                (m[(1, 2)] + m[(2, 1)]) / s,
                0.25 * s,
                (m[(1, 0)] - m[(0, 1)]) / s,
            )
        };

        Quaternion::from_normalizable(nalgebra::Quaternion::new(w, x, y, z))
    }

    /// Multiplies the 3-vector `v` by this matrix.
    ///
    /// Fails with [`Error::DimensionMismatch`] unless `v` has exactly three components.
    pub fn transform(&self, v: &Vector) -> Result<Vector> {
        let v = vector3(v, "transform")?;
        let out = self.inner * v;
        Ok(Vector::from([out.x, out.y, out.z]))
    }
}

pub(crate) fn vector3(v: &Vector, operation: &'static str) -> Result<Vector3> {
    match *v.as_slice() {
        [x, y, z] => Ok(Vector3::new(x, y, z)),
        _ => Err(Error::dimension_mismatch(operation, 3, v.len())),
    }
}

impl Mul for RotationMatrix {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::from_nalgebra_matrix(self.inner * rhs.inner)
    }
}

impl TryFrom<&Matrix> for RotationMatrix {
    type Error = Error;

    fn try_from(matrix: &Matrix) -> Result<Self> {
        if matrix.nrows() != 3 {
            return Err(Error::dimension_mismatch(
                "rotation matrix",
                3,
                matrix.nrows(),
            ));
        }
        if matrix.ncols() != 3 {
            return Err(Error::dimension_mismatch(
                "rotation matrix",
                3,
                matrix.ncols(),
            ));
        }
        Ok(Self::from_nalgebra_matrix(
            matrix.inner.fixed_view::<3, 3>(0, 0).into_owned(),
        ))
    }
}

impl From<RotationMatrix> for Matrix {
    fn from(rotation: RotationMatrix) -> Self {
        Matrix::from_nalgebra_matrix(DMatrix::from_iterator(
            3,
            3,
            rotation.inner.iter().copied(),
        ))
    }
}

impl Display for RotationMatrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let [r0, r1, r2] = self.to_rows();
        write!(
            f,
            "[[{:.6}, {:.6}, {:.6}], [{:.6}, {:.6}, {:.6}], [{:.6}, {:.6}, {:.6}]]",
            r0[0], r0[1], r0[2], r1[0], r1[1], r1[2], r2[0], r2[1], r2[2]
        )
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for RotationMatrix {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.inner.abs_diff_eq(&other.inner, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for RotationMatrix {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.inner.relative_eq(&other.inner, epsilon, max_relative)
    }
}

#[cfg(test)]
mod tests {
    use super::RotationMatrix;
    use crate::angles::EulerAngles;
    use crate::error::Error;
    use crate::matrices::Matrix;
    use crate::vectors::Vector;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use quickcheck::quickcheck;
    use rstest::rstest;
    use uom::si::angle::degree;
    use uom::si::f64::Angle;

    fn d(degrees: f64) -> Angle {
        Angle::new::<degree>(degrees)
    }

    fn e(roll: f64, pitch: f64, yaw: f64) -> EulerAngles {
        EulerAngles::new(d(roll), d(pitch), d(yaw))
    }

    #[test]
    fn identity_is_orthonormal() {
        let identity = RotationMatrix::identity();
        assert!(identity.is_orthonormal(1e-12));
        assert_eq!(identity.determinant(), 1.);
        assert_eq!(identity.transpose(), identity);
    }

    #[test]
    fn non_rotations_are_not_orthonormal() {
        let scaled = RotationMatrix::from_rows([[2., 0., 0.], [0., 1., 0.], [0., 0., 1.]]);
        assert!(!scaled.is_orthonormal(1e-6));
        let reflection = RotationMatrix::from_rows([[-1., 0., 0.], [0., 1., 0.], [0., 0., 1.]]);
        assert!(!reflection.is_orthonormal(1e-6));
    }

    #[test]
    fn transpose_inverts() {
        let m = e(10., 20., 30.).to_rotation_matrix();
        assert_abs_diff_eq!(m * m.transpose(), RotationMatrix::identity(), epsilon = 1e-12);
    }

    #[test]
    fn transform_works() {
        // yaw of 90°: the reference frame's X axis is the body frame's -Y axis
        let m = e(0., 0., 90.).to_rotation_matrix();
        assert_abs_diff_eq!(
            m.transform(&Vector::from([1., 0., 0.])).unwrap(),
            Vector::from([0., -1., 0.]),
            epsilon = 1e-12
        );
        assert!(matches!(
            m.transform(&Vector::from([1., 0.])),
            Err(Error::DimensionMismatch {
                operation: "transform",
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn composition_applies_right_operand_first() {
        let a = e(10., 0., 0.).to_rotation_matrix();
        let b = e(0., 0., 40.).to_rotation_matrix();
        let v = Vector::from([1., 2., 3.]);
        assert_abs_diff_eq!(
            (b * a).transform(&v).unwrap(),
            b.transform(&a.transform(&v).unwrap()).unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn general_matrix_conversion() {
        let m = e(30., 45., 60.).to_rotation_matrix();
        let general = Matrix::from(m);
        assert_eq!(general.shape(), (3, 3));
        assert_eq!(general[(0, 2)], m.get(0, 2).unwrap());
        assert_eq!(general[(2, 0)], m.get(2, 0).unwrap());
        assert_eq!(RotationMatrix::try_from(&general).unwrap(), m);
    }

    #[rstest]
    #[case(Matrix::zeros(2, 3))]
    #[case(Matrix::zeros(3, 4))]
    #[case(Matrix::identity(4))]
    fn non_3x3_matrices_are_rejected(#[case] m: Matrix) {
        assert!(matches!(
            RotationMatrix::try_from(&m),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn euler_30_45_60_to_quaternion() {
        let q = e(30., 45., 60.).to_rotation_matrix().to_quaternion();
        // sign is not canonicalized, so compare against both representations
        let expected = [
            -0.022_260_026_714_733_816,
            -0.439_679_739_540_909_5,
            -0.360_423_405_650_355_97,
            0.822_363_171_905_999_4,
        ];
        let sign = q.w().signum();
        assert_relative_eq!(q.x() * sign, expected[0], epsilon = 1e-6);
        assert_relative_eq!(q.y() * sign, expected[1], epsilon = 1e-6);
        assert_relative_eq!(q.z() * sign, expected[2], epsilon = 1e-6);
        assert_relative_eq!(q.w() * sign, expected[3], epsilon = 1e-6);
    }

    #[rstest]
    // each case exercises a different branch of the trace method
    #[case(e(10., 20., 30.))]
    #[case(e(170., 0., 0.))]
    #[case(e(0., 170., 0.))]
    #[case(e(0., 0., 170.))]
    #[case(e(180., 0., 0.))]
    #[case(e(0., 0., 180.))]
    fn matrix_quaternion_roundtrip(#[case] angles: EulerAngles) {
        let m = angles.to_rotation_matrix();
        let roundtrip = m.to_quaternion().to_rotation_matrix();
        assert!(roundtrip.is_orthonormal(1e-12));
        assert_abs_diff_eq!(roundtrip, m, epsilon = 1e-12);
    }

    #[test]
    fn rotation_matrix_display() {
        insta::assert_snapshot!(
            RotationMatrix::from_rows([[0., 1., 0.], [-1., 0., 0.], [0., 0., 1.]]),
            @"[[0.000000, 1.000000, 0.000000], [-1.000000, 0.000000, 0.000000], [0.000000, 0.000000, 1.000000]]"
        );
    }

    quickcheck! {
        fn euler_quaternion_matrix_roundtrip(roll: i16, pitch: i16, yaw: i16) -> bool {
            // any triple in [-180°, 180°]
            let angles = e(
                f64::from(roll % 181),
                f64::from(pitch % 181),
                f64::from(yaw % 181),
            );
            let m = angles.to_rotation_matrix();
            let roundtrip = m.to_quaternion().to_rotation_matrix();
            roundtrip.is_orthonormal(1e-9) && approx::abs_diff_eq!(roundtrip, m, epsilon = 1e-9)
        }
    }
}
