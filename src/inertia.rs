//! Rigid-body inertia: inertia tensors and the first-order lag used to smooth control inputs.

use crate::error::{Error, Result};
use crate::matrices::Matrix;
use crate::{DMatrix, Matrix3, Vector3};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::Add;
use uom::si::f64::{Length, Mass, MomentOfInertia, Time};
use uom::si::{
    length::meter, mass::kilogram, moment_of_inertia::kilogram_square_meter, time::second,
};

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The inertia tensor of a rigid body about some reference point, in kg·m².
///
/// Off-diagonal elements are the products of inertia with their sign included, so that the
/// angular momentum is `L = I·ω`.
///
/// ```rust
/// use mcgeo::InertiaTensor;
/// use uom::si::f64::{Length, Mass};
/// use uom::si::{length::meter, mass::kilogram, moment_of_inertia::kilogram_square_meter};
///
/// let ball = InertiaTensor::solid_sphere(Mass::new::<kilogram>(5.), Length::new::<meter>(0.1));
/// assert!((ball.xx().get::<kilogram_square_meter>() - 0.02).abs() < 1e-12);
///
/// // the same ball, about a point on its surface
/// let touching = ball.parallel_axis(
///     Mass::new::<kilogram>(5.),
///     [Length::new::<meter>(0.), Length::new::<meter>(0.), Length::new::<meter>(0.1)],
/// );
/// assert!((touching.xx().get::<kilogram_square_meter>() - 0.07).abs() < 1e-12);
/// assert!((touching.zz().get::<kilogram_square_meter>() - 0.02).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct InertiaTensor {
    inner: Matrix3,
}

impl Default for InertiaTensor {
    fn default() -> Self {
        Self::zero()
    }
}

impl InertiaTensor {
    fn from_nalgebra_matrix(inner: Matrix3) -> Self {
        Self { inner }
    }

    /// Constructs a tensor from its rows, given in kg·m².
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

    /// A tensor with the given principal moments and no products of inertia.
    #[must_use]
    pub fn diagonal(
        ixx: impl Into<MomentOfInertia>,
        iyy: impl Into<MomentOfInertia>,
        izz: impl Into<MomentOfInertia>,
    ) -> Self {
        Self::from_nalgebra_matrix(Matrix3::from_diagonal(&Vector3::new(
            ixx.into().get::<kilogram_square_meter>(),
            iyy.into().get::<kilogram_square_meter>(),
            izz.into().get::<kilogram_square_meter>(),
        )))
    }

    #[must_use]
    pub fn zero() -> Self {
        Self::from_nalgebra_matrix(Matrix3::zeros())
    }

    /// The tensor of a homogeneous solid sphere about its center: `2/5 · m · r²` on the diagonal.
    #[must_use]
    pub fn solid_sphere(mass: impl Into<Mass>, radius: impl Into<Length>) -> Self {
        let m = mass.into().get::<kilogram>();
        let r = radius.into().get::<meter>();
        let i = 0.4 * m * r * r;
        Self::from_nalgebra_matrix(Matrix3::from_diagonal_element(i))
    }

    /// Moves the reference point of a tensor taken about the center of mass.
    ///
    /// `offset` is the position of the center of mass relative to the new reference point.
    /// Applies the parallel axis theorem, `I' = I + m·(|r|²·E − r·rᵀ)`.
    #[must_use]
    #[doc(alias = "parallel_axis_inertia")]
    pub fn parallel_axis(&self, mass: impl Into<Mass>, offset: [Length; 3]) -> Self {
        let m = mass.into().get::<kilogram>();
        let [x, y, z] = offset.map(|l| l.get::<meter>());
        let r = Vector3::new(x, y, z);
        let shift = Matrix3::from_diagonal_element(r.norm_squared()) - r * r.transpose();
        Self::from_nalgebra_matrix(self.inner + shift * m)
    }

    /// Returns the element at `(row, col)`, or `None` if it is out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<MomentOfInertia> {
        self.inner
            .get((row, col))
            .map(|&i| MomentOfInertia::new::<kilogram_square_meter>(i))
    }

    /// Returns the rows of the tensor, in kg·m².
    #[must_use]
    pub fn to_rows(&self) -> [[f64; 3]; 3] {
        let m = &self.inner;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ]
    }

    fn at(&self, row: usize, col: usize) -> MomentOfInertia {
        MomentOfInertia::new::<kilogram_square_meter>(self.inner[(row, col)])
    }

    #[must_use]
    pub fn xx(&self) -> MomentOfInertia {
        self.at(0, 0)
    }

    #[must_use]
    pub fn yy(&self) -> MomentOfInertia {
        self.at(1, 1)
    }

    #[must_use]
    pub fn zz(&self) -> MomentOfInertia {
        self.at(2, 2)
    }

    #[must_use]
    pub fn xy(&self) -> MomentOfInertia {
        self.at(0, 1)
    }

    #[must_use]
    pub fn xz(&self) -> MomentOfInertia {
        self.at(0, 2)
    }

    #[must_use]
    pub fn yz(&self) -> MomentOfInertia {
        self.at(1, 2)
    }

    /// Returns `true` if the tensor equals its transpose within `eps` kg·m².
    #[must_use]
    pub fn is_symmetric(&self, eps: f64) -> bool {
        (self.inner - self.inner.transpose())
            .iter()
            .all(|e| e.abs() <= eps)
    }
}

/// Tensors of bodies taken about the same reference point add up to the tensor of the
/// combined body.
impl Add for InertiaTensor {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::from_nalgebra_matrix(self.inner + rhs.inner)
    }
}

impl TryFrom<&Matrix> for InertiaTensor {
    type Error = Error;

    fn try_from(matrix: &Matrix) -> Result<Self> {
        if matrix.nrows() != 3 {
            return Err(Error::dimension_mismatch(
                "inertia tensor",
                3,
                matrix.nrows(),
            ));
        }
        if matrix.ncols() != 3 {
            return Err(Error::dimension_mismatch(
                "inertia tensor",
                3,
                matrix.ncols(),
            ));
        }
        Ok(Self::from_nalgebra_matrix(
            matrix.inner.fixed_view::<3, 3>(0, 0).into_owned(),
        ))
    }
}

impl From<InertiaTensor> for Matrix {
    fn from(tensor: InertiaTensor) -> Self {
        Matrix::from_nalgebra_matrix(DMatrix::from_iterator(3, 3, tensor.inner.iter().copied()))
    }
}

impl Display for InertiaTensor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let [r0, r1, r2] = self.to_rows();
        write!(
            f,
            "[[{:.6}, {:.6}, {:.6}], [{:.6}, {:.6}, {:.6}], [{:.6}, {:.6}, {:.6}]] kg·m²",
            r0[0], r0[1], r0[2], r1[0], r1[1], r1[2], r2[0], r2[1], r2[2]
        )
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for InertiaTensor {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.inner.abs_diff_eq(&other.inner, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for InertiaTensor {
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

/// Advances a first-order lag `τ·ẏ + y = u` by one step of length `dt`, holding the input `u`
/// constant over the step.
///
/// The update `y + (1 − e^(−dt/τ))·(u − y)` is the exact solution for a constant input, so the
/// result does not depend on how a time span is split into steps. With a time constant of zero
/// (or less) there is no lag and `u` is returned.
#[must_use]
#[doc(alias = "first_order_inertia")]
pub fn first_order_lag(
    u: f64,
    y: f64,
    dt: impl Into<Time>,
    time_constant: impl Into<Time>,
) -> f64 {
    let tc = time_constant.into().get::<second>();
    if tc > 0. {
        y + (1. - (-dt.into().get::<second>() / tc).exp()) * (u - y)
    } else {
        u
    }
}

#[cfg(test)]
mod tests {
    use super::{first_order_lag, InertiaTensor};
    use crate::error::Error;
    use crate::matrices::Matrix;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use rstest::rstest;
    use uom::si::f64::{Length, Mass, MomentOfInertia, Time};
    use uom::si::{
        length::meter, mass::kilogram, moment_of_inertia::kilogram_square_meter, time::second,
    };

    fn kg(kilograms: f64) -> Mass {
        Mass::new::<kilogram>(kilograms)
    }
    fn m(meters: f64) -> Length {
        Length::new::<meter>(meters)
    }
    fn s(seconds: f64) -> Time {
        Time::new::<second>(seconds)
    }
    fn kgm2(i: MomentOfInertia) -> f64 {
        i.get::<kilogram_square_meter>()
    }

    #[rstest]
    #[case(1., 1., 0.4)]
    #[case(2., 3., 7.2)]
    #[case(5., 0.1, 0.02)]
    #[case(0., 1., 0.)]
    fn solid_sphere_tensor(#[case] mass: f64, #[case] radius: f64, #[case] expected: f64) {
        let i = InertiaTensor::solid_sphere(kg(mass), m(radius));
        assert_relative_eq!(kgm2(i.xx()), expected, max_relative = 1e-12);
        assert_relative_eq!(kgm2(i.yy()), expected, max_relative = 1e-12);
        assert_relative_eq!(kgm2(i.zz()), expected, max_relative = 1e-12);
        assert_eq!(kgm2(i.xy()), 0.);
        assert_eq!(kgm2(i.xz()), 0.);
        assert_eq!(kgm2(i.yz()), 0.);
        assert!(i.is_symmetric(0.));
    }

    #[test]
    fn parallel_axis_by_hand() {
        let base = InertiaTensor::diagonal(
            MomentOfInertia::new::<kilogram_square_meter>(1.),
            MomentOfInertia::new::<kilogram_square_meter>(2.),
            MomentOfInertia::new::<kilogram_square_meter>(3.),
        );
        let shifted = base.parallel_axis(kg(2.), [m(1.), m(2.), m(3.)]);
        assert_abs_diff_eq!(
            shifted,
            InertiaTensor::from_rows([
                [1. + 2. * (4. + 9.), -2. * 2., -2. * 3.],
                [-2. * 2., 2. + 2. * (1. + 9.), -2. * 6.],
                [-2. * 3., -2. * 6., 3. + 2. * (1. + 4.)],
            ]),
            epsilon = 1e-12
        );
        assert!(shifted.is_symmetric(1e-12));
    }

    #[rstest]
    // a sphere about a point on its surface: 7/5 m r² across the offset, unchanged along it
    #[case([0., 0., 1.], [1.4, 1.4, 0.4])]
    #[case([1., 0., 0.], [0.4, 1.4, 1.4])]
    #[case([0., 0., 0.], [0.4, 0.4, 0.4])]
    fn parallel_axis_of_sphere(#[case] offset: [f64; 3], #[case] expected: [f64; 3]) {
        let shifted =
            InertiaTensor::solid_sphere(kg(1.), m(1.)).parallel_axis(kg(1.), offset.map(m));
        assert_abs_diff_eq!(kgm2(shifted.xx()), expected[0], epsilon = 1e-12);
        assert_abs_diff_eq!(kgm2(shifted.yy()), expected[1], epsilon = 1e-12);
        assert_abs_diff_eq!(kgm2(shifted.zz()), expected[2], epsilon = 1e-12);
        assert_abs_diff_eq!(kgm2(shifted.xy()), 0., epsilon = 1e-12);
    }

    #[test]
    fn parallel_axis_is_independent_of_offset_sign() {
        let base = InertiaTensor::solid_sphere(kg(3.), m(0.5));
        assert_abs_diff_eq!(
            base.parallel_axis(kg(3.), [m(1.), m(-2.), m(0.5)]),
            base.parallel_axis(kg(3.), [m(-1.), m(2.), m(-0.5)]),
            epsilon = 1e-12
        );
    }

    #[test]
    fn tensors_add_up() {
        let a = InertiaTensor::solid_sphere(kg(1.), m(1.));
        let b = InertiaTensor::solid_sphere(kg(2.), m(1.));
        assert_abs_diff_eq!(a + b, InertiaTensor::solid_sphere(kg(3.), m(1.)), epsilon = 1e-12);
        assert_eq!(a + InertiaTensor::default(), a);
    }

    #[test]
    fn matrix_conversions() {
        let tensor = InertiaTensor::from_rows([[1., -2., -3.], [-2., 4., -5.], [-3., -5., 6.]]);
        let matrix = Matrix::from(tensor);
        assert_eq!(matrix.get(1, 2), Some(-5.));
        assert_eq!(InertiaTensor::try_from(&matrix).unwrap(), tensor);
        assert_eq!(tensor.get(2, 0).map(kgm2), Some(-3.));
        assert_eq!(tensor.get(3, 0), None);
        assert!(matches!(
            InertiaTensor::try_from(&Matrix::identity(2)),
            Err(Error::DimensionMismatch {
                operation: "inertia tensor",
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn tensor_display() {
        insta::assert_snapshot!(
            InertiaTensor::solid_sphere(kg(1.), m(1.)),
            @"[[0.400000, 0.000000, 0.000000], [0.000000, 0.400000, 0.000000], [0.000000, 0.000000, 0.400000]] kg·m²"
        );
    }

    #[test]
    fn lag_without_time_constant_follows_input() {
        let mut y = 0.;
        for i in 0..100 {
            let u = if i < 10 { 0. } else { 1. };
            y = first_order_lag(u, y, s(0.01), s(0.));
            assert_eq!(y, u);
        }
    }

    #[rstest]
    #[case(1)]
    #[case(10)]
    #[case(1000)]
    fn lag_step_response(#[case] steps: u32) {
        // a unit step held for one time constant reaches 1 - 1/e however it is stepped
        let tc = 2.;
        let dt = tc / f64::from(steps);
        let mut y = 0.;
        for _ in 0..steps {
            y = first_order_lag(1., y, s(dt), s(tc));
        }
        assert_abs_diff_eq!(y, 1. - (-1_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn lag_settles_on_input() {
        let mut y = 5.;
        for _ in 0..1000 {
            y = first_order_lag(-1., y, s(0.1), s(2.));
        }
        assert_abs_diff_eq!(y, -1., epsilon = 1e-12);
    }
}
