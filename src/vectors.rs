use crate::error::{Error, Result};
use crate::DVector;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::{Div, Index, Mul, Neg};

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An ordered sequence of real components of any length.
///
/// `Vector` is an immutable value type: every operation produces a new vector. The number of
/// components is fixed at construction, and operations between two vectors (such as
/// [`Vector::dot`]) fail with [`Error::DimensionMismatch`] when the lengths differ rather than
/// panicking.
///
/// ```rust
/// use mcgeo::Vector;
///
/// let a = Vector::from([1., 0., 0.]);
/// let b = Vector::from([0., 1., 0.]);
/// assert_eq!(a.cross(&b).unwrap(), Vector::from([0., 0., 1.]));
/// assert_eq!(a.dot(&b).unwrap(), 0.);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Vector {
    pub(crate) inner: DVector,
}

impl Vector {
    pub(crate) fn from_nalgebra_vector(inner: DVector) -> Self {
        Self { inner }
    }

    /// Constructs a vector from the given components.
    #[must_use]
    pub fn from_slice(components: &[f64]) -> Self {
        Self::from_nalgebra_vector(DVector::from_column_slice(components))
    }

    /// Constructs a vector of `len` components that are all 0.
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self::from_nalgebra_vector(DVector::zeros(len))
    }

    /// Returns the number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the vector has no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the component at `index`, or `None` if it is out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.inner.get(index).copied()
    }

    /// Returns the components as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        self.inner.as_slice()
    }

    /// Returns the components as a `Vec`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.inner.as_slice().to_vec()
    }

    /// Computes the Euclidean (L2) norm.
    ///
    /// Fails with [`Error::Domain`] for a vector without components.
    #[doc(alias = "length")]
    #[doc(alias = "magnitude")]
    pub fn norm(&self) -> Result<f64> {
        if self.is_empty() {
            return Err(Error::domain("the norm of an empty vector is undefined"));
        }
        Ok(self.inner.norm())
    }

    /// Returns a unit vector with the same direction as this vector.
    ///
    /// Fails with [`Error::Domain`] when the norm is zero, as the direction is then undefined.
    #[doc(alias = "normalized")]
    pub fn normalize(&self) -> Result<Self> {
        let norm = self.norm()?;
        if norm == 0. {
            return Err(Error::domain("cannot normalize a zero-length vector"));
        }
        Ok(Self::from_nalgebra_vector(&self.inner / norm))
    }

    /// Computes the dot (scalar) product between this vector and another.
    ///
    /// Fails with [`Error::DimensionMismatch`] unless both vectors have the same length.
    pub fn dot(&self, rhs: &Self) -> Result<f64> {
        self.require_same_len("dot", rhs)?;
        Ok(self.inner.dot(&rhs.inner))
    }

    /// Computes the cross product `self × rhs`.
    ///
    /// The cross product is only defined for 3-vectors; any other length fails with
    /// [`Error::DimensionMismatch`].
    pub fn cross(&self, rhs: &Self) -> Result<Self> {
        if self.len() != 3 {
            return Err(Error::dimension_mismatch("cross", 3, self.len()));
        }
        if rhs.len() != 3 {
            return Err(Error::dimension_mismatch("cross", 3, rhs.len()));
        }
        let (a, b) = (&self.inner, &rhs.inner);
        Ok(Self::from([
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]))
    }

    /// Adds two vectors component-wise.
    pub fn checked_add(&self, rhs: &Self) -> Result<Self> {
        self.require_same_len("add", rhs)?;
        Ok(Self::from_nalgebra_vector(&self.inner + &rhs.inner))
    }

    /// Subtracts `rhs` from this vector component-wise.
    pub fn checked_sub(&self, rhs: &Self) -> Result<Self> {
        self.require_same_len("sub", rhs)?;
        Ok(Self::from_nalgebra_vector(&self.inner - &rhs.inner))
    }

    /// Linearly interpolate between this vector and another vector.
    ///
    /// Specifically, returns `self * (1.0 - t) + rhs * t`. The value for `t` is not restricted
    /// to the range [0, 1].
    pub fn lerp(&self, rhs: &Self, t: f64) -> Result<Self> {
        self.require_same_len("lerp", rhs)?;
        Ok(Self::from_nalgebra_vector(self.inner.lerp(&rhs.inner, t)))
    }

    fn require_same_len(&self, operation: &'static str, rhs: &Self) -> Result<()> {
        if self.len() == rhs.len() {
            Ok(())
        } else {
            Err(Error::dimension_mismatch(operation, self.len(), rhs.len()))
        }
    }
}

impl<const N: usize> From<[f64; N]> for Vector {
    fn from(components: [f64; N]) -> Self {
        Self::from_slice(&components)
    }
}

impl From<Vec<f64>> for Vector {
    fn from(components: Vec<f64>) -> Self {
        Self::from_nalgebra_vector(DVector::from_vec(components))
    }
}

impl From<&[f64]> for Vector {
    fn from(components: &[f64]) -> Self {
        Self::from_slice(components)
    }
}

impl Index<usize> for Vector {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.inner[index]
    }
}

impl Neg for Vector {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::from_nalgebra_vector(-self.inner)
    }
}

impl Mul<f64> for Vector {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::from_nalgebra_vector(self.inner * scalar)
    }
}

impl Mul<Vector> for f64 {
    type Output = Vector;

    fn mul(self, vector: Vector) -> Self::Output {
        vector * self
    }
}

impl Div<f64> for Vector {
    type Output = Self;

    fn div(self, scalar: f64) -> Self::Output {
        Self::from_nalgebra_vector(self.inner / scalar)
    }
}

impl Display for Vector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, component) in self.inner.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{component}")?;
        }
        write!(f, "]")
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for Vector {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        // nalgebra zips the components, so unequal lengths must be caught here
        self.len() == other.len() && self.inner.abs_diff_eq(&other.inner, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for Vector {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.len() == other.len() && self.inner.relative_eq(&other.inner, epsilon, max_relative)
    }
}

#[cfg(test)]
mod tests {
    use super::Vector;
    use crate::error::Error;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use quickcheck::{quickcheck, TestResult};
    use rstest::rstest;

    #[test]
    fn construction_works() {
        let v = Vector::from([1., 2., 3.]);
        assert_eq!(v.len(), 3);
        assert_eq!(v[0], 1.);
        assert_eq!(v.get(2), Some(3.));
        assert_eq!(v.get(3), None);
        assert_eq!(Vector::from(vec![1., 2., 3.]), v);
        assert_eq!(Vector::from(&[1., 2., 3.][..]), v);
        assert_eq!(Vector::zeros(6).to_vec(), vec![0.; 6]);
        assert!(Vector::zeros(0).is_empty());
    }

    #[rstest]
    #[case(&[3., 4.], 5.)]
    #[case(&[1., 2., 2.], 3.)]
    #[case(&[1., 1., 1., 1.], 2.)]
    #[case(&[0., 0., 0.], 0.)]
    #[case(&[1., 2., 3., 4., 5., 6.], 91_f64.sqrt())]
    fn norm_works(#[case] components: &[f64], #[case] expected: f64) {
        assert_relative_eq!(Vector::from(components).norm().unwrap(), expected);
    }

    #[test]
    fn norm_of_empty_vector_is_a_domain_error() {
        assert!(matches!(Vector::zeros(0).norm(), Err(Error::Domain(_))));
    }

    #[test]
    fn normalize_works() {
        let v = Vector::from([3., 0., 4.]).normalize().unwrap();
        assert_relative_eq!(v, Vector::from([0.6, 0., 0.8]));
        assert_relative_eq!(v.norm().unwrap(), 1.);
    }

    #[test]
    fn normalize_zero_vector_is_a_domain_error() {
        assert!(matches!(
            Vector::zeros(3).normalize(),
            Err(Error::Domain(_))
        ));
    }

    #[test]
    fn dot_works() {
        let a = Vector::from([1., 2., 3.]);
        let b = Vector::from([4., 5., 6.]);
        assert_eq!(a.dot(&b).unwrap(), 32.);
    }

    #[test]
    fn dot_rejects_unequal_lengths() {
        let a = Vector::from([1., 2., 3.]);
        let b = Vector::from([1., 2., 3., 4.]);
        assert_eq!(
            a.dot(&b),
            Err(Error::DimensionMismatch {
                operation: "dot",
                expected: 3,
                found: 4
            })
        );
    }

    #[rstest]
    #[case([1., 0., 0.], [0., 1., 0.], [0., 0., 1.])]
    #[case([0., 1., 0.], [0., 0., 1.], [1., 0., 0.])]
    #[case([0., 0., 1.], [1., 0., 0.], [0., 1., 0.])]
    #[case([1., 2., 3.], [4., 5., 6.], [-3., 6., -3.])]
    fn cross_works(#[case] a: [f64; 3], #[case] b: [f64; 3], #[case] expected: [f64; 3]) {
        let result = Vector::from(a).cross(&Vector::from(b)).unwrap();
        assert_eq!(result, Vector::from(expected));
    }

    #[rstest]
    #[case(Vector::zeros(2), Vector::zeros(3))]
    #[case(Vector::zeros(3), Vector::zeros(4))]
    #[case(Vector::zeros(4), Vector::zeros(4))]
    fn cross_rejects_non_3_vectors(#[case] a: Vector, #[case] b: Vector) {
        assert!(matches!(
            a.cross(&b),
            Err(Error::DimensionMismatch {
                operation: "cross",
                ..
            })
        ));
    }

    #[test]
    fn arithmetic_operations_work() {
        let v1 = Vector::from([1., 2., 3.]);
        let v2 = Vector::from([4., 5., 6.]);

        assert_eq!(v1.checked_add(&v2).unwrap(), Vector::from([5., 7., 9.]));
        assert_eq!(v2.checked_sub(&v1).unwrap(), Vector::from([3., 3., 3.]));
        assert_eq!(-v1.clone(), Vector::from([-1., -2., -3.]));
        assert_eq!(v1.clone() * 2., Vector::from([2., 4., 6.]));
        assert_eq!(2. * v1.clone(), Vector::from([2., 4., 6.]));
        assert_eq!(v2 / 2., Vector::from([2., 2.5, 3.]));
        assert!(v1.checked_add(&Vector::zeros(2)).is_err());
    }

    #[test]
    fn lerp_works() {
        let v1 = Vector::from([0., 0., 0., 0.]);
        let v2 = Vector::from([10., 20., 30., 40.]);
        assert_abs_diff_eq!(
            v1.lerp(&v2, 0.25).unwrap(),
            Vector::from([2.5, 5., 7.5, 10.])
        );
    }

    #[test]
    fn approx_comparison_requires_equal_lengths() {
        assert!(!approx::abs_diff_eq!(Vector::zeros(2), Vector::zeros(3)));
    }

    #[test]
    fn vector_display() {
        insta::assert_snapshot!(Vector::from([1., -2.5, 3.]), @"[1, -2.5, 3]");
    }

    fn finite(v: f64) -> f64 {
        if v.is_finite() {
            v % 1e6
        } else {
            0.
        }
    }

    quickcheck! {
        fn cross_is_anticommutative(a: (f64, f64, f64), b: (f64, f64, f64)) -> TestResult {
            let a = Vector::from([finite(a.0), finite(a.1), finite(a.2)]);
            let b = Vector::from([finite(b.0), finite(b.1), finite(b.2)]);
            let ab = a.cross(&b).unwrap();
            let ba = b.cross(&a).unwrap();
            TestResult::from_bool(ab == -ba)
        }

        fn dot_is_commutative(a: Vec<f64>, b: Vec<f64>) -> TestResult {
            let len = a.len().min(b.len());
            let a: Vec<f64> = a.into_iter().take(len).map(finite).collect();
            let b: Vec<f64> = b.into_iter().take(len).map(finite).collect();
            let (a, b) = (Vector::from(a), Vector::from(b));
            TestResult::from_bool(a.dot(&b).unwrap() == b.dot(&a).unwrap())
        }
    }
}
