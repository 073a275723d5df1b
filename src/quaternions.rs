use crate::angles::EulerAngles;
use crate::error::{Error, Result};
use crate::rotations::{vector3, RotationMatrix};
use crate::vectors::Vector;
use crate::{UnitQuaternion, Vector3};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::Mul;
use uom::si::angle::radian;
use uom::si::angular_velocity::radian_per_second;
use uom::si::f64::{Angle, AngularVelocity};

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A unit quaternion representing a rotation.
///
/// Components are exposed scalar-last, as `(x, y, z, w)`. The quaternion is normalized on
/// construction; its sign is left as computed, so `q` and `-q` (which describe the same rotation)
/// may both be produced by different constructors. The [`approx`] implementations treat the two
/// as equal.
///
/// [`Quaternion::to_rotation_matrix`] yields the matrix that rotates vectors by this quaternion,
/// and products compose like rotation matrices do: `q2 * q1` applies `q1` first.
///
/// ```rust
/// use mcgeo::{Quaternion, Vector};
///
/// let q = Quaternion::from_rotation_vector(&Vector::from([std::f64::consts::FRAC_PI_4, 0., 0.]))
///     .unwrap();
/// let half = std::f64::consts::PI / 8.;
/// assert!((q.x() - half.sin()).abs() < 1e-12);
/// assert!((q.w() - half.cos()).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Quaternion {
    pub(crate) inner: UnitQuaternion,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    pub(crate) fn from_nalgebra_quaternion(inner: UnitQuaternion) -> Self {
        Self { inner }
    }

    /// Normalizes a quaternion whose norm is known to be non-zero.
    pub(crate) fn from_normalizable(q: nalgebra::Quaternion<f64>) -> Self {
        Self::from_nalgebra_quaternion(UnitQuaternion::new_normalize(q))
    }

    /// The quaternion of no rotation, `(0, 0, 0, 1)`.
    #[must_use]
    pub fn identity() -> Self {
        Self::from_nalgebra_quaternion(UnitQuaternion::identity())
    }

    /// Constructs a quaternion from scalar-last components, normalizing them.
    ///
    /// Fails with [`Error::Domain`] if all components are zero (or the norm is not finite), as
    /// such a quaternion has no direction to normalize to.
    pub fn from_components(x: f64, y: f64, z: f64, w: f64) -> Result<Self> {
        let q = nalgebra::Quaternion::new(w, x, y, z);
        if !q.norm().is_finite() {
            return Err(Error::domain("quaternion components must be finite"));
        }
        UnitQuaternion::try_new(q, 0.)
            .map(Self::from_nalgebra_quaternion)
            .ok_or_else(|| Error::domain("cannot normalize a zero quaternion"))
    }

    /// Constructs the rotation by `angle` about `axis`, following the right-hand rule.
    ///
    /// The axis need not be normalized, but must be a non-zero 3-vector. A zero axis fails with
    /// [`Error::Domain`], and any other length with [`Error::DimensionMismatch`].
    pub fn from_axis_angle(angle: impl Into<Angle>, axis: &Vector) -> Result<Self> {
        let axis = vector3(axis, "from_axis_angle")?;
        let axis = nalgebra::Unit::try_new(axis, 0.)
            .ok_or_else(|| Error::domain("rotation axis must not be the zero vector"))?;
        Ok(Self::from_nalgebra_quaternion(
            UnitQuaternion::from_axis_angle(&axis, angle.into().get::<radian>()),
        ))
    }

    /// Constructs the rotation described by a rotation vector, whose direction is the rotation
    /// axis and whose norm is the rotation angle in radians.
    ///
    /// The zero vector yields the identity. Fails with [`Error::DimensionMismatch`] unless `v` is
    /// a 3-vector.
    #[doc(alias = "rotation_vector_to_quaternion")]
    #[doc(alias = "from_scaled_axis")]
    pub fn from_rotation_vector(v: &Vector) -> Result<Self> {
        let v = vector3(v, "from_rotation_vector")?;
        Ok(Self::from_nalgebra_quaternion(
            UnitQuaternion::from_scaled_axis(v),
        ))
    }

    /// Constructs the quaternion whose [rotation matrix](Quaternion::to_rotation_matrix) equals
    /// [`EulerAngles::to_rotation_matrix`].
    #[must_use]
    pub fn from_euler_angles(angles: &EulerAngles) -> Self {
        // nalgebra builds the active rotation Rz·Ry·Rx; the Euler matrix is its transpose
        Self::from_nalgebra_quaternion(
            UnitQuaternion::from_euler_angles(
                angles.roll().get::<radian>(),
                angles.pitch().get::<radian>(),
                angles.yaw().get::<radian>(),
            )
            .inverse(),
        )
    }

    /// See [`RotationMatrix::to_quaternion`].
    #[must_use]
    pub fn from_rotation_matrix(matrix: &RotationMatrix) -> Self {
        matrix.to_quaternion()
    }

    /// Returns the (normalized) Euler angles of this rotation.
    ///
    /// See [`EulerAngles::from_rotation_matrix`] for how gimbal lock is handled.
    #[must_use]
    pub fn to_euler_angles(&self) -> EulerAngles {
        EulerAngles::from_rotation_matrix(&self.to_rotation_matrix())
    }

    /// Returns the rotation matrix that rotates vectors by this quaternion.
    #[must_use]
    #[doc(alias = "quaternion_to_matrix")]
    pub fn to_rotation_matrix(&self) -> RotationMatrix {
        RotationMatrix::from_nalgebra_matrix(self.inner.to_rotation_matrix().into_inner())
    }

    #[must_use]
    pub fn x(&self) -> f64 {
        self.inner.i
    }

    #[must_use]
    pub fn y(&self) -> f64 {
        self.inner.j
    }

    #[must_use]
    pub fn z(&self) -> f64 {
        self.inner.k
    }

    #[must_use]
    pub fn w(&self) -> f64 {
        self.inner.w
    }

    /// Returns the components scalar-last, as `[x, y, z, w]`.
    #[must_use]
    pub fn to_array(&self) -> [f64; 4] {
        [self.x(), self.y(), self.z(), self.w()]
    }

    /// Returns the rotation angle in [0, π] radians.
    #[must_use]
    pub fn angle(&self) -> Angle {
        Angle::new::<radian>(self.inner.angle())
    }

    /// Returns the inverse rotation.
    ///
    /// For a unit quaternion this is the conjugate, with the vector part negated.
    #[must_use]
    #[doc(alias = "invert")]
    pub fn inverse(&self) -> Self {
        self.conjugate()
    }

    /// Returns the conjugate, with the vector part negated.
    #[must_use]
    pub fn conjugate(&self) -> Self {
        Self::from_nalgebra_quaternion(self.inner.conjugate())
    }

    /// Normalized linear interpolation between this rotation and `other`.
    ///
    /// `t = 0` yields `self` and `t = 1` yields `other`.
    #[must_use]
    pub fn nlerp(&self, other: &Self, t: f64) -> Self {
        Self::from_nalgebra_quaternion(self.inner.nlerp(&other.inner, t))
    }

    /// Rotates the 3-vector `v` by this quaternion.
    ///
    /// Equivalent to `self.to_rotation_matrix().transform(v)`. Fails with
    /// [`Error::DimensionMismatch`] unless `v` has exactly three components.
    pub fn transform(&self, v: &Vector) -> Result<Vector> {
        let v = vector3(v, "transform")?;
        let out = self.inner * v;
        Ok(Vector::from([out.x, out.y, out.z]))
    }

    /// Time derivative of this attitude quaternion for the body angular rates `omega`
    /// (`[p, q, r]` about the body X, Y and Z axes).
    ///
    /// See [`Quaternion::derivative_of`]; as `self` is always normalized, `lambda` has no
    /// effect here.
    #[must_use]
    pub fn derivative(&self, omega: [AngularVelocity; 3], lambda: f64) -> [f64; 4] {
        Self::derivative_of(self.to_array(), omega, lambda)
    }

    /// Time derivative of the (not necessarily normalized) attitude quaternion `components`,
    /// given scalar-last, for the body angular rates `omega`.
    ///
    /// The attitude is read as the rotation whose [matrix](Quaternion::to_rotation_matrix)
    /// maps the reference frame into the body frame, which gives `q̇ = -½ (0, ω) ⊗ q`.
    ///
    /// Integrators that step raw components drift off the unit sphere. For `lambda > 0` the
    /// derivative gains the term `λ (1 - |q|²) q`, which pulls the norm back towards 1.
    ///
    /// The result is scalar-last, like the input.
    #[must_use]
    pub fn derivative_of(
        components: [f64; 4],
        omega: [AngularVelocity; 3],
        lambda: f64,
    ) -> [f64; 4] {
        let [x, y, z, w] = components;
        let q = nalgebra::Quaternion::new(w, x, y, z);
        let [p, q_rate, r] = omega.map(|rate| rate.get::<radian_per_second>());
        let rates = nalgebra::Quaternion::from_imag(Vector3::new(p, q_rate, r));

        let mut derivative = (rates * q) * -0.5;
        if lambda > 0. {
            derivative += q * (lambda * (1. - q.norm_squared()));
        }
        [derivative.i, derivative.j, derivative.k, derivative.w]
    }
}

impl Mul for Quaternion {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::from_nalgebra_quaternion(self.inner * rhs.inner)
    }
}

impl From<&EulerAngles> for Quaternion {
    fn from(angles: &EulerAngles) -> Self {
        Self::from_euler_angles(angles)
    }
}

impl From<&RotationMatrix> for Quaternion {
    fn from(matrix: &RotationMatrix) -> Self {
        matrix.to_quaternion()
    }
}

impl Display for Quaternion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(x: {:.6}, y: {:.6}, z: {:.6}, w: {:.6})",
            self.x(),
            self.y(),
            self.z(),
            self.w()
        )
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for Quaternion {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        // q and -q are the same rotation
        self.inner.coords.abs_diff_eq(&other.inner.coords, epsilon)
            || self.inner.coords.abs_diff_eq(&-other.inner.coords, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for Quaternion {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.inner
            .coords
            .relative_eq(&other.inner.coords, epsilon, max_relative)
            || self
                .inner
                .coords
                .relative_eq(&-other.inner.coords, epsilon, max_relative)
    }
}
