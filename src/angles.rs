use crate::quaternions::Quaternion;
use crate::rotations::RotationMatrix;
use crate::util::{wrap_to_pi, CircularAngle};
use crate::Matrix3;
use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::fmt::{Display, Formatter};
use uom::si::angle::{degree, radian};
use uom::si::f64::Angle;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Attitude expressed as roll (φ, about X), pitch (θ, about Y), and yaw (ψ, about Z).
///
/// The angles are applied intrinsically in Z-Y-X order: first yaw about the Z axis, then pitch
/// about the resulting Y axis, and finally roll about the resulting X axis. All rotations follow
/// the right-hand rule. The corresponding [`RotationMatrix`] (see
/// [`EulerAngles::to_rotation_matrix`]) is `(Rz(ψ)·Ry(θ)·Rx(φ))ᵀ`, which maps vectors expressed
/// in the reference frame into the rotated (body) frame.
///
/// The angles are stored exactly as given. Use [`EulerAngles::normalized`] to bring them into
/// their canonical ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[doc(alias = "tait_bryan")]
pub struct EulerAngles {
    roll: Angle,
    pitch: Angle,
    yaw: Angle,
}

impl Default for EulerAngles {
    fn default() -> Self {
        Self::zero()
    }
}

impl EulerAngles {
    /// Constructs a set of Euler angles from roll (φ), pitch (θ), and yaw (ψ).
    #[must_use]
    pub fn new(roll: impl Into<Angle>, pitch: impl Into<Angle>, yaw: impl Into<Angle>) -> Self {
        Self {
            roll: roll.into(),
            pitch: pitch.into(),
            yaw: yaw.into(),
        }
    }

    /// The angles of no rotation.
    #[must_use]
    pub fn zero() -> Self {
        Self::new(
            Angle::new::<radian>(0.),
            Angle::new::<radian>(0.),
            Angle::new::<radian>(0.),
        )
    }

    #[must_use]
    #[doc(alias = "phi")]
    #[doc(alias = "bank")]
    pub fn roll(&self) -> Angle {
        self.roll
    }

    #[must_use]
    #[doc(alias = "theta")]
    #[doc(alias = "elevation")]
    pub fn pitch(&self) -> Angle {
        self.pitch
    }

    #[must_use]
    #[doc(alias = "psi")]
    #[doc(alias = "heading")]
    pub fn yaw(&self) -> Angle {
        self.yaw
    }

    /// Returns the rotation matrix `(Rz(ψ)·Ry(θ)·Rx(φ))ᵀ` for these angles.
    ///
    /// In closed form:
    ///
    /// ```text
    /// | cθcψ              cθsψ              −sθ  |
    /// | −cφsψ + sφsθcψ    cφcψ + sφsθsψ     sφcθ |
    /// | sφsψ + cφsθcψ     −sφcψ + cφsθsψ    cφcθ |
    /// ```
    #[must_use]
    #[doc(alias = "euler_to_matrix")]
    pub fn to_rotation_matrix(&self) -> RotationMatrix {
        let (sin_phi, cos_phi) = self.roll.get::<radian>().sin_cos();
        let (sin_tht, cos_tht) = self.pitch.get::<radian>().sin_cos();
        let (sin_psi, cos_psi) = self.yaw.get::<radian>().sin_cos();

        let sin_phi_sin_tht = sin_phi * sin_tht;
        let cos_phi_sin_tht = cos_phi * sin_tht;

        #[rustfmt::skip]
        let m = Matrix3::new(
            cos_tht * cos_psi,
            cos_tht * sin_psi,
            -sin_tht,

            -(cos_phi * sin_psi) + (sin_phi_sin_tht * cos_psi),
            (cos_phi * cos_psi) + (sin_phi_sin_tht * sin_psi),
            sin_phi * cos_tht,

            (sin_phi * sin_psi) + (cos_phi_sin_tht * cos_psi),
            -(sin_phi * cos_psi) + (cos_phi_sin_tht * sin_psi),
            cos_phi * cos_tht,
        );
        RotationMatrix::from_nalgebra_matrix(m)
    }

    /// Recovers Euler angles from a rotation matrix built as in
    /// [`EulerAngles::to_rotation_matrix`].
    ///
    /// The result is [normalized](EulerAngles::normalized). When pitch is at ±90° (gimbal lock),
    /// roll and yaw rotate about the same axis and cannot be told apart; yaw is then reported as 0
    /// and roll absorbs the whole rotation.
    #[must_use]
    pub fn from_rotation_matrix(matrix: &RotationMatrix) -> Self {
        let m = &matrix.inner;

        let sin_tht = -m[(0, 2)];
        let cos_tht = (1. - f64::min(1., sin_tht * sin_tht)).sqrt();
        let pitch = sin_tht.atan2(cos_tht);

        let (roll, yaw) = if cos_tht > 0. {
            (m[(1, 2)].atan2(m[(2, 2)]), m[(0, 1)].atan2(m[(0, 0)]))
        } else {
            // with ψ = 0 the second row and column reduce to (cφ, −sφ) for either sign of θ
            ((-m[(2, 1)]).atan2(m[(1, 1)]), 0.)
        };

        Self::new(
            Angle::new::<radian>(roll),
            Angle::new::<radian>(pitch),
            Angle::new::<radian>(yaw),
        )
        .normalized()
    }

    /// Returns the unit quaternion for the same rotation.
    ///
    /// See [`Quaternion::from_euler_angles`].
    #[must_use]
    pub fn to_quaternion(&self) -> Quaternion {
        Quaternion::from_euler_angles(self)
    }

    /// Brings the angles into their canonical ranges without changing the rotation they
    /// describe.
    ///
    /// Pitch is folded into [-90°, 90°] (each fold turns roll and yaw by 180°), roll is wrapped
    /// into [-180°, 180°], and yaw into [0°, 360°).
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut roll = self.roll.get::<radian>();
        let mut pitch = wrap_to_pi(self.pitch.get::<radian>());
        let mut yaw = self.yaw.get::<radian>();

        if pitch > FRAC_PI_2 {
            pitch = PI - pitch;
            roll += PI;
            yaw += PI;
        } else if pitch < -FRAC_PI_2 {
            pitch = -PI - pitch;
            roll += PI;
            yaw += PI;
        }

        Self::new(
            Angle::new::<radian>(wrap_to_pi(roll)),
            Angle::new::<radian>(pitch),
            Angle::new::<radian>(CircularAngle::from_radians(yaw).unsigned_radians()),
        )
    }
}

impl Display for EulerAngles {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "roll {:.2}°, pitch {:.2}°, yaw {:.2}°",
            self.roll.get::<degree>(),
            self.pitch.get::<degree>(),
            self.yaw.get::<degree>()
        )
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for EulerAngles {
    type Epsilon = <f64 as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        // radians
        0.000_000_001
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        [
            (self.roll, other.roll),
            (self.pitch, other.pitch),
            (self.yaw, other.yaw),
        ]
        .into_iter()
        .all(|(a, b)| CircularAngle::new(a).distance_to(CircularAngle::new(b)) <= epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for EulerAngles {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        [
            (self.roll, other.roll),
            (self.pitch, other.pitch),
            (self.yaw, other.yaw),
        ]
        .into_iter()
        .all(|(a, b)| {
            let distance = CircularAngle::new(a).distance_to(CircularAngle::new(b));
            f64::relative_eq(&distance, &0., epsilon, max_relative)
        })
    }
}

/// An angle split into whole degrees, whole minutes, and (fractional) seconds of arc.
///
/// ```rust
/// use mcgeo::DegMinSec;
/// use uom::si::{angle::degree, f64::Angle};
///
/// let dms = DegMinSec::new(Angle::new::<degree>(-12.5125));
/// assert_eq!(dms.to_string(), "-12 deg 30 min 45.00 sec");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DegMinSec {
    angle: Angle,
    degrees: i32,
    minutes: u32,
    seconds: f64,
}

impl DegMinSec {
    #[must_use]
    pub fn new(angle: impl Into<Angle>) -> Self {
        let angle = angle.into();
        let abs = angle.get::<degree>().abs();
        let degrees = abs.floor();
        let minutes = ((abs - degrees) * 60.).floor();
        let seconds = (abs - degrees - minutes / 60.) * 3600.;

        // the casts saturate, which only matters for non-finite input
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (degrees, minutes) = (degrees as i32, minutes as u32);

        Self {
            angle,
            degrees: if angle.is_sign_negative() {
                -degrees
            } else {
                degrees
            },
            minutes,
            seconds,
        }
    }

    /// The angle this was built from.
    #[must_use]
    pub fn angle(&self) -> Angle {
        self.angle
    }

    /// Whole degrees, carrying the sign of the angle.
    ///
    /// Note that for angles in (-1°, 0°) this is 0; use [`DegMinSec::is_negative`] to recover
    /// the sign.
    #[must_use]
    pub fn degrees(&self) -> i32 {
        self.degrees
    }

    #[must_use]
    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    #[must_use]
    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.angle.get::<degree>() < 0.
    }
}

impl<U: Into<Angle>> From<U> for DegMinSec {
    fn from(angle: U) -> Self {
        Self::new(angle)
    }
}

impl Display for DegMinSec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_negative() && self.degrees == 0 {
            write!(f, "-")?;
        }
        write!(
            f,
            "{} deg {} min {:.2} sec",
            self.degrees, self.minutes, self.seconds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{DegMinSec, EulerAngles};
    use crate::rotations::RotationMatrix;
    use crate::Matrix3;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use quickcheck::quickcheck;
    use rstest::rstest;
    use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, PI, TAU};
    use uom::si::angle::{degree, radian};
    use uom::si::f64::Angle;

    fn d(degrees: f64) -> Angle {
        Angle::new::<degree>(degrees)
    }

    fn e(roll: f64, pitch: f64, yaw: f64) -> EulerAngles {
        EulerAngles::new(d(roll), d(pitch), d(yaw))
    }

    #[test]
    fn zero_angles_are_the_identity() {
        assert_eq!(
            EulerAngles::zero().to_rotation_matrix(),
            RotationMatrix::identity()
        );
    }

    #[rstest]
    // yaw of 90° turns the reference X axis into the body's -Y axis
    #[case(e(0., 0., 90.), Matrix3::new(0., 1., 0., -1., 0., 0., 0., 0., 1.))]
    #[case(e(0., 90., 0.), Matrix3::new(0., 0., -1., 0., 1., 0., 1., 0., 0.))]
    #[case(e(90., 0., 0.), Matrix3::new(1., 0., 0., 0., 0., 1., 0., -1., 0.))]
    #[case(
        e(45., 45., 45.),
        Matrix3::new(
            0.5, 0.5, -FRAC_1_SQRT_2,
            -0.146_446_609_406_726_24, 0.853_553_390_593_273_8, 0.5,
            0.853_553_390_593_273_8, -0.146_446_609_406_726_24, 0.5,
        )
    )]
    fn euler_to_matrix_works(#[case] angles: EulerAngles, #[case] expected: Matrix3) {
        assert_abs_diff_eq!(
            angles.to_rotation_matrix(),
            RotationMatrix::from_nalgebra_matrix(expected),
            epsilon = 1e-12
        );
    }

    #[test]
    fn euler_matrix_is_transposed_zyx_composition() {
        let angles = e(10., 20., 30.);
        let rx = nalgebra::Rotation3::from_axis_angle(&nalgebra::Vector3::x_axis(), 10_f64.to_radians());
        let ry = nalgebra::Rotation3::from_axis_angle(&nalgebra::Vector3::y_axis(), 20_f64.to_radians());
        let rz = nalgebra::Rotation3::from_axis_angle(&nalgebra::Vector3::z_axis(), 30_f64.to_radians());
        let expected = (rz * ry * rx).matrix().transpose();
        assert_abs_diff_eq!(
            angles.to_rotation_matrix(),
            RotationMatrix::from_nalgebra_matrix(expected),
            epsilon = 1e-12
        );
    }

    #[rstest]
    #[case(e(0., 0., 0.))]
    #[case(e(30., 45., 60.))]
    #[case(e(-30., -45., 300.))]
    #[case(e(179., 89., 359.))]
    #[case(e(-120., 10., 1.))]
    fn matrix_to_euler_roundtrips(#[case] angles: EulerAngles) {
        let recovered = EulerAngles::from_rotation_matrix(&angles.to_rotation_matrix());
        assert_abs_diff_eq!(recovered, angles, epsilon = 1e-9);
    }

    #[rstest]
    #[case(e(30., 90., 0.), e(30., 90., 0.))]
    #[case(e(30., -90., 0.), e(30., -90., 0.))]
    // roll and yaw are indistinguishable at gimbal lock, so yaw folds into roll
    #[case(e(50., 90., 20.), e(30., 90., 0.))]
    #[case(e(10., -90., 20.), e(30., -90., 0.))]
    fn matrix_to_euler_handles_gimbal_lock(
        #[case] angles: EulerAngles,
        #[case] expected: EulerAngles,
    ) {
        let recovered = EulerAngles::from_rotation_matrix(&angles.to_rotation_matrix());
        assert_abs_diff_eq!(recovered, expected, epsilon = 1e-6);
    }

    #[rstest]
    #[case(e(0., 100., 0.), e(180., 80., 180.))]
    #[case(e(0., -100., 0.), e(180., -80., 180.))]
    #[case(e(190., 0., -10.), e(-170., 0., 350.))]
    #[case(e(-190., 0., 370.), e(170., 0., 10.))]
    #[case(e(0., 370., 730.), e(0., 10., 10.))]
    fn normalization_works(#[case] angles: EulerAngles, #[case] expected: EulerAngles) {
        let normalized = angles.normalized();
        assert_relative_eq!(
            normalized.roll().get::<radian>(),
            expected.roll().get::<radian>(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            normalized.pitch().get::<radian>(),
            expected.pitch().get::<radian>(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            normalized.yaw().get::<radian>(),
            expected.yaw().get::<radian>(),
            epsilon = 1e-12
        );
        // normalization never changes the rotation itself
        assert_abs_diff_eq!(
            normalized.to_rotation_matrix(),
            angles.to_rotation_matrix(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn euler_display() {
        insta::assert_snapshot!(e(30., -45., 60.), @"roll 30.00°, pitch -45.00°, yaw 60.00°");
    }

    #[rstest]
    #[case(d(12.5125), 12, 30, 45.)]
    #[case(d(-12.5125), -12, 30, 45.)]
    #[case(d(0.), 0, 0, 0.)]
    #[case(d(89.999_999), 89, 59, 59.9964)]
    fn deg_min_sec_splits_correctly(
        #[case] angle: Angle,
        #[case] degrees: i32,
        #[case] minutes: u32,
        #[case] seconds: f64,
    ) {
        let dms = DegMinSec::new(angle);
        assert_eq!(dms.degrees(), degrees);
        assert_eq!(dms.minutes(), minutes);
        assert_relative_eq!(dms.seconds(), seconds, epsilon = 1e-6);
    }

    #[test]
    fn deg_min_sec_display() {
        insta::assert_snapshot!(DegMinSec::new(d(45.2625)), @"45 deg 15 min 45.00 sec");
        insta::assert_snapshot!(DegMinSec::new(d(-0.51)), @"-0 deg 30 min 36.00 sec");
    }

    quickcheck! {
        fn normalized_angles_are_in_range(roll: i16, pitch: i16, yaw: i16) -> bool {
            let normalized = e(f64::from(roll), f64::from(pitch), f64::from(yaw)).normalized();
            let (roll, pitch, yaw) = (
                normalized.roll().get::<radian>(),
                normalized.pitch().get::<radian>(),
                normalized.yaw().get::<radian>(),
            );
            (-PI..=PI).contains(&roll)
                && (-FRAC_PI_2..=FRAC_PI_2).contains(&pitch)
                && (0. ..TAU).contains(&yaw)
        }
    }
}
