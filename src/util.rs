use std::f64::consts::{PI, TAU};
use uom::si::angle::radian;
use uom::si::f64::Angle;

/// An angle reduced onto the circle, so that `350°` and `-10°` are the same value.
///
/// Used wherever a stored angle is only meaningful modulo a full turn (longitude, yaw, roll) and
/// for comparing such angles without tripping over the wrap-around.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct CircularAngle {
    radians: f64,
}

impl CircularAngle {
    pub(crate) fn new(angle: impl Into<Angle>) -> Self {
        Self::from_radians(angle.into().get::<radian>())
    }

    pub(crate) fn from_radians(radians: f64) -> Self {
        // rem_euclid can round up to exactly TAU for tiny negative inputs
        let reduced = radians.rem_euclid(TAU);
        Self {
            radians: if reduced >= TAU { 0. } else { reduced },
        }
    }

    /// Returns the angle in [0, 2π) radians.
    pub(crate) fn unsigned_radians(self) -> f64 {
        self.radians
    }

    /// Returns the angle in [-π, π) radians.
    pub(crate) fn signed_radians(self) -> f64 {
        if self.radians < PI {
            self.radians
        } else {
            self.radians - TAU
        }
    }

    /// The shortest distance between two angles along the circle, in [0, π] radians.
    pub(crate) fn distance_to(self, other: Self) -> f64 {
        Self::from_radians(self.radians - other.radians)
            .signed_radians()
            .abs()
    }
}

/// Every value that can be converted into an [`Angle`] can be reduced onto the circle.
impl<U: Into<Angle>> From<U> for CircularAngle {
    fn from(value: U) -> Self {
        CircularAngle::new(value)
    }
}

/// Folds an angle given in radians into [-π, π], keeping `π` itself as `π`.
pub(crate) fn wrap_to_pi(radians: f64) -> f64 {
    if (-PI..=PI).contains(&radians) {
        radians
    } else {
        CircularAngle::from_radians(radians).signed_radians()
    }
}
