use crate::error::{Error, Result};
use std::sync::LazyLock;
use uom::si::f64::{Area, Length};
use uom::si::{area::square_meter, length::meter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// https://nsgreg.nga.mil/doc/view?i=4085 table 3.1
const WGS84_SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
const WGS84_FLATTENING_FACTOR: f64 = 298.257_223_563;

/// The [World Geodetic System '84](https://en.wikipedia.org/wiki/World_Geodetic_System#WGS_84)
/// reference ellipsoid.
///
/// Initialized on first use and shared, read-only, by the whole process.
pub static WGS84: LazyLock<Ellipsoid> = LazyLock::new(Ellipsoid::wgs84);

/// An oblate ellipsoid of revolution, defined by its semi-major axis `a` and flattening `f`.
///
/// All other quantities are derived from those two on construction. With the `serde` feature,
/// an ellipsoid (de)serializes as just `semi_major_axis` and `flattening`, and the parameters are
/// validated when deserializing.
///
/// ```rust
/// use mcgeo::WGS84;
/// use uom::si::length::meter;
///
/// assert_eq!(WGS84.a().get::<meter>(), 6_378_137.0);
/// assert!((WGS84.b().get::<meter>() - 6_356_752.3142).abs() < 1e-3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "EllipsoidParameters", into = "EllipsoidParameters")
)]
pub struct Ellipsoid {
    a: f64,
    f: f64,
    b: f64,
    r1: f64,
    a2: f64,
    b2: f64,
    e2: f64,
    e: f64,
    ep2: f64,
    ep: f64,
}

/// The defining parameters of an [`Ellipsoid`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EllipsoidParameters {
    /// Equatorial radius `a`.
    pub semi_major_axis: Length,

    /// Flattening `f = (a - b) / a`.
    pub flattening: f64,
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Ellipsoid {
    /// Constructs an ellipsoid from its equatorial radius `a` and flattening `f`.
    ///
    /// Fails with [`Error::Domain`] unless `a` is positive and finite and `f` is in [0, 1).
    pub fn new(semi_major_axis: impl Into<Length>, flattening: f64) -> Result<Self> {
        let a = semi_major_axis.into().get::<meter>();
        if !(a.is_finite() && a > 0.) {
            return Err(Error::domain(format!(
                "semi-major axis must be positive, got {a} m"
            )));
        }
        if !(0. ..1.).contains(&flattening) {
            return Err(Error::domain(format!(
                "flattening must be in [0, 1), got {flattening}"
            )));
        }
        Ok(Self::from_valid_parameters(a, flattening))
    }

    fn wgs84() -> Self {
        Self::from_valid_parameters(WGS84_SEMI_MAJOR_AXIS, 1. / WGS84_FLATTENING_FACTOR)
    }

    fn from_valid_parameters(a: f64, f: f64) -> Self {
        // b/a = 1 - f
        let b = a - f * a;
        let a2 = a * a;
        let b2 = b * b;
        // e^2 = 1 - b^2/a^2 = 2f - f^2
        let e2 = 1. - b2 / a2;
        let ep2 = a2 / b2 - 1.;
        Self {
            a,
            f,
            b,
            r1: (2. * a + b) / 3.,
            a2,
            b2,
            e2,
            e: e2.sqrt(),
            ep2,
            ep: ep2.sqrt(),
        }
    }

    /// Returns the parameters this ellipsoid was defined by.
    #[must_use]
    pub fn parameters(&self) -> EllipsoidParameters {
        EllipsoidParameters {
            semi_major_axis: self.a(),
            flattening: self.f,
        }
    }

    #[must_use]
    #[doc(alias = "semi_major_axis")]
    #[doc(alias = "equatorial radius")]
    pub fn a(&self) -> Length {
        Length::new::<meter>(self.a)
    }

    #[must_use]
    #[doc(alias = "flattening")]
    pub fn f(&self) -> f64 {
        self.f
    }

    #[must_use]
    #[doc(alias = "semi_minor_axis")]
    #[doc(alias = "polar radius")]
    pub fn b(&self) -> Length {
        Length::new::<meter>(self.b)
    }

    /// Mean radius, `(2a + b) / 3`.
    #[must_use]
    #[doc(alias = "mean_radius")]
    pub fn r1(&self) -> Length {
        Length::new::<meter>(self.r1)
    }

    #[must_use]
    pub fn a2(&self) -> Area {
        Area::new::<square_meter>(self.a2)
    }

    #[must_use]
    pub fn b2(&self) -> Area {
        Area::new::<square_meter>(self.b2)
    }

    /// First eccentricity squared.
    #[must_use]
    pub fn e2(&self) -> f64 {
        self.e2
    }

    /// First eccentricity.
    #[must_use]
    #[doc(alias = "eccentricity")]
    pub fn e(&self) -> f64 {
        self.e
    }

    /// Second eccentricity squared.
    #[must_use]
    pub fn ep2(&self) -> f64 {
        self.ep2
    }

    /// Second eccentricity.
    #[must_use]
    pub fn ep(&self) -> f64 {
        self.ep
    }

    // unit-less accessors for the conversion routines
    pub(crate) fn a_meters(&self) -> f64 {
        self.a
    }

    pub(crate) fn b_meters(&self) -> f64 {
        self.b
    }
}

impl TryFrom<EllipsoidParameters> for Ellipsoid {
    type Error = Error;

    fn try_from(parameters: EllipsoidParameters) -> Result<Self> {
        Self::new(parameters.semi_major_axis, parameters.flattening)
    }
}

impl From<Ellipsoid> for EllipsoidParameters {
    fn from(ellipsoid: Ellipsoid) -> Self {
        ellipsoid.parameters()
    }
}
