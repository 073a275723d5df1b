use crate::ellipsoid::{Ellipsoid, WGS84};
use crate::error::{Error, Result};
use crate::geodetic::GeodeticPoint;
use crate::util::CircularAngle;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
use std::fmt;
use std::fmt::Display;
use uom::si::f64::{Angle, Length};
use uom::si::{
    angle::{degree, radian},
    length::meter,
};

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tunables for a [`Mercator`] projection.
///
/// A configuration is checked by [`MercatorConfig::validate`] when a [`Mercator`] is built from
/// it. With the `serde` feature, every field may be omitted and falls back to its default, and
/// the result is validated when deserializing.
///
/// ```rust
/// use mcgeo::MercatorConfig;
/// use uom::si::angle::degree;
///
/// let config = MercatorConfig::default();
/// assert!((config.max_latitude.get::<degree>() - 89.5).abs() < 1e-9);
/// assert_eq!(config.tolerance, 1e-12);
/// assert_eq!(config.max_iterations, 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "UncheckedMercatorConfig"))]
pub struct MercatorConfig {
    /// Latitudes further from the equator than this are rejected by
    /// [`Mercator::geodetic_to_mercator`], since `y` grows without bound towards the poles.
    pub max_latitude: Angle,

    /// The inverse projection stops once an iteration moves the latitude by less than this
    /// many radians.
    pub tolerance: f64,

    /// Upper bound on iterations of the inverse projection.
    pub max_iterations: usize,
}

impl Default for MercatorConfig {
    fn default() -> Self {
        Self {
            max_latitude: Angle::new::<degree>(89.5),
            tolerance: 1e-12,
            max_iterations: 20,
        }
    }
}

impl MercatorConfig {
    /// Fails with [`Error::Domain`] unless `max_latitude` lies strictly between 0° and 90° and
    /// `tolerance` is positive and finite.
    pub fn validate(&self) -> Result<()> {
        let max_latitude = self.max_latitude.get::<radian>();
        if !(max_latitude > 0. && max_latitude < FRAC_PI_2) {
            return Err(Error::domain(format!(
                "Mercator latitude limit must be in (0°, 90°), got {}°",
                self.max_latitude.get::<degree>()
            )));
        }
        if !(self.tolerance > 0. && self.tolerance.is_finite()) {
            return Err(Error::domain(format!(
                "Mercator tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
#[serde(default)]
struct UncheckedMercatorConfig {
    max_latitude: Angle,
    tolerance: f64,
    max_iterations: usize,
}

#[cfg(feature = "serde")]
impl Default for UncheckedMercatorConfig {
    fn default() -> Self {
        let MercatorConfig {
            max_latitude,
            tolerance,
            max_iterations,
        } = MercatorConfig::default();
        Self {
            max_latitude,
            tolerance,
            max_iterations,
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<UncheckedMercatorConfig> for MercatorConfig {
    type Error = Error;

    fn try_from(unchecked: UncheckedMercatorConfig) -> Result<Self> {
        let config = Self {
            max_latitude: unchecked.max_latitude,
            tolerance: unchecked.tolerance,
            max_iterations: unchecked.max_iterations,
        };
        config.validate()?;
        Ok(config)
    }
}

/// A position on the Mercator plane, in meters east (`x`) and north (`y`) of where the
/// equator meets the prime meridian.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MercatorPoint {
    pub x: Length,
    pub y: Length,
}

impl MercatorPoint {
    #[must_use]
    pub fn new(x: impl Into<Length>, y: impl Into<Length>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }
}

impl Display for MercatorPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(x: {:.3}m, y: {:.3}m)",
            self.x.get::<meter>(),
            self.y.get::<meter>()
        )
    }
}

/// The normal (equatorial) Mercator projection of an ellipsoid, with the true scale on the
/// equator.
///
/// ```rust
/// use mcgeo::Mercator;
/// use uom::si::f64::Angle;
/// use uom::si::{angle::degree, length::meter};
///
/// let mercator = Mercator::wgs84();
/// let point = mercator
///     .geodetic_to_mercator(Angle::new::<degree>(180.), Angle::new::<degree>(0.))
///     .expect("the equator is in range");
/// assert!((point.x.get::<meter>() - 6_378_137.0 * std::f64::consts::PI).abs() < 1e-6);
/// assert!(point.y.get::<meter>().abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mercator {
    ellipsoid: Ellipsoid,
    config: MercatorConfig,
    max_x: Length,
    max_y: Length,
}

impl Default for Mercator {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Mercator {
    /// Fails with [`Error::Domain`] if `config` does not pass [`MercatorConfig::validate`].
    pub fn new(ellipsoid: &Ellipsoid, config: MercatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(ellipsoid, config))
    }

    fn from_valid_config(ellipsoid: &Ellipsoid, config: MercatorConfig) -> Self {
        let mut mercator = Self {
            ellipsoid: *ellipsoid,
            config,
            max_x: Length::new::<meter>(0.),
            max_y: Length::new::<meter>(0.),
        };
        mercator.max_x = mercator.x(Angle::HALF_TURN);
        mercator.max_y = mercator.y(Angle::new::<degree>(85.));
        mercator
    }

    /// The projection of the [`WGS84`] ellipsoid with the default [`MercatorConfig`].
    #[must_use]
    pub fn wgs84() -> Self {
        Self::from_valid_config(&WGS84, MercatorConfig::default())
    }

    #[must_use]
    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    #[must_use]
    pub fn config(&self) -> &MercatorConfig {
        &self.config
    }

    /// `x` at 180°E, the eastern edge of the map.
    #[must_use]
    pub fn max_x(&self) -> Length {
        self.max_x
    }

    /// `y` at 85°N, the conventional northern edge of the map.
    #[must_use]
    pub fn max_y(&self) -> Length {
        self.max_y
    }

    /// Projects a longitude onto the `x` axis. Not wrapped: 190° lands east of [`Mercator::max_x`].
    #[must_use]
    pub fn x(&self, longitude: impl Into<Angle>) -> Length {
        self.ellipsoid.a() * longitude.into().get::<radian>()
    }

    /// Projects a latitude onto the `y` axis.
    ///
    /// Unbounded towards the poles, and infinite at them.
    #[must_use]
    pub fn y(&self, latitude: impl Into<Angle>) -> Length {
        self.ellipsoid.a() * self.isometric_kernel(latitude).ln()
    }

    /// The inverse of [`Mercator::x`].
    #[must_use]
    pub fn lon(&self, x: impl Into<Length>) -> Angle {
        Angle::new::<radian>(x.into().get::<meter>() / self.ellipsoid.a_meters())
    }

    /// The inverse of [`Mercator::y`].
    ///
    /// The latitude is found by fixed-point iteration, starting from the spherical solution.
    /// Iteration stops once the latitude moves by less than [`MercatorConfig::tolerance`] or
    /// after [`MercatorConfig::max_iterations`], whichever comes first; in the latter case the
    /// last estimate is returned.
    #[must_use]
    pub fn lat(&self, y: impl Into<Length>) -> Angle {
        let t = (-y.into().get::<meter>() / self.ellipsoid.a_meters()).exp();
        let half_e = 0.5 * self.ellipsoid.e();

        let mut lat = FRAC_PI_2 - 2. * t.atan();
        let mut iterations = 0;
        loop {
            if iterations == self.config.max_iterations {
                log::debug!(
                    "inverse Mercator latitude did not converge in {iterations} iterations \
                     (t = {t}); returning best estimate"
                );
                break;
            }
            let e_sin_lat = self.ellipsoid.e() * lat.sin();
            let next =
                FRAC_PI_2 - 2. * (t * ((1. - e_sin_lat) / (1. + e_sin_lat)).powf(half_e)).atan();
            let delta = (next - lat).abs();
            lat = next;
            iterations += 1;
            if delta < self.config.tolerance {
                log::trace!("inverse Mercator latitude converged after {iterations} iterations");
                break;
            }
        }
        Angle::new::<radian>(lat)
    }

    /// `tan(π/4 + φ/2) · ((1 − e sin φ) / (1 + e sin φ))^(e/2)`, whose logarithm is the
    /// isometric latitude.
    #[must_use]
    pub fn isometric_kernel(&self, latitude: impl Into<Angle>) -> f64 {
        let lat = latitude.into().get::<radian>();
        let e = self.ellipsoid.e();
        let e_sin_lat = e * lat.sin();
        (FRAC_PI_4 + 0.5 * lat).tan() * ((1. - e_sin_lat) / (1. + e_sin_lat)).powf(0.5 * e)
    }

    /// Projects a longitude and latitude onto the Mercator plane.
    ///
    /// The latitude is taken modulo full turns, so 370° is 10°. Fails with [`Error::Domain`] if
    /// it is then further from the equator than [`MercatorConfig::max_latitude`] (or is not a
    /// number).
    pub fn geodetic_to_mercator(
        &self,
        longitude: impl Into<Angle>,
        latitude: impl Into<Angle>,
    ) -> Result<MercatorPoint> {
        let latitude = Angle::new::<radian>(CircularAngle::new(latitude).signed_radians());
        if !(latitude.abs() <= self.config.max_latitude) {
            return Err(Error::domain(format!(
                "latitude {}° is beyond the projection limit of ±{}°",
                latitude.get::<degree>(),
                self.config.max_latitude.get::<degree>()
            )));
        }
        Ok(MercatorPoint {
            x: self.x(longitude),
            y: self.y(latitude),
        })
    }

    /// Recovers the location (on the ellipsoid's surface) of a point on the Mercator plane.
    ///
    /// Never fails: very large `y` values approach, but never pass, the poles.
    #[must_use]
    pub fn mercator_to_geodetic(&self, point: &MercatorPoint) -> GeodeticPoint {
        GeodeticPoint::from_valid_radians(
            self.lat(point.y).get::<radian>(),
            self.lon(point.x).get::<radian>(),
            Length::new::<meter>(0.),
        )
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for MercatorPoint {
    type Epsilon = Length;

    fn default_epsilon() -> Self::Epsilon {
        Length::new::<meter>(1e-6)
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        let epsilon = epsilon.get::<meter>();
        self.x.get::<meter>().abs_diff_eq(&other.x.get::<meter>(), epsilon)
            && self.y.get::<meter>().abs_diff_eq(&other.y.get::<meter>(), epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for MercatorPoint {
    fn default_max_relative() -> Self::Epsilon {
        Length::new::<meter>(f64::default_max_relative())
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        let (epsilon, max_relative) = (epsilon.get::<meter>(), max_relative.get::<meter>());
        self.x
            .get::<meter>()
            .relative_eq(&other.x.get::<meter>(), epsilon, max_relative)
            && self
                .y
                .get::<meter>()
                .relative_eq(&other.y.get::<meter>(), epsilon, max_relative)
    }
}
