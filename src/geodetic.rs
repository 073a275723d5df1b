use crate::ellipsoid::{Ellipsoid, WGS84};
use crate::error::{Error, Result};
use crate::rotations::vector3;
use crate::util::CircularAngle;
use crate::vectors::Vector;
use crate::Point3;
use std::f64::consts::FRAC_PI_2;
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

/// Convergence threshold on the parametric latitude in [`Ellipsoid::ecef_to_geodetic`].
const PARAMETRIC_LATITUDE_TOLERANCE: f64 = 1e-12;

/// Iteration cap for [`Ellipsoid::ecef_to_geodetic`]; Bowring's method needs at most three or
/// four iterations for any point near the Earth's surface.
const MAX_BOWRING_ITERATIONS: usize = 5;

/// An Earth-bound location as latitude, longitude, and altitude above a reference ellipsoid
/// (by default [`WGS84`]).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeodeticPoint {
    // NOTE: uom does not guarantee how these angles are normalized, and neither do we. the
    // accessors put them into range, and every formula they feed into is periodic anyway.
    latitude: Angle,
    longitude: Angle,
    altitude: Length,
}

/// Argument type for [`GeodeticPoint::build`].
#[derive(Debug, Default)]
#[must_use]
pub struct Components {
    /// The latitude angle of the proposed [`GeodeticPoint`].
    ///
    /// The latitude must be in [-90°,90°] % 360°.
    pub latitude: Angle,

    /// The longitude angle of the proposed [`GeodeticPoint`].
    pub longitude: Angle,

    /// The altitude of the proposed [`GeodeticPoint`], measured as distance above the reference
    /// ellipsoid.
    pub altitude: Length,
}

impl GeodeticPoint {
    /// Constructs a location from latitude, longitude, and altitude.
    ///
    /// The latitude must be in [-90°,90°] % 360°. If it is not, this function fails with
    /// [`Error::Domain`].
    ///
    /// The altitude is measured as distance above the reference ellipsoid.
    pub fn build(
        Components {
            latitude,
            longitude,
            altitude,
        }: Components,
    ) -> Result<Self> {
        let latitude_in_signed_radians = CircularAngle::new(latitude).signed_radians();
        if !(-FRAC_PI_2..=FRAC_PI_2).contains(&latitude_in_signed_radians) {
            return Err(Error::domain(format!(
                "latitude must be in [-90°, 90°], got {}°",
                latitude.get::<degree>()
            )));
        }
        Ok(Self {
            latitude,
            longitude,
            altitude,
        })
    }

    /// Constructs a location from latitude, longitude, and altitude.
    ///
    /// Prefer [`GeodeticPoint::build`] where the argument order might be confused. Fails under
    /// the same conditions.
    pub fn new(
        latitude: impl Into<Angle>,
        longitude: impl Into<Angle>,
        altitude: impl Into<Length>,
    ) -> Result<Self> {
        Self::build(Components {
            latitude: latitude.into(),
            longitude: longitude.into(),
            altitude: altitude.into(),
        })
    }

    /// Skips the latitude check for values the caller already knows to be in [-π/2, π/2].
    pub(crate) fn from_valid_radians(latitude: f64, longitude: f64, altitude: Length) -> Self {
        Self {
            latitude: Angle::new::<radian>(latitude),
            longitude: Angle::new::<radian>(longitude),
            altitude,
        }
    }

    /// Computes the [great-circle distance] between the two locations on the surface of
    /// the earth.
    ///
    /// Note that this is an approximation as the earth is not a perfect sphere; the sphere used
    /// has the WGS84 equatorial radius.
    ///
    /// [great-circle distance]: https://en.wikipedia.org/wiki/Great-circle_distance
    #[doc(alias = "great_circle_distance")]
    #[must_use]
    pub fn haversine_distance_on_surface(&self, other: &GeodeticPoint) -> Length {
        let central_angle = central_angle_by_inverse_haversine(
            self.latitude,
            other.latitude,
            self.longitude,
            other.longitude,
        );
        WGS84.a() * central_angle.get::<radian>()
    }

    /// Returns the angle north of the equator ("northing"), in [-90°, 90°].
    #[must_use]
    #[doc(alias = "lat")]
    pub fn latitude(&self) -> Angle {
        Angle::new::<radian>(CircularAngle::new(self.latitude).signed_radians())
    }

    /// Returns the angle east of the IERS Reference Meridian ("easting"), in [-180°, 180°).
    #[must_use]
    #[doc(alias = "lon")]
    pub fn longitude(&self) -> Angle {
        Angle::new::<radian>(CircularAngle::new(self.longitude).signed_radians())
    }

    /// Returns the height above the reference ellipsoid.
    ///
    /// Note that the ellipsoid does not perfectly align with ground level, so while this is
    /// similar to altitude above mean sea level, it is not equal to it.
    #[must_use]
    #[doc(alias = "alt")]
    pub fn altitude(&self) -> Length {
        self.altitude
    }

    /// Converts to Earth-Centered, Earth-Fixed coordinates on the [`WGS84`] ellipsoid.
    #[must_use]
    pub fn to_ecef(&self) -> EcefPoint {
        WGS84.geodetic_to_ecef(self)
    }
}

impl Display for GeodeticPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lat = self.latitude();
        let lat_is_positive = lat.is_sign_positive();
        let lat = lat.abs().get::<degree>();
        let lon = self.longitude();
        let lon_is_positive = lon.is_sign_positive();
        let lon = lon.abs().get::<degree>();
        let alt = self.altitude.get::<meter>();
        match (lat_is_positive, lon_is_positive) {
            (true, true) => write!(f, "{lat:.6}°N, {lon:.6}°E, {alt:.3}m"),
            (true, false) => write!(f, "{lat:.6}°N, {lon:.6}°W, {alt:.3}m"),
            (false, true) => write!(f, "{lat:.6}°S, {lon:.6}°E, {alt:.3}m"),
            (false, false) => write!(f, "{lat:.6}°S, {lon:.6}°W, {alt:.3}m"),
        }
    }
}

/// A point in the Earth-Centered, Earth-Fixed frame.
///
/// The origin is the Earth's center of mass, X points towards 0°N 0°E, Z towards the North pole,
/// and Y completes the right-handed frame (towards 0°N 90°E).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EcefPoint {
    point: Point3,
}

impl EcefPoint {
    pub(crate) fn from_nalgebra_point(point: Point3) -> Self {
        Self { point }
    }

    pub(crate) fn point(&self) -> Point3 {
        self.point
    }

    #[must_use]
    pub fn new(x: impl Into<Length>, y: impl Into<Length>, z: impl Into<Length>) -> Self {
        Self::from_nalgebra_point(Point3::new(
            x.into().get::<meter>(),
            y.into().get::<meter>(),
            z.into().get::<meter>(),
        ))
    }

    #[must_use]
    pub fn x(&self) -> Length {
        Length::new::<meter>(self.point.x)
    }

    #[must_use]
    pub fn y(&self) -> Length {
        Length::new::<meter>(self.point.y)
    }

    #[must_use]
    pub fn z(&self) -> Length {
        Length::new::<meter>(self.point.z)
    }

    /// Returns the position as a 3-vector in meters.
    #[must_use]
    pub fn to_vector(&self) -> Vector {
        Vector::from([self.point.x, self.point.y, self.point.z])
    }

    /// Interprets a 3-vector in meters as an ECEF position.
    ///
    /// Fails with [`Error::DimensionMismatch`] if `v` does not have exactly three components.
    pub fn from_vector(v: &Vector) -> Result<Self> {
        let v = vector3(v, "ECEF position")?;
        Ok(Self::from_nalgebra_point(Point3::from(v)))
    }

    /// Converts a location on the [`WGS84`] ellipsoid to ECEF.
    #[must_use]
    pub fn from_geodetic(geodetic: &GeodeticPoint) -> Self {
        WGS84.geodetic_to_ecef(geodetic)
    }

    /// Converts to latitude, longitude, and altitude on the [`WGS84`] ellipsoid.
    #[must_use]
    pub fn to_geodetic(&self) -> GeodeticPoint {
        WGS84.ecef_to_geodetic(self)
    }
}

impl Display for EcefPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.3}m, {:.3}m, {:.3}m)",
            self.point.x, self.point.y, self.point.z
        )
    }
}

impl From<EcefPoint> for GeodeticPoint {
    fn from(ecef: EcefPoint) -> Self {
        ecef.to_geodetic()
    }
}

impl From<GeodeticPoint> for EcefPoint {
    fn from(geodetic: GeodeticPoint) -> Self {
        Self::from_geodetic(&geodetic)
    }
}

impl Ellipsoid {
    /// Converts latitude, longitude, and altitude on this ellipsoid to Earth-Centered,
    /// Earth-Fixed coordinates.
    ///
    /// See:
    /// <https://en.wikipedia.org/wiki/Geographic_coordinate_conversion#From_geodetic_to_ECEF_coordinates>
    #[must_use]
    pub fn geodetic_to_ecef(&self, geodetic: &GeodeticPoint) -> EcefPoint {
        let height_h = geodetic.altitude.get::<meter>();
        let (sin_lat, cos_lat) = geodetic.latitude.get::<radian>().sin_cos();
        let (sin_lon, cos_lon) = geodetic.longitude.get::<radian>().sin_cos();

        // https://en.wikipedia.org/wiki/Earth_radius#Prime_vertical
        let n_phi = self.a_meters() / (1. - self.e2() * sin_lat * sin_lat).sqrt();

        let x = (n_phi + height_h) * cos_lat * cos_lon;
        let y = (n_phi + height_h) * cos_lat * sin_lon;
        let z = ((1. - self.e2()) * n_phi + height_h) * sin_lat;

        EcefPoint::from_nalgebra_point(Point3::new(x, y, z))
    }

    /// Converts an Earth-Centered, Earth-Fixed position into latitude, longitude, and altitude
    /// on this ellipsoid.
    ///
    /// Uses [Bowring's method][bowring], iterating on the parametric (reduced) latitude until it
    /// changes by less than 1e-12 rad. The iteration is capped; if the cap is hit, the best
    /// estimate so far is returned. Points on the rotation axis get longitude 0 and latitude
    /// ±90° (or 0° at the very center).
    ///
    /// [bowring]: https://en.wikipedia.org/wiki/Geographic_coordinate_conversion#Simple_iterations
    #[must_use]
    pub fn ecef_to_geodetic(&self, ecef: &EcefPoint) -> GeodeticPoint {
        let (x, y, z) = (ecef.point.x, ecef.point.y, ecef.point.z);
        let p = x.hypot(y);

        if p == 0. {
            return self.on_rotation_axis(z);
        }

        let mut beta = z.atan2((1. - self.f()) * p);
        let mut lat = self.bowring_step(p, z, beta);
        let mut iterations = 1;
        loop {
            let next_beta = ((1. - self.f()) * lat.sin()).atan2(lat.cos());
            if (next_beta - beta).abs() < PARAMETRIC_LATITUDE_TOLERANCE {
                log::trace!("geodetic latitude converged after {iterations} iterations");
                break;
            }
            if iterations == MAX_BOWRING_ITERATIONS {
                log::debug!(
                    "geodetic latitude did not converge in {MAX_BOWRING_ITERATIONS} iterations \
                     for ECEF ({x}, {y}, {z}); returning best estimate"
                );
                break;
            }
            beta = next_beta;
            lat = self.bowring_step(p, z, beta);
            iterations += 1;
        }

        self.geodetic_from_latitude(p, z, lat, y.atan2(x))
    }

    /// Converts an Earth-Centered, Earth-Fixed position into latitude, longitude, and altitude
    /// using a single step of Bowring's method.
    ///
    /// Accurate to well below a millimeter for points near the surface of the Earth, but unlike
    /// [`Ellipsoid::ecef_to_geodetic`] it does not refine its estimate for points far from it.
    #[must_use]
    pub fn ecef_to_geodetic_fast(&self, ecef: &EcefPoint) -> GeodeticPoint {
        let (x, y, z) = (ecef.point.x, ecef.point.y, ecef.point.z);
        let p = x.hypot(y);

        if p == 0. {
            return self.on_rotation_axis(z);
        }

        let beta = (z * self.a_meters()).atan2(p * self.b_meters());
        let lat = self.bowring_step(p, z, beta);
        self.geodetic_from_latitude(p, z, lat, y.atan2(x))
    }

    /// Geodetic latitude from the parametric latitude `beta` (Bowring's formula).
    fn bowring_step(&self, p: f64, z: f64, beta: f64) -> f64 {
        let (sin_beta, cos_beta) = beta.sin_cos();
        (z + self.ep2() * self.b_meters() * sin_beta.powi(3))
            .atan2(p - self.e2() * self.a_meters() * cos_beta.powi(3))
    }

    fn geodetic_from_latitude(&self, p: f64, z: f64, lat: f64, lon: f64) -> GeodeticPoint {
        let (sin_lat, cos_lat) = lat.sin_cos();
        // distance along the ellipsoid normal; unlike p/cos(φ) - N this holds near the poles too
        let altitude =
            p * cos_lat + z * sin_lat - self.a_meters() * (1. - self.e2() * sin_lat * sin_lat).sqrt();
        GeodeticPoint::from_valid_radians(lat, lon, Length::new::<meter>(altitude))
    }

    fn on_rotation_axis(&self, z: f64) -> GeodeticPoint {
        let lat = if z > 0. {
            FRAC_PI_2
        } else if z < 0. {
            -FRAC_PI_2
        } else {
            0.
        };
        self.geodetic_from_latitude(0., z, lat, 0.)
    }
}

/// Computes the central angle between the given lat/lon points.
///
/// To turn this angle into [great-circle distance], multiply this value by the radius of the
/// sphere (ie, of the earth).
///
/// The current implementation computes this [using the archaversine] (inverse haversine).
///
/// [great-circle distance]: https://en.wikipedia.org/wiki/Great-circle_distance
/// [using the archaversine]: https://en.wikipedia.org/wiki/Haversine_formula#Formulation
fn central_angle_by_inverse_haversine(
    lat_a: Angle,
    lat_b: Angle,
    lon_a: Angle,
    lon_b: Angle,
) -> Angle {
    let lat_a = lat_a.get::<radian>(); // φ1
    let lat_b = lat_b.get::<radian>(); // φ2
    let delta_lat = lat_b - lat_a;
    let delta_lon = lon_b.get::<radian>() - lon_a.get::<radian>();

    let inner = 1. - delta_lat.cos() + lat_a.cos() * lat_b.cos() * (1. - delta_lon.cos());
    // rounding can push `inner` just outside [0, 2]
    Angle::new::<radian>(2. * (inner / 2.).clamp(0., 1.).sqrt().asin())
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for GeodeticPoint {
    type Epsilon = Length;

    fn default_epsilon() -> Self::Epsilon {
        // sub-millimeter on the ground
        Length::new::<meter>(1e-4)
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.haversine_distance_on_surface(other) <= epsilon
            && self
                .altitude
                .get::<meter>()
                .abs_diff_eq(&other.altitude.get::<meter>(), epsilon.get::<meter>())
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for GeodeticPoint {
    fn default_max_relative() -> Self::Epsilon {
        Length::new::<meter>(f64::default_max_relative())
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.haversine_distance_on_surface(other)
            .get::<meter>()
            .abs_diff_eq(&0., epsilon.get::<meter>())
            && self.altitude.get::<meter>().relative_eq(
                &other.altitude.get::<meter>(),
                epsilon.get::<meter>(),
                max_relative.get::<meter>(),
            )
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq<Self> for EcefPoint {
    type Epsilon = Length;

    fn default_epsilon() -> Self::Epsilon {
        Length::new::<meter>(1e-4)
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.point.abs_diff_eq(&other.point, epsilon.get::<meter>())
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for EcefPoint {
    fn default_max_relative() -> Self::Epsilon {
        Length::new::<meter>(f64::default_max_relative())
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.point.relative_eq(
            &other.point,
            epsilon.get::<meter>(),
            max_relative.get::<meter>(),
        )
    }
}
