use crate::angles::EulerAngles;
use crate::ellipsoid::{Ellipsoid, WGS84};
use crate::error::Result;
use crate::geodetic::{EcefPoint, GeodeticPoint};
use crate::quaternions::Quaternion;
use crate::rotations::{vector3, RotationMatrix};
use crate::vectors::Vector;
use crate::{Matrix3, Point3, Vector3};
use uom::si::f64::{Angle, Length};
use uom::si::{angle::radian, length::meter};

/// An attitude representation that [`LocalFrame`] can re-express relative to another reference
/// frame.
pub trait Attitude: Sized {
    /// Given the attitude of a body relative to a source frame, returns its attitude relative to
    /// a target frame, where `target_to_source` maps target-frame vectors into the source frame.
    ///
    /// In matrix form: `M_target→body = M_source→body · M_target→source`.
    #[must_use]
    fn reexpressed(&self, target_to_source: &RotationMatrix) -> Self;
}

impl Attitude for EulerAngles {
    fn reexpressed(&self, target_to_source: &RotationMatrix) -> Self {
        EulerAngles::from_rotation_matrix(&(self.to_rotation_matrix() * *target_to_source))
    }
}

impl Attitude for Quaternion {
    fn reexpressed(&self, target_to_source: &RotationMatrix) -> Self {
        *self * target_to_source.to_quaternion()
    }
}

impl Attitude for RotationMatrix {
    fn reexpressed(&self, target_to_source: &RotationMatrix) -> Self {
        *self * *target_to_source
    }
}

/// A local tangent plane anchored at a point on (or near) an ellipsoid.
///
/// Provides the rotations between the Earth-Centered, Earth-Fixed frame and the local
/// North-East-Down (NED) and East-North-Up (ENU) frames at the anchor, and uses them to move
/// positions and attitudes between those frames.
///
/// ```rust
/// use mcgeo::{GeodeticPoint, LocalFrame, EulerAngles};
/// use uom::si::f64::{Angle, Length};
/// use uom::si::{angle::degree, length::meter};
///
/// let origin = GeodeticPoint::new(
///     Angle::new::<degree>(0.),
///     Angle::new::<degree>(0.),
///     Length::new::<meter>(0.),
/// )
/// .expect("latitude is in [-90°, 90°]");
/// let frame = LocalFrame::wgs84(origin);
///
/// // a body level and facing north at 0°N 0°E has its nose along the ECEF Z axis
/// let in_ecef = frame.ned_to_ecef_attitude(&EulerAngles::zero());
/// assert!((in_ecef.pitch().get::<degree>() + 90.).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    ellipsoid: Ellipsoid,
    origin: GeodeticPoint,
    origin_ecef: EcefPoint,
    ned_to_ecef: RotationMatrix,
    ecef_to_ned: RotationMatrix,
    enu_to_ecef: RotationMatrix,
    ecef_to_enu: RotationMatrix,
}

impl LocalFrame {
    /// Anchors a local frame at `origin` on the given ellipsoid.
    #[must_use]
    pub fn new(ellipsoid: &Ellipsoid, origin: GeodeticPoint) -> Self {
        let origin_ecef = ellipsoid.geodetic_to_ecef(&origin);
        Self::anchored(*ellipsoid, origin, origin_ecef)
    }

    /// Anchors a local frame at `origin` on the [`WGS84`] ellipsoid.
    #[must_use]
    pub fn wgs84(origin: GeodeticPoint) -> Self {
        Self::new(&WGS84, origin)
    }

    /// Anchors a local frame at an ECEF position on the given ellipsoid.
    #[must_use]
    pub fn from_ecef(ellipsoid: &Ellipsoid, origin: EcefPoint) -> Self {
        let geodetic = ellipsoid.ecef_to_geodetic(&origin);
        Self::anchored(*ellipsoid, geodetic, origin)
    }

    fn anchored(ellipsoid: Ellipsoid, origin: GeodeticPoint, origin_ecef: EcefPoint) -> Self {
        let ned_to_ecef = ned_to_ecef_at(origin.latitude(), origin.longitude());
        let ecef_to_ned = ned_to_ecef.transpose();
        Self {
            ellipsoid,
            origin,
            origin_ecef,
            ned_to_ecef,
            ecef_to_ned,
            enu_to_ecef: ned_to_ecef * Self::enu_to_ned(),
            ecef_to_enu: Self::ned_to_enu() * ecef_to_ned,
        }
    }

    #[must_use]
    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    #[must_use]
    pub fn origin(&self) -> GeodeticPoint {
        self.origin
    }

    #[must_use]
    pub fn origin_ecef(&self) -> EcefPoint {
        self.origin_ecef
    }

    /// Maps NED vectors at the origin into ECEF.
    #[must_use]
    #[doc(alias = "ned2ecef")]
    pub fn ned_to_ecef(&self) -> RotationMatrix {
        self.ned_to_ecef
    }

    /// Maps ECEF vectors into NED at the origin.
    #[must_use]
    #[doc(alias = "ecef2ned")]
    pub fn ecef_to_ned(&self) -> RotationMatrix {
        self.ecef_to_ned
    }

    /// Maps ENU vectors at the origin into ECEF.
    #[must_use]
    #[doc(alias = "enu2ecef")]
    pub fn enu_to_ecef(&self) -> RotationMatrix {
        self.enu_to_ecef
    }

    /// Maps ECEF vectors into ENU at the origin.
    #[must_use]
    #[doc(alias = "ecef2enu")]
    pub fn ecef_to_enu(&self) -> RotationMatrix {
        self.ecef_to_enu
    }

    /// Swaps the first two axes and flips the third; the same everywhere on Earth.
    #[must_use]
    #[doc(alias = "enu2ned")]
    pub fn enu_to_ned() -> RotationMatrix {
        RotationMatrix::from_rows([[0., 1., 0.], [1., 0., 0.], [0., 0., -1.]])
    }

    /// The inverse of [`LocalFrame::enu_to_ned`], which happens to be the same matrix.
    #[must_use]
    #[doc(alias = "ned2enu")]
    pub fn ned_to_enu() -> RotationMatrix {
        Self::enu_to_ned()
    }

    /// Returns the position of `point` relative to the origin, in NED meters.
    #[must_use]
    pub fn ecef_to_ned_position(&self, point: &EcefPoint) -> Vector {
        let ned = self.ecef_to_ned.inner * (point.point() - self.origin_ecef.point());
        Vector::from([ned.x, ned.y, ned.z])
    }

    /// Returns the ECEF position of a point given in NED meters relative to the origin.
    ///
    /// Fails with [`Error::DimensionMismatch`](crate::Error::DimensionMismatch) unless `ned` has
    /// three components.
    pub fn ned_to_ecef_position(&self, ned: &Vector) -> Result<EcefPoint> {
        let ned = vector3(ned, "NED position")?;
        Ok(self.displaced(ned))
    }

    fn displaced(&self, ned: Vector3) -> EcefPoint {
        let point: Point3 = self.origin_ecef.point() + self.ned_to_ecef.inner * ned;
        EcefPoint::from_nalgebra_point(point)
    }

    /// Returns the location reached by moving `offset_x` forward and `offset_y` to the right
    /// within the local horizontal plane, for a body whose nose points along `heading`
    /// (clockwise from north).
    ///
    /// The displacement is along the tangent plane, so the result rises slightly above the
    /// origin's altitude as the offset grows.
    #[must_use]
    pub fn geo_offset(
        &self,
        heading: impl Into<Angle>,
        offset_x: impl Into<Length>,
        offset_y: impl Into<Length>,
    ) -> GeodeticPoint {
        let zero = Angle::new::<radian>(0.);
        let ned_to_body = EulerAngles::new(zero, zero, heading).to_rotation_matrix();
        let in_body = Vector3::new(
            offset_x.into().get::<meter>(),
            offset_y.into().get::<meter>(),
            0.,
        );
        let in_ned = ned_to_body.transpose().inner * in_body;
        self.ellipsoid.ecef_to_geodetic(&self.displaced(in_ned))
    }

    /// Re-expresses an ECEF-relative attitude relative to NED at the origin.
    #[must_use]
    pub fn ecef_to_ned_attitude<A: Attitude>(&self, attitude: &A) -> A {
        attitude.reexpressed(&self.ned_to_ecef)
    }

    /// Re-expresses a NED-relative attitude at the origin relative to ECEF.
    #[must_use]
    pub fn ned_to_ecef_attitude<A: Attitude>(&self, attitude: &A) -> A {
        attitude.reexpressed(&self.ecef_to_ned)
    }

    /// Re-expresses an ECEF-relative attitude relative to ENU at the origin.
    #[must_use]
    pub fn ecef_to_enu_attitude<A: Attitude>(&self, attitude: &A) -> A {
        attitude.reexpressed(&self.enu_to_ecef)
    }

    /// Re-expresses an ENU-relative attitude at the origin relative to ECEF.
    #[must_use]
    pub fn enu_to_ecef_attitude<A: Attitude>(&self, attitude: &A) -> A {
        attitude.reexpressed(&self.ecef_to_enu)
    }
}

/// The rotation whose columns are the north, east, and down unit vectors at the given location,
/// expressed in ECEF.
fn ned_to_ecef_at(latitude: Angle, longitude: Angle) -> RotationMatrix {
    let (sin_lat, cos_lat) = latitude.get::<radian>().sin_cos();
    let (sin_lon, cos_lon) = longitude.get::<radian>().sin_cos();

    #[rustfmt::skip]
    let m = Matrix3::new(
        -cos_lon * sin_lat, -sin_lon, -cos_lon * cos_lat,
        -sin_lon * sin_lat,  cos_lon, -sin_lon * cos_lat,
                   cos_lat,       0.,           -sin_lat,
    );
    RotationMatrix::from_nalgebra_matrix(m)
}
