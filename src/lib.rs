//! Spatial math for vehicle guidance and control simulation: small linear algebra, attitude
//! representations, and transforms between geodetic, Earth-Centered Earth-Fixed (ECEF), local
//! North-East-Down / East-North-Up, and Mercator coordinates.
//!
//! The building blocks are dynamically sized [`Vector`] and [`Matrix`] values, whose operations
//! check dimensions and return [`Error::DimensionMismatch`] rather than panicking. Attitude can be
//! held as [`EulerAngles`], a [`RotationMatrix`], or a unit [`Quaternion`], and converted freely
//! between the three. All of them describe the rotation from a reference frame into a body frame:
//! the rotation matrix of a set of Euler angles maps reference-frame vectors into the body frame.
//!
//! Positions on Earth are [`GeodeticPoint`]s (latitude, longitude, altitude above an
//! [`Ellipsoid`], by default [`WGS84`]) or [`EcefPoint`]s. A [`LocalFrame`] anchored at a point
//! provides the rotations into and out of the local NED and ENU frames there, and re-expresses
//! attitudes relative to them. [`Mercator`] projects onto and back from the Mercator plane.
//!
//! For rigid-body dynamics, an [`InertiaTensor`] can be built for simple shapes and moved to
//! another reference point with the parallel axis theorem.
//!
//! Angles and lengths crossing the API are [`uom`] quantities, so degrees and radians cannot be
//! mixed up silently.
//!
//! # Examples
//!
//! An aircraft over the English Channel reports its attitude relative to North-East-Down; we want
//! it relative to ECEF, and want to know where it ends up after flying a nautical mile ahead.
//!
//! ```
//! use mcgeo::{EulerAngles, GeodeticPoint, LocalFrame, Quaternion};
//! use uom::si::f64::{Angle, Length};
//! use uom::si::{angle::degree, length::meter};
//!
//! let position = GeodeticPoint::new(
//!     Angle::new::<degree>(50.5),
//!     Angle::new::<degree>(0.5),
//!     Length::new::<meter>(3000.),
//! )
//! .expect("latitude is in [-90°, 90°]");
//!
//! // level flight, heading 45°
//! let attitude_ned = EulerAngles::new(
//!     Angle::new::<degree>(0.),
//!     Angle::new::<degree>(0.),
//!     Angle::new::<degree>(45.),
//! );
//!
//! let frame = LocalFrame::wgs84(position);
//! let attitude_ecef = frame.ned_to_ecef_attitude(&attitude_ned);
//!
//! // going through quaternions gives the same rotation
//! let q_ecef = frame.ned_to_ecef_attitude(&Quaternion::from_euler_angles(&attitude_ned));
//! let same = attitude_ecef.to_rotation_matrix();
//! let also = q_ecef.to_rotation_matrix();
//! for row in 0..3 {
//!     for col in 0..3 {
//!         assert!((same.get(row, col).unwrap() - also.get(row, col).unwrap()).abs() < 1e-9);
//!     }
//! }
//!
//! // and back again
//! let back = frame.ecef_to_ned_attitude(&attitude_ecef);
//! assert!((back.yaw().get::<degree>() - 45.).abs() < 1e-9);
//!
//! // one nautical mile ahead along the heading moves us north-east
//! let ahead = frame.geo_offset(
//!     Angle::new::<degree>(45.),
//!     Length::new::<meter>(1852.),
//!     Length::new::<meter>(0.),
//! );
//! assert!(ahead.latitude() > position.latitude());
//! assert!(ahead.longitude() > position.longitude());
//! ```
//!
//! Linear algebra reports shape problems as errors:
//!
//! ```
//! use mcgeo::{Error, Matrix, Vector};
//!
//! let a = Matrix::from_rows(&[[2., 1.], [1., 3.]]).unwrap();
//! let x = a.solve(&Vector::from([3., 4.])).unwrap();
//! assert!((x[0] - 1.).abs() < 1e-12 && (x[1] - 1.).abs() < 1e-12);
//!
//! assert!(matches!(
//!     Vector::from([1., 2.]).cross(&Vector::from([3., 4.])),
//!     Err(Error::DimensionMismatch { .. })
//! ));
//! ```
//!
//! # Features
//!
//! - `serde` (default): (de)serialization of all value types, with parameter validation for
//!   [`Ellipsoid`].
//! - `approx` (default): [`approx`](https://docs.rs/approx) comparisons for all value types.
//!
//! The crate logs through the [`log`](https://docs.rs/log) facade: at `debug` when an iterative
//! inversion hits its iteration cap or a linear system turns out singular, and at `trace` with
//! iteration counts. It never installs a logger itself.

mod angles;
mod ellipsoid;
mod error;
mod geodetic;
mod inertia;
mod local_frame;
mod matrices;
mod mercator;
mod quaternions;
mod rotations;
mod util;
mod vectors;

pub(crate) type DVector = nalgebra::DVector<f64>;
pub(crate) type DMatrix = nalgebra::DMatrix<f64>;
pub(crate) type Matrix3 = nalgebra::Matrix3<f64>;
pub(crate) type Vector3 = nalgebra::Vector3<f64>;
pub(crate) type Point3 = nalgebra::Point3<f64>;
pub(crate) type UnitQuaternion = nalgebra::UnitQuaternion<f64>;

pub use angles::{DegMinSec, EulerAngles};
pub use ellipsoid::{Ellipsoid, EllipsoidParameters, WGS84};
pub use error::{Error, Result};
pub use geodetic::{Components, EcefPoint, GeodeticPoint};
pub use inertia::{first_order_lag, InertiaTensor};
pub use local_frame::{Attitude, LocalFrame};
pub use matrices::{Matrix, DEFAULT_PIVOT_EPSILON};
pub use mercator::{Mercator, MercatorConfig, MercatorPoint};
pub use quaternions::Quaternion;
pub use rotations::RotationMatrix;
pub use vectors::Vector;
