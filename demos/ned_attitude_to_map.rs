use mcgeo::{EulerAngles, GeodeticPoint, LocalFrame, Mercator};
use uom::si::f64::{Angle, Length};
use uom::si::{angle::degree, length::meter};

fn main() {
    // where the aircraft is (eg, from GPS)
    let position = GeodeticPoint::new(
        Angle::new::<degree>(52.2),
        Angle::new::<degree>(20.9),
        Length::new::<meter>(1500.),
    )
    .expect("latitude is in [-90°, 90°]");

    // what the instruments say, relative to North-East-Down
    let attitude_ned = EulerAngles::new(
        Angle::new::<degree>(5.),  // roll
        Angle::new::<degree>(2.),  // pitch
        Angle::new::<degree>(70.), // yaw
    );

    // the NED frame depends on where on the globe we are
    let frame = LocalFrame::wgs84(position);
    let attitude_ecef = frame.ned_to_ecef_attitude(&attitude_ned);
    println!("attitude relative to NED:  {attitude_ned}");
    println!("attitude relative to ECEF: {attitude_ecef}");

    // and going back gives what the instruments said
    let back = frame.ecef_to_ned_attitude(&attitude_ecef);
    assert!((back.yaw().get::<degree>() - 70.).abs() < 1e-9);
    assert!((back.roll().get::<degree>() - 5.).abs() < 1e-9);

    // two kilometers ahead along the heading, half a kilometer to the left
    let ahead = frame.geo_offset(
        attitude_ned.yaw(),
        Length::new::<meter>(2000.),
        Length::new::<meter>(-500.),
    );
    println!("after the offset: {ahead}");

    // the horizontal displacement shows up in the local frame too
    let ned = frame.ecef_to_ned_position(&ahead.to_ecef());
    assert!(ned[0] > 0. && ned[1] > 0.);

    // and on the map
    let mercator = Mercator::wgs84();
    let here = mercator
        .geodetic_to_mercator(position.longitude(), position.latitude())
        .expect("well away from the poles");
    let there = mercator
        .geodetic_to_mercator(ahead.longitude(), ahead.latitude())
        .expect("well away from the poles");
    println!("on the map: {here} -> {there}");
    assert!(there.x > here.x);
    assert!(there.y > here.y);
}
