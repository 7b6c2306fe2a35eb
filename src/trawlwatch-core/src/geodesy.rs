use crate::Point;
use geoutils::Location;

pub static METER_TO_NAUTICAL_MILES: f64 = 0.0005399568;

/// Great-circle distance between two points in nautical miles.
pub fn distance_nm(from: &Point, to: &Point) -> f64 {
    let from = Location::new(from.latitude, from.longitude);
    let to = Location::new(to.latitude, to.longitude);

    from.haversine_distance_to(&to).meters() * METER_TO_NAUTICAL_MILES
}
