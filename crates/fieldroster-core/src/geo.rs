//! Great-circle distance and coordinate sanity checks shared by the import
//! pipeline and the search resolver.

use serde::{Deserialize, Serialize};

/// Earth radius in miles, matching the distance unit used everywhere in the
/// roster (service radii, search result distances).
pub const EARTH_RADIUS_MILES: f64 = 3_959.0;

/// Sentinel marking "coordinates unresolved". Stored as-is so unresolved
/// technicians survive an import without inventing a location.
pub const UNRESOLVED: Coordinate = Coordinate {
    latitude: 0.0,
    longitude: 0.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    #[must_use]
    pub fn is_unresolved(self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }
}

/// Haversine great-circle distance in miles.
#[must_use]
pub fn haversine_miles(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * h.sqrt().asin()
}

/// Coarse continental-US bounding box: latitude 18–72, longitude −180 to
/// −65. A deliberate sanity filter for imported coordinates, not a precise
/// US polygon — it spans Alaska, Hawaii, and Puerto Rico.
///
/// `(0, 0)` is always rejected so the unresolved sentinel can never pass as
/// a real location.
#[must_use]
pub fn plausible_us_coordinate(latitude: f64, longitude: f64) -> bool {
    if latitude == 0.0 && longitude == 0.0 {
        return false;
    }
    (18.0..=72.0).contains(&latitude) && (-180.0..=-65.0).contains(&longitude)
}
