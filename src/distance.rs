//! Great-circle distance on a spherical Earth.

use crate::models::Coordinate;

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers per international foot (rounded)
pub const FEET_TO_KM: f64 = 0.000189394;

/// Haversine distance between two coordinates in kilometers.
///
/// Symmetric, zero for coincident points, and safe for antipodal points:
/// `a` is clamped to [0, 1] so rounding never feeds a negative value to `sqrt`.
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlat = (to.lat - from.lat).to_radians();
    let dlon = (to.lon - from.lon).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Convert a distance in feet to kilometers
pub fn feet_to_km(feet: f64) -> f64 {
    feet * FEET_TO_KM
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_one_degree_of_longitude_at_equator() {
        let d = haversine_km(c(0.0, 0.0), c(0.0, 1.0));
        assert!((d - 111.19).abs() < 0.01, "got {}", d);
    }

    #[test]
    fn test_zero_for_same_point() {
        for p in [c(0.0, 0.0), c(42.06, -87.70), c(-90.0, 180.0)] {
            assert!(haversine_km(p, p).abs() < 1e-9);
        }
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            (c(40.7128, -74.0060), c(34.0522, -118.2437)),
            (c(-33.86, 151.21), c(51.5074, -0.1278)),
            (c(89.9, 10.0), c(-89.9, -170.0)),
        ];
        for (a, b) in pairs {
            assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_antipodal_points() {
        let d = haversine_km(c(0.0, 0.0), c(0.0, 180.0));
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!(d.is_finite());
        assert!((d - half_circumference).abs() < 1e-6);

        let poles = haversine_km(c(90.0, 0.0), c(-90.0, 0.0));
        assert!((poles - half_circumference).abs() < 1e-6);
    }

    #[test]
    fn test_nyc_to_la() {
        // Distance from NYC to LA is approximately 3,936 km
        let d = haversine_km(c(40.7128, -74.0060), c(34.0522, -118.2437));
        assert!((d - 3936.0).abs() < 50.0);
    }

    #[test]
    fn test_feet_to_km() {
        let km = feet_to_km(500.0);
        assert!((km - 0.094697).abs() < 1e-6);
        assert_eq!(feet_to_km(0.0), 0.0);
    }
}
