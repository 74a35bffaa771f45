/// 1 meter = 3.28084 feet
pub const FEET_PER_METER: f64 = 3.280_839_895;

/// 1 m/s = 1.943844 knots
pub const KNOTS_PER_MPS: f64 = 1.943_844_492;

/// Length of one degree of latitude on the WGS-84 mean sphere, in meters.
pub const METERS_PER_DEGREE_LAT: f64 = 111_319.49;

/// Convert meters to feet.
pub fn meters_to_feet(meters: f64) -> f64 {
    meters * FEET_PER_METER
}

/// Convert feet to meters.
pub fn feet_to_meters(feet: f64) -> f64 {
    feet / FEET_PER_METER
}

/// Length of one degree of longitude at the given latitude, in meters.
pub fn meters_per_degree_lon(latitude_deg: f64) -> f64 {
    METERS_PER_DEGREE_LAT * latitude_deg.to_radians().cos()
}

/// Horizontal distance covered by a small `(Δlat, Δlon)` step at
/// `latitude_deg`, using the equirectangular approximation.
///
/// Only meant for the short spans between two position reports.
pub fn ground_distance_m(delta_lat_deg: f64, delta_lon_deg: f64, latitude_deg: f64) -> f64 {
    let north = delta_lat_deg * METERS_PER_DEGREE_LAT;
    let east = delta_lon_deg * meters_per_degree_lon(latitude_deg);
    (north * north + east * east).sqrt()
}

/// Convert meters per second to knots.
pub fn mps_to_knots(mps: f64) -> f64 {
    mps * KNOTS_PER_MPS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feet_meters_inverse() {
        let m = 123.456;
        assert!((feet_to_meters(meters_to_feet(m)) - m).abs() < 1e-9);
        assert!((meters_to_feet(100.0) - 328.0839895).abs() < 1e-6);
    }

    #[test]
    fn test_knots() {
        assert!((mps_to_knots(100.0) - 194.3844492).abs() < 1e-6);
    }

    #[test]
    fn test_longitude_shrinks_toward_poles() {
        assert!((meters_per_degree_lon(0.0) - METERS_PER_DEGREE_LAT).abs() < 1e-6);
        assert!(meters_per_degree_lon(60.0) < METERS_PER_DEGREE_LAT * 0.51);
        assert!(meters_per_degree_lon(90.0).abs() < 1e-6);
    }

    #[test]
    fn test_ground_distance_north_only() {
        let d = ground_distance_m(0.0001, 0.0, 40.0);
        assert!((d - 11.131949).abs() < 1e-4, "got {d}");
    }
}
