//! Angle wrapping in degrees.

/// Wrap a heading into `[0, 360)`.
pub fn normalize_heading(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Wrap an angle into `(-180, 180]`. Used for pitch and bank.
pub fn normalize_signed(degrees: f64) -> f64 {
    let wrapped = normalize_heading(degrees);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Signed difference `to - from` along the shorter arc, in `(-180, 180]`.
///
/// `shortest_angle_delta(350.0, 10.0)` is `+20`, not `-340`.
pub fn shortest_angle_delta(from: f64, to: f64) -> f64 {
    normalize_signed(to - from)
}
