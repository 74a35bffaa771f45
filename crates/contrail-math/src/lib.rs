//! Vector, angle, and unit helpers shared by the Contrail tracking crates.

mod angle;
mod units;
mod vector;

pub use angle::{normalize_heading, normalize_signed, shortest_angle_delta};
pub use units::{
    FEET_PER_METER, KNOTS_PER_MPS, METERS_PER_DEGREE_LAT, feet_to_meters, ground_distance_m,
    meters_per_degree_lon, meters_to_feet, mps_to_knots,
};
pub use vector::Vector3;
