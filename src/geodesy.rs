//! Speed and approximate geodetic position from inertial state vectors.
//!
//! The longitude correction is a legacy heuristic: the inertial longitude is
//! rotated back by the Earth's rotation since 12:00 on the vector's own clock
//! and shifted by a fixed empirical offset. It is not a sidereal-time frame
//! transform and ignores the ellipsoid.

use chrono::Timelike;

use crate::ephemeris::StateVector;

pub const MEAN_EARTH_RADIUS_KM: f64 = 6371.0;
pub const EARTH_ROTATION_DEG_PER_HOUR: f64 = 360.0 / 24.0;
pub const REFERENCE_HOUR: f64 = 12.0;
pub const LONGITUDE_OFFSET_DEG: f64 = 19.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geodetic {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
}

/// Magnitude of a velocity vector, km/s.
pub fn speed(x_dot: f64, y_dot: f64, z_dot: f64) -> f64 {
    (x_dot * x_dot + y_dot * y_dot + z_dot * z_dot).sqrt()
}

pub fn geodetic(vector: &StateVector) -> Geodetic {
    let StateVector { x, y, z, .. } = *vector;

    let latitude_deg = z.atan2((x * x + y * y).sqrt()).to_degrees();

    let hours = vector.epoch.hour() as f64 + vector.epoch.minute() as f64 / 60.0;
    let longitude_deg = normalize_longitude(
        y.atan2(x).to_degrees() - (hours - REFERENCE_HOUR) * EARTH_ROTATION_DEG_PER_HOUR
            + LONGITUDE_OFFSET_DEG,
    );

    let altitude_km = (x * x + y * y + z * z).sqrt() - MEAN_EARTH_RADIUS_KM;

    Geodetic {
        latitude_deg,
        longitude_deg,
        altitude_km,
    }
}

/// Wrap into (-180, 180].
pub fn normalize_longitude(deg: f64) -> f64 {
    let wrapped = (deg + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}
