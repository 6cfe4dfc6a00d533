pub mod sky_coord;

pub use sky_coord::SkyCoord;

/// 2D point type (pixel positions).
pub type Point2 = nalgebra::Point2<f64>;

/// 3D vector type (directions on the unit sphere).
pub type Vector3 = nalgebra::Vector3<f64>;

/// 3x3 matrix (rotations and local frames).
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Equatorial components below this magnitude put a unit vector on a pole.
pub const POLE_EPSILON: f64 = 1e-15;

/// Number of arcseconds in one radian.
pub const ARCSEC_PER_RADIAN: f64 = 180.0 * 3600.0 / std::f64::consts::PI;

/// Wraps an angle in radians into `[0, 2*pi)`.
#[must_use]
pub fn wrap_two_pi(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(std::f64::consts::TAU);
    // rem_euclid rounds tiny negative inputs up to exactly TAU
    if wrapped >= std::f64::consts::TAU {
        0.0
    } else {
        wrapped
    }
}

/// Converts arcseconds to radians.
#[must_use]
pub fn arcsec_to_rad(arcsec: f64) -> f64 {
    arcsec / ARCSEC_PER_RADIAN
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{PI, TAU};

    #[test]
    fn wrap_keeps_range() {
        assert_relative_eq!(wrap_two_pi(-PI), PI);
        assert_relative_eq!(wrap_two_pi(TAU + 1.0), 1.0, epsilon = 1e-12);
        assert!(wrap_two_pi(-1e-18) < TAU);
        assert_eq!(wrap_two_pi(0.0), 0.0);
    }

    #[test]
    fn arcsec_conversion() {
        assert_relative_eq!(arcsec_to_rad(3600.0), 1f64.to_radians(), epsilon = 1e-15);
    }
}
