use crate::error::{GeometryError, Result};
use crate::math::{wrap_two_pi, Vector3, POLE_EPSILON, TOLERANCE};
use std::f64::consts::FRAC_PI_2;

/// A point on the celestial sphere.
///
/// Stored as longitude in `[0, 2*pi)` and latitude in `[-pi/2, pi/2]`, both in
/// radians. The unit vector form is
/// `(cos(lat) * cos(lon), cos(lat) * sin(lon), sin(lat))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyCoord {
    lon: f64,
    lat: f64,
}

impl SkyCoord {
    /// Creates a coordinate from longitude and latitude in radians.
    ///
    /// The longitude is wrapped into `[0, 2*pi)`.
    ///
    /// # Errors
    ///
    /// Returns an error if either angle is non-finite or the latitude lies
    /// outside `[-pi/2, pi/2]`.
    pub fn new(lon: f64, lat: f64) -> Result<Self> {
        if !lon.is_finite() || !lat.is_finite() || lat.abs() > FRAC_PI_2 {
            return Err(GeometryError::InvalidCoordinate { lon, lat }.into());
        }
        Ok(Self {
            lon: wrap_two_pi(lon),
            lat,
        })
    }

    /// Creates a coordinate from longitude and latitude in degrees.
    ///
    /// # Errors
    ///
    /// See [`SkyCoord::new`].
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Result<Self> {
        // degree conversion can round just past the pole
        let lat = lat_deg.to_radians();
        let lat = if lat.abs() > FRAC_PI_2 && lat.abs() - FRAC_PI_2 < TOLERANCE {
            FRAC_PI_2.copysign(lat)
        } else {
            lat
        };
        Self::new(lon_deg.to_radians(), lat)
    }

    /// Converts a direction vector into a sky coordinate.
    ///
    /// At either pole the longitude cannot be recovered from the vector, so
    /// `default_lon` (radians) is used instead.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ZeroVector`] for a zero-length or non-finite
    /// vector and [`GeometryError::PoleAmbiguity`] for a polar vector when
    /// `default_lon` is `None`.
    pub fn from_vector(vec: &Vector3, default_lon: Option<f64>) -> Result<Self> {
        let len = vec.norm();
        if !len.is_finite() || len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let v = vec / len;

        if v.x.abs() < POLE_EPSILON && v.y.abs() < POLE_EPSILON {
            let lon = default_lon.ok_or(GeometryError::PoleAmbiguity)?;
            return Self::new(lon, FRAC_PI_2.copysign(v.z));
        }

        let lat = v.z.atan2(v.x.hypot(v.y));
        let lon = v.y.atan2(v.x);
        Self::new(lon, lat)
    }

    /// Returns the longitude in radians, in `[0, 2*pi)`.
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.lon
    }

    /// Returns the latitude in radians, in `[-pi/2, pi/2]`.
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.lat
    }

    /// Returns the unit vector pointing at this coordinate.
    #[must_use]
    pub fn to_vector(&self) -> Vector3 {
        let (sin_lat, cos_lat) = self.lat.sin_cos();
        let (sin_lon, cos_lon) = self.lon.sin_cos();
        Vector3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat)
    }

    /// Angular separation in radians.
    #[must_use]
    pub fn separation(&self, other: &SkyCoord) -> f64 {
        vector_separation(&self.to_vector(), &other.to_vector())
    }
}

/// Angle between two vectors in radians, `atan2(|a x b|, a . b)`.
///
/// Accurate for nearly parallel and antiparallel vectors, and defined at the
/// poles since no longitude is involved.
#[must_use]
pub fn vector_separation(a: &Vector3, b: &Vector3) -> f64 {
    a.cross(b).norm().atan2(a.dot(b))
}

/// Point a fraction `t` of the way along the shorter great circle from unit
/// vector `a` to unit vector `b`.
///
/// Returns `a` when the two coincide or are antipodal.
#[must_use]
pub fn great_circle_point(a: &Vector3, b: &Vector3, t: f64) -> Vector3 {
    let theta = vector_separation(a, b);
    let sin_theta = theta.sin();
    if sin_theta.abs() < TOLERANCE {
        return *a;
    }
    (a * ((1.0 - t) * theta).sin() + b * (t * theta).sin()) / sin_theta
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn vector_roundtrip() {
        for &(lon, lat) in &[
            (0.0, 0.0),
            (1.0, 0.5),
            (3.0, -1.2),
            (6.0, 1.5),
            (PI, -0.3),
        ] {
            let c = SkyCoord::new(lon, lat).unwrap();
            let back = SkyCoord::from_vector(&c.to_vector(), None).unwrap();
            assert_relative_eq!(back.longitude(), lon, epsilon = 1e-12);
            assert_relative_eq!(back.latitude(), lat, epsilon = 1e-12);
        }
    }

    #[test]
    fn pole_requires_default_longitude() {
        let err = SkyCoord::from_vector(&Vector3::z(), None).unwrap_err();
        assert_eq!(err, GeometryError::PoleAmbiguity.into());
        let err = SkyCoord::from_vector(&-Vector3::z(), None).unwrap_err();
        assert_eq!(err, GeometryError::PoleAmbiguity.into());
    }

    #[test]
    fn pole_uses_default_longitude() {
        let north = SkyCoord::from_vector(&Vector3::z(), Some(1.25)).unwrap();
        assert_relative_eq!(north.latitude(), FRAC_PI_2);
        assert_relative_eq!(north.longitude(), 1.25);

        let south = SkyCoord::from_vector(&Vector3::new(0.0, 0.0, -3.0), Some(-1.0)).unwrap();
        assert_relative_eq!(south.latitude(), -FRAC_PI_2);
        assert_relative_eq!(south.longitude(), 2.0 * PI - 1.0);
    }

    #[test]
    fn near_pole_but_resolvable() {
        let v = Vector3::new(1e-9, 0.0, 1.0);
        let c = SkyCoord::from_vector(&v, None).unwrap();
        assert_relative_eq!(c.longitude(), 0.0);
        assert!(c.latitude() < FRAC_PI_2);
    }

    #[test]
    fn zero_vector_rejected() {
        let err = SkyCoord::from_vector(&Vector3::zeros(), Some(0.0)).unwrap_err();
        assert_eq!(err, GeometryError::ZeroVector.into());
    }

    #[test]
    fn invalid_latitude_rejected() {
        assert!(SkyCoord::new(0.0, 1.6).is_err());
        assert!(SkyCoord::new(f64::NAN, 0.0).is_err());
        assert!(SkyCoord::from_degrees(10.0, 90.0).is_ok());
    }

    #[test]
    fn separation_is_stable_at_poles() {
        let a = SkyCoord::from_degrees(0.0, 90.0).unwrap();
        let b = SkyCoord::from_degrees(123.0, 90.0).unwrap();
        assert!(a.separation(&b) < 1e-15);

        let c = SkyCoord::from_degrees(45.0, 89.0).unwrap();
        assert_relative_eq!(a.separation(&c), 1f64.to_radians(), epsilon = 1e-12);
    }

    #[test]
    fn near_pole_degrees_are_not_snapped() {
        let c = SkyCoord::from_degrees(0.0, 89.999_999_999_9).unwrap();
        assert!(c.latitude() < FRAC_PI_2);
        let c = SkyCoord::from_degrees(0.0, -89.999_999_999_9).unwrap();
        assert!(c.latitude() > -FRAC_PI_2);
        assert_eq!(SkyCoord::from_degrees(0.0, 90.0).unwrap().latitude(), FRAC_PI_2);
        assert_eq!(SkyCoord::from_degrees(0.0, -90.0).unwrap().latitude(), -FRAC_PI_2);
        assert!(SkyCoord::from_degrees(0.0, 90.001).is_err());
    }

    #[test]
    fn great_circle_midpoint() {
        let a = SkyCoord::from_degrees(10.0, 0.0).unwrap().to_vector();
        let b = SkyCoord::from_degrees(50.0, 0.0).unwrap().to_vector();
        let mid = SkyCoord::from_vector(&great_circle_point(&a, &b, 0.5), None).unwrap();
        assert_relative_eq!(mid.longitude(), 30f64.to_radians(), epsilon = 1e-12);
        assert_relative_eq!(mid.latitude(), 0.0, epsilon = 1e-12);
        let end = great_circle_point(&a, &b, 1.0);
        assert_relative_eq!((end - b).norm(), 0.0, epsilon = 1e-12);
        assert_eq!(great_circle_point(&a, &a, 0.3), a);
    }

    #[test]
    fn separation_antipodal() {
        let a = SkyCoord::from_degrees(10.0, 20.0).unwrap();
        let b = SkyCoord::from_degrees(190.0, -20.0).unwrap();
        assert_relative_eq!(a.separation(&b), PI, epsilon = 1e-12);
    }
}
