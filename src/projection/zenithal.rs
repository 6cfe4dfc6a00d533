use crate::error::{ProjectionError, Result};
use crate::math::{Matrix3, Point2, SkyCoord, Vector3};

use super::{ProjectionCode, Wcs, WcsFactory};
use std::f64::consts::PI;

/// Native colatitudes closer than this to a projection's singular point are
/// rejected.
const DOMAIN_MARGIN: f64 = 1e-9;

/// A zenithal projection with north up and east to the left.
///
/// Sky directions are expressed in the local frame `(east, north, center)` of
/// the reference point; the native colatitude `theta` is the angle from the
/// center and the projected radius is `R(theta)`:
///
/// - `STG`: `2 tan(theta / 2)`
/// - `TAN`: `tan(theta)`
/// - `ZEA`: `2 sin(theta / 2)`
/// - `ARC`: `theta`
///
/// Pixel position: `x = crpix.x - xi / scale`, `y = crpix.y + eta / scale`.
#[derive(Debug, Clone)]
pub struct ZenithalWcs {
    code: ProjectionCode,
    crpix: Point2,
    center: SkyCoord,
    pixel_scale: f64,
    /// Columns are the east, north and center unit vectors.
    frame: Matrix3,
}

impl ZenithalWcs {
    /// Creates a new transform.
    ///
    /// # Arguments
    ///
    /// * `code` - Projection
    /// * `crpix` - Pixel position of `center`
    /// * `center` - Reference sky coordinate
    /// * `pixel_scale` - Radians per pixel at the reference point
    #[must_use]
    pub fn new(code: ProjectionCode, crpix: Point2, center: SkyCoord, pixel_scale: f64) -> Self {
        let c = center.to_vector();
        // the longitude tangent stays defined at the poles, unlike north x c
        let (sin_lon, cos_lon) = center.longitude().sin_cos();
        let east = Vector3::new(-sin_lon, cos_lon, 0.0);
        let north = c.cross(&east);
        Self {
            code,
            crpix,
            center,
            pixel_scale,
            frame: Matrix3::from_columns(&[east, north, c]),
        }
    }

    #[must_use]
    pub fn code(&self) -> ProjectionCode {
        self.code
    }

    #[must_use]
    pub fn crpix(&self) -> Point2 {
        self.crpix
    }

    fn radius(&self, theta: f64) -> Result<f64> {
        let out_of_domain = || ProjectionError::OutOfDomain {
            code: self.code.as_str(),
            theta,
        };
        match self.code {
            ProjectionCode::Stg if theta < PI - DOMAIN_MARGIN => Ok(2.0 * (0.5 * theta).tan()),
            ProjectionCode::Tan if theta < 0.5 * PI - DOMAIN_MARGIN => Ok(theta.tan()),
            ProjectionCode::Zea => Ok(2.0 * (0.5 * theta).sin()),
            ProjectionCode::Arc => Ok(theta),
            _ => Err(out_of_domain().into()),
        }
    }

    fn colatitude(&self, radius: f64) -> Result<f64> {
        let out_of_domain = || ProjectionError::RadiusOutOfDomain {
            code: self.code.as_str(),
            radius,
        };
        match self.code {
            ProjectionCode::Stg => Ok(2.0 * (0.5 * radius).atan()),
            ProjectionCode::Tan => Ok(radius.atan()),
            ProjectionCode::Zea if radius <= 2.0 => Ok(2.0 * (0.5 * radius).asin()),
            ProjectionCode::Arc if radius <= PI => Ok(radius),
            _ => Err(out_of_domain().into()),
        }
    }
}

impl Wcs for ZenithalWcs {
    fn sky_to_pixel(&self, coord: &SkyCoord) -> Result<Point2> {
        let local = self.frame.tr_mul(&coord.to_vector());
        let sin_theta = local.x.hypot(local.y);
        let theta = sin_theta.atan2(local.z);
        let r = self.radius(theta)?;
        let (xi, eta) = if sin_theta > 0.0 {
            (r * local.x / sin_theta, r * local.y / sin_theta)
        } else {
            (0.0, 0.0)
        };
        Ok(Point2::new(
            self.crpix.x - xi / self.pixel_scale,
            self.crpix.y + eta / self.pixel_scale,
        ))
    }

    fn pixel_to_sky(&self, pixel: &Point2) -> Result<SkyCoord> {
        let xi = (self.crpix.x - pixel.x) * self.pixel_scale;
        let eta = (pixel.y - self.crpix.y) * self.pixel_scale;
        let r = xi.hypot(eta);
        if r == 0.0 {
            return Ok(self.center);
        }
        let theta = self.colatitude(r)?;
        let (sin_theta, cos_theta) = theta.sin_cos();
        let local = Vector3::new(sin_theta * xi / r, sin_theta * eta / r, cos_theta);
        SkyCoord::from_vector(&(self.frame * local), Some(self.center.longitude()))
    }

    fn pixel_scale(&self) -> f64 {
        self.pixel_scale
    }

    fn center(&self) -> SkyCoord {
        self.center
    }
}

/// Builds [`ZenithalWcs`] transforms with a fixed projection and pixel scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZenithalWcsFactory {
    code: ProjectionCode,
    pixel_scale: f64,
}

impl ZenithalWcsFactory {
    /// Creates a factory; `pixel_scale` is in radians per pixel.
    #[must_use]
    pub fn new(code: ProjectionCode, pixel_scale: f64) -> Self {
        Self { code, pixel_scale }
    }
}

impl WcsFactory for ZenithalWcsFactory {
    fn make_wcs(&self, crpix: Point2, center: &SkyCoord) -> Result<Box<dyn Wcs>> {
        Ok(Box::new(ZenithalWcs::new(
            self.code,
            crpix,
            *center,
            self.pixel_scale,
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::arcsec_to_rad;
    use approx::assert_relative_eq;

    const CODES: [ProjectionCode; 4] = [
        ProjectionCode::Stg,
        ProjectionCode::Tan,
        ProjectionCode::Zea,
        ProjectionCode::Arc,
    ];

    fn wcs(code: ProjectionCode, lon: f64, lat: f64) -> ZenithalWcs {
        ZenithalWcs::new(
            code,
            Point2::new(100.0, 200.0),
            SkyCoord::from_degrees(lon, lat).unwrap(),
            arcsec_to_rad(1.0),
        )
    }

    #[test]
    fn center_maps_to_crpix() {
        for code in CODES {
            let w = wcs(code, 30.0, -20.0);
            let p = w.sky_to_pixel(&w.center()).unwrap();
            assert_relative_eq!(p.x, 100.0, epsilon = 1e-6);
            assert_relative_eq!(p.y, 200.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn roundtrip_off_center() {
        for code in CODES {
            for &(lon, lat) in &[(10.0, 0.0), (350.0, 89.0), (0.0, 90.0), (200.0, -90.0)] {
                let w = wcs(code, lon, lat);
                let target = SkyCoord::from_degrees(lon + 3.0, (lat - 4.0).max(-90.0)).unwrap();
                let p = w.sky_to_pixel(&target).unwrap();
                let back = w.pixel_to_sky(&p).unwrap();
                assert!(back.separation(&target) < 1e-11, "{code} at ({lon}, {lat})");
            }
        }
    }

    #[test]
    fn north_is_up_east_is_left() {
        let w = wcs(ProjectionCode::Stg, 45.0, 10.0);
        let north = w
            .sky_to_pixel(&SkyCoord::from_degrees(45.0, 10.1).unwrap())
            .unwrap();
        let east = w
            .sky_to_pixel(&SkyCoord::from_degrees(45.1, 10.0).unwrap())
            .unwrap();
        assert!(north.y > 200.0);
        assert_relative_eq!(north.x, 100.0, epsilon = 1e-6);
        assert!(east.x < 100.0);
    }

    #[test]
    fn pixel_scale_holds_near_center() {
        let w = wcs(ProjectionCode::Tan, 120.0, 45.0);
        let p = w.pixel_to_sky(&Point2::new(101.0, 200.0)).unwrap();
        assert_relative_eq!(
            p.separation(&w.center()),
            arcsec_to_rad(1.0),
            max_relative = 1e-9
        );
    }

    #[test]
    fn tan_rejects_far_hemisphere() {
        let w = wcs(ProjectionCode::Tan, 0.0, 0.0);
        let behind = SkyCoord::from_degrees(180.0, 0.0).unwrap();
        assert!(w.sky_to_pixel(&behind).is_err());
        let stg = wcs(ProjectionCode::Stg, 0.0, 0.0);
        assert!(stg.sky_to_pixel(&behind).is_err());
        assert!(stg
            .sky_to_pixel(&SkyCoord::from_degrees(120.0, 0.0).unwrap())
            .is_ok());
    }

    #[test]
    fn zea_rejects_radius_beyond_antipode() {
        let w = wcs(ProjectionCode::Zea, 0.0, 0.0);
        let far = Point2::new(100.0 - 2.5 / arcsec_to_rad(1.0), 200.0);
        assert!(w.pixel_to_sky(&far).is_err());
    }

    #[test]
    fn pole_projection_is_longitude_independent() {
        let w = wcs(ProjectionCode::Stg, 0.0, 60.0);
        let a = w
            .sky_to_pixel(&SkyCoord::from_degrees(0.0, 90.0).unwrap())
            .unwrap();
        let b = w
            .sky_to_pixel(&SkyCoord::from_degrees(321.0, 90.0).unwrap())
            .unwrap();
        assert_relative_eq!(a.x, b.x, epsilon = 1e-6);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-6);
    }

    #[test]
    fn factory_builds_with_crpix() {
        let f = ZenithalWcsFactory::new(ProjectionCode::Stg, arcsec_to_rad(0.2));
        let center = SkyCoord::from_degrees(10.0, 10.0).unwrap();
        let w = f.make_wcs(Point2::new(5.0, 6.0), &center).unwrap();
        let p = w.sky_to_pixel(&center).unwrap();
        assert_relative_eq!(p.x, 5.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, 6.0, epsilon = 1e-9);
        assert_relative_eq!(w.pixel_scale(), arcsec_to_rad(0.2));
    }
}
