mod zenithal;

pub use zenithal::{ZenithalWcs, ZenithalWcsFactory};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result, SkyMapError};
use crate::math::{Point2, SkyCoord};

/// FITS sky projection codes understood by [`ZenithalWcsFactory`].
///
/// Only zenithal projections are bundled; parsing any other code, such as
/// `MOL`, fails with [`ConfigError::UnknownProjection`]. To tile the sky with
/// another projection, implement [`WcsFactory`] for it and pass it to
/// [`SkyMap::with_factory`](crate::SkyMap::with_factory).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProjectionCode {
    /// Stereographic.
    Stg,
    /// Gnomonic (tangent plane).
    Tan,
    /// Zenithal equal-area.
    Zea,
    /// Zenithal equidistant.
    Arc,
}

impl ProjectionCode {
    /// The FITS three-letter code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stg => "STG",
            Self::Tan => "TAN",
            Self::Zea => "ZEA",
            Self::Arc => "ARC",
        }
    }
}

impl fmt::Display for ProjectionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectionCode {
    type Err = SkyMapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STG" => Ok(Self::Stg),
            "TAN" => Ok(Self::Tan),
            "ZEA" => Ok(Self::Zea),
            "ARC" => Ok(Self::Arc),
            _ => Err(ConfigError::UnknownProjection(s.to_owned()).into()),
        }
    }
}

impl TryFrom<String> for ProjectionCode {
    type Error = SkyMapError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ProjectionCode> for String {
    fn from(code: ProjectionCode) -> Self {
        code.as_str().to_owned()
    }
}

/// A pixel <-> sky transform for one tract.
pub trait Wcs: fmt::Debug + Send + Sync {
    /// Maps a sky coordinate to a pixel position.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinate lies outside the projection's domain.
    fn sky_to_pixel(&self, coord: &SkyCoord) -> Result<Point2>;

    /// Maps a pixel position to a sky coordinate.
    ///
    /// # Errors
    ///
    /// Returns an error if the pixel lies outside the projection's domain.
    fn pixel_to_sky(&self, pixel: &Point2) -> Result<SkyCoord>;

    /// Pixel scale at the reference pixel, in radians per pixel.
    fn pixel_scale(&self) -> f64;

    /// Sky coordinate at the reference pixel.
    fn center(&self) -> SkyCoord;
}

/// Builds the transform for a tract.
pub trait WcsFactory: fmt::Debug + Send + Sync {
    /// Creates a transform that maps `center` to the pixel position `crpix`.
    ///
    /// # Errors
    ///
    /// Returns an error if no transform can be built for `center`.
    fn make_wcs(&self, crpix: Point2, center: &SkyCoord) -> Result<Box<dyn Wcs>>;
}
