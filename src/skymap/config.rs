use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{ConfigError, Result, VersionError};
use crate::math::arcsec_to_rad;
use crate::projection::ProjectionCode;
use std::f64::consts::TAU;

/// Schema version written by [`PersistedSkyMap`].
pub const CURRENT_VERSION: (u32, u32) = (1, 0);

/// Default inner patch size in pixels.
pub const DEFAULT_PATCH_INNER_DIMENSIONS: [i64; 2] = [4000, 4000];

/// Default patch border in pixels (about 50 arcseconds).
pub const DEFAULT_PATCH_BORDER: i64 = 250;

/// Default tract overlap in degrees, roughly one field of view.
pub const DEFAULT_TRACT_OVERLAP_DEG: f64 = 3.5;

/// Default pixel scale in arcseconds per pixel.
pub const DEFAULT_PIXEL_SCALE_ARCSEC: f64 = 0.2;

/// Which tessellation a sky map uses, with its own parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Tessellation {
    /// Twelve tracts on the faces of a dodecahedron.
    Dodeca {
        /// Center a tract on each pole rather than a vertex.
        with_tracts_on_poles: bool,
    },
    /// Polar caps plus declination rings.
    Rings {
        /// Number of rings between the caps.
        num_rings: i64,
        /// Right ascension of the first tract in each ring, radians.
        ra_start: f64,
    },
}

/// Everything that determines a sky map's tracts and patches.
///
/// Angles are in radians; the pixel scale is radians per pixel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyMapConfig {
    pub patch_inner_dimensions: [i64; 2],
    pub patch_border: i64,
    pub tract_overlap: f64,
    pub pixel_scale: f64,
    pub projection: ProjectionCode,
    pub tessellation: Tessellation,
}

impl Default for SkyMapConfig {
    fn default() -> Self {
        Self {
            patch_inner_dimensions: DEFAULT_PATCH_INNER_DIMENSIONS,
            patch_border: DEFAULT_PATCH_BORDER,
            tract_overlap: DEFAULT_TRACT_OVERLAP_DEG.to_radians(),
            pixel_scale: arcsec_to_rad(DEFAULT_PIXEL_SCALE_ARCSEC),
            projection: ProjectionCode::Stg,
            tessellation: Tessellation::Dodeca {
                with_tracts_on_poles: false,
            },
        }
    }
}

impl SkyMapConfig {
    /// Default dodecahedron configuration.
    #[must_use]
    pub fn dodeca(with_tracts_on_poles: bool) -> Self {
        Self {
            tessellation: Tessellation::Dodeca {
                with_tracts_on_poles,
            },
            ..Self::default()
        }
    }

    /// Default ring configuration; `ra_start` is in radians.
    #[must_use]
    pub fn rings(num_rings: i64, ra_start: f64) -> Self {
        Self {
            tessellation: Tessellation::Rings {
                num_rings,
                ra_start,
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_patch_inner_dimensions(mut self, width: i64, height: i64) -> Self {
        self.patch_inner_dimensions = [width, height];
        self
    }

    #[must_use]
    pub fn with_patch_border(mut self, border: i64) -> Self {
        self.patch_border = border;
        self
    }

    /// Sets the tract overlap, in radians.
    #[must_use]
    pub fn with_tract_overlap(mut self, overlap: f64) -> Self {
        self.tract_overlap = overlap;
        self
    }

    /// Sets the pixel scale, in radians per pixel.
    #[must_use]
    pub fn with_pixel_scale(mut self, scale: f64) -> Self {
        self.pixel_scale = scale;
        self
    }

    #[must_use]
    pub fn with_projection(mut self, projection: ProjectionCode) -> Self {
        self.projection = projection;
        self
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        let [width, height] = self.patch_inner_dimensions;
        if width <= 0 {
            return Err(ConfigError::NonPositiveDimension {
                name: "patch inner width",
                value: width,
            }
            .into());
        }
        if height <= 0 {
            return Err(ConfigError::NonPositiveDimension {
                name: "patch inner height",
                value: height,
            }
            .into());
        }
        if self.patch_border < 0 {
            return Err(ConfigError::NegativeBorder(self.patch_border).into());
        }
        if !self.tract_overlap.is_finite() || !(0.0..TAU).contains(&self.tract_overlap) {
            return Err(ConfigError::InvalidAngle {
                name: "tract overlap",
                value: self.tract_overlap,
            }
            .into());
        }
        if !self.pixel_scale.is_finite() || self.pixel_scale <= 0.0 {
            return Err(ConfigError::InvalidAngle {
                name: "pixel scale",
                value: self.pixel_scale,
            }
            .into());
        }
        if let Tessellation::Rings {
            num_rings,
            ra_start,
        } = self.tessellation
        {
            if num_rings <= 0 {
                return Err(ConfigError::InvalidRingCount(num_rings).into());
            }
            if !(0.0..TAU).contains(&ra_start) {
                return Err(ConfigError::InvalidAngle {
                    name: "ring ra start",
                    value: ra_start,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Same configuration with `-0.0` angles replaced by `0.0`, so that equal
    /// configurations serialize identically.
    #[must_use]
    pub(crate) fn canonical(&self) -> Self {
        let mut out = self.clone();
        out.tract_overlap += 0.0;
        out.pixel_scale += 0.0;
        if let Tessellation::Rings { ra_start, .. } = &mut out.tessellation {
            *ra_start += 0.0;
        }
        out
    }

    /// SHA-256 over the canonical JSON of the persisted form, hex encoded.
    ///
    /// Two configurations get the same fingerprint exactly when every field,
    /// strategy parameters included, is equal.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Malformed`] if the configuration cannot be
    /// serialized.
    pub fn fingerprint(&self) -> Result<String> {
        let json = serde_json::to_string(&PersistedSkyMap::new(self.canonical()))
            .map_err(|e| ConfigError::Malformed(e.to_string()))?;
        let mut hasher = Sha256::new();
        hasher.update(b"skymap-config\0");
        hasher.update(json.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Versioned on-disk form of a [`SkyMapConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSkyMap {
    pub version: (u32, u32),
    #[serde(flatten)]
    pub config: SkyMapConfig,
}

impl PersistedSkyMap {
    /// Wraps `config` at [`CURRENT_VERSION`].
    #[must_use]
    pub fn new(config: SkyMapConfig) -> Self {
        Self {
            version: CURRENT_VERSION,
            config,
        }
    }

    /// Serializes to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Malformed`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Malformed(e.to_string()).into())
    }

    /// Parses JSON written by any readable version, upgrading it first.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::Unsupported`] for an unreadable version and
    /// [`ConfigError`] for malformed or invalid contents.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        let version = read_version(&value)?;
        let value = upgrade(version, value)?;
        let persisted: Self =
            serde_json::from_value(value).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        persisted.config.validate()?;
        Ok(persisted)
    }
}

fn read_version(value: &Value) -> Result<(u32, u32)> {
    let malformed = || ConfigError::Malformed("missing or invalid version".to_owned());
    let parts = value
        .get("version")
        .and_then(Value::as_array)
        .ok_or_else(malformed)?;
    let part = |i: usize| {
        parts
            .get(i)
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(malformed)
    };
    if parts.len() != 2 {
        return Err(malformed().into());
    }
    Ok((part(0)?, part(1)?))
}

/// Brings a persisted document from `version` up to [`CURRENT_VERSION`].
///
/// Every 1.x document already has the current layout.
fn upgrade(version: (u32, u32), mut value: Value) -> Result<Value> {
    match version.0 {
        1 => {
            if let Some(obj) = value.as_object_mut() {
                obj.insert(
                    "version".to_owned(),
                    serde_json::json!([CURRENT_VERSION.0, CURRENT_VERSION.1]),
                );
            }
            Ok(value)
        }
        major => Err(VersionError::Unsupported {
            major,
            minor: version.1,
            max_major: CURRENT_VERSION.0,
        }
        .into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::SkyMapError;

    #[test]
    fn default_is_valid_dodeca() {
        let c = SkyMapConfig::default();
        c.validate().unwrap();
        assert_eq!(
            c.tessellation,
            Tessellation::Dodeca {
                with_tracts_on_poles: false
            }
        );
        assert_eq!(c.patch_inner_dimensions, [4000, 4000]);
    }

    #[test]
    fn rejects_bad_dimensions_and_border() {
        let err = SkyMapConfig::default()
            .with_patch_inner_dimensions(0, 100)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            SkyMapError::Config(ConfigError::NonPositiveDimension { value: 0, .. })
        ));
        let err = SkyMapConfig::default()
            .with_patch_border(-1)
            .validate()
            .unwrap_err();
        assert_eq!(err, ConfigError::NegativeBorder(-1).into());
        assert!(SkyMapConfig::default().with_patch_border(0).validate().is_ok());
    }

    #[test]
    fn rejects_bad_angles_and_rings() {
        assert!(SkyMapConfig::default()
            .with_pixel_scale(0.0)
            .validate()
            .is_err());
        assert!(SkyMapConfig::default()
            .with_tract_overlap(f64::NAN)
            .validate()
            .is_err());
        assert_eq!(
            SkyMapConfig::rings(0, 0.0).validate().unwrap_err(),
            ConfigError::InvalidRingCount(0).into()
        );
        assert!(SkyMapConfig::rings(3, TAU).validate().is_err());
        assert!(SkyMapConfig::rings(3, 1.0).validate().is_ok());
    }

    #[test]
    fn json_roundtrip() {
        let c = SkyMapConfig::rings(5, 0.25).with_projection(ProjectionCode::Tan);
        let json = PersistedSkyMap::new(c.clone()).to_json().unwrap();
        assert!(json.contains("\"kind\": \"rings\""));
        assert!(json.contains("\"projection\": \"TAN\""));
        let back = PersistedSkyMap::from_json(&json).unwrap();
        assert_eq!(back.version, CURRENT_VERSION);
        assert_eq!(back.config, c);
    }

    #[test]
    fn newer_major_version_is_rejected() {
        let mut value = serde_json::to_value(PersistedSkyMap::new(SkyMapConfig::default())).unwrap();
        value["version"] = serde_json::json!([2, 0]);
        let err = PersistedSkyMap::from_json(&value.to_string()).unwrap_err();
        assert_eq!(
            err,
            VersionError::Unsupported {
                major: 2,
                minor: 0,
                max_major: 1
            }
            .into()
        );
    }

    #[test]
    fn later_minor_version_is_upgraded() {
        let mut value = serde_json::to_value(PersistedSkyMap::new(SkyMapConfig::default())).unwrap();
        value["version"] = serde_json::json!([1, 3]);
        let back = PersistedSkyMap::from_json(&value.to_string()).unwrap();
        assert_eq!(back.version, CURRENT_VERSION);
    }

    #[test]
    fn malformed_documents() {
        assert!(matches!(
            PersistedSkyMap::from_json("{}").unwrap_err(),
            SkyMapError::Config(ConfigError::Malformed(_))
        ));
        let mut value = serde_json::to_value(PersistedSkyMap::new(SkyMapConfig::default())).unwrap();
        value["projection"] = serde_json::json!("MOL");
        assert!(PersistedSkyMap::from_json(&value.to_string()).is_err());
        value["projection"] = serde_json::json!("STG");
        value["patch_border"] = serde_json::json!(-5);
        assert_eq!(
            PersistedSkyMap::from_json(&value.to_string()).unwrap_err(),
            ConfigError::NegativeBorder(-5).into()
        );
    }

    #[test]
    fn fingerprint_tracks_every_field() {
        let base = SkyMapConfig::default();
        let fp = base.fingerprint().unwrap();
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(fp, SkyMapConfig::default().fingerprint().unwrap());

        let variants = [
            base.clone().with_patch_inner_dimensions(4000, 4001),
            base.clone().with_patch_border(251),
            base.clone().with_tract_overlap(base.tract_overlap * 1.000_001),
            base.clone().with_pixel_scale(base.pixel_scale * 2.0),
            base.clone().with_projection(ProjectionCode::Tan),
            SkyMapConfig::dodeca(true),
            SkyMapConfig::rings(3, 0.0),
        ];
        for v in &variants {
            assert_ne!(v.fingerprint().unwrap(), fp, "{v:?}");
        }
        assert_ne!(
            SkyMapConfig::rings(3, 0.0).fingerprint().unwrap(),
            SkyMapConfig::rings(4, 0.0).fingerprint().unwrap()
        );
        assert_ne!(
            SkyMapConfig::rings(3, 0.0).fingerprint().unwrap(),
            SkyMapConfig::rings(3, 1.0).fingerprint().unwrap()
        );
    }

    #[test]
    fn negative_zero_is_canonical() {
        assert_eq!(
            SkyMapConfig::rings(3, -0.0).fingerprint().unwrap(),
            SkyMapConfig::rings(3, 0.0).fingerprint().unwrap()
        );
    }
}
