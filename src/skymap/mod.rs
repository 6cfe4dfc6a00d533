mod config;

pub use config::{
    PersistedSkyMap, SkyMapConfig, Tessellation, CURRENT_VERSION, DEFAULT_PATCH_BORDER,
    DEFAULT_PATCH_INNER_DIMENSIONS, DEFAULT_PIXEL_SCALE_ARCSEC, DEFAULT_TRACT_OVERLAP_DEG,
};

use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::ops::Index;

use tracing::{info, trace};

use crate::error::{ConfigError, LookupError, Result, SkyMapError, VersionError};
use crate::math::SkyCoord;
use crate::projection::{WcsFactory, ZenithalWcsFactory};
use crate::tessellation::{
    build_tracts, DodecaTessellator, PatchInfo, RingsTessellator, Tessellator, TractInfo,
};

/// A complete tessellation of the sky into tracts, each split into patches.
///
/// Built once from a [`SkyMapConfig`] and immutable afterwards, so it can be
/// shared between threads. Two sky maps are equal exactly when their
/// configurations are.
///
/// # Examples
///
/// ```
/// use skymap::{SkyCoord, SkyMap, SkyMapConfig};
///
/// let map = SkyMap::new(SkyMapConfig::default()).unwrap();
/// assert_eq!(map.len(), 12);
///
/// let pole = SkyCoord::from_degrees(0.0, 90.0).unwrap();
/// let ids: Vec<usize> = map.find_all_tracts(&pole).iter().map(|t| t.id()).collect();
/// assert_eq!(ids, [0, 4, 6]);
/// ```
#[derive(Debug)]
pub struct SkyMap {
    config: SkyMapConfig,
    tessellator: Box<dyn Tessellator>,
    tracts: Vec<TractInfo>,
    fingerprint: String,
}

impl SkyMap {
    /// Builds a sky map with the zenithal projection named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an invalid configuration and any error
    /// raised while building a tract.
    pub fn new(config: SkyMapConfig) -> Result<Self> {
        let factory = ZenithalWcsFactory::new(config.projection, config.pixel_scale);
        Self::with_factory(config, &factory)
    }

    /// Builds a sky map whose tracts take their transforms from `factory`.
    ///
    /// The factory must honor the configured pixel scale; the configuration's
    /// projection code is then only recorded.
    ///
    /// # Errors
    ///
    /// Same as [`SkyMap::new`].
    pub fn with_factory(config: SkyMapConfig, factory: &dyn WcsFactory) -> Result<Self> {
        config.validate()?;
        let config = config.canonical();
        let tessellator = make_tessellator(&config)?;
        let tracts = build_tracts(
            tessellator.as_ref(),
            config.tract_overlap,
            config.patch_inner_dimensions,
            config.patch_border,
            factory,
        )?;
        let fingerprint = config.fingerprint()?;
        info!(
            tracts = tracts.len(),
            projection = %config.projection,
            fingerprint = %fingerprint,
            "built sky map"
        );
        Ok(Self {
            config,
            tessellator,
            tracts,
            fingerprint,
        })
    }

    /// Reads a persisted sky map and rebuilds it.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError`] for an unreadable version and
    /// [`ConfigError`] for malformed contents.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_persisted(PersistedSkyMap::from_json(json)?)
    }

    /// Rebuilds a sky map from its persisted form.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError`] if `persisted` was written by an
    /// unreadable version, otherwise as [`SkyMap::new`].
    pub fn from_persisted(persisted: PersistedSkyMap) -> Result<Self> {
        if persisted.version.0 != CURRENT_VERSION.0 {
            return Err(VersionError::Unsupported {
                major: persisted.version.0,
                minor: persisted.version.1,
                max_major: CURRENT_VERSION.0,
            }
            .into());
        }
        Self::new(persisted.config)
    }

    /// Writes the configuration at [`CURRENT_VERSION`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Malformed`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        self.to_persisted().to_json()
    }

    #[must_use]
    pub fn to_persisted(&self) -> PersistedSkyMap {
        PersistedSkyMap::new(self.config.clone())
    }

    #[must_use]
    pub fn config(&self) -> &SkyMapConfig {
        &self.config
    }

    #[must_use]
    pub fn tessellator(&self) -> &dyn Tessellator {
        self.tessellator.as_ref()
    }

    /// Hex SHA-256 digest identifying the configuration.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracts.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: usize) -> Option<&TractInfo> {
        self.tracts.get(id)
    }

    /// Tracts in id order.
    pub fn iter(&self) -> std::slice::Iter<'_, TractInfo> {
        self.tracts.iter()
    }

    /// The tract whose inner region owns `coord`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NoCoveringTract`] if the tessellation names no
    /// tract, which only happens for non-finite input.
    pub fn find_tract(&self, coord: &SkyCoord) -> Result<&TractInfo> {
        let tract = self
            .tessellator
            .find_tract_id(coord)
            .and_then(|id| self.tracts.get(id))
            .ok_or_else(|| {
                SkyMapError::from(LookupError::NoCoveringTract {
                    lon: coord.longitude(),
                    lat: coord.latitude(),
                })
            })?;
        trace!(
            lon_deg = coord.longitude().to_degrees(),
            lat_deg = coord.latitude().to_degrees(),
            tract = tract.id(),
            "find_tract"
        );
        Ok(tract)
    }

    /// Every tract whose pixel box contains `coord`, in id order.
    #[must_use]
    pub fn find_all_tracts(&self, coord: &SkyCoord) -> Vec<&TractInfo> {
        self.tracts.iter().filter(|t| t.contains(coord)).collect()
    }

    /// Tracts and patches touched by a set of coordinates.
    ///
    /// Every coordinate is resolved to all tracts containing it; each tract
    /// gets the union of the patches whose outer boxes contain any of its
    /// coordinates, in sequential patch order. Tracts appear in the order they
    /// were first reached and tracts without patches are left out.
    #[must_use]
    pub fn find_tract_patch_list(&self, coords: &[SkyCoord]) -> Vec<(&TractInfo, Vec<PatchInfo>)> {
        let mut found: Vec<(&TractInfo, BTreeSet<usize>)> = Vec::new();
        for coord in coords {
            for tract in self.find_all_tracts(coord) {
                let patches = tract.find_patches(coord);
                let slot = match found.iter().position(|(t, _)| t.id() == tract.id()) {
                    Some(pos) => pos,
                    None => {
                        found.push((tract, BTreeSet::new()));
                        found.len() - 1
                    }
                };
                let grid = tract.patch_grid();
                found[slot].1.extend(
                    patches
                        .iter()
                        .filter_map(|p| grid.sequential_index(p.index()).ok()),
                );
            }
        }
        found
            .into_iter()
            .filter(|(_, indices)| !indices.is_empty())
            .map(|(tract, indices)| {
                let grid = tract.patch_grid();
                let patches = indices
                    .into_iter()
                    .filter_map(|seq| {
                        grid.index_from_sequential(seq)
                            .and_then(|index| grid.patch_info(index))
                            .ok()
                    })
                    .collect();
                (tract, patches)
            })
            .collect()
    }
}

fn make_tessellator(config: &SkyMapConfig) -> Result<Box<dyn Tessellator>> {
    Ok(match config.tessellation {
        Tessellation::Dodeca {
            with_tracts_on_poles,
        } => Box::new(DodecaTessellator::new(with_tracts_on_poles)),
        Tessellation::Rings {
            num_rings,
            ra_start,
        } => {
            let num_rings =
                usize::try_from(num_rings).map_err(|_| ConfigError::InvalidRingCount(num_rings))?;
            Box::new(RingsTessellator::new(num_rings, ra_start))
        }
    })
}

impl Index<usize> for SkyMap {
    type Output = TractInfo;

    fn index(&self, id: usize) -> &TractInfo {
        &self.tracts[id]
    }
}

impl<'a> IntoIterator for &'a SkyMap {
    type Item = &'a TractInfo;
    type IntoIter = std::slice::Iter<'a, TractInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracts.iter()
    }
}

impl PartialEq for SkyMap {
    fn eq(&self, other: &Self) -> bool {
        self.config == other.config
    }
}

// configurations are validated, so no field is NaN
impl Eq for SkyMap {}

impl Hash for SkyMap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint.hash(state);
    }
}
