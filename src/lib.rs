//! Partitioning of the celestial sphere into overlapping tracts, each with
//! its own zenithal projection and a grid of bordered patches.
//!
//! A [`SkyMap`] is built from a [`SkyMapConfig`] naming one of two
//! tessellations: twelve tracts on the faces of a dodecahedron, or declination
//! rings capped by a tract on each pole.

pub mod error;
pub mod geometry;
pub mod math;
pub mod projection;
pub mod skymap;
pub mod tessellation;

pub use error::{Result, SkyMapError};
pub use math::SkyCoord;
pub use projection::{ProjectionCode, Wcs, WcsFactory};
pub use skymap::{PersistedSkyMap, SkyMap, SkyMapConfig, Tessellation};
pub use tessellation::{PatchIndex, PatchInfo, TractInfo};
