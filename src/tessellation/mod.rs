mod dodeca;
mod patch;
mod rings;
mod tract;

pub use dodeca::DodecaTessellator;
pub use patch::{BorderPolicy, PatchGrid, PatchIndex, PatchInfo};
pub use rings::RingsTessellator;
pub use tract::{PatchLayout, TractInfo};

use std::fmt;

use crate::error::Result;
use crate::math::sky_coord::great_circle_point;
use crate::math::SkyCoord;
use crate::projection::WcsFactory;

/// Points sampled along each side of a tract's inner region.
pub const OUTLINE_SAMPLES: usize = 16;

/// Center, corners and outline of one tract's inner region.
#[derive(Debug, Clone, PartialEq)]
pub struct TractShape {
    pub center: SkyCoord,
    pub vertices: Vec<SkyCoord>,
    /// Points along the boundary of the inner region. The tract's pixel box
    /// holds every one of them, so sides that bulge outward once projected
    /// stay inside the tract.
    pub outline: Vec<SkyCoord>,
}

impl TractShape {
    /// A polygon whose sides are the great-circle arcs between consecutive
    /// `vertices`.
    ///
    /// # Errors
    ///
    /// Returns an error if a sampled point cannot be expressed as a sky
    /// coordinate.
    #[allow(clippy::cast_precision_loss)]
    pub fn great_circle_polygon(center: SkyCoord, vertices: Vec<SkyCoord>) -> Result<Self> {
        let mut outline = Vec::with_capacity(vertices.len() * OUTLINE_SAMPLES);
        for (i, a) in vertices.iter().enumerate() {
            let b = &vertices[(i + 1) % vertices.len()];
            let (va, vb) = (a.to_vector(), b.to_vector());
            for k in 0..OUTLINE_SAMPLES {
                let t = k as f64 / OUTLINE_SAMPLES as f64;
                outline.push(SkyCoord::from_vector(
                    &great_circle_point(&va, &vb, t),
                    Some(center.longitude()),
                )?);
            }
        }
        Ok(Self {
            center,
            vertices,
            outline,
        })
    }
}

/// A way of cutting the sphere into tracts.
///
/// A strategy only decides where tracts are and which one owns a point;
/// projections, pixel boxes and patches are built by [`build_tracts`] the
/// same way for every strategy.
pub trait Tessellator: fmt::Debug + Send + Sync {
    /// Number of tracts, fixed at construction.
    fn num_tracts(&self) -> usize;

    /// Geometry of tract `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is out of range or the geometry cannot be
    /// expressed as sky coordinates.
    fn tract_shape(&self, id: usize, factory: &dyn WcsFactory) -> Result<TractShape>;

    /// Id of the tract whose inner region owns `coord`.
    ///
    /// `None` signals a broken tessellation, never an ordinary miss.
    fn find_tract_id(&self, coord: &SkyCoord) -> Option<usize>;

    /// How patches behave at the tract edge.
    fn border_policy(&self) -> BorderPolicy;
}

/// Builds every tract of `tessellator`, in id order.
///
/// # Errors
///
/// Returns the first error raised while building a tract.
pub fn build_tracts(
    tessellator: &dyn Tessellator,
    overlap: f64,
    inner_dimensions: [i64; 2],
    border: i64,
    factory: &dyn WcsFactory,
) -> Result<Vec<TractInfo>> {
    let layout = PatchLayout {
        inner_dimensions,
        border,
        policy: tessellator.border_policy(),
    };
    (0..tessellator.num_tracts())
        .map(|id| {
            let shape = tessellator.tract_shape(id, factory)?;
            TractInfo::new(id, shape, overlap, &layout, factory)
        })
        .collect()
}
