use std::f64::consts::PI;

use tracing::debug;

use crate::error::{LookupError, Result, SkyMapError};
use crate::geometry::{Bounds2, PixelBox};
use crate::math::sky_coord::vector_separation;
use crate::math::{Point2, SkyCoord, TOLERANCE};
use crate::projection::{Wcs, WcsFactory};

use super::patch::{BorderPolicy, PatchGrid, PatchIndex, PatchInfo};
use super::TractShape;

/// Patch layout shared by every tract of a sky map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchLayout {
    /// Inner patch size in pixels (x, y).
    pub inner_dimensions: [i64; 2],
    /// Border added on every side of a patch, in pixels.
    pub border: i64,
    /// Edge treatment of patches at the tract boundary.
    pub policy: BorderPolicy,
}

/// One tract: a region of sky with its own projection and patch grid.
///
/// The tract's pixel box holds the projected vertices and outline of the
/// inner region grown by the overlap angle, and starts at pixel `(0, 0)`.
#[derive(Debug)]
pub struct TractInfo {
    id: usize,
    center: SkyCoord,
    vertices: Vec<SkyCoord>,
    overlap: f64,
    wcs: Box<dyn Wcs>,
    bbox: PixelBox,
    patches: PatchGrid,
    bounding_radius: f64,
}

impl TractInfo {
    /// Builds a tract.
    ///
    /// # Arguments
    ///
    /// * `id` - Tract id (position in the sky map)
    /// * `shape` - Projection center, corners and outline of the inner region
    /// * `overlap` - Margin beyond the inner region, in radians
    /// * `layout` - Patch dimensions, border and edge policy
    /// * `factory` - Source of the pixel/sky transform
    ///
    /// # Errors
    ///
    /// Returns an error if the transform cannot be built or a vertex or
    /// outline point cannot be projected.
    pub fn new(
        id: usize,
        shape: TractShape,
        overlap: f64,
        layout: &PatchLayout,
        factory: &dyn WcsFactory,
    ) -> Result<Self> {
        let TractShape {
            center,
            vertices,
            outline,
        } = shape;
        let prelim = factory.make_wcs(Point2::origin(), &center)?;
        // projected edges bulge past the chords between vertices
        let mut bounds = Bounds2::empty();
        for point in vertices.iter().chain(&outline) {
            bounds.include(&prelim.sky_to_pixel(point)?);
        }
        let prelim_box = bounds.grown(overlap / prelim.pixel_scale()).to_pixel_box();

        // shift the reference pixel so that the box starts at the origin
        #[allow(clippy::cast_precision_loss)]
        let crpix = Point2::new(-prelim_box.x0 as f64, -prelim_box.y0 as f64);
        let wcs = factory.make_wcs(crpix, &center)?;
        let bbox = PixelBox::new(0, 0, prelim_box.width, prelim_box.height);
        let patches = PatchGrid::new(bbox, layout.inner_dimensions, layout.border, layout.policy);

        let center_vec = center.to_vector();
        let mut bounding_radius: f64 = 0.0;
        for corner in bbox.corners() {
            match wcs.pixel_to_sky(&corner) {
                Ok(sky) => {
                    bounding_radius =
                        bounding_radius.max(vector_separation(&center_vec, &sky.to_vector()));
                }
                Err(_) => {
                    bounding_radius = PI;
                    break;
                }
            }
        }

        let [nx, ny] = patches.num_patches();
        debug!(
            tract = id,
            width = bbox.width,
            height = bbox.height,
            nx,
            ny,
            radius_deg = bounding_radius.to_degrees(),
            "built tract"
        );

        Ok(Self {
            id,
            center,
            vertices,
            overlap,
            wcs,
            bbox,
            patches,
            bounding_radius,
        })
    }

    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn center(&self) -> &SkyCoord {
        &self.center
    }

    /// Corners of the inner region.
    #[must_use]
    pub fn vertices(&self) -> &[SkyCoord] {
        &self.vertices
    }

    /// Overlap margin in radians.
    #[must_use]
    pub fn overlap(&self) -> f64 {
        self.overlap
    }

    #[must_use]
    pub fn wcs(&self) -> &dyn Wcs {
        self.wcs.as_ref()
    }

    /// Pixel box of the whole tract, overlap included.
    #[must_use]
    pub fn bbox(&self) -> &PixelBox {
        &self.bbox
    }

    #[must_use]
    pub fn patch_grid(&self) -> &PatchGrid {
        &self.patches
    }

    #[must_use]
    pub fn num_patches(&self) -> [usize; 2] {
        self.patches.num_patches()
    }

    /// Largest angle from the center to any point of the pixel box.
    #[must_use]
    pub fn bounding_radius(&self) -> f64 {
        self.bounding_radius
    }

    /// Computes the patch at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::PatchIndex`] if the index is outside the grid.
    pub fn patch_info(&self, index: PatchIndex) -> Result<PatchInfo> {
        self.patches.patch_info(index)
    }

    /// Pixel position of `coord`, or `None` if it is outside the bounding
    /// cap or the projection's domain.
    fn pixel_of(&self, coord: &SkyCoord) -> Option<Point2> {
        let sep = vector_separation(&self.center.to_vector(), &coord.to_vector());
        if sep > self.bounding_radius + TOLERANCE {
            return None;
        }
        self.wcs.sky_to_pixel(coord).ok()
    }

    /// Pixel position of `coord` if it lies in the tract's pixel box.
    fn pixel_inside(&self, coord: &SkyCoord) -> Option<Point2> {
        self.pixel_of(coord)
            .filter(|pixel| self.bbox.contains_point(pixel))
    }

    /// Returns `true` if `coord` lies in the tract's pixel box (overlap
    /// included).
    #[must_use]
    pub fn contains(&self, coord: &SkyCoord) -> bool {
        self.pixel_inside(coord).is_some()
    }

    /// The patch whose inner box contains `coord`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::OutsideTract`] if the coordinate is outside the
    /// tract or no patch's inner box holds it.
    pub fn find_patch(&self, coord: &SkyCoord) -> Result<PatchInfo> {
        self.pixel_inside(coord)
            .and_then(|pixel| self.patches.patch_index_at(&pixel))
            .ok_or_else(|| SkyMapError::from(LookupError::OutsideTract(self.id)))
            .and_then(|index| self.patches.patch_info(index))
    }

    /// Every patch whose outer box contains `coord`, or nothing if the
    /// coordinate is outside the tract.
    #[must_use]
    pub fn find_patches(&self, coord: &SkyCoord) -> Vec<PatchInfo> {
        self.pixel_inside(coord)
            .map(|pixel| self.patches.patches_containing(&pixel))
            .unwrap_or_default()
    }

    /// Patches whose outer boxes overlap the pixel region spanned by `coords`.
    ///
    /// The region is the pixel bounding box of the projected coordinates,
    /// grown by the patch border and clipped to the tract. Coordinates that
    /// cannot be projected are skipped.
    #[must_use]
    pub fn find_patch_list(&self, coords: &[SkyCoord]) -> Vec<PatchInfo> {
        let mut bounds = Bounds2::empty();
        for coord in coords {
            if let Some(pixel) = self.pixel_of(coord) {
                bounds.include(&pixel);
            }
        }
        if bounds.is_empty() {
            return Vec::new();
        }
        let region = bounds
            .to_pixel_box()
            .grown(self.patches.border())
            .clipped(&self.bbox);
        self.patches.patches_overlapping(&region)
    }
}

impl PartialEq for TractInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.center == other.center
            && self.vertices == other.vertices
            && self.overlap == other.overlap
            && self.bbox == other.bbox
            && self.patches == other.patches
    }
}
