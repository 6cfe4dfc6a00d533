use crate::error::{LookupError, Result};
use crate::geometry::PixelBox;
use crate::math::Point2;

/// How patch boxes are treated at the edges of the tract's pixel box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BorderPolicy {
    /// Inner and outer boxes are clipped to the tract box.
    Clip,
    /// Boxes extend past the tract box; neighbouring tracts absorb the excess.
    Extend,
}

/// Position of a patch in its tract's grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatchIndex {
    pub x: usize,
    pub y: usize,
}

impl PatchIndex {
    #[must_use]
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// One patch: its grid index and its pixel extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatchInfo {
    index: PatchIndex,
    inner_bbox: PixelBox,
    outer_bbox: PixelBox,
}

impl PatchInfo {
    #[must_use]
    pub fn index(&self) -> PatchIndex {
        self.index
    }

    /// Pixels owned by this patch alone.
    #[must_use]
    pub fn inner_bbox(&self) -> &PixelBox {
        &self.inner_bbox
    }

    /// Inner box plus the border shared with neighbouring patches.
    #[must_use]
    pub fn outer_bbox(&self) -> &PixelBox {
        &self.outer_bbox
    }
}

/// Regular grid of patches laid over a tract's pixel box.
///
/// Patch `(i, j)` has its inner box at `(x0 + i * w, y0 + j * h)` with size
/// `(w, h)`, where `(x0, y0)` is the tract box origin. The grid has
/// `ceil(extent / inner)` patches on each axis (at least one), so the inner
/// boxes tile the whole tract box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchGrid {
    tract_bbox: PixelBox,
    inner_dimensions: [i64; 2],
    border: i64,
    num_patches: [usize; 2],
    policy: BorderPolicy,
}

impl PatchGrid {
    /// Lays out the grid.
    ///
    /// Dimensions must be positive and the border non-negative; the sky map
    /// configuration validates both before any tract is built.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(
        tract_bbox: PixelBox,
        inner_dimensions: [i64; 2],
        border: i64,
        policy: BorderPolicy,
    ) -> Self {
        debug_assert!(inner_dimensions[0] > 0 && inner_dimensions[1] > 0 && border >= 0);
        let count = |extent: i64, inner: i64| -> usize {
            let inner = inner.max(1);
            let n = (extent.max(0) + inner - 1) / inner;
            n.max(1) as usize
        };
        let num_patches = [
            count(tract_bbox.width, inner_dimensions[0]),
            count(tract_bbox.height, inner_dimensions[1]),
        ];
        Self {
            tract_bbox,
            inner_dimensions,
            border,
            num_patches,
            policy,
        }
    }

    /// Number of patches along x and y.
    #[must_use]
    pub fn num_patches(&self) -> [usize; 2] {
        self.num_patches
    }

    /// Total number of patches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.num_patches[0] * self.num_patches[1]
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn inner_dimensions(&self) -> [i64; 2] {
        self.inner_dimensions
    }

    #[must_use]
    pub fn border(&self) -> i64 {
        self.border
    }

    #[must_use]
    pub fn policy(&self) -> BorderPolicy {
        self.policy
    }

    fn check(&self, index: PatchIndex) -> Result<()> {
        if index.x < self.num_patches[0] && index.y < self.num_patches[1] {
            Ok(())
        } else {
            Err(LookupError::PatchIndex {
                x: index.x,
                y: index.y,
                nx: self.num_patches[0],
                ny: self.num_patches[1],
            }
            .into())
        }
    }

    /// Row-major sequential index `x + y * nx`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::PatchIndex`] if the index is outside the grid.
    pub fn sequential_index(&self, index: PatchIndex) -> Result<usize> {
        self.check(index)?;
        Ok(index.x + index.y * self.num_patches[0])
    }

    /// Inverse of [`PatchGrid::sequential_index`].
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::PatchIndex`] if `seq` is not below [`PatchGrid::len`].
    pub fn index_from_sequential(&self, seq: usize) -> Result<PatchIndex> {
        let nx = self.num_patches[0];
        let index = PatchIndex::new(seq % nx, seq / nx);
        self.check(index)?;
        Ok(index)
    }

    /// Computes the patch at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::PatchIndex`] if the index is outside the grid.
    #[allow(clippy::cast_possible_wrap)]
    pub fn patch_info(&self, index: PatchIndex) -> Result<PatchInfo> {
        self.check(index)?;
        let [w, h] = self.inner_dimensions;
        let inner = PixelBox::new(
            self.tract_bbox.x0 + index.x as i64 * w,
            self.tract_bbox.y0 + index.y as i64 * h,
            w,
            h,
        );
        let outer = inner.grown(self.border);
        let (inner_bbox, outer_bbox) = match self.policy {
            BorderPolicy::Clip => (
                inner.clipped(&self.tract_bbox),
                outer.clipped(&self.tract_bbox),
            ),
            BorderPolicy::Extend => (inner, outer),
        };
        Ok(PatchInfo {
            index,
            inner_bbox,
            outer_bbox,
        })
    }

    /// Index of the patch whose inner box contains `pixel`, if any.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn patch_index_at(&self, pixel: &Point2) -> Option<PatchIndex> {
        if !pixel.x.is_finite() || !pixel.y.is_finite() {
            return None;
        }
        let ix = (pixel.x.floor() as i64 - self.tract_bbox.x0).div_euclid(self.inner_dimensions[0]);
        let iy = (pixel.y.floor() as i64 - self.tract_bbox.y0).div_euclid(self.inner_dimensions[1]);
        if ix < 0 || iy < 0 {
            return None;
        }
        let patch = self.patch_info(PatchIndex::new(ix as usize, iy as usize)).ok()?;
        patch.inner_bbox.contains_point(pixel).then_some(patch.index)
    }

    /// Every patch whose outer box contains `pixel`, by sequential index.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn patches_containing(&self, pixel: &Point2) -> Vec<PatchInfo> {
        if !pixel.x.is_finite() || !pixel.y.is_finite() {
            return Vec::new();
        }
        let single = PixelBox::new(pixel.x.floor() as i64, pixel.y.floor() as i64, 1, 1);
        self.patches_overlapping(&single)
    }

    /// Every patch whose outer box shares at least one pixel with `region`,
    /// by sequential index.
    #[must_use]
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub fn patches_overlapping(&self, region: &PixelBox) -> Vec<PatchInfo> {
        if region.is_empty() {
            return Vec::new();
        }
        // inner boxes within `border` of the region are the only candidates
        let range = |lo: i64, hi: i64, origin: i64, size: i64, n: usize| {
            let first = (lo - origin - self.border).div_euclid(size).max(0);
            let last = (hi - 1 - origin + self.border)
                .div_euclid(size)
                .min(n as i64 - 1);
            first..=last
        };
        let xs = range(
            region.x0,
            region.x_end(),
            self.tract_bbox.x0,
            self.inner_dimensions[0],
            self.num_patches[0],
        );
        let ys = range(
            region.y0,
            region.y_end(),
            self.tract_bbox.y0,
            self.inner_dimensions[1],
            self.num_patches[1],
        );

        let mut out = Vec::new();
        for y in ys {
            for x in xs.clone() {
                if let Ok(patch) = self.patch_info(PatchIndex::new(x as usize, y as usize)) {
                    if !patch.outer_bbox.clipped(region).is_empty() {
                        out.push(patch);
                    }
                }
            }
        }
        out
    }

    /// Indices of the (up to eight) patches adjacent to `index`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::PatchIndex`] if the index is outside the grid.
    pub fn neighbors(&self, index: PatchIndex) -> Result<Vec<PatchIndex>> {
        self.check(index)?;
        let mut out = Vec::with_capacity(8);
        for dy in -1isize..=1 {
            for dx in -1isize..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let (Some(x), Some(y)) = (
                    index.x.checked_add_signed(dx),
                    index.y.checked_add_signed(dy),
                ) else {
                    continue;
                };
                if x < self.num_patches[0] && y < self.num_patches[1] {
                    out.push(PatchIndex::new(x, y));
                }
            }
        }
        Ok(out)
    }

    /// All patches in sequential order.
    pub fn iter(&self) -> impl Iterator<Item = PatchInfo> + '_ {
        (0..self.len()).filter_map(move |seq| {
            self.index_from_sequential(seq)
                .and_then(|index| self.patch_info(index))
                .ok()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn grid(policy: BorderPolicy) -> PatchGrid {
        PatchGrid::new(PixelBox::new(0, 0, 250, 120), [100, 50], 10, policy)
    }

    #[test]
    fn counts_round_up() {
        let g = grid(BorderPolicy::Extend);
        assert_eq!(g.num_patches(), [3, 3]);
        assert_eq!(g.len(), 9);
    }

    #[test]
    fn at_least_one_patch() {
        let g = PatchGrid::new(PixelBox::new(0, 0, 0, 0), [100, 100], 5, BorderPolicy::Clip);
        assert_eq!(g.num_patches(), [1, 1]);
    }

    #[test]
    fn extend_outer_is_inner_plus_border() {
        let g = grid(BorderPolicy::Extend);
        for patch in g.iter() {
            assert_eq!(*patch.outer_bbox(), patch.inner_bbox().grown(10));
            assert_eq!(patch.inner_bbox().width, 100);
            assert_eq!(patch.inner_bbox().height, 50);
        }
        let corner = g.patch_info(PatchIndex::new(2, 2)).unwrap();
        assert_eq!(*corner.inner_bbox(), PixelBox::new(200, 100, 100, 50));
        assert_eq!(*corner.outer_bbox(), PixelBox::new(190, 90, 120, 70));
    }

    #[test]
    fn clip_stays_inside_tract() {
        let g = grid(BorderPolicy::Clip);
        let tract = PixelBox::new(0, 0, 250, 120);
        for patch in g.iter() {
            assert!(tract.contains_box(patch.outer_bbox()));
            assert!(patch.outer_bbox().contains_box(patch.inner_bbox()));
        }
        let corner = g.patch_info(PatchIndex::new(2, 2)).unwrap();
        assert_eq!(*corner.inner_bbox(), PixelBox::new(200, 100, 50, 20));
        assert_eq!(*corner.outer_bbox(), PixelBox::new(190, 90, 60, 30));
    }

    #[test]
    fn union_of_outer_boxes_covers_tract() {
        for policy in [BorderPolicy::Clip, BorderPolicy::Extend] {
            let g = grid(policy);
            for y in 0..120 {
                for x in 0..250 {
                    assert!(
                        g.iter().any(|p| p.outer_bbox().contains_pixel(x, y)),
                        "{x},{y} uncovered ({policy:?})"
                    );
                }
            }
        }
    }

    #[test]
    fn index_at_pixel() {
        let g = grid(BorderPolicy::Clip);
        assert_eq!(
            g.patch_index_at(&Point2::new(150.5, 49.9)),
            Some(PatchIndex::new(1, 0))
        );
        assert_eq!(
            g.patch_index_at(&Point2::new(249.0, 119.0)),
            Some(PatchIndex::new(2, 2))
        );
        assert_eq!(g.patch_index_at(&Point2::new(-1.0, 0.0)), None);
        assert_eq!(g.patch_index_at(&Point2::new(250.0, 0.0)), None);
    }

    #[test]
    fn outer_membership_near_seam() {
        let g = grid(BorderPolicy::Extend);
        let found: Vec<PatchIndex> = g
            .patches_containing(&Point2::new(95.0, 25.0))
            .iter()
            .map(PatchInfo::index)
            .collect();
        assert_eq!(found, vec![PatchIndex::new(0, 0), PatchIndex::new(1, 0)]);

        let interior = g.patches_containing(&Point2::new(150.0, 75.0));
        assert_eq!(interior.len(), 1);
    }

    #[test]
    fn outer_membership_matches_brute_force() {
        let g = grid(BorderPolicy::Clip);
        for &(x, y) in &[(0.0, 0.0), (105.0, 45.0), (199.5, 99.5), (249.9, 119.9), (-5.0, 3.0)] {
            let p = Point2::new(x, y);
            let fast: Vec<PatchInfo> = g.patches_containing(&p);
            let slow: Vec<PatchInfo> = g
                .iter()
                .filter(|patch| patch.outer_bbox().contains_point(&p))
                .collect();
            assert_eq!(fast, slow, "at ({x}, {y})");
        }
    }

    #[test]
    fn overlapping_region() {
        let g = grid(BorderPolicy::Extend);
        let found: Vec<PatchIndex> = g
            .patches_overlapping(&PixelBox::new(105, 45, 100, 10))
            .iter()
            .map(PatchInfo::index)
            .collect();
        assert_eq!(
            found,
            vec![
                PatchIndex::new(0, 0),
                PatchIndex::new(1, 0),
                PatchIndex::new(2, 0),
                PatchIndex::new(0, 1),
                PatchIndex::new(1, 1),
                PatchIndex::new(2, 1),
            ]
        );
        assert!(g.patches_overlapping(&PixelBox::new(0, 0, 0, 5)).is_empty());
        assert!(g.patches_overlapping(&PixelBox::new(500, 500, 5, 5)).is_empty());
    }

    #[test]
    fn sequential_roundtrip_and_neighbors() {
        let g = grid(BorderPolicy::Extend);
        let idx = PatchIndex::new(2, 1);
        let seq = g.sequential_index(idx).unwrap();
        assert_eq!(seq, 5);
        assert_eq!(g.index_from_sequential(seq).unwrap(), idx);
        assert!(g.index_from_sequential(9).is_err());

        assert_eq!(g.neighbors(PatchIndex::new(0, 0)).unwrap().len(), 3);
        assert_eq!(g.neighbors(PatchIndex::new(1, 1)).unwrap().len(), 8);
        assert_eq!(g.neighbors(idx).unwrap().len(), 5);
        assert!(g.neighbors(PatchIndex::new(3, 0)).is_err());
    }
}
