use std::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::error::{LookupError, Result};
use crate::math::{wrap_two_pi, Point2, SkyCoord};
use crate::projection::WcsFactory;

use super::{BorderPolicy, Tessellator, TractShape, OUTLINE_SAMPLES};

/// Declination rings capped by one tract on each pole.
///
/// The sphere is cut into `num_rings + 1` bands of height
/// `ring_size = pi / (num_rings + 1)`; the half bands at either end form the
/// polar caps. Tract 0 is the south cap, the last tract the north cap, and the
/// rings are numbered from south to north in between, each starting at
/// `ra_start` and increasing in right ascension.
#[derive(Debug, Clone)]
pub struct RingsTessellator {
    num_rings: usize,
    ra_start: f64,
    ring_size: f64,
    ring_counts: Vec<usize>,
}

impl RingsTessellator {
    /// Lays out the rings.
    ///
    /// `num_rings` must be positive and `ra_start` (radians) is wrapped into
    /// `[0, 2*pi)`; the sky map configuration validates both.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn new(num_rings: usize, ra_start: f64) -> Self {
        let ring_size = PI / (num_rings as f64 + 1.0);
        let ring_counts = (0..num_rings)
            .map(|i| {
                let start_dec = ring_size * (i as f64 + 0.5) - FRAC_PI_2;
                let stop_dec = start_dec + ring_size;
                // split at the widest edge so tracts never exceed ring_size in RA
                let dec = start_dec.abs().min(stop_dec.abs());
                (TAU * dec.cos() / ring_size) as usize + 1
            })
            .collect();
        Self {
            num_rings,
            ra_start: wrap_two_pi(ra_start),
            ring_size,
            ring_counts,
        }
    }

    #[must_use]
    pub fn num_rings(&self) -> usize {
        self.num_rings
    }

    /// Declination height of one ring, in radians.
    #[must_use]
    pub fn ring_size(&self) -> f64 {
        self.ring_size
    }

    /// Number of tracts in each ring, south to north.
    #[must_use]
    pub fn ring_counts(&self) -> &[usize] {
        &self.ring_counts
    }

    /// Ring and position in ring for a tract id; caps have no position.
    ///
    /// The south cap is ring `-1` and the north cap ring `num_rings`.
    #[allow(clippy::cast_possible_wrap)]
    fn ring_indices(&self, id: usize) -> (isize, Option<usize>) {
        if id == 0 {
            return (-1, None);
        }
        if id == self.num_tracts() - 1 {
            return (self.num_rings as isize, None);
        }
        let mut rest = id - 1;
        for (ring, &count) in self.ring_counts.iter().enumerate() {
            if rest < count {
                return (ring as isize, Some(rest));
            }
            rest -= count;
        }
        (self.num_rings as isize, None)
    }

    /// Ring containing `dec`; `-1` and `num_rings` are the caps.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn dec_to_ring(&self, dec: f64) -> isize {
        let first_ring_start = self.ring_size * 0.5 - FRAC_PI_2;
        if dec < first_ring_start {
            -1
        } else if dec > -first_ring_start {
            self.num_rings as isize
        } else {
            (((dec - first_ring_start) / self.ring_size) as isize).min(self.num_rings as isize)
        }
    }

    /// Points along the edge of the region a tract owns.
    ///
    /// A ring tract owns a band cell between two declinations and two right
    /// ascensions; each of its four sides is sampled. A cap owns everything
    /// past its edge declination, which is sampled as a full circle.
    #[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
    fn owned_outline(&self, ring: isize, position: Option<usize>) -> Result<Vec<SkyCoord>> {
        let Some(position) = position else {
            let edge = FRAC_PI_2 - 0.5 * self.ring_size;
            let dec = if ring < 0 { -edge } else { edge };
            let n = 4 * OUTLINE_SAMPLES;
            return (0..n)
                .map(|k| SkyCoord::new(TAU * k as f64 / n as f64, dec))
                .collect();
        };
        let ring = ring as usize;
        let step = TAU / self.ring_counts[ring] as f64;
        let ra_lo = self.ra_start + step * (position as f64 - 0.5);
        let dec_lo = self.ring_size * (ring as f64 + 0.5) - FRAC_PI_2;
        let (ra_hi, dec_hi) = (ra_lo + step, dec_lo + self.ring_size);
        let corners = [
            (ra_lo, dec_lo),
            (ra_hi, dec_lo),
            (ra_hi, dec_hi),
            (ra_lo, dec_hi),
        ];

        let mut outline = Vec::with_capacity(4 * OUTLINE_SAMPLES);
        for (i, &(ra0, dec0)) in corners.iter().enumerate() {
            // one of ra and dec is constant along each side
            let (ra1, dec1) = corners[(i + 1) % 4];
            for k in 0..OUTLINE_SAMPLES {
                let t = k as f64 / OUTLINE_SAMPLES as f64;
                outline.push(SkyCoord::new(
                    ra0 + t * (ra1 - ra0),
                    dec0 + t * (dec1 - dec0),
                )?);
            }
        }
        Ok(outline)
    }

    /// Nearest tract center in `ring`, wrapping past 2*pi back to 0.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    fn ra_to_position(&self, ra: f64, ring: usize) -> usize {
        let count = self.ring_counts[ring];
        let step = TAU / count as f64;
        let position = (wrap_two_pi(ra - self.ra_start) / step + 0.5) as usize;
        if position >= count {
            0
        } else {
            position
        }
    }
}

impl Tessellator for RingsTessellator {
    fn num_tracts(&self) -> usize {
        self.ring_counts.iter().sum::<usize>() + 2
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
    fn tract_shape(&self, id: usize, factory: &dyn WcsFactory) -> Result<TractShape> {
        if id >= self.num_tracts() {
            return Err(LookupError::TractIndex {
                index: id,
                count: self.num_tracts(),
            }
            .into());
        }
        let (ring, position) = self.ring_indices(id);
        let center = match (ring, position) {
            (-1, _) => SkyCoord::new(0.0, -FRAC_PI_2)?,
            (ring, Some(position)) => {
                let ring = ring as usize;
                let dec = self.ring_size * (ring as f64 + 1.0) - FRAC_PI_2;
                let ra = self.ra_start + TAU * position as f64 / self.ring_counts[ring] as f64;
                SkyCoord::new(ra, dec)?
            }
            (_, None) => SkyCoord::new(0.0, FRAC_PI_2)?,
        };

        // a square of half-width ring_size / 2 about the center, in pixels
        let wcs = factory.make_wcs(Point2::origin(), &center)?;
        let half = 0.5 * self.ring_size / wcs.pixel_scale();
        let vertices = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
            .iter()
            .map(|&(dx, dy)| wcs.pixel_to_sky(&Point2::new(dx * half, dy * half)))
            .collect::<Result<Vec<_>>>()?;
        Ok(TractShape {
            center,
            vertices,
            outline: self.owned_outline(ring, position)?,
        })
    }

    #[allow(clippy::cast_sign_loss)]
    fn find_tract_id(&self, coord: &SkyCoord) -> Option<usize> {
        if !coord.latitude().is_finite() {
            return None;
        }
        let ring = self.dec_to_ring(coord.latitude());
        if ring < 0 {
            return Some(0);
        }
        let ring = ring as usize;
        if ring >= self.num_rings {
            return Some(self.num_tracts() - 1);
        }
        let position = self.ra_to_position(coord.longitude(), ring);
        Some(1 + self.ring_counts[..ring].iter().sum::<usize>() + position)
    }

    fn border_policy(&self) -> BorderPolicy {
        BorderPolicy::Clip
    }
}
