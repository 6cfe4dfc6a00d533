use crate::math::Point2;

/// An integer, axis-aligned pixel box.
///
/// Covers pixels `x0..x0 + width` by `y0..y0 + height`; a box with a
/// non-positive width or height is empty. A floating pixel position `(x, y)`
/// falls in pixel `(floor(x), floor(y))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelBox {
    /// First column.
    pub x0: i64,
    /// First row.
    pub y0: i64,
    /// Number of columns.
    pub width: i64,
    /// Number of rows.
    pub height: i64,
}

impl PixelBox {
    /// Creates a new box.
    #[must_use]
    pub fn new(x0: i64, y0: i64, width: i64, height: i64) -> Self {
        Self {
            x0,
            y0,
            width,
            height,
        }
    }

    /// One past the last column.
    #[must_use]
    pub fn x_end(&self) -> i64 {
        self.x0 + self.width
    }

    /// One past the last row.
    #[must_use]
    pub fn y_end(&self) -> i64 {
        self.y0 + self.height
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Returns `true` if pixel `(x, y)` lies in the box.
    #[must_use]
    pub fn contains_pixel(&self, x: i64, y: i64) -> bool {
        x >= self.x0 && x < self.x_end() && y >= self.y0 && y < self.y_end()
    }

    /// Returns `true` if the floating pixel position lies in the box.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn contains_point(&self, point: &Point2) -> bool {
        if !point.x.is_finite() || !point.y.is_finite() {
            return false;
        }
        self.contains_pixel(point.x.floor() as i64, point.y.floor() as i64)
    }

    /// Returns `true` if every pixel of `other` lies in this box.
    ///
    /// An empty `other` is contained in any box.
    #[must_use]
    pub fn contains_box(&self, other: &PixelBox) -> bool {
        other.is_empty()
            || (other.x0 >= self.x0
                && other.y0 >= self.y0
                && other.x_end() <= self.x_end()
                && other.y_end() <= self.y_end())
    }

    /// Returns the box grown by `border` pixels on every side.
    #[must_use]
    pub fn grown(&self, border: i64) -> Self {
        Self::new(
            self.x0 - border,
            self.y0 - border,
            self.width + 2 * border,
            self.height + 2 * border,
        )
    }

    /// Returns the intersection of the two boxes (possibly empty).
    #[must_use]
    pub fn clipped(&self, other: &PixelBox) -> Self {
        let x0 = self.x0.max(other.x0);
        let y0 = self.y0.max(other.y0);
        let x1 = self.x_end().min(other.x_end());
        let y1 = self.y_end().min(other.y_end());
        Self::new(x0, y0, (x1 - x0).max(0), (y1 - y0).max(0))
    }

    /// Corner positions `(x0, y0)`, `(x_end, y0)`, `(x_end, y_end)`, `(x0, y_end)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn corners(&self) -> [Point2; 4] {
        let (x0, y0) = (self.x0 as f64, self.y0 as f64);
        let (x1, y1) = (self.x_end() as f64, self.y_end() as f64);
        [
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ]
    }
}

/// Floating-point bounds accumulated from pixel positions.
#[derive(Debug, Clone, Copy)]
pub struct Bounds2 {
    /// Minimum corner.
    pub min: Point2,
    /// Maximum corner.
    pub max: Point2,
}

impl Bounds2 {
    /// Bounds containing nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point2::new(f64::INFINITY, f64::INFINITY),
            max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Extends the bounds to include `point`.
    pub fn include(&mut self, point: &Point2) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    /// Returns the bounds grown by `margin` on every side.
    #[must_use]
    pub fn grown(&self, margin: f64) -> Self {
        Self {
            min: Point2::new(self.min.x - margin, self.min.y - margin),
            max: Point2::new(self.max.x + margin, self.max.y + margin),
        }
    }

    /// Smallest pixel box containing every pixel these bounds touch.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_pixel_box(&self) -> PixelBox {
        if self.is_empty() {
            return PixelBox::new(0, 0, 0, 0);
        }
        let x0 = self.min.x.floor() as i64;
        let y0 = self.min.y.floor() as i64;
        let x1 = self.max.x.floor() as i64 + 1;
        let y1 = self.max.y.floor() as i64 + 1;
        PixelBox::new(x0, y0, x1 - x0, y1 - y0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_point_uses_floor() {
        let b = PixelBox::new(0, 0, 10, 5);
        assert!(b.contains_point(&Point2::new(0.0, 0.0)));
        assert!(b.contains_point(&Point2::new(9.999, 4.5)));
        assert!(!b.contains_point(&Point2::new(10.0, 1.0)));
        assert!(!b.contains_point(&Point2::new(-0.001, 1.0)));
        assert!(!b.contains_point(&Point2::new(f64::NAN, 1.0)));
    }

    #[test]
    fn grow_and_clip() {
        let b = PixelBox::new(10, 20, 100, 50);
        let g = b.grown(5);
        assert_eq!(g, PixelBox::new(5, 15, 110, 60));
        assert!(g.contains_box(&b));
        let c = g.clipped(&PixelBox::new(0, 0, 50, 50));
        assert_eq!(c, PixelBox::new(5, 15, 45, 35));
    }

    #[test]
    fn disjoint_clip_is_empty() {
        let a = PixelBox::new(0, 0, 10, 10);
        let b = PixelBox::new(20, 20, 10, 10);
        assert!(a.clipped(&b).is_empty());
    }

    #[test]
    fn bounds_to_pixel_box() {
        let mut bounds = Bounds2::empty();
        assert!(bounds.is_empty());
        bounds.include(&Point2::new(-1.5, 2.0));
        bounds.include(&Point2::new(3.2, 7.9));
        let b = bounds.to_pixel_box();
        assert_eq!(b, PixelBox::new(-2, 2, 6, 6));
        assert!(b.contains_point(&Point2::new(3.2, 7.9)));
        assert!(b.contains_point(&Point2::new(-1.5, 2.0)));
    }

    #[test]
    fn corners_are_outer_edges() {
        let c = PixelBox::new(1, 2, 3, 4).corners();
        assert_eq!(c[0], Point2::new(1.0, 2.0));
        assert_eq!(c[2], Point2::new(4.0, 6.0));
    }
}
