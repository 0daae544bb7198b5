//! Integer and floating-point rectangles
//!
//! Target-space geometry travels as [`RectF`]; anything that ends up
//! addressing pixels (damage, quad bounds, the bounds handed to the surface
//! owner) is an integer [`Rect`]. Conversion is always outward via
//! [`RectF::to_enclosing_rect`], so a converted rect never loses coverage.

use std::fmt;

/// Integer size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    /// Create a new size
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// True if either dimension is zero or negative
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Area in pixels, zero for empty sizes
    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            i64::from(self.width) * i64::from(self.height)
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Integer rectangle (origin + size)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Create a rect from origin and size
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rect from its edges; inverted edges produce an empty rect
    pub fn from_ltrb(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            x: left,
            y: top,
            width: right.saturating_sub(left).max(0),
            height: bottom.saturating_sub(top).max(0),
        }
    }

    /// Create a rect at the origin
    pub const fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.size().is_empty()
    }

    /// True if `other` lies entirely inside this rect
    pub fn contains_rect(&self, other: &Rect) -> bool {
        !other.is_empty()
            && self.x <= other.x
            && self.y <= other.y
            && self.right() >= other.right()
            && self.bottom() >= other.bottom()
    }

    /// True if the two rects share a non-empty area
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Grow this rect to the bounding box of itself and `other`
    pub fn union(&mut self, other: &Rect) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = *other;
            return;
        }

        *self = Rect::from_ltrb(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        );
    }

    /// Remove `other` from this rect where the result is still a rectangle
    ///
    /// The rect shrinks only when `other` spans it completely along one axis
    /// and covers one of its edges; otherwise it is left unchanged. A rect
    /// fully covered by `other` becomes empty.
    pub fn subtract(&mut self, other: &Rect) {
        if !self.intersects(other) {
            return;
        }
        if other.contains_rect(self) {
            *self = Rect::default();
            return;
        }

        let (mut left, mut top, mut right, mut bottom) =
            (self.x, self.y, self.right(), self.bottom());

        if other.y <= self.y && other.bottom() >= self.bottom() {
            if other.x <= self.x {
                left = other.right();
            } else if other.right() >= self.right() {
                right = other.x;
            }
        } else if other.x <= self.x && other.right() >= self.right() {
            if other.y <= self.y {
                top = other.bottom();
            } else if other.bottom() >= self.bottom() {
                bottom = other.y;
            }
        }

        *self = Rect::from_ltrb(left, top, right, bottom);
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{} {}x{}", self.x, self.y, self.width, self.height)
    }
}

/// Floating-point rectangle in target (display) coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectF {
    /// Create a rect from origin and size
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rect from its four edges
    pub fn from_ltrb(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            x: left,
            y: top,
            width: (right - left).max(0.0),
            height: (bottom - top).max(0.0),
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Smallest integer rect covering this rect
    ///
    /// Edges saturate at the `i32` range.
    pub fn to_enclosing_rect(&self) -> Rect {
        Rect::from_ltrb(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.right().ceil() as i32,
            self.bottom().ceil() as i32,
        )
    }
}

impl From<Rect> for RectF {
    fn from(r: Rect) -> Self {
        Self::new(r.x as f32, r.y as f32, r.width as f32, r.height as f32)
    }
}

impl fmt::Display for RectF {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1},{:.1} {:.1}x{:.1}",
            self.x, self.y, self.width, self.height
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_empty_and_area() {
        assert!(Size::new(0, 0).is_empty());
        assert!(Size::new(10, 0).is_empty());
        assert!(Size::new(-1, 5).is_empty());
        assert_eq!(Size::new(-1, 5).area(), 0);
        assert_eq!(Size::new(1920, 1080).area(), 2_073_600);
    }

    #[test]
    fn test_enclosing_rect_from_edges() {
        let rect = RectF::from_ltrb(10.0, 20.0, 110.0, 220.0);
        assert_eq!(rect.to_enclosing_rect(), Rect::new(10, 20, 100, 200));
    }

    #[test]
    fn test_enclosing_rect_rounds_outward() {
        let rect = RectF::new(10.4, 20.6, 99.2, 199.9);
        // right = 109.6 -> 110, bottom = 220.5 -> 221
        assert_eq!(rect.to_enclosing_rect(), Rect::from_ltrb(10, 20, 110, 221));

        let negative = RectF::new(-0.5, -0.5, 1.0, 1.0);
        assert_eq!(negative.to_enclosing_rect(), Rect::from_ltrb(-1, -1, 1, 1));
    }

    #[test]
    fn test_union() {
        let mut r = Rect::default();
        r.union(&Rect::new(10, 10, 10, 10));
        assert_eq!(r, Rect::new(10, 10, 10, 10));

        r.union(&Rect::new(0, 30, 5, 5));
        assert_eq!(r, Rect::from_ltrb(0, 10, 20, 35));

        // Empty rects never grow the union
        r.union(&Rect::new(100, 100, 0, 50));
        assert_eq!(r, Rect::from_ltrb(0, 10, 20, 35));
    }

    #[test]
    fn test_subtract_full_cover() {
        let mut r = Rect::new(10, 10, 10, 10);
        r.subtract(&Rect::new(0, 0, 100, 100));
        assert!(r.is_empty());
    }

    #[test]
    fn test_subtract_trims_spanned_edge() {
        // Spans full height and covers the left edge
        let mut r = Rect::new(0, 0, 100, 100);
        r.subtract(&Rect::new(-10, 0, 40, 100));
        assert_eq!(r, Rect::from_ltrb(30, 0, 100, 100));

        // Spans full width and covers the bottom edge
        let mut r = Rect::new(0, 0, 100, 100);
        r.subtract(&Rect::new(0, 60, 100, 60));
        assert_eq!(r, Rect::from_ltrb(0, 0, 100, 60));
    }

    #[test]
    fn test_subtract_interior_hole_is_noop() {
        let mut r = Rect::new(0, 0, 100, 100);
        r.subtract(&Rect::new(25, 25, 50, 50));
        assert_eq!(r, Rect::new(0, 0, 100, 100));
    }

    #[test]
    fn test_subtract_disjoint_is_noop() {
        let mut r = Rect::new(0, 0, 10, 10);
        r.subtract(&Rect::new(20, 20, 10, 10));
        assert_eq!(r, Rect::new(0, 0, 10, 10));
    }
}
