//! Affine transforms and rectangle helpers.

use crate::clock::Tick;
use kurbo::{Affine, Point, Rect, Vec2};

/// Tolerance used when comparing transform coefficients.
pub const EPSILON: f64 = 1e-9;

/// A 2D affine transform `[a, b, c, d, e, f]` stamped with the tick of its
/// last modification.
///
/// Points map as `x' = a*x + c*y + e` and `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    affine: Affine,
    modified: Tick,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Affine> for Transform {
    fn from(affine: Affine) -> Self {
        Self::from_affine(affine)
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        affine: Affine::IDENTITY,
        modified: Tick::ZERO,
    };

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self::from_affine(Affine::new([a, b, c, d, e, f]))
    }

    pub fn from_affine(affine: Affine) -> Self {
        Self {
            affine,
            modified: Tick::ZERO,
        }
    }

    pub(crate) fn stamped(affine: Affine, modified: Tick) -> Self {
        Self { affine, modified }
    }

    pub fn affine(&self) -> Affine {
        self.affine
    }

    pub fn coeffs(&self) -> [f64; 6] {
        self.affine.as_coeffs()
    }

    /// Tick of the last modification.
    pub fn modified(&self) -> Tick {
        self.modified
    }

    pub(crate) fn touch(&mut self, tick: Tick) {
        self.modified = tick;
    }

    /// `self * other`: `other` is applied first.
    pub fn compose(&self, other: &Transform) -> Transform {
        Transform::stamped(self.affine * other.affine, self.modified.max(other.modified))
    }

    pub fn apply(&self, point: Point) -> Point {
        self.affine * point
    }

    /// Map a point through the inverse. `None` when the transform is singular.
    pub fn apply_inverse(&self, point: Point) -> Option<Point> {
        self.inverse().map(|inv| inv.apply(point))
    }

    pub fn inverse(&self) -> Option<Transform> {
        if !is_invertible(self.affine) {
            return None;
        }
        Some(Transform::stamped(self.affine.inverse(), self.modified))
    }

    /// Translate in the outer coordinate space.
    pub fn translate(&mut self, dx: f64, dy: f64, tick: Tick) {
        self.affine = Affine::translate((dx, dy)) * self.affine;
        self.modified = tick;
    }

    /// Scale about the local origin.
    pub fn scale(&mut self, sx: f64, sy: f64, tick: Tick) {
        self.affine *= Affine::scale_non_uniform(sx, sy);
        self.modified = tick;
    }

    /// Rotate about the local origin.
    pub fn rotate(&mut self, angle: f64, tick: Tick) {
        self.affine *= Affine::rotate(angle);
        self.modified = tick;
    }

    /// Skew about the local origin.
    pub fn skew(&mut self, kx: f64, ky: f64, tick: Tick) {
        self.affine *= Affine::skew(kx, ky);
        self.modified = tick;
    }

    pub fn set(&mut self, affine: Affine, tick: Tick) {
        self.affine = affine;
        self.modified = tick;
    }

    pub fn is_identity(&self) -> bool {
        is_identity(self.affine)
    }

    pub fn is_translation(&self) -> bool {
        is_translation(self.affine)
    }

    pub fn translation(&self) -> Vec2 {
        self.affine.translation()
    }
}

pub fn is_invertible(affine: Affine) -> bool {
    let det = affine.determinant();
    det.is_finite() && det.abs() > EPSILON
}

/// True when the linear part is the identity.
pub fn is_translation(affine: Affine) -> bool {
    let [a, b, c, d, _, _] = affine.as_coeffs();
    (a - 1.0).abs() < EPSILON && b.abs() < EPSILON && c.abs() < EPSILON && (d - 1.0).abs() < EPSILON
}

pub fn is_identity(affine: Affine) -> bool {
    is_translation(affine) && affine.translation().hypot() < EPSILON
}

/// Scale by `(sx, sy)` about `origin`.
pub fn scale_about(sx: f64, sy: f64, origin: Point) -> Affine {
    Affine::translate(origin.to_vec2()) * Affine::scale_non_uniform(sx, sy) * Affine::translate(-origin.to_vec2())
}

/// Closed containment test; includes the right and bottom edges.
pub fn contains_inclusive(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Bounds with finite coordinates and non-negative extent.
pub fn is_valid_bounds(rect: Rect) -> bool {
    [rect.x0, rect.y0, rect.x1, rect.y1].iter().all(|v| v.is_finite())
        && rect.width() >= 0.0
        && rect.height() >= 0.0
}

/// Rectangle spanned by two corners, in any order.
pub fn rect_from_corners(a: Point, b: Point) -> Rect {
    Rect::from_points(a, b)
}

/// Union of all rectangles, `None` for an empty input.
pub fn union_all(rects: impl IntoIterator<Item = Rect>) -> Option<Rect> {
    rects.into_iter().reduce(|acc, r| acc.union(r))
}

/// Map `point` from `from` onto `to`, preserving its relative position.
/// Degenerate source axes collapse onto the target's origin on that axis.
pub fn remap_point(point: Point, from: Rect, to: Rect) -> Point {
    let fx = if from.width().abs() > EPSILON {
        (point.x - from.x0) / from.width()
    } else {
        0.0
    };
    let fy = if from.height().abs() > EPSILON {
        (point.y - from.y0) / from.height()
    } else {
        0.0
    };
    Point::new(to.x0 + fx * to.width(), to.y0 + fy * to.height())
}

/// Affine mapping `from` onto `to`.
pub fn rect_to_rect(from: Rect, to: Rect) -> Affine {
    let sx = if from.width().abs() > EPSILON {
        to.width() / from.width()
    } else {
        1.0
    };
    let sy = if from.height().abs() > EPSILON {
        to.height() / from.height()
    } else {
        1.0
    };
    Affine::translate(to.origin().to_vec2())
        * Affine::scale_non_uniform(sx, sy)
        * Affine::translate(-from.origin().to_vec2())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn test_compose_applies_right_first() {
        let t = Transform::from_affine(Affine::translate((10.0, 0.0)));
        let s = Transform::from_affine(Affine::scale(2.0));
        let p = t.compose(&s).apply(Point::new(1.0, 1.0));
        assert!(approx(p, Point::new(12.0, 2.0)));
    }

    #[test]
    fn test_inverse_round_trip() {
        let t = Transform::new(2.0, 0.5, -0.25, 1.5, 10.0, -4.0);
        let p = Point::new(3.0, 7.0);
        let back = t.apply_inverse(t.apply(p)).unwrap();
        assert!(approx(back, p));
    }

    #[test]
    fn test_singular_has_no_inverse() {
        let t = Transform::new(0.0, 0.0, 0.0, 0.0, 5.0, 5.0);
        assert!(t.inverse().is_none());
        assert!(t.apply_inverse(Point::ZERO).is_none());
    }

    #[test]
    fn test_translate_is_outer() {
        let mut t = Transform::from_affine(Affine::scale(2.0));
        t.translate(5.0, 0.0, Tick::ZERO);
        assert!(approx(t.apply(Point::new(1.0, 0.0)), Point::new(7.0, 0.0)));
        assert!(!t.is_translation());
    }

    #[test]
    fn test_is_translation() {
        let t = Transform::from_affine(Affine::translate((3.0, 4.0)));
        assert!(t.is_translation());
        assert!(!t.is_identity());
        assert!((t.translation().x - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_contains_inclusive_edges() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(contains_inclusive(r, Point::new(10.0, 10.0)));
        assert!(!contains_inclusive(r, Point::new(10.1, 5.0)));
    }

    #[test]
    fn test_remap_point() {
        let from = Rect::new(0.0, 0.0, 10.0, 10.0);
        let to = Rect::new(100.0, 100.0, 120.0, 140.0);
        assert!(approx(remap_point(Point::new(5.0, 5.0), from, to), Point::new(110.0, 120.0)));
    }

    #[test]
    fn test_rect_to_rect() {
        let from = Rect::new(0.0, 0.0, 10.0, 10.0);
        let to = Rect::new(5.0, 5.0, 25.0, 15.0);
        let m = rect_to_rect(from, to);
        assert!(approx(m * Point::new(10.0, 10.0), Point::new(25.0, 15.0)));
    }

    #[test]
    fn test_union_all() {
        assert!(union_all(Vec::<Rect>::new()).is_none());
        let u = union_all([Rect::new(0.0, 0.0, 1.0, 1.0), Rect::new(5.0, -2.0, 6.0, 0.0)]).unwrap();
        assert_eq!(u, Rect::new(0.0, -2.0, 6.0, 1.0));
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(!is_valid_bounds(Rect::new(10.0, 0.0, 0.0, 5.0)));
        assert!(!is_valid_bounds(Rect::new(0.0, 0.0, f64::NAN, 5.0)));
        assert!(is_valid_bounds(Rect::new(0.0, 0.0, 0.0, 0.0)));
    }
}
