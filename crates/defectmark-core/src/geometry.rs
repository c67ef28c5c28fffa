//! Geometry primitives shared by hit-testing, editing and layout.
//!
//! All functions operate in image space unless stated otherwise. Screen-space
//! tolerances are converted by multiplying image distances by the view scale,
//! which keeps handle sizes constant on screen at any zoom.

use kurbo::{Point, Rect, Vec2};

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    a.distance(b)
}

/// Distance from a point to a line segment (a→b).
///
/// The point is projected onto the segment with `t` clamped to `[0, 1]`;
/// degenerate segments fall back to point distance.
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    point.distance(proj)
}

/// Absolute polygon area using the shoelace formula.
///
/// Winding order does not matter. Fewer than three points have no area.
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        sum += p.x * q.y - q.x * p.y;
    }
    (sum / 2.0).abs()
}

/// Axis-aligned bounding box of a point list, `None` when empty.
pub fn bounding_box(points: &[Point]) -> Option<Rect> {
    let (first, rest) = points.split_first()?;
    Some(
        rest.iter()
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)),
    )
}

/// Union of two optional rectangles.
pub fn union_bounds(acc: Option<Rect>, bounds: Rect) -> Option<Rect> {
    Some(match acc {
        Some(r) => r.union(bounds),
        None => bounds,
    })
}

/// Inclusive containment test (kurbo's `Rect::contains` excludes the far edges).
pub fn rect_contains(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Scale-aware proximity test.
///
/// `a` and `b` are image-space points; the comparison happens in screen space
/// (`distance * scale < threshold_px`), so `threshold_px` is independent of zoom.
pub fn is_near(a: Point, b: Point, scale: f64, threshold_px: f64) -> bool {
    a.distance(b) * scale < threshold_px
}

/// Translate every point by `delta`.
pub fn translate_points(points: &mut [Point], delta: Vec2) {
    for p in points.iter_mut() {
        *p += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_to_segment_interior() {
        let d = point_to_segment_dist(Point::new(5.0, 3.0), Point::ZERO, Point::new(10.0, 0.0));
        assert!((d - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_point_to_segment_clamps_to_endpoint() {
        let d = point_to_segment_dist(Point::new(13.0, 4.0), Point::ZERO, Point::new(10.0, 0.0));
        assert!((d - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_point_to_degenerate_segment() {
        let a = Point::new(2.0, 2.0);
        let d = point_to_segment_dist(Point::new(5.0, 6.0), a, a);
        assert!((d - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_polygon_area_square() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert!((polygon_area(&square) - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_polygon_area_translation_and_reversal_invariant() {
        let tri = vec![Point::new(1.0, 1.0), Point::new(7.0, 2.0), Point::new(3.0, 9.0)];
        let base = polygon_area(&tri);

        let mut moved = tri.clone();
        translate_points(&mut moved, Vec2::new(-120.5, 33.25));
        assert!((polygon_area(&moved) - base).abs() < 1e-9);

        let mut reversed = tri.clone();
        reversed.reverse();
        assert!((polygon_area(&reversed) - base).abs() < 1e-9);
    }

    #[test]
    fn test_polygon_area_degenerate() {
        assert_eq!(polygon_area(&[Point::ZERO, Point::new(1.0, 1.0)]), 0.0);
    }

    #[test]
    fn test_bounding_box() {
        let bounds = bounding_box(&[Point::new(5.0, 5.0), Point::new(-1.0, 8.0), Point::new(3.0, 2.0)])
            .unwrap();
        assert_eq!(bounds, Rect::new(-1.0, 2.0, 5.0, 8.0));
        assert!(bounding_box(&[]).is_none());
    }

    #[test]
    fn test_rect_contains_is_inclusive() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect_contains(r, Point::new(10.0, 10.0)));
        assert!(!rect_contains(r, Point::new(10.1, 5.0)));
    }

    #[test]
    fn test_is_near_scales_with_zoom() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(4.0, 0.0);
        // 4 image units = 8 screen px at 2x, 16 px at 4x
        assert!(is_near(a, b, 2.0, 10.0));
        assert!(!is_near(a, b, 4.0, 10.0));
    }
}
