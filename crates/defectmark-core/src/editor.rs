//! Pure geometry mutations on annotations.
//!
//! Every mutating function refuses locked annotations and returns whether it
//! changed anything, so callers can skip history entries for no-ops.

use crate::annotation::{Annotation, AnnotationId, MIN_POLYGON_POINTS, SerializableColor};
use crate::selection::Corner;
use kurbo::{Point, Vec2};

/// Rectangles must exceed this extent (image units) on both axes.
pub const MIN_RECT_EXTENT: f64 = 1.0;

/// Build a rectangle from a drag, or `None` if it is too small on either axis.
pub fn create_rectangle(
    id: AnnotationId,
    label: &str,
    anchor: Point,
    release: Point,
    color: SerializableColor,
    min_extent: f64,
) -> Option<Annotation> {
    let d = release - anchor;
    if d.x.abs() > min_extent && d.y.abs() > min_extent {
        Some(Annotation::rectangle(id, label, anchor, release, color))
    } else {
        None
    }
}

/// Build a polygon, or `None` with fewer than three points.
pub fn create_polygon(id: AnnotationId, label: &str, points: Vec<Point>, color: SerializableColor) -> Option<Annotation> {
    if points.len() < MIN_POLYGON_POINTS {
        return None;
    }
    Some(Annotation::polygon(id, label, points, color))
}

/// Translate an annotation by `delta`.
pub fn translate(annotation: &mut Annotation, delta: Vec2) -> bool {
    if annotation.locked || delta == Vec2::ZERO {
        return false;
    }
    annotation.translate(delta);
    true
}

/// Fixed corner used while dragging `corner` of a rectangle.
pub fn rectangle_anchor(annotation: &Annotation, corner: Corner) -> Point {
    annotation.vertices()[corner.opposite().index()]
}

/// Resize a rectangle by dragging `corner` to `pointer`, keeping `anchor`
/// (the opposite corner recorded at drag start) fixed.
pub fn resize_rectangle(annotation: &mut Annotation, corner: Corner, anchor: Point, pointer: Point) -> bool {
    if annotation.locked || !annotation.is_rectangle() {
        return false;
    }
    let points = match corner {
        Corner::TopLeft => [pointer, anchor],
        Corner::BottomRight => [anchor, pointer],
        Corner::TopRight => [Point::new(anchor.x, pointer.y), Point::new(pointer.x, anchor.y)],
        Corner::BottomLeft => [Point::new(pointer.x, anchor.y), Point::new(anchor.x, pointer.y)],
    };
    if annotation.points == points {
        return false;
    }
    annotation.points = points.to_vec();
    true
}

/// Replace the polygon vertex at `index`.
pub fn move_vertex(annotation: &mut Annotation, index: usize, pointer: Point) -> bool {
    if annotation.locked || !annotation.is_polygon() {
        return false;
    }
    match annotation.points.get_mut(index) {
        Some(p) if *p != pointer => {
            *p = pointer;
            true
        }
        _ => false,
    }
}

/// Insert a vertex right after the start of edge `edge_index`.
/// Returns the new vertex index.
pub fn insert_vertex(annotation: &mut Annotation, edge_index: usize, point: Point) -> Option<usize> {
    if annotation.locked || !annotation.is_polygon() || edge_index >= annotation.points.len() {
        return None;
    }
    let index = edge_index + 1;
    annotation.points.insert(index, point);
    Some(index)
}

/// Remove a polygon vertex, refused at the three-point floor.
pub fn delete_vertex(annotation: &mut Annotation, index: usize) -> bool {
    if annotation.locked
        || !annotation.is_polygon()
        || annotation.points.len() <= MIN_POLYGON_POINTS
        || index >= annotation.points.len()
    {
        return false;
    }
    annotation.points.remove(index);
    true
}

/// Image-space displacement for one arrow-key nudge.
///
/// `direction` is a unit vector; the step is divided by the view scale so the
/// on-screen displacement is the same at every zoom.
pub fn nudge_delta(direction: Vec2, accelerated: bool, step: f64, multiplier: f64, scale: f64) -> Vec2 {
    let amount = if accelerated { step * multiplier } else { step };
    direction * (amount / scale)
}
