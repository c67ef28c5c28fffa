//! Selection set, manipulation handles and hit-testing.
//!
//! Thresholds are given in screen pixels and compared against image-space
//! distances multiplied by the view scale, so handles keep a constant
//! on-screen size at any zoom.

use crate::annotation::{Annotation, AnnotationId};
use crate::geometry::{is_near, point_to_segment_dist, rect_contains};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Vertex/corner handle hit radius in screen pixels.
pub const VERTEX_HIT_TOLERANCE: f64 = 10.0;
/// Polygon edge hover distance in screen pixels.
pub const EDGE_HIT_TOLERANCE: f64 = 8.0;
/// Bounding box inflation for body hits, in screen pixels.
pub const BODY_HIT_BUFFER: f64 = 5.0;

/// Rectangle corner positions, in displayed vertex order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Corner::TopLeft),
            1 => Some(Corner::TopRight),
            2 => Some(Corner::BottomRight),
            3 => Some(Corner::BottomLeft),
            _ => None,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Corner::TopLeft => 0,
            Corner::TopRight => 1,
            Corner::BottomRight => 2,
            Corner::BottomLeft => 3,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomRight => Corner::TopLeft,
            Corner::BottomLeft => Corner::TopRight,
        }
    }
}

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// Polygon vertex by index.
    Vertex(usize),
    /// Rectangle corner.
    Corner(Corner),
}

impl HandleKind {
    /// Index into [`Annotation::vertices`].
    pub fn index(&self) -> usize {
        match self {
            HandleKind::Vertex(i) => *i,
            HandleKind::Corner(c) => c.index(),
        }
    }
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    /// Position in image coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }
}

/// Get the manipulation handles for an annotation.
pub fn get_handles(annotation: &Annotation) -> Vec<Handle> {
    annotation
        .vertices()
        .into_iter()
        .enumerate()
        .filter_map(|(i, p)| {
            let kind = if annotation.is_rectangle() {
                HandleKind::Corner(Corner::from_index(i)?)
            } else {
                HandleKind::Vertex(i)
            };
            Some(Handle::new(p, kind))
        })
        .collect()
}

/// Nearest handle within `tolerance_px` of `point` (image space), if any.
pub fn hit_test_handles(annotation: &Annotation, point: Point, scale: f64, tolerance_px: f64) -> Option<HandleKind> {
    get_handles(annotation)
        .into_iter()
        .filter(|h| is_near(h.position, point, scale, tolerance_px))
        .min_by(|a, b| {
            a.position
                .distance(point)
                .total_cmp(&b.position.distance(point))
        })
        .map(|h| h.kind)
}

/// Index of the closest polygon edge within `tolerance_px`, if any.
///
/// Rectangles have no insertable edges.
pub fn hit_test_edge(annotation: &Annotation, point: Point, scale: f64, tolerance_px: f64) -> Option<usize> {
    if !annotation.is_polygon() {
        return None;
    }
    annotation
        .edges()
        .into_iter()
        .map(|(i, a, b)| (i, point_to_segment_dist(point, a, b)))
        .filter(|(_, d)| d * scale < tolerance_px)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Check whether `point` falls inside the annotation's bounds inflated by
/// `buffer_px` screen pixels.
pub fn hit_test_body(annotation: &Annotation, point: Point, scale: f64, buffer_px: f64) -> bool {
    let pad = buffer_px / scale;
    rect_contains(annotation.bounds().inflate(pad, pad), point)
}

/// Set of selected annotation ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    ids: BTreeSet<AnnotationId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection with a single id.
    pub fn select_only(&mut self, id: AnnotationId) {
        self.ids.clear();
        self.ids.insert(id);
    }

    pub fn add(&mut self, id: AnnotationId) -> bool {
        self.ids.insert(id)
    }

    pub fn remove(&mut self, id: AnnotationId) -> bool {
        self.ids.remove(&id)
    }

    /// Flip membership of `id`. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: AnnotationId) -> bool {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: AnnotationId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The selected id when exactly one annotation is selected.
    pub fn single(&self) -> Option<AnnotationId> {
        if self.ids.len() == 1 {
            self.ids.iter().next().copied()
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = AnnotationId> + '_ {
        self.ids.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<AnnotationId> {
        self.ids.iter().copied().collect()
    }

    /// Keep only ids satisfying `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(AnnotationId) -> bool) {
        self.ids.retain(|id| keep(*id));
    }
}

impl FromIterator<AnnotationId> for Selection {
    fn from_iter<I: IntoIterator<Item = AnnotationId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
