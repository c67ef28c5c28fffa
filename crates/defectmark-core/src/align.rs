//! Alignment and distribution of a multi-selection.
//!
//! These functions only compute per-annotation offsets from bounding boxes;
//! [`Canvas`](crate::canvas::Canvas) applies them under a single history entry.

use crate::annotation::AnnotationId;
use crate::geometry::union_bounds;
use kurbo::{Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Minimum number of shapes for alignment.
pub const MIN_ALIGN: usize = 2;
/// Minimum number of shapes for distribution.
pub const MIN_DISTRIBUTE: usize = 3;

/// Edge or center to align on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignMode {
    Left,
    Right,
    Top,
    Bottom,
    /// Horizontal centers.
    Center,
    /// Vertical centers.
    Middle,
}

impl AlignMode {
    pub fn label(&self) -> &'static str {
        match self {
            AlignMode::Left => "align left",
            AlignMode::Right => "align right",
            AlignMode::Top => "align top",
            AlignMode::Bottom => "align bottom",
            AlignMode::Center => "align center",
            AlignMode::Middle => "align middle",
        }
    }
}

/// Distribution axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub fn label(&self) -> &'static str {
        match self {
            Axis::Horizontal => "distribute horizontal",
            Axis::Vertical => "distribute vertical",
        }
    }

    fn center(&self, bounds: Rect) -> f64 {
        let c = bounds.center();
        match self {
            Axis::Horizontal => c.x,
            Axis::Vertical => c.y,
        }
    }

    fn offset(&self, amount: f64) -> Vec2 {
        match self {
            Axis::Horizontal => Vec2::new(amount, 0.0),
            Axis::Vertical => Vec2::new(0.0, amount),
        }
    }
}

/// Offsets that align every shape to the group's union bounds.
///
/// Empty when fewer than two shapes are given. Shapes already in place get
/// no entry.
pub fn align_offsets(shapes: &[(AnnotationId, Rect)], mode: AlignMode) -> Vec<(AnnotationId, Vec2)> {
    if shapes.len() < MIN_ALIGN {
        return Vec::new();
    }
    let Some(group) = shapes.iter().fold(None, |acc, (_, b)| union_bounds(acc, *b)) else {
        return Vec::new();
    };
    let group_center = group.center();

    shapes
        .iter()
        .map(|(id, b)| {
            let c = b.center();
            let offset = match mode {
                AlignMode::Left => Vec2::new(group.x0 - b.x0, 0.0),
                AlignMode::Right => Vec2::new(group.x1 - b.x1, 0.0),
                AlignMode::Top => Vec2::new(0.0, group.y0 - b.y0),
                AlignMode::Bottom => Vec2::new(0.0, group.y1 - b.y1),
                AlignMode::Center => Vec2::new(group_center.x - c.x, 0.0),
                AlignMode::Middle => Vec2::new(0.0, group_center.y - c.y),
            };
            (*id, offset)
        })
        .filter(|(_, offset)| *offset != Vec2::ZERO)
        .collect()
}

/// Offsets that space bounding-box centers evenly between the outermost two.
///
/// Empty when fewer than three shapes are given.
pub fn distribute_offsets(shapes: &[(AnnotationId, Rect)], axis: Axis) -> Vec<(AnnotationId, Vec2)> {
    if shapes.len() < MIN_DISTRIBUTE {
        return Vec::new();
    }
    let mut sorted: Vec<(AnnotationId, f64)> = shapes.iter().map(|(id, b)| (*id, axis.center(*b))).collect();
    sorted.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    let first = sorted[0].1;
    let last = sorted[sorted.len() - 1].1;
    let step = (last - first) / (sorted.len() - 1) as f64;

    sorted[1..sorted.len() - 1]
        .iter()
        .enumerate()
        .map(|(i, (id, center))| (*id, axis.offset(first + step * (i + 1) as f64 - center)))
        .filter(|(_, offset)| *offset != Vec2::ZERO)
        .collect()
}
