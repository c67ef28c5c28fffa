//! Tool system for the annotation canvas.
//!
//! All transient interaction state lives in one serializable
//! [`InteractionState`] value owned by the canvas controller. At most one
//! gesture is active at a time, and a pending (uncommitted) shape can only
//! coexist with an idle pointer or a pan.

use crate::annotation::AnnotationId;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    Rectangle,
    Polygon,
}

impl ToolKind {
    /// All tools, in palette order.
    pub const ALL: [ToolKind; 4] = [ToolKind::Select, ToolKind::Pan, ToolKind::Rectangle, ToolKind::Polygon];

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Pan => "pan",
            ToolKind::Rectangle => "rectangle",
            ToolKind::Polygon => "polygon",
        }
    }

    /// Whether this tool draws new annotations.
    pub fn is_drawing(&self) -> bool {
        matches!(self, ToolKind::Rectangle | ToolKind::Polygon)
    }
}

/// The vertex currently targeted by a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveVertex {
    pub annotation_id: AnnotationId,
    /// Index into the annotation's displayed vertices.
    pub index: usize,
}

/// A polygon edge under the pointer, eligible for vertex insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeHover {
    pub annotation_id: AnnotationId,
    /// Index of the edge's starting vertex.
    pub index: usize,
}

/// Pointer gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Gesture {
    #[default]
    Idle,
    /// Screen-delta panning.
    Panning { last_screen: Point },
    /// Moving the selected annotations.
    DraggingShapes {
        /// Image-space pointer at the previous move event.
        last_image: Point,
    },
    /// Dragging one vertex or rectangle corner.
    DraggingVertex {
        vertex: ActiveVertex,
        /// Fixed opposite corner for rectangle resizes.
        anchor: Option<Point>,
    },
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }

    pub fn is_panning(&self) -> bool {
        matches!(self, Gesture::Panning { .. })
    }

    pub fn active_vertex(&self) -> Option<ActiveVertex> {
        match self {
            Gesture::DraggingVertex { vertex, .. } => Some(*vertex),
            _ => None,
        }
    }
}

/// In-progress, uncommitted shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendingShape {
    Rectangle {
        anchor: Point,
        /// Latest pointer position, for preview only.
        current: Point,
    },
    Polygon {
        points: Vec<Point>,
        /// Latest pointer position, for the rubber-band segment.
        cursor: Option<Point>,
    },
}

impl PendingShape {
    /// Points to draw as a preview (rectangle as two corners).
    pub fn preview_points(&self) -> Vec<Point> {
        match self {
            PendingShape::Rectangle { anchor, current } => vec![*anchor, *current],
            PendingShape::Polygon { points, cursor } => {
                let mut pts = points.clone();
                pts.extend(cursor.iter().copied());
                pts
            }
        }
    }

    fn tool(&self) -> ToolKind {
        match self {
            PendingShape::Rectangle { .. } => ToolKind::Rectangle,
            PendingShape::Polygon { .. } => ToolKind::Polygon,
        }
    }
}

/// Explicit, serializable interaction state of the canvas controller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InteractionState {
    /// Currently selected tool.
    pub tool: ToolKind,
    /// Active pointer gesture.
    pub gesture: Gesture,
    /// Shape being drawn.
    pub pending: Option<PendingShape>,
    /// Space bar held: temporary pan.
    pub space_held: bool,
    /// Polygon edge under the pointer (Select tool only).
    pub hovered_edge: Option<EdgeHover>,
    /// An arrow-key nudge sequence is in progress.
    pub nudging: bool,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch tools, dropping every transient buffer.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if self.tool != tool {
            log::debug!("Tool changed: {} -> {}", self.tool.name(), tool.name());
        }
        self.tool = tool;
        self.reset();
    }

    /// Clear gesture, pending shape, hover and nudge state (keeps the tool).
    pub fn reset(&mut self) {
        self.gesture = Gesture::Idle;
        self.pending = None;
        self.hovered_edge = None;
        self.nudging = false;
    }

    /// Whether pointer-down should start a pan instead of tool dispatch.
    pub fn wants_pan(&self) -> bool {
        self.tool == ToolKind::Pan || self.space_held
    }

    pub fn active_vertex(&self) -> Option<ActiveVertex> {
        self.gesture.active_vertex()
    }

    /// Pending polygon points, if a polygon is being drawn.
    pub fn pending_polygon(&self) -> Option<&[Point]> {
        match &self.pending {
            Some(PendingShape::Polygon { points, .. }) => Some(points),
            _ => None,
        }
    }

    /// Check the mutual-exclusion rules between tool, gesture and pending shape.
    pub fn is_consistent(&self) -> bool {
        let gesture_ok = match self.gesture {
            Gesture::Idle | Gesture::Panning { .. } => true,
            Gesture::DraggingShapes { .. } | Gesture::DraggingVertex { .. } => {
                self.tool == ToolKind::Select && self.pending.is_none()
            }
        };
        let pending_ok = self.pending.as_ref().is_none_or(|p| p.tool() == self.tool);
        let hover_ok = self.hovered_edge.is_none() || self.tool == ToolKind::Select;
        gesture_ok && pending_ok && hover_ok
    }
}
