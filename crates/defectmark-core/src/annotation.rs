//! Annotation data model and label catalog.

use crate::geometry::{bounding_box, polygon_area, translate_points};
use kurbo::{Point, Rect, Vec2};
use peniko::Color;
use peniko::color::{AlphaColor, Hsl, Srgb};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label key used when the catalog is empty.
pub const UNLABELED: &str = "unlabeled";

/// Minimum number of points a polygon keeps.
pub const MIN_POLYGON_POINTS: usize = 3;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    /// Opaque color from hue (degrees), saturation and lightness in `[0, 1]`.
    pub fn from_hsl(hue: f64, saturation: f64, lightness: f64) -> Self {
        let hsl = AlphaColor::<Hsl>::new([
            hue.rem_euclid(360.0) as f32,
            (saturation * 100.0) as f32,
            (lightness * 100.0) as f32,
            1.0,
        ]);
        hsl.convert::<Srgb>().into()
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Unique, creation-ordered annotation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(pub u64);

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Geometry kind of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    /// Two opposite corners, in any order.
    Rectangle,
    /// Three or more vertices in winding order.
    Polygon,
}

impl AnnotationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationKind::Rectangle => "rectangle",
            AnnotationKind::Polygon => "polygon",
        }
    }
}

/// A labeled region on the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    /// Label key (looked up in the [`LabelCatalog`]).
    pub label: String,
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    /// Image-space points.
    pub points: Vec<Point>,
    pub color: SerializableColor,
    pub visible: bool,
    /// Locked annotations refuse every interactive geometry edit.
    pub locked: bool,
}

impl Annotation {
    /// Create a rectangle from two opposite corners, kept in the given order.
    pub fn rectangle(id: AnnotationId, label: impl Into<String>, a: Point, b: Point, color: SerializableColor) -> Self {
        Self {
            id,
            label: label.into(),
            kind: AnnotationKind::Rectangle,
            points: vec![a, b],
            color,
            visible: true,
            locked: false,
        }
    }

    /// Create a polygon from its vertices.
    pub fn polygon(id: AnnotationId, label: impl Into<String>, points: Vec<Point>, color: SerializableColor) -> Self {
        Self {
            id,
            label: label.into(),
            kind: AnnotationKind::Polygon,
            points,
            color,
            visible: true,
            locked: false,
        }
    }

    pub fn is_rectangle(&self) -> bool {
        self.kind == AnnotationKind::Rectangle
    }

    pub fn is_polygon(&self) -> bool {
        self.kind == AnnotationKind::Polygon
    }

    /// Check the point-count invariant for this kind.
    pub fn is_well_formed(&self) -> bool {
        match self.kind {
            AnnotationKind::Rectangle => self.points.len() == 2,
            AnnotationKind::Polygon => self.points.len() >= MIN_POLYGON_POINTS,
        }
    }

    /// Axis-aligned bounds (rectangle corners are normalized here).
    pub fn bounds(&self) -> Rect {
        bounding_box(&self.points).unwrap_or(Rect::ZERO)
    }

    /// Area in square image units.
    pub fn area(&self) -> f64 {
        match self.kind {
            AnnotationKind::Rectangle => self.bounds().area(),
            AnnotationKind::Polygon => polygon_area(&self.points),
        }
    }

    /// Vertices as shown to the user: the four normalized corners for
    /// rectangles (top-left, top-right, bottom-right, bottom-left), the
    /// stored points for polygons.
    pub fn vertices(&self) -> Vec<Point> {
        match self.kind {
            AnnotationKind::Rectangle => {
                let b = self.bounds();
                vec![
                    Point::new(b.x0, b.y0),
                    Point::new(b.x1, b.y0),
                    Point::new(b.x1, b.y1),
                    Point::new(b.x0, b.y1),
                ]
            }
            AnnotationKind::Polygon => self.points.clone(),
        }
    }

    /// Edges as `(start_index, start, end)`, closing back to the first vertex.
    pub fn edges(&self) -> Vec<(usize, Point, Point)> {
        let verts = self.vertices();
        let n = verts.len();
        (0..n).map(|i| (i, verts[i], verts[(i + 1) % n])).collect()
    }

    /// Whether interactive geometry edits are allowed.
    pub fn is_editable(&self) -> bool {
        !self.locked
    }

    /// Whether pointer hit-testing may pick this annotation.
    pub fn is_hittable(&self) -> bool {
        self.visible && !self.locked
    }

    /// Translate every point.
    pub fn translate(&mut self, delta: Vec2) {
        translate_points(&mut self.points, delta);
    }
}

/// Display metadata for one label key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelInfo {
    pub key: String,
    pub display_name: String,
    /// Fixed color; derived from the key when absent.
    #[serde(default)]
    pub color: Option<SerializableColor>,
}

impl LabelInfo {
    pub fn new(key: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            color: None,
        }
    }
}

/// Label key → display name / color lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelCatalog {
    pub labels: Vec<LabelInfo>,
}

impl LabelCatalog {
    pub fn new(labels: Vec<LabelInfo>) -> Self {
        Self { labels }
    }

    /// Label applied to freshly drawn shapes.
    pub fn default_label(&self) -> &str {
        self.labels.first().map(|l| l.key.as_str()).unwrap_or(UNLABELED)
    }

    pub fn get(&self, key: &str) -> Option<&LabelInfo> {
        self.labels.iter().find(|l| l.key == key)
    }

    /// Human readable name, falling back to the key itself.
    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.get(key).map(|l| l.display_name.as_str()).unwrap_or(key)
    }

    /// Deterministic color for a label key.
    pub fn color_for(&self, key: &str) -> SerializableColor {
        if let Some(color) = self.get(key).and_then(|l| l.color) {
            return color;
        }
        // FNV-1a over the key picks a stable hue
        let hash = key.bytes().fold(0xcbf29ce484222325u64, |h, b| {
            (h ^ b as u64).wrapping_mul(0x100000001b3)
        });
        SerializableColor::from_hsl((hash % 360) as f64, 0.75, 0.5)
    }
}
