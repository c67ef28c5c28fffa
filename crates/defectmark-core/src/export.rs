//! Annotation report (JSON) and detection import records.

use crate::annotation::{Annotation, AnnotationId, AnnotationKind, MIN_POLYGON_POINTS, SerializableColor};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Report errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Shape {index} is malformed: {reason}")]
    MalformedShape { index: usize, reason: String },
}

/// Result type for report operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// One shape in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportShape {
    pub label: String,
    /// `[[x, y], ...]` in image space.
    pub points: Vec<[f64; 2]>,
    pub shape_type: AnnotationKind,
    /// Always `null`; kept for schema compatibility.
    #[serde(default)]
    pub group_id: Option<u64>,
    #[serde(default)]
    pub flags: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub locked: bool,
}

impl ExportShape {
    pub fn from_annotation(annotation: &Annotation) -> Self {
        Self {
            label: annotation.label.clone(),
            points: annotation.points.iter().map(|p| [p.x, p.y]).collect(),
            shape_type: annotation.kind,
            group_id: None,
            flags: serde_json::Map::new(),
            locked: annotation.locked,
        }
    }

    /// Check point count and finiteness.
    pub fn validate(&self) -> Result<(), String> {
        match self.shape_type {
            AnnotationKind::Rectangle if self.points.len() != 2 => {
                return Err(format!("rectangle needs 2 points, has {}", self.points.len()));
            }
            AnnotationKind::Polygon if self.points.len() < MIN_POLYGON_POINTS => {
                return Err(format!("polygon needs at least 3 points, has {}", self.points.len()));
            }
            _ => {}
        }
        if self.points.iter().flatten().any(|v| !v.is_finite()) {
            return Err("non-finite coordinate".to_string());
        }
        Ok(())
    }

    /// Build an annotation with a fresh id.
    pub fn to_annotation(&self, id: AnnotationId, color: SerializableColor) -> Annotation {
        Annotation {
            id,
            label: self.label.clone(),
            kind: self.shape_type,
            points: self.points.iter().map(|[x, y]| Point::new(*x, *y)).collect(),
            color,
            visible: true,
            locked: self.locked,
        }
    }
}

/// The exported annotation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub image_width: u32,
    pub image_height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
    pub shapes: Vec<ExportShape>,
}

impl ExportDocument {
    /// Build a report from annotations in z-order.
    pub fn new<'a>(
        image_width: u32,
        image_height: u32,
        image_name: Option<String>,
        annotations: impl IntoIterator<Item = &'a Annotation>,
    ) -> Self {
        Self {
            image_width,
            image_height,
            image_name,
            shapes: annotations.into_iter().map(ExportShape::from_annotation).collect(),
        }
    }

    /// Fail on the first malformed shape.
    pub fn validate(&self) -> ExportResult<()> {
        for (index, shape) in self.shapes.iter().enumerate() {
            shape
                .validate()
                .map_err(|reason| ExportError::MalformedShape { index, reason })?;
        }
        Ok(())
    }

    pub fn to_json(&self) -> ExportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a report.
    pub fn from_json(json: &str) -> ExportResult<Self> {
        let doc: Self = serde_json::from_str(json)?;
        doc.validate()?;
        Ok(doc)
    }

    pub fn save(&self, path: &Path) -> ExportResult<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> ExportResult<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

/// A detected region in normalized `[0, 1]` image coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    pub label: String,
}

impl Detection {
    pub fn is_finite(&self) -> bool {
        [self.xmin, self.ymin, self.xmax, self.ymax].iter().all(|v| v.is_finite())
    }

    /// Rectangle corners in image space.
    pub fn to_points(&self, image_width: f64, image_height: f64) -> [Point; 2] {
        [
            Point::new(self.xmin * image_width, self.ymin * image_height),
            Point::new(self.xmax * image_width, self.ymax * image_height),
        ]
    }
}
