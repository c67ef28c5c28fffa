//! Event scripts: a recorded session replayed against the canvas engine.

use crate::error::{CliError, CliResult};
use defectmark_core::{
    AlignMode, Axis, Canvas, Detection, EditorAction, EditorConfig, ExportDocument, FocusContext, InputEvent,
    LabelCatalog, LabelInfo, ToolKind,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Image the session annotates.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageSource {
    /// Image file; its header supplies the size when width/height are absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Name written to the report (defaults to the file name).
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// One replayed step.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Raw pointer or keyboard input.
    Input {
        event: InputEvent,
        #[serde(default)]
        focus: FocusContext,
    },
    /// A keyboard command by name.
    Action { action: EditorAction },
    Tool { tool: ToolKind },
    /// Label the current selection (what the label picker would do).
    SetLabel { label: String },
    Align { mode: AlignMode },
    Distribute { axis: Axis },
    /// Insert auto-detected regions.
    Detections { detections: Vec<Detection> },
    FitToImage,
}

/// A recorded session.
#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    pub image: ImageSource,
    #[serde(default)]
    pub viewport: Option<Viewport>,
    #[serde(default)]
    pub labels: Vec<LabelInfo>,
    /// Report to start from.
    #[serde(default)]
    pub report: Option<ExportDocument>,
    pub steps: Vec<Step>,
}

/// Outcome of a replay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub steps: usize,
    pub completed_shapes: usize,
    pub edits: usize,
}

impl Script {
    pub fn from_json(json: &str) -> CliResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a script file.
    pub fn load(path: &Path) -> CliResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Image size, reading the file header when not given explicitly.
    /// Relative paths resolve against `base_dir`.
    pub fn image_size(&self, base_dir: &Path) -> CliResult<(u32, u32)> {
        if let (Some(w), Some(h)) = (self.image.width, self.image.height) {
            return Ok((w, h));
        }
        let path = self.image.path.as_ref().ok_or(CliError::MissingImageSize)?;
        let path = base_dir.join(path);
        let size = image::image_dimensions(&path)?;
        log::debug!("Read {}x{} from {}", size.0, size.1, path.display());
        Ok(size)
    }

    /// Name for the report.
    pub fn image_name(&self) -> Option<String> {
        self.image.name.clone().or_else(|| {
            self.image
                .path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
        })
    }

    /// Build a canvas for this script and replay every step.
    pub fn replay(&self, config: EditorConfig, image_size: (u32, u32)) -> CliResult<(Canvas, ReplayStats)> {
        let mut canvas = Canvas::with_config(config);
        canvas.catalog = LabelCatalog::new(self.labels.clone());
        canvas.set_image_size(image_size.0 as f64, image_size.1 as f64);
        if let Some(viewport) = self.viewport {
            canvas.set_viewport_size(viewport.width, viewport.height);
        }
        if let Some(report) = &self.report {
            canvas.import_report(report)?;
        }

        let mut stats = ReplayStats::default();
        for step in &self.steps {
            stats.steps += 1;
            let changed = match step {
                Step::Input { event, focus } => {
                    let response = canvas.handle_event(event.clone(), *focus);
                    if let Some(done) = response.completed {
                        log::info!("Completed shape {} at {:?}", done.id, done.anchor_screen);
                        stats.completed_shapes += 1;
                    }
                    response.annotations_changed
                }
                Step::Action { action } => canvas.perform_action(*action),
                Step::Tool { tool } => {
                    canvas.set_tool(*tool);
                    false
                }
                Step::SetLabel { label } => {
                    let ids = canvas.selection.to_vec();
                    ids.into_iter().fold(false, |changed, id| canvas.set_label(id, label) || changed)
                }
                Step::Align { mode } => canvas.align_selected(*mode),
                Step::Distribute { axis } => canvas.distribute_selected(*axis),
                Step::Detections { detections } => !canvas.insert_detections(detections).is_empty(),
                Step::FitToImage => {
                    canvas.fit_to_image();
                    false
                }
            };
            if changed {
                stats.edits += 1;
            }
        }
        Ok((canvas, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SCRIPT: &str = r#"{
        "image": {"width": 640, "height": 480, "name": "panel.png"},
        "labels": [{"key": "scratch", "display_name": "Scratch"}],
        "steps": [
            {"op": "tool", "tool": "rectangle"},
            {"op": "input", "event": {"kind": "down", "position": {"x": 10.0, "y": 10.0}, "button": "Left"}},
            {"op": "input", "event": {"kind": "up", "position": {"x": 60.0, "y": 40.0}, "button": "Left"}},
            {"op": "set_label", "label": "dent"},
            {"op": "tool", "tool": "polygon"},
            {"op": "input", "event": {"kind": "down", "position": {"x": 100.0, "y": 100.0}, "button": "Left"}},
            {"op": "input", "event": {"kind": "down", "position": {"x": 200.0, "y": 100.0}, "button": "Left"}},
            {"op": "input", "event": {"kind": "down", "position": {"x": 150.0, "y": 200.0}, "button": "Left"}},
            {"op": "input", "event": {"kind": "down", "position": {"x": 101.0, "y": 101.0}, "button": "Left"}},
            {"op": "action", "action": "undo"},
            {"op": "action", "action": "redo"},
            {"op": "detections", "detections": [{"xmin": 0.5, "ymin": 0.5, "xmax": 0.75, "ymax": 1.0, "label": "crack"}]}
        ]
    }"#;

    #[test]
    fn test_replay_builds_report() {
        let script = Script::from_json(SCRIPT).unwrap();
        let size = script.image_size(Path::new(".")).unwrap();
        let (canvas, stats) = script.replay(EditorConfig::default(), size).unwrap();

        assert_eq!(stats.steps, 12);
        assert_eq!(stats.completed_shapes, 2);

        let report = canvas.export_report(script.image_name());
        assert_eq!(report.image_width, 640);
        assert_eq!(report.image_name.as_deref(), Some("panel.png"));
        assert_eq!(report.shapes.len(), 3);
        assert_eq!(report.shapes[0].label, "dent");
        assert_eq!(report.shapes[0].points, vec![[10.0, 10.0], [60.0, 40.0]]);
        assert_eq!(report.shapes[1].points.len(), 3);
        assert_eq!(report.shapes[1].label, "scratch");
        assert_eq!(report.shapes[2].points, vec![[320.0, 240.0], [480.0, 480.0]]);
    }

    #[test]
    fn test_image_size_requires_source() {
        let script = Script::from_json(r#"{"image": {}, "steps": []}"#).unwrap();
        assert!(matches!(script.image_size(Path::new(".")), Err(CliError::MissingImageSize)));
    }

    #[test]
    fn test_image_name_from_path() {
        let script = Script::from_json(r#"{"image": {"path": "shots/weld.jpg"}, "steps": []}"#).unwrap();
        assert_eq!(script.image_name().as_deref(), Some("weld.jpg"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = Script::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CliError::Read { .. }));
    }

    #[test]
    fn test_unknown_op_rejected() {
        assert!(Script::from_json(r#"{"image": {}, "steps": [{"op": "explode"}]}"#).is_err());
    }
}
