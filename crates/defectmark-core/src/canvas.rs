//! Annotation document and canvas controller state.

use crate::align::{AlignMode, Axis, align_offsets, distribute_offsets};
use crate::annotation::{Annotation, AnnotationId, LabelCatalog};
use crate::camera::Camera;
use crate::config::EditorConfig;
use crate::editor;
use crate::export::{Detection, ExportDocument, ExportResult};
use crate::geometry::union_bounds;
use crate::history::{History, Snapshot};
use crate::selection::{Selection, hit_test_body};
use crate::tools::{InteractionState, PendingShape, ToolKind};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Screen margin kept around the image by [`Canvas::fit_to_image`].
pub const FIT_MARGIN: f64 = 20.0;

/// Ordered annotation collection (back to front).
///
/// Annotations are reference counted so history snapshots share them;
/// [`get_mut`](Self::get_mut) copies an annotation only while a snapshot
/// still refers to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationDocument {
    /// Unique document identifier.
    pub id: String,
    /// Document name.
    pub name: String,
    annotations: Vec<Arc<Annotation>>,
    /// Next id to hand out; never rewound by undo.
    next_id: u64,
}

impl Default for AnnotationDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: "Untitled".to_string(),
            annotations: Vec::new(),
            next_id: 1,
        }
    }

    /// Id the next created annotation will receive.
    pub fn peek_id(&self) -> AnnotationId {
        AnnotationId(self.next_id)
    }

    /// Reserve a fresh id.
    pub fn allocate_id(&mut self) -> AnnotationId {
        let id = AnnotationId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add an annotation on top of the z-order.
    pub fn add(&mut self, annotation: Annotation) {
        self.next_id = self.next_id.max(annotation.id.0 + 1);
        self.annotations.push(Arc::new(annotation));
    }

    pub fn remove(&mut self, id: AnnotationId) -> Option<Arc<Annotation>> {
        let pos = self.position(id)?;
        Some(self.annotations.remove(pos))
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id).map(|a| a.as_ref())
    }

    /// Mutable access, copying the annotation if a snapshot shares it.
    pub fn get_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|a| a.id == id).map(Arc::make_mut)
    }

    pub fn contains(&self, id: AnnotationId) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: AnnotationId) -> Option<usize> {
        self.annotations.iter().position(|a| a.id == id)
    }

    /// Annotations in z-order (back to front).
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Annotation> {
        self.annotations.iter().map(|a| a.as_ref())
    }

    pub fn annotations(&self) -> &[Arc<Annotation>] {
        &self.annotations
    }

    pub fn ids(&self) -> Vec<AnnotationId> {
        self.annotations.iter().map(|a| a.id).collect()
    }

    /// Cheap copy of the collection for history.
    pub fn snapshot(&self) -> Snapshot {
        self.annotations.clone()
    }

    /// Replace the collection (undo/redo).
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.annotations = snapshot;
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Bring an annotation to the front. Returns false if already there.
    pub fn bring_to_front(&mut self, id: AnnotationId) -> bool {
        match self.position(id) {
            Some(pos) if pos + 1 < self.annotations.len() => {
                let a = self.annotations.remove(pos);
                self.annotations.push(a);
                true
            }
            _ => false,
        }
    }

    /// Send an annotation to the back. Returns false if already there.
    pub fn send_to_back(&mut self, id: AnnotationId) -> bool {
        match self.position(id) {
            Some(pos) if pos > 0 => {
                let a = self.annotations.remove(pos);
                self.annotations.insert(0, a);
                true
            }
            _ => false,
        }
    }

    /// Union bounds of all annotations.
    pub fn bounds(&self) -> Option<Rect> {
        self.iter().fold(None, |acc, a| union_bounds(acc, a.bounds()))
    }

    /// Hittable annotations whose buffered bounds contain `point`, topmost first.
    pub fn shapes_at_point(&self, point: Point, scale: f64, buffer_px: f64) -> Vec<AnnotationId> {
        self.iter()
            .rev()
            .filter(|a| a.is_hittable() && hit_test_body(a, point, scale, buffer_px))
            .map(|a| a.id)
            .collect()
    }
}

/// The canvas controller: document, view, selection, history and the
/// interaction state machine.
#[derive(Debug, Clone)]
pub struct Canvas {
    pub document: AnnotationDocument,
    pub camera: Camera,
    pub config: EditorConfig,
    pub catalog: LabelCatalog,
    pub history: History,
    pub selection: Selection,
    pub interaction: InteractionState,
    /// Loaded image size in pixels.
    pub image_size: Size,
    pub viewport_size: Size,
    /// Last pointer position in screen space.
    pub(crate) pointer: Option<Point>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    /// Create a canvas with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        Self {
            document: AnnotationDocument::new(),
            camera: config.camera(),
            history: History::new(config.history_limit),
            catalog: LabelCatalog::default(),
            selection: Selection::new(),
            interaction: InteractionState::new(),
            image_size: Size::ZERO,
            viewport_size: Size::new(800.0, 600.0),
            pointer: None,
            config,
        }
    }

    /// Set the loaded image's pixel dimensions.
    pub fn set_image_size(&mut self, width: f64, height: f64) {
        self.image_size = Size::new(width, height);
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport_size = Size::new(width, height);
    }

    pub fn scale(&self) -> f64 {
        self.camera.scale()
    }

    /// Annotations in z-order.
    pub fn annotations(&self) -> impl DoubleEndedIterator<Item = &Annotation> {
        self.document.iter()
    }

    /// Set the current tool, dropping any in-progress interaction.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if tool != self.interaction.tool {
            self.selection.clear();
        }
        self.interaction.set_tool(tool);
        self.history.drop_staged();
    }

    pub fn tool(&self) -> ToolKind {
        self.interaction.tool
    }

    /// Preview points of the shape being drawn.
    pub fn pending_preview(&self) -> Option<Vec<Point>> {
        self.interaction.pending.as_ref().map(PendingShape::preview_points)
    }

    /// Select a single annotation (clears previous selection).
    pub fn select(&mut self, id: AnnotationId) {
        if self.document.contains(id) {
            self.selection.select_only(id);
        }
    }

    pub fn add_to_selection(&mut self, id: AnnotationId) {
        if self.document.contains(id) {
            self.selection.add(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Select every visible, unlocked annotation.
    pub fn select_all(&mut self) {
        self.selection = self.document.iter().filter(|a| a.is_hittable()).map(|a| a.id).collect();
    }

    pub fn is_selected(&self, id: AnnotationId) -> bool {
        self.selection.contains(id)
    }

    /// Record the current annotations before an external mutation.
    ///
    /// Ends any nudge sequence, so the next arrow press opens its own entry.
    pub fn request_snapshot(&mut self, label: &str) {
        self.interaction.nudging = false;
        self.history.snapshot(label, self.document.annotations());
    }

    /// Undo the last edit. Clears the selection and any interaction.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.document.snapshot()) {
            Some(entry) => {
                self.document.restore(entry.annotations);
                self.after_history_jump();
                true
            }
            None => false,
        }
    }

    /// Redo the last undone edit.
    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.document.snapshot()) {
            Some(entry) => {
                self.document.restore(entry.annotations);
                self.after_history_jump();
                true
            }
            None => false,
        }
    }

    fn after_history_jump(&mut self) {
        self.selection.clear();
        self.interaction.reset();
    }

    /// Selected annotations that accept geometry edits, in z-order.
    pub fn editable_selection(&self) -> Vec<AnnotationId> {
        self.document
            .iter()
            .filter(|a| self.selection.contains(a.id) && a.is_editable())
            .map(|a| a.id)
            .collect()
    }

    /// Translate annotations without touching history. Locked ones are skipped.
    pub fn translate_annotations(&mut self, ids: &[AnnotationId], delta: Vec2) -> bool {
        let mut changed = false;
        for &id in ids {
            if let Some(a) = self.document.get_mut(id) {
                changed |= editor::translate(a, delta);
            }
        }
        changed
    }

    /// Nudge the selection along a unit `direction`; one history entry per
    /// key-press sequence.
    pub fn nudge_selected(&mut self, direction: Vec2, accelerated: bool) -> bool {
        if self.interaction.active_vertex().is_some() {
            return false;
        }
        let ids = self.editable_selection();
        if ids.is_empty() {
            return false;
        }
        let delta = editor::nudge_delta(
            direction,
            accelerated,
            self.config.nudge_step,
            self.config.nudge_multiplier,
            self.scale(),
        );
        if !self.interaction.nudging {
            self.request_snapshot("nudge");
            self.interaction.nudging = true;
        }
        self.translate_annotations(&ids, delta)
    }

    /// Delete selected annotations; locked ones stay.
    pub fn delete_selected(&mut self) -> bool {
        let ids = self.editable_selection();
        if ids.is_empty() {
            return false;
        }
        self.request_snapshot("delete");
        for id in ids {
            self.document.remove(id);
            self.selection.remove(id);
        }
        true
    }

    /// Apply a label key and its catalog color.
    pub fn set_label(&mut self, id: AnnotationId, label: &str) -> bool {
        let color = self.catalog.color_for(label);
        match self.document.get(id) {
            Some(a) if a.label != label || a.color != color => {}
            _ => return false,
        }
        self.request_snapshot("set label");
        if let Some(a) = self.document.get_mut(id) {
            a.label = label.to_string();
            a.color = color;
        }
        true
    }

    pub fn toggle_visibility(&mut self, id: AnnotationId) -> bool {
        if !self.document.contains(id) {
            return false;
        }
        self.request_snapshot("toggle visibility");
        if let Some(a) = self.document.get_mut(id) {
            a.visible = !a.visible;
            if !a.visible {
                self.selection.remove(id);
            }
        }
        true
    }

    pub fn toggle_lock(&mut self, id: AnnotationId) -> bool {
        if !self.document.contains(id) {
            return false;
        }
        self.request_snapshot("toggle lock");
        if let Some(a) = self.document.get_mut(id) {
            a.locked = !a.locked;
        }
        true
    }

    /// Lock all selected annotations, or unlock them if all are locked.
    pub fn toggle_lock_selected(&mut self) -> bool {
        let ids = self.selection.to_vec();
        if ids.is_empty() {
            return false;
        }
        let lock = ids.iter().any(|id| self.document.get(*id).is_some_and(|a| !a.locked));
        self.request_snapshot(if lock { "lock" } else { "unlock" });
        for id in ids {
            if let Some(a) = self.document.get_mut(id) {
                a.locked = lock;
            }
        }
        true
    }

    /// Hide all selected annotations (they leave the selection).
    pub fn hide_selected(&mut self) -> bool {
        let ids = self.selection.to_vec();
        if ids.is_empty() {
            return false;
        }
        self.request_snapshot("hide");
        for id in ids {
            if let Some(a) = self.document.get_mut(id) {
                a.visible = false;
            }
        }
        self.selection.clear();
        true
    }

    /// Show every hidden annotation.
    pub fn show_all(&mut self) -> bool {
        let hidden: Vec<AnnotationId> = self.document.iter().filter(|a| !a.visible).map(|a| a.id).collect();
        if hidden.is_empty() {
            return false;
        }
        self.request_snapshot("show all");
        for id in hidden {
            if let Some(a) = self.document.get_mut(id) {
                a.visible = true;
            }
        }
        true
    }

    pub fn bring_to_front(&mut self, id: AnnotationId) -> bool {
        self.reorder(&[id], "bring to front", AnnotationDocument::bring_to_front)
    }

    pub fn send_to_back(&mut self, id: AnnotationId) -> bool {
        self.reorder(&[id], "send to back", AnnotationDocument::send_to_back)
    }

    /// Bring the selection to the front, keeping its relative order.
    pub fn bring_selected_to_front(&mut self) -> bool {
        let ids = self.selection_in_z_order();
        self.reorder(&ids, "bring to front", AnnotationDocument::bring_to_front)
    }

    /// Send the selection to the back, keeping its relative order.
    pub fn send_selected_to_back(&mut self) -> bool {
        let mut ids = self.selection_in_z_order();
        ids.reverse();
        self.reorder(&ids, "send to back", AnnotationDocument::send_to_back)
    }

    fn selection_in_z_order(&self) -> Vec<AnnotationId> {
        self.document
            .iter()
            .filter(|a| self.selection.contains(a.id))
            .map(|a| a.id)
            .collect()
    }

    fn reorder(
        &mut self,
        ids: &[AnnotationId],
        label: &str,
        op: fn(&mut AnnotationDocument, AnnotationId) -> bool,
    ) -> bool {
        let before = self.document.ids();
        let mut reordered = self.document.clone();
        for &id in ids {
            op(&mut reordered, id);
        }
        if reordered.ids() == before {
            return false;
        }
        self.request_snapshot(label);
        self.document = reordered;
        true
    }

    fn editable_bounds(&self) -> Vec<(AnnotationId, Rect)> {
        self.editable_selection()
            .into_iter()
            .filter_map(|id| self.document.get(id).map(|a| (id, a.bounds())))
            .collect()
    }

    fn apply_offsets(&mut self, label: &str, offsets: Vec<(AnnotationId, Vec2)>) -> bool {
        if offsets.is_empty() {
            return false;
        }
        self.request_snapshot(label);
        for (id, offset) in offsets {
            if let Some(a) = self.document.get_mut(id) {
                editor::translate(a, offset);
            }
        }
        true
    }

    /// Align the unlocked members of the selection (needs at least two).
    pub fn align_selected(&mut self, mode: AlignMode) -> bool {
        let offsets = align_offsets(&self.editable_bounds(), mode);
        self.apply_offsets(mode.label(), offsets)
    }

    /// Distribute the unlocked members of the selection (needs at least three).
    pub fn distribute_selected(&mut self, axis: Axis) -> bool {
        let offsets = distribute_offsets(&self.editable_bounds(), axis);
        self.apply_offsets(axis.label(), offsets)
    }

    /// Insert externally detected regions as rectangles under one history entry.
    pub fn insert_detections(&mut self, detections: &[Detection]) -> Vec<AnnotationId> {
        let valid: Vec<&Detection> = detections
            .iter()
            .filter(|d| {
                if !d.is_finite() {
                    log::warn!("Skipping detection with non-finite coordinates: {:?}", d);
                }
                d.is_finite()
            })
            .collect();
        if valid.is_empty() {
            return Vec::new();
        }

        self.request_snapshot("import detections");
        let (w, h) = (self.image_size.width, self.image_size.height);
        let mut ids = Vec::with_capacity(valid.len());
        for det in valid {
            let [a, b] = det.to_points(w, h);
            let id = self.document.allocate_id();
            let color = self.catalog.color_for(&det.label);
            self.document.add(Annotation::rectangle(id, det.label.clone(), a, b, color));
            ids.push(id);
        }
        log::debug!("Inserted {} detections", ids.len());
        ids
    }

    /// Load annotations from a report, appending to the document.
    pub fn import_report(&mut self, report: &ExportDocument) -> ExportResult<Vec<AnnotationId>> {
        report.validate()?;
        if self.image_size == Size::ZERO {
            self.set_image_size(report.image_width as f64, report.image_height as f64);
        }
        if report.shapes.is_empty() {
            return Ok(Vec::new());
        }
        self.request_snapshot("import report");
        let ids = report
            .shapes
            .iter()
            .map(|shape| {
                let id = self.document.allocate_id();
                let color = self.catalog.color_for(&shape.label);
                self.document.add(shape.to_annotation(id, color));
                id
            })
            .collect();
        Ok(ids)
    }

    /// Build the report for the current annotations.
    pub fn export_report(&self, image_name: Option<String>) -> ExportDocument {
        ExportDocument::new(
            self.image_size.width.round() as u32,
            self.image_size.height.round() as u32,
            image_name,
            self.document.iter(),
        )
    }

    /// Fit the image into the viewport.
    pub fn fit_to_image(&mut self) {
        self.camera.fit_image(self.image_size, self.viewport_size, FIT_MARGIN);
    }
}
