//! Event routing for tool interactions.
//!
//! [`Canvas::handle_event`] is the single entry point for pointer and
//! keyboard input. Pan (Pan tool, held Space or middle button) takes
//! priority over every tool; otherwise the active tool decides.

use crate::annotation::AnnotationId;
use crate::camera::ViewTransform;
use crate::canvas::Canvas;
use crate::config::EditorAction;
use crate::editor;
use crate::geometry::is_near;
use crate::input::{FocusContext, InputEvent, KeyEvent, Modifiers, MouseButton, PointerEvent, arrow_direction, keys};
use crate::selection::{Corner, HandleKind, Selection, hit_test_edge, hit_test_handles};
use crate::tools::{ActiveVertex, EdgeHover, Gesture, PendingShape, ToolKind};
use kurbo::{Point, Vec2};
use std::sync::Arc;

/// A shape just committed by a drawing tool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletedShape {
    pub id: AnnotationId,
    /// Screen position to anchor the label picker at.
    pub anchor_screen: Point,
}

/// What an event changed, for the host to re-render or react to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventResponse {
    pub annotations_changed: bool,
    pub selection_changed: bool,
    pub view_changed: bool,
    /// Set when a rectangle or polygon was just created.
    pub completed: Option<CompletedShape>,
}

impl EventResponse {
    pub fn needs_redraw(&self) -> bool {
        self.annotations_changed || self.selection_changed || self.view_changed || self.completed.is_some()
    }
}

struct Before {
    annotations: Vec<Arc<crate::annotation::Annotation>>,
    selection: Selection,
    view: ViewTransform,
}

impl Canvas {
    /// Process one input event.
    ///
    /// Key presses are ignored while `focus` is a text field; key releases
    /// are still tracked so held-key state stays consistent.
    pub fn handle_event(&mut self, event: impl Into<InputEvent>, focus: FocusContext) -> EventResponse {
        // Holding the old Arcs makes every in-place edit copy-on-write,
        // so pointer comparison detects changes.
        let before = Before {
            annotations: self.document.snapshot(),
            selection: self.selection.clone(),
            view: self.camera.view,
        };

        let completed = match event.into() {
            InputEvent::Pointer(event) => self.handle_pointer(event),
            InputEvent::Key(event) => {
                self.handle_key(event, focus);
                None
            }
        };

        let now = self.document.annotations();
        let annotations_changed = before.annotations.len() != now.len()
            || before.annotations.iter().zip(now).any(|(a, b)| !Arc::ptr_eq(a, b));

        EventResponse {
            annotations_changed,
            selection_changed: before.selection != self.selection,
            view_changed: before.view != self.camera.view,
            completed,
        }
    }

    fn handle_pointer(&mut self, event: PointerEvent) -> Option<CompletedShape> {
        match event {
            PointerEvent::Down {
                position,
                button,
                modifiers,
            } => self.handle_press(position, button, modifiers),
            PointerEvent::Move { position } => {
                self.handle_drag(position);
                None
            }
            PointerEvent::Up { position, button } => self.handle_release(position, button),
            PointerEvent::Scroll { position, delta } => {
                self.pointer = Some(position);
                self.camera.zoom_wheel(position, delta.y);
                None
            }
        }
    }

    fn handle_press(&mut self, position: Point, button: MouseButton, modifiers: Modifiers) -> Option<CompletedShape> {
        self.pointer = Some(position);
        self.interaction.nudging = false;
        if !self.interaction.gesture.is_idle() {
            return None;
        }

        if button == MouseButton::Middle || (button == MouseButton::Left && self.interaction.wants_pan()) {
            self.interaction.gesture = Gesture::Panning { last_screen: position };
            return None;
        }
        if button != MouseButton::Left {
            return None;
        }

        let point = self.camera.to_image(position);
        match self.interaction.tool {
            ToolKind::Select => {
                self.select_press(point, modifiers);
                None
            }
            ToolKind::Rectangle => {
                self.interaction.pending = Some(PendingShape::Rectangle {
                    anchor: point,
                    current: point,
                });
                None
            }
            ToolKind::Polygon => self.polygon_press(point, position),
            ToolKind::Pan => None,
        }
    }

    /// Select tool press: handles of the single selection first, then a
    /// hovered polygon edge, then shape bodies, then empty space.
    fn select_press(&mut self, point: Point, modifiers: Modifiers) {
        let scale = self.scale();

        let single = self
            .selection
            .single()
            .and_then(|id| self.document.get(id))
            .filter(|a| a.is_hittable());
        if let Some(annotation) = single {
            let id = annotation.id;
            if let Some(handle) = hit_test_handles(annotation, point, scale, self.config.vertex_hit_px) {
                if modifiers.alt {
                    let deletable = annotation.points.len() > crate::annotation::MIN_POLYGON_POINTS;
                    if let (HandleKind::Vertex(index), true) = (handle, deletable) {
                        self.request_snapshot("delete vertex");
                        if let Some(a) = self.document.get_mut(id) {
                            editor::delete_vertex(a, index);
                        }
                        self.interaction.hovered_edge = None;
                    }
                    return;
                }

                let anchor = match handle {
                    HandleKind::Corner(corner) => Some(editor::rectangle_anchor(annotation, corner)),
                    HandleKind::Vertex(_) => None,
                };
                let label = if anchor.is_some() { "resize" } else { "move vertex" };
                self.history.stage(label);
                self.interaction.gesture = Gesture::DraggingVertex {
                    vertex: ActiveVertex {
                        annotation_id: id,
                        index: handle.index(),
                    },
                    anchor,
                };
                return;
            }

            let edge = self.interaction.hovered_edge.filter(|edge| {
                edge.annotation_id == id
                    && hit_test_edge(annotation, point, scale, self.config.edge_hit_px) == Some(edge.index)
            });
            if let Some(edge) = edge {
                self.request_snapshot("insert vertex");
                let inserted = self
                    .document
                    .get_mut(id)
                    .and_then(|a| editor::insert_vertex(a, edge.index, point));
                if let Some(index) = inserted {
                    self.interaction.gesture = Gesture::DraggingVertex {
                        vertex: ActiveVertex {
                            annotation_id: id,
                            index,
                        },
                        anchor: None,
                    };
                }
                self.interaction.hovered_edge = None;
                return;
            }
        }

        let hit = self
            .document
            .shapes_at_point(point, scale, self.config.body_hit_px)
            .first()
            .copied();

        match hit {
            Some(id) => {
                if modifiers.command() {
                    if !self.selection.toggle(id) {
                        return;
                    }
                } else if !self.selection.contains(id) {
                    self.selection.select_only(id);
                }
                self.history.stage("move");
                self.interaction.gesture = Gesture::DraggingShapes { last_image: point };
            }
            None => {
                if !(modifiers.command() || modifiers.shift) {
                    self.selection.clear();
                }
            }
        }
        self.interaction.hovered_edge = None;
    }

    fn polygon_press(&mut self, point: Point, screen: Point) -> Option<CompletedShape> {
        let scale = self.scale();
        let close_px = self.config.close_polygon_px;

        let Some(PendingShape::Polygon { points, cursor }) = &mut self.interaction.pending else {
            self.interaction.pending = Some(PendingShape::Polygon {
                points: vec![point],
                cursor: Some(point),
            });
            return None;
        };

        let closes = points.len() >= crate::annotation::MIN_POLYGON_POINTS
            && points.first().is_some_and(|first| is_near(*first, point, scale, close_px));
        if !closes {
            points.push(point);
            *cursor = Some(point);
            return None;
        }

        let points = std::mem::take(points);
        self.interaction.pending = None;
        let id = self.document.peek_id();
        let label = self.catalog.default_label().to_string();
        let color = self.catalog.color_for(&label);
        let polygon = editor::create_polygon(id, &label, points, color)?;

        self.request_snapshot("create polygon");
        self.document.add(polygon);
        self.selection.select_only(id);
        log::debug!("Created polygon {}", id);
        Some(CompletedShape {
            id,
            anchor_screen: screen,
        })
    }

    fn handle_drag(&mut self, position: Point) {
        self.pointer = Some(position);
        let point = self.camera.to_image(position);

        match self.interaction.gesture {
            Gesture::Panning { last_screen } => {
                self.camera.pan(position - last_screen);
                self.interaction.gesture = Gesture::Panning { last_screen: position };
            }
            Gesture::DraggingShapes { last_image } => {
                let delta = point - last_image;
                let ids = self.editable_selection();
                let before = self.document.snapshot();
                if self.translate_annotations(&ids, delta) {
                    self.history.commit_staged(before);
                }
                self.interaction.gesture = Gesture::DraggingShapes { last_image: point };
            }
            Gesture::DraggingVertex { vertex, anchor } => {
                let before = self.document.snapshot();
                let changed = self.document.get_mut(vertex.annotation_id).is_some_and(|a| {
                    match (anchor, Corner::from_index(vertex.index)) {
                        (Some(anchor), Some(corner)) => editor::resize_rectangle(a, corner, anchor, point),
                        _ => editor::move_vertex(a, vertex.index, point),
                    }
                });
                if changed {
                    self.history.commit_staged(before);
                }
            }
            Gesture::Idle => self.update_hover(point),
        }
    }

    /// Track the hovered polygon edge and the pending shape preview.
    fn update_hover(&mut self, point: Point) {
        match &mut self.interaction.pending {
            Some(PendingShape::Rectangle { current, .. }) => *current = point,
            Some(PendingShape::Polygon { cursor, .. }) => *cursor = Some(point),
            None => {}
        }

        self.interaction.hovered_edge = None;
        if self.interaction.tool != ToolKind::Select {
            return;
        }
        let scale = self.scale();
        let Some(annotation) = self
            .selection
            .single()
            .and_then(|id| self.document.get(id))
            .filter(|a| a.is_hittable())
        else {
            return;
        };
        if hit_test_handles(annotation, point, scale, self.config.vertex_hit_px).is_some() {
            return;
        }
        self.interaction.hovered_edge =
            hit_test_edge(annotation, point, scale, self.config.edge_hit_px).map(|index| EdgeHover {
                annotation_id: annotation.id,
                index,
            });
    }

    fn handle_release(&mut self, position: Point, button: MouseButton) -> Option<CompletedShape> {
        match self.interaction.gesture {
            Gesture::Panning { .. } => {
                self.handle_drag(position);
                self.interaction.gesture = Gesture::Idle;
                None
            }
            Gesture::DraggingShapes { .. } | Gesture::DraggingVertex { .. } => {
                self.handle_drag(position);
                self.end_gesture();
                None
            }
            Gesture::Idle => {
                self.pointer = Some(position);
                if button == MouseButton::Left && self.interaction.tool == ToolKind::Rectangle {
                    self.rectangle_release(self.camera.to_image(position), position)
                } else {
                    None
                }
            }
        }
    }

    fn rectangle_release(&mut self, point: Point, screen: Point) -> Option<CompletedShape> {
        let Some(PendingShape::Rectangle { anchor, .. }) = self.interaction.pending.take() else {
            return None;
        };

        let id = self.document.peek_id();
        let label = self.catalog.default_label().to_string();
        let color = self.catalog.color_for(&label);
        let created = editor::create_rectangle(id, &label, anchor, point, color, self.config.min_rect_extent);

        match created {
            Some(rect) => {
                self.request_snapshot("create rectangle");
                self.document.add(rect);
                self.set_tool(ToolKind::Select);
                self.selection.select_only(id);
                log::debug!("Created rectangle {}", id);
                Some(CompletedShape {
                    id,
                    anchor_screen: screen,
                })
            }
            None => {
                log::debug!("Discarded degenerate rectangle");
                self.set_tool(ToolKind::Select);
                None
            }
        }
    }

    /// Finish a drag in place; an untouched drag leaves no history entry.
    fn end_gesture(&mut self) {
        self.history.drop_staged();
        self.interaction.gesture = Gesture::Idle;
    }

    fn handle_key(&mut self, event: KeyEvent, focus: FocusContext) {
        match event {
            KeyEvent::Released { key } => {
                if key == keys::SPACE {
                    self.interaction.space_held = false;
                    if self.interaction.gesture.is_panning() {
                        self.interaction.gesture = Gesture::Idle;
                    }
                } else if arrow_direction(&key).is_some() {
                    self.interaction.nudging = false;
                }
            }
            KeyEvent::Pressed { key, modifiers } => {
                if !focus.accepts_shortcuts() {
                    return;
                }
                if let Some(direction) = arrow_direction(&key) {
                    self.nudge_selected(direction, modifiers.shift);
                    return;
                }
                // Any other key ends the nudge sequence.
                self.interaction.nudging = false;
                if key == keys::SPACE {
                    self.interaction.space_held = true;
                    return;
                }
                if let Some(action) = self.config.key_bindings.action_for(&key, modifiers) {
                    self.perform_action(action);
                }
            }
        }
    }

    /// Run a keyboard command.
    pub fn perform_action(&mut self, action: EditorAction) -> bool {
        if let Some(tool) = action.tool() {
            self.set_tool(tool);
            return true;
        }
        match action {
            EditorAction::Undo => self.undo(),
            EditorAction::Redo => self.redo(),
            EditorAction::DeleteSelected => self.delete_selected(),
            EditorAction::SelectAll => {
                self.select_all();
                true
            }
            EditorAction::Cancel => self.cancel(),
            EditorAction::RemoveLastPoint => self.remove_last_pending_point(),
            EditorAction::BringToFront => self.bring_selected_to_front(),
            EditorAction::SendToBack => self.send_selected_to_back(),
            EditorAction::ToggleLock => self.toggle_lock_selected(),
            EditorAction::ToggleVisibility => {
                if self.selection.is_empty() {
                    self.show_all()
                } else {
                    self.hide_selected()
                }
            }
            EditorAction::ToolSelect | EditorAction::ToolPan | EditorAction::ToolRectangle | EditorAction::ToolPolygon => {
                false
            }
        }
    }

    /// Escape: drop the pending shape, or end the gesture and clear the selection.
    pub fn cancel(&mut self) -> bool {
        if self.interaction.pending.take().is_some() {
            return true;
        }
        let had_state = !self.interaction.gesture.is_idle() || !self.selection.is_empty();
        self.end_gesture();
        self.interaction.hovered_edge = None;
        self.selection.clear();
        had_state
    }

    /// Remove the last point of the pending polygon.
    pub fn remove_last_pending_point(&mut self) -> bool {
        let Some(PendingShape::Polygon { points, .. }) = &mut self.interaction.pending else {
            return false;
        };
        points.pop();
        if points.is_empty() {
            self.interaction.pending = None;
        }
        true
    }

    /// Pan the view by a screen delta (e.g. from a scrollbar).
    pub fn pan_view(&mut self, delta: Vec2) {
        self.camera.pan(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Annotation, LabelCatalog, LabelInfo, SerializableColor};

    fn down(canvas: &mut Canvas, x: f64, y: f64) -> EventResponse {
        down_with(canvas, x, y, Modifiers::NONE)
    }

    fn down_with(canvas: &mut Canvas, x: f64, y: f64, modifiers: Modifiers) -> EventResponse {
        canvas.handle_event(
            PointerEvent::Down {
                position: Point::new(x, y),
                button: MouseButton::Left,
                modifiers,
            },
            FocusContext::Canvas,
        )
    }

    fn move_to(canvas: &mut Canvas, x: f64, y: f64) -> EventResponse {
        canvas.handle_event(PointerEvent::Move { position: Point::new(x, y) }, FocusContext::Canvas)
    }

    fn up(canvas: &mut Canvas, x: f64, y: f64) -> EventResponse {
        canvas.handle_event(
            PointerEvent::Up {
                position: Point::new(x, y),
                button: MouseButton::Left,
            },
            FocusContext::Canvas,
        )
    }

    fn click(canvas: &mut Canvas, x: f64, y: f64) -> EventResponse {
        let mut response = down(canvas, x, y);
        let release = up(canvas, x, y);
        response.completed = response.completed.or(release.completed);
        response
    }

    fn press(canvas: &mut Canvas, key: &str) -> EventResponse {
        canvas.handle_event(KeyEvent::pressed(key), FocusContext::Canvas)
    }

    fn add_rect(canvas: &mut Canvas, x0: f64, y0: f64, x1: f64, y1: f64) -> AnnotationId {
        let id = canvas.document.allocate_id();
        canvas.document.add(Annotation::rectangle(
            id,
            "scratch",
            Point::new(x0, y0),
            Point::new(x1, y1),
            SerializableColor::black(),
        ));
        id
    }

    fn add_square_polygon(canvas: &mut Canvas) -> AnnotationId {
        let id = canvas.document.allocate_id();
        canvas.document.add(Annotation::polygon(
            id,
            "crack",
            vec![
                Point::new(100.0, 100.0),
                Point::new(200.0, 100.0),
                Point::new(200.0, 200.0),
                Point::new(100.0, 200.0),
            ],
            SerializableColor::black(),
        ));
        id
    }

    #[test]
    fn test_draw_rectangle() {
        let mut canvas = Canvas::new();
        canvas.catalog = LabelCatalog::new(vec![LabelInfo::new("scratch", "Scratch")]);
        canvas.set_tool(ToolKind::Rectangle);

        down(&mut canvas, 0.0, 0.0);
        move_to(&mut canvas, 3.0, 3.0);
        assert_eq!(canvas.pending_preview(), Some(vec![Point::ZERO, Point::new(3.0, 3.0)]));
        assert!(canvas.document.is_empty());
        let response = up(&mut canvas, 5.0, 5.0);

        let completed = response.completed.unwrap();
        assert_eq!(completed.anchor_screen, Point::new(5.0, 5.0));
        let rect = canvas.document.get(completed.id).unwrap();
        assert_eq!(rect.points, vec![Point::ZERO, Point::new(5.0, 5.0)]);
        assert_eq!(rect.label, "scratch");
        assert_eq!(canvas.tool(), ToolKind::Select);
        assert!(canvas.is_selected(completed.id));
        assert!(response.annotations_changed);
        assert_eq!(canvas.history.undo_label(), Some("create rectangle"));
        assert!(canvas.interaction.is_consistent());
    }

    #[test]
    fn test_degenerate_rectangle_discarded() {
        let mut canvas = Canvas::new();
        canvas.set_tool(ToolKind::Rectangle);
        down(&mut canvas, 0.0, 0.0);
        let response = up(&mut canvas, 0.0, 1.0);
        assert!(response.completed.is_none());
        assert!(canvas.document.is_empty());
        assert!(!canvas.history.can_undo());
        assert_eq!(canvas.tool(), ToolKind::Select);
    }

    #[test]
    fn test_rectangle_extent_is_image_space() {
        let mut canvas = Canvas::new();
        canvas.camera.view = ViewTransform::new(4.0, 0.0, 0.0);
        canvas.set_tool(ToolKind::Rectangle);
        // 6 screen px = 1.5 image units on each axis
        down(&mut canvas, 0.0, 0.0);
        assert!(up(&mut canvas, 6.0, 6.0).completed.is_some());
        canvas.set_tool(ToolKind::Rectangle);
        down(&mut canvas, 0.0, 0.0);
        assert!(up(&mut canvas, 4.0, 40.0).completed.is_none());
    }

    #[test]
    fn test_draw_polygon_closes_near_first_point() {
        let mut canvas = Canvas::new();
        canvas.set_tool(ToolKind::Polygon);

        click(&mut canvas, 0.0, 0.0);
        click(&mut canvas, 10.0, 0.0);
        click(&mut canvas, 10.0, 10.0);
        assert_eq!(canvas.interaction.pending_polygon().map(|p| p.len()), Some(3));
        assert!(!canvas.history.can_undo());

        let response = click(&mut canvas, 2.0, 3.0);
        let completed = response.completed.unwrap();
        let polygon = canvas.document.get(completed.id).unwrap();
        assert_eq!(polygon.points.len(), 3);
        assert!(canvas.interaction.pending.is_none());
        assert_eq!(canvas.tool(), ToolKind::Polygon);
        assert_eq!(canvas.history.undo_label(), Some("create polygon"));
    }

    #[test]
    fn test_polygon_far_click_appends() {
        let mut canvas = Canvas::new();
        canvas.set_tool(ToolKind::Polygon);
        for (x, y) in [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 40.0)] {
            click(&mut canvas, x, y);
        }
        assert_eq!(canvas.interaction.pending_polygon().map(|p| p.len()), Some(4));
        assert!(canvas.document.is_empty());
    }

    #[test]
    fn test_polygon_close_threshold_scales_with_zoom() {
        let mut canvas = Canvas::new();
        canvas.camera.view = ViewTransform::new(4.0, 0.0, 0.0);
        canvas.set_tool(ToolKind::Polygon);
        // Screen clicks; image points are a quarter of these
        for (x, y) in [(0.0, 0.0), (400.0, 0.0), (400.0, 400.0)] {
            click(&mut canvas, x, y);
        }
        // 20 screen px from the first point: outside 15 px
        click(&mut canvas, 20.0, 0.0);
        assert!(canvas.document.is_empty());
        // 12 screen px: closes
        assert!(click(&mut canvas, 0.0, 12.0).completed.is_some());
    }

    #[test]
    fn test_polygon_escape_and_backspace() {
        let mut canvas = Canvas::new();
        canvas.set_tool(ToolKind::Polygon);
        click(&mut canvas, 0.0, 0.0);
        click(&mut canvas, 50.0, 0.0);
        press(&mut canvas, keys::BACKSPACE);
        assert_eq!(canvas.interaction.pending_polygon().map(|p| p.len()), Some(1));
        press(&mut canvas, keys::BACKSPACE);
        assert!(canvas.interaction.pending.is_none());

        click(&mut canvas, 0.0, 0.0);
        press(&mut canvas, keys::ESCAPE);
        assert!(canvas.interaction.pending.is_none());
        assert_eq!(canvas.tool(), ToolKind::Polygon);
        assert!(!canvas.history.can_undo());
    }

    #[test]
    fn test_click_selects_topmost_and_drags() {
        let mut canvas = Canvas::new();
        let a = add_rect(&mut canvas, 0.0, 0.0, 100.0, 100.0);
        let b = add_rect(&mut canvas, 50.0, 50.0, 150.0, 150.0);

        let response = down(&mut canvas, 75.0, 75.0);
        assert!(response.selection_changed);
        assert!(canvas.is_selected(b));
        assert!(!canvas.is_selected(a));

        move_to(&mut canvas, 80.0, 75.0);
        move_to(&mut canvas, 85.0, 70.0);
        up(&mut canvas, 85.0, 70.0);
        assert_eq!(canvas.document.get(b).unwrap().bounds().origin(), Point::new(60.0, 45.0));
        assert_eq!(canvas.history.undo_len(), 1);
        assert_eq!(canvas.history.undo_label(), Some("move"));
    }

    #[test]
    fn test_click_without_move_leaves_no_history() {
        let mut canvas = Canvas::new();
        add_rect(&mut canvas, 0.0, 0.0, 100.0, 100.0);
        click(&mut canvas, 50.0, 50.0);
        assert!(!canvas.history.can_undo());
        assert!(!canvas.history.has_staged());
    }

    #[test]
    fn test_multi_selection_drag() {
        let mut canvas = Canvas::new();
        let a = add_rect(&mut canvas, 0.0, 0.0, 10.0, 10.0);
        let b = add_rect(&mut canvas, 100.0, 0.0, 110.0, 10.0);
        click(&mut canvas, 5.0, 5.0);
        click_with_ctrl(&mut canvas, 105.0, 5.0);
        assert_eq!(canvas.selection.len(), 2);

        // Plain press on an already-selected shape keeps the group
        down(&mut canvas, 5.0, 5.0);
        assert_eq!(canvas.selection.len(), 2);
        move_to(&mut canvas, 5.0, 25.0);
        up(&mut canvas, 5.0, 25.0);
        assert!((canvas.document.get(a).unwrap().bounds().y0 - 20.0).abs() < 1e-12);
        assert!((canvas.document.get(b).unwrap().bounds().y0 - 20.0).abs() < 1e-12);

        // Ctrl-click toggles out
        click_with_ctrl(&mut canvas, 105.0, 25.0);
        assert_eq!(canvas.selection.to_vec(), vec![a]);
    }

    fn click_with_ctrl(canvas: &mut Canvas, x: f64, y: f64) {
        down_with(canvas, x, y, Modifiers::ctrl());
        up(canvas, x, y);
    }

    #[test]
    fn test_empty_click_clears_selection() {
        let mut canvas = Canvas::new();
        let a = add_rect(&mut canvas, 0.0, 0.0, 10.0, 10.0);
        canvas.select(a);
        click_with_ctrl(&mut canvas, 500.0, 500.0);
        assert!(canvas.is_selected(a));
        click(&mut canvas, 500.0, 500.0);
        assert!(canvas.selection.is_empty());
    }

    #[test]
    fn test_locked_shape_not_clickable() {
        let mut canvas = Canvas::new();
        let a = add_rect(&mut canvas, 0.0, 0.0, 10.0, 10.0);
        canvas.toggle_lock(a);
        click(&mut canvas, 5.0, 5.0);
        assert!(canvas.selection.is_empty());
    }

    #[test]
    fn test_drag_polygon_vertex() {
        let mut canvas = Canvas::new();
        let id = add_square_polygon(&mut canvas);
        canvas.select(id);

        down(&mut canvas, 203.0, 198.0);
        assert_eq!(
            canvas.interaction.active_vertex(),
            Some(ActiveVertex {
                annotation_id: id,
                index: 2
            })
        );
        move_to(&mut canvas, 250.0, 260.0);
        up(&mut canvas, 250.0, 260.0);
        assert_eq!(canvas.document.get(id).unwrap().points[2], Point::new(250.0, 260.0));
        assert!(canvas.interaction.active_vertex().is_none());
        assert_eq!(canvas.history.undo_label(), Some("move vertex"));

        assert!(canvas.undo());
        assert_eq!(canvas.document.get(id).unwrap().points[2], Point::new(200.0, 200.0));
    }

    #[test]
    fn test_resize_rectangle_corner() {
        let mut canvas = Canvas::new();
        let id = add_rect(&mut canvas, 10.0, 10.0, 50.0, 50.0);
        canvas.select(id);

        down(&mut canvas, 10.0, 10.0);
        move_to(&mut canvas, 0.0, 5.0);
        up(&mut canvas, 0.0, 5.0);
        let bounds = canvas.document.get(id).unwrap().bounds();
        assert_eq!(bounds, kurbo::Rect::new(0.0, 5.0, 50.0, 50.0));
        assert_eq!(canvas.history.undo_label(), Some("resize"));
    }

    #[test]
    fn test_edge_hover_then_insert_vertex() {
        let mut canvas = Canvas::new();
        let id = add_square_polygon(&mut canvas);
        canvas.select(id);

        move_to(&mut canvas, 150.0, 103.0);
        assert_eq!(
            canvas.interaction.hovered_edge,
            Some(EdgeHover {
                annotation_id: id,
                index: 0
            })
        );
        down(&mut canvas, 150.0, 103.0);
        assert_eq!(canvas.document.get(id).unwrap().points.len(), 5);
        assert_eq!(canvas.interaction.active_vertex().map(|v| v.index), Some(1));

        move_to(&mut canvas, 150.0, 80.0);
        up(&mut canvas, 150.0, 80.0);
        assert_eq!(canvas.document.get(id).unwrap().points[1], Point::new(150.0, 80.0));
        // Insertion and drag form one undo step
        assert_eq!(canvas.history.undo_len(), 1);
        canvas.undo();
        assert_eq!(canvas.document.get(id).unwrap().points.len(), 4);
    }

    #[test]
    fn test_alt_click_deletes_vertex_with_floor() {
        let mut canvas = Canvas::new();
        let id = add_square_polygon(&mut canvas);
        canvas.select(id);

        down_with(&mut canvas, 100.0, 100.0, Modifiers::alt());
        up(&mut canvas, 100.0, 100.0);
        assert_eq!(canvas.document.get(id).unwrap().points.len(), 3);

        down_with(&mut canvas, 200.0, 100.0, Modifiers::alt());
        up(&mut canvas, 200.0, 100.0);
        assert_eq!(canvas.document.get(id).unwrap().points.len(), 3);
        assert_eq!(canvas.history.undo_len(), 1);
    }

    #[test]
    fn test_pan_priority_with_space() {
        let mut canvas = Canvas::new();
        let a = add_rect(&mut canvas, 0.0, 0.0, 100.0, 100.0);
        press(&mut canvas, keys::SPACE);
        down(&mut canvas, 50.0, 50.0);
        let response = move_to(&mut canvas, 60.0, 70.0);
        assert!(response.view_changed);
        assert!(!canvas.is_selected(a));
        assert_eq!(canvas.camera.view.translation(), Vec2::new(10.0, 20.0));

        canvas.handle_event(KeyEvent::released(keys::SPACE), FocusContext::Canvas);
        assert!(canvas.interaction.gesture.is_idle());
        assert_eq!(canvas.document.get(a).unwrap().bounds().origin(), Point::ZERO);
    }

    #[test]
    fn test_middle_button_pans_during_polygon() {
        let mut canvas = Canvas::new();
        canvas.set_tool(ToolKind::Polygon);
        click(&mut canvas, 0.0, 0.0);
        canvas.handle_event(
            PointerEvent::Down {
                position: Point::new(10.0, 10.0),
                button: MouseButton::Middle,
                modifiers: Modifiers::NONE,
            },
            FocusContext::Canvas,
        );
        move_to(&mut canvas, 20.0, 10.0);
        canvas.handle_event(
            PointerEvent::Up {
                position: Point::new(20.0, 10.0),
                button: MouseButton::Middle,
            },
            FocusContext::Canvas,
        );
        assert_eq!(canvas.interaction.pending_polygon().map(|p| p.len()), Some(1));
        assert!((canvas.camera.view.x - 10.0).abs() < 1e-12);
        assert!(canvas.interaction.is_consistent());
    }

    #[test]
    fn test_wheel_zoom() {
        let mut canvas = Canvas::new();
        let response = canvas.handle_event(
            PointerEvent::Scroll {
                position: Point::new(100.0, 100.0),
                delta: Vec2::new(0.0, -1.0),
            },
            FocusContext::Canvas,
        );
        assert!(response.view_changed);
        assert!((canvas.scale() - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_arrow_nudge_at_zoom() {
        let mut canvas = Canvas::new();
        let a = add_rect(&mut canvas, 10.0, 10.0, 20.0, 20.0);
        canvas.select(a);
        canvas.camera.view.scale = 2.0;

        press(&mut canvas, keys::ARROW_LEFT);
        let p = canvas.document.get(a).unwrap().points[0];
        assert!((p.x - 9.5).abs() < 1e-12);
        assert!((p.y - 10.0).abs() < 1e-12);

        canvas.handle_event(
            KeyEvent::Pressed {
                key: keys::ARROW_LEFT.to_string(),
                modifiers: Modifiers::NONE,
            },
            FocusContext::Canvas,
        );
        canvas.handle_event(KeyEvent::released(keys::ARROW_LEFT), FocusContext::Canvas);
        assert_eq!(canvas.history.undo_len(), 1);

        press(&mut canvas, keys::ARROW_DOWN);
        assert_eq!(canvas.history.undo_len(), 2);
    }

    #[test]
    fn test_text_focus_ignores_shortcuts() {
        let mut canvas = Canvas::new();
        let a = add_rect(&mut canvas, 0.0, 0.0, 10.0, 10.0);
        canvas.select(a);
        canvas.handle_event(KeyEvent::pressed(keys::DELETE), FocusContext::TextInput);
        canvas.handle_event(KeyEvent::pressed("r"), FocusContext::TextInput);
        assert!(canvas.document.contains(a));
        assert_eq!(canvas.tool(), ToolKind::Select);

        press(&mut canvas, keys::DELETE);
        assert!(!canvas.document.contains(a));
    }

    #[test]
    fn test_undo_redo_shortcuts() {
        let mut canvas = Canvas::new();
        canvas.set_tool(ToolKind::Rectangle);
        down(&mut canvas, 0.0, 0.0);
        up(&mut canvas, 20.0, 20.0);
        assert_eq!(canvas.document.len(), 1);

        canvas.handle_event(KeyEvent::pressed_with("z", Modifiers::ctrl()), FocusContext::Canvas);
        assert!(canvas.document.is_empty());
        assert!(canvas.selection.is_empty());

        let redo = Modifiers {
            ctrl: true,
            shift: true,
            ..Modifiers::NONE
        };
        canvas.handle_event(KeyEvent::pressed_with("Z", redo), FocusContext::Canvas);
        assert_eq!(canvas.document.len(), 1);
    }

    #[test]
    fn test_escape_ends_drag_and_clears_selection() {
        let mut canvas = Canvas::new();
        let a = add_rect(&mut canvas, 0.0, 0.0, 10.0, 10.0);
        down(&mut canvas, 5.0, 5.0);
        move_to(&mut canvas, 8.0, 5.0);
        press(&mut canvas, keys::ESCAPE);
        assert!(canvas.interaction.gesture.is_idle());
        assert!(canvas.selection.is_empty());
        assert!((canvas.document.get(a).unwrap().bounds().x0 - 3.0).abs() < 1e-12);
        assert!(canvas.history.can_undo());
    }

    fn press_ctrl(canvas: &mut Canvas, key: &str) -> EventResponse {
        canvas.handle_event(KeyEvent::pressed_with(key, Modifiers::ctrl()), FocusContext::Canvas)
    }

    #[test]
    fn test_command_while_drawing_polygon_keeps_own_entry() {
        let mut canvas = Canvas::new();
        let hidden = add_rect(&mut canvas, 300.0, 300.0, 310.0, 310.0);
        canvas.toggle_visibility(hidden);
        canvas.set_tool(ToolKind::Polygon);

        click(&mut canvas, 0.0, 0.0);
        click(&mut canvas, 50.0, 0.0);
        click(&mut canvas, 50.0, 50.0);
        press_ctrl(&mut canvas, "h");
        assert!(canvas.document.get(hidden).unwrap().visible);
        assert!(click(&mut canvas, 1.0, 1.0).completed.is_some());

        assert_eq!(canvas.history.undo_len(), 3);
        assert_eq!(canvas.history.undo_label(), Some("create polygon"));

        canvas.undo();
        assert_eq!(canvas.document.len(), 1);
        assert!(canvas.document.get(hidden).unwrap().visible);

        canvas.undo();
        assert!(!canvas.document.get(hidden).unwrap().visible);
    }

    #[test]
    fn test_command_during_drag_keeps_own_entry() {
        let mut canvas = Canvas::new();
        let a = add_rect(&mut canvas, 0.0, 0.0, 10.0, 10.0);
        let b = add_rect(&mut canvas, 20.0, 0.0, 30.0, 10.0);

        down(&mut canvas, 5.0, 5.0);
        press_ctrl(&mut canvas, "]");
        assert_eq!(canvas.document.ids(), vec![b, a]);
        move_to(&mut canvas, 5.0, 25.0);
        up(&mut canvas, 5.0, 25.0);
        assert_eq!(canvas.history.undo_len(), 2);

        canvas.undo();
        assert!(canvas.document.get(a).unwrap().bounds().y0.abs() < 1e-12);
        assert_eq!(canvas.document.ids(), vec![b, a]);

        canvas.undo();
        assert_eq!(canvas.document.ids(), vec![a, b]);
    }

    #[test]
    fn test_command_ends_nudge_sequence() {
        let mut canvas = Canvas::new();
        let a = add_rect(&mut canvas, 0.0, 0.0, 10.0, 10.0);
        let b = add_rect(&mut canvas, 20.0, 0.0, 30.0, 10.0);
        canvas.select(a);

        press(&mut canvas, keys::ARROW_LEFT);
        press_ctrl(&mut canvas, "]");
        press(&mut canvas, keys::ARROW_LEFT);
        assert_eq!(canvas.history.undo_len(), 3);

        canvas.undo();
        assert_eq!(canvas.document.ids(), vec![b, a]);
        assert!((canvas.document.get(a).unwrap().bounds().x0 + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_tool_shortcuts() {
        let mut canvas = Canvas::new();
        press(&mut canvas, "p");
        assert_eq!(canvas.tool(), ToolKind::Polygon);
        press(&mut canvas, "h");
        assert_eq!(canvas.tool(), ToolKind::Pan);
        press(&mut canvas, "v");
        assert_eq!(canvas.tool(), ToolKind::Select);
    }
}
