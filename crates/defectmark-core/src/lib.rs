//! DefectMark Core Library
//!
//! Platform-agnostic canvas interaction engine for the DefectMark image
//! annotation tool: coordinate mapping, tools, hit-testing, shape editing,
//! undo/redo and alignment.

pub mod align;
pub mod annotation;
pub mod camera;
pub mod canvas;
pub mod config;
pub mod editor;
pub mod event_handler;
pub mod export;
pub mod geometry;
pub mod history;
pub mod input;
pub mod selection;
pub mod tools;

pub use align::{AlignMode, Axis};
pub use annotation::{Annotation, AnnotationId, AnnotationKind, LabelCatalog, LabelInfo, SerializableColor};
pub use camera::{Camera, ViewTransform};
pub use canvas::{AnnotationDocument, Canvas};
pub use config::{ConfigError, EditorAction, EditorConfig, KeyBindings, Shortcut};
pub use event_handler::{CompletedShape, EventResponse};
pub use export::{Detection, ExportDocument, ExportError, ExportShape};
pub use history::{History, HistoryEntry};
pub use input::{FocusContext, InputEvent, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use selection::{Corner, HandleKind, Selection};
pub use tools::{Gesture, InteractionState, PendingShape, ToolKind};
