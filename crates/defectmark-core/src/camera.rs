//! Coordinate mapping between screen space and image space.

use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Smallest allowed view scale.
pub const MIN_SCALE: f64 = 0.1;
/// Largest allowed view scale.
pub const MAX_SCALE: f64 = 50.0;
/// Relative scale change per wheel notch.
pub const ZOOM_STEP: f64 = 0.1;

/// Affine view transform: `screen = padded_image * scale + (x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub scale: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            x: 0.0,
            y: 0.0,
        }
    }
}

impl ViewTransform {
    pub fn new(scale: f64, x: f64, y: f64) -> Self {
        Self { scale, x, y }
    }

    /// Translation component as a vector.
    pub fn translation(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Camera manages the view transform for the canvas.
///
/// Annotation geometry lives in image space (unpadded pixel coordinates).
/// A constant `padding` border surrounds the image on screen, so the mapping is
/// `screen = (image + padding) * scale + translation` and its exact inverse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    /// Current scale and translation.
    pub view: ViewTransform,
    /// Border around the image, in image units.
    pub padding: f64,
    /// Minimum allowed scale.
    pub min_scale: f64,
    /// Maximum allowed scale.
    pub max_scale: f64,
    /// Relative scale change per wheel notch.
    pub zoom_step: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            view: ViewTransform::default(),
            padding: 0.0,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
            zoom_step: ZOOM_STEP,
        }
    }
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a camera with an image border.
    pub fn with_padding(padding: f64) -> Self {
        Self {
            padding,
            ..Self::default()
        }
    }

    /// Current scale.
    pub fn scale(&self) -> f64 {
        self.view.scale
    }

    /// Transform from image space to screen space (for renderers).
    pub fn transform(&self) -> Affine {
        Affine::translate(self.view.translation())
            * Affine::scale(self.view.scale)
            * Affine::translate(Vec2::new(self.padding, self.padding))
    }

    /// Convert a screen point to image coordinates.
    pub fn to_image(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.view.x) / self.view.scale - self.padding,
            (screen.y - self.view.y) / self.view.scale - self.padding,
        )
    }

    /// Convert an image point to screen coordinates.
    pub fn to_screen(&self, image: Point) -> Point {
        Point::new(
            (image.x + self.padding) * self.view.scale + self.view.x,
            (image.y + self.padding) * self.view.scale + self.view.y,
        )
    }

    /// Convert a screen-space delta to an image-space delta.
    pub fn delta_to_image(&self, delta: Vec2) -> Vec2 {
        delta / self.view.scale
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.view.x += delta.x;
        self.view.y += delta.y;
    }

    /// Zoom by one wheel notch, keeping the image point under `pointer` fixed.
    ///
    /// Negative `wheel_delta` zooms in. Returns `true` if the scale changed.
    pub fn zoom_wheel(&mut self, pointer: Point, wheel_delta: f64) -> bool {
        let factor = if wheel_delta < 0.0 {
            1.0 + self.zoom_step
        } else if wheel_delta > 0.0 {
            1.0 - self.zoom_step
        } else {
            return false;
        };
        self.zoom_at(pointer, factor)
    }

    /// Zoom the camera by `factor`, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, pointer: Point, factor: f64) -> bool {
        let old_scale = self.view.scale;
        let new_scale = (old_scale * factor).clamp(self.min_scale, self.max_scale);
        if (new_scale - old_scale).abs() < f64::EPSILON {
            return false;
        }

        let ratio = new_scale / old_scale;
        self.view.x = pointer.x - (pointer.x - self.view.x) * ratio;
        self.view.y = pointer.y - (pointer.y - self.view.y) * ratio;
        self.view.scale = new_scale;
        true
    }

    /// Reset to identity scale and no translation.
    pub fn reset(&mut self) {
        self.view = ViewTransform::default();
    }

    /// Fit the padded image into the viewport, centered, leaving `margin` screen pixels.
    pub fn fit_image(&mut self, image: Size, viewport: Size, margin: f64) {
        let content = Size::new(
            image.width + self.padding * 2.0,
            image.height + self.padding * 2.0,
        );
        if content.width <= 0.0 || content.height <= 0.0 {
            self.reset();
            return;
        }

        let available = Size::new(
            (viewport.width - margin * 2.0).max(1.0),
            (viewport.height - margin * 2.0).max(1.0),
        );
        let scale = (available.width / content.width)
            .min(available.height / content.height)
            .clamp(self.min_scale, self.max_scale);

        // Center the content in the viewport
        self.view = ViewTransform::new(
            scale,
            viewport.width / 2.0 - content.width / 2.0 * scale,
            viewport.height / 2.0 - content.height / 2.0 * scale,
        );
    }
}
