#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Camera system that keeps the player centered and zooms in log space.

use caveslave_core::CameraView;
use glam::Vec2;

/// Smallest zoom factor reachable through the wheel.
pub const MIN_ZOOM: f32 = 1.0 / 8.0;

/// Largest zoom factor reachable through the wheel.
pub const MAX_ZOOM: f32 = 64.0;

/// Change of `ln(zoom)` per wheel notch.
pub const ZOOM_STEP: f32 = 0.2;

const DEFAULT_ZOOM: f32 = 2.0;

/// Per-frame input relevant to the camera.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraInput {
    /// Wheel movement since the previous frame.
    pub wheel: f32,
    /// Whether the zoom modifier is held.
    pub modifier_held: bool,
}

/// Camera that tracks a point and keeps it in the middle of the viewport.
#[derive(Clone, Copy, Debug)]
pub struct CenteredCamera {
    view: CameraView,
}

impl CenteredCamera {
    /// Creates a camera with the provided initial zoom, clamped to the valid range.
    #[must_use]
    pub fn new(zoom: f32) -> Self {
        let zoom = if zoom.is_finite() {
            zoom.clamp(MIN_ZOOM, MAX_ZOOM)
        } else {
            DEFAULT_ZOOM
        };

        Self {
            view: CameraView {
                zoom,
                ..CameraView::default()
            },
        }
    }

    /// Re-centers the camera on `focus` and applies wheel zoom.
    pub fn update(&mut self, focus: Vec2, input: CameraInput, viewport: Vec2) {
        self.view.target = focus;
        self.view.offset = viewport / 2.0;

        if input.modifier_held && input.wheel != 0.0 && input.wheel.is_finite() {
            self.view.zoom = zoom_by(self.view.zoom, input.wheel);
        }
    }

    /// Projection parameters for the current frame.
    #[must_use]
    pub fn view(&self) -> CameraView {
        self.view
    }
}

impl Default for CenteredCamera {
    fn default() -> Self {
        Self::new(DEFAULT_ZOOM)
    }
}

/// Scales `zoom` by `wheel` notches in log space and clamps the result.
///
/// Equal notch counts produce equal relative changes at every zoom level.
#[must_use]
pub fn zoom_by(zoom: f32, wheel: f32) -> f32 {
    (zoom.ln() + ZOOM_STEP * wheel)
        .exp()
        .clamp(MIN_ZOOM, MAX_ZOOM)
}
