//! Detail view zoom/pan model

use crate::config::ViewerConfig;
use serde::Serialize;

/// Scale and pan applied to the detail image
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewTransform {
    pub scale: f32,
    pub pan_x: f32,
    pub pan_y: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self { scale: 1.0, pan_x: 0.0, pan_y: 0.0 }
    }
}

/// Zoom limits and step factors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLimits {
    pub min: f32,
    pub max: f32,
    pub button_factor: f32,
    pub wheel_factor: f32,
    pub fit_margin: f32,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self::from(&ViewerConfig::default())
    }
}

impl From<&ViewerConfig> for ZoomLimits {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            min: config.min_scale,
            max: config.max_scale.max(config.min_scale),
            button_factor: config.button_zoom_factor,
            wheel_factor: config.wheel_zoom_factor,
            fit_margin: config.fit_margin,
        }
    }
}

/// Scale that fits `(w, h)` inside `(viewport_w, viewport_h)` with a margin.
/// Returns `None` unless all four dimensions are positive.
pub fn fit_scale(viewport_w: f32, viewport_h: f32, w: f32, h: f32, margin: f32) -> Option<f32> {
    if viewport_w > 0.0 && viewport_h > 0.0 && w > 0.0 && h > 0.0 {
        Some((viewport_w / w).min(viewport_h / h) * margin)
    } else {
        None
    }
}

/// Zoom/pan controller for the detail view
#[derive(Debug, Clone)]
pub struct ViewerTransform {
    pub transform: ViewTransform,
    limits: ZoomLimits,
    viewport: (f32, f32),
    /// Image whose natural size is still unknown; fit runs once it loads
    awaiting_fit: bool,
    drag_origin: Option<(f32, f32)>,
}

impl ViewerTransform {
    pub fn new(limits: ZoomLimits) -> Self {
        Self {
            transform: ViewTransform::default(),
            limits,
            viewport: (0.0, 0.0),
            awaiting_fit: false,
            drag_origin: None,
        }
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = (width, height);
    }

    pub fn viewport(&self) -> (f32, f32) {
        self.viewport
    }

    /// A new image was opened; its fit is deferred until it has loaded
    pub fn expect_image(&mut self) {
        self.awaiting_fit = true;
        self.drag_origin = None;
    }

    pub fn is_awaiting_fit(&self) -> bool {
        self.awaiting_fit
    }

    /// The image resource finished loading with its natural dimensions
    pub fn on_image_loaded(&mut self, natural_w: f32, natural_h: f32) {
        self.awaiting_fit = false;
        self.fit_to_screen(natural_w, natural_h);
    }

    /// Fit the image into the viewport and center it
    pub fn fit_to_screen(&mut self, natural_w: f32, natural_h: f32) {
        let (vw, vh) = self.viewport;
        match fit_scale(vw, vh, natural_w, natural_h, self.limits.fit_margin) {
            Some(scale) => self.transform = ViewTransform { scale, pan_x: 0.0, pan_y: 0.0 },
            None => {
                tracing::debug!(vw, vh, natural_w, natural_h, "Cannot fit with empty dimensions");
                self.transform = ViewTransform::default();
            }
        }
    }

    fn set_scale(&mut self, scale: f32) {
        self.transform.scale = scale.clamp(self.limits.min, self.limits.max);
    }

    pub fn zoom_in(&mut self) {
        self.set_scale(self.transform.scale * self.limits.button_factor);
    }

    pub fn zoom_out(&mut self) {
        self.set_scale(self.transform.scale / self.limits.button_factor);
    }

    /// Wheel zoom; negative delta (scroll up) zooms in
    pub fn wheel(&mut self, delta_y: f32) {
        if delta_y < 0.0 {
            self.set_scale(self.transform.scale * self.limits.wheel_factor);
        } else {
            self.set_scale(self.transform.scale / self.limits.wheel_factor);
        }
    }

    pub fn reset_zoom(&mut self) {
        self.transform = ViewTransform::default();
    }

    pub fn begin_drag(&mut self, x: f32, y: f32) {
        self.drag_origin = Some((x - self.transform.pan_x, y - self.transform.pan_y));
    }

    pub fn drag_to(&mut self, x: f32, y: f32) {
        if let Some((ox, oy)) = self.drag_origin {
            self.transform.pan_x = x - ox;
            self.transform.pan_y = y - oy;
        }
    }

    pub fn end_drag(&mut self) {
        self.drag_origin = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_origin.is_some()
    }
}

impl Default for ViewerTransform {
    fn default() -> Self {
        Self::new(ZoomLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_scale_exact() {
        let scale = fit_scale(1000.0, 800.0, 2000.0, 1000.0, 0.95).unwrap();
        assert!((scale - 0.475).abs() < 1e-6);

        let scale = fit_scale(1000.0, 800.0, 100.0, 400.0, 0.95).unwrap();
        assert!((scale - 1.9).abs() < 1e-6);

        assert_eq!(fit_scale(0.0, 800.0, 100.0, 100.0, 0.95), None);
        assert_eq!(fit_scale(800.0, 800.0, 0.0, 100.0, 0.95), None);
    }

    #[test]
    fn test_fit_never_exceeds_min_ratio() {
        let dims = [(640.0, 480.0, 1920.0, 1080.0), (300.0, 900.0, 50.0, 50.0), (1.0, 1.0, 4096.0, 16.0)];
        for (vw, vh, w, h) in dims {
            let scale = fit_scale(vw, vh, w, h, 0.95).unwrap();
            let ratio = f32::min(vw / w, vh / h);
            assert!(scale <= ratio);
            assert!((scale - ratio * 0.95).abs() <= ratio * 1e-5);
        }
    }

    #[test]
    fn test_fit_deferred_until_loaded() {
        let mut viewer = ViewerTransform::default();
        viewer.set_viewport(1000.0, 500.0);
        viewer.zoom_in();
        viewer.begin_drag(0.0, 0.0);
        viewer.drag_to(40.0, -10.0);

        viewer.expect_image();
        assert!(viewer.is_awaiting_fit());
        assert!(!viewer.is_dragging());

        viewer.on_image_loaded(500.0, 500.0);
        assert!(!viewer.is_awaiting_fit());
        assert!((viewer.transform.scale - 0.95).abs() < 1e-6);
        assert_eq!((viewer.transform.pan_x, viewer.transform.pan_y), (0.0, 0.0));
    }

    #[test]
    fn test_zoom_clamped() {
        let mut viewer = ViewerTransform::default();
        for _ in 0..100 {
            viewer.zoom_in();
            assert!(viewer.transform.scale <= 10.0);
        }
        assert_eq!(viewer.transform.scale, 10.0);

        for _ in 0..100 {
            viewer.wheel(1.0);
            assert!(viewer.transform.scale >= 0.1);
        }
        assert_eq!(viewer.transform.scale, 0.1);

        viewer.wheel(-1.0);
        assert!((viewer.transform.scale - 0.11).abs() < 1e-6);
        viewer.zoom_out();
        assert_eq!(viewer.transform.scale, 0.1);
    }

    #[test]
    fn test_zoom_steps() {
        let mut viewer = ViewerTransform::default();
        viewer.zoom_in();
        assert!((viewer.transform.scale - 1.2).abs() < 1e-6);
        viewer.zoom_out();
        assert!((viewer.transform.scale - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_pan_unconstrained() {
        let mut viewer = ViewerTransform::default();
        viewer.begin_drag(10.0, 10.0);
        viewer.drag_to(5010.0, -4990.0);
        viewer.end_drag();
        assert_eq!((viewer.transform.pan_x, viewer.transform.pan_y), (5000.0, -5000.0));

        // Second drag continues from the current pan
        viewer.begin_drag(0.0, 0.0);
        viewer.drag_to(1.0, 1.0);
        assert_eq!((viewer.transform.pan_x, viewer.transform.pan_y), (5001.0, -4999.0));

        viewer.end_drag();
        viewer.drag_to(100.0, 100.0);
        assert_eq!(viewer.transform.pan_x, 5001.0);

        viewer.reset_zoom();
        assert_eq!(viewer.transform, ViewTransform::default());
    }
}
