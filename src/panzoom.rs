//! Pan/zoom state for one rendering surface.
//!
//! Positions given to the controller are client coordinates; `rect` is the
//! surface's client-space box. Translation is in surface pixels, so the
//! screen position of a content point `p` is `rect.origin + p * scale + t`.

use serde::Serialize;

use crate::config::ZoomConfig;
use crate::geometry::{Point, Rect, clamp};

/// Scales within this distance of 1 count as unzoomed.
const PAN_THRESHOLD: f32 = 1.001;
const SCALE_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub scale: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }
}

impl Transform {
    /// Content point to surface-local screen point.
    pub fn apply(&self, p: Point) -> Point {
        Point::new(p.x * self.scale + self.tx, p.y * self.scale + self.ty)
    }

    /// Surface-local screen point back to content space.
    pub fn invert(&self, p: Point) -> Point {
        Point::new((p.x - self.tx) / self.scale, (p.y - self.ty) / self.scale)
    }

    /// CSS `transform` value for the stage element.
    pub fn to_css(&self) -> String {
        format!("translate({}px, {}px) scale({})", self.tx, self.ty, self.scale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Dragging { last: Point },
}

#[derive(Debug, Clone)]
pub struct PanZoom {
    transform: Transform,
    drag: DragState,
    min: f32,
    max: f32,
    step: f32,
    rect: Rect,
}

impl PanZoom {
    pub fn new(config: &ZoomConfig, rect: Rect) -> Self {
        Self {
            transform: Transform::default(),
            drag: DragState::Idle,
            min: config.min,
            max: config.max.max(config.min),
            step: config.step,
            rect,
        }
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    /// The surface moved or resized on the page.
    pub fn set_rect(&mut self, rect: Rect) {
        self.rect = rect;
    }

    pub fn is_pannable(&self) -> bool {
        self.transform.scale > PAN_THRESHOLD
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Zooms to `next`, keeping the content under `anchor` fixed on screen.
    /// Anchors outside the surface are pulled onto its edge. Returns whether
    /// the scale changed.
    pub fn zoom_to(&mut self, next: f32, anchor: Point) -> bool {
        let ax = clamp(anchor.x - self.rect.x, 0.0, self.rect.width);
        let ay = clamp(anchor.y - self.rect.y, 0.0, self.rect.height);

        let prev = self.transform;
        let scale = clamp(next, self.min, self.max);
        if (scale - prev.scale).abs() < SCALE_EPSILON {
            return false;
        }

        let stage = prev.invert(Point::new(ax, ay));
        self.transform = Transform {
            scale,
            tx: ax - stage.x * scale,
            ty: ay - stage.y * scale,
        };
        tracing::trace!(scale, tx = self.transform.tx, ty = self.transform.ty, "zoom");
        true
    }

    pub fn zoom_in(&mut self) -> bool {
        self.zoom_to(self.transform.scale + self.step, self.rect.center())
    }

    pub fn zoom_out(&mut self) -> bool {
        self.zoom_to(self.transform.scale - self.step, self.rect.center())
    }

    pub fn fit(&mut self) {
        self.transform = Transform::default();
    }

    /// Scrolling up zooms in around the pointer. The gesture is always
    /// consumed, so the host must suppress native scrolling when this
    /// returns true.
    pub fn wheel(&mut self, delta_y: f32, pointer: Point) -> bool {
        let dir = if delta_y < 0.0 { 1.0 } else { -1.0 };
        self.zoom_to(self.transform.scale + dir * self.step, pointer);
        true
    }

    /// Starts a drag when zoomed in. Returns whether the pointer should be
    /// captured.
    pub fn pointer_down(&mut self, pointer: Point) -> bool {
        if !self.is_pannable() {
            return false;
        }
        self.drag = DragState::Dragging { last: pointer };
        true
    }

    /// Pans by the raw pointer delta. Returns whether the transform changed.
    pub fn pointer_move(&mut self, pointer: Point) -> bool {
        let DragState::Dragging { last } = self.drag else {
            return false;
        };
        self.transform.tx += pointer.x - last.x;
        self.transform.ty += pointer.y - last.y;
        self.drag = DragState::Dragging { last: pointer };
        true
    }

    pub fn pointer_up(&mut self) {
        self.drag = DragState::Idle;
    }

    pub fn pointer_cancel(&mut self) {
        self.drag = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> PanZoom {
        PanZoom::new(&ZoomConfig::default(), Rect::new(0.0, 0.0, 800.0, 600.0))
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut pz = controller();
        assert!(pz.zoom_to(2.0, Point::new(100.0, 100.0)));
        let screen = pz.transform().apply(Point::new(100.0, 100.0));
        assert!((screen.x - 100.0).abs() < 1e-4);
        assert!((screen.y - 100.0).abs() < 1e-4);
        assert_eq!(pz.transform().tx, -100.0);
    }

    #[test]
    fn anchor_is_relative_to_surface_rect() {
        let mut pz = PanZoom::new(&ZoomConfig::default(), Rect::new(50.0, 20.0, 400.0, 300.0));
        pz.zoom_to(2.0, Point::new(150.0, 120.0));
        let local = Point::new(100.0, 100.0);
        let screen = pz.transform().apply(local);
        assert!((screen.x - local.x).abs() < 1e-4 && (screen.y - local.y).abs() < 1e-4);

        // Far outside the surface: clamped onto its corner.
        let mut pz = PanZoom::new(&ZoomConfig::default(), Rect::new(50.0, 20.0, 400.0, 300.0));
        pz.zoom_to(2.0, Point::new(5000.0, 5000.0));
        assert_eq!(pz.transform().tx, -400.0);
        assert_eq!(pz.transform().ty, -300.0);
    }

    #[test]
    fn scale_is_clamped() {
        let mut pz = controller();
        pz.zoom_to(10.0, Point::new(0.0, 0.0));
        assert_eq!(pz.transform().scale, 3.2);
        assert!(!pz.zoom_to(0.2, Point::new(0.0, 0.0)) || pz.transform().scale == 1.0);
        assert!(!pz.zoom_out());
        assert_eq!(pz.transform().scale, 1.0);
    }

    #[test]
    fn fit_resets_transform() {
        let mut pz = controller();
        pz.zoom_in();
        pz.fit();
        assert_eq!(pz.transform(), Transform::default());
    }

    #[test]
    fn wheel_direction_and_capture() {
        let mut pz = controller();
        assert!(pz.wheel(-120.0, Point::new(400.0, 300.0)));
        assert!((pz.transform().scale - 1.18).abs() < 1e-6);
        pz.wheel(120.0, Point::new(400.0, 300.0));
        assert!((pz.transform().scale - 1.0).abs() < 1e-6);
    }

    #[test]
    fn drag_only_when_zoomed() {
        let mut pz = controller();
        assert!(!pz.pointer_down(Point::new(10.0, 10.0)));
        assert!(!pz.pointer_move(Point::new(30.0, 30.0)));
        assert_eq!(pz.transform().tx, 0.0);

        pz.zoom_to(2.0, Point::new(0.0, 0.0));
        assert!(pz.pointer_down(Point::new(10.0, 10.0)));
        assert!(pz.pointer_move(Point::new(30.0, 25.0)));
        assert!(pz.pointer_move(Point::new(40.0, 25.0)));
        assert_eq!(pz.transform().tx, 30.0);
        assert_eq!(pz.transform().ty, 15.0);
        pz.pointer_cancel();
        assert!(!pz.is_dragging());
        assert!(!pz.pointer_move(Point::new(90.0, 90.0)));
    }

    #[test]
    fn css_transform_matches_state() {
        let mut pz = controller();
        pz.zoom_to(2.0, Point::new(100.0, 100.0));
        assert_eq!(pz.transform().to_css(), "translate(-100px, -100px) scale(2)");
    }
}
