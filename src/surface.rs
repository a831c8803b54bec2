//! Host-facing rendering surface: owns the data, layout cache, pan/zoom
//! state and status line of one view.

use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

use crate::adapter::tree_from_response;
use crate::config::{Config, ViewConfig};
use crate::events::{EventFilter, build_events};
use crate::geometry::Rect;
use crate::ir::Tree;
use crate::layout::{
    Layout, TreeLayout, TreeNodeLayout, ViewBox, ViewKind, compute_family_tree, compute_map_layout,
    compute_timeline_layout, fit_tree,
};
use crate::panzoom::PanZoom;
use crate::render::render_svg;

/// What the status element next to the view shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewStatus {
    Idle,
    Loading,
    Ready(String),
    /// Data loaded but nothing to draw.
    Empty(String),
    Error(String),
}

/// Decode state of the map background.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageState {
    /// No background; the container itself is the contain box.
    Absent,
    Pending,
    Ready { width: f32, height: f32 },
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    Proceed(Option<(f32, f32)>),
    Defer,
}

/// Holds back contain-box geometry until the background has decoded, but
/// only once per image.
#[derive(Debug, Clone)]
pub struct ImageGate {
    state: ImageState,
    deferred: bool,
}

impl Default for ImageGate {
    fn default() -> Self {
        Self {
            state: ImageState::Absent,
            deferred: false,
        }
    }
}

impl ImageGate {
    pub fn state(&self) -> ImageState {
        self.state
    }

    /// A new background started loading.
    pub fn expect(&mut self) {
        self.state = ImageState::Pending;
        self.deferred = false;
    }

    pub fn check(&mut self) -> GateDecision {
        match self.state {
            ImageState::Pending if !self.deferred => {
                self.deferred = true;
                GateDecision::Defer
            }
            ImageState::Ready { width, height } if width > 0.0 && height > 0.0 => {
                GateDecision::Proceed(Some((width, height)))
            }
            _ => GateDecision::Proceed(None),
        }
    }

    /// Returns whether a pass was deferred waiting for this image.
    pub fn loaded(&mut self, width: f32, height: f32) -> bool {
        self.state = ImageState::Ready { width, height };
        std::mem::take(&mut self.deferred)
    }

    pub fn failed(&mut self) -> bool {
        self.state = ImageState::Failed;
        std::mem::take(&mut self.deferred)
    }
}

/// Coalesces relayout requests into at most one pass per animation frame.
/// Every request supersedes the ones before it.
#[derive(Debug, Clone, Default)]
pub struct FrameScheduler {
    generation: u64,
    pending: Option<u64>,
}

impl FrameScheduler {
    pub fn schedule(&mut self) -> u64 {
        self.generation += 1;
        self.pending = Some(self.generation);
        self.generation
    }

    /// Drops any pending pass; a synchronous render already covers it.
    pub fn supersede(&mut self) {
        self.generation += 1;
        self.pending = None;
    }

    /// Ticket of the pass due this frame, if any.
    pub fn take_frame(&mut self) -> Option<u64> {
        self.pending.take()
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        ticket == self.generation
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Tree geometry kept for a later re-frame request.
#[derive(Debug, Clone)]
pub struct TreeSnapshot {
    pub nodes: Vec<TreeNodeLayout>,
    pub view: ViewConfig,
}

static LAST_TREE: Lazy<Mutex<Option<Arc<TreeSnapshot>>>> = Lazy::new(|| Mutex::new(None));

/// Records `layout` as the tree [`fit_to_frame`] falls back to. Every tree
/// render path calls this, surface-backed or not.
pub fn publish_last_tree(layout: &TreeLayout, view: &ViewConfig) {
    let snapshot = Arc::new(TreeSnapshot {
        nodes: layout.nodes.clone(),
        view: view.clone(),
    });
    let mut slot = LAST_TREE.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    *slot = Some(snapshot);
}

/// Most recently rendered tree on any surface.
pub fn last_tree() -> Option<Arc<TreeSnapshot>> {
    LAST_TREE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Tight re-frame of `surface`, or of the last rendered tree when none is
/// given.
pub fn fit_to_frame(surface: Option<&mut Surface>) -> Option<ViewBox> {
    match surface {
        Some(surface) => surface.fit_to_frame(),
        None => last_tree().map(|snapshot| fit_tree(&snapshot.nodes, &snapshot.view)),
    }
}

pub struct Surface {
    kind: ViewKind,
    config: Config,
    width: f32,
    height: f32,
    tree: Option<Arc<Tree>>,
    filter: EventFilter,
    layout: Option<Layout>,
    svg: Option<String>,
    status: ViewStatus,
    panzoom: PanZoom,
    image: ImageGate,
    scheduler: FrameScheduler,
}

impl Surface {
    pub fn new(kind: ViewKind, config: Config, width: f32, height: f32) -> Self {
        let panzoom = PanZoom::new(&config.zoom, Rect::new(0.0, 0.0, width, height));
        Self {
            kind,
            config,
            width,
            height,
            tree: None,
            filter: EventFilter::default(),
            layout: None,
            svg: None,
            status: ViewStatus::Idle,
            panzoom,
            image: ImageGate::default(),
            scheduler: FrameScheduler::default(),
        }
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    pub fn svg(&self) -> Option<&str> {
        self.svg.as_deref()
    }

    pub fn panzoom(&self) -> &PanZoom {
        &self.panzoom
    }

    pub fn panzoom_mut(&mut self) -> &mut PanZoom {
        &mut self.panzoom
    }

    pub fn image_state(&self) -> ImageState {
        self.image.state()
    }

    pub fn mark_loading(&mut self) {
        self.clear();
        self.status = ViewStatus::Loading;
    }

    /// Replaces the data and rebuilds everything synchronously.
    pub fn render(&mut self, tree: Tree) {
        self.tree = Some(Arc::new(tree));
        self.scheduler.supersede();
        self.relayout();
    }

    /// Feeds a raw HTTP response through the adapter; any failure leaves the
    /// surface empty with an error status.
    pub fn load_response(&mut self, status: u16, url: &str, body: &str) {
        match tree_from_response(status, url, body) {
            Ok(tree) => self.render(tree),
            Err(err) => {
                tracing::warn!(%url, error = %err, "could not load family data");
                let message = format!("Couldn\u{2019}t load {}: {err}", self.noun());
                self.fail(message);
            }
        }
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.tree = None;
        self.clear();
        self.status = ViewStatus::Error(message.into());
    }

    pub fn set_filter(&mut self, filter: EventFilter) {
        self.filter = filter;
        if self.tree.is_some() {
            self.relayout();
        }
    }

    /// Container size changed; the relayout waits for the next frame.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.panzoom.set_rect(Rect::new(0.0, 0.0, width, height));
        let ticket = self.scheduler.schedule();
        tracing::trace!(ticket, width, height, "relayout scheduled");
    }

    /// Runs the pending relayout, if any. Returns whether a pass ran.
    pub fn on_animation_frame(&mut self) -> bool {
        let Some(ticket) = self.scheduler.take_frame() else {
            return false;
        };
        if !self.scheduler.is_current(ticket) {
            return false;
        }
        self.relayout();
        true
    }

    /// The background started loading; its size is not known yet.
    pub fn expect_background(&mut self) {
        self.image.expect();
    }

    pub fn background_loaded(&mut self, width: f32, height: f32) {
        if self.image.loaded(width, height) {
            self.relayout();
        }
    }

    pub fn background_failed(&mut self) {
        if self.image.failed() {
            self.relayout();
        }
    }

    /// Tight re-frame without new data. Also resets pan/zoom.
    pub fn fit_to_frame(&mut self) -> Option<ViewBox> {
        self.panzoom.fit();
        let view = self.config.view.clone();
        match self.layout.as_mut()? {
            Layout::Tree(tree) => {
                tree.view_box = fit_tree(&tree.nodes, &view);
            }
            other => return Some(other.view_box()),
        }
        let layout = self.layout.as_ref()?;
        self.svg = Some(render_svg(layout, &self.config));
        Some(layout.view_box())
    }

    fn noun(&self) -> &'static str {
        match self.kind {
            ViewKind::Tree => "tree",
            ViewKind::Map => "map",
            ViewKind::Timeline => "timeline",
        }
    }

    fn clear(&mut self) {
        self.layout = None;
        self.svg = None;
    }

    fn relayout(&mut self) {
        let Some(tree) = self.tree.clone() else {
            return;
        };
        self.clear();

        let (layout, status) = match self.kind {
            ViewKind::Tree => {
                let layout = compute_family_tree(&tree, self.width, &self.config);
                publish_last_tree(&layout, &self.config.view);
                let people = tree.people.len();
                let status = if people == 0 {
                    ViewStatus::Empty("No people in this tree.".to_string())
                } else {
                    ViewStatus::Ready(plural(people, "person", "people"))
                };
                (Layout::Tree(layout), status)
            }
            ViewKind::Map => {
                let natural = match self.image.check() {
                    GateDecision::Defer => {
                        tracing::debug!("background not decoded; map layout deferred");
                        self.status = ViewStatus::Loading;
                        return;
                    }
                    GateDecision::Proceed(natural) => natural,
                };
                let layout =
                    compute_map_layout(&tree.people, self.width, self.height, natural, &self.config.map);
                let status = if layout.pins.is_empty() {
                    ViewStatus::Empty("No mapped locations.".to_string())
                } else {
                    ViewStatus::Ready(plural(layout.pins.len(), "person", "people"))
                };
                (Layout::Map(layout), status)
            }
            ViewKind::Timeline => {
                let events = self.filter.apply(&build_events(&tree));
                let status = if events.is_empty() {
                    ViewStatus::Empty("No matching events.".to_string())
                } else {
                    ViewStatus::Ready(plural(events.len(), "event", "events"))
                };
                let layout = compute_timeline_layout(&events, self.width, &self.config.timeline);
                (Layout::Timeline(layout), status)
            }
        };

        self.svg = Some(render_svg(&layout, &self.config));
        self.layout = Some(layout);
        self.status = status;
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "people": [
            {"id": "a", "name": "Ada", "born": "1900-02-03", "location": {"lat": 40, "lng": -74}},
            {"id": "b", "name": "Ben", "born": "1902", "location": {"lat": 40, "lng": -74}}
        ],
        "relationships": []
    }"#;

    #[test]
    fn fetch_failure_leaves_nothing_drawn() {
        let mut surface = Surface::new(ViewKind::Tree, Config::default(), 1200.0, 800.0);
        surface.load_response(200, "/api/tree/1", BODY);
        assert!(surface.svg().is_some());

        surface.load_response(503, "/api/tree/1", "");
        assert!(surface.svg().is_none());
        assert!(surface.layout().is_none());
        assert!(matches!(surface.status(), ViewStatus::Error(msg) if msg.contains("503")));
    }

    #[test]
    fn malformed_shape_is_a_fetch_failure() {
        let mut surface = Surface::new(ViewKind::Timeline, Config::default(), 1200.0, 800.0);
        surface.load_response(200, "/api/tree/1", r#"{"family": 3}"#);
        assert!(matches!(surface.status(), ViewStatus::Error(_)));
    }

    #[test]
    fn resize_bursts_collapse_into_one_pass() {
        let mut surface = Surface::new(ViewKind::Timeline, Config::default(), 1200.0, 800.0);
        surface.load_response(200, "/api/tree/1", BODY);
        surface.resize(900.0, 800.0);
        surface.resize(700.0, 800.0);
        surface.resize(500.0, 800.0);
        assert!(surface.on_animation_frame());
        assert!(!surface.on_animation_frame());
        let Some(Layout::Timeline(layout)) = surface.layout() else {
            panic!("timeline layout");
        };
        assert_eq!(layout.width, 500.0);
    }

    #[test]
    fn render_cancels_stale_frame() {
        let mut surface = Surface::new(ViewKind::Tree, Config::default(), 1200.0, 800.0);
        surface.resize(600.0, 800.0);
        surface.render(Tree::default());
        assert!(!surface.on_animation_frame());
        assert!(matches!(surface.status(), ViewStatus::Empty(_)));
    }

    #[test]
    fn pending_background_defers_exactly_once() {
        let mut surface = Surface::new(ViewKind::Map, Config::default(), 800.0, 600.0);
        surface.expect_background();
        surface.load_response(200, "/api/tree/1", BODY);
        assert_eq!(surface.status(), &ViewStatus::Loading);
        assert!(surface.layout().is_none());

        surface.background_loaded(1600.0, 800.0);
        let Some(Layout::Map(map)) = surface.layout() else {
            panic!("map layout");
        };
        // Letterboxed 2:1 image inside a 4:3 container.
        assert_eq!(map.contain, Rect::new(0.0, 100.0, 800.0, 400.0));
        assert_eq!(map.pins.len(), 2);
    }

    #[test]
    fn second_pass_does_not_wait_again() {
        let mut gate = ImageGate::default();
        gate.expect();
        assert_eq!(gate.check(), GateDecision::Defer);
        assert_eq!(gate.check(), GateDecision::Proceed(None));
        assert!(!gate.loaded(10.0, 10.0));
    }

    #[test]
    fn fit_to_frame_tightens_tree() {
        let mut surface = Surface::new(ViewKind::Tree, Config::default(), 1200.0, 800.0);
        surface.load_response(200, "/api/tree/1", BODY);
        let before = surface.layout().map(Layout::view_box);
        let after = fit_to_frame(Some(&mut surface));
        assert!(after.is_some());
        assert_ne!(before, after);
        assert!(after.is_some_and(|vb| vb.width < 1050.0));
    }
}
