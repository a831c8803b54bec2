use lineage_layout::config::{Config, parse_config_str};
use lineage_layout::events::{EventFilter, SortOrder, build_events};
use lineage_layout::geometry::{Point, Rect};
use lineage_layout::layout::{
    compute_family_tree, compute_map_layout, compute_timeline_layout, fit_tree,
};
use lineage_layout::panzoom::PanZoom;
use lineage_layout::render::{render_map_svg, render_timeline_svg, render_tree_svg};
use lineage_layout::{adapter, fit_to_frame, publish_last_tree};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewOptions {
    width: Option<f32>,
    height: Option<f32>,
    /// Full config document, same shape as the CLI's config file.
    config: Option<serde_json::Value>,
    fit: Option<bool>,
    image_width: Option<f32>,
    image_height: Option<f32>,
    event_type: Option<String>,
    query: Option<String>,
    order: Option<SortOrder>,
}

fn to_js(error: impl ToString) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn parse_options(options_json: Option<String>) -> Result<(ViewOptions, Config), JsValue> {
    let options = match options_json {
        Some(raw) => serde_json::from_str::<ViewOptions>(&raw).map_err(to_js)?,
        None => ViewOptions::default(),
    };
    let config = match &options.config {
        Some(value) => parse_config_str(&value.to_string()).map_err(to_js)?,
        None => Config::default(),
    };
    Ok((options, config))
}

fn size(options: &ViewOptions, config: &Config) -> (f32, f32) {
    (
        options.width.unwrap_or(config.render.width),
        options.height.unwrap_or(config.render.height),
    )
}

#[wasm_bindgen]
pub fn render_tree_svg_json(json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let (options, config) = parse_options(options_json)?;
    let tree = adapter::parse_tree_json(json).map_err(to_js)?;
    let (width, _) = size(&options, &config);
    let mut layout = compute_family_tree(&tree, width, &config);
    if options.fit.unwrap_or(false) {
        layout.view_box = fit_tree(&layout.nodes, &config.view);
    }
    publish_last_tree(&layout, &config.view);
    Ok(render_tree_svg(&layout, &config))
}

#[wasm_bindgen]
pub fn render_map_svg_json(json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let (options, config) = parse_options(options_json)?;
    let tree = adapter::parse_tree_json(json).map_err(to_js)?;
    let (width, height) = size(&options, &config);
    let natural = options.image_width.zip(options.image_height);
    let layout = compute_map_layout(&tree.people, width, height, natural, &config.map);
    Ok(render_map_svg(&layout, &config))
}

#[wasm_bindgen]
pub fn render_timeline_svg_json(json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let (options, config) = parse_options(options_json)?;
    let tree = adapter::parse_tree_json(json).map_err(to_js)?;
    let (width, _) = size(&options, &config);
    let filter = EventFilter {
        kind: options.event_type.clone(),
        query: options.query.clone().unwrap_or_default(),
        order: options.order.unwrap_or_default(),
    };
    let events = filter.apply(&build_events(&tree));
    let layout = compute_timeline_layout(&events, width, &config.timeline);
    Ok(render_timeline_svg(&layout, &config))
}

/// Tight viewBox of the last rendered tree, as an SVG attribute value.
#[wasm_bindgen]
pub fn fit_last_tree() -> Option<String> {
    fit_to_frame(None).map(|vb| vb.to_attr())
}

/// Pan/zoom controller for one stage element.
#[wasm_bindgen]
pub struct PanZoomHandle {
    inner: PanZoom,
}

#[wasm_bindgen]
impl PanZoomHandle {
    /// `options_json` takes the same shape as the render calls; only
    /// `config.zoom` is read.
    #[wasm_bindgen(constructor)]
    pub fn new(
        left: f32,
        top: f32,
        width: f32,
        height: f32,
        options_json: Option<String>,
    ) -> Result<PanZoomHandle, JsValue> {
        let (_, config) = parse_options(options_json)?;
        Ok(PanZoomHandle {
            inner: PanZoom::new(&config.zoom, Rect::new(left, top, width, height)),
        })
    }

    pub fn set_rect(&mut self, left: f32, top: f32, width: f32, height: f32) {
        self.inner.set_rect(Rect::new(left, top, width, height));
    }

    pub fn zoom_in(&mut self) -> bool {
        self.inner.zoom_in()
    }

    pub fn zoom_out(&mut self) -> bool {
        self.inner.zoom_out()
    }

    pub fn fit(&mut self) {
        self.inner.fit();
    }

    /// Returns true when the page should call `preventDefault`.
    pub fn wheel(&mut self, delta_y: f32, client_x: f32, client_y: f32) -> bool {
        self.inner.wheel(delta_y, Point::new(client_x, client_y))
    }

    pub fn pointer_down(&mut self, client_x: f32, client_y: f32) -> bool {
        self.inner.pointer_down(Point::new(client_x, client_y))
    }

    pub fn pointer_move(&mut self, client_x: f32, client_y: f32) -> bool {
        self.inner.pointer_move(Point::new(client_x, client_y))
    }

    pub fn pointer_up(&mut self) {
        self.inner.pointer_up();
    }

    pub fn pointer_cancel(&mut self) {
        self.inner.pointer_cancel();
    }

    pub fn is_pannable(&self) -> bool {
        self.inner.is_pannable()
    }

    pub fn is_dragging(&self) -> bool {
        self.inner.is_dragging()
    }

    pub fn scale(&self) -> f32 {
        self.inner.transform().scale
    }

    pub fn css_transform(&self) -> String {
        self.inner.transform().to_css()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAMILY: &str = r#"{"people":[{"id":"a","name":"Ada","born":"1900","x":0.2,"y":0.3},{"id":"b","name":"Ben","born":"1930","x":0.2,"y":0.3}],"relationships":[{"parentId":"a","childId":"b"}]}"#;

    #[test]
    fn renders_all_three_views() {
        let tree = render_tree_svg_json(FAMILY, None).unwrap();
        assert!(tree.contains("Ada"));
        let map = render_map_svg_json(FAMILY, Some(r#"{"width":800,"height":600}"#.to_string())).unwrap();
        assert!(map.contains("class=\"badge\""));
        let timeline =
            render_timeline_svg_json(FAMILY, Some(r#"{"order":"desc","config":{"theme":"dusk"}}"#.to_string()))
                .unwrap();
        assert!(timeline.contains("#1E1B18"));
    }

    #[test]
    fn pan_zoom_handle_drives_controller() {
        let mut handle = PanZoomHandle::new(0.0, 0.0, 800.0, 600.0, None).unwrap();
        assert!(!handle.pointer_down(10.0, 10.0));
        assert!(handle.wheel(-1.0, 400.0, 300.0));
        assert!(handle.is_pannable());
        handle.fit();
        assert_eq!(handle.css_transform(), "translate(0px, 0px) scale(1)");
    }

    #[test]
    fn pan_zoom_handle_honours_configured_limits() {
        let options = r#"{"config":{"zoom":{"max":1.5,"step":0.4}}}"#.to_string();
        let mut handle = PanZoomHandle::new(0.0, 0.0, 800.0, 600.0, Some(options)).unwrap();
        for _ in 0..5 {
            handle.wheel(-1.0, 400.0, 300.0);
        }
        assert_eq!(handle.scale(), 1.5);
    }

    #[test]
    fn tree_render_feeds_fit_last_tree() {
        render_tree_svg_json(FAMILY, Some(r#"{"width":1200}"#.to_string())).unwrap();
        let view_box = fit_last_tree().expect("tree was published");
        assert_eq!(view_box.split(' ').count(), 4);
    }
}
