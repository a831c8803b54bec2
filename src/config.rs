use crate::error::{Error, Result};
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Stem used when the configured one is unusable.
const FALLBACK_STEM: f32 = 14.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// One vertical run length shared by every elbow, trunk and drop.
    pub stem: f32,
    pub card_width: f32,
    pub card_height: f32,
    pub card_radius: f32,
    pub photo_height: f32,
    pub name_y: f32,
    pub meta_y: f32,
    pub name_font_size: f32,
    pub meta_font_size: f32,
    pub rank_sep: f32,
    pub node_sep: f32,
    pub margin_x: f32,
    pub margin_y: f32,
    pub union_radius: f32,
    pub marriage_icon_offset: f32,
    pub marriage_ring_radius: f32,
    pub link_width: f32,
    pub join_width: f32,
    pub trunk_width: f32,
    /// Container widths at or below this frame the tree in narrow mode.
    pub narrow_breakpoint: f32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            stem: 80.0,
            card_width: 160.0,
            card_height: 250.0,
            card_radius: 10.0,
            photo_height: 188.0,
            name_y: 202.0,
            meta_y: 235.0,
            name_font_size: 22.0,
            meta_font_size: 18.0,
            rank_sep: 45.0,
            node_sep: 100.0,
            margin_x: 10.0,
            margin_y: 10.0,
            union_radius: 4.5,
            marriage_icon_offset: 20.0,
            marriage_ring_radius: 8.2,
            link_width: 1.6,
            join_width: 3.0,
            trunk_width: 2.8,
            narrow_breakpoint: 900.0,
        }
    }
}

impl TreeConfig {
    pub fn stem_len(&self) -> f32 {
        if self.stem.is_finite() && self.stem > 0.0 {
            self.stem
        } else {
            FALLBACK_STEM
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    pub min_width: f32,
    pub min_height: f32,
    pub pad: f32,
    /// Additional bottom padding in the standard framing.
    pub extra: f32,
    pub narrow_pad: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            min_width: 1050.0,
            min_height: 620.0,
            pad: 18.0,
            extra: 54.0,
            narrow_pad: 4.0,
        }
    }
}

/// A value proportional to the container width, bounded to a pixel range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Scaled {
    pub ratio: f32,
    pub min: f32,
    pub max: f32,
}

impl Scaled {
    pub const fn new(ratio: f32, min: f32, max: f32) -> Self {
        Self { ratio, min, max }
    }

    pub fn at(&self, width: f32) -> f32 {
        crate::geometry::clamp(width * self.ratio, self.min, self.max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    pub edge_margin: Scaled,
    pub spiral_base: Scaled,
    pub spiral_growth: Scaled,
    /// Spiral index of the first halo pin; lower indices sit under the badge.
    pub halo_start: usize,
    pub pin_size: Scaled,
    /// Clusters up to this size fan out; larger ones spiral.
    pub fan_max: usize,
    pub fan_spread_deg: f32,
    pub fan_gap: f32,
    pub leader_lines: bool,
    /// Offset lone pins to a hash-chosen side with a leader line.
    pub single_offset: bool,
    /// Inset used when clamping spread pins; `None` means half the pin size.
    pub clamp_margin: Option<f32>,
    pub orbit_pad: f32,
    pub dot_radius: f32,
    pub cluster_dot_radius: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            edge_margin: Scaled::new(0.035, 18.0, 34.0),
            spiral_base: Scaled::new(0.040, 26.0, 40.0),
            spiral_growth: Scaled::new(0.022, 16.0, 28.0),
            halo_start: 4,
            pin_size: Scaled::new(0.029, 34.0, 54.0),
            fan_max: 3,
            fan_spread_deg: 56.0,
            fan_gap: 8.0,
            leader_lines: true,
            single_offset: false,
            clamp_margin: None,
            orbit_pad: 64.0,
            dot_radius: 4.2,
            cluster_dot_radius: 5.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    pub gap_x: f32,
    pub gap_y: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub card_width: f32,
    pub card_height: f32,
    pub cols: usize,
    pub elbow_x: f32,
    /// Floor for `pad_x` once rounded.
    pub min_pad_x: f32,
    /// Connectors stay at least this far from either container edge.
    pub stroke_pad: f32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            gap_x: 24.0,
            gap_y: 26.0,
            pad_x: 34.0,
            pad_y: 34.0,
            card_width: 240.0,
            card_height: 92.0,
            cols: 3,
            elbow_x: 44.0,
            min_pad_x: 12.0,
            stroke_pad: 14.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoomConfig {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: 1.0,
            max: 3.2,
            step: 0.18,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarConfig {
    pub object_position: String,
    pub scale: f32,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            object_position: "50% 28%".to_string(),
            scale: 0.78,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            background: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub tree: TreeConfig,
    pub view: ViewConfig,
    pub map: MapConfig,
    pub timeline: TimelineConfig,
    pub zoom: ZoomConfig,
    pub avatar: AvatarConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::parchment();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            tree: TreeConfig::default(),
            view: ViewConfig::default(),
            map: MapConfig::default(),
            timeline: TimelineConfig::default(),
            zoom: ZoomConfig::default(),
            avatar: AvatarConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    background: Option<String>,
    card_background: Option<String>,
    card_stroke: Option<String>,
    link_color: Option<String>,
    text_strong: Option<String>,
    text_soft: Option<String>,
    accent: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TreeConfigFile {
    stem: Option<f32>,
    card_width: Option<f32>,
    card_height: Option<f32>,
    card_radius: Option<f32>,
    rank_sep: Option<f32>,
    node_sep: Option<f32>,
    margin_x: Option<f32>,
    margin_y: Option<f32>,
    narrow_breakpoint: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewConfigFile {
    min_width: Option<f32>,
    min_height: Option<f32>,
    pad: Option<f32>,
    extra: Option<f32>,
    narrow_pad: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapConfigFile {
    fan_max: Option<usize>,
    fan_spread_deg: Option<f32>,
    halo_start: Option<usize>,
    leader_lines: Option<bool>,
    single_offset: Option<bool>,
    clamp_margin: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimelineConfigFile {
    gap_x: Option<f32>,
    gap_y: Option<f32>,
    pad_x: Option<f32>,
    pad_y: Option<f32>,
    card_width: Option<f32>,
    card_height: Option<f32>,
    cols: Option<usize>,
    elbow_x: Option<f32>,
    stroke_pad: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZoomConfigFile {
    min: Option<f32>,
    max: Option<f32>,
    step: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvatarConfigFile {
    object_position: Option<String>,
    scale: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    tree: Option<TreeConfigFile>,
    view: Option<ViewConfigFile>,
    map: Option<MapConfigFile>,
    timeline: Option<TimelineConfigFile>,
    zoom: Option<ZoomConfigFile>,
    avatar: Option<AvatarConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    Ok(parse_config_str(&contents)?)
}

/// Overlays a camelCase JSON (or JSON5) document onto the defaults.
pub fn parse_config_str(contents: &str) -> Result<Config> {
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(json_err) => json5::from_str(contents)
            .map_err(|_| Error::Config(json_err.to_string()))?,
    };

    let mut config = Config::default();

    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "dusk" => config.theme = Theme::dusk(),
            "parchment" | "default" => config.theme = Theme::parchment(),
            other => {
                return Err(Error::Config(format!("unknown theme `{other}`")));
            }
        }
        config.render.background = config.theme.background.clone();
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.background {
            config.render.background = v.clone();
            config.theme.background = v;
        }
        if let Some(v) = vars.card_background {
            config.theme.card_background = v;
        }
        if let Some(v) = vars.card_stroke {
            config.theme.card_stroke = v;
        }
        if let Some(v) = vars.link_color {
            config.theme.link_color = v;
        }
        if let Some(v) = vars.text_strong {
            config.theme.text_strong = v;
        }
        if let Some(v) = vars.text_soft {
            config.theme.text_soft = v;
        }
        if let Some(v) = vars.accent {
            config.theme.accent = v;
        }
    }

    if let Some(tree) = parsed.tree {
        if let Some(v) = tree.stem {
            config.tree.stem = v;
        }
        if let Some(v) = tree.card_width {
            config.tree.card_width = v;
        }
        if let Some(v) = tree.card_height {
            config.tree.card_height = v;
        }
        if let Some(v) = tree.card_radius {
            config.tree.card_radius = v;
        }
        if let Some(v) = tree.rank_sep {
            config.tree.rank_sep = v;
        }
        if let Some(v) = tree.node_sep {
            config.tree.node_sep = v;
        }
        if let Some(v) = tree.margin_x {
            config.tree.margin_x = v;
        }
        if let Some(v) = tree.margin_y {
            config.tree.margin_y = v;
        }
        if let Some(v) = tree.narrow_breakpoint {
            config.tree.narrow_breakpoint = v;
        }
    }

    if let Some(view) = parsed.view {
        if let Some(v) = view.min_width {
            config.view.min_width = v;
        }
        if let Some(v) = view.min_height {
            config.view.min_height = v;
        }
        if let Some(v) = view.pad {
            config.view.pad = v;
        }
        if let Some(v) = view.extra {
            config.view.extra = v;
        }
        if let Some(v) = view.narrow_pad {
            config.view.narrow_pad = v;
        }
    }

    if let Some(map) = parsed.map {
        if let Some(v) = map.fan_max {
            config.map.fan_max = v;
        }
        if let Some(v) = map.fan_spread_deg {
            config.map.fan_spread_deg = v;
        }
        if let Some(v) = map.halo_start {
            config.map.halo_start = v;
        }
        if let Some(v) = map.leader_lines {
            config.map.leader_lines = v;
        }
        if let Some(v) = map.single_offset {
            config.map.single_offset = v;
        }
        if map.clamp_margin.is_some() {
            config.map.clamp_margin = map.clamp_margin;
        }
    }

    if let Some(timeline) = parsed.timeline {
        if let Some(v) = timeline.gap_x {
            config.timeline.gap_x = v;
        }
        if let Some(v) = timeline.gap_y {
            config.timeline.gap_y = v;
        }
        if let Some(v) = timeline.pad_x {
            config.timeline.pad_x = v;
        }
        if let Some(v) = timeline.pad_y {
            config.timeline.pad_y = v;
        }
        if let Some(v) = timeline.card_width {
            config.timeline.card_width = v;
        }
        if let Some(v) = timeline.card_height {
            config.timeline.card_height = v;
        }
        if let Some(v) = timeline.cols {
            config.timeline.cols = v;
        }
        if let Some(v) = timeline.elbow_x {
            config.timeline.elbow_x = v;
        }
        if let Some(v) = timeline.stroke_pad {
            config.timeline.stroke_pad = v;
        }
    }

    if let Some(zoom) = parsed.zoom {
        if let Some(v) = zoom.min {
            config.zoom.min = v;
        }
        if let Some(v) = zoom.max {
            config.zoom.max = v;
        }
        if let Some(v) = zoom.step {
            config.zoom.step = v;
        }
        if config.zoom.max < config.zoom.min {
            return Err(Error::Config(format!(
                "zoom.max {} is below zoom.min {}",
                config.zoom.max, config.zoom.min
            )));
        }
    }

    if let Some(avatar) = parsed.avatar {
        if let Some(v) = avatar.object_position {
            config.avatar.object_position = v;
        }
        if let Some(v) = avatar.scale {
            config.avatar.scale = v;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_constants() {
        let config = Config::default();
        assert_eq!(config.tree.stem_len(), 80.0);
        assert_eq!(config.view.min_width, 1050.0);
        assert_eq!(config.view.min_height, 620.0);
        assert_eq!(config.timeline.cols, 3);
        assert_eq!(config.zoom.max, 3.2);
        assert_eq!(config.map.pin_size.at(800.0), 34.0);
        assert_eq!(config.map.edge_margin.at(800.0), 28.0);
    }

    #[test]
    fn invalid_stem_falls_back() {
        for stem in [0.0, -3.0, f32::NAN, f32::INFINITY] {
            let tree = TreeConfig {
                stem,
                ..TreeConfig::default()
            };
            assert_eq!(tree.stem_len(), 14.0);
        }
    }

    #[test]
    fn overlay_only_touches_given_fields() {
        let config = parse_config_str(r#"{"tree":{"stem":60},"timeline":{"cols":4}}"#).unwrap();
        assert_eq!(config.tree.stem, 60.0);
        assert_eq!(config.tree.card_width, 160.0);
        assert_eq!(config.timeline.cols, 4);
        assert_eq!(config.timeline.gap_x, 24.0);
    }

    #[test]
    fn accepts_json5() {
        let config = parse_config_str("{ view: { pad: 10, }, // tight\n }").unwrap();
        assert_eq!(config.view.pad, 10.0);
    }

    #[test]
    fn rejects_unknown_theme_and_inverted_zoom() {
        assert!(matches!(
            parse_config_str(r#"{"theme":"neon"}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            parse_config_str(r#"{"zoom":{"min":2,"max":1}}"#),
            Err(Error::Config(_))
        ));
    }
}
