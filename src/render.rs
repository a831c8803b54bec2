use crate::config::{AvatarConfig, Config, RenderConfig};
use crate::events::format_date;
use crate::layout::{
    ConnectorKind, Layout, MapLayout, NodeKind, PinLayout, TimelineLayout, TreeLayout, TreeNodeLayout,
};
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

pub fn render_svg(layout: &Layout, config: &Config) -> String {
    match layout {
        Layout::Tree(tree) => render_tree_svg(tree, config),
        Layout::Map(map) => render_map_svg(map, config),
        Layout::Timeline(timeline) => render_timeline_svg(timeline, config),
    }
}

fn open_svg(svg: &mut String, width: f32, height: f32, view_box: &str, theme: &Theme) {
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"{view_box}\" font-family=\"{}\">",
        escape_xml(&theme.font_family)
    ));
}

pub fn render_tree_svg(layout: &TreeLayout, config: &Config) -> String {
    let theme = &config.theme;
    let cfg = &config.tree;
    let vb = layout.view_box;
    let mut svg = String::new();
    open_svg(&mut svg, vb.width, vb.height, &vb.to_attr(), theme);

    svg.push_str(&format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"/>",
        vb.x, vb.y, vb.width, vb.height, theme.background
    ));

    svg.push_str("<defs>");
    for (idx, node) in persons(layout).enumerate() {
        let top = node.top();
        svg.push_str(&format!(
            "<clipPath id=\"tree-photo-{idx}\"><rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{:.2}\" ry=\"{:.2}\"/></clipPath>",
            top.x - node.width / 2.0,
            top.y,
            node.width,
            cfg.photo_height,
            cfg.card_radius,
            cfg.card_radius
        ));
    }
    svg.push_str("</defs>");

    svg.push_str("<g class=\"links\">");
    for connector in &layout.connectors {
        let width = match connector.kind {
            ConnectorKind::CoupleJoin => cfg.join_width,
            ConnectorKind::Trunk => cfg.trunk_width,
            ConnectorKind::Elbow => cfg.link_width,
        };
        svg.push_str(&format!(
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{width}\" stroke-linecap=\"round\" stroke-linejoin=\"round\"/>",
            connector.path.to_svg_d(),
            theme.link_color
        ));
    }
    svg.push_str("</g>");

    for icon in &layout.marriage_icons {
        for side in [-1.0_f32, 1.0] {
            svg.push_str(&format!(
                "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>",
                icon.center.x + side * icon.ring_offset,
                icon.center.y,
                icon.ring_radius,
                theme.accent
            ));
        }
    }

    for node in layout.nodes.iter().filter(|n| n.kind == NodeKind::Union) {
        svg.push_str(&format!(
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{}\" fill=\"{}\"/>",
            node.rendered.x, node.rendered.y, cfg.union_radius, theme.union_dot
        ));
    }

    for (idx, node) in persons(layout).enumerate() {
        svg.push_str(&tree_card_svg(idx, node, config));
    }

    svg.push_str("</svg>");
    svg
}

fn persons(layout: &TreeLayout) -> impl Iterator<Item = &TreeNodeLayout> {
    layout.nodes.iter().filter(|n| n.kind == NodeKind::Person)
}

fn tree_card_svg(idx: usize, node: &TreeNodeLayout, config: &Config) -> String {
    let theme = &config.theme;
    let cfg = &config.tree;
    let left = node.rendered.x - node.width / 2.0;
    let top = node.rendered.y - node.height / 2.0;
    let mut card = String::new();

    card.push_str(&format!(
        "<g class=\"card\" data-id=\"{}\"><rect x=\"{left:.2}\" y=\"{top:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{r}\" ry=\"{r}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.2\"/>",
        escape_xml(&node.id),
        node.width,
        node.height,
        theme.card_background,
        theme.card_stroke,
        r = cfg.card_radius,
    ));
    card.push_str(&format!(
        "<rect x=\"{left:.2}\" y=\"{top:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" clip-path=\"url(#tree-photo-{idx})\"/>",
        node.width, cfg.photo_height, theme.photo_placeholder
    ));
    if !node.photo.is_empty() {
        card.push_str(&format!(
            "<image href=\"{}\" x=\"{left:.2}\" y=\"{top:.2}\" width=\"{:.2}\" height=\"{:.2}\" preserveAspectRatio=\"{}\" clip-path=\"url(#tree-photo-{idx})\"/>",
            escape_xml(&node.photo),
            node.width,
            cfg.photo_height,
            preserve_aspect(&config.avatar)
        ));
    }
    let sep_y = top + cfg.photo_height;
    card.push_str(&format!(
        "<line x1=\"{left:.2}\" y1=\"{sep_y:.2}\" x2=\"{:.2}\" y2=\"{sep_y:.2}\" stroke=\"{}\" stroke-width=\"1\"/>",
        left + node.width,
        theme.separator
    ));
    card.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-size=\"{}\" font-weight=\"600\" fill=\"{}\">{}</text>",
        node.rendered.x,
        top + cfg.name_y,
        cfg.name_font_size,
        theme.text_strong,
        escape_xml(&node.label)
    ));
    if !node.meta.is_empty() {
        card.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-size=\"{}\" fill=\"{}\">{}</text>",
            node.rendered.x,
            top + cfg.meta_y,
            cfg.meta_font_size,
            theme.text_soft,
            escape_xml(&node.meta)
        ));
    }
    card.push_str("</g>");
    card
}

pub fn render_map_svg(layout: &MapLayout, config: &Config) -> String {
    let theme = &config.theme;
    let mut svg = String::new();
    let view_box = format!("0 0 {:.2} {:.2}", layout.width, layout.height);
    open_svg(&mut svg, layout.width, layout.height, &view_box, theme);

    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));
    let contain = layout.contain;
    svg.push_str(&format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>",
        contain.x, contain.y, contain.width, contain.height, theme.photo_placeholder, theme.card_stroke
    ));

    let radius = layout.pin_size / 2.0;
    svg.push_str("<defs>");
    for (idx, pin) in layout.pins.iter().enumerate() {
        svg.push_str(&format!(
            "<clipPath id=\"map-pin-{idx}\"><circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{radius:.2}\"/></clipPath>",
            pin.display.x, pin.display.y
        ));
    }
    svg.push_str("</defs>");

    for cluster in &layout.clusters {
        svg.push_str(&format!(
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.2\" stroke-dasharray=\"4 4\" opacity=\"0.7\"/>",
            cluster.center.x,
            cluster.center.y,
            cluster.orbit_size / 2.0,
            theme.link_color
        ));
    }

    for pin in layout.pins.iter().filter(|p| p.leader) {
        svg.push_str(&format!(
            "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"1.4\"/>",
            pin.display.x, pin.display.y, pin.anchor.x, pin.anchor.y, theme.link_color
        ));
    }

    for pin in &layout.pins {
        let r = if pin.cluster.is_some() {
            layout.cluster_dot_radius
        } else {
            layout.dot_radius
        };
        svg.push_str(&format!(
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{r}\" fill=\"{}\"/>",
            pin.anchor.x, pin.anchor.y, theme.accent
        ));
    }

    for (idx, pin) in layout.pins.iter().enumerate() {
        svg.push_str(&map_pin_svg(idx, pin, radius, config));
    }

    for cluster in &layout.clusters {
        let badge_r = (layout.pin_size * 0.3).max(10.0);
        svg.push_str(&format!(
            "<g class=\"badge\"><circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{badge_r:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"2\"/><text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-size=\"12\" font-weight=\"700\" fill=\"{}\">{}</text></g>",
            cluster.anchor.x,
            cluster.anchor.y,
            theme.badge_background,
            theme.pin_ring,
            cluster.anchor.x,
            cluster.anchor.y,
            theme.badge_text,
            cluster.count
        ));
    }

    svg.push_str("</svg>");
    svg
}

fn map_pin_svg(idx: usize, pin: &PinLayout, radius: f32, config: &Config) -> String {
    let theme = &config.theme;
    let (x, y) = (pin.display.x, pin.display.y);
    let mut out = format!("<g class=\"pin\" data-id=\"{}\">", escape_xml(&pin.person_id));
    let tooltip = if pin.place.is_empty() {
        pin.label.clone()
    } else {
        format!("{} \u{00b7} {}", pin.label, pin.place)
    };
    out.push_str(&format!("<title>{}</title>", escape_xml(&tooltip)));
    out.push_str(&format!(
        "<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"{radius:.2}\" fill=\"{}\"/>",
        theme.photo_placeholder
    ));
    if !pin.photo.is_empty() {
        let size = radius * 2.0 / config.avatar.scale.max(0.1);
        out.push_str(&format!(
            "<image href=\"{}\" x=\"{:.2}\" y=\"{:.2}\" width=\"{size:.2}\" height=\"{size:.2}\" preserveAspectRatio=\"{}\" clip-path=\"url(#map-pin-{idx})\"/>",
            escape_xml(&pin.photo),
            x - size / 2.0,
            y - size / 2.0,
            preserve_aspect(&config.avatar)
        ));
    }
    out.push_str(&format!(
        "<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"{radius:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2.5\"/></g>",
        theme.pin_ring
    ));
    out
}

pub fn render_timeline_svg(layout: &TimelineLayout, config: &Config) -> String {
    let theme = &config.theme;
    let mut svg = String::new();
    open_svg(&mut svg, layout.width, layout.height, &layout.view_box.to_attr(), theme);
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    if let Some(path) = &layout.path {
        svg.push_str(&format!(
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2.5\" stroke-linecap=\"round\"/>",
            path.to_svg_d(),
            theme.link_color
        ));
    }

    let (w, h) = (layout.card_width, layout.card_height);
    let avatar = (h - 24.0).clamp(24.0, 56.0);
    for (idx, card) in layout.cards.iter().enumerate() {
        let left = card.center.x - w / 2.0;
        let top = card.center.y - h / 2.0;
        svg.push_str(&format!(
            "<g class=\"event\" data-kind=\"{}\"><rect x=\"{left:.2}\" y=\"{top:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" rx=\"12\" ry=\"12\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.2\"/>",
            escape_xml(&card.event.kind),
            theme.card_background,
            theme.card_stroke
        ));
        let ax = left + 12.0 + avatar / 2.0;
        let ay = card.center.y;
        svg.push_str(&format!(
            "<clipPath id=\"event-photo-{idx}\"><circle cx=\"{ax:.2}\" cy=\"{ay:.2}\" r=\"{:.2}\"/></clipPath><circle cx=\"{ax:.2}\" cy=\"{ay:.2}\" r=\"{:.2}\" fill=\"{}\"/>",
            avatar / 2.0,
            avatar / 2.0,
            theme.photo_placeholder
        ));
        if !card.event.photo.is_empty() {
            svg.push_str(&format!(
                "<image href=\"{}\" x=\"{:.2}\" y=\"{:.2}\" width=\"{avatar:.2}\" height=\"{avatar:.2}\" preserveAspectRatio=\"{}\" clip-path=\"url(#event-photo-{idx})\"/>",
                escape_xml(&card.event.photo),
                ax - avatar / 2.0,
                ay - avatar / 2.0,
                preserve_aspect(&config.avatar)
            ));
        }
        let text_x = left + 24.0 + avatar;
        let date = format_date(&card.event.date);
        let lines = [
            (top + 24.0, 12.0, theme.accent.as_str(), date.as_str(), "600"),
            (top + 48.0, 15.0, theme.text_strong.as_str(), card.event.title.as_str(), "600"),
            (top + 70.0, 12.5, theme.text_soft.as_str(), card.event.meta.as_str(), "400"),
        ];
        for (y, size, fill, text, weight) in lines {
            if text.is_empty() {
                continue;
            }
            svg.push_str(&format!(
                "<text x=\"{text_x:.2}\" y=\"{y:.2}\" font-size=\"{size}\" font-weight=\"{weight}\" fill=\"{fill}\">{}</text>",
                escape_xml(text)
            ));
        }
        svg.push_str("</g>");
    }

    for card in &layout.cards {
        svg.push_str(&format!(
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{}\" fill=\"{}\"/>",
            card.center.x, card.center.y, layout.dot_radius, theme.accent
        ));
    }

    svg.push_str("</svg>");
    svg
}

/// Nearest SVG alignment for a CSS `object-position` such as "50% 28%".
fn preserve_aspect(avatar: &AvatarConfig) -> String {
    let mut parts = avatar
        .object_position
        .split_whitespace()
        .map(|p| p.trim_end_matches('%').parse::<f32>().unwrap_or(50.0));
    let align = |pct: f32, axis: char| {
        let name = if pct < 25.0 {
            "Min"
        } else if pct > 75.0 {
            "Max"
        } else {
            "Mid"
        };
        format!("{axis}{name}")
    };
    let x = align(parts.next().unwrap_or(50.0), 'x');
    let y = align(parts.next().unwrap_or(50.0), 'Y');
    format!("{x}{y} slice")
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme
        .font_family
        .split(',')
        .next()
        .map(|f| f.trim().to_string())
        .unwrap_or_else(|| "Inter".to_string());
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .or_else(|| usvg::Size::from_wh(800.0, 600.0))
        .ok_or_else(|| anyhow::anyhow!("Invalid output size"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;
    if let Some(color) = parse_hex_color(&render_cfg.background) {
        pixmap.fill(color);
    }

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig, _theme: &Theme) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

#[cfg(feature = "png")]
fn parse_hex_color(raw: &str) -> Option<resvg::tiny_skia::Color> {
    let hex = raw.trim().strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(resvg::tiny_skia::Color::from_rgba8(channel(0)?, channel(2)?, channel(4)?, 255))
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{DomainPosition, Person, Relationship, Tree};
    use crate::layout::{ViewKind, compute_layout};

    fn tree() -> Tree {
        let person = |id: &str, name: &str| Person {
            id: id.to_string(),
            name: name.to_string(),
            born: Some("1950".to_string()),
            photo: format!("/img/{id}.jpg"),
            position: Some(DomainPosition::Percent { x: 50.0, y: 50.0 }),
            ..Person::default()
        };
        Tree {
            people: vec![person("a", "Ada & Co"), person("b", "Ben"), person("c", "Cy")],
            relationships: vec![
                Relationship {
                    parent_id: "a".to_string(),
                    child_id: "c".to_string(),
                },
                Relationship {
                    parent_id: "b".to_string(),
                    child_id: "c".to_string(),
                },
            ],
            events: Vec::new(),
        }
    }

    #[test]
    fn tree_svg_has_cards_and_marriage_icon() {
        let config = Config::default();
        let layout = compute_layout(&tree(), ViewKind::Tree, 1200.0, 800.0, &config);
        let svg = render_svg(&layout, &config);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Ada &amp; Co"));
        assert_eq!(svg.matches("class=\"card\"").count(), 3);
        assert!(svg.contains(&format!("r=\"{}\"", config.tree.union_radius)));
    }

    #[test]
    fn map_svg_draws_badge_and_leaders() {
        let config = Config::default();
        let layout = compute_layout(&tree(), ViewKind::Map, 800.0, 600.0, &config);
        let svg = render_svg(&layout, &config);
        assert!(svg.contains("class=\"badge\""));
        assert_eq!(svg.matches("<line").count(), 3);
        assert_eq!(svg.matches("class=\"pin\"").count(), 3);
    }

    #[test]
    fn timeline_svg_draws_one_path() {
        let config = Config::default();
        let layout = compute_layout(&tree(), ViewKind::Timeline, 1000.0, 600.0, &config);
        let svg = render_svg(&layout, &config);
        assert_eq!(svg.matches("<path").count(), 1);
        assert_eq!(svg.matches("class=\"event\"").count(), 3);
    }

    #[test]
    fn object_position_maps_to_alignment() {
        assert_eq!(preserve_aspect(&AvatarConfig::default()), "xMidYMid slice");
        let top = AvatarConfig {
            object_position: "0% 10%".to_string(),
            scale: 1.0,
        };
        assert_eq!(preserve_aspect(&top), "xMinYMin slice");
    }

    #[cfg(feature = "png")]
    #[test]
    fn hex_colors_reject_non_ascii() {
        assert!(parse_hex_color("#1e1b18").is_some());
        assert!(parse_hex_color("#a\u{e9}\u{e9}b").is_none());
        assert!(parse_hex_color("#zzzzzz").is_none());
        assert!(parse_hex_color("1e1b18").is_none());
    }
}
