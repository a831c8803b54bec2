pub mod cluster;
pub mod map;
pub mod projection;
pub mod ranking;
pub mod routing;
pub mod timeline;
pub mod tree;
pub(crate) mod types;
pub mod viewport;

pub use types::*;

pub use map::{CountryGroup, CountryMap, compute_country_maps, compute_map_layout, group_by_place};
pub use timeline::{auto_columns, compute_timeline_layout};
pub use tree::{compute_tree_layout, fit_tree};

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::events::{EventFilter, build_events};
use crate::ir::Tree;

/// The three ways a family snapshot can be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Tree,
    Map,
    Timeline,
}

/// Geometry of one view, ready for drawing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Layout {
    Tree(TreeLayout),
    Map(MapLayout),
    Timeline(TimelineLayout),
}

impl Layout {
    pub fn kind(&self) -> ViewKind {
        match self {
            Layout::Tree(_) => ViewKind::Tree,
            Layout::Map(_) => ViewKind::Map,
            Layout::Timeline(_) => ViewKind::Timeline,
        }
    }

    pub fn view_box(&self) -> ViewBox {
        match self {
            Layout::Tree(tree) => tree.view_box,
            Layout::Map(map) => ViewBox::new(0.0, 0.0, map.width, map.height),
            Layout::Timeline(timeline) => timeline.view_box,
        }
    }
}

/// Places the generations and routes the tree in one pass.
pub fn compute_family_tree(tree: &Tree, container_width: f32, config: &Config) -> TreeLayout {
    let (nodes, links) = ranking::layout_family(tree, &config.tree);
    compute_tree_layout(&nodes, &links, container_width, config)
}

/// Lays out `tree` as `kind` for a container of `width` x `height` pixels.
pub fn compute_layout(tree: &Tree, kind: ViewKind, width: f32, height: f32, config: &Config) -> Layout {
    match kind {
        ViewKind::Tree => Layout::Tree(compute_family_tree(tree, width, config)),
        ViewKind::Map => Layout::Map(compute_map_layout(&tree.people, width, height, None, &config.map)),
        ViewKind::Timeline => {
            let events = EventFilter::default().apply(&build_events(tree));
            Layout::Timeline(compute_timeline_layout(&events, width, &config.timeline))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{DomainPosition, Person, Relationship};

    fn small_tree() -> Tree {
        let person = |id: &str, born: &str| Person {
            id: id.to_string(),
            name: id.to_string(),
            born: Some(born.to_string()),
            position: Some(DomainPosition::Percent { x: 40.0, y: 40.0 }),
            ..Person::default()
        };
        Tree {
            people: vec![person("ned", "1950"), person("cat", "1952"), person("robb", "1975")],
            relationships: vec![
                Relationship {
                    parent_id: "ned".to_string(),
                    child_id: "robb".to_string(),
                },
                Relationship {
                    parent_id: "cat".to_string(),
                    child_id: "robb".to_string(),
                },
            ],
            events: Vec::new(),
        }
    }

    #[test]
    fn every_view_is_computed() {
        let tree = small_tree();
        let config = Config::default();
        for kind in [ViewKind::Tree, ViewKind::Map, ViewKind::Timeline] {
            let layout = compute_layout(&tree, kind, 1200.0, 800.0, &config);
            assert_eq!(layout.kind(), kind);
            assert!(layout.view_box().is_finite());
        }
    }

    #[test]
    fn layout_is_idempotent() {
        let tree = small_tree();
        let config = Config::default();
        let a = compute_layout(&tree, ViewKind::Tree, 1200.0, 800.0, &config);
        let b = compute_layout(&tree, ViewKind::Tree, 1200.0, 800.0, &config);
        assert_eq!(a, b);
    }
}
