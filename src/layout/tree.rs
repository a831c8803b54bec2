use std::collections::HashMap;

use super::routing::{CoupleJoin, elbow};
use super::types::{
    ConnectorKind, ConnectorLayout, MarriageIcon, NodeKind, TreeLayout, TreeLink, TreeNode,
    TreeNodeLayout, ViewBox,
};
use super::viewport::{FrameItem, FrameOptions, frame_items};
use crate::config::{Config, ViewConfig};
use crate::geometry::Point;

/// Horizontal distance of each marriage ring from the icon center.
const RING_OFFSET: f32 = 4.2;

/// Cards are framed as boxes and unions as points, both at their rendered
/// position.
pub fn tree_frame_items(nodes: &[TreeNodeLayout]) -> impl Iterator<Item = FrameItem> + '_ {
    nodes.iter().map(|n| match n.kind {
        NodeKind::Union => FrameItem::Point(n.rendered),
        NodeKind::Person => FrameItem::Box {
            center: n.rendered,
            width: n.width,
            height: n.height,
        },
    })
}

/// Tight re-frame of an already computed tree.
pub fn fit_tree(nodes: &[TreeNodeLayout], view: &ViewConfig) -> ViewBox {
    frame_items(tree_frame_items(nodes), &FrameOptions::fit(view))
}

/// Routes every link of a positioned tree and frames the result.
///
/// Couple joins are resolved first: a union with two or more parents is
/// moved to the end of its trunk, and every connector leaving it starts
/// there.
pub fn compute_tree_layout(
    nodes: &[TreeNode],
    links: &[TreeLink],
    container_width: f32,
    config: &Config,
) -> TreeLayout {
    let tree_cfg = &config.tree;
    let stem = tree_cfg.stem_len();

    let mut laid: Vec<TreeNodeLayout> = nodes
        .iter()
        .map(|n| {
            let (width, height) = match n.kind {
                NodeKind::Person => (tree_cfg.card_width, tree_cfg.card_height),
                NodeKind::Union => (0.0, 0.0),
            };
            let center = Point::new(n.x, n.y);
            TreeNodeLayout {
                id: n.id.clone(),
                kind: n.kind,
                center,
                rendered: center,
                width,
                height,
                label: n.label.clone(),
                meta: n.meta.clone(),
                photo: n.photo.clone(),
            }
        })
        .collect();
    let index: HashMap<String, usize> = laid
        .iter()
        .enumerate()
        .map(|(idx, n)| (n.id.clone(), idx))
        .collect();
    let resolve = |id: &str| index.get(id).copied();

    let mut parents_by_union: Vec<(usize, Vec<usize>)> = Vec::new();
    for link in links {
        let (Some(s), Some(t)) = (resolve(&link.source), resolve(&link.target)) else {
            continue;
        };
        if laid[s].kind == NodeKind::Person && laid[t].kind == NodeKind::Union {
            match parents_by_union.iter_mut().find(|(u, _)| *u == t) {
                Some((_, parents)) => parents.push(s),
                None => parents_by_union.push((t, vec![s])),
            }
        }
    }

    let mut connectors = Vec::new();
    let mut marriage_icons = Vec::new();
    let mut joined: Vec<usize> = Vec::new();
    for (union_idx, parents) in &parents_by_union {
        let centers: Vec<Point> = parents.iter().map(|p| laid[*p].rendered).collect();
        let Some(join) = CoupleJoin::between(&centers, tree_cfg.card_width, stem) else {
            continue;
        };
        let union_id = laid[*union_idx].id.clone();
        connectors.push(ConnectorLayout {
            kind: ConnectorKind::CoupleJoin,
            from: laid[parents[0]].id.clone(),
            to: union_id.clone(),
            path: join.bar(),
        });
        connectors.push(ConnectorLayout {
            kind: ConnectorKind::Trunk,
            from: union_id.clone(),
            to: union_id,
            path: join.trunk(),
        });
        marriage_icons.push(MarriageIcon {
            center: Point::new(join.trunk_x, join.join_y - tree_cfg.marriage_icon_offset),
            ring_offset: RING_OFFSET,
            ring_radius: tree_cfg.marriage_ring_radius,
        });
        laid[*union_idx].rendered = Point::new(join.trunk_x, join.union_y);
        joined.push(*union_idx);
    }

    for link in links {
        let (Some(s), Some(t)) = (resolve(&link.source), resolve(&link.target)) else {
            continue;
        };
        let (source, target) = (&laid[s], &laid[t]);
        match (source.kind, target.kind) {
            (NodeKind::Person, NodeKind::Union) => {
                if joined.contains(&t) {
                    continue;
                }
                connectors.push(ConnectorLayout {
                    kind: ConnectorKind::Elbow,
                    from: source.id.clone(),
                    to: target.id.clone(),
                    path: elbow(source.bottom(), target.rendered, stem),
                });
            }
            (NodeKind::Union, NodeKind::Person) => {
                connectors.push(ConnectorLayout {
                    kind: ConnectorKind::Elbow,
                    from: source.id.clone(),
                    to: target.id.clone(),
                    path: elbow(source.rendered, target.top(), stem),
                });
            }
            _ => {}
        }
    }

    let narrow = container_width <= tree_cfg.narrow_breakpoint;
    let opts = if narrow {
        FrameOptions::narrow(&config.view)
    } else {
        FrameOptions::standard(&config.view)
    };
    let view_box = frame_items(tree_frame_items(&laid), &opts);

    TreeLayout {
        nodes: laid,
        connectors,
        marriage_icons,
        view_box,
        narrow,
    }
}
