use crate::layout::{Layout, MapLayout, TimelineLayout, TreeLayout, ViewBox};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub kind: String,
    pub view_box: [f32; 4],
    pub nodes: Vec<NodeDump>,
    pub paths: Vec<PathDump>,
    pub pins: Vec<PinDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub kind: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct PathDump {
    pub kind: String,
    pub from: String,
    pub to: String,
    pub d: String,
}

#[derive(Debug, Serialize)]
pub struct PinDump {
    pub id: String,
    pub anchor: [f32; 2],
    pub display: [f32; 2],
    pub leader: bool,
    pub cluster: Option<usize>,
}

fn view_box(vb: ViewBox) -> [f32; 4] {
    [vb.x, vb.y, vb.width, vb.height]
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        match layout {
            Layout::Tree(tree) => Self::from_tree(tree),
            Layout::Map(map) => Self::from_map(map),
            Layout::Timeline(timeline) => Self::from_timeline(timeline),
        }
    }

    fn from_tree(layout: &TreeLayout) -> Self {
        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                kind: format!("{:?}", node.kind),
                x: node.rendered.x,
                y: node.rendered.y,
                width: node.width,
                height: node.height,
                label: node.label.clone(),
            })
            .collect();
        let paths = layout
            .connectors
            .iter()
            .map(|c| PathDump {
                kind: format!("{:?}", c.kind),
                from: c.from.clone(),
                to: c.to.clone(),
                d: c.path.to_svg_d(),
            })
            .collect();
        LayoutDump {
            kind: "tree".to_string(),
            view_box: view_box(layout.view_box),
            nodes,
            paths,
            pins: Vec::new(),
        }
    }

    fn from_map(layout: &MapLayout) -> Self {
        let pins = layout
            .pins
            .iter()
            .map(|pin| PinDump {
                id: pin.person_id.clone(),
                anchor: [pin.anchor.x, pin.anchor.y],
                display: [pin.display.x, pin.display.y],
                leader: pin.leader,
                cluster: pin.cluster,
            })
            .collect();
        LayoutDump {
            kind: "map".to_string(),
            view_box: [0.0, 0.0, layout.width, layout.height],
            nodes: Vec::new(),
            paths: Vec::new(),
            pins,
        }
    }

    fn from_timeline(layout: &TimelineLayout) -> Self {
        let nodes = layout
            .cards
            .iter()
            .map(|card| NodeDump {
                id: card.event.id.clone(),
                kind: card.event.kind.clone(),
                x: card.center.x,
                y: card.center.y,
                width: layout.card_width,
                height: layout.card_height,
                label: card.event.title.clone(),
            })
            .collect();
        let paths = layout
            .path
            .iter()
            .map(|path| PathDump {
                kind: "Serpentine".to_string(),
                from: layout.cards.first().map(|c| c.event.id.clone()).unwrap_or_default(),
                to: layout.cards.last().map(|c| c.event.id.clone()).unwrap_or_default(),
                d: path.to_svg_d(),
            })
            .collect();
        LayoutDump {
            kind: "timeline".to_string(),
            view_box: view_box(layout.view_box),
            nodes,
            paths,
            pins: Vec::new(),
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
