use serde::Serialize;

use crate::events::TimelineEvent;
use crate::geometry::{Point, Rect};

/// Camera window over the layout's pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewBox {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    pub fn to_attr(&self) -> String {
        format!(
            "{:.2} {:.2} {:.2} {:.2}",
            self.x, self.y, self.width, self.height
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    CubicTo(Point, Point, Point),
}

/// Drawable path kept as commands so geometry can be inspected before it is
/// serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathData {
    pub commands: Vec<PathCommand>,
}

impl PathData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(at: Point) -> Self {
        Self {
            commands: vec![PathCommand::MoveTo(at)],
        }
    }

    pub fn move_to(&mut self, p: Point) -> &mut Self {
        self.commands.push(PathCommand::MoveTo(p));
        self
    }

    pub fn line_to(&mut self, p: Point) -> &mut Self {
        self.commands.push(PathCommand::LineTo(p));
        self
    }

    pub fn cubic_to(&mut self, c1: Point, c2: Point, to: Point) -> &mut Self {
        self.commands.push(PathCommand::CubicTo(c1, c2, to));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Every point the path mentions, control points included.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.commands.iter().flat_map(|cmd| match *cmd {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => vec![p],
            PathCommand::CubicTo(c1, c2, p) => vec![c1, c2, p],
        })
    }

    /// End points of each command in order.
    pub fn vertices(&self) -> Vec<Point> {
        self.commands
            .iter()
            .map(|cmd| match *cmd {
                PathCommand::MoveTo(p) | PathCommand::LineTo(p) | PathCommand::CubicTo(_, _, p) => p,
            })
            .collect()
    }

    pub fn to_svg_d(&self) -> String {
        let mut d = String::new();
        for cmd in &self.commands {
            if !d.is_empty() {
                d.push(' ');
            }
            match cmd {
                PathCommand::MoveTo(p) => d.push_str(&format!("M {:.2} {:.2}", p.x, p.y)),
                PathCommand::LineTo(p) => d.push_str(&format!("L {:.2} {:.2}", p.x, p.y)),
                PathCommand::CubicTo(c1, c2, p) => d.push_str(&format!(
                    "C {:.2} {:.2} {:.2} {:.2} {:.2} {:.2}",
                    c1.x, c1.y, c2.x, c2.y, p.x, p.y
                )),
            }
        }
        d
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    Person,
    Union,
}

/// Positioned tree entity as handed to the tree pass. `x`/`y` are centers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub id: String,
    pub kind: NodeKind,
    pub x: f32,
    pub y: f32,
    pub label: String,
    pub meta: String,
    pub photo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeLink {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNodeLayout {
    pub id: String,
    pub kind: NodeKind,
    /// Position assigned by the generational layout.
    pub center: Point,
    /// Position everything downstream draws and frames. Differs from
    /// `center` only for unions pulled onto a couple-join trunk.
    pub rendered: Point,
    pub width: f32,
    pub height: f32,
    pub label: String,
    pub meta: String,
    pub photo: String,
}

impl TreeNodeLayout {
    pub fn top(&self) -> Point {
        match self.kind {
            NodeKind::Union => self.rendered,
            NodeKind::Person => Point::new(self.rendered.x, self.rendered.y - self.height / 2.0),
        }
    }

    pub fn bottom(&self) -> Point {
        match self.kind {
            NodeKind::Union => self.rendered,
            NodeKind::Person => Point::new(self.rendered.x, self.rendered.y + self.height / 2.0),
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_center(self.rendered, self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectorKind {
    /// Horizontal bar between the inner walls of two partners.
    CoupleJoin,
    /// Vertical drop from a couple-join bar to its union point.
    Trunk,
    Elbow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectorLayout {
    pub kind: ConnectorKind,
    pub from: String,
    pub to: String,
    pub path: PathData,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarriageIcon {
    pub center: Point,
    pub ring_offset: f32,
    pub ring_radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeLayout {
    pub nodes: Vec<TreeNodeLayout>,
    pub connectors: Vec<ConnectorLayout>,
    pub marriage_icons: Vec<MarriageIcon>,
    pub view_box: ViewBox,
    pub narrow: bool,
}

impl TreeLayout {
    pub fn node(&self, id: &str) -> Option<&TreeNodeLayout> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PinLayout {
    pub person_id: String,
    pub label: String,
    pub photo: String,
    /// "City, Country" line for the tooltip.
    pub place: String,
    /// True projected location.
    pub anchor: Point,
    /// Where the avatar is drawn, always inside the contain box.
    pub display: Point,
    pub leader: bool,
    /// Index into [`MapLayout::clusters`] when the pin belongs to one.
    pub cluster: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterBadge {
    pub anchor: Point,
    /// Centre of the orbit ring around the spread members.
    pub center: Point,
    pub count: usize,
    pub orbit_size: f32,
    pub head_photo: String,
    pub member_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapLayout {
    pub width: f32,
    pub height: f32,
    pub contain: Rect,
    pub pin_size: f32,
    pub dot_radius: f32,
    pub cluster_dot_radius: f32,
    pub pins: Vec<PinLayout>,
    pub clusters: Vec<ClusterBadge>,
    /// People left off the map for lack of coordinates.
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineCardLayout {
    pub event: TimelineEvent,
    pub center: Point,
    pub row: usize,
    pub col: usize,
    /// 1 for left-to-right rows, -1 for right-to-left.
    pub dir: i8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineLayout {
    pub width: f32,
    pub height: f32,
    pub cols: usize,
    pub card_width: f32,
    pub card_height: f32,
    pub dot_radius: f32,
    pub cards: Vec<TimelineCardLayout>,
    pub path: Option<PathData>,
    pub view_box: ViewBox,
}
