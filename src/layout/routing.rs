//! Connector geometry shared by the tree and timeline views.

use super::types::PathData;
use crate::geometry::{Point, clamp};

/// Bezier handle length for a quarter circle of radius 1.
const QUARTER_CIRCLE_K: f32 = 0.552_284_75;

/// Vertical from `a` by `stem`, horizontal to `b.x`, vertical into `b`.
pub fn elbow(a: Point, b: Point, stem: f32) -> PathData {
    let mid_y = a.y + stem;
    let mut path = PathData::start(a);
    path.line_to(Point::new(a.x, mid_y))
        .line_to(Point::new(b.x, mid_y))
        .line_to(b);
    path
}

/// Geometry joining two partners to their shared union point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoupleJoin {
    pub bar_start: Point,
    pub bar_end: Point,
    pub join_y: f32,
    pub trunk_x: f32,
    /// Where the trunk ends; the union is drawn and framed at this y.
    pub union_y: f32,
}

impl CoupleJoin {
    /// `parents` are card centers; the bar runs between the inner walls of
    /// the leftmost and rightmost card. `None` for fewer than two parents.
    pub fn between(parents: &[Point], card_width: f32, stem: f32) -> Option<Self> {
        if parents.len() < 2 {
            return None;
        }
        let mut sorted = parents.to_vec();
        sorted.sort_by(|a, b| a.x.total_cmp(&b.x));
        let left = sorted[0];
        let right = sorted[sorted.len() - 1];

        let inner_left = left.x + card_width / 2.0;
        let inner_right = right.x - card_width / 2.0;
        let join_y = (left.y + right.y) / 2.0;
        Some(Self {
            bar_start: Point::new(inner_left, join_y),
            bar_end: Point::new(inner_right, join_y),
            join_y,
            trunk_x: (inner_left + inner_right) / 2.0,
            union_y: join_y + stem,
        })
    }

    pub fn bar(&self) -> PathData {
        let mut path = PathData::start(self.bar_start);
        path.line_to(self.bar_end);
        path
    }

    pub fn trunk(&self) -> PathData {
        let mut path = PathData::start(Point::new(self.trunk_x, self.join_y));
        path.line_to(Point::new(self.trunk_x, self.union_y));
        path
    }
}

/// Horizontal band connectors must stay inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafeWindow {
    pub min_x: f32,
    pub max_x: f32,
}

impl SafeWindow {
    /// The frame is the content padding or 6% of the width, whichever is
    /// larger, taken from both sides.
    pub fn for_container(width: f32, pad_x: f32) -> Self {
        let frame = pad_x.max((width * 0.06).round());
        let min_x = frame;
        let max_x = (width - frame).max(min_x);
        Self { min_x, max_x }
    }

    pub fn clamp_x(&self, x: f32) -> f32 {
        clamp(x, self.min_x, self.max_x)
    }

    pub fn contains(&self, x: f32) -> bool {
        x >= self.min_x - 1e-3 && x <= self.max_x + 1e-3
    }
}

/// Handle length for a same-row curve spanning `dx`, never more than half
/// the span.
pub fn curve_pull(dx: f32) -> f32 {
    clamp(dx * 0.35, 10.0, 120.0).min((dx * 0.5).max(6.0))
}

/// Appends a horizontal S-curve from `a` to `b`.
pub fn curve_between(path: &mut PathData, a: Point, b: Point, window: &SafeWindow) {
    let pull = curve_pull((b.x - a.x).abs());
    let signed = if b.x > a.x { pull } else { -pull };
    path.cubic_to(
        Point::new(window.clamp_x(a.x + signed), a.y),
        Point::new(window.clamp_x(b.x - signed), b.y),
        b,
    );
}

/// Parameters of one row-to-row turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UTurn {
    pub card_width: f32,
    pub edge_out: f32,
    pub radius: f32,
    pub drop_pad: f32,
}

/// Appends a U-turn from `a` (in a row running `dir`) down into `b`.
pub fn u_turn(path: &mut PathData, a: Point, b: Point, dir: f32, turn: &UTurn, window: &SafeWindow) {
    let reach = turn.card_width / 2.0 + turn.edge_out;
    let start_x = window.clamp_x(a.x + dir * reach);
    let end_x = window.clamp_x(b.x - dir * reach);

    let drop_y = b.y - turn.radius - turn.drop_pad;
    let sgn = if end_x >= start_x { 1.0 } else { -1.0 };
    let rr = turn.radius.min((end_x - start_x).abs().max(2.0));
    let k = QUARTER_CIRCLE_K * rr;

    path.line_to(Point::new(start_x, a.y))
        .line_to(Point::new(start_x, drop_y))
        .cubic_to(
            Point::new(start_x, drop_y + k),
            Point::new(window.clamp_x(start_x + sgn * k), b.y),
            Point::new(window.clamp_x(start_x + sgn * rr), b.y),
        )
        .line_to(Point::new(end_x, b.y))
        .line_to(b);
}

/// One stop of the serpentine path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SerpentineStop {
    pub center: Point,
    pub row: usize,
    pub dir: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SerpentineParams {
    pub card_width: f32,
    pub edge_out: f32,
    /// Additional reach for turns leaving a left-to-right row.
    pub right_bonus: f32,
    pub radius: f32,
    pub drop_pad: f32,
    /// Length of the tail past the last card.
    pub tail: f32,
    pub window: SafeWindow,
}

/// Single path through every stop in order; `None` for fewer than two stops.
pub fn serpentine_path(stops: &[SerpentineStop], params: &SerpentineParams) -> Option<PathData> {
    if stops.len() < 2 {
        return None;
    }
    let window = &params.window;
    let mut path = PathData::start(stops[0].center);
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.row == b.row {
            curve_between(&mut path, a.center, b.center, window);
        } else {
            let edge_out = if a.dir > 0.0 {
                params.edge_out + params.right_bonus
            } else {
                params.edge_out
            };
            let turn = UTurn {
                card_width: params.card_width,
                edge_out,
                radius: params.radius,
                drop_pad: params.drop_pad,
            };
            u_turn(&mut path, a.center, b.center, a.dir, &turn, window);
        }
    }

    let last = stops[stops.len() - 1];
    let tail_x = window.clamp_x(
        last.center.x + last.dir * (params.card_width / 2.0 + params.edge_out + params.tail),
    );
    curve_between(
        &mut path,
        last.center,
        Point::new(tail_x, last.center.y),
        window,
    );
    Some(path)
}
