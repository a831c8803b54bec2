//! Spreads entities that share one anchor so their avatars do not overlap.

use crate::config::MapConfig;
use crate::geometry::{Point, Rect, clamp, hash32};

/// ~137.5°, keeps successive spiral points from lining up radially.
pub const GOLDEN_ANGLE: f32 = 2.399_963_2;

/// Cluster geometry resolved for one container width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterParams {
    /// Avatar diameter.
    pub pin_size: f32,
    pub spiral_base: f32,
    pub spiral_growth: f32,
    pub halo_start: usize,
    pub fan_max: usize,
    pub fan_spread: f32,
    pub fan_gap: f32,
    pub clamp_margin: f32,
    pub single_offset: bool,
    pub leader_lines: bool,
    pub orbit_pad: f32,
}

impl ClusterParams {
    pub fn for_width(config: &MapConfig, width: f32) -> Self {
        let pin_size = config.pin_size.at(width);
        // Narrow containers clamp the spiral below what a pin needs; the
        // floors keep neighbouring halo pins a full diameter apart.
        let spiral_base = config.spiral_base.at(width).max(pin_size * 0.8);
        let spiral_growth = config.spiral_growth.at(width).max(pin_size * 0.55);
        Self {
            pin_size,
            spiral_base,
            spiral_growth,
            halo_start: config.halo_start,
            fan_max: config.fan_max,
            fan_spread: config.fan_spread_deg.to_radians(),
            fan_gap: config.fan_gap,
            clamp_margin: config.clamp_margin.unwrap_or(pin_size / 2.0),
            single_offset: config.single_offset,
            leader_lines: config.leader_lines,
            orbit_pad: config.orbit_pad,
        }
    }
}

/// Offset and radius of spiral slot `index`.
pub fn spiral_offset(index: usize, params: &ClusterParams) -> (Point, f32) {
    let angle = index as f32 * GOLDEN_ANGLE;
    let r = params.spiral_base + (index as f32).sqrt() * params.spiral_growth;
    (Point::new(angle.cos() * r, angle.sin() * r), r)
}

/// Radius of a fan of `n` avatars; adjacent chords are at least one diameter.
pub fn fan_radius(n: usize, params: &ClusterParams) -> f32 {
    let d = params.pin_size;
    let base = d * 1.35 + params.fan_gap;
    if n < 2 {
        return base;
    }
    let step = params.fan_spread / (n - 1) as f32;
    let chord = d / (2.0 * (step / 2.0).sin()) * 1.05;
    base.max(chord)
}

/// Evenly spaced offsets across the fan spread, opening upwards.
pub fn fan_offsets(n: usize, params: &ClusterParams) -> Vec<Point> {
    if n == 0 {
        return Vec::new();
    }
    let radius = fan_radius(n, params);
    if n == 1 {
        return vec![Point::new(0.0, -radius)];
    }
    let step = params.fan_spread / (n - 1) as f32;
    let start = -std::f32::consts::FRAC_PI_2 - params.fan_spread / 2.0;
    (0..n)
        .map(|k| {
            let angle = start + step * k as f32;
            Point::new(angle.cos() * radius, angle.sin() * radius)
        })
        .collect()
}

/// Short "nearby" offset for a lone pin; the side depends only on `key`.
pub fn single_leader_offset(key: &str, pin_size: f32) -> Point {
    let side = if hash32(key) & 1 == 0 { -1.0 } else { 1.0 };
    Point::new(
        side * clamp(pin_size * 0.55, 16.0, 26.0),
        -clamp(pin_size * 0.95, 26.0, 46.0),
    )
}

/// Groups items whose anchors match after rounding to hundredths of a pixel.
/// Groups keep first-seen order; members keep input order.
pub fn cluster_by_point<T>(items: Vec<(Point, T)>) -> Vec<(Point, Vec<T>)> {
    let mut index: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    let mut groups: Vec<(Point, Vec<T>)> = Vec::new();
    for (point, item) in items {
        let key = format!("{:.2}|{:.2}", point.x, point.y);
        match index.get(&key) {
            Some(&slot) => groups[slot].1.push(item),
            None => {
                index.insert(key, groups.len());
                groups.push((point, vec![item]));
            }
        }
    }
    groups
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterPlacement {
    pub anchor: Point,
    /// Where the member frame is centred. Equals `anchor` unless the frame had
    /// to slide away from an edge.
    pub center: Point,
    /// Final, clamped avatar centers in member order.
    pub display: Vec<Point>,
    /// Whether each member gets a leader line back to the anchor.
    pub leaders: bool,
    /// Orbit ring diameter for multi-member clusters.
    pub orbit_size: Option<f32>,
}

/// Positions the members of one cluster. `keys` seeds the lone-pin offset.
/// Multi-member frames move as a whole so every avatar fits inside `bounds`
/// shrunk by the clamp margin; members keep their spacing.
pub fn layout_cluster(anchor: Point, keys: &[&str], bounds: Rect, params: &ClusterParams) -> ClusterPlacement {
    let inner = bounds.inset(params.clamp_margin);
    let n = keys.len();

    if n <= 1 {
        let Some(key) = keys.first() else {
            return ClusterPlacement {
                anchor,
                center: anchor,
                display: Vec::new(),
                leaders: false,
                orbit_size: None,
            };
        };
        if !params.single_offset {
            return ClusterPlacement {
                anchor,
                center: anchor,
                display: vec![anchor],
                leaders: false,
                orbit_size: None,
            };
        }
        let off = single_leader_offset(key, params.pin_size);
        let display = inner.clamp_point(anchor.offset(off.x, off.y));
        return ClusterPlacement {
            anchor,
            center: display,
            display: vec![display],
            leaders: params.leader_lines,
            orbit_size: None,
        };
    }

    let (offsets, orbit_size) = if n <= params.fan_max {
        let offsets = fan_offsets(n, params);
        let orbit = fan_radius(n, params) * 2.0 + params.orbit_pad;
        (offsets, orbit)
    } else {
        let max_r = (1..=n)
            .map(|i| spiral_offset(i, params).1)
            .fold(0.0_f32, f32::max);
        let offsets = (0..n)
            .map(|i| spiral_offset(i + params.halo_start, params).0)
            .collect();
        (offsets, (max_r * 2.0 + params.orbit_pad).round())
    };

    let center = slide_into(anchor, &offsets, inner);
    ClusterPlacement {
        anchor,
        center,
        display: offsets
            .into_iter()
            .map(|off| inner.clamp_point(center.offset(off.x, off.y)))
            .collect(),
        leaders: params.leader_lines,
        orbit_size: Some(orbit_size),
    }
}

/// Moves `anchor` the least distance so that every `anchor + offset` lands in
/// `inner`. A frame wider than `inner` on one axis is centred on that axis.
fn slide_into(anchor: Point, offsets: &[Point], inner: Rect) -> Point {
    let (mut min_x, mut max_x) = (f32::INFINITY, f32::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f32::INFINITY, f32::NEG_INFINITY);
    for off in offsets {
        min_x = min_x.min(off.x);
        max_x = max_x.max(off.x);
        min_y = min_y.min(off.y);
        max_y = max_y.max(off.y);
    }
    if !min_x.is_finite() || !min_y.is_finite() {
        return anchor;
    }
    let axis = |v: f32, lo: f32, hi: f32, min_off: f32, max_off: f32| {
        let (low, high) = (lo - min_off, hi - max_off);
        if low <= high {
            clamp(v, low, high)
        } else {
            (lo + hi) / 2.0 - (min_off + max_off) / 2.0
        }
    };
    Point::new(
        axis(anchor.x, inner.x, inner.right(), min_x, max_x),
        axis(anchor.y, inner.y, inner.bottom(), min_y, max_y),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(width: f32) -> ClusterParams {
        ClusterParams::for_width(&MapConfig::default(), width)
    }

    fn min_pairwise(points: &[Point]) -> f32 {
        let mut best = f32::INFINITY;
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                best = best.min(a.distance(*b));
            }
        }
        best
    }

    #[test]
    fn single_member_stays_on_anchor() {
        let bounds = Rect::new(0.0, 0.0, 800.0, 600.0);
        let placed = layout_cluster(Point::new(300.0, 200.0), &["ned"], bounds, &params(800.0));
        assert_eq!(placed.display, vec![Point::new(300.0, 200.0)]);
        assert!(!placed.leaders);
        assert_eq!(placed.orbit_size, None);
    }

    #[test]
    fn single_offset_is_stable_per_key() {
        let mut p = params(800.0);
        p.single_offset = true;
        let bounds = Rect::new(0.0, 0.0, 800.0, 600.0);
        let a = layout_cluster(Point::new(300.0, 200.0), &["arya"], bounds, &p);
        let b = layout_cluster(Point::new(300.0, 200.0), &["arya"], bounds, &p);
        assert_eq!(a, b);
        assert!(a.leaders);
        assert!((a.display[0].y - 167.7).abs() < 1e-3);
    }

    #[test]
    fn fan_and_spiral_keep_a_diameter_apart() {
        let bounds = Rect::new(0.0, 0.0, 1200.0, 900.0);
        let p = params(1200.0);
        for n in [2usize, 3, 5, 10, 25] {
            let keys: Vec<String> = (0..n).map(|i| format!("p{i}")).collect();
            let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
            let placed = layout_cluster(Point::new(600.0, 450.0), &refs, bounds, &p);
            assert_eq!(placed.display.len(), n);
            assert!(min_pairwise(&placed.display) >= p.pin_size - 1e-3, "n = {n}");
        }
    }

    #[test]
    fn offsets_are_clamped_into_bounds() {
        let bounds = Rect::new(0.0, 0.0, 800.0, 600.0);
        let p = params(800.0);
        let keys = ["a", "b", "c", "d", "e", "f"];
        let placed = layout_cluster(Point::new(5.0, 5.0), &keys, bounds, &p);
        let inner = bounds.inset(p.clamp_margin);
        assert!(placed.display.iter().all(|pt| inner.contains(*pt)));
    }

    #[test]
    fn corner_clusters_slide_instead_of_stacking() {
        let bounds = Rect::new(0.0, 0.0, 800.0, 600.0);
        let p = params(800.0);
        let inner = bounds.inset(p.clamp_margin);
        for anchor in [Point::new(0.0, 0.0), Point::new(800.0, 600.0), Point::new(0.0, 300.0)] {
            for n in [3usize, 5, 10] {
                let keys: Vec<String> = (0..n).map(|i| format!("p{i}")).collect();
                let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
                let placed = layout_cluster(anchor, &refs, bounds, &p);
                assert!(min_pairwise(&placed.display) >= p.pin_size - 1e-3, "n = {n} at {anchor:?}");
                assert!(placed.display.iter().all(|pt| inner.contains(*pt)));
                assert_eq!(placed.anchor, anchor);
            }
        }
    }

    #[test]
    fn centered_cluster_does_not_move() {
        let bounds = Rect::new(0.0, 0.0, 800.0, 600.0);
        let placed = layout_cluster(Point::new(400.0, 300.0), &["a", "b", "c"], bounds, &params(800.0));
        assert_eq!(placed.center, placed.anchor);
    }

    #[test]
    fn orbit_matches_spiral_extent() {
        let p = params(800.0);
        let bounds = Rect::new(0.0, 0.0, 800.0, 600.0);
        let keys = ["a", "b", "c", "d"];
        let placed = layout_cluster(Point::new(400.0, 300.0), &keys, bounds, &p);
        let max_r = spiral_offset(4, &p).1;
        assert_eq!(placed.orbit_size, Some((max_r * 2.0 + 64.0).round()));
    }

    #[test]
    fn clusters_group_on_rounded_points() {
        let groups = cluster_by_point(vec![
            (Point::new(1.001, 2.0), "a"),
            (Point::new(5.0, 5.0), "b"),
            (Point::new(1.004, 2.0), "c"),
        ]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].1, vec!["a", "c"]);
    }
}
