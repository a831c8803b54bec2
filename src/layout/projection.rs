use crate::config::Scaled;
use crate::geometry::{Point, Rect, clamp, contain_box};
use crate::ir::{DomainPosition, Person};

/// Brings a percentage pair to `[0, 100]`. Pairs already inside `[0, 1]` are
/// treated as fractions.
pub fn normalize_percent(x: f32, y: f32) -> (f32, f32) {
    let unit = |v: f32| (0.0..=1.0).contains(&v);
    let (x, y) = if unit(x) && unit(y) {
        (x * 100.0, y * 100.0)
    } else {
        (x, y)
    };
    (clamp(x, 0.0, 100.0), clamp(y, 0.0, 100.0))
}

/// Maps domain positions into the pixel space of one container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    pub container_width: f32,
    pub container_height: f32,
    /// Where the background image actually draws inside the container.
    pub contain: Rect,
    /// Minimum distance an anchor keeps from the contain-box edge.
    pub margin: f32,
}

impl Projector {
    pub fn new(
        container_width: f32,
        container_height: f32,
        natural_size: Option<(f32, f32)>,
        edge_margin: &Scaled,
    ) -> Self {
        let (nw, nh) = natural_size.unwrap_or((0.0, 0.0));
        Self {
            container_width,
            container_height,
            contain: contain_box(container_width, container_height, nw, nh),
            margin: edge_margin.at(container_width),
        }
    }

    pub fn percent_to_px(&self, x: f32, y: f32) -> Point {
        Point::new(
            self.contain.x + x / 100.0 * self.contain.width,
            self.contain.y + y / 100.0 * self.contain.height,
        )
    }

    /// Equirectangular projection into the contain box.
    pub fn geo_to_px(&self, lat: f32, lng: f32) -> Point {
        Point::new(
            self.contain.x + (lng + 180.0) / 360.0 * self.contain.width,
            self.contain.y + (90.0 - lat) / 180.0 * self.contain.height,
        )
    }

    /// Area anchors are allowed to occupy.
    pub fn safe_bounds(&self) -> Rect {
        self.contain.inset(self.margin)
    }

    pub fn edge_nudge(&self, p: Point) -> Point {
        self.safe_bounds().clamp_point(p)
    }

    /// Pixel anchor for `pos`, or `None` when the position is not usable.
    pub fn project(&self, pos: DomainPosition) -> Option<Point> {
        let raw = match pos {
            DomainPosition::Percent { x, y } => {
                if !x.is_finite() || !y.is_finite() {
                    return None;
                }
                let (x, y) = normalize_percent(x, y);
                self.percent_to_px(x, y)
            }
            DomainPosition::Geo { lat, lng } => self.geo_to_px(lat, lng),
        };
        raw.is_finite().then(|| self.edge_nudge(raw))
    }

    pub fn project_person(&self, person: &Person) -> Option<Point> {
        let Some(pos) = person.position else {
            tracing::debug!(person = %person.id, "no coordinates; left off the map");
            return None;
        };
        let projected = self.project(pos);
        if projected.is_none() {
            tracing::debug!(person = %person.id, ?pos, "coordinates not finite; left off the map");
        }
        projected
    }
}
