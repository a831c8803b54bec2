use super::types::ViewBox;
use crate::config::ViewConfig;
use crate::geometry::Point;

/// Something the camera must keep in view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameItem {
    /// Junction markers and other zero-size anchors.
    Point(Point),
    /// Rectangular entity given by its center and full extent.
    Box { center: Point, width: f32, height: f32 },
}

impl FrameItem {
    fn extent(&self) -> Option<(f32, f32, f32, f32)> {
        let (min_x, min_y, max_x, max_y) = match *self {
            FrameItem::Point(p) => (p.x, p.y, p.x, p.y),
            FrameItem::Box {
                center,
                width,
                height,
            } => (
                center.x - width / 2.0,
                center.y - height / 2.0,
                center.x + width / 2.0,
                center.y + height / 2.0,
            ),
        };
        [min_x, min_y, max_x, max_y]
            .iter()
            .all(|v| v.is_finite())
            .then_some((min_x, min_y, max_x, max_y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOptions {
    pub enforce_min: bool,
    pub pad: f32,
    /// Added below the content only.
    pub extra: f32,
    pub min_width: f32,
    pub min_height: f32,
}

impl FrameOptions {
    pub fn standard(view: &ViewConfig) -> Self {
        Self {
            enforce_min: true,
            pad: view.pad,
            extra: view.extra,
            min_width: view.min_width,
            min_height: view.min_height,
        }
    }

    /// Tightest frame, for an explicit re-frame request.
    pub fn fit(view: &ViewConfig) -> Self {
        Self {
            enforce_min: false,
            extra: 0.0,
            ..Self::standard(view)
        }
    }

    pub fn narrow(view: &ViewConfig) -> Self {
        Self {
            enforce_min: false,
            pad: view.narrow_pad,
            extra: 0.0,
            min_width: view.min_width,
            min_height: view.min_height,
        }
    }
}

/// Bounding window around `items` plus padding. Non-finite items are
/// ignored; with nothing left the result is the minimum-size window at the
/// origin.
pub fn frame_items<I>(items: I, opts: &FrameOptions) -> ViewBox
where
    I: IntoIterator<Item = FrameItem>,
{
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for (x0, y0, x1, y1) in items.into_iter().filter_map(|item| item.extent()) {
        min_x = min_x.min(x0);
        min_y = min_y.min(y0);
        max_x = max_x.max(x1);
        max_y = max_y.max(y1);
    }

    let fallback = ViewBox::new(0.0, 0.0, opts.min_width, opts.min_height);
    if !min_x.is_finite() || !min_y.is_finite() {
        return fallback;
    }

    let mut vb = ViewBox::new(
        min_x - opts.pad,
        min_y - opts.pad,
        (max_x - min_x) + opts.pad * 2.0,
        (max_y - min_y) + opts.pad * 2.0 + opts.extra,
    );

    if opts.enforce_min {
        if vb.width < opts.min_width {
            vb.x -= (opts.min_width - vb.width) / 2.0;
            vb.width = opts.min_width;
        }
        if vb.height < opts.min_height {
            vb.y -= (opts.min_height - vb.height) / 2.0;
            vb.height = opts.min_height;
        }
    }

    if vb.is_finite() { vb } else { fallback }
}
