use super::routing::{SafeWindow, SerpentineParams, SerpentineStop, serpentine_path};
use super::types::{TimelineCardLayout, TimelineLayout, ViewBox};
use crate::config::TimelineConfig;
use crate::events::TimelineEvent;
use crate::geometry::{Point, clamp};

const MAX_COLS: usize = 10;

/// How many cards fit side by side, between 1 and 10.
pub fn auto_columns(width: f32, card_width: f32, gap_x: f32, pad_x: f32) -> usize {
    let fit = ((width - pad_x * 2.0 + gap_x) / (card_width + gap_x)).floor();
    if !fit.is_finite() || fit < 1.0 {
        return 1;
    }
    (fit as usize).clamp(1, MAX_COLS)
}

/// Left edge of the first column: centered, but never past the padding.
fn row_start(width: f32, content_width: f32, pad_x: f32) -> f32 {
    let centered = ((width - content_width) / 2.0).round();
    let start = pad_x.max(centered);
    if start + content_width > width - pad_x {
        pad_x.max(width - pad_x - content_width)
    } else {
        start
    }
}

/// Serpentine grid of event cards plus the single path threading them.
pub fn compute_timeline_layout(events: &[TimelineEvent], width: f32, config: &TimelineConfig) -> TimelineLayout {
    let card_w = config.card_width.round();
    let card_h = config.card_height.round();
    let gap_x = config.gap_x;
    let gap_y = config.gap_y;
    let pad_y = config.pad_y;

    let fit = auto_columns(width, card_w, gap_x, config.pad_x);
    let cols = config.cols.min(fit).clamp(1, MAX_COLS);
    let dot_radius = clamp(card_w * 0.03, 3.0, 5.0).round();

    if events.is_empty() {
        return TimelineLayout {
            width,
            height: 0.0,
            cols,
            card_width: card_w,
            card_height: card_h,
            dot_radius,
            cards: Vec::new(),
            path: None,
            view_box: ViewBox::new(0.0, 0.0, width, 0.0),
        };
    }

    let pad_x = config.pad_x.round().max(config.min_pad_x);
    let content_w = cols as f32 * card_w + (cols as f32 - 1.0) * gap_x;
    let start_x = row_start(width, content_w, pad_x);

    let cards: Vec<TimelineCardLayout> = events
        .iter()
        .enumerate()
        .map(|(i, event)| {
            let row = i / cols;
            let pos = i % cols;
            let dir: i8 = if row % 2 == 0 { 1 } else { -1 };
            let col = if dir == 1 { pos } else { cols - 1 - pos };
            let x = start_x + col as f32 * (card_w + gap_x) + card_w / 2.0;
            let y = pad_y + row as f32 * (card_h + gap_y) + card_h / 2.0;
            TimelineCardLayout {
                event: event.clone(),
                center: Point::new(x, y),
                row,
                col,
                dir,
            }
        })
        .collect();

    let rows = events.len().div_ceil(cols).max(1);
    let height = pad_y * 2.0 + rows as f32 * card_h + (rows as f32 - 1.0) * gap_y;

    let clearance = clamp(card_w * 0.03, 6.0, 10.0).round();
    let params = SerpentineParams {
        card_width: card_w,
        edge_out: config.elbow_x.round() + clearance,
        right_bonus: clamp(card_w * 0.06, 10.0, 24.0).round(),
        radius: clamp(card_w * 0.075, 10.0, 20.0).round(),
        drop_pad: clamp(gap_y * 0.55, 10.0, 22.0).round(),
        tail: clamp(card_w * 0.16, 16.0, 36.0).round(),
        window: SafeWindow::for_container(width, pad_x.max(config.stroke_pad)),
    };
    let stops: Vec<SerpentineStop> = cards
        .iter()
        .map(|c| SerpentineStop {
            center: c.center,
            row: c.row,
            dir: f32::from(c.dir),
        })
        .collect();
    let path = serpentine_path(&stops, &params);
    if path.is_none() {
        tracing::trace!(cards = cards.len(), "single card; no serpentine path");
    }

    TimelineLayout {
        width,
        height,
        cols,
        card_width: card_w,
        card_height: card_h,
        dot_radius,
        cards,
        path,
        view_box: ViewBox::new(0.0, 0.0, width, height),
    }
}
