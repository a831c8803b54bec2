use serde::Serialize;

/// FNV-1a offset basis and prime (32-bit).
const FNV_OFFSET: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;
const HASH_RANGE: f64 = 4_294_967_296.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_center(center: Point, width: f32, height: f32) -> Self {
        Self::new(
            center.x - width / 2.0,
            center.y - height / 2.0,
            width,
            height,
        )
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Shrinks every side by `margin`. A side pair that cannot fit the margin
    /// collapses onto the rectangle's center line instead of inverting.
    pub fn inset(&self, margin: f32) -> Rect {
        let margin = margin.max(0.0);
        let (x, width) = if self.width >= margin * 2.0 {
            (self.x + margin, self.width - margin * 2.0)
        } else {
            (self.x + self.width / 2.0, 0.0)
        };
        let (y, height) = if self.height >= margin * 2.0 {
            (self.y + margin, self.height - margin * 2.0)
        } else {
            (self.y + self.height / 2.0, 0.0)
        };
        Rect::new(x, y, width, height)
    }

    pub fn clamp_point(&self, p: Point) -> Point {
        Point::new(
            clamp(p.x, self.x, self.right()),
            clamp(p.y, self.y, self.bottom()),
        )
    }
}

/// `v` bounded to `[lo, hi]`; `lo` wins when the bounds cross.
pub fn clamp(v: f32, lo: f32, hi: f32) -> f32 {
    v.min(hi).max(lo)
}

/// 32-bit FNV-1a over the UTF-8 bytes of `key`.
pub fn hash32(key: &str) -> u32 {
    key.bytes().fold(FNV_OFFSET, |h, b| (h ^ u32::from(b)).wrapping_mul(FNV_PRIME))
}

/// Stable pseudo-random value in `[0, 1)` derived from `key`.
///
/// Depends only on the string content, so repeated renders of the same data
/// produce identical offsets.
pub fn deterministic_hash(key: &str) -> f64 {
    f64::from(hash32(key)) / HASH_RANGE
}

/// Largest rectangle with the content's aspect ratio, centered inside the
/// container (CSS `object-fit: contain`). Unknown natural dimensions yield the
/// whole container.
pub fn contain_box(
    container_width: f32,
    container_height: f32,
    natural_width: f32,
    natural_height: f32,
) -> Rect {
    let usable = |v: f32| v.is_finite() && v > 0.0;
    if !usable(natural_width) || !usable(natural_height) || !usable(container_height) {
        return Rect::new(0.0, 0.0, container_width, container_height);
    }

    let content_aspect = natural_width / natural_height;
    let box_aspect = container_width / container_height;

    if content_aspect > box_aspect {
        let h = container_width / content_aspect;
        Rect::new(0.0, (container_height - h) / 2.0, container_width, h)
    } else {
        let w = container_height * content_aspect;
        Rect::new((container_width - w) / 2.0, 0.0, w, container_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_prefers_lower_bound_when_crossed() {
        assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp(-1.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp(11.0, 0.0, 10.0), 10.0);
        assert_eq!(clamp(5.0, 8.0, 2.0), 8.0);
    }

    #[test]
    fn hash_is_stable_and_in_unit_range() {
        assert_eq!(hash32(""), FNV_OFFSET);
        assert_eq!(hash32("a"), 0xe40c292c);
        for key in ["a", "ned-stark", "Winterfell|The North", "\u{00e9}"] {
            let v = deterministic_hash(key);
            assert_eq!(v, deterministic_hash(key));
            assert!((0.0..1.0).contains(&v));
        }
        assert_ne!(deterministic_hash("x:arya"), deterministic_hash("y:arya"));
    }

    #[test]
    fn contain_box_letterboxes_wide_content() {
        let b = contain_box(800.0, 600.0, 2000.0, 1000.0);
        assert_eq!(b, Rect::new(0.0, 100.0, 800.0, 400.0));
    }

    #[test]
    fn contain_box_pillarboxes_tall_content() {
        let b = contain_box(800.0, 600.0, 300.0, 600.0);
        assert_eq!(b, Rect::new(250.0, 0.0, 300.0, 600.0));
    }

    #[test]
    fn contain_box_defaults_to_container_without_natural_size() {
        assert_eq!(
            contain_box(640.0, 480.0, 0.0, 0.0),
            Rect::new(0.0, 0.0, 640.0, 480.0)
        );
        assert_eq!(
            contain_box(640.0, 480.0, f32::NAN, 10.0),
            Rect::new(0.0, 0.0, 640.0, 480.0)
        );
    }

    #[test]
    fn inset_collapses_instead_of_inverting() {
        let r = Rect::new(0.0, 0.0, 10.0, 100.0).inset(20.0);
        assert_eq!(r.width, 0.0);
        assert_eq!(r.x, 5.0);
        assert_eq!(r.y, 20.0);
        assert_eq!(r.height, 60.0);
    }
}
