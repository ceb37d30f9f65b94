//! Map coordinate conversions
//!
//! Pins are stored normalized to the map image ([0,1] on both axes) and
//! rendered on a canvas scaled by `cover_scale0 * zoom`. Older games stored
//! pins as absolute pixels of the unscaled image; those are kept apart as
//! `MapPos::LegacyPixel` so nothing downstream has to guess.

/// Width/height pair
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    pub const fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }

    /// Zero or non-finite on either axis
    pub fn is_empty(&self) -> bool {
        !(self.w.is_finite() && self.h.is_finite() && self.w > 0.0 && self.h > 0.0)
    }

    pub fn scaled(&self, s: f64) -> Self {
        Self::new(self.w * s, self.h * s)
    }
}

/// A point (normalized or pixel, depending on context)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(&self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Pixel offset from the top-left corner of the rendered map canvas
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PixelOffset {
    pub left: f64,
    pub top: f64,
}

impl PixelOffset {
    pub const fn new(left: f64, top: f64) -> Self {
        Self { left, top }
    }
}

/// Where a mission pin sits on the map image
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapPos {
    /// Fraction of the natural image size, both axes in [0,1]
    Normalized { x: f64, y: f64 },
    /// Absolute pixel of the unscaled image (games authored before normalization)
    LegacyPixel { x: f64, y: f64 },
}

impl MapPos {
    /// Classify a stored `(x, y)` pair.
    ///
    /// Non-finite values mean "no pin". Values inside [0,1]^2 are taken as
    /// normalized, anything else as a legacy pixel. A legacy pin that really
    /// sat at pixel (0,0) or (1,1) is therefore read as normalized; stored data
    /// cannot tell the two apart.
    pub fn classify(x: f64, y: f64) -> Option<MapPos> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        if (0.0..=1.0).contains(&x) && (0.0..=1.0).contains(&y) {
            Some(MapPos::Normalized { x, y })
        } else {
            Some(MapPos::LegacyPixel { x, y })
        }
    }

    /// Raw stored values, for round-tripping records
    pub fn raw(&self) -> (f64, f64) {
        match *self {
            MapPos::Normalized { x, y } | MapPos::LegacyPixel { x, y } => (x, y),
        }
    }
}

/// Scale at which the image covers the whole container (larger axis ratio).
/// An unknown image size renders at 1:1.
pub fn cover_scale(container: Size, image: Size) -> f64 {
    if image.is_empty() {
        return 1.0;
    }
    (container.w / image.w).max(container.h / image.h)
}

/// Pin position on the rendered canvas
pub fn to_pixel(pos: MapPos, image: Size, cover_scale0: f64, zoom: f64) -> PixelOffset {
    let s = cover_scale0 * zoom;
    match pos {
        MapPos::Normalized { x, y } => PixelOffset::new(x * image.w * s, y * image.h * s),
        MapPos::LegacyPixel { x, y } => PixelOffset::new(x * s, y * s),
    }
}

/// Image scaled to fit entirely inside a container, centered
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainRect {
    pub origin: Point,
    pub size: Size,
    pub scale: f64,
}

pub fn contain_fit(container: Size, image: Size) -> ContainRect {
    if image.is_empty() {
        return ContainRect {
            origin: Point::default(),
            size: container,
            scale: 1.0,
        };
    }
    let scale = (container.w / image.w).min(container.h / image.h);
    let size = image.scaled(scale);
    ContainRect {
        origin: Point::new((container.w - size.w) / 2.0, (container.h - size.h) / 2.0),
        size,
        scale,
    }
}

/// Container pixel -> normalized image position, clamped to [0,1]
pub fn to_normalized(pixel: Point, container: Size, image: Size) -> Point {
    let rect = contain_fit(container, image);
    if rect.size.is_empty() {
        return Point::default();
    }
    let x = (pixel.x - rect.origin.x) / rect.size.w;
    let y = (pixel.y - rect.origin.y) / rect.size.h;
    Point::new(x.clamp(0.0, 1.0), y.clamp(0.0, 1.0))
}

/// Normalized image position -> container pixel on the contain-fit rect
pub fn to_pixel_on_contain_rect(norm: Point, container: Size, image: Size) -> Point {
    let rect = contain_fit(container, image);
    Point::new(
        rect.origin.x + norm.x * rect.size.w,
        rect.origin.y + norm.y * rect.size.h,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_cover_scale_height_constrained() {
        let s = cover_scale(Size::new(800.0, 600.0), Size::new(1600.0, 1200.0));
        assert_eq!(s, 0.5);
    }

    #[test]
    fn test_cover_scale_picks_larger_ratio() {
        // Wide container, square image: width ratio wins
        let s = cover_scale(Size::new(1000.0, 500.0), Size::new(500.0, 500.0));
        assert!((s - 2.0).abs() < 1e-12);
        assert_eq!(cover_scale(Size::new(800.0, 600.0), Size::default()), 1.0);
    }

    #[test]
    fn test_center_pin_maps_to_center_pixel() {
        let image = Size::new(1600.0, 1200.0);
        let s0 = cover_scale(Size::new(800.0, 600.0), image);
        let px = to_pixel(MapPos::Normalized { x: 0.5, y: 0.5 }, image, s0, 1.0);
        assert!((px.left - 400.0).abs() < 1e-9);
        assert!((px.top - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_legacy_pixel_only_scaled() {
        let image = Size::new(1600.0, 1200.0);
        let px = to_pixel(MapPos::LegacyPixel { x: 800.0, y: 100.0 }, image, 0.5, 2.0);
        assert!((px.left - 800.0).abs() < 1e-9);
        assert!((px.top - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_classify() {
        assert_eq!(MapPos::classify(0.25, 1.0), Some(MapPos::Normalized { x: 0.25, y: 1.0 }));
        assert_eq!(MapPos::classify(0.5, 340.0), Some(MapPos::LegacyPixel { x: 0.5, y: 340.0 }));
        assert_eq!(MapPos::classify(-0.1, 0.5), Some(MapPos::LegacyPixel { x: -0.1, y: 0.5 }));
        assert_eq!(MapPos::classify(f64::NAN, 0.5), None);
        // Known limitation: legacy (1,1) reads as normalized
        assert!(matches!(MapPos::classify(1.0, 1.0), Some(MapPos::Normalized { .. })));
    }

    #[test]
    fn test_contain_fit_letterbox() {
        // 800x600 container, 1000x500 image -> scale 0.8, 800x400, 100px bars
        let rect = contain_fit(Size::new(800.0, 600.0), Size::new(1000.0, 500.0));
        assert!((rect.scale - 0.8).abs() < 1e-12);
        assert!((rect.origin.x - 0.0).abs() < 1e-9);
        assert!((rect.origin.y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_to_normalized_clamps_outside_image() {
        let container = Size::new(800.0, 600.0);
        let image = Size::new(1000.0, 500.0);
        let p = to_normalized(Point::new(400.0, 50.0), container, image);
        assert_eq!(p.y, 0.0);
        assert!((p.x - 0.5).abs() < 1e-9);
        let p = to_normalized(Point::new(900.0, 590.0), container, image);
        assert_eq!(p, Point::new(1.0, 1.0));
    }

    proptest! {
        #[test]
        fn prop_contain_rect_round_trip(
            x in 0.0f64..=1.0,
            y in 0.0f64..=1.0,
            cw in 10.0f64..3000.0,
            ch in 10.0f64..3000.0,
            iw in 10.0f64..5000.0,
            ih in 10.0f64..5000.0,
        ) {
            let container = Size::new(cw, ch);
            let image = Size::new(iw, ih);
            let px = to_pixel_on_contain_rect(Point::new(x, y), container, image);
            let back = to_normalized(px, container, image);
            prop_assert!((back.x - x).abs() < 1e-6);
            prop_assert!((back.y - y).abs() < 1e-6);
        }

        #[test]
        fn prop_rendered_pin_round_trip(
            x in 0.0f64..=1.0,
            y in 0.0f64..=1.0,
            zoom in 0.5f64..=6.0,
            iw in 10.0f64..5000.0,
            ih in 10.0f64..5000.0,
        ) {
            let image = Size::new(iw, ih);
            let s0 = cover_scale(Size::new(800.0, 600.0), image);
            let canvas = image.scaled(s0 * zoom);
            let px = to_pixel(MapPos::Normalized { x, y }, image, s0, zoom);
            let back = to_normalized(Point::new(px.left, px.top), canvas, image);
            prop_assert!((back.x - x).abs() < 1e-6);
            prop_assert!((back.y - y).abs() < 1e-6);
        }
    }
}
