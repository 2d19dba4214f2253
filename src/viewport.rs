//! Display <-> source pixel mapping.
//!
//! The presentation layer shows the image scaled to fit its display area
//! with the aspect ratio kept and the image centred. Clicks and stroke
//! points arrive in display coordinates and are mapped back to source
//! pixels here.

/// Fit-and-centre mapping of an image into a display area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMapping {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub image_width: u32,
    pub image_height: u32,
}

impl DisplayMapping {
    /// Fit an `image_width x image_height` image into a display area.
    ///
    /// `scale = min(display_width / image_width, display_height / image_height)`.
    /// A degenerate image or display gives scale 0, which maps nothing.
    pub fn fit(image_width: u32, image_height: u32, display_width: f32, display_height: f32) -> Self {
        let scale = if image_width == 0 || image_height == 0 {
            0.0
        } else {
            (display_width / image_width as f32)
                .min(display_height / image_height as f32)
                .max(0.0)
        };
        let offset_x = (display_width - image_width as f32 * scale) / 2.0;
        let offset_y = (display_height - image_height as f32 * scale) / 2.0;
        Self {
            scale,
            offset_x,
            offset_y,
            image_width,
            image_height,
        }
    }

    /// Source pixel under display point `(x, y)`, or `None` outside the
    /// image extent or for non-finite input.
    pub fn to_source(&self, x: f32, y: f32) -> Option<(u32, u32)> {
        let (sx, sy) = self.unscale(x, y)?;
        if sx < 0.0 || sy < 0.0 || sx >= self.image_width as f32 || sy >= self.image_height as f32
        {
            return None;
        }
        Some((sx as u32, sy as u32))
    }

    /// Like [`DisplayMapping::to_source`] but clamps to the image instead of
    /// rejecting. Used for stroke points, which may leave the image while
    /// dragging.
    pub fn to_source_clamped(&self, x: f32, y: f32) -> Option<(i32, i32)> {
        if self.image_width == 0 || self.image_height == 0 {
            return None;
        }
        let (sx, sy) = self.unscale(x, y)?;
        let max_x = (self.image_width - 1) as f32;
        let max_y = (self.image_height - 1) as f32;
        Some((sx.clamp(0.0, max_x) as i32, sy.clamp(0.0, max_y) as i32))
    }

    /// Floored source coordinates, unchecked against the image extent.
    fn unscale(&self, x: f32, y: f32) -> Option<(f32, f32)> {
        if self.scale <= 0.0 {
            return None;
        }
        let sx = ((x - self.offset_x) / self.scale).floor();
        let sy = ((y - self.offset_y) / self.scale).floor();
        (sx.is_finite() && sy.is_finite()).then_some((sx, sy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_fit_wide_display() {
        // 100x50 image in a 400x400 area: scale 4, centred vertically
        let m = DisplayMapping::fit(100, 50, 400.0, 400.0);
        assert!(approx_eq(m.scale, 4.0));
        assert!(approx_eq(m.offset_x, 0.0));
        assert!(approx_eq(m.offset_y, 100.0));
    }

    #[test]
    fn test_to_source_inside() {
        let m = DisplayMapping::fit(100, 50, 400.0, 400.0);
        assert_eq!(m.to_source(0.0, 100.0), Some((0, 0)));
        assert_eq!(m.to_source(399.9, 299.9), Some((99, 49)));
        assert_eq!(m.to_source(41.0, 121.0), Some((10, 5)));
    }

    #[test]
    fn test_to_source_outside_is_none() {
        let m = DisplayMapping::fit(100, 50, 400.0, 400.0);
        assert_eq!(m.to_source(10.0, 50.0), None);
        assert_eq!(m.to_source(10.0, 300.0), None);
        assert_eq!(m.to_source(-1.0, 150.0), None);
    }

    #[test]
    fn test_non_finite_points_are_rejected() {
        let m = DisplayMapping::fit(100, 50, 400.0, 400.0);
        assert_eq!(m.to_source(f32::NAN, f32::NAN), None);
        assert_eq!(m.to_source(f32::INFINITY, 150.0), None);
        assert_eq!(m.to_source_clamped(f32::NAN, 3.0), None);
        assert_eq!(m.to_source_clamped(f32::NEG_INFINITY, 3.0), None);
    }

    #[test]
    fn test_clamped_stroke_points() {
        let m = DisplayMapping::fit(10, 10, 10.0, 10.0);
        assert_eq!(m.to_source_clamped(-5.0, 3.0), Some((0, 3)));
        assert_eq!(m.to_source_clamped(20.0, 20.0), Some((9, 9)));
    }

    #[test]
    fn test_degenerate_image() {
        let m = DisplayMapping::fit(0, 0, 100.0, 100.0);
        assert_eq!(m.to_source(50.0, 50.0), None);
        assert_eq!(m.to_source_clamped(50.0, 50.0), None);
    }
}
