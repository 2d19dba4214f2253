//! Polygon -> mask rasterization.
//!
//! Used to rebuild a mask from stored polygons (imported annotations,
//! overlays). A pixel is foreground when its centre lies inside the rings
//! under the even-odd rule, so holes traced as inner rings stay empty.
//!
//! The result need not match the mask the polygons were traced from pixel
//! for pixel; callers that need the original mask keep it separately.

use crate::contour::Polygon;
use crate::grid::Mask;

/// Rasterize `polygons` onto a `height x width` grid.
pub fn rasterize_polygons(polygons: &[Polygon], width: usize, height: usize) -> Mask {
    let mut mask = Mask::from_elem((height, width), false);
    let mut crossings: Vec<f32> = Vec::new();

    for row in 0..height {
        let y = row as f32;
        crossings.clear();

        for polygon in polygons {
            let vertices = &polygon.vertices;
            let n = vertices.len();
            if n < Polygon::MIN_VERTICES {
                continue;
            }
            for i in 0..n {
                let (x0, y0) = vertices[i];
                let (x1, y1) = vertices[(i + 1) % n];
                if (y0 > y) != (y1 > y) {
                    crossings.push(x0 + (y - y0) * (x1 - x0) / (y1 - y0));
                }
            }
        }

        crossings.sort_by(f32::total_cmp);
        for span in crossings.chunks_exact(2) {
            let start = span[0].max(0.0).ceil() as usize;
            let end = span[1].floor();
            if end < 0.0 {
                continue;
            }
            let end = (end as usize).min(width.saturating_sub(1));
            for col in start..=end {
                if (col as f32) > span[0] && (col as f32) < span[1] {
                    mask[[row, col]] = true;
                }
            }
        }
    }
    mask
}
