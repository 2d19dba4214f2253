//! Grid types shared by the extraction, labelling and contour stages.
//!
//! All grids are `H x W` ndarrays indexed as `[[row, col]]`, i.e. `(y, x)`
//! with the origin at the top-left pixel.

use image::{GrayImage, Luma};
use ndarray::Array2;

/// Boolean pixel mask. `true` marks foreground.
pub type Mask = Array2<bool>;

/// Mask whose `true` pixels lie on a dividing boundary.
pub type BoundaryMask = Mask;

/// Region identifier inside a [`LabelGrid`]. `0` is reserved for boundary
/// and background pixels.
pub type RegionId = u32;

/// Pixel -> region id grid produced by the region labeler.
pub type LabelGrid = Array2<RegionId>;

/// Tight axis-aligned box over foreground pixels, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelBox {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Grow the box by `pad` pixels on every side, clipped to `width x height`.
    pub fn padded(&self, pad: u32, width: u32, height: u32) -> PixelBox {
        let x0 = self.x.saturating_sub(pad);
        let y0 = self.y.saturating_sub(pad);
        let x1 = (self.x + self.width + pad).min(width);
        let y1 = (self.y + self.height + pad).min(height);
        PixelBox {
            x: x0,
            y: y0,
            width: x1.saturating_sub(x0),
            height: y1.saturating_sub(y0),
        }
    }
}

/// Tight bounding box of the foreground of `mask`, or an all-zero box if
/// the mask has no foreground.
pub fn mask_bbox(mask: &Mask) -> PixelBox {
    let mut min_row = usize::MAX;
    let mut min_col = usize::MAX;
    let mut max_row = 0;
    let mut max_col = 0;
    let mut any = false;

    for ((row, col), &value) in mask.indexed_iter() {
        if value {
            any = true;
            min_row = min_row.min(row);
            min_col = min_col.min(col);
            max_row = max_row.max(row);
            max_col = max_col.max(col);
        }
    }

    if !any {
        return PixelBox::default();
    }

    PixelBox {
        x: min_col as u32,
        y: min_row as u32,
        width: (max_col - min_col + 1) as u32,
        height: (max_row - min_row + 1) as u32,
    }
}

/// Number of foreground pixels.
pub fn count_foreground(mask: &Mask) -> usize {
    mask.iter().filter(|&&v| v).count()
}

/// Convert a mask to an 8-bit image (255 = foreground) for `imageproc`.
pub fn mask_to_gray(mask: &Mask) -> GrayImage {
    let (height, width) = mask.dim();
    GrayImage::from_fn(width as u32, height as u32, |x, y| {
        if mask[[y as usize, x as usize]] {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Convert an 8-bit image back to a mask; any nonzero pixel is foreground.
pub fn gray_to_mask(image: &GrayImage) -> Mask {
    let (width, height) = image.dimensions();
    Array2::from_shape_fn((height as usize, width as usize), |(row, col)| {
        image.get_pixel(col as u32, row as u32)[0] > 0
    })
}
