//! Display-ready images for the presentation layer.
//!
//! Nothing here mutates session state; every function draws on a copy of
//! the source image.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use segannot_raster::{BoundaryMask, LabelGrid, ManualCut, Mask, PixelBox, Polygon, burn_cuts};

use crate::config::DisplayColors;
use crate::constants::{OVERLAY_HUE_STEP, THUMBNAIL_OUTLINE_COLOR, THUMBNAIL_PADDING};
use crate::model::{Annotation, AnnotationId, BoundingBox, SelectionSet};

/// Row for annotation list rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationSummary {
    pub id: AnnotationId,
    pub label: String,
    pub bbox: BoundingBox,
    pub area: f64,
    pub polygon_count: usize,
    /// Mean position of the annotation's pixels, where its label is drawn.
    pub label_anchor: (u32, u32),
}

/// Inputs of [`composite`] besides the base image.
#[derive(Debug, Clone, Copy)]
pub struct CompositeLayers<'a> {
    /// Extracted boundaries, without manual cuts
    pub boundary: Option<&'a BoundaryMask>,
    pub labels: Option<&'a LabelGrid>,
    pub selection: &'a SelectionSet,
    pub cuts: &'a [ManualCut],
    /// Points of the stroke being drawn
    pub stroke: &'a [(i32, i32)],
    pub stroke_width: u32,
}

/// Base image with selected regions highlighted, boundaries painted in the
/// boundary colour, and cuts painted in the cut colour.
pub fn composite(
    image: &RgbImage,
    layers: &CompositeLayers<'_>,
    colors: &DisplayColors,
) -> RgbImage {
    let mut out = image.clone();
    let (width, height) = out.dimensions();

    if let Some(labels) = layers.labels.filter(|_| !layers.selection.is_empty()) {
        let [r, g, b, a] = colors.highlight;
        let alpha = f32::from(a) / 255.0;
        for ((row, col), &id) in labels.indexed_iter() {
            let inside = (col as u32) < width && (row as u32) < height;
            if id != 0 && inside && layers.selection.contains(id) {
                let pixel = out.get_pixel_mut(col as u32, row as u32);
                *pixel = blend(*pixel, [r, g, b], alpha);
            }
        }
    }

    if let Some(boundary) = layers.boundary {
        paint_mask(&mut out, boundary, colors.boundary);
    }

    let mut cut_mask = Mask::from_elem((height as usize, width as usize), false);
    burn_cuts(&mut cut_mask, layers.cuts, layers.stroke_width);
    match ManualCut::new(layers.stroke.to_vec()) {
        Some(stroke) => burn_cuts(
            &mut cut_mask,
            std::slice::from_ref(&stroke),
            layers.stroke_width,
        ),
        None => {
            for &(x, y) in layers.stroke {
                if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                    cut_mask[[y as usize, x as usize]] = true;
                }
            }
        }
    }
    paint_mask(&mut out, &cut_mask, colors.cut);

    out
}

/// Base image with every annotation's mask blended at `alpha` and its
/// polygons outlined. Colours follow the hue wheel of [`overlay_color`].
pub fn overlay(image: &RgbImage, annotations: &[Annotation], alpha: f32) -> RgbImage {
    let mut out = image.clone();
    let (width, height) = out.dimensions();

    for (idx, annotation) in annotations.iter().enumerate() {
        let color = overlay_color(idx);
        let mask = annotation.to_mask(width as usize, height as usize);
        for ((row, col), &value) in mask.indexed_iter() {
            if value {
                let pixel = out.get_pixel_mut(col as u32, row as u32);
                *pixel = blend(*pixel, color, alpha);
            }
        }
        for polygon in annotation.polygons() {
            draw_outline(&mut out, polygon, (0.0, 0.0), color);
        }
    }
    out
}

/// Crop of `annotation`'s bounding box, padded and outlined, scaled down to
/// fit a `max_side` square.
pub fn thumbnail(image: &RgbImage, annotation: &Annotation, max_side: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let crop = PixelBox::from(annotation.bbox()).padded(THUMBNAIL_PADDING, width, height);
    if crop.is_empty() {
        return RgbImage::new(1, 1);
    }

    let mut thumb = imageops::crop_imm(image, crop.x, crop.y, crop.width, crop.height).to_image();
    let origin = (crop.x as f32, crop.y as f32);
    for polygon in annotation.polygons() {
        draw_outline(&mut thumb, polygon, origin, THUMBNAIL_OUTLINE_COLOR);
    }

    let longest = crop.width.max(crop.height);
    if max_side == 0 || longest <= max_side {
        return thumb;
    }
    let scale = max_side as f32 / longest as f32;
    let new_width = ((crop.width as f32 * scale).round() as u32).max(1);
    let new_height = ((crop.height as f32 * scale).round() as u32).max(1);
    imageops::resize(&thumb, new_width, new_height, FilterType::Triangle)
}

/// List rows for `annotations`, in order.
pub fn summaries(annotations: &[Annotation], width: u32, height: u32) -> Vec<AnnotationSummary> {
    annotations
        .iter()
        .map(|annotation| AnnotationSummary {
            id: annotation.id(),
            label: annotation.label().to_string(),
            bbox: annotation.bbox(),
            area: annotation.area(),
            polygon_count: annotation.polygons().len(),
            label_anchor: label_anchor(&annotation.to_mask(width as usize, height as usize)),
        })
        .collect()
}

/// Mean pixel position of `mask`, or `(10, 10)` when it is empty.
fn label_anchor(mask: &Mask) -> (u32, u32) {
    let (mut sum_x, mut sum_y, mut count) = (0u64, 0u64, 0u64);
    for ((row, col), &value) in mask.indexed_iter() {
        if value {
            sum_x += col as u64;
            sum_y += row as u64;
            count += 1;
        }
    }
    if count == 0 {
        return (10, 10);
    }
    ((sum_x / count) as u32, (sum_y / count) as u32)
}

/// Colour of the `index`-th annotation in the overlay.
pub fn overlay_color(index: usize) -> [u8; 3] {
    let hue = (index as u64 * u64::from(OVERLAY_HUE_STEP)) % 360;
    hsv_to_rgb(hue as f32, 1.0, 1.0)
}

/// `h` in degrees, `s` and `v` in `[0, 1]`.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let c = v * s;
    let sector = (h / 60.0).rem_euclid(6.0);
    let x = c * (1.0 - (sector % 2.0 - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match sector as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_u8 = |value: f32| ((value + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_u8(r), to_u8(g), to_u8(b)]
}

fn blend(base: Rgb<u8>, color: [u8; 3], alpha: f32) -> Rgb<u8> {
    let alpha = alpha.clamp(0.0, 1.0);
    let mix = |b: u8, c: u8| -> u8 {
        (f32::from(b) * (1.0 - alpha) + f32::from(c) * alpha).round() as u8
    };
    Rgb([
        mix(base[0], color[0]),
        mix(base[1], color[1]),
        mix(base[2], color[2]),
    ])
}

fn paint_mask(image: &mut RgbImage, mask: &Mask, color: [u8; 3]) {
    let (width, height) = image.dimensions();
    for ((row, col), &value) in mask.indexed_iter() {
        if value && (col as u32) < width && (row as u32) < height {
            image.put_pixel(col as u32, row as u32, Rgb(color));
        }
    }
}

/// Draw the closed ring `polygon`, shifted by `-origin`.
fn draw_outline(image: &mut RgbImage, polygon: &Polygon, origin: (f32, f32), color: [u8; 3]) {
    let n = polygon.len();
    if n < 2 {
        return;
    }
    for i in 0..n {
        let (x0, y0) = polygon.vertices[i];
        let (x1, y1) = polygon.vertices[(i + 1) % n];
        draw_line_segment_mut(
            image,
            (x0 - origin.0, y0 - origin.1),
            (x1 - origin.0, y1 - origin.1),
            Rgb(color),
        );
    }
}
