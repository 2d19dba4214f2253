//! Annotation records.

use segannot_raster::{Mask, PixelBox, Polygon, rasterize_polygons};
use serde::{Deserialize, Serialize};

/// Identifier of an annotation, unique within one image's list.
pub type AnnotationId = u32;

/// Axis-aligned box `[x, y, width, height]` in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// COCO `[x, y, w, h]` order.
    pub fn to_array(self) -> [u32; 4] {
        [self.x, self.y, self.width, self.height]
    }

    pub fn from_array(bbox: [u32; 4]) -> Self {
        Self::new(bbox[0], bbox[1], bbox[2], bbox[3])
    }
}

impl From<PixelBox> for BoundingBox {
    fn from(b: PixelBox) -> Self {
        Self::new(b.x, b.y, b.width, b.height)
    }
}

impl From<BoundingBox> for PixelBox {
    fn from(b: BoundingBox) -> Self {
        PixelBox {
            x: b.x,
            y: b.y,
            width: b.width,
            height: b.height,
        }
    }
}

/// Mask an annotation was built from, cropped to its bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskPatch {
    /// Top-left corner of the crop in source pixels.
    pub origin: (u32, u32),
    /// Cropped mask, indexed `[[row, col]]` relative to `origin`.
    pub mask: Mask,
}

impl MaskPatch {
    /// Crop `mask` to `bbox`.
    pub fn crop(mask: &Mask, bbox: BoundingBox) -> Self {
        let (x0, y0) = (bbox.x as usize, bbox.y as usize);
        let cropped = Mask::from_shape_fn(
            (bbox.height as usize, bbox.width as usize),
            |(row, col)| mask[[y0 + row, x0 + col]],
        );
        Self {
            origin: (bbox.x, bbox.y),
            mask: cropped,
        }
    }

    /// Paste the patch into an empty `height x width` mask.
    pub fn expand(&self, width: usize, height: usize) -> Mask {
        let mut full = Mask::from_elem((height, width), false);
        let (ox, oy) = (self.origin.0 as usize, self.origin.1 as usize);
        for ((row, col), &value) in self.mask.indexed_iter() {
            let (r, c) = (oy + row, ox + col);
            if value && r < height && c < width {
                full[[r, c]] = true;
            }
        }
        full
    }
}

/// A labelled group of regions, frozen at creation.
///
/// Annotations are never edited in place; an edit is a removal followed by
/// a new annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    id: AnnotationId,
    label: String,
    polygons: Vec<Polygon>,
    area: f64,
    bbox: BoundingBox,
    mask: Option<MaskPatch>,
}

impl Annotation {
    /// Assemble an annotation from already computed geometry.
    ///
    /// `area` is a pixel count, not a polygon area.
    pub fn new(
        id: AnnotationId,
        label: impl Into<String>,
        polygons: Vec<Polygon>,
        area: f64,
        bbox: BoundingBox,
    ) -> Self {
        Self {
            id,
            label: label.into(),
            polygons,
            area,
            bbox,
            mask: None,
        }
    }

    /// Attach the mask the polygons were traced from.
    pub fn with_mask(mut self, patch: MaskPatch) -> Self {
        self.mask = Some(patch);
        self
    }

    pub fn id(&self) -> AnnotationId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    /// Foreground pixel count of the mask at creation time.
    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// Creation-time mask, if this annotation was built in this session.
    pub fn source_mask(&self) -> Option<&MaskPatch> {
        self.mask.as_ref()
    }

    /// Full-size mask: the creation-time mask when available, otherwise
    /// the polygons rasterized. The two may differ slightly along edges.
    pub fn to_mask(&self, width: usize, height: usize) -> Mask {
        match &self.mask {
            Some(patch) => patch.expand(width, height),
            None => rasterize_polygons(&self.polygons, width, height),
        }
    }

    /// Flattened `[x0, y0, x1, y1, ...]` rings, as stored in COCO.
    pub fn flat_polygons(&self) -> Vec<Vec<f32>> {
        self.polygons.iter().map(Polygon::to_flat).collect()
    }
}
