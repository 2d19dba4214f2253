//! COCO JSON format implementation.
//!
//! Annotations are written as polygon segmentations with the pixel-count
//! area and the tight bounding box of the mask they were built from. Label
//! strings only appear in `categories`; each annotation refers to its label
//! through `category_id`.

use std::collections::HashMap;
use std::path::Path;

use segannot_raster::Polygon;
use serde::{Deserialize, Serialize};

use crate::format::error::FormatError;
use crate::model::{Annotation, AnnotationId, BoundingBox, CategoryMap};
use crate::store::AnnotationStore;

/// Image id of the image being exported.
pub const CURRENT_IMAGE_ID: u64 = 1;

/// COCO JSON format.
///
/// Supports:
/// - Polygon segmentations, one or more rings per annotation
/// - Several images per document
///
/// Does not support:
/// - RLE segmentations
/// - Crowd annotations (`iscrowd` is always 0)
/// - Supercategories
pub struct CocoFormat;

impl CocoFormat {
    /// Build a document from every image in `store`.
    ///
    /// `image_path` is exported first with id 1 and dimensions `dims`, even
    /// if the store has no entry for it. The other keys follow in sorted
    /// order. Categories are numbered by first appearance of each label in
    /// that image order.
    pub fn export_all(
        image_path: &str,
        dims: (u32, u32),
        store: &AnnotationStore,
    ) -> CocoDocument {
        let mut ordered: Vec<(&str, (u32, u32), &[Annotation])> =
            vec![(image_path, dims, store.get(image_path))];
        for (path, annotations) in store.get_all() {
            if path == image_path {
                continue;
            }
            let dims = store.dimensions(path).unwrap_or_else(|| {
                log::warn!("Image '{}' has no dimensions, exporting 0x0", path);
                (0, 0)
            });
            ordered.push((path, dims, annotations));
        }

        let categories = CategoryMap::from_labels(
            ordered
                .iter()
                .flat_map(|(_, _, anns)| anns.iter().map(Annotation::label)),
        );

        let mut doc = CocoDocument::default();
        for (idx, (path, (width, height), annotations)) in ordered.into_iter().enumerate() {
            let image_id = CURRENT_IMAGE_ID + idx as u64;
            doc.images.push(CocoImage {
                id: image_id,
                file_name: basename(path),
                width,
                height,
            });

            for ann in annotations {
                // Every label was registered above.
                let category_id = categories.id_of(ann.label()).unwrap_or_default();
                doc.annotations.push(CocoAnnotation {
                    id: ann.id(),
                    image_id,
                    category_id,
                    segmentation: ann.flat_polygons(),
                    area: ann.area(),
                    bbox: ann.bbox().to_array(),
                    iscrowd: 0,
                });
            }
        }

        doc.categories = categories
            .categories()
            .iter()
            .map(|cat| CocoCategory {
                id: cat.id,
                name: cat.name.clone(),
            })
            .collect();

        let mut file_names: Vec<&str> =
            doc.images.iter().map(|img| img.file_name.as_str()).collect();
        file_names.sort_unstable();
        if file_names.windows(2).any(|pair| pair[0] == pair[1]) {
            log::warn!("Several exported images share a file name; they merge on import");
        }

        log::info!(
            "Exported {} images with {} annotations in {} categories",
            doc.images.len(),
            doc.annotations.len(),
            doc.categories.len()
        );
        doc
    }

    /// Rebuild a store from a document. Keys are the `file_name` values.
    ///
    /// Every image gets a key, including images without annotations, so an
    /// image without a `file_name` is rejected. Annotations without
    /// segmentation rings are skipped.
    pub fn import_all(doc: &CocoDocument) -> Result<AnnotationStore, FormatError> {
        let category_names: HashMap<u32, &str> = doc
            .categories
            .iter()
            .map(|cat| (cat.id, cat.name.as_str()))
            .collect();
        let image_names: HashMap<u64, &str> = doc
            .images
            .iter()
            .map(|img| (img.id, img.file_name.as_str()))
            .collect();

        let mut store = AnnotationStore::new();
        for image in &doc.images {
            if image.file_name.trim().is_empty() {
                return Err(FormatError::missing_field(format!(
                    "images[id={}].file_name",
                    image.id
                )));
            }
            store.set_dimensions(&image.file_name, image.width, image.height);
        }

        let mut skipped = 0;
        for coco_ann in &doc.annotations {
            let file_name = image_names.get(&coco_ann.image_id).ok_or_else(|| {
                FormatError::invalid_format(format!(
                    "annotation {} references unknown image {}",
                    coco_ann.id, coco_ann.image_id
                ))
            })?;
            let label = category_names
                .get(&coco_ann.category_id)
                .ok_or(FormatError::CategoryNotFound {
                    id: coco_ann.category_id,
                })?;

            let polygons = convert_segmentation(coco_ann.id, &coco_ann.segmentation)?;
            if polygons.is_empty() {
                log::warn!("Skipping annotation {} without segmentation", coco_ann.id);
                skipped += 1;
                continue;
            }

            let annotation = Annotation::new(
                coco_ann.id,
                *label,
                polygons,
                coco_ann.area,
                BoundingBox::from_array(coco_ann.bbox),
            );
            store.add(file_name, annotation);
        }

        log::info!(
            "Imported {} images with {} annotations ({} skipped)",
            doc.images.len(),
            store.total_annotations(),
            skipped
        );
        Ok(store)
    }

    /// Serialize `doc` as pretty-printed JSON.
    pub fn to_json_string(doc: &CocoDocument) -> Result<String, FormatError> {
        Ok(serde_json::to_string_pretty(doc)?)
    }

    pub fn from_json_str(json: &str) -> Result<CocoDocument, FormatError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write `doc` to `path`.
    pub fn export(doc: &CocoDocument, path: &Path) -> Result<(), FormatError> {
        log::info!("Exporting COCO annotations to {:?}", path);
        std::fs::write(path, Self::to_json_string(doc)?)?;
        Ok(())
    }

    /// Read a document from `path`.
    pub fn import(path: &Path) -> Result<CocoDocument, FormatError> {
        log::info!("Importing COCO annotations from {:?}", path);
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

/// Flattened rings -> polygons. Odd-length, short or non-finite rings are
/// rejected.
fn convert_segmentation(
    id: AnnotationId,
    segmentation: &[Vec<f32>],
) -> Result<Vec<Polygon>, FormatError> {
    segmentation
        .iter()
        .map(|ring| {
            if ring.iter().any(|v| !v.is_finite()) {
                return Err(FormatError::invalid_coordinates(format!(
                    "annotation {} has non-finite coordinates",
                    id
                )));
            }
            Polygon::from_flat(ring).ok_or_else(|| {
                FormatError::invalid_coordinates(format!(
                    "annotation {} has a ring of {} values; expected an even count of at least {}",
                    id,
                    ring.len(),
                    Polygon::MIN_VERTICES * 2
                ))
            })
        })
        .collect()
}

/// Final path component, with `\` treated as a separator too.
fn basename(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    Path::new(&normalized)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or(normalized)
}

fn default_image_id() -> u64 {
    CURRENT_IMAGE_ID
}

// COCO format structures

/// Top-level COCO document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CocoDocument {
    #[serde(default)]
    pub images: Vec<CocoImage>,
    #[serde(default)]
    pub annotations: Vec<CocoAnnotation>,
    #[serde(default)]
    pub categories: Vec<CocoCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoImage {
    pub id: u64,
    /// Basename only
    #[serde(default)]
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoAnnotation {
    pub id: AnnotationId,
    #[serde(default = "default_image_id")]
    pub image_id: u64,
    pub category_id: u32,
    /// Flattened `[x0, y0, x1, y1, ...]` rings
    pub segmentation: Vec<Vec<f32>>,
    /// Pixel count
    pub area: f64,
    /// `[x, y, width, height]`
    pub bbox: [u32; 4],
    #[serde(default)]
    pub iscrowd: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoCategory {
    pub id: u32,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basename() {
        assert_eq!(basename("/data/images/cat.png"), "cat.png");
        assert_eq!(basename("cat.png"), "cat.png");
        assert_eq!(basename("C:\\images\\dog.jpg"), "dog.jpg");
    }

    #[test]
    fn test_convert_segmentation_rejects_short_rings() {
        let result = convert_segmentation(3, &[vec![0.0, 0.0, 1.0, 1.0]]);
        assert!(matches!(result, Err(FormatError::InvalidCoordinates { .. })));
    }

    #[test]
    fn test_convert_segmentation_rejects_odd_rings() {
        let result = convert_segmentation(3, &[vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_convert_segmentation_rejects_nan() {
        let result = convert_segmentation(3, &[vec![0.0, f32::NAN, 1.0, 1.0, 2.0, 0.0]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_image_id_defaults_to_current() {
        let json = r#"{"id": 4, "category_id": 1, "segmentation": [], "area": 1.0, "bbox": [0, 0, 1, 1]}"#;
        let ann: CocoAnnotation = serde_json::from_str(json).unwrap();
        assert_eq!(ann.image_id, CURRENT_IMAGE_ID);
        assert_eq!(ann.iscrowd, 0);
    }
}
