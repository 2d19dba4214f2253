//! Turns a region union mask into an annotation record.

use segannot_raster::{Mask, count_foreground, extract_polygons, mask_bbox};

use crate::error::{AnnotateError, Result};
use crate::model::{Annotation, AnnotationId, BoundingBox, MaskPatch};

/// Label used when the caller supplies an empty one.
pub fn default_label(id: AnnotationId) -> String {
    format!("object_{}", id)
}

/// Build annotation `next_id` from `mask`.
///
/// Fails with [`AnnotateError::EmptySelection`] when the mask yields no
/// polygon. `area` is the foreground pixel count, not the polygon area.
/// A blank `label` is replaced by `object_<next_id>`; any other label is
/// stored as given.
pub fn build_annotation(mask: &Mask, label: &str, next_id: AnnotationId) -> Result<Annotation> {
    let polygons = extract_polygons(mask);
    if polygons.is_empty() {
        return Err(AnnotateError::EmptySelection);
    }

    let area = count_foreground(mask) as f64;
    let bbox = BoundingBox::from(mask_bbox(mask));
    let label = if label.trim().is_empty() {
        default_label(next_id)
    } else {
        label.to_string()
    };

    log::debug!(
        "Built annotation {} '{}': {} polygons, area {}, bbox {:?}",
        next_id,
        label,
        polygons.len(),
        area,
        bbox.to_array()
    );

    Ok(Annotation::new(next_id, label, polygons, area, bbox).with_mask(MaskPatch::crop(mask, bbox)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_mask() -> Mask {
        let mut mask = Mask::from_elem((10, 12), false);
        for row in 2..5 {
            for col in 3..8 {
                mask[[row, col]] = true;
            }
        }
        mask
    }

    #[test]
    fn test_area_is_pixel_count() {
        let ann = build_annotation(&block_mask(), "cat", 1).unwrap();
        assert_eq!(ann.area(), 15.0);
        assert!((ann.polygons()[0].area() as f64) < ann.area());
    }

    #[test]
    fn test_bbox_is_tight() {
        let ann = build_annotation(&block_mask(), "cat", 1).unwrap();
        assert_eq!(ann.bbox(), BoundingBox::new(3, 2, 5, 3));
    }

    #[test]
    fn test_empty_mask_is_empty_selection() {
        let mask = Mask::from_elem((4, 4), false);
        assert!(matches!(
            build_annotation(&mask, "cat", 1),
            Err(AnnotateError::EmptySelection)
        ));
    }

    #[test]
    fn test_blank_label_is_synthesized() {
        let ann = build_annotation(&block_mask(), "  ", 7).unwrap();
        assert_eq!(ann.label(), "object_7");
        assert_eq!(ann.id(), 7);
    }

    #[test]
    fn test_label_is_stored_verbatim() {
        let ann = build_annotation(&block_mask(), " cat ", 1).unwrap();
        assert_eq!(ann.label(), " cat ");
    }

    #[test]
    fn test_source_mask_round_trips() {
        let mask = block_mask();
        let ann = build_annotation(&mask, "cat", 1).unwrap();
        assert_eq!(ann.to_mask(12, 10), mask);
    }

    #[test]
    fn test_disjoint_components_give_several_polygons() {
        let mut mask = Mask::from_elem((6, 6), false);
        mask[[1, 1]] = true;
        mask[[4, 4]] = true;
        let ann = build_annotation(&mask, "dots", 1).unwrap();
        assert_eq!(ann.polygons().len(), 2);
        assert_eq!(ann.area(), 2.0);
    }
}
