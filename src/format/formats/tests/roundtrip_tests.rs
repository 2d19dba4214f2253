//! Round-trip tests: store -> document -> JSON -> document -> store.
//!
//! Labels, ids, areas, boxes and polygon coordinates must survive
//! unchanged.

use std::path::PathBuf;

use segannot_raster::{Mask, extract_polygons, rasterize_polygons};

use crate::builder::build_annotation;
use crate::format::CocoFormat;
use crate::store::AnnotationStore;

fn blob_mask() -> Mask {
    // An L-shape with a hole, plus a separate dot.
    let rows = [
        "..........",
        ".#####....",
        ".#...#....",
        ".#####....",
        ".##.......",
        ".##....#..",
        "..........",
    ];
    Mask::from_shape_fn((rows.len(), rows[0].len()), |(r, c)| {
        rows[r].as_bytes()[c] == b'#'
    })
}

fn create_store() -> AnnotationStore {
    let mut store = AnnotationStore::new();
    store.add("scene.png", build_annotation(&blob_mask(), "blob", 1).unwrap());

    let mut square = Mask::from_elem((7, 10), false);
    square[[5, 5]] = true;
    store.add("scene.png", build_annotation(&square, "dot", 3).unwrap());
    store.add("other.png", build_annotation(&square, "blob", 1).unwrap());
    store.set_dimensions("other.png", 10, 7);
    store
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("segannot_{}_{}", std::process::id(), name))
}

#[test]
fn test_roundtrip_preserves_annotations() {
    let store = create_store();
    let doc = CocoFormat::export_all("scene.png", (10, 7), &store);
    let json = CocoFormat::to_json_string(&doc).unwrap();
    let restored = CocoFormat::import_all(&CocoFormat::from_json_str(&json).unwrap()).unwrap();

    for path in ["scene.png", "other.png"] {
        let before = store.get(path);
        let after = restored.get(path);
        assert_eq!(before.len(), after.len(), "annotation count for {}", path);
        for (a, b) in before.iter().zip(after) {
            assert_eq!(a.id(), b.id());
            assert_eq!(a.label(), b.label());
            assert_eq!(a.bbox(), b.bbox());
            assert_eq!(a.area(), b.area());
            assert_eq!(a.flat_polygons(), b.flat_polygons());
        }
    }
}

#[test]
fn test_roundtrip_through_file() {
    let store = create_store();
    let path = temp_path("roundtrip.json");

    let doc = CocoFormat::export_all("scene.png", (10, 7), &store);
    CocoFormat::export(&doc, &path).unwrap();
    let reread = CocoFormat::import(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(doc, reread);
}

#[test]
fn test_roundtrip_keeps_id_counter() {
    let store = create_store();
    let doc = CocoFormat::export_all("scene.png", (10, 7), &store);
    let restored = CocoFormat::import_all(&doc).unwrap();

    assert_eq!(restored.next_id("scene.png"), 4);
    assert_eq!(restored.next_id("other.png"), 2);
}

#[test]
fn test_roundtrip_label_category_consistency() {
    let store = create_store();
    let doc = CocoFormat::export_all("scene.png", (10, 7), &store);
    let restored = CocoFormat::import_all(&doc).unwrap();
    let again = CocoFormat::export_all("scene.png", (10, 7), &restored);

    assert_eq!(doc.categories, again.categories);
    let ids = |d: &crate::format::CocoDocument| -> Vec<(u32, u32)> {
        d.annotations.iter().map(|a| (a.id, a.category_id)).collect()
    };
    assert_eq!(ids(&doc), ids(&again));
}

#[test]
fn test_imported_polygons_recover_mask() {
    let mask = blob_mask();
    let mut store = AnnotationStore::new();
    store.add("scene.png", build_annotation(&mask, "blob", 1).unwrap());

    let doc = CocoFormat::export_all("scene.png", (10, 7), &store);
    let restored = CocoFormat::import_all(&doc).unwrap();
    let imported = &restored.get("scene.png")[0];

    assert!(imported.source_mask().is_none());
    assert_eq!(imported.to_mask(10, 7), mask);
    assert_eq!(
        rasterize_polygons(&extract_polygons(&mask), 10, 7),
        imported.to_mask(10, 7)
    );
}
