//! Annotation document import/export.
//!
//! Annotations are persisted as COCO-style JSON: one image object per store
//! key, polygon segmentations, and categories numbered by first appearance
//! of each label.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use segannot::format::CocoFormat;
//!
//! let doc = CocoFormat::export_all("photos/cat.png", (640, 480), &store);
//! CocoFormat::export(&doc, Path::new("cat.json"))?;
//! let restored = CocoFormat::import_all(&CocoFormat::import(Path::new("cat.json"))?)?;
//! ```

mod error;
pub mod formats;

pub use error::FormatError;
pub use formats::{
    CURRENT_IMAGE_ID, CocoAnnotation, CocoCategory, CocoDocument, CocoFormat, CocoImage,
};
