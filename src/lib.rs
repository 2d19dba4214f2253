//! segannot - region-based image annotation core
//!
//! Splits an image into regions (edges or superpixels), lets the user cut
//! and select regions, turns selections into labelled polygon annotations,
//! and stores them per image with COCO JSON import/export.

pub mod builder;
pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod loader;
pub mod model;
pub mod render;
pub mod session;
pub mod store;
pub mod viewport;

pub use builder::build_annotation;
pub use config::AnnotatorConfig;
pub use error::{AnnotateError, Result};
pub use model::{Annotation, AnnotationId, BoundingBox, SelectionSet};
pub use session::{ClickOutcome, Session};
pub use store::{AnnotationStore, StoreEvent, StoreObserver};

pub use segannot_raster::{
    BoundaryMask, Connectivity, EdgeParams, ExtractionParams, LabelGrid, ManualCut, Mask,
    Polygon, RegionId, SuperpixelParams,
};
