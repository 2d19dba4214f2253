//! Data models for the annotation core.

mod annotation;
mod category;
mod selection;

pub use annotation::{Annotation, AnnotationId, BoundingBox, MaskPatch};
pub use category::{Category, CategoryMap};
pub use selection::SelectionSet;
