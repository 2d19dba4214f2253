//! Annotation format implementations.

mod coco;

#[cfg(test)]
mod tests;

pub use coco::{
    CURRENT_IMAGE_ID, CocoAnnotation, CocoCategory, CocoDocument, CocoFormat, CocoImage,
};
