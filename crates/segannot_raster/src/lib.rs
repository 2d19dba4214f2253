//! Pixel-grid layer of the segannot annotation tool.
//!
//! Turns an image into a boundary mask, splits the area outside the
//! boundaries into labelled regions, and converts region masks to and from
//! sub-pixel polygons.

pub mod boundary;
pub mod contour;
pub mod error;
pub mod grid;
pub mod labeling;
pub mod rasterize;
mod slic;

pub use boundary::{extract_boundaries, EdgeParams, ExtractionParams, SuperpixelParams};
pub use contour::{extract_polygons, Polygon};
pub use error::{RasterError, Result};
pub use grid::{count_foreground, mask_bbox, BoundaryMask, LabelGrid, Mask, PixelBox, RegionId};
pub use labeling::{
    burn_cuts, label_regions, region_at, region_count, union_mask, Connectivity, ManualCut,
};
pub use rasterize::rasterize_polygons;
pub use slic::{find_boundaries, slic};
