//! Boundary extraction.
//!
//! Wraps the two region-proposal backends (Canny edges and SLIC superpixels)
//! behind a single call that produces a [`BoundaryMask`].

use image::RgbImage;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::close;

use crate::error::{RasterError, Result};
use crate::grid::{gray_to_mask, BoundaryMask};
use crate::slic::{find_boundaries, slic};

/// Thresholds are given on a unit gradient scale; `canny` works on 8-bit
/// gradient magnitudes.
const GRADIENT_SCALE: f32 = 255.0;

/// Parameters of the edge-based backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeParams {
    /// Gaussian smoothing applied before gradient computation.
    pub sigma: f32,
    /// Hysteresis low threshold in `[0, 1)`.
    pub low_threshold: f32,
    /// Hysteresis high threshold in `(0, 1]`.
    pub high_threshold: f32,
    /// Radius of the disk used to close gaps in the edge map. `0` disables it.
    pub morph_radius: u8,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            sigma: 2.0,
            low_threshold: 0.1,
            high_threshold: 0.3,
            morph_radius: 0,
        }
    }
}

impl EdgeParams {
    /// Reject parameter combinations the edge detector cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.low_threshold >= self.high_threshold {
            return Err(RasterError::invalid_parameters(format!(
                "low threshold ({}) must be smaller than high threshold ({})",
                self.low_threshold, self.high_threshold
            )));
        }
        if self.sigma.is_nan() || self.sigma <= 0.0 {
            return Err(RasterError::invalid_parameters(format!(
                "sigma must be positive, got {}",
                self.sigma
            )));
        }
        Ok(())
    }
}

/// Parameters of the superpixel backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuperpixelParams {
    /// Approximate number of superpixels to produce.
    pub target_region_count: u32,
    /// Weight of spatial proximity against colour similarity.
    pub compactness: f32,
}

impl Default for SuperpixelParams {
    fn default() -> Self {
        Self {
            target_region_count: 100,
            compactness: 10.0,
        }
    }
}

/// Region-proposal backend selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtractionParams {
    Edge(EdgeParams),
    Superpixel(SuperpixelParams),
}

impl Default for ExtractionParams {
    fn default() -> Self {
        ExtractionParams::Superpixel(SuperpixelParams::default())
    }
}

/// Compute the boundary mask of `image` with the selected backend.
///
/// Returns [`RasterError::InvalidParameters`] without touching anything when
/// the edge thresholds are inverted or equal.
pub fn extract_boundaries(image: &RgbImage, params: &ExtractionParams) -> Result<BoundaryMask> {
    match params {
        ExtractionParams::Edge(edge) => edge_boundaries(image, edge),
        ExtractionParams::Superpixel(superpixel) => Ok(superpixel_boundaries(image, superpixel)),
    }
}

fn edge_boundaries(image: &RgbImage, params: &EdgeParams) -> Result<BoundaryMask> {
    params.validate()?;

    let gray = image::imageops::grayscale(image);
    let blurred = gaussian_blur_f32(&gray, params.sigma);
    let mut edges = canny(
        &blurred,
        params.low_threshold * GRADIENT_SCALE,
        params.high_threshold * GRADIENT_SCALE,
    );
    if params.morph_radius > 0 {
        edges = close(&edges, Norm::L2, params.morph_radius);
    }

    let mask = gray_to_mask(&edges);
    log::debug!(
        "Edge extraction (sigma={}, low={}, high={}, radius={}): {} boundary pixels",
        params.sigma,
        params.low_threshold,
        params.high_threshold,
        params.morph_radius,
        mask.iter().filter(|&&v| v).count()
    );
    Ok(mask)
}

fn superpixel_boundaries(image: &RgbImage, params: &SuperpixelParams) -> BoundaryMask {
    let labels = slic(image, params);
    find_boundaries(&labels)
}
