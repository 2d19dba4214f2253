//! Global constants for the segannot annotation core

use std::ops::RangeInclusive;

/// Gaussian sigma range offered for edge extraction
pub const SIGMA_RANGE: RangeInclusive<f32> = 1.0..=30.0;

/// Default Gaussian sigma for edge extraction
pub const DEFAULT_SIGMA: f32 = 2.0;

/// Hysteresis threshold range, in percent of the unit gradient scale
pub const THRESHOLD_PERCENT_RANGE: RangeInclusive<u8> = 0..=100;

/// Default low hysteresis threshold (percent)
pub const DEFAULT_LOW_THRESHOLD_PERCENT: u8 = 10;

/// Default high hysteresis threshold (percent)
pub const DEFAULT_HIGH_THRESHOLD_PERCENT: u8 = 30;

/// Radius range of the closing disk used to join edge fragments
pub const MORPH_RADIUS_RANGE: RangeInclusive<u8> = 0..=20;

/// Superpixel count range
pub const SUPERPIXEL_COUNT_RANGE: RangeInclusive<u32> = 20..=500;

/// Default superpixel count
pub const DEFAULT_SUPERPIXEL_COUNT: u32 = 100;

/// Default SLIC compactness
pub const DEFAULT_COMPACTNESS: f32 = 10.0;

/// Manual cut stroke width range
pub const STROKE_WIDTH_RANGE: RangeInclusive<u32> = 1..=10;

/// Default manual cut stroke width
pub const DEFAULT_STROKE_WIDTH: u32 = 1;

/// Default opacity of annotation overlays
pub const DEFAULT_OVERLAY_ALPHA: f32 = 0.4;

/// Hue step between consecutive annotation overlay colours (degrees)
pub const OVERLAY_HUE_STEP: u32 = 37;

/// Default highlight colour for selected regions (RGBA)
pub const DEFAULT_HIGHLIGHT_COLOR: [u8; 4] = [0, 255, 0, 120];

/// Default colour of region boundaries in the composite
pub const DEFAULT_BOUNDARY_COLOR: [u8; 3] = [255, 0, 0];

/// Default colour of manual cuts in the composite
pub const DEFAULT_CUT_COLOR: [u8; 3] = [0, 0, 255];

/// Padding around an annotation's bounding box in thumbnails
pub const THUMBNAIL_PADDING: u32 = 5;

/// Default longest side of annotation thumbnails
pub const THUMBNAIL_SIZE: u32 = 80;

/// Outline colour drawn on thumbnails
pub const THUMBNAIL_OUTLINE_COLOR: [u8; 3] = [0, 255, 0];
