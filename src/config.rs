//! Configuration file support for segannot.
//!
//! This module provides serialization and deserialization of annotator
//! settings: extraction defaults, cut and selection behaviour, and display
//! colours.

use segannot_raster::{Connectivity, EdgeParams, ExtractionParams, SuperpixelParams};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BOUNDARY_COLOR, DEFAULT_COMPACTNESS, DEFAULT_CUT_COLOR, DEFAULT_HIGH_THRESHOLD_PERCENT,
    DEFAULT_HIGHLIGHT_COLOR, DEFAULT_LOW_THRESHOLD_PERCENT, DEFAULT_OVERLAY_ALPHA, DEFAULT_SIGMA,
    DEFAULT_STROKE_WIDTH, DEFAULT_SUPERPIXEL_COUNT, MORPH_RADIUS_RANGE, SIGMA_RANGE,
    STROKE_WIDTH_RANGE, SUPERPIXEL_COUNT_RANGE, THRESHOLD_PERCENT_RANGE,
};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Region proposal backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Canny edges
    Edge,
    /// SLIC superpixels
    #[default]
    Superpixel,
}

/// Extraction parameters as presented to the user.
///
/// Thresholds are percentages; [`ExtractionSettings::to_params`] maps them to
/// the unit range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSettings {
    #[serde(default)]
    pub mode: ExtractionMode,
    #[serde(default = "default_sigma")]
    pub sigma: f32,
    #[serde(default = "default_low_threshold")]
    pub low_threshold_percent: u8,
    #[serde(default = "default_high_threshold")]
    pub high_threshold_percent: u8,
    #[serde(default)]
    pub morph_radius: u8,
    #[serde(default = "default_superpixel_count")]
    pub superpixel_count: u32,
    #[serde(default = "default_compactness")]
    pub compactness: f32,
}

fn default_sigma() -> f32 {
    DEFAULT_SIGMA
}

fn default_low_threshold() -> u8 {
    DEFAULT_LOW_THRESHOLD_PERCENT
}

fn default_high_threshold() -> u8 {
    DEFAULT_HIGH_THRESHOLD_PERCENT
}

fn default_superpixel_count() -> u32 {
    DEFAULT_SUPERPIXEL_COUNT
}

fn default_compactness() -> f32 {
    DEFAULT_COMPACTNESS
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::default(),
            sigma: default_sigma(),
            low_threshold_percent: default_low_threshold(),
            high_threshold_percent: default_high_threshold(),
            morph_radius: 0,
            superpixel_count: default_superpixel_count(),
            compactness: default_compactness(),
        }
    }
}

impl ExtractionSettings {
    /// Clamp every value into the range offered to the user.
    ///
    /// The order of the thresholds is left alone; an inverted pair is
    /// rejected by extraction, not fixed here.
    pub fn clamped(&self) -> Self {
        Self {
            mode: self.mode,
            sigma: clamp_f32(self.sigma, *SIGMA_RANGE.start(), *SIGMA_RANGE.end()),
            low_threshold_percent: self
                .low_threshold_percent
                .min(*THRESHOLD_PERCENT_RANGE.end()),
            high_threshold_percent: self
                .high_threshold_percent
                .min(*THRESHOLD_PERCENT_RANGE.end()),
            morph_radius: self.morph_radius.min(*MORPH_RADIUS_RANGE.end()),
            superpixel_count: self.superpixel_count.clamp(
                *SUPERPIXEL_COUNT_RANGE.start(),
                *SUPERPIXEL_COUNT_RANGE.end(),
            ),
            compactness: if self.compactness.is_finite() && self.compactness > 0.0 {
                self.compactness
            } else {
                DEFAULT_COMPACTNESS
            },
        }
    }

    /// Parameters for the selected backend.
    pub fn to_params(&self) -> ExtractionParams {
        match self.mode {
            ExtractionMode::Edge => ExtractionParams::Edge(EdgeParams {
                sigma: self.sigma,
                low_threshold: f32::from(self.low_threshold_percent) / 100.0,
                high_threshold: f32::from(self.high_threshold_percent) / 100.0,
                morph_radius: self.morph_radius,
            }),
            ExtractionMode::Superpixel => ExtractionParams::Superpixel(SuperpixelParams {
                target_region_count: self.superpixel_count,
                compactness: self.compactness,
            }),
        }
    }
}

/// NaN maps to the lower bound.
fn clamp_f32(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() { min } else { value.clamp(min, max) }
}

/// Pixel neighbourhood used when growing regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityConfig {
    #[default]
    Four,
    Eight,
}

impl From<ConnectivityConfig> for Connectivity {
    fn from(config: ConnectivityConfig) -> Self {
        match config {
            ConnectivityConfig::Four => Connectivity::Four,
            ConnectivityConfig::Eight => Connectivity::Eight,
        }
    }
}

/// Colours of the interactive composite and the annotation overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayColors {
    /// RGBA blended over selected regions
    #[serde(default = "default_highlight")]
    pub highlight: [u8; 4],
    /// RGB of boundary pixels
    #[serde(default = "default_boundary")]
    pub boundary: [u8; 3],
    /// RGB of manual cuts
    #[serde(default = "default_cut")]
    pub cut: [u8; 3],
    /// Opacity of annotation overlays
    #[serde(default = "default_overlay_alpha")]
    pub overlay_alpha: f32,
}

fn default_highlight() -> [u8; 4] {
    DEFAULT_HIGHLIGHT_COLOR
}

fn default_boundary() -> [u8; 3] {
    DEFAULT_BOUNDARY_COLOR
}

fn default_cut() -> [u8; 3] {
    DEFAULT_CUT_COLOR
}

fn default_overlay_alpha() -> f32 {
    DEFAULT_OVERLAY_ALPHA
}

impl Default for DisplayColors {
    fn default() -> Self {
        Self {
            highlight: default_highlight(),
            boundary: default_boundary(),
            cut: default_cut(),
            overlay_alpha: default_overlay_alpha(),
        }
    }
}

/// Annotator configuration that can be exported and imported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatorConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Extraction defaults for newly loaded images
    #[serde(default)]
    pub extraction: ExtractionSettings,

    /// Width of manual cut strokes in pixels
    #[serde(default = "default_stroke_width")]
    pub stroke_width: u32,

    /// Region growing neighbourhood
    #[serde(default)]
    pub connectivity: ConnectivityConfig,

    /// Composite and overlay colours
    #[serde(default)]
    pub colors: DisplayColors,

    /// Reject annotations with a blank label instead of naming them
    /// `object_<id>`
    #[serde(default = "default_require_label")]
    pub require_label: bool,
}

fn default_stroke_width() -> u32 {
    DEFAULT_STROKE_WIDTH
}

fn default_require_label() -> bool {
    true
}

impl AnnotatorConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            log_level: LogLevel::default(),
            extraction: ExtractionSettings::default(),
            stroke_width: default_stroke_width(),
            connectivity: ConnectivityConfig::default(),
            colors: DisplayColors::default(),
            require_label: default_require_label(),
        }
    }

    /// Stroke width clamped to the offered range.
    pub fn clamped_stroke_width(&self) -> u32 {
        self.stroke_width
            .clamp(*STROKE_WIDTH_RANGE.start(), *STROKE_WIDTH_RANGE.end())
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Get the default filename for config export.
    pub fn default_filename() -> &'static str {
        "segannot-config.json"
    }

    /// Get the default config file path for auto-load/save.
    pub fn default_path() -> Option<std::path::PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("segannot").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("segannot")
                    .join(Self::default_filename())
            })
        }
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load_from(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to the default path.
    pub fn save_to_default_path(&self) -> Result<std::path::PathBuf, ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Read configuration from `path`.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Write configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnnotatorConfig::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.stroke_width, 1);
        assert!(config.require_label);
        assert_eq!(config.colors.highlight, [0, 255, 0, 120]);
        assert_eq!(config.extraction.mode, ExtractionMode::Superpixel);
        assert_eq!(config.extraction.superpixel_count, 100);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = AnnotatorConfig::new();
        config.stroke_width = 3;
        config.connectivity = ConnectivityConfig::Eight;
        config.extraction.mode = ExtractionMode::Edge;
        config.log_level = LogLevel::Debug;

        let json = config.to_json().unwrap();
        let parsed = AnnotatorConfig::from_json(&json).unwrap();

        assert_eq!(parsed.stroke_width, 3);
        assert_eq!(parsed.connectivity, ConnectivityConfig::Eight);
        assert_eq!(parsed.extraction.mode, ExtractionMode::Edge);
        assert_eq!(parsed.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let parsed = AnnotatorConfig::from_json(r#"{"version": 1}"#).unwrap();
        assert_eq!(parsed.stroke_width, DEFAULT_STROKE_WIDTH);
        assert_eq!(parsed.extraction, ExtractionSettings::default());
        assert_eq!(parsed.colors, DisplayColors::default());
        assert!(parsed.require_label);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir()
            .join("segannot_config_test")
            .join(AnnotatorConfig::default_filename());
        let mut config = AnnotatorConfig::new();
        config.require_label = false;
        config.colors.overlay_alpha = 0.7;

        config.save_to(&path).unwrap();
        let loaded = AnnotatorConfig::load_from(&path).unwrap();
        assert!(!loaded.require_label);
        assert_eq!(loaded.colors.overlay_alpha, 0.7);

        std::fs::remove_file(&path).ok();
        assert!(matches!(
            AnnotatorConfig::load_from(&path),
            Err(ConfigError::IoError(_))
        ));
    }

    #[test]
    fn test_version_too_new() {
        let json = format!(r#"{{"version": {}}}"#, CONFIG_VERSION + 1);
        assert!(matches!(
            AnnotatorConfig::from_json(&json),
            Err(ConfigError::VersionTooNew { .. })
        ));
    }

    #[test]
    fn test_clamped_settings() {
        let settings = ExtractionSettings {
            mode: ExtractionMode::Edge,
            sigma: 0.0,
            low_threshold_percent: 150,
            high_threshold_percent: 30,
            morph_radius: 99,
            superpixel_count: 5,
            compactness: -1.0,
        };
        let clamped = settings.clamped();
        assert_eq!(clamped.sigma, 1.0);
        assert_eq!(clamped.low_threshold_percent, 100);
        assert_eq!(clamped.high_threshold_percent, 30);
        assert_eq!(clamped.morph_radius, 20);
        assert_eq!(clamped.superpixel_count, 20);
        assert_eq!(clamped.compactness, DEFAULT_COMPACTNESS);
    }

    #[test]
    fn test_clamp_keeps_equal_thresholds() {
        let settings = ExtractionSettings {
            mode: ExtractionMode::Edge,
            low_threshold_percent: 40,
            high_threshold_percent: 40,
            ..ExtractionSettings::default()
        };
        let params = settings.clamped().to_params();
        let ExtractionParams::Edge(edge) = params else {
            panic!("expected edge params");
        };
        assert!(edge.validate().is_err());
    }

    #[test]
    fn test_to_params_scales_thresholds() {
        let settings = ExtractionSettings {
            mode: ExtractionMode::Edge,
            ..ExtractionSettings::default()
        };
        let ExtractionParams::Edge(edge) = settings.to_params() else {
            panic!("expected edge params");
        };
        assert!((edge.low_threshold - 0.1).abs() < 1e-6);
        assert!((edge.high_threshold - 0.3).abs() < 1e-6);
        assert_eq!(edge.sigma, 2.0);
    }

    #[test]
    fn test_level_filter() {
        assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
        assert_eq!(LogLevel::default().to_level_filter(), log::LevelFilter::Info);
    }
}
