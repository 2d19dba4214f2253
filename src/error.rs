//! Error types for annotation session operations.

use std::path::PathBuf;

use segannot_raster::RasterError;
use thiserror::Error;

use crate::format::FormatError;

/// Recoverable failures of session operations.
///
/// Every variant leaves the session in the state it had before the call.
/// Clicks outside the image or on boundary pixels are not errors; see
/// [`crate::session::ClickOutcome`].
#[derive(Error, Debug)]
pub enum AnnotateError {
    /// Extraction parameters rejected (e.g. low threshold >= high threshold)
    #[error("Invalid parameters: {message}")]
    InvalidParameters {
        /// Description shown to the user in place of the boundary overlay
        message: String,
    },

    /// No region selected, or the selected regions have no pixels
    #[error("Empty selection: select at least one region first")]
    EmptySelection,

    /// Label text required but not supplied
    #[error("Missing label: enter a label for the annotation")]
    MissingLabel,

    /// Operation requires a loaded image
    #[error("No image loaded")]
    NoImage,

    /// Image file could not be read or decoded
    #[error("Failed to load image {path:?}: {source}")]
    ImageLoad {
        /// Path of the image that failed to load
        path: PathBuf,
        /// Underlying decoder or I/O error
        #[source]
        source: image::ImageError,
    },

    /// Annotation document could not be read or written
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl From<RasterError> for AnnotateError {
    fn from(err: RasterError) -> Self {
        match err {
            RasterError::InvalidParameters { message } => Self::InvalidParameters { message },
        }
    }
}

pub type Result<T> = std::result::Result<T, AnnotateError>;
