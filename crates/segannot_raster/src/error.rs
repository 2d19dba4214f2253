use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RasterError {
    #[error("Invalid parameters: {message}")]
    InvalidParameters { message: String },
}

impl RasterError {
    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RasterError>;
