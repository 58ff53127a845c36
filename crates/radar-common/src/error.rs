//! Error types for the radar overlay pipeline.

use thiserror::Error;

/// Result type alias using RadarError.
pub type RadarResult<T> = Result<T, RadarError>;

/// Primary error type for locating, decoding and rendering radar volumes.
#[derive(Debug, Error)]
pub enum RadarError {
    // === Source Errors ===
    #[error("No volume available for {station} after {attempts} attempts of {candidates} candidates")]
    SourceUnavailable {
        station: String,
        attempts: u32,
        candidates: usize,
    },

    #[error("Request for {object} failed: {message}")]
    SourceRequest { object: String, message: String },

    // === Data Errors ===
    #[error("Failed to decode volume: {0}")]
    DecodeFailure(String),

    #[error("No usable data: {0}")]
    NoUsableData(String),

    // === Request Errors ===
    #[error("Unsupported product: {0}")]
    UnsupportedProduct(String),

    #[error("Invalid station identifier: {0}")]
    InvalidStation(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Processing Errors ===
    #[error("Projection error: {0}")]
    ProjectionError(String),

    #[error("Rendering failed: {0}")]
    RenderError(String),

    // === Infrastructure Errors ===
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RadarError {
    /// Whether this error ends the current cycle for a station/product.
    ///
    /// `NoUsableData` is the only recoverable outcome: the pipeline still
    /// writes an empty raster and reports the condition alongside it.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RadarError::NoUsableData(_))
    }

    /// Short machine-readable kind, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            RadarError::SourceUnavailable { .. } => "source_unavailable",
            RadarError::SourceRequest { .. } => "source_request",
            RadarError::DecodeFailure(_) => "decode_failure",
            RadarError::NoUsableData(_) => "no_usable_data",
            RadarError::UnsupportedProduct(_) => "unsupported_product",
            RadarError::InvalidStation(_) => "invalid_station",
            RadarError::InvalidParameter { .. } => "invalid_parameter",
            RadarError::ProjectionError(_) => "projection_error",
            RadarError::RenderError(_) => "render_error",
            RadarError::StorageError(_) => "storage_error",
            RadarError::ConfigError(_) => "config_error",
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for RadarError {
    fn from(err: std::io::Error) -> Self {
        RadarError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for RadarError {
    fn from(err: serde_json::Error) -> Self {
        RadarError::DecodeFailure(format!("JSON error: {}", err))
    }
}
