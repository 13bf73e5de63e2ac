//! Error types for phototag

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhototagError {
    // File-type probing errors
    #[error("not a {expected} document: root element is {}", .found.as_deref().unwrap_or("absent"))]
    FormatMismatch {
        expected: &'static str,
        found: Option<String>,
    },

    #[error("malformed track data: {0}")]
    MalformedData(String),

    // Interpolation errors
    #[error("fewer than two track points available for interpolation")]
    InsufficientTrackData,

    // Coordinate errors
    #[error("coordinates out of range: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    // Photo record errors
    #[error("photo not loaded: {}", .path.display())]
    PhotoNotLoaded { path: PathBuf },

    #[error("no GPS metadata in {}: {reason}", .path.display())]
    MissingMetadata { path: PathBuf, reason: String },

    // Configuration errors
    #[error("invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PhototagError>;
