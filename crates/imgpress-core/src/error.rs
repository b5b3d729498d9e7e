//! Error types for the Imgpress batch pipeline.
//!
//! Errors are organized by stage to provide clear, actionable error messages
//! that include relevant context (file paths, stage names, specific issues).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Imgpress operations.
#[derive(Error, Debug)]
pub enum ImgpressError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors (profiles)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Source file unreadable or unrecognized as an image
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Re-encoding the transformed image failed
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Extension is not in the supported set
    #[error("Unsupported format for {path}: .{extension}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// Target output exists and overwrite is disabled
    #[error("Output already exists: {path} (enable overwrite or pick another name)")]
    Collision { path: PathBuf },

    /// Directory creation, rename, or deletion failed at the OS level
    #[error("Filesystem error for {path}: {message}")]
    Filesystem { path: PathBuf, message: String },

    /// The external metadata tool returned a non-zero exit code.
    /// Recorded as a diagnostic; the pipeline never fails an item on it.
    #[error("Metadata tool error for {path}: {message}")]
    MetadataTool { path: PathBuf, message: String },

    /// Source file does not exist
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// A batch run is already in progress; concurrent runs are rejected
    #[error("A batch run is already active")]
    RunActive,
}

/// Convenience type alias for Imgpress results.
pub type Result<T> = std::result::Result<T, ImgpressError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collision_message_names_path() {
        let err = PipelineError::Collision {
            path: PathBuf::from("/out/photo.jpg"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/out/photo.jpg"));
        assert!(msg.contains("overwrite"));
    }

    #[test]
    fn test_pipeline_error_converts_to_top_level() {
        let err: ImgpressError = PipelineError::FileNotFound(PathBuf::from("/x.png")).into();
        assert!(matches!(err, ImgpressError::Pipeline(_)));
    }
}
