//! Imgpress Core - Batch image transformation and metadata library.
//!
//! Imgpress takes a work list of source images and turns each one into
//! finished output files: decoded, color-normalized, resized, re-encoded,
//! and stamped with standardized descriptive metadata via ExifTool.
//!
//! # Architecture
//!
//! One background worker drives the batch sequentially:
//!
//! ```text
//! WorkItem → Validate → Resolve (collision pre-flight) → Transform
//!          → Materialize (atomic) → Write metadata → Rename / Delete source
//! ```
//!
//! Progress flows to the front end over an ordered, unbounded message
//! channel; a failing item never affects the items after it.
//!
//! # Usage
//!
//! ```rust,ignore
//! use imgpress_core::{
//!     progress_channel, BatchDefaults, BatchOrchestrator, BatchRunner,
//!     ExifTool, JobConfig, WorkItem,
//! };
//!
//! #[tokio::main]
//! async fn main() -> imgpress_core::Result<()> {
//!     let (tx, mut rx) = progress_channel();
//!     let orchestrator = BatchOrchestrator::new(
//!         JobConfig::default(),
//!         BatchDefaults::default(),
//!         "./optimized",
//!         ExifTool::new("exiftool"),
//!         tx,
//!     );
//!     let handle = BatchRunner::new().spawn(orchestrator, vec![WorkItem::new("photo.jpg")])?;
//!     let summary = handle.join().await?;
//!     println!("done: {} ok, {} failed", summary.succeeded, summary.failed);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod pipeline;
pub mod profile;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, ImgpressError, PipelineError, PipelineResult, Result};
pub use pipeline::{
    progress_channel, BatchOrchestrator, BatchRunner, ExifTool, FileDiscovery, ImageTransformer,
    MetadataWriter, ProgressMessage, ProgressReceiver, ProgressSender, RunHandle,
};
pub use profile::Profile;
pub use types::{
    BatchDefaults, EffectiveMetadata, ItemStatus, JobConfig, MetadataOverrides, ProcessingResult,
    RunSummary, WorkItem,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
