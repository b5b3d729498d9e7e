//! Batch transformation pipeline components.
//!
//! This module contains all the stages of the batch pipeline:
//! - **validate**: extension allow-list and magic-byte checks
//! - **discovery**: expand path arguments into the work list
//! - **transform**: decode, normalize, flatten, resize, encode
//! - **resolve**: target paths, collision policy, atomic materialization
//! - **tags**: semantic field to tag-name tables, GPS conversion
//! - **metadata**: the external-tool write sequence
//! - **orchestrator**: drives items through the pipeline on a worker
//! - **channel**: progress relay to the interactive front end

pub mod channel;
pub mod discovery;
pub mod metadata;
pub mod orchestrator;
pub mod resolve;
pub mod tags;
pub mod transform;
pub mod validate;

// Re-exports for convenient access
pub use channel::{progress_channel, ProgressMessage, ProgressReceiver, ProgressSender};
pub use discovery::FileDiscovery;
pub use metadata::{ExifTool, MetadataWriter, StepDiagnostic, ToolOutput};
pub use orchestrator::{BatchOrchestrator, BatchRunner, RunHandle};
pub use resolve::{OutputPathResolver, ResolvedPaths};
pub use transform::{EncodeFormat, EncodedImage, ImageTransformer, TransformOutput};
pub use validate::{Validator, SUPPORTED_EXTENSIONS};
