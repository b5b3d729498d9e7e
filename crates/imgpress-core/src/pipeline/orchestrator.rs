//! Batch orchestration: drives every work item through the pipeline.
//!
//! One background worker executes the whole batch sequentially, item by
//! item. Per item the stages run in a fixed order: validate, resolve
//! (collision pre-flight), transform, materialize, write metadata, optional
//! rename, optional source deletion. A failing item is isolated; the loop
//! continues with the next one. The cancellation flag is checked between
//! items only, so no item is ever left mid-pipeline.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::channel::ProgressSender;
use super::metadata::{ExifTool, MetadataWriter};
use super::resolve::OutputPathResolver;
use super::transform::{primary_format, ImageTransformer};
use super::validate::{supported_extension, Validator};
use crate::error::{ImgpressError, PipelineError};
use crate::types::{
    BatchDefaults, EffectiveMetadata, JobConfig, ProcessingResult, RunSummary, WorkItem,
};

/// Drives one batch run. Owns the immutable policy pair and the pipeline
/// stages; reads the work list, never mutates it.
pub struct BatchOrchestrator {
    job: JobConfig,
    defaults: BatchDefaults,
    transformer: ImageTransformer,
    resolver: OutputPathResolver,
    writer: MetadataWriter,
    progress: ProgressSender,
    cancel: Arc<AtomicBool>,
}

impl BatchOrchestrator {
    pub fn new(
        job: JobConfig,
        defaults: BatchDefaults,
        out_dir: impl Into<PathBuf>,
        exiftool: ExifTool,
        progress: ProgressSender,
    ) -> Self {
        let resolver = OutputPathResolver::new(out_dir, job.overwrite);
        let transformer = ImageTransformer::new(job.clone());
        Self {
            job,
            defaults,
            transformer,
            resolver,
            writer: MetadataWriter::new(exiftool),
            progress,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The run-scoped cancellation flag. Setting it stops the worker after
    /// the current item reaches a terminal state.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Execute the batch. The only run-fatal failure is being unable to
    /// create the output directory; everything else is per-item.
    pub fn run(&self, items: &[WorkItem]) -> Result<RunSummary, PipelineError> {
        if let Err(e) = self.resolver.ensure_output_dir() {
            // The consumer must still see a terminal message
            self.progress.log(format!("Run aborted: {e}"));
            self.progress.done(RunSummary::default());
            return Err(e);
        }

        let start = Instant::now();
        let total = items.len();
        let mut results: Vec<ProcessingResult> = Vec::with_capacity(total);
        let mut succeeded = 0usize;
        let mut failed = 0usize;
        let mut cancelled = false;

        for (index, item) in items.iter().enumerate() {
            if self.cancel.load(Ordering::SeqCst) {
                cancelled = true;
                self.progress
                    .log(format!("Cancelled after {} of {} item(s)", index, total));
                break;
            }

            let name = item
                .source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| item.source.display().to_string());
            self.progress
                .log(format!("[{}/{}] {}", index + 1, total, name));

            let result = match self.process_item(item) {
                Ok(outputs) => {
                    succeeded += 1;
                    self.progress.log(format!(
                        "  done: {}",
                        outputs
                            .iter()
                            .filter_map(|p| p.file_name())
                            .map(|n| n.to_string_lossy())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ));
                    ProcessingResult::success(item.source.clone(), outputs)
                }
                Err(e) => {
                    failed += 1;
                    tracing::error!("Item failed: {:?} - {}", item.source, e);
                    self.progress.log(format!("  failed: {e}"));
                    ProcessingResult::failure(item.source.clone(), e.to_string())
                }
            };

            results.push(result);
            self.progress.progress(index + 1, total);
        }

        let summary = RunSummary {
            succeeded,
            failed,
            cancelled,
            results,
            elapsed_seconds: start.elapsed().as_secs_f64(),
        };

        self.progress.log(format!(
            "Finished: {} succeeded, {} failed",
            summary.succeeded, summary.failed
        ));
        self.progress.done(summary.clone());

        Ok(summary)
    }

    /// One item, start to terminal state. Returns the produced output paths.
    ///
    /// Decode, format, collision, and materialization errors abort the item;
    /// metadata, rename, and source-deletion problems are logged and the
    /// item still succeeds.
    fn process_item(&self, item: &WorkItem) -> Result<Vec<PathBuf>, PipelineError> {
        Validator::validate(&item.source)?;

        // The primary extension is known from the source name and policy
        // alone, so targets are collision-checked before any decoding work.
        let source_ext = supported_extension(&item.source).ok_or_else(|| {
            PipelineError::UnsupportedFormat {
                path: item.source.clone(),
                extension: String::new(),
            }
        })?;
        let format = primary_format(&source_ext, self.job.convert_to_jpeg);
        let stem = item.final_stem();
        let paths = self
            .resolver
            .resolve(&stem, format.extension(), self.job.make_webp)?;

        let output = self.transformer.transform(&item.source)?;

        self.resolver
            .materialize(&paths.primary, &output.primary.bytes)?;
        let mut outputs = vec![paths.primary.clone()];

        if let (Some(webp_path), Some(webp)) = (&paths.webp, &output.webp_sibling) {
            self.resolver.materialize(webp_path, &webp.bytes)?;
            outputs.push(webp_path.clone());
        }

        let meta = EffectiveMetadata::merge(&item.overrides, &self.defaults);
        for path in &outputs {
            for diag in self.writer.write(path, &meta, &self.job) {
                self.progress.log(format!(
                    "  metadata step '{}' reported: {}",
                    diag.step, diag.message
                ));
            }
        }

        if self.job.rename_after_meta {
            match self.resolver.rename_after_metadata(&paths.primary) {
                Ok(renamed) => outputs[0] = renamed,
                Err(e) => {
                    // The pre-rename file is intact; the item still counts
                    tracing::warn!("Rename after metadata failed: {}", e);
                    self.progress.log(format!("  rename failed: {e}"));
                }
            }
        }

        if self.job.delete_source {
            if let Err(e) = std::fs::remove_file(&item.source) {
                tracing::warn!("Could not delete source {:?}: {}", item.source, e);
                self.progress.log(format!("  could not delete source: {e}"));
            }
        }

        Ok(outputs)
    }
}

/// Spawns batch runs onto a blocking worker task and enforces the
/// at-most-one-active-run rule: a second start request while a run is
/// active is rejected, not queued.
#[derive(Default)]
pub struct BatchRunner {
    active: Arc<AtomicBool>,
}

impl BatchRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a run is currently executing.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Start a run on a background worker. Returns a handle carrying the
    /// cancellation flag, or `RunActive` if a run is already in progress.
    pub fn spawn(
        &self,
        orchestrator: BatchOrchestrator,
        items: Vec<WorkItem>,
    ) -> Result<RunHandle, PipelineError> {
        let guard =
            RunGuard::acquire(Arc::clone(&self.active)).ok_or(PipelineError::RunActive)?;
        let cancel = orchestrator.cancel_flag();

        let join = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            orchestrator.run(&items)
        });

        Ok(RunHandle { join, cancel })
    }
}

/// Handle to a running batch.
#[derive(Debug)]
pub struct RunHandle {
    join: tokio::task::JoinHandle<Result<RunSummary, PipelineError>>,
    cancel: Arc<AtomicBool>,
}

impl RunHandle {
    /// Request cancellation; the worker stops before the next item.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Wait for the run to finish and return its summary.
    pub async fn join(self) -> crate::error::Result<RunSummary> {
        let result = self
            .join
            .await
            .map_err(|e| ImgpressError::Io(std::io::Error::other(e)))?;
        Ok(result?)
    }
}

/// RAII claim on the single-run slot; released on drop, including panics.
struct RunGuard {
    active: Arc<AtomicBool>,
}

impl RunGuard {
    fn acquire(active: Arc<AtomicBool>) -> Option<Self> {
        active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
            .then_some(Self { active })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
    }
}
