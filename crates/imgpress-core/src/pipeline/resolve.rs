//! Output path resolution and crash-safe materialization.
//!
//! Targets are computed and collision-checked up front, before any encoding
//! work. Bytes are materialized through a sibling temp file and a single
//! atomic rename, so a final path either does not exist or is fully written.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// Marker appended by the post-metadata rename.
pub const RENAME_SUFFIX: &str = "-meta";

/// Upper bound for the rename collision counter; beyond this the rename
/// fails loudly instead of scanning forever.
const RENAME_COUNTER_CAP: u32 = 9999;

/// Resolved targets for one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub primary: PathBuf,
    pub webp: Option<PathBuf>,
}

impl ResolvedPaths {
    /// All target paths, primary first.
    pub fn all(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.primary.clone()];
        paths.extend(self.webp.clone());
        paths
    }
}

/// Computes target file names, enforces overwrite policy, and performs
/// atomic writes and renames.
pub struct OutputPathResolver {
    out_dir: PathBuf,
    overwrite: bool,
}

impl OutputPathResolver {
    pub fn new(out_dir: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            out_dir: out_dir.into(),
            overwrite,
        }
    }

    /// Create the output directory if absent. Failure here is run-fatal.
    pub fn ensure_output_dir(&self) -> Result<(), PipelineError> {
        std::fs::create_dir_all(&self.out_dir).map_err(|e| PipelineError::Filesystem {
            path: self.out_dir.clone(),
            message: format!("Cannot create output directory: {}", e),
        })
    }

    /// Compute the target path(s) for a stem and pre-flight the overwrite
    /// policy. Fails with a collision error before any encoding work is
    /// wasted; performs no filesystem writes.
    pub fn resolve(
        &self,
        stem: &str,
        primary_ext: &str,
        want_webp: bool,
    ) -> Result<ResolvedPaths, PipelineError> {
        let primary = self.out_dir.join(format!("{stem}.{primary_ext}"));
        let webp = (want_webp && primary_ext != "webp")
            .then(|| self.out_dir.join(format!("{stem}.webp")));

        if !self.overwrite {
            for target in std::iter::once(&primary).chain(webp.iter()) {
                if target.exists() {
                    return Err(PipelineError::Collision {
                        path: target.clone(),
                    });
                }
            }
        }

        Ok(ResolvedPaths { primary, webp })
    }

    /// Write bytes to a sibling temp file and atomically rename into the
    /// final path. On crash or interruption the final path either does not
    /// exist or is fully correct.
    pub fn materialize(&self, path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
        let fs_err = |message: String| PipelineError::Filesystem {
            path: path.to_path_buf(),
            message,
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(".imgpress-")
            .suffix(".tmp")
            .tempfile_in(&self.out_dir)
            .map_err(|e| fs_err(format!("Cannot create temp file: {}", e)))?;

        tmp.write_all(bytes)
            .and_then(|_| tmp.flush())
            .map_err(|e| fs_err(format!("Cannot write temp file: {}", e)))?;

        tmp.persist(path)
            .map_err(|e| fs_err(format!("Cannot move into place: {}", e)))?;

        Ok(())
    }

    /// Second atomic move after metadata is finalized: append the fixed
    /// marker to the stem, disambiguating with a numeric counter when the
    /// target name is already taken. Returns the new path.
    pub fn rename_after_metadata(&self, path: &Path) -> Result<PathBuf, PipelineError> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("jpg");

        let base = self.out_dir.join(format!("{stem}{RENAME_SUFFIX}.{ext}"));
        let target = find_free_name(&base, RENAME_COUNTER_CAP)?;

        std::fs::rename(path, &target).map_err(|e| PipelineError::Filesystem {
            path: path.to_path_buf(),
            message: format!("Rename to {:?} failed: {}", target.file_name(), e),
        })?;

        Ok(target)
    }
}

/// First free variant of `base`: the base itself, then `stem_2`, `stem_3`, ...
/// up to the cap.
fn find_free_name(base: &Path, cap: u32) -> Result<PathBuf, PipelineError> {
    if !base.exists() {
        return Ok(base.to_path_buf());
    }

    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let ext = base.extension().and_then(|e| e.to_str()).unwrap_or("jpg");
    let dir = base.parent().unwrap_or_else(|| Path::new("."));

    for counter in 2..=cap {
        let candidate = dir.join(format!("{stem}_{counter}.{ext}"));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(PipelineError::Filesystem {
        path: base.to_path_buf(),
        message: format!("No free name after {} attempts", cap),
    })
}
