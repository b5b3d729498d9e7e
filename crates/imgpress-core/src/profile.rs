//! Run profile persistence.
//!
//! A profile is one structured JSON record holding everything needed to
//! repeat a batch run: the job policy, the batch metadata defaults, and the
//! work list with per-item overrides. The core loads and saves it as plain
//! structured data and does not interpret or version it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::{BatchDefaults, JobConfig, WorkItem};

/// A persisted batch run: policy + defaults + work list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Run-wide transformation/output policy
    pub job: JobConfig,

    /// Batch-wide metadata defaults
    pub defaults: BatchDefaults,

    /// The work list, in processing order
    pub items: Vec<WorkItem>,

    /// Metadata tool path override, if the profile pins one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exiftool: Option<String>,

    /// Output directory override, if the profile pins one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Profile {
    /// Load a profile from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let profile: Profile = serde_json::from_str(&content)?;
        Ok(profile)
    }

    /// Save the profile as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
