//! Core data types for the Imgpress batch pipeline.
//!
//! These types describe one batch run: the work list, the run-wide policy,
//! the metadata applied to outputs, and the per-item results.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

/// One source image to process.
///
/// Created when added to the batch; read-only during pipeline execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    /// Absolute path to the source image file
    pub source: PathBuf,

    /// Optional stem used for all outputs derived from this item.
    /// Falls back to the source's base name when absent or blank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_name: Option<String>,

    /// Per-item metadata values that take precedence over batch defaults
    /// when non-blank.
    #[serde(default)]
    pub overrides: MetadataOverrides,
}

impl WorkItem {
    /// Create a work item with no overrides.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            final_name: None,
            overrides: MetadataOverrides::default(),
        }
    }

    /// The stem used for outputs: the name override if non-blank,
    /// otherwise the source base name with its extension stripped.
    pub fn final_stem(&self) -> String {
        if let Some(name) = non_blank(self.final_name.as_deref()) {
            return name.to_string();
        }
        self.source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output")
            .to_string()
    }
}

/// Fixed-shape per-item metadata overrides.
///
/// A field participates in the merge only when non-blank; blank and absent
/// are equivalent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Comma-separated keyword list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
}

/// Batch-wide metadata defaults, applied when an item override is blank.
///
/// Immutable for the duration of one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchDefaults {
    /// Author / credit line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Comma-separated keyword list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,

    /// Copyright notice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,

    /// License URL (usage terms)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_url: Option<String>,

    /// GPS latitude in signed decimal degrees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_latitude: Option<f64>,

    /// GPS longitude in signed decimal degrees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_longitude: Option<f64>,

    /// GPS altitude in meters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_altitude: Option<f64>,
}

/// Run-wide transformation and output policy. Immutable for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// JPEG encode quality (60-100)
    pub jpeg_quality: u8,

    /// WEBP encode quality (60-100)
    pub webp_quality: u8,

    /// Maximum output width in pixels; 0 = unconstrained. Never upscales.
    pub max_width: u32,

    /// Maximum output height in pixels; 0 = unconstrained. Never upscales.
    pub max_height: u32,

    /// Composite transparent images over an opaque white background
    pub flatten_background: bool,

    /// Convert PNG/TIFF/WEBP sources to JPEG output
    pub convert_to_jpeg: bool,

    /// Also produce a WEBP sibling next to the primary output
    pub make_webp: bool,

    /// Strip all pre-existing embedded metadata before writing new fields
    pub strip_existing: bool,

    /// Normalize resolution to 96 DPI
    pub force_dpi: bool,

    /// Delete the source file after the item succeeds
    pub delete_source: bool,

    /// Allow existing output files to be replaced
    pub overwrite: bool,

    /// Rename the primary output with a disambiguating suffix after
    /// metadata is written
    pub rename_after_meta: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 86,
            webp_quality: 82,
            max_width: 1600,
            max_height: 0,
            flatten_background: true,
            convert_to_jpeg: true,
            make_webp: true,
            strip_existing: true,
            force_dpi: true,
            delete_source: false,
            overwrite: true,
            rename_after_meta: true,
        }
    }
}

impl JobConfig {
    /// Check quality bounds. Dimension fields accept any value
    /// (0 disables a bound).
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, q) in [
            ("jpeg_quality", self.jpeg_quality),
            ("webp_quality", self.webp_quality),
        ] {
            if !(60..=100).contains(&q) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be between 60 and 100, got {q}"
                )));
            }
        }
        Ok(())
    }
}

/// The metadata actually applied to one item's outputs: per-item overrides
/// merged over batch defaults, field by field. Derived, never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectiveMetadata {
    pub author: Option<String>,
    pub title: Option<String>,
    pub alt_text: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub copyright: Option<String>,
    pub license_url: Option<String>,
    pub gps_latitude: Option<f64>,
    pub gps_longitude: Option<f64>,
    pub gps_altitude: Option<f64>,
}

impl EffectiveMetadata {
    /// Merge per-item overrides over batch defaults. An override field wins
    /// only if non-blank; author, copyright, license, and GPS have no
    /// per-item form and come from the defaults unchanged.
    pub fn merge(overrides: &MetadataOverrides, defaults: &BatchDefaults) -> Self {
        Self {
            author: clean(defaults.author.as_deref()),
            title: pick(overrides.title.as_deref(), defaults.title.as_deref()),
            alt_text: pick(overrides.alt_text.as_deref(), defaults.alt_text.as_deref()),
            description: pick(
                overrides.description.as_deref(),
                defaults.description.as_deref(),
            ),
            keywords: pick(overrides.keywords.as_deref(), defaults.keywords.as_deref()),
            copyright: clean(defaults.copyright.as_deref()),
            license_url: clean(defaults.license_url.as_deref()),
            gps_latitude: defaults.gps_latitude,
            gps_longitude: defaults.gps_longitude,
            gps_altitude: defaults.gps_altitude,
        }
    }
}

/// First non-blank of (override, default), trimmed.
fn pick(override_val: Option<&str>, default_val: Option<&str>) -> Option<String> {
    non_blank(override_val)
        .or_else(|| non_blank(default_val))
        .map(str::to_string)
}

/// Trimmed value, or None when blank/absent.
fn clean(val: Option<&str>) -> Option<String> {
    non_blank(val).map(str::to_string)
}

fn non_blank(val: Option<&str>) -> Option<&str> {
    val.map(str::trim).filter(|s| !s.is_empty())
}

/// Terminal status of one work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    Done,
    Failed,
}

/// The outcome of one work item. Produced exactly once per item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// The source path this result belongs to
    pub source: PathBuf,

    /// Terminal status
    pub status: ItemStatus,

    /// Output files produced (empty on failure)
    pub outputs: Vec<PathBuf>,

    /// Human-readable cause when status is Failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessingResult {
    pub fn success(source: PathBuf, outputs: Vec<PathBuf>) -> Self {
        Self {
            source,
            status: ItemStatus::Done,
            outputs,
            error: None,
        }
    }

    pub fn failure(source: PathBuf, error: impl Into<String>) -> Self {
        Self {
            source,
            status: ItemStatus::Failed,
            outputs: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Aggregate outcome of a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Items that reached Done
    pub succeeded: usize,

    /// Items that reached Failed
    pub failed: usize,

    /// Whether the run stopped early on the cancellation flag
    pub cancelled: bool,

    /// Per-item results in work-list order
    pub results: Vec<ProcessingResult>,

    /// Wall-clock duration of the run in seconds
    pub elapsed_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> BatchDefaults {
        BatchDefaults {
            author: Some("Studio".to_string()),
            title: Some("Default title".to_string()),
            alt_text: Some("Default alt".to_string()),
            description: None,
            keywords: Some("signs, acrylic".to_string()),
            copyright: Some("(c) 2025 Studio".to_string()),
            license_url: Some("https://example.com/license".to_string()),
            gps_latitude: Some(-12.0464),
            gps_longitude: Some(-77.0428),
            gps_altitude: None,
        }
    }

    #[test]
    fn test_merge_override_wins_when_non_blank() {
        let overrides = MetadataOverrides {
            title: Some("Custom".to_string()),
            ..Default::default()
        };
        let merged = EffectiveMetadata::merge(&overrides, &defaults());
        assert_eq!(merged.title.as_deref(), Some("Custom"));
        assert_eq!(merged.alt_text.as_deref(), Some("Default alt"));
    }

    #[test]
    fn test_merge_blank_override_falls_back() {
        let overrides = MetadataOverrides {
            title: Some("   ".to_string()),
            keywords: Some(String::new()),
            ..Default::default()
        };
        let merged = EffectiveMetadata::merge(&overrides, &defaults());
        assert_eq!(merged.title.as_deref(), Some("Default title"));
        assert_eq!(merged.keywords.as_deref(), Some("signs, acrylic"));
    }

    #[test]
    fn test_merge_both_blank_yields_none() {
        let merged = EffectiveMetadata::merge(&MetadataOverrides::default(), &defaults());
        assert!(merged.description.is_none());
    }

    #[test]
    fn test_merge_carries_batch_only_fields() {
        let merged = EffectiveMetadata::merge(&MetadataOverrides::default(), &defaults());
        assert_eq!(merged.author.as_deref(), Some("Studio"));
        assert_eq!(merged.gps_latitude, Some(-12.0464));
        assert_eq!(merged.gps_altitude, None);
    }

    #[test]
    fn test_final_stem_falls_back_to_source_name() {
        let item = WorkItem::new("/photos/sunset.JPG");
        assert_eq!(item.final_stem(), "sunset");
    }

    #[test]
    fn test_final_stem_ignores_blank_override() {
        let mut item = WorkItem::new("/photos/sunset.jpg");
        item.final_name = Some("  ".to_string());
        assert_eq!(item.final_stem(), "sunset");

        item.final_name = Some("hero-banner".to_string());
        assert_eq!(item.final_stem(), "hero-banner");
    }

    #[test]
    fn test_job_config_default_is_valid() {
        assert!(JobConfig::default().validate().is_ok());
    }

    #[test]
    fn test_job_config_rejects_out_of_range_quality() {
        let mut job = JobConfig::default();
        job.jpeg_quality = 45;
        assert!(job.validate().is_err());

        let mut job = JobConfig::default();
        job.webp_quality = 101;
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_work_item_serde_roundtrip() {
        let mut item = WorkItem::new("/photos/a.png");
        item.overrides.title = Some("A".to_string());
        let json = serde_json::to_string(&item).unwrap();
        // Absent optionals stay out of the wire format
        assert!(!json.contains("final_name"));
        let parsed: WorkItem = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.source, PathBuf::from("/photos/a.png"));
        assert_eq!(parsed.overrides.title.as_deref(), Some("A"));
    }
}
