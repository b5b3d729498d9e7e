//! Metadata writing through the external ExifTool binary.
//!
//! The writer runs a strict ordered sequence against an already-materialized
//! output file: strip, normalize resolution, write descriptive fields (+GPS).
//! Each step is one subprocess invocation; a non-zero exit becomes a
//! structured diagnostic and never aborts the remaining steps or the item.

use std::path::Path;
use std::process::Command;

use super::tags;
use crate::types::{EffectiveMetadata, JobConfig};

/// Handle to the ExifTool binary. The path is resolved by the surrounding
/// application and passed in as a plain string.
#[derive(Debug, Clone)]
pub struct ExifTool {
    path: String,
}

/// Outcome of one tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn ok(&self) -> bool {
        self.code == 0
    }

    /// The message worth logging: stderr when present, stdout otherwise.
    pub fn diagnostic(&self) -> &str {
        if self.stderr.is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

impl ExifTool {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Invoke the tool with the given arguments. A spawn failure is folded
    /// into a non-zero `ToolOutput` so callers have a single shape to log.
    pub fn run(&self, args: &[String]) -> ToolOutput {
        match Command::new(&self.path).args(args).output() {
            Ok(output) => ToolOutput {
                code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            },
            Err(e) => ToolOutput {
                code: 1,
                stdout: String::new(),
                stderr: format!("failed to run {}: {}", self.path, e),
            },
        }
    }

    /// Dump the descriptive tag set of a file (`-G1 -a -s`), for inspection.
    pub fn dump(&self, target: &Path) -> ToolOutput {
        let mut args: Vec<String> = vec!["-G1".into(), "-a".into(), "-s".into()];
        args.extend(tags::INSPECT_FIELDS.iter().map(|f| format!("-{f}")));
        args.push(target.to_string_lossy().into_owned());
        self.run(&args)
    }
}

/// A non-fatal problem reported by one step of the metadata sequence.
#[derive(Debug, Clone)]
pub struct StepDiagnostic {
    /// Which step produced it: "strip", "resolution", or "fields"
    pub step: &'static str,
    pub message: String,
}

/// Drives the fixed metadata sequence against materialized output files.
pub struct MetadataWriter {
    tool: ExifTool,
}

impl MetadataWriter {
    pub fn new(tool: ExifTool) -> Self {
        Self { tool }
    }

    /// Run the full sequence against one file. Returns the diagnostics of
    /// every step that exited non-zero; an empty list means all steps were
    /// clean. Never fails the item.
    pub fn write(
        &self,
        path: &Path,
        meta: &EffectiveMetadata,
        job: &JobConfig,
    ) -> Vec<StepDiagnostic> {
        let mut diagnostics = Vec::new();
        let target = path.to_string_lossy().into_owned();

        if job.strip_existing {
            let args = vec![
                "-overwrite_original".to_string(),
                "-all=".to_string(),
                target.clone(),
            ];
            self.step("strip", &args, &mut diagnostics);
        }

        if job.force_dpi {
            let args = vec![
                "-overwrite_original".to_string(),
                "-XResolution=96".to_string(),
                "-YResolution=96".to_string(),
                "-ResolutionUnit=inches".to_string(),
                target.clone(),
            ];
            self.step("resolution", &args, &mut diagnostics);
        }

        let fields = field_args(meta);
        if !fields.is_empty() {
            let mut args = vec!["-overwrite_original".to_string()];
            args.extend(fields);
            args.push(target);
            self.step("fields", &args, &mut diagnostics);
        }

        diagnostics
    }

    fn step(&self, name: &'static str, args: &[String], diagnostics: &mut Vec<StepDiagnostic>) {
        let output = self.tool.run(args);
        if !output.ok() {
            tracing::warn!("Metadata step '{}' reported: {}", name, output.diagnostic());
            diagnostics.push(StepDiagnostic {
                step: name,
                message: output.diagnostic().to_string(),
            });
        }
    }
}

/// Build the `tag=value` argument list for the descriptive-fields step.
///
/// Each non-blank semantic field is fanned out over its tag-name table;
/// keywords are appended individually to list-typed tags and joined into
/// the single-string tag; GPS is written only when both coordinates are
/// present.
pub fn field_args(meta: &EffectiveMetadata) -> Vec<String> {
    let mut args = Vec::new();

    let mut fan_out = |table: &[&str], value: &Option<String>| {
        if let Some(value) = value {
            for tag in table {
                args.push(format!("-{tag}={value}"));
            }
        }
    };

    fan_out(tags::AUTHOR_TAGS, &meta.author);
    fan_out(tags::TITLE_TAGS, &meta.title);
    fan_out(tags::DESCRIPTION_TAGS, &meta.description);
    fan_out(tags::ALT_TEXT_TAGS, &meta.alt_text);
    fan_out(tags::COPYRIGHT_TAGS, &meta.copyright);
    fan_out(tags::LICENSE_TAGS, &meta.license_url);

    if let Some(csv) = &meta.keywords {
        let keywords = tags::split_keywords(csv);
        if !keywords.is_empty() {
            for keyword in &keywords {
                for tag in tags::KEYWORD_LIST_TAGS {
                    args.push(format!("-{tag}+={keyword}"));
                }
            }
            args.push(format!("-{}={}", tags::KEYWORD_JOINED_TAG, keywords.join(", ")));
        }
    }

    if let (Some(lat), Some(lon)) = (meta.gps_latitude, meta.gps_longitude) {
        let (lat_ref, lat_mag) = tags::gps_ref(lat, tags::GpsAxis::Latitude);
        let (lon_ref, lon_mag) = tags::gps_ref(lon, tags::GpsAxis::Longitude);
        args.push(format!("-EXIF:GPSLatitudeRef={lat_ref}"));
        args.push(format!("-EXIF:GPSLatitude={lat_mag}"));
        args.push(format!("-EXIF:GPSLongitudeRef={lon_ref}"));
        args.push(format!("-EXIF:GPSLongitude={lon_mag}"));
        if let Some(alt) = meta.gps_altitude {
            args.push(format!("-EXIF:GPSAltitude={alt}"));
        }
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta_with(f: impl FnOnce(&mut EffectiveMetadata)) -> EffectiveMetadata {
        let mut meta = EffectiveMetadata::default();
        f(&mut meta);
        meta
    }

    #[test]
    fn test_field_args_empty_metadata() {
        assert!(field_args(&EffectiveMetadata::default()).is_empty());
    }

    #[test]
    fn test_field_args_author_fans_out() {
        let meta = meta_with(|m| m.author = Some("Studio".to_string()));
        let args = field_args(&meta);
        assert_eq!(args.len(), tags::AUTHOR_TAGS.len());
        assert!(args.contains(&"-IFD0:Artist=Studio".to_string()));
        assert!(args.contains(&"-EXIF:XPAuthor=Studio".to_string()));
    }

    #[test]
    fn test_field_args_keywords_list_and_joined() {
        let meta = meta_with(|m| m.keywords = Some("signs, office".to_string()));
        let args = field_args(&meta);
        assert!(args.contains(&"-IPTC:Keywords+=signs".to_string()));
        assert!(args.contains(&"-XMP-dc:subject+=office".to_string()));
        assert!(args.contains(&"-EXIF:XPKeywords=signs, office".to_string()));
    }

    #[test]
    fn test_field_args_gps_pair_required() {
        // Longitude alone writes nothing
        let meta = meta_with(|m| m.gps_longitude = Some(-77.0428));
        assert!(field_args(&meta).is_empty());

        let meta = meta_with(|m| {
            m.gps_latitude = Some(-12.0464);
            m.gps_longitude = Some(-77.0428);
        });
        let args = field_args(&meta);
        assert!(args.contains(&"-EXIF:GPSLatitudeRef=S".to_string()));
        assert!(args.contains(&"-EXIF:GPSLatitude=12.0464".to_string()));
        assert!(args.contains(&"-EXIF:GPSLongitudeRef=W".to_string()));
        assert!(args.contains(&"-EXIF:GPSLongitude=77.0428".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("-EXIF:GPSAltitude=")));
    }

    #[test]
    fn test_field_args_gps_altitude_when_present() {
        let meta = meta_with(|m| {
            m.gps_latitude = Some(48.8566);
            m.gps_longitude = Some(2.3522);
            m.gps_altitude = Some(35.0);
        });
        let args = field_args(&meta);
        assert!(args.contains(&"-EXIF:GPSLatitudeRef=N".to_string()));
        assert!(args.contains(&"-EXIF:GPSAltitude=35".to_string()));
    }

    #[test]
    fn test_spawn_failure_is_a_diagnostic_not_a_panic() {
        let tool = ExifTool::new("/nonexistent/imgpress-test-exiftool");
        let output = tool.run(&["-ver".to_string()]);
        assert!(!output.ok());
        assert!(output.diagnostic().contains("failed to run"));
    }

    #[cfg(unix)]
    mod fake_tool {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::path::PathBuf;

        /// Write an executable shell script standing in for ExifTool.
        pub fn fake_exiftool(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("exiftool");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn test_writer_records_diagnostics_for_every_failing_step() {
            let dir = tempfile::tempdir().unwrap();
            let tool_path = fake_exiftool(dir.path(), "echo boom >&2; exit 1");
            let writer = MetadataWriter::new(ExifTool::new(tool_path.to_string_lossy()));

            let meta = meta_with(|m| m.title = Some("T".to_string()));
            let target = dir.path().join("out.jpg");
            std::fs::write(&target, b"x").unwrap();

            let diags = writer.write(&target, &meta, &JobConfig::default());
            // strip + resolution + fields all failed
            assert_eq!(diags.len(), 3);
            assert_eq!(diags[0].step, "strip");
            assert_eq!(diags[1].step, "resolution");
            assert_eq!(diags[2].step, "fields");
            assert!(diags.iter().all(|d| d.message.contains("boom")));
        }

        #[test]
        fn test_writer_clean_run_has_no_diagnostics() {
            let dir = tempfile::tempdir().unwrap();
            let tool_path = fake_exiftool(dir.path(), "exit 0");
            let writer = MetadataWriter::new(ExifTool::new(tool_path.to_string_lossy()));

            let meta = meta_with(|m| m.title = Some("T".to_string()));
            let target = dir.path().join("out.jpg");
            std::fs::write(&target, b"x").unwrap();

            let diags = writer.write(&target, &meta, &JobConfig::default());
            assert!(diags.is_empty());
        }

        #[test]
        fn test_writer_skips_disabled_steps() {
            let dir = tempfile::tempdir().unwrap();
            let tool_path = fake_exiftool(dir.path(), "exit 1");
            let writer = MetadataWriter::new(ExifTool::new(tool_path.to_string_lossy()));

            let job = JobConfig {
                strip_existing: false,
                force_dpi: false,
                ..Default::default()
            };
            let target = dir.path().join("out.jpg");
            std::fs::write(&target, b"x").unwrap();

            // No fields either: zero invocations, zero diagnostics
            let diags = writer.write(&target, &EffectiveMetadata::default(), &job);
            assert!(diags.is_empty());
        }
    }
}
