//! Input validation before any transformation work.

use std::io::Read;
use std::path::Path;

use crate::error::PipelineError;

/// Source extensions the pipeline accepts, lowercase.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff", "webp"];

/// The lowercased extension of `path`, if it is in the supported set.
pub fn supported_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    SUPPORTED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Validates source files before decoding.
pub struct Validator;

impl Validator {
    /// Perform quick validation before full decode.
    ///
    /// Checks:
    /// - Extension is in the supported set
    /// - File exists
    /// - File has valid image magic bytes for a supported format
    pub fn validate(path: &Path) -> Result<(), PipelineError> {
        if supported_extension(path).is_none() {
            return Err(PipelineError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("")
                    .to_lowercase(),
            });
        }

        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }

        Self::check_magic_bytes(path)
    }

    /// Check file magic bytes to verify it's a valid image in a supported format.
    fn check_magic_bytes(path: &Path) -> Result<(), PipelineError> {
        let mut file = std::fs::File::open(path).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot open file: {}", e),
        })?;

        let mut header = [0u8; 12];
        let bytes_read = file.read(&mut header).unwrap_or(0);

        if bytes_read < 4 {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: "File too small to be a valid image".to_string(),
            });
        }

        if !Self::is_valid_image_header(&header, bytes_read) {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: "Unrecognized image format (invalid magic bytes)".to_string(),
            });
        }

        Ok(())
    }

    /// Check if the header bytes match one of the supported formats.
    fn is_valid_image_header(header: &[u8; 12], bytes_read: usize) -> bool {
        if bytes_read < 4 {
            return false;
        }

        // JPEG: FF D8 FF
        if header[0] == 0xFF && header[1] == 0xD8 && header[2] == 0xFF {
            return true;
        }

        // PNG: 89 50 4E 47
        if header[0] == 0x89 && header[1] == b'P' && header[2] == b'N' && header[3] == b'G' {
            return true;
        }

        // WebP: RIFF....WEBP
        if header[0] == b'R' && header[1] == b'I' && header[2] == b'F' && header[3] == b'F' {
            if bytes_read >= 12 {
                return header[8] == b'W'
                    && header[9] == b'E'
                    && header[10] == b'B'
                    && header[11] == b'P';
            }
            // Could be WebP, allow it to proceed
            return true;
        }

        // TIFF: II (little-endian) or MM (big-endian) followed by version 42
        let is_tiff_le =
            header[0] == b'I' && header[1] == b'I' && header[2] == 0x2A && header[3] == 0x00;
        let is_tiff_be =
            header[0] == b'M' && header[1] == b'M' && header[2] == 0x00 && header[3] == 0x2A;

        is_tiff_le || is_tiff_be
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_supported_extension_case_insensitive() {
        assert_eq!(
            supported_extension(Path::new("a.JPG")).as_deref(),
            Some("jpg")
        );
        assert_eq!(
            supported_extension(Path::new("a.TiFf")).as_deref(),
            Some("tiff")
        );
        assert!(supported_extension(Path::new("a.gif")).is_none());
        assert!(supported_extension(Path::new("a")).is_none());
    }

    #[test]
    fn test_unsupported_extension_rejected_before_io() {
        // Path does not exist; the extension check must fire first
        let err = Validator::validate(Path::new("/nonexistent/file.bmp")).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_missing_file_reported() {
        let err = Validator::validate(Path::new("/nonexistent/file.jpg")).unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(p) if p == PathBuf::from("/nonexistent/file.jpg")));
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.jpg");
        std::fs::write(&path, b"this is not an image at all").unwrap();

        let err = Validator::validate(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }

    #[test]
    fn test_magic_bytes_jpeg() {
        let header = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(Validator::is_valid_image_header(&header, 12));
    }

    #[test]
    fn test_magic_bytes_png() {
        let header = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert!(Validator::is_valid_image_header(&header, 12));
    }

    #[test]
    fn test_magic_bytes_webp() {
        let header = [b'R', b'I', b'F', b'F', 0, 0, 0, 0, b'W', b'E', b'B', b'P'];
        assert!(Validator::is_valid_image_header(&header, 12));
    }

    #[test]
    fn test_magic_bytes_tiff_both_endians() {
        let le = [b'I', b'I', 0x2A, 0x00, 0, 0, 0, 0, 0, 0, 0, 0];
        let be = [b'M', b'M', 0x00, 0x2A, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(Validator::is_valid_image_header(&le, 12));
        assert!(Validator::is_valid_image_header(&be, 12));
    }

    #[test]
    fn test_magic_bytes_gif_rejected() {
        // GIF is a real image format but not in the supported set
        let header = [b'G', b'I', b'F', b'8', b'9', b'a', 0, 0, 0, 0, 0, 0];
        assert!(!Validator::is_valid_image_header(&header, 12));
    }

    #[test]
    fn test_magic_bytes_bare_ii_rejected() {
        // Bare "II" without TIFF version bytes should not match
        let header = [b'I', b'I', 0x00, 0x00, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(!Validator::is_valid_image_header(&header, 12));
    }
}
