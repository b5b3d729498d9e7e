//! Image transformation: decode, color-normalize, flatten, resize, encode.
//!
//! Pure in-memory stage of the pipeline. The transformer reads the source
//! file once and produces encoded output bytes; it never touches the output
//! directory (materialization is the resolver's job).

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::codecs::tiff::TiffEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use std::io::Cursor;
use std::path::Path;

use super::validate::supported_extension;
use crate::error::PipelineError;
use crate::types::JobConfig;

/// Container formats the pipeline can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeFormat {
    Jpeg,
    Png,
    Tiff,
    Webp,
}

impl EncodeFormat {
    /// File extension for this format, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Tiff => "tif",
            Self::Webp => "webp",
        }
    }
}

/// One encoded output, ready for materialization.
#[derive(Debug)]
pub struct EncodedImage {
    pub format: EncodeFormat,
    pub bytes: Vec<u8>,
}

/// The transformer's result: a primary output and an optional WEBP sibling,
/// plus the final pixel dimensions shared by both.
#[derive(Debug)]
pub struct TransformOutput {
    pub primary: EncodedImage,
    pub webp_sibling: Option<EncodedImage>,
    pub width: u32,
    pub height: u32,
}

/// Decode → normalize → flatten → resize → encode, per the run policy.
pub struct ImageTransformer {
    job: JobConfig,
}

impl ImageTransformer {
    pub fn new(job: JobConfig) -> Self {
        Self { job }
    }

    /// Transform one source file into encoded output bytes.
    pub fn transform(&self, path: &Path) -> Result<TransformOutput, PipelineError> {
        let source_ext =
            supported_extension(path).ok_or_else(|| PipelineError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("")
                    .to_lowercase(),
            })?;

        let image = Self::decode(path)?;
        let image = normalize_colors(image);
        let image = if self.job.flatten_background {
            flatten_to_white(image)
        } else {
            image
        };
        let image = downscale(image, self.job.max_width, self.job.max_height);
        let (width, height) = image.dimensions();

        let primary_format = primary_format(&source_ext, self.job.convert_to_jpeg);
        let primary = self.encode(&image, primary_format, path)?;

        let webp_sibling = if self.job.make_webp && primary_format != EncodeFormat::Webp {
            Some(self.encode(&image, EncodeFormat::Webp, path)?)
        } else {
            None
        };

        tracing::debug!(
            "Transformed {:?} -> {}x{} {:?}",
            path.file_name().unwrap_or_default(),
            width,
            height,
            primary_format
        );

        Ok(TransformOutput {
            primary,
            webp_sibling,
            width,
            height,
        })
    }

    /// Decode a source image, guessing the format from content.
    fn decode(path: &Path) -> Result<DynamicImage, PipelineError> {
        let bytes = std::fs::read(path).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot read file: {}", e),
        })?;

        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot detect image format: {}", e),
            })?;

        reader.decode().map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Encode the (already normalized) image into the requested container.
    fn encode(
        &self,
        image: &DynamicImage,
        format: EncodeFormat,
        path: &Path,
    ) -> Result<EncodedImage, PipelineError> {
        let encode_err = |e: String| PipelineError::Encode {
            path: path.to_path_buf(),
            message: format!("{:?} encode failed: {}", format, e),
        };

        let bytes = match format {
            EncodeFormat::Jpeg => {
                // JPEG carries no alpha; force RGB
                let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
                let mut cursor = Cursor::new(Vec::new());
                let encoder = JpegEncoder::new_with_quality(&mut cursor, self.job.jpeg_quality);
                rgb.write_with_encoder(encoder)
                    .map_err(|e| encode_err(e.to_string()))?;
                cursor.into_inner()
            }
            EncodeFormat::Png => {
                let mut cursor = Cursor::new(Vec::new());
                let encoder = PngEncoder::new_with_quality(
                    &mut cursor,
                    CompressionType::Best,
                    PngFilterType::Adaptive,
                );
                image
                    .write_with_encoder(encoder)
                    .map_err(|e| encode_err(e.to_string()))?;
                cursor.into_inner()
            }
            EncodeFormat::Tiff => {
                let mut cursor = Cursor::new(Vec::new());
                let encoder = TiffEncoder::new(&mut cursor);
                image
                    .write_with_encoder(encoder)
                    .map_err(|e| encode_err(e.to_string()))?;
                cursor.into_inner()
            }
            EncodeFormat::Webp => {
                let encoder =
                    webp::Encoder::from_image(image).map_err(|e| encode_err(e.to_string()))?;
                encoder.encode(self.job.webp_quality as f32).to_vec()
            }
        };

        if bytes.is_empty() {
            return Err(encode_err("empty output".to_string()));
        }

        Ok(EncodedImage { format, bytes })
    }
}

/// The primary output format for a source extension under the conversion
/// policy: JPEG everywhere, unless the source container is preserved.
pub fn primary_format(source_ext: &str, convert_to_jpeg: bool) -> EncodeFormat {
    if convert_to_jpeg {
        return EncodeFormat::Jpeg;
    }
    match source_ext {
        "png" => EncodeFormat::Png,
        "tif" | "tiff" => EncodeFormat::Tiff,
        "webp" => EncodeFormat::Webp,
        _ => EncodeFormat::Jpeg,
    }
}

/// Uniform downscale factor bounded by the constraints that are set.
/// Never exceeds 1.0 (no upscaling).
pub fn scale_factor(width: u32, height: u32, max_width: u32, max_height: u32) -> f64 {
    let mut scale = 1.0_f64;
    if max_width > 0 {
        scale = scale.min(max_width as f64 / width as f64);
    }
    if max_height > 0 {
        scale = scale.min(max_height as f64 / height as f64);
    }
    scale
}

/// Convert any pixel mode to RGB, or RGBA when alpha must be preserved.
/// Already-RGB/RGBA images pass through untouched.
fn normalize_colors(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => image,
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Composite over an opaque white background and drop the alpha channel.
/// No-op for images without alpha.
fn flatten_to_white(image: DynamicImage) -> DynamicImage {
    if !image.color().has_alpha() {
        return image;
    }

    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut flat = image::RgbImage::new(width, height);
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = pixel[3] as u32;
        let out = flat.get_pixel_mut(x, y);
        for channel in 0..3 {
            out[channel] = ((pixel[channel] as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        }
    }
    DynamicImage::ImageRgb8(flat)
}

/// Apply the bounded downscale with high-quality resampling.
fn downscale(image: DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    let scale = scale_factor(width, height, max_width, max_height);
    if scale >= 1.0 {
        return image;
    }
    let new_width = ((width as f64 * scale) as u32).max(1);
    let new_height = ((height as f64 * scale) as u32).max(1);
    image.resize_exact(new_width, new_height, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba};

    #[test]
    fn test_scale_factor_bounds() {
        // Only width set
        assert_eq!(scale_factor(2000, 1000, 1000, 0), 0.5);
        // Only height set
        assert_eq!(scale_factor(2000, 1000, 0, 500), 0.5);
        // Both set, tighter wins
        assert_eq!(scale_factor(2000, 1000, 1000, 250), 0.25);
        // No bounds set
        assert_eq!(scale_factor(2000, 1000, 0, 0), 1.0);
        // Never upscales
        assert_eq!(scale_factor(100, 100, 1000, 1000), 1.0);
    }

    #[test]
    fn test_normalize_is_noop_on_rgb() {
        let rgb = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(4, 4, Rgb([10, 20, 30])));
        let normalized = normalize_colors(rgb.clone());
        assert_eq!(normalized.as_bytes(), rgb.as_bytes());
    }

    #[test]
    fn test_normalize_converts_gray_to_rgb() {
        let gray = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(4, 4, image::Luma([128])));
        let normalized = normalize_colors(gray);
        assert!(matches!(normalized, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn test_normalize_preserves_alpha() {
        let la = DynamicImage::ImageLumaA8(image::GrayAlphaImage::from_pixel(
            2,
            2,
            image::LumaA([100, 128]),
        ));
        let normalized = normalize_colors(la);
        assert!(matches!(normalized, DynamicImage::ImageRgba8(_)));
    }

    #[test]
    fn test_flatten_is_noop_without_alpha() {
        let rgb = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(4, 4, Rgb([10, 20, 30])));
        let flat = flatten_to_white(rgb.clone());
        assert_eq!(flat.as_bytes(), rgb.as_bytes());
    }

    #[test]
    fn test_flatten_composites_over_white() {
        // Fully transparent pixel becomes pure white
        let rgba = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            2,
            2,
            Rgba([200, 0, 0, 0]),
        ));
        let flat = flatten_to_white(rgba);
        let rgb = flat.to_rgb8();
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([255, 255, 255]));

        // Fully opaque pixel keeps its color
        let rgba = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            2,
            2,
            Rgba([200, 0, 0, 255]),
        ));
        let flat = flatten_to_white(rgba);
        let rgb = flat.to_rgb8();
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([200, 0, 0]));
    }

    #[test]
    fn test_primary_format_selection() {
        assert_eq!(primary_format("jpg", true), EncodeFormat::Jpeg);
        assert_eq!(primary_format("jpeg", false), EncodeFormat::Jpeg);
        assert_eq!(primary_format("png", true), EncodeFormat::Jpeg);
        assert_eq!(primary_format("png", false), EncodeFormat::Png);
        assert_eq!(primary_format("tiff", false), EncodeFormat::Tiff);
        assert_eq!(primary_format("webp", false), EncodeFormat::Webp);
    }

    fn write_test_png(dir: &Path, name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let path = dir.join(name);
        let img = image::RgbImage::from_pixel(width, height, Rgb([40, 80, 120]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_transform_downscales_and_encodes_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_test_png(dir.path(), "big.png", 400, 200);

        let job = JobConfig {
            max_width: 100,
            max_height: 0,
            make_webp: false,
            ..Default::default()
        };
        let output = ImageTransformer::new(job).transform(&source).unwrap();

        assert_eq!(output.width, 100);
        assert_eq!(output.height, 50);
        assert_eq!(output.primary.format, EncodeFormat::Jpeg);
        // JPEG magic bytes
        assert_eq!(&output.primary.bytes[0..3], &[0xFF, 0xD8, 0xFF]);
        assert!(output.webp_sibling.is_none());
    }

    #[test]
    fn test_transform_never_upscales() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_test_png(dir.path(), "small.png", 50, 30);

        let job = JobConfig {
            max_width: 1600,
            max_height: 1600,
            ..Default::default()
        };
        let output = ImageTransformer::new(job).transform(&source).unwrap();
        assert_eq!((output.width, output.height), (50, 30));
    }

    #[test]
    fn test_transform_produces_webp_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_test_png(dir.path(), "a.png", 64, 64);

        let job = JobConfig {
            make_webp: true,
            ..Default::default()
        };
        let output = ImageTransformer::new(job).transform(&source).unwrap();

        let webp = output.webp_sibling.expect("webp sibling requested");
        assert_eq!(webp.format, EncodeFormat::Webp);
        assert_eq!(&webp.bytes[0..4], b"RIFF");
        assert_eq!(&webp.bytes[8..12], b"WEBP");
    }

    #[test]
    fn test_transform_keeps_png_container_when_conversion_off() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_test_png(dir.path(), "keep.png", 32, 32);

        let job = JobConfig {
            convert_to_jpeg: false,
            make_webp: false,
            ..Default::default()
        };
        let output = ImageTransformer::new(job).transform(&source).unwrap();
        assert_eq!(output.primary.format, EncodeFormat::Png);
        assert_eq!(&output.primary.bytes[1..4], b"PNG");
    }

    #[test]
    fn test_transform_corrupt_source_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.jpg");
        std::fs::write(&path, b"\xFF\xD8\xFFgarbage data, not a real jpeg").unwrap();

        let err = ImageTransformer::new(JobConfig::default())
            .transform(&path)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }
}
