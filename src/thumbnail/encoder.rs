//! Image encoder abstraction
//!
//! The output format follows the source: an explicit override wins, then the
//! asset's extension, then PNG. `jpg` is an alias of `jpeg`. Lossy formats are
//! always written at maximum quality.

use std::io::Cursor;
use std::str::FromStr;

use image::{DynamicImage, ImageEncoder as _};

use super::acquire::ImageAsset;
use super::transform::decoded_image;
use crate::constants::{DEFAULT_OUTPUT_FORMAT, ENCODER_QUALITY};
use crate::error::ThumbnailError;

/// Output image format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::WebP => "webp",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ThumbnailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "gif" => Ok(OutputFormat::Gif),
            "webp" => Ok(OutputFormat::WebP),
            other => Err(ThumbnailError::encode(format!(
                "Unsupported image format: {}",
                other
            ))),
        }
    }
}

/// Pick the output format for an asset
pub fn resolve_output_format(
    format_override: Option<&str>,
    extension: &str,
) -> Result<OutputFormat, ThumbnailError> {
    let token = format_override
        .filter(|f| !f.is_empty())
        .or(Some(extension).filter(|e| !e.is_empty()))
        .unwrap_or(DEFAULT_OUTPUT_FORMAT);

    token.parse()
}

/// Result of encoding an image
#[derive(Debug)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub format: OutputFormat,
}

/// Trait for image encoders
pub trait ImageEncoder: Send + Sync {
    /// The output format this encoder produces
    fn format(&self) -> OutputFormat;

    /// Encode a decoded image at the given quality (1-100)
    fn encode(&self, image: &DynamicImage, quality: u8) -> Result<Vec<u8>, ThumbnailError>;
}

fn encode_failed(format: OutputFormat, e: impl std::fmt::Display) -> ThumbnailError {
    ThumbnailError::encode(format!("{}: {}", format.as_str(), e))
}

/// JPEG encoder using the image crate
pub struct JpegEncoder;

impl ImageEncoder for JpegEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Jpeg
    }

    fn encode(&self, image: &DynamicImage, quality: u8) -> Result<Vec<u8>, ThumbnailError> {
        use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;

        // JPEG has no alpha channel
        let rgb = image.to_rgb8();

        let mut output = Cursor::new(Vec::new());
        ImageJpegEncoder::new_with_quality(&mut output, quality)
            .write_image(&rgb, rgb.width(), rgb.height(), image::ColorType::Rgb8)
            .map_err(|e| encode_failed(self.format(), e))?;

        Ok(output.into_inner())
    }
}

/// PNG encoder using the image crate
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Png
    }

    fn encode(&self, image: &DynamicImage, _quality: u8) -> Result<Vec<u8>, ThumbnailError> {
        use image::codecs::png::PngEncoder as ImagePngEncoder;

        let rgba = image.to_rgba8();

        let mut output = Cursor::new(Vec::new());
        ImagePngEncoder::new(&mut output)
            .write_image(&rgba, rgba.width(), rgba.height(), image::ColorType::Rgba8)
            .map_err(|e| encode_failed(self.format(), e))?;

        Ok(output.into_inner())
    }
}

/// GIF encoder (single frame) using the image crate
pub struct GifEncoder;

impl ImageEncoder for GifEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Gif
    }

    fn encode(&self, image: &DynamicImage, _quality: u8) -> Result<Vec<u8>, ThumbnailError> {
        use image::codecs::gif::GifEncoder as ImageGifEncoder;

        let rgba = image.to_rgba8();

        let mut output = Vec::new();
        {
            let mut encoder = ImageGifEncoder::new(&mut output);
            encoder
                .encode(&rgba, rgba.width(), rgba.height(), image::ColorType::Rgba8)
                .map_err(|e| encode_failed(self.format(), e))?;
        }

        Ok(output)
    }
}

/// WebP encoder using the image crate
///
/// Note: The `image` crate only supports lossless WebP encoding, which is
/// what maximum quality asks for anyway.
pub struct WebPEncoder;

impl ImageEncoder for WebPEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::WebP
    }

    fn encode(&self, image: &DynamicImage, _quality: u8) -> Result<Vec<u8>, ThumbnailError> {
        use image::codecs::webp::WebPEncoder as ImageWebPEncoder;

        let rgba = image.to_rgba8();

        let mut output = Cursor::new(Vec::new());
        ImageWebPEncoder::new_lossless(&mut output)
            .write_image(&rgba, rgba.width(), rgba.height(), image::ColorType::Rgba8)
            .map_err(|e| encode_failed(self.format(), e))?;

        Ok(output.into_inner())
    }
}

/// Factory for creating encoders based on output format
pub struct EncoderFactory;

impl EncoderFactory {
    pub fn create(format: OutputFormat) -> Box<dyn ImageEncoder> {
        match format {
            OutputFormat::Jpeg => Box::new(JpegEncoder),
            OutputFormat::Png => Box::new(PngEncoder),
            OutputFormat::Gif => Box::new(GifEncoder),
            OutputFormat::WebP => Box::new(WebPEncoder),
        }
    }
}

/// Serialize an asset in its resolved output format
///
/// The asset itself is left untouched.
pub fn encode_asset(
    asset: &ImageAsset,
    format_override: Option<&str>,
    max_pixels: u64,
) -> Result<EncodedImage, ThumbnailError> {
    let format = resolve_output_format(format_override, &asset.extension)?;
    let image = decoded_image(asset, max_pixels)?;

    let data = EncoderFactory::create(format).encode(&image, ENCODER_QUALITY)?;

    tracing::debug!(
        format = format.as_str(),
        bytes = data.len(),
        "Thumbnail encoded"
    );

    Ok(EncodedImage { data, format })
}
