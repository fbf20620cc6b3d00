//! Crop-to-fill thumbnail transform
//!
//! Handles decode → crop → resize. The source is scaled so the target box is
//! fully covered, the overflow is cropped around the crop anchor, and the
//! result is exactly `width × height` pixels.

use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::io::Reader as ImageReader;
use image::{DynamicImage, GrayAlphaImage, GrayImage, ImageFormat, RgbImage, RgbaImage};
use std::io::Cursor;
use std::num::NonZeroU32;

use super::acquire::{ImageAsset, ImagePayload};
use super::request::ThumbnailRequest;
use crate::error::ThumbnailError;

/// JPEG end-of-image marker
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

/// Region of the source kept by the crop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// Compute the crop region for a crop-to-fill resize
///
/// The region has the target aspect ratio and is as large as the source
/// allows. `centering` places it: (0, 0) keeps the top-left of the source,
/// (1, 1) the bottom-right.
pub fn crop_box(src: (u32, u32), dst: (u32, u32), centering: (f32, f32)) -> CropBox {
    let (src_w, src_h) = (src.0 as f64, src.1 as f64);
    let src_ratio = src_w / src_h;
    let dst_ratio = dst.0 as f64 / dst.1 as f64;

    let (crop_w, crop_h) = if (src_ratio - dst_ratio).abs() < f64::EPSILON {
        (src_w, src_h)
    } else if src_ratio > dst_ratio {
        // Source is wider: keep full height
        (src_h * dst_ratio, src_h)
    } else {
        (src_w, src_w / dst_ratio)
    };

    let width = (crop_w.round() as u32).clamp(1, src.0);
    let height = (crop_h.round() as u32).clamp(1, src.1);

    let cx = f64::from(centering.0.clamp(0.0, 1.0));
    let cy = f64::from(centering.1.clamp(0.0, 1.0));

    CropBox {
        left: ((src.0 - width) as f64 * cx).round() as u32,
        top: ((src.1 - height) as f64 * cy).round() as u32,
        width,
        height,
    }
}

fn read_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

fn decode_strict(data: &[u8]) -> Result<DynamicImage, ThumbnailError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ThumbnailError::acquisition(format!("Failed to decode image: {}", e)))?
        .decode()
        .map_err(|e| ThumbnailError::acquisition(format!("Failed to decode image: {}", e)))
}

/// Complete a JPEG cut off before its end-of-image marker
///
/// The missing scan data decodes as flat blocks.
fn decode_truncated_jpeg(data: &[u8]) -> Option<DynamicImage> {
    if data.ends_with(&JPEG_EOI) {
        return None;
    }

    let mut completed = Vec::with_capacity(data.len() + JPEG_EOI.len());
    completed.extend_from_slice(data);
    completed.extend_from_slice(&JPEG_EOI);
    decode_strict(&completed).ok()
}

/// Read PNG rows until the stream ends; missing rows stay zero
fn decode_truncated_png(data: &[u8]) -> Option<DynamicImage> {
    let mut decoder = png::Decoder::new(Cursor::new(data));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info().ok()?;

    let (width, height) = {
        let info = reader.info();
        // Passes of an interlaced image cannot be placed row by row
        if info.interlaced {
            return None;
        }
        (info.width, info.height)
    };
    let (color_type, _) = reader.output_color_type();
    let line_size = reader.output_line_size(width);
    if line_size == 0 {
        return None;
    }

    let mut buffer = vec![0u8; line_size * height as usize];
    let mut rows = 0u32;
    for line in buffer.chunks_exact_mut(line_size) {
        match reader.next_row() {
            Ok(Some(row)) => {
                let data = row.data();
                let len = data.len().min(line.len());
                line[..len].copy_from_slice(&data[..len]);
                rows += 1;
            }
            Ok(None) | Err(_) => break,
        }
    }
    if rows == 0 {
        return None;
    }
    tracing::debug!(rows, height, "Recovered rows of truncated PNG");

    match color_type {
        png::ColorType::Grayscale => {
            GrayImage::from_raw(width, height, buffer).map(DynamicImage::ImageLuma8)
        }
        png::ColorType::GrayscaleAlpha => {
            GrayAlphaImage::from_raw(width, height, buffer).map(DynamicImage::ImageLumaA8)
        }
        png::ColorType::Rgb => RgbImage::from_raw(width, height, buffer).map(DynamicImage::ImageRgb8),
        png::ColorType::Rgba => {
            RgbaImage::from_raw(width, height, buffer).map(DynamicImage::ImageRgba8)
        }
        png::ColorType::Indexed => None,
    }
}

/// Keep whatever part of the first GIF frame decodes
fn decode_truncated_gif(data: &[u8]) -> Option<DynamicImage> {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);
    let mut decoder = options.read_info(Cursor::new(data)).ok()?;
    let screen = (u32::from(decoder.width()), u32::from(decoder.height()));

    let (left, top, width, height) = {
        let frame = decoder.next_frame_info().ok()??;
        if frame.interlaced {
            return None;
        }
        (
            u32::from(frame.left),
            u32::from(frame.top),
            u32::from(frame.width),
            u32::from(frame.height),
        )
    };
    let line_size = width as usize * 4;
    if line_size == 0 || height == 0 {
        return None;
    }

    let mut buffer = vec![0u8; line_size * height as usize];
    let mut rows = 0u32;
    for line in buffer.chunks_exact_mut(line_size) {
        match decoder.fill_buffer(line) {
            Ok(true) => rows += 1,
            Ok(false) | Err(_) => break,
        }
    }
    if rows == 0 {
        return None;
    }
    tracing::debug!(rows, height, "Recovered rows of truncated GIF");

    let frame = RgbaImage::from_raw(width, height, buffer)?;
    if screen == (width, height) && (left, top) == (0, 0) {
        return Some(DynamicImage::ImageRgba8(frame));
    }

    let (canvas_w, canvas_h) = if screen.0 == 0 || screen.1 == 0 {
        (left + width, top + height)
    } else {
        screen
    };
    let mut canvas = RgbaImage::new(canvas_w, canvas_h);
    image::imageops::replace(&mut canvas, &frame, i64::from(left), i64::from(top));
    Some(DynamicImage::ImageRgba8(canvas))
}

/// Decode image data, tolerating truncated streams
///
/// When strict decoding fails, JPEG, PNG and GIF sources are decoded as far
/// as the data goes. Anything that cannot be recovered reports the strict
/// decoder's error.
pub fn decode_image(data: &[u8], max_pixels: u64) -> Result<DynamicImage, ThumbnailError> {
    if let Some((width, height)) = read_dimensions(data) {
        let pixels = width as u64 * height as u64;
        if pixels > max_pixels {
            return Err(ThumbnailError::acquisition(format!(
                "Image dimensions {}x{} ({} pixels) exceed limit of {} pixels",
                width, height, pixels, max_pixels
            )));
        }
    }

    let err = match decode_strict(data) {
        Ok(image) => return Ok(image),
        Err(err) => err,
    };

    let recovered = match image::guess_format(data) {
        Ok(ImageFormat::Jpeg) => decode_truncated_jpeg(data),
        Ok(ImageFormat::Png) => decode_truncated_png(data),
        Ok(ImageFormat::Gif) => decode_truncated_gif(data),
        _ => None,
    };

    match recovered {
        Some(image) => {
            tracing::debug!(bytes = data.len(), error = %err, "Decoded truncated image");
            Ok(image)
        }
        None => Err(err),
    }
}

/// Resize image using fast-image-resize with a bicubic (Catmull-Rom) filter
fn resize_exact(
    img: &DynamicImage,
    target_w: u32,
    target_h: u32,
) -> Result<DynamicImage, ThumbnailError> {
    let resize_failed = |message: String| ThumbnailError::encode(format!("Resize failed: {}", message));

    let src_width =
        NonZeroU32::new(img.width()).ok_or_else(|| resize_failed("Source width is 0".into()))?;
    let src_height =
        NonZeroU32::new(img.height()).ok_or_else(|| resize_failed("Source height is 0".into()))?;
    let dst_width =
        NonZeroU32::new(target_w).ok_or_else(|| resize_failed("Target width is 0".into()))?;
    let dst_height =
        NonZeroU32::new(target_h).ok_or_else(|| resize_failed("Target height is 0".into()))?;

    let src_image = Image::from_vec_u8(
        src_width,
        src_height,
        img.to_rgba8().into_raw(),
        PixelType::U8x4,
    )
    .map_err(|e| resize_failed(format!("Failed to create source image: {:?}", e)))?;

    let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);

    let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::CatmullRom));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| resize_failed(format!("{:?}", e)))?;

    let rgba_image = image::RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| resize_failed("Failed to create output image buffer".into()))?;

    Ok(DynamicImage::ImageRgba8(rgba_image))
}

/// Decode the payload of an asset, if it is not decoded already
pub fn decoded_image(asset: &ImageAsset, max_pixels: u64) -> Result<DynamicImage, ThumbnailError> {
    match &asset.payload {
        ImagePayload::Encoded(data) => decode_image(data, max_pixels),
        ImagePayload::Decoded(image) => Ok(image.clone()),
    }
}

/// Crop-to-fill `asset` to the requested dimensions
///
/// Returns a new asset with the same extension and MIME type whose pixels are
/// exactly `request.width × request.height`.
pub fn thumbnail(
    asset: &ImageAsset,
    request: &ThumbnailRequest,
    max_pixels: u64,
) -> Result<ImageAsset, ThumbnailError> {
    let source = decoded_image(asset, max_pixels)?;
    let target = (request.width, request.height);

    let region = crop_box(
        (source.width(), source.height()),
        target,
        request.crop_centering,
    );

    tracing::debug!(
        src_width = source.width(),
        src_height = source.height(),
        crop_left = region.left,
        crop_top = region.top,
        crop_width = region.width,
        crop_height = region.height,
        width = request.width,
        height = request.height,
        "Cropping source to fill target"
    );

    let cropped = source.crop_imm(region.left, region.top, region.width, region.height);
    let resized = resize_exact(&cropped, request.width, request.height)?;

    Ok(asset.with_image(resized))
}
