use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader, Rgb, RgbImage};

use crate::error::MediaError;

pub const FULL_MAX: (u32, u32) = (1200, 1200);
pub const THUMBNAIL_MAX: (u32, u32) = (300, 300);
const FULL_QUALITY: u8 = 85;
const THUMBNAIL_QUALITY: u8 = 80;

#[derive(Debug)]
pub struct ProcessedImage {
    pub full: Vec<u8>,
    pub full_dimensions: (u32, u32),
    pub thumbnail: Vec<u8>,
    pub thumbnail_dimensions: (u32, u32),
}

/// Decode a validated payload and produce the two JPEG variants: full
/// (fit within 1200x1200, q85) and thumbnail (fit within 300x300, q80).
/// Orientation metadata is baked into the pixel data and any palette or
/// alpha mode is flattened onto white before encoding.
pub fn process(bytes: &[u8]) -> Result<ProcessedImage, MediaError> {
    let decoded = decode_oriented(bytes)?;
    let flat = flatten_to_rgb(decoded);

    let full = resize_to_fit(&flat, FULL_MAX);
    let thumbnail = resize_to_fit(&flat, THUMBNAIL_MAX);

    Ok(ProcessedImage {
        full_dimensions: full.dimensions(),
        thumbnail_dimensions: thumbnail.dimensions(),
        full: encode_jpeg(&full, FULL_QUALITY)?,
        thumbnail: encode_jpeg(&thumbnail, THUMBNAIL_QUALITY)?,
    })
}

fn decode_oriented(bytes: &[u8]) -> Result<DynamicImage, MediaError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| MediaError::ImageProcessingFailed(image::ImageError::IoError(err)))?;
    let mut decoder = reader
        .into_decoder()
        .map_err(MediaError::ImageProcessingFailed)?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut decoded =
        DynamicImage::from_decoder(decoder).map_err(MediaError::ImageProcessingFailed)?;
    decoded.apply_orientation(orientation);
    Ok(decoded)
}

/// JPEG has no alpha channel: composite anything translucent onto an
/// opaque white background.
fn flatten_to_rgb(decoded: DynamicImage) -> RgbImage {
    match decoded {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => {
            let rgba = other.to_rgba8();
            let mut flat = RgbImage::from_pixel(rgba.width(), rgba.height(), Rgb([255, 255, 255]));
            for (x, y, pixel) in rgba.enumerate_pixels() {
                let alpha = pixel[3] as u32;
                let out = flat.get_pixel_mut(x, y);
                for channel in 0..3 {
                    out[channel] =
                        ((pixel[channel] as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
                }
            }
            flat
        }
    }
}

/// Dimensions after fitting `source` within `max`, preserving aspect ratio.
/// A source already inside the bounds is returned unchanged (never upscale).
pub fn fit_within(source: (u32, u32), max: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = max;
    if src_w <= max_w && src_h <= max_h {
        return source;
    }
    let src_ratio = src_w as f64 / src_h as f64;
    let max_ratio = max_w as f64 / max_h as f64;
    if src_ratio > max_ratio {
        (max_w, (max_w as f64 / src_ratio).round().max(1.0) as u32)
    } else {
        ((max_h as f64 * src_ratio).round().max(1.0) as u32, max_h)
    }
}

fn resize_to_fit(source: &RgbImage, max: (u32, u32)) -> RgbImage {
    let target = fit_within(source.dimensions(), max);
    if target == source.dimensions() {
        return source.clone();
    }
    image::imageops::resize(source, target.0, target.1, FilterType::Lanczos3)
}

fn encode_jpeg(source: &RgbImage, quality: u8) -> Result<Vec<u8>, MediaError> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    source
        .write_with_encoder(encoder)
        .map_err(MediaError::ImageProcessingFailed)?;
    Ok(out)
}
