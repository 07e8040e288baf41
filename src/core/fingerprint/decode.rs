//! Fast image decoding with format-specific optimizations.
//!
//! Uses zune-jpeg for JPEG files (1.5-2x faster than the image crate),
//! falls back to the image crate for everything else.

use crate::error::HashError;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use std::fs;
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Decode an image from a file path using the fastest available decoder.
pub fn decode(path: &Path) -> Result<DynamicImage, HashError> {
    let is_jpeg = matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref(),
        Some("jpg" | "jpeg")
    );

    if is_jpeg {
        decode_jpeg(path).or_else(|_| decode_fallback(path))
    } else {
        decode_fallback(path)
    }
}

/// Fast JPEG decoding using zune-jpeg
fn decode_jpeg(path: &Path) -> Result<DynamicImage, HashError> {
    let file_bytes = fs::read(path).map_err(|e| HashError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
    let mut decoder = JpegDecoder::new_with_options(&file_bytes, options);

    let pixels = decoder.decode().map_err(|e| HashError::Decode {
        path: path.to_path_buf(),
        reason: format!("zune-jpeg decode failed: {:?}", e),
    })?;

    let info = decoder.info().ok_or_else(|| HashError::Decode {
        path: path.to_path_buf(),
        reason: "no image info after decode".to_string(),
    })?;

    let width = info.width as u32;
    let height = info.height as u32;
    if width == 0 || height == 0 {
        return Err(HashError::EmptyImage {
            path: path.to_path_buf(),
        });
    }

    let out_colorspace = decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB);

    let buffer_error = || HashError::Decode {
        path: path.to_path_buf(),
        reason: "decoded buffer does not match dimensions".to_string(),
    };

    let image = match out_colorspace {
        ColorSpace::RGB => {
            let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
                ImageBuffer::from_raw(width, height, pixels).ok_or_else(buffer_error)?;
            DynamicImage::ImageRgb8(buffer)
        }
        ColorSpace::RGBA => {
            let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
                ImageBuffer::from_raw(width, height, pixels).ok_or_else(buffer_error)?;
            DynamicImage::ImageRgba8(buffer)
        }
        ColorSpace::Luma => {
            let buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
                ImageBuffer::from_raw(width, height, pixels).ok_or_else(buffer_error)?;
            DynamicImage::ImageLuma8(buffer)
        }
        _ => return decode_fallback(path),
    };

    Ok(image)
}

/// Fallback to the image crate for non-JPEG formats
fn decode_fallback(path: &Path) -> Result<DynamicImage, HashError> {
    image::open(path).map_err(|e| HashError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
