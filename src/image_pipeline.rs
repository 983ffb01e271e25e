//! Shared image decoding, square cropping, thumbnailing, and PNG writing helpers.

use std::fs;
use std::path::Path;

use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageFormat};
use zune_core::{colorspace::ColorSpace, options::DecoderOptions};
use zune_jpeg::JpegDecoder;

use crate::config::CropAnchor;

fn looks_like_jpeg(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0xff && bytes[1] == 0xd8
}

fn decode_jpeg_non_strict(bytes: &[u8]) -> Option<DynamicImage> {
    if !looks_like_jpeg(bytes) {
        return None;
    }

    let options = DecoderOptions::new_cmd()
        .set_strict_mode(false)
        .jpeg_set_out_colorspace(ColorSpace::RGBA);
    let mut decoder = JpegDecoder::new_with_options(bytes, options);
    let pixels = decoder.decode().ok()?;
    let (width, height) = decoder.dimensions()?;
    let image = image::RgbaImage::from_raw(width as u32, height as u32, pixels)?;
    Some(DynamicImage::ImageRgba8(image))
}

/// Decodes any format `image` supports, retrying malformed JPEGs leniently.
pub fn decode_image_from_memory_with_fallback(bytes: &[u8]) -> Result<DynamicImage, String> {
    match image::load_from_memory(bytes) {
        Ok(decoded) => Ok(decoded),
        Err(primary_error) => {
            decode_jpeg_non_strict(bytes).ok_or_else(|| primary_error.to_string())
        }
    }
}

pub fn decode_image_from_path_with_fallback(path: &Path) -> Result<DynamicImage, String> {
    let bytes = fs::read(path).map_err(|error| format!("read {}: {error}", path.display()))?;
    decode_image_from_memory_with_fallback(&bytes)
}

/// Square window `(x, y, side)` over a `width` x `height` image.
pub fn square_crop_bounds(width: u32, height: u32, anchor: CropAnchor) -> (u32, u32, u32) {
    let side = width.min(height);
    let x = (width - side) / 2;
    let y = match anchor {
        CropAnchor::Center => (height - side) / 2,
        CropAnchor::Top => 0,
    };
    (x, y, side)
}

pub fn crop_square(image: &DynamicImage, anchor: CropAnchor) -> DynamicImage {
    let (width, height) = image.dimensions();
    let (x, y, side) = square_crop_bounds(width, height, anchor);
    if x == 0 && y == 0 && side == width && side == height {
        return image.clone();
    }
    image.crop_imm(x, y, side, side)
}

fn fit_to_max_edge(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (1, 1);
    }
    let clamped = max_edge.max(1);
    if width.max(height) <= clamped {
        return (width, height);
    }
    if width >= height {
        let scaled_height =
            ((u64::from(height) * u64::from(clamped)) + (u64::from(width) / 2)) / u64::from(width);
        (clamped, scaled_height.max(1) as u32)
    } else {
        let scaled_width =
            ((u64::from(width) * u64::from(clamped)) + (u64::from(height) / 2)) / u64::from(height);
        (scaled_width.max(1) as u32, clamped)
    }
}

/// Shrinks to fit `max_edge`, preserving aspect ratio. Never enlarges.
pub fn downscale_to_max_edge(image: DynamicImage, max_edge: u32) -> DynamicImage {
    let (source_width, source_height) = image.dimensions();
    let (target_width, target_height) = fit_to_max_edge(source_width, source_height, max_edge);
    if target_width == source_width && target_height == source_height {
        return image;
    }
    image.resize_exact(target_width, target_height, FilterType::Lanczos3)
}

/// RGBA conversion, square crop, then bounded downscale.
pub fn square_thumbnail(image: DynamicImage, anchor: CropAnchor, max_edge: u32) -> DynamicImage {
    let rgba = DynamicImage::ImageRgba8(image.into_rgba8());
    let cropped = crop_square(&rgba, anchor);
    downscale_to_max_edge(cropped, max_edge)
}

/// Encodes to `<target>.tmp` and renames into place.
pub fn save_png_atomic(image: &DynamicImage, target_path: &Path) -> Result<(), String> {
    let temp_path = target_path.with_extension("png.tmp");
    if temp_path.exists() {
        let _ = fs::remove_file(&temp_path);
    }
    image
        .save_with_format(&temp_path, ImageFormat::Png)
        .map_err(|error| format!("encode {}: {error}", temp_path.display()))?;
    fs::rename(&temp_path, target_path).map_err(|error| {
        let _ = fs::remove_file(&temp_path);
        format!("rename into {}: {error}", target_path.display())
    })
}

#[cfg(test)]
pub mod test_fixtures {
    use image::{codecs::jpeg::JpegEncoder, DynamicImage, ImageBuffer, ImageFormat, Rgb, Rgba};
    use std::io::Cursor;

    pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        }))
    }

    pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        gradient_image(width, height)
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("png encoding should succeed");
        cursor.into_inner()
    }

    pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let rgb = ImageBuffer::from_pixel(width, height, Rgb([90u8, 140, 210]));
        let mut encoded = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut encoded, 85);
            encoder
                .encode_image(&DynamicImage::ImageRgb8(rgb))
                .expect("jpeg encoding should succeed");
        }
        encoded
    }
}
