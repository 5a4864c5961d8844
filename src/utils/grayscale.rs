/// Luminance conversion
/// Y = 0.299*R + 0.587*G + 0.114*B
/// Uses fast integer arithmetic: Y = (76*R + 150*G + 29*B) >> 8
use image::{DynamicImage, GrayImage};
use rayon::prelude::*;

/// Coefficients for grayscale conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Rasters with at least this many pixels are converted row-parallel
const PARALLEL_MIN_PIXELS: u64 = 1 << 20;

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8).min(255) as u8
}

/// Convert any decoded image to single-channel luminance.
///
/// Gray inputs are copied as-is; alpha is ignored.
pub fn to_luminance(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        DynamicImage::ImageRgb8(rgb) => pack_to_gray(rgb.as_raw(), rgb.width(), rgb.height(), 3),
        DynamicImage::ImageRgba8(rgba) => {
            pack_to_gray(rgba.as_raw(), rgba.width(), rgba.height(), 4)
        }
        other => {
            let rgb = other.to_rgb8();
            pack_to_gray(rgb.as_raw(), rgb.width(), rgb.height(), 3)
        }
    }
}

/// Convert interleaved 3- or 4-channel bytes into a gray raster
fn pack_to_gray(raw: &[u8], width: u32, height: u32, channels: usize) -> GrayImage {
    let row_len = width as usize;
    let mut gray = vec![0u8; row_len * height as usize];
    if row_len == 0 {
        return GrayImage::new(width, height);
    }

    let convert_row = |(y, row): (usize, &mut [u8])| {
        let row_start = y * row_len * channels;
        for (x, out) in row.iter_mut().enumerate() {
            let idx = row_start + x * channels;
            *out = luma(raw[idx], raw[idx + 1], raw[idx + 2]);
        }
    };

    if width as u64 * height as u64 >= PARALLEL_MIN_PIXELS {
        gray.par_chunks_mut(row_len).enumerate().for_each(convert_row);
    } else {
        gray.chunks_mut(row_len).enumerate().for_each(convert_row);
    }

    // Buffer length is width * height by construction
    GrayImage::from_raw(width, height, gray).unwrap_or_else(|| GrayImage::new(width, height))
}

/// Mean luminance rounded to the nearest level; 0 for an empty raster
pub fn mean_luminance(gray: &GrayImage) -> u8 {
    let pixels = gray.as_raw();
    if pixels.is_empty() {
        return 0;
    }
    let sum: u64 = pixels.iter().map(|&p| p as u64).sum();
    ((sum as f64 / pixels.len() as f64) + 0.5).floor().min(255.0) as u8
}
