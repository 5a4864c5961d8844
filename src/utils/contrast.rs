//! Tone adjustments on 8-bit gray rasters.

use super::grayscale::mean_luminance;
use image::GrayImage;

/// Linear contrast around the raster's mean luminance.
///
/// `out = mean + factor * (p - mean)`, clamped. A factor of 1.0 is the
/// identity, 0.0 flattens the raster to its mean.
pub fn adjust_contrast(gray: &GrayImage, factor: f32) -> GrayImage {
    let mean = mean_luminance(gray) as f32;
    let lut = build_lut(|p| mean + factor * (p - mean));
    apply_lut(gray, &lut)
}

/// Brightness/contrast affine: `out = |p * alpha + beta|`, saturated to 255
pub fn adjust_affine(gray: &GrayImage, alpha: f32, beta: f32) -> GrayImage {
    let lut = build_lut(|p| (p * alpha + beta).abs());
    apply_lut(gray, &lut)
}

fn build_lut<F: Fn(f32) -> f32>(f: F) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (level, out) in lut.iter_mut().enumerate() {
        *out = f(level as f32).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

fn apply_lut(gray: &GrayImage, lut: &[u8; 256]) -> GrayImage {
    let mut out = gray.clone();
    for p in out.iter_mut() {
        *p = lut[*p as usize];
    }
    out
}
