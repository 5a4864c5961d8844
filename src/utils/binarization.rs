use image::GrayImage;
use imageproc::contrast;

/// Map pixels above `cutoff` to white (255) and the rest to black (0)
pub fn threshold(gray: &GrayImage, cutoff: u8) -> GrayImage {
    contrast::threshold(gray, cutoff)
}

/// Binarize with a cutoff chosen by Otsu's method
pub fn otsu_binarize(gray: &GrayImage) -> GrayImage {
    let mut out = gray.clone();
    contrast::threshold_mut(&mut out, otsu_threshold(gray));
    out
}

/// Otsu's optimal cutoff.
///
/// The level belongs to the darker class, so it plugs straight into
/// [`threshold`]'s `p > cutoff` rule.
pub fn otsu_threshold(gray: &GrayImage) -> u8 {
    if gray.as_raw().is_empty() {
        return 127;
    }
    contrast::otsu_level(gray)
}
