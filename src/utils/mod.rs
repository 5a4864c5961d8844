//! Raster primitives the region enhancer composes
//!
//! - Luminance conversion (RGB/RGBA to 8-bit gray)
//! - Binarization (fixed cutoff and Otsu's method)
//! - Tone adjustment (mean-centred contrast, affine brightness/contrast)
//! - Geometry (remapping boxes between tile, scaled and source space)

/// Fixed-cutoff and Otsu binarization
pub mod binarization;
/// Contrast and affine tone adjustment
pub mod contrast;
/// Tile-to-image coordinate remapping
pub mod geometry;
/// Luminance conversion
pub mod grayscale;
