//! Region enhancer
//!
//! Turns a gray raster into something the decoder has a better chance with:
//! optional binarization, a tone adjustment, then a Lanczos resize by the
//! scale factor. Everything here is a pure function of its inputs.

use crate::config::{Binarize, Enhancement, Tone};
use crate::models::{ImageSize, Region};
use crate::utils::binarization::{otsu_binarize, threshold};
use crate::utils::contrast::{adjust_affine, adjust_contrast};
use crate::utils::geometry::TileTransform;
use image::GrayImage;
use image::imageops::{self, FilterType};

/// Binarize, adjust tone and resize a gray raster
pub fn enhance(raster: &GrayImage, scale: f32, enhancement: &Enhancement) -> GrayImage {
    let binarized = match enhancement.binarize {
        Some(Binarize::Fixed(cutoff)) => threshold(raster, cutoff),
        Some(Binarize::Otsu) => otsu_binarize(raster),
        None => raster.clone(),
    };

    let toned = match enhancement.tone {
        Tone::Contrast(factor) => adjust_contrast(&binarized, factor),
        Tone::Affine { alpha, beta } => adjust_affine(&binarized, alpha, beta),
    };

    resize(toned, scale)
}

/// Lanczos resize to `floor(w * scale) x floor(h * scale)`; a factor of 1 is a no-op
pub fn resize(raster: GrayImage, scale: f32) -> GrayImage {
    if scale == 1.0 || raster.width() == 0 || raster.height() == 0 {
        return raster;
    }
    let target = ImageSize::new(raster.width(), raster.height()).scaled(scale);
    imageops::resize(&raster, target.width, target.height, FilterType::Lanczos3)
}

/// Enhanced pixels of one region at one scale, plus the transform back to the source
#[derive(Debug, Clone)]
pub struct EnhancedRegion {
    /// Raster handed to the decoder
    pub image: GrayImage,
    /// Source-space region the tile was derived from
    pub region: Region,
    /// Offset/scale bookkeeping for remapping local boxes
    pub transform: TileTransform,
}

impl EnhancedRegion {
    /// Crop `region` out of the source raster, then enhance and resize the crop
    pub fn crop_then_scale(
        source: &GrayImage,
        region: Region,
        scale: f32,
        enhancement: &Enhancement,
    ) -> Self {
        let crop = crop(source, &region);
        Self {
            image: enhance(&crop, scale, enhancement),
            region,
            transform: TileTransform::crop_then_scale(&region, scale),
        }
    }

    /// Crop the scaled counterpart of `region` out of a raster already enhanced at `scale`
    pub fn scale_then_crop(prescaled: &GrayImage, region: Region, scale: f32) -> Self {
        let bounds = ImageSize::new(prescaled.width(), prescaled.height());
        let scaled = region.scaled(scale, bounds);
        Self {
            image: crop(prescaled, &scaled),
            region,
            transform: TileTransform::scale_then_crop(&scaled, scale),
        }
    }

    /// Scale factor of the tile
    pub fn scale(&self) -> f32 {
        self.transform.scale
    }

    /// Size of the enhanced raster
    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.image.width(), self.image.height())
    }

    /// True when scaling collapsed the tile to nothing
    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }
}

fn crop(raster: &GrayImage, region: &Region) -> GrayImage {
    imageops::crop_imm(
        raster,
        region.left,
        region.top,
        region.width(),
        region.height(),
    )
    .to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn checker(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                Luma([30])
            } else {
                Luma([220])
            }
        })
    }

    #[test]
    fn test_enhance_resizes_by_scale() {
        let out = enhance(&checker(21, 10), 1.5, &Enhancement::default());
        assert_eq!(out.dimensions(), (31, 15));
    }

    #[test]
    fn test_enhance_unit_scale_keeps_size() {
        let src = checker(16, 16);
        let enh = Enhancement {
            binarize: None,
            tone: Tone::Contrast(1.0),
        };
        assert_eq!(enhance(&src, 1.0, &enh), src);
    }

    #[test]
    fn test_enhance_is_deterministic() {
        let src = checker(40, 24);
        let enh = Enhancement {
            binarize: Some(Binarize::Fixed(150)),
            tone: Tone::Contrast(2.0),
        };
        assert_eq!(enhance(&src, 2.0, &enh), enhance(&src, 2.0, &enh));
    }

    #[test]
    fn test_binarize_runs_before_tone() {
        let src = GrayImage::from_raw(2, 1, vec![140, 160]).unwrap();
        let enh = Enhancement {
            binarize: Some(Binarize::Fixed(150)),
            tone: Tone::Affine {
                alpha: 1.0,
                beta: 10.0,
            },
        };
        let out = enhance(&src, 1.0, &enh);
        assert_eq!(out.as_raw(), &vec![10, 255]);
    }

    #[test]
    fn test_crop_then_scale_tile() {
        let src = checker(64, 32);
        let region = Region::new(16, 8, 48, 24);
        let tile = EnhancedRegion::crop_then_scale(&src, region, 2.0, &Enhancement::default());
        assert_eq!(tile.size(), ImageSize::new(64, 32));
        assert_eq!(tile.transform.scaled_offset, (32, 16));
        assert_eq!(tile.scale(), 2.0);
    }

    #[test]
    fn test_scale_then_crop_tile() {
        let prescaled = enhance(&checker(64, 32), 2.0, &Enhancement::default());
        let region = Region::new(16, 8, 48, 24);
        let tile = EnhancedRegion::scale_then_crop(&prescaled, region, 2.0);
        assert_eq!(tile.size(), ImageSize::new(64, 32));
        assert_eq!(tile.transform.scaled_offset, (32, 16));
        assert_eq!(tile.image.get_pixel(0, 0), prescaled.get_pixel(32, 16));
    }

    #[test]
    fn test_scale_then_crop_can_collapse() {
        let prescaled = enhance(&checker(10, 10), 0.25, &Enhancement::default());
        let tile = EnhancedRegion::scale_then_crop(&prescaled, Region::new(1, 0, 2, 10), 0.25);
        assert!(tile.is_empty());
    }
}
