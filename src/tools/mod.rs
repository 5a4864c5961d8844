use crate::aggregate::ResultSet;
use crate::error::{ExportError, ScanError};
use crate::models::Region;
use crate::utils::grayscale::to_luminance;
use image::{DynamicImage, GenericImageView, GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};

/// Base name of region crops written by [`crop_to_unique_file`]
pub const CROP_BASE_NAME: &str = "selected_part";

/// Colour of result rectangles drawn by [`annotate`]
pub const ANNOTATION_COLOUR: Rgb<u8> = Rgb([0, 255, 0]);

/// Open an image, separating a missing file from an undecodable one.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage, ScanError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ScanError::ImageNotFound {
            path: path.to_path_buf(),
        });
    }
    let img = image::open(path).map_err(|source| ScanError::ImageUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(ScanError::EmptyImage { width, height });
    }
    Ok(img)
}

/// Open an image and convert it to luminance.
pub fn load_gray<P: AsRef<Path>>(path: P) -> Result<GrayImage, ScanError> {
    load_image(path).map(|img| to_luminance(&img))
}

/// First `<dir>/<base>_<n>.<ext>` (n from 1) that does not exist yet.
pub fn unique_path<P: AsRef<Path>>(dir: P, base: &str, ext: &str) -> PathBuf {
    let dir = dir.as_ref();
    (1usize..)
        .map(|n| dir.join(format!("{base}_{n}.{ext}")))
        .find(|p| !p.exists())
        .unwrap_or_else(|| dir.join(format!("{base}.{ext}")))
}

/// Save `region` of `image` as the next free `selected_part_<n>.png` in `dir`.
///
/// The region is clamped to the image first; returns the written path.
pub fn crop_to_unique_file<P: AsRef<Path>>(
    image: &DynamicImage,
    region: &Region,
    dir: P,
) -> Result<PathBuf, ExportError> {
    let (width, height) = image.dimensions();
    let left = region.left.min(width);
    let top = region.top.min(height);
    let right = region.right.clamp(left, width);
    let bottom = region.bottom.clamp(top, height);
    let crop = image.crop_imm(left, top, right - left, bottom - top);

    let path = unique_path(dir, CROP_BASE_NAME, "png");
    crop.save(&path).map_err(|source| ExportError::Image {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// RGB copy of `image` with a hollow rectangle around every result.
pub fn annotate(image: &DynamicImage, results: &ResultSet) -> RgbImage {
    let mut canvas = image.to_rgb8();
    for code in results {
        let rect = Rect::at(code.bbox.left, code.bbox.top)
            .of_size(code.bbox.width.max(1), code.bbox.height.max(1));
        draw_hollow_rect_mut(&mut canvas, rect, ANNOTATION_COLOUR);
    }
    canvas
}

/// Write [`annotate`]'s output to `path`.
pub fn save_annotated<P: AsRef<Path>>(
    image: &DynamicImage,
    results: &ResultSet,
    path: P,
) -> Result<(), ExportError> {
    let path = path.as_ref();
    annotate(image, results)
        .save(path)
        .map_err(|source| ExportError::Image {
            path: path.to_path_buf(),
            source,
        })
}
