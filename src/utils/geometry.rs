/// Coordinate remapping between tile, scaled and source pixel spaces
use crate::config::CoordinateSpace;
use crate::models::{PixelRect, Region};

/// Placement of an enhanced tile relative to the source image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileTransform {
    /// Tile offset in scaled pixels
    pub scaled_offset: (u32, u32),
    /// Tile offset in source pixels (fractional when cropped after scaling)
    pub source_offset: (f64, f64),
    /// Scale factor of the tile
    pub scale: f32,
}

impl TileTransform {
    /// Tile cropped from the source, then resized by `scale`.
    ///
    /// The scaled offset is `floor(offset * scale)`.
    pub fn crop_then_scale(region: &Region, scale: f32) -> Self {
        let s = scale as f64;
        Self {
            scaled_offset: (
                (region.left as f64 * s).floor() as u32,
                (region.top as f64 * s).floor() as u32,
            ),
            source_offset: (region.left as f64, region.top as f64),
            scale,
        }
    }

    /// Tile cropped at `scaled_region` out of a raster already resized by `scale`
    pub fn scale_then_crop(scaled_region: &Region, scale: f32) -> Self {
        let s = scale as f64;
        Self {
            scaled_offset: (scaled_region.left, scaled_region.top),
            source_offset: (scaled_region.left as f64 / s, scaled_region.top as f64 / s),
            scale,
        }
    }

    /// Local box offset into scaled space; the extent is kept as reported
    pub fn to_scaled(&self, local: PixelRect) -> PixelRect {
        PixelRect::new(
            saturating_i32(self.scaled_offset.0 as i64 + local.left as i64),
            saturating_i32(self.scaled_offset.1 as i64 + local.top as i64),
            local.width,
            local.height,
        )
    }

    /// Local box divided back into source-resolution pixels, rounded to nearest
    pub fn to_source(&self, local: PixelRect) -> PixelRect {
        let s = self.scale as f64;
        let left = self.source_offset.0 + local.left as f64 / s;
        let top = self.source_offset.1 + local.top as f64 / s;
        PixelRect::new(
            saturating_i32(left.round() as i64),
            saturating_i32(top.round() as i64),
            (local.width as f64 / s).round() as u32,
            (local.height as f64 / s).round() as u32,
        )
    }

    /// Remap into the requested space
    pub fn remap(&self, local: PixelRect, space: CoordinateSpace) -> PixelRect {
        match space {
            CoordinateSpace::Source => self.to_source(local),
            CoordinateSpace::Scaled => self.to_scaled(local),
        }
    }
}

fn saturating_i32(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
