//! Partitioner: turns an image size and a tiling policy into candidate regions
//!
//! The sequence is lazy, finite and restartable (`Regions` is `Clone`), and a
//! pure function of its inputs. Grid mode lets the last column absorb the
//! horizontal remainder and clamps the last row to the image height. Strip
//! and slide modes sweep full-height windows left to right and stop as soon
//! as a window's right edge reaches the image width.

use crate::config::{SegmentWidth, TilingPolicy, slide_step};
use crate::error::ScanError;
use crate::models::{ImageSize, Region};

/// Lazily enumerated regions of one image
#[derive(Debug, Clone)]
pub struct Regions {
    size: ImageSize,
    layout: Layout,
    cursor: Cursor,
    remaining: usize,
}

#[derive(Debug, Clone, Copy)]
enum Layout {
    Grid {
        chunks: u32,
        chunk_width: u32,
        step_height: u32,
    },
    Sweep {
        segment_width: u32,
        step: u32,
    },
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    left: u32,
    top: u32,
    column: u32,
}

/// Enumerate the regions `policy` produces on an image of `size`.
///
/// Fails when the image is empty or the policy would produce a zero-sized
/// step (chunk wider than the image, overlap that never advances, ...).
pub fn partition(size: ImageSize, policy: &TilingPolicy) -> Result<Regions, ScanError> {
    if size.width == 0 || size.height == 0 {
        return Err(ScanError::EmptyImage {
            width: size.width,
            height: size.height,
        });
    }
    policy.validate()?;

    let layout = match *policy {
        TilingPolicy::Grid {
            horizontal_chunks,
            vertical_steps,
        } => {
            let chunk_width = size.width / horizontal_chunks;
            let step_height = size.height / vertical_steps;
            if chunk_width == 0 || step_height == 0 {
                return Err(ScanError::InvalidTiling(format!(
                    "{horizontal_chunks}x{vertical_steps} grid is too fine for a {}x{} image",
                    size.width, size.height
                )));
            }
            Layout::Grid {
                chunks: horizontal_chunks,
                chunk_width,
                step_height,
            }
        }
        TilingPolicy::Strip {
            segment,
            overlap_percentage,
        } => {
            let segment_width = match segment {
                SegmentWidth::Percent(p) => (size.width as f64 * p / 100.0).floor() as u32,
                SegmentWidth::Pixels(px) => px,
            };
            if segment_width == 0 {
                return Err(ScanError::InvalidTiling(format!(
                    "segment width rounds to zero on a {}px wide image",
                    size.width
                )));
            }
            let overlap_width = (segment_width as f64 * overlap_percentage / 100.0).floor() as u32;
            sweep(segment_width, segment_width.saturating_sub(overlap_width))?
        }
        TilingPolicy::Slide {
            window_width,
            overlap_fraction,
        } => sweep(window_width, slide_step(window_width, overlap_fraction))?,
    };

    let remaining = region_count(size, layout);
    Ok(Regions {
        size,
        layout,
        cursor: Cursor {
            left: 0,
            top: 0,
            column: 0,
        },
        remaining,
    })
}

fn sweep(segment_width: u32, step: u32) -> Result<Layout, ScanError> {
    if step == 0 {
        return Err(ScanError::InvalidTiling(format!(
            "a {segment_width}px window with this overlap never advances"
        )));
    }
    Ok(Layout::Sweep {
        segment_width,
        step,
    })
}

fn region_count(size: ImageSize, layout: Layout) -> usize {
    match layout {
        Layout::Grid {
            chunks,
            step_height,
            ..
        } => size.height.div_ceil(step_height) as usize * chunks as usize,
        Layout::Sweep {
            segment_width,
            step,
        } => {
            if segment_width >= size.width {
                1
            } else {
                1 + (size.width - segment_width).div_ceil(step) as usize
            }
        }
    }
}

impl Regions {
    /// Size of the partitioned image
    pub fn image_size(&self) -> ImageSize {
        self.size
    }

    /// Horizontal advance between consecutive windows (sweep layouts only)
    pub fn step(&self) -> Option<u32> {
        match self.layout {
            Layout::Sweep { step, .. } => Some(step),
            Layout::Grid { .. } => None,
        }
    }
}

impl Iterator for Regions {
    type Item = Region;

    fn next(&mut self) -> Option<Region> {
        if self.remaining == 0 {
            return None;
        }
        let ImageSize { width, height } = self.size;
        let c = &mut self.cursor;

        let region = match self.layout {
            Layout::Grid {
                chunks,
                chunk_width,
                step_height,
            } => {
                let left = c.column * chunk_width;
                let right = if c.column + 1 < chunks {
                    left + chunk_width
                } else {
                    width
                };
                let bottom = if c.top + step_height < height {
                    c.top + step_height
                } else {
                    height
                };
                let region = Region::new(left, c.top, right, bottom);
                c.column += 1;
                if c.column == chunks {
                    c.column = 0;
                    c.top += step_height;
                }
                region
            }
            Layout::Sweep {
                segment_width,
                step,
            } => {
                let right = c.left.saturating_add(segment_width).min(width);
                let region = Region::new(c.left, 0, right, height);
                c.left += step;
                region
            }
        };

        self.remaining -= 1;
        Some(region)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Regions {}
