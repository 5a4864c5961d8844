use serde::{Deserialize, Serialize};

/// Width and height of a raster in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl ImageSize {
    /// Create a new size
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of pixels
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Size after multiplying both sides by `scale` (floored, never below one pixel)
    pub fn scaled(&self, scale: f32) -> Self {
        Self {
            width: scale_dimension(self.width, scale),
            height: scale_dimension(self.height, scale),
        }
    }
}

fn scale_dimension(value: u32, scale: f32) -> u32 {
    ((value as f64 * scale as f64).floor() as u32).max(1)
}

/// Axis-aligned rectangle in source-image coordinates: `[left, right) x [top, bottom)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    /// Left edge (inclusive)
    pub left: u32,
    /// Top edge (inclusive)
    pub top: u32,
    /// Right edge (exclusive)
    pub right: u32,
    /// Bottom edge (exclusive)
    pub bottom: u32,
}

impl Region {
    /// Create a new region
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Region covering a whole raster
    pub fn full(size: ImageSize) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// True when the region has no pixels
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Check whether pixel `(x, y)` lies inside the region
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// Check whether the region lies within a raster of the given size
    pub fn fits_within(&self, size: ImageSize) -> bool {
        self.left < self.right
            && self.top < self.bottom
            && self.right <= size.width
            && self.bottom <= size.height
    }

    /// Map the region into a raster resized by `scale`.
    ///
    /// Each edge is floored independently, then clamped to `bounds`.
    pub fn scaled(&self, scale: f32, bounds: ImageSize) -> Self {
        let edge = |v: u32, max: u32| ((v as f64 * scale as f64).floor() as u32).min(max);
        Self {
            left: edge(self.left, bounds.width),
            top: edge(self.top, bounds.height),
            right: edge(self.right, bounds.width),
            bottom: edge(self.bottom, bounds.height),
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {})-({}, {})",
            self.left, self.top, self.right, self.bottom
        )
    }
}
