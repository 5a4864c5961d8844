//! Scan configuration
//!
//! Every parameter the engine accepts lives in [`ScanConfig`]:
//! - tiling policy (grid, strip or sliding window)
//! - ordered scale factors and where scaling happens (per tile or once up front)
//! - enhancement (optional binarization plus a tone adjustment)
//! - dedup policy and the coordinate space results are reported in

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the source image is partitioned into candidate regions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TilingPolicy {
    /// `horizontal_chunks` columns by rows of `height / vertical_steps` pixels
    Grid {
        /// Number of columns
        horizontal_chunks: u32,
        /// Row count divisor
        vertical_steps: u32,
    },
    /// Full-height strips overlapping by a percentage of the segment width
    Strip {
        /// Strip width
        segment: SegmentWidth,
        /// Overlap between consecutive strips, `0 <= overlap < 100`
        overlap_percentage: f64,
    },
    /// Full-height fixed-width window stepping by `window * (1 - overlap_fraction)`
    Slide {
        /// Window width in source pixels
        window_width: u32,
        /// Overlap as a fraction of the window, `0 <= overlap < 1`
        overlap_fraction: f64,
    },
}

/// Width of a strip in [`TilingPolicy::Strip`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentWidth {
    /// Percentage of the image width, floored to whole pixels
    Percent(f64),
    /// Fixed width in pixels
    Pixels(u32),
}

impl TilingPolicy {
    /// Check the parameters that do not depend on image dimensions
    pub fn validate(&self) -> Result<(), ScanError> {
        match *self {
            TilingPolicy::Grid {
                horizontal_chunks,
                vertical_steps,
            } => {
                if horizontal_chunks == 0 || vertical_steps == 0 {
                    return Err(ScanError::InvalidTiling(format!(
                        "grid needs at least one chunk and one step (got {horizontal_chunks}x{vertical_steps})"
                    )));
                }
            }
            TilingPolicy::Strip {
                segment,
                overlap_percentage,
            } => {
                match segment {
                    SegmentWidth::Percent(p) if !(p.is_finite() && p > 0.0 && p <= 100.0) => {
                        return Err(ScanError::InvalidTiling(format!(
                            "segment width percentage must be in (0, 100], got {p}"
                        )));
                    }
                    SegmentWidth::Pixels(0) => {
                        return Err(ScanError::InvalidTiling(
                            "segment width must be at least one pixel".to_string(),
                        ));
                    }
                    _ => {}
                }
                if !(overlap_percentage.is_finite()
                    && (0.0..100.0).contains(&overlap_percentage))
                {
                    return Err(ScanError::InvalidTiling(format!(
                        "overlap percentage must be in [0, 100), got {overlap_percentage}"
                    )));
                }
            }
            TilingPolicy::Slide {
                window_width,
                overlap_fraction,
            } => {
                if window_width == 0 {
                    return Err(ScanError::InvalidTiling(
                        "window width must be at least one pixel".to_string(),
                    ));
                }
                if !(overlap_fraction.is_finite() && (0.0..1.0).contains(&overlap_fraction)) {
                    return Err(ScanError::InvalidTiling(format!(
                        "overlap fraction must be in [0, 1), got {overlap_fraction}"
                    )));
                }
                if slide_step(window_width, overlap_fraction) == 0 {
                    return Err(ScanError::InvalidTiling(format!(
                        "window of {window_width}px with overlap {overlap_fraction} never advances"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Step of a sliding window: `floor(window * (1 - overlap))`
pub(crate) fn slide_step(window_width: u32, overlap_fraction: f64) -> u32 {
    (window_width as f64 * (1.0 - overlap_fraction)).floor() as u32
}

impl Default for TilingPolicy {
    fn default() -> Self {
        TilingPolicy::Grid {
            horizontal_chunks: 8,
            vertical_steps: 5,
        }
    }
}

/// Ordered set of positive scale factors; repeated factors are dropped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct ScaleSet(Vec<f32>);

impl ScaleSet {
    /// Build a scale set, rejecting empty input and non-positive factors
    pub fn new(factors: impl IntoIterator<Item = f32>) -> Result<Self, ScanError> {
        let mut unique: Vec<f32> = Vec::new();
        for factor in factors {
            if !(factor.is_finite() && factor > 0.0) {
                return Err(ScanError::InvalidScales(format!(
                    "scale factor must be positive and finite, got {factor}"
                )));
            }
            if !unique.contains(&factor) {
                unique.push(factor);
            }
        }
        if unique.is_empty() {
            return Err(ScanError::InvalidScales(
                "at least one scale factor is required".to_string(),
            ));
        }
        Ok(Self(unique))
    }

    /// Single scale factor
    pub fn single(factor: f32) -> Result<Self, ScanError> {
        Self::new([factor])
    }

    /// Factors in configured order
    pub fn factors(&self) -> &[f32] {
        &self.0
    }

    /// Number of factors
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a validated set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<f32>> for ScaleSet {
    type Error = ScanError;

    fn try_from(value: Vec<f32>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ScaleSet> for Vec<f32> {
    fn from(value: ScaleSet) -> Self {
        value.0
    }
}

impl Default for ScaleSet {
    fn default() -> Self {
        Self(vec![2.0, 4.0])
    }
}

/// Where resampling happens relative to cropping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMode {
    /// Crop each region from the source, then enhance and resize the tile
    #[default]
    PerTile,
    /// Enhance and resize the whole image once per factor, then crop scaled regions
    PreScaled,
}

/// Optional binarization applied after luminance conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Binarize {
    /// Pixels above the cutoff become white, the rest black
    Fixed(u8),
    /// Cutoff picked per raster with Otsu's method
    Otsu,
}

/// Tone adjustment applied after binarization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// Linear contrast around the raster's mean luminance
    Contrast(f32),
    /// `out = |in * alpha + beta|`, saturated to 8 bits
    Affine {
        /// Gain
        alpha: f32,
        /// Offset
        beta: f32,
    },
}

impl Default for Tone {
    fn default() -> Self {
        Tone::Contrast(2.0)
    }
}

/// Per-raster enhancement settings
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Enhancement {
    /// Binarization, off by default
    #[serde(default)]
    pub binarize: Option<Binarize>,
    /// Tone adjustment
    #[serde(default)]
    pub tone: Tone,
}

impl Enhancement {
    /// Check that the tone parameters are usable
    pub fn validate(&self) -> Result<(), ScanError> {
        match self.tone {
            Tone::Contrast(factor) if !(factor.is_finite() && factor >= 0.0) => Err(
                ScanError::InvalidEnhancement(format!(
                    "contrast factor must be finite and non-negative, got {factor}"
                )),
            ),
            Tone::Affine { alpha, beta } if !(alpha.is_finite() && beta.is_finite()) => {
                Err(ScanError::InvalidEnhancement(format!(
                    "alpha/beta must be finite, got {alpha}/{beta}"
                )))
            }
            _ => Ok(()),
        }
    }
}

/// When two detections count as the same physical code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Same payload and identical global corner
    #[default]
    Exact,
    /// Same payload and both corner coordinates within `pixels`
    Tolerance {
        /// Maximum per-axis distance
        pixels: u32,
    },
}

/// Coordinate space of reported bounding boxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSpace {
    /// Source-image pixels (boxes divided back by the scale factor)
    #[default]
    Source,
    /// Scaled pixels of the enhanced raster; extents are left unscaled
    Scaled,
}

/// Full configuration of one scan
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Partitioning policy
    pub tiling: TilingPolicy,
    /// Scale factors tried on every region
    pub scale_factors: ScaleSet,
    /// Crop-then-scale or scale-then-crop
    pub scale_mode: ScaleMode,
    /// Enhancement applied before resampling
    pub enhancement: Enhancement,
    /// Duplicate detection rule
    pub dedup: DedupPolicy,
    /// Space of reported boxes
    pub coordinates: CoordinateSpace,
}

impl ScanConfig {
    /// Grid tiling with the default enhancement
    pub fn grid(horizontal_chunks: u32, vertical_steps: u32, scale_factors: ScaleSet) -> Self {
        Self {
            tiling: TilingPolicy::Grid {
                horizontal_chunks,
                vertical_steps,
            },
            scale_factors,
            ..Self::default()
        }
    }

    /// Percentage strips, 30% wide with 20% overlap, at a single scale
    pub fn strip() -> Self {
        Self {
            tiling: TilingPolicy::Strip {
                segment: SegmentWidth::Percent(30.0),
                overlap_percentage: 20.0,
            },
            scale_factors: ScaleSet(vec![2.0]),
            ..Self::default()
        }
    }

    /// Narrow pre-scaled sliding window with a brightness/contrast affine
    pub fn slide() -> Self {
        Self {
            tiling: TilingPolicy::Slide {
                window_width: 10,
                overlap_fraction: 0.2,
            },
            scale_factors: ScaleSet(vec![2.0]),
            scale_mode: ScaleMode::PreScaled,
            enhancement: Enhancement {
                binarize: None,
                tone: Tone::Affine {
                    alpha: 1.5,
                    beta: 50.0,
                },
            },
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ScanError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ScanConfig =
            serde_json::from_str(&raw).map_err(|source| ScanError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every parameter that can be checked without the image
    pub fn validate(&self) -> Result<(), ScanError> {
        self.tiling.validate()?;
        if self.scale_factors.is_empty() {
            return Err(ScanError::InvalidScales(
                "at least one scale factor is required".to_string(),
            ));
        }
        self.enhancement.validate()
    }
}
