//! tile_scan - tiled multi-scale barcode and QR code sweeping
//!
//! Large or dense images defeat a single decoder pass: codes are too small,
//! too many, or too low-contrast. This crate partitions the image into
//! overlapping regions, enhances and upscales each one, hands it to a decoder
//! and folds everything back into one deduplicated result list in source
//! coordinates.

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Result aggregation and deduplication
pub mod aggregate;
/// Scan configuration (tiling, scales, enhancement, dedup)
pub mod config;
/// Decoder boundary and the rqrr-backed QR decoder
pub mod decoder;
/// Region enhancement (binarize, tone, resize)
pub mod enhance;
/// Error types
pub mod error;
/// Text, JSON and log exports
pub mod export;
/// Core data structures (Region, Detection, GlobalDetection, etc.)
pub mod models;
/// Region partitioning
pub mod partition;
/// Scan loop, events and background tasks
pub mod pipeline;
/// Image loading, crop export and annotation helpers
pub mod tools;
/// Utility functions (grayscale, binarization, contrast, geometry)
pub mod utils;

pub use aggregate::ResultSet;
pub use config::{
    Binarize, CoordinateSpace, DedupPolicy, Enhancement, ScaleMode, ScaleSet, ScanConfig,
    SegmentWidth, TilingPolicy, Tone,
};
pub use decoder::{Decoder, QrDecoder};
pub use error::{DecodeError, ExportError, ScanError};
pub use models::{DedupKey, Detection, GlobalDetection, ImageSize, PixelRect, Region};
pub use pipeline::{CancelToken, ScanEvent, ScanReport, ScanStatus, ScanTask};

use image::DynamicImage;
use std::path::Path;
use utils::grayscale::to_luminance;

/// Scan an image with `config` and `decoder`
///
/// # Arguments
/// * `image` - Source image, any colour type
/// * `config` - Tiling, scales, enhancement and dedup settings
/// * `decoder` - Decoder run on every enhanced tile
///
/// # Returns
/// The scan report, or a precondition error before any region is scanned
pub fn scan<D: Decoder + ?Sized>(
    image: &DynamicImage,
    config: &ScanConfig,
    decoder: &D,
) -> Result<ScanReport, ScanError> {
    let gray = to_luminance(image);
    pipeline::run_scan(&gray, config, decoder, None)
}

/// Scan a QR code image file with `config`
///
/// A missing or unreadable file fails before partitioning.
pub fn scan_path<P: AsRef<Path>>(path: P, config: &ScanConfig) -> Result<ScanReport, ScanError> {
    let image = tools::load_image(path)?;
    scan(&image, config, &QrDecoder::new())
}

/// Reusable scanner holding a configuration and a decoder
pub struct Scanner {
    config: ScanConfig,
    decoder: Box<dyn Decoder>,
    parallel: bool,
}

impl Scanner {
    /// Create a scanner with the default configuration and QR decoder
    pub fn new() -> Self {
        Self::with_config(ScanConfig::default())
    }

    /// Create a scanner with a specific configuration
    pub fn with_config(config: ScanConfig) -> Self {
        Self {
            config,
            decoder: Box::new(QrDecoder::new()),
            parallel: false,
        }
    }

    /// Replace the decoder
    pub fn decoder<D: Decoder + 'static>(mut self, decoder: D) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Decode tiles on the rayon pool
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Current configuration
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan an image
    pub fn scan(&self, image: &DynamicImage) -> Result<ScanReport, ScanError> {
        self.scan_cancellable(image, None)
    }

    /// Scan an image, stopping between regions once `cancel` fires
    pub fn scan_cancellable(
        &self,
        image: &DynamicImage,
        cancel: Option<&CancelToken>,
    ) -> Result<ScanReport, ScanError> {
        let gray = to_luminance(image);
        if self.parallel {
            pipeline::run_scan_parallel(&gray, &self.config, &self.decoder, cancel)
        } else {
            pipeline::run_scan(&gray, &self.config, &self.decoder, cancel)
        }
    }

    /// Load and scan an image file
    pub fn scan_path<P: AsRef<Path>>(&self, path: P) -> Result<ScanReport, ScanError> {
        let image = tools::load_image(path)?;
        self.scan(&image)
    }

    /// Deduplicated results only
    pub fn scan_results(&self, image: &DynamicImage) -> Result<ResultSet, ScanError> {
        self.scan(image).map(|report| report.results)
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}
