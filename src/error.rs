//! Error taxonomy for scans, tile decoding and exports.

use std::path::PathBuf;

/// Precondition failures. A scan that returns one of these produced no results.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Nothing exists at the given path
    #[error("image not found: {}", path.display())]
    ImageNotFound {
        /// Requested image path
        path: PathBuf,
    },
    /// The file exists but could not be decoded as an image
    #[error("failed to read image {}: {source}", path.display())]
    ImageUnreadable {
        /// Image path
        path: PathBuf,
        /// Underlying decode error
        #[source]
        source: image::ImageError,
    },
    /// Zero width or height
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage {
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },
    /// Tiling parameters give no usable step or region
    #[error("invalid tiling policy: {0}")]
    InvalidTiling(String),
    /// Empty, non-finite or non-positive scale factors
    #[error("invalid scale factors: {0}")]
    InvalidScales(String),
    /// Non-finite contrast or affine parameters
    #[error("invalid enhancement: {0}")]
    InvalidEnhancement(String),
    /// Config file could not be read
    #[error("failed to read config {}: {source}", path.display())]
    ConfigIo {
        /// Config path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
    /// Config file is not a valid `ScanConfig`
    #[error("failed to parse config {}: {source}", path.display())]
    ConfigParse {
        /// Config path
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },
}

/// Failure of the decoder on a single enhanced tile.
///
/// The scan loop records these and carries on with zero detections for the tile.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Error reported by the decoder itself
    #[error("decoder backend failed: {0}")]
    Backend(String),
    /// A returned box whose corner lies outside the tile
    #[error("decoder returned a box at ({left}, {top}) outside the {width}x{height} raster")]
    Malformed {
        /// Box left edge
        left: i32,
        /// Box top edge
        top: i32,
        /// Tile width
        width: u32,
        /// Tile height
        height: u32,
    },
    /// The decoder panicked; carries the panic message
    #[error("decoder panicked: {0}")]
    Panicked(String),
}

/// Failure to write an export file. The in-memory results stay valid.
#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    /// Opening or writing the file failed
    #[error("failed to write {}: {source}", path.display())]
    Io {
        /// Output path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
    /// Records could not be serialised
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Encoding or saving an image failed
    #[error("failed to save image {}: {source}", path.display())]
    Image {
        /// Output path
        path: PathBuf,
        /// Underlying encode error
        #[source]
        source: image::ImageError,
    },
}
