/// Detections before and after remapping
pub mod detection;
/// Image sizes and regions
pub mod region;

pub use detection::{DedupKey, Detection, GlobalDetection, PixelRect};
pub use region::{ImageSize, Region};
