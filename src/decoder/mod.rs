//! Decoder boundary
//!
//! The engine treats the optical-code decoder as a black box: hand it a gray
//! raster, get back payloads with local bounding boxes. [`decode_checked`] is
//! the only place the engine calls into a decoder; it turns panics and
//! out-of-raster boxes into [`DecodeError`]s so one bad tile cannot abort a scan.

/// rqrr-backed QR decoder
pub mod qr;

pub use qr::QrDecoder;

use crate::error::DecodeError;
use crate::models::Detection;
use image::GrayImage;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// An optical-code decoder
pub trait Decoder: Send + Sync {
    /// Decode every code visible in `image`.
    ///
    /// Finding nothing is `Ok(vec![])`, not an error.
    fn decode(&self, image: &GrayImage) -> Result<Vec<Detection>, DecodeError>;

    /// Short label used in logs
    fn name(&self) -> &str {
        "decoder"
    }
}

impl<D: Decoder + ?Sized> Decoder for &D {
    fn decode(&self, image: &GrayImage) -> Result<Vec<Detection>, DecodeError> {
        (**self).decode(image)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<D: Decoder + ?Sized> Decoder for Box<D> {
    fn decode(&self, image: &GrayImage) -> Result<Vec<Detection>, DecodeError> {
        (**self).decode(image)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<D: Decoder + ?Sized> Decoder for Arc<D> {
    fn decode(&self, image: &GrayImage) -> Result<Vec<Detection>, DecodeError> {
        (**self).decode(image)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Run `decoder` on one tile, converting panics and malformed boxes into errors
pub fn decode_checked<D: Decoder + ?Sized>(
    decoder: &D,
    image: &GrayImage,
) -> Result<Vec<Detection>, DecodeError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Ok(Vec::new());
    }

    let detections = catch_unwind(AssertUnwindSafe(|| decoder.decode(image)))
        .map_err(|payload| DecodeError::Panicked(panic_message(payload.as_ref())))??;

    for d in &detections {
        let inside = d.bbox.left >= 0
            && d.bbox.top >= 0
            && (d.bbox.left as u32) < width
            && (d.bbox.top as u32) < height;
        if !inside {
            return Err(DecodeError::Malformed {
                left: d.bbox.left,
                top: d.bbox.top,
                width,
                height,
            });
        }
    }
    Ok(detections)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
