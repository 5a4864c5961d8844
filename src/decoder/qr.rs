use super::Decoder;
use crate::error::DecodeError;
use crate::models::{Detection, PixelRect};
use image::GrayImage;
use log::debug;

/// Symbology label reported for QR codes
pub const QR_SYMBOLOGY: &str = "QRCODE";

/// QR code decoder backed by `rqrr`
#[derive(Debug, Clone, Copy, Default)]
pub struct QrDecoder;

impl QrDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for QrDecoder {
    fn decode(&self, image: &GrayImage) -> Result<Vec<Detection>, DecodeError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
                image.get_pixel(x as u32, y as u32)[0]
            });
        let grids = prepared.detect_grids();

        let mut detections = Vec::with_capacity(grids.len());
        for grid in grids {
            let (_meta, content) = match grid.decode() {
                Ok(decoded) => decoded,
                Err(err) => {
                    debug!("qr grid located but not decoded: {err:?}");
                    continue;
                }
            };
            let corners = grid.bounds.iter().map(|p| (p.x.max(0), p.y.max(0)));
            let Some(bbox) = PixelRect::enclosing(corners) else {
                continue;
            };
            detections.push(Detection::new(content.into_bytes(), QR_SYMBOLOGY, bbox));
        }
        Ok(detections)
    }

    fn name(&self) -> &str {
        "rqrr"
    }
}
