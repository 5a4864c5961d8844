#![allow(dead_code)]

use image::{DynamicImage, GrayImage, Luma};
use std::collections::VecDeque;
use tile_scan::{DecodeError, Decoder, Detection, PixelRect};

pub const PAYLOAD: &str = "HELLO-001";

/// Treats every dark 4-connected blob as one code.
///
/// Blobs touching the raster border are clipped codes and are rejected, as are
/// blobs narrower or shorter than `min_side` pixels.
pub struct BlobDecoder {
    pub payload: &'static str,
    pub min_side: u32,
}

impl Default for BlobDecoder {
    fn default() -> Self {
        Self {
            payload: PAYLOAD,
            min_side: 8,
        }
    }
}

impl Decoder for BlobDecoder {
    fn decode(&self, image: &GrayImage) -> Result<Vec<Detection>, DecodeError> {
        let (width, height) = image.dimensions();
        let mut seen = vec![false; (width * height) as usize];
        let mut found = Vec::new();

        for y in 0..height {
            for x in 0..width {
                let idx = (y * width + x) as usize;
                if seen[idx] || image.get_pixel(x, y)[0] >= 128 {
                    continue;
                }
                let (mut min_x, mut min_y, mut max_x, mut max_y) = (x, y, x, y);
                let mut queue = VecDeque::from([(x, y)]);
                seen[idx] = true;
                while let Some((cx, cy)) = queue.pop_front() {
                    min_x = min_x.min(cx);
                    min_y = min_y.min(cy);
                    max_x = max_x.max(cx);
                    max_y = max_y.max(cy);
                    let neighbours = [
                        (cx.wrapping_sub(1), cy),
                        (cx + 1, cy),
                        (cx, cy.wrapping_sub(1)),
                        (cx, cy + 1),
                    ];
                    for (nx, ny) in neighbours {
                        if nx >= width || ny >= height {
                            continue;
                        }
                        let n = (ny * width + nx) as usize;
                        if !seen[n] && image.get_pixel(nx, ny)[0] < 128 {
                            seen[n] = true;
                            queue.push_back((nx, ny));
                        }
                    }
                }

                let clipped = min_x == 0 || min_y == 0 || max_x == width - 1 || max_y == height - 1;
                let (w, h) = (max_x - min_x + 1, max_y - min_y + 1);
                if clipped || w < self.min_side || h < self.min_side {
                    continue;
                }
                found.push(Detection::new(
                    self.payload.as_bytes().to_vec(),
                    "QRCODE",
                    PixelRect::new(min_x as i32, min_y as i32, w, h),
                ));
            }
        }
        Ok(found)
    }

    fn name(&self) -> &str {
        "blob"
    }
}

/// White raster
pub fn canvas(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([255]))
}

/// Paint a solid black square
pub fn paint_square(img: &mut GrayImage, left: u32, top: u32, side: u32) {
    for y in top..top + side {
        for x in left..left + side {
            img.put_pixel(x, y, Luma([0]));
        }
    }
}

/// Render `payload` as a QR code filling a `footprint` square at (left, top),
/// two modules of quiet zone included.
///
/// Returns the symbol's own box (quiet zone excluded).
pub fn render_qr(
    img: &mut GrayImage,
    payload: &str,
    left: u32,
    top: u32,
    footprint: u32,
) -> PixelRect {
    let qr = qrcode::QrCode::new(payload.as_bytes()).unwrap();
    let modules = qr.width() as u32;
    let module = footprint / (modules + 4);
    assert!(module >= 1, "footprint too small for the symbol");
    let origin_x = left + 2 * module;
    let origin_y = top + 2 * module;
    for y in 0..modules {
        for x in 0..modules {
            if qr[(x as usize, y as usize)] == qrcode::Color::Dark {
                for dy in 0..module {
                    for dx in 0..module {
                        let (px, py) = (origin_x + x * module + dx, origin_y + y * module + dy);
                        img.put_pixel(px, py, Luma([0]));
                    }
                }
            }
        }
    }
    PixelRect::new(origin_x as i32, origin_y as i32, modules * module, modules * module)
}

pub fn dynamic(gray: GrayImage) -> DynamicImage {
    DynamicImage::ImageLuma8(gray)
}

pub fn assert_near(actual: i32, expected: i32, tolerance: i32) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "{actual} is not within {tolerance} of {expected}"
    );
}
