use super::Region;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer bounding box: `(left, top)` corner plus extent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelRect {
    /// Left edge
    pub left: i32,
    /// Top edge
    pub top: i32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl PixelRect {
    /// Create a new rectangle
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Smallest rectangle containing every point (inclusive corners)
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (i32, i32)>,
    {
        let mut iter = points.into_iter();
        let (x0, y0) = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (x0, y0, x0, y0);
        for (x, y) in iter {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(Self::new(
            min_x,
            min_y,
            (max_x - min_x) as u32,
            (max_y - min_y) as u32,
        ))
    }

    /// Right edge (exclusive)
    pub fn right(&self) -> i64 {
        self.left as i64 + self.width as i64
    }

    /// Bottom edge (exclusive)
    pub fn bottom(&self) -> i64 {
        self.top as i64 + self.height as i64
    }

    /// True when the two rectangles share at least one pixel
    pub fn overlaps(&self, other: &PixelRect) -> bool {
        (self.left as i64) < other.right()
            && (other.left as i64) < self.right()
            && (self.top as i64) < other.bottom()
            && (other.top as i64) < self.bottom()
    }
}

/// One raw decoder result, in the pixel space of the raster handed to the decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Decoded payload bytes
    pub payload: Vec<u8>,
    /// Symbology label, e.g. `QRCODE` or `CODE128`
    pub symbology: String,
    /// Local bounding box
    pub bbox: PixelRect,
}

impl Detection {
    /// Create a new detection
    pub fn new(payload: impl Into<Vec<u8>>, symbology: impl Into<String>, bbox: PixelRect) -> Self {
        Self {
            payload: payload.into(),
            symbology: symbology.into(),
            bbox,
        }
    }
}

/// A detection remapped into run coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalDetection {
    /// Decoded payload bytes
    pub payload: Vec<u8>,
    /// Symbology label
    pub symbology: String,
    /// Bounding box in the run's coordinate space
    pub bbox: PixelRect,
    /// Scale factor of the tile that produced the detection
    pub scale_factor: f32,
    /// Source-space region the detection came from
    pub region: Region,
}

impl GlobalDetection {
    /// Payload as text (invalid UTF-8 is replaced)
    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }

    /// Exact dedup key for this detection
    pub fn key(&self) -> DedupKey {
        DedupKey {
            payload: self.payload.clone(),
            left: self.bbox.left,
            top: self.bbox.top,
        }
    }
}

impl fmt::Display for GlobalDetection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Type: {}, Data: {}, Position: Left={} Top={} Width={} Height={}",
            self.symbology,
            self.payload_text(),
            self.bbox.left,
            self.bbox.top,
            self.bbox.width,
            self.bbox.height
        )
    }
}

/// Identity of a physical code instance: payload plus global position
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey {
    /// Raw payload bytes
    pub payload: Vec<u8>,
    /// Global left edge
    pub left: i32,
    /// Global top edge
    pub top: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(payload: &[u8]) -> GlobalDetection {
        GlobalDetection {
            payload: payload.to_vec(),
            symbology: "QRCODE".to_string(),
            bbox: PixelRect::new(50, 60, 100, 90),
            scale_factor: 2.0,
            region: Region::new(0, 0, 200, 100),
        }
    }

    #[test]
    fn test_display_line_format() {
        assert_eq!(
            sample(b"HELLO-001").to_string(),
            "Type: QRCODE, Data: HELLO-001, Position: Left=50 Top=60 Width=100 Height=90"
        );
    }

    #[test]
    fn test_key_uses_payload_and_corner() {
        let key = sample(b"abc").key();
        assert_eq!(key.payload, b"abc");
        assert_eq!((key.left, key.top), (50, 60));
    }

    #[test]
    fn test_key_keeps_binary_payloads_apart() {
        // both render as U+FFFD
        assert_eq!(sample(&[0xff]).payload_text(), sample(&[0xfe]).payload_text());
        assert_ne!(sample(&[0xff]).key(), sample(&[0xfe]).key());
    }

    #[test]
    fn test_payload_text_is_lossy() {
        assert_eq!(sample(&[0x61, 0xff]).payload_text(), "a\u{fffd}");
    }

    #[test]
    fn test_enclosing_rect() {
        let rect = PixelRect::enclosing([(10, 4), (2, 8), (7, 1)]).unwrap();
        assert_eq!(rect, PixelRect::new(2, 1, 8, 7));
        assert!(PixelRect::enclosing(std::iter::empty()).is_none());
    }

    #[test]
    fn test_overlaps() {
        let a = PixelRect::new(0, 0, 10, 10);
        assert!(a.overlaps(&PixelRect::new(9, 9, 5, 5)));
        assert!(!a.overlaps(&PixelRect::new(10, 0, 5, 5)));
    }
}
