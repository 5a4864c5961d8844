//! Output formats for scan results
//!
//! - one `Type: .., Data: .., Position: ..` line per result
//! - JSON record lists appended to a file
//! - timestamped append-only text log
//! - the run report with per-tile and per-code blocks

use crate::aggregate::ResultSet;
use crate::error::ExportError;
use crate::models::GlobalDetection;
use crate::pipeline::{ScanEvent, ScanReport};
use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Timestamp layout of log lines
pub const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One exported result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Symbology label
    #[serde(rename = "type")]
    pub symbology: String,
    /// Payload as text
    pub data: String,
    /// Bounding box
    pub position: Position,
}

/// Bounding box of an exported result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Left edge
    pub left: i32,
    /// Top edge
    pub top: i32,
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

impl From<&GlobalDetection> for ExportRecord {
    fn from(d: &GlobalDetection) -> Self {
        Self {
            symbology: d.symbology.clone(),
            data: d.payload_text(),
            position: Position {
                left: d.bbox.left,
                top: d.bbox.top,
                width: d.bbox.width,
                height: d.bbox.height,
            },
        }
    }
}

/// Results as export records, in first-seen order
pub fn to_records(results: &ResultSet) -> Vec<ExportRecord> {
    results.iter().map(ExportRecord::from).collect()
}

/// One display line per result
pub fn format_lines(results: &ResultSet) -> Vec<String> {
    results.iter().map(ToString::to_string).collect()
}

/// Pretty JSON array of the records, four-space indented
pub fn to_json(results: &ResultSet) -> Result<String, ExportError> {
    let records = to_records(results);
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut ser)?;
    // serde_json only emits UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Append the records as one JSON array plus a newline
pub fn append_json<P: AsRef<Path>>(path: P, results: &ResultSet) -> Result<(), ExportError> {
    let path = path.as_ref();
    let mut json = to_json(results)?;
    json.push('\n');
    append(path, json.as_bytes())
}

/// Append one timestamped line per result, stamped with the local time
pub fn append_log<P: AsRef<Path>>(path: P, results: &ResultSet) -> Result<(), ExportError> {
    append_log_at(path, results, &Local::now())
}

/// Append one line per result stamped with `time`
pub fn append_log_at<P, Tz>(
    path: P,
    results: &ResultSet,
    time: &DateTime<Tz>,
) -> Result<(), ExportError>
where
    P: AsRef<Path>,
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let stamp = time.format(LOG_TIME_FORMAT).to_string();
    let mut out = String::new();
    for line in format_lines(results) {
        out.push_str(&format!("[{stamp}] {line}\n"));
    }
    append(path.as_ref(), out.as_bytes())
}

fn append(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;
    file.write_all(bytes).map_err(io_err)
}

/// Human-readable run report.
///
/// Tiles that yielded detections get a `Detected N objects` line, every
/// distinct code gets a numbered block, and a total closes the report.
pub fn write_report<W: Write>(out: &mut W, report: &ScanReport) -> io::Result<()> {
    for event in &report.events {
        match event {
            ScanEvent::RegionDecoded {
                region, detections, ..
            } if *detections > 0 => {
                writeln!(
                    out,
                    "Detected {detections} objects in the chunk from {} to {}.",
                    region.left, region.right
                )?;
            }
            ScanEvent::NewCode { number, .. } => {
                if let Some(code) = report.results.entries().get(number - 1) {
                    write_code_block(out, *number, code)?;
                }
            }
            _ => {}
        }
    }
    writeln!(
        out,
        "Total number of barcodes/QRCodes detected: {}",
        report.results.len()
    )
}

fn write_code_block<W: Write>(
    out: &mut W,
    number: usize,
    code: &GlobalDetection,
) -> io::Result<()> {
    writeln!(out, "Barcode/Qrcode #{number}:")?;
    writeln!(out, "Type: {}", code.symbology)?;
    writeln!(out, "Data: {}", code.payload_text())?;
    writeln!(
        out,
        "Position: Left={}, Top={}, Width={}, Height={}",
        code.bbox.left, code.bbox.top, code.bbox.width, code.bbox.height
    )?;
    writeln!(out, "{}", "-".repeat(30))
}

/// Write the run report to a file, replacing it
pub fn save_report<P: AsRef<Path>>(path: P, report: &ScanReport) -> Result<(), ExportError> {
    let path = path.as_ref();
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = io::BufWriter::new(std::fs::File::create(path).map_err(io_err)?);
    write_report(&mut file, report).map_err(io_err)?;
    file.flush().map_err(io_err)
}

/// `<dir>/<stem>_results.json` next to the scanned image
pub fn default_json_path<P: AsRef<Path>>(image: P) -> PathBuf {
    sibling_with_suffix(image.as_ref(), "_results.json")
}

/// `<dir>/<stem>_results.txt` next to the scanned image
pub fn default_log_path<P: AsRef<Path>>(image: P) -> PathBuf {
    sibling_with_suffix(image.as_ref(), "_results.txt")
}

fn sibling_with_suffix(image: &Path, suffix: &str) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scan".to_string());
    image.with_file_name(format!("{stem}{suffix}"))
}
