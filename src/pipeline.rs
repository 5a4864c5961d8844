//! Scan loop: partition, enhance, decode, remap, deduplicate
//!
//! Every region is tried at every scale factor, in region order then scale
//! order. Per-tile decoder failures become [`ScanEvent::RegionFailed`] and the
//! loop moves on. The parallel variant decodes tiles on the rayon pool but
//! folds the outcomes back in job order, so it yields the same report as the
//! sequential loop.

use crate::aggregate::ResultSet;
use crate::config::{ScaleMode, ScanConfig};
use crate::decoder::{Decoder, decode_checked};
use crate::enhance::{EnhancedRegion, enhance};
use crate::error::{DecodeError, ScanError};
use crate::models::{DedupKey, Detection, GlobalDetection, ImageSize, Region};
use crate::partition::partition;
use crate::utils::geometry::TileTransform;
use image::GrayImage;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

/// Shared flag checked between regions; cloning shares the flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// New, not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every scan holding this token to stop at the next region boundary
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One record of the scan's diagnostic stream
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    /// The decoder ran on a tile
    RegionDecoded {
        /// Region index in partition order
        index: usize,
        /// Source-space region
        region: Region,
        /// Scale factor of the tile
        scale: f32,
        /// Raw detections the decoder returned
        detections: usize,
    },
    /// The decoder failed on a tile; the tile counts as empty
    RegionFailed {
        /// Region index in partition order
        index: usize,
        /// Source-space region
        region: Region,
        /// Scale factor of the tile
        scale: f32,
        /// What went wrong
        error: DecodeError,
    },
    /// A detection was recorded as a new code
    NewCode {
        /// 1-based position in the result list
        number: usize,
        /// Identity of the code
        key: DedupKey,
    },
    /// A detection matched an already recorded code
    DuplicateSkipped {
        /// Identity of the duplicate
        key: DedupKey,
        /// Scale factor it was seen at
        scale: f32,
    },
    /// The scan stopped before `at_region`
    Cancelled {
        /// First region that was not scanned
        at_region: usize,
    },
}

/// Outcome of a scan: codes found, nothing found, or stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    /// At least one code, with the number of distinct codes
    Found(usize),
    /// The scan completed without finding anything
    NoCodesFound,
    /// A cancel token stopped the scan; `found` codes were recorded before that
    Cancelled {
        /// Distinct codes recorded before the stop
        found: usize,
    },
}

/// Everything a scan produced
#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    /// Deduplicated results in first-seen order
    pub results: ResultSet,
    /// Diagnostic event stream in processing order
    pub events: Vec<ScanEvent>,
    /// Regions whose tiles were all processed
    pub regions_scanned: usize,
    /// Tiles the decoder failed on
    pub decode_failures: usize,
    /// True when a cancel token stopped the scan early
    pub cancelled: bool,
    /// Size of the scanned image
    pub image_size: ImageSize,
}

impl ScanReport {
    fn new(config: &ScanConfig, image_size: ImageSize) -> Self {
        Self {
            results: ResultSet::new(config.dedup),
            events: Vec::new(),
            regions_scanned: 0,
            decode_failures: 0,
            cancelled: false,
            image_size,
        }
    }

    /// Found, nothing found, or cancelled
    pub fn status(&self) -> ScanStatus {
        if self.cancelled {
            ScanStatus::Cancelled {
                found: self.results.len(),
            }
        } else if self.results.is_empty() {
            ScanStatus::NoCodesFound
        } else {
            ScanStatus::Found(self.results.len())
        }
    }

    fn absorb(&mut self, config: &ScanConfig, outcome: TileOutcome) {
        let TileOutcome {
            index,
            region,
            transform,
            result,
        } = outcome;
        let scale = transform.scale;

        let detections = match result {
            Ok(detections) => detections,
            Err(error) => {
                warn!("region {index} {region} at scale {scale}: {error}");
                self.decode_failures += 1;
                self.events.push(ScanEvent::RegionFailed {
                    index,
                    region,
                    scale,
                    error,
                });
                return;
            }
        };

        debug!(
            "region {index} {region} at scale {scale}: {} detection(s)",
            detections.len()
        );
        self.events.push(ScanEvent::RegionDecoded {
            index,
            region,
            scale,
            detections: detections.len(),
        });

        for Detection {
            payload,
            symbology,
            bbox,
        } in detections
        {
            let global = GlobalDetection {
                payload,
                symbology,
                bbox: transform.remap(bbox, config.coordinates),
                scale_factor: scale,
                region,
            };
            let key = global.key();
            if self.results.insert(global) {
                self.events.push(ScanEvent::NewCode {
                    number: self.results.len(),
                    key,
                });
            } else {
                self.events.push(ScanEvent::DuplicateSkipped { key, scale });
            }
        }
    }

    fn cancel_at(&mut self, at_region: usize) {
        info!("scan cancelled before region {at_region}");
        self.cancelled = true;
        self.events.push(ScanEvent::Cancelled { at_region });
    }

    fn log_summary(&self) {
        info!(
            "scanned {} region(s) of a {}x{} image: {} code(s), {} raw hit(s), {} failed tile(s)",
            self.regions_scanned,
            self.image_size.width,
            self.image_size.height,
            self.results.len(),
            self.results.raw_hits(),
            self.decode_failures
        );
    }
}

struct TileOutcome {
    index: usize,
    region: Region,
    transform: TileTransform,
    result: Result<Vec<Detection>, DecodeError>,
}

/// Rasters the tiles of one scan are cut from
struct TileSource<'a> {
    gray: &'a GrayImage,
    config: &'a ScanConfig,
    prescaled: Vec<GrayImage>,
}

impl<'a> TileSource<'a> {
    fn new(gray: &'a GrayImage, config: &'a ScanConfig) -> Self {
        let prescaled = match config.scale_mode {
            ScaleMode::PerTile => Vec::new(),
            ScaleMode::PreScaled => config
                .scale_factors
                .factors()
                .iter()
                .map(|&s| enhance(gray, s, &config.enhancement))
                .collect(),
        };
        Self {
            gray,
            config,
            prescaled,
        }
    }

    fn tile(&self, region: Region, scale_index: usize) -> EnhancedRegion {
        let scale = self.config.scale_factors.factors()[scale_index];
        match self.prescaled.get(scale_index) {
            Some(prescaled) => EnhancedRegion::scale_then_crop(prescaled, region, scale),
            None => EnhancedRegion::crop_then_scale(
                self.gray,
                region,
                scale,
                &self.config.enhancement,
            ),
        }
    }

    fn decode<D: Decoder + ?Sized>(
        &self,
        decoder: &D,
        index: usize,
        region: Region,
        scale_index: usize,
    ) -> TileOutcome {
        let tile = self.tile(region, scale_index);
        TileOutcome {
            index,
            region,
            transform: tile.transform,
            result: decode_checked(decoder, &tile.image),
        }
    }
}

/// Scan a gray raster region by region, scale by scale
pub fn run_scan<D: Decoder + ?Sized>(
    gray: &GrayImage,
    config: &ScanConfig,
    decoder: &D,
    cancel: Option<&CancelToken>,
) -> Result<ScanReport, ScanError> {
    config.validate()?;
    let size = ImageSize::new(gray.width(), gray.height());
    let regions = partition(size, &config.tiling)?;
    debug!(
        "{} region(s), {} scale(s), decoder {}",
        regions.len(),
        config.scale_factors.len(),
        decoder.name()
    );

    let source = TileSource::new(gray, config);
    let mut report = ScanReport::new(config, size);
    for (index, region) in regions.enumerate() {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            report.cancel_at(index);
            break;
        }
        for scale_index in 0..config.scale_factors.len() {
            let outcome = source.decode(decoder, index, region, scale_index);
            report.absorb(config, outcome);
        }
        report.regions_scanned += 1;
    }

    report.log_summary();
    Ok(report)
}

/// [`run_scan`] with tiles decoded on the rayon pool.
///
/// Outcomes are folded in region-then-scale order, so the report matches the
/// sequential scan. The cancel token is checked before each tile; the report
/// stops at the first region with a skipped tile.
pub fn run_scan_parallel<D: Decoder + ?Sized>(
    gray: &GrayImage,
    config: &ScanConfig,
    decoder: &D,
    cancel: Option<&CancelToken>,
) -> Result<ScanReport, ScanError> {
    config.validate()?;
    let size = ImageSize::new(gray.width(), gray.height());
    let regions = partition(size, &config.tiling)?;
    let scales = config.scale_factors.len();

    let jobs: Vec<(usize, Region, usize)> = regions
        .enumerate()
        .flat_map(|(index, region)| (0..scales).map(move |s| (index, region, s)))
        .collect();
    debug!(
        "{} tile job(s) on {} thread(s), decoder {}",
        jobs.len(),
        rayon::current_num_threads(),
        decoder.name()
    );

    let source = TileSource::new(gray, config);
    let outcomes: Vec<Option<TileOutcome>> = jobs
        .par_iter()
        .map(|&(index, region, scale_index)| {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                None
            } else {
                Some(source.decode(decoder, index, region, scale_index))
            }
        })
        .collect();

    let mut report = ScanReport::new(config, size);
    let mut pending: Vec<TileOutcome> = Vec::with_capacity(scales);
    for (&(index, _, scale_index), outcome) in jobs.iter().zip(outcomes) {
        let Some(outcome) = outcome else {
            report.cancel_at(index);
            break;
        };
        pending.push(outcome);
        if scale_index + 1 == scales {
            for outcome in pending.drain(..) {
                report.absorb(config, outcome);
            }
            report.regions_scanned += 1;
        }
    }

    report.log_summary();
    Ok(report)
}

/// A scan running on its own thread
#[derive(Debug)]
pub struct ScanTask {
    handle: JoinHandle<Result<ScanReport, ScanError>>,
    cancel: CancelToken,
}

impl ScanTask {
    /// Request cancellation at the next region boundary
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the scan thread has finished
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the scan; `Err` carries the panic payload of a crashed thread
    pub fn join(self) -> thread::Result<Result<ScanReport, ScanError>> {
        self.handle.join()
    }
}

/// Run [`run_scan`] on a background thread
pub fn spawn_scan<D>(gray: GrayImage, config: ScanConfig, decoder: D) -> ScanTask
where
    D: Decoder + 'static,
{
    let cancel = CancelToken::new();
    let token = cancel.clone();
    let handle = thread::spawn(move || run_scan(&gray, &config, &decoder, Some(&token)));
    ScanTask { handle, cancel }
}
