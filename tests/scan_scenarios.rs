mod common;

use common::{BlobDecoder, PAYLOAD, assert_near, canvas, dynamic, paint_square};
use tile_scan::pipeline::{run_scan, spawn_scan};
use tile_scan::{
    DedupPolicy, Enhancement, ScaleMode, ScaleSet, ScanConfig, ScanEvent, ScanStatus, Scanner,
    SegmentWidth, TilingPolicy, Tone, scan,
};

fn grid(chunks: u32, steps: u32, scales: &[f32]) -> ScanConfig {
    ScanConfig::grid(chunks, steps, ScaleSet::new(scales.iter().copied()).unwrap())
}

fn strips(percent: f64, overlap: f64) -> ScanConfig {
    ScanConfig {
        tiling: TilingPolicy::Strip {
            segment: SegmentWidth::Percent(percent),
            overlap_percentage: overlap,
        },
        ..ScanConfig::strip()
    }
}

#[test]
fn test_code_straddling_grid_rows_is_missed() {
    // 5x2 on 1000x200 cuts rows at y=100, right through a 100px code at y=50
    let mut img = canvas(1000, 200);
    paint_square(&mut img, 50, 50, 100);
    let report = scan(&dynamic(img), &grid(5, 2, &[2.0]), &BlobDecoder::default()).unwrap();
    assert_eq!(report.status(), ScanStatus::NoCodesFound);
    assert_eq!(report.regions_scanned, 10);
    assert_eq!(report.decode_failures, 0);
}

#[test]
fn test_full_height_rows_recover_the_same_code() {
    let mut img = canvas(1000, 200);
    paint_square(&mut img, 50, 50, 100);
    let report = scan(&dynamic(img), &grid(5, 1, &[2.0]), &BlobDecoder::default()).unwrap();
    assert_eq!(report.status(), ScanStatus::Found(1));
    let code = &report.results.entries()[0];
    assert_eq!(code.payload_text(), PAYLOAD);
    assert_eq!(code.symbology, "QRCODE");
    assert_near(code.bbox.left, 50, 1);
    assert_near(code.bbox.top, 50, 1);
    assert_near(code.bbox.width as i32, 100, 2);
    assert_near(code.bbox.height as i32, 100, 2);
}

#[test]
fn test_code_inside_one_tile_is_found_once() {
    let mut img = canvas(1000, 200);
    paint_square(&mut img, 50, 20, 60);
    let report = scan(&dynamic(img), &grid(5, 2, &[2.0]), &BlobDecoder::default()).unwrap();
    assert_eq!(report.results.len(), 1);
    let code = &report.results.entries()[0];
    assert_near(code.bbox.left, 50, 1);
    assert_near(code.bbox.top, 20, 1);
    assert_eq!(code.scale_factor, 2.0);
    assert_eq!(code.region.left, 0);
    assert_eq!(code.region.top, 0);
}

#[test]
fn test_blank_image_reports_no_codes() {
    let image = dynamic(canvas(640, 480));
    let report = scan(&image, &ScanConfig::default(), &BlobDecoder::default()).unwrap();
    assert_eq!(report.status(), ScanStatus::NoCodesFound);
    assert!(report.results.is_empty());
    assert_eq!(report.results.raw_hits(), 0);
}

#[test]
fn test_identical_codes_at_two_positions_are_both_kept() {
    let mut img = canvas(1000, 200);
    paint_square(&mut img, 30, 30, 40);
    paint_square(&mut img, 630, 30, 40);
    let report = scan(&dynamic(img), &grid(5, 2, &[2.0]), &BlobDecoder::default()).unwrap();
    assert_eq!(report.results.len(), 2);
    let keys: Vec<_> = report.results.iter().map(|c| c.key()).collect();
    assert_ne!(keys[0], keys[1]);
    assert!(keys.iter().all(|k| k.payload == PAYLOAD.as_bytes()));
    assert_eq!(report.results.hit_counts(), vec![(PAYLOAD.to_string(), 2)]);
}

#[test]
fn test_strips_without_overlap_are_each_scanned_once() {
    let mut img = canvas(500, 100);
    paint_square(&mut img, 230, 30, 40);
    let report = scan(&dynamic(img), &strips(20.0, 0.0), &BlobDecoder::default()).unwrap();

    let spans: Vec<(u32, u32)> = report
        .events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::RegionDecoded { region, .. } => Some((region.left, region.right)),
            _ => None,
        })
        .collect();
    assert_eq!(spans, vec![(0, 100), (100, 200), (200, 300), (300, 400), (400, 500)]);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results.raw_hits(), 1);
}

#[test]
fn test_overlapping_strips_collapse_the_shared_code() {
    // 150px strips stepping by 120px; a code at x=125..145 sits in the first two
    let mut img = canvas(500, 100);
    paint_square(&mut img, 125, 40, 20);
    let report = scan(&dynamic(img), &strips(30.0, 20.0), &BlobDecoder::default()).unwrap();
    assert_eq!(report.results.raw_hits(), 2);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results.entries()[0].region.left, 0);
    assert!(report
        .events
        .iter()
        .any(|e| matches!(e, ScanEvent::DuplicateSkipped { .. })));
}

#[test]
fn test_small_code_needs_upscaling() {
    let mut img = canvas(1000, 200);
    paint_square(&mut img, 60, 30, 20);
    let decoder = BlobDecoder {
        min_side: 30,
        ..BlobDecoder::default()
    };

    let native = scan(&dynamic(img.clone()), &grid(5, 2, &[1.0]), &decoder).unwrap();
    assert_eq!(native.status(), ScanStatus::NoCodesFound);

    let upscaled = scan(&dynamic(img), &grid(5, 2, &[1.0, 2.0]), &decoder).unwrap();
    assert_eq!(upscaled.status(), ScanStatus::Found(1));
    assert_eq!(upscaled.results.entries()[0].scale_factor, 2.0);
}

#[test]
fn test_repeated_scans_are_identical() {
    let mut img = canvas(800, 300);
    paint_square(&mut img, 40, 40, 30);
    paint_square(&mut img, 420, 130, 50);
    let image = dynamic(img);
    let config = grid(4, 3, &[2.0, 4.0]);
    let first = scan(&image, &config, &BlobDecoder::default()).unwrap();
    let second = scan(&image, &config, &BlobDecoder::default()).unwrap();
    assert_eq!(first.results, second.results);
    assert_eq!(first.events, second.events);
}

#[test]
fn test_merging_two_policies_is_a_superset() {
    let mut img = canvas(1000, 200);
    paint_square(&mut img, 50, 20, 60);
    paint_square(&mut img, 50, 120, 50);
    paint_square(&mut img, 620, 30, 40);
    let image = dynamic(img);

    let mut by_grid = grid(5, 2, &[2.0]);
    by_grid.dedup = DedupPolicy::Tolerance { pixels: 2 };
    let mut by_strip = strips(25.0, 20.0);
    by_strip.dedup = DedupPolicy::Tolerance { pixels: 2 };

    let a = scan(&image, &by_grid, &BlobDecoder::default()).unwrap().results;
    let b = scan(&image, &by_strip, &BlobDecoder::default()).unwrap().results;
    let mut merged = a.clone();
    merged.merge(&b);

    assert!(merged.len() >= a.len().max(b.len()));
    assert!(merged.len() <= a.len() + b.len());
    assert_eq!(merged.len(), 3);
    assert_eq!(merged.raw_hits(), a.raw_hits() + b.raw_hits());

    let mut again = merged.clone();
    again.merge(&b);
    assert_eq!(again.len(), merged.len());
}

#[test]
fn test_pre_scaled_matches_per_tile() {
    let mut img = canvas(500, 100);
    paint_square(&mut img, 230, 30, 40);
    let image = dynamic(img);

    let per_tile = strips(20.0, 0.0);
    let pre_scaled = ScanConfig {
        scale_mode: ScaleMode::PreScaled,
        ..per_tile.clone()
    };
    let a = scan(&image, &per_tile, &BlobDecoder::default()).unwrap();
    let b = scan(&image, &pre_scaled, &BlobDecoder::default()).unwrap();
    assert_eq!(a.results.len(), 1);
    assert_eq!(b.results.len(), 1);
    let (ra, rb) = (a.results.entries()[0].bbox, b.results.entries()[0].bbox);
    assert_near(ra.left, rb.left, 1);
    assert_near(ra.top, rb.top, 1);
}

#[test]
fn test_pre_scaled_slide_with_affine_tone() {
    let mut img = canvas(500, 100);
    paint_square(&mut img, 230, 30, 40);
    let config = ScanConfig {
        tiling: TilingPolicy::Slide {
            window_width: 120,
            overlap_fraction: 0.5,
        },
        ..ScanConfig::slide()
    };
    assert_eq!(config.scale_mode, ScaleMode::PreScaled);
    assert_eq!(
        config.enhancement,
        Enhancement {
            binarize: None,
            tone: Tone::Affine {
                alpha: 1.5,
                beta: 50.0
            },
        }
    );
    let report = scan(&dynamic(img), &config, &BlobDecoder::default()).unwrap();
    assert_eq!(report.results.len(), 1);
    let code = &report.results.entries()[0];
    assert_near(code.bbox.left, 230, 1);
    assert_eq!(code.region.left, 180);
}

#[test]
fn test_parallel_scanner_matches_sequential() {
    let mut img = canvas(800, 300);
    paint_square(&mut img, 40, 40, 30);
    paint_square(&mut img, 420, 130, 50);
    let image = dynamic(img);
    let config = grid(4, 3, &[2.0, 4.0]);

    let sequential = Scanner::with_config(config.clone())
        .decoder(BlobDecoder::default())
        .scan(&image)
        .unwrap();
    let parallel = Scanner::with_config(config)
        .decoder(BlobDecoder::default())
        .parallel(true)
        .scan(&image)
        .unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn test_background_scan_matches_foreground() {
    let mut img = canvas(600, 200);
    paint_square(&mut img, 250, 30, 40);
    let config = grid(3, 2, &[2.0]);
    let foreground = run_scan(&img, &config, &BlobDecoder::default(), None).unwrap();
    let task = spawn_scan(img, config, BlobDecoder::default());
    let background = task.join().unwrap().unwrap();
    assert_eq!(foreground, background);
    assert!(!background.cancelled);
}
