use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tile_scan::export::{
    append_json, append_log, default_json_path, default_log_path, format_lines, save_report,
};
use tile_scan::tools::{crop_to_unique_file, load_image, save_annotated};
use tile_scan::{
    Binarize, CoordinateSpace, DedupPolicy, Enhancement, QrDecoder, Region, ScaleMode, ScaleSet,
    ScanConfig, ScanStatus, Scanner, SegmentWidth, TilingPolicy, Tone,
};

#[derive(Parser)]
#[command(name = "tilescan", version, about = "Tiled multi-scale QR code scanner")]
struct Cli {
    /// Log tile-level detail
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan an image and print every distinct code
    Scan(ScanArgs),
    /// Save a region of an image as the next free selected_part_<n>.png
    Crop {
        #[arg(long)]
        image: PathBuf,
        /// Region as left,top,right,bottom
        #[arg(long, value_delimiter = ',')]
        region: Vec<u32>,
        /// Output directory
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Grid,
    Strip,
    Slide,
}

#[derive(Args)]
struct ScanArgs {
    #[arg(long)]
    image: PathBuf,
    /// JSON configuration file; tiling flags below are ignored when set
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum, default_value = "grid")]
    mode: Mode,
    /// Grid columns
    #[arg(long, default_value_t = 8)]
    chunks: u32,
    /// Grid row divisor
    #[arg(long, default_value_t = 5)]
    steps: u32,
    /// Strip width as a percentage of the image width
    #[arg(long, default_value_t = 30.0)]
    segment_percent: f64,
    /// Strip or window width in pixels (overrides --segment-percent)
    #[arg(long)]
    slice_width: Option<u32>,
    /// Overlap: percent for strips, fraction for slide windows
    #[arg(long)]
    overlap: Option<f64>,
    /// Scale factor, repeatable
    #[arg(long = "scale")]
    scales: Vec<f32>,
    #[arg(long)]
    contrast: Option<f32>,
    /// Fixed binarization cutoff
    #[arg(long, conflicts_with = "otsu")]
    threshold: Option<u8>,
    /// Otsu binarization
    #[arg(long)]
    otsu: bool,
    /// Affine gain; enables the affine tone with --beta
    #[arg(long, requires = "beta")]
    alpha: Option<f32>,
    #[arg(long, requires = "alpha")]
    beta: Option<f32>,
    /// Enhance the whole image once per scale, then cut tiles
    #[arg(long)]
    pre_scale: bool,
    /// Merge same-payload hits whose corners are within this many pixels
    #[arg(long)]
    dedup_tolerance: Option<u32>,
    /// Report boxes in scaled pixels instead of source pixels
    #[arg(long)]
    scaled_coords: bool,
    /// Append JSON records (default name when given without a value)
    #[arg(long, num_args = 0..=1)]
    json: Option<Option<PathBuf>>,
    /// Append timestamped log lines (default name when given without a value)
    #[arg(long, num_args = 0..=1)]
    log: Option<Option<PathBuf>>,
    /// Write the run report
    #[arg(long)]
    report: Option<PathBuf>,
    /// Save an annotated copy of the image
    #[arg(long)]
    annotate: Option<PathBuf>,
    /// Decode tiles in parallel
    #[arg(long)]
    parallel: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let result = match cli.command {
        Command::Scan(args) => scan_cmd(&args),
        Command::Crop {
            image,
            region,
            out_dir,
        } => crop_cmd(&image, &region, &out_dir),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn build_config(args: &ScanArgs) -> Result<ScanConfig, String> {
    if let Some(path) = &args.config {
        return ScanConfig::from_json_file(path).map_err(|e| e.to_string());
    }

    let mut config = match args.mode {
        Mode::Grid => ScanConfig::default(),
        Mode::Strip => ScanConfig::strip(),
        Mode::Slide => ScanConfig::slide(),
    };
    config.tiling = match args.mode {
        Mode::Grid => TilingPolicy::Grid {
            horizontal_chunks: args.chunks,
            vertical_steps: args.steps,
        },
        Mode::Strip => TilingPolicy::Strip {
            segment: match args.slice_width {
                Some(px) => SegmentWidth::Pixels(px),
                None => SegmentWidth::Percent(args.segment_percent),
            },
            overlap_percentage: args.overlap.unwrap_or(20.0),
        },
        Mode::Slide => TilingPolicy::Slide {
            window_width: args.slice_width.unwrap_or(10),
            overlap_fraction: args.overlap.unwrap_or(0.2),
        },
    };
    if !args.scales.is_empty() {
        config.scale_factors =
            ScaleSet::new(args.scales.iter().copied()).map_err(|e| e.to_string())?;
    }
    if args.pre_scale {
        config.scale_mode = ScaleMode::PreScaled;
    }

    let binarize = match (args.threshold, args.otsu) {
        (Some(cutoff), _) => Some(Binarize::Fixed(cutoff)),
        (None, true) => Some(Binarize::Otsu),
        (None, false) => config.enhancement.binarize,
    };
    let tone = match (args.alpha, args.beta, args.contrast) {
        (Some(alpha), Some(beta), _) => Tone::Affine { alpha, beta },
        (_, _, Some(factor)) => Tone::Contrast(factor),
        _ => config.enhancement.tone,
    };
    config.enhancement = Enhancement { binarize, tone };

    if let Some(pixels) = args.dedup_tolerance {
        config.dedup = DedupPolicy::Tolerance { pixels };
    }
    if args.scaled_coords {
        config.coordinates = CoordinateSpace::Scaled;
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn scan_cmd(args: &ScanArgs) -> Result<(), String> {
    let config = build_config(args)?;
    let image = load_image(&args.image).map_err(|e| e.to_string())?;
    let scanner = Scanner::with_config(config)
        .decoder(QrDecoder::new())
        .parallel(args.parallel);

    let start = Instant::now();
    let report = scanner.scan(&image).map_err(|e| e.to_string())?;
    let elapsed = start.elapsed();

    println!(
        "Image: {} ({}x{})",
        args.image.display(),
        report.image_size.width,
        report.image_size.height
    );
    match report.status() {
        ScanStatus::NoCodesFound => println!("No codes found"),
        ScanStatus::Cancelled { found } => println!("Scan cancelled after {found} code(s)"),
        ScanStatus::Found(n) => {
            println!("Found {n} code(s)");
            for line in format_lines(&report.results) {
                println!("  {line}");
            }
            for (payload, hits) in report.results.hit_counts() {
                println!("  {payload}: {hits} hit(s)");
            }
        }
    }
    println!(
        "Scanned {} region(s), {} failed tile(s), in {:.2?}",
        report.regions_scanned, report.decode_failures, elapsed
    );

    if let Some(path) = resolve(&args.json, || default_json_path(&args.image)) {
        append_json(&path, &report.results).map_err(|e| e.to_string())?;
        println!("Results exported to {}", path.display());
    }
    if let Some(path) = resolve(&args.log, || default_log_path(&args.image)) {
        append_log(&path, &report.results).map_err(|e| e.to_string())?;
        println!("Results exported to {}", path.display());
    }
    if let Some(path) = &args.report {
        save_report(path, &report).map_err(|e| e.to_string())?;
    }
    if let Some(path) = &args.annotate {
        save_annotated(&image, &report.results, path).map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn resolve(flag: &Option<Option<PathBuf>>, default: impl FnOnce() -> PathBuf) -> Option<PathBuf> {
    match flag {
        Some(Some(path)) => Some(path.clone()),
        Some(None) => Some(default()),
        None => None,
    }
}

fn crop_cmd(image: &Path, region: &[u32], out_dir: &Path) -> Result<(), String> {
    let [left, top, right, bottom] = region else {
        return Err("--region needs left,top,right,bottom".to_string());
    };
    let img = load_image(image).map_err(|e| e.to_string())?;
    let path = crop_to_unique_file(&img, &Region::new(*left, *top, *right, *bottom), out_dir)
        .map_err(|e| e.to_string())?;
    println!("Saved region to {}", path.display());
    Ok(())
}
