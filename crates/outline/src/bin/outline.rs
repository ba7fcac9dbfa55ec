//! outline CLI: extract a calibrated workpiece outline from a photo.

use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;
use nalgebra::Point2;
use outline::calib::{rectify, RealDistances};
use outline::core::Deadline;
use outline::detect::{detect_image, rgb_view, to_image};
use outline::{DetectionReport, DetectionRequest, Detector, DetectorConfig};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser, Debug)]
#[command(name = "outline")]
#[command(about = "Extract a calibrated workpiece outline from a single photo")]
#[command(version)]
struct Cli {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Real distance between the origin and x-axis markers (or the marker
    /// rectangle width).
    #[arg(long)]
    x_distance: f64,

    /// Real distance between the origin and scale markers (or the marker
    /// rectangle height).
    #[arg(long)]
    y_distance: f64,

    /// Point on the workpiece as `X,Y` pixels. Defaults to the image centre.
    #[arg(long, value_parser = parse_point)]
    seed: Option<Point2<f64>>,

    /// Marker position as `X,Y` pixels; repeat 3 or 4 times. Without it
    /// markers are searched for in the image.
    #[arg(long = "marker", value_parser = parse_point)]
    markers: Vec<Point2<f64>>,

    /// Detector configuration (JSON). Missing fields take defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the detection report (JSON) here instead of stdout.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Write a diagnostic overlay image (enables diagnostics).
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Write a fronto-parallel view of the image in real units.
    #[arg(long)]
    rectified: Option<PathBuf>,

    /// Output pixels per real unit for `--rectified`.
    #[arg(long, default_value = "4.0")]
    px_per_unit: f64,

    /// Override the time budget, milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Emit JSON log lines (requires the `tracing` feature).
    #[arg(long)]
    json_logs: bool,

    /// More log output; repeat for more.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_point(raw: &str) -> Result<Point2<f64>, String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {raw:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("bad coordinate {v:?}: {e}"))
    };
    Ok(Point2::new(parse(x)?, parse(y)?))
}

fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[cfg(feature = "tracing")]
fn init_logging(cli: &Cli) -> CliResult<()> {
    tracing_log::LogTracer::init_with_filter(level_for(cli.verbose))?;
    if !outline::core::init_tracing(cli.json_logs) {
        log::warn!("a tracing subscriber was already installed");
    }
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn init_logging(cli: &Cli) -> CliResult<()> {
    if cli.json_logs {
        eprintln!("--json-logs needs the `tracing` feature; using plain logs");
    }
    outline::core::init_with_level(level_for(cli.verbose))?;
    Ok(())
}

fn load_config(cli: &Cli) -> CliResult<DetectorConfig> {
    let mut config = match &cli.config {
        Some(path) => DetectorConfig::load_json(path).map_err(|e| -> CliError {
            format!("failed to load config {}: {e}", path.display()).into()
        })?,
        None => DetectorConfig::default(),
    };
    if let Some(ms) = cli.timeout_ms {
        config.timeout_budget = ms;
    }
    if cli.overlay.is_some() {
        config.emit_diagnostics = true;
    }
    Ok(config)
}

fn run(cli: &Cli) -> CliResult<()> {
    let config = load_config(cli)?;
    log::info!("loading image {}", cli.image.display());
    let img = image::open(&cli.image)
        .map_err(|e| -> CliError { format!("failed to open image {}: {e}", cli.image.display()).into() })?
        .to_rgb8();
    let (w, h) = (img.width() as usize, img.height() as usize);

    let mut request = DetectionRequest::new(RealDistances::new(cli.x_distance, cli.y_distance));
    if let Some(seed) = cli.seed {
        request = request.with_seed(seed);
    }
    if !cli.markers.is_empty() {
        request = request.with_markers(cli.markers.clone());
    }

    let detector = Detector::new(config);
    let result = detect_image(&detector, &img, &request)?;
    match result.strategy() {
        Some(name) => log::info!("outline found by {name}"),
        None => log::warn!("no outline found, reporting fallback shape"),
    }

    if let Some(path) = &cli.overlay {
        let overlay = result
            .diagnostics()
            .and_then(|d| d.render_overlay(&result.outline().pixels))
            .and_then(|o| to_image(&o))
            .ok_or("overlay unavailable")?;
        overlay.save(path)?;
        log::info!("overlay written to {}", path.display());
    }

    if let Some(path) = &cli.rectified {
        let rectified = rectify(&rgb_view(&img), result.frame(), cli.px_per_unit, &Deadline::unbounded())?;
        to_image(&rectified)
            .ok_or("rectified image has an invalid size")?
            .save(path)?;
        log::info!("rectified view written to {}", path.display());
    }

    let report = DetectionReport::from_result(&result, w, h)
        .with_image_path(cli.image.display().to_string());
    match &cli.report {
        Some(path) => report.write_json(path)?,
        None => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;
    run(&cli)
}
