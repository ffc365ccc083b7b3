//! Satellite Ground-Track CLI
//!
//! Propagates every satellite in a TLE file over a time window and reports the
//! track points that fall inside a latitude/longitude box.
//!
//! Usage:
//!   sat-track --tle data/sats.txt \
//!             --start 2023-01-01T00:00:00Z --end 2023-01-02T00:00:00Z \
//!             --corner 10,20 --corner 10,40 --corner -5,40 --corner -5,20 \
//!             --csv track.csv --region-csv region.csv
//!
//! Without `--corner` the four corners are prompted for interactively.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use orbital_mechanics::{load_catalog, ElementSet, OutputFrame, Sgp4Propagator};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use track_pipeline::config::default_parallelism;
use track_pipeline::export::{self, RunReport, RunSummary};
use track_pipeline::region::REGION_CORNERS;
use track_pipeline::{GeoCorner, PipelineConfig, PipelineError, TrackPipeline};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Frame {
    /// Rotate SGP4 output into the Earth-fixed frame
    EarthFixed,
    /// Use SGP4 output as is
    Teme,
}

impl From<Frame> for OutputFrame {
    fn from(frame: Frame) -> Self {
        match frame {
            Frame::EarthFixed => OutputFrame::EarthFixed,
            Frame::Teme => OutputFrame::Teme,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "sat-track",
    about = "Propagate a TLE catalog over a time window and filter the ground track to a region"
)]
struct Args {
    /// TLE file (name line followed by two element lines, repeated)
    #[arg(short, long, env = "SAT_TRACK_TLE", default_value = "sats.txt")]
    tle: PathBuf,

    /// First instant (RFC 3339)
    #[arg(long, env = "SAT_TRACK_START", default_value = "2023-01-01T00:00:00Z")]
    start: DateTime<Utc>,

    /// Last instant, inclusive (RFC 3339)
    #[arg(long, env = "SAT_TRACK_END", default_value = "2023-01-02T00:00:00Z")]
    end: DateTime<Utc>,

    /// Step between instants in minutes
    #[arg(short = 'i', long, env = "SAT_TRACK_STEP_MINUTES", default_value_t = 1.0)]
    step_minutes: f64,

    /// Number of parallel work units (defaults to available cores)
    #[arg(short, long, env = "SAT_TRACK_PARALLELISM")]
    parallelism: Option<usize>,

    /// Fail the run if any work unit takes longer than this
    #[arg(long, env = "SAT_TRACK_CHUNK_TIMEOUT_SECS")]
    chunk_timeout_secs: Option<u64>,

    /// Region corner as LAT,LON; give exactly four
    #[arg(
        long = "corner",
        value_name = "LAT,LON",
        allow_hyphen_values = true,
        env = "SAT_TRACK_CORNERS",
        value_delimiter = ';'
    )]
    corners: Vec<GeoCorner>,

    /// Skip the region filter instead of prompting for corners
    #[arg(long, conflicts_with = "corners")]
    no_region: bool,

    /// Frame of the propagated positions
    #[arg(long, value_enum, default_value_t = Frame::EarthFixed)]
    frame: Frame,

    /// Print every track point, not just those inside the region
    #[arg(long)]
    print_all: bool,

    /// Do not print track points to stdout
    #[arg(short, long)]
    quiet: bool,

    /// Export the full track as CSV
    #[arg(long, env = "SAT_TRACK_CSV")]
    csv: Option<PathBuf>,

    /// Export the region-filtered track as CSV
    #[arg(long, env = "SAT_TRACK_REGION_CSV")]
    region_csv: Option<PathBuf>,

    /// Write a JSON report (configuration, summary, filtered track)
    #[arg(long)]
    json: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Ask for each corner's latitude then longitude
fn prompt_corners<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
) -> track_pipeline::Result<Vec<GeoCorner>> {
    let mut read_value = |label: String| -> track_pipeline::Result<f64> {
        write!(output, "Enter {}: ", label)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(PipelineError::InvalidConfiguration(format!(
                "input ended before {}",
                label
            )));
        }
        line.trim().parse::<f64>().map_err(|_| {
            PipelineError::InvalidConfiguration(format!(
                "{} {:?} is not a number",
                label,
                line.trim()
            ))
        })
    };

    (1..=REGION_CORNERS)
        .map(|i| -> track_pipeline::Result<GeoCorner> {
            let latitude = read_value(format!("latitude for corner {}", i))?;
            let longitude = read_value(format!("longitude for corner {}", i))?;
            Ok(GeoCorner::new(latitude, longitude))
        })
        .collect()
}

const DEFAULT_LOG: &str = "sat_track=info,track_pipeline=info,orbital_mechanics=info";
const VERBOSE_LOG: [&str; 3] = [
    "sat_track=debug",
    "track_pipeline=debug",
    "orbital_mechanics=debug",
];

/// `RUST_LOG` (or the default) with the debug directives layered on top
/// when `verbose` is set
fn log_filter(rust_log: Option<&str>, verbose: bool) -> Result<EnvFilter> {
    let mut filter = match rust_log {
        Some(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid RUST_LOG {:?}", directives))?,
        _ => EnvFilter::new(DEFAULT_LOG),
    };
    if verbose {
        for directive in VERBOSE_LOG {
            filter = filter.add_directive(directive.parse()?);
        }
    }
    Ok(filter)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = log_filter(std::env::var("RUST_LOG").ok().as_deref(), args.verbose)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(run(args));
    // A chunk that blew its timeout may still be inside a propagation call;
    // don't wait for it on the way out
    runtime.shutdown_background();
    result
}

async fn run(args: Args) -> Result<()> {
    info!("{}", "=".repeat(60));
    info!("Satellite Ground-Track Pipeline");
    info!("{}", "=".repeat(60));

    let mut config = PipelineConfig::new()
        .window(args.start, args.end)
        .step_minutes(args.step_minutes)
        .parallelism(args.parallelism.unwrap_or_else(default_parallelism))
        .chunk_timeout_secs(args.chunk_timeout_secs)
        .corners(args.corners.clone());

    if config.corners.is_empty() && !args.no_region {
        config.corners = prompt_corners(io::stdin().lock(), io::stdout())?;
    }

    // Everything is checked before the catalog is even read
    config.validate()?;
    let grid = config.time_grid()?;
    let region = config.region()?;

    let catalog: Arc<[ElementSet]> = load_catalog(&args.tle)
        .with_context(|| format!("reading catalog {:?}", args.tle))?
        .into();

    let started = Instant::now();
    let pipeline = TrackPipeline::from_config(Sgp4Propagator::new(args.frame.into()), &config);
    let track = pipeline.run(Arc::clone(&catalog), &grid).await?;

    if !track.failures.is_empty() {
        warn!(
            "{} track points skipped after propagation failures",
            track.failures.len()
        );
    }

    let in_region = region.as_ref().map(|r| track.within(r));
    let elapsed_secs = started.elapsed().as_secs_f64();

    if !args.quiet {
        let mut out = io::stdout().lock();
        if args.print_all || in_region.is_none() {
            export::print_records(&mut out, &track.records)?;
        }
        if let Some(records) = &in_region {
            writeln!(out, "--- {} track points inside region ---\n", records.len())?;
            export::print_records(&mut out, records)?;
        }
    }

    if let Some(path) = &args.csv {
        export::save_csv(path, &track.records)?;
    }
    if let (Some(path), Some(records)) = (&args.region_csv, &in_region) {
        export::save_csv(path, records)?;
    }

    let summary = RunSummary {
        satellites: catalog.len(),
        chunks: track.chunks,
        instants: grid.len(),
        records: track.records.len(),
        failures: track.failures.len(),
        in_region: in_region.as_ref().map(Vec::len),
        elapsed_secs,
    };

    if let Some(path) = &args.json {
        let records = in_region.as_deref().unwrap_or(&track.records);
        export::save_json(
            path,
            &RunReport {
                config: &config,
                summary: &summary,
                records,
            },
        )?;
    }

    info!("{}", "=".repeat(60));
    info!("SUMMARY");
    info!("{}", "=".repeat(60));
    info!("Satellites:          {}", summary.satellites);
    info!("Chunks:              {}", summary.chunks);
    info!("Instants:            {}", summary.instants);
    info!("Track points:        {}", summary.records);
    info!("Skipped points:      {}", summary.failures);
    if let Some(n) = summary.in_region {
        info!("Points in region:    {}", n);
    }
    info!("Propagation time:    {:.3} s", summary.elapsed_secs);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_prompt_corners() {
        let input = Cursor::new("10\n20\n10\n40\n-5\n40\n-5\n20\n");
        let mut output = Vec::new();
        let corners = prompt_corners(input, &mut output).unwrap();

        assert_eq!(corners.len(), 4);
        assert_eq!(corners[2], GeoCorner::new(-5.0, 40.0));
        let prompts = String::from_utf8(output).unwrap();
        assert!(prompts.starts_with("Enter latitude for corner 1: Enter longitude for corner 1: "));
    }

    #[test]
    fn test_prompt_corners_rejects_garbage() {
        let input = Cursor::new("10\nnorth\n");
        let err = prompt_corners(input, Vec::new()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_prompt_corners_rejects_short_input() {
        let input = Cursor::new("10\n20\n");
        let err = prompt_corners(input, Vec::new()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_log_filter_defaults() {
        let filter = log_filter(None, false).unwrap().to_string();
        assert!(filter.contains("track_pipeline=info"));
    }

    #[test]
    fn test_log_filter_verbose_keeps_rust_log() {
        let filter = log_filter(Some("warn,csv=trace"), true).unwrap().to_string();
        assert!(filter.contains("csv=trace"));
        assert!(filter.contains("warn"));
        assert!(filter.contains("track_pipeline=debug"));
        assert!(!filter.contains("track_pipeline=info"));
    }

    #[test]
    fn test_log_filter_rejects_bad_rust_log() {
        assert!(log_filter(Some("track_pipeline=loud"), false).is_err());
    }

    #[test]
    fn test_corner_arguments() {
        let args = Args::try_parse_from([
            "sat-track",
            "--corner",
            "-5,20",
            "--corner",
            "10,20",
            "--corner",
            "10,40",
            "--corner",
            "-5,40",
            "--step-minutes",
            "5",
        ])
        .unwrap();
        assert_eq!(args.corners[0], GeoCorner::new(-5.0, 20.0));
        assert_eq!(args.step_minutes, 5.0);
    }
}
