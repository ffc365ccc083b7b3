//! Track rendering and export

use crate::{PipelineConfig, Result, TrackRecord};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Satellite")]
    satellite: &'a str,
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Longitude")]
    longitude: f64,
    #[serde(rename = "Latitude")]
    latitude: f64,
    #[serde(rename = "Altitude")]
    altitude: f64,
    #[serde(rename = "Velocity")]
    velocity: String,
}

impl<'a> From<&'a TrackRecord> for CsvRow<'a> {
    fn from(r: &'a TrackRecord) -> Self {
        Self {
            satellite: &r.satellite,
            time: r.time.to_rfc3339(),
            longitude: r.position.longitude,
            latitude: r.position.latitude,
            altitude: r.position.altitude_km,
            velocity: format_velocity(&r.velocity),
        }
    }
}

const HEADER: [&str; 6] = ["Satellite", "Time", "Longitude", "Latitude", "Altitude", "Velocity"];

fn format_velocity(v: &[f64; 3]) -> String {
    format!("({:.6}, {:.6}, {:.6})", v[0], v[1], v[2])
}

/// Write records as CSV with the header
/// `Satellite,Time,Longitude,Latitude,Altitude,Velocity`
pub fn write_csv<W: Write>(writer: W, records: &[TrackRecord]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if records.is_empty() {
        csv_writer.write_record(HEADER)?;
    }
    for record in records {
        csv_writer.serialize(CsvRow::from(record))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn save_csv(path: impl AsRef<Path>, records: &[TrackRecord]) -> Result<()> {
    let path = path.as_ref();
    info!("Writing {} records to {:?}", records.len(), path);
    write_csv(BufWriter::new(File::create(path)?), records)
}

/// Console block for one record
pub fn render_record(record: &TrackRecord) -> String {
    format!(
        "Satellite: {}\nTime: {}\nLongitude: {}\nLatitude: {}\nAltitude: {}\nVelocity: {}\n",
        record.satellite,
        record.time.format("%Y-%m-%d %H:%M:%S"),
        record.position.longitude,
        record.position.latitude,
        record.position.altitude_km,
        format_velocity(&record.velocity),
    )
}

pub fn print_records<W: Write>(mut out: W, records: &[TrackRecord]) -> Result<()> {
    for record in records {
        writeln!(out, "{}", render_record(record))?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub satellites: usize,
    pub chunks: usize,
    pub instants: usize,
    pub records: usize,
    pub failures: usize,
    pub in_region: Option<usize>,
    pub elapsed_secs: f64,
}

/// JSON report of a run: the resolved configuration, counts, and the
/// region-filtered records
#[derive(Serialize)]
pub struct RunReport<'a> {
    pub config: &'a PipelineConfig,
    pub summary: &'a RunSummary,
    pub records: &'a [TrackRecord],
}

pub fn save_json(path: impl AsRef<Path>, report: &RunReport<'_>) -> Result<()> {
    let path = path.as_ref();
    info!("Writing JSON report to {:?}", path);
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}
