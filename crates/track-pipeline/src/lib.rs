//! Satellite Ground-Track Pipeline
//!
//! Propagates a catalog of element sets over a time grid in parallel, converts
//! every state vector to geodetic coordinates, and filters the resulting track
//! to a latitude/longitude bounding box.
//!
//! # Data flow
//!
//! ```text
//! catalog ─► partition ─► chunk₁ … chunkₙ ─► propagate_chunk (blocking pool)
//!                                               │
//!                           barrier + concat ◄──┘
//!                                 │
//!                           Region::contains ─► filtered track
//! ```

use thiserror::Error;

pub mod config;
pub mod coordinator;
pub mod export;
pub mod partition;
pub mod region;
pub mod time_grid;
pub mod worker;

pub use config::PipelineConfig;
pub use coordinator::{Track, TrackPipeline};
pub use partition::{partition, Chunk};
pub use region::{GeoCorner, Region};
pub use time_grid::TimeGrid;
pub use worker::{
    propagate_chunk, propagate_chunk_until, ChunkTrack, PropagationFailure, TrackRecord,
};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Orbital(#[from] orbital_mechanics::OrbitalError),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Worker for chunk {chunk} failed: {reason}")]
    WorkerFailure { chunk: usize, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
