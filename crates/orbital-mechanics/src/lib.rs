//! Orbital Mechanics Library
//!
//! Element set catalogs, SGP4 propagation into the Earth-fixed frame, and
//! WGS84 geodetic transforms for satellite ground-track computation.

use thiserror::Error;

pub mod elements;
pub mod propagation;
pub mod time;
pub mod transforms;

pub use elements::{load_catalog, parse_catalog, ElementSet};
pub use propagation::{OutputFrame, Propagator, Sgp4Model, Sgp4Propagator, StateVector};
pub use time::JulianDate;
pub use transforms::{Ellipsoid, GeodeticPoint, GeodeticTransform};

#[derive(Error, Debug)]
pub enum OrbitalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Catalog parse error at line {line}: {reason}")]
    CatalogParse { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, OrbitalError>;

/// Failure to produce a state vector for one (satellite, instant) pair.
///
/// These are recoverable: callers skip the record and keep going.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropagationError {
    #[error("Invalid elements: {0}")]
    InvalidElements(String),
    #[error("Propagation failed: {0}")]
    Propagation(String),
}
