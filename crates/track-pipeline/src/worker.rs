//! Propagation of one chunk across the full time grid

use crate::TimeGrid;
use chrono::{DateTime, Utc};
use orbital_mechanics::{
    ElementSet, GeodeticPoint, GeodeticTransform, JulianDate, PropagationError, Propagator,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// One satellite's geodetic position and velocity at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub satellite: String,
    pub time: DateTime<Utc>,
    pub position: GeodeticPoint,
    /// km/s, in the propagator's output frame
    pub velocity: [f64; 3],
}

impl TrackRecord {
    /// Velocity magnitude in km/s
    pub fn speed(&self) -> f64 {
        self.velocity.iter().map(|v| v * v).sum::<f64>().sqrt()
    }
}

/// A (satellite, instant) pair that produced no record
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationFailure {
    pub satellite: String,
    pub time: DateTime<Utc>,
    pub error: PropagationError,
}

#[derive(Debug, Clone, Default)]
pub struct ChunkTrack {
    pub records: Vec<TrackRecord>,
    pub failures: Vec<PropagationFailure>,
}

/// Propagate every satellite at every grid instant.
///
/// Records come out time-major: all satellites (in slice order) for the first
/// instant, then all for the next. A failing pair is recorded and skipped; the
/// rest of the chunk is unaffected. Only the first failure of each satellite
/// is logged at `warn`.
pub fn propagate_chunk<P: Propagator>(
    satellites: &[ElementSet],
    grid: &TimeGrid,
    propagator: &P,
    transform: &GeodeticTransform,
) -> ChunkTrack {
    propagate_chunk_until(satellites, grid, propagator, transform, &AtomicBool::new(false))
}

/// [`propagate_chunk`] that stops before the next (satellite, instant) pair
/// once `cancelled` is set, returning what was produced so far.
pub fn propagate_chunk_until<P: Propagator>(
    satellites: &[ElementSet],
    grid: &TimeGrid,
    propagator: &P,
    transform: &GeodeticTransform,
    cancelled: &AtomicBool,
) -> ChunkTrack {
    let models: Vec<Result<P::Model, PropagationError>> = satellites
        .iter()
        .map(|sat| {
            propagator.prepare(sat).map_err(|e| {
                warn!(satellite = %sat.name, "skipping satellite for the whole window: {}", e);
                e
            })
        })
        .collect();
    let mut warned = vec![false; satellites.len()];

    let mut track = ChunkTrack {
        records: Vec::with_capacity(satellites.len() * grid.len()),
        failures: Vec::new(),
    };

    'grid: for time in grid {
        let jd = JulianDate::from_datetime(time);

        for (i, (sat, model)) in satellites.iter().zip(&models).enumerate() {
            if cancelled.load(Ordering::Relaxed) {
                debug!(satellite = %sat.name, time = %time, "chunk cancelled");
                break 'grid;
            }

            let state = match model {
                Ok(model) => propagator.propagate(model, jd),
                Err(e) => Err(e.clone()),
            };

            match state {
                Ok(state) => {
                    let p = state.position;
                    track.records.push(TrackRecord {
                        satellite: sat.name.clone(),
                        time,
                        position: transform.to_geodetic(p.x, p.y, p.z),
                        velocity: state.velocity.into(),
                    });
                }
                Err(error) => {
                    if model.is_ok() {
                        if warned[i] {
                            debug!(
                                satellite = %sat.name,
                                time = %time,
                                "skipping record: {}",
                                error
                            );
                        } else {
                            warn!(
                                satellite = %sat.name,
                                time = %time,
                                "skipping record: {} (further failures logged at debug)",
                                error
                            );
                            warned[i] = true;
                        }
                    }
                    track.failures.push(PropagationFailure {
                        satellite: sat.name.clone(),
                        time,
                        error,
                    });
                }
            }
        }
    }

    debug!(
        satellites = satellites.len(),
        records = track.records.len(),
        failures = track.failures.len(),
        "chunk propagated"
    );

    track
}
