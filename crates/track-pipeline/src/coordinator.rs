//! Fan-out of chunks onto the blocking pool and fan-in behind a barrier

use crate::config::{default_parallelism, PipelineConfig};
use crate::partition::partition;
use crate::worker::{propagate_chunk_until, ChunkTrack, PropagationFailure, TrackRecord};
use crate::{PipelineError, Region, Result, TimeGrid};
use futures::future::join_all;
use orbital_mechanics::{ElementSet, Ellipsoid, GeodeticTransform, Propagator};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Combined output of a pipeline run, in chunk-submission order
#[derive(Debug, Clone, Default)]
pub struct Track {
    pub records: Vec<TrackRecord>,
    pub failures: Vec<PropagationFailure>,
    /// Number of work units the catalog was split into
    pub chunks: usize,
}

impl Track {
    /// Records inside `region`, order preserved
    pub fn within(&self, region: &Region) -> Vec<TrackRecord> {
        region.filter(&self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn append(&mut self, chunk: ChunkTrack) {
        self.records.extend(chunk.records);
        self.failures.extend(chunk.failures);
    }
}

pub struct TrackPipeline<P> {
    propagator: Arc<P>,
    ellipsoid: Ellipsoid,
    parallelism: usize,
    chunk_timeout: Option<Duration>,
}

impl<P> TrackPipeline<P>
where
    P: Propagator + 'static,
{
    pub fn new(propagator: P) -> Self {
        Self {
            propagator: Arc::new(propagator),
            ellipsoid: Ellipsoid::WGS84,
            parallelism: default_parallelism(),
            chunk_timeout: None,
        }
    }

    pub fn from_config(propagator: P, config: &PipelineConfig) -> Self {
        Self::new(propagator)
            .with_parallelism(config.parallelism)
            .with_chunk_timeout(config.chunk_timeout())
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn with_chunk_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.chunk_timeout = timeout;
        self
    }

    pub fn with_ellipsoid(mut self, ellipsoid: Ellipsoid) -> Self {
        self.ellipsoid = ellipsoid;
        self
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Propagate the whole catalog over `grid`.
    ///
    /// Every chunk runs as its own blocking task. The call returns only after
    /// all of them have finished; if any task panics, is cancelled, or
    /// exceeds the chunk timeout, the run fails as a whole. A timeout also
    /// tells every still-running chunk to stop at its next propagation.
    pub async fn run(&self, catalog: Arc<[ElementSet]>, grid: &TimeGrid) -> Result<Track> {
        let started = Instant::now();
        let chunks = partition(&catalog, self.parallelism);

        info!(
            satellites = catalog.len(),
            chunks = chunks.len(),
            instants = grid.len(),
            parallelism = self.parallelism,
            "dispatching propagation"
        );

        let cancelled = Arc::new(AtomicBool::new(false));

        let tasks: Vec<_> = chunks
            .into_iter()
            .map(|chunk| {
                let index = chunk.index();
                let propagator = Arc::clone(&self.propagator);
                let ellipsoid = self.ellipsoid;
                let grid = *grid;
                let stop = Arc::clone(&cancelled);

                let handle = tokio::task::spawn_blocking(move || {
                    let transform = GeodeticTransform::new(ellipsoid);
                    let track = propagate_chunk_until(
                        chunk.satellites(),
                        &grid,
                        propagator.as_ref(),
                        &transform,
                        &stop,
                    );
                    debug!(chunk = chunk.index(), range = ?chunk.range(), "chunk finished");
                    track
                });

                let limit = self.chunk_timeout;
                let cancelled = Arc::clone(&cancelled);
                async move {
                    let joined = match limit {
                        Some(limit) => match tokio::time::timeout(limit, handle).await {
                            Ok(joined) => joined,
                            Err(_) => {
                                cancelled.store(true, Ordering::Relaxed);
                                return Err(PipelineError::WorkerFailure {
                                    chunk: index,
                                    reason: format!("timed out after {:?}", limit),
                                })
                            }
                        },
                        None => handle.await,
                    };
                    joined.map_err(|e| PipelineError::WorkerFailure {
                        chunk: index,
                        reason: e.to_string(),
                    })
                }
            })
            .collect();

        // Barrier: nothing is consumed until every chunk has reported
        let results = join_all(tasks).await;

        let mut track = Track {
            chunks: results.len(),
            ..Default::default()
        };
        for result in results {
            track.append(result?);
        }

        info!(
            records = track.records.len(),
            failures = track.failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "propagation complete"
        );

        Ok(track)
    }

    /// [`run`](Self::run) followed by the region filter
    pub async fn run_in_region(
        &self,
        catalog: Arc<[ElementSet]>,
        grid: &TimeGrid,
        region: &Region,
    ) -> Result<Track> {
        let mut track = self.run(catalog, grid).await?;
        track.records.retain(|r| region.contains(&r.position));
        Ok(track)
    }
}
