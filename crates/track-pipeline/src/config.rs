//! Run configuration
//!
//! Plain data with defaults matching a one-day window at one-minute steps.
//! Validation happens when the grid and region are derived, before anything
//! is dispatched.

use crate::{GeoCorner, PipelineError, Region, Result, TimeGrid};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Available execution units, falling back to 4 when unknown
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(4)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub start: DateTime<Utc>,
    /// Inclusive
    pub end: DateTime<Utc>,
    pub step_minutes: f64,
    pub parallelism: usize,
    /// Per-chunk limit; `None` waits indefinitely
    pub chunk_timeout_secs: Option<u64>,
    /// Empty means no region filter
    pub corners: Vec<GeoCorner>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            start: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).single().unwrap_or_default(),
            end: Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).single().unwrap_or_default(),
            step_minutes: 1.0,
            parallelism: default_parallelism(),
            chunk_timeout_secs: None,
            corners: Vec::new(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn step_minutes(mut self, minutes: f64) -> Self {
        self.step_minutes = minutes;
        self
    }

    pub fn parallelism(mut self, n: usize) -> Self {
        self.parallelism = n;
        self
    }

    pub fn chunk_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.chunk_timeout_secs = secs;
        self
    }

    pub fn corners(mut self, corners: Vec<GeoCorner>) -> Self {
        self.corners = corners;
        self
    }

    pub fn time_grid(&self) -> Result<TimeGrid> {
        TimeGrid::from_minutes(self.start, self.end, self.step_minutes)
    }

    /// `None` when no corners are configured
    pub fn region(&self) -> Result<Option<Region>> {
        if self.corners.is_empty() {
            return Ok(None);
        }
        Region::from_corners(&self.corners).map(Some)
    }

    pub fn chunk_timeout(&self) -> Option<Duration> {
        self.chunk_timeout_secs.map(Duration::from_secs)
    }

    /// Check everything that would otherwise fail mid-run
    pub fn validate(&self) -> Result<()> {
        self.time_grid()?;
        self.region()?;
        if self.chunk_timeout_secs == Some(0) {
            return Err(PipelineError::InvalidConfiguration(
                "chunk timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.time_grid().unwrap().len(), 1441);
        assert!(config.region().unwrap().is_none());
        assert!(config.parallelism >= 1);
    }

    #[test]
    fn test_builder() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let config = PipelineConfig::new()
            .window(start, start + ChronoDuration::hours(2))
            .step_minutes(10.0)
            .parallelism(3)
            .chunk_timeout_secs(Some(30))
            .corners(vec![
                GeoCorner::new(0.0, 0.0),
                GeoCorner::new(0.0, 10.0),
                GeoCorner::new(10.0, 10.0),
                GeoCorner::new(10.0, 0.0),
            ]);

        config.validate().unwrap();
        assert_eq!(config.time_grid().unwrap().len(), 13);
        assert_eq!(config.chunk_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.region().unwrap().unwrap().lat_max(), 10.0);
    }

    #[test]
    fn test_invalid_step() {
        let config = PipelineConfig::new().step_minutes(0.0);
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_end_before_start() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let config = PipelineConfig::new().window(start, start - ChronoDuration::minutes(1));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_region() {
        let config = PipelineConfig::new().corners(vec![GeoCorner::new(0.0, 0.0); 2]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = PipelineConfig::new().chunk_timeout_secs(Some(0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let config = PipelineConfig::new().parallelism(2);
        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.parallelism, 2);
        assert_eq!(back.start, config.start);
    }
}
