//! Evaluation instants over an inclusive time window

use crate::{PipelineError, Result};
use chrono::{DateTime, Duration, Utc};

/// Ordered instants `start, start + step, …` up to and including `end`.
///
/// The grid is a value; [`iter`](TimeGrid::iter) restarts from `start` on
/// every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeGrid {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
}

impl TimeGrid {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, step: Duration) -> Result<Self> {
        if step <= Duration::zero() {
            return Err(PipelineError::InvalidConfiguration(format!(
                "time step must be positive, got {}",
                step
            )));
        }
        if end < start {
            return Err(PipelineError::InvalidConfiguration(format!(
                "end {} is before start {}",
                end.to_rfc3339(),
                start.to_rfc3339()
            )));
        }
        Ok(Self { start, end, step })
    }

    /// Grid with the step given in (possibly fractional) minutes, resolved to
    /// whole milliseconds
    pub fn from_minutes(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step_minutes: f64,
    ) -> Result<Self> {
        if !step_minutes.is_finite() || step_minutes <= 0.0 {
            return Err(PipelineError::InvalidConfiguration(format!(
                "step interval must be a positive number of minutes, got {}",
                step_minutes
            )));
        }
        let millis = (step_minutes * 60_000.0).round();
        if millis > i64::MAX as f64 {
            return Err(PipelineError::InvalidConfiguration(format!(
                "step interval of {} minutes is out of range",
                step_minutes
            )));
        }
        Self::new(start, end, Duration::milliseconds(millis as i64))
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Number of instants the grid yields
    pub fn len(&self) -> usize {
        let span = (self.end - self.start).num_nanoseconds();
        let step = self.step.num_nanoseconds();
        match (span, step) {
            (Some(span), Some(step)) => (span / step) as usize + 1,
            _ => self.iter().count(),
        }
    }

    /// Always false: a valid grid contains at least `start`
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> Instants {
        Instants {
            next: Some(self.start),
            end: self.end,
            step: self.step,
        }
    }
}

impl IntoIterator for &TimeGrid {
    type Item = DateTime<Utc>;
    type IntoIter = Instants;

    fn into_iter(self) -> Instants {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct Instants {
    next: Option<DateTime<Utc>>,
    end: DateTime<Utc>,
    step: Duration,
}

impl Iterator for Instants {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<DateTime<Utc>> {
        let current = self.next.filter(|t| *t <= self.end)?;
        self.next = current.checked_add_signed(self.step);
        Some(current)
    }
}
