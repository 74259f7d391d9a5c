//! Sequential batch lookups with rate limiting and progress reporting.

use std::time::Duration;

use serde::Serialize;

use crate::client::{ElevationClient, FetchOutcome, Transport};
use crate::coord::{Coordinate, PointInput};
use crate::pause::{Pause, ThreadSleep};

/// Default wait between consecutive points.
pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_millis(500);

/// Anything that can turn a coordinate into a [`FetchOutcome`].
pub trait ElevationSource {
    fn fetch(&self, coordinate: Coordinate) -> FetchOutcome;
}

impl<T: Transport> ElevationSource for ElevationClient<T> {
    fn fetch(&self, coordinate: Coordinate) -> FetchOutcome {
        ElevationClient::fetch(self, coordinate)
    }
}

/// Whether a lookup produced an elevation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Success,
    Failed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "Success",
            Status::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Result of looking up one input point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElevationResult {
    point_id: String,
    #[serde(flatten)]
    coordinate: Coordinate,
    #[serde(rename = "elevation_ft")]
    elevation_feet: Option<f64>,
    status: Status,
}

impl ElevationResult {
    /// Build a result; the status follows from whether an elevation is present.
    pub fn new(point_id: impl Into<String>, coordinate: Coordinate, elevation_feet: Option<f64>) -> Self {
        let status = if elevation_feet.is_some() {
            Status::Success
        } else {
            Status::Failed
        };
        Self {
            point_id: point_id.into(),
            coordinate,
            elevation_feet,
            status,
        }
    }

    pub fn point_id(&self) -> &str {
        &self.point_id
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn elevation_feet(&self) -> Option<f64> {
        self.elevation_feet
    }

    pub fn status(&self) -> Status {
        self.status
    }
}

/// Receives progress updates from [`BatchProcessor::process`].
pub trait ProgressSink {
    /// Called before point `index` (0-based) of `total` is looked up.
    fn on_start(&mut self, _point: &PointInput, _index: usize, _total: usize) {}

    /// Called after each point with the completed fraction `(index + 1) / total`.
    fn on_progress(&mut self, _fraction: f64) {}

    /// Called when a lookup failed with something the user should see.
    fn on_warning(&mut self, _point_id: &str, _message: &str) {}
}

/// A [`ProgressSink`] that ignores everything.
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// Looks up a list of points one after another.
pub struct BatchProcessor<'a, S: ?Sized> {
    source: &'a S,
    rate_limit_delay: Duration,
    pause: Box<dyn Pause + 'a>,
}

impl<'a, S: ElevationSource + ?Sized> BatchProcessor<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            rate_limit_delay: DEFAULT_RATE_LIMIT_DELAY,
            pause: Box::new(ThreadSleep),
        }
    }

    /// Set the wait between consecutive points.
    pub fn with_rate_limit(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = delay;
        self
    }

    /// Replace how the processor waits between points.
    pub fn with_pause(mut self, pause: impl Pause + 'a) -> Self {
        self.pause = Box::new(pause);
        self
    }

    pub fn rate_limit(&self) -> Duration {
        self.rate_limit_delay
    }

    /// Look up every point in order.
    ///
    /// The returned list has one entry per input point, in input order. The
    /// processor waits for the rate-limit delay between points, but not after
    /// the last one.
    pub fn process(&self, points: &[PointInput], sink: &mut dyn ProgressSink) -> Vec<ElevationResult> {
        let total = points.len();
        let mut results = Vec::with_capacity(total);

        tracing::info!(total, "Processing elevation batch");

        for (index, point) in points.iter().enumerate() {
            sink.on_start(point, index, total);

            let outcome = self.source.fetch(point.coordinate);
            if let Some(warning) = outcome.warning() {
                sink.on_warning(&point.point_id, warning);
            }

            results.push(ElevationResult::new(
                point.point_id.clone(),
                point.coordinate,
                outcome.elevation(),
            ));

            sink.on_progress((index + 1) as f64 / total as f64);

            if index + 1 < total {
                self.pause.pause(self.rate_limit_delay);
            }
        }

        let summary = BatchSummary::from_results(&results);
        tracing::info!(
            total = summary.total,
            successful = summary.successful,
            failed = summary.failed,
            "Batch complete"
        );

        results
    }
}

/// Counts shown after a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[ElevationResult]) -> Self {
        let successful = results
            .iter()
            .filter(|r| r.status() == Status::Success)
            .count();
        Self {
            total: results.len(),
            successful,
            failed: results.len() - successful,
        }
    }
}
