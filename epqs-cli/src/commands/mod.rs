pub mod batch;
pub mod points;
pub mod query;

use anyhow::{Context, Result};
use epqs::{
    BatchProcessor, BatchSummary, ElevationClientBuilder, ElevationResult, HttpElevationClient,
    PointInput, ProgressSink,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Client settings shared by every subcommand.
pub struct ClientOptions {
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub rate_limit_ms: u64,
}

impl ClientOptions {
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }
}

/// Build the HTTP client, letting command-line flags override the environment.
pub fn build_client(options: &ClientOptions) -> Result<HttpElevationClient> {
    let mut builder = ElevationClientBuilder::from_env();

    if let Some(url) = &options.url {
        builder = builder.endpoint(url.clone());
    }
    if let Some(secs) = options.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    if let Some(attempts) = options.max_attempts {
        builder = builder.max_attempts(attempts);
    }

    let client = builder.build().context("Failed to create elevation client")?;
    tracing::debug!(
        endpoint = client.transport().endpoint(),
        max_attempts = client.max_attempts(),
        "Elevation client ready"
    );
    Ok(client)
}

/// Progress bar that shows the current point and prints warnings above the bar.
struct BarSink {
    pb: ProgressBar,
}

impl ProgressSink for BarSink {
    fn on_start(&mut self, point: &PointInput, index: usize, total: usize) {
        self.pb.set_message(format!(
            "Processing {}: ({}, {}) - {}/{}",
            point.point_id,
            point.coordinate.lat(),
            point.coordinate.lon(),
            index + 1,
            total
        ));
    }

    fn on_progress(&mut self, fraction: f64) {
        let len = self.pb.length().unwrap_or(0);
        self.pb.set_position((fraction * len as f64).round() as u64);
    }

    fn on_warning(&mut self, _point_id: &str, message: &str) {
        self.pb.println(format!("warning: {}", message));
    }
}

/// Look up every point with a progress bar on stderr.
pub fn process_with_progress(
    client: &HttpElevationClient,
    points: &[PointInput],
    rate_limit: Duration,
) -> Result<Vec<ElevationResult>> {
    let pb = ProgressBar::new(points.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            )?
            .progress_chars("#>-"),
    );

    let mut sink = BarSink { pb };
    let results = BatchProcessor::new(client)
        .with_rate_limit(rate_limit)
        .process(points, &mut sink);

    sink.pb.finish_and_clear();
    Ok(results)
}

/// Print the total/successful/failed counts.
pub fn print_summary(summary: &BatchSummary) {
    println!();
    println!("Total points: {}", summary.total);
    println!("Successful:   {}", summary.successful);
    println!("Failed:       {}", summary.failed);
}

/// Print a fixed-width preview of up to `limit` results.
pub fn print_results(results: &[ElevationResult], limit: usize) {
    println!(
        "{:<16} {:>12} {:>13} {:>14} {:>8}",
        "POINT", "LATITUDE", "LONGITUDE", "ELEVATION_FT", "STATUS"
    );
    println!("{}", "-".repeat(67));

    for result in results.iter().take(limit) {
        println!(
            "{:<16} {:>12.6} {:>13.6} {:>14} {:>8}",
            result.point_id(),
            result.coordinate().lat(),
            result.coordinate().lon(),
            epqs::table::format_elevation(result.elevation_feet()),
            result.status()
        );
    }

    if results.len() > limit {
        println!("... {} more rows", results.len() - limit);
    }
}
