//! # EPQS - USGS Elevation Point Query Service client
//!
//! Look up ground elevation (in feet) for latitude/longitude points using the
//! USGS National Map Elevation Point Query Service, one point at a time or in
//! rate-limited batches read from CSV.
//!
//! ## Features
//!
//! - **Retry on timeout**: up to 3 attempts per point, 1 second apart
//! - **No-data detection**: the service sentinel `-1000000` becomes a missing value
//! - **Polite batching**: strictly sequential, with a 500 ms pause between points
//! - **CSV in, CSV out**: keeps the original columns and appends `elevation_ft` and `status`
//!
//! ## Quick Start
//!
//! ```ignore
//! use epqs::{Coordinate, ElevationClientBuilder};
//!
//! let client = ElevationClientBuilder::new().build()?;
//! let outcome = client.fetch(Coordinate::new(39.7392, -104.9903)?);
//! println!("Elevation: {:?} ft", outcome.elevation());
//! ```
//!
//! ## Batch Processing
//!
//! ```ignore
//! use epqs::{table, BatchProcessor, ColumnSelection, ElevationClientBuilder, NoProgress};
//!
//! let table = table::read_csv_path("points.csv")?;
//! let selection = ColumnSelection::detect(table.headers())?;
//! let points = table::extract_points(&table, &selection)?;
//!
//! let client = ElevationClientBuilder::from_env().build()?;
//! let results = BatchProcessor::new(&client).process(&points, &mut NoProgress);
//!
//! table::write_results(std::fs::File::create("points_elevations.csv")?, &table, &results)?;
//! ```
//!
//! ## Coverage
//!
//! EPQS serves the United States and its territories. Points elsewhere come
//! back as "no data".

pub mod batch;
pub mod client;
pub mod coord;
pub mod error;
pub mod pause;
pub mod table;

// Re-export main types at crate root for convenience
pub use batch::{
    BatchProcessor, BatchSummary, ElevationResult, ElevationSource, NoProgress, ProgressSink,
    Status,
};
pub use client::{ElevationClient, FetchOutcome, PointQuery, Transport, NO_DATA_VALUE};
#[cfg(feature = "http")]
pub use client::{ElevationClientBuilder, HttpElevationClient, HttpTransport};
pub use coord::{validate_coordinates, Coordinate, PointInput};
pub use error::{EpqsError, Result};
pub use pause::{Pause, ThreadSleep};
pub use table::{ColumnSelection, CsvTable};
