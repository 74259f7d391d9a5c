//! Error types for the EPQS library.

use thiserror::Error;

/// Errors that can occur when querying elevations or processing tables.
#[derive(Error, Debug)]
pub enum EpqsError {
    /// IO error when reading or writing files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Latitude outside [-90, 90] (or not a number).
    #[error("Latitude must be between -90 and 90 (got {lat})")]
    InvalidLatitude { lat: f64 },

    /// Longitude outside [-180, 180] (or not a number).
    #[error("Longitude must be between -180 and 180 (got {lon})")]
    InvalidLongitude { lon: f64 },

    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// Transport-level failure other than a timeout.
    #[error("Request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("Unexpected HTTP status {status}")]
    HttpStatus { status: u16 },

    /// The response body could not be decoded.
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// The CSV input could not be parsed or the output could not be written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A selected column does not exist in the CSV header.
    #[error("Column '{name}' not found in CSV")]
    ColumnNotFound { name: String },

    /// Latitude and longitude were mapped to the same column.
    #[error("Latitude and Longitude columns cannot be the same!")]
    SameCoordinateColumns,

    /// The CSV file has a header but no columns to choose from.
    #[error("CSV file has no columns")]
    NoColumns,

    /// One or more rows failed coordinate validation.
    #[error("Invalid coordinates found:\n{}", format_invalid_rows(.rows))]
    InvalidRows { rows: Vec<InvalidRow> },

    /// The number of results does not match the number of table rows.
    #[error("Result count {results} does not match row count {rows}")]
    RowCountMismatch { rows: usize, results: usize },
}

/// A table row rejected during coordinate validation.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidRow {
    /// 1-based data row number (header excluded).
    pub row: usize,
    /// Point identifier taken from the id column.
    pub point_id: String,
    /// Human readable reason.
    pub message: String,
}

/// How many invalid rows are listed before the remainder is summarized.
pub const INVALID_ROWS_SHOWN: usize = 5;

fn format_invalid_rows(rows: &[InvalidRow]) -> String {
    let mut lines: Vec<String> = rows
        .iter()
        .take(INVALID_ROWS_SHOWN)
        .map(|r| format!("Row {} ({}): {}", r.row, r.point_id, r.message))
        .collect();
    if rows.len() > INVALID_ROWS_SHOWN {
        lines.push(format!("...and {} more", rows.len() - INVALID_ROWS_SHOWN));
    }
    lines.join("\n")
}

/// Result type alias using [`EpqsError`].
pub type Result<T> = std::result::Result<T, EpqsError>;
