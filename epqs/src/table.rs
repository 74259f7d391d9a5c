//! CSV input and output for batch lookups.
//!
//! Input files may have any columns; three of them are mapped to the point
//! id, latitude and longitude. Output files repeat the input columns and add
//! `elevation_ft` and `status`.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use csv::StringRecord;

use crate::batch::ElevationResult;
use crate::coord::{Coordinate, PointInput};
use crate::error::{EpqsError, InvalidRow, Result};

/// Header of the elevation column appended to output files.
pub const ELEVATION_COLUMN: &str = "elevation_ft";

/// Header of the status column appended to output files.
pub const STATUS_COLUMN: &str = "status";

/// Text written in place of a missing elevation.
pub const NO_DATA_TEXT: &str = "No Data";

/// An in-memory CSV file.
#[derive(Debug, Clone)]
pub struct CsvTable {
    headers: StringRecord,
    records: Vec<StringRecord>,
}

impl CsvTable {
    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    pub fn records(&self) -> &[StringRecord] {
        &self.records
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

/// Read a CSV document with a header row.
///
/// Rows whose field count differs from the header are rejected, so a
/// malformed file aborts before any lookup happens.
pub fn read_csv<R: Read>(reader: R) -> Result<CsvTable> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();
    let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;

    tracing::debug!(rows = records.len(), columns = headers.len(), "CSV loaded");
    Ok(CsvTable { headers, records })
}

/// Read a CSV file from disk.
pub fn read_csv_path<P: AsRef<Path>>(path: P) -> Result<CsvTable> {
    let file = File::open(path)?;
    read_csv(BufReader::new(file))
}

/// Which input columns hold the point id, latitude and longitude.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    pub id: String,
    pub lat: String,
    pub lon: String,
}

/// Resolved column positions for a [`ColumnSelection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndices {
    pub id: usize,
    pub lat: usize,
    pub lon: usize,
}

impl ColumnSelection {
    pub fn new(id: impl Into<String>, lat: impl Into<String>, lon: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            lat: lat.into(),
            lon: lon.into(),
        }
    }

    /// Guess the columns from header names.
    ///
    /// Picks the first header containing `id`, `lat`, and `lon` or `lng`
    /// respectively (case-insensitive). Each falls back to the first column.
    pub fn detect(headers: &StringRecord) -> Result<Self> {
        let first = headers.get(0).ok_or(EpqsError::NoColumns)?;

        let find = |pred: &dyn Fn(&str) -> bool| {
            headers
                .iter()
                .find(|h| pred(&h.to_lowercase()))
                .unwrap_or(first)
                .to_string()
        };

        Ok(Self {
            id: find(&|h| h.contains("id")),
            lat: find(&|h| h.contains("lat")),
            lon: find(&|h| h.contains("lon") || h.contains("lng")),
        })
    }

    /// Fill in any unset column from auto-detection.
    pub fn detect_with_overrides(
        headers: &StringRecord,
        id: Option<String>,
        lat: Option<String>,
        lon: Option<String>,
    ) -> Result<Self> {
        let detected = Self::detect(headers)?;
        Ok(Self {
            id: id.unwrap_or(detected.id),
            lat: lat.unwrap_or(detected.lat),
            lon: lon.unwrap_or(detected.lon),
        })
    }

    /// Check the selection against `headers` and return column positions.
    ///
    /// # Errors
    ///
    /// [`EpqsError::SameCoordinateColumns`] if latitude and longitude share a
    /// column, [`EpqsError::ColumnNotFound`] if a name is not in the header.
    pub fn resolve(&self, headers: &StringRecord) -> Result<ColumnIndices> {
        if self.lat == self.lon {
            return Err(EpqsError::SameCoordinateColumns);
        }

        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| EpqsError::ColumnNotFound {
                    name: name.to_string(),
                })
        };

        Ok(ColumnIndices {
            id: position(&self.id)?,
            lat: position(&self.lat)?,
            lon: position(&self.lon)?,
        })
    }
}

/// Turn table rows into points, validating every coordinate first.
///
/// Nothing is returned unless every row is valid; otherwise the error lists
/// all rejected rows.
pub fn extract_points(table: &CsvTable, selection: &ColumnSelection) -> Result<Vec<PointInput>> {
    let columns = selection.resolve(&table.headers)?;
    let mut points = Vec::with_capacity(table.len());
    let mut invalid = Vec::new();

    for (i, record) in table.records.iter().enumerate() {
        let point_id = record.get(columns.id).unwrap_or("").to_string();

        match parse_coordinate(record, columns) {
            Ok(coordinate) => points.push(PointInput::new(point_id, coordinate)),
            Err(message) => invalid.push(InvalidRow {
                row: i + 1,
                point_id,
                message,
            }),
        }
    }

    if !invalid.is_empty() {
        tracing::debug!(invalid = invalid.len(), "Rejected rows with invalid coordinates");
        return Err(EpqsError::InvalidRows { rows: invalid });
    }

    Ok(points)
}

fn parse_coordinate(record: &StringRecord, columns: ColumnIndices) -> std::result::Result<Coordinate, String> {
    let field = |idx: usize, label: &str| -> std::result::Result<f64, String> {
        let raw = record.get(idx).unwrap_or("").trim();
        raw.parse::<f64>()
            .map_err(|_| format!("{} is not a number: '{}'", label, raw))
    };

    let lat = field(columns.lat, "Latitude")?;
    let lon = field(columns.lon, "Longitude")?;
    Coordinate::new(lat, lon).map_err(|e| e.to_string())
}

/// Text for the `elevation_ft` column.
pub fn format_elevation(elevation: Option<f64>) -> String {
    match elevation {
        Some(e) => e.to_string(),
        None => NO_DATA_TEXT.to_string(),
    }
}

/// Write the input table with `elevation_ft` and `status` appended.
///
/// `results` must be in row order, one per record.
pub fn write_results<W: Write>(writer: W, table: &CsvTable, results: &[ElevationResult]) -> Result<()> {
    if results.len() != table.len() {
        return Err(EpqsError::RowCountMismatch {
            rows: table.len(),
            results: results.len(),
        });
    }

    let mut writer = csv::Writer::from_writer(writer);

    let mut headers: Vec<&str> = table.headers.iter().collect();
    headers.push(ELEVATION_COLUMN);
    headers.push(STATUS_COLUMN);
    writer.write_record(&headers)?;

    for (record, result) in table.records.iter().zip(results) {
        let elevation = format_elevation(result.elevation_feet());
        let mut row: Vec<&str> = record.iter().collect();
        row.push(&elevation);
        row.push(result.status().as_str());
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write results for points that did not come from a table.
///
/// Columns: `point_id, latitude, longitude, elevation_ft, status`.
pub fn write_point_results<W: Write>(writer: W, results: &[ElevationResult]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(["point_id", "latitude", "longitude", ELEVATION_COLUMN, STATUS_COLUMN])?;

    for result in results {
        let coordinate = result.coordinate();
        writer.write_record([
            result.point_id().to_string(),
            coordinate.lat().to_string(),
            coordinate.lon().to_string(),
            format_elevation(result.elevation_feet()),
            result.status().to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
