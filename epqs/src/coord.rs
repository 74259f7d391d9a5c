//! Geographic coordinates and point inputs.

use serde::Serialize;

use crate::error::{EpqsError, Result};

/// Valid latitude range in decimal degrees.
pub const LAT_RANGE: (f64, f64) = (-90.0, 90.0);

/// Valid longitude range in decimal degrees.
pub const LON_RANGE: (f64, f64) = (-180.0, 180.0);

/// A WGS84 coordinate in decimal degrees.
///
/// Can only be built through [`Coordinate::new`], so every value in
/// circulation is inside the valid latitude/longitude range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    #[serde(rename = "latitude")]
    lat: f64,
    #[serde(rename = "longitude")]
    lon: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting values outside the valid range.
    ///
    /// # Errors
    ///
    /// Returns [`EpqsError::InvalidLatitude`] or [`EpqsError::InvalidLongitude`].
    /// NaN is rejected by both checks.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        validate_coordinates(lat, lon)?;
        Ok(Self { lat, lon })
    }

    /// Latitude in decimal degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in decimal degrees.
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Whether this is exactly (0, 0), which usually means "not filled in".
    pub fn is_null_island(&self) -> bool {
        self.lat == 0.0 && self.lon == 0.0
    }
}

/// Check that latitude and longitude are inside their valid ranges.
///
/// Latitude is checked first, so a point with both values out of range
/// reports the latitude error.
pub fn validate_coordinates(lat: f64, lon: f64) -> Result<()> {
    if !(LAT_RANGE.0..=LAT_RANGE.1).contains(&lat) {
        return Err(EpqsError::InvalidLatitude { lat });
    }
    if !(LON_RANGE.0..=LON_RANGE.1).contains(&lon) {
        return Err(EpqsError::InvalidLongitude { lon });
    }
    Ok(())
}

/// A point to look up: an identifier plus its coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct PointInput {
    pub point_id: String,
    pub coordinate: Coordinate,
}

impl PointInput {
    pub fn new(point_id: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            point_id: point_id.into(),
            coordinate,
        }
    }

    /// Build a point with the default `Point_{n}` identifier (`index` is 0-based).
    pub fn numbered(index: usize, coordinate: Coordinate) -> Self {
        Self::new(default_point_id(index), coordinate)
    }
}

/// Default identifier for the point at 0-based `index`.
pub fn default_point_id(index: usize) -> String {
    format!("Point_{}", index + 1)
}
