use anyhow::{bail, Context, Result};
use epqs::{coord::default_point_id, table, BatchSummary, Coordinate, PointInput};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use super::{build_client, print_results, print_summary, process_with_progress, ClientOptions};

pub fn run(options: &ClientOptions, specs: Vec<String>, output: PathBuf) -> Result<()> {
    let mut points: Vec<PointInput> = Vec::with_capacity(specs.len());

    for spec in &specs {
        // Rejected points do not consume a default id
        match parse_point(spec, points.len()) {
            Ok(point) => points.push(point),
            Err(msg) => eprintln!("Skipping '{}': {}", spec, msg),
        }
    }

    if points.is_empty() {
        bail!("No valid points to process");
    }

    println!("Current points ({})", points.len());

    let client = build_client(options)?;
    let results = process_with_progress(&client, &points, options.rate_limit())?;

    print_results(&results, usize::MAX);
    print_summary(&BatchSummary::from_results(&results));

    let file = File::create(&output).context("Failed to create output file")?;
    table::write_point_results(BufWriter::new(file), &results)
        .context("Failed to write results")?;

    println!();
    println!("Output written to: {}", output.display());
    Ok(())
}

/// Parse `ID,LAT,LON` or `LAT,LON`. `index` numbers points without an id.
fn parse_point(spec: &str, index: usize) -> std::result::Result<PointInput, String> {
    let parts: Vec<&str> = spec.split(',').map(str::trim).collect();

    let (id, lat, lon) = match parts.as_slice() {
        [lat, lon] => (None, *lat, *lon),
        [id, lat, lon] => (Some(*id).filter(|s| !s.is_empty()), *lat, *lon),
        _ => return Err("expected ID,LAT,LON or LAT,LON".to_string()),
    };

    let lat: f64 = lat
        .parse()
        .map_err(|_| format!("Latitude is not a number: '{}'", lat))?;
    let lon: f64 = lon
        .parse()
        .map_err(|_| format!("Longitude is not a number: '{}'", lon))?;

    let coordinate = Coordinate::new(lat, lon).map_err(|e| e.to_string())?;
    if coordinate.is_null_island() {
        return Err("Please enter non-zero coordinates".to_string());
    }

    let point_id = id
        .map(str::to_string)
        .unwrap_or_else(|| default_point_id(index));
    Ok(PointInput::new(point_id, coordinate))
}
