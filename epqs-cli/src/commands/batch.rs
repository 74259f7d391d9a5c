use anyhow::{Context, Result};
use epqs::{table, BatchSummary, ColumnSelection, CsvTable, ElevationResult};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use super::{build_client, print_results, print_summary, process_with_progress, ClientOptions};

/// Rows shown in the results preview.
const PREVIEW_ROWS: usize = 20;

pub fn run(
    options: &ClientOptions,
    input: PathBuf,
    output: Option<PathBuf>,
    id_col: Option<String>,
    lat_col: Option<String>,
    lon_col: Option<String>,
) -> Result<()> {
    let table = table::read_csv_path(&input).context("Error reading CSV file")?;
    println!(
        "File loaded: {} ({} rows, {} columns)",
        input.display(),
        table.len(),
        table.column_count()
    );

    let selection = ColumnSelection::detect_with_overrides(table.headers(), id_col, lat_col, lon_col)
        .context("Failed to select columns")?;
    println!(
        "Columns: id='{}', latitude='{}', longitude='{}'",
        selection.id, selection.lat, selection.lon
    );

    // Every row is validated before the first request
    let points = table::extract_points(&table, &selection)?;

    let client = build_client(options)?;
    let results = process_with_progress(&client, &points, options.rate_limit())?;

    print_summary(&BatchSummary::from_results(&results));
    println!();
    print_results(&results, PREVIEW_ROWS);

    let output_path = output.unwrap_or_else(|| default_output_path(&input));
    save(&output_path, &table, &results)?;

    println!();
    println!("Output written to: {}", output_path.display());
    Ok(())
}

/// `<dir>/<stem>_elevations.csv` next to the input file.
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "points".to_string());
    input.with_file_name(format!("{}_elevations.csv", stem))
}

fn save(path: &Path, table: &CsvTable, results: &[ElevationResult]) -> Result<()> {
    let file = File::create(path).context("Failed to create output file")?;
    table::write_results(BufWriter::new(file), table, results).context("Failed to write results")
}
