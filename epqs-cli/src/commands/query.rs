use anyhow::{Context, Result};
use epqs::{Coordinate, FetchOutcome, Status};
use serde::Serialize;

use super::{build_client, ClientOptions};

#[derive(Serialize)]
struct ElevationResponse {
    lat: f64,
    lon: f64,
    elevation_ft: Option<f64>,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

pub fn run(options: &ClientOptions, lat: f64, lon: f64, json: bool) -> Result<()> {
    // Reject bad input before any request goes out
    let coordinate = Coordinate::new(lat, lon).context("Invalid coordinate")?;

    let client = build_client(options)?;
    let outcome = client.fetch(coordinate);
    let elevation = outcome.elevation();

    if json {
        let response = ElevationResponse {
            lat,
            lon,
            elevation_ft: elevation,
            status: if elevation.is_some() {
                Status::Success
            } else {
                Status::Failed
            },
            warning: outcome.warning().map(str::to_string),
        };
        println!("{}", serde_json::to_string(&response)?);
        return Ok(());
    }

    match outcome {
        FetchOutcome::Elevation(elev) => println!("{:.2} ft", elev),
        FetchOutcome::NoData => println!("No Data"),
        FetchOutcome::TimedOut { attempts } => {
            eprintln!("Request timed out after {} attempts", attempts);
            println!("No Data");
        }
        FetchOutcome::Failed { reason } => {
            eprintln!("warning: {}", reason);
            println!("No Data");
        }
    }

    Ok(())
}
