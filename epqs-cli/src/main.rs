use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::ClientOptions;

/// USGS elevation point query CLI tool
#[derive(Parser)]
#[command(name = "epqs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Elevation Point Query Service endpoint
    #[arg(long, env = "EPQS_URL", global = true)]
    url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(short, long, env = "EPQS_TIMEOUT_SECS", global = true)]
    timeout: Option<u64>,

    /// Attempts per point when requests time out
    #[arg(long, env = "EPQS_MAX_ATTEMPTS", global = true)]
    max_attempts: Option<u32>,

    /// Pause between consecutive points, in milliseconds
    #[arg(
        short,
        long,
        env = "EPQS_RATE_LIMIT_MS",
        default_value = "500",
        global = true
    )]
    rate_limit_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query elevation for a single coordinate
    Query {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Query elevation for points given on the command line
    Points {
        /// Points as "ID,LAT,LON" or "LAT,LON"
        #[arg(required = true, allow_hyphen_values = true)]
        points: Vec<String>,

        /// Output CSV file
        #[arg(short, long, default_value = "manual_elevations.csv")]
        output: PathBuf,
    },

    /// Process elevation for every row of a CSV file
    Batch {
        /// Input CSV file
        input: PathBuf,

        /// Output file (defaults to <input>_elevations.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column holding the point id (auto-detected if omitted)
        #[arg(long)]
        id_col: Option<String>,

        /// Column holding the latitude (auto-detected if omitted)
        #[arg(long)]
        lat_col: Option<String>,

        /// Column holding the longitude (auto-detected if omitted)
        #[arg(long)]
        lon_col: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "epqs=error,epqs_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let options = ClientOptions {
        url: cli.url,
        timeout_secs: cli.timeout,
        max_attempts: cli.max_attempts,
        rate_limit_ms: cli.rate_limit_ms,
    };

    match cli.command {
        Commands::Query { lat, lon, json } => commands::query::run(&options, lat, lon, json),
        Commands::Points { points, output } => commands::points::run(&options, points, output),
        Commands::Batch {
            input,
            output,
            id_col,
            lat_col,
            lon_col,
        } => commands::batch::run(&options, input, output, id_col, lat_col, lon_col),
    }
}
