#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident-aware campus walking routes.
//!
//! ```text
//! safe_route resolve "43.6577, -79.3788"
//! safe_route score --routes routes.json --incidents incidents.json [--radius 80] [--penalty 900]
//! safe_route route --origin Library --destination Gym [--lat 43.65 --lng -79.38] [--geojson]
//! safe_route watch --origin Library --destination Gym
//! ```
//!
//! `--config <file>` loads a TOML configuration; `SAFE_ROUTE_*`
//! environment variables override it. Log output is controlled with
//! `RUST_LOG` (default `info`).

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "safe_route", about = "Incident-aware campus walking routes")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Device position given as `--lat`/`--lng`.
#[derive(clap::Args)]
struct DeviceArgs {
    /// Device latitude, used when the origin is blank
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    lat: Option<f64>,
    /// Device longitude, used when the origin is blank
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lng: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how an origin/destination string is interpreted
    Resolve {
        /// `"lat, lng"` or a place name
        #[arg(allow_hyphen_values = true)]
        input: String,
    },
    /// Score candidate routes from a file against incidents from a file
    Score {
        /// JSON array of routes
        #[arg(long)]
        routes: PathBuf,
        /// JSON array of incident reports
        #[arg(long)]
        incidents: PathBuf,
        /// Proximity radius in meters
        #[arg(long)]
        radius: Option<f64>,
        /// Penalty in seconds per nearby incident
        #[arg(long)]
        penalty: Option<f64>,
    },
    /// Compute one route using the configured routing provider and feed
    Route {
        /// Origin: `"lat, lng"`, a place name, or empty for the device
        /// location
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        origin: String,
        /// Destination: `"lat, lng"` or a place name
        #[arg(long, allow_hyphen_values = true)]
        destination: String,
        #[command(flatten)]
        device: DeviceArgs,
        /// Read incidents from a JSON file instead of the live feed
        #[arg(long)]
        incidents: Option<PathBuf>,
        /// Print the chosen route as a `GeoJSON` `FeatureCollection`
        #[arg(long)]
        geojson: bool,
    },
    /// Keep a route up to date as incidents change, until Ctrl-C
    Watch {
        /// Origin: `"lat, lng"`, a place name, or empty for the device
        /// location
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        origin: String,
        /// Destination: `"lat, lng"` or a place name
        #[arg(long, allow_hyphen_values = true)]
        destination: String,
        #[command(flatten)]
        device: DeviceArgs,
    },
}

fn init_logger() {
    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();
    let cli = Cli::parse();

    let mut app_config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Resolve { input } => commands::resolve(&input)?,
        Commands::Score {
            routes,
            incidents,
            radius,
            penalty,
        } => {
            if let Some(radius) = radius {
                app_config.scoring.radius_meters = radius;
            }
            if let Some(penalty) = penalty {
                app_config.scoring.penalty_seconds_per_incident = penalty;
            }
            app_config.validate()?;
            commands::score(&app_config, &routes, &incidents)?;
        }
        Commands::Route {
            origin,
            destination,
            device,
            incidents,
            geojson,
        } => {
            let device_location = commands::device_location(device.lat, device.lng)?;
            commands::route(
                &app_config,
                commands::RouteRequest {
                    origin,
                    destination,
                    device_location,
                },
                incidents.as_deref(),
                geojson,
            )
            .await?;
        }
        Commands::Watch {
            origin,
            destination,
            device,
        } => {
            let device_location = commands::device_location(device.lat, device.lng)?;
            commands::watch(
                &app_config,
                commands::RouteRequest {
                    origin,
                    destination,
                    device_location,
                },
            )
            .await?;
        }
    }

    Ok(())
}
