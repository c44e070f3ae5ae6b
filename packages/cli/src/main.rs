#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the spatial analytics engine.
//!
//! Reads point files (Overpass JSON, `GeoJSON`, CSV), analyzes or compares
//! them over a circular or polygon study area and prints the results as
//! JSON. Comparisons can also be exported as CSV reports.

mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "geoanalytica",
    about = "Spatial analytics for point-of-interest collections"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Break down and score a single point set
    Analyze(AnalyzeArgs),
    /// Compare two point sets over the same study area
    Compare(CompareArgs),
    /// Write a point file as `Name,Type,Latitude,Longitude` CSV
    ExportPoints {
        /// Point file (.json, .geojson or .csv)
        points: PathBuf,
        /// Output CSV path
        out: PathBuf,
    },
}

/// The study area: exactly one of `--radius` or `--polygon`.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct AreaArgs {
    /// Circular study area radius in meters
    #[arg(long)]
    radius: Option<f64>,

    /// `GeoJSON` file holding the study area polygon
    #[arg(long)]
    polygon: Option<PathBuf>,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Point file (.json, .geojson or .csv)
    points: PathBuf,

    /// Display name for the area (defaults to the file stem)
    #[arg(long)]
    name: Option<String>,

    #[command(flatten)]
    area: AreaArgs,

    /// TOML file overriding the heuristic thresholds
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of top amenity and cuisine categories to list
    #[arg(long, default_value_t = 5)]
    top: usize,

    /// Report the density of points serving this cuisine (repeatable)
    #[arg(long = "cuisine")]
    cuisines: Vec<String>,
}

#[derive(Args)]
struct CompareArgs {
    /// First point file
    first: PathBuf,

    /// Second point file
    second: PathBuf,

    /// Display name for the first area
    #[arg(long)]
    name_a: Option<String>,

    /// Display name for the second area
    #[arg(long)]
    name_b: Option<String>,

    #[command(flatten)]
    area: AreaArgs,

    /// TOML file overriding the heuristic thresholds
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the summary comparison report CSV here
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write the per-amenity density CSV here
    #[arg(long)]
    detailed_csv: Option<PathBuf>,

    /// Write the comparison JSON here
    #[arg(long)]
    json: Option<PathBuf>,

    /// Write all three exports into this directory with timestamped names
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => commands::analyze(&args)?,
        Commands::Compare(args) => commands::compare(&args)?,
        Commands::ExportPoints { points, out } => commands::export_points(&points, &out)?,
    }

    Ok(())
}
