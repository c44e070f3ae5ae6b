#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial analytics engine for point-of-interest collections.
//!
//! Takes already-fetched point records and an area descriptor and produces
//! category breakdowns, scalar metrics (density, Shannon diversity,
//! nearest-neighbor index, walkability), two-area comparisons and a ranked
//! narrative of the differences.
//!
//! The analysis functions are synchronous and pure: no I/O, no caching, no
//! shared state. Only configuration loading and [`export`] touch the
//! outside world, and only those return [`AnalyticsError`].

pub mod breakdown;
pub mod compare;
pub mod config;
pub mod export;
pub mod insights;
pub mod metrics;

use geoanalytica_analytics_models::{Area, AreaAnalysis, Point};
use thiserror::Error;

use crate::config::HeuristicConfig;

/// Errors from configuration loading and export.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Reading or writing a file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing CSV output failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serializing JSON output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The heuristic configuration could not be parsed.
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}

/// Breakdown and metrics for a single named area.
#[must_use]
pub fn analyze_area(
    name: &str,
    points: &[Point],
    area: &Area,
    config: &HeuristicConfig,
) -> AreaAnalysis {
    analyze_area_km2(name, points, geoanalytica_spatial::area_km2(area), config)
}

/// [`analyze_area`] with the area already resolved to km².
#[must_use]
pub fn analyze_area_km2(
    name: &str,
    points: &[Point],
    area_km2: f64,
    config: &HeuristicConfig,
) -> AreaAnalysis {
    let breakdown = breakdown::analyze_breakdown(points);
    let metrics = metrics::compute_metrics(points, &breakdown, area_km2, config);

    log::debug!(
        "{name}: {} points, {:.2}/km², H={:.3}, NNI={:.3} ({})",
        breakdown.total,
        metrics.density,
        metrics.diversity_index,
        metrics.nearest_neighbor_index,
        metrics.spatial_pattern,
    );

    AreaAnalysis {
        name: name.to_string(),
        breakdown,
        metrics,
    }
}
