//! Subcommand implementations.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::{DateTime, Utc};
use geoanalytica_analytics::breakdown::{cuisine_density, top_categories};
use geoanalytica_analytics::compare::{NamedPoints, compare_areas};
use geoanalytica_analytics::config::HeuristicConfig;
use geoanalytica_analytics::export::{
    comparison_json, comparison_report_csv, detailed_comparison_csv, points_csv,
    timestamped_filename,
};
use geoanalytica_analytics::insights::narrate;
use geoanalytica_analytics::{AnalyticsError, analyze_area};
use geoanalytica_analytics_models::{
    Area, AreaAnalysis, CategoryCount, ComparisonResult, InsightReport,
};
use geoanalytica_ingest::{IngestError, load_area_polygon, load_points};
use serde::Serialize;

use crate::{AnalyzeArgs, AreaArgs, CompareArgs};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOutput<'a> {
    analysis: &'a AreaAnalysis,
    top_amenities: Vec<CategoryCount>,
    top_cuisines: Vec<CategoryCount>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    cuisine_density: BTreeMap<String, f64>,
}

#[derive(Serialize)]
struct CompareOutput<'a> {
    comparison: &'a ComparisonResult,
    report: &'a InsightReport,
}

impl AreaArgs {
    fn resolve(&self) -> Result<Area, IngestError> {
        match (self.radius, &self.polygon) {
            (Some(radius), _) => {
                if !radius.is_finite() || radius <= 0.0 {
                    log::warn!("Radius {radius} m gives an empty study area");
                }
                Ok(Area::circle(radius))
            }
            (None, Some(path)) => load_area_polygon(path),
            (None, None) => Err(IngestError::InvalidArea(
                "either --radius or --polygon is required".to_string(),
            )),
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<HeuristicConfig, AnalyticsError> {
    path.map_or_else(|| Ok(HeuristicConfig::default()), HeuristicConfig::from_path)
}

/// Explicit name, or the file stem of the point file.
fn display_name(name: Option<&str>, points_path: &Path) -> String {
    name.map_or_else(
        || {
            points_path
                .file_stem()
                .map_or_else(|| "Area".to_string(), |s| s.to_string_lossy().into_owned())
        },
        str::to_string,
    )
}

fn write_file(
    path: &Path,
    write: impl FnOnce(BufWriter<File>) -> Result<(), AnalyticsError>,
) -> Result<(), AnalyticsError> {
    write(BufWriter::new(File::create(path)?))?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

pub fn analyze(args: &AnalyzeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let points = load_points(&args.points)?;
    let area = args.area.resolve()?;
    let config = load_config(args.config.as_deref())?;
    let name = display_name(args.name.as_deref(), &args.points);

    let analysis = analyze_area(&name, &points, &area, &config);
    log::info!(
        "{} {name}: {} (NNI {:.3})",
        analysis.metrics.spatial_pattern.icon(),
        analysis.metrics.spatial_pattern.description(),
        analysis.metrics.nearest_neighbor_index
    );

    let densities = args
        .cuisines
        .iter()
        .map(|cuisine| {
            (
                cuisine.clone(),
                cuisine_density(&points, cuisine, analysis.metrics.area_km2),
            )
        })
        .collect();

    let output = AnalyzeOutput {
        top_amenities: top_categories(&analysis.breakdown.by_amenity, args.top),
        top_cuisines: top_categories(&analysis.breakdown.by_cuisine, args.top),
        cuisine_density: densities,
        analysis: &analysis,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn compare(args: &CompareArgs) -> Result<(), Box<dyn std::error::Error>> {
    let first = load_points(&args.first)?;
    let second = load_points(&args.second)?;
    let area = args.area.resolve()?;
    let config = load_config(args.config.as_deref())?;

    let name_a = display_name(args.name_a.as_deref(), &args.first);
    let name_b = display_name(args.name_b.as_deref(), &args.second);

    let result = compare_areas(
        NamedPoints {
            name: &name_a,
            points: &first,
        },
        NamedPoints {
            name: &name_b,
            points: &second,
        },
        &area,
        &config,
    );
    let report = narrate(&result, &config);

    for insight in &report.insights {
        log::info!("{} {}", insight.icon, insight.text);
    }
    log::info!("Similarity score: {:.0}/100", report.similarity_score);

    let generated_at = Utc::now();
    let radius = area.radius_meters();

    if let Some(path) = &args.csv {
        write_file(path, |w| comparison_report_csv(&result, &generated_at, w))?;
    }
    if let Some(path) = &args.detailed_csv {
        write_file(path, |w| {
            detailed_comparison_csv(&result, radius, &generated_at, w)
        })?;
    }
    if let Some(path) = &args.json {
        std::fs::write(path, comparison_json(&result)?)?;
        log::info!("Wrote {}", path.display());
    }
    if let Some(dir) = &args.out_dir {
        write_all_exports(dir, &result, radius, &generated_at)?;
    }

    let output = CompareOutput {
        comparison: &result,
        report: &report,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn write_all_exports(
    dir: &Path,
    result: &ComparisonResult,
    radius: Option<f64>,
    generated_at: &DateTime<Utc>,
) -> Result<(), AnalyticsError> {
    std::fs::create_dir_all(dir)?;

    write_file(
        &dir.join(timestamped_filename("city-comparison", "csv", generated_at)),
        |w| comparison_report_csv(result, generated_at, w),
    )?;
    write_file(
        &dir.join(timestamped_filename("detailed-analysis", "csv", generated_at)),
        |w| detailed_comparison_csv(result, radius, generated_at, w),
    )?;

    let json_path = dir.join(timestamped_filename("city-comparison", "json", generated_at));
    std::fs::write(&json_path, comparison_json(result)?)?;
    log::info!("Wrote {}", json_path.display());

    Ok(())
}

pub fn export_points(points_path: &Path, out: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let points = load_points(points_path)?;
    write_file(out, |w| points_csv(&points, w))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_file_stem() {
        assert_eq!(
            display_name(None, Path::new("data/lisbon-center.json")),
            "lisbon-center"
        );
        assert_eq!(
            display_name(Some("Lisbon, Portugal"), Path::new("x.json")),
            "Lisbon, Portugal"
        );
    }

    #[test]
    fn radius_resolves_to_circle() {
        let args = AreaArgs {
            radius: Some(1500.0),
            polygon: None,
        };
        assert_eq!(args.resolve().unwrap(), Area::circle(1500.0));
    }

    #[test]
    fn missing_area_is_an_error() {
        let args = AreaArgs {
            radius: None,
            polygon: None,
        };
        assert!(matches!(args.resolve(), Err(IngestError::InvalidArea(_))));
    }

    #[test]
    fn default_config_without_path() {
        assert_eq!(load_config(None).unwrap(), HeuristicConfig::default());
    }
}
