//! CSV and JSON exports for point sets and comparisons.
//!
//! The comparison reports are multi-section CSV documents meant for
//! spreadsheets, so rows have varying widths. Timestamps are supplied by
//! the caller to keep the output reproducible.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use chrono::{DateTime, Utc};
use geoanalytica_analytics_models::{ComparisonResult, Point};

use crate::AnalyticsError;
use crate::insights::short_name;
use crate::metrics::density;

/// Attribution footer for exported reports.
pub const DATA_SOURCE: &str = "OpenStreetMap Contributors";

fn csv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new().flexible(true).from_writer(writer)
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Writes one row per point: `Name,Type,Latitude,Longitude`.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if writing to `writer` fails.
pub fn points_csv<W: Write>(points: &[Point], writer: W) -> Result<(), AnalyticsError> {
    let mut wtr = csv_writer(writer);
    wtr.write_record(["Name", "Type", "Latitude", "Longitude"])?;

    for point in points {
        let (lat, lon) = point.coordinates().map_or_else(
            || ("N/A".to_string(), "N/A".to_string()),
            |c| (c.lat.to_string(), c.lng.to_string()),
        );
        wtr.write_record([
            point.tag("name").unwrap_or("Unnamed"),
            point.tag("amenity").unwrap_or("Unknown"),
            lat.as_str(),
            lon.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes the summary comparison report.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if writing to `writer` fails.
pub fn comparison_report_csv<W: Write>(
    result: &ComparisonResult,
    generated_at: &DateTime<Utc>,
    writer: W,
) -> Result<(), AnalyticsError> {
    let mut wtr = csv_writer(writer);
    let (c1, c2, diff) = (&result.city1, &result.city2, &result.comparison);
    let (m1, m2) = (&c1.metrics, &c2.metrics);

    wtr.write_record(["CITY COMPARISON REPORT"])?;
    wtr.write_record(["Generated", format_timestamp(generated_at).as_str()])?;

    wtr.write_record(["STUDY PARAMETERS"])?;
    wtr.write_record(["City 1", c1.name.as_str()])?;
    wtr.write_record(["City 2", c2.name.as_str()])?;
    wtr.write_record(["Study Area (km²)", &format!("{:.2}", result.area_km2)])?;

    wtr.write_record(["SUMMARY METRICS"])?;
    wtr.write_record(["Metric", "City 1", "City 2", "Difference"])?;
    wtr.write_record([
        "Total Points".to_string(),
        c1.breakdown.total.to_string(),
        c2.breakdown.total.to_string(),
        diff.total_difference.to_string(),
    ])?;
    wtr.write_record([
        "Density (pts/km²)".to_string(),
        format!("{:.2}", m1.density),
        format!("{:.2}", m2.density),
        format!("{:.1}%", diff.density_difference_pct),
    ])?;
    wtr.write_record([
        "Diversity Index".to_string(),
        format!("{:.3}", m1.diversity_index),
        format!("{:.3}", m2.diversity_index),
        format!("{:.3}", diff.diversity_difference),
    ])?;
    wtr.write_record([
        "Spatial Pattern (NNI)".to_string(),
        format!("{:.3}", m1.nearest_neighbor_index),
        format!("{:.3}", m2.nearest_neighbor_index),
        format!("{:.3}", diff.nni_difference),
    ])?;
    wtr.write_record([
        "Walkability Score".to_string(),
        format!("{:.1}", m1.walkability_score),
        format!("{:.1}", m2.walkability_score),
        format!("{:.1}", m1.walkability_score - m2.walkability_score),
    ])?;

    let (short1, short2) = (short_name(&c1.name), short_name(&c2.name));

    wtr.write_record(["AMENITY TYPE BREAKDOWN"])?;
    wtr.write_record(["Type", short1, short2])?;
    for key in union_keys(&c1.breakdown.by_amenity, &c2.breakdown.by_amenity) {
        wtr.write_record([
            key.to_string(),
            count_of(&c1.breakdown.by_amenity, key).to_string(),
            count_of(&c2.breakdown.by_amenity, key).to_string(),
        ])?;
    }

    if !c1.breakdown.by_cuisine.is_empty() || !c2.breakdown.by_cuisine.is_empty() {
        wtr.write_record(["CUISINE TYPE BREAKDOWN"])?;
        wtr.write_record(["Cuisine", short1, short2])?;
        for key in union_keys(&c1.breakdown.by_cuisine, &c2.breakdown.by_cuisine) {
            wtr.write_record([
                key.to_string(),
                count_of(&c1.breakdown.by_cuisine, key).to_string(),
                count_of(&c2.breakdown.by_cuisine, key).to_string(),
            ])?;
        }
    }

    wtr.write_record(["Data Source", DATA_SOURCE])?;
    wtr.flush()?;
    Ok(())
}

/// Writes the per-amenity density comparison report.
///
/// `radius_meters` is printed as the study radius when the comparison was
/// made over a circular area.
///
/// Category rows come from the breakdown, which tallies every point
/// including those without usable coordinates. They line up with the
/// summary report's counts, not with [`Metrics::density`], so their
/// densities can add up to more than the headline density.
///
/// [`Metrics::density`]: geoanalytica_analytics_models::Metrics::density
///
/// # Errors
///
/// Returns [`AnalyticsError`] if writing to `writer` fails.
pub fn detailed_comparison_csv<W: Write>(
    result: &ComparisonResult,
    radius_meters: Option<f64>,
    generated_at: &DateTime<Utc>,
    writer: W,
) -> Result<(), AnalyticsError> {
    let mut wtr = csv_writer(writer);
    let (c1, c2) = (&result.city1, &result.city2);
    let (short1, short2) = (short_name(&c1.name), short_name(&c2.name));

    wtr.write_record(["DETAILED CITY COMPARISON ANALYSIS"])?;
    wtr.write_record(["Generated", format_timestamp(generated_at).as_str()])?;
    if let Some(radius) = radius_meters {
        wtr.write_record(["Study Radius (km)", &format!("{:.1}", radius / 1000.0)])?;
    }
    wtr.write_record(["Study Area (km²)", &format!("{:.2}", result.area_km2)])?;

    wtr.write_record(["DENSITY ANALYSIS (Per km²)"])?;
    wtr.write_record([
        "Category".to_string(),
        format!("{short1} Count"),
        format!("{short1} Density"),
        format!("{short2} Count"),
        format!("{short2} Density"),
        "Density Difference".to_string(),
    ])?;
    for key in union_keys(&c1.breakdown.by_amenity, &c2.breakdown.by_amenity) {
        let count1 = count_of(&c1.breakdown.by_amenity, key);
        let count2 = count_of(&c2.breakdown.by_amenity, key);
        let density1 = category_density(count1, result.area_km2);
        let density2 = category_density(count2, result.area_km2);
        wtr.write_record([
            key.to_string(),
            count1.to_string(),
            format!("{density1:.2}"),
            count2.to_string(),
            format!("{density2:.2}"),
            format!("{:.2}", density1 - density2),
        ])?;
    }

    wtr.write_record(["SPATIAL PATTERN"])?;
    wtr.write_record(["Metric", short1, short2])?;
    wtr.write_record([
        "Nearest Neighbor Index".to_string(),
        format!("{:.3}", c1.metrics.nearest_neighbor_index),
        format!("{:.3}", c2.metrics.nearest_neighbor_index),
    ])?;
    wtr.write_record([
        "Pattern",
        c1.metrics.spatial_pattern.as_ref(),
        c2.metrics.spatial_pattern.as_ref(),
    ])?;

    wtr.flush()?;
    Ok(())
}

/// Pretty-printed JSON of a comparison.
///
/// # Errors
///
/// Returns [`AnalyticsError::Json`] if serialization fails.
pub fn comparison_json(result: &ComparisonResult) -> Result<String, AnalyticsError> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// `base_YYYY-MM-DDTHH-MM-SS.extension`
#[must_use]
pub fn timestamped_filename(base: &str, extension: &str, at: &DateTime<Utc>) -> String {
    format!("{base}_{}.{extension}", at.format("%Y-%m-%dT%H-%M-%S"))
}

fn union_keys<'a>(
    a: &'a BTreeMap<String, u64>,
    b: &'a BTreeMap<String, u64>,
) -> BTreeSet<&'a str> {
    a.keys().chain(b.keys()).map(String::as_str).collect()
}

fn count_of(map: &BTreeMap<String, u64>, key: &str) -> u64 {
    map.get(key).copied().unwrap_or(0)
}

fn category_density(count: u64, area_km2: f64) -> f64 {
    density(usize::try_from(count).unwrap_or(usize::MAX), area_km2)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;
    use geoanalytica_analytics_models::Area;

    use super::*;
    use crate::compare::{NamedPoints, compare_areas};
    use crate::config::HeuristicConfig;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<(), AnalyticsError>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn sample() -> ComparisonResult {
        let first = vec![
            Point::at(1.0, 1.0)
                .with_tag("amenity", "restaurant")
                .with_tag("cuisine", "italian"),
            Point::at(1.001, 1.0).with_tag("amenity", "cafe"),
        ];
        let second = vec![Point::at(1.0, 1.0).with_tag("amenity", "bank")];

        compare_areas(
            NamedPoints {
                name: "Lisbon, Portugal",
                points: &first,
            },
            NamedPoints {
                name: "Porto, Portugal",
                points: &second,
            },
            &Area::circle(1000.0),
            &HeuristicConfig::default(),
        )
    }

    #[test]
    fn points_csv_uses_fallbacks() {
        let points = vec![
            Point::at(38.7, -9.1)
                .with_tag("name", "Café A Brasileira, Chiado")
                .with_tag("amenity", "cafe"),
            Point::default(),
        ];
        let out = render(|buf| points_csv(&points, buf));
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "Name,Type,Latitude,Longitude");
        assert_eq!(lines[1], "\"Café A Brasileira, Chiado\",cafe,38.7,-9.1");
        assert_eq!(lines[2], "Unnamed,Unknown,N/A,N/A");
    }

    #[test]
    fn comparison_report_sections() {
        let result = sample();
        let out = render(|buf| comparison_report_csv(&result, &at(), buf));

        assert!(out.starts_with("CITY COMPARISON REPORT\nGenerated,2026-03-14 09:26:53 UTC\n"));
        assert!(out.contains("City 1,\"Lisbon, Portugal\"\n"));
        assert!(out.contains("Study Area (km²),3.14\n"));
        assert!(out.contains("Total Points,2,1,1\n"));
        assert!(out.contains("Density (pts/km²),0.64,0.32,100.0%\n"));
        assert!(out.contains("Type,Lisbon,Porto\nbank,0,1\ncafe,1,0\nrestaurant,1,0\n"));
        assert!(out.contains("CUISINE TYPE BREAKDOWN\nCuisine,Lisbon,Porto\nitalian,1,0\n"));
        assert!(out.ends_with("Data Source,OpenStreetMap Contributors\n"));
    }

    #[test]
    fn comparison_report_omits_empty_cuisine_section() {
        let mut result = sample();
        result.city1.breakdown.by_cuisine.clear();
        let out = render(|buf| comparison_report_csv(&result, &at(), buf));
        assert!(!out.contains("CUISINE TYPE BREAKDOWN"));
    }

    #[test]
    fn detailed_report_includes_densities_and_patterns() {
        let result = sample();
        let out = render(|buf| detailed_comparison_csv(&result, Some(1000.0), &at(), buf));

        assert!(out.contains("Study Radius (km),1.0\n"));
        assert!(out.contains(
            "Category,Lisbon Count,Lisbon Density,Porto Count,Porto Density,Density Difference\n"
        ));
        assert!(out.contains("bank,0,0.00,1,0.32,-0.32\n"));
        // Two points 111 m apart in 3.14 km² are clustered; a single point is neutral.
        assert!(out.contains("Pattern,Clustered,Random\n"));

        let polygon = render(|buf| detailed_comparison_csv(&result, None, &at(), buf));
        assert!(!polygon.contains("Study Radius"));
    }

    #[test]
    fn detailed_rows_count_points_without_coordinates() {
        let first = vec![
            Point::at(1.0, 1.0).with_tag("amenity", "cafe"),
            Point::default().with_tag("amenity", "cafe"),
        ];
        let result = compare_areas(
            NamedPoints {
                name: "A",
                points: &first,
            },
            NamedPoints {
                name: "B",
                points: &[],
            },
            &Area::circle(1000.0),
            &HeuristicConfig::default(),
        );
        assert_eq!(result.city1.metrics.point_count, 1);

        let out = render(|buf| detailed_comparison_csv(&result, None, &at(), buf));
        // 2 / pi per km², above the headline density of 1 / pi.
        assert!(out.contains("cafe,2,0.64,0,0.00,0.64\n"), "{out}");
        assert!((result.city1.metrics.density - 1.0 / std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn json_is_camel_case_and_pretty() {
        let result = sample();
        let json = comparison_json(&result).unwrap();
        assert!(json.contains("\n  \"areaKm2\""));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["city1"]["name"], "Lisbon, Portugal");
        assert_eq!(value["comparison"]["totalDifference"], 1);
        assert_eq!(value["city2"]["metrics"]["pointCount"], 1);
    }

    #[test]
    fn timestamped_filename_format() {
        assert_eq!(
            timestamped_filename("city-comparison", "csv", &at()),
            "city-comparison_2026-03-14T09-26-53.csv"
        );
    }
}
