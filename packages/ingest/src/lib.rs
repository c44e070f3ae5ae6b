#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Readers that turn point and area files into analytics inputs.
//!
//! Supports Overpass API JSON responses, `GeoJSON` feature collections
//! and delimited files with latitude/longitude columns. The format is
//! picked from the file extension.

pub mod features;
pub mod overpass;
pub mod table;

use std::path::Path;

use geoanalytica_analytics_models::{Area, Point};
use thiserror::Error;

/// Errors that can occur while reading point or area files.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Reading the file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid JSON or does not match the Overpass shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The delimited file could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The file is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The file extension or document type is not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The delimited file has no recognizable coordinate columns.
    #[error("Missing columns: {0}")]
    MissingColumns(String),

    /// The area file does not describe a usable polygon.
    #[error("Invalid area: {0}")]
    InvalidArea(String),
}

/// Point file formats, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointFormat {
    /// `.json`: an Overpass response, a bare element array or a
    /// `GeoJSON` document.
    Json,
    /// `.geojson`
    GeoJson,
    /// `.csv`
    Csv,
}

impl PointFormat {
    /// Detects the format from a file extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("geojson") => Ok(Self::GeoJson),
            Some("csv") => Ok(Self::Csv),
            _ => Err(IngestError::UnsupportedFormat(format!(
                "{} (expected .json, .geojson or .csv)",
                path.display()
            ))),
        }
    }
}

/// Reads a point file, dispatching on its extension.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_points(path: &Path) -> Result<Vec<Point>, IngestError> {
    let format = PointFormat::from_path(path)?;

    let points = match format {
        PointFormat::Csv => table::parse_points(std::fs::File::open(path)?)?,
        PointFormat::Json | PointFormat::GeoJson => {
            parse_points(&std::fs::read_to_string(path)?, format)?
        }
    };

    log::info!("Loaded {} points from {}", points.len(), path.display());
    Ok(points)
}

/// Parses in-memory point data of a known format.
///
/// A `.json` document whose `type` is `FeatureCollection` or `Feature` is
/// read as `GeoJSON`; anything else is read as Overpass JSON.
///
/// # Errors
///
/// Returns an error if the document cannot be parsed.
pub fn parse_points(contents: &str, format: PointFormat) -> Result<Vec<Point>, IngestError> {
    match format {
        PointFormat::Csv => table::parse_points(contents.as_bytes()),
        PointFormat::GeoJson => features::parse_points(contents),
        PointFormat::Json => {
            let value: serde_json::Value = serde_json::from_str(contents)?;
            let document_type = value.get("type").and_then(serde_json::Value::as_str);

            if matches!(document_type, Some("FeatureCollection" | "Feature")) {
                log::debug!("JSON document is GeoJSON, reading features");
                features::points_from_geojson(geojson::GeoJson::from_json_value(value)?)
            } else {
                Ok(overpass::points_from_value(value)?)
            }
        }
    }
}

/// Reads a `GeoJSON` polygon file into an [`Area::Polygon`].
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not `GeoJSON`, or does
/// not hold exactly one polygon.
pub fn load_area_polygon(path: &Path) -> Result<Area, IngestError> {
    let area = features::parse_area(&std::fs::read_to_string(path)?)?;
    log::info!("Loaded study area from {}", path.display());
    Ok(area)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_formats_from_extension() {
        assert_eq!(
            PointFormat::from_path(Path::new("pois.JSON")).unwrap(),
            PointFormat::Json
        );
        assert_eq!(
            PointFormat::from_path(Path::new("a/b/pois.geojson")).unwrap(),
            PointFormat::GeoJson
        );
        assert_eq!(
            PointFormat::from_path(Path::new("pois.csv")).unwrap(),
            PointFormat::Csv
        );
        assert!(matches!(
            PointFormat::from_path(Path::new("pois.xlsx")),
            Err(IngestError::UnsupportedFormat(_))
        ));
        assert!(PointFormat::from_path(Path::new("pois")).is_err());
    }

    #[test]
    fn json_feature_collection_routes_to_geojson_reader() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [-9.14, 38.71] },
                "properties": { "amenity": "cafe" }
            }]
        }"#;

        let points = parse_points(json, PointFormat::Json).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].tag("amenity"), Some("cafe"));
        assert_eq!(points[0].lat, Some(38.71));
    }

    #[test]
    fn json_overpass_response() {
        let json = r#"{ "version": 0.6, "elements": [
            { "type": "node", "id": 7, "lat": 1.5, "lon": 2.5, "tags": { "amenity": "bank" } }
        ] }"#;

        let points = parse_points(json, PointFormat::Json).unwrap();
        assert_eq!(points[0].id, Some(7));
        assert_eq!(points[0].tag("amenity"), Some("bank"));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            load_points(Path::new("/nonexistent/pois.csv")),
            Err(IngestError::Io(_))
        ));
        assert!(matches!(
            load_area_polygon(Path::new("/nonexistent/area.geojson")),
            Err(IngestError::Io(_))
        ));
    }

    #[test]
    fn loads_csv_from_disk() {
        let path = std::env::temp_dir().join(format!(
            "geoanalytica_ingest_{}.csv",
            std::process::id()
        ));
        std::fs::write(&path, "lat,lon,amenity\n1.0,2.0,cafe\n3.0,4.0,bar\n").unwrap();

        let points = load_points(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[1].tag("amenity"), Some("bar"));
    }
}
