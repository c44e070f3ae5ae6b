//! Delimited point files with a header row.
//!
//! Coordinate columns are found by header name. Every other non-empty
//! cell becomes a tag keyed by its header.

use std::io::Read;

use geoanalytica_analytics_models::{Point, Tags};

use crate::IngestError;

const LATITUDE_HEADERS: &[&str] = &["lat", "latitude", "y"];
const LONGITUDE_HEADERS: &[&str] = &["lon", "lng", "long", "longitude", "x"];
const ID_HEADERS: &[&str] = &["id", "osm_id"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    lat: usize,
    lon: usize,
    id: Option<usize>,
}

impl Columns {
    fn detect(headers: &csv::StringRecord) -> Option<Self> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.contains(&h.trim().to_ascii_lowercase().as_str()))
        };

        Some(Self {
            lat: find(LATITUDE_HEADERS)?,
            lon: find(LONGITUDE_HEADERS)?,
            id: find(ID_HEADERS),
        })
    }

    fn is_reserved(&self, index: usize) -> bool {
        index == self.lat || index == self.lon || Some(index) == self.id
    }
}

/// Reads points from CSV with a header row.
///
/// Rows that cannot be read or whose coordinates do not parse as numbers
/// are skipped.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumns`] if no latitude or longitude
/// column is found, or [`IngestError::Csv`] if the header row cannot be
/// read.
pub fn parse_points<R: Read>(reader: R) -> Result<Vec<Point>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let columns = Columns::detect(&headers).ok_or_else(|| {
        IngestError::MissingColumns(format!(
            "no latitude/longitude columns in header [{}]",
            headers.iter().collect::<Vec<_>>().join(", ")
        ))
    })?;

    log::debug!("CSV coordinate columns: {columns:?}");

    let mut points = Vec::new();
    let mut skipped = 0u64;

    for result in csv_reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                log::trace!("  skipping malformed row: {e}");
                skipped += 1;
                continue;
            }
        };

        match row_to_point(&headers, &record, columns) {
            Some(point) => points.push(point),
            None => {
                log::trace!("  skipping row without numeric coordinates: {record:?}");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} unreadable CSV rows");
    }

    Ok(points)
}

fn row_to_point(
    headers: &csv::StringRecord,
    record: &csv::StringRecord,
    columns: Columns,
) -> Option<Point> {
    let lat = record.get(columns.lat)?.parse::<f64>().ok()?;
    let lon = record.get(columns.lon)?.parse::<f64>().ok()?;
    let id = columns
        .id
        .and_then(|i| record.get(i))
        .and_then(|v| v.parse().ok());

    let tags: Tags = headers
        .iter()
        .zip(record.iter())
        .enumerate()
        .filter(|(index, (key, value))| {
            !columns.is_reserved(*index) && !key.is_empty() && !value.is_empty()
        })
        .map(|(_, (key, value))| (key.to_string(), value.to_string()))
        .collect();

    Some(Point {
        id,
        tags,
        ..Point::at(lat, lon)
    })
}
