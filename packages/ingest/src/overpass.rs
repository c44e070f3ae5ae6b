//! Overpass API JSON responses.
//!
//! Elements deserialize straight into [`Point`]; nodes carry `lat`/`lon`
//! and ways/relations fetched with `out center` carry a `center`.

use geoanalytica_analytics_models::Point;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OverpassDocument {
    Response { elements: Vec<Point> },
    Elements(Vec<Point>),
}

impl OverpassDocument {
    fn into_elements(self) -> Vec<Point> {
        match self {
            Self::Response { elements } | Self::Elements(elements) => elements,
        }
    }
}

/// Parses an Overpass response (`{"elements": [...]}`) or a bare array of
/// elements.
///
/// # Errors
///
/// Returns an error if the document matches neither shape.
pub fn parse_points(json: &str) -> Result<Vec<Point>, serde_json::Error> {
    let document: OverpassDocument = serde_json::from_str(json)?;
    Ok(document.into_elements())
}

/// [`parse_points`] for an already-parsed JSON value.
///
/// # Errors
///
/// Returns an error if the value matches neither shape.
pub fn points_from_value(value: serde_json::Value) -> Result<Vec<Point>, serde_json::Error> {
    let document: OverpassDocument = serde_json::from_value(value)?;
    Ok(document.into_elements())
}
