//! `GeoJSON` point collections and polygon area files.

use geo::Centroid as _;
use geoanalytica_analytics_models::{Area, LatLng, Point, Tags};
use geojson::feature::Id;
use geojson::{Feature, GeoJson, Geometry};

use crate::IngestError;

/// Parses a `GeoJSON` `FeatureCollection` (or single `Feature`) into points.
///
/// # Errors
///
/// Returns an error if the text is not `GeoJSON` or is a bare geometry.
pub fn parse_points(geojson_str: &str) -> Result<Vec<Point>, IngestError> {
    let geojson: GeoJson = geojson_str.parse()?;
    points_from_geojson(geojson)
}

/// Converts parsed `GeoJSON` features into points.
///
/// `Point` geometries give direct coordinates; any other geometry gives a
/// `center` at its centroid. Features without a usable geometry are
/// skipped.
///
/// # Errors
///
/// Returns [`IngestError::UnsupportedFormat`] for a bare geometry.
pub fn points_from_geojson(geojson: GeoJson) -> Result<Vec<Point>, IngestError> {
    let features = match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err(IngestError::UnsupportedFormat(
                "bare GeoJSON geometry has no point records".to_string(),
            ));
        }
    };

    let total = features.len();
    let points: Vec<Point> = features.into_iter().filter_map(feature_to_point).collect();

    if points.len() < total {
        log::debug!(
            "Skipped {} of {total} features without usable geometry",
            total - points.len()
        );
    }

    Ok(points)
}

fn feature_to_point(feature: Feature) -> Option<Point> {
    let id = feature_id(&feature);
    let tags = properties_to_tags(&feature);

    let Some(geometry) = feature.geometry else {
        log::trace!("  skipping feature without geometry");
        return None;
    };

    let mut point = Point {
        id,
        tags,
        ..Point::default()
    };

    if let Some((lat, lon)) = point_position(&geometry) {
        point.lat = Some(lat);
        point.lon = Some(lon);
    } else {
        point.center = Some(centroid(geometry)?);
    }

    Some(point)
}

fn point_position(geometry: &Geometry) -> Option<(f64, f64)> {
    match &geometry.value {
        geojson::Value::Point(position) => match position.as_slice() {
            [lon, lat, ..] => Some((*lat, *lon)),
            _ => None,
        },
        _ => None,
    }
}

fn centroid(geometry: Geometry) -> Option<LatLng> {
    let geo_geom: geo::Geometry<f64> = match geometry.try_into() {
        Ok(g) => g,
        Err(e) => {
            log::trace!("  skipping feature with unconvertible geometry: {e}");
            return None;
        }
    };

    let center = geo_geom.centroid()?;
    Some(LatLng::new(center.y(), center.x()))
}

/// Feature `id`, falling back to an `id` property. Only numeric ids are
/// kept.
fn feature_id(feature: &Feature) -> Option<u64> {
    let from_feature = match &feature.id {
        Some(Id::Number(n)) => n.as_u64(),
        Some(Id::String(s)) => s.parse().ok(),
        None => None,
    };

    from_feature.or_else(|| {
        let value = feature.properties.as_ref()?.get("id")?;
        value
            .as_u64()
            .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
    })
}

/// Scalar properties become tags; nested values and nulls are dropped.
fn properties_to_tags(feature: &Feature) -> Tags {
    let Some(properties) = &feature.properties else {
        return Tags::new();
    };

    properties
        .iter()
        .filter(|(key, _)| key.as_str() != "id")
        .filter_map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            (!text.is_empty()).then(|| (key.clone(), text))
        })
        .collect()
}

/// Parses a polygon area file: a `Polygon` geometry, a `Feature` holding
/// one, or a `FeatureCollection` with exactly one such feature.
///
/// The exterior ring becomes the vertex list; holes are ignored.
///
/// # Errors
///
/// Returns [`IngestError::InvalidArea`] if the document does not hold a
/// single polygon with at least three distinct vertices.
pub fn parse_area(geojson_str: &str) -> Result<Area, IngestError> {
    let geojson: GeoJson = geojson_str.parse()?;

    let geometry = match geojson {
        GeoJson::Geometry(geometry) => Some(geometry),
        GeoJson::Feature(feature) => feature.geometry,
        GeoJson::FeatureCollection(collection) => {
            let [feature] = <[Feature; 1]>::try_from(collection.features).map_err(|features| {
                IngestError::InvalidArea(format!(
                    "expected exactly one feature, found {}",
                    features.len()
                ))
            })?;
            feature.geometry
        }
    }
    .ok_or_else(|| IngestError::InvalidArea("feature has no geometry".to_string()))?;

    let geo_geom: geo::Geometry<f64> = geometry.try_into()?;
    let polygon = match geo_geom {
        geo::Geometry::Polygon(polygon) => polygon,
        geo::Geometry::MultiPolygon(geo::MultiPolygon(polygons)) => {
            let [polygon] = <[geo::Polygon<f64>; 1]>::try_from(polygons).map_err(|polygons| {
                IngestError::InvalidArea(format!(
                    "expected a single polygon, found {}",
                    polygons.len()
                ))
            })?;
            polygon
        }
        _ => {
            return Err(IngestError::InvalidArea(
                "expected a Polygon geometry".to_string(),
            ));
        }
    };

    if !polygon.interiors().is_empty() {
        log::debug!(
            "Ignoring {} interior ring(s) in study area",
            polygon.interiors().len()
        );
    }

    let mut vertices: Vec<LatLng> = polygon
        .exterior()
        .coords()
        .map(|c| LatLng::new(c.y, c.x))
        .collect();

    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }

    if vertices.len() < 3 {
        return Err(IngestError::InvalidArea(format!(
            "polygon has {} distinct vertices, need at least 3",
            vertices.len()
        )));
    }

    Ok(Area::polygon(vertices))
}
