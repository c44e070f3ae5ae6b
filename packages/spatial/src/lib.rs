#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Distance and area kernel for point-set analytics.
//!
//! Provides the great-circle distance used by the nearest-neighbor
//! computation and the area denominators used for density. Polygon areas
//! are a planar approximation (shoelace on degree coordinates, rescaled at
//! the ring's mean latitude), which is only accurate for regions small
//! enough that projection distortion does not matter, i.e. the
//! neighborhood-to-city scale of a map search.

use geo::{Area as _, LineString, Polygon};
use geoanalytica_analytics_models::{Area, LatLng};

/// Earth radius used for great-circle distances, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers per degree of latitude used by the polygon approximation.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Great-circle distance between two coordinates, in kilometers.
///
/// Returns 0 for identical coordinates.
#[must_use]
pub fn haversine_distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Great-circle distance between two [`LatLng`]s, in kilometers.
#[must_use]
pub fn distance_km(a: LatLng, b: LatLng) -> f64 {
    haversine_distance_km(a.lat, a.lng, b.lat, b.lng)
}

/// Area of a circle of the given radius, in km².
///
/// Non-finite or non-positive radii yield 0.
#[must_use]
pub fn circle_area_km2(radius_meters: f64) -> f64 {
    if !radius_meters.is_finite() || radius_meters <= 0.0 {
        return 0.0;
    }
    std::f64::consts::PI * radius_meters.powi(2) / 1_000_000.0
}

/// Approximate area of a simple polygon, in km².
///
/// The ring is implicitly closed; a repeated closing vertex is ignored.
/// Rings with fewer than 3 distinct vertices, or with any non-finite
/// vertex, yield 0.
#[must_use]
pub fn polygon_area_km2(vertices: &[LatLng]) -> f64 {
    let ring = open_ring(vertices);

    if ring.len() < 3 {
        log::debug!("Polygon has {} vertices, treating area as 0", ring.len());
        return 0.0;
    }
    if ring.iter().any(|v| !v.lat.is_finite() || !v.lng.is_finite()) {
        log::debug!("Polygon has non-finite vertices, treating area as 0");
        return 0.0;
    }

    let exterior = LineString::from(ring.iter().map(|v| (v.lng, v.lat)).collect::<Vec<_>>());
    let area_deg2 = Polygon::new(exterior, vec![]).unsigned_area();

    #[allow(clippy::cast_precision_loss)]
    let mean_lat = ring.iter().map(|v| v.lat).sum::<f64>() / ring.len() as f64;

    area_deg2 * KM_PER_DEGREE * (KM_PER_DEGREE * mean_lat.to_radians().cos())
}

/// Area of an [`Area`] descriptor, in km².
#[must_use]
pub fn area_km2(area: &Area) -> f64 {
    match area {
        Area::Circle { radius_meters, .. } => circle_area_km2(*radius_meters),
        Area::Polygon { polygon_vertices } => polygon_area_km2(polygon_vertices),
    }
}

/// Drops a trailing vertex that repeats the first one.
fn open_ring(vertices: &[LatLng]) -> &[LatLng] {
    match vertices {
        [first, .., last] if first == last => &vertices[..vertices.len() - 1],
        _ => vertices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(lat: f64, lng: f64, size: f64) -> Vec<LatLng> {
        vec![
            LatLng::new(lat, lng),
            LatLng::new(lat, lng + size),
            LatLng::new(lat + size, lng + size),
            LatLng::new(lat + size, lng),
        ]
    }

    #[test]
    fn haversine_identical_points_is_zero() {
        assert!(haversine_distance_km(38.72, -9.14, 38.72, -9.14).abs() < f64::EPSILON);
    }

    #[test]
    fn haversine_one_degree_of_latitude() {
        let d = haversine_distance_km(0.0, 0.0, 1.0, 0.0);
        let expected = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;
        assert!((d - expected).abs() < 1e-9, "got {d}");
    }

    #[test]
    fn haversine_is_symmetric() {
        let ab = haversine_distance_km(40.4168, -3.7038, 48.8566, 2.3522);
        let ba = haversine_distance_km(48.8566, 2.3522, 40.4168, -3.7038);
        assert!((ab - ba).abs() < 1e-9);
        // Madrid to Paris is roughly 1050 km.
        assert!((1000.0..1100.0).contains(&ab), "got {ab}");
    }

    #[test]
    fn circle_area_of_one_km_radius() {
        assert!((circle_area_km2(1000.0) - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn circle_area_rejects_bad_radius() {
        assert!(circle_area_km2(0.0).abs() < f64::EPSILON);
        assert!(circle_area_km2(-5.0).abs() < f64::EPSILON);
        assert!(circle_area_km2(f64::NAN).abs() < f64::EPSILON);
    }

    #[test]
    fn equatorial_square_degree() {
        let area = polygon_area_km2(&square(0.0, 0.0, 1.0));
        // Mean latitude is 0.5 degrees, so the cosine factor is ~0.99996.
        let expected = 111.0 * 111.0 * 0.5_f64.to_radians().cos();
        assert!((area - expected).abs() < 1e-6, "got {area}");
    }

    #[test]
    fn polygon_area_shrinks_with_latitude() {
        let equator = polygon_area_km2(&square(0.0, 0.0, 0.1));
        let north = polygon_area_km2(&square(60.0, 0.0, 0.1));
        assert!(north > 0.0);
        assert!(north < equator * 0.51);
    }

    #[test]
    fn polygon_area_is_rotation_invariant() {
        let ring = vec![
            LatLng::new(38.70, -9.20),
            LatLng::new(38.71, -9.12),
            LatLng::new(38.75, -9.10),
            LatLng::new(38.77, -9.16),
            LatLng::new(38.74, -9.21),
        ];
        let base = polygon_area_km2(&ring);
        assert!(base > 0.0);

        for shift in 1..ring.len() {
            let mut rotated = ring.clone();
            rotated.rotate_left(shift);
            let area = polygon_area_km2(&rotated);
            assert!((area - base).abs() < 1e-9, "shift {shift}: {area} vs {base}");
        }
    }

    #[test]
    fn polygon_orientation_does_not_matter() {
        let mut ring = square(10.0, 10.0, 0.5);
        let ccw = polygon_area_km2(&ring);
        ring.reverse();
        let cw = polygon_area_km2(&ring);
        assert!((ccw - cw).abs() < 1e-9);
    }

    #[test]
    fn closed_ring_matches_open_ring() {
        let open = square(5.0, 5.0, 0.2);
        let mut closed = open.clone();
        closed.push(open[0]);
        assert!((polygon_area_km2(&open) - polygon_area_km2(&closed)).abs() < 1e-12);
    }

    #[test]
    fn degenerate_polygons_have_zero_area() {
        assert!(polygon_area_km2(&[]).abs() < f64::EPSILON);
        assert!(polygon_area_km2(&[LatLng::new(1.0, 1.0), LatLng::new(2.0, 2.0)]).abs() < f64::EPSILON);

        let closed_pair = [LatLng::new(1.0, 1.0), LatLng::new(2.0, 2.0), LatLng::new(1.0, 1.0)];
        assert!(polygon_area_km2(&closed_pair).abs() < f64::EPSILON);

        let mut with_nan = square(0.0, 0.0, 1.0);
        with_nan[2].lat = f64::NAN;
        assert!(polygon_area_km2(&with_nan).abs() < f64::EPSILON);
    }

    #[test]
    fn area_dispatches_on_descriptor() {
        assert!((area_km2(&Area::circle(1000.0)) - std::f64::consts::PI).abs() < 1e-12);
        let polygon = Area::polygon(square(0.0, 0.0, 1.0));
        assert!(area_km2(&polygon) > 12_000.0);
    }
}
