//! Scalar statistics over a point collection: density, Shannon diversity,
//! nearest-neighbor index and the walkability composite.
//!
//! Every function is total. Degenerate inputs (no points, zero area, a
//! single located point) produce neutral values instead of `NaN` or
//! infinities.

use geoanalytica_analytics_models::{CategoryBreakdown, LatLng, Metrics, Point, SpatialPattern};
use geoanalytica_spatial::distance_km;

use crate::config::{HeuristicConfig, SpatialPatternConfig, WalkabilityConfig};

/// NNI reported when the index is undefined (fewer than two located
/// points, or no usable area).
pub const NEUTRAL_NNI: f64 = 1.0;

/// Points per km². Returns 0 for zero, negative or non-finite areas.
#[must_use]
pub fn density(count: usize, area_km2: f64) -> f64 {
    if count == 0 || !is_usable_area(area_km2) {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = count as f64;
    count / area_km2
}

/// `part / total * 100`, or 0 when `total` is 0.
#[must_use]
pub fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let pct = part as f64 / total as f64 * 100.0;
    pct
}

/// Shannon diversity index (natural log) of a set of category counts.
///
/// Zero counts are ignored. Returns 0 for an empty distribution and for a
/// distribution concentrated in a single category.
#[must_use]
pub fn shannon_diversity_index(counts: impl IntoIterator<Item = u64>) -> f64 {
    let counts: Vec<u64> = counts.into_iter().filter(|&c| c > 0).collect();
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let total = total as f64;

    counts
        .iter()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let proportion = count as f64 / total;
            -proportion * proportion.ln()
        })
        .sum()
}

/// Nearest-neighbor index of the located points in `points`.
///
/// Points without usable coordinates are skipped. See
/// [`nearest_neighbor_index_of`] for the computation and its cost.
#[must_use]
pub fn nearest_neighbor_index(points: &[Point], area_km2: f64) -> f64 {
    let located: Vec<LatLng> = points.iter().filter_map(Point::coordinates).collect();
    nearest_neighbor_index_of(&located, area_km2)
}

/// Nearest-neighbor index of a set of coordinates.
///
/// Observed mean nearest-neighbor distance divided by the mean expected
/// under a Poisson process of the same intensity, `0.5 / sqrt(n / area)`.
///
/// This compares every point with every other point, so it is O(n²) and
/// only suitable for the few hundred to few thousand points a single map
/// query returns.
///
/// Returns [`NEUTRAL_NNI`] for fewer than two points or an unusable area.
#[must_use]
pub fn nearest_neighbor_index_of(coords: &[LatLng], area_km2: f64) -> f64 {
    if coords.len() < 2 || !is_usable_area(area_km2) {
        return NEUTRAL_NNI;
    }

    let total_nearest: f64 = coords
        .iter()
        .enumerate()
        .map(|(i, &a)| {
            coords
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, &b)| distance_km(a, b))
                .fold(f64::INFINITY, f64::min)
        })
        .sum();

    #[allow(clippy::cast_precision_loss)]
    let n = coords.len() as f64;

    let observed_mean = total_nearest / n;
    let expected_mean = 0.5 / (n / area_km2).sqrt();

    observed_mean / expected_mean
}

/// Classifies a nearest-neighbor index.
#[must_use]
pub fn classify_pattern(nni: f64, config: &SpatialPatternConfig) -> SpatialPattern {
    if nni < config.clustered_below {
        SpatialPattern::Clustered
    } else if nni > config.dispersed_above {
        SpatialPattern::Dispersed
    } else {
        SpatialPattern::Random
    }
}

/// Walkability heuristic blending density and diversity, clamped to
/// `[0, max_score]`.
#[must_use]
pub fn walkability_score(density: f64, diversity_index: f64, config: &WalkabilityConfig) -> f64 {
    let density_part = scaled(density, config.saturation_density) * config.component_weight;
    let diversity_part =
        scaled(diversity_index, config.saturation_diversity) * config.component_weight;

    let score = density_part + diversity_part;
    if score.is_finite() {
        score.clamp(0.0, config.max_score)
    } else {
        0.0
    }
}

/// Computes the full [`Metrics`] bundle for a point set.
#[must_use]
pub fn compute_metrics(
    points: &[Point],
    breakdown: &CategoryBreakdown,
    area_km2: f64,
    config: &HeuristicConfig,
) -> Metrics {
    let located: Vec<LatLng> = points.iter().filter_map(Point::coordinates).collect();

    let skipped = points.len() - located.len();
    if skipped > 0 {
        log::trace!("Skipping {skipped} points without usable coordinates");
    }
    if !is_usable_area(area_km2) {
        log::debug!("Area of {area_km2} km² is degenerate, spatial metrics fall back to neutral values");
    }
    if located.len() > config.spatial.advisory_point_count {
        log::warn!(
            "Computing nearest-neighbor index over {} points; this is quadratic and may be slow",
            located.len()
        );
    }

    let density = density(located.len(), area_km2);
    let diversity_index = shannon_diversity_index(breakdown.by_amenity.values().copied());
    let cuisine_diversity = shannon_diversity_index(breakdown.by_cuisine.values().copied());
    let nni = nearest_neighbor_index_of(&located, area_km2);

    Metrics {
        point_count: located.len() as u64,
        area_km2,
        density,
        diversity_index,
        cuisine_diversity,
        nearest_neighbor_index: nni,
        spatial_pattern: classify_pattern(nni, &config.spatial),
        walkability_score: walkability_score(density, diversity_index, &config.walkability),
    }
}

fn is_usable_area(area_km2: f64) -> bool {
    area_km2.is_finite() && area_km2 > 0.0
}

fn scaled(value: f64, saturation: f64) -> f64 {
    if saturation > 0.0 {
        value / saturation
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use geoanalytica_spatial::haversine_distance_km;

    use super::*;

    #[test]
    fn density_of_empty_set_is_zero() {
        assert!(density(0, 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn density_guards_zero_area() {
        for area in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let d = density(10, area);
            assert!(d.is_finite());
            assert!(d.abs() < f64::EPSILON);
        }
    }

    #[test]
    fn density_divides_count_by_area() {
        assert!((density(100, 10.0) - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn percentage_guards_empty_total() {
        assert!(percentage(3, 0).abs() < f64::EPSILON);
        assert!((percentage(1, 4) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn single_category_diversity_is_exactly_zero() {
        assert_eq!(shannon_diversity_index([42]), 0.0);
        assert_eq!(shannon_diversity_index([0, 7, 0]), 0.0);
        assert_eq!(shannon_diversity_index(Vec::<u64>::new()), 0.0);
        assert_eq!(shannon_diversity_index([0, 0]), 0.0);
    }

    #[test]
    fn uniform_distribution_reaches_ln_k() {
        for k in 2..=4_u32 {
            let h = shannon_diversity_index(vec![10; k as usize]);
            assert!((h - f64::from(k).ln()).abs() < 1e-12, "k={k}: {h}");
        }
    }

    #[test]
    fn diversity_increases_towards_uniformity() {
        let sequences: [&[&[u64]]; 3] = [
            &[&[19, 1], &[15, 5], &[12, 8], &[10, 10]],
            &[&[28, 1, 1], &[20, 5, 5], &[14, 8, 8], &[10, 10, 10]],
            &[&[37, 1, 1, 1], &[25, 5, 5, 5], &[16, 8, 8, 8], &[10, 10, 10, 10]],
        ];

        for sequence in sequences {
            let values: Vec<f64> = sequence
                .iter()
                .map(|counts| shannon_diversity_index(counts.iter().copied()))
                .collect();
            for pair in values.windows(2) {
                assert!(pair[0] < pair[1], "not increasing: {values:?}");
            }
        }
    }

    #[test]
    fn nni_of_fewer_than_two_points_is_neutral() {
        assert!((nearest_neighbor_index(&[], 5.0) - NEUTRAL_NNI).abs() < f64::EPSILON);
        assert!(
            (nearest_neighbor_index(&[Point::at(1.0, 1.0)], 5.0) - NEUTRAL_NNI).abs()
                < f64::EPSILON
        );
        // Second point has no coordinates.
        let points = vec![Point::at(1.0, 1.0), Point::default()];
        assert!((nearest_neighbor_index(&points, 5.0) - NEUTRAL_NNI).abs() < f64::EPSILON);
    }

    #[test]
    fn nni_with_zero_area_is_neutral() {
        let points = vec![Point::at(1.0, 1.0), Point::at(1.01, 1.01)];
        assert!((nearest_neighbor_index(&points, 0.0) - NEUTRAL_NNI).abs() < f64::EPSILON);
    }

    #[test]
    fn nni_is_one_when_observed_matches_expected() {
        let a = Point::at(40.0, -3.0);
        let b = Point::at(40.01, -3.0);
        let d = haversine_distance_km(40.0, -3.0, 40.01, -3.0);

        // expected = 0.5 / sqrt(2 / area) == d  =>  area = 8 d²
        let area = 8.0 * d * d;
        let nni = nearest_neighbor_index(&[a, b], area);
        assert!((nni - 1.0).abs() < 1e-9, "got {nni}");
    }

    #[test]
    fn nni_is_permutation_invariant() {
        let mut points: Vec<Point> = (0..12)
            .map(|i| {
                let f = f64::from(i);
                Point::at(38.70 + (f * 0.37).sin() * 0.01, -9.14 + (f * 0.73).cos() * 0.01)
            })
            .collect();
        let base = nearest_neighbor_index(&points, 4.0);

        points.reverse();
        assert!((nearest_neighbor_index(&points, 4.0) - base).abs() < 1e-9);

        points.rotate_left(5);
        assert!((nearest_neighbor_index(&points, 4.0) - base).abs() < 1e-9);
    }

    #[test]
    fn coincident_points_are_fully_clustered() {
        let points = vec![Point::at(1.0, 1.0), Point::at(1.0, 1.0), Point::at(1.0, 1.0)];
        let nni = nearest_neighbor_index(&points, 1.0);
        assert!(nni.abs() < f64::EPSILON);
        assert_eq!(
            classify_pattern(nni, &SpatialPatternConfig::default()),
            SpatialPattern::Clustered
        );
    }

    #[test]
    fn classifies_with_strict_thresholds() {
        let config = SpatialPatternConfig::default();
        assert_eq!(classify_pattern(0.79, &config), SpatialPattern::Clustered);
        assert_eq!(classify_pattern(0.8, &config), SpatialPattern::Random);
        assert_eq!(classify_pattern(1.2, &config), SpatialPattern::Random);
        assert_eq!(classify_pattern(1.21, &config), SpatialPattern::Dispersed);
    }

    #[test]
    fn walkability_blends_density_and_diversity() {
        let config = WalkabilityConfig::default();
        // (10 / 50) * 50 + (1.0 / 2.5) * 50 = 10 + 20
        assert!((walkability_score(10.0, 1.0, &config) - 30.0).abs() < 1e-12);
        assert!((walkability_score(500.0, 3.0, &config) - 100.0).abs() < f64::EPSILON);
        assert!(walkability_score(0.0, 0.0, &config).abs() < f64::EPSILON);
        assert!(walkability_score(f64::NAN, 1.0, &config).abs() < f64::EPSILON);
    }

    #[test]
    fn compute_metrics_counts_located_points_only() {
        let points = vec![
            Point::at(38.700, -9.140).with_tag("amenity", "cafe"),
            Point::at(38.705, -9.140).with_tag("amenity", "bar"),
            Point::default().with_tag("amenity", "bank"),
        ];
        let breakdown = crate::breakdown::analyze_breakdown(&points);
        let metrics = compute_metrics(&points, &breakdown, 2.0, &HeuristicConfig::default());

        assert_eq!(metrics.point_count, 2);
        assert!((metrics.density - 1.0).abs() < f64::EPSILON);
        assert!((metrics.diversity_index - 3.0_f64.ln()).abs() < 1e-12);
        assert!(metrics.cuisine_diversity.abs() < f64::EPSILON);
        assert!(metrics.nearest_neighbor_index.is_finite());
    }

    #[test]
    fn compute_metrics_on_degenerate_area() {
        let points = vec![Point::at(1.0, 1.0), Point::at(1.1, 1.1)];
        let breakdown = crate::breakdown::analyze_breakdown(&points);
        let metrics = compute_metrics(&points, &breakdown, 0.0, &HeuristicConfig::default());

        assert!(metrics.density.abs() < f64::EPSILON);
        assert!((metrics.nearest_neighbor_index - NEUTRAL_NNI).abs() < f64::EPSILON);
        assert_eq!(metrics.spatial_pattern, SpatialPattern::Random);
        assert!(metrics.walkability_score.is_finite());
    }
}
