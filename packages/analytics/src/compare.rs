//! Side-by-side analysis of two point sets over the same study area.

use std::collections::BTreeSet;

use geoanalytica_analytics_models::{
    Area, AreaAnalysis, CategoryBreakdown, ComparedSide, ComparisonDiff, ComparisonResult, Point,
    Specialization,
};
use geoanalytica_spatial::area_km2;

use crate::analyze_area_km2;
use crate::config::HeuristicConfig;
use crate::metrics::percentage;

/// A named point set to compare.
#[derive(Debug, Clone, Copy)]
pub struct NamedPoints<'a> {
    /// Display name.
    pub name: &'a str,
    /// Point records.
    pub points: &'a [Point],
}

/// Analyzes both point sets over `area` and diffs the results.
#[must_use]
pub fn compare_areas(
    first: NamedPoints<'_>,
    second: NamedPoints<'_>,
    area: &Area,
    config: &HeuristicConfig,
) -> ComparisonResult {
    let area_km2 = area_km2(area);
    log::debug!(
        "Comparing {} ({} points) with {} ({} points) over {area_km2:.2} km²",
        first.name,
        first.points.len(),
        second.name,
        second.points.len(),
    );

    let city1 = analyze_area_km2(first.name, first.points, area_km2, config);
    let city2 = analyze_area_km2(second.name, second.points, area_km2, config);
    let comparison = diff(&city1, &city2, config);

    ComparisonResult {
        area_km2,
        city1,
        city2,
        comparison,
    }
}

/// Computes the [`ComparisonDiff`] between two analyzed areas.
#[must_use]
pub fn diff(city1: &AreaAnalysis, city2: &AreaAnalysis, config: &HeuristicConfig) -> ComparisonDiff {
    let m1 = &city1.metrics;
    let m2 = &city2.metrics;

    ComparisonDiff {
        density_difference_pct: density_difference_pct(m1.density, m2.density),
        total_difference: signed(city1.breakdown.total) - signed(city2.breakdown.total),
        diversity_difference: m1.diversity_index - m2.diversity_index,
        nni_difference: m1.nearest_neighbor_index - m2.nearest_neighbor_index,
        specializations: specializations(
            &city1.breakdown,
            &city2.breakdown,
            config.insights.specialization_gap_pct,
        ),
    }
}

/// `(d1 - d2) / d2 * 100`, or 0 when `d2` is 0.
#[must_use]
pub fn density_difference_pct(density1: f64, density2: f64) -> f64 {
    if !density2.is_finite() || density2 <= 0.0 {
        return 0.0;
    }
    (density1 - density2) / density2 * 100.0
}

/// Ratio of the larger density to the smaller one.
///
/// Both zero yields 1 (identical). Exactly one zero yields `None`: the
/// ratio is unbounded and callers treat it as the maximal difference.
#[must_use]
pub fn density_ratio(density1: f64, density2: f64) -> Option<f64> {
    let higher = density1.max(density2);
    let lower = density1.min(density2);

    if higher <= 0.0 {
        Some(1.0)
    } else if lower <= 0.0 {
        None
    } else {
        Some(higher / lower)
    }
}

/// Amenity types whose share of each area's points differs by more than
/// `threshold_pct` percentage points, largest gap first.
///
/// Ties keep amenity name order.
#[must_use]
pub fn specializations(
    breakdown1: &CategoryBreakdown,
    breakdown2: &CategoryBreakdown,
    threshold_pct: f64,
) -> Vec<Specialization> {
    let amenities: BTreeSet<&String> = breakdown1
        .by_amenity
        .keys()
        .chain(breakdown2.by_amenity.keys())
        .collect();

    let mut flagged: Vec<Specialization> = amenities
        .into_iter()
        .filter_map(|amenity| {
            let share1 = share(breakdown1, amenity);
            let share2 = share(breakdown2, amenity);
            let gap = (share1 - share2).abs();

            (gap > threshold_pct).then(|| Specialization {
                amenity: amenity.clone(),
                share1,
                share2,
                gap,
                leader: if share1 > share2 {
                    ComparedSide::First
                } else {
                    ComparedSide::Second
                },
            })
        })
        .collect();

    flagged.sort_by(|a, b| b.gap.total_cmp(&a.gap));
    flagged
}

fn share(breakdown: &CategoryBreakdown, amenity: &str) -> f64 {
    let count = breakdown.by_amenity.get(amenity).copied().unwrap_or(0);
    percentage(count, breakdown.total)
}

fn signed(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}
