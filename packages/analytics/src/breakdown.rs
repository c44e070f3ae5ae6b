//! Category tallies over a point collection.
//!
//! A single pass classifies each point by amenity type and by the
//! secondary facets (cuisine, religion, school type, chain status,
//! wheelchair accessibility). Missing tags fall into default buckets;
//! nothing here can fail.

use std::collections::BTreeMap;

use geoanalytica_analytics_models::{CategoryBreakdown, CategoryCount, Point};

use crate::metrics::density;

/// Bucket for points without an `amenity` tag.
pub const UNKNOWN_AMENITY: &str = "unknown";

/// Builds a [`CategoryBreakdown`] from a point collection.
///
/// Every point is tallied, including points without usable coordinates;
/// tags are not a spatial property.
#[must_use]
pub fn analyze_breakdown(points: &[Point]) -> CategoryBreakdown {
    points
        .iter()
        .fold(CategoryBreakdown::default(), |mut breakdown, point| {
            tally(&mut breakdown, point);
            breakdown
        })
}

fn tally(breakdown: &mut CategoryBreakdown, point: &Point) {
    breakdown.total += 1;

    let amenity = point.tag("amenity").unwrap_or(UNKNOWN_AMENITY);
    increment(&mut breakdown.by_amenity, amenity);

    if let Some(cuisine) = point.tag("cuisine") {
        for token in cuisine_tokens(cuisine) {
            increment(&mut breakdown.by_cuisine, token);
        }
    }

    if let Some(religion) = point.tag("religion") {
        increment(&mut breakdown.by_religion, religion);
    }

    if let Some(school_type) = point.tag("school:type") {
        increment(&mut breakdown.by_school_type, school_type);
    }

    // Chain and independent partition the point set.
    if is_chain(point) {
        breakdown.brand_count += 1;
        breakdown.chains_vs_independent.chains += 1;
    } else {
        breakdown.chains_vs_independent.independent += 1;
    }

    if point.tag("wheelchair") == Some("yes") {
        breakdown.accessibility_count += 1;
    }
}

fn increment(map: &mut BTreeMap<String, u64>, key: &str) {
    *map.entry(key.to_string()).or_insert(0) += 1;
}

/// Splits a `cuisine` tag value into its `;`-separated, trimmed tokens.
///
/// Empty tokens (e.g. from a trailing `;`) are dropped.
pub fn cuisine_tokens(value: &str) -> impl Iterator<Item = &str> {
    value.split(';').map(str::trim).filter(|t| !t.is_empty())
}

/// Whether a point belongs to a brand or is run by an operator.
#[must_use]
pub fn is_chain(point: &Point) -> bool {
    point.tag("brand").is_some() || point.tag("operator").is_some()
}

/// Returns the `n` largest entries of a category table.
///
/// Sorted by count descending, ties broken by name so the output is
/// deterministic.
#[must_use]
pub fn top_categories(categories: &BTreeMap<String, u64>, n: usize) -> Vec<CategoryCount> {
    let mut entries: Vec<(&String, &u64)> = categories.iter().collect();
    // BTreeMap iteration is already name-ordered, so a stable sort keeps ties by name.
    entries.sort_by(|a, b| b.1.cmp(a.1));

    entries
        .into_iter()
        .take(n)
        .map(|(name, count)| CategoryCount {
            name: name.clone(),
            count: *count,
        })
        .collect()
}

/// Density of points whose `cuisine` tag contains `cuisine`
/// (case-insensitive), in points/km².
#[must_use]
pub fn cuisine_density(points: &[Point], cuisine: &str, area_km2: f64) -> f64 {
    let needle = cuisine.to_lowercase();
    let count = points
        .iter()
        .filter(|p| {
            p.tag("cuisine")
                .is_some_and(|c| c.to_lowercase().contains(&needle))
        })
        .count();

    density(count, area_km2)
}
