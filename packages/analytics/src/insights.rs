//! Rule-based narrative for a [`ComparisonResult`].
//!
//! Each rule inspects one aspect of the comparison (density, diversity,
//! spatial pattern, amenity specializations, cuisines, chains,
//! accessibility) and emits at most a fixed number of statements. The
//! output is deterministic for a given input and configuration.

use std::collections::BTreeSet;

use geoanalytica_analytics_models::{
    AreaAnalysis, CategoryBreakdown, ComparedSide, ComparisonResult, Importance, Insight,
    InsightReport, InsightTopic,
};

use crate::compare::density_ratio;
use crate::config::{HeuristicConfig, InsightThresholds, SimilarityWeights};
use crate::metrics::percentage;

/// Icon used for amenities missing from [`amenity_icon`]'s table.
pub const FALLBACK_ICON: &str = "📍";

/// Icon for an amenity type.
#[must_use]
pub fn amenity_icon(amenity: &str) -> &'static str {
    match amenity {
        "restaurant" => "🍽️",
        "cafe" => "☕",
        "bar" => "🍻",
        "pub" => "🍺",
        "fast_food" => "🍔",
        "hospital" => "🏥",
        "pharmacy" => "💊",
        "school" => "🏫",
        "university" => "🎓",
        "library" => "📚",
        "bank" => "🏦",
        "parking" => "🅿️",
        "fuel" => "⛽",
        "hotel" => "🏨",
        "cinema" => "🎬",
        "gym" => "💪",
        "place_of_worship" => "⛪",
        _ => FALLBACK_ICON,
    }
}

/// Runs every rule and the similarity score.
#[must_use]
pub fn narrate(result: &ComparisonResult, config: &HeuristicConfig) -> InsightReport {
    InsightReport {
        insights: generate_insights(result, &config.insights),
        similarity_score: similarity_score(result, &config.similarity),
    }
}

/// Produces the ranked insight list: high importance first, rule order
/// preserved within a level.
#[must_use]
pub fn generate_insights(result: &ComparisonResult, thresholds: &InsightThresholds) -> Vec<Insight> {
    let city1 = &result.city1;
    let city2 = &result.city2;
    let name1 = short_name(&city1.name);
    let name2 = short_name(&city2.name);

    let mut insights = vec![density_insight(city1, city2, thresholds)];
    insights.extend(diversity_insight(city1, city2, thresholds));
    insights.extend(spatial_insight(city1, city2, thresholds));
    insights.extend(
        result
            .comparison
            .specializations
            .iter()
            .take(thresholds.max_specializations)
            .map(|s| {
                let leader = match s.leader {
                    ComparedSide::First => name1,
                    ComparedSide::Second => name2,
                };
                insight(
                    amenity_icon(&s.amenity),
                    format!(
                        "{leader} leans towards {}: {:.0}% of amenities vs {:.0}% in the other area.",
                        s.amenity.replace('_', " "),
                        s.share1.max(s.share2),
                        s.share1.min(s.share2),
                    ),
                    InsightTopic::Specialization,
                    Importance::High,
                )
            }),
    );
    insights.extend(cuisine_insight(city1, city2, thresholds));
    insights.extend(chain_insight(city1, city2, thresholds));
    insights.extend(accessibility_insight(city1, city2, thresholds));

    insights.sort_by_key(|i| i.importance);

    log::debug!(
        "Generated {} insights comparing {name1} with {name2}",
        insights.len()
    );
    insights
}

/// Heuristic 0-100 similarity between the two areas.
///
/// Penalizes density ratio, diversity gap and NNI gap (each capped), then
/// blends in the percentage of cuisines the two areas share.
#[must_use]
pub fn similarity_score(result: &ComparisonResult, weights: &SimilarityWeights) -> f64 {
    let m1 = &result.city1.metrics;
    let m2 = &result.city2.metrics;

    let density_penalty = density_ratio(m1.density, m2.density).map_or(weights.density_cap, |r| {
        ((r - 1.0) * weights.density_weight).min(weights.density_cap)
    });
    let diversity_penalty = ((m1.diversity_index - m2.diversity_index).abs()
        * weights.diversity_weight)
        .min(weights.diversity_cap);
    let spatial_penalty = ((m1.nearest_neighbor_index - m2.nearest_neighbor_index).abs()
        * weights.spatial_weight)
        .min(weights.spatial_cap);

    let score = 100.0 - density_penalty - diversity_penalty - spatial_penalty;
    let overlap = cuisine_overlap_pct(&result.city1.breakdown, &result.city2.breakdown);
    let blended = score * (1.0 - weights.cuisine_blend) + overlap * weights.cuisine_blend;

    if blended.is_finite() {
        blended.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Shared cuisines as a percentage of all cuisines seen in either area.
/// Two areas without any cuisine count as fully overlapping.
#[must_use]
pub fn cuisine_overlap_pct(breakdown1: &CategoryBreakdown, breakdown2: &CategoryBreakdown) -> f64 {
    let set1: BTreeSet<&String> = breakdown1.by_cuisine.keys().collect();
    let set2: BTreeSet<&String> = breakdown2.by_cuisine.keys().collect();

    let union = set1.union(&set2).count() as u64;
    if union == 0 {
        return 100.0;
    }
    let shared = set1.intersection(&set2).count() as u64;
    percentage(shared, union)
}

/// Text before the first comma (`"Lisbon, Portugal"` -> `"Lisbon"`).
#[must_use]
pub fn short_name(name: &str) -> &str {
    name.split(',').next().map_or(name, str::trim)
}

fn insight(icon: &str, text: String, topic: InsightTopic, importance: Importance) -> Insight {
    Insight {
        icon: icon.to_string(),
        text,
        topic,
        importance,
    }
}

fn density_insight(
    city1: &AreaAnalysis,
    city2: &AreaAnalysis,
    thresholds: &InsightThresholds,
) -> Insight {
    let d1 = city1.metrics.density;
    let d2 = city2.metrics.density;
    let (higher, lower) = if d1 > d2 {
        (short_name(&city1.name), short_name(&city2.name))
    } else {
        (short_name(&city2.name), short_name(&city1.name))
    };
    let higher_density = d1.max(d2);
    let lower_density = d1.min(d2);

    match density_ratio(d1, d2) {
        Some(ratio) if ratio > thresholds.density_ratio => insight(
            "🏙️",
            format!(
                "{higher} has {ratio:.1}× higher amenity density than {lower} \
                 ({higher_density:.1} vs {lower_density:.1} places/km²)."
            ),
            InsightTopic::Density,
            Importance::High,
        ),
        Some(_) => insight(
            "⚖️",
            format!("Both areas have similar amenity density (~{d1:.1} places/km²)."),
            InsightTopic::Density,
            Importance::Low,
        ),
        None => insight(
            "🏙️",
            format!(
                "{higher} has amenities where {lower} has none \
                 ({higher_density:.1} vs {lower_density:.1} places/km²)."
            ),
            InsightTopic::Density,
            Importance::High,
        ),
    }
}

fn diversity_insight(
    city1: &AreaAnalysis,
    city2: &AreaAnalysis,
    thresholds: &InsightThresholds,
) -> Option<Insight> {
    let h1 = city1.metrics.diversity_index;
    let h2 = city2.metrics.diversity_index;
    if (h1 - h2).abs() <= thresholds.diversity_gap {
        return None;
    }

    let (more, less) = if h1 > h2 {
        (short_name(&city1.name), short_name(&city2.name))
    } else {
        (short_name(&city2.name), short_name(&city1.name))
    };

    Some(insight(
        "🌍",
        format!(
            "{more} is more diverse in amenity types than {less} (Shannon index {:.2} vs {:.2}), \
             with more variety packed into the same area.",
            h1.max(h2),
            h1.min(h2),
        ),
        InsightTopic::Diversity,
        Importance::High,
    ))
}

fn spatial_insight(
    city1: &AreaAnalysis,
    city2: &AreaAnalysis,
    thresholds: &InsightThresholds,
) -> Option<Insight> {
    let nni1 = city1.metrics.nearest_neighbor_index;
    let nni2 = city2.metrics.nearest_neighbor_index;
    if (nni1 - nni2).abs() <= thresholds.spatial_gap {
        return None;
    }

    Some(insight(
        "📍",
        format!(
            "{}'s amenities are {}, while {}'s are {} (NNI {nni1:.2} vs {nni2:.2}).",
            short_name(&city1.name),
            city1.metrics.spatial_pattern.description(),
            short_name(&city2.name),
            city2.metrics.spatial_pattern.description(),
        ),
        InsightTopic::Spatial,
        Importance::High,
    ))
}

fn cuisine_insight(
    city1: &AreaAnalysis,
    city2: &AreaAnalysis,
    thresholds: &InsightThresholds,
) -> Option<Insight> {
    let cuisines1 = &city1.breakdown.by_cuisine;
    let cuisines2 = &city2.breakdown.by_cuisine;

    let shared: Vec<&str> = cuisines1
        .keys()
        .filter(|c| cuisines2.contains_key(*c))
        .map(String::as_str)
        .collect();
    let unique1: Vec<&str> = cuisines1
        .keys()
        .filter(|c| !cuisines2.contains_key(*c))
        .map(String::as_str)
        .collect();
    let unique2: Vec<&str> = cuisines2
        .keys()
        .filter(|c| !cuisines1.contains_key(*c))
        .map(String::as_str)
        .collect();

    if unique1.is_empty() && unique2.is_empty() {
        return None;
    }

    let mut parts = Vec::new();
    if !shared.is_empty() {
        let shown = thresholds.shared_cuisine_examples;
        let tail = if shared.len() > shown { "..." } else { "." };
        parts.push(format!(
            "Both share {}{tail}",
            shared.iter().take(shown).copied().collect::<Vec<_>>().join(", ")
        ));
    }
    for (name, unique) in [(&city1.name, &unique1), (&city2.name, &unique2)] {
        if !unique.is_empty() {
            parts.push(format!(
                "{} uniquely offers {}.",
                short_name(name),
                list_with_remainder(unique, thresholds.unique_cuisine_examples)
            ));
        }
    }

    Some(insight(
        "🍜",
        format!("Cuisine diversity: {}", parts.join(" ")),
        InsightTopic::Cuisine,
        Importance::Medium,
    ))
}

fn list_with_remainder(items: &[&str], shown: usize) -> String {
    let listed = items.iter().take(shown).copied().collect::<Vec<_>>().join(", ");
    if items.len() > shown {
        format!("{listed} (+{} more)", items.len() - shown)
    } else {
        listed
    }
}

fn chain_insight(
    city1: &AreaAnalysis,
    city2: &AreaAnalysis,
    thresholds: &InsightThresholds,
) -> Option<Insight> {
    let pct1 = percentage(
        city1.breakdown.chains_vs_independent.chains,
        city1.breakdown.total,
    );
    let pct2 = percentage(
        city2.breakdown.chains_vs_independent.chains,
        city2.breakdown.total,
    );
    if (pct1 - pct2).abs() <= thresholds.chain_gap_pct {
        return None;
    }

    let (more_chains, more_independent) = if pct1 > pct2 {
        (short_name(&city1.name), short_name(&city2.name))
    } else {
        (short_name(&city2.name), short_name(&city1.name))
    };

    Some(insight(
        "🏢",
        format!(
            "{more_chains} has more chain businesses ({:.0}% chains vs {:.0}% in {more_independent}).",
            pct1.max(pct2),
            pct1.min(pct2),
        ),
        InsightTopic::Chains,
        Importance::Medium,
    ))
}

fn accessibility_insight(
    city1: &AreaAnalysis,
    city2: &AreaAnalysis,
    thresholds: &InsightThresholds,
) -> Option<Insight> {
    let pct1 = percentage(city1.breakdown.accessibility_count, city1.breakdown.total);
    let pct2 = percentage(city2.breakdown.accessibility_count, city2.breakdown.total);

    let floor = thresholds.accessibility_floor_pct;
    if (pct1 - pct2).abs() <= thresholds.accessibility_gap_pct || (pct1 <= floor && pct2 <= floor)
    {
        return None;
    }

    let more_accessible = if pct1 > pct2 {
        short_name(&city1.name)
    } else {
        short_name(&city2.name)
    };

    Some(insight(
        "♿",
        format!(
            "{more_accessible} is more accessibility-friendly ({:.0}% of places marked wheelchair accessible).",
            pct1.max(pct2)
        ),
        InsightTopic::Accessibility,
        Importance::Medium,
    ))
}
