//! Tunable constants for the heuristic parts of the engine.
//!
//! The walkability score, the spatial pattern thresholds, the insight
//! triggers and the similarity score all rest on hand-picked normalization
//! constants. They are collected here so they can be tuned from a TOML
//! file without touching the formulas. The defaults are also shipped as
//! `config/heuristics.toml`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::AnalyticsError;

/// Embedded copy of the default configuration.
pub const DEFAULT_HEURISTICS_TOML: &str = include_str!("../config/heuristics.toml");

/// All heuristic tuning, grouped by consumer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    /// Walkability score normalization.
    pub walkability: WalkabilityConfig,
    /// Nearest-neighbor classification.
    pub spatial: SpatialPatternConfig,
    /// Insight trigger thresholds.
    pub insights: InsightThresholds,
    /// Similarity score weights and caps.
    pub similarity: SimilarityWeights,
}

impl HeuristicConfig {
    /// Parses a (possibly partial) TOML document. Missing keys keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Config`] if the document is not valid TOML
    /// or has values of the wrong type.
    pub fn from_toml_str(s: &str) -> Result<Self, AnalyticsError> {
        Ok(toml::de::from_str(s)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Io`] if the file cannot be read, or
    /// [`AnalyticsError::Config`] if it cannot be parsed.
    pub fn from_path(path: &Path) -> Result<Self, AnalyticsError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        log::info!("Loaded heuristic config from {}", path.display());
        Ok(config)
    }
}

/// Normalization for the walkability composite.
///
/// `score = min(density / saturation_density * component_weight
///            + diversity / saturation_diversity * component_weight, max_score)`
///
/// This is a heuristic, not a calibrated index: 50 places/km² and 2.5 nats
/// are simply treated as "saturated".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkabilityConfig {
    /// Density (points/km²) that earns the full density component.
    pub saturation_density: f64,
    /// Shannon index (nats) that earns the full diversity component.
    pub saturation_diversity: f64,
    /// Points awarded per saturated component.
    pub component_weight: f64,
    /// Upper clamp.
    pub max_score: f64,
}

impl Default for WalkabilityConfig {
    fn default() -> Self {
        Self {
            saturation_density: 50.0,
            saturation_diversity: 2.5,
            component_weight: 50.0,
            max_score: 100.0,
        }
    }
}

/// Thresholds for classifying a nearest-neighbor index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialPatternConfig {
    /// NNI strictly below this is clustered.
    pub clustered_below: f64,
    /// NNI strictly above this is dispersed.
    pub dispersed_above: f64,
    /// Point count above which the O(n²) NNI computation logs a warning.
    pub advisory_point_count: usize,
}

impl Default for SpatialPatternConfig {
    fn default() -> Self {
        Self {
            clustered_below: 0.8,
            dispersed_above: 1.2,
            advisory_point_count: 5000,
        }
    }
}

/// Trigger thresholds for the insight narrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightThresholds {
    /// Larger/smaller density ratio above which densities differ.
    pub density_ratio: f64,
    /// Absolute Shannon index gap above which diversity differs.
    pub diversity_gap: f64,
    /// Absolute NNI gap above which spatial patterns differ.
    pub spatial_gap: f64,
    /// Amenity share gap (percentage points) flagged as a specialization.
    pub specialization_gap_pct: f64,
    /// Specializations surfaced as insights.
    pub max_specializations: usize,
    /// Chain share gap (percentage points) worth reporting.
    pub chain_gap_pct: f64,
    /// Accessible share gap (percentage points) worth reporting.
    pub accessibility_gap_pct: f64,
    /// Minimum accessible share one side must exceed.
    pub accessibility_floor_pct: f64,
    /// Shared cuisines named in the cuisine insight.
    pub shared_cuisine_examples: usize,
    /// Unique cuisines named per area in the cuisine insight.
    pub unique_cuisine_examples: usize,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            density_ratio: 1.2,
            diversity_gap: 0.2,
            spatial_gap: 0.3,
            specialization_gap_pct: 5.0,
            max_specializations: 2,
            chain_gap_pct: 10.0,
            accessibility_gap_pct: 5.0,
            accessibility_floor_pct: 10.0,
            shared_cuisine_examples: 3,
            unique_cuisine_examples: 2,
        }
    }
}

/// Penalty weights and caps for the similarity score.
///
/// `score = 100 - min((ratio - 1) * density_weight, density_cap)
///              - min(diversity_gap * diversity_weight, diversity_cap)
///              - min(nni_gap * spatial_weight, spatial_cap)`, then
/// `score * (1 - cuisine_blend) + cuisine_overlap_pct * cuisine_blend`.
///
/// The components are neither orthogonal nor statistically calibrated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityWeights {
    /// Penalty per unit of density ratio above 1.
    pub density_weight: f64,
    /// Maximum density penalty.
    pub density_cap: f64,
    /// Penalty per nat of diversity gap.
    pub diversity_weight: f64,
    /// Maximum diversity penalty.
    pub diversity_cap: f64,
    /// Penalty per unit of NNI gap.
    pub spatial_weight: f64,
    /// Maximum spatial penalty.
    pub spatial_cap: f64,
    /// Weight of the cuisine overlap percentage in the final blend.
    pub cuisine_blend: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            density_weight: 20.0,
            density_cap: 30.0,
            diversity_weight: 15.0,
            diversity_cap: 20.0,
            spatial_weight: 25.0,
            spatial_cap: 25.0,
            cuisine_blend: 0.25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_match_default_impl() {
        let parsed = HeuristicConfig::from_toml_str(DEFAULT_HEURISTICS_TOML).unwrap();
        assert_eq!(parsed, HeuristicConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = HeuristicConfig::from_toml_str(
            "[walkability]\nsaturation_density = 80.0\n\n[insights]\nmax_specializations = 4\n",
        )
        .unwrap();

        assert!((config.walkability.saturation_density - 80.0).abs() < f64::EPSILON);
        assert!((config.walkability.saturation_diversity - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.insights.max_specializations, 4);
        assert_eq!(config.spatial, SpatialPatternConfig::default());
        assert_eq!(config.similarity, SimilarityWeights::default());
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(
            HeuristicConfig::from_toml_str("").unwrap(),
            HeuristicConfig::default()
        );
    }

    #[test]
    fn rejects_wrong_types() {
        let err = HeuristicConfig::from_toml_str("[spatial]\nclustered_below = \"low\"\n");
        assert!(matches!(err, Err(AnalyticsError::Config(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = HeuristicConfig::from_path(Path::new("/nonexistent/heuristics.toml"));
        assert!(matches!(err, Err(AnalyticsError::Io(_))));
    }
}
