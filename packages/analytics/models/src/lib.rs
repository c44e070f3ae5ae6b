#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Data types shared by the spatial analytics engine.
//!
//! Point records come in from whatever point source the caller uses
//! (Overpass queries, uploaded CSV/`GeoJSON` files, saved places) and the
//! derived breakdowns, metrics, comparisons and insights go back out to
//! display and export layers. Everything here is plain serde data; the
//! behavior lives in `geoanalytica_analytics` and `geoanalytica_spatial`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Free-form `OpenStreetMap` style tags (`amenity`, `cuisine`, `brand`, ...).
pub type Tags = BTreeMap<String, String>;

/// A latitude/longitude pair in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    #[serde(alias = "lon")]
    pub lng: f64,
}

impl LatLng {
    /// Creates a new coordinate pair.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns `true` if both components are finite and within the
    /// latitude/longitude ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A geotagged point of interest.
///
/// Nodes carry `lat`/`lon` directly; ways and relations carry a `center`
/// centroid instead. Deserializes straight from Overpass API elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Stable upstream identifier, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Direct latitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    /// Direct longitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    /// Centroid for way/relation elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<LatLng>,
    /// Descriptive tags.
    #[serde(default)]
    pub tags: Tags,
}

impl Point {
    /// Creates a point with direct coordinates and no tags.
    #[must_use]
    pub fn at(lat: f64, lon: f64) -> Self {
        Self {
            lat: Some(lat),
            lon: Some(lon),
            ..Self::default()
        }
    }

    /// Adds a tag, builder style.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Resolves the coordinates used for spatial computation.
    ///
    /// A valid direct `lat`/`lon` pair wins, otherwise a valid `center`
    /// pair is used. Returns `None` when neither yields a valid
    /// coordinate, in which case the point is left out of every spatial
    /// computation.
    #[must_use]
    pub fn coordinates(&self) -> Option<LatLng> {
        let direct = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(LatLng::new(lat, lon)),
            _ => None,
        };

        direct
            .filter(LatLng::is_valid)
            .or_else(|| self.center.filter(LatLng::is_valid))
    }

    /// Looks up a tag. Empty values count as absent.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// The region a point set was collected from.
///
/// Serialized untagged so the display layer can send either
/// `{ "radiusMeters": .., "center": .. }` or `{ "polygonVertices": [..] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Area {
    /// A circle around a search center.
    Circle {
        /// Radius in meters.
        #[serde(rename = "radiusMeters")]
        radius_meters: f64,
        /// Search center (informational; area does not depend on it).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        center: Option<LatLng>,
    },
    /// A simple polygon, implicitly closed.
    Polygon {
        /// Ordered ring of vertices.
        #[serde(rename = "polygonVertices")]
        polygon_vertices: Vec<LatLng>,
    },
}

impl Area {
    /// A circle with no recorded center.
    #[must_use]
    pub const fn circle(radius_meters: f64) -> Self {
        Self::Circle {
            radius_meters,
            center: None,
        }
    }

    /// A polygon from its vertex ring.
    #[must_use]
    pub const fn polygon(vertices: Vec<LatLng>) -> Self {
        Self::Polygon {
            polygon_vertices: vertices,
        }
    }

    /// Radius in meters for circular areas.
    #[must_use]
    pub const fn radius_meters(&self) -> Option<f64> {
        match self {
            Self::Circle { radius_meters, .. } => Some(*radius_meters),
            Self::Polygon { .. } => None,
        }
    }
}

/// Chain vs. independent partition of a point set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSplit {
    /// Points tagged with a `brand` or `operator`.
    pub chains: u64,
    /// Everything else.
    pub independent: u64,
}

/// Categorized tally of a point collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    /// Number of points tallied.
    pub total: u64,
    /// Count per `amenity` value (`"unknown"` when untagged).
    pub by_amenity: BTreeMap<String, u64>,
    /// Count per individual cuisine token.
    pub by_cuisine: BTreeMap<String, u64>,
    /// Count per `religion` value.
    pub by_religion: BTreeMap<String, u64>,
    /// Count per `school:type` value.
    pub by_school_type: BTreeMap<String, u64>,
    /// Points carrying a `brand` or `operator` tag.
    pub brand_count: u64,
    /// Chain vs. independent partition.
    pub chains_vs_independent: ChainSplit,
    /// Points tagged `wheelchair=yes`.
    pub accessibility_count: u64,
}

/// A `(name, count)` entry from a category table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    /// Category value (e.g. `"restaurant"`).
    pub name: String,
    /// Number of points.
    pub count: u64,
}

/// Spatial distribution class derived from the nearest-neighbor index.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum SpatialPattern {
    /// NNI below the clustering threshold.
    Clustered,
    /// NNI between the thresholds.
    Random,
    /// NNI above the dispersion threshold.
    Dispersed,
}

impl SpatialPattern {
    /// Display icon for the pattern.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Clustered => "🔴",
            Self::Random => "🔵",
            Self::Dispersed => "🟢",
        }
    }

    /// Phrase used in narrative text.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Clustered => "strongly clustered",
            Self::Random => "randomly distributed",
            Self::Dispersed => "widely dispersed",
        }
    }
}

/// Scalar metrics for one point set over one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Points with usable coordinates.
    pub point_count: u64,
    /// Area the metrics were computed over, in km².
    pub area_km2: f64,
    /// Points per km².
    pub density: f64,
    /// Shannon index over amenity types, in nats.
    pub diversity_index: f64,
    /// Shannon index over cuisine tokens, in nats.
    pub cuisine_diversity: f64,
    /// Nearest-neighbor index.
    pub nearest_neighbor_index: f64,
    /// Classification of `nearest_neighbor_index`.
    pub spatial_pattern: SpatialPattern,
    /// Composite walkability heuristic, 0-100.
    pub walkability_score: f64,
}

/// Breakdown and metrics for one named area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaAnalysis {
    /// Display name (e.g. `"Lisbon, Portugal"`).
    pub name: String,
    /// Category tallies.
    pub breakdown: CategoryBreakdown,
    /// Scalar metrics.
    pub metrics: Metrics,
}

/// Which side of a comparison something refers to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComparedSide {
    /// The first area.
    First,
    /// The second area.
    Second,
}

/// An amenity whose share of the total differs notably between areas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specialization {
    /// Amenity value.
    pub amenity: String,
    /// Share of the first area's points, in percent.
    pub share1: f64,
    /// Share of the second area's points, in percent.
    pub share2: f64,
    /// Absolute share gap in percentage points.
    pub gap: f64,
    /// Area with the larger share.
    pub leader: ComparedSide,
}

/// Differences between two analyzed areas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonDiff {
    /// `(density1 - density2) / density2 * 100`, 0 when `density2` is 0.
    pub density_difference_pct: f64,
    /// `count1 - count2`.
    pub total_difference: i64,
    /// `diversity1 - diversity2`.
    pub diversity_difference: f64,
    /// `nni1 - nni2`.
    pub nni_difference: f64,
    /// Flagged share gaps, largest first.
    pub specializations: Vec<Specialization>,
}

/// Two analyzed areas and their diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    /// Shared study area in km².
    pub area_km2: f64,
    /// First area.
    pub city1: AreaAnalysis,
    /// Second area.
    pub city2: AreaAnalysis,
    /// Computed differences.
    pub comparison: ComparisonDiff,
}

/// Subject of a narrative insight.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InsightTopic {
    /// Point density.
    Density,
    /// Amenity-type diversity.
    Diversity,
    /// Nearest-neighbor pattern.
    Spatial,
    /// Amenity share gaps.
    Specialization,
    /// Cuisine overlap.
    Cuisine,
    /// Chain vs. independent share.
    Chains,
    /// Wheelchair accessibility share.
    Accessibility,
}

/// Importance of an insight. Variant order is ranking order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Importance {
    /// Headline finding.
    High,
    /// Supporting finding.
    Medium,
    /// Background note.
    Low,
}

/// A human-readable comparison statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    /// Display icon.
    pub icon: String,
    /// Narrative text.
    pub text: String,
    /// What the statement is about.
    pub topic: InsightTopic,
    /// Ranking level.
    pub importance: Importance,
}

/// Ranked insights plus the overall similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightReport {
    /// Insights, most important first.
    pub insights: Vec<Insight>,
    /// Similarity score, 0-100.
    pub similarity_score: f64,
}
