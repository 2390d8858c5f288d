//! The strategic analytics report and its sections.
//!
//! Every field carries a zero/empty default and deserializes with
//! `#[serde(default)]`, so consumers only ever check for empty collections
//! or zero scores, never for a missing field.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Calendar month labels indexed by zero-based month number.
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsReport {
    pub market_trends: MarketTrends,
    pub content_insights: ContentInsights,
    pub competitive_analysis: CompetitiveAnalysis,
    pub strategy_recommendations: StrategyRecommendations,
    pub audience_insights: AudienceInsights,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketTrends {
    pub keywords: Vec<String>,
    pub volumes: BTreeMap<String, u64>,
    pub trends: Vec<TrendSignal>,
    pub related_topics: Vec<RelatedTopic>,
}

/// Merged trend data for one topic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendSignal {
    pub topic: String,
    pub growth_pct: f64,
    /// Always within `[0, 1]`.
    pub relevance: f64,
    pub seasonality_peak_months: Vec<String>,
    pub seasonality_low_months: Vec<String>,
    pub demographics: Demographics,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Demographics {
    pub age_groups: BTreeSet<String>,
    pub interests: BTreeSet<String>,
    pub locations: BTreeSet<String>,
}

impl Demographics {
    pub fn is_empty(&self) -> bool {
        self.age_groups.is_empty() && self.interests.is_empty() && self.locations.is_empty()
    }

    /// Union `other` into `self`.
    pub fn extend(&mut self, other: &Demographics) {
        self.age_groups.extend(other.age_groups.iter().cloned());
        self.interests.extend(other.interests.iter().cloned());
        self.locations.extend(other.locations.iter().cloned());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelatedTopic {
    pub name: String,
    /// Always within `[0, 1]`.
    pub correlation: f64,
    pub search_volume: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentInsights {
    pub readability: ReadabilityMetrics,
    pub emotional: EmotionalMetrics,
    pub seo: SeoMetrics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadabilityMetrics {
    /// Reading-ease score in `[0, 100]`; higher reads easier.
    pub score: f64,
    pub level: String,
    pub improvements: Vec<String>,
    pub read_time_minutes: u32,
    /// Passages that are hard to read.
    pub hotspots: Vec<String>,
    /// Estimated share of readers finishing the piece, `[0, 1]`.
    pub retention: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionalMetrics {
    /// Tone score in `[-1, 1]`.
    pub score: f64,
    pub tone: String,
    pub triggers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoMetrics {
    /// Score in `[0, 100]`.
    pub score: f64,
    /// Keyword → occurrences per hundred words.
    pub keyword_density: BTreeMap<String, f64>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitiveAnalysis {
    pub competitors: Vec<CompetitorProfile>,
    pub content_gaps: Vec<String>,
    pub average_market_share: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitorProfile {
    pub name: String,
    pub domain: String,
    /// Share of the topic's market in `[0, 1]`.
    pub market_share: f64,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub top_keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudienceInsights {
    pub demographics: Demographics,
    pub segments: Vec<AudienceSegment>,
    pub preferred_formats: Vec<String>,
    /// Hours of day (0-23, UTC) with the highest engagement.
    pub best_posting_hours: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudienceSegment {
    pub name: String,
    /// Share of the audience in `[0, 1]`.
    pub share: f64,
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyRecommendations {
    pub publish_months: Vec<String>,
    pub focus_keywords: Vec<String>,
    pub content_gaps: Vec<String>,
    pub target_segments: Vec<String>,
    pub actions: Vec<String>,
}
