//! Trend providers: search-interest time series and keyword metrics.
//!
//! Each provider has its own response structs and an adapter function into
//! [`ProviderTrends`]. Malformed values drop that provider's contribution for
//! the affected topic only.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use copydeck_core::Demographics;
use serde::Deserialize;

use super::{as_number, ProviderClient, SourceAdapter, SourceDeps};
use crate::aggregate::{ProviderTrends, RawRelatedTopic, RawTrendSeries, SeriesPoint};
use crate::cache::ContentCache;
use crate::retry::RetryPolicy;

/// Months of history requested from time-series providers.
const HISTORY_MONTHS: &str = "24";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendProviderKind {
    SearchInterest,
    KeywordMetrics,
}

impl TrendProviderKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            TrendProviderKind::SearchInterest => "search_interest",
            TrendProviderKind::KeywordMetrics => "keyword_metrics",
        }
    }

    fn path(self) -> &'static str {
        match self {
            TrendProviderKind::SearchInterest => "v1/interest",
            TrendProviderKind::KeywordMetrics => "v1/keywords",
        }
    }
}

// --- search-interest provider -------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchInterestResponse {
    #[serde(default)]
    interest: HashMap<String, InterestEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InterestEntry {
    timeline: Vec<InterestPoint>,
    related_queries: Vec<RelatedQuery>,
    demographics: InterestDemographics,
}

#[derive(Debug, Deserialize)]
struct InterestPoint {
    date: String,
    value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RelatedQuery {
    query: String,
    /// 0-100 co-search score.
    #[serde(default)]
    score: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InterestDemographics {
    age_groups: Vec<String>,
    interests: Vec<String>,
    regions: Vec<String>,
}

// --- keyword-metrics provider ---------------------------------------------------

#[derive(Debug, Deserialize)]
struct KeywordMetricsResponse {
    #[serde(default)]
    keywords: Vec<KeywordMetric>,
}

#[derive(Debug, Deserialize)]
struct KeywordMetric {
    keyword: String,
    #[serde(default)]
    search_volume: serde_json::Value,
    #[serde(default)]
    difficulty: serde_json::Value,
    #[serde(default)]
    monthly_volumes: Vec<MonthlyVolume>,
    #[serde(default)]
    related_keywords: Vec<RelatedKeyword>,
}

#[derive(Debug, Deserialize)]
struct MonthlyVolume {
    month: String,
    volume: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RelatedKeyword {
    keyword: String,
    /// Already on a 0-1 scale.
    #[serde(default)]
    relevance: serde_json::Value,
    #[serde(default)]
    search_volume: serde_json::Value,
}

/// Parses `YYYY-MM-DD`, `YYYY-MM` or RFC 3339 timestamps.
pub(crate) fn parse_series_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Builds a date-ordered series, or `None` if any point is malformed.
fn build_points<'a, I>(raw: I) -> Option<Vec<SeriesPoint>>
where
    I: IntoIterator<Item = (&'a str, &'a serde_json::Value)>,
{
    let mut points = raw
        .into_iter()
        .map(|(date, value)| {
            Some(SeriesPoint {
                date: parse_series_date(date)?,
                value: as_number(value)?,
            })
        })
        .collect::<Option<Vec<_>>>()?;
    points.sort_by_key(|p| p.date);
    Some(points)
}

fn as_volume(value: &serde_json::Value) -> Option<u64> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    as_number(value).filter(|n| *n >= 0.0).map(|n| n.round() as u64)
}

fn adapt_search_interest(keywords: &[&str], response: SearchInterestResponse) -> ProviderTrends {
    let provider = TrendProviderKind::SearchInterest.name();
    let mut out = ProviderTrends::empty(provider);
    let mut entries = response.interest;

    for keyword in keywords {
        // Prefer the exact key, fall back to a case-insensitive match.
        let entry = entries.remove(*keyword).or_else(|| {
            let key = entries
                .keys()
                .find(|k| k.eq_ignore_ascii_case(keyword))
                .cloned()?;
            entries.remove(&key)
        });
        let Some(entry) = entry else {
            continue;
        };

        let Some(points) = build_points(
            entry
                .timeline
                .iter()
                .map(|p| (p.date.as_str(), &p.value)),
        ) else {
            tracing::warn!(provider, keyword, "malformed timeline; dropping topic");
            continue;
        };

        for related in &entry.related_queries {
            if let Some(score) = as_number(&related.score) {
                out.related.push(RawRelatedTopic {
                    name: related.query.clone(),
                    correlation: (score / 100.0).clamp(0.0, 1.0),
                    search_volume: 0,
                });
            }
        }

        let demographics = Demographics {
            age_groups: entry.demographics.age_groups.into_iter().collect(),
            interests: entry.demographics.interests.into_iter().collect(),
            locations: entry.demographics.regions.into_iter().collect(),
        };

        if points.is_empty() && demographics.is_empty() {
            continue;
        }

        out.series.push(RawTrendSeries {
            topic: (*keyword).to_owned(),
            points,
            difficulty: None,
            search_volume: None,
            demographics,
        });
    }

    out
}

fn adapt_keyword_metrics(keywords: &[&str], response: KeywordMetricsResponse) -> ProviderTrends {
    let provider = TrendProviderKind::KeywordMetrics.name();
    let mut out = ProviderTrends::empty(provider);
    let mut metrics = response.keywords;

    for keyword in keywords {
        // Same matching as search interest, so both providers name a topic
        // with the requested spelling.
        let position = metrics
            .iter()
            .position(|m| m.keyword == *keyword)
            .or_else(|| {
                metrics
                    .iter()
                    .position(|m| m.keyword.eq_ignore_ascii_case(keyword))
            });
        let Some(metric) = position.map(|i| metrics.remove(i)) else {
            continue;
        };

        let Some(points) = build_points(
            metric
                .monthly_volumes
                .iter()
                .map(|m| (m.month.as_str(), &m.volume)),
        ) else {
            tracing::warn!(provider, keyword = %metric.keyword, "malformed monthly volumes; dropping topic");
            continue;
        };

        for related in &metric.related_keywords {
            if let Some(relevance) = as_number(&related.relevance) {
                out.related.push(RawRelatedTopic {
                    name: related.keyword.clone(),
                    correlation: relevance.clamp(0.0, 1.0),
                    search_volume: as_volume(&related.search_volume).unwrap_or(0),
                });
            }
        }

        let difficulty = as_number(&metric.difficulty);
        let search_volume = as_volume(&metric.search_volume);
        if points.is_empty() && difficulty.is_none() && search_volume.is_none() {
            continue;
        }

        out.series.push(RawTrendSeries {
            topic: (*keyword).to_owned(),
            points,
            difficulty,
            search_volume,
            demographics: Demographics::default(),
        });
    }

    out
}

/// Adapter for one trend provider.
///
/// The subject key is the comma-joined keyword set.
pub struct TrendSource {
    kind: TrendProviderKind,
    deps: SourceDeps,
}

impl TrendSource {
    pub fn new(
        kind: TrendProviderKind,
        client: Option<ProviderClient>,
        cache: ContentCache,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            kind,
            deps: SourceDeps {
                client,
                cache,
                retry,
            },
        }
    }
}

#[async_trait]
impl SourceAdapter for TrendSource {
    type Output = ProviderTrends;

    fn name(&self) -> &'static str {
        self.kind.name()
    }

    async fn fetch(&self, subject_key: &str) -> ProviderTrends {
        let name = self.name();
        let keywords: Vec<&str> = subject_key
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return ProviderTrends::empty(name);
        }

        let query: Vec<(&str, &str)> = match self.kind {
            TrendProviderKind::SearchInterest => {
                vec![("keywords", subject_key), ("months", HISTORY_MONTHS)]
            }
            TrendProviderKind::KeywordMetrics => vec![("keywords", subject_key)],
        };

        let Some(payload) = self
            .deps
            .fetch_or_log(name, subject_key, self.kind.path(), &query)
            .await
        else {
            return ProviderTrends::empty(name);
        };

        let trends = match self.kind {
            TrendProviderKind::SearchInterest => SourceDeps::decode(name, payload)
                .map(|response| adapt_search_interest(&keywords, response)),
            TrendProviderKind::KeywordMetrics => {
                SourceDeps::decode(name, payload)
                    .map(|response| adapt_keyword_metrics(&keywords, response))
            }
        };
        let trends = trends.unwrap_or_else(|| ProviderTrends::empty(name));

        tracing::debug!(
            source = name,
            topics = trends.series.len(),
            related = trends.related.len(),
            "collected trend data"
        );
        trends
    }
}
