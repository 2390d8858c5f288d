//! Cross-provider trend aggregation.
//!
//! Providers are translated into [`ProviderTrends`] by their source adapters;
//! [`aggregate`] merges any number of them into one [`MarketTrends`] section:
//!
//! 1. Per provider and topic: growth from the first and last observation,
//!    seasonality from per-month averages.
//! 2. Same topic across providers: growth averaged, relevance from the first
//!    provider reporting a difficulty metric, demographics unioned.
//! 3. Related topics merged by exact name: correlation averaged, search
//!    volume from the first non-zero report.
//!
//! Output keeps first-seen order; nothing iterates a hash map, so equal
//! inputs always produce identical output.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use copydeck_core::{Demographics, MarketTrends, RelatedTopic, TrendSignal, MONTH_LABELS};

/// Number of months reported as seasonal peaks and lows.
const SEASONALITY_MONTHS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// One provider's observations for one topic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTrendSeries {
    pub topic: String,
    /// Observations in date order.
    pub points: Vec<SeriesPoint>,
    /// Ranking difficulty / competition on a 0-100 scale.
    pub difficulty: Option<f64>,
    pub search_volume: Option<u64>,
    pub demographics: Demographics,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRelatedTopic {
    pub name: String,
    pub correlation: f64,
    pub search_volume: u64,
}

/// Everything one trend provider reported for a keyword set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderTrends {
    pub provider: String,
    pub series: Vec<RawTrendSeries>,
    pub related: Vec<RawRelatedTopic>,
}

impl ProviderTrends {
    pub fn empty(provider: &str) -> Self {
        Self {
            provider: provider.to_owned(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty() && self.related.is_empty()
    }
}

/// Percentage change from the first to the last observation.
///
/// Fewer than two points, or a zero starting value, yields `0.0`.
#[must_use]
pub fn growth_rate(points: &[SeriesPoint]) -> f64 {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return 0.0;
    };
    if points.len() < 2 || first.value == 0.0 {
        return 0.0;
    }
    (last.value - first.value) / first.value * 100.0
}

/// Peak and low months of a series, as month labels.
///
/// Values are averaged per calendar month. Peaks are the (up to) three
/// highest months, highest first; lows are the (up to) three lowest of the
/// remaining months, lowest first. Ties fall back to calendar order.
#[must_use]
pub fn seasonality(points: &[SeriesPoint]) -> (Vec<String>, Vec<String>) {
    let mut sums = [0.0_f64; 12];
    let mut counts = [0u32; 12];
    for point in points {
        let month = point.date.month0() as usize;
        sums[month] += point.value;
        counts[month] += 1;
    }

    let mut buckets: Vec<(usize, f64)> = (0..12)
        .filter(|&m| counts[m] > 0)
        .map(|m| (m, sums[m] / f64::from(counts[m])))
        .collect();

    // Descending by average, ascending by month on ties.
    buckets.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let peak_count = buckets.len().min(SEASONALITY_MONTHS);
    let mut remaining = buckets.split_off(peak_count);
    remaining.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    remaining.truncate(SEASONALITY_MONTHS);

    let label = |(m, _): &(usize, f64)| MONTH_LABELS[*m].to_owned();
    (
        buckets.iter().map(label).collect(),
        remaining.iter().map(label).collect(),
    )
}

struct TopicAccumulator {
    topic: String,
    growth_sum: f64,
    growth_count: u32,
    relevance: Option<f64>,
    peaks: Vec<String>,
    lows: Vec<String>,
    demographics: Demographics,
}

struct RelatedAccumulator {
    name: String,
    correlation_sum: f64,
    correlation_count: u32,
    search_volume: u64,
}

/// Merge every provider's trends into one market-trends section.
///
/// `keywords` is the requested keyword set, copied into the output; volumes
/// are filled for any keyword a provider reported a non-zero volume for.
#[must_use]
pub fn aggregate(keywords: &[String], providers: &[ProviderTrends]) -> MarketTrends {
    let mut topics: Vec<TopicAccumulator> = Vec::new();
    let mut topic_index: HashMap<String, usize> = HashMap::new();
    let mut related: Vec<RelatedAccumulator> = Vec::new();
    let mut related_index: HashMap<String, usize> = HashMap::new();
    let mut volumes = std::collections::BTreeMap::new();

    for provider in providers {
        for series in &provider.series {
            let idx = *topic_index.entry(series.topic.clone()).or_insert_with(|| {
                topics.push(TopicAccumulator {
                    topic: series.topic.clone(),
                    growth_sum: 0.0,
                    growth_count: 0,
                    relevance: None,
                    peaks: Vec::new(),
                    lows: Vec::new(),
                    demographics: Demographics::default(),
                });
                topics.len() - 1
            });
            let acc = &mut topics[idx];

            if !series.points.is_empty() {
                acc.growth_sum += growth_rate(&series.points);
                acc.growth_count += 1;
                // Seasonality comes whole from a single provider's series.
                if acc.peaks.is_empty() {
                    let (peaks, lows) = seasonality(&series.points);
                    acc.peaks = peaks;
                    acc.lows = lows;
                }
            }

            if acc.relevance.is_none() {
                acc.relevance = series.difficulty.map(|d| (d / 100.0).clamp(0.0, 1.0));
            }

            acc.demographics.extend(&series.demographics);

            if let Some(volume) = series.search_volume.filter(|v| *v > 0) {
                volumes.entry(series.topic.clone()).or_insert(volume);
            }
        }

        for topic in &provider.related {
            let idx = *related_index.entry(topic.name.clone()).or_insert_with(|| {
                related.push(RelatedAccumulator {
                    name: topic.name.clone(),
                    correlation_sum: 0.0,
                    correlation_count: 0,
                    search_volume: 0,
                });
                related.len() - 1
            });
            let acc = &mut related[idx];
            acc.correlation_sum += topic.correlation.clamp(0.0, 1.0);
            acc.correlation_count += 1;
            if acc.search_volume == 0 {
                acc.search_volume = topic.search_volume;
            }
        }
    }

    let trends = topics
        .into_iter()
        .map(|acc| TrendSignal {
            growth_pct: if acc.growth_count == 0 {
                0.0
            } else {
                acc.growth_sum / f64::from(acc.growth_count)
            },
            relevance: acc.relevance.unwrap_or(0.0),
            seasonality_peak_months: acc.peaks,
            seasonality_low_months: acc.lows,
            demographics: acc.demographics,
            topic: acc.topic,
        })
        .collect();

    let related_topics = related
        .into_iter()
        .map(|acc| RelatedTopic {
            correlation: (acc.correlation_sum / f64::from(acc.correlation_count.max(1)))
                .clamp(0.0, 1.0),
            search_volume: acc.search_volume,
            name: acc.name,
        })
        .collect();

    MarketTrends {
        keywords: keywords.to_vec(),
        volumes,
        trends,
        related_topics,
    }
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
