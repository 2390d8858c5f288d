use async_trait::async_trait;
use copydeck_core::{CompetitiveAnalysis, CompetitorProfile};
use serde::Deserialize;

use super::{as_number, ProviderClient, SourceAdapter, SourceDeps};
use crate::cache::ContentCache;
use crate::retry::RetryPolicy;

const SOURCE_NAME: &str = "competitors";

#[derive(Debug, Deserialize)]
struct CompetitorResponse {
    #[serde(default)]
    competitors: Vec<CompetitorEntry>,
    #[serde(default)]
    content_gaps: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CompetitorEntry {
    name: String,
    #[serde(default)]
    domain: String,
    #[serde(default)]
    market_share: serde_json::Value,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
    #[serde(default)]
    top_keywords: Vec<String>,
}

/// Providers report share either as a fraction or as a percentage.
fn normalise_share(raw: f64) -> f64 {
    let share = if raw > 1.0 { raw / 100.0 } else { raw };
    share.clamp(0.0, 1.0)
}

fn adapt(response: CompetitorResponse) -> CompetitiveAnalysis {
    let competitors: Vec<CompetitorProfile> = response
        .competitors
        .into_iter()
        .filter(|c| !c.name.trim().is_empty())
        .map(|c| CompetitorProfile {
            market_share: as_number(&c.market_share).map_or(0.0, normalise_share),
            name: c.name.trim().to_owned(),
            domain: c.domain,
            strengths: c.strengths,
            weaknesses: c.weaknesses,
            top_keywords: c.top_keywords,
        })
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let average_market_share = if competitors.is_empty() {
        0.0
    } else {
        competitors.iter().map(|c| c.market_share).sum::<f64>() / competitors.len() as f64
    };

    let mut content_gaps: Vec<String> = Vec::new();
    for gap in response.content_gaps {
        let gap = gap.trim();
        if !gap.is_empty() && !content_gaps.iter().any(|g| g.eq_ignore_ascii_case(gap)) {
            content_gaps.push(gap.to_owned());
        }
    }

    CompetitiveAnalysis {
        competitors,
        content_gaps,
        average_market_share,
    }
}

/// Competitor-intelligence adapter. The subject key is the comma-joined,
/// de-duplicated keyword set.
pub struct CompetitorSource {
    deps: SourceDeps,
}

impl CompetitorSource {
    pub fn new(client: Option<ProviderClient>, cache: ContentCache, retry: RetryPolicy) -> Self {
        Self {
            deps: SourceDeps {
                client,
                cache,
                retry,
            },
        }
    }
}

#[async_trait]
impl SourceAdapter for CompetitorSource {
    type Output = CompetitiveAnalysis;

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch(&self, subject_key: &str) -> CompetitiveAnalysis {
        let topic = subject_key.trim();
        if topic.is_empty() {
            return CompetitiveAnalysis::default();
        }

        let Some(payload) = self
            .deps
            .fetch_or_log(SOURCE_NAME, topic, "v1/competitors", &[("topic", topic)])
            .await
        else {
            return CompetitiveAnalysis::default();
        };

        let analysis = SourceDeps::decode(SOURCE_NAME, payload)
            .map(adapt)
            .unwrap_or_default();
        tracing::debug!(
            source = SOURCE_NAME,
            competitors = analysis.competitors.len(),
            gaps = analysis.content_gaps.len(),
            "collected competitor data"
        );
        analysis
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(value: serde_json::Value) -> CompetitiveAnalysis {
        adapt(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn percentage_shares_are_normalised() {
        let analysis = parse(json!({
            "competitors": [
                {"name": "Brewco", "market_share": 30},
                {"name": "Beanly", "market_share": 0.1},
                {"name": "Huge", "market_share": "250"}
            ]
        }));
        let shares: Vec<f64> = analysis.competitors.iter().map(|c| c.market_share).collect();
        assert!((shares[0] - 0.3).abs() < 1e-9);
        assert!((shares[1] - 0.1).abs() < 1e-9);
        assert!((shares[2] - 1.0).abs() < f64::EPSILON);
        assert!((analysis.average_market_share - 1.4 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn nameless_competitors_and_duplicate_gaps_are_dropped() {
        let analysis = parse(json!({
            "competitors": [{"name": "  "}, {"name": "Brewco", "market_share": "n/a"}],
            "content_gaps": ["Cold brew at home", "cold brew at home", "", "Nitro basics"]
        }));
        assert_eq!(analysis.competitors.len(), 1);
        assert!(analysis.competitors[0].market_share.abs() < f64::EPSILON);
        assert_eq!(analysis.content_gaps, vec!["Cold brew at home", "Nitro basics"]);
    }

    #[test]
    fn empty_payload_has_zero_average() {
        let analysis = parse(json!({}));
        assert!(analysis.competitors.is_empty());
        assert!(analysis.average_market_share.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn blank_topic_skips_the_provider() {
        let source = CompetitorSource::new(None, ContentCache::in_memory(), RetryPolicy::default());
        assert_eq!(source.fetch("   ").await, CompetitiveAnalysis::default());
    }
}
