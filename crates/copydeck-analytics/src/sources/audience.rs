use async_trait::async_trait;
use copydeck_core::{AudienceInsights, AudienceSegment, Demographics};
use serde::Deserialize;

use super::{as_number, ProviderClient, SourceAdapter, SourceDeps};
use crate::cache::ContentCache;
use crate::retry::RetryPolicy;

const SOURCE_NAME: &str = "audience";

/// Number of posting hours reported.
const BEST_HOURS: usize = 3;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AudienceResponse {
    demographics: RawDemographics,
    segments: Vec<RawSegment>,
    preferred_formats: Vec<String>,
    engagement_by_hour: Vec<HourEngagement>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDemographics {
    age_groups: Vec<String>,
    interests: Vec<String>,
    locations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawSegment {
    name: String,
    #[serde(default)]
    share: serde_json::Value,
    #[serde(default)]
    interests: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct HourEngagement {
    hour: serde_json::Value,
    score: serde_json::Value,
}

/// Top hours by engagement score, ties broken by earlier hour.
fn best_posting_hours(engagement: &[HourEngagement]) -> Vec<u8> {
    let mut scored: Vec<(u8, f64)> = engagement
        .iter()
        .filter_map(|e| {
            let hour = as_number(&e.hour)?;
            let score = as_number(&e.score)?;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let hour = (hour.fract() == 0.0 && (0.0..=23.0).contains(&hour)).then(|| hour as u8)?;
            Some((hour, score))
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut hours = Vec::with_capacity(BEST_HOURS);
    for (hour, _) in scored {
        if !hours.contains(&hour) {
            hours.push(hour);
        }
        if hours.len() == BEST_HOURS {
            break;
        }
    }
    hours
}

fn adapt(response: AudienceResponse) -> AudienceInsights {
    let segments = response
        .segments
        .into_iter()
        .filter(|s| !s.name.trim().is_empty())
        .map(|s| AudienceSegment {
            share: as_number(&s.share).map_or(0.0, |v| {
                let v = if v > 1.0 { v / 100.0 } else { v };
                v.clamp(0.0, 1.0)
            }),
            name: s.name.trim().to_owned(),
            interests: s.interests,
        })
        .collect();

    AudienceInsights {
        demographics: Demographics {
            age_groups: response.demographics.age_groups.into_iter().collect(),
            interests: response.demographics.interests.into_iter().collect(),
            locations: response.demographics.locations.into_iter().collect(),
        },
        segments,
        preferred_formats: response.preferred_formats,
        best_posting_hours: best_posting_hours(&response.engagement_by_hour),
    }
}

/// Audience-analytics adapter. The subject key is the comma-joined,
/// de-duplicated keyword set.
pub struct AudienceSource {
    deps: SourceDeps,
}

impl AudienceSource {
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
impl SourceAdapter for AudienceSource {
    type Output = AudienceInsights;

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch(&self, subject_key: &str) -> AudienceInsights {
        let topic = subject_key.trim();
        if topic.is_empty() {
            return AudienceInsights::default();
        }

        let Some(payload) = self
            .deps
            .fetch_or_log(SOURCE_NAME, topic, "v1/audience", &[("topic", topic)])
            .await
        else {
            return AudienceInsights::default();
        };

        let insights = SourceDeps::decode(SOURCE_NAME, payload)
            .map(adapt)
            .unwrap_or_default();
        tracing::debug!(
            source = SOURCE_NAME,
            segments = insights.segments.len(),
            "collected audience data"
        );
        insights
    }
}
