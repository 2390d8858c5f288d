//! Strategy recommendations derived from the other report sections.

use copydeck_core::{
    AudienceInsights, CompetitiveAnalysis, ContentInsights, MarketTrends, StrategyRecommendations,
};

const FOCUS_KEYWORDS: usize = 3;

/// Derive recommendations once every branch has settled.
///
/// Pure and deterministic: empty inputs produce empty lists.
#[must_use]
pub fn recommend(
    trends: &MarketTrends,
    insights: &ContentInsights,
    competition: &CompetitiveAnalysis,
    audience: &AudienceInsights,
) -> StrategyRecommendations {
    // Stable sort keeps first-seen order on equal growth.
    let mut by_growth: Vec<_> = trends.trends.iter().collect();
    by_growth.sort_by(|a, b| b.growth_pct.total_cmp(&a.growth_pct));

    let publish_months = by_growth
        .first()
        .map(|t| t.seasonality_peak_months.clone())
        .unwrap_or_default();

    let focus_keywords: Vec<String> = by_growth
        .iter()
        .take(FOCUS_KEYWORDS)
        .map(|t| t.topic.clone())
        .collect();

    let covered = |gap: &str| {
        let gap = gap.to_lowercase();
        trends
            .keywords
            .iter()
            .chain(trends.trends.iter().map(|t| &t.topic))
            .any(|k| gap == k.to_lowercase())
    };
    let content_gaps: Vec<String> = competition
        .content_gaps
        .iter()
        .filter(|g| !covered(g))
        .cloned()
        .collect();

    let mut segments: Vec<_> = audience.segments.iter().collect();
    segments.sort_by(|a, b| b.share.total_cmp(&a.share));
    let target_segments: Vec<String> = segments.iter().map(|s| s.name.clone()).collect();

    let mut actions = Vec::new();
    if let (Some(top), Some(first_month)) = (by_growth.first(), publish_months.first()) {
        actions.push(format!(
            "Schedule '{}' content ahead of {first_month}, its strongest month",
            top.topic
        ));
    }
    if let Some(gap) = content_gaps.first() {
        actions.push(format!("Cover '{gap}', which competitors leave open"));
    }
    if let Some(segment) = target_segments.first() {
        actions.push(format!("Write for the '{segment}' segment first"));
    }
    if let Some(hour) = audience.best_posting_hours.first() {
        actions.push(format!("Publish around {hour:02}:00 UTC"));
    }
    if let Some(tip) = insights.readability.improvements.first() {
        actions.push(tip.clone());
    }
    if let Some(tip) = insights.seo.suggestions.first() {
        actions.push(tip.clone());
    }

    StrategyRecommendations {
        publish_months,
        focus_keywords,
        content_gaps,
        target_segments,
        actions,
    }
}
