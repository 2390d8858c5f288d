//! Flat CSV rendering of an [`AnalyticsReport`].
//!
//! One row per scalar: `section,item,metric,value`. List values are joined
//! with `"; "`. Row order follows the report's own field order so the output
//! is stable for a given report.

use copydeck_core::AnalyticsReport;
use csv::WriterBuilder;

use crate::error::AnalyticsError;

const HEADER: [&str; 4] = ["section", "item", "metric", "value"];

struct Rows {
    rows: Vec<[String; 4]>,
}

impl Rows {
    fn push(&mut self, section: &str, item: &str, metric: &str, value: impl ToString) {
        self.rows.push([
            section.to_owned(),
            item.to_owned(),
            metric.to_owned(),
            value.to_string(),
        ]);
    }

    fn push_list(&mut self, section: &str, item: &str, metric: &str, values: &[String]) {
        if !values.is_empty() {
            self.push(section, item, metric, values.join("; "));
        }
    }
}

fn collect_rows(report: &AnalyticsReport) -> Vec<[String; 4]> {
    let mut out = Rows { rows: Vec::new() };

    let trends = &report.market_trends;
    out.push_list("market_trends", "", "keywords", &trends.keywords);
    for (keyword, volume) in &trends.volumes {
        out.push("market_trends", keyword, "search_volume", volume);
    }
    for t in &trends.trends {
        out.push("market_trends", &t.topic, "growth_pct", format!("{:.2}", t.growth_pct));
        out.push("market_trends", &t.topic, "relevance", format!("{:.2}", t.relevance));
        out.push_list("market_trends", &t.topic, "peak_months", &t.seasonality_peak_months);
        out.push_list("market_trends", &t.topic, "low_months", &t.seasonality_low_months);
    }
    for r in &trends.related_topics {
        out.push("related_topics", &r.name, "correlation", format!("{:.2}", r.correlation));
        out.push("related_topics", &r.name, "search_volume", r.search_volume);
    }

    let insights = &report.content_insights;
    let readability = &insights.readability;
    out.push("content_insights", "readability", "score", format!("{:.1}", readability.score));
    out.push("content_insights", "readability", "level", &readability.level);
    out.push("content_insights", "readability", "read_time_minutes", readability.read_time_minutes);
    out.push("content_insights", "readability", "retention", format!("{:.2}", readability.retention));
    out.push_list("content_insights", "readability", "improvements", &readability.improvements);
    out.push("content_insights", "emotional", "score", format!("{:.2}", insights.emotional.score));
    out.push("content_insights", "emotional", "tone", &insights.emotional.tone);
    out.push_list("content_insights", "emotional", "triggers", &insights.emotional.triggers);
    out.push("content_insights", "seo", "score", format!("{:.1}", insights.seo.score));
    for (keyword, density) in &insights.seo.keyword_density {
        out.push("content_insights", keyword, "keyword_density", format!("{density:.2}"));
    }
    out.push_list("content_insights", "seo", "suggestions", &insights.seo.suggestions);

    let competition = &report.competitive_analysis;
    for c in &competition.competitors {
        out.push("competitive_analysis", &c.name, "domain", &c.domain);
        out.push("competitive_analysis", &c.name, "market_share", format!("{:.3}", c.market_share));
        out.push_list("competitive_analysis", &c.name, "top_keywords", &c.top_keywords);
    }
    out.push(
        "competitive_analysis",
        "",
        "average_market_share",
        format!("{:.3}", competition.average_market_share),
    );
    out.push_list("competitive_analysis", "", "content_gaps", &competition.content_gaps);

    let audience = &report.audience_insights;
    for s in &audience.segments {
        out.push("audience_insights", &s.name, "share", format!("{:.3}", s.share));
    }
    out.push_list("audience_insights", "", "preferred_formats", &audience.preferred_formats);
    if !audience.best_posting_hours.is_empty() {
        let hours: Vec<String> = audience.best_posting_hours.iter().map(u8::to_string).collect();
        out.push_list("audience_insights", "", "best_posting_hours", &hours);
    }

    let strategy = &report.strategy_recommendations;
    out.push_list("strategy", "", "publish_months", &strategy.publish_months);
    out.push_list("strategy", "", "focus_keywords", &strategy.focus_keywords);
    out.push_list("strategy", "", "content_gaps", &strategy.content_gaps);
    out.push_list("strategy", "", "target_segments", &strategy.target_segments);
    for (i, action) in strategy.actions.iter().enumerate() {
        out.push("strategy", &format!("action_{}", i + 1), "text", action);
    }

    out.rows
}

/// Render `report` as CSV with a header row.
///
/// # Errors
///
/// Returns [`AnalyticsError::Assembly`] if the CSV writer fails, which only
/// happens on an internal encoding error.
pub fn report_to_csv(report: &AnalyticsReport) -> Result<String, AnalyticsError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer
        .write_record(HEADER)
        .map_err(|e| AnalyticsError::Assembly(format!("csv header: {e}")))?;
    for row in collect_rows(report) {
        writer
            .write_record(&row)
            .map_err(|e| AnalyticsError::Assembly(format!("csv row: {e}")))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AnalyticsError::Assembly(format!("csv flush: {e}")))?;
    String::from_utf8(bytes).map_err(|e| AnalyticsError::Assembly(format!("csv utf-8: {e}")))
}
