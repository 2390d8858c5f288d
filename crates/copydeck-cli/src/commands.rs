use std::path::Path;

use anyhow::Context;
use copydeck_analytics::{report_to_csv, AnalysisOrchestrator};

/// Resolve the copy from `--content` or `--file`; clap guarantees exactly one.
pub(crate) fn read_content(inline: Option<String>, file: Option<&Path>) -> anyhow::Result<String> {
    let content = match (inline, file) {
        (Some(content), _) => content,
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read copy from {}", path.display()))?,
        (None, None) => anyhow::bail!("either --content or --file is required"),
    };
    if content.trim().is_empty() {
        anyhow::bail!("copy is empty");
    }
    Ok(content)
}

pub(crate) async fn run_analyze(
    orchestrator: &AnalysisOrchestrator,
    content: &str,
    topic: &str,
    format: &str,
    as_csv: bool,
) -> anyhow::Result<String> {
    let report = orchestrator.analyze(content, topic, format).await?;
    tracing::debug!(
        format,
        trends = report.market_trends.trends.len(),
        competitors = report.competitive_analysis.competitors.len(),
        "report ready"
    );
    if as_csv {
        Ok(report_to_csv(&report)?)
    } else {
        Ok(serde_json::to_string_pretty(&report)?)
    }
}

pub(crate) async fn run_invalidate(
    orchestrator: &AnalysisOrchestrator,
    content: &str,
    format: &str,
) -> anyhow::Result<()> {
    orchestrator
        .invalidate(content, format)
        .await
        .context("cache invalidation failed")
}
