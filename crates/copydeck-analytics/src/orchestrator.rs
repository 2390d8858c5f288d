//! Report orchestration: cache lookup, concurrent fan-out, assembly.

use std::sync::Arc;
use std::time::Duration;

use copydeck_core::{AnalyticsReport, AppConfig, MarketTrends, ProviderEndpoint};
use futures::future::join_all;

use crate::aggregate::aggregate;
use crate::cache::ContentCache;
use crate::error::AnalyticsError;
use crate::narrative::{LexicalNarrative, LlmNarrative, NarrativeMetrics};
use crate::retry::RetryPolicy;
use crate::sources::{
    build_http_client, AudienceSource, CompetitorSource, ProviderClient, SourceAdapter,
    TrendProviderKind, TrendSource,
};
use crate::strategy::recommend;

/// Split a topic into its keyword set.
///
/// Comma-separated, trimmed, blanks dropped, de-duplicated case-insensitively
/// keeping the first spelling.
#[must_use]
pub fn extract_keywords(topic: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for raw in topic.split(',') {
        let keyword = raw.trim();
        if keyword.is_empty() {
            continue;
        }
        let lower = keyword.to_lowercase();
        if !keywords.iter().any(|k| k.to_lowercase() == lower) {
            keywords.push(keyword.to_owned());
        }
    }
    keywords
}

struct Inner {
    cache: ContentCache,
    trend_sources: Vec<TrendSource>,
    competitors: CompetitorSource,
    audience: AudienceSource,
    narrative: Arc<dyn NarrativeMetrics>,
}

/// Cheaply cloneable handle over the shared pipeline.
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    inner: Arc<Inner>,
}

impl AnalysisOrchestrator {
    pub fn new(
        cache: ContentCache,
        trend_sources: Vec<TrendSource>,
        competitors: CompetitorSource,
        audience: AudienceSource,
        narrative: Arc<dyn NarrativeMetrics>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache,
                trend_sources,
                competitors,
                audience,
                narrative,
            }),
        }
    }

    /// Wire every collaborator from configuration.
    ///
    /// Unconfigured providers stay in place and always return their empty
    /// default, so the report shape never depends on configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError`] if the HTTP client cannot be built or a
    /// configured URL is invalid.
    pub fn from_config(config: &AppConfig) -> Result<Self, AnalyticsError> {
        let client = build_http_client(config.http_timeout_secs, &config.user_agent)?;
        let cache = ContentCache::from_config(
            config.durable_cache.as_ref(),
            Duration::from_secs(config.cache_ttl_secs),
            client.clone(),
        )?;
        let retry = RetryPolicy::new(config.retry_max_attempts, config.retry_base_delay_ms)
            .with_jitter(config.retry_jitter);

        let provider = |endpoint: Option<&ProviderEndpoint>| {
            endpoint
                .map(|e| ProviderClient::new(client.clone(), &e.base_url, &e.api_key))
                .transpose()
        };

        let trend_sources = vec![
            TrendSource::new(
                TrendProviderKind::SearchInterest,
                provider(config.search_interest.as_ref())?,
                cache.clone(),
                retry,
            ),
            TrendSource::new(
                TrendProviderKind::KeywordMetrics,
                provider(config.keyword_metrics.as_ref())?,
                cache.clone(),
                retry,
            ),
        ];
        let competitors =
            CompetitorSource::new(provider(config.competitors.as_ref())?, cache.clone(), retry);
        let audience =
            AudienceSource::new(provider(config.audience.as_ref())?, cache.clone(), retry);

        let narrative: Arc<dyn NarrativeMetrics> = match &config.narrative {
            Some(endpoint) => Arc::new(LlmNarrative::new(
                ProviderClient::new(client.clone(), &endpoint.base_url, &endpoint.api_key)?,
                &endpoint.model,
                retry,
            )),
            None => Arc::new(LexicalNarrative),
        };

        tracing::info!(
            cache = cache.backend_name(),
            narrative = narrative.name(),
            max_attempts = retry.max_attempts(),
            "analysis orchestrator ready"
        );

        Ok(Self::new(cache, trend_sources, competitors, audience, narrative))
    }

    #[must_use]
    pub fn cache_backend_name(&self) -> &'static str {
        self.inner.cache.backend_name()
    }

    /// Sweep expired cache entries; returns how many were removed.
    pub async fn purge_expired_cache(&self) -> usize {
        self.inner.cache.purge_expired().await
    }

    /// Return the report for `(content, format)`, computing it on a miss.
    ///
    /// A cache read failure counts as a miss and a cache write failure is
    /// logged; neither fails the call. The computation runs on its own task,
    /// so dropping this future does not stop the report from being cached.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Assembly`] if the computation task panics.
    pub async fn analyze(
        &self,
        content: &str,
        topic: &str,
        format: &str,
    ) -> Result<AnalyticsReport, AnalyticsError> {
        match self.inner.cache.get(content, format).await {
            Ok(Some(report)) => {
                tracing::info!(format, "report cache hit");
                return Ok(report);
            }
            Ok(None) => tracing::info!(format, "report cache miss"),
            Err(e) => {
                tracing::warn!(error = %e, "report cache read failed; recomputing");
            }
        }

        let this = self.clone();
        let content = content.to_owned();
        let topic = topic.to_owned();
        let format = format.to_owned();
        tokio::spawn(async move { this.compute(&content, &topic, &format).await })
            .await
            .map_err(|e| AnalyticsError::Assembly(format!("analysis task failed: {e}")))
    }

    /// Drop the cached report for `(content, format)`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Cache`] if the backend request fails.
    pub async fn invalidate(&self, content: &str, format: &str) -> Result<(), AnalyticsError> {
        self.inner.cache.invalidate(content, format).await?;
        tracing::info!(format, "report invalidated");
        Ok(())
    }

    async fn market_trends(&self, keywords: &[String], subject_key: &str) -> MarketTrends {
        if keywords.is_empty() {
            return MarketTrends::default();
        }
        let providers = join_all(
            self.inner
                .trend_sources
                .iter()
                .map(|source| source.fetch(subject_key)),
        )
        .await;
        aggregate(keywords, &providers)
    }

    async fn compute(&self, content: &str, topic: &str, format: &str) -> AnalyticsReport {
        let inner = &self.inner;
        let keywords = extract_keywords(topic);
        // Normalised topic shared by every provider; blank skips them all.
        let subject_key = keywords.join(",");

        let narrative = async {
            match inner.narrative.analyze(content, &keywords).await {
                Ok(insights) => insights,
                Err(e) => {
                    tracing::warn!(
                        source = inner.narrative.name(),
                        code = %e.code(),
                        error = %e,
                        "narrative metrics failed; substituting empty default"
                    );
                    copydeck_core::ContentInsights::default()
                }
            }
        };

        let (market_trends, competitive_analysis, audience_insights, content_insights) = tokio::join!(
            self.market_trends(&keywords, &subject_key),
            inner.competitors.fetch(&subject_key),
            inner.audience.fetch(&subject_key),
            narrative,
        );

        let strategy_recommendations = recommend(
            &market_trends,
            &content_insights,
            &competitive_analysis,
            &audience_insights,
        );

        let report = AnalyticsReport {
            market_trends,
            content_insights,
            competitive_analysis,
            strategy_recommendations,
            audience_insights,
        };

        if let Err(e) = inner.cache.set(content, format, &report).await {
            tracing::warn!(error = %e, "report cache write failed; returning fresh report");
        }

        tracing::info!(
            format,
            trends = report.market_trends.trends.len(),
            competitors = report.competitive_analysis.competitors.len(),
            segments = report.audience_insights.segments.len(),
            "report assembled"
        );
        report
    }
}
