//! Shared configuration and report model for the copydeck analytics pipeline.

pub mod app_config;
pub mod config;
pub mod report;

pub use app_config::{AppConfig, DurableCacheConfig, Environment, NarrativeEndpoint, ProviderEndpoint};
pub use config::{load_app_config, load_app_config_from_env};
pub use report::{
    AnalyticsReport, AudienceInsights, AudienceSegment, CompetitiveAnalysis, CompetitorProfile,
    ContentInsights, Demographics, EmotionalMetrics, MarketTrends, ReadabilityMetrics,
    RelatedTopic, SeoMetrics, StrategyRecommendations, TrendSignal, MONTH_LABELS,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
