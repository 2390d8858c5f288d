//! Strategic analytics pipeline: provider adapters, trend aggregation,
//! content-addressed caching and report orchestration.

pub mod aggregate;
pub mod cache;
pub mod error;
pub mod export;
pub mod narrative;
pub mod orchestrator;
pub mod retry;
pub mod sources;
pub mod strategy;

pub use cache::{CacheBackend, ContentCache, MemoryBackend, RestKvBackend};
pub use error::{AnalyticsError, ErrorCode};
pub use export::report_to_csv;
pub use narrative::{LexicalNarrative, LlmNarrative, NarrativeMetrics};
pub use orchestrator::{extract_keywords, AnalysisOrchestrator};
pub use retry::RetryPolicy;
pub use sources::{
    build_http_client, AudienceSource, CompetitorSource, ProviderClient, SourceAdapter,
    TrendProviderKind, TrendSource,
};
