use thiserror::Error;

/// Stable machine-readable classification of an [`AnalyticsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    RateLimited,
    Network,
    Unauthorized,
    BadResponse,
    UpstreamStatus,
    Cache,
    Narrative,
    Assembly,
}

impl ErrorCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::RateLimited => "rate_limited",
            ErrorCode::Network => "network",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::BadResponse => "bad_response",
            ErrorCode::UpstreamStatus => "upstream_status",
            ErrorCode::Cache => "cache",
            ErrorCode::Narrative => "narrative",
            ErrorCode::Assembly => "assembly",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {source_name}")]
    RateLimited {
        source_name: String,
        retry_after_secs: Option<u64>,
    },

    #[error("{source_name} rejected credentials (HTTP {status})")]
    Unauthorized { source_name: String, status: u16 },

    #[error("unexpected HTTP status {status} from {source_name}")]
    UnexpectedStatus { source_name: String, status: u16 },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cache backend error: {0}")]
    Cache(String),

    #[error("narrative metrics error: {0}")]
    Narrative(String),

    /// Terminal failure of a source after the retry policy gave up.
    #[error("{source_name} failed ({code}): {message}")]
    SourceFailed {
        source_name: String,
        code: ErrorCode,
        message: String,
        #[source]
        cause: Box<AnalyticsError>,
    },

    #[error("report assembly failed: {0}")]
    Assembly(String),
}

impl AnalyticsError {
    /// Classifies this error for logging and for the typed source failure.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            AnalyticsError::Http(e) => match e.status() {
                Some(s) if s.as_u16() == 429 => ErrorCode::RateLimited,
                Some(s) if s.as_u16() == 401 || s.as_u16() == 403 => ErrorCode::Unauthorized,
                Some(_) => ErrorCode::UpstreamStatus,
                None if e.is_decode() => ErrorCode::BadResponse,
                None => ErrorCode::Network,
            },
            AnalyticsError::RateLimited { .. } => ErrorCode::RateLimited,
            AnalyticsError::Unauthorized { .. } => ErrorCode::Unauthorized,
            AnalyticsError::UnexpectedStatus { .. } => ErrorCode::UpstreamStatus,
            AnalyticsError::Deserialize { .. } => ErrorCode::BadResponse,
            AnalyticsError::Cache(_) => ErrorCode::Cache,
            AnalyticsError::Narrative(_) => ErrorCode::Narrative,
            AnalyticsError::SourceFailed { code, .. } => *code,
            AnalyticsError::Assembly(_) => ErrorCode::Assembly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_failed_reports_wrapped_code() {
        let err = AnalyticsError::SourceFailed {
            source_name: "competitors".to_owned(),
            code: ErrorCode::Unauthorized,
            message: "bad key".to_owned(),
            cause: Box::new(AnalyticsError::Unauthorized {
                source_name: "competitors".to_owned(),
                status: 401,
            }),
        };
        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert_eq!(
            err.to_string(),
            "competitors failed (unauthorized): bad key"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn error_codes_are_snake_case() {
        assert_eq!(ErrorCode::RateLimited.as_str(), "rate_limited");
        assert_eq!(ErrorCode::BadResponse.to_string(), "bad_response");
    }
}
