//! Analytics report handlers: compute, invalidate, CSV export.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use copydeck_analytics::{report_to_csv, AnalyticsError};
use copydeck_core::AnalyticsReport;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

/// Format used when the request leaves it out.
const DEFAULT_FORMAT: &str = "default";

const MAX_CONTENT_BYTES: usize = 200_000;

#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeRequest {
    pub content: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct InvalidateRequest {
    pub content: String,
    #[serde(default)]
    pub format: Option<String>,
}

fn resolve_format(format: Option<&str>) -> &str {
    format
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or(DEFAULT_FORMAT)
}

fn validate_content(req_id: &str, content: &str) -> Result<(), ApiError> {
    if content.trim().is_empty() {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "content must not be empty",
        ));
    }
    if content.len() > MAX_CONTENT_BYTES {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            format!("content must be at most {MAX_CONTENT_BYTES} bytes"),
        ));
    }
    Ok(())
}

fn map_analytics_error(req_id: &str, error: &AnalyticsError) -> ApiError {
    tracing::error!(code = %error.code(), error = %error, "report assembly failed");
    ApiError::new(req_id, "internal_error", "report assembly failed")
}

async fn build_report(
    state: &AppState,
    req_id: &str,
    body: &AnalyzeRequest,
) -> Result<AnalyticsReport, ApiError> {
    validate_content(req_id, &body.content)?;
    let format = resolve_format(body.format.as_deref());
    state
        .orchestrator
        .analyze(&body.content, &body.topic, format)
        .await
        .map_err(|e| map_analytics_error(req_id, &e))
}

/// POST /api/v1/analytics: the (cached or fresh) report for the content.
pub(super) async fn analyze_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Json<ApiResponse<AnalyticsReport>>, ApiError> {
    let report = build_report(&state, &req_id.0, &body).await?;
    Ok(Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/analytics: drop the cached report.
pub(super) async fn invalidate_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<InvalidateRequest>,
) -> Result<StatusCode, ApiError> {
    let rid = &req_id.0;
    validate_content(rid, &body.content)?;
    let format = resolve_format(body.format.as_deref());

    state
        .orchestrator
        .invalidate(&body.content, format)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "cache invalidation failed");
            ApiError::new(rid, "cache_unavailable", "cache backend unavailable")
        })?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/analytics/export: the report rendered as CSV.
pub(super) async fn export_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Response, ApiError> {
    let rid = &req_id.0;
    let report = build_report(&state, rid, &body).await?;
    let csv = report_to_csv(&report).map_err(|e| map_analytics_error(rid, &e))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"analytics-report.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}
