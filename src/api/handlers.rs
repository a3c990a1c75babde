// src/api/handlers.rs

use crate::api::{auth, types::*, ApiState};
use crate::demo::session::{is_valid_session_id, SessionLimits, SessionStats};
use crate::demo::InsightOutcome;
use crate::insight::suggestions::{extract_suggestions, SuggestionLimits};
use crate::insight::url::{validate_and_sanitize_url, UrlValidation};
use crate::store::store::{MessageRow, ReportRow, WebsiteRow};
use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use std::net::SocketAddr;

type ApiError = (StatusCode, Json<ErrorResponse>);

const UPGRADE_HINT: &str =
    "You've used all free analyses for today. Create an account to keep optimizing.";

fn internal(context: &str, e: anyhow::Error) -> ApiError {
    tracing::error!("{}: {:#}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(format!("Internal error: {context}"))),
    )
}

fn not_found(what: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(format!("{what} '{id}' not found"))),
    )
}

/// Count a request against the looser demo-flow limiter.
fn demo_gate(state: &ApiState, peer: SocketAddr, headers: &HeaderMap) -> Result<String, ApiError> {
    let key = auth::client_key(peer, headers, state.trust_forwarded_for);
    let decision = state.demo_limiter.check_limit(&key);
    if decision.allowed {
        return Ok(key);
    }
    let retry = decision
        .reset_time
        .map(|t| format!(" Try again after {}.", t.to_rfc3339()))
        .unwrap_or_default();
    Err((
        StatusCode::TOO_MANY_REQUESTS,
        Json(ErrorResponse::new(format!("Too many requests.{retry}"))),
    ))
}

// ─── Demo routes ────────────────────────────────────────────────────────────

/// POST /api/v1/sessions: Reuse or mint an anonymous demo session.
pub async fn create_session(
    State(state): State<ApiState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SessionResponse>, ApiError> {
    // An empty body is allowed and mints a fresh session.
    let body: SessionRequest = if body.is_empty() {
        SessionRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(format!("Invalid session request: {e}"))),
            )
        })?
    };
    demo_gate(&state, peer, &headers)?;

    let tracker = state.insights.tracker();
    let session_id = tracker
        .get_or_create_session_id(body.session_id.as_deref())
        .await;
    let limits = tracker.check_session_limits(&session_id).await;

    Ok(Json(SessionResponse { session_id, limits }))
}

/// GET /api/v1/sessions/{id}/limits
pub async fn session_limits(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Json<SessionLimits> {
    Json(state.insights.tracker().check_session_limits(&id).await)
}

/// GET /api/v1/sessions/{id}/stats
pub async fn session_stats(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Json<SessionStats> {
    Json(state.insights.tracker().get_demo_session_stats(&id).await)
}

/// GET /api/v1/sessions/{id}/messages: Chat history, oldest first.
pub async fn session_messages(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<MessageRow>>, ApiError> {
    let messages = state
        .store
        .list_messages(id)
        .await
        .map_err(|e| internal("failed to list messages", e))?;
    Ok(Json(messages))
}

/// POST /api/v1/validate-url
pub async fn validate_url(
    State(state): State<ApiState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<ValidateUrlRequest>,
) -> Result<Json<UrlValidation>, ApiError> {
    demo_gate(&state, peer, &headers)?;
    Ok(Json(validate_and_sanitize_url(&body.url)))
}

/// POST /api/v1/analyze: Quota, rate limit, then model or fallback analysis.
pub async fn analyze(
    State(state): State<ApiState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<AnalyzeRequest>,
) -> Result<(StatusCode, Json<AnalyzeResponse>), ApiError> {
    if !is_valid_session_id(&body.session_id) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Invalid session id")),
        ));
    }
    if body.analysis.user_question.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Question cannot be empty")),
        ));
    }
    let client = demo_gate(&state, peer, &headers)?;

    let outcome = state
        .insights
        .request_insight(&client, &body.session_id, body.analysis)
        .await
        .map_err(|e| internal("failed to record analysis", e))?;

    let (status, message) = match &outcome {
        InsightOutcome::Delivered { .. } => (StatusCode::OK, None),
        InsightOutcome::InvalidUrl { .. } => (StatusCode::BAD_REQUEST, None),
        InsightOutcome::QuotaExceeded { .. } => {
            (StatusCode::FORBIDDEN, Some(UPGRADE_HINT.to_string()))
        }
        InsightOutcome::RateLimited { .. } => (
            StatusCode::TOO_MANY_REQUESTS,
            Some("Please wait a moment before requesting another analysis.".to_string()),
        ),
    };

    Ok((status, Json(AnalyzeResponse { outcome, message })))
}

// ─── Admin routes: websites ────────────────────────────────────────────────

/// POST /api/v1/websites
pub async fn create_website(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<WebsiteRequest>,
) -> Result<(StatusCode, Json<WebsiteRow>), ApiError> {
    auth::require_admin(&state, &headers)?;

    let validation = validate_and_sanitize_url(&body.url);
    if !validation.is_valid {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(validation.error.unwrap_or_default())),
        ));
    }

    let row = state
        .store
        .insert_website(
            uuid::Uuid::new_v4().to_string(),
            validation.sanitized_url,
            body.name,
            body.product_type,
        )
        .await
        .map_err(|e| internal("failed to create website", e))?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/websites
pub async fn list_websites(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<Vec<WebsiteRow>>, ApiError> {
    auth::require_admin(&state, &headers)?;
    let rows = state
        .store
        .list_websites()
        .await
        .map_err(|e| internal("failed to list websites", e))?;
    Ok(Json(rows))
}

/// GET /api/v1/websites/{id}
pub async fn get_website(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<WebsiteRow>, ApiError> {
    auth::require_admin(&state, &headers)?;
    state
        .store
        .get_website(id.clone())
        .await
        .map_err(|e| internal("failed to load website", e))?
        .map(Json)
        .ok_or_else(|| not_found("Website", &id))
}

/// PUT /api/v1/websites/{id}
pub async fn update_website(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<WebsiteUpdate>,
) -> Result<Json<WebsiteRow>, ApiError> {
    auth::require_admin(&state, &headers)?;
    state
        .store
        .update_website(id.clone(), body.name, body.product_type)
        .await
        .map_err(|e| internal("failed to update website", e))?
        .map(Json)
        .ok_or_else(|| not_found("Website", &id))
}

/// DELETE /api/v1/websites/{id}: Also removes its reports.
pub async fn delete_website(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    auth::require_admin(&state, &headers)?;
    let deleted = state
        .store
        .delete_website(id.clone())
        .await
        .map_err(|e| internal("failed to delete website", e))?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Website", &id))
    }
}

// ─── Admin routes: reports ─────────────────────────────────────────────────

/// POST /api/v1/websites/{id}/reports
pub async fn create_report(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(website_id): Path<String>,
    Json(body): Json<ReportRequest>,
) -> Result<(StatusCode, Json<ReportRow>), ApiError> {
    auth::require_admin(&state, &headers)?;

    let exists = state
        .store
        .get_website(website_id.clone())
        .await
        .map_err(|e| internal("failed to load website", e))?
        .is_some();
    if !exists {
        return Err(not_found("Website", &website_id));
    }

    let suggestions = body
        .suggestions
        .unwrap_or_else(|| extract_suggestions(&body.content, &SuggestionLimits::SERVER));
    let row = state
        .store
        .insert_report(
            uuid::Uuid::new_v4().to_string(),
            website_id,
            body.content,
            suggestions,
        )
        .await
        .map_err(|e| internal("failed to create report", e))?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/websites/{id}/reports: Oldest first.
pub async fn list_reports(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(website_id): Path<String>,
) -> Result<Json<Vec<ReportRow>>, ApiError> {
    auth::require_admin(&state, &headers)?;
    let rows = state
        .store
        .list_reports(website_id)
        .await
        .map_err(|e| internal("failed to list reports", e))?;
    Ok(Json(rows))
}

/// GET /api/v1/reports/{id}
pub async fn get_report(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ReportRow>, ApiError> {
    auth::require_admin(&state, &headers)?;
    state
        .store
        .get_report(id.clone())
        .await
        .map_err(|e| internal("failed to load report", e))?
        .map(Json)
        .ok_or_else(|| not_found("Report", &id))
}

/// DELETE /api/v1/reports/{id}
pub async fn delete_report(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    auth::require_admin(&state, &headers)?;
    let deleted = state
        .store
        .delete_report(id.clone())
        .await
        .map_err(|e| internal("failed to delete report", e))?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Report", &id))
    }
}

/// GET /api/v1/health: Simple health check.
pub async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.insights.has_model(),
    }))
}
