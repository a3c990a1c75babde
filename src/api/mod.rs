// src/api/mod.rs — HTTP API for the demo flow and admin CRUD

pub mod auth;
pub mod handlers;
pub mod types;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::demo::rate_limit::RateLimiter;
use crate::demo::InsightService;
use crate::infra::config::ServerConfig;
use crate::store::StoreHandle;

const ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
];

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: StoreHandle,
    /// Admin bearer token. `None` leaves admin routes open (local use).
    pub token: Option<String>,
    pub insights: Arc<InsightService>,
    /// Looser limiter covering every demo route.
    pub demo_limiter: Arc<RateLimiter>,
    /// Key limiters on `x-forwarded-for` instead of the peer address.
    pub trust_forwarded_for: bool,
}

/// Build the axum router with all API routes.
pub fn build_router(state: ApiState) -> Router {
    let origins: Vec<HeaderValue> = ALLOWED_ORIGINS
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/api/v1/health", get(handlers::health))
        // Demo
        .route("/api/v1/sessions", post(handlers::create_session))
        .route("/api/v1/sessions/{id}/limits", get(handlers::session_limits))
        .route("/api/v1/sessions/{id}/stats", get(handlers::session_stats))
        .route(
            "/api/v1/sessions/{id}/messages",
            get(handlers::session_messages),
        )
        .route("/api/v1/validate-url", post(handlers::validate_url))
        .route("/api/v1/analyze", post(handlers::analyze))
        // Admin
        .route(
            "/api/v1/websites",
            post(handlers::create_website).get(handlers::list_websites),
        )
        .route(
            "/api/v1/websites/{id}",
            get(handlers::get_website)
                .put(handlers::update_website)
                .delete(handlers::delete_website),
        )
        .route(
            "/api/v1/websites/{id}/reports",
            post(handlers::create_report).get(handlers::list_reports),
        )
        .route(
            "/api/v1/reports/{id}",
            get(handlers::get_report).delete(handlers::delete_report),
        )
        .layer(cors)
        .with_state(state)
}

/// Serve until ctrl-c.
pub async fn start_server(config: &ServerConfig, state: ApiState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let router = build_router(state);

    tracing::info!("API server listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down API server");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::config::{QuotaConfig, WindowPolicy};
    use crate::insight::{Analyzer, AnalyzerConfig};
    use crate::demo::session::SessionTracker;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_state() -> ApiState {
        let (store, _) = crate::store::spawn_store_server(crate::store::in_memory().unwrap());
        let policy = WindowPolicy {
            max_requests: 100,
            window_ms: 60_000,
        };
        let insights = InsightService::new(
            SessionTracker::new(store.clone(), &QuotaConfig::default()),
            Arc::new(RateLimiter::new("analysis", policy)),
            Arc::new(Analyzer::new(None, AnalyzerConfig::default())),
            store.clone(),
        );
        ApiState {
            store,
            token: None,
            insights: Arc::new(insights),
            demo_limiter: Arc::new(RateLimiter::new("demo", policy)),
            trust_forwarded_for: false,
        }
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = build_router(test_state());
        let req = Request::builder()
            .uri("/api/v1/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = build_router(test_state());
        let req = Request::builder()
            .uri("/api/v1/tasks")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
