// src/cli/serve.rs — `siteinsight serve`

use std::sync::Arc;
use std::time::Duration;

use crate::api::{self, ApiState};
use crate::demo::rate_limit::RateLimiter;
use crate::infra::config::Config;

pub async fn run_serve(mut config: Config, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }
    crate::infra::paths::ensure_dirs().await?;

    let store = super::open_store()?;
    let insights = Arc::new(super::build_insights(&config, store.clone()));
    let demo_limiter = Arc::new(RateLimiter::new("demo", config.rate_limit.demo));

    if !insights.has_model() {
        tracing::warn!("No model credential found; every analysis will be a canned response");
    }

    let sweeper = spawn_cleanup(
        insights.clone(),
        demo_limiter.clone(),
        Duration::from_secs(config.server.cleanup_interval_secs.max(1)),
    );

    let state = ApiState {
        store,
        token: config.server.token.clone(),
        insights,
        demo_limiter,
        trust_forwarded_for: config.server.trust_forwarded_for,
    };
    let result = api::start_server(&config.server, state).await;
    sweeper.abort();
    result
}

/// Periodically drop expired limiter entries so memory stays bounded.
fn spawn_cleanup(
    insights: Arc<crate::demo::InsightService>,
    demo_limiter: Arc<RateLimiter>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // first tick fires immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = insights.analysis_limiter().cleanup() + demo_limiter.cleanup();
            tracing::debug!(removed, "Rate limiter sweep");
        }
    })
}
