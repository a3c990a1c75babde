// src/demo/mod.rs — The demo request pipeline
//
// validate URL -> session quota -> rate limit -> analyzer -> record usage

pub mod local;
pub mod rate_limit;
pub mod session;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::insight::url::validate_and_sanitize_url;
use crate::insight::{AnalysisRequest, AnalysisResult, Analyzer};
use crate::provider::Message;
use crate::store::StoreHandle;
use rate_limit::RateLimiter;
use session::SessionTracker;

/// Result of one insight request. Only `Delivered` consumed quota.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InsightOutcome {
    Delivered {
        analysis: AnalysisResult,
        remaining_analyses: u32,
    },
    InvalidUrl {
        error: String,
    },
    QuotaExceeded {
        remaining_analyses: u32,
    },
    RateLimited {
        reset_time: Option<DateTime<Utc>>,
    },
}

pub struct InsightService {
    tracker: SessionTracker,
    analysis_limiter: Arc<RateLimiter>,
    analyzer: Arc<Analyzer>,
    store: StoreHandle,
}

impl InsightService {
    pub fn new(
        tracker: SessionTracker,
        analysis_limiter: Arc<RateLimiter>,
        analyzer: Arc<Analyzer>,
        store: StoreHandle,
    ) -> Self {
        Self {
            tracker,
            analysis_limiter,
            analyzer,
            store,
        }
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    pub fn analysis_limiter(&self) -> &RateLimiter {
        &self.analysis_limiter
    }

    /// Whether analyses can reach a live model at all.
    pub fn has_model(&self) -> bool {
        self.analyzer.has_provider()
    }

    /// Run the full pipeline for one request.
    ///
    /// `client_key` feeds the rate limiter; `session_id` the quota. Errors
    /// come only from recording the completed analysis.
    pub async fn request_insight(
        &self,
        client_key: &str,
        session_id: &str,
        mut request: AnalysisRequest,
    ) -> anyhow::Result<InsightOutcome> {
        let validation = validate_and_sanitize_url(&request.website_url);
        if !validation.is_valid {
            return Ok(InsightOutcome::InvalidUrl {
                error: validation.error.unwrap_or_default(),
            });
        }
        request.website_url = validation.sanitized_url;

        let limits = self.tracker.check_session_limits(session_id).await;
        if !limits.can_proceed {
            tracing::info!(session = %session_id, "Demo quota exhausted");
            return Ok(InsightOutcome::QuotaExceeded {
                remaining_analyses: 0,
            });
        }

        let decision = self.analysis_limiter.check_limit(client_key);
        if !decision.allowed {
            return Ok(InsightOutcome::RateLimited {
                reset_time: decision.reset_time,
            });
        }

        tracing::debug!(
            session = %session_id,
            url = %request.website_url,
            question = %crate::util::preview(&request.user_question, 80),
            "Running analysis"
        );
        let analysis = self.analyzer.analyze(&request).await;

        self.tracker
            .record_analysis(session_id, &request.website_url)
            .await?;
        self.save_exchange(session_id, &request.user_question, &analysis.content)
            .await?;

        Ok(InsightOutcome::Delivered {
            remaining_analyses: limits.remaining_analyses.saturating_sub(1),
            analysis,
        })
    }

    async fn save_exchange(
        &self,
        session_id: &str,
        question: &str,
        answer: &str,
    ) -> anyhow::Result<()> {
        for message in [Message::user(question), Message::assistant(answer)] {
            self.store
                .insert_message(
                    uuid::Uuid::new_v4().to_string(),
                    session_id.to_string(),
                    message.role.as_str().to_string(),
                    message.content,
                )
                .await?;
        }
        Ok(())
    }
}
