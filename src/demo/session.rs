// src/demo/session.rs — Anonymous demo sessions and their analysis quota
//
// Reads (limits, stats) fail open: if the store is unreachable the visitor
// keeps the full quota and the error is logged. Writes propagate.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::infra::config::QuotaConfig;
use crate::store::StoreHandle;

pub const MAX_ANALYSES_PER_SESSION: u32 = 10;
pub const SESSION_DURATION_HOURS: u32 = 24;

const SESSION_ID_PREFIX: &str = "demo_";
const MAX_SESSION_ID_LEN: usize = 64;

/// `demo_<unix millis>_<9 random chars>`
pub fn new_session_id() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{SESSION_ID_PREFIX}{}_{}",
        Utc::now().timestamp_millis(),
        &suffix[..9]
    )
}

/// Accept client-held ids that look like something we could have minted.
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLimits {
    pub can_proceed: bool,
    pub remaining_analyses: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_analyses: u32,
    pub time_remaining_secs: i64,
    pub created_at: Option<DateTime<Utc>>,
}

pub struct SessionTracker {
    store: StoreHandle,
    max_per_session: u32,
    window: Duration,
}

impl SessionTracker {
    pub fn new(store: StoreHandle, quota: &QuotaConfig) -> Self {
        Self {
            store,
            max_per_session: quota.max_analyses_per_session,
            window: Duration::hours(i64::from(quota.session_duration_hours)),
        }
    }

    pub fn max_per_session(&self) -> u32 {
        self.max_per_session
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Reuse `existing` when it is well-formed, otherwise mint a new id.
    /// Always returns an id; a failed store write is only logged.
    pub async fn get_or_create_session_id(&self, existing: Option<&str>) -> String {
        let id = match existing.map(str::trim) {
            Some(id) if is_valid_session_id(id) => id.to_string(),
            _ => new_session_id(),
        };
        if let Err(e) = self.store.ensure_session(id.clone()).await {
            tracing::warn!(session = %id, "Failed to persist demo session: {}", e);
        }
        id
    }

    pub async fn check_session_limits(&self, session_id: &str) -> SessionLimits {
        match self.query_limits(session_id).await {
            Ok(limits) => limits,
            Err(e) => {
                tracing::warn!(
                    session = %session_id,
                    "Session limit check failed, allowing request: {}",
                    e
                );
                SessionLimits {
                    can_proceed: true,
                    remaining_analyses: self.max_per_session,
                }
            }
        }
    }

    async fn query_limits(&self, session_id: &str) -> anyhow::Result<SessionLimits> {
        let since = Utc::now() - self.window;
        let used = self
            .store
            .count_analyses_since(session_id.to_string(), since)
            .await?;
        let allowed = self
            .store
            .check_session_quota(session_id.to_string(), self.max_per_session, since)
            .await?;
        Ok(SessionLimits {
            can_proceed: allowed,
            remaining_analyses: self.max_per_session.saturating_sub(used),
        })
    }

    pub async fn get_demo_session_stats(&self, session_id: &str) -> SessionStats {
        match self.query_stats(session_id).await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(session = %session_id, "Session stats unavailable: {}", e);
                SessionStats {
                    total_analyses: 0,
                    time_remaining_secs: self.window.num_seconds(),
                    created_at: None,
                }
            }
        }
    }

    async fn query_stats(&self, session_id: &str) -> anyhow::Result<SessionStats> {
        let now = Utc::now();
        let since = now - self.window;
        let total = self
            .store
            .count_analyses_since(session_id.to_string(), since)
            .await?;
        let earliest = self
            .store
            .earliest_analysis_since(session_id.to_string(), since)
            .await?;

        let time_remaining_secs = match earliest {
            Some(first) => (first + self.window - now).num_seconds().max(0),
            None => self.window.num_seconds(),
        };
        Ok(SessionStats {
            total_analyses: total,
            time_remaining_secs,
            created_at: earliest,
        })
    }

    /// Count one completed analysis against the session.
    pub async fn record_analysis(&self, session_id: &str, website_url: &str) -> anyhow::Result<()> {
        self.store
            .record_analysis(
                uuid::Uuid::new_v4().to_string(),
                session_id.to_string(),
                website_url.to_string(),
            )
            .await
    }
}
