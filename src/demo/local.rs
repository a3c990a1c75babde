// src/demo/local.rs — Client-side demo state (`~/.siteinsight/state/demo.json`)
//
// Holds the anonymous session id and a `{count, timestamp}` rate-limit blob.
// Written atomically (temp file + rename). Credentials are never stored here.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::rate_limit::{RateLimitDecision, WindowCounter};
use super::session::{is_valid_session_id, new_session_id};
use crate::infra::config::WindowPolicy;
use crate::infra::paths;

/// Requests counted in the window that opened at `timestamp` (unix millis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitBlob {
    pub count: u32,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalState {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub rate_limit: Option<RateLimitBlob>,
}

pub fn state_file_path() -> PathBuf {
    paths::state_dir().join("demo.json")
}

impl LocalState {
    /// Read the state file. Missing or corrupt files yield a blank state.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("Ignoring unreadable {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("state path has no parent: {}", path.display()))?;
        std::fs::create_dir_all(dir)?;

        let json = serde_json::to_string_pretty(self)?;
        let tmp = dir.join(".demo.json.tmp");

        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(json.as_bytes())?;
        f.flush()?;
        f.sync_all()?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Existing session id, or a freshly minted one stored in `self`.
    pub fn get_or_create_session_id(&mut self) -> String {
        match &self.session_id {
            Some(id) if is_valid_session_id(id) => id.clone(),
            _ => {
                let id = new_session_id();
                self.session_id = Some(id.clone());
                id
            }
        }
    }

    /// Apply `policy` to the stored blob and update it in place.
    pub fn check_rate_limit(
        &mut self,
        policy: &WindowPolicy,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let window = policy.window();
        let mut counter = self
            .rate_limit
            .and_then(|blob| {
                Utc.timestamp_millis_opt(blob.timestamp)
                    .single()
                    .map(|start| WindowCounter {
                        count: blob.count,
                        reset_time: start + window,
                    })
            })
            // expired on arrival, so the first hit opens a fresh window
            .unwrap_or(WindowCounter {
                count: 0,
                reset_time: now - chrono::Duration::milliseconds(1),
            });

        let decision = counter.hit(policy, now);
        self.rate_limit = Some(RateLimitBlob {
            count: counter.count,
            timestamp: (counter.reset_time - window).timestamp_millis(),
        });
        decision
    }

    /// Requests counted in the window still open at `now`. Zero once it
    /// has elapsed.
    pub fn requests_in_window(&self, policy: &WindowPolicy, now: DateTime<Utc>) -> u32 {
        let Some(blob) = self.rate_limit else {
            return 0;
        };
        match Utc.timestamp_millis_opt(blob.timestamp).single() {
            Some(start) if now <= start + policy.window() => blob.count,
            _ => 0,
        }
    }
}
