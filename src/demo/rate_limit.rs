// src/demo/rate_limit.rs — Fixed-window request counter keyed by client identifier
//
// Each identifier gets a counter and a reset time. The check-and-increment
// runs under the DashMap entry lock for that key, so concurrent callers with
// the same identifier can never both slip past the limit.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::infra::config::WindowPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_time: Option<DateTime<Utc>>,
}

impl RateLimitDecision {
    fn allow(reset_time: DateTime<Utc>) -> Self {
        Self {
            allowed: true,
            reset_time: Some(reset_time),
        }
    }

    fn deny(reset_time: DateTime<Utc>) -> Self {
        Self {
            allowed: false,
            reset_time: Some(reset_time),
        }
    }
}

/// One identifier's state within its current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowCounter {
    pub count: u32,
    pub reset_time: DateTime<Utc>,
}

impl WindowCounter {
    /// An empty window opening at `now`.
    pub fn open(now: DateTime<Utc>, policy: &WindowPolicy) -> Self {
        Self {
            count: 0,
            reset_time: now + policy.window(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.reset_time
    }

    /// Count one request against this window. A policy of zero denies
    /// everything.
    pub fn hit(&mut self, policy: &WindowPolicy, now: DateTime<Utc>) -> RateLimitDecision {
        if self.is_expired(now) {
            *self = Self::open(now, policy);
        }
        if self.count >= policy.max_requests {
            return RateLimitDecision::deny(self.reset_time);
        }
        self.count += 1;
        RateLimitDecision::allow(self.reset_time)
    }
}

/// In-process limiter. Construct once and share by reference (`Arc`).
/// State is lost on restart.
pub struct RateLimiter {
    name: String,
    policy: WindowPolicy,
    entries: DashMap<String, WindowCounter>,
}

impl RateLimiter {
    pub fn new(name: impl Into<String>, policy: WindowPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            entries: DashMap::new(),
        }
    }

    pub fn check_limit(&self, identifier: &str) -> RateLimitDecision {
        self.check_limit_at(identifier, Utc::now())
    }

    pub fn check_limit_at(&self, identifier: &str, now: DateTime<Utc>) -> RateLimitDecision {
        let decision = match self.entries.entry(identifier.to_string()) {
            Entry::Occupied(mut slot) => slot.get_mut().hit(&self.policy, now),
            Entry::Vacant(slot) => slot
                .insert(WindowCounter::open(now, &self.policy))
                .hit(&self.policy, now),
        };

        if !decision.allowed {
            tracing::debug!(limiter = %self.name, identifier, "Rate limit exceeded");
        }
        decision
    }

    /// Drop entries whose window has elapsed. Only bounds memory; expired
    /// entries are replaced on next access anyway.
    pub fn cleanup(&self) -> usize {
        self.cleanup_at(Utc::now())
    }

    pub fn cleanup_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, counter| !counter.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!(limiter = %self.name, removed, "Swept expired rate-limit entries");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn policy(max_requests: u32, window_ms: u64) -> WindowPolicy {
        WindowPolicy {
            max_requests,
            window_ms,
        }
    }

    #[test]
    fn test_allows_up_to_max_then_denies() {
        let limiter = RateLimiter::new("test", policy(3, 1000));
        let now = Utc::now();
        for _ in 0..3 {
            assert!(limiter.check_limit_at("client", now).allowed);
        }
        let denied = limiter.check_limit_at("client", now);
        assert!(!denied.allowed);
        assert!(denied.reset_time.unwrap() >= now);
    }

    #[test]
    fn test_window_elapses_and_resets() {
        let limiter = RateLimiter::new("test", policy(3, 1000));
        let t0 = Utc::now();
        for _ in 0..4 {
            limiter.check_limit_at("client", t0);
        }
        assert!(!limiter.check_limit_at("client", t0 + Duration::milliseconds(1000)).allowed);

        let later = t0 + Duration::milliseconds(1001);
        let decision = limiter.check_limit_at("client", later);
        assert!(decision.allowed);
        assert_eq!(decision.reset_time, Some(later + Duration::milliseconds(1000)));
        assert!(limiter.check_limit_at("client", later).allowed);
    }

    #[test]
    fn test_identifiers_are_independent() {
        let limiter = RateLimiter::new("test", policy(1, 60_000));
        let now = Utc::now();
        assert!(limiter.check_limit_at("a", now).allowed);
        assert!(!limiter.check_limit_at("a", now).allowed);
        assert!(limiter.check_limit_at("b", now).allowed);
    }

    #[test]
    fn test_cleanup_removes_only_expired() {
        let limiter = RateLimiter::new("test", policy(3, 1000));
        let t0 = Utc::now();
        limiter.check_limit_at("old", t0);
        limiter.check_limit_at("fresh", t0 + Duration::milliseconds(900));

        let removed = limiter.cleanup_at(t0 + Duration::milliseconds(1500));
        assert_eq!(removed, 1);
        assert_eq!(limiter.len(), 1);
        assert!(!limiter.is_empty());
    }

    #[test]
    fn test_counter_hit_restarts_expired_window() {
        let p = policy(2, 1000);
        let t0 = Utc::now();
        let mut counter = WindowCounter::open(t0, &p);
        assert!(counter.hit(&p, t0).allowed);
        assert!(counter.hit(&p, t0).allowed);
        assert!(!counter.hit(&p, t0).allowed);
        assert_eq!(counter.count, 2);

        let t1 = t0 + Duration::seconds(2);
        assert!(counter.hit(&p, t1).allowed);
        assert_eq!(counter.count, 1);
    }

    #[test]
    fn test_zero_policy_denies_every_request() {
        let limiter = RateLimiter::new("test", policy(0, 1000));
        let t0 = Utc::now();
        assert!(!limiter.check_limit_at("client", t0).allowed);
        assert!(!limiter.check_limit_at("client", t0).allowed);
        // a fresh window changes nothing
        assert!(!limiter.check_limit_at("client", t0 + Duration::seconds(5)).allowed);

        let mut counter = WindowCounter::open(t0, &policy(0, 1000));
        assert!(!counter.hit(&policy(0, 1000), t0 + Duration::seconds(5)).allowed);
        assert_eq!(counter.count, 0);
    }

    #[test]
    fn test_decision_serialization() {
        let d = RateLimitDecision {
            allowed: true,
            reset_time: None,
        };
        assert_eq!(serde_json::to_string(&d).unwrap(), r#"{"allowed":true}"#);
    }
}
