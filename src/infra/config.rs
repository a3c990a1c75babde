// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::infra::errors::InsightError;
use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub quota: QuotaConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub suggestions: SuggestionsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Bearer token for the admin CRUD routes. Demo routes stay public.
    pub token: Option<String>,
    pub cleanup_interval_secs: u64,
    /// Rate-limit on the first `x-forwarded-for` hop rather than the peer
    /// address. Only enable behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8787,
            token: None,
            cleanup_interval_secs: 300,
            trust_forwarded_for: false,
        }
    }
}

/// Per-session analysis quota.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    pub max_analyses_per_session: u32,
    pub session_duration_hours: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            max_analyses_per_session: crate::demo::session::MAX_ANALYSES_PER_SESSION,
            session_duration_hours: crate::demo::session::SESSION_DURATION_HOURS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_analysis_policy")]
    pub analysis: WindowPolicy,
    #[serde(default = "default_demo_policy")]
    pub demo: WindowPolicy,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            analysis: default_analysis_policy(),
            demo: default_demo_policy(),
        }
    }
}

/// Fixed-window policy: at most `max_requests` per `window_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPolicy {
    pub max_requests: u32,
    pub window_ms: u64,
}

impl WindowPolicy {
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(i64::try_from(self.window_ms).unwrap_or(i64::MAX))
    }
}

fn default_analysis_policy() -> WindowPolicy {
    WindowPolicy {
        max_requests: 3,
        window_ms: 120_000,
    }
}

fn default_demo_policy() -> WindowPolicy {
    WindowPolicy {
        max_requests: 20,
        window_ms: 3_600_000,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Name of the environment variable holding the API key. The key itself
    /// never lives in this file.
    pub api_key_env: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            model: "gpt-4o-mini".into(),
            base_url: None,
            temperature: 0.7,
            max_tokens: 500,
            timeout_secs: 30,
            api_key_env: "OPENAI_API_KEY".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionsConfig {
    pub max_count: usize,
    pub min_len: usize,
    /// Upper bound on suggestion length in characters. A missing key keeps
    /// the 100-character cap; `0` removes it.
    pub max_len: Option<usize>,
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            max_count: crate::insight::suggestions::MAX_SUGGESTIONS,
            min_len: crate::insight::suggestions::MIN_SUGGESTION_LEN,
            max_len: crate::insight::suggestions::SERVER_MAX_SUGGESTION_LEN,
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(InsightError::Io)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| InsightError::Config(format!("{}: {e}", path.display())))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reasonable() {
        let c = Config::default();
        assert_eq!(c.server.port, 8787);
        assert!(c.server.token.is_none());
        assert_eq!(c.quota.max_analyses_per_session, 10);
        assert_eq!(c.quota.session_duration_hours, 24);
        assert_eq!(c.model.timeout_secs, 30);
        assert_eq!(c.model.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_rate_limit_defaults_are_independent() {
        let r = RateLimitConfig::default();
        assert_eq!(r.analysis.max_requests, 3);
        assert_eq!(r.analysis.window_ms, 120_000);
        assert_eq!(r.demo.max_requests, 20);
        assert_eq!(r.demo.window_ms, 3_600_000);
        assert_ne!(r.analysis, r.demo);
    }

    #[test]
    fn test_suggestions_defaults() {
        let s = SuggestionsConfig::default();
        assert_eq!(s.max_count, 4);
        assert_eq!(s.min_len, 10);
        assert_eq!(s.max_len, Some(100));
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.quota.max_analyses_per_session, 10);
        assert_eq!(config.rate_limit.analysis.max_requests, 3);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[server]
host = "0.0.0.0"
port = 9000
token = "secret"
cleanup_interval_secs = 60

[quota]
max_analyses_per_session = 5
session_duration_hours = 12

[rate_limit.analysis]
max_requests = 1
window_ms = 1000

[model]
provider = "openai"
model = "gpt-4.1-mini"
base_url = "http://localhost:11434/v1"
temperature = 0.2
max_tokens = 300
timeout_secs = 10
api_key_env = "MY_KEY"

[suggestions]
max_count = 6
min_len = 5
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.token.as_deref(), Some("secret"));
        assert_eq!(config.quota.max_analyses_per_session, 5);
        assert_eq!(config.rate_limit.analysis.window_ms, 1000);
        // untouched section keeps its own default
        assert_eq!(config.rate_limit.demo.max_requests, 20);
        assert_eq!(config.model.model, "gpt-4.1-mini");
        assert!((config.model.temperature - 0.2).abs() < 0.001);
        assert_eq!(config.suggestions.max_count, 6);
        assert_eq!(config.suggestions.max_len, Some(100));
        assert!(!config.server.trust_forwarded_for);
    }

    #[test]
    fn test_partial_sections_fill_in_defaults() {
        let config: Config = toml::from_str("[server]\nport = 9000\n").unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.cleanup_interval_secs, 300);

        let config: Config = toml::from_str("[quota]\nmax_analyses_per_session = 5\n").unwrap();
        assert_eq!(config.quota.max_analyses_per_session, 5);
        assert_eq!(config.quota.session_duration_hours, 24);

        let config: Config = toml::from_str("[model]\nmodel = \"gpt-4.1\"\n").unwrap();
        assert_eq!(config.model.model, "gpt-4.1");
        assert_eq!(config.model.timeout_secs, 30);
        assert_eq!(config.model.api_key_env, "OPENAI_API_KEY");

        let config: Config =
            toml::from_str("[rate_limit.demo]\nmax_requests = 5\nwindow_ms = 1000\n").unwrap();
        assert_eq!(config.rate_limit.demo.max_requests, 5);
        assert_eq!(config.rate_limit.analysis.max_requests, 3);
    }

    #[test]
    fn test_suggestion_cap_can_be_disabled() {
        let config: Config = toml::from_str("[suggestions]\nmin_len = 5\n").unwrap();
        assert_eq!(config.suggestions.max_len, Some(100));

        let config: Config = toml::from_str("[suggestions]\nmax_len = 0\n").unwrap();
        assert_eq!(config.suggestions.max_len, Some(0));
        assert_eq!(config.suggestions.max_count, 4);
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.server.port, config.server.port);
        assert_eq!(deserialized.suggestions.max_len, config.suggestions.max_len);
    }

    #[test]
    fn test_load_reports_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = \"not a number\"\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().starts_with("Configuration error:"));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }
}
