// src/provider/resolver.rs — Build the configured provider from server-side credentials
//
// The API key comes from the environment only. It is never read from, or
// written to, a file a browser or user profile could reach.

use std::sync::Arc;

use super::openai::OpenAIProvider;
use super::ModelProvider;
use crate::infra::config::ModelConfig;

/// Resolve the provider for `config`, or `None` when no key is available
/// (the analyzer then serves canned responses only).
pub fn resolve_provider(config: &ModelConfig) -> Option<Arc<dyn ModelProvider>> {
    let key = std::env::var(&config.api_key_env).ok();
    provider_from_key(config, key)
}

fn provider_from_key(config: &ModelConfig, key: Option<String>) -> Option<Arc<dyn ModelProvider>> {
    let key = key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty());
    let Some(key) = key else {
        tracing::info!(
            "{} not set; analysis will use canned responses",
            config.api_key_env
        );
        return None;
    };

    match config.provider.as_str() {
        "openai" => {
            let provider = match &config.base_url {
                Some(url) => OpenAIProvider::with_base_url(key, url.clone()),
                None => OpenAIProvider::new(key),
            };
            Some(Arc::new(provider))
        }
        other => {
            tracing::warn!("Unknown provider '{}'; analysis will use canned responses", other);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_key_no_provider() {
        assert!(provider_from_key(&ModelConfig::default(), None).is_none());
        assert!(provider_from_key(&ModelConfig::default(), Some("  ".into())).is_none());
    }

    #[test]
    fn test_openai_with_key() {
        let p = provider_from_key(&ModelConfig::default(), Some("sk-test".into())).unwrap();
        assert_eq!(p.id(), "openai");
    }

    #[test]
    fn test_unknown_provider() {
        let config = ModelConfig {
            provider: "bogus".into(),
            ..ModelConfig::default()
        };
        assert!(provider_from_key(&config, Some("sk-test".into())).is_none());
    }
}
