// src/insight/analyzer.rs — Ask the model about a page, or fall back to canned advice
//
// One attempt per request, bounded by a timeout. Any failure goes straight to
// the deterministic fallback; there are no retries.

use std::sync::Arc;
use std::time::Duration;

use super::prompt;
use super::suggestions::{extract_suggestions, SuggestionLimits};
use super::{AnalysisRequest, AnalysisResult, AnalysisSource};
use crate::infra::config::Config;
use crate::infra::errors::InsightError;
use crate::provider::{ChatRequest, Message, ModelProvider};

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub limits: SuggestionLimits,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for AnalyzerConfig {
    fn from(config: &Config) -> Self {
        Self {
            model: config.model.model.clone(),
            temperature: config.model.temperature,
            max_tokens: config.model.max_tokens,
            timeout: Duration::from_secs(config.model.timeout_secs),
            limits: SuggestionLimits::from(&config.suggestions),
        }
    }
}

pub struct Analyzer {
    provider: Option<Arc<dyn ModelProvider>>,
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(provider: Option<Arc<dyn ModelProvider>>, config: AnalyzerConfig) -> Self {
        Self { provider, config }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Produce content and suggestions for `req`. Never fails.
    pub async fn analyze(&self, req: &AnalysisRequest) -> AnalysisResult {
        match self.ask_model(req).await {
            Ok(content) => {
                let suggestions = extract_suggestions(&content, &self.config.limits);
                AnalysisResult {
                    content,
                    suggestions,
                    source: AnalysisSource::Model,
                }
            }
            Err(e) => {
                if let (Some(provider), false) =
                    (&self.provider, matches!(e, InsightError::NoProvider))
                {
                    tracing::warn!(
                        "{} call failed, using fallback analysis: {}",
                        provider.name(),
                        e
                    );
                }
                self.fallback(req)
            }
        }
    }

    /// The canned path on its own.
    pub fn fallback(&self, req: &AnalysisRequest) -> AnalysisResult {
        let content = prompt::fallback_response(&req.current_page, &req.product_type);
        let suggestions = extract_suggestions(&content, &self.config.limits);
        AnalysisResult {
            content,
            suggestions,
            source: AnalysisSource::Fallback,
        }
    }

    async fn ask_model(&self, req: &AnalysisRequest) -> Result<String, InsightError> {
        let provider = self.provider.as_ref().ok_or(InsightError::NoProvider)?;

        let system = prompt::system_prompt(req).map_err(|e| InsightError::Other(e.into()))?;
        let user = prompt::user_prompt(req).map_err(|e| InsightError::Other(e.into()))?;

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![Message::user(user)],
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
            system: Some(system),
        };

        let response = tokio::time::timeout(self.config.timeout, provider.chat(request))
            .await
            .map_err(|_| InsightError::Timeout {
                secs: self.config.timeout.as_secs(),
            })??;

        tracing::debug!(
            provider = provider.id(),
            tokens = response.usage.total(),
            "Model analysis complete"
        );
        if response.is_truncated() {
            tracing::debug!("Completion hit max_tokens; last suggestion may be cut short");
        }

        if response.content.trim().is_empty() {
            return Err(InsightError::Provider {
                provider: provider.id().to_string(),
                message: "empty completion".into(),
                retriable: false,
            });
        }
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(page: &str) -> AnalysisRequest {
        AnalysisRequest {
            website_url: "https://example.com".into(),
            current_page: page.into(),
            product_type: "saas".into(),
            user_question: "What should I change?".into(),
        }
    }

    #[tokio::test]
    async fn test_no_provider_uses_fallback() {
        let analyzer = Analyzer::new(None, AnalyzerConfig::default());
        assert!(!analyzer.has_provider());
        let result = analyzer.analyze(&request("Home")).await;
        assert_eq!(result.source, AnalysisSource::Fallback);
        assert_eq!(result.suggestions.len(), 4);
        assert!(result.content.contains("For SaaS products"));
    }

    #[test]
    fn test_fallback_suggestions_come_from_template() {
        let analyzer = Analyzer::new(None, AnalyzerConfig::default());
        let result = analyzer.fallback(&request("pricing"));
        assert_eq!(
            result.suggestions[0],
            "Highlight one recommended plan so visitors are not left comparing every tier"
        );
    }

    #[test]
    fn test_config_from_defaults() {
        let c = AnalyzerConfig::default();
        assert_eq!(c.timeout, Duration::from_secs(30));
        assert_eq!(c.max_tokens, 500);
        assert_eq!(c.limits, SuggestionLimits::SERVER);
    }
}
