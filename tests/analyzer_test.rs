// tests/analyzer_test.rs — Integration test: analyzer with mock providers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use siteinsight::infra::errors::InsightError;
use siteinsight::insight::suggestions::SuggestionLimits;
use siteinsight::insight::{AnalysisRequest, AnalysisSource, Analyzer, AnalyzerConfig};
use siteinsight::provider::*;

/// Returns canned content and remembers the last request it saw.
struct MockProvider {
    content: String,
    last_request: Mutex<Option<ChatRequest>>,
}

impl MockProvider {
    fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
            last_request: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Provider"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, InsightError> {
        *self.last_request.lock().unwrap() = Some(request);
        Ok(ChatResponse {
            content: self.content.clone(),
            usage: TokenUsage {
                input_tokens: 120,
                output_tokens: 80,
            },
            stop_reason: StopReason::EndTurn,
        })
    }
}

/// Always fails, counting attempts.
struct FailingProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl ModelProvider for FailingProvider {
    fn id(&self) -> &str {
        "failing"
    }

    fn name(&self) -> &str {
        "Failing Provider"
    }

    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, InsightError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(InsightError::Provider {
            provider: "failing".into(),
            message: "HTTP 401: invalid api key".into(),
            retriable: true,
        })
    }
}

/// Never answers.
struct HangingProvider;

#[async_trait]
impl ModelProvider for HangingProvider {
    fn id(&self) -> &str {
        "hanging"
    }

    fn name(&self) -> &str {
        "Hanging Provider"
    }

    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, InsightError> {
        std::future::pending().await
    }
}

fn request() -> AnalysisRequest {
    AnalysisRequest {
        website_url: "https://shop.example.com".into(),
        current_page: "Product detail".into(),
        product_type: "ecommerce".into(),
        user_question: "Why do visitors leave without buying?".into(),
    }
}

fn config() -> AnalyzerConfig {
    AnalyzerConfig {
        timeout: Duration::from_millis(200),
        ..AnalyzerConfig::default()
    }
}

#[tokio::test]
async fn test_model_answer_is_returned_with_suggestions() {
    let content = "Here is what I noticed:\n\
        - Move reviews above the fold near the price\n\
        - Show shipping costs before checkout\n\
        * Add a sticky add-to-cart button on mobile\n\
        1. Short\n\
        2. Offer a guest checkout option for first-time buyers";
    let provider = Arc::new(MockProvider::new(content));
    let analyzer = Analyzer::new(Some(provider.clone()), config());

    let result = analyzer.analyze(&request()).await;
    assert_eq!(result.source, AnalysisSource::Model);
    assert_eq!(result.content, content);
    assert_eq!(
        result.suggestions,
        vec![
            "Move reviews above the fold near the price",
            "Show shipping costs before checkout",
            "Add a sticky add-to-cart button on mobile",
            "Offer a guest checkout option for first-time buyers",
        ]
    );

    let sent = provider.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(sent.model, "gpt-4o-mini");
    assert_eq!(sent.max_tokens, Some(500));
    assert_eq!(sent.messages.len(), 1);
    assert!(sent.messages[0].content.contains("Why do visitors leave"));
    assert!(sent.system.unwrap().contains("https://shop.example.com"));
}

#[tokio::test]
async fn test_provider_failure_falls_back_without_retry() {
    let provider = Arc::new(FailingProvider {
        calls: AtomicUsize::new(0),
    });
    let analyzer = Analyzer::new(Some(provider.clone()), config());

    let result = analyzer.analyze(&request()).await;
    assert_eq!(result.source, AnalysisSource::Fallback);
    assert!(!result.content.is_empty());
    assert!(!result.suggestions.is_empty());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_hanging_provider_times_out_to_fallback() {
    let analyzer = Analyzer::new(Some(Arc::new(HangingProvider)), config());
    let result = tokio::time::timeout(Duration::from_secs(5), analyzer.analyze(&request()))
        .await
        .expect("analyzer must give up on its own");
    assert_eq!(result.source, AnalysisSource::Fallback);
}

#[tokio::test]
async fn test_empty_completion_falls_back() {
    let analyzer = Analyzer::new(Some(Arc::new(MockProvider::new("   "))), config());
    let result = analyzer.analyze(&request()).await;
    assert_eq!(result.source, AnalysisSource::Fallback);
}

#[tokio::test]
async fn test_fallback_is_deterministic() {
    let analyzer = Analyzer::new(None, config());
    let a = analyzer.analyze(&request()).await;
    let b = analyzer.analyze(&request()).await;
    assert_eq!(a.content, b.content);
    assert_eq!(a.suggestions, b.suggestions);
}

#[tokio::test]
async fn test_client_limits_keep_long_suggestions() {
    let long = "x".repeat(150);
    let content = format!("- {long}\n- A normal sized suggestion here");
    let analyzer = Analyzer::new(
        Some(Arc::new(MockProvider::new(&content))),
        AnalyzerConfig {
            limits: SuggestionLimits::CLIENT,
            ..config()
        },
    );
    let result = analyzer.analyze(&request()).await;
    assert_eq!(result.suggestions.len(), 2);
    assert_eq!(result.suggestions[0], long);
}
