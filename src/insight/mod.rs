// src/insight/mod.rs — Website analysis: URL validation, prompting, suggestion extraction

pub mod analyzer;
pub mod prompt;
pub mod suggestions;
pub mod url;

use serde::{Deserialize, Serialize};

pub use analyzer::{Analyzer, AnalyzerConfig};

/// What the visitor asked about which page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub website_url: String,
    #[serde(default)]
    pub current_page: String,
    #[serde(default)]
    pub product_type: String,
    pub user_question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub content: String,
    pub suggestions: Vec<String>,
    pub source: AnalysisSource,
}

/// Whether the content came from the model or the canned fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisSource {
    Model,
    Fallback,
}
