// src/api/types.rs

use serde::{Deserialize, Serialize};

use crate::demo::session::SessionLimits;
use crate::demo::InsightOutcome;
use crate::insight::AnalysisRequest;

/// Request body for `POST /api/v1/sessions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub limits: SessionLimits,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateUrlRequest {
    pub url: String,
}

/// Request body for `POST /api/v1/analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub session_id: String,
    #[serde(flatten)]
    pub analysis: AnalysisRequest,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub outcome: InsightOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebsiteRequest {
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebsiteUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
}

/// Request body for creating a report. Suggestions are extracted from
/// `content` when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    pub content: String,
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
