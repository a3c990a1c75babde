// src/infra/errors.rs — Error types for siteinsight

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightError {
    // Provider errors (all of them trigger the canned fallback)
    #[error("Provider '{provider}' error: {message}")]
    Provider {
        provider: String,
        message: String,
        retriable: bool,
    },

    #[error("Rate limited by '{provider}', retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    #[error("Model call timed out after {secs}s")]
    Timeout { secs: u64 },

    // User errors
    #[error("No model provider configured. Set OPENAI_API_KEY to enable live analysis.")]
    NoProvider,

    // Infra
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl InsightError {
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            InsightError::Provider {
                retriable: true,
                ..
            } | InsightError::RateLimited { .. }
                | InsightError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_classification() {
        let transient = InsightError::Provider {
            provider: "openai".into(),
            message: "connection reset".into(),
            retriable: true,
        };
        assert!(transient.is_retriable());
        assert!(InsightError::Timeout { secs: 30 }.is_retriable());
        assert!(!InsightError::NoProvider.is_retriable());
        assert!(!InsightError::Config("bad".into()).is_retriable());
    }

    #[test]
    fn test_display_messages() {
        let e = InsightError::RateLimited {
            provider: "openai".into(),
            retry_after_ms: 5000,
        };
        assert_eq!(e.to_string(), "Rate limited by 'openai', retry after 5000ms");
        assert_eq!(
            InsightError::Timeout { secs: 30 }.to_string(),
            "Model call timed out after 30s"
        );
    }
}
