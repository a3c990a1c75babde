// src/cli/analyze.rs — `siteinsight analyze` and `siteinsight validate`

use chrono::{DateTime, Utc};

use crate::demo::local::{state_file_path, LocalState};
use crate::demo::InsightOutcome;
use crate::infra::config::{Config, WindowPolicy};
use crate::insight::url::validate_and_sanitize_url;
use crate::insight::{AnalysisRequest, AnalysisSource};

/// What the local gate decided before any store or model work.
#[derive(Debug, PartialEq)]
enum Admission {
    Proceed,
    InvalidUrl(String),
    RateLimited(Option<DateTime<Utc>>),
}

/// Bad URLs are rejected before the local window is charged.
fn admit(
    local: &mut LocalState,
    policy: &WindowPolicy,
    raw_url: &str,
    now: DateTime<Utc>,
) -> Admission {
    let validation = validate_and_sanitize_url(raw_url);
    if !validation.is_valid {
        return Admission::InvalidUrl(validation.error.unwrap_or_default());
    }
    let decision = local.check_rate_limit(policy, now);
    if decision.allowed {
        Admission::Proceed
    } else {
        Admission::RateLimited(decision.reset_time)
    }
}

/// One-shot analysis on behalf of the local demo session.
pub async fn run_analyze(config: &Config, request: AnalysisRequest) -> anyhow::Result<()> {
    crate::infra::paths::ensure_dirs().await?;

    let path = state_file_path();
    let mut local = LocalState::load_from(&path);
    let session_id = local.get_or_create_session_id();
    let admission = admit(
        &mut local,
        &config.rate_limit.demo,
        &request.website_url,
        Utc::now(),
    );
    local.save_to(&path)?;

    match admission {
        Admission::Proceed => {}
        Admission::InvalidUrl(error) => {
            println!("Invalid URL: {error}");
            return Ok(());
        }
        Admission::RateLimited(reset_time) => {
            let when = reset_time
                .map(|t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "later".into());
            println!("Too many requests. Try again after {when}.");
            return Ok(());
        }
    }

    let store = super::open_store()?;
    let insights = super::build_insights(config, store);

    match insights
        .request_insight(&session_id, &session_id, request)
        .await?
    {
        InsightOutcome::Delivered {
            analysis,
            remaining_analyses,
        } => {
            println!("{}", analysis.content);
            if !analysis.suggestions.is_empty() {
                println!();
                println!("Suggestions:");
                for (i, s) in analysis.suggestions.iter().enumerate() {
                    println!("  {}. {}", i + 1, s);
                }
            }
            println!();
            if analysis.source == AnalysisSource::Fallback {
                println!("(offline analysis; set {} for live results)", config.model.api_key_env);
            }
            println!("{remaining_analyses} free analyses left today.");
        }
        InsightOutcome::InvalidUrl { error } => {
            println!("Invalid URL: {error}");
        }
        InsightOutcome::QuotaExceeded { .. } => {
            println!("You've used all free analyses for today. Try again tomorrow.");
        }
        InsightOutcome::RateLimited { .. } => {
            println!("Please wait a moment before requesting another analysis.");
        }
    }
    Ok(())
}

/// Print the normalized URL, or why it was rejected.
pub fn run_validate(raw: &str) -> anyhow::Result<()> {
    let v = validate_and_sanitize_url(raw);
    if v.is_valid {
        println!("valid: {}", v.sanitized_url);
    } else {
        println!("invalid: {}", v.error.unwrap_or_default());
    }
    Ok(())
}
