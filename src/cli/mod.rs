// src/cli/mod.rs — CLI definition (clap derive)

pub mod analyze;
pub mod serve;
pub mod stats;

use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::demo::rate_limit::RateLimiter;
use crate::demo::session::SessionTracker;
use crate::demo::InsightService;
use crate::infra::config::Config;
use crate::insight::{Analyzer, AnalyzerConfig};
use crate::provider::resolver;
use crate::store::{self, StoreHandle};

#[derive(Parser)]
#[command(
    name = "siteinsight",
    about = "Website optimization insights with a rate-limited demo flow",
    version
)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Port to listen on (overrides [server].port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Analyze a website once, using the local demo session
    Analyze {
        /// Website URL
        url: String,
        /// Page currently being viewed (e.g. "/pricing")
        #[arg(long, default_value = "")]
        page: String,
        /// Product type: saas, ecommerce, agency, ...
        #[arg(long, default_value = "")]
        product_type: String,
        /// Question to ask about the site
        #[arg(short, long, default_value = "How can I improve conversions on this page?")]
        question: String,
    },
    /// Validate and normalize a URL
    Validate {
        url: String,
    },
    /// Show the local demo session's quota and usage
    Stats,
}

/// Open the on-disk database and hand it to a store task.
pub fn open_store() -> anyhow::Result<StoreHandle> {
    let db = store::open(&crate::infra::paths::db_path())?;
    let (handle, _task) = store::spawn_store_server(db);
    Ok(handle)
}

/// Wire tracker, analysis limiter and analyzer from `config`.
pub fn build_insights(config: &Config, store: StoreHandle) -> InsightService {
    let provider = resolver::resolve_provider(&config.model);
    let analyzer = Analyzer::new(provider, AnalyzerConfig::from(config));
    InsightService::new(
        SessionTracker::new(store.clone(), &config.quota),
        Arc::new(RateLimiter::new("analysis", config.rate_limit.analysis)),
        Arc::new(analyzer),
        store,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from([
            "siteinsight",
            "analyze",
            "example.com",
            "--page",
            "/pricing",
            "--product-type",
            "saas",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze {
                url,
                page,
                product_type,
                question,
            } => {
                assert_eq!(url, "example.com");
                assert_eq!(page, "/pricing");
                assert_eq!(product_type, "saas");
                assert!(!question.is_empty());
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_parse_global_config() {
        let cli = Cli::try_parse_from(["siteinsight", "serve", "--port", "9000", "--config", "x.toml"])
            .unwrap();
        assert_eq!(cli.config.as_deref(), Some("x.toml"));
        assert!(matches!(cli.command, Commands::Serve { port: Some(9000) }));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["siteinsight"]).is_err());
    }
}
