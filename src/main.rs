// src/main.rs — siteinsight entry point

use clap::Parser;

use siteinsight::cli::{Cli, Commands};
use siteinsight::infra::config::Config;
use siteinsight::infra::logger;
use siteinsight::insight::AnalysisRequest;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // The server logs requests by default; one-shot commands stay quiet.
    let level = match cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    logger::init_logging(level);

    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Load config (falls back to defaults if no config.toml)
    let config = match cli.config {
        Some(ref path) => Config::load_from(std::path::Path::new(path))?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Serve { port } => siteinsight::cli::serve::run_serve(config, port).await,
        Commands::Analyze {
            url,
            page,
            product_type,
            question,
        } => {
            let request = AnalysisRequest {
                website_url: url,
                current_page: page,
                product_type,
                user_question: question,
            };
            siteinsight::cli::analyze::run_analyze(&config, request).await
        }
        Commands::Validate { url } => siteinsight::cli::analyze::run_validate(&url),
        Commands::Stats => siteinsight::cli::stats::show_stats(&config).await,
    }
}
