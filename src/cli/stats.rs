// src/cli/stats.rs — Local demo session status

use chrono::Utc;

use crate::demo::local::{state_file_path, LocalState};
use crate::demo::session::SessionTracker;
use crate::infra::config::Config;
use crate::infra::paths;

pub async fn show_stats(config: &Config) -> anyhow::Result<()> {
    println!("siteinsight v{}", env!("CARGO_PKG_VERSION"));
    println!();

    let config_path = paths::config_file_path();
    if config_path.exists() {
        println!("  Config:     {} (loaded)", config_path.display());
    } else {
        println!("  Config:     (using defaults)");
    }

    let local = LocalState::load_from(&state_file_path());
    let Some(ref session_id) = local.session_id else {
        println!("  Session:    (none yet; run `siteinsight analyze <url>`)");
        return Ok(());
    };
    println!("  Session:    {session_id}");

    if !paths::db_path().exists() {
        println!("  Database:   (not initialized)");
        return Ok(());
    }

    let store = super::open_store()?;
    let tracker = SessionTracker::new(store, &config.quota);
    let limits = tracker.check_session_limits(&session_id).await;
    let stats = tracker.get_demo_session_stats(&session_id).await;

    println!(
        "  Analyses:   {} used, {} of {} remaining{}",
        stats.total_analyses,
        limits.remaining_analyses,
        tracker.max_per_session(),
        if limits.can_proceed { "" } else { " (limit reached)" },
    );
    println!("  Resets in:  {}", format_duration(stats.time_remaining_secs));
    if let Some(first) = stats.created_at {
        println!("  First use:  {}", first.to_rfc3339());
    }
    if local.rate_limit.is_some() {
        let policy = &config.rate_limit.demo;
        println!(
            "  Requests:   {} of {} in current window",
            local.requests_in_window(policy, Utc::now()),
            policy.max_requests
        );
    }
    Ok(())
}

fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    let (h, m) = (secs / 3600, (secs % 3600) / 60);
    if h > 0 {
        format!("{h}h {m}m")
    } else {
        format!("{m}m {}s", secs % 60)
    }
}
