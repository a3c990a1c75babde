// src/infra/paths.rs — XDG-compliant path management
//
// All paths respect the SITEINSIGHT_HOME environment variable for isolation.
// When SITEINSIGHT_HOME is set, config, state and data live under that directory.
// When unset, config uses ~/.siteinsight/ and data uses XDG_DATA_HOME/siteinsight.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Returns the SITEINSIGHT_HOME override, if set.
fn siteinsight_home() -> Option<PathBuf> {
    std::env::var_os("SITEINSIGHT_HOME").map(PathBuf::from)
}

/// Home directory, or the current directory when none can be determined.
pub fn dirs_home() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration directory: $SITEINSIGHT_HOME/ or ~/.siteinsight/
pub fn config_dir() -> PathBuf {
    if let Some(home) = siteinsight_home() {
        return home;
    }
    dirs_home().join(".siteinsight")
}

/// Data directory: $SITEINSIGHT_HOME/data/ or ~/.local/share/siteinsight/
pub fn data_dir() -> PathBuf {
    if let Some(home) = siteinsight_home() {
        return home.join("data");
    }
    match ProjectDirs::from("", "", "siteinsight") {
        Some(dirs) => dirs.data_local_dir().to_path_buf(),
        None => config_dir().join("data"),
    }
}

/// State directory: ~/.siteinsight/state/ (demo.json)
pub fn state_dir() -> PathBuf {
    config_dir().join("state")
}

/// Database path
pub fn db_path() -> PathBuf {
    data_dir().join("siteinsight.db")
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Ensure all required directories exist
pub async fn ensure_dirs() -> anyhow::Result<()> {
    for dir in [config_dir(), state_dir(), data_dir()] {
        tokio::fs::create_dir_all(&dir).await?;
    }
    Ok(())
}
