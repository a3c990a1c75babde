// src/store/mod.rs — Data-access layer (SQLite)

pub mod schema;
#[allow(clippy::module_inception)]
pub mod store;
pub mod store_server;

use rusqlite::Connection;
use std::path::Path;

pub use store_server::{spawn_store_server, StoreHandle};

/// Open (or create) the database at `path` and apply migrations.
pub fn open(path: &Path) -> anyhow::Result<store::Store> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    // Enable WAL mode for concurrent readers
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;

    schema::run_migrations(&conn)?;
    Ok(store::Store::new(conn))
}

/// Create an in-memory database (for testing).
pub fn in_memory() -> anyhow::Result<store::Store> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    schema::run_migrations(&conn)?;
    Ok(store::Store::new(conn))
}
