// src/store/store.rs — SQLite operations

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

/// Fixed-width UTC timestamp so TEXT comparison matches time order.
pub fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRow {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub analysis_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteRow {
    pub id: String,
    pub url: String,
    pub name: Option<String>,
    pub product_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRow {
    pub id: String,
    pub session_id: String,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub id: String,
    pub website_id: String,
    pub content: String,
    pub suggestions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

fn session_row(row: &Row) -> rusqlite::Result<SessionRow> {
    Ok(SessionRow {
        id: row.get(0)?,
        created_at: parse_ts(1, row.get(1)?)?,
        analysis_count: row.get(2)?,
    })
}

fn website_row(row: &Row) -> rusqlite::Result<WebsiteRow> {
    Ok(WebsiteRow {
        id: row.get(0)?,
        url: row.get(1)?,
        name: row.get(2)?,
        product_type: row.get(3)?,
        created_at: parse_ts(4, row.get(4)?)?,
        updated_at: parse_ts(5, row.get(5)?)?,
    })
}

fn message_row(row: &Row) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        session_id: row.get(1)?,
        role: row.get(2)?,
        content: row.get(3)?,
        created_at: parse_ts(4, row.get(4)?)?,
    })
}

fn report_row(row: &Row) -> rusqlite::Result<ReportRow> {
    let raw: String = row.get(3)?;
    let suggestions = serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(ReportRow {
        id: row.get(0)?,
        website_id: row.get(1)?,
        content: row.get(2)?,
        suggestions,
        created_at: parse_ts(4, row.get(4)?)?,
    })
}

const SESSION_COLS: &str = "id, created_at, analysis_count";
const WEBSITE_COLS: &str = "id, url, name, product_type, created_at, updated_at";
const MESSAGE_COLS: &str = "id, session_id, role, content, created_at";
const REPORT_COLS: &str = "id, website_id, content, suggestions, created_at";

/// Low-level SQLite operations for all record types.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    // -- Demo sessions --

    /// Insert the session if it does not exist yet, then return it.
    pub fn ensure_session(&self, id: &str) -> anyhow::Result<SessionRow> {
        self.conn.execute(
            "INSERT OR IGNORE INTO demo_sessions (id, created_at) VALUES (?1, ?2)",
            params![id, ts(Utc::now())],
        )?;
        let row = self.conn.query_row(
            &format!("SELECT {SESSION_COLS} FROM demo_sessions WHERE id = ?1"),
            params![id],
            session_row,
        )?;
        Ok(row)
    }

    pub fn get_session(&self, id: &str) -> anyhow::Result<Option<SessionRow>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {SESSION_COLS} FROM demo_sessions WHERE id = ?1"),
                params![id],
                session_row,
            )
            .optional()?;
        Ok(row)
    }

    // -- Demo analyses --

    /// Record one completed analysis and bump the session counter atomically.
    pub fn record_analysis(
        &self,
        id: &str,
        session_id: &str,
        website_url: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let at = ts(at);
        tx.execute(
            "INSERT OR IGNORE INTO demo_sessions (id, created_at) VALUES (?1, ?2)",
            params![session_id, at],
        )?;
        tx.execute(
            "INSERT INTO demo_analyses (id, session_id, website_url, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![id, session_id, website_url, at],
        )?;
        tx.execute(
            "UPDATE demo_sessions SET analysis_count = analysis_count + 1 WHERE id = ?1",
            params![session_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn count_analyses_since(
        &self,
        session_id: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<u32> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM demo_analyses WHERE session_id = ?1 AND created_at >= ?2",
            params![session_id, ts(since)],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    pub fn earliest_analysis_since(
        &self,
        session_id: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = self.conn.query_row(
            "SELECT MIN(created_at) FROM demo_analyses WHERE session_id = ?1 AND created_at >= ?2",
            params![session_id, ts(since)],
            |r| r.get(0),
        )?;
        Ok(raw.map(|s| parse_ts(0, s)).transpose()?)
    }

    /// Authoritative quota decision: fewer than `max` analyses since `since`.
    pub fn check_session_quota(
        &self,
        session_id: &str,
        max: u32,
        since: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let allowed = self.conn.query_row(
            "SELECT COUNT(*) < ?3 FROM demo_analyses WHERE session_id = ?1 AND created_at >= ?2",
            params![session_id, ts(since), max],
            |r| r.get(0),
        )?;
        Ok(allowed)
    }

    // -- Websites --

    pub fn insert_website(
        &self,
        id: &str,
        url: &str,
        name: Option<&str>,
        product_type: Option<&str>,
    ) -> anyhow::Result<WebsiteRow> {
        let now = ts(Utc::now());
        self.conn.execute(
            "INSERT INTO websites (id, url, name, product_type, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![id, url, name, product_type, now],
        )?;
        self.get_website(id)?
            .ok_or_else(|| anyhow::anyhow!("website '{id}' vanished after insert"))
    }

    pub fn get_website(&self, id: &str) -> anyhow::Result<Option<WebsiteRow>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {WEBSITE_COLS} FROM websites WHERE id = ?1"),
                params![id],
                website_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Update name and product type. `None` leaves a field unchanged.
    pub fn update_website(
        &self,
        id: &str,
        name: Option<&str>,
        product_type: Option<&str>,
    ) -> anyhow::Result<Option<WebsiteRow>> {
        let changed = self.conn.execute(
            "UPDATE websites SET name = COALESCE(?1, name),
             product_type = COALESCE(?2, product_type), updated_at = ?3
             WHERE id = ?4",
            params![name, product_type, ts(Utc::now()), id],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_website(id)
    }

    pub fn delete_website(&self, id: &str) -> anyhow::Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM websites WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    pub fn list_websites(&self) -> anyhow::Result<Vec<WebsiteRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WEBSITE_COLS} FROM websites ORDER BY created_at, rowid"
        ))?;
        let rows = stmt.query_map([], website_row)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        id: &str,
        session_id: &str,
        role: &str,
        content: &str,
    ) -> anyhow::Result<()> {
        let now = ts(Utc::now());
        self.conn.execute(
            "INSERT OR IGNORE INTO demo_sessions (id, created_at) VALUES (?1, ?2)",
            params![session_id, now],
        )?;
        self.conn.execute(
            "INSERT INTO messages (id, session_id, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, session_id, role, content, now],
        )?;
        Ok(())
    }

    pub fn list_messages(&self, session_id: &str) -> anyhow::Result<Vec<MessageRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MESSAGE_COLS} FROM messages WHERE session_id = ?1 ORDER BY created_at, rowid"
        ))?;
        let rows = stmt.query_map(params![session_id], message_row)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    // -- Reports --

    pub fn insert_report(
        &self,
        id: &str,
        website_id: &str,
        content: &str,
        suggestions: &[String],
    ) -> anyhow::Result<ReportRow> {
        let suggestions_json = serde_json::to_string(suggestions)?;
        self.conn.execute(
            "INSERT INTO reports (id, website_id, content, suggestions, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, website_id, content, suggestions_json, ts(Utc::now())],
        )?;
        self.get_report(id)?
            .ok_or_else(|| anyhow::anyhow!("report '{id}' vanished after insert"))
    }

    pub fn get_report(&self, id: &str) -> anyhow::Result<Option<ReportRow>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {REPORT_COLS} FROM reports WHERE id = ?1"),
                params![id],
                report_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn delete_report(&self, id: &str) -> anyhow::Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM reports WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    pub fn list_reports(&self, website_id: &str) -> anyhow::Result<Vec<ReportRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {REPORT_COLS} FROM reports WHERE website_id = ?1 ORDER BY created_at, rowid"
        ))?;
        let rows = stmt.query_map(params![website_id], report_row)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }
}
