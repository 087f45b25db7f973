//! Logging service - structured event logging to DuckDB
//!
//! Stores query, mutation and command events in logs.duckdb. Entries carry
//! endpoint or tag names, HTTP status codes and error messages only. No
//! user data (balances, amounts, names, descriptions) is ever logged.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Result};
use duckdb::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::ApiError;
use crate::log_migrations::LOG_MIGRATIONS;

/// Counter for generating unique IDs within the same millisecond
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Timestamp in the low 48 bits, a rolling counter in the high 16
fn generate_id() -> u64 {
    let timestamp = now_ms() as u64;
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed) & 0xFFFF;
    (timestamp << 16) | counter
}

/// Current unix timestamp in milliseconds
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

fn detect_platform() -> &'static str {
    if cfg!(target_os = "macos") {
        "macos"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "linux") {
        "linux"
    } else {
        "unknown"
    }
}

/// Who is writing the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPoint {
    Cli,
    Library,
}

impl EntryPoint {
    fn as_str(&self) -> &'static str {
        match self {
            EntryPoint::Cli => "cli",
            EntryPoint::Library => "library",
        }
    }
}

/// Event names written by the query and mutation layers
pub mod events {
    pub const QUERY_FULFILLED: &str = "query_fulfilled";
    pub const QUERY_FAILED: &str = "query_failed";
    pub const QUERY_DISCARDED: &str = "query_discarded";
    pub const CACHE_PATCHED: &str = "cache_patched";
    pub const TAG_INVALIDATED: &str = "tag_invalidated";
    pub const MUTATION_FULFILLED: &str = "mutation_fulfilled";
    pub const MUTATION_FAILED: &str = "mutation_failed";
    pub const COMMAND_EXECUTED: &str = "command_executed";
}

/// A log event to be recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub event: String,
    /// Endpoint, cache key or tag the event is about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl LogEvent {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            resource: None,
            command: None,
            status_code: None,
            error_message: None,
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Record status code and message of an API failure
    pub fn with_api_error(mut self, error: &ApiError) -> Self {
        self.status_code = error.status_code();
        self.error_message = Some(error.to_string());
        self
    }
}

/// A log entry as stored in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub timestamp: i64,
    pub session_id: String,
    pub entry_point: String,
    pub app_version: String,
    pub platform: String,
    pub event: String,
    pub resource: Option<String>,
    pub command: Option<String>,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
}

/// Counts for `vl logs stats`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogSummary {
    pub total: u64,
    pub errors: u64,
    pub sessions: u64,
    /// `(event, count)`, most frequent first
    pub by_event: Vec<(String, u64)>,
}

const ENTRY_COLUMNS: &str = "id, timestamp, session_id, entry_point, app_version, platform, \
                             event, resource, command, status_code, error_message";

fn map_entry(row: &duckdb::Row<'_>) -> duckdb::Result<LogEntry> {
    let status: Option<i32> = row.get(9)?;
    Ok(LogEntry {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        session_id: row.get(2)?,
        entry_point: row.get(3)?,
        app_version: row.get(4)?,
        platform: row.get(5)?,
        event: row.get(6)?,
        resource: row.get(7)?,
        command: row.get(8)?,
        status_code: status.and_then(|s| u16::try_from(s).ok()),
        error_message: row.get(10)?,
    })
}

/// Service for structured event logging
///
/// Every instance gets its own session id, so entries from one process run
/// can be grouped.
pub struct LoggingService {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    session_id: String,
    entry_point: EntryPoint,
    app_version: String,
    platform: &'static str,
}

impl LoggingService {
    /// Open or create logs.duckdb in `data_dir` and run pending migrations
    pub fn new(
        data_dir: &Path,
        entry_point: EntryPoint,
        app_version: impl Into<String>,
    ) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join("logs.duckdb");
        let conn = Connection::open(&db_path)?;

        let service = Self {
            conn: Mutex::new(conn),
            db_path,
            session_id: Uuid::new_v4().to_string(),
            entry_point,
            app_version: app_version.into(),
            platform: detect_platform(),
        };

        service.run_migrations()?;

        Ok(service)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow!("Log database lock poisoned: {}", e))
    }

    /// Apply embedded migrations not yet listed in `sys_migrations`
    ///
    /// `000_migrations.sql` creates the bookkeeping table itself, so it is
    /// applied first on a fresh database.
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        let bootstrapped = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM information_schema.tables WHERE table_name = 'sys_migrations'",
                [],
                |row| row.get::<_, bool>(0),
            )
            .unwrap_or(false);

        let applied: Vec<String> = if bootstrapped {
            let mut stmt = conn.prepare("SELECT migration_name FROM sys_migrations")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<duckdb::Result<Vec<String>>>()?;
            names
        } else {
            Vec::new()
        };

        let pending = LOG_MIGRATIONS
            .iter()
            .filter(|(name, _)| !applied.iter().any(|a| a == name));
        for (name, sql) in pending {
            conn.execute_batch(sql)?;
            conn.execute("INSERT INTO sys_migrations (migration_name) VALUES (?)", [name])?;
        }

        Ok(())
    }

    /// Record an event
    pub fn log(&self, event: LogEvent) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            &format!(
                "INSERT INTO sys_logs ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                ENTRY_COLUMNS
            ),
            duckdb::params![
                generate_id(),
                now_ms(),
                &self.session_id,
                self.entry_point.as_str(),
                &self.app_version,
                self.platform,
                &event.event,
                &event.resource,
                &event.command,
                event.status_code.map(i32::from),
                &event.error_message,
            ],
        )?;

        Ok(())
    }

    pub fn log_event(&self, event: &str) -> Result<()> {
        self.log(LogEvent::new(event))
    }

    /// Record a CLI command execution
    pub fn log_command(&self, command: &str) -> Result<()> {
        self.log(LogEvent::new(events::COMMAND_EXECUTED).with_command(command))
    }

    /// Most recent entries first
    pub fn get_recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sys_logs ORDER BY timestamp DESC, id DESC LIMIT ?",
            ENTRY_COLUMNS
        ))?;
        let entries = stmt
            .query_map([limit as i64], map_entry)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(entries)
    }

    /// Most recent entries that carry an error message
    pub fn get_errors(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sys_logs WHERE error_message IS NOT NULL \
             ORDER BY timestamp DESC, id DESC LIMIT ?",
            ENTRY_COLUMNS
        ))?;
        let entries = stmt
            .query_map([limit as i64], map_entry)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(entries)
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.conn()?;
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM sys_logs", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Totals and per-event counts
    pub fn summary(&self) -> Result<LogSummary> {
        let conn = self.conn()?;

        let (total, errors, sessions): (u64, u64, u64) = conn.query_row(
            "SELECT COUNT(*), COUNT(error_message), COUNT(DISTINCT session_id) FROM sys_logs",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let mut stmt = conn.prepare(
            "SELECT event, COUNT(*) AS n FROM sys_logs GROUP BY event ORDER BY n DESC, event",
        )?;
        let by_event: Vec<(String, u64)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(LogSummary {
            total,
            errors,
            sessions,
            by_event,
        })
    }

    /// Delete logs older than the given unix-ms timestamp
    pub fn delete_before(&self, timestamp_ms: i64) -> Result<u64> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM sys_logs WHERE timestamp < ?", [timestamp_ms])?;
        Ok(deleted as u64)
    }

    /// Delete every entry
    pub fn clear(&self) -> Result<u64> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM sys_logs", [])?;
        Ok(deleted as u64)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}
