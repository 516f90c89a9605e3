//! Usage: Baseline schema at version 1 for fresh installs.
//!
//! Creates the complete database schema as it existed at version 1. Existing
//! installs (user_version >= 1) skip this entirely; incremental migrations
//! handle upgrades from there.

use crate::shared::time::now_unix_seconds;
use rusqlite::Connection;

pub(super) fn create_baseline_v1(conn: &mut Connection) -> Result<(), String> {
    let tx = conn
        .transaction()
        .map_err(|e| format!("failed to start sqlite transaction: {e}"))?;

    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
  version INTEGER PRIMARY KEY,
  applied_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS session (
  id INTEGER PRIMARY KEY CHECK (id = 1),
  access_token TEXT NOT NULL,
  refresh_token TEXT,
  access_expires_at INTEGER,
  user_id INTEGER NOT NULL,
  username TEXT NOT NULL,
  email TEXT,
  nombre TEXT,
  role TEXT NOT NULL,
  created_at INTEGER NOT NULL,
  updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS api_request_logs (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  method TEXT NOT NULL,
  path TEXT NOT NULL,
  status INTEGER,
  error_code TEXT,
  duration_ms INTEGER NOT NULL DEFAULT 0,
  retried INTEGER NOT NULL DEFAULT 0,
  created_at INTEGER NOT NULL
);
"#,
    )
    .map_err(|e| format!("failed to create baseline schema: {e}"))?;

    tx.execute(
        "INSERT OR IGNORE INTO schema_migrations(version, applied_at) VALUES (1, ?1)",
        [now_unix_seconds()],
    )
    .map_err(|e| format!("failed to record baseline migration: {e}"))?;

    tx.execute_batch("PRAGMA user_version = 1;")
        .map_err(|e| format!("failed to set user_version: {e}"))?;

    tx.commit()
        .map_err(|e| format!("failed to commit baseline schema: {e}"))
}
