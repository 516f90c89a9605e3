//! Usage: Persistence for the outbound API request log (one row per REST call).

use crate::infra::db::Db;
use crate::shared::error::db_err;
use crate::shared::error::AppResult;
use crate::shared::time::now_unix_seconds;
use rusqlite::params;
use serde::Serialize;

const DEFAULT_LIST_LIMIT: usize = 200;
const MAX_LIST_LIMIT: usize = 1000;

#[derive(Debug, Clone, Serialize)]
pub struct ApiRequestLogRow {
    pub id: i64,
    pub method: String,
    pub path: String,
    pub status: Option<u16>,
    pub error_code: Option<String>,
    pub duration_ms: i64,
    pub retried: bool,
    pub refreshed: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct ApiRequestLogEntry {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) status: Option<u16>,
    pub(crate) error_code: Option<String>,
    pub(crate) duration_ms: i64,
    pub(crate) retried: bool,
    pub(crate) refreshed: bool,
}

pub(crate) fn insert(db: &Db, entry: &ApiRequestLogEntry) -> AppResult<()> {
    let conn = db.open_connection()?;
    conn.execute(
        r#"
INSERT INTO api_request_logs(method, path, status, error_code, duration_ms, retried, refreshed, created_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#,
        params![
            entry.method,
            entry.path,
            entry.status.map(|s| s as i64),
            entry.error_code,
            entry.duration_ms,
            entry.retried as i64,
            entry.refreshed as i64,
            now_unix_seconds(),
        ],
    )
    .map_err(|e| db_err!("failed to insert api request log: {e}"))?;
    Ok(())
}

fn row_to_log(row: &rusqlite::Row<'_>) -> Result<ApiRequestLogRow, rusqlite::Error> {
    Ok(ApiRequestLogRow {
        id: row.get("id")?,
        method: row.get("method")?,
        path: row.get("path")?,
        status: row.get::<_, Option<i64>>("status")?.map(|s| s as u16),
        error_code: row.get("error_code")?,
        duration_ms: row.get("duration_ms")?,
        retried: row.get::<_, i64>("retried")? != 0,
        refreshed: row.get::<_, i64>("refreshed")? != 0,
        created_at: row.get("created_at")?,
    })
}

pub(crate) fn list_recent(db: &Db, limit: Option<usize>) -> AppResult<Vec<ApiRequestLogRow>> {
    let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
    let conn = db.open_connection()?;
    let mut stmt = conn
        .prepare(
            r#"
SELECT id, method, path, status, error_code, duration_ms, retried, refreshed, created_at
FROM api_request_logs
ORDER BY id DESC
LIMIT ?1
"#,
        )
        .map_err(|e| db_err!("failed to prepare request log query: {e}"))?;

    let rows = stmt
        .query_map([limit as i64], row_to_log)
        .map_err(|e| db_err!("failed to query request logs: {e}"))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| db_err!("failed to read request log row: {e}"))?;
    Ok(rows)
}

pub(crate) fn clear_all(db: &Db) -> AppResult<usize> {
    let conn = db.open_connection()?;
    let deleted = conn
        .execute("DELETE FROM api_request_logs", [])
        .map_err(|e| db_err!("failed to clear request logs: {e}"))?;
    Ok(deleted)
}

/// Delete rows older than the retention window. Returns the number removed.
pub(crate) fn purge_older_than_days(db: &Db, retention_days: u32) -> AppResult<usize> {
    let retention_days = retention_days.max(1) as i64;
    let cutoff = now_unix_seconds() - retention_days * 24 * 60 * 60;
    let conn = db.open_connection()?;
    let deleted = conn
        .execute(
            "DELETE FROM api_request_logs WHERE created_at < ?1",
            [cutoff],
        )
        .map_err(|e| db_err!("failed to purge request logs: {e}"))?;
    if deleted > 0 {
        tracing::info!(deleted, retention_days, "purged old api request logs");
    }
    Ok(deleted)
}
