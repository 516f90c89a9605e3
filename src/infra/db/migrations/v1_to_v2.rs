//! Usage: v1 -> v2 migration (request log gains the refresh marker).

use crate::shared::time::now_unix_seconds;
use rusqlite::Connection;

pub(super) fn migrate_v1_to_v2(conn: &mut Connection) -> Result<(), String> {
    let tx = conn
        .transaction()
        .map_err(|e| format!("failed to start sqlite transaction: {e}"))?;

    // `refreshed` marks calls that went through a token refresh before completing.
    tx.execute_batch(
        r#"
ALTER TABLE api_request_logs ADD COLUMN refreshed INTEGER NOT NULL DEFAULT 0;
"#,
    )
    .map_err(|e| format!("failed to apply v1->v2 migration: {e}"))?;

    tx.execute(
        "INSERT OR IGNORE INTO schema_migrations(version, applied_at) VALUES (2, ?1)",
        [now_unix_seconds()],
    )
    .map_err(|e| format!("failed to record v2 migration: {e}"))?;

    tx.execute_batch("PRAGMA user_version = 2;")
        .map_err(|e| format!("failed to set user_version: {e}"))?;

    tx.commit()
        .map_err(|e| format!("failed to commit v1->v2 migration: {e}"))
}
