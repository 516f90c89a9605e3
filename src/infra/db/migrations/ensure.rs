//! Usage: Idempotent schema patches applied on every startup.

use rusqlite::Connection;

pub(super) fn apply_ensure_patches(conn: &Connection) -> Result<(), String> {
    // Indexes are safe to (re)create regardless of the version the install
    // started from.
    conn.execute_batch(
        r#"
CREATE INDEX IF NOT EXISTS idx_api_request_logs_created_at ON api_request_logs(created_at);
CREATE INDEX IF NOT EXISTS idx_api_request_logs_path ON api_request_logs(path);
"#,
    )
    .map_err(|e| format!("failed to apply ensure patches: {e}"))
}
