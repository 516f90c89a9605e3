//! Usage: SQLite schema migrations (user_version + incremental upgrades).

mod baseline_v1;
mod ensure;
mod v1_to_v2;

use rusqlite::Connection;

const LATEST_SCHEMA_VERSION: i64 = 2;
const MAX_COMPAT_SCHEMA_VERSION: i64 = 4;

pub(super) fn apply_migrations(conn: &mut Connection) -> crate::shared::error::AppResult<()> {
    let mut user_version = read_user_version(conn)?;

    if user_version < 0 || user_version > MAX_COMPAT_SCHEMA_VERSION {
        return Err(format!(
            "unsupported sqlite schema version: user_version={user_version} (expected 0..={MAX_COMPAT_SCHEMA_VERSION})"
        )
        .into());
    }

    let start_version = user_version;

    // Fresh install: create complete schema at v1
    if user_version == 0 {
        baseline_v1::create_baseline_v1(conn)?;
        user_version = read_user_version(conn)?;
        tracing::info!(to_version = user_version, "sqlite baseline schema created");
    }

    while user_version < LATEST_SCHEMA_VERSION {
        let from_version = user_version;
        match user_version {
            1 => v1_to_v2::migrate_v1_to_v2(conn)?,
            v => {
                tracing::error!(
                    version = v,
                    "unsupported sqlite schema version during migration"
                );
                return Err(format!(
                    "unsupported sqlite schema version: user_version={v} (expected 0..={MAX_COMPAT_SCHEMA_VERSION})"
                )
                .into());
            }
        }
        user_version = read_user_version(conn)?;
        tracing::info!(
            from_version = from_version,
            to_version = user_version,
            "sqlite migration step completed"
        );
    }

    if start_version < user_version {
        tracing::info!(
            from_version = start_version,
            to_version = user_version,
            "sqlite migrations completed"
        );
    }

    // Idempotent ensure patches (always run)
    ensure::apply_ensure_patches(conn)?;

    Ok(())
}

fn read_user_version(conn: &Connection) -> Result<i64, String> {
    conn.query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
        .map_err(|e| format!("failed to read sqlite user_version: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_mem() -> Connection {
        Connection::open_in_memory().expect("open in-memory sqlite")
    }

    #[test]
    fn fresh_database_migrates_to_latest() {
        let mut conn = open_mem();
        apply_migrations(&mut conn).expect("apply migrations");
        assert_eq!(read_user_version(&conn).unwrap(), LATEST_SCHEMA_VERSION);
    }

    #[test]
    fn migrations_are_idempotent() {
        let mut conn = open_mem();
        apply_migrations(&mut conn).expect("first run");
        apply_migrations(&mut conn).expect("second run");
        assert_eq!(read_user_version(&conn).unwrap(), LATEST_SCHEMA_VERSION);
    }

    #[test]
    fn future_schema_version_is_rejected() {
        let mut conn = open_mem();
        conn.execute_batch("PRAGMA user_version = 99;").unwrap();
        assert!(apply_migrations(&mut conn).is_err());
    }

    #[test]
    fn baseline_creates_expected_tables() {
        let mut conn = open_mem();
        apply_migrations(&mut conn).expect("apply migrations");
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('session','api_request_logs')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
    }
}
