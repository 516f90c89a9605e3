//! Usage: Session credential lifecycle (load/save/clear) over the sqlite store.
//!
//! The store is the single owner of the access/refresh token pair and the
//! cached user profile. It is injected into the API client instead of being
//! read from ambient global state; tokens never cross the command boundary
//! to the webview.

use crate::infra::db::Db;
use crate::shared::error::db_err;
use crate::shared::error::AppResult;
use crate::shared::mutex_ext::MutexExt;
use crate::shared::security::mask_token;
use crate::shared::time::now_unix_seconds;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

const ROLE_ADMIN: &str = "admin";
const ROLE_CAJERO: &str = "cajero";
const ROLE_USUARIO: &str = "usuario";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Cajero,
    Usuario,
}

impl UserRole {
    pub(crate) fn parse_lossy(raw: &str) -> Self {
        match raw.trim() {
            ROLE_ADMIN => Self::Admin,
            ROLE_CAJERO => Self::Cajero,
            ROLE_USUARIO => Self::Usuario,
            _ => Self::Usuario,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Admin => ROLE_ADMIN,
            Self::Cajero => ROLE_CAJERO,
            Self::Usuario => ROLE_USUARIO,
        }
    }

    pub fn is_staff(self) -> bool {
        matches!(self, Self::Admin | Self::Cajero)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub nombre: Option<String>,
    pub role: UserRole,
}

#[derive(Debug, Clone)]
pub struct SessionCredentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Expiry of the access token decoded from its JWT `exp` claim, if any.
    pub access_expires_at: Option<i64>,
    pub profile: UserProfile,
}

/// What the webview is allowed to see about the session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub authenticated: bool,
    pub profile: Option<UserProfile>,
}

/// Side effects of an unrecoverable authentication failure, decoupled from
/// the API client so tests can observe them.
pub trait SessionNotifier: Send + Sync {
    fn session_expired(&self);
}

pub struct SessionStore {
    db: Db,
    cached: Mutex<Option<SessionCredentials>>,
}

fn row_to_credentials(row: &rusqlite::Row<'_>) -> Result<SessionCredentials, rusqlite::Error> {
    let role_raw: String = row.get("role")?;
    Ok(SessionCredentials {
        access_token: row.get("access_token")?,
        refresh_token: row.get("refresh_token")?,
        access_expires_at: row.get("access_expires_at")?,
        profile: UserProfile {
            id: row.get("user_id")?,
            username: row.get("username")?,
            email: row.get("email")?,
            nombre: row.get("nombre")?,
            role: UserRole::parse_lossy(&role_raw),
        },
    })
}

impl SessionStore {
    /// Load the persisted session (if any) and keep it cached in memory.
    pub fn load(db: Db) -> AppResult<Self> {
        let current = {
            let conn = db.open_connection()?;
            conn.query_row(
                r#"
SELECT access_token, refresh_token, access_expires_at, user_id, username, email, nombre, role
FROM session WHERE id = 1
"#,
                [],
                row_to_credentials,
            )
            .optional()
            .map_err(|e| db_err!("failed to load session: {e}"))?
        };

        if let Some(creds) = current.as_ref() {
            tracing::info!(
                username = %creds.profile.username,
                role = creds.profile.role.as_str(),
                access_token = %mask_token(&creds.access_token),
                "session restored from store"
            );
        }

        Ok(Self {
            db,
            cached: Mutex::new(current),
        })
    }

    pub fn current(&self) -> Option<SessionCredentials> {
        self.cached.lock_or_recover().clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let current = self.cached.lock_or_recover();
        SessionSnapshot {
            authenticated: current.is_some(),
            profile: current.as_ref().map(|c| c.profile.clone()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.cached.lock_or_recover().is_some()
    }

    /// Persist a full credential set (login or profile refresh).
    pub fn save(&self, creds: &SessionCredentials) -> AppResult<()> {
        {
            let conn = self.db.open_connection()?;
            let now = now_unix_seconds();
            conn.execute(
                r#"
INSERT INTO session(id, access_token, refresh_token, access_expires_at, user_id, username, email, nombre, role, created_at, updated_at)
VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
ON CONFLICT(id) DO UPDATE SET
  access_token = excluded.access_token,
  refresh_token = excluded.refresh_token,
  access_expires_at = excluded.access_expires_at,
  user_id = excluded.user_id,
  username = excluded.username,
  email = excluded.email,
  nombre = excluded.nombre,
  role = excluded.role,
  updated_at = excluded.updated_at
"#,
                params![
                    creds.access_token,
                    creds.refresh_token,
                    creds.access_expires_at,
                    creds.profile.id,
                    creds.profile.username,
                    creds.profile.email,
                    creds.profile.nombre,
                    creds.profile.role.as_str(),
                    now,
                ],
            )
            .map_err(|e| db_err!("failed to save session: {e}"))?;
        }

        *self.cached.lock_or_recover() = Some(creds.clone());
        Ok(())
    }

    /// Overwrite the access token after a successful refresh. The refresh
    /// token is replaced only when the backend rotated it.
    pub fn update_access_token(
        &self,
        access_token: &str,
        access_expires_at: Option<i64>,
        rotated_refresh_token: Option<&str>,
    ) -> AppResult<()> {
        let updated = {
            let mut guard = self.cached.lock_or_recover();
            let Some(creds) = guard.as_mut() else {
                return Err("AUTH_RELOGIN_REQUIRED: no session to update".into());
            };
            creds.access_token = access_token.to_string();
            creds.access_expires_at = access_expires_at;
            if let Some(rotated) = rotated_refresh_token {
                creds.refresh_token = Some(rotated.to_string());
            }
            creds.clone()
        };

        let conn = self.db.open_connection()?;
        conn.execute(
            r#"
UPDATE session
SET access_token = ?1, access_expires_at = ?2, refresh_token = ?3, updated_at = ?4
WHERE id = 1
"#,
            params![
                updated.access_token,
                updated.access_expires_at,
                updated.refresh_token,
                now_unix_seconds(),
            ],
        )
        .map_err(|e| db_err!("failed to persist refreshed token: {e}"))?;
        Ok(())
    }

    /// Drop credentials from memory and disk (logout or unrecoverable refresh failure).
    pub fn clear(&self) -> AppResult<()> {
        {
            let conn = self.db.open_connection()?;
            conn.execute("DELETE FROM session WHERE id = 1", [])
                .map_err(|e| db_err!("failed to clear session: {e}"))?;
        }
        *self.cached.lock_or_recover() = None;
        Ok(())
    }
}
