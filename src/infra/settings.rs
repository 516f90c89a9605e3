//! Usage: Persisted application settings (schema + read/write helpers).

use crate::infra::app_paths;
use crate::shared::error::AppResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{OnceLock, RwLock};
use std::time::{Duration, Instant};

pub const SCHEMA_VERSION: u32 = 3;
const SCHEMA_VERSION_ADD_NOTIFICATIONS_POLL: u32 = 2;
const SCHEMA_VERSION_ADD_TOKEN_REFRESH_LEAD: u32 = 3;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api/";
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u32 = 30;
const DEFAULT_LOG_RETENTION_DAYS: u32 = 30;
const DEFAULT_NOTIFICATIONS_POLL_SECONDS: u32 = 60;
pub const DEFAULT_TOKEN_REFRESH_LEAD_SECONDS: u32 = 60;

const MAX_REQUEST_TIMEOUT_SECONDS: u32 = 10 * 60;
const MAX_NOTIFICATIONS_POLL_SECONDS: u32 = 60 * 60;
const MAX_TOKEN_REFRESH_LEAD_SECONDS: u32 = 60 * 60;

const CACHE_TTL: Duration = Duration::from_secs(5);

#[derive(Clone)]
struct CachedSettings {
    data: AppSettings,
    last_updated: Instant,
}

static SETTINGS_CACHE: OnceLock<RwLock<Option<CachedSettings>>> = OnceLock::new();

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub schema_version: u32,
    /// Base URL of the reservation backend, always with a trailing slash.
    pub api_base_url: String,
    pub request_timeout_seconds: u32,
    pub log_retention_days: u32,
    pub notifications_poll_seconds: u32,
    pub token_refresh_lead_seconds: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
            log_retention_days: DEFAULT_LOG_RETENTION_DAYS,
            notifications_poll_seconds: DEFAULT_NOTIFICATIONS_POLL_SECONDS,
            token_refresh_lead_seconds: DEFAULT_TOKEN_REFRESH_LEAD_SECONDS,
        }
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> AppResult<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err("SEC_INVALID_INPUT: api_base_url is required".into());
    }
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err("SEC_INVALID_INPUT: api_base_url must start with http:// or https://".into());
    }
    if value.ends_with('/') {
        Ok(value.to_string())
    } else {
        Ok(format!("{value}/"))
    }
}

fn sanitize_request_timeout(settings: &mut AppSettings) -> bool {
    let mut changed = false;
    if settings.request_timeout_seconds == 0 {
        settings.request_timeout_seconds = DEFAULT_REQUEST_TIMEOUT_SECONDS;
        changed = true;
    }
    if settings.request_timeout_seconds > MAX_REQUEST_TIMEOUT_SECONDS {
        settings.request_timeout_seconds = MAX_REQUEST_TIMEOUT_SECONDS;
        changed = true;
    }
    changed
}

fn sanitize_notifications_poll(settings: &mut AppSettings) -> bool {
    let mut changed = false;
    if settings.notifications_poll_seconds == 0 {
        settings.notifications_poll_seconds = DEFAULT_NOTIFICATIONS_POLL_SECONDS;
        changed = true;
    }
    if settings.notifications_poll_seconds > MAX_NOTIFICATIONS_POLL_SECONDS {
        settings.notifications_poll_seconds = MAX_NOTIFICATIONS_POLL_SECONDS;
        changed = true;
    }
    changed
}

fn sanitize_token_refresh_lead(settings: &mut AppSettings) -> bool {
    if settings.token_refresh_lead_seconds > MAX_TOKEN_REFRESH_LEAD_SECONDS {
        settings.token_refresh_lead_seconds = MAX_TOKEN_REFRESH_LEAD_SECONDS;
        return true;
    }
    false
}

/// Generic schema migration helper for versions that only bump `schema_version`.
///
/// Returns `true` if the settings were modified (i.e. migration was applied).
fn migrate_bump_schema_version(
    settings: &mut AppSettings,
    schema_version_present: bool,
    target_version: u32,
) -> bool {
    if schema_version_present && settings.schema_version >= target_version {
        return false;
    }

    let mut changed = false;

    // If schema_version is missing, force a write to persist schema_version so we don't keep
    // "migrating" on every startup.
    if !schema_version_present {
        changed = true;
    }

    if settings.schema_version != target_version {
        settings.schema_version = target_version;
        changed = true;
    }

    changed
}

fn migrate_add_notifications_poll(settings: &mut AppSettings, schema_version_present: bool) -> bool {
    // v2: Add notification poll interval (default 60s).
    migrate_bump_schema_version(
        settings,
        schema_version_present,
        SCHEMA_VERSION_ADD_NOTIFICATIONS_POLL,
    )
}

fn migrate_add_token_refresh_lead(settings: &mut AppSettings, schema_version_present: bool) -> bool {
    // v3: Add token refresh lead window (default 60s).
    migrate_bump_schema_version(
        settings,
        schema_version_present,
        SCHEMA_VERSION_ADD_TOKEN_REFRESH_LEAD,
    )
}

fn settings_path<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<PathBuf> {
    Ok(app_paths::app_data_dir(app)?.join("settings.json"))
}

fn parse_settings_json(content: &str) -> AppResult<(AppSettings, bool)> {
    let raw: serde_json::Value =
        serde_json::from_str(content).map_err(|e| format!("failed to parse settings.json: {e}"))?;
    let schema_version_present = raw.get("schema_version").is_some();
    let settings: AppSettings =
        serde_json::from_value(raw).map_err(|e| format!("failed to parse settings.json: {e}"))?;
    Ok((settings, schema_version_present))
}

fn repair(settings: &mut AppSettings, schema_version_present: bool) -> bool {
    let mut repaired = false;
    repaired |= migrate_add_notifications_poll(settings, schema_version_present);
    repaired |= migrate_add_token_refresh_lead(settings, schema_version_present);
    repaired |= sanitize_request_timeout(settings);
    repaired |= sanitize_notifications_poll(settings);
    repaired |= sanitize_token_refresh_lead(settings);
    repaired
}

pub fn read<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<AppSettings> {
    let cache = SETTINGS_CACHE.get_or_init(|| RwLock::new(None));

    if let Ok(guard) = cache.read() {
        if let Some(cached) = guard.as_ref() {
            if cached.last_updated.elapsed() < CACHE_TTL {
                return Ok(cached.data.clone());
            }
        }
    }

    let path = settings_path(app)?;

    if !path.exists() {
        let settings = AppSettings::default();
        // Best-effort: create default settings.json on first read to make the config discoverable/editable.
        let _ = write(app, &settings);

        if let Ok(mut guard) = cache.write() {
            *guard = Some(CachedSettings {
                data: settings.clone(),
                last_updated: Instant::now(),
            });
        }
        return Ok(settings);
    }

    let content =
        std::fs::read_to_string(&path).map_err(|e| format!("failed to read settings: {e}"))?;
    let (mut settings, schema_version_present) = parse_settings_json(&content)?;

    settings.api_base_url = normalize_base_url(&settings.api_base_url)?;
    if settings.log_retention_days == 0 {
        return Err(
            "SEC_INVALID_INPUT: invalid settings.json: log_retention_days must be >= 1"
                .to_string()
                .into(),
        );
    }

    if repair(&mut settings, schema_version_present) {
        // Best-effort: persist repaired values while keeping read semantics.
        let _ = write(app, &settings);
    }

    if let Ok(mut guard) = cache.write() {
        *guard = Some(CachedSettings {
            data: settings.clone(),
            last_updated: Instant::now(),
        });
    }

    Ok(settings)
}

pub fn write<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
    settings: &AppSettings,
) -> AppResult<AppSettings> {
    let mut settings = settings.clone();
    settings.api_base_url = normalize_base_url(&settings.api_base_url)?;
    if settings.log_retention_days == 0 {
        return Err("SEC_INVALID_INPUT: log_retention_days must be >= 1".into());
    }
    if settings.request_timeout_seconds == 0 {
        return Err("SEC_INVALID_INPUT: request_timeout_seconds must be >= 1".into());
    }
    if settings.request_timeout_seconds > MAX_REQUEST_TIMEOUT_SECONDS {
        return Err(format!(
            "SEC_INVALID_INPUT: request_timeout_seconds must be <= {MAX_REQUEST_TIMEOUT_SECONDS}"
        )
        .into());
    }
    if settings.notifications_poll_seconds == 0 {
        return Err("SEC_INVALID_INPUT: notifications_poll_seconds must be >= 1".into());
    }
    if settings.notifications_poll_seconds > MAX_NOTIFICATIONS_POLL_SECONDS {
        return Err(format!(
            "SEC_INVALID_INPUT: notifications_poll_seconds must be <= {MAX_NOTIFICATIONS_POLL_SECONDS}"
        )
        .into());
    }
    if settings.token_refresh_lead_seconds > MAX_TOKEN_REFRESH_LEAD_SECONDS {
        return Err(format!(
            "SEC_INVALID_INPUT: token_refresh_lead_seconds must be <= {MAX_TOKEN_REFRESH_LEAD_SECONDS}"
        )
        .into());
    }

    let path = settings_path(app)?;
    let tmp_path = path.with_file_name("settings.json.tmp");
    let backup_path = path.with_file_name("settings.json.bak");

    let content = serde_json::to_vec_pretty(&settings)
        .map_err(|e| format!("failed to serialize settings: {e}"))?;

    std::fs::write(&tmp_path, content)
        .map_err(|e| format!("failed to write temp settings file: {e}"))?;

    if backup_path.exists() {
        let _ = std::fs::remove_file(&backup_path);
    }

    if path.exists() {
        std::fs::rename(&path, &backup_path)
            .map_err(|e| format!("failed to create settings backup: {e}"))?;
    }

    if let Err(e) = std::fs::rename(&tmp_path, &path) {
        let _ = std::fs::rename(&backup_path, &path);
        return Err(format!("failed to finalize settings: {e}").into());
    }

    if backup_path.exists() {
        let _ = std::fs::remove_file(&backup_path);
    }

    let cache = SETTINGS_CACHE.get_or_init(|| RwLock::new(None));
    if let Ok(mut guard) = cache.write() {
        *guard = Some(CachedSettings {
            data: settings.clone(),
            last_updated: Instant::now(),
        });
    }

    Ok(settings)
}
