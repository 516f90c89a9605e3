//! Usage: App-level commands (about info, data dir, notices, request log).

use crate::app::app_state;
use crate::app::notice;
use crate::infra::request_log::{self, ApiRequestLogRow};
use crate::infra::{app_paths, db};
use crate::shared::blocking;
use serde::Serialize;
use tauri::Manager;

#[derive(Debug, Clone, Serialize)]
pub(crate) struct AboutInfo {
    pub name: String,
    pub version: String,
}

#[tauri::command]
pub(crate) async fn app_about_get() -> Result<AboutInfo, String> {
    Ok(AboutInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[tauri::command]
pub(crate) async fn app_data_dir_get(app: tauri::AppHandle) -> Result<String, String> {
    let dir = app_paths::app_data_dir(&app).map_err(String::from)?;
    Ok(dir.to_string_lossy().to_string())
}

/// Re-broadcast a notice from the webview so every window shows it.
#[tauri::command]
pub(crate) async fn notice_send(
    app: tauri::AppHandle,
    level: String,
    message: String,
) -> Result<(), String> {
    match level.as_str() {
        "error" => notice::notify_error(&app, &message),
        _ => notice::notify_info(&app, &message),
    }
    Ok(())
}

#[tauri::command]
pub(crate) async fn request_logs_list(
    app: tauri::AppHandle,
    limit: Option<usize>,
) -> Result<Vec<ApiRequestLogRow>, String> {
    let db = {
        let db_state = app.state::<app_state::DbInitState>();
        app_state::ensure_db_ready(app.clone(), db_state.inner()).await?
    };
    blocking::run("request_logs_list", move || {
        request_log::list_recent(&db, limit)
    })
    .await
    .map_err(Into::into)
}

#[tauri::command]
pub(crate) async fn request_logs_clear_all(app: tauri::AppHandle) -> Result<usize, String> {
    let db = {
        let db_state = app.state::<app_state::DbInitState>();
        app_state::ensure_db_ready(app.clone(), db_state.inner()).await?
    };
    let deleted = blocking::run("request_logs_clear_all", move || {
        request_log::clear_all(&db)
    })
    .await?;
    tracing::info!(deleted, "api request logs cleared");
    Ok(deleted)
}

#[tauri::command]
pub(crate) async fn db_disk_usage_get(app: tauri::AppHandle) -> Result<u64, String> {
    let path = db::db_path(&app).map_err(String::from)?;
    Ok(std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0))
}
