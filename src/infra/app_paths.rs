//! Usage: App data directory resolution (dot-directory under the user home).

use crate::shared::error::AppResult;
use std::path::PathBuf;
use tauri::Manager;

const DEFAULT_DOTDIR_NAME: &str = ".reserva-hub";

/// Env override for the dot-directory name, used by tests to isolate state.
pub(crate) const DOTDIR_NAME_ENV: &str = "RESERVA_HUB_DOTDIR_NAME";

fn dotdir_name() -> String {
    std::env::var(DOTDIR_NAME_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_DOTDIR_NAME.to_string())
}

pub fn app_data_dir<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<PathBuf> {
    let home = app
        .path()
        .home_dir()
        .map_err(|e| format!("SYSTEM_ERROR: failed to resolve home dir: {e}"))?;
    let dir = home.join(dotdir_name());
    std::fs::create_dir_all(&dir)
        .map_err(|e| format!("SYSTEM_ERROR: failed to create app data dir: {e}"))?;
    Ok(dir)
}

pub fn logs_dir<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<PathBuf> {
    let dir = app_data_dir(app)?.join("logs");
    std::fs::create_dir_all(&dir)
        .map_err(|e| format!("SYSTEM_ERROR: failed to create logs dir: {e}"))?;
    Ok(dir)
}
