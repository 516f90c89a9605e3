mod app;
mod auth;
mod notifications;
mod reservations;
mod rooms;
mod settings;
mod users;

pub(crate) use app::*;
pub(crate) use auth::*;
pub(crate) use notifications::*;
pub(crate) use reservations::*;
pub(crate) use rooms::*;
pub(crate) use settings::*;
pub(crate) use users::*;

use crate::api::error::ApiError;
use crate::app::notice;
use crate::shared::error::AppResult;

/// Convert an API failure into the command boundary error and emit the
/// single per-call toast. `SessionExpired` already produced its own notice
/// through the session notifier.
pub(crate) fn surface<T>(app: &tauri::AppHandle, result: Result<T, ApiError>) -> AppResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(err) => {
            if !matches!(err, ApiError::SessionExpired) {
                let status = err
                    .status()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "Error".to_string());
                notice::notify_error(app, &format!("[{status}] {}", err.human_message()));
            }
            Err(err.into())
        }
    }
}
