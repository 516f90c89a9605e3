//! Usage: Notification commands.

use crate::api::notifications::{self, Notification};
use crate::app::app_state;
use crate::commands::surface;

#[tauri::command]
pub(crate) async fn notifications_list(
    app: tauri::AppHandle,
) -> Result<Vec<Notification>, String> {
    let client = app_state::ensure_api_ready(app.clone()).await?;
    surface(&app, notifications::list(&client).await).map_err(Into::into)
}

#[tauri::command]
pub(crate) async fn notifications_unread_count(app: tauri::AppHandle) -> Result<u64, String> {
    let client = app_state::ensure_api_ready(app.clone()).await?;
    surface(&app, notifications::unread_count(&client).await).map_err(Into::into)
}

#[tauri::command]
pub(crate) async fn notification_mark_read(app: tauri::AppHandle, id: i64) -> Result<(), String> {
    let client = app_state::ensure_api_ready(app.clone()).await?;
    surface(&app, notifications::mark_read(&client, id).await).map_err(Into::into)
}

#[tauri::command]
pub(crate) async fn notifications_mark_all_read(app: tauri::AppHandle) -> Result<(), String> {
    let client = app_state::ensure_api_ready(app.clone()).await?;
    surface(&app, notifications::mark_all_read(&client).await).map_err(Into::into)
}
