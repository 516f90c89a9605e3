//! Usage: Authentication commands (login, logout, session snapshot).

use crate::api::auth;
use crate::app::app_state;
use crate::commands::surface;
use crate::domain::session::SessionSnapshot;
use crate::shared::blocking;

#[tauri::command]
pub(crate) async fn auth_login(
    app: tauri::AppHandle,
    username: String,
    password: String,
) -> Result<SessionSnapshot, String> {
    let client = app_state::ensure_api_ready(app.clone()).await?;
    let snapshot = surface(&app, auth::login(&client, username.trim(), &password).await)?;

    tracing::info!(username = %username.trim(), "login command completed");
    Ok(snapshot)
}

#[tauri::command]
pub(crate) async fn auth_logout(app: tauri::AppHandle) -> Result<(), String> {
    let client = app_state::ensure_api_ready(app.clone()).await?;
    blocking::run("auth_logout", move || auth::logout(&client))
        .await
        .map_err(Into::into)
}

#[tauri::command]
pub(crate) async fn auth_session_get(app: tauri::AppHandle) -> Result<SessionSnapshot, String> {
    let session = app_state::ensure_session_ready(app.clone()).await?;
    Ok(session.snapshot())
}
