//! Usage: Account management commands (cashier registration, user CRUD).

use crate::api::users::{self, RegisterInput, UserAccount, UserUpdate};
use crate::app::app_state;
use crate::app::notice;
use crate::commands::surface;

#[tauri::command]
pub(crate) async fn users_list(app: tauri::AppHandle) -> Result<Vec<UserAccount>, String> {
    let client = app_state::ensure_api_ready(app.clone()).await?;
    surface(&app, users::list(&client).await).map_err(Into::into)
}

#[tauri::command]
pub(crate) async fn user_register(
    app: tauri::AppHandle,
    input: RegisterInput,
) -> Result<String, String> {
    let input = users::normalize_register_input(input)?;
    let client = app_state::ensure_api_ready(app.clone()).await?;
    let message = surface(&app, users::register(&client, &input).await)?;
    notice::notify_info(&app, &message);
    tracing::info!(username = %input.username, "cashier account registered");
    Ok(message)
}

#[tauri::command]
pub(crate) async fn user_update(
    app: tauri::AppHandle,
    id: i64,
    update: UserUpdate,
) -> Result<UserAccount, String> {
    let update = users::normalize_user_update(update)?;
    let client = app_state::ensure_api_ready(app.clone()).await?;
    let account = surface(&app, users::update(&client, id, &update).await)?;
    tracing::info!(user_id = account.id, "user account updated");
    Ok(account)
}

#[tauri::command]
pub(crate) async fn user_delete(app: tauri::AppHandle, id: i64) -> Result<(), String> {
    let client = app_state::ensure_api_ready(app.clone()).await?;
    surface(&app, users::delete(&client, id).await)?;
    tracing::info!(user_id = id, "user account deleted");
    Ok(())
}
