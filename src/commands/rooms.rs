//! Usage: Room management commands.

use crate::api::rooms::{self, Room, RoomInput};
use crate::app::app_state;
use crate::commands::surface;

#[tauri::command]
pub(crate) async fn rooms_list(app: tauri::AppHandle) -> Result<Vec<Room>, String> {
    let client = app_state::ensure_api_ready(app.clone()).await?;
    surface(&app, rooms::list(&client).await).map_err(Into::into)
}

#[tauri::command]
pub(crate) async fn room_get(app: tauri::AppHandle, id: i64) -> Result<Room, String> {
    let client = app_state::ensure_api_ready(app.clone()).await?;
    surface(&app, rooms::get(&client, id).await).map_err(Into::into)
}

#[tauri::command]
pub(crate) async fn room_create(app: tauri::AppHandle, input: RoomInput) -> Result<Room, String> {
    let input = rooms::normalize_input(input)?;
    let client = app_state::ensure_api_ready(app.clone()).await?;
    let room = surface(&app, rooms::create(&client, &input).await)?;
    tracing::info!(room_id = room.id, nombre = %room.nombre, "room created");
    Ok(room)
}

#[tauri::command]
pub(crate) async fn room_update(
    app: tauri::AppHandle,
    id: i64,
    input: RoomInput,
) -> Result<Room, String> {
    let input = rooms::normalize_input(input)?;
    let client = app_state::ensure_api_ready(app.clone()).await?;
    let room = surface(&app, rooms::update(&client, id, &input).await)?;
    tracing::info!(room_id = room.id, "room updated");
    Ok(room)
}

#[tauri::command]
pub(crate) async fn room_set_disponible(
    app: tauri::AppHandle,
    id: i64,
    disponible: bool,
) -> Result<Room, String> {
    let client = app_state::ensure_api_ready(app.clone()).await?;
    let room = surface(&app, rooms::set_disponible(&client, id, disponible).await)?;
    tracing::info!(room_id = room.id, disponible = room.disponible, "room availability changed");
    Ok(room)
}

#[tauri::command]
pub(crate) async fn room_delete(app: tauri::AppHandle, id: i64) -> Result<(), String> {
    let client = app_state::ensure_api_ready(app.clone()).await?;
    surface(&app, rooms::delete(&client, id).await)?;
    tracing::info!(room_id = id, "room deleted");
    Ok(())
}
