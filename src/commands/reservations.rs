//! Usage: Reservation management commands.

use crate::api::reservations::{
    self, EstadoReserva, Reservation, ReservationInput, ReservationRow,
};
use crate::app::app_state;
use crate::commands::surface;

#[tauri::command]
pub(crate) async fn reservations_list(
    app: tauri::AppHandle,
) -> Result<Vec<ReservationRow>, String> {
    let client = app_state::ensure_api_ready(app.clone()).await?;
    surface(&app, reservations::list_with_estados(&client).await).map_err(Into::into)
}

#[tauri::command]
pub(crate) async fn reservation_estados(
    app: tauri::AppHandle,
) -> Result<Vec<EstadoReserva>, String> {
    let client = app_state::ensure_api_ready(app.clone()).await?;
    surface(&app, reservations::estados(&client).await).map_err(Into::into)
}

#[tauri::command]
pub(crate) async fn reservation_create(
    app: tauri::AppHandle,
    input: ReservationInput,
) -> Result<Reservation, String> {
    let input = reservations::normalize_input(input)?;
    let client = app_state::ensure_api_ready(app.clone()).await?;
    let reservation = surface(&app, reservations::create(&client, &input).await)?;
    tracing::info!(
        reservation_id = reservation.id,
        sala = reservation.sala,
        "reservation requested"
    );
    Ok(reservation)
}

/// Generic status update, resolved through the backend status catalog.
#[tauri::command]
pub(crate) async fn reservation_set_estado(
    app: tauri::AppHandle,
    id: i64,
    estado: String,
) -> Result<Reservation, String> {
    let client = app_state::ensure_api_ready(app.clone()).await?;
    let reservation = surface(
        &app,
        reservations::set_estado_by_nombre(&client, id, &estado).await,
    )?;
    tracing::info!(reservation_id = id, estado = %estado, "reservation status changed");
    Ok(reservation)
}

#[tauri::command]
pub(crate) async fn reservation_confirm(app: tauri::AppHandle, id: i64) -> Result<(), String> {
    let client = app_state::ensure_api_ready(app.clone()).await?;
    surface(&app, reservations::confirm(&client, id).await)?;
    tracing::info!(reservation_id = id, "reservation confirmed");
    Ok(())
}

#[tauri::command]
pub(crate) async fn reservation_cancel(app: tauri::AppHandle, id: i64) -> Result<(), String> {
    let client = app_state::ensure_api_ready(app.clone()).await?;
    surface(&app, reservations::cancel(&client, id).await)?;
    tracing::info!(reservation_id = id, "reservation cancelled");
    Ok(())
}

#[tauri::command]
pub(crate) async fn reservation_delete(app: tauri::AppHandle, id: i64) -> Result<(), String> {
    let client = app_state::ensure_api_ready(app.clone()).await?;
    surface(&app, reservations::delete(&client, id).await)?;
    tracing::info!(reservation_id = id, "reservation deleted");
    Ok(())
}
