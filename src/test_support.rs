//! Usage: Public test helpers for integration tests.

use crate::api::client::ApiClient;
use crate::domain::session::{
    SessionCredentials, SessionNotifier, SessionStore, UserProfile, UserRole,
};
use crate::shared::error::{AppError, AppResult};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn serialize_json(value: impl serde::Serialize) -> AppResult<Value> {
    Ok(serde_json::to_value(value)
        .map_err(|e| format!("SYSTEM_ERROR: failed to serialize json: {e}"))?)
}

pub fn app_data_dir<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<PathBuf> {
    crate::infra::app_paths::app_data_dir(app)
}

pub fn db_path<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<PathBuf> {
    crate::infra::db::db_path(app)
}

pub fn init_db<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<()> {
    crate::infra::db::init(app).map(|_| ())
}

/// Counts `session_expired` signals instead of touching the UI.
#[derive(Default)]
pub struct RecordingNotifier {
    expired: AtomicUsize,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn expired_count(&self) -> usize {
        self.expired.load(Ordering::SeqCst)
    }
}

impl SessionNotifier for RecordingNotifier {
    fn session_expired(&self) {
        self.expired.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn build_api_client<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
    base_url: &str,
    refresh_lead_s: i64,
    notifier: Arc<RecordingNotifier>,
) -> AppResult<Arc<ApiClient>> {
    let db = crate::infra::db::init(app)?;
    let session = Arc::new(SessionStore::load(db.clone())?);
    Ok(Arc::new(ApiClient::new(
        base_url,
        Duration::from_secs(10),
        refresh_lead_s,
        db,
        session,
        notifier,
    )?))
}

// -- session ---------------------------------------------------------------

pub fn seed_session(
    client: &ApiClient,
    access: &str,
    refresh: Option<&str>,
    access_expires_at: Option<i64>,
) -> AppResult<()> {
    client.session().save(&SessionCredentials {
        access_token: access.to_string(),
        refresh_token: refresh.map(str::to_string),
        access_expires_at,
        profile: UserProfile {
            id: 1,
            username: "admin".to_string(),
            email: Some("admin@example.com".to_string()),
            nombre: Some("Admin".to_string()),
            role: UserRole::Admin,
        },
    })
}

pub fn session_is_authenticated(client: &ApiClient) -> bool {
    client.session().is_authenticated()
}

pub fn session_access_token(client: &ApiClient) -> Option<String> {
    client.session().current().map(|c| c.access_token)
}

pub fn session_refresh_token(client: &ApiClient) -> Option<String> {
    client.session().current().and_then(|c| c.refresh_token)
}

pub fn session_snapshot_json(client: &ApiClient) -> AppResult<Value> {
    serialize_json(client.session().snapshot())
}

pub fn clear_session(client: &ApiClient) -> AppResult<()> {
    client.session().clear()
}

/// Open a fresh store over the same database to check what actually hit disk.
pub fn persisted_access_token<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
) -> AppResult<Option<String>> {
    let db = crate::infra::db::init(app)?;
    let store = SessionStore::load(db)?;
    Ok(store.current().map(|c| c.access_token))
}

// -- auth ------------------------------------------------------------------

pub async fn login_json(client: &ApiClient, username: &str, password: &str) -> AppResult<Value> {
    let snapshot = crate::api::auth::login(client, username, password)
        .await
        .map_err(AppError::from)?;
    serialize_json(snapshot)
}

pub fn logout(client: &ApiClient) -> AppResult<()> {
    crate::api::auth::logout(client)
}

// -- rooms -----------------------------------------------------------------

pub async fn rooms_list_json(client: &ApiClient) -> AppResult<Value> {
    serialize_json(
        crate::api::rooms::list(client)
            .await
            .map_err(AppError::from)?,
    )
}

pub async fn room_create_json(client: &ApiClient, input: Value) -> AppResult<Value> {
    let input: crate::api::rooms::RoomInput = serde_json::from_value(input)
        .map_err(|e| format!("SEC_INVALID_INPUT: invalid room input json: {e}"))?;
    let input = crate::api::rooms::normalize_input(input)?;
    serialize_json(
        crate::api::rooms::create(client, &input)
            .await
            .map_err(AppError::from)?,
    )
}

pub async fn room_update_json(client: &ApiClient, id: i64, input: Value) -> AppResult<Value> {
    let input: crate::api::rooms::RoomInput = serde_json::from_value(input)
        .map_err(|e| format!("SEC_INVALID_INPUT: invalid room input json: {e}"))?;
    let input = crate::api::rooms::normalize_input(input)?;
    serialize_json(
        crate::api::rooms::update(client, id, &input)
            .await
            .map_err(AppError::from)?,
    )
}

pub async fn room_set_disponible_json(
    client: &ApiClient,
    id: i64,
    disponible: bool,
) -> AppResult<Value> {
    serialize_json(
        crate::api::rooms::set_disponible(client, id, disponible)
            .await
            .map_err(AppError::from)?,
    )
}

pub async fn room_delete(client: &ApiClient, id: i64) -> AppResult<bool> {
    crate::api::rooms::delete(client, id)
        .await
        .map_err(AppError::from)?;
    Ok(true)
}

// -- reservations ----------------------------------------------------------

pub async fn reservations_list_json(client: &ApiClient) -> AppResult<Value> {
    serialize_json(
        crate::api::reservations::list_with_estados(client)
            .await
            .map_err(AppError::from)?,
    )
}

pub async fn reservation_create_json(client: &ApiClient, input: Value) -> AppResult<Value> {
    let input: crate::api::reservations::ReservationInput = serde_json::from_value(input)
        .map_err(|e| format!("SEC_INVALID_INPUT: invalid reservation input json: {e}"))?;
    let input = crate::api::reservations::normalize_input(input)?;
    serialize_json(
        crate::api::reservations::create(client, &input)
            .await
            .map_err(AppError::from)?,
    )
}

pub async fn reservation_set_estado_json(
    client: &ApiClient,
    id: i64,
    estado: &str,
) -> AppResult<Value> {
    serialize_json(
        crate::api::reservations::set_estado_by_nombre(client, id, estado)
            .await
            .map_err(AppError::from)?,
    )
}

pub async fn reservation_confirm(client: &ApiClient, id: i64) -> AppResult<bool> {
    crate::api::reservations::confirm(client, id)
        .await
        .map_err(AppError::from)?;
    Ok(true)
}

pub async fn reservation_cancel(client: &ApiClient, id: i64) -> AppResult<bool> {
    crate::api::reservations::cancel(client, id)
        .await
        .map_err(AppError::from)?;
    Ok(true)
}

pub async fn reservation_delete(client: &ApiClient, id: i64) -> AppResult<bool> {
    crate::api::reservations::delete(client, id)
        .await
        .map_err(AppError::from)?;
    Ok(true)
}

// -- users -----------------------------------------------------------------

pub async fn users_list_json(client: &ApiClient) -> AppResult<Value> {
    serialize_json(
        crate::api::users::list(client)
            .await
            .map_err(AppError::from)?,
    )
}

pub async fn user_register_json(client: &ApiClient, input: Value) -> AppResult<Value> {
    let input: crate::api::users::RegisterInput = serde_json::from_value(input)
        .map_err(|e| format!("SEC_INVALID_INPUT: invalid register input json: {e}"))?;
    let input = crate::api::users::normalize_register_input(input)?;
    let message = crate::api::users::register(client, &input)
        .await
        .map_err(AppError::from)?;
    serialize_json(serde_json::json!({ "message": message }))
}

pub async fn user_update_json(client: &ApiClient, id: i64, update: Value) -> AppResult<Value> {
    let update: crate::api::users::UserUpdate = serde_json::from_value(update)
        .map_err(|e| format!("SEC_INVALID_INPUT: invalid user update json: {e}"))?;
    let update = crate::api::users::normalize_user_update(update)?;
    serialize_json(
        crate::api::users::update(client, id, &update)
            .await
            .map_err(AppError::from)?,
    )
}

pub async fn user_delete(client: &ApiClient, id: i64) -> AppResult<bool> {
    crate::api::users::delete(client, id)
        .await
        .map_err(AppError::from)?;
    Ok(true)
}

// -- notifications ---------------------------------------------------------

pub async fn notifications_list_json(client: &ApiClient) -> AppResult<Value> {
    serialize_json(
        crate::api::notifications::list(client)
            .await
            .map_err(AppError::from)?,
    )
}

pub async fn notifications_unread_count(client: &ApiClient) -> AppResult<u64> {
    crate::api::notifications::unread_count(client)
        .await
        .map_err(AppError::from)
}

pub async fn notification_mark_read(client: &ApiClient, id: i64) -> AppResult<bool> {
    crate::api::notifications::mark_read(client, id)
        .await
        .map_err(AppError::from)?;
    Ok(true)
}

pub async fn notifications_mark_all_read(client: &ApiClient) -> AppResult<bool> {
    crate::api::notifications::mark_all_read(client)
        .await
        .map_err(AppError::from)?;
    Ok(true)
}

// -- settings / request log ------------------------------------------------

pub fn settings_read_json<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<Value> {
    serialize_json(crate::infra::settings::read(app)?)
}

pub fn settings_write_json<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
    settings: Value,
) -> AppResult<Value> {
    let settings: crate::infra::settings::AppSettings = serde_json::from_value(settings)
        .map_err(|e| format!("SEC_INVALID_INPUT: invalid settings json: {e}"))?;
    serialize_json(crate::infra::settings::write(app, &settings)?)
}

pub fn request_logs_list_json<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<Value> {
    let db = crate::infra::db::init(app)?;
    serialize_json(crate::infra::request_log::list_recent(&db, None)?)
}

/// Expose the typed error kind of a raw login (used to assert that token
/// endpoints are never intercepted).
pub async fn login_error_code(client: &ApiClient, username: &str, password: &str) -> Option<String> {
    match crate::api::auth::login(client, username, password).await {
        Ok(_) => None,
        Err(err) => Some(err.app_code().to_string()),
    }
}

/// Issue a bare GET through the interceptor and report the `AppError` code on
/// failure (None on success).
pub async fn raw_get_error_code(client: &ApiClient, path: &str) -> Option<String> {
    match client
        .request_value(reqwest::Method::GET, path, None)
        .await
    {
        Ok(_) => None,
        Err(err) => Some(err.app_code().to_string()),
    }
}

/// Error codes live behind `AppError`'s private fields; tests read them here.
pub fn app_error_code(err: &AppError) -> String {
    err.code().to_string()
}
