//! Usage: Shared Tauri state types and DB/API initialization gates used by `commands/*`.

use crate::api::client::ApiClient;
use crate::app::notice::TauriSessionNotifier;
use crate::domain::session::SessionStore;
use crate::infra::db;
use crate::infra::settings;
use crate::shared::blocking;
use crate::shared::error::AppResult;
use crate::shared::mutex_ext::MutexExt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tauri::Manager;
use tokio::sync::OnceCell;

#[derive(Default)]
pub(crate) struct DbInitState(pub(crate) OnceCell<AppResult<db::Db>>);

/// Cached API client; cleared when settings change so the next call rebuilds
/// it against the new base URL.
#[derive(Default)]
pub(crate) struct ApiState(pub(crate) Mutex<Option<Arc<ApiClient>>>);

/// Session store survives client rebuilds; credentials are loaded once.
#[derive(Default)]
pub(crate) struct SessionState(pub(crate) OnceCell<AppResult<Arc<SessionStore>>>);

pub(crate) async fn ensure_db_ready(
    app: tauri::AppHandle,
    state: &DbInitState,
) -> AppResult<db::Db> {
    state
        .0
        .get_or_init(|| async move { blocking::run("db_init", move || db::init(&app)).await })
        .await
        .clone()
}

pub(crate) async fn ensure_session_ready(app: tauri::AppHandle) -> AppResult<Arc<SessionStore>> {
    let db = {
        let db_state = app.state::<DbInitState>();
        ensure_db_ready(app.clone(), db_state.inner()).await?
    };

    let session_state = app.state::<SessionState>();
    session_state
        .0
        .get_or_init(|| async move {
            blocking::run("session_load", move || {
                SessionStore::load(db).map(Arc::new)
            })
            .await
        })
        .await
        .clone()
}

pub(crate) async fn ensure_api_ready(app: tauri::AppHandle) -> AppResult<Arc<ApiClient>> {
    if let Some(client) = app.state::<ApiState>().0.lock_or_recover().clone() {
        return Ok(client);
    }

    let db = {
        let db_state = app.state::<DbInitState>();
        ensure_db_ready(app.clone(), db_state.inner()).await?
    };
    let session = ensure_session_ready(app.clone()).await?;

    let settings = match blocking::run("api_read_settings", {
        let app = app.clone();
        move || settings::read(&app)
    })
    .await
    {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::warn!("settings read failed, using defaults: {}", err);
            settings::AppSettings::default()
        }
    };

    let notifier = Arc::new(TauriSessionNotifier { app: app.clone() });
    let client = Arc::new(ApiClient::new(
        &settings.api_base_url,
        Duration::from_secs(settings.request_timeout_seconds as u64),
        settings.token_refresh_lead_seconds as i64,
        db,
        session,
        notifier,
    )?);

    tracing::info!(base_url = %client.base_url(), "api client ready");
    *app.state::<ApiState>().0.lock_or_recover() = Some(client.clone());
    Ok(client)
}

/// Drop the cached client; called after settings mutations.
pub(crate) fn invalidate_api(app: &tauri::AppHandle) {
    *app.state::<ApiState>().0.lock_or_recover() = None;
}
