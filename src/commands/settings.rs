//! Usage: Settings-related Tauri commands.

use crate::app::app_state;
use crate::infra::settings;
use crate::shared::blocking;

/// Encapsulates all fields for the `settings_set` command.
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SettingsUpdate {
    pub api_base_url: String,
    pub request_timeout_seconds: u32,
    pub log_retention_days: u32,
    pub notifications_poll_seconds: Option<u32>,
    pub token_refresh_lead_seconds: Option<u32>,
}

#[tauri::command]
pub(crate) async fn settings_get(app: tauri::AppHandle) -> Result<settings::AppSettings, String> {
    blocking::run("settings_get", move || settings::read(&app))
        .await
        .map_err(Into::into)
}

#[tauri::command]
pub(crate) async fn settings_set(
    app: tauri::AppHandle,
    update: SettingsUpdate,
) -> Result<settings::AppSettings, String> {
    let SettingsUpdate {
        api_base_url,
        request_timeout_seconds,
        log_retention_days,
        notifications_poll_seconds,
        token_refresh_lead_seconds,
    } = update;

    let app_for_work = app.clone();
    let next_settings = blocking::run(
        "settings_set",
        move || -> crate::shared::error::AppResult<settings::AppSettings> {
            let previous = settings::read(&app_for_work).unwrap_or_default();
            let notifications_poll_seconds =
                notifications_poll_seconds.unwrap_or(previous.notifications_poll_seconds);
            let token_refresh_lead_seconds =
                token_refresh_lead_seconds.unwrap_or(previous.token_refresh_lead_seconds);

            let settings = settings::AppSettings {
                schema_version: settings::SCHEMA_VERSION,
                api_base_url,
                request_timeout_seconds,
                log_retention_days,
                notifications_poll_seconds,
                token_refresh_lead_seconds,
            };

            settings::write(&app_for_work, &settings)
        },
    )
    .await?;

    // The next API call rebuilds the client against the new base URL.
    app_state::invalidate_api(&app);

    tracing::info!(
        api_base_url = %next_settings.api_base_url,
        request_timeout_seconds = next_settings.request_timeout_seconds,
        log_retention_days = next_settings.log_retention_days,
        notifications_poll_seconds = next_settings.notifications_poll_seconds,
        "settings updated"
    );

    Ok(next_settings)
}
