//! Usage: Background poll loop (unread notifications + proactive token upkeep).

use crate::api::notifications;
use crate::app::app_state;
use crate::infra::settings;
use crate::shared::blocking;
use std::time::Duration;
use tauri::Emitter;

const POLL_MIN_INTERVAL: Duration = Duration::from_secs(5);

/// Wakes on the configured interval while a session exists. The unread-count
/// call runs through the interceptor, so a near-expiry access token is
/// renewed here before the user touches the UI again. The client is
/// re-acquired every tick to pick up settings changes.
pub(crate) async fn run_background_poll_loop(app: tauri::AppHandle) {
    loop {
        let poll_seconds = match blocking::run("poll_read_settings", {
            let app = app.clone();
            move || settings::read(&app)
        })
        .await
        {
            Ok(cfg) => cfg.notifications_poll_seconds,
            Err(err) => {
                tracing::warn!("settings read failed in poll loop, using defaults: {}", err);
                settings::AppSettings::default().notifications_poll_seconds
            }
        };

        match app_state::ensure_api_ready(app.clone()).await {
            // Notifications are a staff-facing feature; public sessions skip the poll.
            Ok(client)
                if client
                    .session()
                    .current()
                    .map(|c| c.profile.role.is_staff())
                    .unwrap_or(false) =>
            {
                match notifications::unread_count(&client).await {
                    Ok(count) => {
                        let _ = app
                            .emit("notifications-unread", serde_json::json!({ "count": count }));
                    }
                    Err(err) => {
                        tracing::warn!("notifications poll tick failed: {err}");
                    }
                }
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!("poll tick could not acquire api client: {err}");
            }
        }

        let interval = Duration::from_secs(poll_seconds as u64).max(POLL_MIN_INTERVAL);
        tokio::time::sleep(interval).await;
    }
}
