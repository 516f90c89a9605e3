mod api;
mod app;
mod commands;
mod domain;
mod infra;
mod shared;
pub mod test_support;

use app::app_state::{ApiState, DbInitState, SessionState};
use commands::*;
use shared::blocking;
use tauri::Manager;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let builder = tauri::Builder::default()
        .manage(DbInitState::default())
        .manage(SessionState::default())
        .manage(ApiState::default())
        .plugin(tauri_plugin_opener::init());

    #[cfg(desktop)]
    let builder = builder
        .plugin(tauri_plugin_notification::init())
        .plugin(tauri_plugin_single_instance::init(|app, _argv, _cwd| {
            if let Some(window) = app.get_webview_window("main") {
                let _ = window.set_focus();
            }
        }));

    builder
        .setup(|app| {
            crate::app::logging::init(app.handle());

            // Global panic hook: ensure any panic is written to disk logs for post-mortem diagnosis.
            // Note: payload is intentionally NOT logged to avoid leaking user data (consistent with blocking.rs).
            std::panic::set_hook(Box::new(|panic_info| {
                let location = panic_info
                    .location()
                    .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                    .unwrap_or_else(|| "unknown".to_string());
                tracing::error!(
                    location = %location,
                    "PANIC: application panicked at {location}. Check the log file for context leading up to this panic."
                );
            }));

            let app_handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                let db = {
                    let db_state = app_handle.state::<DbInitState>();
                    match crate::app::app_state::ensure_db_ready(app_handle.clone(), db_state.inner())
                        .await
                    {
                        Ok(db) => db,
                        Err(err) => {
                            tracing::error!("database initialization failed: {}", err);
                            return;
                        }
                    }
                };

                // Restore any persisted session and confirm it still works;
                // an expired token is handled by the interceptor (refresh or
                // forced logout) before the first page asks for anything.
                match crate::app::app_state::ensure_api_ready(app_handle.clone()).await {
                    Ok(client) => match crate::api::auth::revalidate_profile(&client).await {
                        Ok(Some(profile)) => {
                            tracing::info!(username = %profile.username, "session restored");
                        }
                        Ok(None) => {}
                        Err(err) => {
                            tracing::warn!("session revalidation failed: {}", err);
                        }
                    },
                    Err(err) => {
                        tracing::warn!("api client init failed: {}", err);
                    }
                }

                // Trim the request log to the configured retention window.
                let retention_days = match blocking::run("startup_read_settings", {
                    let app_handle = app_handle.clone();
                    move || crate::infra::settings::read(&app_handle)
                })
                .await
                {
                    Ok(cfg) => cfg.log_retention_days,
                    Err(err) => {
                        tracing::warn!("settings read failed, using defaults: {}", err);
                        crate::infra::settings::AppSettings::default().log_retention_days
                    }
                };
                if let Err(err) = blocking::run("startup_request_log_purge", {
                    let db = db.clone();
                    move || crate::infra::request_log::purge_older_than_days(&db, retention_days)
                })
                .await
                {
                    tracing::warn!("request log purge failed: {}", err);
                }

                crate::api::poll::run_background_poll_loop(app_handle).await;
            });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            settings_get,
            settings_set,
            app_about_get,
            app_data_dir_get,
            notice_send,
            db_disk_usage_get,
            request_logs_list,
            request_logs_clear_all,
            auth_login,
            auth_logout,
            auth_session_get,
            rooms_list,
            room_get,
            room_create,
            room_update,
            room_set_disponible,
            room_delete,
            reservations_list,
            reservation_estados,
            reservation_create,
            reservation_set_estado,
            reservation_confirm,
            reservation_cancel,
            reservation_delete,
            users_list,
            user_register,
            user_update,
            user_delete,
            notifications_list,
            notifications_unread_count,
            notification_mark_read,
            notifications_mark_all_read
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
