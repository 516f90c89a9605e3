//! Usage: User-facing notices (webview toast events + desktop notifications).

use crate::domain::session::SessionNotifier;
use tauri::Emitter;

pub(crate) const SESSION_EXPIRED_MESSAGE: &str =
    "Su sesión ha expirado. Por favor, inicie sesión nuevamente.";

pub(crate) fn notify_error<R: tauri::Runtime>(app: &tauri::AppHandle<R>, message: &str) {
    let _ = app.emit(
        "app-notice",
        serde_json::json!({ "level": "error", "message": message }),
    );
}

pub(crate) fn notify_info<R: tauri::Runtime>(app: &tauri::AppHandle<R>, message: &str) {
    let _ = app.emit(
        "app-notice",
        serde_json::json!({ "level": "info", "message": message }),
    );
}

/// Production `SessionNotifier`: toast + redirect signal for the webview and
/// a best-effort desktop notification.
pub(crate) struct TauriSessionNotifier<R: tauri::Runtime> {
    pub(crate) app: tauri::AppHandle<R>,
}

impl<R: tauri::Runtime> SessionNotifier for TauriSessionNotifier<R> {
    fn session_expired(&self) {
        notify_error(&self.app, SESSION_EXPIRED_MESSAGE);
        // The webview listens for this and navigates to the login view.
        let _ = self.app.emit("session-expired", serde_json::json!({}));

        #[cfg(desktop)]
        {
            use tauri_plugin_notification::NotificationExt;
            if let Err(err) = self
                .app
                .notification()
                .builder()
                .title("Reserva Hub")
                .body(SESSION_EXPIRED_MESSAGE)
                .show()
            {
                tracing::debug!("desktop notification failed: {err}");
            }
        }
    }
}
