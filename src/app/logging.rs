//! Usage: Logging bootstrap (env-filter console + daily rolling file sink).

use crate::infra::app_paths;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

const DEFAULT_DIRECTIVES: &str = "info,reserva_hub_lib=debug";

pub(crate) fn init<R: tauri::Runtime>(app: &tauri::AppHandle<R>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let logs_dir = match app_paths::logs_dir(app) {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("reserva-hub: file logging disabled: {err}");
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .try_init();
            return;
        }
    };

    let file_appender = tracing_appender::rolling::daily(logs_dir, "reserva-hub.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let initialized = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .is_ok();

    if initialized {
        // Route `log`-facade records from dependencies into tracing.
        let _ = tracing_log::LogTracer::init();
    }
}
