#![allow(dead_code)]

use std::collections::HashMap;
use std::ffi::OsString;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .expect("lock test env")
}

#[derive(Default)]
struct EnvRestore {
    saved: Vec<(&'static str, Option<OsString>)>,
}

impl EnvRestore {
    fn save_once(&mut self, key: &'static str) {
        if self.saved.iter().any(|(k, _)| *k == key) {
            return;
        }
        self.saved.push((key, std::env::var_os(key)));
    }

    fn set_var(&mut self, key: &'static str, value: impl Into<OsString>) {
        self.save_once(key);
        std::env::set_var(key, value.into());
    }
}

impl Drop for EnvRestore {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..).rev() {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}

pub struct TestApp {
    _lock: MutexGuard<'static, ()>,
    _env: EnvRestore,
    #[allow(dead_code)]
    home: TempDir,
    app: tauri::App<tauri::test::MockRuntime>,
}

impl TestApp {
    pub fn new() -> Self {
        let lock = env_lock();
        let home = tempfile::tempdir().expect("tempdir");

        let mut env = EnvRestore::default();
        let home_os = home.path().as_os_str().to_os_string();

        env.set_var("HOME", home_os.clone());
        // Windows fallback env for `dirs`/tauri path resolution.
        env.set_var("USERPROFILE", home_os);

        // Ensure app data stays within the isolated HOME.
        env.set_var("RESERVA_HUB_DOTDIR_NAME", ".reserva-hub-test");

        let app = tauri::test::mock_app();

        Self {
            _lock: lock,
            _env: env,
            home,
            app,
        }
    }

    pub fn handle(&self) -> tauri::AppHandle<tauri::test::MockRuntime> {
        self.app.handle().clone()
    }

    #[allow(dead_code)]
    pub fn home_dir(&self) -> &std::path::Path {
        self.home.path()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// In-process mock of the reservation backend.
// ---------------------------------------------------------------------------

pub const MOCK_USERNAME: &str = "admin";
pub const MOCK_PASSWORD: &str = "admin123";

pub struct MockApiState {
    next_token: AtomicU64,
    pub valid_access: Mutex<String>,
    pub valid_refresh: Mutex<String>,
    pub token_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub fail_refresh: AtomicBool,
    /// When set, every bearer-authenticated call 401s even with the current
    /// token (models a server that keeps rejecting the replayed call).
    pub reject_all_bearers: AtomicBool,
    pub refresh_delay_ms: AtomicU64,
    next_id: AtomicI64,
    pub rooms: Mutex<HashMap<i64, Value>>,
    pub reservations: Mutex<HashMap<i64, Value>>,
    pub users: Mutex<HashMap<i64, Value>>,
    pub notifications: Mutex<HashMap<i64, Value>>,
}

impl MockApiState {
    fn new() -> Self {
        Self {
            next_token: AtomicU64::new(1),
            valid_access: Mutex::new("acc-0".to_string()),
            valid_refresh: Mutex::new("ref-0".to_string()),
            token_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            fail_refresh: AtomicBool::new(false),
            reject_all_bearers: AtomicBool::new(false),
            refresh_delay_ms: AtomicU64::new(0),
            next_id: AtomicI64::new(1),
            rooms: Mutex::new(HashMap::new()),
            reservations: Mutex::new(HashMap::new()),
            users: Mutex::new(HashMap::new()),
            notifications: Mutex::new(HashMap::new()),
        }
    }

    pub fn current_access(&self) -> String {
        self.valid_access.lock().unwrap().clone()
    }

    pub fn current_refresh(&self) -> String {
        self.valid_refresh.lock().unwrap().clone()
    }

    fn rotate_access(&self) -> String {
        let n = self.next_token.fetch_add(1, Ordering::SeqCst);
        let access = format!("acc-{n}");
        *self.valid_access.lock().unwrap() = access.clone();
        access
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn seed_notification(&self, reserva: i64, mensaje: &str, leida: bool) -> i64 {
        let id = self.next_id();
        self.notifications.lock().unwrap().insert(
            id,
            json!({
                "id": id,
                "usuario": 1,
                "reserva": reserva,
                "mensaje": mensaje,
                "leida": leida,
                "creada_en": "2026-03-01T09:00:00Z"
            }),
        );
        id
    }
}

fn bearer_ok(state: &MockApiState, headers: &HeaderMap) -> bool {
    if state.reject_all_bearers.load(Ordering::SeqCst) {
        return false;
    }
    let expected = format!("Bearer {}", state.current_access());
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false)
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Las credenciales de autenticación no se proveyeron." })),
    )
}

fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "No encontrado." })))
}

async fn token_handler(
    State(state): State<Arc<MockApiState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.token_calls.fetch_add(1, Ordering::SeqCst);
    let username = body.get("username").and_then(Value::as_str).unwrap_or("");
    let password = body.get("password").and_then(Value::as_str).unwrap_or("");
    if username != MOCK_USERNAME || password != MOCK_PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Usuario o contraseña incorrectos." })),
        );
    }

    let access = state.rotate_access();
    let refresh = state.current_refresh();
    (StatusCode::OK, Json(json!({ "access": access, "refresh": refresh })))
}

async fn refresh_handler(
    State(state): State<Arc<MockApiState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let delay = state.refresh_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
    }

    if state.fail_refresh.load(Ordering::SeqCst) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Token is invalid or expired", "code": "token_not_valid" })),
        );
    }

    let provided = body.get("refresh").and_then(Value::as_str).unwrap_or("");
    if provided != state.current_refresh() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Token is invalid or expired", "code": "token_not_valid" })),
        );
    }

    let access = state.rotate_access();
    (StatusCode::OK, Json(json!({ "access": access })))
}

async fn user_info_handler(
    State(state): State<Arc<MockApiState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !bearer_ok(&state, &headers) {
        return unauthorized();
    }
    (
        StatusCode::OK,
        Json(json!({
            "id": 1,
            "username": MOCK_USERNAME,
            "email": "admin@example.com",
            "role": "admin",
            "nombre": "Admin Principal"
        })),
    )
}

async fn register_handler(
    State(state): State<Arc<MockApiState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let username = body.get("username").and_then(Value::as_str).unwrap_or("");
    let duplicate = state
        .users
        .lock()
        .unwrap()
        .values()
        .any(|u| u.get("username").and_then(Value::as_str) == Some(username));
    if duplicate {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "username": ["Ya existe un usuario con ese nombre."] })),
        );
    }

    let id = state.next_id();
    state.users.lock().unwrap().insert(
        id,
        json!({
            "id": id,
            "username": username,
            "email": body.get("email").cloned().unwrap_or(Value::Null),
            "is_staff": false,
            "is_active": true,
            "role": "cajero"
        }),
    );
    (StatusCode::CREATED, Json(json!({ "message": "Usuario registrado" })))
}

async fn users_list_handler(
    State(state): State<Arc<MockApiState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !bearer_ok(&state, &headers) {
        return unauthorized();
    }
    let mut users: Vec<Value> = state.users.lock().unwrap().values().cloned().collect();
    users.sort_by_key(|u| u.get("id").and_then(Value::as_i64).unwrap_or(0));
    (StatusCode::OK, Json(Value::Array(users)))
}

async fn user_detail_handler(
    State(state): State<Arc<MockApiState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    method: axum::http::Method,
    body: Option<Json<Value>>,
) -> (StatusCode, Json<Value>) {
    if !bearer_ok(&state, &headers) {
        return unauthorized();
    }
    let mut users = state.users.lock().unwrap();
    let Some(existing) = users.get(&id).cloned() else {
        return not_found();
    };

    if method == axum::http::Method::PATCH {
        let mut updated = existing;
        if let Some(Json(Value::Object(patch))) = body {
            let obj = updated.as_object_mut().unwrap();
            for (key, value) in patch {
                if key != "password" {
                    obj.insert(key, value);
                }
            }
        }
        users.insert(id, updated.clone());
        return (StatusCode::OK, Json(updated));
    }
    if method == axum::http::Method::DELETE {
        users.remove(&id);
        return (StatusCode::NO_CONTENT, Json(Value::Null));
    }
    not_found()
}

async fn rooms_handler(
    State(state): State<Arc<MockApiState>>,
    method: axum::http::Method,
    body: Option<Json<Value>>,
) -> (StatusCode, Json<Value>) {
    if method == axum::http::Method::GET {
        let mut rooms: Vec<Value> = state.rooms.lock().unwrap().values().cloned().collect();
        rooms.sort_by_key(|r| r.get("id").and_then(Value::as_i64).unwrap_or(0));
        return (StatusCode::OK, Json(Value::Array(rooms)));
    }
    if method == axum::http::Method::POST {
        let Some(Json(mut room)) = body else {
            return (StatusCode::BAD_REQUEST, Json(json!({ "detail": "body requerido" })));
        };
        let nombre = room.get("nombre").and_then(Value::as_str).unwrap_or("");
        let duplicate = state
            .rooms
            .lock()
            .unwrap()
            .values()
            .any(|r| r.get("nombre").and_then(Value::as_str) == Some(nombre));
        if duplicate {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "non_field_errors": ["Ya existe una sala con ese nombre."] })),
            );
        }
        let id = state.next_id();
        room.as_object_mut()
            .unwrap()
            .insert("id".to_string(), json!(id));
        state.rooms.lock().unwrap().insert(id, room.clone());
        return (StatusCode::CREATED, Json(room));
    }
    not_found()
}

async fn room_detail_handler(
    State(state): State<Arc<MockApiState>>,
    Path(id): Path<i64>,
    method: axum::http::Method,
    body: Option<Json<Value>>,
) -> (StatusCode, Json<Value>) {
    let mut rooms = state.rooms.lock().unwrap();
    let Some(existing) = rooms.get(&id).cloned() else {
        return not_found();
    };

    if method == axum::http::Method::GET {
        return (StatusCode::OK, Json(existing));
    }
    if method == axum::http::Method::PUT {
        let Some(Json(mut room)) = body else {
            return (StatusCode::BAD_REQUEST, Json(json!({ "detail": "body requerido" })));
        };
        room.as_object_mut()
            .unwrap()
            .insert("id".to_string(), json!(id));
        rooms.insert(id, room.clone());
        return (StatusCode::OK, Json(room));
    }
    if method == axum::http::Method::PATCH {
        let mut updated = existing;
        if let Some(Json(Value::Object(patch))) = body {
            let obj = updated.as_object_mut().unwrap();
            for (key, value) in patch {
                obj.insert(key, value);
            }
        }
        rooms.insert(id, updated.clone());
        return (StatusCode::OK, Json(updated));
    }
    if method == axum::http::Method::DELETE {
        rooms.remove(&id);
        return (StatusCode::NO_CONTENT, Json(Value::Null));
    }
    not_found()
}

async fn estados_handler() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!([
            { "id": 7, "nombre": "Pendiente" },
            { "id": 8, "nombre": "Confirmada" },
            { "id": 9, "nombre": "Cancelada" }
        ])),
    )
}

async fn reservations_handler(
    State(state): State<Arc<MockApiState>>,
    headers: HeaderMap,
    method: axum::http::Method,
    body: Option<Json<Value>>,
) -> (StatusCode, Json<Value>) {
    // Listing is a staff view; creation is the public booking form.
    if method == axum::http::Method::GET {
        if !bearer_ok(&state, &headers) {
            return unauthorized();
        }
        let mut rows: Vec<Value> = state
            .reservations
            .lock()
            .unwrap()
            .values()
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.get("id").and_then(Value::as_i64).unwrap_or(0));
        return (StatusCode::OK, Json(Value::Array(rows)));
    }
    if method == axum::http::Method::POST {
        let Some(Json(mut reservation)) = body else {
            return (StatusCode::BAD_REQUEST, Json(json!({ "detail": "body requerido" })));
        };
        let sala = reservation.get("sala").and_then(Value::as_i64).unwrap_or(0);
        if !state.rooms.lock().unwrap().contains_key(&sala) {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "sala": ["Sala inexistente."] })),
            );
        }
        let id = state.next_id();
        let obj = reservation.as_object_mut().unwrap();
        obj.insert("id".to_string(), json!(id));
        obj.insert("estado".to_string(), json!(7));
        obj.insert("estado_display".to_string(), json!("Pendiente"));
        obj.insert("creada_en".to_string(), json!("2026-03-01T09:00:00Z"));
        state
            .reservations
            .lock()
            .unwrap()
            .insert(id, reservation.clone());
        return (StatusCode::CREATED, Json(reservation));
    }
    not_found()
}

fn set_reservation_estado(state: &MockApiState, id: i64, estado: i64, display: &str) -> Option<Value> {
    let mut rows = state.reservations.lock().unwrap();
    let row = rows.get_mut(&id)?;
    let obj = row.as_object_mut().unwrap();
    obj.insert("estado".to_string(), json!(estado));
    obj.insert("estado_display".to_string(), json!(display));
    Some(row.clone())
}

async fn reservation_detail_handler(
    State(state): State<Arc<MockApiState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    method: axum::http::Method,
    body: Option<Json<Value>>,
) -> (StatusCode, Json<Value>) {
    if !bearer_ok(&state, &headers) {
        return unauthorized();
    }

    if method == axum::http::Method::PATCH {
        let estado = body
            .as_ref()
            .and_then(|Json(b)| b.get("estado").and_then(Value::as_i64));
        let Some(estado) = estado else {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "estado": ["Este campo es requerido."] })),
            );
        };
        let display = match estado {
            7 => "Pendiente",
            8 => "Confirmada",
            9 => "Cancelada",
            _ => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "estado": ["Estado inválido."] })),
                )
            }
        };
        return match set_reservation_estado(&state, id, estado, display) {
            Some(row) => (StatusCode::OK, Json(row)),
            None => not_found(),
        };
    }
    if method == axum::http::Method::DELETE {
        if state.reservations.lock().unwrap().remove(&id).is_none() {
            return not_found();
        }
        return (StatusCode::NO_CONTENT, Json(Value::Null));
    }
    not_found()
}

async fn reservation_confirm_handler(
    State(state): State<Arc<MockApiState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !bearer_ok(&state, &headers) {
        return unauthorized();
    }
    match set_reservation_estado(&state, id, 8, "Confirmada") {
        Some(_) => (StatusCode::OK, Json(json!({ "status": "confirmada" }))),
        None => not_found(),
    }
}

async fn reservation_cancel_handler(
    State(state): State<Arc<MockApiState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !bearer_ok(&state, &headers) {
        return unauthorized();
    }
    match set_reservation_estado(&state, id, 9, "Cancelada") {
        Some(_) => (StatusCode::OK, Json(json!({ "status": "cancelada" }))),
        None => not_found(),
    }
}

async fn notifications_list_handler(
    State(state): State<Arc<MockApiState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !bearer_ok(&state, &headers) {
        return unauthorized();
    }
    let mut rows: Vec<Value> = state
        .notifications
        .lock()
        .unwrap()
        .values()
        .cloned()
        .collect();
    rows.sort_by_key(|r| r.get("id").and_then(Value::as_i64).unwrap_or(0));
    (StatusCode::OK, Json(Value::Array(rows)))
}

async fn notifications_unread_handler(
    State(state): State<Arc<MockApiState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !bearer_ok(&state, &headers) {
        return unauthorized();
    }
    let count = state
        .notifications
        .lock()
        .unwrap()
        .values()
        .filter(|n| !n.get("leida").and_then(Value::as_bool).unwrap_or(false))
        .count();
    (StatusCode::OK, Json(json!({ "count": count })))
}

async fn notification_read_handler(
    State(state): State<Arc<MockApiState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !bearer_ok(&state, &headers) {
        return unauthorized();
    }
    let mut rows = state.notifications.lock().unwrap();
    let Some(row) = rows.get_mut(&id) else {
        return not_found();
    };
    row.as_object_mut()
        .unwrap()
        .insert("leida".to_string(), json!(true));
    (StatusCode::OK, Json(json!({ "status": "leida" })))
}

async fn notifications_read_all_handler(
    State(state): State<Arc<MockApiState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !bearer_ok(&state, &headers) {
        return unauthorized();
    }
    let mut rows = state.notifications.lock().unwrap();
    for row in rows.values_mut() {
        row.as_object_mut()
            .unwrap()
            .insert("leida".to_string(), json!(true));
    }
    (StatusCode::OK, Json(json!({ "status": "todas leidas" })))
}

pub struct MockApi {
    pub base_url: String,
    pub state: Arc<MockApiState>,
}

/// Bind the mock backend on an ephemeral port; must run inside a tokio runtime.
pub async fn spawn_mock_api() -> MockApi {
    let state = Arc::new(MockApiState::new());
    let router = Router::new()
        .route("/api/token/", post(token_handler))
        .route("/api/token/refresh/", post(refresh_handler))
        .route("/api/user-info/", get(user_info_handler))
        .route("/api/register/", post(register_handler))
        .route("/api/users/", get(users_list_handler))
        .route(
            "/api/users/:id/",
            patch(user_detail_handler).delete(user_detail_handler),
        )
        .route("/api/salas/", get(rooms_handler).post(rooms_handler))
        .route(
            "/api/salas/:id/",
            get(room_detail_handler)
                .put(room_detail_handler)
                .patch(room_detail_handler)
                .delete(room_detail_handler),
        )
        .route("/api/estados/", get(estados_handler))
        .route(
            "/api/reservas/",
            get(reservations_handler).post(reservations_handler),
        )
        .route(
            "/api/reservas/:id/",
            patch(reservation_detail_handler).delete(reservation_detail_handler),
        )
        .route("/api/reservas/:id/confirmar/", post(reservation_confirm_handler))
        .route("/api/reservas/:id/cancelar/", post(reservation_cancel_handler))
        .route("/api/notificaciones/", get(notifications_list_handler))
        .route("/api/notificaciones/sin-leer/", get(notifications_unread_handler))
        .route("/api/notificaciones/:id/leer/", post(notification_read_handler))
        .route(
            "/api/notificaciones/marcar-todas-leidas/",
            post(notifications_read_all_handler),
        )
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock api");
    let addr = listener.local_addr().expect("mock api addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve mock api");
    });

    MockApi {
        base_url: format!("http://{addr}/api/"),
        state,
    }
}
