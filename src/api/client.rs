//! Usage: REST client for the reservation backend (bearer injection + 401 interception).
//!
//! Every outbound call goes through `request_value`. A 401 on a non-token
//! endpoint triggers a single token refresh; concurrent 401s share one
//! refresh network call and wait on oneshot channels until it settles.

use crate::api::auth::{access_token_expires_at, should_refresh_now};
use crate::api::error::{decode_validation_body, resource_tail, ApiError};
use crate::domain::session::{SessionNotifier, SessionStore};
use crate::infra::db::Db;
use crate::infra::request_log::{self, ApiRequestLogEntry};
use crate::shared::blocking;
use crate::shared::error::AppResult;
use crate::shared::mutex_ext::MutexExt;
use crate::shared::security::mask_token;
use crate::shared::time::now_unix_seconds;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

const REFRESH_PATH: &str = "token/refresh/";

/// Calls against the token endpoints are never intercepted, whatever their
/// status; a refresh loop against the refresh endpoint itself is impossible.
fn is_token_path(path: &str) -> bool {
    path.starts_with("token/")
}

#[derive(Debug, Clone)]
struct RefreshedToken {
    access: String,
    /// Present only when the backend rotates the refresh token.
    refresh: Option<String>,
}

#[derive(Default)]
struct RefreshFlight {
    in_flight: bool,
    waiters: Vec<oneshot::Sender<Result<String, ApiError>>>,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    db: Db,
    session: Arc<SessionStore>,
    notifier: Arc<dyn SessionNotifier>,
    refresh_lead_s: i64,
    refresh: Mutex<RefreshFlight>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        request_timeout: Duration,
        refresh_lead_s: i64,
        db: Db,
        session: Arc<SessionStore>,
        notifier: Arc<dyn SessionNotifier>,
    ) -> AppResult<Self> {
        let base_url = crate::infra::settings::normalize_base_url(base_url)?;
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| format!("SYSTEM_ERROR: failed to build http client: {e}"))?;

        Ok(Self {
            http,
            base_url,
            db,
            session,
            notifier,
            refresh_lead_s: refresh_lead_s.max(0),
            refresh: Mutex::new(RefreshFlight::default()),
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -- transport --------------------------------------------------------

    async fn send_raw(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
        bearer: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method.clone(), &url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    /// Issue one call through the interceptor and return its decoded JSON
    /// body (None for empty/204 responses).
    pub(crate) async fn request_value(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<Value>, ApiError> {
        let started = Instant::now();
        let mut retried = false;
        let mut refreshed = false;
        let result = self
            .request_value_inner(&method, path, body.as_ref(), &mut retried, &mut refreshed)
            .await;

        self.log_call(&method, path, &result, started, retried, refreshed)
            .await;
        result.map(|(_, value)| value)
    }

    async fn request_value_inner(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
        retried: &mut bool,
        refreshed: &mut bool,
    ) -> Result<(u16, Option<Value>), ApiError> {
        let mut bearer = None;
        if !is_token_path(path) {
            if let Some(creds) = self.session.current() {
                if should_refresh_now(
                    creds.access_expires_at,
                    self.refresh_lead_s,
                    now_unix_seconds(),
                ) {
                    // Near expiry: refresh ahead of the call through the same
                    // single-flight coordinator the 401 path uses.
                    *refreshed = true;
                    bearer = Some(self.refresh_access_token().await?);
                } else {
                    bearer = Some(creds.access_token);
                }
            }
        }

        let response = self
            .send_raw(method, path, body, bearer.as_deref())
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED && !*retried && !is_token_path(path) {
            // Mark before reattempting: a second 401 on the replay is final.
            *retried = true;
            *refreshed = true;
            tracing::debug!(method = %method, path, "401 received; attempting token refresh");
            let token = self.refresh_access_token().await?;
            let response = self.send_raw(method, path, body, Some(token.as_str())).await?;
            return decode_response(response, path).await;
        }

        decode_response(response, path).await
    }

    /// Bypass the session store entirely; used during login, when the fresh
    /// token pair exists but has not been persisted yet.
    pub(crate) async fn request_value_with_bearer(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> Result<Option<Value>, ApiError> {
        let started = Instant::now();
        let result = async {
            let response = self.send_raw(&method, path, body.as_ref(), bearer).await?;
            decode_response(response, path).await
        }
        .await;
        self.log_call(&method, path, &result, started, false, false)
            .await;
        result.map(|(_, value)| value)
    }

    // -- refresh coordination ---------------------------------------------

    /// Single-flight token refresh. The first caller becomes the coordinator
    /// and performs the network call; every concurrent caller parks on a
    /// oneshot waiter that is settled (FIFO) when the refresh resolves.
    async fn refresh_access_token(&self) -> Result<String, ApiError> {
        let waiter = {
            let mut flight = self.refresh.lock_or_recover();
            if flight.in_flight {
                let (tx, rx) = oneshot::channel();
                flight.waiters.push(tx);
                Some(rx)
            } else {
                flight.in_flight = true;
                None
            }
        };

        if let Some(rx) = waiter {
            return match rx.await {
                Ok(outcome) => outcome,
                // Coordinator dropped without settling; treat as expired.
                Err(_) => Err(ApiError::SessionExpired),
            };
        }

        let outcome = self.run_refresh().await;

        let waiters = {
            let mut flight = self.refresh.lock_or_recover();
            flight.in_flight = false;
            std::mem::take(&mut flight.waiters)
        };
        for tx in waiters {
            let _ = tx.send(outcome.clone());
        }

        outcome
    }

    async fn run_refresh(&self) -> Result<String, ApiError> {
        let refresh_token = self
            .session
            .current()
            .and_then(|creds| creds.refresh_token);

        let Some(refresh_token) = refresh_token else {
            // No refresh credential: expire locally, no network call.
            self.expire_session("refresh token missing");
            return Err(ApiError::SessionExpired);
        };

        match self.call_refresh_endpoint(&refresh_token).await {
            Ok(tokens) => {
                let expires_at = access_token_expires_at(&tokens.access);
                if let Err(err) = self.session.update_access_token(
                    &tokens.access,
                    expires_at,
                    tokens.refresh.as_deref(),
                ) {
                    // Memory already holds the new token; disk persistence is
                    // best-effort and retried on the next overwrite.
                    tracing::warn!("failed to persist refreshed token: {err}");
                }
                tracing::info!(
                    access_token = %mask_token(&tokens.access),
                    expires_at = expires_at,
                    "access token refreshed"
                );
                Ok(tokens.access)
            }
            Err(err) => {
                tracing::warn!("token refresh failed: {err}");
                self.expire_session("refresh rejected by backend");
                Err(ApiError::SessionExpired)
            }
        }
    }

    async fn call_refresh_endpoint(&self, refresh_token: &str) -> Result<RefreshedToken, ApiError> {
        let body = serde_json::json!({ "refresh": refresh_token });
        let response = self
            .send_raw(&Method::POST, REFRESH_PATH, Some(&body), None)
            .await?;
        let (_, value) = decode_response(response, REFRESH_PATH).await?;
        let value =
            value.ok_or_else(|| ApiError::Decode("empty refresh response".to_string()))?;

        let access = value
            .get("access")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::Decode("refresh response missing access".to_string()))?
            .to_string();
        let refresh = value
            .get("refresh")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        Ok(RefreshedToken { access, refresh })
    }

    fn expire_session(&self, reason: &str) {
        // Nothing to expire (and nothing to announce) once the session is gone.
        if self.session.current().is_none() {
            return;
        }
        tracing::warn!(reason, "session expired; clearing stored credentials");
        if let Err(err) = self.session.clear() {
            tracing::warn!("failed to clear session store: {err}");
        }
        self.notifier.session_expired();
    }

    // -- request log -------------------------------------------------------

    async fn log_call(
        &self,
        method: &Method,
        path: &str,
        result: &Result<(u16, Option<Value>), ApiError>,
        started: Instant,
        retried: bool,
        refreshed: bool,
    ) {
        let (status, error_code) = match result {
            Ok((status, _)) => (Some(*status), None),
            Err(err) => (err.status(), Some(err.app_code().to_string())),
        };
        let entry = ApiRequestLogEntry {
            method: method.to_string(),
            path: path.to_string(),
            status,
            error_code,
            duration_ms: started.elapsed().as_millis() as i64,
            retried,
            refreshed,
        };
        let db = self.db.clone();
        if let Err(err) =
            blocking::run("api_request_log", move || request_log::insert(&db, &entry)).await
        {
            tracing::warn!("failed to write api request log: {err}");
        }
    }

    // -- typed helpers -----------------------------------------------------

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let value = self
            .request_value(Method::GET, path, None)
            .await?
            .unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| ApiError::Decode(format!("{path}: {e}")))
    }

    pub(crate) async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::Decode(format!("{path}: failed to encode body: {e}")))?;
        let value = self
            .request_value(Method::POST, path, Some(body))
            .await?
            .unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| ApiError::Decode(format!("{path}: {e}")))
    }

    pub(crate) async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::Decode(format!("{path}: failed to encode body: {e}")))?;
        let value = self
            .request_value(Method::PUT, path, Some(body))
            .await?
            .unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| ApiError::Decode(format!("{path}: {e}")))
    }

    pub(crate) async fn patch_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::Decode(format!("{path}: failed to encode body: {e}")))?;
        let value = self
            .request_value(Method::PATCH, path, Some(body))
            .await?
            .unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| ApiError::Decode(format!("{path}: {e}")))
    }

    /// POST with no payload (action endpoints like `confirmar`/`cancelar`).
    pub(crate) async fn post_empty(&self, path: &str) -> Result<Option<Value>, ApiError> {
        self.request_value(Method::POST, path, None).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.request_value(Method::DELETE, path, None).await?;
        Ok(())
    }
}

async fn decode_response(
    response: reqwest::Response,
    path: &str,
) -> Result<(u16, Option<Value>), ApiError> {
    let status = response.status();

    if status.is_success() {
        if status == StatusCode::NO_CONTENT {
            return Ok((status.as_u16(), None));
        }
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok((status.as_u16(), None));
        }
        return serde_json::from_str(&text)
            .map(|value| (status.as_u16(), Some(value)))
            .map_err(|e| ApiError::Decode(format!("{path}: invalid json body: {e}")));
    }

    let body = response.text().await.unwrap_or_default();
    let err = match status.as_u16() {
        400 => ApiError::Validation(decode_validation_body(&body)),
        401 => ApiError::Unauthorized,
        403 => ApiError::PermissionDenied,
        404 => ApiError::NotFound {
            resource: resource_tail(path),
        },
        s => ApiError::Server { status: s },
    };
    tracing::debug!(path, status = status.as_u16(), "api call failed");
    Err(err)
}
