//! Usage: Authentication endpoints (login, profile fetch) and token expiry helpers.

use crate::api::client::ApiClient;
use crate::api::error::ApiError;
use crate::domain::session::{SessionCredentials, SessionSnapshot, UserProfile, UserRole};
use crate::shared::error::AppResult;
use crate::shared::security::mask_token;
use base64::Engine;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;

const TOKEN_PATH: &str = "token/";
const USER_INFO_PATH: &str = "user-info/";

#[derive(Debug, Deserialize)]
struct TokenPair {
    access: String,
    refresh: String,
}

#[derive(Debug, Deserialize)]
struct UserInfoWire {
    id: i64,
    username: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    nombre: Option<String>,
    role: String,
}

/// Decide whether the stored access token is close enough to expiry that it
/// should be renewed before use.
pub(crate) fn should_refresh_now(expires_at: Option<i64>, refresh_lead_s: i64, now_unix: i64) -> bool {
    let Some(expiry) = expires_at else {
        return false;
    };
    let lead = refresh_lead_s.max(0);
    expiry.saturating_sub(lead) <= now_unix
}

fn parse_i64_lossy(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Best-effort `exp` claim extraction from a JWT access token. Opaque tokens
/// simply yield `None` and skip the proactive-refresh path.
pub(crate) fn access_token_expires_at(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim())
        .ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp").and_then(parse_i64_lossy).filter(|v| *v > 0)
}

/// Full login flow: obtain the token pair, fetch the profile with the fresh
/// access token (it is not persisted yet), then store everything atomically.
pub(crate) async fn login(
    client: &ApiClient,
    username: &str,
    password: &str,
) -> Result<SessionSnapshot, ApiError> {
    let body = serde_json::json!({ "username": username, "password": password });
    let value = client
        .request_value(Method::POST, TOKEN_PATH, Some(body))
        .await?
        .ok_or_else(|| ApiError::Decode("empty token response".to_string()))?;
    let pair: TokenPair = serde_json::from_value(value)
        .map_err(|e| ApiError::Decode(format!("{TOKEN_PATH}: {e}")))?;

    let info = client
        .request_value_with_bearer(Method::GET, USER_INFO_PATH, None, Some(pair.access.as_str()))
        .await?
        .ok_or_else(|| ApiError::Decode("empty user-info response".to_string()))?;
    let info: UserInfoWire = serde_json::from_value(info)
        .map_err(|e| ApiError::Decode(format!("{USER_INFO_PATH}: {e}")))?;

    let creds = SessionCredentials {
        access_expires_at: access_token_expires_at(&pair.access),
        access_token: pair.access,
        refresh_token: Some(pair.refresh),
        profile: UserProfile {
            id: info.id,
            username: info.username,
            email: info.email,
            nombre: info.nombre,
            role: UserRole::parse_lossy(&info.role),
        },
    };

    if let Err(err) = client.session().save(&creds) {
        tracing::error!("failed to persist session after login: {err}");
        return Err(ApiError::Decode(format!("session not persisted: {err}")));
    }

    tracing::info!(
        username = %creds.profile.username,
        role = creds.profile.role.as_str(),
        access_token = %mask_token(&creds.access_token),
        "login succeeded"
    );

    Ok(client.session().snapshot())
}

/// Re-fetch the profile for an already-authenticated session.
pub(crate) async fn user_info(client: &ApiClient) -> Result<UserProfile, ApiError> {
    let info: UserInfoWire = client.get_json(USER_INFO_PATH).await?;
    Ok(UserProfile {
        id: info.id,
        username: info.username,
        email: info.email,
        nombre: info.nombre,
        role: UserRole::parse_lossy(&info.role),
    })
}

/// Startup check for a restored session: confirm the credentials still work
/// and refresh the cached profile (role changes included). An expired access
/// token goes through the normal interceptor path here.
pub(crate) async fn revalidate_profile(
    client: &ApiClient,
) -> Result<Option<UserProfile>, ApiError> {
    if !client.session().is_authenticated() {
        return Ok(None);
    }
    let profile = user_info(client).await?;
    if let Some(mut creds) = client.session().current() {
        creds.profile = profile.clone();
        if let Err(err) = client.session().save(&creds) {
            tracing::warn!("failed to persist revalidated profile: {err}");
        }
    }
    Ok(Some(profile))
}

/// Logout is purely local: drop the stored credentials.
pub(crate) fn logout(client: &ApiClient) -> AppResult<()> {
    client.session().clear()?;
    tracing::info!("session cleared on logout");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    fn jwt_with_exp(exp: &str) -> String {
        let header = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(b"{\"alg\":\"HS256\"}");
        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode(format!("{{\"exp\":{exp},\"user_id\":4}}").as_bytes());
        format!("{header}.{payload}.firma")
    }

    #[test]
    fn should_refresh_now_handles_unknown_expiry() {
        assert!(!should_refresh_now(None, 3600, 1000));
    }

    #[test]
    fn should_refresh_now_respects_refresh_lead_window() {
        assert!(!should_refresh_now(Some(2000), 300, 1600));
        assert!(should_refresh_now(Some(2000), 300, 1700));
        assert!(should_refresh_now(Some(2000), 300, 2200));
    }

    #[test]
    fn expires_at_reads_numeric_exp_claim() {
        assert_eq!(access_token_expires_at(&jwt_with_exp("1900000000")), Some(1_900_000_000));
    }

    #[test]
    fn expires_at_reads_string_exp_claim() {
        assert_eq!(
            access_token_expires_at(&jwt_with_exp("\"1900000000\"")),
            Some(1_900_000_000)
        );
    }

    #[test]
    fn expires_at_rejects_opaque_tokens() {
        assert_eq!(access_token_expires_at("not-a-jwt"), None);
        assert_eq!(access_token_expires_at("a.!!!!.c"), None);
    }

    #[test]
    fn expires_at_ignores_non_positive_exp() {
        assert_eq!(access_token_expires_at(&jwt_with_exp("0")), None);
    }
}
