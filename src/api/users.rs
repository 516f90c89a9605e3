//! Usage: Account management endpoints (cashier registration, user CRUD).

use crate::api::client::ApiClient;
use crate::api::error::ApiError;
use crate::domain::session::UserRole;
use crate::domain::validation;
use crate::shared::error::AppResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_role")]
    pub role: UserRole,
}

fn default_true() -> bool {
    true
}

fn default_role() -> UserRole {
    UserRole::Usuario
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Partial update; absent fields are left untouched by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_write: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    #[serde(default)]
    message: Option<String>,
}

pub(crate) fn normalize_register_input(input: RegisterInput) -> AppResult<RegisterInput> {
    let username = validation::validate_username(&input.username)?;
    let email = validation::validate_email(&input.email)?;
    validation::validate_password(&input.password)?;
    Ok(RegisterInput {
        username,
        email,
        password: input.password,
    })
}

pub(crate) fn normalize_user_update(update: UserUpdate) -> AppResult<UserUpdate> {
    let username = match update.username.as_deref() {
        Some(value) => Some(validation::validate_username(value)?),
        None => None,
    };
    let email = match update.email.as_deref() {
        Some(value) => Some(validation::validate_email(value)?),
        None => None,
    };
    if let Some(password) = update.password.as_deref() {
        validation::validate_password(password)?;
    }
    Ok(UserUpdate {
        username,
        email,
        password: update.password,
        role_write: crate::domain::validation::normalize_optional_text(
            update.role_write.as_deref(),
        ),
    })
}

/// Register a cashier account. The backend assigns the `cajero` group itself.
pub(crate) async fn register(client: &ApiClient, input: &RegisterInput) -> Result<String, ApiError> {
    let response: RegisterResponse = client.post_json("register/", input).await?;
    Ok(response
        .message
        .unwrap_or_else(|| "Usuario registrado".to_string()))
}

pub(crate) async fn list(client: &ApiClient) -> Result<Vec<UserAccount>, ApiError> {
    client.get_json("users/").await
}

pub(crate) async fn update(
    client: &ApiClient,
    id: i64,
    update: &UserUpdate,
) -> Result<UserAccount, ApiError> {
    client.patch_json(&format!("users/{id}/"), update).await
}

pub(crate) async fn delete(client: &ApiClient, id: i64) -> Result<(), ApiError> {
    client.delete(&format!("users/{id}/")).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_update_serializes_only_present_fields() {
        let update = UserUpdate {
            email: Some("nuevo@example.com".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "email": "nuevo@example.com" })
        );
    }

    #[test]
    fn user_account_defaults_apply() {
        let account: UserAccount =
            serde_json::from_str(r#"{"id":3,"username":"caja1","role":"cajero"}"#).unwrap();
        assert!(account.is_active);
        assert!(!account.is_staff);
        assert_eq!(account.role, UserRole::Cajero);
    }
}
