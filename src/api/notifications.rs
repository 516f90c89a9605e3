//! Usage: Reservation notification endpoints.

use crate::api::client::ApiClient;
use crate::api::error::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub usuario: i64,
    pub reserva: i64,
    pub mensaje: String,
    #[serde(default)]
    pub leida: bool,
    #[serde(default)]
    pub creada_en: Option<String>,
}

pub(crate) async fn list(client: &ApiClient) -> Result<Vec<Notification>, ApiError> {
    client.get_json("notificaciones/").await
}

/// The unread endpoint has shipped as both `{"count": n}` and a bare list;
/// accept either.
pub(crate) async fn unread_count(client: &ApiClient) -> Result<u64, ApiError> {
    let value = client
        .request_value(reqwest::Method::GET, "notificaciones/sin-leer/", None)
        .await?
        .unwrap_or(Value::Null);

    match &value {
        Value::Array(items) => Ok(items.len() as u64),
        Value::Object(map) => map
            .get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| ApiError::Decode("unread count missing 'count'".to_string())),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| ApiError::Decode("unread count not an unsigned number".to_string())),
        _ => Err(ApiError::Decode("unexpected unread count body".to_string())),
    }
}

pub(crate) async fn mark_read(client: &ApiClient, id: i64) -> Result<(), ApiError> {
    client
        .post_empty(&format!("notificaciones/{id}/leer/"))
        .await?;
    Ok(())
}

pub(crate) async fn mark_all_read(client: &ApiClient) -> Result<(), ApiError> {
    client
        .post_empty("notificaciones/marcar-todas-leidas/")
        .await?;
    Ok(())
}
