//! Usage: Room ("sala") endpoints and wire types.

use crate::api::client::ApiClient;
use crate::api::error::ApiError;
use crate::domain::validation;
use crate::shared::error::AppResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub nombre: String,
    #[serde(default)]
    pub descripcion: String,
    pub capacidad: i64,
    #[serde(default)]
    pub ubicacion: String,
    pub disponible: bool,
}

/// Create/update payload; the backend assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomInput {
    pub nombre: String,
    #[serde(default)]
    pub descripcion: String,
    pub capacidad: i64,
    #[serde(default)]
    pub ubicacion: String,
    #[serde(default = "default_disponible")]
    pub disponible: bool,
}

fn default_disponible() -> bool {
    true
}

/// Form-level validation applied before the payload leaves the client.
pub(crate) fn normalize_input(input: RoomInput) -> AppResult<RoomInput> {
    Ok(RoomInput {
        nombre: validation::validate_nombre(&input.nombre)?,
        descripcion: input.descripcion.trim().to_string(),
        capacidad: validation::validate_capacidad(input.capacidad)?,
        ubicacion: validation::validate_ubicacion(Some(input.ubicacion.as_str()))?.unwrap_or_default(),
        disponible: input.disponible,
    })
}

pub(crate) async fn list(client: &ApiClient) -> Result<Vec<Room>, ApiError> {
    client.get_json("salas/").await
}

pub(crate) async fn get(client: &ApiClient, id: i64) -> Result<Room, ApiError> {
    client.get_json(&format!("salas/{id}/")).await
}

pub(crate) async fn create(client: &ApiClient, input: &RoomInput) -> Result<Room, ApiError> {
    client.post_json("salas/", input).await
}

pub(crate) async fn update(client: &ApiClient, id: i64, input: &RoomInput) -> Result<Room, ApiError> {
    client.put_json(&format!("salas/{id}/"), input).await
}

pub(crate) async fn set_disponible(
    client: &ApiClient,
    id: i64,
    disponible: bool,
) -> Result<Room, ApiError> {
    client
        .patch_json(
            &format!("salas/{id}/"),
            &serde_json::json!({ "disponible": disponible }),
        )
        .await
}

pub(crate) async fn delete(client: &ApiClient, id: i64) -> Result<(), ApiError> {
    client.delete(&format!("salas/{id}/")).await
}
