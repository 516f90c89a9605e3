//! Usage: Reservation ("reserva") endpoints, status catalog, and wire types.

use crate::api::client::ApiClient;
use crate::api::error::{ApiError, ValidationDetail};
use crate::domain::validation;
use crate::shared::error::AppResult;
use serde::{Deserialize, Serialize};

pub const ESTADO_PENDIENTE: &str = "PENDIENTE";

/// Backend status catalog row (`estados/`). Status ids are per-install, so
/// they are resolved through this catalog instead of being hardcoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstadoReserva {
    pub id: i64,
    pub nombre: String,
}

/// The `estado` field arrives in whatever shape the backend serializer was
/// configured with: a bare id, a nested `{id, nombre}` object, or a name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EstadoValue {
    Obj { id: Option<i64>, nombre: String },
    Id(i64),
    Nombre(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    pub sala: i64,
    #[serde(default)]
    pub usuario: Option<i64>,
    #[serde(default)]
    pub estado: Option<EstadoValue>,
    #[serde(default)]
    pub estado_display: Option<String>,
    pub fecha_inicio: String,
    pub fecha_fin: String,
    #[serde(default)]
    pub solicitante_nombre: String,
    #[serde(default)]
    pub solicitante_email: String,
    #[serde(default)]
    pub solicitante_telefono: String,
    #[serde(default)]
    pub creada_en: Option<String>,
}

impl Reservation {
    /// Resolve the display name of the status; a missing status means the
    /// reservation is still pending.
    pub fn display_estado(&self, catalog: &[EstadoReserva]) -> String {
        if let Some(display) = self
            .estado_display
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return display.to_uppercase();
        }

        match &self.estado {
            None => ESTADO_PENDIENTE.to_string(),
            Some(EstadoValue::Obj { nombre, .. }) => nombre.to_uppercase(),
            Some(EstadoValue::Nombre(nombre)) => nombre.to_uppercase(),
            Some(EstadoValue::Id(id)) => catalog
                .iter()
                .find(|e| e.id == *id)
                .map(|e| e.nombre.to_uppercase())
                .unwrap_or_else(|| format!("ID: {id}")),
        }
    }
}

/// Public booking request payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationInput {
    pub sala: i64,
    pub fecha_inicio: String,
    pub fecha_fin: String,
    #[serde(default)]
    pub solicitante_nombre: String,
    #[serde(default)]
    pub solicitante_email: String,
    #[serde(default)]
    pub solicitante_telefono: String,
}

/// Form-level validation for the public booking request.
pub(crate) fn normalize_input(input: ReservationInput) -> AppResult<ReservationInput> {
    let fecha_inicio = validation::validate_fecha("fecha_inicio", &input.fecha_inicio)?;
    let fecha_fin = validation::validate_fecha("fecha_fin", &input.fecha_fin)?;
    validation::validate_fecha_range(&fecha_inicio, &fecha_fin)?;

    if input.sala < 1 {
        return Err("SEC_INVALID_INPUT: sala is required".into());
    }

    Ok(ReservationInput {
        sala: input.sala,
        fecha_inicio,
        fecha_fin,
        solicitante_nombre: validation::validate_nombre(&input.solicitante_nombre)?,
        solicitante_email: validation::validate_email(&input.solicitante_email)?,
        solicitante_telefono: validation::validate_optional_telefono(Some(
            input.solicitante_telefono.as_str(),
        ))?
        .unwrap_or_default(),
    })
}

/// Management list row: the wire reservation plus the status name resolved
/// through the catalog, ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationRow {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub estado_nombre: String,
}

pub(crate) async fn list(client: &ApiClient) -> Result<Vec<Reservation>, ApiError> {
    client.get_json("reservas/").await
}

pub(crate) async fn list_with_estados(
    client: &ApiClient,
) -> Result<Vec<ReservationRow>, ApiError> {
    let catalog = estados(client).await?;
    let rows = list(client).await?;
    Ok(rows
        .into_iter()
        .map(|reservation| {
            let estado_nombre = reservation.display_estado(&catalog);
            ReservationRow {
                reservation,
                estado_nombre,
            }
        })
        .collect())
}

pub(crate) async fn create(
    client: &ApiClient,
    input: &ReservationInput,
) -> Result<Reservation, ApiError> {
    client.post_json("reservas/", input).await
}

pub(crate) async fn estados(client: &ApiClient) -> Result<Vec<EstadoReserva>, ApiError> {
    client.get_json("estados/").await
}

/// Generic status update (the authoritative path for the management UI).
pub(crate) async fn set_estado(
    client: &ApiClient,
    id: i64,
    estado_id: i64,
) -> Result<Reservation, ApiError> {
    client
        .patch_json(
            &format!("reservas/{id}/"),
            &serde_json::json!({ "estado": estado_id }),
        )
        .await
}

/// Dedicated action endpoint; kept alongside the generic update because the
/// backend grants it to non-staff integrations.
pub(crate) async fn confirm(client: &ApiClient, id: i64) -> Result<(), ApiError> {
    client
        .post_empty(&format!("reservas/{id}/confirmar/"))
        .await?;
    Ok(())
}

pub(crate) async fn cancel(client: &ApiClient, id: i64) -> Result<(), ApiError> {
    client
        .post_empty(&format!("reservas/{id}/cancelar/"))
        .await?;
    Ok(())
}

pub(crate) async fn delete(client: &ApiClient, id: i64) -> Result<(), ApiError> {
    client.delete(&format!("reservas/{id}/")).await
}

/// Find the catalog id for a status name (case-insensitive).
pub(crate) fn estado_id_by_nombre(catalog: &[EstadoReserva], nombre: &str) -> Option<i64> {
    catalog
        .iter()
        .find(|e| e.nombre.eq_ignore_ascii_case(nombre.trim()))
        .map(|e| e.id)
}

/// Resolve a status name through the backend catalog and apply the generic
/// update. An unknown name is a client-side validation failure.
pub(crate) async fn set_estado_by_nombre(
    client: &ApiClient,
    id: i64,
    nombre: &str,
) -> Result<Reservation, ApiError> {
    let catalog = estados(client).await?;
    let Some(estado_id) = estado_id_by_nombre(&catalog, nombre) else {
        return Err(ApiError::Validation(ValidationDetail::Fields {
            non_field: vec![format!("Estado desconocido: {nombre}")],
            fields: Vec::new(),
        }));
    };
    set_estado(client, id, estado_id).await
}
