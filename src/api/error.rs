//! Usage: Typed REST error model (status mapping + defensive 400-body decoding).

use serde::Serialize;
use serde_json::Value;

/// One field of a backend validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub messages: Vec<String>,
}

/// Decoded shape of a 400 response body.
///
/// The backend reports validation failures as `{field: [messages]}` plus an
/// optional `non_field_errors` list; anything else lands in `Malformed` so a
/// broken error body never panics the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ValidationDetail {
    Fields {
        non_field: Vec<String>,
        fields: Vec<FieldError>,
    },
    Malformed,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// 401 that survived interception (bad login, or a retried call failing again).
    #[error("no autorizado")]
    Unauthorized,
    /// Refresh impossible or failed; the session has been cleared.
    #[error("sesión expirada")]
    SessionExpired,
    #[error("datos inválidos")]
    Validation(ValidationDetail),
    #[error("acceso denegado")]
    PermissionDenied,
    #[error("recurso no encontrado: {resource}")]
    NotFound { resource: String },
    #[error("error del servidor (status={status})")]
    Server { status: u16 },
    #[error("fallo de red: {0}")]
    Network(String),
    #[error("respuesta inválida: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized | Self::SessionExpired => Some(401),
            Self::Validation(_) => Some(400),
            Self::PermissionDenied => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::Server { status } => Some(*status),
            Self::Network(_) | Self::Decode(_) => None,
        }
    }

    /// `AppError` code used at the command boundary and in the request log.
    pub fn app_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "API_UNAUTHORIZED",
            Self::SessionExpired => "AUTH_RELOGIN_REQUIRED",
            Self::Validation(_) => "API_VALIDATION",
            Self::PermissionDenied => "API_FORBIDDEN",
            Self::NotFound { .. } => "API_NOT_FOUND",
            Self::Server { .. } => "API_SERVER",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Decode(_) => "API_DECODE",
        }
    }

    /// Toast text shown to the user, one line per failed call.
    pub fn human_message(&self) -> String {
        match self {
            Self::Unauthorized => "Credenciales inválidas o sesión no autorizada.".to_string(),
            Self::SessionExpired => {
                "Su sesión ha expirado. Por favor, inicie sesión nuevamente.".to_string()
            }
            Self::Validation(ValidationDetail::Fields { non_field, fields }) => {
                if !non_field.is_empty() {
                    return non_field.join(" ");
                }
                if fields.is_empty() {
                    return "Datos enviados inválidos. Revisa el formulario.".to_string();
                }
                fields
                    .iter()
                    .map(|f| format!("{}: {}", f.field, f.messages.join(" ")))
                    .collect::<Vec<_>>()
                    .join(" | ")
            }
            Self::Validation(ValidationDetail::Malformed) => {
                "Datos enviados inválidos. Revisa el formulario.".to_string()
            }
            Self::PermissionDenied => {
                "Acceso denegado. No tienes permiso para realizar esta acción.".to_string()
            }
            Self::NotFound { resource } => format!("Recurso no encontrado: {resource}"),
            Self::Server { .. } => "Error interno del servidor. Inténtalo más tarde.".to_string(),
            Self::Network(_) | Self::Decode(_) => {
                "Error desconocido en la red o el servidor.".to_string()
            }
        }
    }
}

impl From<ApiError> for crate::shared::error::AppError {
    fn from(value: ApiError) -> Self {
        crate::shared::error::AppError::new(value.app_code(), value.human_message())
    }
}

fn value_to_messages(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        other => vec![other.to_string()],
    }
}

/// Decode a 400 body into typed field errors, falling back to `Malformed`.
pub(crate) fn decode_validation_body(body: &str) -> ValidationDetail {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return ValidationDetail::Malformed;
    };

    let mut non_field = Vec::new();
    let mut fields = Vec::new();
    for (key, value) in &map {
        if key == "non_field_errors" {
            non_field = value_to_messages(value);
            continue;
        }
        let messages = value_to_messages(value);
        if messages.is_empty() {
            continue;
        }
        fields.push(FieldError {
            field: key.clone(),
            messages,
        });
    }

    if non_field.is_empty() && fields.is_empty() {
        return ValidationDetail::Malformed;
    }
    ValidationDetail::Fields { non_field, fields }
}

/// Last meaningful path segment, used for not-found messages.
pub(crate) fn resource_tail(path: &str) -> String {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
        .to_string()
}
