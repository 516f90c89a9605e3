//! Usage: Client-side form validation for rooms, reservations, and accounts.
//!
//! Mirrors what the management pages enforce before submitting, so obviously
//! broken input never reaches the backend. The backend remains authoritative;
//! its 400 responses are still decoded and surfaced field by field.

use crate::shared::error::AppResult;
use regex::Regex;
use std::sync::OnceLock;

const MAX_NOMBRE_LEN: usize = 100;
const MAX_UBICACION_LEN: usize = 100;
const MAX_TELEFONO_LEN: usize = 20;
const MIN_PASSWORD_LEN: usize = 8;
const MAX_CAPACIDAD: i64 = 10_000;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"))
}

fn fecha_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // ISO-8601 local datetime as produced by the reservation form
    // (seconds/offset optional).
    RE.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}(:\d{2})?([+-]\d{2}:\d{2}|Z)?$")
            .expect("fecha regex")
    })
}

pub(crate) fn normalize_required_text(
    field: &str,
    value: &str,
    max_len: usize,
) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("SEC_INVALID_INPUT: {field} is required").into());
    }
    if value.len() > max_len {
        return Err(format!("SEC_INVALID_INPUT: {field} must be <= {max_len} chars").into());
    }
    Ok(value.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub(crate) fn validate_nombre(nombre: &str) -> AppResult<String> {
    normalize_required_text("nombre", nombre, MAX_NOMBRE_LEN)
}

pub(crate) fn validate_ubicacion(ubicacion: Option<&str>) -> AppResult<Option<String>> {
    match normalize_optional_text(ubicacion) {
        None => Ok(None),
        Some(value) => {
            if value.len() > MAX_UBICACION_LEN {
                return Err(format!(
                    "SEC_INVALID_INPUT: ubicacion must be <= {MAX_UBICACION_LEN} chars"
                )
                .into());
            }
            Ok(Some(value))
        }
    }
}

pub(crate) fn validate_capacidad(capacidad: i64) -> AppResult<i64> {
    if capacidad < 1 {
        return Err("SEC_INVALID_INPUT: capacidad must be >= 1".into());
    }
    if capacidad > MAX_CAPACIDAD {
        return Err(format!("SEC_INVALID_INPUT: capacidad must be <= {MAX_CAPACIDAD}").into());
    }
    Ok(capacidad)
}

pub(crate) fn validate_email(email: &str) -> AppResult<String> {
    let email = email.trim();
    if email.is_empty() {
        return Err("SEC_INVALID_INPUT: email is required".into());
    }
    if !email_regex().is_match(email) {
        return Err("SEC_INVALID_INPUT: email is not a valid address".into());
    }
    Ok(email.to_string())
}

pub(crate) fn validate_optional_telefono(telefono: Option<&str>) -> AppResult<Option<String>> {
    match normalize_optional_text(telefono) {
        None => Ok(None),
        Some(value) => {
            if value.len() > MAX_TELEFONO_LEN {
                return Err(format!(
                    "SEC_INVALID_INPUT: telefono must be <= {MAX_TELEFONO_LEN} chars"
                )
                .into());
            }
            if !value
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
            {
                return Err("SEC_INVALID_INPUT: telefono contains invalid characters".into());
            }
            Ok(Some(value))
        }
    }
}

pub(crate) fn validate_fecha(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("SEC_INVALID_INPUT: {field} is required").into());
    }
    if !fecha_regex().is_match(value) {
        return Err(
            format!("SEC_INVALID_INPUT: {field} must be an ISO datetime (YYYY-MM-DDTHH:MM)").into(),
        );
    }
    Ok(value.to_string())
}

/// Both datetimes share the zero-padded ISO format, so lexicographic order is
/// chronological order.
pub(crate) fn validate_fecha_range(fecha_inicio: &str, fecha_fin: &str) -> AppResult<()> {
    if fecha_fin <= fecha_inicio {
        return Err("SEC_INVALID_INPUT: fecha_fin must be after fecha_inicio".into());
    }
    Ok(())
}

pub(crate) fn validate_username(username: &str) -> AppResult<String> {
    let username = username.trim();
    if username.is_empty() {
        return Err("SEC_INVALID_INPUT: username is required".into());
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '@' | '+'))
    {
        return Err("SEC_INVALID_INPUT: username contains invalid characters".into());
    }
    Ok(username.to_string())
}

pub(crate) fn validate_password(password: &str) -> AppResult<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(format!(
            "SEC_INVALID_INPUT: password must be at least {MIN_PASSWORD_LEN} characters"
        )
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nombre_is_trimmed_and_required() {
        assert_eq!(validate_nombre("  Sala Norte ").unwrap(), "Sala Norte");
        assert!(validate_nombre("   ").is_err());
    }

    #[test]
    fn capacidad_bounds() {
        assert_eq!(validate_capacidad(1).unwrap(), 1);
        assert!(validate_capacidad(0).is_err());
        assert!(validate_capacidad(10_001).is_err());
    }

    #[test]
    fn email_shape_is_checked() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("no-arroba").is_err());
        assert!(validate_email("a@b").is_err());
    }

    #[test]
    fn telefono_accepts_common_punctuation() {
        assert_eq!(
            validate_optional_telefono(Some("+56 9 1234-5678")).unwrap(),
            Some("+56 9 1234-5678".to_string())
        );
        assert!(validate_optional_telefono(Some("abc")).is_err());
        assert_eq!(validate_optional_telefono(Some("  ")).unwrap(), None);
        assert_eq!(validate_optional_telefono(None).unwrap(), None);
    }

    #[test]
    fn fecha_accepts_iso_variants() {
        assert!(validate_fecha("fecha_inicio", "2026-03-01T10:00").is_ok());
        assert!(validate_fecha("fecha_inicio", "2026-03-01T10:00:00").is_ok());
        assert!(validate_fecha("fecha_inicio", "2026-03-01T10:00:00Z").is_ok());
        assert!(validate_fecha("fecha_inicio", "01/03/2026").is_err());
    }

    #[test]
    fn fecha_range_must_be_forward() {
        assert!(validate_fecha_range("2026-03-01T10:00", "2026-03-01T12:00").is_ok());
        assert!(validate_fecha_range("2026-03-01T12:00", "2026-03-01T10:00").is_err());
        assert!(validate_fecha_range("2026-03-01T10:00", "2026-03-01T10:00").is_err());
    }

    #[test]
    fn password_minimum_length() {
        assert!(validate_password("corta").is_err());
        assert!(validate_password("suficientemente-larga").is_ok());
    }

    #[test]
    fn username_charset() {
        assert!(validate_username("cajero.principal").is_ok());
        assert!(validate_username("tiene espacios").is_err());
    }
}
