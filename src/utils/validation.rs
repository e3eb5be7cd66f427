//! Utilidades de validación
//!
//! Reglas del lado cliente que bloquean un formulario antes de enviar
//! cualquier request: email, código de verificación, fortaleza de contraseña,
//! motivos obligatorios y calificaciones.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use validator::ValidationError;

pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const RESET_CODE_LENGTH: usize = 4;
pub const MOTIVO_OBLIGATORIO: &str = "Debes indicar el motivo de la cancelación";

lazy_static! {
    static ref SPECIAL_CHAR_REGEX: Regex = Regex::new(r#"[!@#$%^&*(),.?":{}|<>]"#)
        .expect("regex de caracteres especiales inválida");
    static ref RESET_CODE_REGEX: Regex =
        Regex::new(r"^\d{4}$").expect("regex de código inválida");
}

/// Desglose de los requisitos de contraseña (para mostrar en la UI)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PasswordChecks {
    pub length: bool,
    pub uppercase: bool,
    pub lowercase: bool,
    pub digit: bool,
    pub special: bool,
}

impl PasswordChecks {
    pub fn evaluate(password: &str) -> Self {
        Self {
            length: password.chars().count() >= PASSWORD_MIN_LENGTH,
            uppercase: password.chars().any(|c| c.is_uppercase()),
            lowercase: password.chars().any(|c| c.is_lowercase()),
            digit: password.chars().any(|c| c.is_ascii_digit()),
            special: SPECIAL_CHAR_REGEX.is_match(password),
        }
    }

    pub fn is_strong(&self) -> bool {
        self.length && self.uppercase && self.lowercase && self.digit && self.special
    }

    /// Primer requisito incumplido, en el orden en que se muestra al usuario
    pub fn first_failure(&self) -> Option<&'static str> {
        if !self.length {
            Some("La contraseña debe tener al menos 8 caracteres")
        } else if !self.uppercase {
            Some("La contraseña debe incluir al menos una mayúscula")
        } else if !self.lowercase {
            Some("La contraseña debe incluir al menos una minúscula")
        } else if !self.digit {
            Some("La contraseña debe incluir al menos un número")
        } else if !self.special {
            Some("La contraseña debe incluir al menos un carácter especial")
        } else {
            None
        }
    }
}

/// Validar fortaleza de contraseña
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let checks = PasswordChecks::evaluate(password);
    match checks.first_failure() {
        None => Ok(()),
        Some(message) => {
            let mut error = ValidationError::new("password_strength");
            error.message = Some(message.into());
            error.add_param("checks".into(), &checks);
            Err(error)
        }
    }
}

/// Validar formato de email
pub fn validate_email(value: &str) -> Result<(), ValidationError> {
    if !validator::validate_email(value.trim()) {
        let mut error = ValidationError::new("email");
        error.message = Some("Ingresa un correo electrónico válido".into());
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar código de verificación de 4 dígitos
pub fn validate_reset_code(value: &str) -> Result<(), ValidationError> {
    if !RESET_CODE_REGEX.is_match(value) {
        let mut error = ValidationError::new("reset_code");
        error.message = Some("Ingresa el código completo de 4 dígitos".into());
        error.add_param("length".into(), &RESET_CODE_LENGTH);
        return Err(error);
    }
    Ok(())
}

/// Motivo obligatorio de una cancelación
pub fn validate_motivo(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("motivo_required");
        error.message = Some(MOTIVO_OBLIGATORIO.into());
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor esté en un rango específico
pub fn validate_range<T: PartialOrd + std::fmt::Display + Serialize>(
    value: T,
    min: T,
    max: T,
) -> Result<(), ValidationError> {
    if value < min || value > max {
        let mut error = ValidationError::new("range");
        error.add_param("min".into(), &min);
        error.add_param("max".into(), &max);
        error.add_param("actual".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Puntaje de calificación (1 a 5)
pub fn validate_puntaje(puntaje: u8) -> Result<(), ValidationError> {
    validate_range(puntaje, 1, 5).map_err(|mut error| {
        error.message = Some("La calificación debe estar entre 1 y 5".into());
        error
    })
}

/// Satisfacción NPS (0 a 10)
pub fn validate_nps(nps: u8) -> Result<(), ValidationError> {
    validate_range(nps, 0, 10).map_err(|mut error| {
        error.message = Some("La satisfacción NPS debe estar entre 0 y 10".into());
        error
    })
}

/// Mensaje legible de un `ValidationError` (o el código si no tiene mensaje)
pub fn message_of(error: &ValidationError) -> String {
    error
        .message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| error.code.to_string())
}
