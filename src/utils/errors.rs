//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del cliente y su
//! conversión a mensajes visibles para el usuario.

use serde_json::Value;
use thiserror::Error;

/// Mensaje genérico para fallos de red o timeouts
pub const CONNECTION_ERROR_MESSAGE: &str = "Error de conexión. Intenta nuevamente.";

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("API error {status}: {}", .detail.as_deref().unwrap_or("sin detalle"))]
    Api {
        status: u16,
        detail: Option<String>,
        body: Option<Value>,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Action already in progress for reservation {0}")]
    ActionInProgress(i64),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Token store error: {0}")]
    TokenStore(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AppError::Timeout(e.to_string())
        } else if e.is_decode() {
            AppError::InvalidState(format!("respuesta inválida: {}", e))
        } else {
            AppError::Network(e.to_string())
        }
    }
}

impl AppError {
    /// Construir un error de API a partir del status y el cuerpo JSON (si lo hay)
    pub fn from_response(status: u16, body: Option<Value>) -> Self {
        let detail = body.as_ref().and_then(extract_detail);
        AppError::Api { status, detail, body }
    }

    /// Mensaje visible para el usuario
    ///
    /// Errores de red → mensaje genérico de conexión; `detail` estructurado →
    /// tal cual; resto de errores HTTP → `fallback` de la operación.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            AppError::Network(_) | AppError::Timeout(_) => CONNECTION_ERROR_MESSAGE.to_string(),
            AppError::Api { detail: Some(detail), .. } => detail.clone(),
            AppError::Api { detail: None, .. } => fallback.to_string(),
            AppError::Validation(msg) | AppError::InvalidTransition(msg) => msg.clone(),
            AppError::ActionInProgress(_) => {
                "Ya hay una acción en curso para esta reserva".to_string()
            }
            AppError::Decode(_)
            | AppError::Config(_)
            | AppError::TokenStore(_)
            | AppError::InvalidState(_) => fallback.to_string(),
        }
    }

    /// Errores que se pueden reintentar: timeouts, caídas de conexión y HTTP 500
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::Network(_) | AppError::Timeout(_) | AppError::Api { status: 500, .. }
        )
    }

    /// Campo numérico del cuerpo de error (p. ej. `remaining_attempts`)
    pub fn body_u64(&self, field: &str) -> Option<u64> {
        match self {
            AppError::Api { body: Some(body), .. } => body.get(field).and_then(Value::as_u64),
            _ => None,
        }
    }
}

/// Extraer `detail` de un cuerpo de error del backend
///
/// Acepta `detail` como texto, como lista de errores de validación
/// (`[{ "msg": ... }]`) o un campo `message`.
pub fn extract_detail(body: &Value) -> Option<String> {
    match body.get("detail") {
        Some(Value::String(detail)) if !detail.trim().is_empty() => return Some(detail.clone()),
        Some(Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if !messages.is_empty() {
                return Some(messages.join("; "));
            }
        }
        _ => {}
    }

    body.get("message")
        .and_then(Value::as_str)
        .filter(|msg| !msg.trim().is_empty())
        .map(str::to_string)
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;
