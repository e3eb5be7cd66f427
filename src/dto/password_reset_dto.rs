//! DTOs de recuperación de contraseña (`/password-reset-direct/*`)

use serde::{Deserialize, Serialize};

/// Duración del código cuando el backend no la informa
pub const DEFAULT_CODE_TTL_SECONDS: u32 = 60;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestCodeRequest {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RequestCodeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub expires_in_seconds: Option<u32>,
}

impl RequestCodeResponse {
    pub fn ttl_seconds(&self) -> u32 {
        self.expires_in_seconds.unwrap_or(DEFAULT_CODE_TTL_SECONDS)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VerifyCodeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub remaining_attempts: Option<u32>,
}

/// Cuerpo de `set-new-password`; sin `code` si ya fue verificado
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetNewPasswordRequest {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SetNewPasswordResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}
