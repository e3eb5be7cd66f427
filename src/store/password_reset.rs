//! Asistente de recuperación de contraseña
//!
//! Máquina de estados `Email → Code → NewPassword → Success`. Cada paso se
//! divide en `submit_*`, que valida y devuelve el request a enviar, y
//! `on_*`, que aplica la respuesta del backend. La cuenta atrás del código
//! es solo un gate de UX; el servidor decide la expiración real.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::dto::password_reset_dto::{
    RequestCodeRequest, RequestCodeResponse, SetNewPasswordRequest, SetNewPasswordResponse,
    VerifyCodeRequest, VerifyCodeResponse,
};
use crate::utils::errors::{AppError, AppResult};
use crate::utils::validation::{
    message_of, validate_email, validate_password_strength, validate_reset_code, PasswordChecks,
    RESET_CODE_LENGTH,
};

pub const MAX_VERIFY_ATTEMPTS: u32 = 3;
pub const CODE_EXPIRED: &str = "El código ha expirado. Solicita uno nuevo.";
pub const ATTEMPTS_EXHAUSTED: &str = "Has agotado los intentos. Solicita un nuevo código.";
pub const PASSWORDS_DONT_MATCH: &str = "Las contraseñas no coinciden";
const REQUEST_FALLBACK: &str = "No se pudo enviar el código";
const VERIFY_FALLBACK: &str = "Código incorrecto";
const SET_PASSWORD_FALLBACK: &str = "No se pudo actualizar la contraseña";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PasoReset {
    Email,
    Code,
    NewPassword,
    Success,
}

/// Cuenta atrás del código; `Verified` la congela
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CodeCountdown {
    Running(u32),
    Verified,
}

impl CodeCountdown {
    pub fn is_expired(&self) -> bool {
        matches!(self, CodeCountdown::Running(0))
    }

    pub fn remaining(&self) -> Option<u32> {
        match self {
            CodeCountdown::Running(seconds) => Some(*seconds),
            CodeCountdown::Verified => None,
        }
    }
}

#[derive(Clone)]
pub struct PasswordResetWizard {
    paso: PasoReset,
    email: String,
    code: String,
    verified_code: Option<String>,
    new_password: String,
    confirm_password: String,
    countdown: CodeCountdown,
    remaining_attempts: u32,
    loading: bool,
    error: Option<String>,
    message: Option<String>,
}

impl fmt::Debug for PasswordResetWizard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordResetWizard")
            .field("paso", &self.paso)
            .field("email", &self.email)
            .field("code_verified", &self.code_verified())
            .field("countdown", &self.countdown)
            .field("remaining_attempts", &self.remaining_attempts)
            .field("loading", &self.loading)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl Default for PasswordResetWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordResetWizard {
    pub fn new() -> Self {
        Self {
            paso: PasoReset::Email,
            email: String::new(),
            code: String::new(),
            verified_code: None,
            new_password: String::new(),
            confirm_password: String::new(),
            countdown: CodeCountdown::Running(0),
            remaining_attempts: MAX_VERIFY_ATTEMPTS,
            loading: false,
            error: None,
            message: None,
        }
    }

    pub fn paso(&self) -> PasoReset {
        self.paso
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn countdown(&self) -> CodeCountdown {
        self.countdown
    }

    pub fn remaining_attempts(&self) -> u32 {
        self.remaining_attempts
    }

    pub fn code_verified(&self) -> bool {
        self.verified_code.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn password_checks(&self) -> PasswordChecks {
        PasswordChecks::evaluate(&self.new_password)
    }

    pub fn set_email(&mut self, email: &str) {
        self.email = email.trim().to_string();
    }

    /// Solo dígitos, hasta 4. Cambiar un código ya verificado obliga a
    /// verificarlo de nuevo.
    pub fn set_code(&mut self, raw: &str) {
        let code: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit())
            .take(RESET_CODE_LENGTH)
            .collect();

        if let Some(verified) = &self.verified_code {
            if *verified != code {
                debug!("🔢 Código editado tras la verificación");
                self.verified_code = None;
                self.countdown = CodeCountdown::Running(0);
            }
        }
        self.code = code;
    }

    pub fn set_passwords(&mut self, new_password: &str, confirm_password: &str) {
        self.new_password = new_password.to_string();
        self.confirm_password = confirm_password.to_string();
    }

    fn fail(&mut self, message: impl Into<String>) -> AppError {
        let message = message.into();
        self.error = Some(message.clone());
        AppError::Validation(message)
    }

    fn ensure(&self, paso: PasoReset) -> AppResult<()> {
        if self.paso != paso {
            return Err(AppError::InvalidState(format!(
                "Paso actual {:?}, se esperaba {:?}",
                self.paso, paso
            )));
        }
        if self.loading {
            return Err(AppError::InvalidState("Ya hay una solicitud en curso".to_string()));
        }
        Ok(())
    }

    /// Email → request de código
    pub fn submit_email(&mut self) -> AppResult<RequestCodeRequest> {
        self.ensure(PasoReset::Email)?;
        if let Err(e) = validate_email(&self.email) {
            return Err(self.fail(message_of(&e)));
        }
        self.loading = true;
        self.error = None;
        Ok(RequestCodeRequest {
            email: self.email.clone(),
        })
    }

    /// Respuesta a la solicitud (o reenvío) de código
    pub fn on_code_requested(&mut self, result: AppResult<RequestCodeResponse>) {
        self.loading = false;
        match result {
            Ok(response) if response.success => {
                let ttl = response.ttl_seconds();
                info!("📧 Código enviado, expira en {}s", ttl);
                self.paso = PasoReset::Code;
                self.code.clear();
                self.verified_code = None;
                self.countdown = CodeCountdown::Running(ttl);
                self.remaining_attempts = MAX_VERIFY_ATTEMPTS;
                self.error = None;
                self.message = Some(
                    response
                        .message
                        .unwrap_or_else(|| "Código enviado a tu correo".to_string()),
                );
            }
            Ok(response) => {
                self.error = Some(response.message.unwrap_or_else(|| REQUEST_FALLBACK.to_string()));
            }
            Err(e) => self.error = Some(e.user_message(REQUEST_FALLBACK)),
        }
    }

    /// Code → request de verificación
    ///
    /// `Ok(None)` cuando el código ya estaba verificado: se avanza sin red.
    pub fn submit_code(&mut self) -> AppResult<Option<VerifyCodeRequest>> {
        self.ensure(PasoReset::Code)?;
        if let Err(e) = validate_reset_code(&self.code) {
            return Err(self.fail(message_of(&e)));
        }

        if self.verified_code.as_deref() == Some(self.code.as_str()) {
            self.paso = PasoReset::NewPassword;
            self.error = None;
            return Ok(None);
        }
        if self.countdown.is_expired() {
            return Err(self.fail(CODE_EXPIRED));
        }
        if self.remaining_attempts == 0 {
            return Err(self.fail(ATTEMPTS_EXHAUSTED));
        }

        self.loading = true;
        self.error = None;
        Ok(Some(VerifyCodeRequest {
            email: self.email.clone(),
            code: self.code.clone(),
        }))
    }

    pub fn on_code_verified(&mut self, result: AppResult<VerifyCodeResponse>) {
        self.loading = false;
        match result {
            Ok(response) if response.success => {
                info!("✅ Código verificado");
                self.verified_code = Some(self.code.clone());
                self.countdown = CodeCountdown::Verified;
                self.paso = PasoReset::NewPassword;
                self.error = None;
                self.message = response.message;
            }
            Ok(response) => {
                self.remaining_attempts = response
                    .remaining_attempts
                    .unwrap_or_else(|| self.remaining_attempts.saturating_sub(1));
                let message = response.message.unwrap_or_else(|| VERIFY_FALLBACK.to_string());
                self.error = Some(self.with_attempts(message));
            }
            Err(e @ AppError::Api { .. }) => {
                self.remaining_attempts = e
                    .body_u64("remaining_attempts")
                    .map(|n| n.min(u64::from(MAX_VERIFY_ATTEMPTS)) as u32)
                    .unwrap_or_else(|| self.remaining_attempts.saturating_sub(1));
                let message = e.user_message(VERIFY_FALLBACK);
                self.error = Some(self.with_attempts(message));
            }
            // sin respuesta del servidor no se consume ningún intento
            Err(e) => self.error = Some(e.user_message(VERIFY_FALLBACK)),
        }
    }

    fn with_attempts(&self, message: String) -> String {
        format!("{} (intentos restantes: {})", message, self.remaining_attempts)
    }

    /// NewPassword → request de cambio de contraseña
    pub fn submit_password(&mut self) -> AppResult<SetNewPasswordRequest> {
        self.ensure(PasoReset::NewPassword)?;
        if self.new_password != self.confirm_password {
            return Err(self.fail(PASSWORDS_DONT_MATCH));
        }
        if let Err(e) = validate_password_strength(&self.new_password) {
            return Err(self.fail(message_of(&e)));
        }

        self.loading = true;
        self.error = None;
        Ok(SetNewPasswordRequest {
            email: self.email.clone(),
            code: match self.verified_code {
                Some(_) => None,
                None => Some(self.code.clone()),
            },
            new_password: self.new_password.clone(),
            confirm_password: self.confirm_password.clone(),
        })
    }

    pub fn on_password_set(&mut self, result: AppResult<SetNewPasswordResponse>) {
        self.loading = false;
        match result {
            Ok(response) if response.success => {
                info!("🔐 Contraseña actualizada");
                self.paso = PasoReset::Success;
                self.new_password.clear();
                self.confirm_password.clear();
                self.error = None;
                self.message = Some(
                    response
                        .message
                        .unwrap_or_else(|| "Contraseña actualizada correctamente".to_string()),
                );
            }
            Ok(response) => {
                self.error =
                    Some(response.message.unwrap_or_else(|| SET_PASSWORD_FALLBACK.to_string()));
            }
            Err(e) => self.error = Some(e.user_message(SET_PASSWORD_FALLBACK)),
        }
    }

    /// Reenviar el código (solo en el paso Code)
    pub fn resend(&mut self) -> AppResult<RequestCodeRequest> {
        self.ensure(PasoReset::Code)?;
        self.loading = true;
        self.error = None;
        Ok(RequestCodeRequest {
            email: self.email.clone(),
        })
    }

    /// Volver al paso anterior
    pub fn back(&mut self) -> bool {
        if self.loading {
            return false;
        }
        let previous = match self.paso {
            PasoReset::NewPassword => PasoReset::Code,
            PasoReset::Code => PasoReset::Email,
            PasoReset::Email | PasoReset::Success => return false,
        };
        self.paso = previous;
        self.error = None;
        true
    }

    /// La cuenta atrás solo corre en Code y sin código verificado
    pub fn should_tick(&self) -> bool {
        self.paso == PasoReset::Code && matches!(self.countdown, CodeCountdown::Running(n) if n > 0)
    }

    /// Avanzar un segundo. Devuelve si debe seguir corriendo.
    pub fn tick(&mut self) -> bool {
        if self.should_tick() {
            if let CodeCountdown::Running(seconds) = self.countdown {
                self.countdown = CodeCountdown::Running(seconds - 1);
            }
        }
        self.should_tick()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_sent(ttl: Option<u32>) -> AppResult<RequestCodeResponse> {
        Ok(RequestCodeResponse {
            success: true,
            message: None,
            expires_in_seconds: ttl,
        })
    }

    fn verified() -> AppResult<VerifyCodeResponse> {
        Ok(VerifyCodeResponse {
            success: true,
            message: None,
            remaining_attempts: None,
        })
    }

    fn wizard_in_code_step(ttl: u32) -> PasswordResetWizard {
        let mut wizard = PasswordResetWizard::new();
        wizard.set_email("ana@example.com");
        wizard.submit_email().unwrap();
        wizard.on_code_requested(code_sent(Some(ttl)));
        wizard
    }

    #[test]
    fn test_email_step() {
        let mut wizard = PasswordResetWizard::new();
        wizard.set_email("no-es-email");
        assert!(wizard.submit_email().is_err());
        assert_eq!(wizard.error(), Some("Ingresa un correo electrónico válido"));

        wizard.set_email(" ana@example.com ");
        let request = wizard.submit_email().unwrap();
        assert_eq!(request.email, "ana@example.com");
        assert!(wizard.is_loading());

        wizard.on_code_requested(code_sent(None));
        assert_eq!(wizard.paso(), PasoReset::Code);
        assert_eq!(wizard.countdown(), CodeCountdown::Running(60));
        assert_eq!(wizard.remaining_attempts(), 3);
    }

    #[test]
    fn test_request_failure_stays_in_email() {
        let mut wizard = PasswordResetWizard::new();
        wizard.set_email("ana@example.com");
        wizard.submit_email().unwrap();
        wizard.on_code_requested(Err(AppError::Network("connection refused".into())));

        assert_eq!(wizard.paso(), PasoReset::Email);
        assert_eq!(wizard.error(), Some("Error de conexión. Intenta nuevamente."));
        assert!(!wizard.is_loading());
    }

    #[test]
    fn test_code_filtering() {
        let mut wizard = wizard_in_code_step(60);
        wizard.set_code("1a2-345");
        assert_eq!(wizard.code(), "1234");

        wizard.set_code("12");
        assert!(wizard.submit_code().is_err());
        assert_eq!(wizard.error(), Some("Ingresa el código completo de 4 dígitos"));
    }

    #[test]
    fn test_expired_code_is_refused() {
        let mut wizard = wizard_in_code_step(2);
        wizard.set_code("1234");
        assert!(wizard.tick());
        assert!(!wizard.tick());
        assert!(wizard.countdown().is_expired());

        let err = wizard.submit_code().unwrap_err();
        assert_eq!(err.to_string(), format!("Validation error: {}", CODE_EXPIRED));
        assert!(!wizard.is_loading());
        assert_eq!(wizard.paso(), PasoReset::Code);
    }

    #[test]
    fn test_verified_code_survives_back_navigation() {
        let mut wizard = wizard_in_code_step(1);
        wizard.set_code("1234");
        assert!(wizard.submit_code().unwrap().is_some());
        wizard.on_code_verified(verified());

        assert_eq!(wizard.paso(), PasoReset::NewPassword);
        assert_eq!(wizard.countdown(), CodeCountdown::Verified);
        assert!(!wizard.tick());

        assert!(wizard.back());
        assert_eq!(wizard.paso(), PasoReset::Code);
        assert!(!wizard.should_tick());
        assert!(wizard.submit_code().unwrap().is_none());
        assert_eq!(wizard.paso(), PasoReset::NewPassword);
    }

    #[test]
    fn test_editing_verified_code_requires_new_verification() {
        let mut wizard = wizard_in_code_step(60);
        wizard.set_code("1234");
        wizard.submit_code().unwrap();
        wizard.on_code_verified(verified());
        wizard.back();

        wizard.set_code("4321");
        assert!(!wizard.code_verified());
        assert!(wizard.submit_code().is_err());
        assert_eq!(wizard.error(), Some(CODE_EXPIRED));
    }

    #[test]
    fn test_failed_verification_updates_attempts() {
        let mut wizard = wizard_in_code_step(60);
        wizard.set_code("0000");
        wizard.submit_code().unwrap();
        wizard.on_code_verified(Ok(VerifyCodeResponse {
            success: false,
            message: Some("Código inválido".into()),
            remaining_attempts: Some(2),
        }));
        assert_eq!(wizard.remaining_attempts(), 2);
        assert_eq!(wizard.error(), Some("Código inválido (intentos restantes: 2)"));

        wizard.submit_code().unwrap();
        wizard.on_code_verified(Err(AppError::from_response(
            400,
            Some(serde_json::json!({ "detail": "Código inválido", "remaining_attempts": 1 })),
        )));
        assert_eq!(wizard.remaining_attempts(), 1);

        wizard.submit_code().unwrap();
        wizard.on_code_verified(Err(AppError::from_response(400, None)));
        assert_eq!(wizard.remaining_attempts(), 0);
        assert_eq!(wizard.submit_code().unwrap_err().to_string(), format!("Validation error: {}", ATTEMPTS_EXHAUSTED));
    }

    #[test]
    fn test_password_step() {
        let mut wizard = wizard_in_code_step(60);
        wizard.set_code("1234");
        wizard.submit_code().unwrap();
        wizard.on_code_verified(verified());

        wizard.set_passwords("Abcdef1!", "Abcdef1?");
        assert!(wizard.submit_password().is_err());
        assert_eq!(wizard.error(), Some(PASSWORDS_DONT_MATCH));

        wizard.set_passwords("abcdefgh", "abcdefgh");
        assert!(wizard.submit_password().is_err());

        wizard.set_passwords("Abcdef1!", "Abcdef1!");
        let request = wizard.submit_password().unwrap();
        assert_eq!(request.code, None);

        wizard.on_password_set(Ok(SetNewPasswordResponse {
            success: true,
            message: None,
        }));
        assert_eq!(wizard.paso(), PasoReset::Success);
        assert!(!wizard.back());
    }

    #[test]
    fn test_resend_resets_attempts_and_countdown() {
        let mut wizard = wizard_in_code_step(60);
        wizard.set_code("0000");
        wizard.submit_code().unwrap();
        wizard.on_code_verified(Err(AppError::from_response(400, None)));
        assert_eq!(wizard.remaining_attempts(), 2);

        wizard.resend().unwrap();
        wizard.on_code_requested(code_sent(Some(120)));
        assert_eq!(wizard.remaining_attempts(), 3);
        assert_eq!(wizard.countdown(), CodeCountdown::Running(120));
        assert!(!wizard.code_verified());
        assert_eq!(wizard.code(), "");
    }
}
