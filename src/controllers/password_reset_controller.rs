//! Controlador del asistente de recuperación de contraseña
//!
//! Envía los requests que decide `PasswordResetWizard` y mantiene la cuenta
//! atrás del código: una tarea que descuenta un segundo mientras el paso
//! sea `Code` y el código no esté verificado.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::dto::password_reset_dto::RequestCodeResponse;
use crate::services::password_reset_service::PasswordResetApi;
use crate::store::password_reset::{PasoReset, PasswordResetWizard};
use crate::utils::errors::AppResult;

const TICK: Duration = Duration::from_secs(1);

/// Tarea de la cuenta atrás; se aborta al soltarla
struct CountdownTask(JoinHandle<()>);

impl Drop for CountdownTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

pub struct PasswordResetController<A: PasswordResetApi + 'static> {
    api: Arc<A>,
    wizard: Arc<RwLock<PasswordResetWizard>>,
    countdown: Arc<Mutex<Option<CountdownTask>>>,
}

impl<A: PasswordResetApi + 'static> Clone for PasswordResetController<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            wizard: Arc::clone(&self.wizard),
            countdown: Arc::clone(&self.countdown),
        }
    }
}

impl<A: PasswordResetApi + 'static> PasswordResetController<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            wizard: Arc::new(RwLock::new(PasswordResetWizard::new())),
            countdown: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn snapshot(&self) -> PasswordResetWizard {
        self.wizard.read().await.clone()
    }

    pub async fn paso(&self) -> PasoReset {
        self.wizard.read().await.paso()
    }

    pub async fn set_email(&self, email: &str) {
        self.wizard.write().await.set_email(email);
    }

    pub async fn set_code(&self, code: &str) {
        self.wizard.write().await.set_code(code);
    }

    pub async fn set_passwords(&self, new_password: &str, confirm_password: &str) {
        self.wizard
            .write()
            .await
            .set_passwords(new_password, confirm_password);
    }

    /// Paso 1: solicitar el código
    pub async fn submit_email(&self) -> AppResult<PasoReset> {
        let request = self.wizard.write().await.submit_email()?;
        let result = self.api.request_code(request).await;
        self.apply_code_requested(result).await
    }

    /// Reenviar el código desde el paso 2
    pub async fn resend(&self) -> AppResult<PasoReset> {
        let request = self.wizard.write().await.resend()?;
        let result = self.api.request_code(request).await;
        self.apply_code_requested(result).await
    }

    async fn apply_code_requested(
        &self,
        result: AppResult<RequestCodeResponse>,
    ) -> AppResult<PasoReset> {
        if let Err(e) = &result {
            error!("❌ Error solicitando código: {}", e);
        }
        let (paso, ticking) = {
            let mut wizard = self.wizard.write().await;
            wizard.on_code_requested(result);
            (wizard.paso(), wizard.should_tick())
        };
        if ticking {
            self.start_countdown().await;
        }
        Ok(paso)
    }

    /// Paso 2: verificar el código
    pub async fn submit_code(&self) -> AppResult<PasoReset> {
        let request = self.wizard.write().await.submit_code()?;
        let Some(request) = request else {
            debug!("🔢 Código ya verificado, sin nueva verificación");
            return Ok(self.paso().await);
        };

        let result = self.api.verify_code(request).await;
        if let Err(e) = &result {
            error!("❌ Error verificando código: {}", e);
        }

        let paso = {
            let mut wizard = self.wizard.write().await;
            wizard.on_code_verified(result);
            wizard.paso()
        };
        if paso == PasoReset::NewPassword {
            self.stop_countdown().await;
        }
        Ok(paso)
    }

    /// Paso 3: establecer la nueva contraseña
    pub async fn submit_password(&self) -> AppResult<PasoReset> {
        let request = self.wizard.write().await.submit_password()?;
        let result = self.api.set_new_password(request).await;
        if let Err(e) = &result {
            error!("❌ Error estableciendo contraseña: {}", e);
        }

        let mut wizard = self.wizard.write().await;
        wizard.on_password_set(result);
        Ok(wizard.paso())
    }

    pub async fn back(&self) -> PasoReset {
        let mut wizard = self.wizard.write().await;
        wizard.back();
        wizard.paso()
    }

    async fn start_countdown(&self) {
        let wizard = Arc::clone(&self.wizard);
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(TICK).await;
                if !wizard.write().await.tick() {
                    debug!("⏱️ Cuenta atrás detenida");
                    break;
                }
            }
        });
        // la tarea anterior se aborta al reemplazarla
        *self.countdown.lock().await = Some(CountdownTask(handle));
    }

    /// Detener la cuenta atrás (también al desmontar la vista)
    pub async fn stop_countdown(&self) {
        self.countdown.lock().await.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::password_reset_dto::{SetNewPasswordResponse, VerifyCodeResponse};
    use crate::services::password_reset_service::MockPasswordResetApi;
    use crate::store::password_reset::{CodeCountdown, CODE_EXPIRED};
    use crate::utils::errors::AppError;

    fn mock_request_code(mock: &mut MockPasswordResetApi, ttl: u32) {
        mock.expect_request_code().times(1).returning(move |_| {
            Ok(RequestCodeResponse {
                success: true,
                message: Some("Código enviado".into()),
                expires_in_seconds: Some(ttl),
            })
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_code_sends_no_verify_request() {
        let mut mock = MockPasswordResetApi::new();
        mock_request_code(&mut mock, 3);
        mock.expect_verify_code().times(0);

        let controller = PasswordResetController::new(Arc::new(mock));
        controller.set_email("ana@example.com").await;
        assert_eq!(controller.submit_email().await.unwrap(), PasoReset::Code);

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(controller.snapshot().await.countdown(), CodeCountdown::Running(0));

        controller.set_code("1234").await;
        let err = controller.submit_code().await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg == CODE_EXPIRED));
    }

    #[tokio::test(start_paused = true)]
    async fn test_verified_code_freezes_countdown() {
        let mut mock = MockPasswordResetApi::new();
        mock_request_code(&mut mock, 60);
        mock.expect_verify_code().times(1).returning(|_| {
            Ok(VerifyCodeResponse {
                success: true,
                message: None,
                remaining_attempts: None,
            })
        });
        mock.expect_set_new_password()
            .withf(|body| body.code.is_none() && body.new_password == "Abcdef1!")
            .times(1)
            .returning(|_| {
                Ok(SetNewPasswordResponse {
                    success: true,
                    message: None,
                })
            });

        let controller = PasswordResetController::new(Arc::new(mock));
        controller.set_email("ana@example.com").await;
        controller.submit_email().await.unwrap();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(controller.snapshot().await.countdown(), CodeCountdown::Running(58));

        controller.set_code("1234").await;
        assert_eq!(controller.submit_code().await.unwrap(), PasoReset::NewPassword);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(controller.snapshot().await.countdown(), CodeCountdown::Verified);

        // volver y reenviar el mismo código no vuelve a verificar
        assert_eq!(controller.back().await, PasoReset::Code);
        assert_eq!(controller.submit_code().await.unwrap(), PasoReset::NewPassword);

        controller.set_passwords("Abcdef1!", "Abcdef1!").await;
        assert_eq!(controller.submit_password().await.unwrap(), PasoReset::Success);
    }

    #[tokio::test]
    async fn test_request_failure_stays_on_email() {
        let mut mock = MockPasswordResetApi::new();
        mock.expect_request_code()
            .times(1)
            .returning(|_| Err(AppError::Timeout("30s".into())));

        let controller = PasswordResetController::new(Arc::new(mock));
        controller.set_email("ana@example.com").await;
        assert_eq!(controller.submit_email().await.unwrap(), PasoReset::Email);
        assert_eq!(
            controller.snapshot().await.error(),
            Some("Error de conexión. Intenta nuevamente.")
        );
    }

    #[tokio::test]
    async fn test_invalid_email_sends_nothing() {
        let mut mock = MockPasswordResetApi::new();
        mock.expect_request_code().times(0);

        let controller = PasswordResetController::new(Arc::new(mock));
        controller.set_email("ana").await;
        assert!(controller.submit_email().await.is_err());
    }
}
