//! Reintentos acotados con espera fija
//!
//! Solo para lecturas idempotentes (listado de usuarios del admin). Los
//! cambios de estado de reservas y el flujo de recuperación de contraseña
//! nunca se reintentan automáticamente.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::errors::AppResult;

/// Política de reintentos: intentos adicionales y espera fija entre ellos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Ejecutar `operation` reintentando solo errores transitorios
///
/// `operation` recibe el número de intento (empezando en 1).
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> AppResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                warn!(
                    "🔁 Error transitorio (intento {}/{}): {}. Reintentando en {:?}",
                    attempt, max_attempts, e, policy.delay
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
