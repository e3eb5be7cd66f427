//! Servicio de recuperación de contraseña

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::client::ApiClient;
use crate::dto::password_reset_dto::{
    RequestCodeRequest, RequestCodeResponse, SetNewPasswordRequest, SetNewPasswordResponse,
    VerifyCodeRequest, VerifyCodeResponse,
};
use crate::utils::errors::AppResult;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordResetApi: Send + Sync {
    async fn request_code(&self, body: RequestCodeRequest) -> AppResult<RequestCodeResponse>;

    async fn verify_code(&self, body: VerifyCodeRequest) -> AppResult<VerifyCodeResponse>;

    async fn set_new_password(&self, body: SetNewPasswordRequest)
        -> AppResult<SetNewPasswordResponse>;
}

/// Implementación HTTP de `PasswordResetApi`
#[derive(Clone)]
pub struct PasswordResetService {
    client: Arc<ApiClient>,
}

impl PasswordResetService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PasswordResetApi for PasswordResetService {
    async fn request_code(&self, body: RequestCodeRequest) -> AppResult<RequestCodeResponse> {
        info!("📧 Solicitando código de recuperación");
        self.client
            .post_json("/password-reset-direct/request", &body)
            .await
    }

    async fn verify_code(&self, body: VerifyCodeRequest) -> AppResult<VerifyCodeResponse> {
        info!("🔢 Verificando código de recuperación");
        self.client
            .post_json("/password-reset-direct/verify-code", &body)
            .await
    }

    async fn set_new_password(
        &self,
        body: SetNewPasswordRequest,
    ) -> AppResult<SetNewPasswordResponse> {
        info!("🔐 Estableciendo nueva contraseña (código incluido: {})", body.code.is_some());
        self.client
            .post_json("/password-reset-direct/set-new-password", &body)
            .await
    }
}
