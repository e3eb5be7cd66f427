//! Estado compartido de la aplicación
//!
//! Une la configuración, el almacén de token y el cliente HTTP en
//! controladores listos para usar.

use std::sync::Arc;

use tracing::info;

use crate::cache::{FileTokenStore, StaticToken, TokenProvider};
use crate::client::ApiClient;
use crate::config::environment::EnvironmentConfig;
use crate::controllers::{PasswordResetController, ReservasController, ReservasTimings};
use crate::services::{AdminUsersService, PasswordResetService, ReservasService};
use crate::utils::errors::AppResult;
use crate::utils::retry::RetryPolicy;

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub client: Arc<ApiClient>,
    pub reservas: ReservasController<ReservasService>,
    pub password_reset: PasswordResetController<PasswordResetService>,
    pub admin_users: AdminUsersService,
}

impl AppState {
    /// Estado con el token de `API_TOKEN` o, si no hay, del archivo configurado
    pub fn new(config: EnvironmentConfig) -> AppResult<Self> {
        let tokens: Arc<dyn TokenProvider> = match &config.api_token {
            Some(token) => {
                info!("🔑 Usando token fijo de API_TOKEN");
                Arc::new(StaticToken::new(token.clone()))
            }
            None => {
                let store = FileTokenStore::new(config.token_path.clone());
                info!("🔑 Token leído de {}", store.path().display());
                Arc::new(store)
            }
        };
        Self::with_tokens(config, tokens)
    }

    /// Estado con un proveedor de token explícito
    pub fn with_tokens(config: EnvironmentConfig, tokens: Arc<dyn TokenProvider>) -> AppResult<Self> {
        let client = Arc::new(ApiClient::new(&config, tokens)?);
        info!("🔗 Backend configurado en {}", client.base_url());

        let reservas = ReservasController::new(
            Arc::new(ReservasService::new(Arc::clone(&client))),
            config.page_size,
            ReservasTimings::from(&config),
        );
        let password_reset =
            PasswordResetController::new(Arc::new(PasswordResetService::new(Arc::clone(&client))));
        let admin_users = AdminUsersService::new(
            Arc::clone(&client),
            RetryPolicy {
                max_retries: config.admin_retry_attempts,
                delay: config.admin_retry_delay,
            },
            config.page_size,
        );

        Ok(Self {
            config,
            client,
            reservas,
            password_reset,
            admin_users,
        })
    }
}
