//! Listado de usuarios para la administración
//!
//! Es una lectura idempotente, así que los errores transitorios (timeouts y
//! HTTP 500) se reintentan con la política configurada.

use std::sync::Arc;

use tracing::info;

use crate::client::ApiClient;
use crate::dto::usuario_dto::UsuariosPayload;
use crate::models::pagination::offset_for;
use crate::models::usuario::UsuariosPage;
use crate::utils::errors::AppResult;
use crate::utils::retry::{retry_with_backoff, RetryPolicy};

#[derive(Clone)]
pub struct AdminUsersService {
    client: Arc<ApiClient>,
    retry: RetryPolicy,
    page_size: u32,
}

impl AdminUsersService {
    pub fn new(client: Arc<ApiClient>, retry: RetryPolicy, page_size: u32) -> Self {
        Self {
            client,
            retry,
            page_size: page_size.max(1),
        }
    }

    /// Parámetros de consulta del listado
    pub fn query(&self, page: u32, search: Option<&str>) -> Vec<(String, String)> {
        let mut query = vec![
            ("limit".to_string(), self.page_size.to_string()),
            ("offset".to_string(), offset_for(page, self.page_size).to_string()),
        ];
        if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
            query.push(("search".to_string(), search.to_string()));
        }
        query
    }

    pub async fn listar_usuarios(&self, page: u32, search: Option<&str>) -> AppResult<UsuariosPage> {
        let query = self.query(page, search);
        let client = &self.client;

        let payload: UsuariosPayload = retry_with_backoff(&self.retry, |attempt| {
            let query = query.clone();
            async move {
                info!("👥 Cargando usuarios (página {}, intento {})", page, attempt);
                client.get_json("/admin/users", &query).await
            }
        })
        .await?;

        Ok(payload.into())
    }
}
