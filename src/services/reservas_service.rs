//! Servicio de reservas
//!
//! Llamadas HTTP de listado, cambios de estado y calificaciones. El trait
//! `ReservasApi` es la frontera que usan el store y el orquestador de
//! acciones, de modo que los tests pueden sustituir el backend.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::client::ApiClient;
use crate::dto::reserva_dto::{
    CalificacionRequest, CancelarRequest, EstadoUpdateRequest, ReservasPayload,
};
use crate::models::reserva::{LadoCalificacion, Reserva};
use crate::utils::errors::{AppError, AppResult};

/// Pestaña activa del listado de reservas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReservasTab {
    /// Reservas que hice como cliente
    #[default]
    Mine,
    /// Reservas sobre servicios que ofrezco
    AsProvider,
    /// Agenda: no carga reservas
    Schedule,
}

impl ReservasTab {
    pub fn endpoint(&self) -> Option<&'static str> {
        match self {
            ReservasTab::Mine => Some("/reservas/mis-reservas"),
            ReservasTab::AsProvider => Some("/reservas/reservas-proveedor"),
            ReservasTab::Schedule => None,
        }
    }
}

impl fmt::Display for ReservasTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReservasTab::Mine => "mine",
            ReservasTab::AsProvider => "asProvider",
            ReservasTab::Schedule => "schedule",
        };
        f.write_str(name)
    }
}

impl FromStr for ReservasTab {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "mine" | "mis-reservas" => Ok(ReservasTab::Mine),
            "asProvider" | "proveedor" => Ok(ReservasTab::AsProvider),
            "schedule" | "agenda" => Ok(ReservasTab::Schedule),
            other => Err(AppError::Validation(format!("Pestaña desconocida: '{}'", other))),
        }
    }
}

/// Página de reservas ya mapeadas
#[derive(Debug, Clone, PartialEq)]
pub struct ReservasPage {
    pub reservas: Vec<Reserva>,
    pub total: u64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReservasApi: Send + Sync {
    async fn listar(&self, tab: ReservasTab, query: Vec<(String, String)>) -> AppResult<ReservasPage>;

    async fn actualizar_estado(&self, id_reserva: i64, body: EstadoUpdateRequest) -> AppResult<()>;

    async fn cancelar(&self, id_reserva: i64, body: CancelarRequest) -> AppResult<()>;

    async fn confirmar(&self, id_reserva: i64) -> AppResult<()>;

    async fn calificar(
        &self,
        lado: LadoCalificacion,
        id_reserva: i64,
        body: CalificacionRequest,
    ) -> AppResult<()>;
}

/// Implementación HTTP de `ReservasApi`
#[derive(Clone)]
pub struct ReservasService {
    client: Arc<ApiClient>,
}

impl ReservasService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReservasApi for ReservasService {
    async fn listar(&self, tab: ReservasTab, query: Vec<(String, String)>) -> AppResult<ReservasPage> {
        let endpoint = tab.endpoint().ok_or_else(|| {
            AppError::InvalidState(format!("La pestaña '{}' no tiene listado de reservas", tab))
        })?;

        let payload: ReservasPayload = self.client.get_json(endpoint, &query).await?;
        let (reservas, total) = payload.into_parts();
        debug!("📋 {} reservas recibidas ({} en total) para '{}'", reservas.len(), total, tab);
        Ok(ReservasPage { reservas, total })
    }

    async fn actualizar_estado(&self, id_reserva: i64, body: EstadoUpdateRequest) -> AppResult<()> {
        info!("🔄 Reserva {} → {}", id_reserva, body.nuevo_estado);
        let _: Value = self
            .client
            .put_json(&format!("/reservas/{}/estado", id_reserva), &body)
            .await?;
        Ok(())
    }

    async fn cancelar(&self, id_reserva: i64, body: CancelarRequest) -> AppResult<()> {
        info!("🚫 Cancelando reserva {}", id_reserva);
        let _: Value = self
            .client
            .put_json(&format!("/reservas/{}/cancelar", id_reserva), &body)
            .await?;
        Ok(())
    }

    async fn confirmar(&self, id_reserva: i64) -> AppResult<()> {
        info!("✅ Confirmando reserva {}", id_reserva);
        let _: Value = self
            .client
            .put_empty(&format!("/reservas/{}/confirmar", id_reserva))
            .await?;
        Ok(())
    }

    async fn calificar(
        &self,
        lado: LadoCalificacion,
        id_reserva: i64,
        body: CalificacionRequest,
    ) -> AppResult<()> {
        info!("⭐ Calificando reserva {} ({:?}): {}", id_reserva, lado, body.puntaje);
        let _: Value = self.client.post_json(&lado.endpoint(id_reserva), &body).await?;
        Ok(())
    }
}
