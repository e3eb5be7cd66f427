//! Controlador de reservas
//!
//! Ejecuta contra `ReservasApi` los requests que deciden `ReservasStore` y
//! `AccionesState`, y es dueño de los temporizadores: debounce de búsqueda
//! y auto-ocultado de banners.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::config::EnvironmentConfig;
use crate::models::filtros::{CampoFiltro, FiltroEstado, FiltrosReserva};
use crate::models::pagination::Pagination;
use crate::models::reserva::{EstadoReserva, LadoCalificacion, Reserva};
use crate::services::reservas_service::{ReservasApi, ReservasTab};
use crate::store::acciones::{
    AccionesState, ConfirmacionModal, SolicitudAccion, ACTION_ERROR_FALLBACK,
    RATING_ERROR_FALLBACK,
};
use crate::store::reservas_store::{ConteoEstados, ReservasStore};
use crate::utils::debounce::Debouncer;
use crate::utils::errors::{AppError, AppResult};

pub const RATING_SUCCESS: &str = "Calificación enviada exitosamente";

/// Retardos de los temporizadores del listado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservasTimings {
    pub search_debounce: Duration,
    pub success_banner: Duration,
    pub error_banner: Duration,
}

impl Default for ReservasTimings {
    fn default() -> Self {
        Self {
            search_debounce: Duration::from_millis(500),
            success_banner: Duration::from_secs(3),
            error_banner: Duration::from_secs(5),
        }
    }
}

impl From<&EnvironmentConfig> for ReservasTimings {
    fn from(config: &EnvironmentConfig) -> Self {
        Self {
            search_debounce: config.search_debounce,
            success_banner: config.success_banner,
            error_banner: config.error_banner,
        }
    }
}

/// Foto del estado para pintar la vista
#[derive(Debug, Clone, Serialize)]
pub struct ReservasView {
    pub tab: ReservasTab,
    pub pagination: Pagination,
    pub reservas: Vec<Reserva>,
    pub counts: ConteoEstados,
    pub active_filters: usize,
    pub loading: bool,
    pub error: Option<String>,
    pub modal: Option<ConfirmacionModal>,
    pub acciones_en_curso: Vec<i64>,
    pub mensaje_exito: Option<String>,
    pub mensaje_error: Option<String>,
    pub advertencia: Option<String>,
    pub sincronizando: bool,
}

pub struct ReservasController<A: ReservasApi + 'static> {
    api: Arc<A>,
    store: Arc<RwLock<ReservasStore>>,
    acciones: Arc<RwLock<AccionesState>>,
    search_timer: Arc<Mutex<Debouncer>>,
    success_timer: Arc<Mutex<Debouncer>>,
    error_timer: Arc<Mutex<Debouncer>>,
}

impl<A: ReservasApi + 'static> Clone for ReservasController<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            store: Arc::clone(&self.store),
            acciones: Arc::clone(&self.acciones),
            search_timer: Arc::clone(&self.search_timer),
            success_timer: Arc::clone(&self.success_timer),
            error_timer: Arc::clone(&self.error_timer),
        }
    }
}

impl<A: ReservasApi + 'static> ReservasController<A> {
    pub fn new(api: Arc<A>, page_size: u32, timings: ReservasTimings) -> Self {
        Self {
            api,
            store: Arc::new(RwLock::new(ReservasStore::new(page_size))),
            acciones: Arc::new(RwLock::new(AccionesState::new())),
            search_timer: Arc::new(Mutex::new(Debouncer::new(timings.search_debounce))),
            success_timer: Arc::new(Mutex::new(Debouncer::new(timings.success_banner))),
            error_timer: Arc::new(Mutex::new(Debouncer::new(timings.error_banner))),
        }
    }

    pub async fn snapshot(&self) -> ReservasView {
        let store = self.store.read().await;
        let acciones = self.acciones.read().await;
        ReservasView {
            tab: store.tab(),
            pagination: store.pagination(),
            reservas: store.visible_reservas().into_iter().cloned().collect(),
            counts: store.counts(),
            active_filters: store.active_filter_count(),
            loading: store.is_loading(),
            error: store.error().map(str::to_string),
            modal: acciones.modal().cloned(),
            acciones_en_curso: acciones.en_curso(),
            mensaje_exito: acciones.mensaje_exito().map(str::to_string),
            mensaje_error: acciones.mensaje_error().map(str::to_string),
            advertencia: acciones.advertencia().map(str::to_string),
            sincronizando: acciones.sincronizando(),
        }
    }

    /// Cargar una página de la pestaña activa
    pub async fn load(&self, page: u32) -> AppResult<()> {
        let request = self.store.write().await.begin_load(page);
        let Some(request) = request else {
            debug!("📅 Pestaña agenda: no se cargan reservas");
            return Ok(());
        };

        info!("📋 Cargando reservas '{}' página {} (#{})", request.tab, request.page, request.seq);
        let result = self.api.listar(request.tab, request.query.clone()).await;
        if let Err(e) = &result {
            error!("❌ Error cargando reservas: {}", e);
        }

        self.store.write().await.finish_load(&request, result)
    }

    /// Cambiar de pestaña y cargar su primera página.
    /// Devuelve `false` si ya era la pestaña activa (no se recarga nada).
    pub async fn set_tab(&self, tab: ReservasTab) -> AppResult<bool> {
        if !self.store.write().await.set_tab(tab) {
            return Ok(false);
        }
        self.search_timer.lock().await.cancel();
        self.load(1).await?;
        Ok(true)
    }

    /// Filtro de texto con debounce; solo recarga si cambió la consulta
    pub async fn set_filtro_texto(&self, campo: CampoFiltro, valor: &str) {
        if !self.store.write().await.set_filtro_texto(campo, valor) {
            return;
        }
        let this = self.clone();
        self.search_timer.lock().await.schedule(async move {
            // el error queda registrado en el store
            let _ = this.load(1).await;
        });
    }

    pub async fn set_estado_filtro(&self, estado: FiltroEstado) -> AppResult<()> {
        if !self.store.write().await.set_estado_filtro(estado) {
            return Ok(());
        }
        self.reload_now().await
    }

    pub async fn set_fechas(
        &self,
        desde: Option<NaiveDate>,
        hasta: Option<NaiveDate>,
    ) -> AppResult<()> {
        if !self.store.write().await.set_fechas(desde, hasta)? {
            return Ok(());
        }
        self.reload_now().await
    }

    /// Aplicar un formulario de filtros completo con una sola recarga.
    /// Devuelve `true` si la consulta cambió y se recargó.
    pub async fn set_filtros(&self, filtros: FiltrosReserva) -> AppResult<bool> {
        if !self.store.write().await.replace_filters(filtros)? {
            return Ok(false);
        }
        self.reload_now().await?;
        Ok(true)
    }

    pub async fn clear_filters(&self) -> AppResult<()> {
        if !self.store.write().await.clear_filters() {
            return Ok(());
        }
        self.reload_now().await
    }

    /// La carga inmediata ya lleva todos los filtros: descartar la búsqueda pendiente
    async fn reload_now(&self) -> AppResult<()> {
        self.search_timer.lock().await.cancel();
        self.load(1).await
    }

    pub async fn go_to_page(&self, page: u32) -> AppResult<()> {
        let pagination = self.store.read().await.pagination();
        if !pagination.contains_page(page) {
            return Err(AppError::Validation(format!(
                "Página {} fuera de rango (1-{})",
                page,
                pagination.total_pages()
            )));
        }
        self.load(page).await
    }

    async fn find_reserva(&self, id_reserva: i64) -> AppResult<Reserva> {
        self.store
            .read()
            .await
            .find(id_reserva)
            .cloned()
            .ok_or_else(|| {
                AppError::InvalidState(format!("La reserva {} no está en el listado", id_reserva))
            })
    }

    /// Abrir el modal de confirmación para una acción
    pub async fn request_action(&self, id_reserva: i64, accion: EstadoReserva) -> AppResult<()> {
        let reserva = self.find_reserva(id_reserva).await?;
        self.acciones.write().await.request_action(&reserva, accion)
    }

    pub async fn set_observacion(&self, texto: &str) -> bool {
        self.acciones.write().await.set_observacion(texto)
    }

    pub async fn cancel_action(&self) {
        self.acciones.write().await.cancel_modal();
    }

    /// Confirmar la acción del modal
    pub async fn confirm_action(&self) -> AppResult<()> {
        let modal_id = self.acciones.read().await.modal().map(|m| m.id_reserva);
        let actual = match modal_id {
            Some(id) => self.store.read().await.find(id).cloned(),
            None => None,
        };

        let prepared = self.acciones.write().await.prepare_confirm(actual.as_ref());
        match prepared {
            Ok(solicitud) => self.execute(solicitud).await,
            Err(e) => {
                if matches!(e, AppError::Validation(_)) {
                    // los mensajes de validación persisten hasta corregirse
                    self.error_timer.lock().await.cancel();
                }
                Err(e)
            }
        }
    }

    /// Confirmación directa `pendiente` → `confirmada`
    pub async fn quick_confirm(&self, id_reserva: i64) -> AppResult<()> {
        let reserva = self.find_reserva(id_reserva).await?;
        let solicitud = self.acciones.write().await.begin_quick_confirm(&reserva)?;
        self.execute(solicitud).await
    }

    async fn execute(&self, solicitud: SolicitudAccion) -> AppResult<()> {
        let id_reserva = solicitud.id_reserva();
        let accion = solicitud.accion();

        let result = match solicitud {
            SolicitudAccion::Cancelar { id_reserva, body } => {
                self.api.cancelar(id_reserva, body).await
            }
            SolicitudAccion::CambiarEstado { id_reserva, body } => {
                self.api.actualizar_estado(id_reserva, body).await
            }
            SolicitudAccion::Confirmar { id_reserva } => self.api.confirmar(id_reserva).await,
        };

        match result {
            Ok(()) => {
                info!("✅ Reserva {} → {}", id_reserva, accion);
                self.acciones
                    .write()
                    .await
                    .finish_success(id_reserva, accion.mensaje_exito());
                self.schedule_success_dismiss().await;
                self.resync(1).await;
                Ok(())
            }
            Err(e) => {
                error!("❌ Acción '{}' sobre reserva {} falló: {}", accion, id_reserva, e);
                let message = e.user_message(ACTION_ERROR_FALLBACK);
                self.acciones.write().await.finish_failure(id_reserva, message);
                self.schedule_error_dismiss().await;
                Err(e)
            }
        }
    }

    /// Calificar una reserva completada
    pub async fn calificar(
        &self,
        id_reserva: i64,
        lado: LadoCalificacion,
        puntaje: u8,
        comentario: &str,
        nps: Option<u8>,
    ) -> AppResult<()> {
        let reserva = self.find_reserva(id_reserva).await?;
        let body = self
            .acciones
            .write()
            .await
            .begin_rating(&reserva, lado, puntaje, comentario, nps)?;

        match self.api.calificar(lado, id_reserva, body).await {
            Ok(()) => {
                self.acciones.write().await.finish_success(id_reserva, RATING_SUCCESS);
                self.schedule_success_dismiss().await;
                let page = self.store.read().await.pagination().page;
                self.resync(page).await;
                Ok(())
            }
            Err(e) => {
                error!("❌ Calificación de reserva {} falló: {}", id_reserva, e);
                let message = e.user_message(RATING_ERROR_FALLBACK);
                self.acciones.write().await.finish_failure(id_reserva, message);
                self.schedule_error_dismiss().await;
                Err(e)
            }
        }
    }

    /// Recarga tras una acción exitosa, con indicador de sincronización
    async fn resync(&self, page: u32) {
        if let Err(e) = self.load(page).await {
            warn!("⚠️ Acción aplicada pero la recarga falló: {}", e);
        }
        self.acciones.write().await.finish_sync();
    }

    pub async fn dismiss_success(&self) {
        self.success_timer.lock().await.cancel();
        self.acciones.write().await.dismiss_success();
    }

    async fn schedule_success_dismiss(&self) {
        let acciones = Arc::clone(&self.acciones);
        self.success_timer.lock().await.schedule(async move {
            acciones.write().await.dismiss_success();
        });
    }

    async fn schedule_error_dismiss(&self) {
        let acciones = Arc::clone(&self.acciones);
        self.error_timer.lock().await.schedule(async move {
            acciones.write().await.dismiss_error();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::reserva_dto::{CancelarRequest, RawReserva};
    use crate::services::reservas_service::{MockReservasApi, ReservasPage};
    use mockall::predicate::{always, eq};
    use serde_json::json;

    fn reserva(id: i64, estado: &str) -> Reserva {
        let raw: RawReserva =
            serde_json::from_value(json!({ "id_reserva": id, "estado": estado })).unwrap();
        raw.into_reserva().unwrap()
    }

    fn offset_of(query: &[(String, String)]) -> Option<&str> {
        query
            .iter()
            .find(|(key, _)| key == "offset")
            .map(|(_, value)| value.as_str())
    }

    fn controller(mock: MockReservasApi) -> ReservasController<MockReservasApi> {
        ReservasController::new(Arc::new(mock), 10, ReservasTimings::default())
    }

    /// Mock cuyo primer `listar` devuelve `reservas`
    fn mock_with_initial_load(reservas: Vec<Reserva>) -> MockReservasApi {
        let mut mock = MockReservasApi::new();
        mock.expect_listar().times(1).returning(move |_, _| {
            Ok(ReservasPage {
                total: reservas.len() as u64,
                reservas: reservas.clone(),
            })
        });
        mock
    }

    #[tokio::test]
    async fn test_cancel_with_blank_motivo_sends_nothing() {
        let mut mock = mock_with_initial_load(vec![reserva(7, "pendiente")]);
        mock.expect_cancelar().times(0);

        let controller = controller(mock);
        controller.load(1).await.unwrap();
        controller
            .request_action(7, EstadoReserva::Cancelada)
            .await
            .unwrap();
        controller.set_observacion("   ").await;

        let err = controller.confirm_action().await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let view = controller.snapshot().await;
        assert!(view.modal.is_some());
        assert!(view.acciones_en_curso.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_with_motivo_calls_endpoint_once_and_reloads_page_one() {
        let mut mock = MockReservasApi::new();
        mock.expect_listar()
            .with(eq(ReservasTab::Mine), always())
            .times(2)
            .returning(|_, _| {
                Ok(ReservasPage {
                    reservas: vec![reserva(7, "pendiente")],
                    total: 25,
                })
            });
        mock.expect_cancelar()
            .with(
                eq(7),
                eq(CancelarRequest {
                    motivo: "Cambio de planes".to_string(),
                }),
            )
            .times(1)
            .returning(|_, _| Ok(()));

        let controller = controller(mock);
        controller.load(1).await.unwrap();
        controller
            .request_action(7, EstadoReserva::Cancelada)
            .await
            .unwrap();
        controller.set_observacion(" Cambio de planes ").await;
        controller.confirm_action().await.unwrap();

        let view = controller.snapshot().await;
        assert!(view.modal.is_none());
        assert!(!view.sincronizando);
        assert_eq!(view.mensaje_exito.as_deref(), Some("Reserva cancelada exitosamente"));
    }

    #[tokio::test]
    async fn test_successful_action_reloads_page_one_exactly_once() {
        let mut mock = MockReservasApi::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_listar()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(ReservasPage {
                    reservas: vec![reserva(3, "pendiente")],
                    total: 25,
                })
            });
        mock.expect_listar()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(ReservasPage {
                    reservas: vec![reserva(3, "pendiente")],
                    total: 25,
                })
            });
        mock.expect_actualizar_estado()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mock.expect_listar()
            .withf(|_, query| offset_of(query) == Some("0"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(ReservasPage {
                    reservas: vec![reserva(3, "aprobado")],
                    total: 25,
                })
            });

        let controller = controller(mock);
        controller.load(1).await.unwrap();
        controller.go_to_page(2).await.unwrap();
        assert_eq!(controller.snapshot().await.pagination.page, 2);

        controller.request_action(3, EstadoReserva::Aprobado).await.unwrap();
        controller.confirm_action().await.unwrap();

        let view = controller.snapshot().await;
        assert!(view.modal.is_none());
        assert_eq!(view.pagination.page, 1);
        assert_eq!(view.reservas[0].estado, EstadoReserva::Aprobado);
    }

    #[tokio::test]
    async fn test_failed_action_keeps_modal_and_skips_reload() {
        let mut mock = mock_with_initial_load(vec![reserva(9, "pendiente")]);
        mock.expect_actualizar_estado().times(1).returning(|_, _| {
            Err(AppError::from_response(
                409,
                Some(json!({ "detail": "La reserva ya fue modificada" })),
            ))
        });

        let controller = controller(mock);
        controller.load(1).await.unwrap();
        controller.request_action(9, EstadoReserva::Aprobado).await.unwrap();
        assert!(controller.confirm_action().await.is_err());

        let view = controller.snapshot().await;
        assert!(view.modal.is_some());
        assert_eq!(view.mensaje_error.as_deref(), Some("La reserva ya fue modificada"));
        assert_eq!(view.reservas[0].estado, EstadoReserva::Pendiente);
    }

    #[tokio::test]
    async fn test_invalid_transition_never_reaches_api() {
        let mut mock = mock_with_initial_load(vec![reserva(1, "completada")]);
        mock.expect_actualizar_estado().times(0);
        mock.expect_confirmar().times(0);

        let controller = controller(mock);
        controller.load(1).await.unwrap();
        assert!(matches!(
            controller.request_action(1, EstadoReserva::Aprobado).await,
            Err(AppError::InvalidTransition(_))
        ));
        assert!(controller.quick_confirm(1).await.is_err());
    }

    #[tokio::test]
    async fn test_go_to_page_out_of_range() {
        let mock = mock_with_initial_load(vec![reserva(1, "pendiente")]);
        let controller = controller(mock);
        controller.load(1).await.unwrap();

        assert!(controller.go_to_page(0).await.is_err());
        assert!(controller.go_to_page(2).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_is_debounced() {
        let mut mock = MockReservasApi::new();
        mock.expect_listar()
            .withf(|_, query| query.contains(&("search".to_string(), "masaje".to_string())))
            .times(1)
            .returning(|_, _| {
                Ok(ReservasPage {
                    reservas: vec![],
                    total: 0,
                })
            });

        let controller = controller(mock);
        controller.set_filtro_texto(CampoFiltro::Search, "mas").await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        controller.set_filtro_texto(CampoFiltro::Search, "masaje").await;
        // texto corto: no cambia la consulta y no reprograma
        controller.set_filtro_texto(CampoFiltro::NombreEmpresa, "sp").await;

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(!controller.snapshot().await.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_banner_auto_dismisses() {
        let mut mock = MockReservasApi::new();
        mock.expect_listar().times(2).returning(|_, _| {
            Ok(ReservasPage {
                reservas: vec![reserva(4, "pendiente")],
                total: 1,
            })
        });
        mock.expect_confirmar().with(eq(4)).times(1).returning(|_| Ok(()));

        let controller = controller(mock);
        controller.load(1).await.unwrap();
        controller.quick_confirm(4).await.unwrap();
        assert!(controller.snapshot().await.mensaje_exito.is_some());

        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert!(controller.snapshot().await.mensaje_exito.is_none());
    }

    #[tokio::test]
    async fn test_rating_reloads_current_page() {
        let mut mock = MockReservasApi::new();
        mock.expect_listar().times(2).returning(|_, _| {
            Ok(ReservasPage {
                reservas: vec![reserva(5, "concluido")],
                total: 1,
            })
        });
        mock.expect_calificar()
            .withf(|lado, id, body| {
                *lado == LadoCalificacion::Cliente && *id == 5 && body.puntaje == 5
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let controller = controller(mock);
        controller.load(1).await.unwrap();
        controller
            .calificar(5, LadoCalificacion::Cliente, 5, "Muy bien", Some(10))
            .await
            .unwrap();
        assert_eq!(
            controller.snapshot().await.mensaje_exito.as_deref(),
            Some(RATING_SUCCESS)
        );
    }

    #[tokio::test]
    async fn test_schedule_tab_does_not_fetch() {
        let mut mock = MockReservasApi::new();
        mock.expect_listar().times(0);

        let controller = controller(mock);
        assert!(controller.set_tab(ReservasTab::Schedule).await.unwrap());
        assert_eq!(controller.snapshot().await.tab, ReservasTab::Schedule);
    }

    #[tokio::test]
    async fn test_same_tab_reports_no_reload() {
        let mut mock = MockReservasApi::new();
        mock.expect_listar().times(0);

        let controller = controller(mock);
        let tab = controller.snapshot().await.tab;
        assert!(!controller.set_tab(tab).await.unwrap());
    }
}
