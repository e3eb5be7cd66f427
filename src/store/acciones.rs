//! Orquestador de acciones sobre reservas
//!
//! Estado puro del modal de confirmación y de las acciones en curso. El
//! guard de reentrada va por id de reserva: varias reservas pueden tener
//! acciones simultáneas, una misma reserva nunca dos.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::dto::reserva_dto::{CalificacionRequest, CancelarRequest, EstadoUpdateRequest};
use crate::models::reserva::{EstadoReserva, LadoCalificacion, ObservacionRequerida, Reserva};
use crate::utils::errors::{AppError, AppResult};
use crate::utils::validation::{message_of, validate_motivo, validate_nps, validate_puntaje};

pub const ACTION_ERROR_FALLBACK: &str = "No se pudo actualizar la reserva";
pub const RATING_ERROR_FALLBACK: &str = "No se pudo enviar la calificación";
pub const OBSERVACION_RECOMENDADA: &str =
    "Se recomienda agregar una observación para esta acción";

/// Modal de confirmación abierto
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmacionModal {
    pub id_reserva: i64,
    pub accion: EstadoReserva,
    pub observacion: String,
}

/// Request listo para enviar tras pasar todos los guards
#[derive(Debug, Clone, PartialEq)]
pub enum SolicitudAccion {
    Cancelar { id_reserva: i64, body: CancelarRequest },
    CambiarEstado { id_reserva: i64, body: EstadoUpdateRequest },
    Confirmar { id_reserva: i64 },
}

impl SolicitudAccion {
    pub fn id_reserva(&self) -> i64 {
        match self {
            SolicitudAccion::Cancelar { id_reserva, .. }
            | SolicitudAccion::CambiarEstado { id_reserva, .. }
            | SolicitudAccion::Confirmar { id_reserva } => *id_reserva,
        }
    }

    pub fn accion(&self) -> EstadoReserva {
        match self {
            SolicitudAccion::Cancelar { .. } => EstadoReserva::Cancelada,
            SolicitudAccion::CambiarEstado { body, .. } => body.nuevo_estado,
            SolicitudAccion::Confirmar { .. } => EstadoReserva::Confirmada,
        }
    }
}

#[derive(Debug, Default)]
pub struct AccionesState {
    modal: Option<ConfirmacionModal>,
    en_curso: HashSet<i64>,
    mensaje_exito: Option<String>,
    mensaje_error: Option<String>,
    advertencia: Option<String>,
    /// Recargas posteriores a una acción aún en curso
    sincronizando: u32,
}

impl AccionesState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modal(&self) -> Option<&ConfirmacionModal> {
        self.modal.as_ref()
    }

    pub fn is_loading(&self, id_reserva: i64) -> bool {
        self.en_curso.contains(&id_reserva)
    }

    pub fn en_curso(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.en_curso.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn mensaje_exito(&self) -> Option<&str> {
        self.mensaje_exito.as_deref()
    }

    pub fn mensaje_error(&self) -> Option<&str> {
        self.mensaje_error.as_deref()
    }

    pub fn advertencia(&self) -> Option<&str> {
        self.advertencia.as_deref()
    }

    pub fn sincronizando(&self) -> bool {
        self.sincronizando > 0
    }

    fn guard_en_curso(&self, id_reserva: i64) -> AppResult<()> {
        if self.en_curso.contains(&id_reserva) {
            warn!("⏳ Acción ignorada: la reserva {} ya tiene una acción en curso", id_reserva);
            return Err(AppError::ActionInProgress(id_reserva));
        }
        Ok(())
    }

    fn guard_transicion(reserva: &Reserva, accion: EstadoReserva) -> AppResult<()> {
        if !reserva.estado.can_transition_to(accion) {
            return Err(AppError::InvalidTransition(format!(
                "No se puede pasar la reserva de '{}' a '{}'",
                reserva.estado, accion
            )));
        }
        Ok(())
    }

    /// Abrir el modal de confirmación (sin llamada de red)
    pub fn request_action(&mut self, reserva: &Reserva, accion: EstadoReserva) -> AppResult<()> {
        self.guard_en_curso(reserva.id_reserva)?;
        Self::guard_transicion(reserva, accion)?;

        debug!("📝 Modal abierto: reserva {} → {}", reserva.id_reserva, accion);
        self.modal = Some(ConfirmacionModal {
            id_reserva: reserva.id_reserva,
            accion,
            observacion: String::new(),
        });
        self.mensaje_error = None;
        self.advertencia = None;
        Ok(())
    }

    /// Actualizar la observación del modal. `false` si no hay modal abierto.
    pub fn set_observacion(&mut self, texto: &str) -> bool {
        match self.modal.as_mut() {
            Some(modal) => {
                modal.observacion = texto.to_string();
                true
            }
            None => false,
        }
    }

    /// Cerrar el modal sin enviar nada
    pub fn cancel_modal(&mut self) {
        self.modal = None;
        self.mensaje_error = None;
        self.advertencia = None;
    }

    /// Validar el modal y marcar la reserva como en curso
    ///
    /// `actual` es la reserva tal como está ahora en el store; si cambió de
    /// estado desde que se abrió el modal se vuelve a comprobar la transición.
    pub fn prepare_confirm(&mut self, actual: Option<&Reserva>) -> AppResult<SolicitudAccion> {
        let modal = self.modal.clone().ok_or_else(|| {
            AppError::InvalidState("No hay ninguna acción pendiente de confirmar".to_string())
        })?;

        self.guard_en_curso(modal.id_reserva)?;
        if let Some(reserva) = actual {
            Self::guard_transicion(reserva, modal.accion)?;
        }

        let observacion = modal.observacion.trim();
        self.advertencia = None;
        match modal.accion.observacion_requerida() {
            ObservacionRequerida::Obligatoria => {
                if let Err(e) = validate_motivo(observacion) {
                    let message = message_of(&e);
                    self.mensaje_error = Some(message.clone());
                    return Err(AppError::Validation(message));
                }
            }
            ObservacionRequerida::Recomendada if observacion.is_empty() => {
                self.advertencia = Some(OBSERVACION_RECOMENDADA.to_string());
            }
            _ => {}
        }

        let solicitud = if modal.accion == EstadoReserva::Cancelada {
            SolicitudAccion::Cancelar {
                id_reserva: modal.id_reserva,
                body: CancelarRequest {
                    motivo: observacion.to_string(),
                },
            }
        } else {
            SolicitudAccion::CambiarEstado {
                id_reserva: modal.id_reserva,
                body: EstadoUpdateRequest {
                    nuevo_estado: modal.accion,
                    observacion: (!observacion.is_empty()).then(|| observacion.to_string()),
                },
            }
        };

        self.en_curso.insert(modal.id_reserva);
        self.mensaje_error = None;
        Ok(solicitud)
    }

    /// Confirmación directa (`pendiente` → `confirmada`) sin modal
    pub fn begin_quick_confirm(&mut self, reserva: &Reserva) -> AppResult<SolicitudAccion> {
        self.guard_en_curso(reserva.id_reserva)?;
        Self::guard_transicion(reserva, EstadoReserva::Confirmada)?;
        self.en_curso.insert(reserva.id_reserva);
        self.mensaje_error = None;
        Ok(SolicitudAccion::Confirmar {
            id_reserva: reserva.id_reserva,
        })
    }

    /// Validar y marcar en curso una calificación
    pub fn begin_rating(
        &mut self,
        reserva: &Reserva,
        lado: LadoCalificacion,
        puntaje: u8,
        comentario: &str,
        nps: Option<u8>,
    ) -> AppResult<CalificacionRequest> {
        self.guard_en_curso(reserva.id_reserva)?;

        if !reserva.estado.is_completed() {
            return Err(AppError::InvalidTransition(
                "Solo se pueden calificar reservas completadas".to_string(),
            ));
        }
        if reserva.ya_calificado(lado) {
            return Err(AppError::Validation("Esta reserva ya fue calificada".to_string()));
        }
        validate_puntaje(puntaje).map_err(|e| AppError::Validation(message_of(&e)))?;
        if let Some(nps) = nps {
            validate_nps(nps).map_err(|e| AppError::Validation(message_of(&e)))?;
        }

        self.en_curso.insert(reserva.id_reserva);
        self.mensaje_error = None;
        Ok(CalificacionRequest {
            puntaje,
            comentario: comentario.trim().to_string(),
            satisfaccion_nps: nps,
        })
    }

    /// Acción aceptada por el servidor: cerrar el modal si apunta a esa
    /// reserva, mostrar el banner y marcar la sincronización. La advertencia
    /// de observación se conserva hasta la siguiente acción.
    pub fn finish_success(&mut self, id_reserva: i64, mensaje: &str) {
        self.en_curso.remove(&id_reserva);
        if self.modal.as_ref().map(|m| m.id_reserva) == Some(id_reserva) {
            self.modal = None;
        }
        self.mensaje_exito = Some(mensaje.to_string());
        self.mensaje_error = None;
        self.sincronizando += 1;
    }

    /// Acción rechazada: el modal sigue abierto y la reserva no se toca
    pub fn finish_failure(&mut self, id_reserva: i64, mensaje: String) {
        self.en_curso.remove(&id_reserva);
        self.mensaje_error = Some(mensaje);
    }

    pub fn finish_sync(&mut self) {
        self.sincronizando = self.sincronizando.saturating_sub(1);
    }

    pub fn dismiss_success(&mut self) {
        self.mensaje_exito = None;
    }

    pub fn dismiss_error(&mut self) {
        self.mensaje_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::MOTIVO_OBLIGATORIO;
    use crate::dto::reserva_dto::RawReserva;
    use serde_json::json;

    fn reserva(id: i64, estado: &str) -> Reserva {
        let raw: RawReserva =
            serde_json::from_value(json!({ "id_reserva": id, "estado": estado })).unwrap();
        raw.into_reserva().unwrap()
    }

    #[test]
    fn test_cancel_requires_motivo() {
        let mut state = AccionesState::new();
        let reserva = reserva(7, "pendiente");
        state.request_action(&reserva, EstadoReserva::Cancelada).unwrap();
        state.set_observacion("   ");

        let err = state.prepare_confirm(Some(&reserva)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(state.mensaje_error(), Some(MOTIVO_OBLIGATORIO));
        assert!(!state.is_loading(7));
        assert!(state.modal().is_some());

        state.set_observacion("  No puedo asistir ");
        let solicitud = state.prepare_confirm(Some(&reserva)).unwrap();
        assert_eq!(
            solicitud,
            SolicitudAccion::Cancelar {
                id_reserva: 7,
                body: CancelarRequest {
                    motivo: "No puedo asistir".to_string()
                }
            }
        );
        assert!(state.is_loading(7));
    }

    #[test]
    fn test_recommended_observation_only_warns() {
        let mut state = AccionesState::new();
        let reserva = reserva(3, "pendiente");
        state.request_action(&reserva, EstadoReserva::Rechazado).unwrap();

        let solicitud = state.prepare_confirm(None).unwrap();
        assert_eq!(state.advertencia(), Some(OBSERVACION_RECOMENDADA));
        match solicitud {
            SolicitudAccion::CambiarEstado { body, .. } => {
                assert_eq!(body.nuevo_estado, EstadoReserva::Rechazado);
                assert_eq!(body.observacion, None);
            }
            other => panic!("solicitud inesperada: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_transition_rejected_before_modal() {
        let mut state = AccionesState::new();
        let err = state
            .request_action(&reserva(1, "cancelada"), EstadoReserva::Aprobado)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
        assert!(state.modal().is_none());
    }

    #[test]
    fn test_same_reservation_cannot_have_two_actions() {
        let mut state = AccionesState::new();
        let reserva_42 = reserva(42, "pendiente");
        state.request_action(&reserva_42, EstadoReserva::Aprobado).unwrap();
        state.prepare_confirm(Some(&reserva_42)).unwrap();

        assert!(matches!(
            state.request_action(&reserva_42, EstadoReserva::Aprobado),
            Err(AppError::ActionInProgress(42))
        ));
        assert!(matches!(
            state.prepare_confirm(Some(&reserva_42)),
            Err(AppError::ActionInProgress(42))
        ));

        // otra reserva sí puede avanzar
        let reserva_43 = reserva(43, "pendiente");
        assert!(state.begin_quick_confirm(&reserva_43).is_ok());
        assert_eq!(state.en_curso(), vec![42, 43]);
    }

    #[test]
    fn test_success_closes_modal_and_marks_sync() {
        let mut state = AccionesState::new();
        let reserva = reserva(5, "aprobado");
        state.request_action(&reserva, EstadoReserva::Completada).unwrap();
        state.set_observacion("Todo bien");
        let solicitud = state.prepare_confirm(Some(&reserva)).unwrap();

        state.finish_success(solicitud.id_reserva(), solicitud.accion().mensaje_exito());
        assert!(state.modal().is_none());
        assert!(!state.is_loading(5));
        assert!(state.sincronizando());
        assert_eq!(state.mensaje_exito(), Some("Reserva marcada como completada"));

        state.finish_sync();
        state.dismiss_success();
        assert!(!state.sincronizando());
        assert!(state.mensaje_exito().is_none());
    }

    #[test]
    fn test_sync_indicator_waits_for_every_reload() {
        let mut state = AccionesState::new();
        let (a, b) = (reserva(1, "pendiente"), reserva(2, "pendiente"));
        state.begin_quick_confirm(&a).unwrap();
        state.begin_quick_confirm(&b).unwrap();

        state.finish_success(1, "Reserva confirmada");
        state.finish_success(2, "Reserva confirmada");
        state.finish_sync();
        assert!(state.sincronizando());

        state.finish_sync();
        assert!(!state.sincronizando());
        state.finish_sync();
        assert!(!state.sincronizando());
    }

    #[test]
    fn test_failure_keeps_modal_open() {
        let mut state = AccionesState::new();
        let reserva = reserva(9, "pendiente");
        state.request_action(&reserva, EstadoReserva::Aprobado).unwrap();
        state.prepare_confirm(Some(&reserva)).unwrap();

        state.finish_failure(9, "La reserva ya fue modificada".to_string());
        assert!(state.modal().is_some());
        assert!(!state.is_loading(9));
        assert_eq!(state.mensaje_error(), Some("La reserva ya fue modificada"));
    }

    #[test]
    fn test_rating_guards() {
        let mut state = AccionesState::new();

        let pendiente = reserva(1, "pendiente");
        assert!(state
            .begin_rating(&pendiente, LadoCalificacion::Cliente, 5, "", None)
            .is_err());

        let completada = reserva(2, "completada");
        assert!(state
            .begin_rating(&completada, LadoCalificacion::Cliente, 0, "", None)
            .is_err());
        assert!(state
            .begin_rating(&completada, LadoCalificacion::Cliente, 4, "", Some(11))
            .is_err());

        let body = state
            .begin_rating(&completada, LadoCalificacion::Cliente, 4, " Excelente ", Some(9))
            .unwrap();
        assert_eq!(body.comentario, "Excelente");
        assert!(state.is_loading(2));

        let mut calificada = reserva(3, "concluido");
        calificada.ya_calificado_proveedor = true;
        assert!(state
            .begin_rating(&calificada, LadoCalificacion::Proveedor, 5, "", None)
            .is_err());
        assert!(state
            .begin_rating(&calificada, LadoCalificacion::Cliente, 5, "", None)
            .is_ok());
    }
}
