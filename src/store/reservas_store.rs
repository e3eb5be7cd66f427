//! Store de reservas
//!
//! Estado puro del listado: pestaña, filtros, paginación y la colección
//! cargada. No hace I/O; `begin_load` describe la carga a ejecutar y
//! `finish_load` aplica su resultado.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::models::filtros::{CampoFiltro, FiltroEstado, FiltrosReserva};
use crate::models::pagination::{offset_for, Pagination};
use crate::models::reserva::{EstadoReserva, Reserva};
use crate::services::reservas_service::{ReservasPage, ReservasTab};
use crate::utils::errors::{AppError, AppResult};

pub const LOAD_ERROR_FALLBACK: &str = "No se pudieron cargar las reservas";

/// Carga pendiente de ejecutar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub seq: u64,
    pub tab: ReservasTab,
    pub page: u32,
    pub query: Vec<(String, String)>,
}

/// Conteos por estado sobre la colección cargada
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConteoEstados {
    pub total: usize,
    pub pendientes: usize,
    pub aprobadas: usize,
    pub rechazadas: usize,
    pub canceladas: usize,
    pub completadas: usize,
}

impl ConteoEstados {
    fn sumar(&mut self, estado: EstadoReserva) {
        self.total += 1;
        match estado {
            EstadoReserva::Pendiente => self.pendientes += 1,
            EstadoReserva::Aprobado | EstadoReserva::Confirmada => self.aprobadas += 1,
            EstadoReserva::Rechazado => self.rechazadas += 1,
            EstadoReserva::Cancelada => self.canceladas += 1,
            EstadoReserva::Concluido | EstadoReserva::Completada => self.completadas += 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReservasStore {
    tab: ReservasTab,
    filtros: FiltrosReserva,
    pagination: Pagination,
    reservas: Vec<Reserva>,
    page_size: u32,
    pending_loads: usize,
    next_seq: u64,
    last_applied: Option<u64>,
    error: Option<String>,
}

impl ReservasStore {
    pub fn new(page_size: u32) -> Self {
        let page_size = page_size.max(1);
        Self {
            tab: ReservasTab::default(),
            filtros: FiltrosReserva::default(),
            pagination: Pagination::empty(page_size),
            reservas: Vec::new(),
            page_size,
            pending_loads: 0,
            next_seq: 0,
            last_applied: None,
            error: None,
        }
    }

    pub fn tab(&self) -> ReservasTab {
        self.tab
    }

    pub fn filtros(&self) -> &FiltrosReserva {
        &self.filtros
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Colección completa de la última carga aplicada
    pub fn reservas(&self) -> &[Reserva] {
        &self.reservas
    }

    /// Colección con los filtros cortos aplicados localmente
    pub fn visible_reservas(&self) -> Vec<&Reserva> {
        self.reservas
            .iter()
            .filter(|reserva| self.filtros.matches_locally(reserva))
            .collect()
    }

    pub fn find(&self, id_reserva: i64) -> Option<&Reserva> {
        self.reservas.iter().find(|r| r.id_reserva == id_reserva)
    }

    pub fn is_loading(&self) -> bool {
        self.pending_loads > 0
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_applied(&self) -> Option<u64> {
        self.last_applied
    }

    pub fn active_filter_count(&self) -> usize {
        self.filtros.active_count()
    }

    pub fn counts(&self) -> ConteoEstados {
        let mut conteo = ConteoEstados::default();
        for reserva in &self.reservas {
            conteo.sumar(reserva.estado);
        }
        conteo
    }

    /// Parámetros de la consulta para una página
    pub fn query_for(&self, page: u32) -> Vec<(String, String)> {
        let mut query = vec![
            ("limit".to_string(), self.page_size.to_string()),
            ("offset".to_string(), offset_for(page, self.page_size).to_string()),
        ];
        query.extend(self.filtros.query_pairs());
        query
    }

    /// Preparar la carga de una página; `None` en la pestaña de agenda
    pub fn begin_load(&mut self, page: u32) -> Option<LoadRequest> {
        self.tab.endpoint()?;

        let page = page.max(1);
        self.next_seq += 1;
        self.pending_loads += 1;

        Some(LoadRequest {
            seq: self.next_seq,
            tab: self.tab,
            page,
            query: self.query_for(page),
        })
    }

    /// Aplicar el resultado de una carga
    ///
    /// La última carga en resolverse reemplaza la colección completa. Un
    /// error deja la colección anterior intacta y se devuelve tras guardar
    /// su mensaje. Resultados de otra pestaña se ignoran.
    pub fn finish_load(
        &mut self,
        request: &LoadRequest,
        result: AppResult<ReservasPage>,
    ) -> AppResult<()> {
        self.pending_loads = self.pending_loads.saturating_sub(1);

        if request.tab != self.tab {
            debug!("🗑️ Carga #{} descartada: la pestaña cambió a '{}'", request.seq, self.tab);
            return Ok(());
        }

        match result {
            Ok(page) => {
                self.reservas = page.reservas;
                self.pagination = Pagination::new(page.total, request.page, self.page_size);
                self.last_applied = Some(request.seq);
                self.error = None;
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.user_message(LOAD_ERROR_FALLBACK));
                Err(e)
            }
        }
    }

    /// Cambiar de pestaña. Devuelve `true` si cambió.
    pub fn set_tab(&mut self, tab: ReservasTab) -> bool {
        if self.tab == tab {
            return false;
        }
        self.tab = tab;
        self.reservas.clear();
        self.pagination = Pagination::empty(self.page_size);
        self.error = None;
        true
    }

    /// Actualizar un filtro de texto. Devuelve `true` si cambió la consulta
    /// que viaja al servidor.
    pub fn set_filtro_texto(&mut self, campo: CampoFiltro, valor: &str) -> bool {
        let before = self.filtros.query_pairs();
        self.filtros.set_texto(campo, valor);
        before != self.filtros.query_pairs()
    }

    pub fn set_estado_filtro(&mut self, estado: FiltroEstado) -> bool {
        if self.filtros.estado == estado {
            return false;
        }
        self.filtros.estado = estado;
        true
    }

    pub fn set_fechas(
        &mut self,
        desde: Option<NaiveDate>,
        hasta: Option<NaiveDate>,
    ) -> AppResult<bool> {
        if let (Some(desde), Some(hasta)) = (desde, hasta) {
            if desde > hasta {
                return Err(AppError::Validation(
                    "La fecha desde no puede ser posterior a la fecha hasta".to_string(),
                ));
            }
        }
        let changed = self.filtros.fecha_desde != desde || self.filtros.fecha_hasta != hasta;
        self.filtros.fecha_desde = desde;
        self.filtros.fecha_hasta = hasta;
        Ok(changed)
    }

    /// Reemplazar todos los filtros de una vez. Devuelve `true` si cambió
    /// la consulta.
    pub fn replace_filters(&mut self, filtros: FiltrosReserva) -> AppResult<bool> {
        if let (Some(desde), Some(hasta)) = (filtros.fecha_desde, filtros.fecha_hasta) {
            if desde > hasta {
                return Err(AppError::Validation(
                    "La fecha desde no puede ser posterior a la fecha hasta".to_string(),
                ));
            }
        }
        let before = self.filtros.query_pairs();
        self.filtros = filtros;
        Ok(before != self.filtros.query_pairs())
    }

    /// Limpiar todos los filtros. Devuelve `true` si cambió la consulta.
    pub fn clear_filters(&mut self) -> bool {
        let before = self.filtros.query_pairs();
        self.filtros = FiltrosReserva::default();
        !before.is_empty()
    }
}
