//! Filtros del listado de reservas
//!
//! Los textos se recortan antes de enviarse y solo viajan al servidor si
//! tienen al menos `MIN_FILTER_LENGTH` caracteres; los más cortos se evalúan
//! sobre la página ya cargada.

use chrono::NaiveDate;
use serde::Serialize;

use super::reserva::{EstadoReserva, Reserva};

pub const MIN_FILTER_LENGTH: usize = 3;

/// Filtro por estado: todos o uno concreto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FiltroEstado {
    #[default]
    Todos,
    Estado(EstadoReserva),
}

/// Campos de texto filtrables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampoFiltro {
    Search,
    NombreServicio,
    NombreEmpresa,
    NombreContacto,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FiltrosReserva {
    pub search: String,
    pub nombre_servicio: String,
    pub nombre_empresa: String,
    pub nombre_contacto: String,
    pub fecha_desde: Option<NaiveDate>,
    pub fecha_hasta: Option<NaiveDate>,
    pub estado: FiltroEstado,
}

impl FiltrosReserva {
    pub fn texto(&self, campo: CampoFiltro) -> &str {
        match campo {
            CampoFiltro::Search => &self.search,
            CampoFiltro::NombreServicio => &self.nombre_servicio,
            CampoFiltro::NombreEmpresa => &self.nombre_empresa,
            CampoFiltro::NombreContacto => &self.nombre_contacto,
        }
    }

    pub fn set_texto(&mut self, campo: CampoFiltro, valor: impl Into<String>) {
        let valor = valor.into();
        match campo {
            CampoFiltro::Search => self.search = valor,
            CampoFiltro::NombreServicio => self.nombre_servicio = valor,
            CampoFiltro::NombreEmpresa => self.nombre_empresa = valor,
            CampoFiltro::NombreContacto => self.nombre_contacto = valor,
        }
    }

    fn textos(&self) -> [(CampoFiltro, &'static str, &str); 4] {
        [
            (CampoFiltro::Search, "search", self.search.as_str()),
            (CampoFiltro::NombreServicio, "nombre_servicio", self.nombre_servicio.as_str()),
            (CampoFiltro::NombreEmpresa, "nombre_empresa", self.nombre_empresa.as_str()),
            (CampoFiltro::NombreContacto, "nombre_contacto", self.nombre_contacto.as_str()),
        ]
    }

    /// Número de filtros distintos de su valor por defecto
    pub fn active_count(&self) -> usize {
        let textos = self
            .textos()
            .iter()
            .filter(|(_, _, valor)| !valor.trim().is_empty())
            .count();
        let predicados = [
            self.fecha_desde.is_some(),
            self.fecha_hasta.is_some(),
            self.estado != FiltroEstado::Todos,
        ];
        textos + predicados.iter().filter(|activo| **activo).count()
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    /// Parámetros que viajan al servidor (sin paginación)
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .textos()
            .iter()
            .filter_map(|(_, key, valor)| {
                let valor = valor.trim();
                (valor.chars().count() >= MIN_FILTER_LENGTH)
                    .then(|| (key.to_string(), valor.to_string()))
            })
            .collect();

        if let Some(desde) = self.fecha_desde {
            pairs.push(("fecha_desde".to_string(), desde.format("%Y-%m-%d").to_string()));
        }
        if let Some(hasta) = self.fecha_hasta {
            pairs.push(("fecha_hasta".to_string(), hasta.format("%Y-%m-%d").to_string()));
        }
        if let FiltroEstado::Estado(estado) = self.estado {
            pairs.push(("estado".to_string(), estado.as_str().to_string()));
        }
        pairs
    }

    /// Aplicar localmente los filtros de texto demasiado cortos para el servidor
    pub fn matches_locally(&self, reserva: &Reserva) -> bool {
        self.textos().iter().all(|(campo, _, valor)| {
            let valor = valor.trim();
            let len = valor.chars().count();
            if len == 0 || len >= MIN_FILTER_LENGTH {
                return true;
            }
            let needle = valor.to_lowercase();
            let contains = |texto: &str| texto.to_lowercase().contains(&needle);
            match campo {
                CampoFiltro::Search => {
                    contains(&reserva.descripcion)
                        || contains(&reserva.nombre_servicio)
                        || contains(&reserva.nombre_empresa)
                        || contains(&reserva.nombre_contacto)
                }
                CampoFiltro::NombreServicio => contains(&reserva.nombre_servicio),
                CampoFiltro::NombreEmpresa => contains(&reserva.nombre_empresa),
                CampoFiltro::NombreContacto => contains(&reserva.nombre_contacto),
            }
        })
    }
}
