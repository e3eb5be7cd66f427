use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::errors::AppError;

/// Estado de una reserva (conjunto cerrado)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstadoReserva {
    Pendiente,
    Aprobado,
    Confirmada,
    Rechazado,
    Cancelada,
    Concluido,
    Completada,
}

/// Exigencia de observación para una acción
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservacionRequerida {
    Obligatoria,
    Recomendada,
    Opcional,
}

impl EstadoReserva {
    pub const ALL: [EstadoReserva; 7] = [
        EstadoReserva::Pendiente,
        EstadoReserva::Aprobado,
        EstadoReserva::Confirmada,
        EstadoReserva::Rechazado,
        EstadoReserva::Cancelada,
        EstadoReserva::Concluido,
        EstadoReserva::Completada,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoReserva::Pendiente => "pendiente",
            EstadoReserva::Aprobado => "aprobado",
            EstadoReserva::Confirmada => "confirmada",
            EstadoReserva::Rechazado => "rechazado",
            EstadoReserva::Cancelada => "cancelada",
            EstadoReserva::Concluido => "concluido",
            EstadoReserva::Completada => "completada",
        }
    }

    /// Cancelada o completada: ya no admite acciones
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EstadoReserva::Cancelada | EstadoReserva::Concluido | EstadoReserva::Completada
        )
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, EstadoReserva::Concluido | EstadoReserva::Completada)
    }

    /// Tabla de transiciones permitidas por la UI
    pub fn can_transition_to(&self, destino: EstadoReserva) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self, destino) {
            (_, EstadoReserva::Cancelada) => true,
            (
                EstadoReserva::Pendiente,
                EstadoReserva::Aprobado | EstadoReserva::Confirmada | EstadoReserva::Rechazado,
            ) => true,
            (
                EstadoReserva::Aprobado | EstadoReserva::Confirmada,
                EstadoReserva::Concluido | EstadoReserva::Completada,
            ) => true,
            _ => false,
        }
    }

    /// Exigencia de observación cuando este estado es el destino
    pub fn observacion_requerida(&self) -> ObservacionRequerida {
        match self {
            EstadoReserva::Cancelada => ObservacionRequerida::Obligatoria,
            EstadoReserva::Rechazado | EstadoReserva::Concluido | EstadoReserva::Completada => {
                ObservacionRequerida::Recomendada
            }
            _ => ObservacionRequerida::Opcional,
        }
    }

    /// Texto del banner de éxito tras aplicar esta acción
    pub fn mensaje_exito(&self) -> &'static str {
        match self {
            EstadoReserva::Aprobado | EstadoReserva::Confirmada => "Reserva aprobada exitosamente",
            EstadoReserva::Rechazado => "Reserva rechazada",
            EstadoReserva::Cancelada => "Reserva cancelada exitosamente",
            EstadoReserva::Concluido | EstadoReserva::Completada => {
                "Reserva marcada como completada"
            }
            EstadoReserva::Pendiente => "Reserva actualizada",
        }
    }
}

impl fmt::Display for EstadoReserva {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EstadoReserva {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        EstadoReserva::ALL
            .into_iter()
            .find(|estado| estado.as_str() == normalized)
            .ok_or_else(|| AppError::Validation(format!("Estado de reserva desconocido: '{}'", s)))
    }
}

/// Lado que emite una calificación
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LadoCalificacion {
    Cliente,
    Proveedor,
}

impl LadoCalificacion {
    pub fn endpoint(&self, id_reserva: i64) -> String {
        match self {
            LadoCalificacion::Cliente => format!("/calificacion/cliente/{}", id_reserva),
            LadoCalificacion::Proveedor => format!("/calificacion/proveedor/{}", id_reserva),
        }
    }
}

/// Calificación posterior al servicio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calificacion {
    pub puntaje: u8,
    pub comentario: Option<String>,
    pub satisfaccion_nps: Option<u8>,
    pub fecha: Option<String>,
}

/// Reserva en su forma canónica (campos desnormalizados ya resueltos)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reserva {
    pub id_reserva: i64,
    pub id_servicio: i64,
    pub id_usuario: i64,
    pub descripcion: String,
    pub observacion: Option<String>,
    pub fecha: Option<NaiveDate>,
    pub hora_inicio: Option<NaiveTime>,
    pub hora_fin: Option<NaiveTime>,
    pub estado: EstadoReserva,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,

    pub nombre_servicio: String,
    pub precio_servicio: Decimal,
    pub imagen_servicio: Option<String>,
    pub nombre_empresa: String,
    pub nombre_contacto: String,
    pub email_contacto: String,
    pub telefono_contacto: String,
    pub nombre_categoria: String,

    pub calificacion_cliente: Option<Calificacion>,
    pub calificacion_proveedor: Option<Calificacion>,
    pub ya_calificado_cliente: bool,
    pub ya_calificado_proveedor: bool,
}

impl Reserva {
    pub fn ya_calificado(&self, lado: LadoCalificacion) -> bool {
        match lado {
            LadoCalificacion::Cliente => {
                self.ya_calificado_cliente || self.calificacion_cliente.is_some()
            }
            LadoCalificacion::Proveedor => {
                self.ya_calificado_proveedor || self.calificacion_proveedor.is_some()
            }
        }
    }

    /// Solo reservas completadas y aún sin calificar por ese lado
    pub fn puede_calificar(&self, lado: LadoCalificacion) -> bool {
        self.estado.is_completed() && !self.ya_calificado(lado)
    }

    /// Acciones de estado que la UI ofrece para esta reserva
    pub fn acciones_disponibles(&self) -> Vec<EstadoReserva> {
        EstadoReserva::ALL
            .into_iter()
            .filter(|destino| self.estado.can_transition_to(*destino))
            .collect()
    }
}
