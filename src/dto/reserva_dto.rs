//! DTOs de reservas
//!
//! Payloads de `/reservas/*` y `/calificacion/*`, y el mapeo del formato del
//! backend a la `Reserva` canónica.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::reserva::{Calificacion, EstadoReserva, Reserva};

pub const SERVICIO_SIN_NOMBRE: &str = "Servicio sin nombre";
pub const EMPRESA_NO_ESPECIFICADA: &str = "Empresa no especificada";
pub const CONTACTO_NO_DISPONIBLE: &str = "Contacto no disponible";
pub const SIN_CATEGORIA: &str = "Sin categoría";
pub const NO_ESPECIFICADO: &str = "No especificado";

/// Reserva tal como la devuelve el backend (campos desnormalizados opcionales)
#[derive(Debug, Clone, Deserialize)]
pub struct RawReserva {
    #[serde(alias = "id")]
    pub id_reserva: i64,
    pub id_servicio: Option<i64>,
    pub id_usuario: Option<i64>,
    pub descripcion: Option<String>,
    pub observacion: Option<String>,
    pub fecha: Option<String>,
    pub hora_inicio: Option<String>,
    pub hora_fin: Option<String>,
    pub estado: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,

    #[serde(alias = "servicio_nombre")]
    pub nombre_servicio: Option<String>,
    #[serde(alias = "precio")]
    pub precio_servicio: Option<Decimal>,
    #[serde(alias = "imagen")]
    pub imagen_servicio: Option<String>,
    #[serde(alias = "empresa_nombre")]
    pub nombre_empresa: Option<String>,
    pub nombre_contacto: Option<String>,
    pub email_contacto: Option<String>,
    pub telefono_contacto: Option<String>,
    #[serde(alias = "categoria_nombre")]
    pub nombre_categoria: Option<String>,

    pub calificacion_cliente: Option<Calificacion>,
    pub calificacion_proveedor: Option<Calificacion>,
    pub ya_calificado_cliente: Option<bool>,
    pub ya_calificado_proveedor: Option<bool>,
}

/// Respuesta del listado: `{reservas, total}` o, en backends antiguos, un array
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ReservasPayload {
    Paginado {
        reservas: Vec<RawReserva>,
        total: Option<u64>,
    },
    Legacy(Vec<RawReserva>),
}

impl ReservasPayload {
    /// Reservas canónicas y total informado (en el formato legacy, su longitud)
    pub fn into_parts(self) -> (Vec<Reserva>, u64) {
        let (raw, total) = match self {
            ReservasPayload::Paginado { reservas, total } => {
                let total = total.unwrap_or(reservas.len() as u64);
                (reservas, total)
            }
            ReservasPayload::Legacy(reservas) => {
                let total = reservas.len() as u64;
                (reservas, total)
            }
        };
        let reservas = raw.into_iter().filter_map(RawReserva::into_reserva).collect();
        (reservas, total)
    }
}

impl RawReserva {
    /// Mapear a la forma canónica; descarta estados fuera del conjunto cerrado
    pub fn into_reserva(self) -> Option<Reserva> {
        let estado = match self.estado.as_deref().map(str::parse::<EstadoReserva>) {
            Some(Ok(estado)) => estado,
            None => EstadoReserva::Pendiente,
            Some(Err(e)) => {
                warn!("⚠️ Reserva {} descartada: {}", self.id_reserva, e);
                return None;
            }
        };

        Some(Reserva {
            id_reserva: self.id_reserva,
            id_servicio: self.id_servicio.unwrap_or_default(),
            id_usuario: self.id_usuario.unwrap_or_default(),
            descripcion: self.descripcion.unwrap_or_default(),
            observacion: non_empty(self.observacion),
            fecha: self.fecha.as_deref().and_then(parse_date),
            hora_inicio: self.hora_inicio.as_deref().and_then(parse_time),
            hora_fin: self.hora_fin.as_deref().and_then(parse_time),
            estado,
            created_at: self.created_at.as_deref().and_then(parse_timestamp),
            updated_at: self.updated_at.as_deref().and_then(parse_timestamp),
            nombre_servicio: or_placeholder(self.nombre_servicio, SERVICIO_SIN_NOMBRE),
            precio_servicio: self.precio_servicio.unwrap_or(Decimal::ZERO),
            imagen_servicio: non_empty(self.imagen_servicio),
            nombre_empresa: or_placeholder(self.nombre_empresa, EMPRESA_NO_ESPECIFICADA),
            nombre_contacto: or_placeholder(self.nombre_contacto, CONTACTO_NO_DISPONIBLE),
            email_contacto: or_placeholder(self.email_contacto, NO_ESPECIFICADO),
            telefono_contacto: or_placeholder(self.telefono_contacto, NO_ESPECIFICADO),
            nombre_categoria: or_placeholder(self.nombre_categoria, SIN_CATEGORIA),
            ya_calificado_cliente: self
                .ya_calificado_cliente
                .unwrap_or(self.calificacion_cliente.is_some()),
            ya_calificado_proveedor: self
                .ya_calificado_proveedor
                .unwrap_or(self.calificacion_proveedor.is_some()),
            calificacion_cliente: self.calificacion_cliente,
            calificacion_proveedor: self.calificacion_proveedor,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn or_placeholder(value: Option<String>, placeholder: &str) -> String {
    non_empty(value).unwrap_or_else(|| placeholder.to_string())
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(value).map(|ts| ts.date()))
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

/// Cuerpo de `PUT /reservas/{id}/estado`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstadoUpdateRequest {
    pub nuevo_estado: EstadoReserva,
    pub observacion: Option<String>,
}

/// Cuerpo de `PUT /reservas/{id}/cancelar`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancelarRequest {
    pub motivo: String,
}

/// Cuerpo de `POST /calificacion/{lado}/{id}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalificacionRequest {
    pub puntaje: u8,
    pub comentario: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub satisfaccion_nps: Option<u8>,
}
