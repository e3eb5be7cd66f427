//! DTOs - cuerpos de request/response de la API REST

pub mod password_reset_dto;
pub mod reserva_dto;
pub mod usuario_dto;

pub use password_reset_dto::*;
pub use reserva_dto::{
    CalificacionRequest, CancelarRequest, EstadoUpdateRequest, RawReserva, ReservasPayload,
};
pub use usuario_dto::UsuariosPayload;
