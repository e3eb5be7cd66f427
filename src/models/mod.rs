//! Modelos del sistema
//!
//! Este módulo contiene los tipos de dominio del cliente: reservas y sus
//! estados, filtros, paginación y usuarios de administración.

pub mod filtros;
pub mod pagination;
pub mod reserva;
pub mod usuario;

pub use filtros::{CampoFiltro, FiltroEstado, FiltrosReserva, MIN_FILTER_LENGTH};
pub use pagination::Pagination;
pub use reserva::{Calificacion, EstadoReserva, LadoCalificacion, ObservacionRequerida, Reserva};
pub use usuario::{Usuario, UsuariosPage};
