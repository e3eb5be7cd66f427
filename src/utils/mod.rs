//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación,
//! debounce de temporizadores y reintentos acotados.

pub mod debounce;
pub mod errors;
pub mod retry;
pub mod validation;

pub use errors::{AppError, AppResult};
