//! Controllers module
//!
//! Capas asíncronas que conectan los stores con los servicios HTTP y
//! gestionan los temporizadores de la UI.

pub mod password_reset_controller;
pub mod reservas_controller;

pub use password_reset_controller::PasswordResetController;
pub use reservas_controller::{ReservasController, ReservasTimings, ReservasView};
