//! Store module
//!
//! Máquinas de estado puras: reciben eventos y resultados de red, y
//! devuelven los requests a ejecutar. No hacen I/O.

pub mod acciones;
pub mod password_reset;
pub mod reservas_store;

pub use acciones::{AccionesState, ConfirmacionModal, SolicitudAccion};
pub use password_reset::{CodeCountdown, PasoReset, PasswordResetWizard};
pub use reservas_store::{ConteoEstados, LoadRequest, ReservasStore};
