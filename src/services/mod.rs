//! Services module
//!
//! Este módulo contiene los servicios que hablan con la API REST. Cada
//! servicio expone un trait asíncrono que los controladores consumen.

pub mod admin_users_service;
pub mod password_reset_service;
pub mod reservas_service;

pub use admin_users_service::AdminUsersService;
pub use password_reset_service::{PasswordResetApi, PasswordResetService};
pub use reservas_service::{ReservasApi, ReservasPage, ReservasService, ReservasTab};
