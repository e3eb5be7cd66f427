//! Cliente del marketplace de servicios: reservas, acciones sobre reservas,
//! calificaciones y recuperación de contraseña contra la API REST.

pub mod cache;
pub mod client;
pub mod config;
pub mod controllers;
pub mod dto;
pub mod models;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;

pub use state::AppState;
pub use utils::errors::{AppError, AppResult};
