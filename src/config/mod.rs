//! Configuración del proyecto
//!
//! Este módulo contiene las variables de entorno del cliente: URL del
//! backend, almacenamiento del token, tamaños de página y temporizadores.

pub mod environment;

pub use environment::*;
