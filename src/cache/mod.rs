//! Cache
//!
//! Este módulo contiene el acceso al token de autenticación persistido.

pub mod token_store;

pub use token_store::{FileTokenStore, StaticToken, TokenProvider};
