//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del cliente: URL base del backend,
//! almacenamiento del token, tamaños de página y temporizadores de la UI.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::utils::errors::{AppError, AppResult};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TOKEN_PATH: &str = ".booking/token";
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub api_base_url: String,
    pub token_path: PathBuf,
    /// Token fijo; si está definido tiene prioridad sobre el archivo
    pub api_token: Option<String>,
    pub page_size: u32,
    pub request_timeout: Duration,
    pub search_debounce: Duration,
    pub success_banner: Duration,
    pub error_banner: Duration,
    pub admin_retry_attempts: u32,
    pub admin_retry_delay: Duration,
    pub log_level: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            api_base_url: DEFAULT_API_URL.to_string(),
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            api_token: None,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: Duration::from_secs(30),
            search_debounce: Duration::from_millis(500),
            success_banner: Duration::from_secs(3),
            error_banner: Duration::from_secs(5),
            admin_retry_attempts: 2,
            admin_retry_delay: Duration::from_millis(1000),
            log_level: "info".to_string(),
        }
    }
}

impl EnvironmentConfig {
    /// Cargar la configuración desde variables de entorno (una sola vez, al arrancar)
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();

        let page_size = parse_var("RESERVAS_PAGE_SIZE", defaults.page_size)?;
        if page_size == 0 {
            return Err(AppError::Config(
                "RESERVAS_PAGE_SIZE must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            api_base_url: normalize_base_url(
                &env::var("API_URL").unwrap_or(defaults.api_base_url),
            ),
            token_path: env::var("TOKEN_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.token_path),
            api_token: env::var("API_TOKEN")
                .ok()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            page_size,
            request_timeout: Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", 30u64)?),
            search_debounce: Duration::from_millis(parse_var("SEARCH_DEBOUNCE_MS", 500u64)?),
            success_banner: Duration::from_secs(parse_var("SUCCESS_BANNER_SECS", 3u64)?),
            error_banner: Duration::from_secs(parse_var("ERROR_BANNER_SECS", 5u64)?),
            admin_retry_attempts: parse_var("ADMIN_RETRY_ATTEMPTS", defaults.admin_retry_attempts)?,
            admin_retry_delay: Duration::from_millis(parse_var("ADMIN_RETRY_DELAY_MS", 1000u64)?),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a valid number, got '{}'", key, raw))),
        Err(_) => Ok(default),
    }
}

/// Quitar las barras finales de la URL base
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
