//! Token de autenticación persistido localmente
//!
//! El flujo de login (externo a este cliente) escribe el token; aquí solo se
//! lee, y siempre en el momento de cada request (nunca se cachea).

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

/// Capacidad de solo lectura sobre el token bearer
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Token fijo (tests y ejecuciones con `API_TOKEN`)
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl TokenProvider for StaticToken {
    fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

#[derive(Debug, Deserialize)]
struct StoredToken {
    #[serde(alias = "access_token")]
    token: Option<String>,
}

/// Token guardado en un archivo: texto plano o JSON `{"token": "..."}`
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenProvider for FileTokenStore {
    fn token(&self) -> Option<String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("🔑 Sin token en {}", self.path.display());
                return None;
            }
            Err(e) => {
                warn!("⚠️ No se pudo leer el token en {}: {}", self.path.display(), e);
                return None;
            }
        };
        parse_token(&raw)
    }
}

fn parse_token(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        return match serde_json::from_str::<StoredToken>(trimmed) {
            Ok(stored) => stored.token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
            Err(e) => {
                warn!("⚠️ Token almacenado con formato inválido: {}", e);
                None
            }
        };
    }
    Some(trimmed.to_string()).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("booking-client-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_parse_token_formats() {
        assert_eq!(parse_token("abc.def\n").as_deref(), Some("abc.def"));
        assert_eq!(parse_token(r#"{"token": "xyz"}"#).as_deref(), Some("xyz"));
        assert_eq!(parse_token(r#"{"access_token": "xyz"}"#).as_deref(), Some("xyz"));
        assert_eq!(parse_token(r#"{"token": null}"#), None);
        assert_eq!(parse_token("   "), None);
    }

    #[test]
    fn test_file_store_reads_fresh_value_each_call() {
        let path = temp_path("fresh");
        let store = FileTokenStore::new(&path);
        assert_eq!(store.token(), None);

        fs::write(&path, "primero").unwrap();
        assert_eq!(store.token().as_deref(), Some("primero"));

        fs::write(&path, r#"{"token": "segundo"}"#).unwrap();
        assert_eq!(store.token().as_deref(), Some("segundo"));

        fs::remove_file(&path).unwrap();
        assert_eq!(store.token(), None);
    }

    #[test]
    fn test_static_token() {
        assert_eq!(StaticToken::new("t0k3n").token().as_deref(), Some("t0k3n"));
        assert_eq!(StaticToken::anonymous().token(), None);
    }
}
