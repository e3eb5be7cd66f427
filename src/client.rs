//! Cliente HTTP para el backend de reservas
//!
//! Construye URLs absolutas a partir de rutas relativas y los headers
//! comunes (JSON + `Authorization: Bearer`). El token se lee del
//! `TokenProvider` en cada llamada. Sin reintentos ni cache.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::TokenProvider;
use crate::config::EnvironmentConfig;
use crate::utils::errors::{AppError, AppResult};

/// Cliente HTTP para la API REST
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl ApiClient {
    /// Crear nuevo cliente con la URL base y el timeout configurados
    pub fn new(config: &EnvironmentConfig, tokens: Arc<dyn TokenProvider>) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Config(format!("No se pudo crear el cliente HTTP: {}", e)))?;

        Ok(Self {
            client,
            base_url: crate::config::environment::normalize_base_url(&config.api_base_url),
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL absoluta para un endpoint relativo
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Headers de cada request: JSON + bearer (si hay token almacenado)
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = self.tokens.token() {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("⚠️ Token almacenado con caracteres inválidos, se omite"),
            }
        }

        headers
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(String, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.url(endpoint), build_query(query));
        let response = self.request(Method::GET, &url).send().await?;
        decode(response).await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> AppResult<T> {
        let url = self.url(endpoint);
        let response = self.request(Method::POST, &url).json(body).send().await?;
        decode(response).await
    }

    pub async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> AppResult<T> {
        let url = self.url(endpoint);
        let response = self.request(Method::PUT, &url).json(body).send().await?;
        decode(response).await
    }

    /// PUT sin cuerpo (p. ej. `/reservas/{id}/confirmar`)
    pub async fn put_empty<T: DeserializeOwned>(&self, endpoint: &str) -> AppResult<T> {
        let url = self.url(endpoint);
        let response = self.request(Method::PUT, &url).send().await?;
        decode(response).await
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        debug!("🌐 {} {}", method, url);
        self.client.request(method, url).headers(self.headers())
    }
}

/// Serializar los parámetros de consulta (`?a=1&b=x%20y`), vacío si no hay
pub fn build_query(pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return String::new();
    }
    let encoded: Vec<String> = pairs
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect();
    format!("?{}", encoded.join("&"))
}

async fn decode<T: DeserializeOwned>(response: Response) -> AppResult<T> {
    let status = response.status();
    let text = response.text().await?;
    let body: Option<Value> = if text.trim().is_empty() {
        None
    } else {
        serde_json::from_str(&text).ok()
    };

    if !status.is_success() {
        warn!("❌ Respuesta HTTP {}: {}", status, text);
        return Err(AppError::from_response(status.as_u16(), body));
    }

    debug!("📡 Respuesta HTTP {}", status);
    Ok(serde_json::from_value(body.unwrap_or(Value::Null))?)
}
