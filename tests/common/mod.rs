#![allow(dead_code)]

use std::sync::Arc;

use booking_client::cache::{StaticToken, TokenProvider};
use booking_client::client::ApiClient;
use booking_client::config::EnvironmentConfig;
use booking_client::dto::RawReserva;
use booking_client::models::Reserva;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Servidor HTTP de una sola respuesta; devuelve el request recibido
pub struct OneShotServer {
    pub base_url: String,
    handle: JoinHandle<Vec<String>>,
}

impl OneShotServer {
    pub async fn respond(status: u16, body: &str) -> Self {
        Self::script(&[(status, body)]).await
    }

    /// Responder en orden, una conexión por respuesta
    pub async fn script(responses: &[(u16, &str)]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let responses: Vec<(u16, String)> = responses
            .iter()
            .map(|(status, body)| (*status, body.to_string()))
            .collect();

        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                requests.push(read_request(&mut socket).await);

                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason(status),
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
            requests
        });

        Self { base_url, handle }
    }

    /// Request completo (línea, headers y cuerpo)
    pub async fn request(self) -> String {
        self.requests().await.remove(0)
    }

    /// Todos los requests recibidos, en orden
    pub async fn requests(self) -> Vec<String> {
        self.handle.await.unwrap()
    }
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "conexión cerrada antes de los headers");
        buffer.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buffer, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buffer[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buffer.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
    }

    String::from_utf8_lossy(&buffer).to_string()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        409 => "Conflict",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

pub fn api_client(base_url: &str, token: StaticToken) -> Arc<ApiClient> {
    let config = EnvironmentConfig {
        api_base_url: base_url.to_string(),
        ..EnvironmentConfig::default()
    };
    let tokens: Arc<dyn TokenProvider> = Arc::new(token);
    Arc::new(ApiClient::new(&config, tokens).unwrap())
}

pub fn reserva(id: i64, estado: &str) -> Reserva {
    let raw: RawReserva = serde_json::from_value(json!({
        "id_reserva": id,
        "estado": estado,
        "nombre_servicio": format!("Servicio {}", id),
    }))
    .unwrap();
    raw.into_reserva().unwrap()
}
