use serde::Deserialize;

use crate::models::usuario::{Usuario, UsuariosPage};

/// Respuesta de `/admin/users`: `{users, total}` o un array
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UsuariosPayload {
    Paginado {
        #[serde(alias = "usuarios")]
        users: Vec<Usuario>,
        total: Option<u64>,
    },
    Legacy(Vec<Usuario>),
}

impl From<UsuariosPayload> for UsuariosPage {
    fn from(payload: UsuariosPayload) -> Self {
        match payload {
            UsuariosPayload::Paginado { users, total } => {
                let total = total.unwrap_or(users.len() as u64);
                UsuariosPage { usuarios: users, total }
            }
            UsuariosPayload::Legacy(users) => UsuariosPage {
                total: users.len() as u64,
                usuarios: users,
            },
        }
    }
}
