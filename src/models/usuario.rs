use serde::{Deserialize, Serialize};

/// Usuario visto desde la administración
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usuario {
    #[serde(alias = "id_usuario")]
    pub id: i64,
    #[serde(default)]
    pub nombre_persona: Option<String>,
    #[serde(default)]
    pub nombre_empresa: Option<String>,
    pub email: String,
    #[serde(default)]
    pub rol: Option<String>,
    #[serde(default = "default_activo")]
    pub estado: bool,
}

fn default_activo() -> bool {
    true
}

impl Usuario {
    pub fn display_name(&self) -> &str {
        self.nombre_persona
            .as_deref()
            .or(self.nombre_empresa.as_deref())
            .unwrap_or(&self.email)
    }
}

/// Página de usuarios del listado de administración
#[derive(Debug, Clone, PartialEq)]
pub struct UsuariosPage {
    pub usuarios: Vec<Usuario>,
    pub total: u64,
}
