//! User profile view model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::usuarios;

/// Profile shown after sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Perfil {
    pub id: i32,
    pub nombre: Option<String>,
    pub email: String,
    pub rol: String,
    pub fecha_ingreso: DateTime<Utc>,
}

impl Perfil {
    /// Name to greet the user with; falls back to the email.
    pub fn display_name(&self) -> &str {
        self.nombre
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }

    /// First login: the profile still has no name.
    pub fn needs_name(&self) -> bool {
        self.nombre.as_deref().is_none_or(|n| n.trim().is_empty())
    }
}

impl From<usuarios::Model> for Perfil {
    fn from(model: usuarios::Model) -> Self {
        Self {
            id: model.id,
            nombre: model.nombre,
            email: model.email,
            rol: model.rol.unwrap_or_else(|| "Encargado de Inventario".to_string()),
            fecha_ingreso: model.created_at.with_timezone(&Utc),
        }
    }
}
