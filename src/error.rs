//! Error types and handling.

use thiserror::Error;

use crate::permissions::Capability;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend rejected the credentials or the session
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Authenticated, but the email is not enabled in `usuarios`
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Device capability refused
    #[error("Permission denied: {0}")]
    PermissionDenied(Capability),

    /// Object storage rejected the upload
    #[error("Storage error: {0}")]
    Storage(String),

    /// Data parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// PDF or Excel rendering error
    #[error("Export error: {0}")]
    Export(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Create a parse error with message
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a config error with message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error with message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error with message
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an auth error with message
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create an export error with message
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Text shown to the user in a transient notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Http(_) => {
                "No se pudo contactar al servidor. Revisa tu conexión e inténtalo de nuevo.".to_string()
            }
            Self::Auth(msg) => format!("No se pudo iniciar sesión: {msg}"),
            Self::AccessDenied(msg) => msg.clone(),
            Self::PermissionDenied(capability) => {
                format!("Por favor, concede el permiso de {} para continuar.", capability.label())
            }
            Self::Storage(msg) => format!("Error al subir imagen: {msg}"),
            Self::Validation(msg) => msg.clone(),
            Self::NotFound(msg) => format!("No se encontró {msg}."),
            Self::Export(msg) => format!("No se pudo generar el archivo: {msg}"),
            Self::Io(e) => format!("Error al guardar archivo: {e}"),
            Self::Parse(msg) | Self::Config(msg) => msg.clone(),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        Self::Export(e.to_string())
    }
}

impl From<genpdf::error::Error> for AppError {
    fn from(e: genpdf::error::Error) -> Self {
        Self::Export(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_shown_verbatim() {
        let err = AppError::validation("El código es obligatorio");
        assert_eq!(err.user_message(), "El código es obligatorio");
    }

    #[test]
    fn test_permission_message_names_capability() {
        let err = AppError::PermissionDenied(Capability::Filesystem);
        assert!(err.user_message().contains("almacenamiento"));
    }
}
