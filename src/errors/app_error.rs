use capa_core::{CoreEngineError, ErrorKind};
use capa_persistence::PersistenceError;
use thiserror::Error;

/// Errores de la aplicación (binarios y demo).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Error del motor: {0}")]
    Core(#[from] CoreEngineError),
    #[error("Error de persistencia: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Resultado inesperado: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn engine_kind(&self) -> Option<ErrorKind> {
        match self {
            AppError::Core(e) => Some(e.kind()),
            _ => None,
        }
    }
}
