use thiserror::Error;

/// Error del dominio CAPA (entidades y value objects).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    ValidationError(String),
    #[error("parse error: {0}")]
    ParseError(String),
}
