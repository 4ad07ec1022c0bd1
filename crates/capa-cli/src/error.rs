use capa_core::{CoreEngineError, ErrorKind};
use capa_domain::DomainError;
use capa_persistence::PersistenceError;
use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Engine(#[from] CoreEngineError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// 2 uso, 3 validación, 4 autorización / conflicto de estado, 5 backend.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => 2,
            CliError::Domain(_) => 3,
            CliError::Engine(e) => match e.kind() {
                ErrorKind::Validation => 3,
                ErrorKind::Authorization | ErrorKind::StateConflict => 4,
                ErrorKind::Store => 5,
            },
            CliError::Persistence(_) | CliError::Io { .. } | CliError::Output(_) => 5,
        }
    }
}
