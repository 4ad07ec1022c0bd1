//! Errores del core.
//!
//! `StoreError` lo devuelven los colaboradores de persistencia;
//! `CoreEngineError` es lo que ve quien invoca al motor. Ningún error es
//! fatal para el proceso: el caller vuelve a pedir las acciones permitidas y
//! el usuario puede reintentar.

use capa_domain::{ActorId, DomainError, WorkflowStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::machine::CommandKind;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum StoreError {
    #[error("workflow {0} not found")]
    NotFound(Uuid),
    #[error("stale write on workflow {id}: expected version {expected}, found {actual}")]
    VersionConflict { id: Uuid, expected: u64, actual: u64 },
    /// El append no continúa la última entrada: otro escritor anexó antes.
    #[error("history of workflow {workflow_id} moved: expected seq {expected}, next free is {actual}")]
    SeqConflict { workflow_id: Uuid, expected: u64, actual: u64 },
    #[error("store backend: {0}")]
    Backend(String),
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CoreEngineError {
    #[error("validation: {0}")]
    Validation(String),
    #[error("actor {actor} may not {command} a workflow in status {status}")]
    Authorization {
        actor: ActorId,
        command: CommandKind,
        status: WorkflowStatus,
    },
    #[error("state conflict: {0}")]
    StateConflict(String),
    #[error("store: {0}")]
    Store(StoreError),
}

/// Clasificación gruesa que la superficie de UI usa para decidir el mensaje.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Authorization,
    StateConflict,
    Store,
}

impl CoreEngineError {
    pub fn kind(&self) -> ErrorKind {
        classify_error(self)
    }
}

pub fn classify_error(err: &CoreEngineError) -> ErrorKind {
    match err {
        CoreEngineError::Validation(_) => ErrorKind::Validation,
        CoreEngineError::Authorization { .. } => ErrorKind::Authorization,
        CoreEngineError::StateConflict(_) => ErrorKind::StateConflict,
        CoreEngineError::Store(_) => ErrorKind::Store,
    }
}

impl From<DomainError> for CoreEngineError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::ValidationError(msg) | DomainError::ParseError(msg) => CoreEngineError::Validation(msg),
        }
    }
}

// Una escritura rechazada por versión vieja es un conflicto de estado para el
// caller: otro actor ya movió el workflow.
impl From<StoreError> for CoreEngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::VersionConflict { .. } => CoreEngineError::StateConflict(e.to_string()),
            other => CoreEngineError::Store(other),
        }
    }
}
