//! Replay y auditoría del historial.
//!
//! El record store guarda el estado actual como caché; el historial es la
//! fuente de verdad para auditoría. Este módulo reconstruye el estado a
//! partir de las entradas (en orden de append, tal como las devuelve
//! `HistoryStore::list`) y verifica la cadena de hashes. Nunca repara nada:
//! sólo reporta.

use capa_domain::{Workflow, WorkflowStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::constants::GENESIS_CHAIN_HASH;
use crate::hashing::chain_hash;
use crate::history::{HistoryAction, HistoryEntry};
use crate::machine::is_legal;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("history is empty")]
    Empty,
    #[error("entry seq {seq} belongs to workflow {found}, expected {expected}")]
    ForeignEntry { seq: u64, expected: Uuid, found: Uuid },
    #[error("entry seq {seq}: illegal transition {from:?} --{tag}--> {to}")]
    IllegalTransition {
        seq: u64,
        from: Option<WorkflowStatus>,
        tag: HistoryAction,
        to: WorkflowStatus,
    },
}

/// Deriva el estado actual plegando las entradas y validando que cada una
/// sea una transición legal desde la anterior.
pub fn derive_status(workflow_id: Uuid, entries: &[HistoryEntry]) -> Result<WorkflowStatus, ReplayError> {
    let mut current: Option<WorkflowStatus> = None;
    for e in entries {
        if e.workflow_id != workflow_id {
            return Err(ReplayError::ForeignEntry { seq: e.seq,
                                                   expected: workflow_id,
                                                   found: e.workflow_id });
        }
        if !is_legal(current, e.action, e.status_after) {
            return Err(ReplayError::IllegalTransition { seq: e.seq,
                                                        from: current,
                                                        tag: e.action,
                                                        to: e.status_after });
        }
        current = Some(e.status_after);
    }
    current.ok_or(ReplayError::Empty)
}

/// Hash que le corresponde a una entrada nueva anexada después de `previous`.
pub fn next_chain_hash(previous: Option<&HistoryEntry>, content: &serde_json::Value) -> String {
    let prev = previous.map(|p| p.chain_hash.as_str()).unwrap_or(GENESIS_CHAIN_HASH);
    chain_hash(prev, content)
}

/// Recalcula la cadena; devuelve el `seq` de la primera entrada cuyo hash no
/// coincide.
pub fn verify_chain(entries: &[HistoryEntry]) -> Result<(), u64> {
    let mut previous: Option<&HistoryEntry> = None;
    for e in entries {
        if next_chain_hash(previous, &e.content()) != e.chain_hash {
            return Err(e.seq);
        }
        previous = Some(e);
    }
    Ok(())
}

/// Resultado de auditar un workflow contra su historial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub workflow_id: Uuid,
    pub recorded_status: WorkflowStatus,
    pub derived_status: Option<WorkflowStatus>,
    pub replay_error: Option<String>,
    pub entries: usize,
    pub chain_valid: bool,
    pub first_broken_seq: Option<u64>,
}

impl AuditReport {
    /// Registro y historial cuentan la misma historia.
    pub fn is_consistent(&self) -> bool {
        self.chain_valid && self.derived_status == Some(self.recorded_status)
    }
}

pub fn audit(workflow: &Workflow, entries: &[HistoryEntry]) -> AuditReport {
    let derived = derive_status(workflow.id, entries);
    let chain = verify_chain(entries);
    AuditReport { workflow_id: workflow.id,
                  recorded_status: workflow.status,
                  derived_status: derived.as_ref().ok().copied(),
                  replay_error: derived.err().map(|e| e.to_string()),
                  entries: entries.len(),
                  chain_valid: chain.is_ok(),
                  first_broken_seq: chain.err() }
}
