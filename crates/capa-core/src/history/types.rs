//! Tipos del historial y estructura `HistoryEntry`.
//!
//! Rol en el flujo:
//! - Cada transición aplicada por el `WorkflowEngine` anexa exactamente una
//!   entrada al `HistoryStore`.
//! - Las entradas nunca se modifican ni se borran; ordenadas por
//!   `(created_at, seq)` reconstruyen el audit trail completo.
//! - `status_after` permite derivar el estado actual por replay aun cuando la
//!   etiqueta es `resubmitted`.
use capa_domain::{ActorId, DomainError, EvidenceRef, WorkflowStatus};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Etiqueta de la transición registrada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    /// Alta del workflow. Invariante: primera entrada de cada workflow.
    Created,
    /// Primera respuesta del responsable marcada como completada.
    SubmittedCompleted,
    /// Primera respuesta del responsable marcada como bloqueada.
    SubmittedBlocked,
    /// Un validador aprobó la respuesta (terminal).
    Approved,
    /// Un validador devolvió la respuesta para retrabajo.
    Returned,
    /// Respuesta enviada después de una devolución (completada o bloqueada,
    /// ver `status_after`).
    Resubmitted,
}

impl HistoryAction {
    pub const ALL: [HistoryAction; 6] = [HistoryAction::Created,
                                         HistoryAction::SubmittedCompleted,
                                         HistoryAction::SubmittedBlocked,
                                         HistoryAction::Approved,
                                         HistoryAction::Returned,
                                         HistoryAction::Resubmitted];

    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Created => "created",
            HistoryAction::SubmittedCompleted => "submitted_completed",
            HistoryAction::SubmittedBlocked => "submitted_blocked",
            HistoryAction::Approved => "approved",
            HistoryAction::Returned => "returned",
            HistoryAction::Resubmitted => "resubmitted",
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryAction {
    type Err = DomainError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HistoryAction::ALL.iter()
                          .copied()
                          .find(|a| a.as_str() == s)
                          .ok_or_else(|| DomainError::ParseError(format!("unknown history action '{s}'")))
    }
}

/// Entrada a anexar.
///
/// `seq` es la posición esperada (`previous.seq + 1`, 0 para la primera),
/// la misma de la que sale el `chain_hash`. El store la rechaza si ya no es
/// la siguiente libre, así dos entradas nunca enlazan al mismo predecesor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHistoryEntry {
    pub seq: u64,
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub action: HistoryAction,
    pub status_after: WorkflowStatus,
    pub notes: Option<String>,
    pub photos: Vec<EvidenceRef>,
    pub performed_by: ActorId,
    pub created_at: DateTime<Utc>,
    pub chain_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub seq: u64, // orden de append, denso desde 0
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub action: HistoryAction,
    pub status_after: WorkflowStatus,
    pub notes: Option<String>,
    pub photos: Vec<EvidenceRef>,
    pub performed_by: ActorId,
    pub created_at: DateTime<Utc>,
    pub chain_hash: String,
}

impl NewHistoryEntry {
    /// Contenido que entra al `chain_hash` (todo salvo `seq` y el propio hash).
    pub fn content(&self) -> Value {
        entry_content(self.id,
                      self.workflow_id,
                      self.action,
                      self.status_after,
                      self.notes.as_deref(),
                      &self.photos,
                      &self.performed_by,
                      self.created_at)
    }

    pub fn into_entry(self) -> HistoryEntry {
        HistoryEntry { seq: self.seq,
                       id: self.id,
                       workflow_id: self.workflow_id,
                       action: self.action,
                       status_after: self.status_after,
                       notes: self.notes,
                       photos: self.photos,
                       performed_by: self.performed_by,
                       created_at: self.created_at,
                       chain_hash: self.chain_hash }
    }
}

impl HistoryEntry {
    pub fn content(&self) -> Value {
        entry_content(self.id,
                      self.workflow_id,
                      self.action,
                      self.status_after,
                      self.notes.as_deref(),
                      &self.photos,
                      &self.performed_by,
                      self.created_at)
    }
}

#[allow(clippy::too_many_arguments)]
fn entry_content(id: Uuid,
                 workflow_id: Uuid,
                 action: HistoryAction,
                 status_after: WorkflowStatus,
                 notes: Option<&str>,
                 photos: &[EvidenceRef],
                 performed_by: &ActorId,
                 created_at: DateTime<Utc>)
                 -> Value {
    json!({
        "id": id,
        "workflow_id": workflow_id,
        "action": action.as_str(),
        "status_after": status_after.as_str(),
        "notes": notes,
        "photos": photos.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
        "performed_by": performed_by.as_str(),
        "created_at": created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
    })
}
