//! Workflow CAPA: una acción correctiva o preventiva ligada a una desviación.
//!
//! `Workflow` es la proyección de estado actual que guarda el record store.
//! Las transiciones de `status` las decide exclusivamente la máquina de
//! estados del core; este módulo sólo define la forma de los datos y las
//! validaciones de creación.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{ActorId, DomainError, EvidenceRef};

/// Estado del ciclo de vida de un workflow.
///
/// Transiciones válidas:
/// - `Pending` -> `SubmittedCompleted` | `SubmittedBlocked`
/// - `SubmittedCompleted` | `SubmittedBlocked` -> `Approved` | `Returned`
/// - `Returned` -> `SubmittedCompleted` | `SubmittedBlocked`
///
/// `Approved` es terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    SubmittedCompleted,
    SubmittedBlocked,
    Approved,
    Returned,
}

impl WorkflowStatus {
    pub const ALL: [WorkflowStatus; 5] = [WorkflowStatus::Pending,
                                          WorkflowStatus::SubmittedCompleted,
                                          WorkflowStatus::SubmittedBlocked,
                                          WorkflowStatus::Approved,
                                          WorkflowStatus::Returned];

    /// Nombre estable (persistido en base de datos).
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Pending => "pending",
            WorkflowStatus::SubmittedCompleted => "submitted_completed",
            WorkflowStatus::SubmittedBlocked => "submitted_blocked",
            WorkflowStatus::Approved => "approved",
            WorkflowStatus::Returned => "returned",
        }
    }

    /// El responsable todavía debe responder.
    pub fn awaits_response(&self) -> bool {
        matches!(self, WorkflowStatus::Pending | WorkflowStatus::Returned)
    }

    /// Hay una respuesta esperando validación.
    pub fn is_submitted(&self) -> bool {
        matches!(self, WorkflowStatus::SubmittedCompleted | WorkflowStatus::SubmittedBlocked)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStatus::Approved)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStatus {
    type Err = DomainError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkflowStatus::ALL.iter()
                           .copied()
                           .find(|st| st.as_str() == s)
                           .ok_or_else(|| DomainError::ParseError(format!("unknown workflow status '{s}'")))
    }
}

/// Naturaleza de la acción.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nature {
    Corrective,
    Preventive,
}

impl Nature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Nature::Corrective => "corrective",
            Nature::Preventive => "preventive",
        }
    }
}

impl fmt::Display for Nature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Nature {
    type Err = DomainError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "corrective" => Ok(Nature::Corrective),
            "preventive" => Ok(Nature::Preventive),
            other => Err(DomainError::ParseError(format!("unknown nature '{other}'"))),
        }
    }
}

/// Proyección mutable del estado actual de un workflow.
///
/// `title`, `description`, `responsible_id`, `nature`, `deadline` y
/// `deviation_id` no cambian después de la creación. `version` la incrementa
/// el store en cada update exitoso (control optimista de concurrencia).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: Uuid,
    pub sequence_id: i64,
    pub deviation_id: Uuid,
    pub title: String,
    pub description: String,
    pub responsible_id: ActorId,
    pub nature: Nature,
    pub deadline: DateTime<Utc>,
    pub status: WorkflowStatus,
    pub response_notes: Option<String>,
    pub evidence_photos: Vec<EvidenceRef>,
    pub validator_notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    pub fn is_responsible(&self, actor: &ActorId) -> bool { &self.responsible_id == actor }
}

/// Datos de entrada para crear un workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWorkflow {
    pub deviation_id: Uuid,
    pub title: String,
    pub description: String,
    pub responsible_id: ActorId,
    pub nature: Nature,
    pub deadline: DateTime<Utc>,
}

impl NewWorkflow {
    /// Campos requeridos presentes y `deadline` estrictamente futuro respecto
    /// de `now`.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::ValidationError("title is required".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(DomainError::ValidationError("description is required".to_string()));
        }
        if self.deadline <= now {
            return Err(DomainError::ValidationError(format!("deadline {} must be after {}",
                                                            self.deadline.to_rfc3339(),
                                                            now.to_rfc3339())));
        }
        Ok(())
    }
}

/// Texto libre opcional: `None` si viene vacío o sólo con espacios; si no,
/// el texto tal como se escribió (el trim sólo decide si está vacío).
pub fn non_blank(text: Option<&str>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty()).map(str::to_string)
}
