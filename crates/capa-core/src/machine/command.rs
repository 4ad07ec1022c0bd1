use capa_domain::{EvidenceRef, WorkflowStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::gate::Permission;

/// Tipo de comando, sin payload. Se usa en errores y en el gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Create,
    RespondCompleted,
    RespondBlocked,
    Approve,
    Return,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Create => "create",
            CommandKind::RespondCompleted => "respond_completed",
            CommandKind::RespondBlocked => "respond_blocked",
            CommandKind::Approve => "approve",
            CommandKind::Return => "return",
        }
    }

    /// Permiso del gate que exige el comando. `Create` no pasa por el gate:
    /// lo controla el acceso a la desviación (colaborador externo).
    pub fn permission(&self) -> Option<Permission> {
        match self {
            CommandKind::Create => None,
            CommandKind::RespondCompleted | CommandKind::RespondBlocked => Some(Permission::Respond),
            CommandKind::Approve | CommandKind::Return => Some(Permission::Validate),
        }
    }

    /// Estados desde los que el comando es una transición válida.
    pub fn allowed_from(&self) -> &'static [WorkflowStatus] {
        match self {
            CommandKind::Create => &[],
            CommandKind::RespondCompleted | CommandKind::RespondBlocked => {
                &[WorkflowStatus::Pending, WorkflowStatus::Returned]
            }
            CommandKind::Approve | CommandKind::Return => {
                &[WorkflowStatus::SubmittedCompleted, WorkflowStatus::SubmittedBlocked]
            }
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comando con su payload, tal como llega desde la superficie de UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WorkflowCommand {
    RespondCompleted {
        notes: Option<String>,
        photos: Vec<EvidenceRef>,
    },
    RespondBlocked {
        notes: Option<String>,
        photos: Vec<EvidenceRef>,
    },
    Approve,
    Return {
        validator_notes: Option<String>,
    },
}

impl WorkflowCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            WorkflowCommand::RespondCompleted { .. } => CommandKind::RespondCompleted,
            WorkflowCommand::RespondBlocked { .. } => CommandKind::RespondBlocked,
            WorkflowCommand::Approve => CommandKind::Approve,
            WorkflowCommand::Return { .. } => CommandKind::Return,
        }
    }
}
