//! Gate de autorización por actor.
//!
//! Única definición de la regla "responsable vs. validador": el responsable
//! responde mientras el workflow espera respuesta; cualquier otro actor con
//! acceso a la desviación valida mientras hay una respuesta enviada. El
//! acceso a la desviación en sí lo controla un colaborador externo.

use capa_domain::{ActorId, Workflow, WorkflowStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::errors::CoreEngineError;
use crate::machine::CommandKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Respond,
    Validate,
}

/// Acciones que `actor` puede ejecutar ahora sobre `workflow`. Vacío =
/// sólo lectura.
pub fn permitted_actions(workflow: &Workflow, actor: &ActorId) -> BTreeSet<Permission> {
    permitted_for(workflow.status, workflow.is_responsible(actor))
}

/// Forma pura de la regla sobre `(status, es_responsable)`.
pub fn permitted_for(status: WorkflowStatus, is_responsible: bool) -> BTreeSet<Permission> {
    let mut set = BTreeSet::new();
    if is_responsible && status.awaits_response() {
        set.insert(Permission::Respond);
    }
    if !is_responsible && status.is_submitted() {
        set.insert(Permission::Validate);
    }
    set
}

/// Verifica que `command` pueda ejecutarse: primero el estado (si el comando
/// no aplica desde el estado actual es `StateConflict`), después el actor
/// (`Authorization`).
pub fn authorize(workflow: &Workflow, actor: &ActorId, command: CommandKind) -> Result<(), CoreEngineError> {
    let Some(required) = command.permission() else {
        return Ok(());
    };
    if !command.allowed_from().contains(&workflow.status) {
        return Err(CoreEngineError::StateConflict(format!("cannot {} workflow {} in status {}",
                                                          command, workflow.id, workflow.status)));
    }
    if !permitted_actions(workflow, actor).contains(&required) {
        return Err(CoreEngineError::Authorization { actor: actor.clone(),
                                                    command,
                                                    status: workflow.status });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn status_strategy() -> impl Strategy<Value = WorkflowStatus> {
        prop::sample::select(WorkflowStatus::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn responsible_and_other_never_overlap(status in status_strategy()) {
            let mine = permitted_for(status, true);
            let theirs = permitted_for(status, false);
            prop_assert!(mine.is_disjoint(&theirs));
        }

        #[test]
        fn respond_only_while_awaiting_response(status in status_strategy(), responsible in any::<bool>()) {
            let set = permitted_for(status, responsible);
            prop_assert_eq!(set.contains(&Permission::Respond), responsible && status.awaits_response());
            prop_assert_eq!(set.contains(&Permission::Validate), !responsible && status.is_submitted());
        }
    }

    #[test]
    fn approved_is_read_only_for_everyone() {
        assert!(permitted_for(WorkflowStatus::Approved, true).is_empty());
        assert!(permitted_for(WorkflowStatus::Approved, false).is_empty());
    }
}
