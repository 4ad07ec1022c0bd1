use capa_domain::{non_blank, ActorId, EvidenceRef, NewWorkflow, Workflow, WorkflowStatus};
use chrono::{DateTime, Utc};

use super::{CommandKind, WorkflowCommand};
use crate::errors::CoreEngineError;
use crate::gate;
use crate::history::HistoryAction;
use crate::repo::WorkflowPatch;

/// Resultado de planificar un comando: qué escribir en el registro y qué
/// anexar al historial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: WorkflowStatus,
    pub to: WorkflowStatus,
    pub tag: HistoryAction,
    pub notes: Option<String>,
    pub photos: Vec<EvidenceRef>,
    pub patch: WorkflowPatch,
}

/// Validación previa al alta: campos requeridos y deadline futuro.
pub fn validate_creation(new: &NewWorkflow, now: DateTime<Utc>) -> Result<(), CoreEngineError> {
    new.validate(now).map_err(CoreEngineError::from)
}

/// Planifica `command` sobre `workflow`. Primero pasa por el gate (estado y
/// actor) y después valida los campos requeridos; cualquier rechazo ocurre
/// antes de escribir nada.
pub fn plan(workflow: &Workflow,
            actor: &ActorId,
            command: WorkflowCommand,
            now: DateTime<Utc>)
            -> Result<Transition, CoreEngineError> {
    gate::authorize(workflow, actor, command.kind())?;
    match command {
        WorkflowCommand::RespondCompleted { notes, photos } => {
            Ok(respond(workflow, WorkflowStatus::SubmittedCompleted, non_blank(notes.as_deref()), photos, now))
        }
        WorkflowCommand::RespondBlocked { notes, photos } => {
            let notes = non_blank(notes.as_deref()).ok_or_else(|| {
                            CoreEngineError::Validation("notes are required when reporting a blocked action".into())
                        })?;
            Ok(respond(workflow, WorkflowStatus::SubmittedBlocked, Some(notes), photos, now))
        }
        WorkflowCommand::Approve => {
            let mut patch = WorkflowPatch::at(now);
            patch.status = Some(WorkflowStatus::Approved);
            Ok(Transition { from: workflow.status,
                            to: WorkflowStatus::Approved,
                            tag: HistoryAction::Approved,
                            notes: None,
                            photos: Vec::new(),
                            patch })
        }
        WorkflowCommand::Return { validator_notes } => {
            let notes = non_blank(validator_notes.as_deref()).ok_or_else(|| {
                            CoreEngineError::Validation("validator notes are required to return a workflow".into())
                        })?;
            let mut patch = WorkflowPatch::at(now);
            patch.status = Some(WorkflowStatus::Returned);
            patch.validator_notes = Some(Some(notes.clone()));
            Ok(Transition { from: workflow.status,
                            to: WorkflowStatus::Returned,
                            tag: HistoryAction::Returned,
                            notes: Some(notes),
                            photos: Vec::new(),
                            patch })
        }
    }
}

fn respond(workflow: &Workflow,
           to: WorkflowStatus,
           notes: Option<String>,
           photos: Vec<EvidenceRef>,
           now: DateTime<Utc>)
           -> Transition {
    let tag = match (workflow.status, to) {
        (WorkflowStatus::Returned, _) => HistoryAction::Resubmitted,
        (_, WorkflowStatus::SubmittedBlocked) => HistoryAction::SubmittedBlocked,
        _ => HistoryAction::SubmittedCompleted,
    };
    let mut patch = WorkflowPatch::at(now);
    patch.status = Some(to);
    patch.response_notes = Some(notes.clone());
    patch.evidence_photos = Some(photos.clone());
    patch.completed_at = Some(now);
    Transition { from: workflow.status,
                 to,
                 tag,
                 notes,
                 photos,
                 patch }
}

/// Estados alcanzables en un paso desde `status` (cualquier actor).
pub fn successors(status: WorkflowStatus) -> Vec<WorkflowStatus> {
    let mut out: Vec<WorkflowStatus> =
        [CommandKind::RespondCompleted, CommandKind::RespondBlocked, CommandKind::Approve, CommandKind::Return]
            .iter()
            .filter(|k| k.allowed_from().contains(&status))
            .map(|k| match k {
                CommandKind::RespondCompleted => WorkflowStatus::SubmittedCompleted,
                CommandKind::RespondBlocked => WorkflowStatus::SubmittedBlocked,
                CommandKind::Approve => WorkflowStatus::Approved,
                _ => WorkflowStatus::Returned,
            })
            .collect();
    out.dedup();
    out
}

/// ¿Es `from --tag--> to` una transición que el motor pudo haber registrado?
/// `from == None` representa "antes de la primera entrada".
pub fn is_legal(from: Option<WorkflowStatus>, tag: HistoryAction, to: WorkflowStatus) -> bool {
    use WorkflowStatus::*;
    match (from, tag) {
        (None, HistoryAction::Created) => to == Pending,
        (Some(Pending), HistoryAction::SubmittedCompleted) => to == SubmittedCompleted,
        (Some(Pending), HistoryAction::SubmittedBlocked) => to == SubmittedBlocked,
        (Some(Returned), HistoryAction::Resubmitted) => to.is_submitted(),
        (Some(f), HistoryAction::Approved) if f.is_submitted() => to == Approved,
        (Some(f), HistoryAction::Returned) if f.is_submitted() => to == Returned,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use capa_domain::Nature;
    use chrono::Duration;
    use uuid::Uuid;

    fn wf(status: WorkflowStatus) -> Workflow {
        let now = Utc::now();
        Workflow { id: Uuid::new_v4(),
                   sequence_id: 1,
                   deviation_id: Uuid::new_v4(),
                   title: "t".into(),
                   description: "d".into(),
                   responsible_id: ActorId::new("u1").unwrap(),
                   nature: Nature::Preventive,
                   deadline: now + Duration::hours(1),
                   status,
                   response_notes: None,
                   evidence_photos: vec![],
                   validator_notes: None,
                   completed_at: None,
                   version: 1,
                   created_at: now,
                   updated_at: now }
    }

    fn u(id: &str) -> ActorId {
        ActorId::new(id).unwrap()
    }

    #[test]
    fn completed_without_notes_is_accepted() {
        let t = plan(&wf(WorkflowStatus::Pending),
                     &u("u1"),
                     WorkflowCommand::RespondCompleted { notes: Some("  ".into()),
                                                         photos: vec![] },
                     Utc::now()).expect("plan");
        assert_eq!(t.to, WorkflowStatus::SubmittedCompleted);
        assert_eq!(t.tag, HistoryAction::SubmittedCompleted);
        assert_eq!(t.patch.response_notes, Some(None));
    }

    #[test]
    fn blocked_without_notes_is_validation_error() {
        let err = plan(&wf(WorkflowStatus::Pending),
                       &u("u1"),
                       WorkflowCommand::RespondBlocked { notes: None, photos: vec![] },
                       Utc::now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn respond_after_return_is_tagged_resubmitted() {
        let t = plan(&wf(WorkflowStatus::Returned),
                     &u("u1"),
                     WorkflowCommand::RespondBlocked { notes: Some("still waiting parts".into()),
                                                       photos: vec![] },
                     Utc::now()).unwrap();
        assert_eq!(t.tag, HistoryAction::Resubmitted);
        assert_eq!(t.to, WorkflowStatus::SubmittedBlocked);
    }

    #[test]
    fn approve_from_pending_is_state_conflict() {
        let err = plan(&wf(WorkflowStatus::Pending), &u("u2"), WorkflowCommand::Approve, Utc::now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);
    }

    #[test]
    fn responsible_cannot_approve_own_response() {
        let err = plan(&wf(WorkflowStatus::SubmittedCompleted), &u("u1"), WorkflowCommand::Approve, Utc::now())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn pending_reaches_only_submitted_states() {
        assert_eq!(successors(WorkflowStatus::Pending),
                   vec![WorkflowStatus::SubmittedCompleted, WorkflowStatus::SubmittedBlocked]);
        assert!(successors(WorkflowStatus::Approved).is_empty());
    }

    #[test]
    fn legality_table_matches_plan() {
        assert!(is_legal(None, HistoryAction::Created, WorkflowStatus::Pending));
        assert!(!is_legal(Some(WorkflowStatus::Pending), HistoryAction::Approved, WorkflowStatus::Approved));
        assert!(is_legal(Some(WorkflowStatus::Returned),
                         HistoryAction::Resubmitted,
                         WorkflowStatus::SubmittedCompleted));
        assert!(!is_legal(Some(WorkflowStatus::Pending),
                          HistoryAction::Resubmitted,
                          WorkflowStatus::SubmittedCompleted));
    }
}
