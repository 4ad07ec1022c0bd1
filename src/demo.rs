//! Recorrido de referencia del ciclo de vida (creación, bloqueo, devolución,
//! reenvío, aprobación y vencimiento) sobre un engine con reloj fijo.
//!
//! Lo usan `main-core` y los tests end-to-end; funciona igual con stores en
//! memoria o Postgres.

use std::sync::Arc;

use capa_core::{AuditReport, Clock, CoreEngineError, ErrorKind, EvidenceStorage, FixedClock, HistoryEntry, HistoryStore,
                Permission, WorkflowEngine, WorkflowStore};
use capa_domain::{ActorId, EvidenceUpload, Nature, NewWorkflow, WorkflowStatus};
use chrono::Duration;
use log::info;
use uuid::Uuid;

use crate::errors::AppError;

pub type DemoEngine<W, H> = WorkflowEngine<W, H, Arc<FixedClock>>;

/// Lo que dejó el recorrido.
#[derive(Debug, Clone)]
pub struct DemoReport {
    pub deviation_id: Uuid,
    pub workflow_id: Uuid,
    pub overdue_workflow_id: Uuid,
    pub trail: Vec<HistoryEntry>,
    pub audit: AuditReport,
}

fn expect(cond: bool, what: &str) -> Result<(), AppError> {
    if cond {
        Ok(())
    } else {
        Err(AppError::Unexpected(what.to_string()))
    }
}

fn expect_rejected<T>(result: Result<T, CoreEngineError>, kind: ErrorKind, what: &str) -> Result<(), AppError> {
    match result {
        Err(e) if e.kind() == kind => {
            info!("rejected as expected ({what}): {e}");
            Ok(())
        }
        Err(e) => Err(AppError::Unexpected(format!("{what}: expected {kind:?}, got {e}"))),
        Ok(_) => Err(AppError::Unexpected(format!("{what}: expected {kind:?}, command succeeded"))),
    }
}

pub fn run_scenarios<W, H, E>(engine: &mut DemoEngine<W, H>, evidence: &mut E) -> Result<DemoReport, AppError>
    where W: WorkflowStore,
          H: HistoryStore,
          E: EvidenceStorage
{
    let responsible = ActorId::new("U1").map_err(CoreEngineError::from)?;
    let validator = ActorId::new("U2").map_err(CoreEngineError::from)?;
    let deviation_id = Uuid::new_v4();
    let start = engine.clock().now();

    // creación
    let created = engine.create(&validator,
                                NewWorkflow { deviation_id,
                                              title: "Repair press guard".into(),
                                              description: "Interlock on press 3 found bypassed".into(),
                                              responsible_id: responsible.clone(),
                                              nature: Nature::Corrective,
                                              deadline: start + Duration::hours(48) })?;
    let id = created.workflow.id;
    expect(created.workflow.status == WorkflowStatus::Pending, "new workflow is pending")?;
    expect(engine.permitted_actions(id, &responsible)?.contains(&Permission::Respond),
           "responsible may respond")?;
    expect(engine.permitted_actions(id, &validator)?.is_empty(), "validator is read-only while pending")?;
    expect_rejected(engine.respond_completed(id, &validator, None, vec![]),
                    ErrorKind::Authorization,
                    "validator responding")?;

    // bloqueado con evidencia; sin notas se rechaza
    engine.clock().advance(Duration::hours(1));
    expect_rejected(engine.respond_blocked(id, &responsible, Some("  "), vec![]),
                    ErrorKind::Validation,
                    "blocked without notes")?;
    let upload = EvidenceUpload::new("press-guard.jpg", b"demo-photo".to_vec()).map_err(CoreEngineError::from)?;
    let photos = evidence.store_images(&[upload]).map_err(CoreEngineError::from)?;
    engine.respond_blocked(id, &responsible, Some("machine still broken"), photos)?;

    // devolución
    engine.clock().advance(Duration::hours(1));
    expect_rejected(engine.approve(id, &responsible), ErrorKind::Authorization, "self approval")?;
    expect_rejected(engine.return_for_rework(id, &validator, None),
                    ErrorKind::Validation,
                    "return without notes")?;
    engine.return_for_rework(id, &validator, Some("insufficient evidence"))?;

    // reenvío y aprobación
    engine.clock().advance(Duration::hours(1));
    engine.respond_completed(id, &responsible, Some("fixed"), vec![])?;
    engine.clock().advance(Duration::hours(1));
    let approved = engine.approve(id, &validator)?;
    expect(approved.workflow.status == WorkflowStatus::Approved, "approved")?;
    expect_rejected(engine.approve(id, &validator), ErrorKind::StateConflict, "approving twice")?;

    // vencimiento: sólo mientras está pendiente
    let short = engine.create(&validator,
                              NewWorkflow { deviation_id,
                                            title: "Label chemical drums".into(),
                                            description: "Unlabelled drums in store B".into(),
                                            responsible_id: responsible.clone(),
                                            nature: Nature::Preventive,
                                            deadline: engine.clock().now() + Duration::hours(2) })?;
    let overdue_id = short.workflow.id;
    engine.clock().advance(Duration::hours(3));
    expect(engine.is_overdue(overdue_id)?, "pending past deadline is overdue")?;
    let queue = engine.review_queue(deviation_id, &responsible)?;
    expect(queue.first().map(|i| i.workflow.id) == Some(overdue_id), "overdue item heads the queue")?;
    engine.respond_completed(overdue_id, &responsible, None, vec![])?;
    expect(!engine.is_overdue(overdue_id)?, "submitted is never overdue")?;

    let trail = engine.history(id)?;
    let audit = engine.audit(id)?;
    expect(audit.is_consistent(), "record and history agree")?;
    info!("demo finished: {} history entries on workflow {id}", trail.len());
    Ok(DemoReport { deviation_id,
                    workflow_id: id,
                    overdue_workflow_id: overdue_id,
                    trail,
                    audit })
}
