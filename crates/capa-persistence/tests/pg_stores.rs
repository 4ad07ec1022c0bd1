//! Paridad de los stores Postgres con los de memoria (requiere DATABASE_URL).


use capa_core::replay::{next_chain_hash, verify_chain};
use capa_core::{FixedClock, HistoryAction, HistoryEntry, HistoryStore, NewHistoryEntry, NewWorkflowRecord, StoreError,
                WorkflowEngine, WorkflowPatch, WorkflowStore};
use capa_domain::{ActorId, EvidenceRef, Nature, NewWorkflow, WorkflowStatus};
use capa_persistence::{PgHistoryStore, PgWorkflowStore};
use chrono::{Duration, DurationRound, Utc};
use diesel::connection::SimpleConnection;
use uuid::Uuid;

fn actor(id: &str) -> ActorId {
    ActorId::new(id).unwrap()
}

fn new_wf(deviation_id: Uuid, responsible: &ActorId) -> NewWorkflow {
    NewWorkflow { deviation_id,
                  title: "Replace worn belt".into(),
                  description: "Conveyor belt 2 is frayed".into(),
                  responsible_id: responsible.clone(),
                  nature: Nature::Corrective,
                  deadline: Utc::now() + Duration::days(3) }
}

#[test]
fn insert_get_and_conditional_update() {
    let Some(provider) = test_support::provider() else { return };
    let mut store = PgWorkflowStore::new(provider);
    let now = Utc::now().duration_trunc(Duration::microseconds(1)).unwrap();
    let record = NewWorkflowRecord { id: Uuid::new_v4(),
                                     fields: new_wf(Uuid::new_v4(), &actor("U1")),
                                     created_at: now };
    let inserted = store.insert(record.clone()).expect("insert");
    assert_eq!(inserted.status, WorkflowStatus::Pending);
    assert_eq!(inserted.version, 1);
    assert!(inserted.evidence_photos.is_empty());
    assert_eq!(store.get(record.id).expect("get"), inserted);

    let mut patch = WorkflowPatch::at(now);
    patch.status = Some(WorkflowStatus::SubmittedBlocked);
    patch.response_notes = Some(Some("waiting for supplier".into()));
    patch.evidence_photos = Some(vec![EvidenceRef::new("evidence/a.jpg").unwrap()]);
    patch.completed_at = Some(now);
    let updated = store.update(record.id, 1, patch.clone()).expect("update");
    assert_eq!(updated.version, 2);
    assert_eq!(updated.status, WorkflowStatus::SubmittedBlocked);
    assert_eq!(updated.response_notes.as_deref(), Some("waiting for supplier"));
    assert_eq!(updated.completed_at, Some(now));
    assert_eq!(updated.evidence_photos.len(), 1);

    match store.update(record.id, 1, patch) {
        Err(StoreError::VersionConflict { expected: 1, actual: 2, .. }) => {}
        other => panic!("expected VersionConflict, got {other:?}"),
    }
    assert!(matches!(store.get(Uuid::new_v4()), Err(StoreError::NotFound(_))));
}

#[test]
fn workflows_list_by_deviation_in_sequence_order() {
    let Some(provider) = test_support::provider() else { return };
    let mut store = PgWorkflowStore::new(provider);
    let dev = Uuid::new_v4();
    for _ in 0..3 {
        store.insert(NewWorkflowRecord { id: Uuid::new_v4(),
                                         fields: new_wf(dev, &actor("U1")),
                                         created_at: Utc::now() })
             .unwrap();
    }
    let listed = store.list_by_deviation(dev).unwrap();
    assert_eq!(listed.len(), 3);
    assert!(listed.windows(2).all(|w| w[0].sequence_id < w[1].sequence_id));
}

#[test]
fn engine_cycle_on_postgres_is_auditable() {
    let Some(provider) = test_support::provider() else { return };
    let clock = FixedClock::new(Utc::now());
    let mut engine = WorkflowEngine::builder(PgWorkflowStore::new(provider.clone()), PgHistoryStore::new(provider))
        .clock(clock)
        .build();
    let (u1, u2) = (actor("U1"), actor("U2"));
    let id = engine.create(&u2, new_wf(Uuid::new_v4(), &u1)).unwrap().workflow.id;
    engine.respond_blocked(id, &u1, Some("machine still broken"), vec![]).unwrap();
    engine.return_for_rework(id, &u2, Some("insufficient evidence")).unwrap();
    engine.respond_completed(id, &u1, Some("fixed"), vec![]).unwrap();
    let approved = engine.approve(id, &u2).unwrap();
    assert_eq!(approved.workflow.status, WorkflowStatus::Approved);

    let history = engine.history(id).unwrap();
    let actions: Vec<HistoryAction> = history.iter().map(|e| e.action).collect();
    assert_eq!(actions,
               vec![HistoryAction::Created,
                    HistoryAction::SubmittedBlocked,
                    HistoryAction::Returned,
                    HistoryAction::Resubmitted,
                    HistoryAction::Approved]);
    assert_eq!(history.iter().map(|e| e.seq).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    let report = engine.audit(id).unwrap();
    assert!(report.is_consistent(), "{report:?}");
}

#[test]
fn history_rows_reject_update_and_delete() {
    let Some(provider) = test_support::provider() else { return };
    let mut engine = WorkflowEngine::builder(PgWorkflowStore::new(provider.clone()),
                                             PgHistoryStore::new(provider.clone()))
        .build();
    let id = engine.create(&actor("U2"), new_wf(Uuid::new_v4(), &actor("U1"))).unwrap().workflow.id;
    assert_eq!(engine.history_store().last(id).unwrap().map(|e| e.seq), Some(0));

    use capa_persistence::ConnectionProvider;
    let mut conn = provider.connection().unwrap();
    let upd = conn.batch_execute(&format!("UPDATE workflow_history SET notes = 'x' WHERE workflow_id = '{id}'"));
    assert!(upd.is_err(), "update must be rejected");
    let del = conn.batch_execute(&format!("DELETE FROM workflow_history WHERE workflow_id = '{id}'"));
    assert!(del.is_err(), "delete must be rejected");
}

fn linked_entry(previous: Option<&HistoryEntry>, workflow_id: Uuid, notes: &str) -> NewHistoryEntry {
    let mut entry = NewHistoryEntry { seq: previous.map_or(0, |p| p.seq + 1),
                                      id: Uuid::new_v4(),
                                      workflow_id,
                                      action: HistoryAction::SubmittedBlocked,
                                      status_after: WorkflowStatus::SubmittedBlocked,
                                      notes: Some(notes.into()),
                                      photos: vec![],
                                      performed_by: actor("U1"),
                                      created_at: Utc::now().duration_trunc(Duration::microseconds(1)).unwrap(),
                                      chain_hash: String::new() };
    entry.chain_hash = next_chain_hash(previous, &entry.content());
    entry
}

#[test]
fn history_append_with_stale_predecessor_is_rejected() {
    let Some(provider) = test_support::provider() else { return };
    let mut engine = WorkflowEngine::builder(PgWorkflowStore::new(provider.clone()), PgHistoryStore::new(provider))
        .build();
    let id = engine.create(&actor("U2"), new_wf(Uuid::new_v4(), &actor("U1"))).unwrap().workflow.id;

    let store = engine.history_store_mut();
    let head = store.last(id).unwrap();
    let first = linked_entry(head.as_ref(), id, "first");
    let second = linked_entry(head.as_ref(), id, "second");
    assert_eq!(store.append(first).unwrap().seq, 1);
    assert!(matches!(store.append(second), Err(StoreError::SeqConflict { expected: 1, actual: 2, .. })));

    let entries = store.list(id).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(verify_chain(&entries), Ok(()));
}
