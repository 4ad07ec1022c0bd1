//! Ciclo completo A–F sobre stores en memoria y reloj fijo.

use capa_core::{ErrorKind, FixedClock, HistoryAction, Permission, WorkflowEngine};
use capa_domain::{ActorId, EvidenceRef, Nature, NewWorkflow, WorkflowStatus};
use chrono::{Duration, TimeZone, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

fn actor(id: &str) -> ActorId {
    ActorId::new(id).unwrap()
}

fn set(perms: &[Permission]) -> BTreeSet<Permission> {
    perms.iter().copied().collect()
}

#[test]
fn scenarios_a_to_e_full_cycle() {
    let t0 = Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap();
    let clock = Arc::new(FixedClock::new(t0));
    let mut engine = WorkflowEngine::new().clock(clock.clone()).build();
    let (u1, u2) = (actor("U1"), actor("U2"));

    // A: creación
    let created = engine.create(&u2,
                                NewWorkflow { deviation_id: Uuid::new_v4(),
                                              title: "Repair press guard".into(),
                                              description: "Guard interlock bypassed".into(),
                                              responsible_id: u1.clone(),
                                              nature: Nature::Corrective,
                                              deadline: t0 + Duration::hours(48) })
                        .expect("create");
    let id = created.workflow.id;
    assert_eq!(created.workflow.status, WorkflowStatus::Pending);
    assert_eq!(engine.permitted_actions(id, &u1).unwrap(), set(&[Permission::Respond]));
    assert_eq!(engine.permitted_actions(id, &u2).unwrap(), set(&[]));

    // B: respuesta bloqueada
    clock.advance(Duration::hours(1));
    let p1 = EvidenceRef::new("evidence/p1.jpg").unwrap();
    let b = engine.respond_blocked(id, &u1, Some("machine still broken"), vec![p1.clone()])
                  .expect("blocked");
    assert_eq!(b.workflow.status, WorkflowStatus::SubmittedBlocked);
    assert_eq!(b.workflow.response_notes.as_deref(), Some("machine still broken"));
    assert_eq!(b.workflow.evidence_photos, vec![p1]);
    let h: Vec<HistoryAction> = engine.history(id).unwrap().iter().map(|e| e.action).collect();
    assert_eq!(h, vec![HistoryAction::Created, HistoryAction::SubmittedBlocked]);

    // C: devolución
    clock.advance(Duration::hours(1));
    let c = engine.return_for_rework(id, &u2, Some("insufficient evidence")).expect("return");
    assert_eq!(c.workflow.status, WorkflowStatus::Returned);
    assert_eq!(c.workflow.validator_notes.as_deref(), Some("insufficient evidence"));
    assert_eq!(engine.history(id).unwrap().len(), 3);
    assert_eq!(engine.permitted_actions(id, &u1).unwrap(), set(&[Permission::Respond]));
    assert_eq!(engine.permitted_actions(id, &u2).unwrap(), set(&[]));

    // D: reenvío completado
    clock.advance(Duration::hours(1));
    let d = engine.respond_completed(id, &u1, Some("fixed"), vec![]).expect("resubmit");
    assert_eq!(d.workflow.status, WorkflowStatus::SubmittedCompleted);
    let hist = engine.history(id).unwrap();
    assert_eq!(hist.len(), 4);
    assert_eq!(hist[3].action, HistoryAction::Resubmitted);
    assert_eq!(hist[3].status_after, WorkflowStatus::SubmittedCompleted);
    assert_eq!(d.workflow.completed_at, Some(t0 + Duration::hours(3)));

    // E: aprobación
    clock.advance(Duration::hours(1));
    let e = engine.approve(id, &u2).expect("approve");
    assert_eq!(e.workflow.status, WorkflowStatus::Approved);
    let hist = engine.history(id).unwrap();
    assert_eq!(hist.len(), 5);
    assert_eq!(hist[4].action, HistoryAction::Approved);
    assert!(engine.permitted_actions(id, &u1).unwrap().is_empty());
    assert!(engine.permitted_actions(id, &u2).unwrap().is_empty());

    // P3: nada más es posible
    assert_eq!(engine.approve(id, &u2).unwrap_err().kind(), ErrorKind::StateConflict);
    assert_eq!(engine.respond_completed(id, &u1, None, vec![]).unwrap_err().kind(),
               ErrorKind::StateConflict);

    let report = engine.audit(id).unwrap();
    assert!(report.is_consistent(), "{report:?}");
}

#[test]
fn scenario_f_overdue_only_while_pending() {
    let t0 = Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap();
    let clock = Arc::new(FixedClock::new(t0));
    let mut engine = WorkflowEngine::new().clock(clock.clone()).build();
    let (u1, u2) = (actor("U1"), actor("U2"));
    let id = engine.create(&u2,
                           NewWorkflow { deviation_id: Uuid::new_v4(),
                                         title: "Label chemicals".into(),
                                         description: "Unlabelled drums in store B".into(),
                                         responsible_id: u1.clone(),
                                         nature: Nature::Preventive,
                                         deadline: t0 + Duration::hours(2) })
                   .unwrap()
                   .workflow
                   .id;
    assert!(!engine.is_overdue(id).unwrap());
    assert_eq!(engine.view(id, &u1).unwrap().remaining_secs, Some(2 * 3_600));

    clock.advance(Duration::hours(3));
    assert!(engine.is_overdue(id).unwrap());
    let view = engine.view(id, &u1).unwrap();
    assert!(view.overdue);
    assert_eq!(view.remaining_secs, None);

    engine.respond_completed(id, &u1, None, vec![]).unwrap();
    assert!(!engine.is_overdue(id).unwrap());
    engine.return_for_rework(id, &u2, Some("photos missing")).unwrap();
    // returned con deadline vencido: no se marca
    assert!(!engine.is_overdue(id).unwrap());
}

#[test]
fn notes_are_stored_exactly_as_written() {
    let t0 = Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap();
    let mut engine = WorkflowEngine::new().clock(FixedClock::new(t0)).build();
    let (u1, u2) = (actor("U1"), actor("U2"));
    let id = engine.create(&u2,
                           NewWorkflow { deviation_id: Uuid::new_v4(),
                                         title: "Clean extractor".into(),
                                         description: "Grease build-up on hood 2".into(),
                                         responsible_id: u1.clone(),
                                         nature: Nature::Corrective,
                                         deadline: t0 + Duration::days(1) })
                   .unwrap()
                   .workflow
                   .id;
    let notes = "  filters replaced\n  - hood 2\n";
    let out = engine.respond_blocked(id, &u1, Some(notes), vec![]).unwrap();
    assert_eq!(out.workflow.response_notes.as_deref(), Some(notes));
    assert_eq!(out.history_entry().and_then(|e| e.notes.as_deref()), Some(notes));

    let out = engine.return_for_rework(id, &u2, Some(" duct too ")).unwrap();
    assert_eq!(out.workflow.validator_notes.as_deref(), Some(" duct too "));
}

#[test]
fn p4_blocked_without_notes_leaves_state_and_history_untouched() {
    let t0 = Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap();
    let mut engine = WorkflowEngine::new().clock(FixedClock::new(t0)).build();
    let u1 = actor("U1");
    let id = engine.create(&actor("U2"),
                           NewWorkflow { deviation_id: Uuid::new_v4(),
                                         title: "t".into(),
                                         description: "d".into(),
                                         responsible_id: u1.clone(),
                                         nature: Nature::Corrective,
                                         deadline: t0 + Duration::days(1) })
                   .unwrap()
                   .workflow
                   .id;
    let before = engine.get(id).unwrap();

    for blank in [None, Some(""), Some("   ")] {
        let err = engine.respond_blocked(id, &u1, blank, vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
    assert_eq!(engine.get(id).unwrap(), before);
    assert_eq!(engine.history(id).unwrap().len(), 1);

    let ok = engine.respond_completed(id, &u1, Some(""), vec![]).unwrap();
    assert_eq!(ok.workflow.status, WorkflowStatus::SubmittedCompleted);
    assert_eq!(ok.workflow.response_notes, None);
}

#[test]
fn p5_return_requires_validator_notes() {
    let t0 = Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap();
    let mut engine = WorkflowEngine::new().clock(FixedClock::new(t0)).build();
    let (u1, u2) = (actor("U1"), actor("U2"));
    let id = engine.create(&u2,
                           NewWorkflow { deviation_id: Uuid::new_v4(),
                                         title: "t".into(),
                                         description: "d".into(),
                                         responsible_id: u1.clone(),
                                         nature: Nature::Corrective,
                                         deadline: t0 + Duration::days(1) })
                   .unwrap()
                   .workflow
                   .id;
    engine.respond_completed(id, &u1, Some("done"), vec![]).unwrap();

    let err = engine.return_for_rework(id, &u2, Some(" ")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(engine.history(id).unwrap().len(), 2);

    let out = engine.return_for_rework(id, &u2, Some("redo the torque check")).unwrap();
    assert_eq!(out.workflow.status, WorkflowStatus::Returned);
    let hist = engine.history(id).unwrap();
    assert_eq!(hist.len(), 3);
    assert_eq!(hist[2].action, HistoryAction::Returned);
    assert_eq!(hist[2].notes.as_deref(), Some("redo the torque check"));
}

#[test]
fn creation_rejects_past_deadline_and_writes_nothing() {
    let t0 = Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap();
    let mut engine = WorkflowEngine::new().clock(FixedClock::new(t0)).build();
    let dev = Uuid::new_v4();
    let err = engine.create(&actor("U2"),
                            NewWorkflow { deviation_id: dev,
                                          title: "t".into(),
                                          description: "d".into(),
                                          responsible_id: actor("U1"),
                                          nature: Nature::Corrective,
                                          deadline: t0 - Duration::minutes(5) })
                    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(engine.workflows_for_deviation(dev).unwrap().is_empty());
}

#[test]
fn sequence_ids_are_monotonic_per_store() {
    let t0 = Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap();
    let mut engine = WorkflowEngine::new().clock(FixedClock::new(t0)).build();
    let dev = Uuid::new_v4();
    let seqs: Vec<i64> = (0..3).map(|i| {
                                   engine.create(&actor("U2"),
                                                 NewWorkflow { deviation_id: dev,
                                                               title: format!("t{i}"),
                                                               description: "d".into(),
                                                               responsible_id: actor("U1"),
                                                               nature: Nature::Preventive,
                                                               deadline: t0 + Duration::days(1) })
                                         .unwrap()
                                         .workflow
                                         .sequence_id
                               })
                               .collect();
    assert_eq!(seqs, vec![1, 2, 3]);
    let listed: Vec<i64> = engine.workflows_for_deviation(dev).unwrap().iter().map(|w| w.sequence_id).collect();
    assert_eq!(listed, seqs);
}
