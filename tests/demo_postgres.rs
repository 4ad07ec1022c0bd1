//! Mismo recorrido sobre Postgres (se omite sin DATABASE_URL).

use std::sync::Arc;

use capa_core::{FixedClock, WorkflowEngine};
use capa_persistence::{build_pool, FsEvidenceStorage, PgHistoryStore, PgWorkflowStore, PoolProvider};
use capaflow_rust::demo::run_scenarios;
use capaflow_rust::AppConfig;
use chrono::Utc;

#[test]
fn reference_scenarios_on_postgres() {
    let config = AppConfig::from_env().expect("config");
    let Some(db) = config.database else {
        eprintln!("DATABASE_URL no definido: omitiendo test");
        return;
    };
    let provider = PoolProvider { pool: build_pool(&db.url, 1, 2).expect("pool") };
    let mut engine = WorkflowEngine::builder(PgWorkflowStore::new(provider.clone()), PgHistoryStore::new(provider))
        .clock(Arc::new(FixedClock::new(Utc::now())))
        .build();
    let dir = std::env::temp_dir().join(format!("capa-evidence-{}", uuid::Uuid::new_v4()));
    let mut evidence = FsEvidenceStorage::new(&dir).expect("evidence dir");

    let report = run_scenarios(&mut engine, &mut evidence).expect("scenarios");
    assert_eq!(report.trail.len(), 5);
    assert!(report.audit.is_consistent(), "{:?}", report.audit);
    assert_eq!(evidence.read(&report.trail[1].photos[0]).unwrap(), b"demo-photo");
    let _ = std::fs::remove_dir_all(dir);
}
