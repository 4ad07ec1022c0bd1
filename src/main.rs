//! main-core: demo del ciclo de vida CAPA.
//!
//! Corre el recorrido de `capaflow_rust::demo` en memoria e imprime el
//! historial. Con `--features pg_demo` y `DATABASE_URL` definido repite el
//! recorrido sobre Postgres.

use std::process::ExitCode;
use std::sync::Arc;

use capa_core::{FixedClock, InMemoryEvidenceStorage, WorkflowEngine};
use capaflow_rust::demo::{run_scenarios, DemoReport};
use capaflow_rust::{AppConfig, AppError};
use chrono::Utc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_report(label: &str, report: &DemoReport) {
    println!("== {label}: workflow {} (deviation {})", report.workflow_id, report.deviation_id);
    for e in &report.trail {
        println!("  {:>2} {:<20} -> {:<20} by {:<3} {}",
                 e.seq,
                 e.action,
                 e.status_after,
                 e.performed_by,
                 e.notes.as_deref().unwrap_or(""));
    }
    println!("  audit: recorded={} derived={:?} chain_valid={}",
             report.audit.recorded_status, report.audit.derived_status, report.audit.chain_valid);
}

fn run_in_memory(config: &AppConfig) -> Result<DemoReport, AppError> {
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let mut engine = WorkflowEngine::new().clock(clock).settings(config.engine).build();
    let mut evidence = InMemoryEvidenceStorage::default();
    run_scenarios(&mut engine, &mut evidence)
}

#[cfg(feature = "pg_demo")]
fn run_on_postgres(config: &AppConfig) -> Result<Option<DemoReport>, AppError> {
    use capa_persistence::{build_pool, FsEvidenceStorage, PgHistoryStore, PgWorkflowStore, PoolProvider};

    let Some(db) = &config.database else {
        info!("DATABASE_URL no definido: se omite la demo en Postgres");
        return Ok(None);
    };
    let provider = PoolProvider { pool: build_pool(&db.url, db.min_connections, db.max_connections)? };
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let mut engine = WorkflowEngine::builder(PgWorkflowStore::new(provider.clone()), PgHistoryStore::new(provider))
        .clock(clock)
        .settings(config.engine)
        .build();
    let mut evidence = FsEvidenceStorage::new(&config.evidence_dir)?;
    run_scenarios(&mut engine, &mut evidence).map(Some)
}

fn run() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let report = run_in_memory(&config)?;
    print_report("in-memory", &report);

    #[cfg(feature = "pg_demo")]
    if let Some(report) = run_on_postgres(&config)? {
        print_report("postgres", &report);
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run() {
        Ok(()) => {
            info!("demo ok");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
