//! `capa`: CLI de operador para workflows CAPA sobre Postgres.
//!
//! El actor se toma de `--actor` / `CAPA_ACTOR`; el motor nunca lo infiere.
//! Códigos de salida: 0 ok, 2 uso, 3 validación, 4 autorización o conflicto
//! de estado, 5 backend.

use std::path::PathBuf;
use std::process::ExitCode;

use capa_core::{EngineSettings, StaticIdentity, WorkflowEngine};
use capa_domain::ActorId;
use capa_persistence::{build_pool, init_dotenv, PgHistoryStore, PgWorkflowStore, PoolProvider, DEFAULT_MAX_CONNECTIONS,
                       DEFAULT_MIN_CONNECTIONS};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod output;

use commands::{Command, Context};
use error::{CliError, CliResult};
use output::{OutputFormat, Printer};

#[derive(Debug, Parser)]
#[command(name = "capa")]
#[command(about = "Corrective/preventive action workflows", long_about = None)]
#[command(version)]
struct Cli {
    /// Acting user
    #[arg(short, long, env = "CAPA_ACTOR", global = true)]
    actor: Option<String>,

    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true, global = true)]
    database_url: Option<String>,

    /// Minimum idle connections in the pool
    #[arg(long, env = "DATABASE_MIN_CONNECTIONS", default_value_t = DEFAULT_MIN_CONNECTIONS, global = true)]
    db_min_connections: u32,

    /// Maximum connections in the pool
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS, global = true)]
    db_max_connections: u32,

    /// Directory for uploaded evidence
    #[arg(long, env = "CAPA_EVIDENCE_DIR", default_value = "./evidence", global = true)]
    evidence_dir: PathBuf,

    /// History append attempts per transition
    #[arg(long, env = "CAPA_HISTORY_APPEND_ATTEMPTS", default_value_t = capa_core::constants::DEFAULT_HISTORY_APPEND_ATTEMPTS, global = true)]
    history_attempts: u32,

    /// Base backoff (ms) between history append attempts
    #[arg(long, env = "CAPA_HISTORY_RETRY_BACKOFF_MS", default_value_t = capa_core::constants::DEFAULT_HISTORY_RETRY_BACKOFF_MS, global = true)]
    history_backoff_ms: u64,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() -> ExitCode {
    init_dotenv();
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().without_time().with_writer(std::io::stderr))
        .init();

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn execute(cli: Cli) -> CliResult<()> {
    let identity = match cli.actor {
        Some(a) => StaticIdentity::new(ActorId::new(a)?),
        None => StaticIdentity::anonymous(),
    };
    let url = cli.database_url
                 .ok_or_else(|| CliError::Usage("DATABASE_URL is required (--database-url or env)".into()))?;
    let pool = build_pool(&url, cli.db_min_connections, cli.db_max_connections)?;
    let provider = PoolProvider { pool };
    let settings = EngineSettings { history_append_attempts: cli.history_attempts,
                                    history_retry_backoff_ms: cli.history_backoff_ms };
    let engine = WorkflowEngine::builder(PgWorkflowStore::new(provider.clone()), PgHistoryStore::new(provider))
        .settings(settings)
        .build();
    let mut ctx = Context { engine,
                            identity,
                            evidence_dir: cli.evidence_dir,
                            printer: Printer { format: if cli.json { OutputFormat::Json } else { OutputFormat::Text } } };
    commands::run(&mut ctx, cli.command)
}
