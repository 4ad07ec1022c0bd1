//! Handlers de cada subcomando sobre el engine Postgres.

use std::path::{Path, PathBuf};

use capa_core::{EvidenceStorage, IdentityProvider, Permission, StaticIdentity, WorkflowEngine};
use capa_domain::{ActorId, EvidenceRef, EvidenceUpload, Nature, NewWorkflow};
use capa_persistence::{FsEvidenceStorage, PgHistoryStore, PgWorkflowStore, PoolProvider};
use chrono::{DateTime, Utc};
use clap::{Subcommand, ValueEnum};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{CliError, CliResult};
use crate::output::Printer;

pub type PgEngine = WorkflowEngine<PgWorkflowStore<PoolProvider>, PgHistoryStore<PoolProvider>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Outcome {
    Completed,
    Blocked,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a workflow in `pending` for a deviation
    Create {
        #[arg(long)]
        deviation: Uuid,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Responsible party (the only actor allowed to respond)
        #[arg(long)]
        responsible: String,
        #[arg(long, value_parser = parse_nature)]
        nature: Nature,
        /// RFC 3339 instant, must be in the future
        #[arg(long)]
        deadline: DateTime<Utc>,
    },

    /// Submit the responsible party's response
    Respond {
        id: Uuid,
        #[arg(long, value_enum)]
        outcome: Outcome,
        /// Required when the outcome is `blocked`
        #[arg(long)]
        notes: Option<String>,
        /// Evidence file to upload (repeatable)
        #[arg(long = "photo")]
        photos: Vec<PathBuf>,
    },

    /// Approve a submitted response
    Approve { id: Uuid },

    /// Return a submitted response for rework
    Return {
        id: Uuid,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Detail sheet: record, permitted actions, overdue flag and history
    Show { id: Uuid },

    /// History entries in append order
    History { id: Uuid },

    /// All workflows of a deviation
    List {
        #[arg(long)]
        deviation: Uuid,
    },

    /// Workflows of a deviation on which the actor can act now
    Queue {
        #[arg(long)]
        deviation: Uuid,
    },

    /// Compare recorded status with the replayed history and verify the chain
    Audit { id: Uuid },
}

fn parse_nature(s: &str) -> Result<Nature, String> {
    s.parse().map_err(|e: capa_domain::DomainError| e.to_string())
}

pub struct Context {
    pub engine: PgEngine,
    pub identity: StaticIdentity,
    pub evidence_dir: PathBuf,
    pub printer: Printer,
}

impl Context {
    fn actor(&self) -> CliResult<ActorId> {
        self.identity
            .current_actor_id()
            .ok_or_else(|| CliError::Usage("an actor is required (--actor or CAPA_ACTOR)".into()))
    }

    fn upload(&self, paths: &[PathBuf]) -> CliResult<Vec<EvidenceRef>> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }
        let uploads = paths.iter().map(|p| read_upload(p)).collect::<CliResult<Vec<_>>>()?;
        let mut storage = FsEvidenceStorage::new(&self.evidence_dir)?;
        let refs = storage.store_images(&uploads).map_err(capa_core::CoreEngineError::from)?;
        debug!(count = refs.len(), dir = %self.evidence_dir.display(), "evidence stored");
        Ok(refs)
    }
}

fn read_upload(path: &Path) -> CliResult<EvidenceUpload> {
    let bytes = std::fs::read(path).map_err(|source| CliError::Io { path: path.display().to_string(),
                                                                     source })?;
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    Ok(EvidenceUpload::new(name, bytes)?)
}

pub fn run(ctx: &mut Context, command: Command) -> CliResult<()> {
    match command {
        Command::Create { deviation,
                          title,
                          description,
                          responsible,
                          nature,
                          deadline } => {
            let actor = ctx.actor()?;
            let new = NewWorkflow { deviation_id: deviation,
                                    title,
                                    description,
                                    responsible_id: ActorId::new(responsible)?,
                                    nature,
                                    deadline };
            let out = ctx.engine.create(&actor, new)?;
            info!(workflow = %out.workflow.id, "created");
            ctx.printer.outcome(&out)
        }
        Command::Respond { id, outcome, notes, photos } => {
            let actor = ctx.actor()?;
            // sin permiso el engine rechaza: no dejar evidencia huérfana en disco
            let refs = if ctx.engine.permitted_actions(id, &actor)?.contains(&Permission::Respond) {
                ctx.upload(&photos)?
            } else {
                Vec::new()
            };
            let out = match outcome {
                Outcome::Completed => ctx.engine.respond_completed(id, &actor, notes.as_deref(), refs)?,
                Outcome::Blocked => ctx.engine.respond_blocked(id, &actor, notes.as_deref(), refs)?,
            };
            ctx.printer.outcome(&out)
        }
        Command::Approve { id } => {
            let actor = ctx.actor()?;
            let out = ctx.engine.approve(id, &actor)?;
            ctx.printer.outcome(&out)
        }
        Command::Return { id, notes } => {
            let actor = ctx.actor()?;
            let out = ctx.engine.return_for_rework(id, &actor, notes.as_deref())?;
            ctx.printer.outcome(&out)
        }
        Command::Show { id } => {
            let actor = ctx.actor()?;
            let view = ctx.engine.view(id, &actor)?;
            ctx.printer.view(&view)
        }
        Command::History { id } => {
            let entries = ctx.engine.history(id)?;
            ctx.printer.history(&entries)
        }
        Command::List { deviation } => {
            let list = ctx.engine.workflows_for_deviation(deviation)?;
            ctx.printer.workflows(&list)
        }
        Command::Queue { deviation } => {
            let actor = ctx.actor()?;
            let items = ctx.engine.review_queue(deviation, &actor)?;
            ctx.printer.queue(&items)
        }
        Command::Audit { id } => {
            let report = ctx.engine.audit(id)?;
            ctx.printer.audit(&report)
        }
    }
}
