//! Core WorkflowEngine implementation

use std::collections::BTreeSet;
use std::time::Duration as StdDuration;

use capa_domain::{ActorId, EvidenceRef, NewWorkflow, Workflow, WorkflowStatus};
use chrono::{DateTime, SubsecRound, Utc};
use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::deadline::is_overdue;
use crate::engine::{EngineBuilder, EngineSettings, ReviewItem, WorkflowView};
use crate::errors::{CoreEngineError, StoreError};
use crate::gate::{permitted_actions, Permission};
use crate::history::{HistoryAction, HistoryEntry, HistoryStore, InMemoryHistoryStore, NewHistoryEntry};
use crate::machine::{plan, validate_creation, WorkflowCommand};
use crate::replay::{audit, next_chain_hash, AuditReport};
use crate::repo::{InMemoryWorkflowStore, NewWorkflowRecord, WorkflowStore};

/// Qué pasó con la entrada de historial de una transición ya aplicada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryWrite {
    Recorded(HistoryEntry),
    /// El registro se actualizó pero el append falló en todos los intentos.
    /// Queda pendiente de reconciliación manual (ver `WorkflowEngine::audit`).
    Missing { attempts: u32, last_error: StoreError },
}

/// Espera antes del intento `attempt + 1`: `attempt * base`, saturando en
/// vez de desbordar con configuraciones extremas.
pub(crate) fn retry_delay_ms(base_ms: u64, attempt: u32) -> u64 {
    base_ms.saturating_mul(u64::from(attempt))
}

/// Resultado de `create` / `apply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub workflow: Workflow,
    pub tag: HistoryAction,
    pub history: HistoryWrite,
}

impl TransitionOutcome {
    pub fn history_entry(&self) -> Option<&HistoryEntry> {
        match &self.history {
            HistoryWrite::Recorded(e) => Some(e),
            HistoryWrite::Missing { .. } => None,
        }
    }

    pub fn history_recorded(&self) -> bool {
        matches!(self.history, HistoryWrite::Recorded(_))
    }
}

/// Motor del workflow CAPA.
///
/// Orquesta gate, máquina de estados, record store e historial. Cada
/// transición son dos escrituras secuenciales (update del registro, luego
/// append del historial) sin transacción común: si el append falla se
/// reintenta sólo el append, nunca el update.
#[derive(Debug)]
pub struct WorkflowEngine<W, H, C = SystemClock>
    where W: WorkflowStore,
          H: HistoryStore,
          C: Clock
{
    workflows: W,
    history: H,
    clock: C,
    settings: EngineSettings,
}

impl<W, H> WorkflowEngine<W, H, SystemClock>
    where W: WorkflowStore,
          H: HistoryStore
{
    /// Crea un nuevo builder para configurar el engine
    #[inline]
    pub fn builder(workflows: W, history: H) -> EngineBuilder<W, H, SystemClock> {
        EngineBuilder::new(workflows, history)
    }
}

impl WorkflowEngine<InMemoryWorkflowStore, InMemoryHistoryStore, SystemClock> {
    /// Builder con stores en memoria
    #[inline]
    pub fn new() -> EngineBuilder<InMemoryWorkflowStore, InMemoryHistoryStore, SystemClock> {
        EngineBuilder::new(InMemoryWorkflowStore::new(), InMemoryHistoryStore::default())
    }
}

impl<W, H, C> WorkflowEngine<W, H, C>
    where W: WorkflowStore,
          H: HistoryStore,
          C: Clock
{
    pub(crate) fn from_parts(workflows: W, history: H, clock: C, settings: EngineSettings) -> Self {
        Self { workflows,
               history,
               clock,
               settings }
    }

    pub fn workflow_store(&self) -> &W {
        &self.workflows
    }

    pub fn workflow_store_mut(&mut self) -> &mut W {
        &mut self.workflows
    }

    pub fn history_store(&self) -> &H {
        &self.history
    }

    pub fn history_store_mut(&mut self) -> &mut H {
        &mut self.history
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    // Postgres guarda microsegundos; truncar aquí mantiene estable el
    // chain_hash después de un roundtrip por la base.
    fn now(&self) -> DateTime<Utc> {
        self.clock.now().trunc_subsecs(6)
    }

    /// Alta de un workflow en `pending`. Cualquier actor con acceso a la
    /// desviación puede crearlo; ese acceso lo controla el colaborador externo.
    pub fn create(&mut self, actor: &ActorId, new: NewWorkflow) -> Result<TransitionOutcome, CoreEngineError> {
        let now = self.now();
        validate_creation(&new, now)?;
        let record = NewWorkflowRecord { id: Uuid::new_v4(),
                                         fields: new,
                                         created_at: now };
        let workflow = self.workflows.insert(record)?;
        debug!("create:inserted workflow={} seq={} by={actor}", workflow.id, workflow.sequence_id);
        let history = self.append_history(&workflow, HistoryAction::Created, None, Vec::new(), actor, now);
        info!("workflow {} created for deviation {} (responsible={})",
              workflow.id, workflow.deviation_id, workflow.responsible_id);
        Ok(TransitionOutcome { workflow,
                               tag: HistoryAction::Created,
                               history })
    }

    /// Aplica un comando: gate + máquina de estados, update condicionado a la
    /// versión leída y append del historial.
    pub fn apply(&mut self,
                 id: Uuid,
                 actor: &ActorId,
                 command: WorkflowCommand)
                 -> Result<TransitionOutcome, CoreEngineError> {
        let current = self.workflows.get(id)?;
        let now = self.now();
        let kind = command.kind();
        let transition = plan(&current, actor, command, now).map_err(|e| {
                                                                 debug!("apply:rejected workflow={id} command={kind} by={actor}: {e}");
                                                                 e
                                                             })?;
        let updated = self.workflows.update(id, current.version, transition.patch.clone())?;
        let history = self.append_history(&updated, transition.tag, transition.notes, transition.photos, actor, now);
        info!("workflow {id}: {} -> {} ({}) by {actor}", transition.from, transition.to, transition.tag);
        Ok(TransitionOutcome { workflow: updated,
                               tag: transition.tag,
                               history })
    }

    pub fn respond_completed(&mut self,
                             id: Uuid,
                             actor: &ActorId,
                             notes: Option<&str>,
                             photos: Vec<EvidenceRef>)
                             -> Result<TransitionOutcome, CoreEngineError> {
        self.apply(id,
                   actor,
                   WorkflowCommand::RespondCompleted { notes: notes.map(str::to_string),
                                                       photos })
    }

    pub fn respond_blocked(&mut self,
                           id: Uuid,
                           actor: &ActorId,
                           notes: Option<&str>,
                           photos: Vec<EvidenceRef>)
                           -> Result<TransitionOutcome, CoreEngineError> {
        self.apply(id,
                   actor,
                   WorkflowCommand::RespondBlocked { notes: notes.map(str::to_string),
                                                     photos })
    }

    pub fn approve(&mut self, id: Uuid, actor: &ActorId) -> Result<TransitionOutcome, CoreEngineError> {
        self.apply(id, actor, WorkflowCommand::Approve)
    }

    pub fn return_for_rework(&mut self,
                             id: Uuid,
                             actor: &ActorId,
                             validator_notes: Option<&str>)
                             -> Result<TransitionOutcome, CoreEngineError> {
        self.apply(id,
                   actor,
                   WorkflowCommand::Return { validator_notes: validator_notes.map(str::to_string) })
    }

    fn append_history(&mut self,
                      workflow: &Workflow,
                      action: HistoryAction,
                      notes: Option<String>,
                      photos: Vec<EvidenceRef>,
                      actor: &ActorId,
                      at: DateTime<Utc>)
                      -> HistoryWrite {
        let attempts = self.settings.history_append_attempts.max(1);
        let entry_id = Uuid::new_v4();
        let mut last_error = StoreError::Backend("history append not attempted".into());
        for attempt in 1..=attempts {
            match self.try_append(entry_id, workflow, action, notes.clone(), photos.clone(), actor, at) {
                Ok(entry) => {
                    debug!("history:appended workflow={} seq={} action={}", workflow.id, entry.seq, action);
                    return HistoryWrite::Recorded(entry);
                }
                Err(e) => {
                    warn!("history append failed (attempt {attempt}/{attempts}) workflow={} action={action}: {e}",
                          workflow.id);
                    last_error = e;
                    if attempt < attempts && self.settings.history_retry_backoff_ms > 0 {
                        let delay = retry_delay_ms(self.settings.history_retry_backoff_ms, attempt);
                        std::thread::sleep(StdDuration::from_millis(delay));
                    }
                }
            }
        }
        error!("reconciliation needed: workflow {} is {} but its '{action}' history entry was not recorded after {attempts} attempts: {last_error}",
               workflow.id, workflow.status);
        HistoryWrite::Missing { attempts, last_error }
    }

    #[allow(clippy::too_many_arguments)]
    fn try_append(&mut self,
                  entry_id: Uuid,
                  workflow: &Workflow,
                  action: HistoryAction,
                  notes: Option<String>,
                  photos: Vec<EvidenceRef>,
                  actor: &ActorId,
                  at: DateTime<Utc>)
                  -> Result<HistoryEntry, StoreError> {
        // Si otro escritor anexa entre `last` y `append`, el store rechaza la
        // seq y el siguiente intento vuelve a leer el predecesor.
        let previous = self.history.last(workflow.id)?;
        let mut entry = NewHistoryEntry { seq: previous.as_ref().map_or(0, |p| p.seq + 1),
                                          id: entry_id,
                                          workflow_id: workflow.id,
                                          action,
                                          status_after: workflow.status,
                                          notes,
                                          photos,
                                          performed_by: actor.clone(),
                                          created_at: at,
                                          chain_hash: String::new() };
        entry.chain_hash = next_chain_hash(previous.as_ref(), &entry.content());
        self.history.append(entry)
    }

    pub fn get(&self, id: Uuid) -> Result<Workflow, CoreEngineError> {
        Ok(self.workflows.get(id)?)
    }

    pub fn workflows_for_deviation(&self, deviation_id: Uuid) -> Result<Vec<Workflow>, CoreEngineError> {
        Ok(self.workflows.list_by_deviation(deviation_id)?)
    }

    /// Historial en orden ascendente.
    pub fn history(&self, id: Uuid) -> Result<Vec<HistoryEntry>, CoreEngineError> {
        Ok(self.history.list(id)?)
    }

    pub fn permitted_actions(&self, id: Uuid, actor: &ActorId) -> Result<BTreeSet<Permission>, CoreEngineError> {
        let wf = self.workflows.get(id)?;
        Ok(permitted_actions(&wf, actor))
    }

    pub fn is_overdue(&self, id: Uuid) -> Result<bool, CoreEngineError> {
        let wf = self.workflows.get(id)?;
        Ok(is_overdue(&wf, self.clock.now()))
    }

    /// Vista de detalle: registro, acciones permitidas, vencimiento e
    /// historial. Siempre disponible aunque el actor no pueda hacer nada.
    pub fn view(&self, id: Uuid, actor: &ActorId) -> Result<WorkflowView, CoreEngineError> {
        let workflow = self.workflows.get(id)?;
        let history = self.history.list(id)?;
        Ok(WorkflowView::build(workflow, actor, self.clock.now(), history))
    }

    /// Ítems accionables por `actor` en una desviación: primero los vencidos,
    /// luego por deadline más próximo.
    pub fn review_queue(&self, deviation_id: Uuid, actor: &ActorId) -> Result<Vec<ReviewItem>, CoreEngineError> {
        let now = self.clock.now();
        let mut items: Vec<ReviewItem> = self.workflows
                                             .list_by_deviation(deviation_id)?
                                             .into_iter()
                                             .map(|w| ReviewItem::build(w, actor, now))
                                             .filter(|i| !i.permitted.is_empty())
                                             .collect();
        items.sort_by(|a, b| b.overdue.cmp(&a.overdue).then(a.workflow.deadline.cmp(&b.workflow.deadline)));
        Ok(items)
    }

    /// Compara el estado registrado con el derivado del historial y verifica
    /// la cadena de hashes. No repara.
    pub fn audit(&self, id: Uuid) -> Result<AuditReport, CoreEngineError> {
        let wf = self.workflows.get(id)?;
        let entries = self.history.list(id)?;
        let report = audit(&wf, &entries);
        if !report.is_consistent() {
            warn!("audit: workflow {id} inconsistent (recorded={}, derived={:?}, chain_valid={})",
                  report.recorded_status, report.derived_status, report.chain_valid);
        }
        Ok(report)
    }

    /// Estado actual sin pasar por el registro (sólo historial).
    pub fn derived_status(&self, id: Uuid) -> Result<Option<WorkflowStatus>, CoreEngineError> {
        let entries = self.history.list(id)?;
        Ok(crate::replay::derive_status(id, &entries).ok())
    }
}
