//! Actor context implementation

use std::collections::BTreeSet;

use capa_domain::{ActorId, EvidenceRef, NewWorkflow};
use uuid::Uuid;

use crate::clock::Clock;
use crate::engine::{ReviewItem, TransitionOutcome, WorkflowEngine, WorkflowView};
use crate::errors::CoreEngineError;
use crate::gate::Permission;
use crate::history::HistoryStore;
use crate::repo::WorkflowStore;

/// Contexto de un actor sobre un `WorkflowEngine`.
///
/// El actor queda fijado una vez y se pasa explícito en cada llamada al
/// motor; el motor no lee identidad ambiental.
pub struct ActorCtx<'a, W: WorkflowStore, H: HistoryStore, C: Clock> {
    pub engine: &'a mut WorkflowEngine<W, H, C>,
    pub actor: ActorId,
}

impl<'a, W: WorkflowStore, H: HistoryStore, C: Clock> ActorCtx<'a, W, H, C> {
    #[inline]
    pub fn new(engine: &'a mut WorkflowEngine<W, H, C>, actor: ActorId) -> Self {
        Self { engine, actor }
    }

    #[inline]
    pub fn create(&mut self, new: NewWorkflow) -> Result<TransitionOutcome, CoreEngineError> {
        self.engine.create(&self.actor, new)
    }

    #[inline]
    pub fn respond_completed(&mut self,
                             id: Uuid,
                             notes: Option<&str>,
                             photos: Vec<EvidenceRef>)
                             -> Result<TransitionOutcome, CoreEngineError> {
        self.engine.respond_completed(id, &self.actor, notes, photos)
    }

    #[inline]
    pub fn respond_blocked(&mut self,
                           id: Uuid,
                           notes: Option<&str>,
                           photos: Vec<EvidenceRef>)
                           -> Result<TransitionOutcome, CoreEngineError> {
        self.engine.respond_blocked(id, &self.actor, notes, photos)
    }

    #[inline]
    pub fn approve(&mut self, id: Uuid) -> Result<TransitionOutcome, CoreEngineError> {
        self.engine.approve(id, &self.actor)
    }

    #[inline]
    pub fn return_for_rework(&mut self, id: Uuid, notes: Option<&str>) -> Result<TransitionOutcome, CoreEngineError> {
        self.engine.return_for_rework(id, &self.actor, notes)
    }

    #[inline]
    pub fn permitted(&self, id: Uuid) -> Result<BTreeSet<Permission>, CoreEngineError> {
        self.engine.permitted_actions(id, &self.actor)
    }

    #[inline]
    pub fn view(&self, id: Uuid) -> Result<WorkflowView, CoreEngineError> {
        self.engine.view(id, &self.actor)
    }

    #[inline]
    pub fn review_queue(&self, deviation_id: Uuid) -> Result<Vec<ReviewItem>, CoreEngineError> {
        self.engine.review_queue(deviation_id, &self.actor)
    }
}

impl<W: WorkflowStore, H: HistoryStore, C: Clock> WorkflowEngine<W, H, C> {
    /// Contexto ergonómico para operar como `actor`.
    pub fn as_actor(&mut self, actor: ActorId) -> ActorCtx<'_, W, H, C> {
        ActorCtx::new(self, actor)
    }
}
