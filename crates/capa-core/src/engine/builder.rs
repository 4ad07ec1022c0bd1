//! Builder del engine: stores obligatorios, reloj y política de reintento
//! del historial opcionales.

use crate::clock::{Clock, SystemClock};
use crate::constants::{DEFAULT_HISTORY_APPEND_ATTEMPTS, DEFAULT_HISTORY_RETRY_BACKOFF_MS};
use crate::engine::WorkflowEngine;
use crate::history::HistoryStore;
use crate::repo::WorkflowStore;

/// Política de reintento del append de historial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Intentos totales (mínimo efectivo 1).
    pub history_append_attempts: u32,
    /// Backoff base en ms; el intento `n` espera `n * backoff`.
    pub history_retry_backoff_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self { history_append_attempts: DEFAULT_HISTORY_APPEND_ATTEMPTS,
               history_retry_backoff_ms: DEFAULT_HISTORY_RETRY_BACKOFF_MS }
    }
}

pub struct EngineBuilder<W, H, C = SystemClock> {
    workflows: W,
    history: H,
    clock: C,
    settings: EngineSettings,
}

impl<W: WorkflowStore, H: HistoryStore> EngineBuilder<W, H, SystemClock> {
    pub fn new(workflows: W, history: H) -> Self {
        Self { workflows,
               history,
               clock: SystemClock,
               settings: EngineSettings::default() }
    }
}

impl<W: WorkflowStore, H: HistoryStore, C: Clock> EngineBuilder<W, H, C> {
    /// Reemplaza el reloj (tests, demos con tiempo fijo).
    pub fn clock<C2: Clock>(self, clock: C2) -> EngineBuilder<W, H, C2> {
        EngineBuilder { workflows: self.workflows,
                        history: self.history,
                        clock,
                        settings: self.settings }
    }

    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn history_append_attempts(mut self, attempts: u32) -> Self {
        self.settings.history_append_attempts = attempts;
        self
    }

    pub fn history_retry_backoff_ms(mut self, ms: u64) -> Self {
        self.settings.history_retry_backoff_ms = ms;
        self
    }

    pub fn build(self) -> WorkflowEngine<W, H, C> {
        WorkflowEngine::from_parts(self.workflows, self.history, self.clock, self.settings)
    }
}
