//! Contrato de lectura para la superficie de revisión (listas, detalle).

use std::collections::BTreeSet;

use capa_domain::{ActorId, Workflow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::deadline::{is_overdue, time_remaining};
use crate::gate::{permitted_actions, Permission};
use crate::history::HistoryEntry;

/// Fila de una lista de pendientes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub workflow: Workflow,
    pub permitted: BTreeSet<Permission>,
    pub overdue: bool,
    /// Segundos hasta el deadline; `None` una vez alcanzado.
    pub remaining_secs: Option<i64>,
}

impl ReviewItem {
    pub fn build(workflow: Workflow, actor: &ActorId, now: DateTime<Utc>) -> Self {
        let permitted = permitted_actions(&workflow, actor);
        let overdue = is_overdue(&workflow, now);
        let remaining_secs = time_remaining(&workflow, now).map(|d| d.num_seconds());
        Self { workflow,
               permitted,
               overdue,
               remaining_secs }
    }
}

/// Hoja de detalle de un workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowView {
    pub workflow: Workflow,
    pub permitted: BTreeSet<Permission>,
    pub overdue: bool,
    pub remaining_secs: Option<i64>,
    pub history: Vec<HistoryEntry>,
}

impl WorkflowView {
    pub fn build(workflow: Workflow, actor: &ActorId, now: DateTime<Utc>, history: Vec<HistoryEntry>) -> Self {
        let ReviewItem { workflow,
                         permitted,
                         overdue,
                         remaining_secs } = ReviewItem::build(workflow, actor, now);
        Self { workflow,
               permitted,
               overdue,
               remaining_secs,
               history }
    }

    /// Sin acciones: la hoja se muestra en modo sólo lectura.
    pub fn is_read_only(&self) -> bool {
        self.permitted.is_empty()
    }
}
