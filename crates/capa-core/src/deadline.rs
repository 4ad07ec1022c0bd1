//! Evaluador de vencimiento. Derivación sólo para mostrar: nunca se escribe
//! en el registro y se recalcula en cada lectura.

use capa_domain::{Workflow, WorkflowStatus};
use chrono::{DateTime, Duration, Utc};

/// Vencido ⇔ `deadline < now` y el workflow sigue `pending`.
///
/// Un workflow `returned` con deadline pasado NO se marca vencido aunque
/// también espere al responsable; se conserva así el comportamiento observado.
pub fn is_overdue(workflow: &Workflow, now: DateTime<Utc>) -> bool {
    workflow.status == WorkflowStatus::Pending && workflow.deadline < now
}

/// Tiempo que falta para el deadline; `None` si ya pasó.
pub fn time_remaining(workflow: &Workflow, now: DateTime<Utc>) -> Option<Duration> {
    let left = workflow.deadline - now;
    (left > Duration::zero()).then_some(left)
}
