//! Máquina de estados del workflow CAPA.
//!
//! Lógica pura: dado el estado actual, el actor, el comando y la hora,
//! decide el estado siguiente, la etiqueta de historial y el patch del
//! registro, o rechaza. No toca ningún store.
//!
//! | comando           | desde                 | actor           | etiqueta                                  |
//! |-------------------|-----------------------|-----------------|-------------------------------------------|
//! | RespondCompleted  | pending, returned     | responsable     | submitted_completed / resubmitted         |
//! | RespondBlocked    | pending, returned     | responsable     | submitted_blocked / resubmitted           |
//! | Approve           | submitted_*           | no responsable  | approved                                  |
//! | Return            | submitted_*           | no responsable  | returned                                  |

mod command;
mod transition;

pub use command::{CommandKind, WorkflowCommand};
pub use transition::{is_legal, plan, successors, validate_creation, Transition};
