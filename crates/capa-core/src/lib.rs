//! capa-core: motor del workflow de acciones correctivas/preventivas.
//!
//! Componentes (de hojas a raíz):
//! - `history`: historial append-only de transiciones.
//! - `repo`: record store con la proyección de estado actual.
//! - `machine`: máquina de estados pura.
//! - `gate`: acciones permitidas por actor.
//! - `deadline`: derivación de vencimiento.
//! - `engine`: orquestación de las dos escrituras por transición.
pub mod clock;
pub mod constants;
pub mod deadline;
pub mod engine;
pub mod errors;
pub mod evidence;
pub mod gate;
pub mod hashing;
pub mod history;
pub mod identity;
pub mod machine;
pub mod replay;
pub mod repo;

pub use clock::{Clock, FixedClock, SystemClock};
pub use deadline::{is_overdue, time_remaining};
pub use engine::{ActorCtx, EngineBuilder, EngineSettings, HistoryWrite, ReviewItem, TransitionOutcome, WorkflowEngine,
                 WorkflowView};
pub use errors::{CoreEngineError, ErrorKind, StoreError};
pub use evidence::{EvidenceStorage, InMemoryEvidenceStorage};
pub use gate::{permitted_actions, Permission};
pub use history::{HistoryAction, HistoryEntry, HistoryStore, InMemoryHistoryStore, NewHistoryEntry};
pub use identity::{IdentityProvider, StaticIdentity};
pub use machine::{CommandKind, WorkflowCommand};
pub use replay::AuditReport;
pub use repo::{InMemoryWorkflowStore, NewWorkflowRecord, WorkflowPatch, WorkflowStore};
