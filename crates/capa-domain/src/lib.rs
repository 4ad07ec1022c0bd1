// capa-domain library entry point
pub mod actor;
pub mod error;
pub mod evidence;
pub mod workflow;
pub use actor::ActorId;
pub use error::DomainError;
pub use evidence::{EvidenceRef, EvidenceUpload};
pub use workflow::{non_blank, Nature, NewWorkflow, Workflow, WorkflowStatus};
