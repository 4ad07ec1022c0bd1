pub mod types;
pub use types::{InMemoryWorkflowStore, NewWorkflowRecord, WorkflowPatch, WorkflowStore};
