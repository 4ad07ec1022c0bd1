//! Engine module for WorkflowEngine implementation
//!
//! Provides the core engine, builder pattern, actor context and the read
//! contract consumed by review surfaces.

pub mod actor_ctx;
pub mod builder;
pub mod core;
pub mod view;

pub use actor_ctx::ActorCtx;
pub use builder::{EngineBuilder, EngineSettings};
pub use self::core::{HistoryWrite, TransitionOutcome, WorkflowEngine};
pub use view::{ReviewItem, WorkflowView};

pub use crate::history::{HistoryAction, HistoryEntry, HistoryStore, InMemoryHistoryStore};
pub use crate::repo::{InMemoryWorkflowStore, WorkflowStore};
