//! Historial append-only de transiciones (audit trail).

mod store;
mod types;

pub use store::{HistoryStore, InMemoryHistoryStore};
pub use types::{HistoryAction, HistoryEntry, NewHistoryEntry};
