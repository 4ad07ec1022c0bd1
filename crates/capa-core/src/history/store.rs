use std::collections::HashMap;
use uuid::Uuid;

use super::{HistoryEntry, NewHistoryEntry};
use crate::errors::StoreError;

/// Almacenamiento del historial: sólo append y lectura.
pub trait HistoryStore {
    /// Anexa una entrada en la posición `entry.seq`. Si esa posición ya no es
    /// la siguiente libre devuelve `StoreError::SeqConflict` sin escribir.
    fn append(&mut self, entry: NewHistoryEntry) -> Result<HistoryEntry, StoreError>;
    /// Lista las entradas de un workflow (orden ascendente de creación).
    fn list(&self, workflow_id: Uuid) -> Result<Vec<HistoryEntry>, StoreError>;
    /// Última entrada anexada, si existe.
    fn last(&self, workflow_id: Uuid) -> Result<Option<HistoryEntry>, StoreError> {
        Ok(self.list(workflow_id)?.pop())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    pub inner: HashMap<Uuid, Vec<HistoryEntry>>,
}

impl HistoryStore for InMemoryHistoryStore {
    fn append(&mut self, entry: NewHistoryEntry) -> Result<HistoryEntry, StoreError> {
        let vec = self.inner.entry(entry.workflow_id).or_default();
        let next = vec.len() as u64;
        if entry.seq != next {
            return Err(StoreError::SeqConflict { workflow_id: entry.workflow_id,
                                                 expected: entry.seq,
                                                 actual: next });
        }
        let stored = entry.into_entry();
        vec.push(stored.clone());
        Ok(stored)
    }

    fn list(&self, workflow_id: Uuid) -> Result<Vec<HistoryEntry>, StoreError> {
        Ok(self.inner.get(&workflow_id).cloned().unwrap_or_default())
    }

    fn last(&self, workflow_id: Uuid) -> Result<Option<HistoryEntry>, StoreError> {
        Ok(self.inner.get(&workflow_id).and_then(|v| v.last().cloned()))
    }
}

impl<H: HistoryStore + ?Sized> HistoryStore for Box<H> {
    fn append(&mut self, entry: NewHistoryEntry) -> Result<HistoryEntry, StoreError> { (**self).append(entry) }
    fn list(&self, workflow_id: Uuid) -> Result<Vec<HistoryEntry>, StoreError> { (**self).list(workflow_id) }
    fn last(&self, workflow_id: Uuid) -> Result<Option<HistoryEntry>, StoreError> { (**self).last(workflow_id) }
}
