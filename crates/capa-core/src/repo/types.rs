//! Record store: proyección mutable del estado actual de cada workflow.
//!
//! A diferencia del historial, aquí sí hay updates. Cada update lleva la
//! versión leída por el caller (`expected_version`); si otro actor escribió
//! entre medio, el store rechaza con `StoreError::VersionConflict`.
use capa_domain::{EvidenceRef, NewWorkflow, Workflow, WorkflowStatus};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use uuid::Uuid;

use crate::errors::StoreError;

/// Fila a insertar. `sequence_id` y `version` los asigna el store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkflowRecord {
    pub id: Uuid,
    pub fields: NewWorkflow,
    pub created_at: DateTime<Utc>,
}

/// Cambios parciales sobre un workflow. `None` = no tocar el campo;
/// `Some(None)` en las notas = limpiar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowPatch {
    pub status: Option<WorkflowStatus>,
    pub response_notes: Option<Option<String>>,
    pub evidence_photos: Option<Vec<EvidenceRef>>,
    pub validator_notes: Option<Option<String>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowPatch {
    pub fn at(updated_at: DateTime<Utc>) -> Self {
        Self { status: None,
               response_notes: None,
               evidence_photos: None,
               validator_notes: None,
               completed_at: None,
               updated_at }
    }

    /// Aplica el patch sobre una copia en memoria (no toca `version`).
    pub fn apply_to(&self, wf: &mut Workflow) {
        if let Some(st) = self.status {
            wf.status = st;
        }
        if let Some(notes) = &self.response_notes {
            wf.response_notes = notes.clone();
        }
        if let Some(photos) = &self.evidence_photos {
            wf.evidence_photos = photos.clone();
        }
        if let Some(notes) = &self.validator_notes {
            wf.validator_notes = notes.clone();
        }
        if let Some(at) = self.completed_at {
            wf.completed_at = Some(at);
        }
        wf.updated_at = self.updated_at;
    }
}

/// Contrato del record store (create / read / update-by-id).
pub trait WorkflowStore {
    fn get(&self, id: Uuid) -> Result<Workflow, StoreError>;
    /// Workflows de una desviación en orden de creación.
    fn list_by_deviation(&self, deviation_id: Uuid) -> Result<Vec<Workflow>, StoreError>;
    fn insert(&mut self, record: NewWorkflowRecord) -> Result<Workflow, StoreError>;
    /// Update condicionado a `expected_version`; devuelve el registro nuevo.
    fn update(&mut self, id: Uuid, expected_version: u64, patch: WorkflowPatch) -> Result<Workflow, StoreError>;
}

/// Store en memoria; `IndexMap` conserva el orden de inserción.
#[derive(Debug, Default)]
pub struct InMemoryWorkflowStore {
    pub inner: IndexMap<Uuid, Workflow>,
    last_sequence: i64,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl WorkflowStore for InMemoryWorkflowStore {
    fn get(&self, id: Uuid) -> Result<Workflow, StoreError> {
        self.inner.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    fn list_by_deviation(&self, deviation_id: Uuid) -> Result<Vec<Workflow>, StoreError> {
        Ok(self.inner
               .values()
               .filter(|w| w.deviation_id == deviation_id)
               .cloned()
               .collect())
    }

    fn insert(&mut self, record: NewWorkflowRecord) -> Result<Workflow, StoreError> {
        if self.inner.contains_key(&record.id) {
            return Err(StoreError::Backend(format!("duplicate workflow id {}", record.id)));
        }
        self.last_sequence += 1;
        let f = record.fields;
        let wf = Workflow { id: record.id,
                            sequence_id: self.last_sequence,
                            deviation_id: f.deviation_id,
                            title: f.title,
                            description: f.description,
                            responsible_id: f.responsible_id,
                            nature: f.nature,
                            deadline: f.deadline,
                            status: WorkflowStatus::Pending,
                            response_notes: None,
                            evidence_photos: Vec::new(),
                            validator_notes: None,
                            completed_at: None,
                            version: 1,
                            created_at: record.created_at,
                            updated_at: record.created_at };
        self.inner.insert(wf.id, wf.clone());
        Ok(wf)
    }

    fn update(&mut self, id: Uuid, expected_version: u64, patch: WorkflowPatch) -> Result<Workflow, StoreError> {
        let wf = self.inner.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if wf.version != expected_version {
            return Err(StoreError::VersionConflict { id,
                                                     expected: expected_version,
                                                     actual: wf.version });
        }
        patch.apply_to(wf);
        wf.version += 1;
        Ok(wf.clone())
    }
}

impl<W: WorkflowStore + ?Sized> WorkflowStore for Box<W> {
    fn get(&self, id: Uuid) -> Result<Workflow, StoreError> { (**self).get(id) }
    fn list_by_deviation(&self, deviation_id: Uuid) -> Result<Vec<Workflow>, StoreError> {
        (**self).list_by_deviation(deviation_id)
    }
    fn insert(&mut self, record: NewWorkflowRecord) -> Result<Workflow, StoreError> { (**self).insert(record) }
    fn update(&mut self, id: Uuid, expected_version: u64, patch: WorkflowPatch) -> Result<Workflow, StoreError> {
        (**self).update(id, expected_version, patch)
    }
}
