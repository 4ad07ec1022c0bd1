use capa_core::{NewWorkflowRecord, StoreError, WorkflowPatch, WorkflowStore};
use capa_domain::{ActorId, EvidenceRef, Workflow, WorkflowStatus};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::debug;
use serde_json::Value;
use uuid::Uuid;

use super::{with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::schema::workflows;

/// Fila de `workflows`.
#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = workflows)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkflowRow {
    pub id: Uuid,
    pub sequence_id: i64,
    pub deviation_id: Uuid,
    pub title: String,
    pub description: String,
    pub responsible_id: String,
    pub nature: String,
    pub deadline: DateTime<Utc>,
    pub status: String,
    pub response_notes: Option<String>,
    pub evidence_photos: Value,
    pub validator_notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowRow {
    pub fn into_workflow(self) -> Result<Workflow, PersistenceError> {
        let id = self.id;
        let decode = |e: capa_domain::DomainError| PersistenceError::Decode(format!("workflow {id}: {e}"));
        let photos: Vec<EvidenceRef> = serde_json::from_value(self.evidence_photos.clone())?;
        Ok(Workflow { id: self.id,
                      sequence_id: self.sequence_id,
                      deviation_id: self.deviation_id,
                      responsible_id: ActorId::new(self.responsible_id.clone()).map_err(decode)?,
                      nature: self.nature.parse().map_err(decode)?,
                      status: self.status.parse().map_err(decode)?,
                      version: u64::try_from(self.version).map_err(|_| {
                                                               PersistenceError::Decode(format!("negative version {}",
                                                                                                self.version))
                                                           })?,
                      title: self.title,
                      description: self.description,
                      deadline: self.deadline,
                      response_notes: self.response_notes,
                      evidence_photos: photos,
                      validator_notes: self.validator_notes,
                      completed_at: self.completed_at,
                      created_at: self.created_at,
                      updated_at: self.updated_at })
    }
}

/// Fila para insertar. `sequence_id` lo asigna el BIGSERIAL.
#[derive(Insertable, Debug)]
#[diesel(table_name = workflows)]
pub struct NewWorkflowRow<'a> {
    pub id: &'a Uuid,
    pub deviation_id: &'a Uuid,
    pub title: &'a str,
    pub description: &'a str,
    pub responsible_id: &'a str,
    pub nature: &'a str,
    pub deadline: DateTime<Utc>,
    pub status: &'a str,
    pub evidence_photos: Value,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cambios de un `WorkflowPatch`. `None` no toca la columna; `Some(None)`
/// escribe NULL.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = workflows)]
pub struct WorkflowChangeset {
    pub status: Option<&'static str>,
    pub response_notes: Option<Option<String>>,
    pub evidence_photos: Option<Value>,
    pub validator_notes: Option<Option<String>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&WorkflowPatch> for WorkflowChangeset {
    type Error = PersistenceError;

    fn try_from(p: &WorkflowPatch) -> Result<Self, Self::Error> {
        let evidence_photos = match &p.evidence_photos {
            Some(photos) => Some(serde_json::to_value(photos)?),
            None => None,
        };
        Ok(Self { status: p.status.map(|s| s.as_str()),
                  response_notes: p.response_notes.clone(),
                  evidence_photos,
                  validator_notes: p.validator_notes.clone(),
                  completed_at: p.completed_at,
                  updated_at: p.updated_at })
    }
}

/// Record store sobre la tabla `workflows`.
pub struct PgWorkflowStore<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgWorkflowStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: ConnectionProvider> WorkflowStore for PgWorkflowStore<P> {
    fn get(&self, id: Uuid) -> Result<Workflow, StoreError> {
        let row: Option<WorkflowRow> = with_retry(|| {
                                           let mut conn = self.provider.connection()?;
                                           workflows::table.find(id)
                                                           .select(WorkflowRow::as_select())
                                                           .first(&mut conn)
                                                           .optional()
                                                           .map_err(PersistenceError::from)
                                       })?;
        Ok(row.ok_or(StoreError::NotFound(id))?.into_workflow()?)
    }

    fn list_by_deviation(&self, deviation_id: Uuid) -> Result<Vec<Workflow>, StoreError> {
        let rows: Vec<WorkflowRow> = with_retry(|| {
                                         let mut conn = self.provider.connection()?;
                                         workflows::table.filter(workflows::deviation_id.eq(deviation_id))
                                                         .order(workflows::sequence_id.asc())
                                                         .select(WorkflowRow::as_select())
                                                         .load(&mut conn)
                                                         .map_err(PersistenceError::from)
                                     })?;
        debug!("list_by_deviation deviation={deviation_id} count={}", rows.len());
        rows.into_iter()
            .map(|r| r.into_workflow().map_err(StoreError::from))
            .collect()
    }

    fn insert(&mut self, record: NewWorkflowRecord) -> Result<Workflow, StoreError> {
        let f = &record.fields;
        let row = NewWorkflowRow { id: &record.id,
                                   deviation_id: &f.deviation_id,
                                   title: &f.title,
                                   description: &f.description,
                                   responsible_id: f.responsible_id.as_str(),
                                   nature: f.nature.as_str(),
                                   deadline: f.deadline,
                                   status: WorkflowStatus::Pending.as_str(),
                                   evidence_photos: Value::Array(Vec::new()),
                                   version: 1,
                                   created_at: record.created_at,
                                   updated_at: record.created_at };
        let mut conn = self.provider.connection()?;
        let inserted: WorkflowRow = diesel::insert_into(workflows::table).values(row)
                                                                         .returning(WorkflowRow::as_returning())
                                                                         .get_result(&mut conn)
                                                                         .map_err(PersistenceError::from)?;
        debug!("insert workflow={} seq={}", inserted.id, inserted.sequence_id);
        Ok(inserted.into_workflow()?)
    }

    fn update(&mut self, id: Uuid, expected_version: u64, patch: WorkflowPatch) -> Result<Workflow, StoreError> {
        let changes = WorkflowChangeset::try_from(&patch)?;
        let expected = i64::try_from(expected_version).map_err(|_| {
                                                             StoreError::Backend(format!("version {expected_version} out of range"))
                                                         })?;
        let mut conn = self.provider.connection()?;
        let updated: Option<WorkflowRow> =
            diesel::update(workflows::table.filter(workflows::id.eq(id)).filter(workflows::version.eq(expected)))
                .set((changes, workflows::version.eq(workflows::version + 1)))
                .returning(WorkflowRow::as_returning())
                .get_result(&mut conn)
                .optional()
                .map_err(PersistenceError::from)?;
        if let Some(row) = updated {
            return Ok(row.into_workflow()?);
        }
        // cero filas: no existe o la versión ya avanzó
        let actual: Option<i64> = workflows::table.find(id)
                                                  .select(workflows::version)
                                                  .first(&mut conn)
                                                  .optional()
                                                  .map_err(PersistenceError::from)?;
        match actual {
            Some(v) => Err(StoreError::VersionConflict { id,
                                                         expected: expected_version,
                                                         actual: v.max(0) as u64 }),
            None => Err(StoreError::NotFound(id)),
        }
    }
}
