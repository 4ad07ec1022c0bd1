use capa_core::{HistoryEntry, HistoryStore, NewHistoryEntry, StoreError};
use capa_domain::{ActorId, EvidenceRef};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::debug;
use serde_json::Value;
use uuid::Uuid;

use super::{with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::schema::workflow_history;

/// Fila de `workflow_history`.
#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = workflow_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct HistoryRow {
    pub workflow_id: Uuid,
    pub seq: i64,
    pub id: Uuid,
    pub action: String,
    pub status_after: String,
    pub notes: Option<String>,
    pub photos: Value,
    pub performed_by: String,
    pub created_at: DateTime<Utc>,
    pub chain_hash: String,
}

impl HistoryRow {
    pub fn into_entry(self) -> Result<HistoryEntry, PersistenceError> {
        let id = self.id;
        let decode = |e: capa_domain::DomainError| PersistenceError::Decode(format!("history {id}: {e}"));
        let photos: Vec<EvidenceRef> = serde_json::from_value(self.photos.clone())?;
        Ok(HistoryEntry { seq: self.seq.max(0) as u64,
                          id: self.id,
                          workflow_id: self.workflow_id,
                          action: self.action.parse().map_err(decode)?,
                          status_after: self.status_after.parse().map_err(decode)?,
                          notes: self.notes.clone(),
                          photos,
                          performed_by: ActorId::new(self.performed_by.clone()).map_err(decode)?,
                          created_at: self.created_at,
                          chain_hash: self.chain_hash })
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = workflow_history)]
pub struct NewHistoryRow<'a> {
    pub workflow_id: &'a Uuid,
    pub seq: i64,
    pub id: &'a Uuid,
    pub action: &'a str,
    pub status_after: &'a str,
    pub notes: Option<&'a str>,
    pub photos: &'a Value,
    pub performed_by: &'a str,
    pub created_at: DateTime<Utc>,
    pub chain_hash: &'a str,
}

/// Historial append-only sobre `workflow_history`.
///
/// `seq` es por workflow (0, 1, 2, ...) y lo fija el engine al calcular el
/// `chain_hash`. Se inserta tal cual: si otro escritor ya ocupó esa posición
/// la PK `(workflow_id, seq)` rechaza el insert con unique violation y la
/// cadena no se bifurca.
pub struct PgHistoryStore<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgHistoryStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: ConnectionProvider> HistoryStore for PgHistoryStore<P> {
    fn append(&mut self, entry: NewHistoryEntry) -> Result<HistoryEntry, StoreError> {
        let photos = serde_json::to_value(&entry.photos).map_err(PersistenceError::from)?;
        let seq = i64::try_from(entry.seq).map_err(|_| StoreError::Backend(format!("seq {} out of range", entry.seq)))?;
        let mut conn = self.provider.connection()?;
        let last: Option<i64> = workflow_history::table.filter(workflow_history::workflow_id.eq(entry.workflow_id))
                                                       .select(diesel::dsl::max(workflow_history::seq))
                                                       .first(&mut conn)
                                                       .map_err(PersistenceError::from)?;
        let next = last.map_or(0, |s| s + 1);
        if next != seq {
            return Err(StoreError::SeqConflict { workflow_id: entry.workflow_id,
                                                 expected: entry.seq,
                                                 actual: next.max(0) as u64 });
        }
        let row = NewHistoryRow { workflow_id: &entry.workflow_id,
                                  seq,
                                  id: &entry.id,
                                  action: entry.action.as_str(),
                                  status_after: entry.status_after.as_str(),
                                  notes: entry.notes.as_deref(),
                                  photos: &photos,
                                  performed_by: entry.performed_by.as_str(),
                                  created_at: entry.created_at,
                                  chain_hash: &entry.chain_hash };
        // Entre el max() y el insert puede colarse otro append; la PK lo frena.
        diesel::insert_into(workflow_history::table).values(row)
                                                    .execute(&mut conn)
                                                    .map_err(PersistenceError::from)?;
        debug!("history append workflow={} seq={seq} action={}", entry.workflow_id, entry.action);
        Ok(entry.into_entry())
    }

    fn list(&self, workflow_id: Uuid) -> Result<Vec<HistoryEntry>, StoreError> {
        let rows: Vec<HistoryRow> = with_retry(|| {
                                        let mut conn = self.provider.connection()?;
                                        workflow_history::table.filter(workflow_history::workflow_id.eq(workflow_id))
                                                               .order(workflow_history::seq.asc())
                                                               .select(HistoryRow::as_select())
                                                               .load(&mut conn)
                                                               .map_err(PersistenceError::from)
                                    })?;
        rows.into_iter()
            .map(|r| r.into_entry().map_err(StoreError::from))
            .collect()
    }

    fn last(&self, workflow_id: Uuid) -> Result<Option<HistoryEntry>, StoreError> {
        let row: Option<HistoryRow> = with_retry(|| {
                                          let mut conn = self.provider.connection()?;
                                          workflow_history::table.filter(workflow_history::workflow_id.eq(workflow_id))
                                                                 .order(workflow_history::seq.desc())
                                                                 .select(HistoryRow::as_select())
                                                                 .first(&mut conn)
                                                                 .optional()
                                                                 .map_err(PersistenceError::from)
                                      })?;
        Ok(row.map(HistoryRow::into_entry).transpose()?)
    }
}
