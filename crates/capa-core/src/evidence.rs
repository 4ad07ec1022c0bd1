//! Almacenamiento de evidencia (colaborador externo).
//!
//! El motor sólo conserva las referencias devueltas; nunca lee el contenido.

use std::collections::HashMap;

use capa_domain::{EvidenceRef, EvidenceUpload};

use crate::errors::StoreError;

pub trait EvidenceStorage {
    /// Guarda los archivos y devuelve sus referencias en el mismo orden.
    fn store_images(&mut self, files: &[EvidenceUpload]) -> Result<Vec<EvidenceRef>, StoreError>;
}

/// Almacén en memoria direccionado por contenido.
#[derive(Debug, Default)]
pub struct InMemoryEvidenceStorage {
    pub inner: HashMap<EvidenceRef, Vec<u8>>,
}

impl InMemoryEvidenceStorage {
    pub fn get(&self, reference: &EvidenceRef) -> Option<&[u8]> {
        self.inner.get(reference).map(|b| b.as_slice())
    }
}

impl EvidenceStorage for InMemoryEvidenceStorage {
    fn store_images(&mut self, files: &[EvidenceUpload]) -> Result<Vec<EvidenceRef>, StoreError> {
        Ok(files.iter()
                .map(|f| {
                    let r = EvidenceRef::content_addressed(f);
                    self.inner.entry(r.clone()).or_insert_with(|| f.bytes.clone());
                    r
                })
                .collect())
    }
}
