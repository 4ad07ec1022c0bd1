//! Evidencia en disco, direccionada por contenido.
//!
//! `evidence/<sha256>.<ext>` se guarda como `<root>/<sha256>.<ext>`. Subir
//! dos veces el mismo contenido no duplica el archivo.

use std::fs;
use std::path::{Path, PathBuf};

use capa_core::{EvidenceStorage, StoreError};
use capa_domain::{EvidenceRef, EvidenceUpload};
use capa_domain::evidence::EVIDENCE_PREFIX;
use log::debug;

use crate::error::PersistenceError;

#[derive(Debug, Clone)]
pub struct FsEvidenceStorage {
    root: PathBuf,
}

impl FsEvidenceStorage {
    /// Crea el directorio raíz si no existe.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ruta local de una referencia. `None` si no es una referencia de este
    /// almacén.
    pub fn path_for(&self, reference: &EvidenceRef) -> Option<PathBuf> {
        let name = reference.as_str().strip_prefix(EVIDENCE_PREFIX)?.strip_prefix('/')?;
        if name.is_empty() || name.contains('/') || name.contains("..") {
            return None;
        }
        Some(self.root.join(name))
    }

    pub fn read(&self, reference: &EvidenceRef) -> Result<Vec<u8>, PersistenceError> {
        let path = self.path_for(reference).ok_or(PersistenceError::NotFound)?;
        Ok(fs::read(path)?)
    }

    fn store_one(&self, upload: &EvidenceUpload) -> Result<EvidenceRef, PersistenceError> {
        let reference = EvidenceRef::content_addressed(upload);
        let path = self.path_for(&reference)
                       .ok_or_else(|| PersistenceError::Unknown(format!("bad evidence reference {reference}")))?;
        if path.exists() {
            debug!("evidence {reference} already stored");
            return Ok(reference);
        }
        // escribir aparte y renombrar: nunca queda un archivo a medias con el
        // nombre definitivo
        let tmp = path.with_extension("partial");
        fs::write(&tmp, &upload.bytes)?;
        fs::rename(&tmp, &path)?;
        debug!("evidence {reference} stored ({} bytes)", upload.bytes.len());
        Ok(reference)
    }
}

impl EvidenceStorage for FsEvidenceStorage {
    fn store_images(&mut self, files: &[EvidenceUpload]) -> Result<Vec<EvidenceRef>, StoreError> {
        files.iter()
             .map(|f| self.store_one(f).map_err(StoreError::from))
             .collect()
    }
}
