//! Evidencia fotográfica adjunta a una respuesta.
//!
//! El motor trata la evidencia como referencias opacas: nunca interpreta el
//! contenido. Las implementaciones de almacenamiento incluidas direccionan el
//! contenido por SHA-256, de modo que subir dos veces la misma imagen produce
//! la misma referencia.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

use crate::DomainError;

/// Prefijo común de las referencias generadas por los almacenes de evidencia.
pub const EVIDENCE_PREFIX: &str = "evidence";

/// Referencia opaca a un objeto de evidencia ya almacenado.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidenceRef(String);

impl EvidenceRef {
    pub fn new(reference: impl Into<String>) -> Result<Self, DomainError> {
        let reference = reference.into();
        if reference.trim().is_empty() {
            return Err(DomainError::ValidationError("evidence reference must not be blank".to_string()));
        }
        Ok(Self(reference))
    }

    /// Referencia direccionada por contenido: `evidence/<sha256>.<ext>`.
    pub fn content_addressed(upload: &EvidenceUpload) -> Self {
        Self(format!("{}/{}.{}", EVIDENCE_PREFIX, upload.digest(), upload.extension()))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for EvidenceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Archivo recibido desde la superficie de captura, previo a almacenarse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl EvidenceUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, DomainError> {
        let file_name = file_name.into();
        if bytes.is_empty() {
            return Err(DomainError::ValidationError(format!("evidence file '{file_name}' is empty")));
        }
        Ok(Self { file_name, bytes })
    }

    /// SHA-256 del contenido en hex.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        format!("{:x}", hasher.finalize())
    }

    /// Extensión en minúsculas; `bin` cuando el nombre no la trae.
    pub fn extension(&self) -> String {
        Path::new(&self.file_name).extension()
                                  .and_then(|e| e.to_str())
                                  .filter(|e| !e.is_empty())
                                  .map(|e| e.to_ascii_lowercase())
                                  .unwrap_or_else(|| "bin".to_string())
    }
}
