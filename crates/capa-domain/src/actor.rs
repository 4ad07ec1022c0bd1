use serde::{Deserialize, Serialize};
use std::fmt;

use crate::DomainError;

/// Identificador opaco de un usuario que actúa sobre un workflow.
///
/// El valor lo entrega el colaborador externo de autenticación; aquí sólo se
/// compara por igualdad.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::ValidationError("actor id must not be blank".to_string()));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ActorId {
    type Err = DomainError;
    fn from_str(s: &str) -> Result<Self, Self::Err> { Self::new(s) }
}
