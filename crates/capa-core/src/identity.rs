//! Identidad del actor actual.
//!
//! El motor nunca consulta este trait: recibe `ActorId` explícito en cada
//! llamada. Sólo las superficies externas (CLI, demo) lo usan para resolver
//! quién está actuando antes de invocar al motor.

use capa_domain::ActorId;

pub trait IdentityProvider {
    fn current_actor_id(&self) -> Option<ActorId>;
}

/// Identidad fija (p.ej. la tomada de `--actor` o `CAPA_ACTOR`).
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(pub Option<ActorId>);

impl StaticIdentity {
    pub fn new(actor: ActorId) -> Self { Self(Some(actor)) }
    pub fn anonymous() -> Self { Self(None) }
}

impl IdentityProvider for StaticIdentity {
    fn current_actor_id(&self) -> Option<ActorId> { self.0.clone() }
}
