//! Reloj inyectable. El evaluador de vencimiento y la validación de creación
//! nunca leen la hora del sistema directamente.

use chrono::{DateTime, Duration, Utc};
use std::sync::RwLock;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> { Utc::now() }
}

/// Reloj fijo y ajustable para tests y demos.
#[derive(Debug)]
pub struct FixedClock {
    inner: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { inner: RwLock::new(at) }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        let mut guard = self.inner.write().unwrap_or_else(|p| p.into_inner());
        *guard = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.inner.write().unwrap_or_else(|p| p.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.inner.read().unwrap_or_else(|p| p.into_inner())
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> { (**self).now() }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> { (**self).now() }
}
