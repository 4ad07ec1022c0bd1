//! Constantes del motor core.
//!
//! `ENGINE_VERSION` participa en el cálculo del `chain_hash` de cada entrada
//! del historial: cambiarla invalida la verificación de cadenas existentes.

/// Versión lógica del motor incluida en el hash encadenado del historial.
pub const ENGINE_VERSION: &str = "C1.0";

/// Intentos por defecto para re-anexar una entrada de historial cuando el
/// update del registro ya se aplicó.
pub const DEFAULT_HISTORY_APPEND_ATTEMPTS: u32 = 3;

/// Backoff base (ms) entre intentos de append; crece linealmente.
pub const DEFAULT_HISTORY_RETRY_BACKOFF_MS: u64 = 15;

/// Hash previo de la primera entrada de una cadena.
pub const GENESIS_CHAIN_HASH: &str = "";
