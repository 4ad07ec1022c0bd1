//! Hash helpers sobre BLAKE3 (hex de 64 caracteres).

use blake3::Hasher;
use serde_json::{json, Value};

use super::to_canonical_json;
use crate::constants::ENGINE_VERSION;

/// Hashea un string y devuelve hex.
pub fn hash_str(input: &str) -> String {
    let mut h = Hasher::new();
    h.update(input.as_bytes());
    h.finalize().to_hex().to_string()
}

/// Hash del JSON canónico de `value` (independiente del orden de claves).
pub fn hash_value(value: &Value) -> String {
    hash_str(&to_canonical_json(value))
}

/// Eslabón de la cadena del historial: combina el hash previo con el
/// contenido de la entrada nueva.
pub fn chain_hash(previous: &str, content: &Value) -> String {
    hash_value(&json!({
        "engine_version": ENGINE_VERSION,
        "previous": previous,
        "content": content,
    }))
}
