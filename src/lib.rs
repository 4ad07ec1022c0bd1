//! CapaFlow Rust Library
//!
//! Capa de aplicación sobre los crates del workspace:
//! - `config`: `AppConfig` desde entorno/.env.
//! - `errors`: `AppError` para binarios.
//! - `demo`: recorrido de los escenarios de referencia sobre cualquier par
//!   de stores.

pub mod config;
pub mod demo;
pub mod errors;

pub use config::AppConfig;
pub use errors::AppError;
