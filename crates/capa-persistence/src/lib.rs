//! capa-persistence
//!
//! Implementaciones Postgres (Diesel + r2d2) de `WorkflowStore` y
//! `HistoryStore`, almacenamiento de evidencia en disco, migraciones
//! embebidas y carga de configuración desde `.env`.
//!
//! Módulos:
//! - `pg`: stores sobre Postgres y construcción del pool.
//! - `evidence`: `FsEvidenceStorage` direccionado por contenido.
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde .env.
//! - `schema`: tablas Diesel.

pub mod config;
pub mod error;
pub mod evidence;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::{init_dotenv, DbConfig, DEFAULT_MAX_CONNECTIONS, DEFAULT_MIN_CONNECTIONS};
pub use error::PersistenceError;
pub use evidence::FsEvidenceStorage;
pub use pg::{build_pool, ConnectionProvider, PgHistoryStore, PgPool, PgWorkflowStore, PoolProvider};
