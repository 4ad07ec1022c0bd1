//! Configuración central de la aplicación.
//! Carga variables de entorno (.env, una sola vez) y arma `AppConfig`:
//! base de datos opcional, política de reintento del historial y directorio
//! de evidencia.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use capa_core::constants::{DEFAULT_HISTORY_APPEND_ATTEMPTS, DEFAULT_HISTORY_RETRY_BACKOFF_MS};
use capa_core::EngineSettings;
use capa_persistence::DbConfig;

use crate::errors::AppError;

pub const DEFAULT_EVIDENCE_DIR: &str = "./evidence";

/// Configuración de la aplicación (extensible para más secciones).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `None` si no hay `DATABASE_URL`: los binarios trabajan en memoria.
    pub database: Option<DbConfig>,
    pub engine: EngineSettings,
    pub evidence_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        capa_persistence::init_dotenv();
        let database = match env::var("DATABASE_URL") {
            Ok(_) => Some(DbConfig::from_env()?),
            Err(_) => None,
        };
        let engine = EngineSettings { history_append_attempts: parse_var("CAPA_HISTORY_APPEND_ATTEMPTS",
                                                                         DEFAULT_HISTORY_APPEND_ATTEMPTS)?,
                                      history_retry_backoff_ms: parse_var("CAPA_HISTORY_RETRY_BACKOFF_MS",
                                                                          DEFAULT_HISTORY_RETRY_BACKOFF_MS)? };
        if engine.history_append_attempts == 0 {
            return Err(AppError::Config("CAPA_HISTORY_APPEND_ATTEMPTS must be at least 1".into()));
        }
        let evidence_dir = env::var("CAPA_EVIDENCE_DIR").map(PathBuf::from)
                                                        .unwrap_or_else(|_| PathBuf::from(DEFAULT_EVIDENCE_DIR));
        Ok(Self { database,
                  engine,
                  evidence_dir })
    }
}

/// Variable ausente = default; presente pero inválida = error.
fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) => raw.trim()
                      .parse()
                      .map_err(|_| AppError::Config(format!("{key}='{raw}' no es un valor válido"))),
        Err(_) => Ok(default),
    }
}
