//! Runtime configuration.
//!
//! Resolved once at process startup and passed into the core. Nothing in the
//! core reads environment variables on its own; callers hand the raw values
//! to [`ClinicConfig::from_env_values`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::db::Database;
use crate::print::InstitutionHeader;
use crate::repository::{RepoResult, Repository};
use crate::store::KeyValueStore;

pub const BACKEND_ENV: &str = "CLINIC_RX_BACKEND";
pub const DB_PATH_ENV: &str = "CLINIC_RX_DB_PATH";
pub const INSTITUTION_ENV: &str = "CLINIC_RX_INSTITUTION";
pub const DEPARTMENT_ENV: &str = "CLINIC_RX_DEPARTMENT";
pub const REGION_ENV: &str = "CLINIC_RX_REGION";

/// Storage path that keeps everything in memory for the process lifetime.
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Configuration errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown storage backend: {0} (expected \"sqlite\" or \"key-value\")")]
    UnknownBackend(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Where records are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// SQLite database file
    #[default]
    Sqlite,
    /// JSON document per entity type, local-storage style
    KeyValue,
}

impl Backend {
    pub fn default_path(self) -> &'static str {
        match self {
            Backend::Sqlite => "clinic-rx.db",
            Backend::KeyValue => "clinic-rx.json",
        }
    }
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "db" => Ok(Backend::Sqlite),
            "key-value" | "kv" | "json" | "local-storage" => Ok(Backend::KeyValue),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Sqlite => write!(f, "sqlite"),
            Backend::KeyValue => write!(f, "key-value"),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Debug, Clone)]
pub struct ClinicConfig {
    backend: Backend,
    storage_path: PathBuf,
    header: InstitutionHeader,
}

impl ClinicConfig {
    /// Create a new `ClinicConfig`.
    pub fn new(
        backend: Backend,
        storage_path: PathBuf,
        header: InstitutionHeader,
    ) -> ConfigResult<Self> {
        if storage_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("storage path cannot be empty".into()));
        }
        if header.institution.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "institution name cannot be empty".into(),
            ));
        }

        Ok(Self {
            backend,
            storage_path,
            header,
        })
    }

    /// Build from optional raw values, as read from the environment.
    ///
    /// Blank values fall back to the defaults.
    pub fn from_env_values(
        backend: Option<String>,
        storage_path: Option<String>,
        institution: Option<String>,
        department: Option<String>,
        region: Option<String>,
    ) -> ConfigResult<Self> {
        let backend = non_blank(backend)
            .map(|b| b.parse::<Backend>())
            .transpose()?
            .unwrap_or_default();
        let storage_path = non_blank(storage_path)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(backend.default_path()));

        let defaults = InstitutionHeader::default();
        let header = InstitutionHeader {
            institution: non_blank(institution).unwrap_or(defaults.institution),
            department: non_blank(department).unwrap_or(defaults.department),
            region: non_blank(region).unwrap_or(defaults.region),
        };

        Self::new(backend, storage_path, header)
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    pub fn header(&self) -> &InstitutionHeader {
        &self.header
    }

    pub fn is_in_memory(&self) -> bool {
        self.storage_path.as_os_str() == IN_MEMORY_PATH
    }

    /// Open the configured backend.
    pub fn open_repository(&self) -> RepoResult<Box<dyn Repository + Send>> {
        tracing::debug!(
            backend = %self.backend,
            path = %self.storage_path.display(),
            "opening repository"
        );
        let repo: Box<dyn Repository + Send> = match (self.backend, self.is_in_memory()) {
            (Backend::Sqlite, true) => Box::new(Database::open_in_memory()?),
            (Backend::Sqlite, false) => Box::new(Database::open(&self.storage_path)?),
            (Backend::KeyValue, true) => Box::new(KeyValueStore::in_memory()),
            (Backend::KeyValue, false) => Box::new(KeyValueStore::open(&self.storage_path)?),
        };
        Ok(repo)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
