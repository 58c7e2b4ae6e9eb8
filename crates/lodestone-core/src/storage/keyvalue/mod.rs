//! Dual-backend key-value data store.
//!
//! A [`KeyValueStore`] persists typed key-value data for one plugin file,
//! backed by either a pretty-printed JSON file or an embedded SQLite table —
//! selected by file extension. Defaults supplied at construction are the
//! floor of the value set: persisted data merges over them, and every
//! default key is always present.

mod sqlite;

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::storage::data::DataMap;
use crate::storage::error::{Result, StorageError};
use crate::storage::keyvalue::sqlite::SqliteBackend;
use crate::storage::provider::StorageProvider;
use crate::storage::warn_diagnostic;

/// Scoping category for a data store. Determines the path resolution
/// strategy only; the stored data does not carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDomain {
    /// Per-player data, under `playerdata/`
    Player,
    /// Per-world data, under `worlds/<world>/plugindata/`
    World,
    /// Server-global data, under `plugindata/`
    Server,
}

impl fmt::Display for DataDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataDomain::Player => write!(f, "player"),
            DataDomain::World => write!(f, "world"),
            DataDomain::Server => write!(f, "server"),
        }
    }
}

/// Physical storage medium, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Whole-object JSON file (`.json`)
    Json,
    /// Embedded SQLite table (`.sqlite`)
    Sqlite,
}

impl BackendKind {
    /// Determine the backend from a file extension. Any extension other
    /// than the two recognized ones is a construction-time error.
    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(BackendKind::Json),
                "sqlite" => Some(BackendKind::Sqlite),
                _ => None,
            })
            .ok_or_else(|| StorageError::UnsupportedExtension(path.to_path_buf()))
    }
}

#[derive(Debug)]
enum Backend {
    Json,
    Sqlite(SqliteBackend),
}

/// Key-value store for one (domain, path) pair.
#[derive(Debug)]
pub struct KeyValueStore {
    provider: Arc<dyn StorageProvider>,
    path: PathBuf,
    domain: DataDomain,
    values: DataMap,
    backend: Backend,
    /// Keys whose last write did not reach the backend.
    unsynced: BTreeSet<String>,
}

impl KeyValueStore {
    /// Open the data file at `path` (relative to the provider root, already
    /// resolved for the domain) and merge persisted data over `defaults`.
    pub fn open(
        provider: Arc<dyn StorageProvider>,
        domain: DataDomain,
        path: PathBuf,
        defaults: DataMap,
        verbose: bool,
    ) -> Result<Self> {
        let kind = BackendKind::from_path(&path)?;
        if let Some(parent) = path.parent() {
            provider.create_dir_all(parent)?;
        }

        let mut values = defaults;
        let backend = match kind {
            BackendKind::Json => {
                Self::load_json(&*provider, &path, &mut values, verbose)?;
                Backend::Json
            }
            BackendKind::Sqlite => {
                let backend = SqliteBackend::open(&provider.full_path(&path))?;
                Self::load_sqlite(&backend, &path, &mut values, verbose)?;
                Backend::Sqlite(backend)
            }
        };

        Ok(Self {
            provider,
            path,
            domain,
            values,
            backend,
            unsynced: BTreeSet::new(),
        })
    }

    /// Flat-file load: an absent file is seeded with the defaults; an
    /// unreadable one is left untouched on disk and the defaults stand.
    fn load_json(
        provider: &dyn StorageProvider,
        path: &Path,
        values: &mut DataMap,
        verbose: bool,
    ) -> Result<()> {
        if !provider.exists(path) {
            provider.write_string(path, &values.to_json()?)?;
            return Ok(());
        }
        let content = provider.read_to_string(path)?;
        match DataMap::from_json(&content) {
            Ok(persisted) => values.merge(&persisted),
            Err(e) => {
                warn_diagnostic(
                    verbose,
                    &format!(
                        "Data file '{}' could not be deserialized ({e}); continuing with defaults, file left as-is",
                        path.display()
                    ),
                );
            }
        }
        Ok(())
    }

    /// Table load: merge every row over the defaults; a fresh (empty) table
    /// is seeded with one row per default so it always reflects the full
    /// effective key set.
    fn load_sqlite(
        backend: &SqliteBackend,
        path: &Path,
        values: &mut DataMap,
        verbose: bool,
    ) -> Result<()> {
        let rows = backend.load_all()?;
        if rows.is_empty() {
            for (key, value) in values.iter() {
                backend.upsert(key, &serialize_value(value)?)?;
            }
            return Ok(());
        }
        for (key, text) in rows {
            match serde_json::from_str::<Value>(&text) {
                Ok(value) => {
                    // Persisted rows override defaults, not vice versa.
                    values.set(&key, value)?;
                }
                Err(e) => {
                    warn_diagnostic(
                        verbose,
                        &format!(
                            "Row '{key}' in '{}' holds unparsable value ({e}); keeping default",
                            path.display()
                        ),
                    );
                }
            }
        }
        Ok(())
    }

    /// Get a typed value. Pure in-memory lookup, no I/O.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values.get(key)
    }

    /// Get a typed value with a default.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.values.get_or(key, default)
    }

    /// Get the raw value for a key.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.value(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.values.keys()
    }

    /// Update a key and persist it.
    ///
    /// The JSON backend rewrites the whole file; failures there propagate.
    /// The SQLite backend upserts one row; an upsert failure is non-fatal —
    /// the in-memory value stays updated, the failure is logged, and the key
    /// is reported by [`unsynced_keys`](Self::unsynced_keys) until a later
    /// write for it succeeds.
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        self.values.set(key, value)?;
        match &self.backend {
            Backend::Json => {
                let content = self.values.to_json()?;
                self.provider.write_string(&self.path, &content)?;
            }
            Backend::Sqlite(backend) => {
                // value() is always Some here, set() above just inserted it
                let text = match self.values.value(key) {
                    Some(value) => serialize_value(value)?,
                    None => return Ok(()),
                };
                match backend.upsert(key, &text) {
                    Ok(()) => {
                        self.unsynced.remove(key);
                    }
                    Err(e) => {
                        log::error!(
                            "Failed to persist key '{key}' to '{}': {e}; in-memory value kept",
                            self.path.display()
                        );
                        self.unsynced.insert(key.to_string());
                    }
                }
            }
        }
        Ok(())
    }

    /// Keys whose most recent write failed to reach the backend.
    pub fn unsynced_keys(&self) -> Vec<String> {
        self.unsynced.iter().cloned().collect()
    }

    /// Whether every write has reached the backend.
    pub fn is_fully_persisted(&self) -> bool {
        self.unsynced.is_empty()
    }

    pub fn domain(&self) -> DataDomain {
        self.domain
    }

    /// Path of the backing file, relative to the provider root.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backend_kind(&self) -> BackendKind {
        match self.backend {
            Backend::Json => BackendKind::Json,
            Backend::Sqlite(_) => BackendKind::Sqlite,
        }
    }
}

fn serialize_value(value: &Value) -> Result<String> {
    serde_json::to_string(value).map_err(|e| StorageError::Serialization {
        format: "json".to_string(),
        source: Box::new(e),
    })
}
