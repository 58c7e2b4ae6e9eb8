use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::storage::config::{ConfigStore, Template};
use crate::storage::data::DataMap;
use crate::storage::error::{Result, StorageError};
use crate::storage::keyvalue::{DataDomain, KeyValueStore};
use crate::storage::local::LocalStorageProvider;
use crate::storage::provider::StorageProvider;

/// Entry point for plugin persistence.
///
/// Owns the server root path, the storage provider, and the verbose flag
/// (captured once, copied into each store it constructs). Resolves the
/// on-disk layout:
///
/// ```text
/// <root>/config/<plugin-id>/<file>          structured config
/// <root>/playerdata/<file>                  player-scoped data
/// <root>/plugindata/<file>                  server-scoped data
/// <root>/worlds/<world>/plugindata/<file>   world-scoped data
/// ```
#[derive(Clone)]
pub struct StorageManager {
    base_path: PathBuf,
    provider: Arc<dyn StorageProvider>,
    verbose: bool,
}

impl StorageManager {
    /// Create a manager rooted at `base_path` with a local filesystem
    /// provider.
    pub fn new(base_path: PathBuf, verbose: bool) -> Self {
        let provider = Arc::new(LocalStorageProvider::new(base_path.clone()));
        Self {
            base_path,
            provider,
            verbose,
        }
    }

    /// Create a manager with a custom provider.
    pub fn with_provider(
        provider: Arc<dyn StorageProvider>,
        base_path: PathBuf,
        verbose: bool,
    ) -> Self {
        Self {
            base_path,
            provider,
            verbose,
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn provider(&self) -> &Arc<dyn StorageProvider> {
        &self.provider
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Resolve the config file path for a plugin, relative to the root.
    pub fn config_path(&self, plugin_id: &str, file_name: &str) -> PathBuf {
        PathBuf::from("config").join(plugin_id).join(file_name)
    }

    /// Resolve a data file path for a domain, relative to the root. World
    /// domain requires a world name.
    pub fn resolve_data_path(
        &self,
        domain: DataDomain,
        file_name: &str,
        world: Option<&str>,
    ) -> Result<PathBuf> {
        match domain {
            DataDomain::Player => Ok(PathBuf::from("playerdata").join(file_name)),
            DataDomain::Server => Ok(PathBuf::from("plugindata").join(file_name)),
            DataDomain::World => {
                let world = world.ok_or_else(|| StorageError::MissingWorldName {
                    file: file_name.to_string(),
                })?;
                Ok(PathBuf::from("worlds")
                    .join(world)
                    .join("plugindata")
                    .join(file_name))
            }
        }
    }

    /// Open (or create) a plugin's structured config store.
    pub fn open_config(
        &self,
        plugin_id: &str,
        file_name: &str,
        template: Template,
    ) -> Result<ConfigStore> {
        let path = self.config_path(plugin_id, file_name);
        ConfigStore::open(self.provider.clone(), path, template, self.verbose)
    }

    /// Open (or create) a key-value data store for a domain.
    pub fn open_data(
        &self,
        domain: DataDomain,
        file_name: &str,
        world: Option<&str>,
        defaults: DataMap,
    ) -> Result<KeyValueStore> {
        let path = self.resolve_data_path(domain, file_name, world)?;
        KeyValueStore::open(self.provider.clone(), domain, path, defaults, self.verbose)
    }

    /// Ensure the standard directories exist.
    pub fn ensure_directories(&self) -> Result<()> {
        self.provider.create_dir_all(Path::new("config"))?;
        self.provider.create_dir_all(Path::new("playerdata"))?;
        self.provider.create_dir_all(Path::new("plugindata"))?;
        self.provider.create_dir_all(Path::new("worlds"))?;
        log::debug!("Storage root ready at {}", self.base_path.display());
        Ok(())
    }

    /// List config file names under a plugin's config directory.
    pub fn list_configs(&self, plugin_id: &str) -> Result<Vec<String>> {
        let dir = PathBuf::from("config").join(plugin_id);
        if !self.provider.exists(&dir) {
            return Ok(vec![]);
        }
        let entries = self.provider.read_dir(&dir)?;
        let names = entries
            .into_iter()
            .filter(|path| self.provider.is_file(path))
            .filter_map(|path| {
                path.file_name()
                    .and_then(|name| name.to_str().map(String::from))
            })
            .collect();
        Ok(names)
    }
}

impl Debug for StorageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageManager")
            .field("base_path", &self.base_path)
            .field("provider", &self.provider.name())
            .field("verbose", &self.verbose)
            .finish()
    }
}
