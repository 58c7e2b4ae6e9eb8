//! Template-seeded, comment-preserving plugin configuration store.
//!
//! A [`ConfigStore`] manages one `key: value` text file per plugin. The file
//! is created from a [`Template`] on first use, regenerated from it when the
//! on-disk content is unparsable, and reconciled against the template's key
//! set on every open (missing defaults are appended, existing values are
//! never touched). Every mutation writes the full document and then re-reads
//! the file, so the in-memory view always reflects the authoritative on-disk
//! state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::storage::document::{render_scalar, ConfigDocument};
use crate::storage::error::{Result, StorageError};
use crate::storage::provider::StorageProvider;
use crate::storage::warn_diagnostic;

/// Immutable reference document defining a config store's canonical key set,
/// default values, and per-key comments.
#[derive(Debug, Clone)]
pub struct Template {
    text: String,
    document: ConfigDocument,
}

impl Template {
    /// Parse template text. A malformed template is a construction-time
    /// error; a valid template guarantees regeneration always succeeds.
    pub fn parse(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let document = ConfigDocument::parse(&text)?;
        Ok(Self { text, document })
    }

    /// The verbatim template text, written to disk on first use.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }
}

/// Self-healing structured configuration store for a single plugin file.
#[derive(Debug)]
pub struct ConfigStore {
    provider: Arc<dyn StorageProvider>,
    path: PathBuf,
    template: Template,
    document: ConfigDocument,
    verbose: bool,
}

impl ConfigStore {
    /// Open the config file at `path` (relative to the provider root),
    /// creating it from the template if absent and repairing it if
    /// unparsable, then reconcile it against the template's defaults.
    pub fn open(
        provider: Arc<dyn StorageProvider>,
        path: PathBuf,
        template: Template,
        verbose: bool,
    ) -> Result<Self> {
        if let Some(parent) = path.parent() {
            provider.create_dir_all(parent)?;
        }

        if !provider.exists(&path) {
            provider.write_string(&path, template.text())?;
        }

        let content = provider.read_to_string(&path)?;
        let document = match ConfigDocument::parse(&content) {
            Ok(document) => document,
            Err(parse_err) => {
                // Regeneration policy: an unparsable file is replaced by a
                // fresh copy of the template rather than surfaced as an
                // error. Anything the file held is gone, which is why the
                // diagnostic fires.
                warn_diagnostic(
                    verbose,
                    &format!(
                        "Config file '{}' is unparsable ({parse_err}); regenerating from template",
                        path.display()
                    ),
                );
                provider.remove_file(&path)?;
                provider.write_string(&path, template.text())?;
                let content = provider.read_to_string(&path)?;
                ConfigDocument::parse(&content)?
            }
        };

        let mut store = Self {
            provider,
            path,
            template,
            document,
            verbose,
        };
        store.reconcile_with_template()?;
        Ok(store)
    }

    /// Append every template key missing from the live document, carrying
    /// the template's default value and trailing comment. One-directional:
    /// never removes extra keys, never overwrites existing values.
    fn reconcile_with_template(&mut self) -> Result<()> {
        let mut missing: Vec<(String, Value, Option<String>)> = Vec::new();
        for (key, value, comment) in self.template.document().entries() {
            if !self.document.contains_key(key) {
                missing.push((key.to_string(), value.clone(), comment.map(String::from)));
            }
        }
        if missing.is_empty() {
            return Ok(());
        }

        for (key, value, comment) in missing {
            warn_diagnostic(
                self.verbose,
                &format!(
                    "Config file '{}' is missing key '{key}'; appending template default",
                    self.path.display()
                ),
            );
            self.document.push_entry(key, value, comment);
        }
        self.sync_to_disk()
    }

    /// Write the rendered document, then re-read and re-parse the file so
    /// the in-memory document matches the on-disk state exactly.
    fn sync_to_disk(&mut self) -> Result<()> {
        self.provider.write_string(&self.path, &self.document.render())?;
        let content = self.provider.read_to_string(&self.path)?;
        self.document = ConfigDocument::parse(&content)?;
        Ok(())
    }

    /// Get a typed value. Pure in-memory lookup, no I/O.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.document
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Get a typed value, falling back to a default.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Get the raw value for a key.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.document.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.document.contains_key(key)
    }

    /// All keys in document order.
    pub fn keys(&self) -> Vec<String> {
        self.document.keys()
    }

    /// Update a key's value and persist. A key not present in the document
    /// is added at the end instead (without a comment).
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let value = to_scalar_value(value)?;
        if !self.document.set(key, value.clone()) {
            self.document.push_entry(key, value, None);
        }
        self.sync_to_disk()
    }

    /// Append a new key (with an optional comment on the following line)
    /// and persist.
    pub fn add<T: Serialize>(&mut self, key: &str, value: T, comment: Option<&str>) -> Result<()> {
        let value = to_scalar_value(value)?;
        self.document.push_entry(key, value, comment.map(String::from));
        self.sync_to_disk()
    }

    /// Path of the backing file, relative to the provider root.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Serialize a value and check it renders as a single-line scalar.
fn to_scalar_value<T: Serialize>(value: T) -> Result<Value> {
    let value = serde_json::to_value(value).map_err(|e| StorageError::Serialization {
        format: "json".to_string(),
        source: Box::new(e),
    })?;
    render_scalar(&value)?;
    Ok(value)
}
