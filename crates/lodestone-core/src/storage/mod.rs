pub mod config;
pub mod data;
pub mod document;
pub mod error;
pub mod keyvalue;
pub mod local;
pub mod manager;
pub mod provider;

/// Re-export key types
pub use config::{ConfigStore, Template};
pub use data::DataMap;
pub use document::ConfigDocument;
pub use error::{Result, StorageError};
pub use keyvalue::{BackendKind, DataDomain, KeyValueStore};
pub use local::LocalStorageProvider;
pub use manager::StorageManager;
pub use provider::StorageProvider;

/// Emit a recoverable-failure diagnostic: warning level when verbose mode
/// is on, debug level otherwise. Never silently dropped.
pub(crate) fn warn_diagnostic(verbose: bool, message: &str) {
    if verbose {
        log::warn!("{message}");
    } else {
        log::debug!("{message}");
    }
}

// Test module declaration
#[cfg(test)]
mod tests;
