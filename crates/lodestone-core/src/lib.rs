//! # lodestone-core
//!
//! Persistence layer for plugins running inside a game-server host. Two
//! independent components share one pattern (load-or-create, diff against
//! defaults, in-memory/on-disk sync) but differ in storage medium:
//!
//! - [`ConfigStore`] — one comment-preserving, template-seeded, self-healing
//!   `key: value` config file per plugin.
//! - [`KeyValueStore`] — typed key-value data scoped to a
//!   [`DataDomain`], backed by a JSON file or an embedded SQLite
//!   table, with defaults always merged as the floor.
//!
//! [`StorageManager`] ties them together: it owns the server root path,
//! resolves the on-disk layout, and constructs both store kinds.

pub mod storage;

// Re-export key public types for easier use by the host and plugins
pub use storage::{
    BackendKind, ConfigDocument, ConfigStore, DataDomain, DataMap, KeyValueStore,
    LocalStorageProvider, Result, StorageError, StorageManager, StorageProvider, Template,
};
