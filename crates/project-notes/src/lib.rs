//! project-notes library: native pieces behind the `project-notes` binary.
//!
//! Exposed as a library so integration tests can drive passes against a
//! real directory.

pub mod config;
pub mod index_service;
pub mod native_fs;
pub mod persistence;
pub mod prompt;
pub mod todoist;
pub mod watcher;

// Re-export key types for convenience
pub use config::{Config, ConfigError};
pub use index_service::{IndexHandle, IndexServiceError};
pub use native_fs::NativeFs;
pub use persistence::SettingsStore;
pub use todoist::TodoistClient;
pub use watcher::{FileEvent, FileEventKind, FileWatcher, PathState};
