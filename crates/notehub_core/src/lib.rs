#![doc = include_str!("../README.md")]

/// Autosave (debounced, conflict-aware saving of one open document)
pub mod autosave;

/// Configuration options
pub mod config;

/// Daily notes (one Markdown file per calendar day)
pub mod daily;

/// Error (common error types)
pub mod error;

/// Remote file store (contents API client)
pub mod store;

/// Transport abstraction (HTTP and in-memory)
pub mod transport;

/// Tree cache (lazily listed mirror of the remote tree)
pub mod tree;

/// Shared value types
pub mod types;

pub use config::{Config, Credentials};
pub use error::{NotehubError, Result};
pub use store::RemoteStore;

#[cfg(test)]
pub mod test_utils;
