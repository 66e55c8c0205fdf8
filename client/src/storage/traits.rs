//! # Storage Traits
//!
//! String-keyed, string-valued storage so the same stores run on top of
//! `window.localStorage`, a file, or memory.

use anyhow::Result;

/// Synchronous key-value storage.
///
/// Methods take `&self`; implementations use interior mutability the same
/// way `localStorage` does.
pub trait KeyValueStore {
    /// Value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}
