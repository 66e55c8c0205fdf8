//! # Storage Module
//!
//! Device-local persistence for the state that has no server counterpart:
//! settings, declared services and booking annotations.
//!
//! - `traits`: the [`KeyValueStore`] abstraction
//! - `memory`: in-process store for tests and ephemeral sessions
//! - `file`: JSON document on disk with atomic writes
//! - `persisted`: typed, versioned values on top of any store

pub mod file;
pub mod memory;
pub mod persisted;
pub mod traits;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use persisted::Persisted;
pub use traits::KeyValueStore;
