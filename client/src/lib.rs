//! # Manik Client Core
//!
//! Platform-independent core of the Manik scheduling Mini-App. Everything that
//! does not touch the browser lives here so it can be exercised natively:
//!
//! - `io`: HTTP transport abstraction, typed API client and error type
//! - `storage`: device-local key-value persistence with versioned envelopes
//! - `stores`: observable state containers injected into the UI
//! - `domain`: screen models, booking sheet, access gate, query cache, toasts
//! - `config`: runtime configuration loaded from YAML
//!
//! The `frontend` crate plugs browser implementations (gloo-net, localStorage,
//! gloo-timers) into the traits defined here.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;
pub mod stores;

pub use config::ClientConfig;
pub use io::{ApiClient, ApiError};
