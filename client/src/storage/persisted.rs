//! # Persisted Values
//!
//! Typed values stored under one key inside a versioned envelope:
//!
//! ```json
//! {"version": 1, "data": { ... }}
//! ```
//!
//! A missing key, unreadable JSON, or a version other than the current one
//! loads as the type's default. Nothing is migrated.

use std::marker::PhantomData;
use std::rc::Rc;

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::traits::KeyValueStore;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    data: T,
}

#[derive(Debug, Deserialize)]
struct VersionProbe {
    version: u32,
}

pub struct Persisted<T> {
    store: Rc<dyn KeyValueStore>,
    key: String,
    version: u32,
    _marker: PhantomData<T>,
}

impl<T> Clone for Persisted<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key: self.key.clone(),
            version: self.version,
            _marker: PhantomData,
        }
    }
}

impl<T> Persisted<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(store: Rc<dyn KeyValueStore>, key: impl Into<String>, version: u32) -> Self {
        Self {
            store,
            key: key.into(),
            version,
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stored value, or `None` when absent, unreadable or of another version
    pub fn try_load(&self) -> Option<T> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No stored value for {}", self.key);
                return None;
            }
            Err(e) => {
                warn!("Failed to read {}: {:#}", self.key, e);
                return None;
            }
        };

        match serde_json::from_str::<VersionProbe>(&raw) {
            Ok(probe) if probe.version == self.version => {}
            Ok(probe) => {
                warn!(
                    "Discarding {} stored with schema version {} (current {})",
                    self.key, probe.version, self.version
                );
                return None;
            }
            Err(e) => {
                warn!("Discarding unreadable {}: {}", self.key, e);
                return None;
            }
        }

        match serde_json::from_str::<Envelope<T>>(&raw) {
            Ok(envelope) => Some(envelope.data),
            Err(e) => {
                warn!("Discarding {} with unexpected shape: {}", self.key, e);
                None
            }
        }
    }

    /// Stored value or the default
    pub fn load(&self) -> T {
        self.try_load().unwrap_or_default()
    }

    pub fn save(&self, value: &T) -> Result<()> {
        let envelope = Envelope {
            version: self.version,
            data: value,
        };
        let json = serde_json::to_string(&envelope)
            .with_context(|| format!("Failed to serialize {}", self.key))?;
        self.store.set(&self.key, &json)?;
        debug!("Persisted {}", self.key);
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(&self.key)
    }
}
