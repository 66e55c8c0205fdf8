//! `KeyValueStore` over `window.localStorage`.

use anyhow::{anyhow, Result};
use gloo::storage::{LocalStorage, Storage};
use manik_client::storage::KeyValueStore;

#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStore;

impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        LocalStorage::raw()
            .get_item(key)
            .map_err(|e| anyhow!("localStorage read of {} failed: {:?}", key, e))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(|e| anyhow!("localStorage write of {} failed: {:?}", key, e))
    }

    fn remove(&self, key: &str) -> Result<()> {
        LocalStorage::raw()
            .remove_item(key)
            .map_err(|e| anyhow!("localStorage removal of {} failed: {:?}", key, e))
    }
}
