use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::Result;

use super::traits::KeyValueStore;

/// Keeps everything in a `HashMap` for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.set("manik-settings", "{}").unwrap();
        assert_eq!(store.get("manik-settings").unwrap().as_deref(), Some("{}"));
        assert_eq!(store.len(), 1);

        store.remove("manik-settings").unwrap();
        store.remove("manik-settings").unwrap();
        assert_eq!(store.get("manik-settings").unwrap(), None);
    }
}
