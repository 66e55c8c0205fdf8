//! Local booking annotations (`{prefix}-booking-meta`).
//!
//! Annotations are keyed by `"{date}__{time}__{link}"`. The backend knows
//! nothing about them, so a booking edited elsewhere loses its annotation.

use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::Result;
use log::{debug, warn};
use shared::BookingMeta;

use super::observable::{Store, SubscriptionId};
use super::STORE_SCHEMA_VERSION;
use crate::storage::{KeyValueStore, Persisted};

pub fn build_booking_key(date: &str, time: &str, link: &str) -> String {
    format!("{}__{}__{}", date, time, link)
}

#[derive(Clone)]
pub struct BookingMetaStore {
    state: Store<BTreeMap<String, BookingMeta>>,
    persisted: Persisted<BTreeMap<String, BookingMeta>>,
}

impl BookingMetaStore {
    pub fn new(storage: Rc<dyn KeyValueStore>, namespace: &str) -> Self {
        let persisted = Persisted::new(storage, namespace, STORE_SCHEMA_VERSION);
        let entries = persisted.load();
        Self {
            state: Store::new(entries),
            persisted,
        }
    }

    pub fn meta_for(&self, key: &str) -> Option<BookingMeta> {
        self.state.with(|entries| entries.get(key).cloned())
    }

    pub fn set_meta(&self, key: &str, meta: BookingMeta) -> Result<()> {
        debug!("Storing booking meta under {}", key);
        self.mutate(|entries| {
            entries.insert(key.to_string(), meta);
        })
    }

    pub fn clear_meta(&self, key: &str) -> Result<()> {
        self.mutate(|entries| {
            entries.remove(key);
        })
    }

    /// Store `meta` under `new_key` and drop `old_key` when the booking moved
    pub fn move_meta(&self, old_key: Option<&str>, new_key: &str, meta: BookingMeta) -> Result<()> {
        self.mutate(|entries| {
            if let Some(old_key) = old_key.filter(|old| *old != new_key) {
                debug!("Booking meta moved from {} to {}", old_key, new_key);
                entries.remove(old_key);
            }
            entries.insert(new_key.to_string(), meta);
        })
    }

    pub fn len(&self) -> usize {
        self.state.with(BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&BTreeMap<String, BookingMeta>) + 'static,
    ) -> SubscriptionId {
        self.state.subscribe(listener)
    }

    fn mutate(&self, f: impl FnOnce(&mut BTreeMap<String, BookingMeta>)) -> Result<()> {
        self.state.update(f);
        let snapshot = self.state.get();
        if let Err(e) = self.persisted.save(&snapshot) {
            warn!("Booking meta changed but not persisted: {:#}", e);
            return Err(e);
        }
        Ok(())
    }
}
