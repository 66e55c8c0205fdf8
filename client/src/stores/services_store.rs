//! Locally declared services (`{prefix}-services`), seeded on first run.

use std::rc::Rc;

use anyhow::Result;
use log::{info, warn};
use shared::ServiceItem;
use uuid::Uuid;

use super::observable::{Store, SubscriptionId};
use super::STORE_SCHEMA_VERSION;
use crate::storage::{KeyValueStore, Persisted};

/// Partial update applied by [`ServicesStore::update`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServicePatch {
    pub title: Option<String>,
    pub duration_minutes: Option<u32>,
    /// `Some(None)` clears the price
    pub price: Option<Option<f64>>,
}

#[derive(Clone)]
pub struct ServicesStore {
    state: Store<Vec<ServiceItem>>,
    persisted: Persisted<Vec<ServiceItem>>,
}

impl ServicesStore {
    pub fn new(storage: Rc<dyn KeyValueStore>, namespace: &str) -> Self {
        let persisted = Persisted::new(storage, namespace, STORE_SCHEMA_VERSION);
        let services = persisted.try_load().unwrap_or_else(|| {
            info!("Seeding default service list");
            vec![ServiceItem::seed()]
        });
        Self {
            state: Store::new(services),
            persisted,
        }
    }

    pub fn list(&self) -> Vec<ServiceItem> {
        self.state.get()
    }

    pub fn find(&self, id: &str) -> Option<ServiceItem> {
        self.state.with(|items| items.iter().find(|s| s.id == id).cloned())
    }

    /// Add a service under a fresh id
    pub fn add(&self, title: &str, duration_minutes: u32, price: Option<f64>) -> Result<ServiceItem> {
        let service = ServiceItem {
            id: Uuid::new_v4().to_string(),
            title: title.trim().to_string(),
            duration_minutes,
            price,
        };
        info!("Adding service {} ({})", service.title, service.id);
        let added = service.clone();
        self.mutate(move |items| items.push(service))?;
        Ok(added)
    }

    /// Returns `false` when no service has this id
    pub fn update(&self, id: &str, patch: ServicePatch) -> Result<bool> {
        self.mutate(|items| match items.iter_mut().find(|s| s.id == id) {
            Some(item) => {
                if let Some(title) = patch.title {
                    item.title = title.trim().to_string();
                }
                if let Some(duration) = patch.duration_minutes {
                    item.duration_minutes = duration;
                }
                if let Some(price) = patch.price {
                    item.price = price;
                }
                true
            }
            None => false,
        })
    }

    pub fn remove(&self, id: &str) -> Result<bool> {
        self.mutate(|items| {
            let before = items.len();
            items.retain(|s| s.id != id);
            items.len() != before
        })
    }

    pub fn subscribe(&self, listener: impl Fn(&Vec<ServiceItem>) + 'static) -> SubscriptionId {
        self.state.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.unsubscribe(id)
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut Vec<ServiceItem>) -> R) -> Result<R> {
        let result = self.state.update(f);
        let snapshot = self.state.get();
        if let Err(e) = self.persisted.save(&snapshot) {
            warn!("Services changed but not persisted: {:#}", e);
            return Err(e);
        }
        Ok(result)
    }
}
