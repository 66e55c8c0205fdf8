//! Wiring shared by the domain tests.

use std::rc::Rc;

use crate::io::test_utils::FakeBackend;
use crate::io::ApiClient;
use crate::storage::{KeyValueStore, MemoryStore};
use crate::stores::{AppStore, BookingMetaStore, ServicesStore, SettingsStore};

use super::query_cache::QueryCache;

pub const TODAY: &str = "2025-06-13";

pub struct Harness {
    pub backend: FakeBackend,
    pub api: ApiClient,
    pub cache: QueryCache,
    pub storage: Rc<dyn KeyValueStore>,
    pub app: AppStore,
    pub settings: SettingsStore,
    pub services: ServicesStore,
    pub meta: BookingMetaStore,
}

impl Harness {
    pub fn new() -> Self {
        let backend = FakeBackend::new().with_init_data("query_id=1");
        let storage: Rc<dyn KeyValueStore> = Rc::new(MemoryStore::new());
        Self {
            api: backend.client(),
            cache: QueryCache::new(),
            app: AppStore::new(TODAY),
            settings: SettingsStore::new(storage.clone(), "manik-settings"),
            services: ServicesStore::new(storage.clone(), "manik-services"),
            meta: BookingMetaStore::new(storage.clone(), "manik-booking-meta"),
            storage,
            backend,
        }
    }
}
