//! Invalidate-then-refetch cache of decoded query results.
//!
//! Values are stored type-erased per [`QueryKey`]; a mutation invalidates a
//! whole scope and bumps the revision so mounted screens refetch.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use log::debug;

use crate::io::ApiError;
use crate::stores::{Store, SubscriptionId};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    ClientsByDay(String),
    ClientsByRange { start: String, end: String },
    MarkedDays { year: i32, month: u32 },
    SelectedDays { year: i32, month: u32 },
    ScheduleSlots,
    SalaryTotal(String),
    ExpensesTotal(String),
}

impl QueryKey {
    pub fn scope(&self) -> InvalidateScope {
        match self {
            QueryKey::ClientsByDay(_)
            | QueryKey::ClientsByRange { .. }
            | QueryKey::MarkedDays { .. } => InvalidateScope::Clients,
            QueryKey::SelectedDays { .. } | QueryKey::ScheduleSlots => InvalidateScope::Schedule,
            QueryKey::SalaryTotal(_) => InvalidateScope::Salary,
            QueryKey::ExpensesTotal(_) => InvalidateScope::Expenses,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidateScope {
    Clients,
    Schedule,
    Salary,
    Expenses,
    All,
}

impl InvalidateScope {
    fn covers(&self, key: &QueryKey) -> bool {
        *self == InvalidateScope::All || key.scope() == *self
    }
}

#[derive(Clone)]
pub struct QueryCache {
    entries: Rc<RefCell<HashMap<QueryKey, Rc<dyn Any>>>>,
    revision: Store<u64>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            entries: Rc::new(RefCell::new(HashMap::new())),
            revision: Store::new(0),
        }
    }

    pub fn get<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        self.entries
            .borrow()
            .get(key)
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
    }

    pub fn set<T: Clone + 'static>(&self, key: QueryKey, value: T) {
        self.entries.borrow_mut().insert(key, Rc::new(value));
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.borrow().contains_key(key)
    }

    /// Cached value, or the result of `fetch` which is cached on success
    pub async fn get_or_fetch<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T, ApiError>
    where
        T: Clone + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if let Some(value) = self.get::<T>(&key) {
            debug!("Query cache hit: {:?}", key);
            return Ok(value);
        }
        debug!("Query cache miss: {:?}", key);
        let value = fetch().await?;
        self.set(key, value.clone());
        Ok(value)
    }

    /// Drop every entry in `scope` and notify revision subscribers
    pub fn invalidate(&self, scope: InvalidateScope) {
        let removed = {
            let mut entries = self.entries.borrow_mut();
            let before = entries.len();
            entries.retain(|key, _| !scope.covers(key));
            before - entries.len()
        };
        debug!("Invalidated {:?}: {} entries", scope, removed);
        self.revision.update(|r| *r += 1);
    }

    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    pub fn subscribe(&self, listener: impl Fn(&u64) + 'static) -> SubscriptionId {
        self.revision.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.revision.unsubscribe(id)
    }
}
