//! Single-threaded observable container.
//!
//! Listeners are invoked after the borrow is released, so a listener may
//! read the store (or even update it) without a `BorrowMutError`.

use std::cell::RefCell;
use std::rc::Rc;

pub type SubscriptionId = usize;

type Listener<T> = Rc<dyn Fn(&T)>;

struct Inner<T> {
    value: T,
    listeners: Vec<(SubscriptionId, Listener<T>)>,
    next_id: SubscriptionId,
}

pub struct Store<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + 'static> Store<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                value,
                listeners: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Snapshot of the current value
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Read without cloning the whole value
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Mutate in place and notify listeners
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut self.inner.borrow_mut().value);
        self.notify();
        result
    }

    pub fn set(&self, value: T) {
        self.update(|current| *current = value);
    }

    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push((id, Rc::new(listener)));
        id
    }

    /// Returns `false` when the id was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|(listener_id, _)| *listener_id != id);
        inner.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    fn notify(&self) {
        let (value, listeners) = {
            let inner = self.inner.borrow();
            let listeners: Vec<Listener<T>> =
                inner.listeners.iter().map(|(_, l)| l.clone()).collect();
            (inner.value.clone(), listeners)
        };
        for listener in listeners {
            listener(&value);
        }
    }
}
