// SPDX-License-Identifier: MIT OR Apache-2.0
//! Single-threaded observer lists, as exposed by the host scene.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Identifier returned when adding an observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

struct Observer<T> {
    id: ObserverId,
    callback: Rc<dyn Fn(&T)>,
    once: bool,
}

/// A list of callbacks notified in registration order.
///
/// Callbacks may add or remove observers while being notified; changes apply
/// from the next notification.
pub struct Observable<T> {
    next_id: Cell<u64>,
    observers: RefCell<Vec<Observer<T>>>,
}

impl<T> Observable<T> {
    /// Create an observable with no observers
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            observers: RefCell::new(Vec::new()),
        }
    }

    /// Add an observer called on every notification
    pub fn add(&self, callback: impl Fn(&T) + 'static) -> ObserverId {
        self.push(Rc::new(callback), false)
    }

    /// Add an observer called on the next notification only
    pub fn add_once(&self, callback: impl Fn(&T) + 'static) -> ObserverId {
        self.push(Rc::new(callback), true)
    }

    fn push(&self, callback: Rc<dyn Fn(&T)>, once: bool) -> ObserverId {
        let id = ObserverId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.observers.borrow_mut().push(Observer { id, callback, once });
        id
    }

    /// Remove an observer. Returns `false` if it was already gone.
    pub fn remove(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|o| o.id != id);
        observers.len() != before
    }

    /// Notify every observer, returning how many were called
    pub fn notify(&self, value: &T) -> usize {
        let callbacks: Vec<Rc<dyn Fn(&T)>> = {
            let mut observers = self.observers.borrow_mut();
            let callbacks = observers.iter().map(|o| o.callback.clone()).collect();
            observers.retain(|o| !o.once);
            callbacks
        };
        for callback in &callbacks {
            callback(value);
        }
        callbacks.len()
    }

    /// Number of registered observers
    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    /// Remove every observer
    pub fn clear(&self) {
        self.observers.borrow_mut().clear();
    }
}

impl<T> Default for Observable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("observers", &self.observer_count())
            .finish()
    }
}
