//! Typed multi-subscriber callback registries.
//!
//! Every `on_*` registration in the crate hands back a [`Subscription`] that
//! removes the callback again. Emission snapshots the registry first, so a
//! callback may subscribe, unsubscribe or clear without tripping a `RefCell`
//! borrow, and a callback removed mid-emission is not invoked afterwards.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Callback<A> = Rc<dyn Fn(&A)>;

struct Registry<A> {
    next_id: u64,
    entries: Vec<(u64, Callback<A>)>,
}

impl<A> Registry<A> {
    fn contains(&self, id: u64) -> bool {
        self.entries.iter().any(|(entry_id, _)| *entry_id == id)
    }

    fn remove(&mut self, id: u64) {
        if let Some(position) = self.entries.iter().rposition(|(entry_id, _)| *entry_id == id) {
            self.entries.remove(position);
        }
    }
}

/// A list of callbacks taking `&A`
pub struct Callbacks<A> {
    inner: Rc<RefCell<Registry<A>>>,
}

impl<A: 'static> Callbacks<A> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register a callback; it stays registered until the returned handle is cancelled
    /// or the registry is cleared.
    pub fn subscribe(&self, callback: impl Fn(&A) + 'static) -> Subscription {
        let id = {
            let mut registry = self.inner.borrow_mut();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push((id, Rc::new(callback)));
            id
        };

        let weak: Weak<RefCell<Registry<A>>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(registry) = weak.upgrade() {
                registry.borrow_mut().remove(id);
            }
        })
    }

    /// Invoke every registered callback in registration order
    pub fn emit(&self, arg: &A) {
        let snapshot: Vec<(u64, Callback<A>)> = self.inner.borrow().entries.clone();

        for (id, callback) in snapshot {
            if !self.inner.borrow().contains(id) {
                continue;
            }
            callback(arg);
        }
    }

    /// Drop every callback
    pub fn clear(&self) {
        self.inner.borrow_mut().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }
}

impl<A: 'static> Default for Callbacks<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cleanup handle returned by every registration.
///
/// Dropping the handle leaves the callback registered; call [`Subscription::cancel`]
/// to remove it.
#[must_use = "dropping a Subscription keeps the callback registered; call cancel() to remove it"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle with nothing to clean up
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Keep the callback registered for the lifetime of its registry
    pub fn detach(mut self) {
        self.cancel = None;
    }
}
