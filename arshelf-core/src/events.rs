//! Synchronous event dispatch with bubbling
//!
//! An [`EventHandler`] keeps one listener list per event name. `trigger` runs
//! the listeners in registration order and then hands the same event to every
//! handler registered with [`EventHandler::bubble_to`]. There is no queueing
//! and no cancellation: when `trigger` returns, every listener has run.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Listener callback
pub type Listener<E> = Rc<dyn Fn(&E)>;

/// Identifies a registered listener so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registry<E> {
    next_id: u64,
    listeners: HashMap<String, Vec<(ListenerId, Listener<E>)>>,
    /// Held weakly so two widgets bubbling into each other don't leak.
    targets: Vec<Weak<RefCell<Registry<E>>>>,
}

/// Shared handle to a listener registry.
///
/// Cloning the handle shares the registry.
pub struct EventHandler<E> {
    inner: Rc<RefCell<Registry<E>>>,
}

impl<E> Clone for EventHandler<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> Default for EventHandler<E> {
    fn default() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Registry {
                next_id: 0,
                listeners: HashMap::new(),
                targets: Vec::new(),
            })),
        }
    }
}

impl<E> fmt::Debug for EventHandler<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.borrow();
        f.debug_struct("EventHandler")
            .field("events", &registry.listeners.keys().collect::<Vec<_>>())
            .field("targets", &registry.targets.len())
            .finish()
    }
}

impl<E> EventHandler<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for `name`. Listeners run in registration order.
    pub fn on<F>(&self, name: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&E) + 'static,
    {
        let mut registry = self.inner.borrow_mut();
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry
            .listeners
            .entry(name.into())
            .or_default()
            .push((id, Rc::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered under `name`.
    pub fn off(&self, name: &str, id: ListenerId) -> bool {
        let mut registry = self.inner.borrow_mut();
        let Some(list) = registry.listeners.get_mut(name) else {
            return false;
        };
        let before = list.len();
        list.retain(|(listener_id, _)| *listener_id != id);
        before != list.len()
    }

    /// Propagate every triggered event to `target` after local listeners ran.
    pub fn bubble_to(&self, target: &EventHandler<E>) {
        if Rc::ptr_eq(&self.inner, &target.inner) {
            return;
        }
        self.inner
            .borrow_mut()
            .targets
            .push(Rc::downgrade(&target.inner));
    }

    /// Number of listeners registered for `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.inner
            .borrow()
            .listeners
            .get(name)
            .map_or(0, Vec::len)
    }

    /// Run all listeners for `name`, then bubble to the registered targets.
    ///
    /// Each handler sees a given trigger at most once, even if the bubble
    /// graph contains a cycle.
    pub fn trigger(&self, name: &str, event: &E) {
        let mut visited = Vec::new();
        dispatch(&self.inner, name, event, &mut visited);
    }
}

fn dispatch<E>(
    registry: &Rc<RefCell<Registry<E>>>,
    name: &str,
    event: &E,
    visited: &mut Vec<*const RefCell<Registry<E>>>,
) {
    let ptr = Rc::as_ptr(registry);
    if visited.contains(&ptr) {
        return;
    }
    visited.push(ptr);

    // Snapshot before calling out: listeners may register more listeners.
    let (listeners, targets) = {
        let registry = registry.borrow();
        let listeners: Vec<Listener<E>> = registry
            .listeners
            .get(name)
            .map(|list| list.iter().map(|(_, l)| Rc::clone(l)).collect())
            .unwrap_or_default();
        let targets: Vec<_> = registry.targets.iter().filter_map(Weak::upgrade).collect();
        (listeners, targets)
    };

    for listener in listeners {
        listener(event);
    }

    for target in targets {
        dispatch(&target, name, event, visited);
    }
}
