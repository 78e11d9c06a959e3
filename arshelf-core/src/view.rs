//! Single-slot widget host with a bounded component cache
//!
//! A [`View`] shows one widget at a time. Installing a component hides the
//! current one and shows the requested one, building it on first use and
//! reusing the cached instance afterwards as long as the construction params
//! are deep-equal. The cache holds at most `capacity` component types; the
//! least recently activated one is torn down when that is exceeded.

use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

/// Construction parameters. Compared structurally.
pub type Params = Value;

/// Lifecycle every hosted widget implements
pub trait Widget {
    fn show(&mut self);
    fn hide(&mut self);
    /// Final teardown. The instance is dropped right after.
    fn remove(&mut self);
    fn is_visible(&self) -> bool;
}

type Factory = Rc<dyn Fn(&Params) -> Box<dyn Widget>>;

/// A named widget factory. The name is the cache key.
#[derive(Clone)]
pub struct Component {
    name: String,
    build: Factory,
}

impl Component {
    pub fn new<F>(name: impl Into<String>, build: F) -> Self
    where
        F: Fn(&Params) -> Box<dyn Widget> + 'static,
    {
        Self {
            name: name.into(),
            build: Rc::new(build),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component").field("name", &self.name).finish()
    }
}

/// What `install` did with the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Installed {
    /// No cached instance existed
    Created,
    /// Cached instance with equal params reused
    Reused,
    /// Cached instance had different params and was replaced
    Rebuilt,
}

struct CachedWidget {
    component: String,
    instance: Box<dyn Widget>,
    params: Params,
}

impl CachedWidget {
    fn build(component: &Component, params: Params) -> Self {
        Self {
            component: component.name.clone(),
            instance: (component.build)(&params),
            params,
        }
    }
}

/// Widget host
pub struct View {
    capacity: usize,
    /// Front is least recently activated; the active widget is always last.
    cache: VecDeque<CachedWidget>,
    active: Option<String>,
}

impl View {
    /// Capacity is clamped to at least one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            cache: VecDeque::with_capacity(capacity + 1),
            active: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached component types
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Cached instances currently shown
    pub fn visible_count(&self) -> usize {
        self.cache
            .iter()
            .filter(|entry| entry.instance.is_visible())
            .count()
    }

    pub fn contains(&self, component: &str) -> bool {
        self.position(component).is_some()
    }

    /// Name of the visible component
    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active(&self) -> Option<&dyn Widget> {
        self.active.as_ref()?;
        self.cache.back().map(|entry| &*entry.instance)
    }

    pub fn active_mut(&mut self) -> Option<&mut (dyn Widget + 'static)> {
        self.active.as_ref()?;
        self.cache.back_mut().map(|entry| &mut *entry.instance)
    }

    /// Activate `component` built from `params`.
    pub fn install(&mut self, component: &Component, params: Params) -> Installed {
        let name = component.name();

        if let Some(current) = self.active.take() {
            if current != name {
                if let Some(index) = self.position(&current) {
                    self.cache[index].instance.hide();
                }
            }
        }

        let cached = self.position(name).and_then(|index| self.cache.remove(index));
        let (mut entry, outcome) = match cached {
            Some(entry) if entry.params == params => (entry, Installed::Reused),
            Some(mut stale) => {
                tracing::debug!(component = name, "params changed, rebuilding widget");
                stale.instance.remove();
                (CachedWidget::build(component, params), Installed::Rebuilt)
            }
            None => (CachedWidget::build(component, params), Installed::Created),
        };

        entry.instance.show();
        self.cache.push_back(entry);
        self.active = Some(name.to_owned());
        self.evict();

        outcome
    }

    /// Tear down every cached widget.
    pub fn clear(&mut self) {
        for mut entry in self.cache.drain(..) {
            entry.instance.remove();
        }
        self.active = None;
    }

    fn evict(&mut self) {
        while self.cache.len() > self.capacity {
            let Some(mut oldest) = self.cache.pop_front() else {
                break;
            };
            tracing::debug!(component = %oldest.component, "evicting cached widget");
            oldest.instance.remove();
        }
    }

    fn position(&self, component: &str) -> Option<usize> {
        self.cache.iter().position(|entry| entry.component == component)
    }
}

impl Drop for View {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("capacity", &self.capacity)
            .field(
                "cached",
                &self.cache.iter().map(|e| e.component.as_str()).collect::<Vec<_>>(),
            )
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::Visibility;
    use serde_json::json;
    use std::cell::RefCell;

    /// Records lifecycle calls into a shared log
    struct Probe {
        name: String,
        state: Visibility,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Widget for Probe {
        fn show(&mut self) {
            self.state.show();
            self.log.borrow_mut().push(format!("show {}", self.name));
        }
        fn hide(&mut self) {
            self.state.hide();
            self.log.borrow_mut().push(format!("hide {}", self.name));
        }
        fn remove(&mut self) {
            self.state.remove();
            self.log.borrow_mut().push(format!("remove {}", self.name));
        }
        fn is_visible(&self) -> bool {
            self.state.is_visible()
        }
    }

    fn component(name: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Component {
        let log = Rc::clone(log);
        Component::new(name, move |_params| -> Box<dyn Widget> {
            log.borrow_mut().push(format!("build {}", name));
            Box::new(Probe {
                name: name.to_owned(),
                state: Visibility::default(),
                log: Rc::clone(&log),
            })
        })
    }

    fn builds(log: &Rc<RefCell<Vec<String>>>) -> usize {
        log.borrow().iter().filter(|l| l.starts_with("build")).count()
    }

    #[test]
    fn capacity_is_at_least_one() {
        assert_eq!(View::new(0).capacity(), 1);
        assert_eq!(View::new(4).capacity(), 4);
    }

    #[test]
    fn reuses_instance_for_equal_params() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let login = component("login", &log);
        let mut view = View::new(3);

        assert_eq!(view.install(&login, json!({"next": "/apps"})), Installed::Created);
        assert_eq!(view.install(&login, json!({"next": "/apps"})), Installed::Reused);
        assert_eq!(builds(&log), 1);
    }

    #[test]
    fn deep_equality_ignores_key_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let form = component("form", &log);
        let mut view = View::new(2);

        view.install(&form, json!({"a": [1, {"b": true}], "c": null}));
        let outcome = view.install(&form, json!({"c": null, "a": [1, {"b": true}]}));
        assert_eq!(outcome, Installed::Reused);
    }

    #[test]
    fn rebuilds_when_params_differ() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let app = component("app", &log);
        let mut view = View::new(2);

        view.install(&app, json!({"id": 1}));
        assert_eq!(view.install(&app, json!({"id": 2})), Installed::Rebuilt);
        assert_eq!(builds(&log), 2);
        assert!(log.borrow().contains(&"remove app".to_owned()));
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn only_active_widget_is_visible() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = component("a", &log);
        let b = component("b", &log);
        let mut view = View::new(3);

        view.install(&a, Value::Null);
        view.install(&b, Value::Null);

        assert_eq!(view.active_name(), Some("b"));
        assert!(view.active().is_some_and(|w| w.is_visible()));
        let visible = view.cache.iter().filter(|e| e.instance.is_visible()).count();
        assert_eq!(visible, 1);
        assert!(log.borrow().contains(&"hide a".to_owned()));
    }

    #[test]
    fn evicts_least_recently_activated() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = component("a", &log);
        let b = component("b", &log);
        let c = component("c", &log);
        let mut view = View::new(2);

        view.install(&a, Value::Null);
        view.install(&b, Value::Null);
        // touching `a` makes `b` the oldest
        view.install(&a, Value::Null);
        view.install(&c, Value::Null);

        assert_eq!(view.len(), 2);
        assert!(view.contains("a"));
        assert!(!view.contains("b"));
        assert!(view.contains("c"));
        assert!(log.borrow().contains(&"remove b".to_owned()));
    }

    #[test]
    fn capacity_one_keeps_only_active() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = component("a", &log);
        let b = component("b", &log);
        let mut view = View::new(1);

        view.install(&a, Value::Null);
        view.install(&b, Value::Null);

        assert_eq!(view.len(), 1);
        assert_eq!(view.active_name(), Some("b"));
        assert!(view.active().is_some_and(|w| w.is_visible()));
    }

    #[test]
    fn clear_removes_everything() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = component("a", &log);
        let mut view = View::new(2);
        view.install(&a, Value::Null);

        view.clear();

        assert!(view.is_empty());
        assert!(view.active().is_none());
        assert_eq!(log.borrow().last().map(String::as_str), Some("remove a"));
    }
}
