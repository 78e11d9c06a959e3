//! Client-side router
//!
//! Route templates look like `/app/:id/models`. Each `:name` segment becomes a
//! positional capture; literal segments are matched verbatim. Patterns are
//! anchored at both ends and tolerate one trailing slash.
//!
//! Routes are tried in insertion order and the first match wins. There is no
//! specificity ranking: register `/app/new` before `/app/:id`.

use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::events::{EventHandler, ListenerId};
use crate::{CoreError, Result};

/// Options handed to the navigated component
pub type Options = Map<String, Value>;

/// Valid variable names inside a template
static VARIABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("invalid variable regex"));

/// A compiled route
#[derive(Debug, Clone)]
pub struct Route<C> {
    template: String,
    pattern: Regex,
    variables: Vec<String>,
    component: C,
    defaults: Options,
}

impl<C> Route<C> {
    /// Compile a path template.
    ///
    /// # Example
    /// ```
    /// use arshelf_core::{Options, Route};
    ///
    /// let route = Route::compile("/app/:app/model/:model", "model-form", Options::new()).unwrap();
    /// assert_eq!(route.variables(), ["app", "model"]);
    /// let vars = route.captures("/app/42/model/7/").unwrap();
    /// assert_eq!(vars["app"], "42");
    /// assert_eq!(vars["model"], "7");
    /// ```
    pub fn compile(template: &str, component: C, defaults: Options) -> Result<Self> {
        if !template.starts_with('/') {
            return Err(CoreError::invalid_template(template, "must start with '/'"));
        }

        let mut pattern = String::from("^");
        let mut variables: Vec<String> = Vec::new();

        for segment in template.trim_end_matches('/').split('/').skip(1) {
            pattern.push('/');
            match segment.strip_prefix(':') {
                Some(name) => {
                    if !VARIABLE_RE.is_match(name) {
                        return Err(CoreError::invalid_template(
                            template,
                            format!("invalid variable name ':{}'", name),
                        ));
                    }
                    if variables.iter().any(|v| v == name) {
                        return Err(CoreError::invalid_template(
                            template,
                            format!("duplicate variable ':{}'", name),
                        ));
                    }
                    variables.push(name.to_owned());
                    pattern.push_str("([^/]+)");
                }
                None => pattern.push_str(&regex::escape(segment)),
            }
        }
        pattern.push_str("/?$");

        Ok(Self {
            template: template.to_owned(),
            pattern: Regex::new(&pattern)?,
            variables,
            component,
            defaults,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Variable names in declaration order
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn component(&self) -> &C {
        &self.component
    }

    pub fn defaults(&self) -> &Options {
        &self.defaults
    }

    /// Match `path` and return captured variables by name.
    pub fn captures(&self, path: &str) -> Option<Options> {
        let caps = self.pattern.captures(path)?;
        let mut vars = Options::new();
        for (index, name) in self.variables.iter().enumerate() {
            if let Some(m) = caps.get(index + 1) {
                vars.insert(name.clone(), Value::String(m.as_str().to_owned()));
            }
        }
        Some(vars)
    }
}

/// A successful route resolution
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch<C> {
    pub template: String,
    pub component: C,
    /// Route defaults with captured variables merged over them
    pub options: Options,
}

/// Events emitted by [`Router::navigate_to`]
#[derive(Debug, Clone, PartialEq)]
pub enum RouteEvent<C> {
    Navigate {
        path: String,
        component: C,
        options: Options,
    },
    NotFound {
        path: String,
    },
    NotAllowed {
        path: String,
    },
}

impl<C> RouteEvent<C> {
    pub const NAVIGATE: &'static str = "navigate";
    pub const NOT_FOUND: &'static str = "notfound";
    pub const NOT_ALLOWED: &'static str = "notallowed";

    /// Event name this variant is triggered under
    pub fn name(&self) -> &'static str {
        match self {
            Self::Navigate { .. } => Self::NAVIGATE,
            Self::NotFound { .. } => Self::NOT_FOUND,
            Self::NotAllowed { .. } => Self::NOT_ALLOWED,
        }
    }
}

/// Path router with protected prefixes.
///
/// The login check is a client-side convenience only. The server authorizes
/// every request on its own.
pub struct Router<C> {
    routes: Vec<Route<C>>,
    protected: Vec<String>,
    logged_in: Rc<dyn Fn() -> bool>,
    events: EventHandler<RouteEvent<C>>,
}

impl<C: Clone> Router<C> {
    /// Create a router that asks `logged_in` before entering protected paths.
    pub fn new<F>(logged_in: F) -> Self
    where
        F: Fn() -> bool + 'static,
    {
        Self {
            routes: Vec::new(),
            protected: Vec::new(),
            logged_in: Rc::new(logged_in),
            events: EventHandler::new(),
        }
    }

    /// Register a route. Re-adding a template replaces it in place.
    pub fn add(&mut self, path: &str, component: C, options: Options) -> Result<&mut Self> {
        let route = Route::compile(path, component, options)?;
        match self.routes.iter_mut().find(|r| r.template == route.template) {
            Some(existing) => *existing = route,
            None => self.routes.push(route),
        }
        Ok(self)
    }

    /// Require a session for every path starting with `prefix`.
    pub fn protect(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.protected.push(prefix.into());
        self
    }

    pub fn routes(&self) -> &[Route<C>] {
        &self.routes
    }

    /// Subscribe to `navigate`, `notfound` or `notallowed`.
    pub fn on<F>(&self, name: &str, listener: F) -> ListenerId
    where
        F: Fn(&RouteEvent<C>) + 'static,
    {
        self.events.on(name, listener)
    }

    pub fn events(&self) -> &EventHandler<RouteEvent<C>> {
        &self.events
    }

    /// Find the first matching route without emitting anything.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<C>> {
        let path = strip_query(path);
        self.routes.iter().find_map(|route| {
            let vars = route.captures(path)?;
            let mut options = route.defaults.clone();
            options.extend(vars);
            Some(RouteMatch {
                template: route.template.clone(),
                component: route.component.clone(),
                options,
            })
        })
    }

    pub fn is_protected(&self, path: &str) -> bool {
        let path = strip_query(path);
        self.protected.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Resolve `path` and emit the outcome. The emitted event is returned too.
    pub fn navigate_to(&self, path: &str) -> RouteEvent<C> {
        let event = if self.is_protected(path) && !(self.logged_in)() {
            tracing::debug!(path, "navigation blocked: no session");
            RouteEvent::NotAllowed {
                path: path.to_owned(),
            }
        } else {
            match self.resolve(path) {
                Some(found) => {
                    tracing::debug!(path, template = %found.template, "navigating");
                    RouteEvent::Navigate {
                        path: path.to_owned(),
                        component: found.component,
                        options: found.options,
                    }
                }
                None => RouteEvent::NotFound {
                    path: path.to_owned(),
                },
            }
        };

        self.events.trigger(event.name(), &event);
        event
    }
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::{Cell, RefCell};

    fn opts(value: Value) -> Options {
        match value {
            Value::Object(map) => map,
            _ => Options::new(),
        }
    }

    fn open_router() -> Router<&'static str> {
        Router::new(|| true)
    }

    #[test]
    fn compiles_literal_and_variables() {
        let route = Route::compile("/app/:id/models", (), Options::new()).unwrap();
        assert_eq!(route.variables(), ["id"]);
        assert!(route.captures("/app/1/models").is_some());
        assert!(route.captures("/app/1/models/").is_some());
        assert!(route.captures("/app/1/models/x").is_none());
        assert!(route.captures("/prefix/app/1/models").is_none());
        assert!(route.captures("/app//models").is_none());
    }

    #[test]
    fn root_matches_with_and_without_slash() {
        let route = Route::compile("/", (), Options::new()).unwrap();
        assert!(route.captures("/").is_some());
        assert!(route.captures("").is_some());
        assert!(route.captures("/x").is_none());
    }

    #[test]
    fn literal_segments_are_escaped() {
        let route = Route::compile("/file.glb", (), Options::new()).unwrap();
        assert!(route.captures("/file.glb").is_some());
        assert!(route.captures("/fileXglb").is_none());
    }

    #[test]
    fn rejects_bad_templates() {
        assert!(Route::compile("app", (), Options::new()).is_err());
        assert!(Route::compile("/app/:", (), Options::new()).is_err());
        assert!(Route::compile("/a/:id/b/:id", (), Options::new()).is_err());
        assert!(Route::compile("/a/:9lives", (), Options::new()).is_err());
    }

    #[test]
    fn first_match_wins() {
        let mut router = open_router();
        router
            .add("/app/:id", "app-detail", Options::new())
            .unwrap()
            .add("/app/new", "app-create", Options::new())
            .unwrap();

        let found = router.resolve("/app/new").unwrap();
        assert_eq!(found.component, "app-detail");
        assert_eq!(found.options["id"], "new");
    }

    #[test]
    fn captured_variables_override_defaults() {
        let mut router = open_router();
        router
            .add(
                "/app/:id",
                "app",
                opts(json!({ "id": "default", "mode": "edit" })),
            )
            .unwrap();

        let found = router.resolve("/app/99?tab=models").unwrap();
        assert_eq!(found.options["id"], "99");
        assert_eq!(found.options["mode"], "edit");
    }

    #[test]
    fn re_adding_replaces_in_place() {
        let mut router = open_router();
        router.add("/a", "first", Options::new()).unwrap();
        router.add("/b", "second", Options::new()).unwrap();
        router.add("/a", "replaced", Options::new()).unwrap();

        assert_eq!(router.routes().len(), 2);
        assert_eq!(*router.routes()[0].component(), "replaced");
    }

    #[test]
    fn navigate_emits_component_and_options() {
        let mut router = open_router();
        router.add("/product/:id", "product", Options::new()).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        router.on(RouteEvent::<&str>::NAVIGATE, move |event| {
            sink.borrow_mut().push(event.clone());
        });

        router.navigate_to("/product/5");

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        match &seen[0] {
            RouteEvent::Navigate {
                component, options, ..
            } => {
                assert_eq!(*component, "product");
                assert_eq!(options["id"], "5");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn unmatched_path_is_not_found() {
        let router = open_router();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        router.on(RouteEvent::<&str>::NOT_FOUND, move |_| counter.set(counter.get() + 1));

        let event = router.navigate_to("/nowhere");

        assert_eq!(event.name(), "notfound");
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn protected_path_requires_session() {
        let session = Rc::new(Cell::new(false));
        let flag = Rc::clone(&session);
        let mut router: Router<&str> = Router::new(move || flag.get());
        router.protect("/admin");
        router.add("/admin/apps", "apps", Options::new()).unwrap();

        assert!(matches!(
            router.navigate_to("/admin/apps"),
            RouteEvent::NotAllowed { .. }
        ));

        session.set(true);
        assert!(matches!(
            router.navigate_to("/admin/apps"),
            RouteEvent::Navigate { .. }
        ));
    }
}
