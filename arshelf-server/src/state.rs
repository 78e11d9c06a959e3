//! Application state shared across handlers

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::Store;
use crate::service::LoginLimiter;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn Store>,
    config: ServerConfig,
    limiter: LoginLimiter,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: ServerConfig) -> Self {
        let limiter = LoginLimiter::new(config.login_max_failures, config.login_window());
        Self {
            inner: Arc::new(AppStateInner {
                store,
                config,
                limiter,
            }),
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    pub fn limiter(&self) -> &LoginLimiter {
        &self.inner.limiter
    }
}
