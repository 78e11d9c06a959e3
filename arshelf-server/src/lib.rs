//! arshelf-server: REST backend for the arshelf admin panel
//!
//! Owners manage apps, 3D models and products through `/api`; the AR viewer
//! resolves scanned barcodes through the public `/api/scan` endpoint.
//!
//! Layers, outermost first: [`http`] handlers, [`service`] rules (validation,
//! hashing, ownership, cascades), [`db`] storage.

pub mod config;
pub mod db;
pub mod http;
pub mod models;
pub mod service;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use db::{MemoryStore, PgStore, Store, StoreError};
pub use http::{build_router, run_server, ApiError, ServerError};
pub use state::AppState;
