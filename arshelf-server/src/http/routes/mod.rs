//! Route handlers organized by resource
//!
//! Everything except `health` is nested under `/api` by
//! [`crate::http::server::build_router`].

pub mod apps;
pub mod auth;
pub mod health;
pub mod models;
pub mod products;
pub mod scan;
pub mod users;
