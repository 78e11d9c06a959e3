//! Database layer - connection pool, migrations and stores
//!
//! # Design Principles
//!
//! - Connection pool with a small fixed limit - no Arc<Mutex<Connection>>
//! - Rely on DB constraints, map conflicts - no check-then-insert
//! - Cascades are explicit in the service layer, not `ON DELETE CASCADE`

pub mod memory;
pub mod migrations;
pub mod pool;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use pool::create_pool;
pub use postgres::PgStore;
pub use store::{Store, StoreError};
