//! Command implementations for the arshelf CLI

pub mod lookup;
pub mod migrate;
pub mod serve;

pub use lookup::run_lookup;
pub use migrate::run_migrate;
pub use serve::run_serve;
