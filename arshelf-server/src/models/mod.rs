//! Domain models with validation at construction
//!
//! Request input is turned into these types before it reaches the store.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod names;
pub mod password;
pub mod model_file;
pub mod pagination;
pub mod records;

pub use validation::ValidationError;
pub use names::{AppName, Barcode, Email, ProductName, Username};
pub use password::{Password, PasswordError, PasswordHash};
pub use model_file::ModelFile;
pub use pagination::{Paginated, Pagination, PaginationParams};
pub use records::{App, Model, Product, Session, User};
