//! arshelf-client: talk to an arshelf server
//!
//! [`Request`] is the JSON client used by admin tooling and the `arshelf
//! lookup` command. [`FormData`] turns form input, files included, into the
//! JSON bodies the server accepts.

pub mod form;
pub mod request;

pub use form::{Field, FormData};
pub use request::{
    AppInfo, ClientError, ModelInfo, Page, ProductInfo, Removed, Request, Result, ScanInfo,
    UserInfo,
};
