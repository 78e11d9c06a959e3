//! arshelf-core: client-side application framework
//!
//! The pieces the admin panel and AR viewer are assembled from:
//! - [`events`]: synchronous observer with bubbling between handlers
//! - [`router`]: path templates with `:name` variables, first match wins
//! - [`view`]: single-slot widget host with a bounded component cache
//! - [`widget`]: lifecycle helpers and the stock widgets
//! - [`session`]: the client-side login cookie heuristic
//!
//! Everything here is single-threaded; handles are `Rc`-based.

pub mod error;
pub mod events;
pub mod router;
pub mod session;
pub mod view;
pub mod widget;

pub use error::{CoreError, Result};
pub use events::{EventHandler, ListenerId};
pub use router::{Options, Route, RouteEvent, RouteMatch, Router};
pub use session::SessionFlag;
pub use view::{Component, Installed, Params, View, Widget};
pub use widget::{ErrorDisplay, Overview, Selected, Visibility};
