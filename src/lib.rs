//! Multi-cloud infrastructure API: resource routing and request context.
//!
//! Requests are matched against a fixed route table, resolved through the
//! resource tree into a typed chain (backend → machine/image → sub-resource)
//! and handed to a handler together with the shared configuration context.

pub mod config;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resources;
pub mod routing;

pub use config::ConfigurationContext;
pub use handlers::{Handler, HandlerRequest};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use resources::{ResourceChain, ResourceKind};
pub use routing::{DispatchError, Dispatcher, RouteTable};
