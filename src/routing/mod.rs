//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → dispatcher.rs (static prefix check)
//!     → router.rs (route lookup)
//!     → matcher.rs (template match, placeholder extraction)
//!     → resources::tree (resolve chain against the topology)
//!     → Return: Dispatch { handler, chain, context } or DispatchError
//!
//! Route Compilation (at startup):
//!     (id, pattern, kind)[]
//!     → Parse templates, check placeholders against kind
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment comparison only)
//! - Deterministic: same input always matches same route

pub mod dispatcher;
pub mod matcher;
pub mod router;

pub use dispatcher::{Dispatch, DispatchError, Dispatcher, DispatcherBuilder};
pub use matcher::{PathParams, PathPattern, PatternError};
pub use router::{RouteError, RouteMatch, RouteSpec, RouteTable};
