//! Resource tree subsystem.
//!
//! # Data Flow
//! ```text
//! Matched request path
//!     → tree.rs (walk segments from Root)
//!     → topology.rs (does backend/machine/image exist?)
//!     → Return: ResourceChain or ResourceNotFoundError
//! ```
//!
//! # Design Decisions
//! - Resolution validates shape and produces typed identifiers only
//! - No provider calls; handlers own those
//! - Chains are request-local values, never shared

pub mod chain;
pub mod topology;
pub mod tree;

pub use chain::{BackendRef, ImageRef, MachineRef, ResourceChain, ResourceKind, ResourceRef};
pub use topology::{Inventory, Topology};
pub use tree::{ResourceNotFoundError, Root};
