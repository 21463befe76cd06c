//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher and HTTP layer produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (dispatch counters, request latency)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured logging via tracing; request ID carried on every HTTP span
//! - Route misses and resource misses are separate metric outcomes
//! - Metrics are cheap no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
