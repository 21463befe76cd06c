//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (assign / propagate request ID)
//!     → static prefix? → ServeDir
//!     → otherwise dispatcher (routing layer) → bound handler
//!     → response.rs (dispatch errors → 404 JSON)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id, X_REQUEST_ID};
pub use response::ErrorBody;
pub use server::{AppState, HttpServer};
