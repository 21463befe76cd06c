//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! global settings file ─┐
//! process settings file ─┼→ loader.rs (parse TOML)
//! keypair file ─────────┘
//!     → context.rs (precedence rule, keypair injection, typed sections)
//!     → validation.rs (semantic checks)
//!     → ConfigurationContext (immutable)
//!     → shared via Arc to the dispatcher and every handler
//! ```
//!
//! # Design Decisions
//! - Context is immutable once built; there is no reload path
//! - All typed fields have defaults to allow minimal settings files
//! - Validation separates syntactic (serde) from semantic checks

pub mod context;
pub mod loader;
pub mod schema;
pub mod validation;

pub use context::{ConfigurationContext, ConfigurationError, SettingsSource, KEYPAIRS_KEY};
pub use loader::{load_context, ConfigError, SettingsPaths};
pub use schema::{BackendSpec, Keypair, Keypairs, ServerSettings, Settings};
