//! Startup orchestration.
//!
//! # Responsibilities
//! - Load settings and build the configuration context
//! - Build the route table and the dispatcher
//! - Initialize logging and metrics from the loaded settings
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{load_context, ConfigError, ConfigurationContext, SettingsPaths};
use crate::observability::{logging, metrics};
use crate::routing::{Dispatcher, RouteError, RouteTable};

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("route table error: {0}")]
    Routes(#[from] RouteError),

    #[error("invalid metrics address `{0}`")]
    MetricsAddress(String),
}

/// Build the dispatcher over the standard route table.
pub fn build_dispatcher(context: ConfigurationContext) -> Result<Dispatcher, RouteError> {
    let table = RouteTable::standard()?;
    Ok(Dispatcher::builder(table, Arc::new(context)).build())
}

/// Load settings and build everything needed to serve requests.
///
/// `log_level` overrides the configured level when set.
pub fn bootstrap(paths: &SettingsPaths, log_level: Option<&str>) -> Result<Arc<Dispatcher>, StartupError> {
    let context = load_context(paths)?;

    logging::init_logging(log_level.unwrap_or(&context.server().log_level));
    tracing::info!(
        source = ?context.source(),
        backends = context.backends().len(),
        keypairs = context.keypairs().len(),
        bind_address = %context.server().bind_address,
        "Configuration loaded"
    );

    let dispatcher = build_dispatcher(context)?;
    tracing::info!(routes = dispatcher.table().len(), "Route table built");

    Ok(Arc::new(dispatcher))
}

/// Start the metrics endpoint when enabled.
///
/// Must run inside a Tokio runtime.
pub fn start_metrics(context: &ConfigurationContext) -> Result<(), StartupError> {
    let server = context.server();
    if !server.metrics_enabled {
        return Ok(());
    }
    let addr: SocketAddr = server
        .metrics_address
        .parse()
        .map_err(|_| StartupError::MetricsAddress(server.metrics_address.clone()))?;
    metrics::init_metrics(addr);
    Ok(())
}
