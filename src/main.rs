//! infra-api: multi-cloud infrastructure-management API server.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client Request
//!   ──────────────▶ http server ──▶ /static/* ──▶ ServeDir
//!                        │
//!                        ▼
//!                   dispatcher ──▶ route table ──▶ resource tree ──▶ topology
//!                        │
//!                        ▼
//!          handler(ResourceChain, ConfigurationContext)
//!   ◀──────────────      │
//!   Client Response
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use axum::http::Method;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use infra_api::config::SettingsPaths;
use infra_api::http::ErrorBody;
use infra_api::lifecycle::startup::{bootstrap, start_metrics};
use infra_api::{Dispatcher, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "infra-api")]
#[command(about = "Multi-cloud infrastructure management API", long_about = None)]
struct Cli {
    /// Deployment-global settings file (TOML).
    #[arg(long, global = true)]
    global_settings: Option<PathBuf>,

    /// Process-specific settings file (TOML). Replaces the global settings when non-empty.
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    /// Keypair file (TOML, `[keypairs.<provider>]` tables).
    #[arg(short, long, global = true)]
    keypairs: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the API (default)
    Serve,
    /// Print the route table
    Routes,
    /// Dispatch a path offline and print the resolved chain
    Resolve {
        path: String,
        #[arg(short, long, default_value = "GET")]
        method: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let paths = SettingsPaths {
        global: cli.global_settings,
        process: cli.settings,
        keypairs: cli.keypairs,
    };

    let dispatcher = bootstrap(&paths, cli.log_level.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let context = dispatcher.context().clone();
            start_metrics(&context)?;

            let listener = TcpListener::bind(&context.server().bind_address).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");

            let shutdown = Shutdown::new();
            shutdown.trigger_on_signal();

            HttpServer::new(dispatcher)
                .run(listener, shutdown.subscribe())
                .await?;

            tracing::info!("Shutdown complete");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Routes => {
            for route in dispatcher.table().routes() {
                println!("{:<18} {:<50} {}", route.id(), route.pattern().as_str(), route.kind());
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Resolve { path, method } => {
            let method: Method = method.to_uppercase().parse()?;
            match resolve_report(&dispatcher, &method, &path)? {
                Ok(report) => {
                    println!("{}", report);
                    Ok(ExitCode::SUCCESS)
                }
                Err(report) => {
                    println!("{}", report);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

/// Dispatch a path offline. `Ok` carries the resolved chain as JSON, `Err`
/// the same error body the HTTP surface would return.
fn resolve_report(
    dispatcher: &Dispatcher,
    method: &Method,
    path: &str,
) -> Result<Result<String, String>, serde_json::Error> {
    match dispatcher.dispatch(method, path) {
        Ok(dispatch) => {
            let out = serde_json::json!({
                "route": dispatch.route.id(),
                "kind": dispatch.chain.kind(),
                "chain": dispatch.chain.refs(),
                "params": dispatch.params,
            });
            Ok(Ok(serde_json::to_string_pretty(&out)?))
        }
        Err(err) => {
            let body = ErrorBody {
                error: err.to_string(),
                reason: err.reason().to_string(),
            };
            Ok(Err(serde_json::to_string_pretty(&body)?))
        }
    }
}
