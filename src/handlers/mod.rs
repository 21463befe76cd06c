//! Handler boundary.
//!
//! Handlers receive a fully resolved `ResourceChain` together with the shared
//! configuration context and produce the response. Provider calls, and any
//! timeout or retry policy around them, live behind this trait.

pub mod describe;

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::Method;
use axum::response::Response;

use crate::config::ConfigurationContext;
use crate::resources::ResourceChain;
use crate::routing::PathParams;

pub use describe::DescribeHandler;

/// Everything a handler gets for one request.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub method: Method,
    /// Id of the matched route.
    pub route_id: String,
    /// Raw placeholder values, keyed by placeholder name.
    pub params: PathParams,
    pub chain: ResourceChain,
    pub context: Arc<ConfigurationContext>,
    pub body: Bytes,
}

/// Produces the response for a resolved resource.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, request: HandlerRequest) -> Response;
}
