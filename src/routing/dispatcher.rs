//! Request dispatch.
//!
//! # Responsibilities
//! - Match the request path against the route table
//! - Resolve the route's placeholder values through the resource tree root
//! - Hand back the bound handler, the chain and the shared context
//!
//! # Design Decisions
//! - Pure with respect to the route table and context; nothing is mutated
//! - Route misses and resource misses are distinct errors, both 404 at the edge
//! - Paths under the static prefix are never routed
//! - The chain comes from the route's kind and placeholders, not the literal
//!   path, so custom URL layouts resolve like the standard ones

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use thiserror::Error;

use crate::config::ConfigurationContext;
use crate::handlers::{DescribeHandler, Handler};
use crate::resources::{Inventory, ResourceChain, ResourceNotFoundError, Root, Topology};
use crate::routing::matcher::PathParams;
use crate::routing::router::{RouteError, RouteSpec, RouteTable};

/// Per-request dispatch failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("no route matches {method} {path}")]
    RouteNotFound { method: Method, path: String },

    #[error("route `{route}` matched but {source}")]
    ResourceNotFound {
        route: String,
        #[source]
        source: ResourceNotFoundError,
    },
}

impl DispatchError {
    /// Stable label for logs, metrics and response bodies.
    pub fn reason(&self) -> &'static str {
        match self {
            DispatchError::RouteNotFound { .. } => "route_not_found",
            DispatchError::ResourceNotFound { .. } => "resource_not_found",
        }
    }

    /// Status code at the HTTP boundary. Both variants are 404.
    pub fn status(&self) -> StatusCode {
        StatusCode::NOT_FOUND
    }
}

/// A successfully dispatched request.
pub struct Dispatch<'a> {
    pub route: &'a RouteSpec,
    pub handler: Arc<dyn Handler>,
    pub params: PathParams,
    pub chain: ResourceChain,
    pub context: Arc<ConfigurationContext>,
}

impl fmt::Debug for Dispatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("route", &self.route.id())
            .field("params", &self.params)
            .field("chain", &self.chain)
            .finish()
    }
}

/// Matches paths, resolves resources and selects handlers.
pub struct Dispatcher {
    table: RouteTable,
    root: Root,
    context: Arc<ConfigurationContext>,
    handlers: HashMap<String, Arc<dyn Handler>>,
    fallback: Arc<dyn Handler>,
    static_prefix: Option<String>,
}

impl Dispatcher {
    /// Start building a dispatcher over a route table and context.
    pub fn builder(table: RouteTable, context: Arc<ConfigurationContext>) -> DispatcherBuilder {
        DispatcherBuilder::new(table, context)
    }

    /// The route table, in registration order.
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// The shared configuration context handed to every handler.
    pub fn context(&self) -> &Arc<ConfigurationContext> {
        &self.context
    }

    /// The static asset prefix, if one is reserved.
    pub fn static_prefix(&self) -> Option<&str> {
        self.static_prefix.as_deref()
    }

    /// Whether the path belongs to the static asset prefix.
    pub fn is_static(&self, path: &str) -> bool {
        match &self.static_prefix {
            Some(prefix) => {
                path == prefix
                    || path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            None => false,
        }
    }

    /// Dispatch a request path.
    pub fn dispatch(&self, method: &Method, path: &str) -> Result<Dispatch<'_>, DispatchError> {
        let route_not_found = || DispatchError::RouteNotFound {
            method: method.clone(),
            path: path.to_string(),
        };

        if self.is_static(path) {
            return Err(route_not_found());
        }

        let matched = self.table.match_path(path).ok_or_else(route_not_found)?;
        let route = matched.route;

        let chain = self
            .root
            .resolve_kind(route.kind(), &matched.params, path)
            .map_err(|source| DispatchError::ResourceNotFound {
                route: route.id().to_string(),
                source,
            })?;

        let handler = self
            .handlers
            .get(route.id())
            .cloned()
            .unwrap_or_else(|| self.fallback.clone());

        tracing::debug!(
            method = %method,
            path = %path,
            route = %route.id(),
            kind = %chain.kind(),
            depth = chain.len(),
            "Request dispatched"
        );

        Ok(Dispatch {
            route,
            handler,
            params: matched.params,
            chain,
            context: self.context.clone(),
        })
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.table.len())
            .field("bound", &self.handlers.keys().collect::<Vec<_>>())
            .field("static_prefix", &self.static_prefix)
            .finish()
    }
}

/// Builds a `Dispatcher`. Handler bindings are checked against the table.
pub struct DispatcherBuilder {
    table: RouteTable,
    context: Arc<ConfigurationContext>,
    topology: Option<Arc<dyn Topology>>,
    handlers: HashMap<String, Arc<dyn Handler>>,
    fallback: Arc<dyn Handler>,
    static_prefix: Option<String>,
}

impl DispatcherBuilder {
    fn new(table: RouteTable, context: Arc<ConfigurationContext>) -> Self {
        let static_prefix = normalize_prefix(&context.server().static_prefix);
        Self {
            table,
            context,
            topology: None,
            handlers: HashMap::new(),
            fallback: Arc::new(DescribeHandler),
            static_prefix,
        }
    }

    /// Use a custom topology instead of the configured backend inventory.
    pub fn topology(mut self, topology: Arc<dyn Topology>) -> Self {
        self.topology = Some(topology);
        self
    }

    /// Bind a handler to a route id.
    pub fn bind(mut self, route_id: &str, handler: Arc<dyn Handler>) -> Result<Self, RouteError> {
        if self.table.get(route_id).is_none() {
            return Err(RouteError::UnknownRoute(route_id.to_string()));
        }
        self.handlers.insert(route_id.to_string(), handler);
        Ok(self)
    }

    /// Handler for routes with no explicit binding.
    pub fn fallback(mut self, handler: Arc<dyn Handler>) -> Self {
        self.fallback = handler;
        self
    }

    /// Override the static asset prefix taken from the server settings.
    pub fn static_prefix(mut self, prefix: &str) -> Self {
        self.static_prefix = normalize_prefix(prefix);
        self
    }

    /// Finish the dispatcher. Without a custom topology the configured backends are used.
    pub fn build(self) -> Dispatcher {
        let topology: Arc<dyn Topology> = match self.topology {
            Some(topology) => topology,
            None => Arc::new(Inventory::from_backends(self.context.backends())),
        };
        Dispatcher {
            table: self.table,
            root: Root::new(topology),
            context: self.context,
            handlers: self.handlers,
            fallback: self.fallback,
            static_prefix: self.static_prefix,
        }
    }
}

impl fmt::Debug for DispatcherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("routes", &self.table.len())
            .field("bound", &self.handlers.keys().collect::<Vec<_>>())
            .field("custom_topology", &self.topology.is_some())
            .field("static_prefix", &self.static_prefix)
            .finish()
    }
}

/// `""` and `"/"` disable the prefix; anything else loses its trailing slash.
fn normalize_prefix(prefix: &str) -> Option<String> {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('/') {
        Some(trimmed.to_string())
    } else {
        Some(format!("/{}", trimmed))
    }
}
